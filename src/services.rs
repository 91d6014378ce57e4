pub mod audit_service;
pub mod auth;
pub mod compliance_service;
pub mod inventory_service;
pub mod invoice_service;
pub mod organizations_service;
pub mod storage_service;
pub mod users_service;
