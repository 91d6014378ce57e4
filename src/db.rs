pub mod audit_repo;
pub mod auth_repo;
pub mod compliance_repo;
pub mod inventory_repo;
pub mod invoice_repo;
pub mod organization_repo;
pub mod user_repo;

pub use audit_repo::AuditRepository;
pub use auth_repo::AuthRepository;
pub use compliance_repo::ComplianceRepository;
pub use inventory_repo::InventoryRepository;
pub use invoice_repo::InvoiceRepository;
pub use organization_repo::OrganizationRepository;
pub use user_repo::UserRepository;
