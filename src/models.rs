pub mod audit;
pub mod auth;
pub mod compliance;
pub mod inventory;
pub mod invoice;
pub mod organization;
pub mod user;
