pub mod error;
pub mod metadata;
pub mod pagination;
pub mod security;
