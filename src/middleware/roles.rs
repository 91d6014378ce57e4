// src/middleware/roles.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{common::error::AppError, models::auth::Claims, models::user::Role};

/// 1. O Trait que define um conjunto de papéis aceitos
pub trait RoleSet: Send + Sync + 'static {
    fn allowed() -> &'static [Role];
}

/// 2. O Extractor (Guardião): rejeita a requisição antes do handler rodar
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleSet,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .ok_or_else(|| AppError::unauthorized("Missing or invalid authorization header"))?;

        if !T::allowed().contains(&claims.role) {
            return Err(AppError::forbidden("Insufficient permissions"));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS CONJUNTOS DE PAPÉIS
// ---

pub struct SuperAdminOnly;
impl RoleSet for SuperAdminOnly {
    fn allowed() -> &'static [Role] {
        &[Role::SuperAdmin]
    }
}

pub struct AdminOrAbove;
impl RoleSet for AdminOrAbove {
    fn allowed() -> &'static [Role] {
        &[Role::SuperAdmin, Role::Admin]
    }
}

pub struct StaffOrAbove;
impl RoleSet for StaffOrAbove {
    fn allowed() -> &'static [Role] {
        &[Role::SuperAdmin, Role::Admin, Role::Staff]
    }
}
