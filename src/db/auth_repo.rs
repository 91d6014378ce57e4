// src/db/auth_repo.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, metadata::RequestMetadata},
    models::auth::RefreshTokenRow,
};

// Persistência dos refresh tokens emitidos.
#[derive(Clone)]
pub struct AuthRepository {
    pool: PgPool,
}

impl AuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        metadata: &RequestMetadata,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRow, AppError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            INSERT INTO refresh_tokens (user_id, token, ip, user_agent, browser, os, device, country, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(metadata.ip.as_deref())
        .bind(metadata.user_agent.as_deref())
        .bind(metadata.browser.as_deref())
        .bind(metadata.os.as_deref())
        .bind(metadata.device.as_deref())
        .bind(metadata.country.as_deref())
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshTokenRow>, AppError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            "SELECT * FROM refresh_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // Rotação: a linha antiga sai e a nova entra na mesma transação,
    // para que um token nunca exista em dois estados ao mesmo tempo.
    pub async fn rotate_refresh_token(
        &self,
        old_token: &str,
        user_id: Uuid,
        new_token: &str,
        metadata: &RequestMetadata,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRow, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(old_token)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            INSERT INTO refresh_tokens (user_id, token, ip, user_agent, browser, os, device, country, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(new_token)
        .bind(metadata.ip.as_deref())
        .bind(metadata.user_agent.as_deref())
        .bind(metadata.browser.as_deref())
        .bind(metadata.os.as_deref())
        .bind(metadata.device.as_deref())
        .bind(metadata.country.as_deref())
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    pub async fn delete_refresh_token(&self, token: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
