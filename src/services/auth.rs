// src/services/auth.rs

use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::{error::AppError, metadata::RequestMetadata, security::legacy_dotless_email},
    db::{AuthRepository, OrganizationRepository, UserRepository},
    models::{
        auth::{Claims, LoginResponse, TokenPairResponse, UserSummary},
        user::User,
    },
};

// Parâmetros de emissão de tokens, carregados do ambiente na subida.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    org_repo: OrganizationRepository,
    auth_repo: AuthRepository,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        org_repo: OrganizationRepository,
        auth_repo: AuthRepository,
        jwt: JwtConfig,
    ) -> Self {
        Self {
            user_repo,
            org_repo,
            auth_repo,
            jwt,
        }
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        metadata: &RequestMetadata,
    ) -> Result<LoginResponse, AppError> {
        let normalized = email.trim().to_lowercase();

        // Contas antigas foram gravadas com o e-mail sem pontos no local part;
        // a busca direta vem primeiro, o formato legado é o fallback.
        let user = match self.user_repo.find_by_email(&normalized).await? {
            Some(user) => Some(user),
            None => match legacy_dotless_email(&normalized) {
                Some(legacy) => self.user_repo.find_by_email(&legacy).await?,
                None => None,
            },
        };
        let user = user.ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

        if !user.is_active {
            return Err(AppError::forbidden("Account is disabled"));
        }
        if let Some(org_id) = user.organization_id {
            let org = self
                .org_repo
                .find_by_id(org_id)
                .await?
                .ok_or_else(|| AppError::forbidden("Organization is inactive"))?;
            if !org.is_active {
                return Err(AppError::forbidden("Organization is inactive"));
            }
        }

        let password = password.to_owned();
        let password_hash = user.password_hash.clone();
        let is_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
        if !is_valid {
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        let (access_token, refresh_token) = self.issue_token_pair(&user)?;
        let expires_at = Utc::now() + Duration::days(self.jwt.refresh_ttl_days);
        self.auth_repo
            .create_refresh_token(user.id, &refresh_token, metadata, expires_at)
            .await?;

        tracing::info!("✅ Login de {} ({:?})", user.email, user.role);

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user: UserSummary {
                id: user.id,
                role: user.role,
                org_id: user.organization_id,
                email: user.email,
                name: user.name,
            },
        })
    }

    // Rotação: o refresh apresentado é consumido e um novo par é emitido.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        metadata: &RequestMetadata,
    ) -> Result<TokenPairResponse, AppError> {
        let claims = self.decode_refresh(refresh_token)?;

        let row = self
            .auth_repo
            .find_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

        if row.expires_at < Utc::now() {
            self.auth_repo.delete_refresh_token(refresh_token).await?;
            return Err(AppError::unauthorized("Refresh token expired"));
        }

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;
        if !user.is_active {
            return Err(AppError::forbidden("Account is disabled"));
        }

        let (access_token, new_refresh) = self.issue_token_pair(&user)?;
        let expires_at = Utc::now() + Duration::days(self.jwt.refresh_ttl_days);
        self.auth_repo
            .rotate_refresh_token(refresh_token, user.id, &new_refresh, metadata, expires_at)
            .await?;

        Ok(TokenPairResponse {
            access_token,
            refresh_token: new_refresh,
        })
    }

    // Logout é tolerante: token desconhecido ou já removido não é erro.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        self.auth_repo.delete_refresh_token(refresh_token).await?;
        Ok(())
    }

    // Varredura do TTL dos refresh tokens, disparada junto com a da
    // auditoria na rota de manutenção.
    pub async fn purge_expired_tokens(&self) -> Result<u64, AppError> {
        let removed = self.auth_repo.delete_expired().await?;
        if removed > 0 {
            tracing::info!("🧹 {} refresh tokens expirados removidos", removed);
        }
        Ok(removed)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt.access_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;
        Ok(data.claims)
    }

    fn decode_refresh(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt.refresh_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::unauthorized("Invalid refresh token"))?;
        Ok(data.claims)
    }

    fn issue_token_pair(&self, user: &User) -> Result<(String, String), AppError> {
        let access = self.encode_token(
            user,
            &self.jwt.access_secret,
            Duration::minutes(self.jwt.access_ttl_minutes),
        )?;
        let refresh = self.encode_token(
            user,
            &self.jwt.refresh_secret,
            Duration::days(self.jwt.refresh_ttl_days),
        )?;
        Ok((access, refresh))
    }

    fn encode_token(
        &self,
        user: &User,
        secret: &str,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            org_id: user.organization_id,
            name: user.name.clone(),
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )?)
    }
}
