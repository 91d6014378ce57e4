// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    db::{
        AuditRepository, AuthRepository, ComplianceRepository, InventoryRepository,
        InvoiceRepository, OrganizationRepository, UserRepository,
    },
    services::{
        audit_service::AuditService,
        auth::{AuthService, JwtConfig},
        compliance_service::ComplianceService,
        inventory_service::InventoryService,
        invoice_service::InvoiceService,
        organizations_service::OrganizationsService,
        storage_service::DiskStorage,
        users_service::UsersService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub users_service: UsersService,
    pub organizations_service: OrganizationsService,
    pub invoice_service: InvoiceService,
    pub inventory_service: InventoryService,
    pub compliance_service: ComplianceService,
    pub audit_service: AuditService,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt = JwtConfig {
            access_secret: env::var("JWT_ACCESS_SECRET")
                .expect("JWT_ACCESS_SECRET deve ser definido"),
            refresh_secret: env::var("JWT_REFRESH_SECRET")
                .expect("JWT_REFRESH_SECRET deve ser definido"),
            access_ttl_minutes: env_or("JWT_ACCESS_TTL_MINUTES", "15")
                .parse()
                .expect("JWT_ACCESS_TTL_MINUTES deve ser um inteiro"),
            refresh_ttl_days: env_or("JWT_REFRESH_TTL_DAYS", "7")
                .parse()
                .expect("JWT_REFRESH_TTL_DAYS deve ser um inteiro"),
        };

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let org_repo = OrganizationRepository::new(db_pool.clone());
        let auth_repo = AuthRepository::new(db_pool.clone());
        let invoice_repo = InvoiceRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let compliance_repo = ComplianceRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());

        let storage = Arc::new(DiskStorage::new(
            env_or("UPLOAD_DIR", "./uploads"),
            env_or("PUBLIC_BASE_URL", "http://localhost:3000/uploads"),
        ));

        let auth_service = AuthService::new(
            user_repo.clone(),
            org_repo.clone(),
            auth_repo,
            jwt,
        );
        let users_service = UsersService::new(user_repo.clone(), org_repo.clone());
        let organizations_service = OrganizationsService::new(org_repo.clone());
        let invoice_service = InvoiceService::new(invoice_repo.clone(), org_repo, storage);
        let inventory_service = InventoryService::new(inventory_repo, invoice_repo.clone());
        let compliance_service = ComplianceService::new(compliance_repo, invoice_repo);
        let audit_service = AuditService::new(audit_repo);

        Ok(Self {
            db_pool,
            auth_service,
            users_service,
            organizations_service,
            invoice_service,
            inventory_service,
            compliance_service,
            audit_service,
        })
    }

    // Garante o SUPER_ADMIN inicial a partir do ambiente. Idempotente:
    // se o e-mail já existe, não faz nada.
    pub async fn bootstrap_super_admin(&self) -> anyhow::Result<()> {
        let (Ok(email), Ok(password)) = (
            env::var("SUPER_ADMIN_EMAIL"),
            env::var("SUPER_ADMIN_PASSWORD"),
        ) else {
            tracing::warn!("SUPER_ADMIN_EMAIL/PASSWORD ausentes; bootstrap pulado");
            return Ok(());
        };
        let name = env_or("SUPER_ADMIN_NAME", "Super Admin");
        let email = email.trim().to_lowercase();

        let user_repo = UserRepository::new(self.db_pool.clone());
        if user_repo.find_by_email(&email).await?.is_some() {
            return Ok(());
        }

        let password_hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
                .await??;
        user_repo
            .create(
                &name,
                &email,
                &password_hash,
                crate::models::user::Role::SuperAdmin,
                None,
            )
            .await?;
        tracing::info!("✅ SUPER_ADMIN inicial criado: {}", email);
        Ok(())
    }
}
