// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tokio::net::TcpListener;

mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::{audit::audit_middleware, auth::auth_middleware};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    app_state
        .bootstrap_super_admin()
        .await
        .expect("Falha ao garantir o SUPER_ADMIN inicial.");

    // Rotas públicas de autenticação (auditadas, sem guard)
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/logout", post(handlers::auth::logout))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            audit_middleware,
        ));

    // POST /users cria ADMINs; /users/create-staff cria STAFF da
    // organização do ator. GET /users lista ADMINs, GET /users/staff
    // lista o STAFF visível ao ator.
    let user_routes = Router::new()
        .route(
            "/",
            post(handlers::users::create_admin).get(handlers::users::list_admins),
        )
        .route("/create-staff", post(handlers::users::create_staff))
        .route("/staff", get(handlers::users::list_staff))
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        );

    let organization_routes = Router::new()
        .route(
            "/",
            post(handlers::organizations::create_organization)
                .get(handlers::organizations::list_organizations),
        )
        .route(
            "/{id}",
            get(handlers::organizations::get_organization)
                .patch(handlers::organizations::update_organization),
        );

    // A grafia "vechile" é herdada do contrato da API e mantida por
    // compatibilidade com os clientes existentes.
    let invoice_routes = Router::new()
        .route(
            "/vechile",
            post(handlers::invoice::create_vehicle).get(handlers::invoice::list_vehicles),
        )
        .route(
            "/vechile/{id}",
            get(handlers::invoice::get_vehicle)
                .put(handlers::invoice::update_vehicle)
                .delete(handlers::invoice::delete_vehicle),
        )
        .route(
            "/",
            post(handlers::invoice::create_invoice).get(handlers::invoice::list_invoices),
        )
        .route(
            "/purchase-documents",
            post(handlers::invoice::upload_documents).get(handlers::invoice::list_documents),
        )
        .route(
            "/{id}",
            get(handlers::invoice::get_invoice)
                .put(handlers::invoice::update_invoice)
                .delete(handlers::invoice::delete_invoice),
        );

    let inventory_routes = Router::new()
        .route(
            "/",
            post(handlers::inventory::create_batch).get(handlers::inventory::list_inventory),
        )
        .route(
            "/{id}",
            get(handlers::inventory::get_inventory_item)
                .patch(handlers::inventory::update_inventory_item)
                .delete(handlers::inventory::delete_inventory_item),
        );

    let compliance_routes = Router::new()
        .route(
            "/vechile-cod",
            post(handlers::compliance::create_cod_record)
                .get(handlers::compliance::list_cod_records),
        )
        .route(
            "/vechile-cod/vehicle/{vehicleId}",
            get(handlers::compliance::get_cod_record_by_vehicle),
        )
        .route("/vechile-cod/{id}", get(handlers::compliance::get_cod_record))
        .route(
            "/vechile-cod/{id}/rto",
            patch(handlers::compliance::update_cod_tracking),
        );

    let audit_routes = Router::new()
        .route("/", get(handlers::audit::list_audit_logs))
        .route("/staff", get(handlers::audit::list_staff_audit_logs))
        .route(
            "/maintenance/expired",
            delete(handlers::audit::delete_expired_audit_logs),
        )
        .route("/{id}", get(handlers::audit::get_audit_log));

    // Camadas: auth é a mais externa, para que a auditoria já enxergue o
    // ator autenticado nos extensions.
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/organizations", organization_routes)
        .nest("/invoice", invoice_routes)
        .nest("/inventory", inventory_routes)
        .nest("/vehicle-compliance", compliance_routes)
        .nest("/audit-logs", audit_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            audit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", auth_routes)
        .merge(protected)
        .with_state(app_state);

    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", addr);
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
