// src/middleware/audit.rs
//
// Captura cada requisição da API, classifica a ação, redige o payload e
// dispara a gravação da trilha sem segurar a resposta.

use axum::{
    body::{Body, to_bytes},
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    common::metadata::extract_metadata,
    config::AppState,
    models::{
        audit::{AuditAction, AuditStatus, NewAuditLog},
        user::Role,
    },
};

// Corpos acima disso não são gravados na trilha.
const MAX_CAPTURED_BODY: usize = 64 * 1024;

// Chaves sensíveis: a comparação é por substring, caso-insensível, então
// "refreshToken" e "accessToken" caem na regra de "token".
const SENSITIVE_KEYS: &[&str] = &["password", "token", "secret", "otp", "pin", "authorization"];

pub fn redact_payload(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map.iter_mut() {
                let lowered = key.to_lowercase();
                if SENSITIVE_KEYS.iter().any(|s| lowered.contains(s)) {
                    *nested = Value::String("[REDACTED]".to_string());
                } else {
                    redact_payload(nested);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact_payload(item);
            }
        }
        _ => {}
    }
}

// Casa um caminho concreto com um padrão onde ":" marca um segmento variável.
fn path_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/').filter(|s| !s.is_empty());
    let mut path_segments = path.split('/').filter(|s| !s.is_empty());
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) => {
                if !p.starts_with(':') && p != s {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

// Tabela ordenada de classificação: a primeira entrada que casar vence,
// então os padrões mais específicos vêm antes dos genéricos.
const CLASSIFICATION: &[(&str, &str, AuditAction, &str)] = &[
    ("POST", "/auth/login", AuditAction::LoginSuccess, "auth"),
    ("POST", "/auth/refresh", AuditAction::RefreshToken, "auth"),
    ("POST", "/auth/logout", AuditAction::Logout, "auth"),
    ("POST", "/auth/reset-password", AuditAction::ResetPassword, "auth"),
    ("POST", "/users/create-staff", AuditAction::CreateStaff, "users"),
    ("POST", "/users", AuditAction::CreateAdmin, "users"),
    ("PATCH", "/users/:id", AuditAction::UpdateUser, "users"),
    ("DELETE", "/users/:id", AuditAction::DeleteUser, "users"),
    ("POST", "/organizations", AuditAction::CreateOrganization, "organizations"),
    ("POST", "/invoice/vechile", AuditAction::CreateVechileInvoice, "vehicle-invoices"),
    ("PUT", "/invoice/vechile/:id", AuditAction::UpdateVechileInvoice, "vehicle-invoices"),
    ("DELETE", "/invoice/vechile/:id", AuditAction::DeleteVechileInvoice, "vehicle-invoices"),
    ("POST", "/invoice/purchase-documents", AuditAction::UploadPurchaseDocument, "purchase-documents"),
    ("POST", "/invoice", AuditAction::CreateInvoice, "invoices"),
    ("PUT", "/invoice/:id", AuditAction::UpdateInvoice, "invoices"),
    ("DELETE", "/invoice/:id", AuditAction::DeleteInvoice, "invoices"),
];

pub fn classify_action(method: &Method, path: &str) -> (AuditAction, String) {
    for (m, pattern, action, resource) in CLASSIFICATION {
        if method.as_str() == *m && path_matches(pattern, path) {
            return (*action, resource.to_string());
        }
    }
    // Catch-all: o recurso vira o primeiro segmento do caminho.
    let resource = path
        .split('/')
        .find(|s| !s.is_empty())
        .unwrap_or("root")
        .to_string();
    (AuditAction::ApiCall, resource)
}

fn extract_resource_id(path: &str) -> Option<Uuid> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .rev()
        .find_map(|segment| Uuid::parse_str(segment).ok())
}

fn is_multipart(request: &Request<Body>) -> bool {
    request
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/"))
        .unwrap_or(false)
}

pub async fn audit_middleware(
    State(app_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let metadata = extract_metadata(request.headers());

    // Claims já presentes quando a camada de auth rodou antes.
    let actor = request
        .extensions()
        .get::<crate::models::auth::Claims>()
        .cloned();

    // Multipart nunca entra inteiro na trilha, só a marcação.
    let (payload, request) = if is_multipart(&request) {
        (Some(json!({ "multipart": true })), request)
    } else {
        let (parts, body) = request.into_parts();
        match to_bytes(body, usize::MAX).await {
            Ok(bytes) => {
                // Corpos acima do teto seguem intactos, mas fora da trilha.
                let payload = if bytes.is_empty() || bytes.len() > MAX_CAPTURED_BODY {
                    None
                } else {
                    serde_json::from_slice::<Value>(&bytes).ok().map(|mut v| {
                        redact_payload(&mut v);
                        v
                    })
                };
                (payload, Request::from_parts(parts, Body::from(bytes)))
            }
            Err(_) => (None, Request::from_parts(parts, Body::empty())),
        }
    };

    let response = next.run(request).await;

    let status_code = response.status();
    let success = status_code.is_success();
    let (action, resource) = classify_action(&method, &path);
    let action = if action == AuditAction::LoginSuccess && !success {
        AuditAction::LoginFailed
    } else {
        action
    };

    // A resposta é rebufferizada para extrair a mensagem de erro e, no
    // login, o ator que acabou de se autenticar.
    let (response, response_json) = {
        let (parts, body) = response.into_parts();
        match to_bytes(body, usize::MAX).await {
            Ok(bytes) => {
                let parsed = if bytes.len() <= MAX_CAPTURED_BODY {
                    serde_json::from_slice::<Value>(&bytes).ok()
                } else {
                    None
                };
                (Response::from_parts(parts, Body::from(bytes)), parsed)
            }
            Err(_) => (Response::from_parts(parts, Body::empty()), None),
        }
    };

    let error_message = if success {
        None
    } else {
        response_json
            .as_ref()
            .and_then(|v| v.get("error"))
            .and_then(|v| v.as_str())
            .map(String::from)
    };

    let (mut actor_id, mut actor_role, mut organization_id) = match &actor {
        Some(claims) => (Some(claims.sub), claims.role, claims.org_id),
        None => (None, Role::System, None),
    };

    // Backfill: só o login bem-sucedido ganha o ator a partir da resposta.
    if action == AuditAction::LoginSuccess {
        if let Some(user) = response_json.as_ref().and_then(|v| v.get("user")) {
            actor_id = user
                .get("id")
                .and_then(|v| v.as_str())
                .and_then(|s| Uuid::parse_str(s).ok());
            actor_role = user
                .get("role")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or(Role::System);
            organization_id = user
                .get("orgId")
                .and_then(|v| v.as_str())
                .and_then(|s| Uuid::parse_str(s).ok());
        }
    }

    let entry = NewAuditLog {
        actor_id,
        actor_role,
        organization_id,
        action,
        resource,
        resource_id: extract_resource_id(&path),
        status: if success {
            AuditStatus::Success
        } else {
            AuditStatus::Failure
        },
        error_message,
        ip: metadata.ip,
        user_agent: metadata.user_agent,
        browser: metadata.browser,
        os: metadata.os,
        device: metadata.device,
        payload,
    };

    // A gravação roda fora do caminho da resposta.
    let audit_service = app_state.audit_service.clone();
    tokio::spawn(async move {
        audit_service.record(entry).await;
    });

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_routes_classify_before_generic_invoice() {
        let (action, resource) = classify_action(&Method::POST, "/invoice/vechile");
        assert_eq!(action, AuditAction::CreateVechileInvoice);
        assert_eq!(resource, "vehicle-invoices");

        let (action, _) = classify_action(&Method::POST, "/invoice");
        assert_eq!(action, AuditAction::CreateInvoice);
    }

    #[test]
    fn parameterized_paths_match() {
        let id = "7f1c1a2e-4d3b-4f5a-9c8d-1b2a3c4d5e6f";
        let (action, _) = classify_action(&Method::DELETE, &format!("/invoice/vechile/{id}"));
        assert_eq!(action, AuditAction::DeleteVechileInvoice);

        let (action, _) = classify_action(&Method::PUT, &format!("/invoice/{id}"));
        assert_eq!(action, AuditAction::UpdateInvoice);
    }

    #[test]
    fn unknown_routes_fall_back_to_api_call() {
        let (action, resource) = classify_action(&Method::GET, "/inventory/list");
        assert_eq!(action, AuditAction::ApiCall);
        assert_eq!(resource, "inventory");
    }

    #[test]
    fn document_upload_wins_over_generic_invoice() {
        let (action, resource) = classify_action(&Method::POST, "/invoice/purchase-documents");
        assert_eq!(action, AuditAction::UploadPurchaseDocument);
        assert_eq!(resource, "purchase-documents");
    }

    #[test]
    fn staff_creation_wins_over_admin_creation() {
        let (action, _) = classify_action(&Method::POST, "/users/create-staff");
        assert_eq!(action, AuditAction::CreateStaff);

        let (action, _) = classify_action(&Method::POST, "/users");
        assert_eq!(action, AuditAction::CreateAdmin);
    }

    #[test]
    fn redaction_is_recursive_and_case_insensitive() {
        let mut payload = json!({
            "email": "a@b.co",
            "Password": "hunter2",
            "nested": {
                "refreshToken": "abc",
                "list": [{ "accessToken": "xyz", "ok": 1 }],
            },
        });
        redact_payload(&mut payload);
        assert_eq!(payload["email"], "a@b.co");
        assert_eq!(payload["Password"], "[REDACTED]");
        assert_eq!(payload["nested"]["refreshToken"], "[REDACTED]");
        assert_eq!(payload["nested"]["list"][0]["accessToken"], "[REDACTED]");
        assert_eq!(payload["nested"]["list"][0]["ok"], 1);
    }

    #[test]
    fn resource_id_is_last_uuid_segment() {
        let id = "7f1c1a2e-4d3b-4f5a-9c8d-1b2a3c4d5e6f";
        assert_eq!(
            extract_resource_id(&format!("/invoice/vechile/{id}")),
            Uuid::parse_str(id).ok()
        );
        assert_eq!(extract_resource_id("/invoice/vechile"), None);
    }
}
