//! HTTP server receiving GitHub webhook deliveries
//!
//! # Routes
//!
//! - `GET /health` - Liveness check
//! - `POST /issue-updated` - GitHub `issues` deliveries (path configurable)
//!
//! # Status codes
//!
//! | Case | Status |
//! |------|--------|
//! | Synced, or nothing to sync (`ping`, deleted/transferred issue) | 200, empty body |
//! | Signature missing or wrong | 401 |
//! | Body is not a valid `issues` payload | 400 |
//! | Project not provisioned | 412 |
//! | Issue cannot be translated (no title) | 422 |
//! | GitHub/YouTrack or network failure | 502 |

use super::guard::{SignatureGuard, SIGNATURE_HEADER};
use crate::config::SyncConfig;
use crate::model::IssueEvent;
use crate::sync::SyncEngine;
use crate::{Result, SyncError};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Header naming the event type of a delivery
pub const EVENT_HEADER: &str = "X-GitHub-Event";
/// Header carrying GitHub's unique delivery id
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

/// Shared state for request handlers
pub struct AppState {
    engine: Arc<SyncEngine>,
    guard: SignatureGuard,
    project_name: String,
}

/// Error body for non-success responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Webhook server
pub struct WebhookServer {
    state: Arc<AppState>,
    webhook_path: String,
    max_body_size: usize,
}

impl WebhookServer {
    pub fn new(config: &SyncConfig, engine: Arc<SyncEngine>) -> Self {
        Self {
            state: Arc::new(AppState {
                engine,
                guard: SignatureGuard::from_config(config),
                project_name: config.project_name().to_string(),
            }),
            webhook_path: config.server.webhook_path.clone(),
            max_body_size: config.server.max_body_size,
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route(&self.webhook_path, post(issue_updated))
            .layer(DefaultBodyLimit::max(self.max_body_size))
            .with_state(self.state.clone())
    }

    /// Run the server on the given address
    pub async fn run(self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| SyncError::Network(format!("Cannot bind {}: {}", addr, e)))?;

        info!(
            addr = addr,
            path = %self.webhook_path,
            project = %self.state.project_name,
            max_body_size = self.max_body_size,
            "Webhook server listening"
        );

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// HTTP status for a failed sync
pub fn status_for(err: &SyncError) -> StatusCode {
    match err {
        SyncError::Translation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SyncError::ProjectNotProvisioned(_) => StatusCode::PRECONDITION_FAILED,
        SyncError::Json(_) => StatusCode::BAD_REQUEST,
        SyncError::Destination(_)
        | SyncError::Http(_)
        | SyncError::Network(_)
        | SyncError::Source(_)
        | SyncError::Auth(_)
        | SyncError::Integration(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn issue_updated(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let delivery = header(&headers, DELIVERY_HEADER).unwrap_or("-");

    if !state.guard.verify(&body, header(&headers, SIGNATURE_HEADER)) {
        warn!(delivery = %delivery, "Rejected delivery with invalid signature");
        return Err(error_response(StatusCode::UNAUTHORIZED, "Invalid signature"));
    }

    // A delivery without an event header is treated as an issues event
    if let Some(event) = header(&headers, EVENT_HEADER) {
        if event != "issues" {
            debug!(delivery = %delivery, event = %event, "Ignoring non-issues event");
            return Ok(StatusCode::OK);
        }
    }

    let event: IssueEvent = serde_json::from_slice(&body).map_err(|e| {
        warn!(delivery = %delivery, error = %e, "Malformed issues payload");
        error_response(StatusCode::BAD_REQUEST, format!("Malformed payload: {}", e))
    })?;

    if event.is_terminal_removal() {
        info!(
            delivery = %delivery,
            source_id = %event.issue.id,
            action = %event.action,
            "Issue left the repository, nothing to sync"
        );
        return Ok(StatusCode::OK);
    }

    match state.engine.sync_issue(&event.issue, &state.project_name).await {
        Ok(outcome) => {
            debug!(
                delivery = %delivery,
                action = %event.action,
                issue = %outcome.issue().display_id(),
                created = outcome.was_created(),
                "Delivery synced"
            );
            Ok(StatusCode::OK)
        }
        Err(e) => {
            let status = status_for(&e);
            error!(
                delivery = %delivery,
                source_id = %event.issue.id,
                status = status.as_u16(),
                error = %e,
                "Sync failed"
            );
            Err(error_response(status, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DestinationFailure;
    use crate::sync::testing::{test_config, MemoryDestination, Operation};
    use crate::sync::Provisioner;
    use crate::webhook::guard::sign;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    async fn create_test_server(provision: bool) -> (Router, Arc<MemoryDestination>) {
        let config = test_config();
        let destination = Arc::new(MemoryDestination::new());
        if provision {
            let provisioner = Provisioner::new(&config, destination.clone());
            let project = provisioner
                .ensure_project(config.project_name(), &config.project_short_code())
                .await
                .unwrap();
            provisioner.ensure_correlation_field(&project.id).await.unwrap();
        }
        let engine = Arc::new(SyncEngine::new(&config, destination.clone()));
        (WebhookServer::new(&config, engine).router(), destination)
    }

    fn delivery(event: &str, body: &str, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/issue-updated")
            .header("Content-Type", "application/json")
            .header(EVENT_HEADER, event);
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn signed(event: &str, body: &str) -> Request<Body> {
        delivery(event, body, Some(sign(body.as_bytes(), "s3cret")))
    }

    fn issue_payload(action: &str, state: &str) -> String {
        json!({
            "action": action,
            "issue": {"id": 42, "number": 7, "title": "Crash on load", "body": null, "state": state}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = create_test_server(false).await;

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_signed_delivery_creates_then_updates() {
        let (app, destination) = create_test_server(true).await;

        let response = app
            .clone()
            .oneshot(signed("issues", &issue_payload("opened", "open")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());

        let response = app
            .oneshot(signed("issues", &issue_payload("closed", "closed")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stored = destination.issues_with_field("GitHubId", "42");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].field("State"), Some("Fixed"));
        assert_eq!(stored[0].description, "No description provided");
    }

    #[tokio::test]
    async fn test_replayed_delivery_creates_one_issue() {
        let (app, destination) = create_test_server(true).await;
        let payload = issue_payload("opened", "open");

        for _ in 0..2 {
            let response = app.clone().oneshot(signed("issues", &payload)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(destination.issues().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_signature_is_rejected_before_sync() {
        let (app, destination) = create_test_server(true).await;
        let payload = issue_payload("opened", "open");

        let wrong = delivery("issues", &payload, Some(sign(payload.as_bytes(), "other")));
        let response = app.clone().oneshot(wrong).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let missing = delivery("issues", &payload, None);
        let response = app.oneshot(missing).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(destination.calls(Operation::FindIssues), 0);
        assert!(destination.issues().is_empty());
    }

    #[tokio::test]
    async fn test_ping_is_acknowledged_without_sync() {
        let (app, destination) = create_test_server(true).await;

        let response = app
            .oneshot(signed("ping", r#"{"zen":"Keep it logically awesome."}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(destination.calls(Operation::FindIssues), 0);
    }

    #[tokio::test]
    async fn test_deleted_issue_is_skipped() {
        let (app, destination) = create_test_server(true).await;

        let response = app
            .oneshot(signed("issues", &issue_payload("deleted", "open")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(destination.issues().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_bad_request() {
        let (app, _) = create_test_server(true).await;

        let response = app
            .oneshot(signed("issues", r#"{"action":"opened"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_project_is_precondition_failed() {
        let (app, _) = create_test_server(false).await;

        let response = app
            .oneshot(signed("issues", &issue_payload("opened", "open")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn test_untitled_issue_is_unprocessable() {
        let (app, destination) = create_test_server(true).await;
        let payload = json!({"action": "opened", "issue": {"id": 5, "title": ""}}).to_string();

        let response = app.oneshot(signed("issues", &payload)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(destination.issues().is_empty());
    }

    #[tokio::test]
    async fn test_destination_failure_is_bad_gateway() {
        let (app, destination) = create_test_server(true).await;
        destination.fail_next(
            Operation::CreateIssue,
            DestinationFailure::new(500, None, Some("Internal error".to_string())),
        );

        let response = app
            .oneshot(signed("issues", &issue_payload("opened", "open")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&SyncError::ProjectNotProvisioned("x".to_string())),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            status_for(&SyncError::Source("rate limited".to_string())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&SyncError::Other("?".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
