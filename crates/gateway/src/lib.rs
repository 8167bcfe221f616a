//! HTTP API gateway for DigiBuddy.
//!
//! Endpoints:
//!
//! - `GET /api/health`: liveness probe
//! - `POST /api/chat`: resolve a message (plus optional history) to a reply
//!
//! A chat request that reaches the resolver always gets a `200`: a failed
//! model call shows up as the fallback text, never as an error status.

use axum::extract::DefaultBodyLimit;
use axum::extract::rejection::JsonRejection;
use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use digibuddy_config::{AppConfig, GatewayConfig};
use digibuddy_core::message::{Turn, deserialize_history};
use digibuddy_resolver::{ResponseResolver, load_knowledge};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub resolver: Arc<ResponseResolver>,
    /// Attach provider error detail to fallback replies.
    pub expose_errors: bool,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Any origin when none are configured, otherwise only the listed ones.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
///
/// Loads the knowledge base and provider once; every request shares them
/// through a single resolver.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let knowledge = Arc::new(load_knowledge(&config.resolver)?);
    let provider = digibuddy_providers::build_from_config(&config)?;
    let resolver = Arc::new(ResponseResolver::from_config(&config, knowledge, provider));

    info!(
        provider = %resolver.provider_name(),
        model = %config.model,
        entries = resolver.knowledge().len(),
        "Resolver ready"
    );

    let state = Arc::new(GatewayState {
        resolver,
        expose_errors: config.gateway.expose_errors,
    });
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

// --- Handlers ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

async fn health_handler() -> Json<HealthResponse> {
    let now = chrono::Utc::now();
    Json(HealthResponse {
        status: "online".into(),
        timestamp: now.timestamp_micros() as f64 / 1_000_000.0,
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,

    /// Malformed turns are defaulted, and a non-array history is empty.
    #[serde(default, deserialize_with = "deserialize_history")]
    pub history: Vec<Turn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn no_message() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "No message provided".into(),
        }),
    )
}

async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(reason = %rejection.body_text(), "Rejected chat request");
        no_message()
    })?;

    let Some(message) = request.message else {
        return Err(no_message());
    };

    info!(
        message_len = message.len(),
        history = request.history.len(),
        "Chat message received"
    );

    let result = state.resolver.resolve(&message, &request.history).await;

    let error = if state.expose_errors { result.error } else { None };
    Ok(Json(ChatResponse {
        response: result.text,
        error,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use digibuddy_core::error::ProviderError;
    use digibuddy_core::knowledge::KnowledgeBase;
    use digibuddy_core::message::Message;
    use digibuddy_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let roles: Vec<String> = request
                .messages
                .iter()
                .map(|m| format!("{:?}", m.role))
                .collect();
            Ok(ProviderResponse {
                message: Message::assistant(roles.join(",")),
                usage: None,
                model: "echo".into(),
            })
        }
    }

    struct DownProvider;

    #[async_trait]
    impl Provider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::AuthenticationFailed("invalid key".into()))
        }
    }

    fn app(provider: Arc<dyn Provider>, expose_errors: bool) -> Router {
        let resolver = ResponseResolver::new(Arc::new(KnowledgeBase::builtin()), provider, "test");
        let state = Arc::new(GatewayState {
            resolver: Arc::new(resolver),
            expose_errors,
        });
        build_router(state, &GatewayConfig::default())
    }

    fn chat(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let req = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();

        let response = app(Arc::new(EchoProvider), false).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let health: HealthResponse = body_json(response).await;
        assert_eq!(health.status, "online");
        assert!(health.timestamp > 1_600_000_000.0);
    }

    #[tokio::test]
    async fn chat_answers_from_knowledge_base() {
        let response = app(Arc::new(DownProvider), false)
            .oneshot(chat(r#"{"message": "How do I update my apps?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let chat: ChatResponse = body_json(response).await;
        assert!(chat.response.starts_with("To update your apps"));
        assert!(chat.error.is_none());
    }

    #[tokio::test]
    async fn chat_forwards_web_client_history() {
        let body = r#"{
            "message": "What is a QR code?",
            "history": [{"type": "user", "text": "Hi"}, {"type": "bot", "text": "Hello!"}]
        }"#;
        let response = app(Arc::new(EchoProvider), false)
            .oneshot(chat(body))
            .await
            .unwrap();

        let chat: ChatResponse = body_json(response).await;
        assert_eq!(chat.response, "System,User,Assistant,User");
    }

    async fn roles_for(history: &str) -> (StatusCode, String) {
        let body = format!(r#"{{"message": "What is a QR code?", "history": {history}}}"#);
        let response = app(Arc::new(EchoProvider), false)
            .oneshot(chat(&body))
            .await
            .unwrap();
        let status = response.status();
        let chat: ChatResponse = body_json(response).await;
        (status, chat.response)
    }

    #[tokio::test]
    async fn null_turn_text_is_defaulted() {
        let (status, roles) = roles_for(r#"[{"type": "bot", "text": null}]"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(roles, "System,Assistant,User");
    }

    #[tokio::test]
    async fn non_string_role_is_user() {
        let (status, roles) = roles_for(r#"[{"role": 1, "text": "Hi"}]"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(roles, "System,User,User");
    }

    #[tokio::test]
    async fn turn_with_role_and_type_is_accepted() {
        let history = r#"[{"role": "user", "type": "bot", "text": "Hi"}]"#;
        let (status, roles) = roles_for(history).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(roles, "System,User,User");
    }

    #[tokio::test]
    async fn null_or_non_list_history_is_empty() {
        for history in ["null", r#""oops""#, "{}"] {
            let (status, roles) = roles_for(history).await;
            assert_eq!(status, StatusCode::OK, "history: {history}");
            assert_eq!(roles, "System,User", "history: {history}");
        }
    }

    #[tokio::test]
    async fn null_history_with_stored_question() {
        let response = app(Arc::new(DownProvider), false)
            .oneshot(chat(r#"{"message": "How do I update my apps?", "history": null}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let chat: ChatResponse = body_json(response).await;
        assert!(chat.response.starts_with("To update your apps"));
    }

    #[tokio::test]
    async fn provider_failure_still_returns_ok() {
        let response = app(Arc::new(DownProvider), false)
            .oneshot(chat(r#"{"message": "What is a QR code?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let chat: ChatResponse = body_json(response).await;
        assert!(chat.response.starts_with("I'm sorry"));
        assert!(chat.error.is_none());
    }

    #[tokio::test]
    async fn provider_failure_detail_exposed_when_enabled() {
        let response = app(Arc::new(DownProvider), true)
            .oneshot(chat(r#"{"message": "What is a QR code?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let chat: ChatResponse = body_json(response).await;
        assert!(chat.response.starts_with("I'm sorry"));
        assert!(chat.error.unwrap().contains("invalid key"));
    }

    #[tokio::test]
    async fn missing_message_is_bad_request() {
        let response = app(Arc::new(EchoProvider), false)
            .oneshot(chat(r#"{"history": []}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let err: ErrorResponse = body_json(response).await;
        assert_eq!(err.error, "No message provided");
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let response = app(Arc::new(EchoProvider), false)
            .oneshot(chat("not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn cors_layer_skips_invalid_origins() {
        // Building must not panic on a bad origin.
        let _ = cors_layer(&["http://localhost:3000".into(), "bad\norigin".into()]);
        let _ = cors_layer(&[]);
    }
}
