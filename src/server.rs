use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::types::{ChatRequest, ChatResponse, HealthResponse};
use crate::AppState;

/// Cookie naming the caller's chat session.
pub const SESSION_COOKIE: &str = "resort_session";

const INDEX_HTML: &str = include_str!("../assets/index.html");

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/chat", post(chat_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the chat page and starts a fresh conversation.
async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(old_id) = session_id_from_headers(&headers) {
        state.sessions.remove(&old_id).await;
    }
    let handle = state.sessions.create().await;

    (
        [(header::SET_COOKIE, session_cookie(&handle.id))],
        Html(INDEX_HTML),
    )
        .into_response()
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "resort-scout".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Advances the caller's conversation by one message.
///
/// Always answers 200; failures along the way are part of the reply text.
async fn chat_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Response {
    let requested_id = session_id_from_headers(&headers);
    let handle = state.sessions.get_or_create(requested_id.as_deref()).await;
    info!(
        "Processing chat message ({} chars) for session {}",
        request.message.len(),
        handle.id
    );

    let reply = {
        let mut session = handle.session.lock().await;
        session.handle_message(&state, &request.message).await
    };

    if reply.finished {
        state.sessions.remove(&handle.id).await;
    }

    let body = Json(ChatResponse {
        response: reply.html,
    });
    if handle.created {
        ([(header::SET_COOKIE, session_cookie(&handle.id))], body).into_response()
    } else {
        body.into_response()
    }
}

fn session_cookie(id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

/// Session id from the `Cookie` header(s), if present.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_id_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; resort_session=abc-123; other=1"),
        );
        assert_eq!(session_id_from_headers(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_missing_or_empty_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id_from_headers(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("resort_session="));
        assert_eq!(session_id_from_headers(&headers), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("abc");
        assert!(cookie.starts_with("resort_session=abc;"));
        assert!(cookie.contains("HttpOnly"));
    }
}
