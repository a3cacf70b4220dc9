pub mod documents;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the Axum router with all API routes, CORS, and tracing middleware.
pub fn build_router(state: Arc<AppState>, max_document_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let document_routes = Router::new().route(
        "/:user_id",
        axum::routing::put(documents::put_document)
            .get(documents::get_document)
            .delete(documents::delete_document),
    );

    Router::new()
        .nest("/api/documents", document_routes)
        .route("/health", axum::routing::get(health_check))
        .layer(DefaultBodyLimit::max(max_document_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Simple health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    // The pool never connects; these requests are answered before any query.
    fn router() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();
        build_router(Arc::new(AppState { pool }), 1024)
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 64).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_put_rejects_non_base64_payload() {
        let body = r#"{"encryptedData":"***","nonce":"AAAAAAAAAAAAAAAA","updatedAt":"2024-05-01T10:00:00Z"}"#;
        let response = router()
            .oneshot(
                Request::put("/api/documents/alice")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("encryptedData"));
    }

    #[tokio::test]
    async fn test_put_rejects_oversized_body() {
        let big = "A".repeat(4096);
        let body = format!(
            r#"{{"encryptedData":"{big}","nonce":"AAAAAAAAAAAAAAAA","updatedAt":"2024-05-01T10:00:00Z"}}"#
        );
        let response = router()
            .oneshot(
                Request::put("/api/documents/alice")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
