//! # scanlog-api
//!
//! HTTP CRUD service for scanned codes (the remote store).
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         scanlog-api                                     │
//! │                                                                         │
//! │  Device ──► HTTP :3000 ──► router ──► routes::* ──► CodeRepository     │
//! │                                                         │               │
//! │                                                         ▼               │
//! │                                                  SQLite `codes`         │
//! │                                                                         │
//! │  GET    /health          liveness                                      │
//! │  GET    /codigos?nc=     list (optional exact type filter)             │
//! │  POST   /codigos         create → 201 {id} + Location                  │
//! │  GET    /codigos/:id     read                                          │
//! │  PUT    /codigos/:id     partial update → {updated}                    │
//! │  DELETE /codigos/:id     delete → {deleted}                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. The collection path (`/codigos`) is the
//! `mount_path` setting.

pub mod config;
pub mod error;
pub mod routes;

use std::future::Future;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use scanlog_db::Database;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the service router.
pub fn router(state: AppState) -> Router {
    let collection = state.config.mount_path.clone();
    let item = format!("{collection}/{{id}}");

    Router::new()
        .route("/health", get(routes::health))
        .route(
            &collection,
            get(routes::list_codes).post(routes::create_code),
        )
        .route(
            &item,
            get(routes::get_code)
                .put(routes::update_code)
                .delete(routes::delete_code),
        )
        .with_state(state)
}

/// Serves the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, mount_path = %state.config.mount_path, "Serving scanned codes");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

// =============================================================================
// Route Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use scanlog_db::DbConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_router() -> (Router, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db.clone(), ApiConfig::default());
        (router(state), db)
    }

    async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "scanner.test");
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let req = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, location, json)
    }

    #[tokio::test]
    async fn create_read_filter_delete_scenario() {
        let (router, _db) = test_router().await;

        let (s, location, body) = call(
            &router,
            "POST",
            "/codigos",
            Some(r#"{"data":"ABC123","type":"qr"}"#),
        )
        .await;
        assert_eq!(s, StatusCode::CREATED);
        assert_eq!(body, json!({ "id": 1 }));
        let location = location.unwrap();
        assert!(location.ends_with("/1"), "{location}");
        assert_eq!(location, "http://scanner.test/codigos/1");

        let (s, _, body) = call(&router, "GET", "/codigos/1", None).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body, json!({ "id": 1, "data": "ABC123", "type": "qr" }));

        let (s, _, body) = call(&router, "GET", "/codigos?nc=qr", None).await;
        assert_eq!(s, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["data"], "ABC123");

        let (s, _, body) = call(&router, "DELETE", "/codigos/1", None).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body, json!({ "deleted": 1 }));

        let (s, _, body) = call(&router, "GET", "/codigos/1", None).await;
        assert_eq!(s, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn list_is_empty_array_not_error() {
        let (router, _db) = test_router().await;
        let (s, _, body) = call(&router, "GET", "/codigos", None).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn list_filter_returns_exact_subset() {
        let (router, _db) = test_router().await;
        for body in [
            r#"{"data":"A","type":"qr"}"#,
            r#"{"data":"B","type":"ean13"}"#,
            r#"{"data":"C","type":"qr"}"#,
        ] {
            let (s, _, _) = call(&router, "POST", "/codigos", Some(body)).await;
            assert_eq!(s, StatusCode::CREATED);
        }

        let (_, _, all) = call(&router, "GET", "/codigos", None).await;
        assert_eq!(all.as_array().unwrap().len(), 3);

        let (_, _, ean) = call(&router, "GET", "/codigos?nc=ean13", None).await;
        let ean = ean.as_array().unwrap();
        assert_eq!(ean.len(), 1);
        assert_eq!(ean[0]["data"], "B");

        // Empty filter behaves as no filter
        let (_, _, unfiltered) = call(&router, "GET", "/codigos?nc=", None).await;
        assert_eq!(unfiltered.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn invalid_ids_never_touch_storage() {
        let (router, db) = test_router().await;
        call(&router, "POST", "/codigos", Some(r#"{"data":"keep"}"#)).await;

        for raw in ["abc", "-1", "1.5", "1a", "%201"] {
            let uri = format!("/codigos/{raw}");

            let (s, _, body) = call(&router, "GET", &uri, None).await;
            assert_eq!(s, StatusCode::BAD_REQUEST, "GET {raw}");
            assert_eq!(body["code"], "INVALID_ID");

            let (s, _, _) = call(&router, "PUT", &uri, Some(r#"{"data":"x"}"#)).await;
            assert_eq!(s, StatusCode::BAD_REQUEST, "PUT {raw}");

            let (s, _, _) = call(&router, "DELETE", &uri, None).await;
            assert_eq!(s, StatusCode::BAD_REQUEST, "DELETE {raw}");
        }

        let stored = db.codes().list(None).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].data, "keep");
    }

    #[tokio::test]
    async fn absent_ids_are_not_found() {
        let (router, db) = test_router().await;
        call(&router, "POST", "/codigos", Some(r#"{"data":"keep"}"#)).await;

        for uri in ["/codigos/42", "/codigos/99999999999999999999"] {
            let (s, _, _) = call(&router, "GET", uri, None).await;
            assert_eq!(s, StatusCode::NOT_FOUND, "GET {uri}");

            let (s, _, _) = call(&router, "PUT", uri, Some(r#"{"data":"x"}"#)).await;
            assert_eq!(s, StatusCode::NOT_FOUND, "PUT {uri}");

            let (s, _, _) = call(&router, "DELETE", uri, None).await;
            assert_eq!(s, StatusCode::NOT_FOUND, "DELETE {uri}");
        }

        assert_eq!(db.codes().get_by_id(1).await.unwrap().unwrap().data, "keep");
    }

    #[tokio::test]
    async fn delete_twice_is_not_found_second_time() {
        let (router, _db) = test_router().await;
        call(&router, "POST", "/codigos", Some(r#"{"data":"A"}"#)).await;

        let (s, _, _) = call(&router, "DELETE", "/codigos/1", None).await;
        assert_eq!(s, StatusCode::OK);
        let (s, _, _) = call(&router, "DELETE", "/codigos/1", None).await;
        assert_eq!(s, StatusCode::NOT_FOUND);
        let (s, _, _) = call(&router, "DELETE", "/codigos/1", None).await;
        assert_eq!(s, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_defaults_and_bad_bodies() {
        let (router, _db) = test_router().await;

        let (s, _, body) = call(&router, "POST", "/codigos", Some("{}")).await;
        assert_eq!(s, StatusCode::CREATED);
        let id = body["id"].as_i64().unwrap();

        let (_, _, code) = call(&router, "GET", &format!("/codigos/{id}"), None).await;
        assert_eq!(code["data"], "");
        assert_eq!(code["type"], "QR");

        let (s, _, body) = call(&router, "POST", "/codigos", None).await;
        assert_eq!(s, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");

        let (s, _, _) = call(&router, "POST", "/codigos", Some("[1,2]")).await;
        assert_eq!(s, StatusCode::BAD_REQUEST);

        let (s, _, _) = call(&router, "POST", "/codigos", Some(r#"{"id":5}"#)).await;
        assert_eq!(s, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_scan_id_is_storage_error() {
        let (router, _db) = test_router().await;
        let body = r#"{"data":"A","type":"qr","scanId":"5f0c3a1e9b7d4c2a8e6f1b3d5a7c9e0f"}"#;

        let (s, _, _) = call(&router, "POST", "/codigos", Some(body)).await;
        assert_eq!(s, StatusCode::CREATED);

        let (s, _, err) = call(&router, "POST", "/codigos", Some(body)).await;
        assert_eq!(s, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err["code"], "STORAGE_ERROR");
        assert_eq!(err["message"], "Storage operation failed");
    }

    #[tokio::test]
    async fn update_semantics() {
        let (router, _db) = test_router().await;
        call(&router, "POST", "/codigos", Some(r#"{"data":"A","type":"qr"}"#)).await;

        let (s, _, body) = call(&router, "PUT", "/codigos/1", Some(r#"{"type":"aztec"}"#)).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body, json!({ "updated": 1 }));

        let (_, _, code) = call(&router, "GET", "/codigos/1", None).await;
        assert_eq!(code["data"], "A");
        assert_eq!(code["type"], "aztec");

        let (s, _, body) = call(&router, "PUT", "/codigos/1", Some("{}")).await;
        assert_eq!(s, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "EMPTY_UPDATE");

        let (s, _, body) = call(&router, "PUT", "/codigos/1", None).await;
        assert_eq!(s, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (router, _db) = test_router().await;
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), 64).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }
}
