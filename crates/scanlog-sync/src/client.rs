//! # Remote Store Client
//!
//! The device's view of the remote `codigos` collection.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP answer                     SyncError                              │
//! │  ───────────                     ─────────                              │
//! │  2xx                          →  Ok(..)                                 │
//! │  400 {"code","message"}       →  InvalidRequest { code, message }      │
//! │  404                          →  NotFound                               │
//! │  5xx / anything else          →  Remote { status, message }            │
//! │  connect / timeout            →  ConnectionFailed / Timeout            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use scanlog_core::{CodePatch, NewScannedCode, ScannedCode};

use crate::config::{ApiSettings, ClientConfig};
use crate::error::{SyncError, SyncResult};

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCode {
    /// Id assigned by the remote store.
    pub id: i64,

    /// `Location` header, when the server sent one.
    pub location: Option<String>,
}

/// Operations of the remote store.
///
/// The coordinator only sees this trait, so tests can swap in a fake.
#[async_trait]
pub trait RemoteCodes: Send + Sync + Debug {
    /// Lists records, optionally only those of one type.
    async fn list(&self, type_filter: Option<&str>) -> SyncResult<Vec<ScannedCode>>;

    /// Fetches one record.
    async fn get(&self, id: i64) -> SyncResult<ScannedCode>;

    /// Creates a record.
    async fn create(&self, code: &NewScannedCode) -> SyncResult<CreatedCode>;

    /// Applies a partial update; returns the number of rows changed.
    async fn update(&self, id: i64, patch: &CodePatch) -> SyncResult<u64>;

    /// Deletes a record; returns the number of rows removed.
    async fn delete(&self, id: i64) -> SyncResult<u64>;
}

// =============================================================================
// Wire Shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct CreatedBody {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct UpdatedBody {
    updated: u64,
}

#[derive(Debug, Deserialize)]
struct DeletedBody {
    deleted: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

// =============================================================================
// HTTP Client
// =============================================================================

/// `RemoteCodes` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCodesClient {
    http: reqwest::Client,
    collection: Url,
}

impl HttpCodesClient {
    /// Builds a client from the `[api]` settings.
    pub fn new(settings: &ApiSettings) -> SyncResult<Self> {
        let config = ClientConfig {
            api: settings.clone(),
            ..ClientConfig::default()
        };
        let collection = config.collection_url()?;

        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;

        Ok(HttpCodesClient { http, collection })
    }

    /// Builds a client for a collection URL with default settings.
    pub fn with_base_url(base_url: impl Into<String>) -> SyncResult<Self> {
        HttpCodesClient::new(&ApiSettings {
            base_url: base_url.into(),
            ..ApiSettings::default()
        })
    }

    /// URL of the collection.
    pub fn collection_url(&self) -> &Url {
        &self.collection
    }

    fn item_url(&self, id: i64) -> SyncResult<Url> {
        let mut url = self.collection.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidUrl(self.collection.to_string()))?
            .pop_if_empty()
            .push(&id.to_string());
        Ok(url)
    }
}

/// Passes 2xx responses through and turns the rest into `SyncError`.
async fn check(response: Response) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            warn!(status = %status, error = %e, "Could not read error body");
            String::new()
        }
    };
    let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.code, body.message),
        Err(_) => (String::new(), text),
    };

    Err(match status {
        StatusCode::BAD_REQUEST => SyncError::InvalidRequest { code, message },
        StatusCode::NOT_FOUND => SyncError::NotFound(message),
        other => SyncError::Remote {
            status: other.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl RemoteCodes for HttpCodesClient {
    async fn list(&self, type_filter: Option<&str>) -> SyncResult<Vec<ScannedCode>> {
        let mut request = self.http.get(self.collection.clone());
        if let Some(code_type) = type_filter {
            request = request.query(&[("nc", code_type)]);
        }

        let codes: Vec<ScannedCode> = check(request.send().await?).await?.json().await?;
        debug!(count = codes.len(), "Fetched remote codes");
        Ok(codes)
    }

    async fn get(&self, id: i64) -> SyncResult<ScannedCode> {
        let response = self.http.get(self.item_url(id)?).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn create(&self, code: &NewScannedCode) -> SyncResult<CreatedCode> {
        let response = self
            .http
            .post(self.collection.clone())
            .json(code)
            .send()
            .await?;
        let response = check(response).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body: CreatedBody = response.json().await?;

        debug!(id = %body.id, "Remote code created");
        Ok(CreatedCode {
            id: body.id,
            location,
        })
    }

    async fn update(&self, id: i64, patch: &CodePatch) -> SyncResult<u64> {
        let response = self
            .http
            .put(self.item_url(id)?)
            .json(patch)
            .send()
            .await?;
        let body: UpdatedBody = check(response).await?.json().await?;
        Ok(body.updated)
    }

    async fn delete(&self, id: i64) -> SyncResult<u64> {
        let response = self.http.delete(self.item_url(id)?).send().await?;
        let body: DeletedBody = check(response).await?.json().await?;
        Ok(body.deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanlog_api::{serve, ApiConfig, AppState};
    use scanlog_db::{Database, DbConfig};
    use tokio::net::TcpListener;

    /// Starts the real API on an ephemeral port and returns its collection URL.
    async fn spawn_api() -> String {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db, ApiConfig::default());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(serve(listener, state, std::future::pending()));

        format!("http://{addr}/codigos")
    }

    #[test]
    fn test_item_url() {
        let client = HttpCodesClient::with_base_url("http://h:1/codigos").unwrap();
        assert_eq!(client.item_url(5).unwrap().as_str(), "http://h:1/codigos/5");

        let client = HttpCodesClient::with_base_url("http://h:1/codigos/").unwrap();
        assert_eq!(client.item_url(5).unwrap().as_str(), "http://h:1/codigos/5");
    }

    #[tokio::test]
    async fn test_crud_against_server() {
        let base = spawn_api().await;
        let client = HttpCodesClient::with_base_url(&base).unwrap();

        assert!(client.list(None).await.unwrap().is_empty());

        let created = client
            .create(&NewScannedCode::new("ABC123", "qr").with_scan_id("s1"))
            .await
            .unwrap();
        assert_eq!(created.id, 1);
        assert!(created.location.unwrap().ends_with("/codigos/1"));

        let code = client.get(1).await.unwrap();
        assert_eq!(code.data, "ABC123");
        assert_eq!(code.scan_id.as_deref(), Some("s1"));

        client
            .create(&NewScannedCode::new("X", "code128"))
            .await
            .unwrap();
        assert_eq!(client.list(None).await.unwrap().len(), 2);
        assert_eq!(client.list(Some("qr")).await.unwrap().len(), 1);

        let patch = CodePatch {
            data: Some("ABC124".to_string()),
            code_type: None,
        };
        assert_eq!(client.update(1, &patch).await.unwrap(), 1);
        assert_eq!(client.get(1).await.unwrap().data, "ABC124");

        assert_eq!(client.delete(1).await.unwrap(), 1);
        assert!(client.get(1).await.unwrap_err().is_not_found());
        assert!(client.delete(1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let base = spawn_api().await;
        let client = HttpCodesClient::with_base_url(&base).unwrap();

        let err = client.update(1, &CodePatch::default()).await.unwrap_err();
        match err {
            SyncError::InvalidRequest { code, .. } => assert_eq!(code, "EMPTY_UPDATE"),
            other => panic!("expected InvalidRequest, got {other:?}"),
        }

        let body = NewScannedCode::new("A", "qr").with_scan_id("dup");
        client.create(&body).await.unwrap();
        let err = client.create(&body).await.unwrap_err();
        assert!(matches!(err, SyncError::Remote { status: 500, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_truncated_error_body_keeps_status() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            // Promises 100 bytes, sends 5, then hangs up
            socket
                .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 100\r\n\r\nshort")
                .await
                .unwrap();
        });

        let client = HttpCodesClient::with_base_url(format!("http://{addr}/codigos")).unwrap();
        let err = client.list(None).await.unwrap_err();

        match err {
            SyncError::Remote { status, ref message } => {
                assert_eq!(status, 503);
                assert!(message.is_empty(), "{message:?}");
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpCodesClient::with_base_url(format!("http://{addr}/codigos")).unwrap();
        let err = client.list(None).await.unwrap_err();
        assert!(err.is_retryable(), "{err:?}");
    }
}
