//! # HTTP Routes
//!
//! Handlers for the `codigos` collection.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET|PUT|DELETE {mount}/:id                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  parse_code_id(id) ── not ^\d+$ ──► 400 INVALID_ID (no storage call)   │
//! │       │                                                                 │
//! │       ├── beyond i64 ──► 404 NOT_FOUND (no storage call)               │
//! │       ▼                                                                 │
//! │  decode body (PUT) ── empty / not an object ──► 400 BAD_REQUEST        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CodeRepository ── 0 rows ──► 404 NOT_FOUND                            │
//! │       │           └─ DbError ──► 500 STORAGE_ERROR                     │
//! │       ▼                                                                 │
//! │  200 record | {"updated": n} | {"deleted": n}                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use scanlog_core::validation::{parse_code_id, validate_patch};
use scanlog_core::{CodePatch, NewScannedCode, ScannedCode};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Query string of the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Exact `type` to filter by. Empty means no filter.
    pub nc: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /health`
pub async fn health() -> &'static str {
    "OK"
}

/// `GET {mount}?nc=<type>`
pub async fn list_codes(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<ScannedCode>>> {
    let filter = params.nc.as_deref().filter(|nc| !nc.is_empty());
    let codes = state.db.codes().list(filter).await?;

    debug!(count = codes.len(), type_filter = ?filter, "Listed codes");
    Ok(Json(codes))
}

/// `GET {mount}/:id`
pub async fn get_code(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<ScannedCode>> {
    let id = existing_id(&raw_id)?;

    state
        .db
        .codes()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::code_not_found(id))
}

/// `POST {mount}`
///
/// Responds 201 with `{"id": n}` and a `Location` header for the new record.
pub async fn create_code(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let new_code: NewScannedCode = decode_body(&body)?;

    let id = state.db.codes().insert(&new_code).await?;
    let location = location_for(&headers, &state.config.mount_path, id);

    info!(id = %id, code_type = %new_code.resolved_type(), "Code created");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(json!({ "id": id })),
    ))
}

/// `PUT {mount}/:id`
pub async fn update_code(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_code_id(&raw_id)?;
    let patch: CodePatch = decode_body(&body)?;
    validate_patch(&patch)?;

    let id = id.ok_or_else(|| ApiError::code_not_found(&raw_id))?;

    let updated = state.db.codes().update(id, &patch).await?;
    if updated == 0 {
        return Err(ApiError::code_not_found(id));
    }

    info!(id = %id, "Code updated");
    Ok(Json(json!({ "updated": updated })))
}

/// `DELETE {mount}/:id`
pub async fn delete_code(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = existing_id(&raw_id)?;

    let deleted = state.db.codes().delete(id).await?;
    if deleted == 0 {
        return Err(ApiError::code_not_found(id));
    }

    info!(id = %id, "Code deleted");
    Ok(Json(json!({ "deleted": deleted })))
}

// =============================================================================
// Helpers
// =============================================================================

/// Validates a path id; well-formed ids outside `i64` are reported missing.
fn existing_id(raw_id: &str) -> ApiResult<i64> {
    parse_code_id(raw_id)?.ok_or_else(|| ApiError::code_not_found(raw_id))
}

/// Decodes a JSON object body.
fn decode_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("Request body is required".to_string()));
    }

    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed JSON body: {e}")))?;

    if !value.is_object() {
        return Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))
}

/// `<scheme>://<host><mount>/<id>`, or the path alone without a `Host`.
fn location_for(headers: &HeaderMap, mount_path: &str, id: i64) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty());

    match host {
        Some(host) => {
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("http");
            format!("{scheme}://{host}{mount_path}/{id}")
        }
        None => format!("{mount_path}/{id}"),
    }
}
