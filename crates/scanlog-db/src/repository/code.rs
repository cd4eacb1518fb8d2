//! # Code Repository
//!
//! Database operations for scanned codes in the remote store.
//!
//! ## Key Operations
//! - List, optionally narrowed to one symbology
//! - Create with column defaults for absent fields
//! - Partial update and delete reporting the number of rows touched
//!
//! Ids are already validated and parsed by the caller; this layer never sees
//! a raw path segment.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use scanlog_core::{CodePatch, NewScannedCode, ScannedCode};

/// Repository for scanned-code database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = CodeRepository::new(pool);
///
/// let id = repo.insert(&NewScannedCode::new("ABC123", "qr")).await?;
/// let code = repo.get_by_id(id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CodeRepository {
    pool: SqlitePool,
}

impl CodeRepository {
    /// Creates a new CodeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CodeRepository { pool }
    }

    /// Lists stored codes in ascending id order.
    ///
    /// ## Arguments
    /// * `type_filter` - When set, only codes whose `type` equals it exactly
    pub async fn list(&self, type_filter: Option<&str>) -> DbResult<Vec<ScannedCode>> {
        debug!(type_filter = ?type_filter, "Listing codes");

        let codes = match type_filter {
            Some(code_type) => {
                sqlx::query_as::<_, ScannedCode>(
                    "SELECT id, scan_id, data, type FROM codes WHERE type = ?1 ORDER BY id",
                )
                .bind(code_type)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ScannedCode>(
                    "SELECT id, scan_id, data, type FROM codes ORDER BY id",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(codes)
    }

    /// Gets a code by id.
    ///
    /// ## Returns
    /// * `Ok(Some(code))` - Code found
    /// * `Ok(None)` - No record with that id
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<ScannedCode>> {
        let code = sqlx::query_as::<_, ScannedCode>(
            "SELECT id, scan_id, data, type FROM codes WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(code)
    }

    /// Gets a code by the client-generated scan identity.
    pub async fn get_by_scan_id(&self, scan_id: &str) -> DbResult<Option<ScannedCode>> {
        let code = sqlx::query_as::<_, ScannedCode>(
            "SELECT id, scan_id, data, type FROM codes WHERE scan_id = ?1",
        )
        .bind(scan_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(code)
    }

    /// Inserts a new code and returns its assigned id.
    ///
    /// Absent `data` becomes `''` and absent `type` becomes `'QR'`.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - the scan id is already stored
    pub async fn insert(&self, code: &NewScannedCode) -> DbResult<i64> {
        debug!(
            code_type = %code.resolved_type(),
            scan_id = ?code.scan_id,
            "Inserting code"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO codes (data, type, scan_id)
            VALUES (COALESCE(?1, ''), COALESCE(?2, 'QR'), ?3)
            "#,
        )
        .bind(code.data.as_deref())
        .bind(code.code_type.as_deref())
        .bind(code.scan_id.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: code.scan_id.clone().unwrap_or_default(),
            },
            other => other,
        })?;

        let id = result.last_insert_rowid();
        debug!(id = %id, "Code inserted");

        Ok(id)
    }

    /// Applies the present fields of `patch` to record `id`.
    ///
    /// ## Returns
    /// Number of rows changed: `0` means no record with that id.
    pub async fn update(&self, id: i64, patch: &CodePatch) -> DbResult<u64> {
        debug!(id = %id, "Updating code");

        let result = sqlx::query(
            r#"
            UPDATE codes SET
                data = COALESCE(?2, data),
                type = COALESCE(?3, type)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(patch.data.as_deref())
        .bind(patch.code_type.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes record `id`.
    ///
    /// ## Returns
    /// Number of rows removed: `0` means no record with that id.
    pub async fn delete(&self, id: i64) -> DbResult<u64> {
        debug!(id = %id, "Deleting code");

        let result = sqlx::query("DELETE FROM codes WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Counts stored codes.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM codes")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> CodeRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().codes()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = repo().await;

        let id = repo
            .insert(&NewScannedCode::new("ABC123", "qr"))
            .await
            .unwrap();
        assert_eq!(id, 1);

        let code = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(code.data, "ABC123");
        assert_eq!(code.code_type, "qr");
        assert_eq!(code.scan_id, None);

        assert!(repo.get_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_applies_defaults() {
        let repo = repo().await;

        let id = repo.insert(&NewScannedCode::default()).await.unwrap();
        let code = repo.get_by_id(id).await.unwrap().unwrap();

        assert_eq!(code.data, "");
        assert_eq!(code.code_type, "QR");
    }

    #[tokio::test]
    async fn test_duplicate_scan_id_rejected() {
        let repo = repo().await;
        let body = NewScannedCode::new("X", "qr").with_scan_id("scan-1");

        repo.insert(&body).await.unwrap();
        let err = repo.insert(&body).await.unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert!(field.contains("scan_id"));
                assert_eq!(value, "scan-1");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }

        let found = repo.get_by_scan_id("scan-1").await.unwrap().unwrap();
        assert_eq!(found.data, "X");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_with_filter() {
        let repo = repo().await;
        repo.insert(&NewScannedCode::new("A", "qr")).await.unwrap();
        repo.insert(&NewScannedCode::new("B", "ean13")).await.unwrap();
        repo.insert(&NewScannedCode::new("C", "qr")).await.unwrap();

        let all = repo.list(None).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let qr = repo.list(Some("qr")).await.unwrap();
        assert_eq!(qr.len(), 2);
        assert!(qr.iter().all(|c| c.code_type == "qr"));

        // Exact match only
        assert!(repo.list(Some("QR")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_partial() {
        let repo = repo().await;
        let id = repo.insert(&NewScannedCode::new("A", "qr")).await.unwrap();

        let patch = CodePatch {
            data: None,
            code_type: Some("aztec".to_string()),
        };
        assert_eq!(repo.update(id, &patch).await.unwrap(), 1);

        let code = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(code.data, "A");
        assert_eq!(code.code_type, "aztec");

        assert_eq!(repo.update(42, &patch).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let repo = repo().await;
        let id = repo.insert(&NewScannedCode::new("A", "qr")).await.unwrap();

        assert_eq!(repo.delete(id).await.unwrap(), 1);
        assert_eq!(repo.delete(id).await.unwrap(), 0);
        assert!(repo.get_by_id(id).await.unwrap().is_none());
    }
}
