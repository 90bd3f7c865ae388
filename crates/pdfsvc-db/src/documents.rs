//! Document repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use pdfsvc_core::{DocumentRecord, DocumentRepository, DocumentSummary, Error, Result};

use crate::map_write_error;

/// PostgreSQL implementation of DocumentRepository.
pub struct PgDocumentRepository {
    pool: Pool<Postgres>,
}

impl PgDocumentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, document: &DocumentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO document (id, content, created_at_utc)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(document.id)
        .bind(&document.content)
        .bind(document.created_at_utc)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<DocumentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, content, created_at_utc
            FROM document
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| DocumentRecord {
            id: r.get("id"),
            content: r.get("content"),
            created_at_utc: r.get("created_at_utc"),
        }))
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM document WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT d.id,
                   d.created_at_utc,
                   octet_length(d.content)::BIGINT AS size_bytes,
                   EXISTS(SELECT 1 FROM document_meta m WHERE m.document_id = d.id) AS has_meta_data,
                   (SELECT COUNT(*) FROM selection s WHERE s.document_id = d.id) AS selection_count
            FROM document d
            ORDER BY d.created_at_utc DESC, d.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| DocumentSummary {
                id: r.get("id"),
                created_at_utc: r.get("created_at_utc"),
                size_bytes: r.get("size_bytes"),
                has_meta_data: r.get("has_meta_data"),
                selection_count: r.get("selection_count"),
            })
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // Metadata and selections go through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM document WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "documents",
            op = "delete",
            document_id = %id,
            rows_affected = result.rows_affected(),
            "Document delete"
        );
        Ok(result.rows_affected() > 0)
    }
}
