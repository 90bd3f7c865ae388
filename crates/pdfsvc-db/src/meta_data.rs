//! Document metadata repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use pdfsvc_core::{Error, MetaData, MetaDataRepository, Result};

use crate::map_write_error;

/// PostgreSQL implementation of MetaDataRepository.
pub struct PgMetaDataRepository {
    pool: Pool<Postgres>,
}

impl PgMetaDataRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn meta_from_row(r: &PgRow) -> MetaData {
    MetaData {
        document_id: r.get("document_id"),
        number_of_pages: r.get("page_count"),
        height: r.get("height"),
        width: r.get("width"),
        images: r.get("image_count"),
    }
}

#[async_trait]
impl MetaDataRepository for PgMetaDataRepository {
    async fn insert(&self, meta: &MetaData) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO document_meta (document_id, page_count, height, width, image_count, updated_at_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(meta.document_id)
        .bind(meta.number_of_pages)
        .bind(meta.height)
        .bind(meta.width)
        .bind(meta.images)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn get(&self, document_id: Uuid) -> Result<Option<MetaData>> {
        let row = sqlx::query(
            r#"
            SELECT document_id, page_count, height, width, image_count
            FROM document_meta
            WHERE document_id = $1
            "#,
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(meta_from_row))
    }

    async fn update(&self, meta: &MetaData) -> Result<bool> {
        // Every column is written: the service has already merged the patch.
        let result = sqlx::query(
            r#"
            UPDATE document_meta
            SET page_count = $2, height = $3, width = $4, image_count = $5, updated_at_utc = $6
            WHERE document_id = $1
            "#,
        )
        .bind(meta.document_id)
        .bind(meta.number_of_pages)
        .bind(meta.height)
        .bind(meta.width)
        .bind(meta.images)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, document_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM document_meta WHERE document_id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
