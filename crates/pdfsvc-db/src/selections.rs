//! Selection repository implementation.
//!
//! The bounds index is one JSONB column holding the wire form
//! (`{"<groupKey>": [bound, ...]}`). SQL `NULL` is an absent index and `{}`
//! an empty one, so both survive a round trip. Listing order follows the
//! `seq` identity column, which records insertion order.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use pdfsvc_core::bounds;
use pdfsvc_core::{Error, Result, Selection, SelectionRepository, Settings};

use crate::map_write_error;

const SELECTION_COLUMNS: &str = "id, document_id, is_complete, settings, bounds";

/// PostgreSQL implementation of SelectionRepository.
pub struct PgSelectionRepository {
    pool: Pool<Postgres>,
}

impl PgSelectionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn selection_from_row(r: &PgRow) -> Result<Selection> {
    let settings: Option<Json<Settings>> = r.try_get("settings").map_err(Error::Database)?;
    let raw_bounds: Option<JsonValue> = r.try_get("bounds").map_err(Error::Database)?;

    Ok(Selection {
        id: r.get("id"),
        document_id: r.get("document_id"),
        is_complete: r.get("is_complete"),
        settings: settings.map(|Json(s)| s),
        bounds: decode_stored_bounds(r.get("id"), raw_bounds)?,
    })
}

/// Decode the bounds column. A value that no longer parses is damaged
/// storage, not bad client input.
fn decode_stored_bounds(id: Uuid, raw: Option<JsonValue>) -> Result<Option<bounds::BoundsIndex>> {
    bounds::decode(raw).map_err(|e| match e {
        Error::Decode(msg) => Error::Storage(format!("selection {}: {}", id, msg)),
        other => other,
    })
}

fn settings_column(selection: &Selection) -> Option<Json<&Settings>> {
    selection.settings.as_ref().map(Json)
}

#[async_trait]
impl SelectionRepository for PgSelectionRepository {
    async fn insert(&self, selection: &Selection) -> Result<()> {
        let now = Utc::now();
        let bounds_json = bounds::encode(selection.bounds.as_ref())?;

        sqlx::query(
            r#"
            INSERT INTO selection (id, document_id, is_complete, settings, bounds, created_at_utc, updated_at_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(selection.id)
        .bind(selection.document_id)
        .bind(selection.is_complete)
        .bind(settings_column(selection))
        .bind(bounds_json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        debug!(
            subsystem = "database",
            component = "selections",
            op = "insert",
            selection_id = %selection.id,
            document_id = %selection.document_id,
            "Selection stored"
        );
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Selection>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM selection WHERE id = $1",
            SELECTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(selection_from_row).transpose()
    }

    async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<Selection>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM selection WHERE document_id = $1 ORDER BY seq",
            SELECTION_COLUMNS
        ))
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(selection_from_row).collect()
    }

    async fn update(&self, selection: &Selection) -> Result<bool> {
        let bounds_json = bounds::encode(selection.bounds.as_ref())?;

        // document_id is not written; ownership never changes.
        let result = sqlx::query(
            r#"
            UPDATE selection
            SET is_complete = $2, settings = $3, bounds = $4, updated_at_utc = $5
            WHERE id = $1
            "#,
        )
        .bind(selection.id)
        .bind(selection.is_complete)
        .bind(settings_column(selection))
        .bind(bounds_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM selection WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
