//! # pdfsvc-db
//!
//! PostgreSQL storage layer for the PDF selection service.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for documents, metadata and selections
//! - Schema migrations (behind the `migrations` feature)
//!
//! ## Example
//!
//! ```rust,ignore
//! use pdfsvc_db::{Database, PoolConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/pdfsvc", PoolConfig::new()).await?;
//!     let (documents, meta, selections) = db.services();
//!
//!     let id = documents.upload("JVBERi0xLjc=").await?;
//!     println!("Uploaded document: {}", id);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

pub mod documents;
pub mod meta_data;
pub mod pool;
pub mod selections;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

pub use documents::PgDocumentRepository;
pub use meta_data::PgMetaDataRepository;
pub use pool::{create_pool, log_pool_metrics, PoolConfig};
pub use selections::PgSelectionRepository;

// Re-export core types
pub use pdfsvc_core::{
    DocumentRepository, DocumentService, Error, MetaDataRepository, MetaDataService, Result,
    SelectionRepository, SelectionService,
};

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub documents: Arc<PgDocumentRepository>,
    pub meta_data: Arc<PgMetaDataRepository>,
    pub selections: Arc<PgSelectionRepository>,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            documents: Arc::new(PgDocumentRepository::new(pool.clone())),
            meta_data: Arc::new(PgMetaDataRepository::new(pool.clone())),
            selections: Arc::new(PgSelectionRepository::new(pool.clone())),
            pool,
        }
    }

    /// Open a pool against `url` and build the repositories over it.
    pub async fn connect(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool(url, &config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Round-trip a trivial query to confirm the database is reachable.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    /// Build the aggregate services over these repositories.
    pub fn services(&self) -> (DocumentService, MetaDataService, SelectionService) {
        (
            DocumentService::new(
                self.documents.clone(),
                self.meta_data.clone(),
                self.selections.clone(),
            ),
            MetaDataService::new(self.meta_data.clone(), self.documents.clone()),
            SelectionService::new(self.selections.clone(), self.documents.clone()),
        )
    }
}

/// Map a failed write to the domain error.
///
/// Foreign-key violations become `Referential`, unique violations `Conflict`
/// and check violations `InvalidInput`. Everything else stays a database
/// error with its cause.
pub(crate) fn map_write_error(err: sqlx::Error) -> Error {
    if let Some(db_err) = err.as_database_error() {
        let detail = db_err.message().to_string();
        if db_err.is_foreign_key_violation() {
            return Error::Referential(detail);
        }
        if db_err.is_unique_violation() {
            return Error::Conflict(detail);
        }
        if db_err.is_check_violation() {
            return Error::InvalidInput(detail);
        }
    }
    Error::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_is_preserved() {
        let mapped = map_write_error(sqlx::Error::RowNotFound);
        assert!(matches!(mapped, Error::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_pool_timeout_is_preserved() {
        let mapped = map_write_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(mapped, Error::Database(_)));
    }
}
