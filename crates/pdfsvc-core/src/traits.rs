//! Storage contracts for documents, metadata and selections.
//!
//! Services receive these as `Arc<dyn ...>` constructor parameters, so the
//! same aggregate logic runs against PostgreSQL (`pdfsvc-db`) or the
//! [`InMemoryStore`](crate::memory::InMemoryStore).
//!
//! Repositories persist what they are given. Identifier generation, merging
//! and validation happen in the services before a repository is called.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// DOCUMENT REPOSITORY TRAITS
// =============================================================================

/// Repository for uploaded documents.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Store a new document.
    async fn insert(&self, document: &DocumentRecord) -> Result<()>;

    /// Fetch a document row by ID.
    async fn fetch(&self, id: Uuid) -> Result<Option<DocumentRecord>>;

    /// Check if a document exists.
    async fn exists(&self, id: Uuid) -> Result<bool>;

    /// List documents, newest first.
    async fn list(&self) -> Result<Vec<DocumentSummary>>;

    /// Delete a document together with its metadata and selections.
    ///
    /// Returns `false` when no document matched.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

// =============================================================================
// METADATA REPOSITORY TRAITS
// =============================================================================

/// Repository for document metadata, keyed by document ID.
#[async_trait]
pub trait MetaDataRepository: Send + Sync {
    /// Insert metadata for a document.
    ///
    /// Fails with `Referential` if the document is missing and `Conflict`
    /// if the document already has metadata.
    async fn insert(&self, meta: &MetaData) -> Result<()>;

    /// Get metadata by document ID.
    async fn get(&self, document_id: Uuid) -> Result<Option<MetaData>>;

    /// Overwrite all attributes of existing metadata.
    ///
    /// Returns `false` when no row matched.
    async fn update(&self, meta: &MetaData) -> Result<bool>;

    /// Delete metadata. Returns `false` when nothing was deleted.
    async fn delete(&self, document_id: Uuid) -> Result<bool>;
}

// =============================================================================
// SELECTION REPOSITORY TRAITS
// =============================================================================

/// Repository for selections.
#[async_trait]
pub trait SelectionRepository: Send + Sync {
    /// Insert a new selection. Fails with `Referential` if the document is missing.
    async fn insert(&self, selection: &Selection) -> Result<()>;

    /// Get a selection by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Selection>>;

    /// All selections of a document in creation order.
    async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<Selection>>;

    /// Overwrite an existing selection, keeping its ID and creation order.
    ///
    /// Returns `false` when no row matched.
    async fn update(&self, selection: &Selection) -> Result<bool>;

    /// Delete a selection. Returns `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}
