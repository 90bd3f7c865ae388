//! Aggregate services: the operations exposed to the transport layer.
//!
//! Each service owns the rules for one aggregate (identifier generation,
//! referential checks, merge-patch, validation) and delegates storage to the
//! repository contracts it is constructed with.
//!
//! Updates are read-merge-write without a surrounding transaction. Two
//! concurrent updates of the same record can lose one writer's change.

use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::*;
use crate::patch::Merge;
use crate::traits::{DocumentRepository, MetaDataRepository, SelectionRepository};
use crate::uuid_utils::new_v7;

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Upload, read, list and delete documents.
#[derive(Clone)]
pub struct DocumentService {
    documents: Arc<dyn DocumentRepository>,
    meta: Arc<dyn MetaDataRepository>,
    selections: Arc<dyn SelectionRepository>,
}

impl DocumentService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        meta: Arc<dyn MetaDataRepository>,
        selections: Arc<dyn SelectionRepository>,
    ) -> Self {
        Self {
            documents,
            meta,
            selections,
        }
    }

    /// Decode a base64 payload and store it as a new document.
    pub async fn upload(&self, encoded: &str) -> Result<Uuid> {
        let content = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::InvalidInput(format!("document is not valid base64: {}", e)))?;
        if content.is_empty() {
            return Err(Error::InvalidInput("document content is empty".to_string()));
        }

        let record = DocumentRecord {
            id: new_v7(),
            content,
            created_at_utc: Utc::now(),
        };
        self.documents.insert(&record).await?;

        info!(
            subsystem = "core",
            component = "documents",
            op = "upload",
            document_id = %record.id,
            size_bytes = record.content.len(),
            "Document uploaded"
        );
        Ok(record.id)
    }

    /// Document with its metadata and selections.
    pub async fn get(&self, id: Uuid) -> Result<Document> {
        let record = self
            .documents
            .fetch(id)
            .await?
            .ok_or(Error::DocumentNotFound(id))?;
        let meta = self.meta.get(id).await?;
        let selections = self.selections.list_for_document(id).await?;
        Ok(Document::assemble(record, meta, selections))
    }

    pub async fn list(&self) -> Result<Vec<DocumentSummary>> {
        self.documents.list().await
    }

    /// Delete a document; its metadata and selections go with it.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.documents.delete(id).await? {
            return Err(Error::DocumentNotFound(id));
        }
        info!(
            subsystem = "core",
            component = "documents",
            op = "delete",
            document_id = %id,
            "Document deleted"
        );
        Ok(())
    }
}

// =============================================================================
// METADATA
// =============================================================================

/// Create, read, merge-patch and delete document metadata.
#[derive(Clone)]
pub struct MetaDataService {
    meta: Arc<dyn MetaDataRepository>,
    documents: Arc<dyn DocumentRepository>,
}

impl MetaDataService {
    pub fn new(meta: Arc<dyn MetaDataRepository>, documents: Arc<dyn DocumentRepository>) -> Self {
        Self { meta, documents }
    }

    /// Attach metadata to a document. Returns the document ID, which is the
    /// metadata key.
    pub async fn add(&self, req: CreateMetaData) -> Result<Uuid> {
        let meta = MetaData::from(req);
        meta.validate()?;
        if !self.documents.exists(meta.document_id).await? {
            return Err(Error::Referential(format!(
                "document {} does not exist",
                meta.document_id
            )));
        }
        self.meta.insert(&meta).await?;

        info!(
            subsystem = "core",
            component = "meta_data",
            op = "add",
            document_id = %meta.document_id,
            "Metadata added"
        );
        Ok(meta.document_id)
    }

    pub async fn get(&self, document_id: Uuid) -> Result<MetaData> {
        self.meta
            .get(document_id)
            .await?
            .ok_or(Error::MetaDataNotFound(document_id))
    }

    /// Merge `patch` into the stored metadata; omitted fields are untouched.
    pub async fn update(&self, document_id: Uuid, patch: MetaDataPatch) -> Result<()> {
        let start = Instant::now();
        let existing = self.get(document_id).await?;
        let merged = existing.merge(patch)?;

        if !self.meta.update(&merged).await? {
            return Err(Error::MetaDataNotFound(document_id));
        }

        debug!(
            subsystem = "core",
            component = "meta_data",
            op = "update",
            document_id = %document_id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Metadata merged"
        );
        Ok(())
    }

    /// Delete metadata. Deleting absent metadata is not an error.
    pub async fn delete(&self, document_id: Uuid) -> Result<()> {
        let deleted = self.meta.delete(document_id).await?;
        debug!(
            subsystem = "core",
            component = "meta_data",
            op = "delete",
            document_id = %document_id,
            deleted,
            "Metadata delete"
        );
        Ok(())
    }
}

// =============================================================================
// SELECTIONS
// =============================================================================

/// Create, read, list, merge-patch and delete selections.
#[derive(Clone)]
pub struct SelectionService {
    selections: Arc<dyn SelectionRepository>,
    documents: Arc<dyn DocumentRepository>,
}

impl SelectionService {
    pub fn new(
        selections: Arc<dyn SelectionRepository>,
        documents: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            selections,
            documents,
        }
    }

    /// Create a selection on an existing document.
    pub async fn add(&self, req: CreateSelection) -> Result<Uuid> {
        let selection = req.into_selection(new_v7());
        selection.validate()?;
        if !self.documents.exists(selection.document_id).await? {
            return Err(Error::Referential(format!(
                "document {} does not exist",
                selection.document_id
            )));
        }
        self.selections.insert(&selection).await?;

        info!(
            subsystem = "core",
            component = "selections",
            op = "add",
            selection_id = %selection.id,
            document_id = %selection.document_id,
            groups = selection.bounds.as_ref().map(|b| b.len()).unwrap_or(0),
            "Selection added"
        );
        Ok(selection.id)
    }

    pub async fn get(&self, id: Uuid) -> Result<Selection> {
        self.selections
            .get(id)
            .await?
            .ok_or(Error::SelectionNotFound(id))
    }

    /// Selections of one document in creation order.
    pub async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<Selection>> {
        if !self.documents.exists(document_id).await? {
            return Err(Error::DocumentNotFound(document_id));
        }
        self.selections.list_for_document(document_id).await
    }

    /// Merge `patch` into the stored selection. The identifier never changes.
    pub async fn update(&self, id: Uuid, patch: SelectionPatch) -> Result<()> {
        let start = Instant::now();
        let existing = self.get(id).await?;
        let merged = existing.merge(patch)?;

        if !self.selections.update(&merged).await? {
            return Err(Error::SelectionNotFound(id));
        }

        debug!(
            subsystem = "core",
            component = "selections",
            op = "update",
            selection_id = %id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Selection merged"
        );
        Ok(())
    }

    /// Delete a selection. Deleting an absent selection is not an error.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let deleted = self.selections.delete(id).await?;
        debug!(
            subsystem = "core",
            component = "selections",
            op = "delete",
            selection_id = %id,
            deleted,
            "Selection delete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::uuid_utils::is_v7;

    fn services() -> (DocumentService, MetaDataService, SelectionService) {
        let store = Arc::new(InMemoryStore::new());
        (
            DocumentService::new(store.clone(), store.clone(), store.clone()),
            MetaDataService::new(store.clone(), store.clone()),
            SelectionService::new(store.clone(), store),
        )
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_base64() {
        let (documents, _, _) = services();
        let err = documents.upload("THIS IS A TEST DOCUMENT").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_payload() {
        let (documents, _, _) = services();
        assert!(matches!(
            documents.upload("").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_generates_v7_id() {
        let (documents, _, _) = services();
        let id = documents.upload("JVBERi0xLjc=").await.unwrap();
        assert!(is_v7(&id));
        assert_eq!(documents.get(id).await.unwrap().content, b"%PDF-1.7".to_vec());
    }

    #[tokio::test]
    async fn test_delete_unknown_document_is_not_found() {
        let (documents, _, _) = services();
        let id = Uuid::new_v4();
        assert!(matches!(
            documents.delete(id).await,
            Err(Error::DocumentNotFound(found)) if found == id
        ));
    }

    #[tokio::test]
    async fn test_meta_add_for_missing_document_is_referential() {
        let (_, meta, _) = services();
        let req = CreateMetaData {
            document_id: Uuid::new_v4(),
            number_of_pages: Some(1),
            height: None,
            width: None,
            images: None,
        };
        assert!(matches!(meta.add(req).await, Err(Error::Referential(_))));
    }

    #[tokio::test]
    async fn test_meta_update_missing_is_not_found() {
        let (_, meta, _) = services();
        let id = Uuid::new_v4();
        assert!(matches!(
            meta.update(id, MetaDataPatch::default()).await,
            Err(Error::MetaDataNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_selection_add_for_missing_document_is_referential() {
        let (_, _, selections) = services();
        let req = CreateSelection::for_document(Uuid::new_v4());
        assert!(matches!(
            selections.add(req).await,
            Err(Error::Referential(_))
        ));
    }

    #[tokio::test]
    async fn test_selection_list_for_missing_document() {
        let (_, _, selections) = services();
        assert!(matches!(
            selections.list_for_document(Uuid::new_v4()).await,
            Err(Error::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_selection_update_keeps_id() {
        let (documents, _, selections) = services();
        let doc = documents.upload("JVBERi0xLjc=").await.unwrap();
        let id = selections
            .add(CreateSelection::for_document(doc))
            .await
            .unwrap();

        let patch = SelectionPatch {
            is_complete: crate::patch::Patch::Value(true),
            ..Default::default()
        };
        selections.update(id, patch).await.unwrap();

        let listed = selections.list_for_document(doc).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert!(listed[0].is_complete);
    }
}
