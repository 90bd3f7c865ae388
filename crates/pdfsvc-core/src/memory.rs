//! In-memory implementation of the repository contracts.
//!
//! One [`InMemoryStore`] implements all three repositories over shared state,
//! so document deletion cascades the same way the PostgreSQL schema does.
//! Cloning the store shares the state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{DocumentRecord, DocumentSummary, MetaData, Selection};
use crate::traits::{DocumentRepository, MetaDataRepository, SelectionRepository};

#[derive(Debug, Default)]
struct State {
    documents: HashMap<Uuid, DocumentRecord>,
    meta: HashMap<Uuid, MetaData>,
    /// Insertion order is creation order.
    selections: Vec<Selection>,
}

impl State {
    fn require_document(&self, id: Uuid) -> Result<()> {
        if self.documents.contains_key(&id) {
            Ok(())
        } else {
            Err(Error::Referential(format!("document {} does not exist", id)))
        }
    }
}

/// Map-backed store for tests and local experiments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored selections across all documents.
    pub async fn selection_count(&self) -> usize {
        self.state.read().await.selections.len()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryStore {
    async fn insert(&self, document: &DocumentRecord) -> Result<()> {
        let mut state = self.state.write().await;
        if state.documents.contains_key(&document.id) {
            return Err(Error::Conflict(format!(
                "document {} already exists",
                document.id
            )));
        }
        state.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<DocumentRecord>> {
        Ok(self.state.read().await.documents.get(&id).cloned())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.state.read().await.documents.contains_key(&id))
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let state = self.state.read().await;
        let mut summaries: Vec<DocumentSummary> = state
            .documents
            .values()
            .map(|doc| DocumentSummary {
                id: doc.id,
                created_at_utc: doc.created_at_utc,
                size_bytes: doc.content.len() as i64,
                has_meta_data: state.meta.contains_key(&doc.id),
                selection_count: state
                    .selections
                    .iter()
                    .filter(|s| s.document_id == doc.id)
                    .count() as i64,
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.created_at_utc
                .cmp(&a.created_at_utc)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(summaries)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.documents.remove(&id).is_none() {
            return Ok(false);
        }
        state.meta.remove(&id);
        state.selections.retain(|s| s.document_id != id);
        Ok(true)
    }
}

#[async_trait]
impl MetaDataRepository for InMemoryStore {
    async fn insert(&self, meta: &MetaData) -> Result<()> {
        let mut state = self.state.write().await;
        state.require_document(meta.document_id)?;
        if state.meta.contains_key(&meta.document_id) {
            return Err(Error::Conflict(format!(
                "metadata for document {} already exists",
                meta.document_id
            )));
        }
        state.meta.insert(meta.document_id, meta.clone());
        Ok(())
    }

    async fn get(&self, document_id: Uuid) -> Result<Option<MetaData>> {
        Ok(self.state.read().await.meta.get(&document_id).cloned())
    }

    async fn update(&self, meta: &MetaData) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.meta.get_mut(&meta.document_id) {
            Some(stored) => {
                *stored = meta.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, document_id: Uuid) -> Result<bool> {
        Ok(self.state.write().await.meta.remove(&document_id).is_some())
    }
}

#[async_trait]
impl SelectionRepository for InMemoryStore {
    async fn insert(&self, selection: &Selection) -> Result<()> {
        let mut state = self.state.write().await;
        state.require_document(selection.document_id)?;
        if state.selections.iter().any(|s| s.id == selection.id) {
            return Err(Error::Conflict(format!(
                "selection {} already exists",
                selection.id
            )));
        }
        state.selections.push(selection.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Selection>> {
        Ok(self
            .state
            .read()
            .await
            .selections
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<Selection>> {
        Ok(self
            .state
            .read()
            .await
            .selections
            .iter()
            .filter(|s| s.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn update(&self, selection: &Selection) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.selections.iter_mut().find(|s| s.id == selection.id) {
            Some(stored) => {
                *stored = selection.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.selections.len();
        state.selections.retain(|s| s.id != id);
        Ok(state.selections.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateSelection;
    use chrono::Utc;

    async fn store_with_document() -> (InMemoryStore, Uuid) {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        DocumentRepository::insert(
            &store,
            &DocumentRecord {
                id,
                content: vec![1, 2, 3],
                created_at_utc: Utc::now(),
            },
        )
        .await
        .unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_meta_insert_requires_document() {
        let store = InMemoryStore::new();
        let err = MetaDataRepository::insert(&store, &MetaData::empty(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Referential(_)));
    }

    #[tokio::test]
    async fn test_meta_insert_twice_conflicts() {
        let (store, doc) = store_with_document().await;
        MetaDataRepository::insert(&store, &MetaData::empty(doc)).await.unwrap();
        let err = MetaDataRepository::insert(&store, &MetaData::empty(doc))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_selection_order_is_insertion_order() {
        let (store, doc) = store_with_document().await;
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            let selection = CreateSelection::for_document(doc).into_selection(*id);
            SelectionRepository::insert(&store, &selection).await.unwrap();
        }

        let listed: Vec<Uuid> = store
            .list_for_document(doc)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_update_missing_returns_false() {
        let store = InMemoryStore::new();
        let selection = CreateSelection::for_document(Uuid::new_v4()).into_selection(Uuid::new_v4());
        assert!(!SelectionRepository::update(&store, &selection).await.unwrap());
        assert!(!MetaDataRepository::update(&store, &MetaData::empty(Uuid::new_v4()))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_document_delete_cascades() {
        let (store, doc) = store_with_document().await;
        MetaDataRepository::insert(&store, &MetaData::empty(doc)).await.unwrap();
        let selection = CreateSelection::for_document(doc).into_selection(Uuid::new_v4());
        SelectionRepository::insert(&store, &selection).await.unwrap();

        assert!(DocumentRepository::delete(&store, doc).await.unwrap());
        assert!(MetaDataRepository::get(&store, doc).await.unwrap().is_none());
        assert!(SelectionRepository::get(&store, selection.id)
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.selection_count().await, 0);
        assert!(!DocumentRepository::delete(&store, doc).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_reports_children() {
        let (store, doc) = store_with_document().await;
        MetaDataRepository::insert(&store, &MetaData::empty(doc)).await.unwrap();
        for _ in 0..2 {
            let selection = CreateSelection::for_document(doc).into_selection(Uuid::new_v4());
            SelectionRepository::insert(&store, &selection).await.unwrap();
        }

        let listed = DocumentRepository::list(&store).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].size_bytes, 3);
        assert!(listed[0].has_meta_data);
        assert_eq!(listed[0].selection_count, 2);
    }
}
