//! End-to-end service behaviour against the in-memory store.

use std::sync::Arc;

use pdfsvc_core::{
    BoundsIndex, CreateMetaData, CreateSelection, DocumentService, Error, InMemoryStore,
    MetaDataPatch, MetaDataService, Patch, SelectionBound, SelectionPatch, SelectionService,
};
use serde_json::json;
use uuid::Uuid;

/// `%PDF-1.7` encoded.
const PDF_BASE64: &str = "JVBERi0xLjc=";

struct Services {
    store: InMemoryStore,
    documents: DocumentService,
    meta: MetaDataService,
    selections: SelectionService,
}

fn services() -> Services {
    let store = InMemoryStore::new();
    let shared = Arc::new(store.clone());
    Services {
        documents: DocumentService::new(shared.clone(), shared.clone(), shared.clone()),
        meta: MetaDataService::new(shared.clone(), shared.clone()),
        selections: SelectionService::new(shared.clone(), shared),
        store,
    }
}

fn create_meta(document_id: Uuid, pages: Option<i32>) -> CreateMetaData {
    CreateMetaData {
        document_id,
        number_of_pages: pages,
        height: None,
        width: None,
        images: None,
    }
}

#[tokio::test]
async fn test_meta_height_patch_keeps_page_count() {
    let svc = services();
    let doc = svc.documents.upload(PDF_BASE64).await.unwrap();
    let key = svc.meta.add(create_meta(doc, Some(5))).await.unwrap();
    assert_eq!(key, doc, "metadata is keyed by its document");

    let patch = MetaDataPatch {
        height: Patch::Value(100.0),
        ..Default::default()
    };
    svc.meta.update(doc, patch).await.unwrap();

    let stored = svc.meta.get(doc).await.unwrap();
    assert_eq!(stored.number_of_pages, Some(5));
    assert_eq!(stored.height, Some(100.0));
    assert_eq!(stored.width, None);
    assert_eq!(stored.images, None);
}

#[tokio::test]
async fn test_meta_second_add_conflicts() {
    let svc = services();
    let doc = svc.documents.upload(PDF_BASE64).await.unwrap();
    svc.meta.add(create_meta(doc, None)).await.unwrap();
    assert!(matches!(
        svc.meta.add(create_meta(doc, Some(1))).await,
        Err(Error::Conflict(_))
    ));
}

#[tokio::test]
async fn test_selection_bounds_structure_and_order_survive() {
    let svc = services();
    let doc = svc.documents.upload(PDF_BASE64).await.unwrap();

    let b1 = SelectionBound::new(22.0, 65.0, 24.0, 87.0);
    let b2 = SelectionBound::new(1.0, 2.0, 3.0, 4.0).with_method("rectangle");
    let b3 = SelectionBound::new(10.5, 20.5, 30.5, 40.5);
    let bounds = BoundsIndex::from_groups([(0, vec![b1.clone(), b2.clone()]), (1, vec![b3.clone()])]);

    let mut req = CreateSelection::for_document(doc);
    req.bounds = Some(bounds.clone());
    let id = svc.selections.add(req).await.unwrap();

    let stored = svc.selections.get(id).await.unwrap();
    let index = stored.bounds.expect("bounds present");
    assert_eq!(index, bounds);
    assert_eq!(index.group(0).unwrap(), &[b1, b2][..]);
    assert_eq!(index.group(1).unwrap(), &[b3][..]);
}

#[tokio::test]
async fn test_selection_without_bounds_stays_absent() {
    let svc = services();
    let doc = svc.documents.upload(PDF_BASE64).await.unwrap();
    let id = svc
        .selections
        .add(CreateSelection::for_document(doc))
        .await
        .unwrap();

    let stored = svc.selections.get(id).await.unwrap();
    assert!(stored.bounds.is_none());
    assert!(!stored.is_complete);
}

#[tokio::test]
async fn test_selection_empty_bounds_differs_from_absent() {
    let svc = services();
    let doc = svc.documents.upload(PDF_BASE64).await.unwrap();

    let mut req = CreateSelection::for_document(doc);
    req.bounds = Some(BoundsIndex::new());
    let id = svc.selections.add(req).await.unwrap();
    assert_eq!(svc.selections.get(id).await.unwrap().bounds, Some(BoundsIndex::new()));

    let patch: SelectionPatch = serde_json::from_value(json!({"selectionBounds": null})).unwrap();
    svc.selections.update(id, patch).await.unwrap();
    assert_eq!(svc.selections.get(id).await.unwrap().bounds, None);
}

#[tokio::test]
async fn test_selection_update_preserves_id_and_order() {
    let svc = services();
    let doc = svc.documents.upload(PDF_BASE64).await.unwrap();
    let first = svc
        .selections
        .add(CreateSelection::for_document(doc))
        .await
        .unwrap();
    let second = svc
        .selections
        .add(CreateSelection::for_document(doc))
        .await
        .unwrap();

    let patch: SelectionPatch =
        serde_json::from_value(json!({"isComplete": true, "settings": {"colour": "blue"}}))
            .unwrap();
    svc.selections.update(first, patch).await.unwrap();

    let listed = svc.selections.list_for_document(doc).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![first, second]);
    assert!(listed[0].is_complete);
    assert_eq!(
        listed[0].settings.as_ref().and_then(|s| s.get("colour")),
        Some(&json!("blue"))
    );
}

#[tokio::test]
async fn test_document_delete_cascades() {
    let svc = services();
    let doc = svc.documents.upload(PDF_BASE64).await.unwrap();
    svc.meta.add(create_meta(doc, Some(2))).await.unwrap();
    let selection = svc
        .selections
        .add(CreateSelection::for_document(doc))
        .await
        .unwrap();

    svc.documents.delete(doc).await.unwrap();

    assert!(matches!(
        svc.documents.get(doc).await,
        Err(Error::DocumentNotFound(_))
    ));
    assert!(matches!(
        svc.meta.get(doc).await,
        Err(Error::MetaDataNotFound(_))
    ));
    assert!(matches!(
        svc.selections.get(selection).await,
        Err(Error::SelectionNotFound(_))
    ));
    assert_eq!(svc.store.selection_count().await, 0);
}

#[tokio::test]
async fn test_child_deletes_are_idempotent() {
    let svc = services();
    let doc = svc.documents.upload(PDF_BASE64).await.unwrap();
    svc.meta.add(create_meta(doc, None)).await.unwrap();
    let selection = svc
        .selections
        .add(CreateSelection::for_document(doc))
        .await
        .unwrap();

    for _ in 0..2 {
        svc.meta.delete(doc).await.unwrap();
        svc.selections.delete(selection).await.unwrap();
    }
    svc.meta.delete(Uuid::new_v4()).await.unwrap();
    svc.selections.delete(Uuid::new_v4()).await.unwrap();
}

#[tokio::test]
async fn test_get_document_assembles_children() {
    let svc = services();
    let doc = svc.documents.upload(PDF_BASE64).await.unwrap();
    svc.meta.add(create_meta(doc, Some(3))).await.unwrap();
    svc.selections
        .add(CreateSelection::for_document(doc))
        .await
        .unwrap();

    let full = svc.documents.get(doc).await.unwrap();
    assert_eq!(full.content, b"%PDF-1.7".to_vec());
    assert_eq!(full.meta_data.unwrap().number_of_pages, Some(3));
    assert_eq!(full.selections.len(), 1);

    let listed = svc.documents.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, doc);
    assert!(listed[0].has_meta_data);
    assert_eq!(listed[0].selection_count, 1);
}
