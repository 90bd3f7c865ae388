//! Core data models for the PDF selection service.
//!
//! These types are shared across the service crates and define the wire
//! shape of documents, metadata and selections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::bounds::BoundsIndex;
use crate::error::{Error, Result};
use crate::patch::{Merge, Patch};

/// Free-form selection settings (a JSON object).
pub type Settings = serde_json::Map<String, JsonValue>;

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// Stored document row: identifier, raw PDF bytes and creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub content: Vec<u8>,
    pub created_at_utc: DateTime<Utc>,
}

/// Document with its metadata and selections, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "documentUUID")]
    pub id: Uuid,
    /// PDF payload, base64 encoded on the wire.
    #[serde(with = "base64_content")]
    #[schema(value_type = String, format = Byte)]
    pub content: Vec<u8>,
    pub created_at_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<MetaData>,
    #[serde(default)]
    pub selections: Vec<Selection>,
}

impl Document {
    /// Assemble a full document from its stored parts.
    pub fn assemble(
        record: DocumentRecord,
        meta_data: Option<MetaData>,
        selections: Vec<Selection>,
    ) -> Self {
        Self {
            id: record.id,
            content: record.content,
            created_at_utc: record.created_at_utc,
            meta_data,
            selections,
        }
    }
}

/// Lightweight listing entry (no payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    #[serde(rename = "documentUUID")]
    pub id: Uuid,
    pub created_at_utc: DateTime<Utc>,
    pub size_bytes: i64,
    pub has_meta_data: bool,
    pub selection_count: i64,
}

/// Upload request body.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadDocument {
    /// Base64-encoded PDF payload.
    pub document_base64_string: String,
}

mod base64_content {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// METADATA TYPES
// =============================================================================

/// Descriptive attributes of a document, keyed by the document's id.
///
/// Every attribute is optional; absent attributes are omitted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    #[serde(rename = "documentUUID")]
    pub document_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_pages: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Number of embedded images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<i32>,
}

impl MetaData {
    /// Metadata with no attributes set.
    pub fn empty(document_id: Uuid) -> Self {
        Self {
            document_id,
            number_of_pages: None,
            height: None,
            width: None,
            images: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.document_id.is_nil() {
            return Err(Error::InvalidInput("documentUUID is required".to_string()));
        }
        if matches!(self.number_of_pages, Some(n) if n < 0) {
            return Err(Error::InvalidInput(
                "numberOfPages must not be negative".to_string(),
            ));
        }
        if matches!(self.images, Some(n) if n < 0) {
            return Err(Error::InvalidInput("images must not be negative".to_string()));
        }
        for (name, value) in [("height", self.height), ("width", self.width)] {
            if matches!(value, Some(v) if !v.is_finite()) {
                return Err(Error::InvalidInput(format!("{} must be a finite number", name)));
            }
        }
        Ok(())
    }
}

/// Request body for creating metadata.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetaData {
    #[serde(rename = "documentUUID")]
    pub document_id: Uuid,
    #[serde(default)]
    pub number_of_pages: Option<i32>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub images: Option<i32>,
}

impl From<CreateMetaData> for MetaData {
    fn from(req: CreateMetaData) -> Self {
        Self {
            document_id: req.document_id,
            number_of_pages: req.number_of_pages,
            height: req.height,
            width: req.width,
            images: req.images,
        }
    }
}

/// Partial update for metadata. Omitted fields keep their stored value;
/// `null` clears an attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDataPatch {
    /// Must match the stored owner when present.
    #[serde(
        rename = "documentUUID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub document_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub number_of_pages: Patch<i32>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub height: Patch<f64>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub width: Patch<f64>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub images: Patch<i32>,
}

impl Merge for MetaData {
    type Patch = MetaDataPatch;

    fn merge(self, patch: MetaDataPatch) -> Result<Self> {
        check_owner(patch.document_id, self.document_id)?;

        let merged = MetaData {
            document_id: self.document_id,
            number_of_pages: patch.number_of_pages.apply(self.number_of_pages),
            height: patch.height.apply(self.height),
            width: patch.width.apply(self.width),
            images: patch.images.apply(self.images),
        };
        merged.validate()?;
        Ok(merged)
    }
}

// =============================================================================
// SELECTION TYPES
// =============================================================================

/// A region-of-interest definition attached to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(rename = "selectionUUID")]
    pub id: Uuid,
    #[serde(rename = "documentID")]
    pub document_id: Uuid,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub settings: Option<Settings>,
    /// Absent until geometry has been drawn.
    #[serde(
        rename = "selectionBounds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bounds: Option<BoundsIndex>,
}

impl Selection {
    pub fn validate(&self) -> Result<()> {
        if self.id.is_nil() {
            return Err(Error::InvalidInput("selectionUUID must not be nil".to_string()));
        }
        if self.document_id.is_nil() {
            return Err(Error::InvalidInput("documentID is required".to_string()));
        }
        Ok(())
    }
}

/// Request body for creating a selection.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSelection {
    #[serde(rename = "documentID")]
    pub document_id: Uuid,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub settings: Option<Settings>,
    #[serde(rename = "selectionBounds", default)]
    pub bounds: Option<BoundsIndex>,
}

impl CreateSelection {
    /// Minimal request: no settings, no geometry, not complete.
    pub fn for_document(document_id: Uuid) -> Self {
        Self {
            document_id,
            is_complete: false,
            settings: None,
            bounds: None,
        }
    }

    pub fn into_selection(self, id: Uuid) -> Selection {
        Selection {
            id,
            document_id: self.document_id,
            is_complete: self.is_complete,
            settings: self.settings,
            bounds: self.bounds,
        }
    }
}

/// Partial update for a selection. The selection keeps its identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPatch {
    /// Must match the stored owner when present.
    #[serde(rename = "documentID", default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub is_complete: Patch<bool>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub settings: Patch<Settings>,
    /// `null` removes the geometry; `{}` keeps an empty index.
    #[serde(
        rename = "selectionBounds",
        default,
        skip_serializing_if = "Patch::is_missing"
    )]
    pub bounds: Patch<BoundsIndex>,
}

impl Merge for Selection {
    type Patch = SelectionPatch;

    fn merge(self, patch: SelectionPatch) -> Result<Self> {
        check_owner(patch.document_id, self.document_id)?;

        let merged = Selection {
            id: self.id,
            document_id: self.document_id,
            is_complete: patch.is_complete.apply_required(self.is_complete, "isComplete")?,
            settings: patch.settings.apply(self.settings),
            bounds: patch.bounds.apply(self.bounds),
        };
        merged.validate()?;
        Ok(merged)
    }
}

fn check_owner(requested: Option<Uuid>, owner: Uuid) -> Result<()> {
    match requested {
        Some(id) if id != owner => Err(Error::InvalidInput(format!(
            "document {} cannot be changed to {}",
            owner, id
        ))),
        _ => Ok(()),
    }
}
