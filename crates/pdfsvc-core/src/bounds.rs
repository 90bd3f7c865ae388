//! Selection bounds: the per-selection index from group key to bounding boxes.
//!
//! A group key is usually a page number. Each group holds an ordered list of
//! [`SelectionBound`] rectangles; order within a group is significant.
//!
//! The wire form is a JSON object keyed by the decimal group key
//! (`{"0": [{"x1": ..}], "3": [..]}`), see [`encode`] and [`decode`]. The
//! PostgreSQL layer stores the same form in a JSONB column, so empty groups
//! survive a round trip through storage.
//!
//! "No index" and "empty index" are different states. A selection without an
//! index has no geometry yet; an empty index means the geometry was cleared.
//! The wire form keeps them apart by omitting the field versus sending `{}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

/// One rectangle, stored as raw corner coordinates.
///
/// Coordinates are not normalized: `x1` may be greater than `x2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectionBound {
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
    /// Tool or method used to draw the rectangle (e.g. "rectangle", "lasso").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_method: Option<String>,
}

impl SelectionBound {
    /// Rectangle without a selection-method tag.
    pub fn new(x1: f64, x2: f64, y1: f64, y2: f64) -> Self {
        Self {
            x1,
            x2,
            y1,
            y2,
            selection_method: None,
        }
    }

    /// Attach a selection-method tag.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.selection_method = Some(method.into());
        self
    }
}

/// Ordered mapping from group key to the bounds drawn in that group.
///
/// Duplicate group keys are resolved deterministically: the last list
/// supplied for a key replaces earlier ones. This holds for
/// [`BoundsIndex::from_groups`] and for JSON objects that repeat a key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct BoundsIndex(BTreeMap<u32, Vec<SelectionBound>>);

impl BoundsIndex {
    /// Create an empty (but present) index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from `(group_key, bounds)` pairs. Later pairs win.
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = (u32, Vec<SelectionBound>)>,
    {
        let mut index = Self::new();
        for (key, bounds) in groups {
            index.insert_group(key, bounds);
        }
        index
    }

    /// Replace the list for `key`, returning the previous one.
    pub fn insert_group(&mut self, key: u32, bounds: Vec<SelectionBound>) -> Option<Vec<SelectionBound>> {
        self.0.insert(key, bounds)
    }

    /// Append one bound to the end of a group, creating the group if needed.
    pub fn push(&mut self, key: u32, bound: SelectionBound) {
        self.0.entry(key).or_default().push(bound);
    }

    /// Bounds of one group, in drawing order.
    pub fn group(&self, key: u32) -> Option<&[SelectionBound]> {
        self.0.get(&key).map(Vec::as_slice)
    }

    /// Iterate groups in ascending key order.
    pub fn groups(&self) -> impl Iterator<Item = (u32, &[SelectionBound])> {
        self.0.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(u32, Vec<SelectionBound>)> for BoundsIndex {
    fn from_iter<T: IntoIterator<Item = (u32, Vec<SelectionBound>)>>(iter: T) -> Self {
        Self::from_groups(iter)
    }
}

/// Encode an optional index to its wire form.
///
/// `None` stays `None` so the caller omits the field; an empty index encodes
/// as an explicit `{}`.
pub fn encode(index: Option<&BoundsIndex>) -> Result<Option<JsonValue>> {
    index
        .map(|index| serde_json::to_value(index).map_err(Error::from))
        .transpose()
}

/// Decode an optional wire value into an index.
///
/// An omitted field or explicit `null` decodes as "no index"; `{}` decodes as
/// an empty, present index. Non-numeric coordinates and keys that are not
/// non-negative integers fail with [`Error::Decode`].
pub fn decode(value: Option<JsonValue>) -> Result<Option<BoundsIndex>> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| Error::Decode(format!("invalid selection bounds: {}", e))),
    }
}
