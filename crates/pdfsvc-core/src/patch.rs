//! Merge-patch primitives shared by metadata and selection updates.
//!
//! A partial update must tell three situations apart for every optional
//! field:
//!
//! | JSON input          | [`Patch`]           | Effect on stored value |
//! |---------------------|---------------------|------------------------|
//! | field omitted       | `Patch::Missing`    | kept unchanged         |
//! | `"field": null`     | `Patch::Null`       | cleared                |
//! | `"field": 0`        | `Patch::Value(0)`   | replaced with `0`      |
//!
//! Patch structs mark every `Patch<T>` field with `#[serde(default)]` so an
//! omitted field deserializes as `Missing`. A zero, `false` or empty value is
//! a real value and always overwrites.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Presence-aware field of a partial update.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    /// Field not supplied; keep the stored value.
    Missing,
    /// Field supplied as `null`; clear the stored value.
    Null,
    /// Field supplied with a value; replace the stored value.
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Missing
    }
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    /// Apply to a nullable stored value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Missing => current,
            Patch::Null => None,
            Patch::Value(v) => Some(v),
        }
    }

    /// Apply to a required stored value; `null` is rejected.
    pub fn apply_required(self, current: T, field: &str) -> Result<T> {
        match self {
            Patch::Missing => Ok(current),
            Patch::Null => Err(Error::InvalidInput(format!("{} cannot be null", field))),
            Patch::Value(v) => Ok(v),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only reached when the field is present; absence comes from #[serde(default)].
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

impl<T> Serialize for Patch<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Value(v) => serializer.serialize_some(v),
            Patch::Missing | Patch::Null => serializer.serialize_none(),
        }
    }
}

/// A record that can absorb a partial update.
///
/// Implementations must satisfy, for every record `r`:
///
/// - `r.merge(Default::default()) == r` (an empty patch changes nothing),
/// - fields present in the patch take the patch's value,
/// - fields absent from the patch keep `r`'s value.
pub trait Merge: Sized {
    type Patch: Default;

    /// Combine `self` with `patch`, producing the record to persist.
    fn merge(self, patch: Self::Patch) -> Result<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, Serialize)]
    struct Sample {
        #[serde(default, skip_serializing_if = "Patch::is_missing")]
        count: Patch<i32>,
        #[serde(default, skip_serializing_if = "Patch::is_missing")]
        flag: Patch<bool>,
    }

    #[test]
    fn test_omitted_field_is_missing() {
        let s: Sample = serde_json::from_value(json!({})).unwrap();
        assert_eq!(s.count, Patch::Missing);
        assert_eq!(s.flag, Patch::Missing);
    }

    #[test]
    fn test_null_field_is_null() {
        let s: Sample = serde_json::from_value(json!({"count": null})).unwrap();
        assert_eq!(s.count, Patch::Null);
        assert!(s.flag.is_missing());
    }

    #[test]
    fn test_zero_and_false_are_values() {
        let s: Sample = serde_json::from_value(json!({"count": 0, "flag": false})).unwrap();
        assert_eq!(s.count, Patch::Value(0));
        assert_eq!(s.flag, Patch::Value(false));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let result: std::result::Result<Sample, _> =
            serde_json::from_value(json!({"count": "five"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_nullable() {
        assert_eq!(Patch::Missing.apply(Some(3)), Some(3));
        assert_eq!(Patch::<i32>::Null.apply(Some(3)), None);
        assert_eq!(Patch::Value(0).apply(Some(3)), Some(0));
        assert_eq!(Patch::Value(7).apply(None), Some(7));
        assert_eq!(Patch::<i32>::Missing.apply(None), None);
    }

    #[test]
    fn test_apply_required_rejects_null() {
        assert!(Patch::Missing.apply_required(true, "isComplete").unwrap());
        assert!(!Patch::Value(false).apply_required(true, "isComplete").unwrap());

        let err = Patch::<bool>::Null.apply_required(true, "isComplete").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("isComplete")));
    }

    #[test]
    fn test_serialize_skips_missing() {
        let s = Sample {
            count: Patch::Value(2),
            flag: Patch::Missing,
        };
        assert_eq!(serde_json::to_value(&s).unwrap(), json!({"count": 2}));

        let s = Sample {
            count: Patch::Null,
            flag: Patch::Missing,
        };
        assert_eq!(serde_json::to_value(&s).unwrap(), json!({"count": null}));
    }
}
