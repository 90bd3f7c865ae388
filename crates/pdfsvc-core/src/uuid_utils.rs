//! UUID v7 utilities for time-ordered identifiers.
//!
//! Documents and selections are keyed by UUIDv7 so that identifiers sort in
//! creation order.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// # Example
///
/// ```
/// use pdfsvc_core::uuid_utils::{is_v7, new_v7};
///
/// let id = new_v7();
/// assert!(is_v7(&id));
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Check whether a UUID is version 7.
pub fn is_v7(uuid: &Uuid) -> bool {
    uuid.get_version_num() == 7
}
