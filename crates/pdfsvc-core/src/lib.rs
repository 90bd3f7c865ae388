//! # pdfsvc-core
//!
//! Core types, merge semantics, and repository contracts for the PDF
//! selection service.
//!
//! This crate provides the data model (documents, metadata, selections and
//! their bounds index), the partial-update machinery, the storage traits
//! implemented by `pdfsvc-db`, and the aggregate services the HTTP layer
//! calls into.

pub mod bounds;
pub mod error;
pub mod memory;
pub mod models;
pub mod patch;
pub mod service;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use bounds::{BoundsIndex, SelectionBound};
pub use error::{Error, Result};
pub use memory::InMemoryStore;
pub use models::*;
pub use patch::{Merge, Patch};
pub use service::{DocumentService, MetaDataService, SelectionService};
pub use traits::*;
pub use uuid_utils::{is_v7, new_v7};
