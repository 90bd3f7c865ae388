//! Error types for the PDF selection service.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using the service's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for document, metadata, and selection operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),

    /// Metadata not found for the given document
    #[error("Metadata not found: {0}")]
    MetaDataNotFound(Uuid),

    /// Selection not found
    #[error("Selection not found: {0}")]
    SelectionNotFound(Uuid),

    /// Malformed or missing required input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A referenced entity does not exist
    #[error("Referenced entity missing: {0}")]
    Referential(String),

    /// Write collided with existing state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Wire or storage representation could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stored data could not be read back
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// True for every not-found flavour.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::DocumentNotFound(_)
                | Error::MetaDataNotFound(_)
                | Error::SelectionNotFound(_)
        )
    }

    /// True for errors caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_)
                | Error::Referential(_)
                | Error::Decode(_)
                | Error::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_storage() {
        let err = Error::Storage("selection 7 has unreadable bounds".to_string());
        assert_eq!(err.to_string(), "Storage error: selection 7 has unreadable bounds");
    }

    #[test]
    fn test_error_display_document_not_found() {
        let id = Uuid::nil();
        let err = Error::DocumentNotFound(id);
        assert_eq!(err.to_string(), format!("Document not found: {}", id));
    }

    #[test]
    fn test_error_display_selection_not_found() {
        let id = Uuid::new_v4();
        let err = Error::SelectionNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_error_display_referential() {
        let err = Error::Referential("document 42".to_string());
        assert_eq!(err.to_string(), "Referenced entity missing: document 42");
    }

    #[test]
    fn test_error_display_decode() {
        let err = Error::Decode("bad group key".to_string());
        assert_eq!(err.to_string(), "Decode error: bad group key");
    }

    #[test]
    fn test_not_found_classification() {
        assert!(Error::DocumentNotFound(Uuid::nil()).is_not_found());
        assert!(Error::MetaDataNotFound(Uuid::nil()).is_not_found());
        assert!(Error::SelectionNotFound(Uuid::nil()).is_not_found());
        assert!(!Error::Conflict("x".into()).is_not_found());
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::InvalidInput("x".into()).is_client_error());
        assert!(Error::Referential("x".into()).is_client_error());
        assert!(Error::Decode("x".into()).is_client_error());
        assert!(!Error::Storage("x".into()).is_client_error());
        assert!(!Error::Storage("x".into()).is_not_found());
        assert!(!Error::DocumentNotFound(Uuid::nil()).is_client_error());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
