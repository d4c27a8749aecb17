//! Failures surfaced by the persistence layer.

use std::io;

use thiserror::Error;

/// Errors that can occur while reading or writing the save document.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The storage medium could not be read or written.
    #[error("could not access save document at {location}")]
    Io {
        /// Human-readable description of the storage location.
        location: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The in-memory document could not be encoded.
    #[error("could not serialize save document")]
    Serialize(#[source] serde_json::Error),
    /// The stored document is not valid JSON of the expected shape.
    #[error("save document is corrupt")]
    Deserialize(#[source] serde_json::Error),
    /// Serialization produced no output.
    #[error("serialized save document was empty")]
    EmptyDocument,
    /// The stored document was written by a newer build.
    #[error("save document version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version recorded in the document.
        found: u32,
        /// Highest version this build understands.
        supported: u32,
    },
}

impl PersistenceError {
    pub(crate) fn io(location: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            location: location.into(),
            source,
        }
    }
}
