//! Persistence error types
//!
//! Errors raised while compiling a type descriptor or while mapping objects
//! to and from directory entries.

use std::fmt;

use thiserror::Error;
use xavyo_directory::DirectoryError;

/// Boxed error returned by user-supplied constructors and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error that can occur while compiling a handler or mapping an object.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The type descriptor is invalid. Raised only while compiling.
    #[error("invalid descriptor for type {type_name}: {message}")]
    Validation { type_name: String, message: String },

    /// A new instance of the type could not be created.
    #[error("unable to create an instance of type {type_name}: {message}")]
    Construction {
        type_name: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// One or more members could not be decoded.
    #[error("unable to decode an entry into type {type_name}: {}", .reasons.join("  "))]
    Decode {
        type_name: String,
        reasons: Vec<String>,
        #[source]
        source: Option<BoxError>,
    },

    /// An entry could not be produced from an object.
    #[error("unable to encode an object of type {type_name}: {message}")]
    Encode {
        type_name: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A search filter could not be produced from an object.
    #[error("unable to build a search filter for type {type_name}: {message}")]
    Filter { type_name: String, message: String },

    /// A directory primitive could not be built.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl PersistError {
    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            PersistError::Validation { .. } => "VALIDATION_FAILED",
            PersistError::Construction { .. } => "CONSTRUCTION_FAILED",
            PersistError::Decode { .. } => "DECODE_FAILED",
            PersistError::Encode { .. } => "ENCODE_FAILED",
            PersistError::Filter { .. } => "FILTER_FAILED",
            PersistError::Directory(_) => "DIRECTORY_ERROR",
        }
    }

    /// Failure reasons carried by a decode error.
    pub fn reasons(&self) -> &[String] {
        match self {
            PersistError::Decode { reasons, .. } => reasons,
            _ => &[],
        }
    }

    // Convenience constructors

    /// Create a validation error.
    pub fn validation(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        PersistError::Validation {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Create a construction error with source.
    pub fn construction_with_source(
        type_name: impl Into<String>,
        source: BoxError,
    ) -> Self {
        PersistError::Construction {
            type_name: type_name.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create an encode error.
    pub fn encode(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        PersistError::Encode {
            type_name: type_name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an encode error with source.
    pub fn encode_with_source(
        type_name: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        PersistError::Encode {
            type_name: type_name.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a filter error.
    pub fn filter(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        PersistError::Filter {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Failure of [`CompiledHandler::decode`](crate::CompiledHandler::decode).
///
/// Decoding does not stop at the first bad member, so an incomplete decode
/// still hands back the partially populated object alongside every reason.
pub enum DecodeError<T> {
    /// No instance could be created.
    Construction(PersistError),

    /// An instance was created but not every member decoded cleanly.
    Incomplete { object: T, error: PersistError },
}

impl<T> DecodeError<T> {
    /// The underlying error.
    pub fn error(&self) -> &PersistError {
        match self {
            DecodeError::Construction(error) | DecodeError::Incomplete { error, .. } => error,
        }
    }

    /// Discard the partial object, keeping the error.
    pub fn into_error(self) -> PersistError {
        match self {
            DecodeError::Construction(error) | DecodeError::Incomplete { error, .. } => error,
        }
    }

    /// The partially populated object, if one was created.
    pub fn partial_object(&self) -> Option<&T> {
        match self {
            DecodeError::Construction(_) => None,
            DecodeError::Incomplete { object, .. } => Some(object),
        }
    }

    /// Take the partially populated object, if one was created.
    pub fn into_partial_object(self) -> Option<T> {
        match self {
            DecodeError::Construction(_) => None,
            DecodeError::Incomplete { object, .. } => Some(object),
        }
    }

    /// Failure reasons collected while decoding.
    pub fn reasons(&self) -> &[String] {
        self.error().reasons()
    }
}

impl<T> fmt::Debug for DecodeError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Construction(error) => {
                f.debug_tuple("Construction").field(error).finish()
            }
            DecodeError::Incomplete { error, .. } => f
                .debug_struct("Incomplete")
                .field("error", error)
                .finish_non_exhaustive(),
        }
    }
}

impl<T> fmt::Display for DecodeError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.error(), f)
    }
}

impl<T> std::error::Error for DecodeError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error())
    }
}

impl<T> From<DecodeError<T>> for PersistError {
    fn from(error: DecodeError<T>) -> Self {
        error.into_error()
    }
}
