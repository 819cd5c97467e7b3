//! Directory primitive error types
//!
//! Errors raised while parsing or validating DNs, RDNs, filters and schema
//! element names.

use thiserror::Error;

/// Error that can occur while building or parsing directory primitives.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// A distinguished name could not be parsed.
    #[error("invalid DN '{dn}': {reason}")]
    InvalidDn { dn: String, reason: String },

    /// A relative distinguished name could not be built or parsed.
    #[error("invalid RDN '{rdn}': {reason}")]
    InvalidRdn { rdn: String, reason: String },

    /// An attribute type or object class name is not a valid LDAP name.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A filter component could not be built.
    #[error("invalid filter: {message}")]
    InvalidFilter { message: String },
}

impl DirectoryError {
    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            DirectoryError::InvalidDn { .. } => "INVALID_DN",
            DirectoryError::InvalidRdn { .. } => "INVALID_RDN",
            DirectoryError::InvalidName { .. } => "INVALID_NAME",
            DirectoryError::InvalidFilter { .. } => "INVALID_FILTER",
        }
    }

    /// Create an invalid DN error.
    pub fn invalid_dn(dn: impl Into<String>, reason: impl Into<String>) -> Self {
        DirectoryError::InvalidDn {
            dn: dn.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid RDN error.
    pub fn invalid_rdn(rdn: impl Into<String>, reason: impl Into<String>) -> Self {
        DirectoryError::InvalidRdn {
            rdn: rdn.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        DirectoryError::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for directory primitive operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
