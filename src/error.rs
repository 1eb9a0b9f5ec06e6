//! Error types for certificate removal.
//!
//! Store-level failures abort a batch, while a missing certificate is an
//! outcome rather than an error (see [`crate::report::Event::NotFound`]).

use thiserror::Error;

use crate::store::StoreScope;

/// Result type alias using [`CertPurgeError`].
pub type Result<T> = std::result::Result<T, CertPurgeError>;

/// Errors that can occur while removing certificates.
#[derive(Debug, Error)]
pub enum CertPurgeError {
    /// Invalid command-line usage (bad scope token, missing arguments).
    #[error("Usage error: {0}")]
    Usage(String),

    /// The certificate store could not be opened.
    #[error("Cannot open certificate store {scope}\\{store}: {reason}")]
    StoreAccess {
        /// Scope the store was opened under.
        scope: StoreScope,
        /// Store name as given by the caller.
        store: String,
        /// Platform-provided reason.
        reason: String,
    },

    /// A certificate could not be removed from an open store.
    #[error("Failed to remove certificate {serial_number}: {reason}")]
    Removal {
        /// Serial number of the certificate.
        serial_number: String,
        /// Platform-provided reason.
        reason: String,
    },

    /// A certificate in the store could not be decoded.
    #[error("Certificate decoding error: {0}")]
    Certificate(String),

    /// Window lookup, focus or key posting failed.
    #[error("Dialog automation error: {0}")]
    Automation(String),

    /// Configuration file is missing, unreadable or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation is not available on this platform.
    #[error("Platform error: {0}")]
    Platform(String),

    /// DER decoding error.
    #[error("DER error: {0}")]
    Der(#[from] der::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CertPurgeError {
    /// Create a usage error with the given message.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Create a store access error.
    pub fn store_access(
        scope: StoreScope,
        store: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::StoreAccess {
            scope,
            store: store.into(),
            reason: reason.into(),
        }
    }

    /// Create a removal error.
    pub fn removal(serial_number: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Removal {
            serial_number: serial_number.into(),
            reason: reason.into(),
        }
    }

    /// Create a certificate decoding error.
    pub fn certificate(msg: impl Into<String>) -> Self {
        Self::Certificate(msg.into())
    }

    /// Create an automation error.
    pub fn automation(msg: impl Into<String>) -> Self {
        Self::Automation(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a platform error.
    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform(msg.into())
    }

    /// Returns true if this error must abort the whole batch.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Automation(_) | Self::Certificate(_))
    }
}
