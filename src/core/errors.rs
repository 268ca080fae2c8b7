use std::path::PathBuf;
use thiserror::Error;

use crate::resolve::ResolveError;
use crate::source::RewriteError;

/// Unified error type for a vendorize run
#[derive(Debug, Error)]
pub enum VendorError {
    /// A unit, or one of its direct imports, could not be resolved
    #[error("couldn't import {identifier}{}: {source}", imported_by_suffix(.imported_by))]
    ResolutionFailed {
        identifier: String,
        imported_by: Option<String>,
        #[source]
        source: ResolveError,
    },

    /// The root itself could not be resolved
    #[error("can't find root {identifier}: {source}")]
    RootUnresolvable {
        identifier: String,
        #[source]
        source: ResolveError,
    },

    /// The root resolved to a standard-library unit
    #[error("can't vendorize standard-library unit {identifier}")]
    StandardLibraryRoot { identifier: String },

    /// Destination already present and `force` not set
    #[error("ignored (preexisting): {identifier} at {}", .destination.display())]
    PreexistingSkipped {
        identifier: String,
        destination: PathBuf,
    },

    /// I/O failure while copying a unit
    #[error("couldn't copy {identifier} to {}: {source}", .destination.display())]
    CopyFailed {
        identifier: String,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parse or write failure while rewriting one file
    #[error("{identifier}: couldn't rewrite file {}: {source}", .file.display())]
    RewriteFailed {
        identifier: String,
        file: PathBuf,
        #[source]
        source: RewriteError,
    },

    /// A worker terminated without reporting an outcome
    #[error("traversal of {identifier} aborted: {reason}")]
    Aborted { identifier: String, reason: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// IO errors outside of a unit (config files, event output)
    #[error("IO operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization errors
    #[error("Serialization failed: {format}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

fn imported_by_suffix(imported_by: &Option<String>) -> String {
    match imported_by {
        Some(parent) => format!(" (imported by {parent})"),
        None => String::new(),
    }
}

impl VendorError {
    /// Create a resolution error for a unit that was requested directly
    pub fn resolution<S: Into<String>>(identifier: S, source: ResolveError) -> Self {
        Self::ResolutionFailed {
            identifier: identifier.into(),
            imported_by: None,
            source,
        }
    }

    /// Create a resolution error for an import of `parent`
    pub fn import_resolution<S: Into<String>, P: Into<String>>(
        identifier: S,
        parent: P,
        source: ResolveError,
    ) -> Self {
        Self::ResolutionFailed {
            identifier: identifier.into(),
            imported_by: Some(parent.into()),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error naming the offending field
    pub fn configuration_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an IO error
    pub fn io<S: Into<String>>(operation: S, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        format: S,
        source: E,
    ) -> Self {
        Self::Serialization {
            format: format.into(),
            source: Box::new(source),
        }
    }

    /// The identifier of the unit this error belongs to, if any
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::ResolutionFailed { identifier, .. }
            | Self::RootUnresolvable { identifier, .. }
            | Self::StandardLibraryRoot { identifier }
            | Self::PreexistingSkipped { identifier, .. }
            | Self::CopyFailed { identifier, .. }
            | Self::RewriteFailed { identifier, .. }
            | Self::Aborted { identifier, .. } => Some(identifier),
            Self::Configuration { .. } | Self::Io { .. } | Self::Serialization { .. } => None,
        }
    }

    /// Informational errors are reported but do not fail the run
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::PreexistingSkipped { .. })
    }

    /// Fatal errors abort a run before any traversal starts
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::RootUnresolvable { .. }
                | Self::StandardLibraryRoot { .. }
                | Self::Configuration { .. }
                | Self::Io { .. }
                | Self::Serialization { .. }
        )
    }

    /// Get error category for logging and events
    pub fn category(&self) -> &'static str {
        match self {
            Self::ResolutionFailed { .. } => "resolution",
            Self::RootUnresolvable { .. } => "root_unresolvable",
            Self::StandardLibraryRoot { .. } => "standard_library_root",
            Self::PreexistingSkipped { .. } => "preexisting",
            Self::CopyFailed { .. } => "copy",
            Self::RewriteFailed { .. } => "rewrite",
            Self::Aborted { .. } => "aborted",
            Self::Configuration { .. } => "configuration",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, VendorError>;

impl From<serde_yaml::Error> for VendorError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization("yaml", err)
    }
}

impl From<serde_json::Error> for VendorError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("json", err)
    }
}
