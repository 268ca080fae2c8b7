//! Unit resolution
//!
//! A [`UnitResolver`] maps an import identifier to its on-disk location and
//! direct imports. [`ResolverCache`] memoizes one for the length of a run.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

pub mod build;
pub mod cache;
pub mod gopath;
pub mod memory;
pub mod unit;

pub use build::BuildContext;
pub use cache::{CacheStats, ResolverCache};
pub use gopath::GoPathResolver;
pub use memory::MemoryResolver;
pub use unit::{ImportSet, Origin, Unit};

use crate::source::ParseError;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot find unit {identifier:?} in any of {searched:?}")]
    NotFound {
        identifier: String,
        searched: Vec<PathBuf>,
    },

    #[error("no buildable source files in {}", .dir.display())]
    NoSourceFiles { identifier: String, dir: PathBuf },

    #[error("invalid import identifier {identifier:?}: {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .file.display())]
    Parse {
        file: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("resolver task failed: {0}")]
    Internal(String),
}

impl ResolveError {
    pub fn not_found(identifier: impl Into<String>, searched: Vec<PathBuf>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
            searched,
        }
    }

    pub fn invalid(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Looks up a unit by import identifier
#[async_trait]
pub trait UnitResolver: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Result<Unit, ResolveError>;
}
