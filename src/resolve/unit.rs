use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::source::CGO_PSEUDO_IMPORT;

/// Where a unit comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    StandardLibrary,
    External,
}

/// Direct imports of a unit, split by the files they appear in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSet {
    pub normal: BTreeSet<String>,
    pub test: BTreeSet<String>,
    pub external_test: BTreeSet<String>,
}

impl ImportSet {
    /// Union of all three roles, without the C-interop pseudo-import
    pub fn all(&self) -> BTreeSet<String> {
        self.normal
            .iter()
            .chain(&self.test)
            .chain(&self.external_test)
            .filter(|imp| imp.as_str() != CGO_PSEUDO_IMPORT)
            .cloned()
            .collect()
    }
}

/// A resolved unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub identifier: String,
    /// Absolute source directory
    pub dir: PathBuf,
    pub origin: Origin,
    pub imports: ImportSet,
    /// Source files (relative to `dir`) whose imports may be rewritten
    pub source_files: Vec<String>,
}

impl Unit {
    pub fn external(identifier: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            identifier: identifier.into(),
            dir: dir.into(),
            origin: Origin::External,
            imports: ImportSet::default(),
            source_files: Vec::new(),
        }
    }

    pub fn standard(identifier: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::StandardLibrary,
            ..Self::external(identifier, dir)
        }
    }

    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports.normal.extend(imports.into_iter().map(Into::into));
        self
    }

    pub fn with_test_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports.test.extend(imports.into_iter().map(Into::into));
        self
    }

    pub fn with_external_test_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports
            .external_test
            .extend(imports.into_iter().map(Into::into));
        self
    }

    pub fn with_source_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn is_standard_library(&self) -> bool {
        self.origin == Origin::StandardLibrary
    }

    pub fn all_imports(&self) -> BTreeSet<String> {
        self.imports.all()
    }
}
