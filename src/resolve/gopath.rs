//! Resolves units against a GOROOT / GOPATH style search path

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::build::BuildContext;
use super::{ImportSet, ResolveError, Unit, UnitResolver};
use crate::core::config::SearchPath;
use crate::source::parse_imports;

const SOURCE_EXTENSION: &str = ".go";
const TEST_SUFFIX: &str = "_test.go";

/// Filesystem resolver. Standard-library units live under `$GOROOT/src`,
/// everything else under `src` of one of the `$GOPATH` entries.
#[derive(Debug, Clone)]
pub struct GoPathResolver {
    search: SearchPath,
    build: BuildContext,
}

impl GoPathResolver {
    /// Resolver selecting files for the host platform
    pub fn new(search: SearchPath) -> Self {
        Self {
            search,
            build: BuildContext::host(),
        }
    }

    pub fn with_build_context(mut self, build: BuildContext) -> Self {
        self.build = build;
        self
    }

    /// Blocking lookup.
    ///
    /// Order: `$GOROOT/src`, then every `$GOPATH` entry. Without a GOROOT an
    /// identifier that no GOPATH entry provides is taken for standard library
    /// when its first element has no dot.
    pub fn resolve_blocking(&self, identifier: &str) -> Result<Unit, ResolveError> {
        validate_identifier(identifier)?;

        let mut searched = Vec::new();
        if let Some(goroot) = &self.search.goroot {
            let dir = join_identifier(&goroot.join("src"), identifier);
            if dir.is_dir() {
                return Ok(Unit::standard(identifier, dir));
            }
            searched.push(dir);
        }

        for root in &self.search.gopath {
            let dir = join_identifier(&root.join("src"), identifier);
            if dir.is_dir() {
                return scan_unit_dir(identifier, &dir, &self.build);
            }
            searched.push(dir);
        }

        if self.search.goroot.is_none() && looks_like_standard_library(identifier) {
            return Ok(Unit::standard(identifier, PathBuf::new()));
        }
        Err(ResolveError::not_found(identifier, searched))
    }
}

#[async_trait]
impl UnitResolver for GoPathResolver {
    async fn resolve(&self, identifier: &str) -> Result<Unit, ResolveError> {
        let resolver = self.clone();
        let identifier = identifier.to_string();
        tokio::task::spawn_blocking(move || resolver.resolve_blocking(&identifier))
            .await
            .map_err(|e| ResolveError::Internal(e.to_string()))?
    }
}

fn validate_identifier(identifier: &str) -> Result<(), ResolveError> {
    if identifier.is_empty() {
        return Err(ResolveError::invalid(identifier, "empty identifier"));
    }
    if identifier.starts_with('/') || identifier.contains('\\') {
        return Err(ResolveError::invalid(identifier, "must be a relative slash-separated path"));
    }
    if identifier
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(ResolveError::invalid(identifier, "contains an empty, '.' or '..' element"));
    }
    Ok(())
}

/// Standard-library identifiers have no dot in their first element
fn looks_like_standard_library(identifier: &str) -> bool {
    let first = identifier.split('/').next().unwrap_or(identifier);
    !first.contains('.')
}

pub(crate) fn join_identifier(root: &Path, identifier: &str) -> PathBuf {
    identifier
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |dir, segment| dir.join(segment))
}

fn scan_unit_dir(identifier: &str, dir: &Path, build: &BuildContext) -> Result<Unit, ResolveError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| ResolveError::io(dir, e))? {
        let entry = entry.map_err(|e| ResolveError::io(dir, e))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.ends_with(SOURCE_EXTENSION) || name.starts_with('_') || name.starts_with('.') {
            continue;
        }
        if !build.matches_file_name(&name) {
            debug!("Skipping {:?}: not built for {}/{}", name, build.goos, build.goarch);
            continue;
        }
        let is_file = std::fs::metadata(entry.path())
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if is_file {
            names.push(name);
        }
    }
    names.sort();

    let mut imports = ImportSet::default();
    let mut source_files = Vec::new();
    for name in names {
        let path = dir.join(&name);
        let text = std::fs::read_to_string(&path).map_err(|e| ResolveError::io(&path, e))?;
        let header = parse_imports(&text).map_err(|source| ResolveError::Parse {
            file: path.clone(),
            source,
        })?;
        if !build.matches_header(&header) {
            debug!("Skipping {:?}: build constraint excludes it", path);
            continue;
        }

        let role = if !name.ends_with(TEST_SUFFIX) {
            &mut imports.normal
        } else if header.package.ends_with("_test") {
            &mut imports.external_test
        } else {
            &mut imports.test
        };
        role.extend(header.import_paths().map(str::to_string));
        source_files.push(name);
    }

    if source_files.is_empty() {
        return Err(ResolveError::NoSourceFiles {
            identifier: identifier.to_string(),
            dir: dir.to_path_buf(),
        });
    }

    Ok(Unit {
        imports,
        source_files,
        ..Unit::external(identifier, dir)
    })
}
