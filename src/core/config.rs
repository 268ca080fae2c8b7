use crate::core::errors::{Result, VendorError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directories searched when resolving units on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPath {
    /// Standard library root (`$GOROOT`). Without it, standard-library units are
    /// recognised by their first path element carrying no dot.
    pub goroot: Option<PathBuf>,
    /// Workspace roots (`$GOPATH` entries), searched in order
    pub gopath: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(goroot: Option<PathBuf>, gopath: Vec<PathBuf>) -> Self {
        Self { goroot, gopath }
    }

    /// Build from the raw flag / environment strings
    pub fn from_strings(goroot: Option<&str>, gopath: Option<&str>) -> Self {
        Self {
            goroot: goroot.filter(|s| !s.is_empty()).map(PathBuf::from),
            gopath: gopath
                .map(|s| parse_path_list(std::ffi::OsStr::new(s)))
                .unwrap_or_default(),
        }
    }

    /// `src` under the last workspace root, where vendored copies land
    pub fn destination_root(&self) -> Option<PathBuf> {
        self.gopath.last().map(|root| root.join("src"))
    }
}

fn parse_path_list(value: &std::ffi::OsStr) -> Vec<PathBuf> {
    std::env::split_paths(value)
        .filter(|path| !path.as_os_str().is_empty())
        .collect()
}

/// Configuration for one vendorize run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// Identifier of the unit whose closure is vendored
    pub root: String,
    /// Destination identifier prefix copies are placed under
    pub destination: String,
    /// Extra prefixes whose units are traversed but never copied
    pub exclusions: Vec<String>,
    /// Overwrite destinations that already exist
    pub force: bool,
    /// Rewrite import literals to point at the copies
    pub update_imports: bool,
    /// Report what would happen without touching the filesystem
    pub dry_run: bool,
    /// Maximum number of traversal workers in flight
    pub max_concurrency: usize,
    /// Capacity of the worker → coordinator channel
    pub channel_capacity: usize,
    /// Directory identifiers are laid out under. Defaults to `src` under the
    /// last search path entry.
    pub destination_root: Option<PathBuf>,
    pub search: SearchPath,
}

impl Default for VendorConfig {
    fn default() -> Self {
        let cpu_count = num_cpus::get();

        Self {
            root: String::new(),
            destination: String::new(),
            exclusions: Vec::new(),
            force: false,
            update_imports: false,
            dry_run: false,
            max_concurrency: (cpu_count * 2).max(2),
            channel_capacity: 1_024,
            destination_root: None,
            search: SearchPath::default(),
        }
    }
}

impl VendorConfig {
    pub fn new(root: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            destination: destination.into(),
            ..Self::default()
        }
    }

    pub fn with_exclusion(mut self, prefix: impl Into<String>) -> Self {
        self.exclusions.push(prefix.into());
        self
    }

    pub fn with_exclusions<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions.extend(prefixes.into_iter().map(Into::into));
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_update_imports(mut self, update_imports: bool) -> Self {
        self.update_imports = update_imports;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_destination_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.destination_root = Some(root.into());
        self
    }

    pub fn with_search_path(mut self, search: SearchPath) -> Self {
        self.search = search;
        self
    }

    /// Load a configuration file. Missing fields keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| VendorError::io(format!("read config {}", path.display()), e))?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.root.trim().is_empty() {
            return Err(VendorError::configuration_field("package name required", "root"));
        }
        if self.destination.trim().is_empty() {
            return Err(VendorError::configuration_field(
                "destination path required",
                "destination",
            ));
        }
        if self.destination.starts_with('/') || self.destination.ends_with('/') {
            return Err(VendorError::configuration_field(
                "destination must be an import path without leading or trailing '/'",
                "destination",
            ));
        }
        if self.max_concurrency == 0 {
            return Err(VendorError::configuration_field(
                "max_concurrency must be greater than 0",
                "max_concurrency",
            ));
        }
        if self.channel_capacity == 0 {
            return Err(VendorError::configuration_field(
                "channel_capacity must be greater than 0",
                "channel_capacity",
            ));
        }
        if self.exclusions.iter().any(|prefix| prefix.is_empty()) {
            // An empty prefix matches every identifier.
            return Err(VendorError::configuration_field(
                "exclusion prefixes must not be empty",
                "exclusions",
            ));
        }
        Ok(())
    }

    /// Directory destination identifiers are laid out under
    pub fn resolved_destination_root(&self) -> Result<PathBuf> {
        self.destination_root
            .clone()
            .or_else(|| self.search.destination_root())
            .ok_or_else(|| {
                VendorError::configuration_field("GOPATH must be set", "search.gopath")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_root_and_destination() {
        assert!(VendorConfig::default().validate().is_err());
        assert!(VendorConfig::new("example.com/a", "").validate().is_err());
        assert!(VendorConfig::new("example.com/a", "example.com/a/_vendor")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_exclusion() {
        let config = VendorConfig::new("a", "dest").with_exclusion("");
        assert!(matches!(
            config.validate(),
            Err(VendorError::Configuration { field: Some(ref f), .. }) if f == "exclusions"
        ));
    }

    #[test]
    fn test_destination_root_uses_last_gopath_entry() {
        let search = SearchPath::new(
            None,
            vec![PathBuf::from("/first"), PathBuf::from("/second")],
        );
        assert_eq!(search.destination_root(), Some(PathBuf::from("/second/src")));

        let config = VendorConfig::new("a", "dest").with_search_path(search);
        assert_eq!(
            config.resolved_destination_root().unwrap(),
            PathBuf::from("/second/src")
        );

        let explicit = config.with_destination_root("/elsewhere");
        assert_eq!(
            explicit.resolved_destination_root().unwrap(),
            PathBuf::from("/elsewhere")
        );
    }

    #[test]
    fn test_destination_root_requires_gopath() {
        let config = VendorConfig::new("a", "dest");
        assert!(config.resolved_destination_root().is_err());
    }

    #[test]
    fn test_yaml_keeps_defaults_for_missing_fields() {
        let config = VendorConfig::from_yaml_str(
            "root: example.com/a\ndestination: example.com/a/_vendor\nexclusions: [golang.org/x]\nforce: true\n",
        )
        .unwrap();
        assert_eq!(config.root, "example.com/a");
        assert_eq!(config.exclusions, vec!["golang.org/x".to_string()]);
        assert!(config.force);
        assert!(!config.dry_run);
        assert!(config.max_concurrency >= 2);
    }
}
