use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use vendorize::{BuildContext, SearchPath, VendorConfig};

/// How run events are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventFormat {
    /// Human readable log lines
    Text,
    /// One JSON document per event on stdout
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "vendorize",
    version,
    about = "Copy the external dependency closure of a package under a destination prefix"
)]
pub struct Cli {
    /// Package whose dependencies are vendorized
    pub package: String,

    /// Import path prefix the copies are placed under
    pub destination: String,

    /// Perform a dry run: report everything, change nothing
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Provide verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Package prefix that is never copied. Can be given multiple times.
    #[arg(short = 'b', long = "exclude", value_name = "PREFIX")]
    pub exclude: Vec<String>,

    /// Overwrite packages that were already vendorized
    #[arg(short, long)]
    pub force: bool,

    /// Rewrite import statements to point at the vendorized packages
    #[arg(short = 'u', long)]
    pub update_imports: bool,

    /// Maximum number of packages processed at once
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// YAML file with defaults for any of the options above
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = EventFormat::Text)]
    pub events: EventFormat,

    /// Print the discovered import graph in Graphviz dot format
    #[arg(long)]
    pub graph: bool,

    #[arg(long, env = "GOPATH", value_name = "PATHS")]
    pub gopath: Option<String>,

    #[arg(long, env = "GOROOT", value_name = "DIR")]
    pub goroot: Option<String>,

    /// Target operating system for file selection (defaults to the host)
    #[arg(long, env = "GOOS", value_name = "OS")]
    pub goos: Option<String>,

    /// Target architecture for file selection (defaults to the host)
    #[arg(long, env = "GOARCH", value_name = "ARCH")]
    pub goarch: Option<String>,
}

impl Cli {
    /// Merge the optional config file with the command line. Flags win.
    pub fn to_config(&self) -> Result<VendorConfig> {
        let mut config = match &self.config {
            Some(path) => VendorConfig::from_yaml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => VendorConfig::default(),
        };

        config.root = self.package.clone();
        config.destination = self.destination.trim_end_matches('/').to_string();
        config.exclusions.extend(self.exclude.iter().cloned());
        config.force |= self.force;
        config.update_imports |= self.update_imports;
        config.dry_run |= self.dry_run;
        if let Some(n) = self.concurrency {
            config.max_concurrency = n;
        }

        let search = SearchPath::from_strings(self.goroot.as_deref(), self.gopath.as_deref());
        if search.goroot.is_some() {
            config.search.goroot = search.goroot;
        }
        if !search.gopath.is_empty() {
            config.search.gopath = search.gopath;
        }
        Ok(config)
    }

    pub fn build_context(&self) -> BuildContext {
        let mut build = BuildContext::host();
        if let Some(goos) = self.goos.as_deref().filter(|s| !s.is_empty()) {
            build.goos = goos.to_string();
        }
        if let Some(goarch) = self.goarch.as_deref().filter(|s| !s.is_empty()) {
            build.goarch = goarch.to_string();
        }
        build
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "vendorize",
            "-u",
            "-f",
            "-b",
            "golang.org/x",
            "-b",
            "example.com/internal",
            "--concurrency",
            "3",
            "--gopath",
            "/go",
            "example.com/a",
            "example.com/a/_vendor/",
        ])
        .unwrap();
        let config = cli.to_config().unwrap();

        assert_eq!(config.root, "example.com/a");
        assert_eq!(config.destination, "example.com/a/_vendor");
        assert_eq!(config.exclusions, vec!["golang.org/x", "example.com/internal"]);
        assert!(config.update_imports);
        assert!(config.force);
        assert!(!config.dry_run);
        assert_eq!(config.max_concurrency, 3);
        assert_eq!(config.search.gopath, vec![PathBuf::from("/go")]);
    }

    #[test]
    fn test_target_platform_flags() {
        let cli = Cli::try_parse_from([
            "vendorize",
            "--goos",
            "plan9",
            "--goarch",
            "arm",
            "example.com/a",
            "dest",
        ])
        .unwrap();
        assert_eq!(cli.build_context(), BuildContext::new("plan9", "arm"));
    }

    #[test]
    fn test_package_and_destination_are_required() {
        assert!(Cli::try_parse_from(["vendorize", "example.com/a"]).is_err());
    }
}
