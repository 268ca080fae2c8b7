//! Throwaway GOPATH workspaces for integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use vendorize::{BuildContext, GoPathResolver, SearchPath, VendorConfig};

pub const DESTINATION: &str = "example.com/a/_vendor";

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn gopath(&self) -> PathBuf {
        self.dir.path().join("gopath")
    }

    pub fn unit_dir(&self, identifier: &str) -> PathBuf {
        identifier
            .split('/')
            .fold(self.gopath().join("src"), |dir, segment| dir.join(segment))
    }

    pub fn vendored_dir(&self, identifier: &str) -> PathBuf {
        self.unit_dir(&format!("{DESTINATION}/{identifier}"))
    }

    pub fn write(&self, identifier: &str, file: &str, content: &str) {
        let dir = self.unit_dir(identifier);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file), content).unwrap();
    }

    pub fn read(&self, identifier: &str, file: &str) -> String {
        std::fs::read_to_string(self.unit_dir(identifier).join(file)).unwrap()
    }

    pub fn read_vendored(&self, identifier: &str, file: &str) -> String {
        std::fs::read_to_string(self.vendored_dir(identifier).join(file)).unwrap()
    }

    pub fn search_path(&self) -> SearchPath {
        SearchPath::new(None, vec![self.gopath()])
    }

    pub fn resolver(&self) -> Arc<GoPathResolver> {
        Arc::new(
            GoPathResolver::new(self.search_path())
                .with_build_context(BuildContext::new("linux", "amd64")),
        )
    }

    pub fn config(&self, root: &str) -> VendorConfig {
        VendorConfig::new(root, DESTINATION).with_search_path(self.search_path())
    }

    /// `example.com/a` imports b and c, b imports golang.org/x/d.
    pub fn standard_layout(&self) {
        self.write("example.com/a", "a.go", ROOT_SOURCE);
        self.write(
            "example.com/b",
            "b.go",
            "package b\n\nimport \"golang.org/x/d\"\n\nvar B = d.D\n",
        );
        self.write(
            "example.com/b",
            "b_test.go",
            "package b_test\n\nimport (\n\t\"testing\"\n\n\t\"example.com/b\"\n)\n\nfunc TestB(t *testing.T) { _ = b.B }\n",
        );
        self.write("example.com/c", "c.go", "package c\n\nconst C = 1\n");
        self.write("golang.org/x/d", "d.go", "package d\n\nconst D = 2\n");
    }
}

pub const ROOT_SOURCE: &str = "package main\n\nimport (\n\t\"fmt\"\n\n\t\"example.com/b\"\n\tcc \"example.com/c\"\n)\n\nfunc main() { fmt.Println(b.B, cc.C) }\n";

pub fn set(items: &[&str]) -> std::collections::BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}
