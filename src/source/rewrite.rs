use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::imports::{parse_imports, quote, ParseError};

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("{} is not valid UTF-8", .path.display())]
    Encoding { path: PathBuf },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RewriteError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// No import matched; nothing was written
    Unchanged,
    /// `replaced` literals were swapped (or would be, in a dry run)
    Rewritten { replaced: usize },
}

/// Replace the literal of every import found in `mapping`. Returns `None` when
/// no import matches. All other bytes are kept as they are.
pub fn rewrite_source(
    src: &str,
    mapping: &BTreeMap<String, String>,
) -> Result<Option<(String, usize)>, ParseError> {
    let header = parse_imports(src)?;
    let replacements: Vec<_> = header
        .imports
        .iter()
        .filter_map(|spec| {
            mapping
                .get(&spec.path)
                .map(|target| (spec.literal.clone(), quote(target)))
        })
        .collect();
    if replacements.is_empty() {
        return Ok(None);
    }

    let mut out = String::with_capacity(src.len() + replacements.len() * 16);
    let mut cursor = 0;
    for (range, literal) in &replacements {
        out.push_str(&src[cursor..range.start]);
        out.push_str(literal);
        cursor = range.end;
    }
    out.push_str(&src[cursor..]);
    Ok(Some((out, replacements.len())))
}

/// Rewrite the imports of `source` and store the result at `target`.
///
/// `source` and `target` may be the same file. The new content goes to a
/// temporary file next to `target` that is renamed over it, keeping the
/// permissions of the file it replaces. A dry run parses and reports without
/// writing.
pub fn rewrite_imports(
    source: &Path,
    target: &Path,
    mapping: &BTreeMap<String, String>,
    dry_run: bool,
) -> Result<RewriteOutcome, RewriteError> {
    let bytes = std::fs::read(source).map_err(|e| RewriteError::io(source, e))?;
    let text = String::from_utf8(bytes).map_err(|_| RewriteError::Encoding {
        path: source.to_path_buf(),
    })?;

    let Some((rewritten, replaced)) = rewrite_source(&text, mapping)? else {
        return Ok(RewriteOutcome::Unchanged);
    };
    if dry_run {
        return Ok(RewriteOutcome::Rewritten { replaced });
    }

    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".vendorize")
        .tempfile_in(dir)
        .map_err(|e| RewriteError::io(dir, e))?;
    tmp.write_all(rewritten.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| RewriteError::io(tmp.path(), e))?;

    let permissions = std::fs::metadata(target)
        .or_else(|_| std::fs::metadata(source))
        .map(|meta| meta.permissions());
    if let Ok(permissions) = permissions {
        std::fs::set_permissions(tmp.path(), permissions)
            .map_err(|e| RewriteError::io(tmp.path(), e))?;
    }

    tmp.persist(target)
        .map_err(|e| RewriteError::io(target, e.error))?;
    Ok(RewriteOutcome::Rewritten { replaced })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const SRC: &str = "package a\n\nimport (\n\t\"fmt\"\n\tb \"example.com/b\" // keep me\n\t\"example.com/d\"\n)\n\nfunc A() { b.B(); fmt.Println() }\n";

    #[test]
    fn test_rewrite_source_replaces_only_mapped_literals() {
        let map = mapping(&[("example.com/b", "dest/example.com/b")]);
        let (out, replaced) = rewrite_source(SRC, &map).unwrap().unwrap();
        assert_eq!(replaced, 1);
        assert_eq!(out, SRC.replace("\"example.com/b\"", "\"dest/example.com/b\""));
    }

    #[test]
    fn test_rewrite_source_without_matches() {
        let map = mapping(&[("example.com/zzz", "dest/example.com/zzz")]);
        assert!(rewrite_source(SRC, &map).unwrap().is_none());
    }

    #[test]
    fn test_rewrite_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.go");
        std::fs::write(&file, SRC).unwrap();

        let map = mapping(&[
            ("example.com/b", "dest/example.com/b"),
            ("example.com/d", "dest/example.com/d"),
        ]);
        let outcome = rewrite_imports(&file, &file, &map, false).unwrap();
        assert_eq!(outcome, RewriteOutcome::Rewritten { replaced: 2 });

        let written = std::fs::read_to_string(&file).unwrap();
        assert!(written.contains("b \"dest/example.com/b\" // keep me"));
        assert!(written.contains("\"dest/example.com/d\""));
        assert!(written.contains("\"fmt\""));

        // only the target file remains in the directory
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.go");
        std::fs::write(&file, SRC).unwrap();

        let map = mapping(&[("example.com/b", "dest/example.com/b")]);
        let outcome = rewrite_imports(&file, &file, &map, true).unwrap();
        assert_eq!(outcome, RewriteOutcome::Rewritten { replaced: 1 });
        assert_eq!(std::fs::read_to_string(&file).unwrap(), SRC);
    }

    #[test]
    fn test_parse_failure_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.go");
        let broken = "package a\nimport (\n\"example.com/b\n)\n";
        std::fs::write(&file, broken).unwrap();

        let map = mapping(&[("example.com/b", "dest/example.com/b")]);
        let err = rewrite_imports(&file, &file, &map, false).unwrap_err();
        assert!(matches!(err, RewriteError::Parse(_)));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), broken);
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.go");
        std::fs::write(&file, SRC).unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o644)).unwrap();

        let map = mapping(&[("example.com/b", "dest/example.com/b")]);
        rewrite_imports(&file, &file, &map, false).unwrap();

        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
