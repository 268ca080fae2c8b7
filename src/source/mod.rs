//! Source file handling: import scanning and import rewriting

pub mod imports;
pub mod rewrite;

pub use imports::{parse_imports, ImportSpec, ParseError, SourceHeader, CGO_PSEUDO_IMPORT};
pub use rewrite::{rewrite_imports, rewrite_source, RewriteError, RewriteOutcome};
