//! Build-context file selection: `//go:build` expressions, legacy `// +build`
//! lines and `_GOOS_GOARCH` file name suffixes.

use serde::{Deserialize, Serialize};

use crate::source::SourceHeader;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// Target platform that source files are selected for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub cgo_enabled: bool,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::host()
    }
}

impl BuildContext {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
            cgo_enabled: true,
        }
    }

    /// The platform this process runs on
    pub fn host() -> Self {
        let goos = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let goarch = match std::env::consts::ARCH {
            "x86" => "386",
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "loongarch64" => "loong64",
            "powerpc" => "ppc",
            "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
            "powerpc64" => "ppc64",
            "wasm32" => "wasm",
            other => other,
        };
        Self::new(goos, goarch)
    }

    /// Whether a single build tag is satisfied
    pub fn matches_tag(&self, tag: &str) -> bool {
        match tag {
            "" => false,
            "cgo" => self.cgo_enabled,
            "gc" => true,
            "unix" => UNIX_OS.contains(&self.goos.as_str()),
            "linux" if self.goos == "android" => true,
            "solaris" if self.goos == "illumos" => true,
            "darwin" if self.goos == "ios" => true,
            _ if is_release_tag(tag) => true,
            _ => tag == self.goos || tag == self.goarch,
        }
    }

    /// Apply the `_GOOS`, `_GOARCH` and `_GOOS_GOARCH` file name rules.
    /// Anything before the first `_` is ignored, so `windows.go` always matches.
    pub fn matches_file_name(&self, name: &str) -> bool {
        let stem = name.strip_suffix(".go").unwrap_or(name);
        let stem = stem.strip_suffix("_test").unwrap_or(stem);
        let Some(idx) = stem.find('_') else {
            return true;
        };
        let parts: Vec<&str> = stem[idx..].split('_').collect();
        let n = parts.len();

        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.matches_tag(parts[n - 2]) && self.matches_tag(parts[n - 1]);
        }
        let last = parts[n - 1];
        if KNOWN_OS.contains(&last) || KNOWN_ARCH.contains(&last) {
            return self.matches_tag(last);
        }
        true
    }

    /// Evaluate the constraints of a parsed header. A `//go:build` line takes
    /// precedence over `// +build` lines. A malformed expression excludes the
    /// file.
    pub fn matches_header(&self, header: &SourceHeader) -> bool {
        if let Some(expr) = &header.build_constraint {
            return self.eval_expr(expr).unwrap_or(false);
        }
        header.plus_build.iter().all(|line| self.eval_plus_build(line))
    }

    /// `// +build` semantics: space-separated options are ORed, comma-separated
    /// terms within an option are ANDed.
    fn eval_plus_build(&self, line: &str) -> bool {
        line.split_whitespace().any(|option| {
            option.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !tag.is_empty() && !self.matches_tag(tag),
                None => self.matches_tag(term),
            })
        })
    }

    pub fn eval_expr(&self, expr: &str) -> Option<bool> {
        let tokens = tokenize(expr)?;
        let mut parser = ExprParser {
            tokens: &tokens,
            pos: 0,
            ctx: self,
        };
        let value = parser.or()?;
        (parser.pos == tokens.len()).then_some(value)
    }
}

fn is_release_tag(tag: &str) -> bool {
    tag.strip_prefix("go1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Tag(&'a str),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(expr: &str) -> Option<Vec<Token<'_>>> {
    let bytes = expr.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' => i += 1,
            b'!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            b'(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            b'&' if bytes.get(i + 1) == Some(&b'&') => {
                tokens.push(Token::And);
                i += 2;
            }
            b'|' if bytes.get(i + 1) == Some(&b'|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            b if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
                {
                    i += 1;
                }
                tokens.push(Token::Tag(&expr[start..i]));
            }
            _ => return None,
        }
    }
    Some(tokens)
}

struct ExprParser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    ctx: &'t BuildContext,
}

impl ExprParser<'_, '_> {
    fn next_if(&mut self, token: &Token<'_>) -> bool {
        if self.tokens.get(self.pos) == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Option<bool> {
        let mut value = self.and()?;
        while self.next_if(&Token::Or) {
            value |= self.and()?;
        }
        Some(value)
    }

    fn and(&mut self) -> Option<bool> {
        let mut value = self.not()?;
        while self.next_if(&Token::And) {
            value &= self.not()?;
        }
        Some(value)
    }

    fn not(&mut self) -> Option<bool> {
        if self.next_if(&Token::Not) {
            return self.not().map(|v| !v);
        }
        if self.next_if(&Token::Open) {
            let value = self.or()?;
            return self.next_if(&Token::Close).then_some(value);
        }
        match self.tokens.get(self.pos)? {
            Token::Tag(tag) => {
                self.pos += 1;
                Some(self.ctx.matches_tag(tag))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse_imports;

    fn linux() -> BuildContext {
        BuildContext::new("linux", "amd64")
    }

    #[test]
    fn test_file_name_suffixes() {
        let ctx = linux();
        assert!(ctx.matches_file_name("b.go"));
        assert!(ctx.matches_file_name("b_linux.go"));
        assert!(ctx.matches_file_name("b_linux_amd64_test.go"));
        assert!(ctx.matches_file_name("b_amd64.go"));
        assert!(ctx.matches_file_name("windows.go"));
        assert!(ctx.matches_file_name("b_unix.go"));
        assert!(!ctx.matches_file_name("b_plan9.go"));
        assert!(!ctx.matches_file_name("b_windows_test.go"));
        assert!(!ctx.matches_file_name("b_linux_arm64.go"));
        assert!(!ctx.matches_file_name("b_arm.go"));
    }

    #[test]
    fn test_go_build_expressions() {
        let ctx = linux();
        assert_eq!(ctx.eval_expr("linux && amd64"), Some(true));
        assert_eq!(ctx.eval_expr("!windows"), Some(true));
        assert_eq!(ctx.eval_expr("(darwin || linux) && !cgo"), Some(false));
        assert_eq!(ctx.eval_expr("unix && go1.18"), Some(true));
        assert_eq!(ctx.eval_expr("ignore"), Some(false));
        assert_eq!(ctx.eval_expr("linux &&"), None);
        assert_eq!(ctx.eval_expr("(linux"), None);
    }

    #[test]
    fn test_header_constraints() {
        let ctx = linux();
        let ignored = parse_imports("// +build ignore\n\npackage main\n").unwrap();
        assert!(!ctx.matches_header(&ignored));

        let or_and = parse_imports("// +build windows linux,amd64\n\npackage a\n").unwrap();
        assert!(ctx.matches_header(&or_and));

        let two_lines = parse_imports("// +build linux\n// +build !amd64\n\npackage a\n").unwrap();
        assert!(!ctx.matches_header(&two_lines));

        // go:build wins over the legacy lines
        let both = parse_imports("//go:build linux\n// +build ignore\n\npackage a\n").unwrap();
        assert!(ctx.matches_header(&both));

        let plain = parse_imports("package a\n").unwrap();
        assert!(ctx.matches_header(&plain));
    }

    #[test]
    fn test_android_satisfies_linux() {
        let ctx = BuildContext::new("android", "arm64");
        assert!(ctx.matches_tag("linux"));
        assert!(ctx.matches_tag("unix"));
        assert!(ctx.matches_file_name("b_linux.go"));
    }
}
