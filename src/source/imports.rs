//! Import declaration scanner for Go source files
//!
//! Reads the package clause and the import declarations that follow it, and
//! records the byte span of every import path literal so callers can splice
//! replacements in without disturbing any other byte of the file.

use std::ops::Range;
use thiserror::Error;

/// Import identifier of the C-interop pseudo-package
pub const CGO_PSEUDO_IMPORT: &str = "C";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub offset: usize,
    pub line: usize,
    pub message: String,
}

impl ParseError {
    fn at(src: &str, offset: usize, message: impl Into<String>) -> Self {
        let offset = offset.min(src.len());
        Self {
            offset,
            line: src.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count() + 1,
            message: message.into(),
        }
    }
}

/// One import spec: `[name] "path"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Local name (`_`, `.` or an identifier), if given
    pub name: Option<String>,
    /// The unquoted import identifier
    pub path: String,
    /// Byte range of the literal, quotes included
    pub literal: Range<usize>,
}

/// Everything up to the end of the import declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHeader {
    pub package: String,
    pub imports: Vec<ImportSpec>,
    /// Expression of a `//go:build` line preceding the package clause
    pub build_constraint: Option<String>,
    /// Bodies of legacy `// +build` lines preceding the package clause
    pub plus_build: Vec<String>,
}

impl SourceHeader {
    pub fn import_paths(&self) -> impl Iterator<Item = &str> {
        self.imports.iter().map(|spec| spec.path.as_str())
    }
}

pub fn parse_imports(src: &str) -> Result<SourceHeader, ParseError> {
    let mut scanner = Scanner::new(src);

    scanner.skip_trivia()?;
    let build_constraint = scanner.build_constraint.take();
    let plus_build = std::mem::take(&mut scanner.plus_build);
    if scanner.ident() != Some("package") {
        return Err(scanner.error("expected 'package' clause"));
    }
    scanner.skip_trivia()?;
    let package = scanner
        .ident()
        .ok_or_else(|| scanner.error("expected package name"))?
        .to_string();

    let mut imports = Vec::new();
    loop {
        scanner.skip_trivia_and_semicolons()?;
        let start = scanner.pos;
        if scanner.ident() != Some("import") {
            scanner.pos = start;
            break;
        }
        scanner.skip_trivia()?;
        if scanner.eat(b'(') {
            loop {
                scanner.skip_trivia_and_semicolons()?;
                if scanner.eat(b')') {
                    break;
                }
                if scanner.at_end() {
                    return Err(scanner.error("unterminated import group"));
                }
                imports.push(scanner.import_spec()?);
            }
        } else {
            imports.push(scanner.import_spec()?);
        }
    }

    Ok(SourceHeader {
        package,
        imports,
        build_constraint,
        plus_build,
    })
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    build_constraint: Option<String>,
    plus_build: Vec<String>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            build_constraint: None,
            plus_build: Vec::new(),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::at(self.src, self.pos, message)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n', '\u{feff}']);
            self.pos += rest.len() - trimmed.len();

            if let Some(body) = trimmed.strip_prefix("//") {
                let len = body.find('\n').unwrap_or(body.len());
                let line = &body[..len];
                if let Some(expr) = line.strip_prefix("go:build ") {
                    self.build_constraint = Some(expr.trim().to_string());
                } else if let Some(rest) = line.trim_start().strip_prefix("+build") {
                    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                        self.plus_build.push(rest.trim().to_string());
                    }
                }
                self.pos += 2 + len;
            } else if let Some(body) = trimmed.strip_prefix("/*") {
                match body.find("*/") {
                    Some(end) => self.pos += 2 + end + 2,
                    None => return Err(self.error("comment not terminated")),
                }
            } else {
                return Ok(());
            }
        }
    }

    fn skip_trivia_and_semicolons(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_trivia()?;
            if !self.eat(b';') {
                return Ok(());
            }
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if c == '_' || c.is_alphabetic() => {}
            _ => return None,
        }
        let end = chars
            .find(|&(_, c)| !(c == '_' || c.is_alphanumeric()))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        Some(&rest[..end])
    }

    fn import_spec(&mut self) -> Result<ImportSpec, ParseError> {
        let name = if self.eat(b'.') {
            Some(".".to_string())
        } else {
            self.ident().map(str::to_string)
        };
        if name.is_some() {
            self.skip_trivia()?;
        }
        let (path, literal) = self.string_literal()?;
        Ok(ImportSpec {
            name,
            path,
            literal,
        })
    }

    fn string_literal(&mut self) -> Result<(String, Range<usize>), ParseError> {
        let start = self.pos;
        match self.peek() {
            Some(b'`') => {
                let body = &self.src[start + 1..];
                let end = body
                    .find('`')
                    .ok_or_else(|| self.error("raw string literal not terminated"))?;
                self.pos = start + 1 + end + 1;
                Ok((body[..end].replace('\r', ""), start..self.pos))
            }
            Some(b'"') => {
                let bytes = self.src.as_bytes();
                let mut i = start + 1;
                loop {
                    match bytes.get(i) {
                        None | Some(b'\n') => {
                            return Err(self.error("string literal not terminated"));
                        }
                        Some(b'\\') => i += 2,
                        Some(b'"') => break,
                        Some(_) => i += 1,
                    }
                }
                self.pos = i + 1;
                let path = unquote(&self.src[start + 1..i])
                    .map_err(|message| ParseError::at(self.src, start, message))?;
                Ok((path, start..self.pos))
            }
            _ => Err(self.error("expected import path")),
        }
    }
}

fn unquote(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next().ok_or("invalid escape at end of literal")?;
        match escaped {
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            'x' | 'u' | 'U' => {
                let width = match escaped {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.by_ref().take(width).collect();
                let code = u32::from_str_radix(&digits, 16)
                    .ok()
                    .filter(|_| digits.len() == width)
                    .ok_or_else(|| format!("invalid \\{escaped} escape"))?;
                out.push(char::from_u32(code).ok_or("escape is not a valid code point")?);
            }
            '0'..='7' => {
                let digits: String = std::iter::once(escaped).chain(chars.by_ref().take(2)).collect();
                let code = u32::from_str_radix(&digits, 8)
                    .ok()
                    .filter(|_| digits.len() == 3)
                    .ok_or("invalid octal escape")?;
                out.push(char::from_u32(code).ok_or("escape is not a valid code point")?);
            }
            other => return Err(format!("unknown escape sequence \\{other}")),
        }
    }
    Ok(out)
}

/// Quote an import identifier as an interpreted string literal
pub fn quote(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    out.push('"');
    for c in path.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUPED: &str = r#"// Package b does things.
package b

import (
	"fmt" // formatting
	str "strings"
	_ "example.com/side"
	. "example.com/dot"

	/* block */ "example.com/c"
)

import "example.com/d"

func B() { fmt.Println(str.ToUpper("import \"nope\"")) }
"#;

    #[test]
    fn test_grouped_and_single_imports() {
        let header = parse_imports(GROUPED).unwrap();
        assert_eq!(header.package, "b");
        let paths: Vec<&str> = header.import_paths().collect();
        assert_eq!(
            paths,
            vec![
                "fmt",
                "strings",
                "example.com/side",
                "example.com/dot",
                "example.com/c",
                "example.com/d"
            ]
        );
        assert_eq!(header.imports[1].name.as_deref(), Some("str"));
        assert_eq!(header.imports[2].name.as_deref(), Some("_"));
        assert_eq!(header.imports[3].name.as_deref(), Some("."));
        assert_eq!(header.imports[0].name, None);
    }

    #[test]
    fn test_literal_spans_cover_quotes() {
        let header = parse_imports(GROUPED).unwrap();
        for spec in &header.imports {
            assert_eq!(&GROUPED[spec.literal.clone()], quote(&spec.path));
        }
    }

    #[test]
    fn test_stops_at_first_declaration() {
        let src = "package a\n\nvar x = 1\n\nimport \"late\"\n";
        let header = parse_imports(src).unwrap();
        assert!(header.imports.is_empty());
    }

    #[test]
    fn test_semicolon_separated_imports() {
        let header = parse_imports("package a; import \"x\"; import (\"y\"; \"z\")").unwrap();
        let paths: Vec<&str> = header.import_paths().collect();
        assert_eq!(paths, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_raw_and_escaped_literals() {
        let header = parse_imports("package a\nimport (\n`raw/path`\n\"esc\\x2fpath\"\n)\n").unwrap();
        let paths: Vec<&str> = header.import_paths().collect();
        assert_eq!(paths, vec!["raw/path", "esc/path"]);
    }

    #[test]
    fn test_build_constraint_before_package() {
        let header = parse_imports("//go:build ignore\n\n// comment\npackage main\n").unwrap();
        assert_eq!(header.build_constraint.as_deref(), Some("ignore"));
        assert_eq!(header.package, "main");
    }

    #[test]
    fn test_legacy_build_lines_before_package() {
        let src = "// +build linux,amd64 darwin\n// +build !cgo\n\n// +buildx not a constraint\npackage a\n";
        let header = parse_imports(src).unwrap();
        assert_eq!(header.build_constraint, None);
        assert_eq!(header.plus_build, vec!["linux,amd64 darwin", "!cgo"]);

        let late = parse_imports("package a\n\n// +build ignore\n").unwrap();
        assert!(late.plus_build.is_empty());
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = parse_imports("package a\n\nimport (\n\t\"unterminated\n)").unwrap_err();
        assert_eq!(err.line, 4);

        let err = parse_imports("// nothing here\n").unwrap_err();
        assert!(err.message.contains("package"));

        let err = parse_imports("package a\nimport (\n\"x\"\n").unwrap_err();
        assert!(err.message.contains("unterminated"));

        let err = parse_imports("package a\n/* open").unwrap_err();
        assert!(err.message.contains("comment"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("example.com/b"), "\"example.com/b\"");
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    }
}
