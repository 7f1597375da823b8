//! Transitive import discovery for Zig sources.
//!
//! Given a root source file, the scanner produces the set of distinct
//! external package names reachable from it: the file is lexed, every
//! `@import("...")` argument is classified, local `.zig` references are
//! followed recursively, and package names are collected once each.
//!
//! # Classification
//!
//! - an argument ending in `.zig` is a local file, resolved relative to the
//!   importing file's directory and scanned recursively
//! - `std`, `builtin`, and `root` belong to the compiler and are ignored
//! - anything else is an external package name
//!
//! # Termination
//!
//! The caller supplies a run-scoped visited set holding canonicalized file
//! paths and already-counted names. An argument already present is skipped
//! without being recounted, which bounds recursion on cyclic local imports.
//!
//! # Lexing
//!
//! Matching `@import` on raw text would miscount directives mentioned inside
//! comments or string literals, so the scanner carries a minimal lexical
//! pass: `//` line comments, `"..."` literals, `'...'` literals, and `\\`
//! multiline string lines are skipped before directives are recognized. Zig
//! has no block comments, which keeps the pass small. A malformed directive
//! (missing delimiter, unterminated or invalid string literal) is a fatal
//! parse error for the whole resolution; an oversized file is skipped with a
//! warning and contributes zero imports.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

use crate::constants::{MAX_SCAN_FILE_SIZE, RESERVED_IMPORTS, ZIG_SOURCE_SUFFIX};
use crate::core::ZigdepsError;

/// Scan `root` and its transitive local imports, returning the distinct
/// external package names in first-seen order.
///
/// `visited` is shared across the recursion (and cleared by the caller
/// between independent resolutions); it receives both canonicalized file
/// paths and counted package names.
pub fn scan_imports(root: &Path, visited: &mut HashSet<String>) -> Result<Vec<String>> {
    let mut found = Vec::new();

    let canonical = root
        .canonicalize()
        .with_context(|| format!("cannot resolve scan root {}", root.display()))?;
    if visited.insert(canonical.display().to_string()) {
        scan_file(&canonical, visited, &mut found)?;
    }

    Ok(found)
}

/// Scan one already-visited file, appending newly discovered names.
fn scan_file(file: &Path, visited: &mut HashSet<String>, found: &mut Vec<String>) -> Result<()> {
    let metadata = std::fs::metadata(file)
        .with_context(|| format!("cannot stat source file {}", file.display()))?;
    if metadata.len() > MAX_SCAN_FILE_SIZE {
        tracing::warn!(
            file = %file.display(),
            size = metadata.len(),
            limit = MAX_SCAN_FILE_SIZE,
            "source file exceeds scan size ceiling; skipping its imports"
        );
        return Ok(());
    }

    tracing::trace!(file = %file.display(), "scanning imports");

    let bytes = std::fs::read(file)
        .with_context(|| format!("cannot read source file {}", file.display()))?;
    let content = String::from_utf8_lossy(&bytes);

    for arg in extract_import_args(&content, file)? {
        if arg.ends_with(ZIG_SOURCE_SUFFIX) {
            let target = file.parent().unwrap_or(Path::new(".")).join(&arg);
            let canonical = target.canonicalize().with_context(|| {
                format!("cannot resolve import \"{arg}\" from {}", file.display())
            })?;
            if visited.insert(canonical.display().to_string()) {
                scan_file(&canonical, visited, found)?;
            }
        } else if RESERVED_IMPORTS.contains(&arg.as_str()) {
            // Compiler-provided module, not a dependency.
        } else if visited.insert(arg.clone()) {
            found.push(arg);
        }
    }

    Ok(())
}

/// Lex `content` and return every `@import` argument, unescaped.
fn extract_import_args(content: &str, file: &Path) -> Result<Vec<String>> {
    let bytes = content.as_bytes();
    let mut args = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = skip_line(bytes, i);
            }
            b'\\' if bytes.get(i + 1) == Some(&b'\\') => {
                // Multiline string literal: the rest of the line is content.
                i = skip_line(bytes, i);
            }
            b'"' => {
                i = skip_string(bytes, i + 1);
            }
            b'\'' => {
                i = skip_char_literal(bytes, i + 1);
            }
            b'@' => {
                let id_start = i + 1;
                let id_end = scan_identifier(bytes, id_start);
                if &content[id_start..id_end] == "import" {
                    let (arg, next) = parse_directive(content, id_end, file)?;
                    args.push(arg);
                    i = next;
                } else {
                    i = id_end.max(i + 1);
                }
            }
            _ => i += 1,
        }
    }

    Ok(args)
}

/// Parse `("<literal>")` following the `@import` identifier; returns the
/// unescaped argument and the index just past the closing parenthesis.
fn parse_directive(content: &str, after_ident: usize, file: &Path) -> Result<(String, usize)> {
    let bytes = content.as_bytes();
    let parse_error = |reason: &str| ZigdepsError::ImportParse {
        file: file.display().to_string(),
        reason: reason.to_string(),
    };

    let mut i = skip_whitespace(bytes, after_ident);
    if bytes.get(i) != Some(&b'(') {
        return Err(parse_error("missing '(' after @import").into());
    }
    i = skip_whitespace(bytes, i + 1);
    if bytes.get(i) != Some(&b'"') {
        return Err(parse_error("import argument must be a string literal").into());
    }

    let (arg, after_literal) = parse_string_literal(bytes, i + 1).map_err(|reason| {
        ZigdepsError::ImportParse {
            file: file.display().to_string(),
            reason,
        }
    })?;

    i = skip_whitespace(bytes, after_literal);
    if bytes.get(i) != Some(&b')') {
        return Err(parse_error("missing ')' after import argument").into());
    }

    Ok((arg, i + 1))
}

/// Parse a string literal body starting just after the opening quote;
/// returns the unescaped value and the index just past the closing quote.
fn parse_string_literal(bytes: &[u8], start: usize) -> Result<(String, usize), String> {
    let mut value = Vec::new();
    let mut i = start;

    loop {
        match bytes.get(i).copied() {
            None | Some(b'\n') => return Err("unterminated string literal".to_string()),
            Some(b'"') => break,
            Some(b'\\') => {
                i += 1;
                match bytes.get(i).copied() {
                    Some(b'n') => value.push(b'\n'),
                    Some(b'r') => value.push(b'\r'),
                    Some(b't') => value.push(b'\t'),
                    Some(b'\\') => value.push(b'\\'),
                    Some(b'"') => value.push(b'"'),
                    Some(b'\'') => value.push(b'\''),
                    Some(b'x') => {
                        let hex = bytes
                            .get(i + 1..i + 3)
                            .and_then(|h| std::str::from_utf8(h).ok())
                            .and_then(|h| u8::from_str_radix(h, 16).ok())
                            .ok_or_else(|| "invalid \\x escape".to_string())?;
                        value.push(hex);
                        i += 2;
                    }
                    Some(b'u') => {
                        if bytes.get(i + 1) != Some(&b'{') {
                            return Err("invalid \\u escape: expected '{'".to_string());
                        }
                        let close = bytes[i + 2..]
                            .iter()
                            .position(|&b| b == b'}')
                            .ok_or_else(|| "invalid \\u escape: missing '}'".to_string())?;
                        let digits = std::str::from_utf8(&bytes[i + 2..i + 2 + close])
                            .map_err(|_| "invalid \\u escape".to_string())?;
                        let scalar = u32::from_str_radix(digits, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| format!("invalid \\u escape '{digits}'"))?;
                        let mut buf = [0u8; 4];
                        value.extend_from_slice(scalar.encode_utf8(&mut buf).as_bytes());
                        i += 2 + close;
                    }
                    Some(other) => {
                        return Err(format!("invalid escape sequence '\\{}'", other as char));
                    }
                    None => return Err("unterminated string literal".to_string()),
                }
                i += 1;
            }
            Some(b) => {
                value.push(b);
                i += 1;
            }
        }
    }

    Ok((String::from_utf8_lossy(&value).into_owned(), i + 1))
}

fn scan_identifier(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    i
}

fn skip_whitespace(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn skip_line(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

/// Skip a general (non-import) string literal. Lenient: an unterminated
/// literal here is not a directive, so it ends the line instead of failing.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i] != b'"' && bytes[i] != b'\n' {
        if bytes[i] == b'\\' {
            i += 1;
        }
        i += 1;
    }
    i.min(bytes.len() - 1) + 1
}

fn skip_char_literal(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i] != b'\'' && bytes[i] != b'\n' {
        if bytes[i] == b'\\' {
            i += 1;
        }
        i += 1;
    }
    i.min(bytes.len() - 1) + 1
}
