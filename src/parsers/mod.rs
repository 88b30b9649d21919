//! Dialect-resilient Python source parsing
//!
//! The primary grammar is rustpython's Python 3 parser, which produces a full
//! AST and a genuine syntax error on rejection. When it rejects the input we
//! scan for legacy (Python 2) dialect indicators; with enough evidence the
//! source is confirmed against tree-sitter's more permissive grammar,
//! rewritten with deterministic textual conversions, and reparsed. When every
//! tier fails the *original* syntax error is reported — later, heuristic
//! conversions never mask the root cause.
//!
//! Control flow is an explicit cascade returning a result type, not
//! exception-driven branching:
//!
//! ```text
//! TryPrimary -> DetectDialect -> TryStructural -> TryTextual -> Fail
//! ```

pub mod dialect;

use rustpython_parser::ast::{Ranged, Suite};
use rustpython_parser::{Parse, ParseError};
use thiserror::Error;
use tracing::debug;

/// Minimum number of distinct legacy indicators required to classify a file
/// as legacy dialect rather than plain broken Python 3.
const LEGACY_INDICATOR_THRESHOLD: usize = 2;

/// A source file held in memory, with line-level access to the original text.
pub struct SourceFile {
    path: String,
    text: String,
    lines: Vec<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = text.lines().map(str::to_string).collect();
        Self {
            path: path.into(),
            text,
            lines,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source text of a 1-indexed line.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        self.lines
            .get(line.saturating_sub(1) as usize)
            .map(String::as_str)
    }
}

/// Byte offset to 1-indexed line mapping for one text buffer.
#[derive(Debug)]
struct LineIndex {
    /// Byte offset at which each line starts; always begins with 0.
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self { line_starts }
    }

    fn line_at(&self, offset: usize) -> u32 {
        self.line_starts.partition_point(|&start| start <= offset) as u32
    }
}

/// Which grammar tier finally accepted the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Parsed directly by the current-dialect grammar.
    Current,
    /// Classified as legacy, textually converted, then reparsed.
    LegacyConverted,
}

/// A successfully parsed module plus the offset-to-line mapping for the text
/// that was actually parsed.
///
/// The textual conversions are all line-scoped rewrites, so line numbers in a
/// converted parse still index into the original source.
#[derive(Debug)]
pub struct ParsedModule {
    pub suite: Suite,
    pub dialect: Dialect,
    index: LineIndex,
}

impl ParsedModule {
    /// 1-indexed starting line of an AST node.
    pub fn line_of(&self, node: &impl Ranged) -> u32 {
        self.index.line_at(usize::from(node.start())).max(1)
    }
}

/// A parse that failed on every tier, carrying the original tier-1 error.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParseFailure {
    pub message: String,
    pub line: u32,
}

/// Parse Python source, cascading through fallback tiers on rejection.
///
/// Never silently drops the input: the result is either a tree or a reported
/// syntax error.
pub fn parse_resilient(source: &SourceFile) -> Result<ParsedModule, ParseFailure> {
    // Tier 1: current-dialect grammar.
    let original_error = match Suite::parse(source.text(), source.path()) {
        Ok(suite) => return Ok(parsed(suite, Dialect::Current, source.text())),
        Err(err) => err,
    };

    // Tier 2: dialect detection. Too few indicators means this is most likely
    // an unrelated syntax error, which must surface unchanged.
    let indicators = dialect::count_legacy_indicators(source.text());
    if indicators < LEGACY_INDICATOR_THRESHOLD {
        return Err(failure(&original_error, source));
    }
    debug!(
        path = source.path(),
        indicators, "classified source as legacy dialect"
    );

    // Tier 3: confirm with the structural legacy-tolerant grammar. A failed
    // confirmation only skips the confirmation; the textual tier still runs.
    if dialect::structurally_valid_legacy(source.text()) {
        debug!(path = source.path(), "legacy dialect confirmed structurally");
    } else {
        debug!(
            path = source.path(),
            "structural confirmation unavailable, converting anyway"
        );
    }

    // Tier 4: textual conversion of the original text, then reparse.
    let converted = dialect::convert_legacy_source(source.text());
    match Suite::parse(&converted, source.path()) {
        Ok(suite) => {
            debug!(path = source.path(), "legacy source parsed after conversion");
            Ok(parsed(suite, Dialect::LegacyConverted, &converted))
        }
        // Tier 5: report the original failure, not the rewritten-text one.
        Err(_) => Err(failure(&original_error, source)),
    }
}

fn parsed(suite: Suite, dialect: Dialect, text: &str) -> ParsedModule {
    ParsedModule {
        suite,
        dialect,
        index: LineIndex::new(text),
    }
}

fn failure(err: &ParseError, source: &SourceFile) -> ParseFailure {
    let line = LineIndex::new(source.text())
        .line_at(usize::from(err.offset))
        .max(1);
    ParseFailure {
        message: err.to_string(),
        line,
    }
}
