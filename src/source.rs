//! Positional information attached to parsed terms and diagnostics.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::token::Span;

/// Where a parsed node came from.
///
/// A parser can be pointed at a fragment of a larger file; `line`,
/// `column`, `start` and `stop` are then relative to that file, not to the
/// fragment. Ordering is by file, then line, then column, with the offsets
/// only breaking remaining ties.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceInfo {
    pub file: Option<Arc<str>>,
    pub line: usize,
    pub column: usize,
    pub start: usize,
    pub stop: usize,
}

impl SourceInfo {
    /// Origin of a standalone text: line 1, column 1, offset 0.
    pub fn new() -> Self {
        Self {
            file: None,
            line: 1,
            column: 1,
            start: 0,
            stop: 0,
        }
    }

    /// Origin of a fragment that starts at `line:column`, `offset`
    /// characters into `file`.
    pub fn at(file: Option<&str>, line: usize, column: usize, offset: usize) -> Self {
        Self {
            file: file.map(Arc::from),
            line,
            column,
            start: offset,
            stop: offset,
        }
    }

    pub fn with_file(mut self, file: &str) -> Self {
        self.file = Some(Arc::from(file));
        self
    }

    pub(crate) fn from_span(file: &Option<Arc<str>>, span: Span) -> Self {
        Self {
            file: file.clone(),
            line: span.line,
            column: span.column,
            start: span.start,
            stop: span.stop,
        }
    }

    /// Extends this position so it ends where `other` ends.
    pub(crate) fn through(mut self, other: Span) -> Self {
        self.stop = self.stop.max(other.stop);
        self
    }

    pub fn line_number(&self) -> usize {
        self.line
    }

    pub fn character_position(&self) -> usize {
        self.column
    }
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Ord for SourceInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file
            .cmp(&other.file)
            .then(self.line.cmp(&other.line))
            .then(self.column.cmp(&other.column))
            .then(self.start.cmp(&other.start))
            .then(self.stop.cmp(&other.stop))
    }
}

impl PartialOrd for SourceInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

/// A parsed value together with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    pub value: T,
    pub source: SourceInfo,
}

impl<T> Located<T> {
    pub fn new(value: T, source: SourceInfo) -> Self {
        Self { value, source }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Located<U> {
        Located {
            value: f(self.value),
            source: self.source,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}
