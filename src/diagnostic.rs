//! Diagnostics collected while parsing.
//!
//! Syntax, lexical and semantic problems are not returned as errors from a
//! parse; they are gathered into an ordered, de-duplicated
//! [`DiagnosticSet`] that callers inspect afterwards.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use crate::ops;
use crate::source::SourceInfo;
use crate::token::Token;

/// Message attached to input left over after a complete parse.
pub const SPURIOUS_INPUT: &str = "unrecognized spurious input";

/// Expected-token sets of this size or larger are summarised by naming the
/// grammar rule instead of listing every alternative.
const LIST_LIMIT: usize = 5;

/// A single problem found in the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub message: String,
    pub source: SourceInfo,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, source: SourceInfo) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source
            .cmp(&other.source)
            .then_with(|| self.message.cmp(&other.message))
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

/// Diagnostics ordered by position; the same message at the same position
/// is kept once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticSet {
    items: BTreeSet<Diagnostic>,
}

impl DiagnosticSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a diagnostic; returns false if it was already present.
    pub fn insert(&mut self, diagnostic: Diagnostic) -> bool {
        self.items.insert(diagnostic)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&Diagnostic> {
        self.items.first()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Extend<Diagnostic> for DiagnosticSet {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<'a> IntoIterator for &'a DiagnosticSet {
    type Item = &'a Diagnostic;
    type IntoIter = std::collections::btree_set::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Grammar rule being read when a mismatch happened, named in plain
/// language for messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Program,
    Queries,
    Term,
    Terms,
    Variable,
    Arguments,
    List,
    Curly,
    Parenthesized,
    Operand,
}

impl Rule {
    pub fn describe(self) -> &'static str {
        match self {
            Rule::Program => "a list of prolog clauses",
            Rule::Queries => "a list of prolog queries",
            Rule::Term => "a prolog term",
            Rule::Terms => "a comma separated list of prolog terms",
            Rule::Variable => "a prolog variable",
            Rule::Arguments => "the arguments of a compound term",
            Rule::List => "a prolog list",
            Rule::Curly => "a term between curly brackets",
            Rule::Parenthesized => "a term between parentheses",
            Rule::Operand => "the operand of an operator",
        }
    }
}

/// What would have been accepted at the point of a mismatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Expected {
    /// Concrete alternatives, e.g. `"')'"`.
    pub alternatives: Vec<&'static str>,
    /// Whether any operator could also have continued the term.
    pub operator: bool,
    pub rule: Rule,
}

impl Expected {
    pub fn new(rule: Rule) -> Self {
        Self {
            alternatives: Vec::new(),
            operator: false,
            rule,
        }
    }

    pub fn token(mut self, alternative: &'static str) -> Self {
        self.alternatives.push(alternative);
        self
    }

    pub fn or_operator(mut self) -> Self {
        self.operator = true;
        self
    }

    /// A term may start here: every atomic token and opening bracket.
    pub fn term_start(rule: Rule) -> Self {
        let mut expected = Self::new(rule);
        expected.alternatives = vec![
            "an atom",
            "a variable",
            "a number",
            "a string",
            "'('",
            "'['",
            "'{'",
        ];
        expected
    }

    /// Number of distinct tokens in this set; every operator counts as one.
    pub fn count(&self) -> usize {
        let operators = if self.operator { ops::operator_count() } else { 0 };
        self.alternatives.len() + operators
    }

    fn describe(&self) -> String {
        if self.count() >= LIST_LIMIT || self.alternatives.is_empty() {
            return self.rule.describe().to_string();
        }
        match self.alternatives.as_slice() {
            [only] => only.to_string(),
            [init @ .., last] => format!("either {} or {}", init.join(", "), last),
            [] => self.rule.describe().to_string(),
        }
    }
}

/// Message for an unexpected token: names the token that was found and
/// either the alternatives or, for large sets, the enclosing rule.
pub fn syntax_message(found: &Token, expected: &Expected) -> String {
    format!("found {} but expected {}", found, expected.describe())
}
