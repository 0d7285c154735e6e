//! Token definitions for the Prolog lexer.
//!
//! Tokens are kept deliberately coarse: operators are plain names and are
//! only given meaning by the parser through the operator table.

use std::fmt;

/// Source location of a token, already re-based onto the enclosing file.
///
/// `line` and `column` are 1-based; `start` and `stop` are character
/// offsets (inclusive start, exclusive stop).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub start: usize,
    pub stop: usize,
}

impl Span {
    pub fn new(line: usize, column: usize, start: usize, stop: usize) -> Self {
        Self {
            line,
            column,
            start,
            stop,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Token types for Prolog.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Unquoted name: `foo`, `=..`, `!`, `;`
    Name(String),
    /// Quoted name: `'hello world'`
    QuotedName(String),
    /// Variable: uppercase identifier or underscore-prefixed
    Variable(String),
    /// Integer literal
    Integer(i64),
    /// Float literal
    Float(f64),
    /// Double-quoted string
    Str(String),
    /// Back-quoted string
    BackQuoted(String),

    /// (
    LParen,
    /// )
    RParen,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// {
    LBrace,
    /// }
    RBrace,
    /// ,
    Comma,
    /// |
    Bar,
    /// . followed by layout or end of input
    End,

    /// End of input
    Eof,
}

impl Token {
    /// Returns true if this token can start a term.
    pub fn can_start_term(&self) -> bool {
        matches!(
            self,
            Token::Name(_)
                | Token::QuotedName(_)
                | Token::Variable(_)
                | Token::Integer(_)
                | Token::Float(_)
                | Token::Str(_)
                | Token::BackQuoted(_)
                | Token::LParen
                | Token::LBracket
                | Token::LBrace
        )
    }

    /// Returns true if this token closes the term currently being read.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Token::RParen
                | Token::RBracket
                | Token::RBrace
                | Token::Comma
                | Token::Bar
                | Token::End
                | Token::Eof
        )
    }
}

/// Human-readable rendering used in diagnostics: `atom 'kata'`,
/// `number '1'`, `variable 'X'`.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) | Token::QuotedName(name) => write!(f, "atom '{name}'"),
            Token::Variable(name) => write!(f, "variable '{name}'"),
            Token::Integer(n) => write!(f, "number '{n}'"),
            Token::Float(x) => write!(f, "number '{x:?}'"),
            Token::Str(s) => write!(f, "string \"{s}\""),
            Token::BackQuoted(s) => write!(f, "string `{s}`"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::Comma => f.write_str("','"),
            Token::Bar => f.write_str("'|'"),
            Token::End => f.write_str("end of clause '.'"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// A token together with where it was read and whether layout
/// (whitespace or a comment) preceded it.
///
/// The layout flag separates functional notation `f(a)` from an operator
/// applied to a parenthesised term `- (a)`, and a negative literal `-1`
/// from `- 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub span: Span,
    pub layout_before: bool,
}
