//! Lexer for Prolog source code.
//!
//! Tokenizes Prolog text into [`Lexeme`]s, handling names, variables,
//! numbers, quoted text, punctuation and comments. Positions can be re-based
//! so that a fragment of a larger file reports file-relative locations.
//!
//! Lexical errors never abort tokenization: the offending characters are
//! skipped, the error is recorded and lexing continues.

use thiserror::Error;

use crate::token::{Lexeme, Span, Token};

/// Lexer error with location information.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("lexical error at {span}: {message}")]
pub struct LexicalError {
    pub message: String,
    pub span: Span,
}

impl LexicalError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

const SYMBOL_CHARS: &str = "+-*/\\^<>=~:.?@#&$";

/// Returns true for characters that make up symbolic names such as `=..`.
pub fn is_symbol_char(c: char) -> bool {
    SYMBOL_CHARS.contains(c)
}

/// Returns true for characters allowed after the first one of an identifier.
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Does `name` read as an unquoted identifier: a lowercase letter followed
/// by letters, digits and underscores?
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(first) if first.is_lowercase()) && chars.all(is_ident_char)
}

/// Lexer for Prolog source code.
pub struct Lexer<'a> {
    input: &'a str,
    current_pos: usize,
    line: usize,
    column: usize,
    offset: usize,
    errors: Vec<LexicalError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self::with_origin(input, 1, 1, 0)
    }

    /// Create a lexer whose first character sits at `line:column`, `offset`
    /// characters into an enclosing file.
    pub fn with_origin(input: &'a str, line: usize, column: usize, offset: usize) -> Self {
        Self {
            input,
            current_pos: 0,
            line,
            column,
            offset,
            errors: Vec::new(),
        }
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[LexicalError] {
        &self.errors
    }

    fn here(&self) -> Span {
        Span::new(self.line, self.column, self.offset, self.offset)
    }

    fn span_from(&self, start: Span) -> Span {
        Span::new(start.line, start.column, start.start, self.offset)
    }

    fn peek(&self) -> Option<char> {
        self.peek_nth(0)
    }

    fn peek_next(&self) -> Option<char> {
        self.peek_nth(1)
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.current_pos..].chars().nth(n)
    }

    /// Consume and return the next character.
    fn advance(&mut self) -> Option<char> {
        let c = self.input[self.current_pos..].chars().next()?;
        self.current_pos += c.len_utf8();
        self.offset += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Skip whitespace and comments. Returns whether anything was skipped.
    fn skip_layout(&mut self) -> bool {
        let mut skipped = false;
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('%') => {
                    while let Some(c) = self.advance() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.peek_next() == Some('*') => {
                    let start = self.here();
                    self.advance();
                    self.advance();
                    let mut depth = 1;
                    while depth > 0 {
                        match self.advance() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                depth -= 1;
                            }
                            Some('/') if self.peek() == Some('*') => {
                                self.advance();
                                depth += 1;
                            }
                            Some(_) => {}
                            None => {
                                let span = self.span_from(start);
                                self.errors
                                    .push(LexicalError::new("unterminated block comment", span));
                                break;
                            }
                        }
                    }
                }
                _ => return skipped,
            }
            skipped = true;
        }
    }

    /// Read an identifier (name or variable).
    fn read_identifier(&mut self, first: char) -> String {
        let mut ident = String::new();
        ident.push(first);
        while let Some(c) = self.peek() {
            if is_ident_char(c) {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        ident
    }

    /// Read a run of symbol characters, stopping before a comment opener.
    fn read_symbol(&mut self, first: char) -> String {
        let mut name = String::new();
        name.push(first);
        while let Some(c) = self.peek() {
            if !is_symbol_char(c) || (c == '/' && self.peek_next() == Some('*')) {
                break;
            }
            name.push(c);
            self.advance();
        }
        name
    }

    /// Read the character after a backslash inside quoted text.
    ///
    /// `Ok(None)` is a line continuation.
    fn read_escape(&mut self) -> Result<Option<char>, String> {
        let c = self.advance().ok_or("unterminated escape sequence")?;
        let decoded = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            'e' => '\x1b',
            '0'..='7' => return self.read_numeric_escape(c, 8).map(Some),
            'x' => return self.read_numeric_escape('0', 16).map(Some),
            '\\' | '\'' | '"' | '`' => c,
            '\n' => return Ok(None),
            other => return Err(format!("undefined escape sequence '\\{other}'")),
        };
        Ok(Some(decoded))
    }

    /// `\123\` and `\x41\`: digits up to a closing backslash.
    fn read_numeric_escape(&mut self, first: char, radix: u32) -> Result<char, String> {
        let mut digits = String::new();
        digits.push(first);
        loop {
            match self.advance() {
                Some('\\') => break,
                Some(c) if c.is_digit(radix) => digits.push(c),
                _ => return Err("malformed numeric escape sequence".to_string()),
            }
        }
        u32::from_str_radix(&digits, radix)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| format!("invalid character code in escape '{digits}'"))
    }

    /// Read quoted text up to the closing `quote`. A doubled quote stands
    /// for the quote itself.
    fn read_quoted(&mut self, quote: char, start: Span) -> Result<String, LexicalError> {
        let mut text = String::new();
        let mut bad_escape = None;
        loop {
            match self.advance() {
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.advance();
                        text.push(quote);
                    } else {
                        break;
                    }
                }
                Some('\\') => match self.read_escape() {
                    Ok(Some(c)) => text.push(c),
                    Ok(None) => {}
                    Err(message) => {
                        bad_escape.get_or_insert(message);
                    }
                },
                Some(c) => text.push(c),
                None => {
                    return Err(LexicalError::new(
                        "unterminated quoted text",
                        self.span_from(start),
                    ))
                }
            }
        }
        match bad_escape {
            Some(message) => Err(LexicalError::new(message, self.span_from(start))),
            None => Ok(text),
        }
    }

    /// Read a number: decimal, `0'c`, `0x..`, `0o..`, `0b..` or a float.
    fn read_number(&mut self, first: char, start: Span) -> Result<Token, LexicalError> {
        if first == '0' {
            match (self.peek(), self.peek_next()) {
                (Some('\''), Some(_)) => {
                    self.advance();
                    return self.read_char_code(start);
                }
                (Some('x'), Some(c)) if c.is_ascii_hexdigit() => {
                    self.advance();
                    return self.read_radix(16, start);
                }
                (Some('o'), Some(c)) if c.is_digit(8) => {
                    self.advance();
                    return self.read_radix(8, start);
                }
                (Some('b'), Some(c)) if c.is_digit(2) => {
                    self.advance();
                    return self.read_radix(2, start);
                }
                _ => {}
            }
        }

        let mut num = String::new();
        num.push(first);
        self.take_digits(&mut num);

        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            num.push('.');
            self.take_digits(&mut num);
        }
        if is_float && matches!(self.peek(), Some('e' | 'E')) {
            let exponent_follows = match self.peek_next() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self.peek_nth(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if exponent_follows {
                num.push('e');
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    num.push(sign);
                    self.advance();
                }
                self.take_digits(&mut num);
            }
        }

        if is_float {
            num.parse()
                .map(Token::Float)
                .map_err(|_| LexicalError::new(format!("malformed float '{num}'"), self.span_from(start)))
        } else {
            num.parse().map(Token::Integer).map_err(|_| {
                LexicalError::new(
                    format!("integer '{num}' is out of range"),
                    self.span_from(start),
                )
            })
        }
    }

    fn take_digits(&mut self, num: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                num.push(c);
                self.advance();
            } else if c == '_' && self.peek_next().is_some_and(|d| d.is_ascii_digit()) {
                // digit group separator: 1_000_000
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_radix(&mut self, radix: u32, start: Span) -> Result<Token, LexicalError> {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_digit(radix) {
                digits.push(c);
                self.advance();
            } else {
                break;
            }
        }
        i64::from_str_radix(&digits, radix)
            .map(Token::Integer)
            .map_err(|_| LexicalError::new("integer is out of range", self.span_from(start)))
    }

    /// `0'c`: the character code of `c`.
    fn read_char_code(&mut self, start: Span) -> Result<Token, LexicalError> {
        match self.advance() {
            Some('\\') => match self.read_escape() {
                Ok(Some(c)) => Ok(Token::Integer(c as i64)),
                Ok(None) => Err(LexicalError::new(
                    "line continuation in character code",
                    self.span_from(start),
                )),
                Err(message) => Err(LexicalError::new(message, self.span_from(start))),
            },
            Some('\'') => {
                // 0''' and 0'' both denote the quote itself
                if self.peek() == Some('\'') {
                    self.advance();
                }
                Ok(Token::Integer('\'' as i64))
            }
            Some(c) => Ok(Token::Integer(c as i64)),
            None => Err(LexicalError::new(
                "missing character after 0'",
                self.span_from(start),
            )),
        }
    }

    /// Get the next lexeme.
    pub fn next_lexeme(&mut self) -> Result<Lexeme, LexicalError> {
        let layout_before = self.skip_layout();
        let start = self.here();

        let c = match self.advance() {
            Some(c) => c,
            None => {
                return Ok(Lexeme {
                    token: Token::Eof,
                    span: start,
                    layout_before,
                })
            }
        };

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,
            '|' => Token::Bar,
            '!' => Token::Name("!".to_string()),
            ';' => Token::Name(";".to_string()),

            '\'' => Token::QuotedName(self.read_quoted('\'', start)?),
            '"' => Token::Str(self.read_quoted('"', start)?),
            '`' => Token::BackQuoted(self.read_quoted('`', start)?),

            c if c.is_ascii_digit() => self.read_number(c, start)?,

            c if c == '_' || c.is_uppercase() => Token::Variable(self.read_identifier(c)),
            c if c.is_alphabetic() => Token::Name(self.read_identifier(c)),

            // A lone '.' before layout or end of input ends the clause
            '.' if self.peek().map_or(true, |n| n.is_whitespace() || n == '%') => Token::End,
            c if is_symbol_char(c) => Token::Name(self.read_symbol(c)),

            other => {
                return Err(LexicalError::new(
                    format!("unrecognized character '{other}'"),
                    self.span_from(start),
                ))
            }
        };

        Ok(Lexeme {
            token,
            span: self.span_from(start),
            layout_before,
        })
    }

    /// Tokenize the entire input. The returned vector always ends with an
    /// [`Token::Eof`] lexeme; lexical errors are returned alongside.
    pub fn tokenize(mut self) -> (Vec<Lexeme>, Vec<LexicalError>) {
        let mut lexemes = Vec::new();
        loop {
            match self.next_lexeme() {
                Ok(lexeme) => {
                    let done = lexeme.token == Token::Eof;
                    lexemes.push(lexeme);
                    if done {
                        break;
                    }
                }
                Err(error) => {
                    tracing::trace!(line = error.span.line, column = error.span.column, "skipping bad input");
                    self.errors.push(error);
                }
            }
        }
        (lexemes, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let (lexemes, errors) = Lexer::new(input).tokenize();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        lexemes.into_iter().map(|l| l.token).collect()
    }

    fn name(s: &str) -> Token {
        Token::Name(s.to_string())
    }

    fn var(s: &str) -> Token {
        Token::Variable(s.to_string())
    }

    #[test]
    fn test_simple_fact() {
        assert_eq!(
            tokens("parent(tom, bob)."),
            vec![
                name("parent"),
                Token::LParen,
                name("tom"),
                Token::Comma,
                name("bob"),
                Token::RParen,
                Token::End,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_rule_symbols() {
        let toks = tokens("grandparent(X, Z) :- parent(X, Y), parent(Y, Z).");
        assert!(toks.contains(&name(":-")));
        assert!(toks.contains(&var("X")));
        assert!(toks.contains(&var("Y")));
        assert!(toks.contains(&var("Z")));
    }

    #[test]
    fn test_symbolic_names() {
        assert_eq!(
            tokens("X =.. Y, A \\== B"),
            vec![
                var("X"),
                name("=.."),
                var("Y"),
                Token::Comma,
                var("A"),
                name("\\=="),
                var("B"),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_end_token_needs_layout() {
        assert_eq!(tokens("a.b"), vec![name("a"), name("."), name("b"), Token::Eof]);
        assert_eq!(tokens("a.%c"), vec![name("a"), Token::End, Token::Eof]);
        assert_eq!(tokens("a."), vec![name("a"), Token::End, Token::Eof]);
    }

    #[test]
    fn test_list() {
        assert_eq!(
            tokens("[H|T]"),
            vec![
                Token::LBracket,
                var("H"),
                Token::Bar,
                var("T"),
                Token::RBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_anonymous_variable() {
        let toks = tokens("foo(_, _X).");
        assert!(toks.contains(&var("_")));
        assert!(toks.contains(&var("_X")));
    }

    #[test]
    fn test_quoted_atom() {
        assert_eq!(tokens("'Hello World'")[0], Token::QuotedName("Hello World".into()));
        assert_eq!(tokens("'it''s'")[0], Token::QuotedName("it's".into()));
        assert_eq!(tokens("'a\\nb'")[0], Token::QuotedName("a\nb".into()));
        assert_eq!(tokens("'\\x41\\'")[0], Token::QuotedName("A".into()));
    }

    #[test]
    fn test_strings() {
        assert_eq!(tokens("\"abc\"")[0], Token::Str("abc".into()));
        assert_eq!(tokens("`abc`")[0], Token::BackQuoted("abc".into()));
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            tokens("% comment\nfoo. /* block /* nested */ */ bar."),
            vec![name("foo"), Token::End, name("bar"), Token::End, Token::Eof]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokens("42")[0], Token::Integer(42));
        assert_eq!(tokens("3.25")[0], Token::Float(3.25));
        assert_eq!(tokens("1.5e3")[0], Token::Float(1500.0));
        assert_eq!(tokens("0'a")[0], Token::Integer(97));
        assert_eq!(tokens("0xff")[0], Token::Integer(255));
        assert_eq!(tokens("0b101")[0], Token::Integer(5));
        assert_eq!(tokens("1_000")[0], Token::Integer(1000));
    }

    #[test]
    fn test_integer_then_end() {
        assert_eq!(tokens("X is 2."), vec![var("X"), name("is"), Token::Integer(2), Token::End, Token::Eof]);
    }

    #[test]
    fn test_minus_is_a_name() {
        // Negative literals are recognised by the parser, not the lexer.
        let (lexemes, _) = Lexer::new("- 1 -1").tokenize();
        assert_eq!(lexemes[0].token, name("-"));
        assert!(lexemes[1].layout_before);
        assert_eq!(lexemes[2].token, name("-"));
        assert!(!lexemes[3].layout_before);
    }

    #[test]
    fn test_layout_flag_separates_functional_notation() {
        let (lexemes, _) = Lexer::new("f(a) g (b)").tokenize();
        assert!(!lexemes[1].layout_before);
        assert!(lexemes[5].layout_before);
    }

    #[test]
    fn test_positions_are_rebased() {
        let (lexemes, _) = Lexer::with_origin("foo(X).\n  bar.", 10, 5, 200).tokenize();
        let foo = &lexemes[0];
        assert_eq!((foo.span.line, foo.span.column), (10, 5));
        assert_eq!((foo.span.start, foo.span.stop), (200, 203));

        let bar = &lexemes[5];
        assert_eq!(bar.token, name("bar"));
        assert_eq!((bar.span.line, bar.span.column), (11, 3));
        assert_eq!(bar.span.start, 210);
    }

    #[test]
    fn test_unrecognized_character_is_skipped() {
        let (lexemes, errors) = Lexer::new("foo \u{7f} bar").tokenize();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span.column, 5);
        let toks: Vec<_> = lexemes.into_iter().map(|l| l.token).collect();
        assert_eq!(toks, vec![name("foo"), name("bar"), Token::Eof]);
    }

    #[test]
    fn test_unterminated_quote_reports_error() {
        let (lexemes, errors) = Lexer::new("foo('bar").tokenize();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("unterminated"));
        assert_eq!(lexemes.last().map(|l| &l.token), Some(&Token::Eof));
    }
}
