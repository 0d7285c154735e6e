//! Parser for Prolog text.
//!
//! Operator-precedence (precedence climbing) parser over a token vector.
//! Every entry point first tries a fast deterministic pass that commits to
//! the first reading of each prefix operator and reports nothing. If that
//! pass fails, the cursor is rewound and the input is read again in
//! diagnostic mode, which backtracks over prefix-operator readings,
//! records a [`Diagnostic`] for every syntax error and resumes at the next
//! clause.

use std::sync::Arc;

use thiserror::Error;

use crate::ast::Term;
use crate::diagnostic::{syntax_message, Diagnostic, DiagnosticSet, Expected, Rule, SPURIOUS_INPUT};
use crate::lexer::Lexer;
use crate::ops::{self, Fixity, OpDef, ARG_PRIORITY, MAX_PRIORITY};
use crate::source::{Located, SourceInfo};
use crate::token::{Lexeme, Span, Token};
use crate::validate::{self, DatabaseFormula, Query, SemanticError, Update};

/// `|` used as an infix operator reads as `;`.
const BAR_AS_OR: OpDef = OpDef {
    priority: 1100,
    fixity: Fixity::Xfy,
};

/// A failure of the parsing engine itself, as opposed to a problem with
/// the input. Input problems are reported through [`Parser::errors`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFault {
    #[error("terms nested deeper than {limit} levels at {line}:{column}")]
    NestingTooDeep {
        limit: usize,
        line: usize,
        column: usize,
    },
    #[error("parser made no progress at offset {offset}")]
    Stalled { offset: usize },
}

/// How double-quoted strings are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoubleQuotes {
    /// List of character codes: `"ab"` is `[97, 98]`
    #[default]
    Codes,
    /// List of one-character atoms: `"ab"` is `[a, b]`
    Chars,
    /// A single atom: `"ab"` is `ab`
    Atom,
}

#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Deepest term nesting accepted before giving up with
    /// [`ParseFault::NestingTooDeep`].
    pub max_depth: usize,
    pub double_quotes: DoubleQuotes,
    /// Try the fast pass before the diagnostic pass.
    pub two_phase: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: 512,
            double_quotes: DoubleQuotes::default(),
            two_phase: true,
        }
    }
}

/// A syntax error: the token index where reading stopped and what would
/// have been accepted there.
#[derive(Debug, Clone)]
struct Miss {
    at: usize,
    expected: Expected,
}

#[derive(Debug)]
enum Failure {
    Syntax(Miss),
    Fault(ParseFault),
}

impl From<ParseFault> for Failure {
    fn from(fault: ParseFault) -> Self {
        Failure::Fault(fault)
    }
}

type PResult<T> = Result<T, Failure>;

/// Left operand and operator waiting for their right operand.
struct Pending {
    left: Term,
    functor: String,
    priority: u16,
    /// Priority bound of the term the operator appears in.
    max: u16,
}

enum Step {
    Infix(String, OpDef),
    Postfix(String, OpDef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Fast,
    Diagnostic,
}

/// Parser over one text.
///
/// Each entry point reads the whole text from the start and replaces the
/// diagnostics of any earlier call.
pub struct Parser {
    tokens: Vec<Lexeme>,
    pos: usize,
    lexical: Vec<Diagnostic>,
    errors: DiagnosticSet,
    options: ParserOptions,
    file: Option<Arc<str>>,
    mode: Mode,
    depth: usize,
    /// Furthest syntax error abandoned while backtracking.
    furthest: Option<Miss>,
}

impl Parser {
    /// Create a parser for a standalone text.
    pub fn new(input: &str) -> Self {
        Self::with_source(input, SourceInfo::new())
    }

    /// Create a parser for a fragment that starts at `origin` in a larger
    /// file; every reported position is relative to that file.
    pub fn with_source(input: &str, origin: SourceInfo) -> Self {
        Self::with_options(input, origin, ParserOptions::default())
    }

    pub fn with_options(input: &str, origin: SourceInfo, options: ParserOptions) -> Self {
        let lexer = Lexer::with_origin(input, origin.line, origin.column, origin.start);
        let (tokens, lexical_errors) = lexer.tokenize();
        let lexical = lexical_errors
            .into_iter()
            .map(|e| Diagnostic::new(e.message, SourceInfo::from_span(&origin.file, e.span)))
            .collect();
        Self {
            tokens,
            pos: 0,
            lexical,
            errors: DiagnosticSet::new(),
            options,
            file: origin.file,
            mode: Mode::Fast,
            depth: 0,
            furthest: None,
        }
    }

    /// Diagnostics of the last parse; empty if and only if it succeeded.
    pub fn errors(&self) -> &DiagnosticSet {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Parse a single term, optionally followed by an end token.
    pub fn parse_term(&mut self) -> Result<Option<Located<Term>>, ParseFault> {
        self.drive(|p| {
            let first = p.peek().span;
            let term = p.parse(MAX_PRIORITY, Rule::Term)?;
            p.skip_end();
            Ok(Located::new(term, p.source_from(first)))
        })
    }

    /// Parse a comma-separated sequence of terms, each read at argument
    /// priority.
    pub fn parse_terms(&mut self) -> Result<Vec<Located<Term>>, ParseFault> {
        let terms = self.drive(|p| {
            let mut terms = Vec::new();
            if p.at_end() {
                return Ok(terms);
            }
            loop {
                let first = p.peek().span;
                let term = p.parse(ARG_PRIORITY, Rule::Terms)?;
                terms.push(Located::new(term, p.source_from(first)));
                if p.peek().token != Token::Comma {
                    break;
                }
                p.advance();
            }
            p.skip_end();
            Ok(terms)
        })?;
        Ok(terms.unwrap_or_default())
    }

    /// Parse a single variable.
    pub fn parse_var(&mut self) -> Result<Option<Located<Term>>, ParseFault> {
        self.drive(|p| {
            let lexeme = p.peek().clone();
            match lexeme.token {
                Token::Variable(name) => {
                    p.advance();
                    Ok(Located::new(
                        Term::Variable(name),
                        SourceInfo::from_span(&p.file, lexeme.span),
                    ))
                }
                _ => Err(p.miss(Expected::new(Rule::Variable).token("a variable"))),
            }
        })
    }

    /// Parse one query. A leading `?-` is accepted and dropped.
    pub fn parse_query(&mut self) -> Result<Option<Query>, ParseFault> {
        let query = self.drive(|p| {
            let first = p.peek().span;
            let term = p.parse(MAX_PRIORITY, Rule::Term)?;
            p.skip_end();
            let source = p.source_from(first);
            Ok(p.classify(strip_query(term), source, validate::to_query))
        })?;
        Ok(query.flatten())
    }

    /// Parse a sequence of `.`-terminated queries.
    pub fn parse_queries(&mut self) -> Result<Vec<Query>, ParseFault> {
        let queries = self.drive(|p| {
            p.read_clauses(Rule::Queries, |term, source| {
                validate::to_query(strip_query(term), source)
            })
        })?;
        Ok(queries.unwrap_or_default())
    }

    /// Parse one update: a conjunction of literals and `not(Literal)`s.
    pub fn parse_update(&mut self) -> Result<Option<Update>, ParseFault> {
        let update = self.drive(|p| {
            let first = p.peek().span;
            let term = p.parse(MAX_PRIORITY, Rule::Term)?;
            p.skip_end();
            let source = p.source_from(first);
            Ok(p.classify(term, source, validate::to_update))
        })?;
        Ok(update.flatten())
    }

    /// Parse a program: a sequence of `.`-terminated clauses. Clauses with
    /// syntax or semantic errors are left out and reported.
    pub fn parse_database_formulas(&mut self) -> Result<Vec<DatabaseFormula>, ParseFault> {
        let formulas =
            self.drive(|p| p.read_clauses(Rule::Program, validate::to_database_formula))?;
        Ok(formulas.unwrap_or_default())
    }

    /// Run `read` over the whole input, in the fast mode first when enabled
    /// and in diagnostic mode if that fails or leaves input unread.
    fn drive<T>(&mut self, read: impl Fn(&mut Self) -> PResult<T>) -> Result<Option<T>, ParseFault> {
        if self.options.two_phase {
            self.rewind(Mode::Fast);
            match read(self) {
                Ok(value) if self.at_end() => return Ok(Some(value)),
                Ok(_) | Err(Failure::Syntax(_)) => {}
                Err(Failure::Fault(fault)) => return Err(fault),
            }
            tracing::debug!(
                tokens = self.tokens.len(),
                position = self.pos,
                "fast parse failed, reparsing with diagnostics"
            );
        }

        self.rewind(Mode::Diagnostic);
        match read(self) {
            Ok(value) => {
                self.check_spurious();
                Ok(Some(value))
            }
            Err(Failure::Syntax(miss)) => {
                self.report(miss);
                Ok(None)
            }
            Err(Failure::Fault(fault)) => Err(fault),
        }
    }

    fn rewind(&mut self, mode: Mode) {
        self.pos = 0;
        self.depth = 0;
        self.mode = mode;
        self.furthest = None;
        self.errors.clear();
        self.errors.extend(self.lexical.iter().cloned());
    }

    /// Read clauses up to the end of input. In diagnostic mode a clause
    /// with a syntax error is reported and skipped up to its end token.
    fn read_clauses<T>(
        &mut self,
        rule: Rule,
        classify: impl Fn(Term, SourceInfo) -> Result<T, SemanticError>,
    ) -> PResult<Vec<T>> {
        let mut out = Vec::new();
        while !self.at_end() {
            self.furthest = None;
            match self.read_clause(rule) {
                Ok((term, source)) => {
                    if let Some(value) = self.classify(term, source, &classify) {
                        out.push(value);
                    }
                }
                Err(Failure::Syntax(miss)) if self.mode == Mode::Diagnostic => {
                    let start = miss.at;
                    self.report(miss);
                    self.skip_clause(start)?;
                }
                Err(failure) => return Err(failure),
            }
        }
        Ok(out)
    }

    fn read_clause(&mut self, rule: Rule) -> PResult<(Term, SourceInfo)> {
        let first = self.peek().span;
        let term = self.parse(MAX_PRIORITY, rule)?;
        self.expect(Token::End, Expected::new(rule).token("'.'").or_operator())?;
        Ok((term, self.source_from(first)))
    }

    fn classify<T>(
        &mut self,
        term: Term,
        source: SourceInfo,
        classify: impl Fn(Term, SourceInfo) -> Result<T, SemanticError>,
    ) -> Option<T> {
        match classify(term, source.clone()) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::debug!(%error, "rejected term");
                self.errors.insert(Diagnostic::new(error.to_string(), source));
                None
            }
        }
    }

    /// Move past the end token of the clause containing token `from`.
    fn skip_clause(&mut self, from: usize) -> PResult<()> {
        let before = self.pos;
        self.pos = from;
        while !matches!(self.peek().token, Token::End | Token::Eof) {
            self.advance();
        }
        if self.peek().token == Token::End {
            self.advance();
        }
        if self.pos <= from && !self.at_end() {
            return Err(ParseFault::Stalled {
                offset: self.tokens[before.min(self.tokens.len() - 1)].span.start,
            }
            .into());
        }
        Ok(())
    }

    fn report(&mut self, miss: Miss) {
        let miss = match self.furthest.take() {
            Some(furthest) if furthest.at > miss.at => furthest,
            _ => miss,
        };
        let lexeme = &self.tokens[miss.at];
        tracing::trace!(
            line = lexeme.span.line,
            column = lexeme.span.column,
            "recovered from syntax error"
        );
        let message = syntax_message(&lexeme.token, &miss.expected);
        let source = SourceInfo::from_span(&self.file, lexeme.span);
        self.errors.insert(Diagnostic::new(message, source));
    }

    /// Anything left before the end of input is reported once, spanning from
    /// the first unread token to the end of input, trailing layout included.
    fn check_spurious(&mut self) {
        if self.at_end() {
            return;
        }
        let first = self.peek().span;
        let eof = self.tokens[self.tokens.len() - 1].span;
        let source = SourceInfo::from_span(&self.file, first).through(eof);
        self.errors.insert(Diagnostic::new(SPURIOUS_INPUT, source));
    }

    // --- token cursor ---

    fn peek(&self) -> &Lexeme {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Lexeme {
        let lexeme = self.peek().clone();
        if lexeme.token != Token::Eof {
            self.pos += 1;
        }
        lexeme
    }

    fn at_end(&self) -> bool {
        self.peek().token == Token::Eof
    }

    fn skip_end(&mut self) {
        if self.peek().token == Token::End {
            self.advance();
        }
    }

    fn expect(&mut self, token: Token, expected: Expected) -> PResult<Span> {
        if self.peek().token == token {
            Ok(self.advance().span)
        } else {
            Err(self.miss(expected))
        }
    }

    fn miss(&self, expected: Expected) -> Failure {
        Failure::Syntax(Miss {
            at: self.pos,
            expected,
        })
    }

    /// Keep the furthest of the syntax errors abandoned by backtracking; it
    /// is reported instead of a later, shallower one.
    fn abandon(&mut self, miss: Miss) {
        match &self.furthest {
            Some(furthest) if furthest.at >= miss.at => {}
            _ => self.furthest = Some(miss),
        }
    }

    fn source_from(&self, first: Span) -> SourceInfo {
        let source = SourceInfo::from_span(&self.file, first);
        match self.pos.checked_sub(1) {
            Some(last) => source.through(self.tokens[last].span),
            None => source,
        }
    }

    // --- terms ---

    fn parse(&mut self, max: u16, rule: Rule) -> PResult<Term> {
        self.parse_expr(max, rule).map(|(term, _)| term)
    }

    /// A term of priority at most `max`, with the priority it was read at.
    fn parse_expr(&mut self, max: u16, rule: Rule) -> PResult<(Term, u16)> {
        self.depth += 1;
        let result = if self.depth > self.options.max_depth {
            let span = self.peek().span;
            Err(ParseFault::NestingTooDeep {
                limit: self.options.max_depth,
                line: span.line,
                column: span.column,
            }
            .into())
        } else {
            self.parse_operators(max, rule)
        };
        self.depth -= 1;
        result
    }

    /// Operands joined by infix and postfix operators. Right operands are
    /// read on an explicit stack, so a chain such as a long clause body is
    /// one level of nesting however many operators it has.
    fn parse_operators(&mut self, max: u16, rule: Rule) -> PResult<(Term, u16)> {
        let mut pending: Vec<Pending> = Vec::new();
        let mut max = max;
        let (mut left, mut left_priority) = self.parse_primary(max, rule)?;
        loop {
            match self.operator_step(left_priority, max) {
                Some(Step::Infix(functor, op)) => {
                    self.advance();
                    pending.push(Pending {
                        left,
                        functor,
                        priority: op.priority,
                        max,
                    });
                    max = op.right_max();
                    (left, left_priority) = self.parse_primary(max, Rule::Operand)?;
                }
                Some(Step::Postfix(functor, op)) => {
                    self.advance();
                    left = Term::compound(functor, vec![left]);
                    left_priority = op.priority;
                }
                None => match pending.pop() {
                    Some(outer) => {
                        left = Term::compound(outer.functor, vec![outer.left, left]);
                        left_priority = outer.priority;
                        max = outer.max;
                    }
                    None => return Ok((left, left_priority)),
                },
            }
        }
    }

    /// The operator at the cursor, if it may follow a left operand of
    /// `left_priority` in a term of priority at most `max`.
    fn operator_step(&self, left_priority: u16, max: u16) -> Option<Step> {
        let (name, infix, postfix) = match &self.peek().token {
            Token::Name(name) => (name.clone(), ops::infix_op(name), ops::postfix_op(name)),
            Token::Comma => (",".to_string(), ops::infix_op(","), None),
            Token::Bar => (";".to_string(), Some(BAR_AS_OR), None),
            _ => return None,
        };
        let fits = |op: &OpDef| op.priority <= max && left_priority <= op.left_max();
        match (infix, postfix) {
            (Some(op), _) if fits(&op) => Some(Step::Infix(name, op)),
            (_, Some(op)) if fits(&op) => Some(Step::Postfix(name, op)),
            _ => None,
        }
    }

    fn parse_primary(&mut self, max: u16, rule: Rule) -> PResult<(Term, u16)> {
        let lexeme = self.peek().clone();
        match lexeme.token {
            Token::Integer(n) => {
                self.advance();
                Ok((Term::Integer(n), 0))
            }
            Token::Float(x) => {
                self.advance();
                Ok((Term::Float(x), 0))
            }
            Token::Variable(name) => {
                self.advance();
                Ok((Term::Variable(name), 0))
            }
            Token::Str(text) => {
                self.advance();
                Ok((self.string_term(&text), 0))
            }
            Token::BackQuoted(text) => {
                self.advance();
                Ok((codes(&text), 0))
            }
            Token::LParen => {
                self.advance();
                let term = self.parse(MAX_PRIORITY, Rule::Parenthesized)?;
                self.expect(
                    Token::RParen,
                    Expected::new(Rule::Parenthesized).token("')'").or_operator(),
                )?;
                Ok((term, 0))
            }
            Token::LBracket => {
                self.advance();
                self.parse_list().map(|t| (t, 0))
            }
            Token::LBrace => {
                self.advance();
                self.parse_curly().map(|t| (t, 0))
            }
            Token::QuotedName(name) => {
                self.advance();
                if self.at_functional_paren() {
                    return self.parse_compound(name).map(|t| (t, 0));
                }
                Ok((Term::Atom(name), 0))
            }
            Token::Name(name) => {
                self.advance();
                self.parse_name(name, max)
            }
            _ => Err(self.miss(Expected::term_start(rule))),
        }
    }

    /// An open paren directly after a name, with no layout between them.
    fn at_functional_paren(&self) -> bool {
        let next = self.peek();
        next.token == Token::LParen && !next.layout_before
    }

    /// An unquoted name: functional notation, a negative number, a prefix
    /// operator application or a plain atom.
    fn parse_name(&mut self, name: String, max: u16) -> PResult<(Term, u16)> {
        if self.at_functional_paren() {
            return self.parse_compound(name).map(|t| (t, 0));
        }

        let next = self.peek().clone();
        if name == "-" && !next.layout_before {
            match next.token {
                Token::Integer(n) => {
                    self.advance();
                    return Ok((Term::Integer(-n), 0));
                }
                Token::Float(x) => {
                    self.advance();
                    return Ok((Term::Float(-x), 0));
                }
                _ => {}
            }
        }

        let Some(op) = ops::prefix_op(&name) else {
            return Ok((Term::Atom(name), 0));
        };
        if !next.token.can_start_term() {
            return Ok((Term::Atom(name), 0));
        }

        let priority = op.priority.min(max);
        let operand_max = op.right_max().min(priority);
        match self.mode {
            Mode::Fast => {
                let (operand, _) = self.parse_expr(operand_max, Rule::Operand)?;
                Ok((Term::compound(name, vec![operand]), priority))
            }
            Mode::Diagnostic => {
                let save = self.pos;
                match self.parse_expr(operand_max, Rule::Operand) {
                    Ok((operand, _)) if self.at_plausible_follower() => {
                        return Ok((Term::compound(name, vec![operand]), priority));
                    }
                    Ok(_) => {}
                    Err(Failure::Syntax(miss)) => self.abandon(miss),
                    Err(fault) => return Err(fault),
                }
                // Read the operator as an atom instead.
                self.pos = save;
                Ok((Term::Atom(name), 0))
            }
        }
    }

    /// Can the current token follow a complete operand?
    fn at_plausible_follower(&self) -> bool {
        match &self.peek().token {
            Token::Name(name) => ops::infix_op(name).is_some() || ops::postfix_op(name).is_some(),
            token => token.is_terminator(),
        }
    }

    /// Arguments of `name(`, up to and including the closing paren.
    fn parse_compound(&mut self, name: String) -> PResult<Term> {
        self.advance();
        let mut args = Vec::new();
        loop {
            args.push(self.parse(ARG_PRIORITY, Rule::Arguments)?);
            match self.peek().token {
                Token::Comma => {
                    self.advance();
                }
                Token::RParen => {
                    self.advance();
                    break;
                }
                _ => {
                    return Err(self.miss(Expected::new(Rule::Arguments).token("','").token("')'")))
                }
            }
        }
        Ok(Term::compound(name, args))
    }

    /// List elements after `[`, desugared into `'.'/2` cells.
    fn parse_list(&mut self) -> PResult<Term> {
        if self.peek().token == Token::RBracket {
            self.advance();
            return Ok(Term::nil());
        }
        let mut elements = Vec::new();
        loop {
            elements.push(self.parse(ARG_PRIORITY, Rule::List)?);
            match self.peek().token {
                Token::Comma => {
                    self.advance();
                }
                Token::Bar => {
                    self.advance();
                    let tail = self.parse(ARG_PRIORITY, Rule::List)?;
                    self.expect(Token::RBracket, Expected::new(Rule::List).token("']'"))?;
                    return Ok(Term::list_with_tail(elements, tail));
                }
                Token::RBracket => {
                    self.advance();
                    return Ok(Term::list(elements));
                }
                _ => {
                    return Err(self.miss(
                        Expected::new(Rule::List).token("','").token("'|'").token("']'"),
                    ))
                }
            }
        }
    }

    /// `{}` or `{Term}` after `{`.
    fn parse_curly(&mut self) -> PResult<Term> {
        if self.peek().token == Token::RBrace {
            self.advance();
            return Ok(Term::atom("{}"));
        }
        let inner = self.parse(MAX_PRIORITY, Rule::Curly)?;
        self.expect(Token::RBrace, Expected::new(Rule::Curly).token("'}'").or_operator())?;
        Ok(Term::compound("{}", vec![inner]))
    }

    fn string_term(&self, text: &str) -> Term {
        match self.options.double_quotes {
            DoubleQuotes::Codes => codes(text),
            DoubleQuotes::Chars => Term::list(text.chars().map(|c| Term::Atom(c.to_string())).collect()),
            DoubleQuotes::Atom => Term::atom(text),
        }
    }
}

fn codes(text: &str) -> Term {
    Term::list(text.chars().map(|c| Term::Integer(c as i64)).collect())
}

/// `?- G` asks `G`.
fn strip_query(term: Term) -> Term {
    match term {
        Term::Compound { functor, mut args } if functor == "?-" && args.len() == 1 => args.remove(0),
        term => term,
    }
}

/// Parse `text` as a single term.
pub fn parse_term(text: &str) -> Result<(Option<Term>, DiagnosticSet), ParseFault> {
    let mut parser = Parser::new(text);
    let term = parser.parse_term()?.map(Located::into_inner);
    Ok((term, parser.errors().clone()))
}

/// Parse `text` as a program.
pub fn parse_program(text: &str) -> Result<(Vec<DatabaseFormula>, DiagnosticSet), ParseFault> {
    let mut parser = Parser::new(text);
    let formulas = parser.parse_database_formulas()?;
    Ok((formulas, parser.errors().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(text: &str) -> Term {
        let mut parser = Parser::new(text);
        let term = parser.parse_term().unwrap();
        assert!(parser.errors().is_empty(), "errors in {text:?}: {:?}", parser.errors());
        term.unwrap().into_inner()
    }

    fn c(name: &str, args: Vec<Term>) -> Term {
        Term::compound(name, args)
    }

    fn int(n: i64) -> Term {
        Term::int(n)
    }

    fn messages(parser: &Parser) -> Vec<String> {
        parser.errors().iter().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(term("1+2*3"), c("+", vec![int(1), c("*", vec![int(2), int(3)])]));
        assert_eq!(term("(1+2)*3"), c("*", vec![c("+", vec![int(1), int(2)]), int(3)]));
        assert_eq!(term("1-2-3"), c("-", vec![c("-", vec![int(1), int(2)]), int(3)]));
        assert_eq!(term("2^3^4"), c("^", vec![int(2), c("^", vec![int(3), int(4)])]));
    }

    #[test]
    fn test_list_desugaring() {
        assert_eq!(
            term("[1,2,3]"),
            Term::cons(int(1), Term::cons(int(2), Term::cons(int(3), Term::nil())))
        );
        assert_eq!(
            term("[a,b|T]"),
            Term::list_with_tail(vec![Term::atom("a"), Term::atom("b")], Term::var("T"))
        );
        assert_eq!(term("[]"), Term::nil());
    }

    #[test]
    fn test_clause_structure() {
        let t = term("p(X) :- q(X), \\+ r(X).");
        assert_eq!(
            t,
            c(
                ":-",
                vec![
                    c("p", vec![Term::var("X")]),
                    c(
                        ",",
                        vec![
                            c("q", vec![Term::var("X")]),
                            c("\\+", vec![c("r", vec![Term::var("X")])]),
                        ]
                    ),
                ]
            )
        );
    }

    #[test]
    fn test_minus_forms() {
        assert_eq!(term("-1"), int(-1));
        assert_eq!(term("- 1"), c("-", vec![int(1)]));
        assert_eq!(term("-(1)"), c("-", vec![int(1)]));
        assert_eq!(term("a - 1"), c("-", vec![Term::atom("a"), int(1)]));
        assert_eq!(term("-a"), c("-", vec![Term::atom("a")]));
        assert_eq!(term("-2.5"), Term::float(-2.5));
    }

    #[test]
    fn test_operator_as_atom() {
        assert_eq!(term("f(-, a)"), c("f", vec![Term::atom("-"), Term::atom("a")]));
        assert_eq!(term("[-]"), Term::list(vec![Term::atom("-")]));
        assert_eq!(term("X = -"), c("=", vec![Term::var("X"), Term::atom("-")]));
    }

    #[test]
    fn test_backtracking_pass_reads_prefix_operator_as_atom() {
        let mut parser = Parser::new("- = a");
        let t = parser.parse_term().unwrap().unwrap().into_inner();
        assert!(parser.errors().is_empty());
        assert_eq!(t, c("=", vec![Term::atom("-"), Term::atom("a")]));

        let mut parser = Parser::new("\\+ = \\+");
        let t = parser.parse_term().unwrap().unwrap().into_inner();
        assert!(parser.errors().is_empty());
        assert_eq!(t, c("=", vec![Term::atom("\\+"), Term::atom("\\+")]));
    }

    #[test]
    fn test_bar_and_curly() {
        assert_eq!(term("a | b"), c(";", vec![Term::atom("a"), Term::atom("b")]));
        assert_eq!(
            term("{a, b}"),
            c("{}", vec![c(",", vec![Term::atom("a"), Term::atom("b")])])
        );
        assert_eq!(term("{}"), Term::atom("{}"));
    }

    #[test]
    fn test_quoted_names_are_not_operators() {
        assert_eq!(term("'-'"), Term::atom("-"));
        assert_eq!(term("'hello world'(X)"), c("hello world", vec![Term::var("X")]));
    }

    #[test]
    fn test_double_quotes() {
        assert_eq!(term("\"ab\""), Term::list(vec![int(97), int(98)]));

        let options = ParserOptions {
            double_quotes: DoubleQuotes::Chars,
            ..ParserOptions::default()
        };
        let mut parser = Parser::with_options("\"ab\"", SourceInfo::new(), options);
        let t = parser.parse_term().unwrap().unwrap().into_inner();
        assert_eq!(t, Term::list(vec![Term::atom("a"), Term::atom("b")]));

        let options = ParserOptions {
            double_quotes: DoubleQuotes::Atom,
            ..ParserOptions::default()
        };
        let mut parser = Parser::with_options("\"ab\"", SourceInfo::new(), options);
        let t = parser.parse_term().unwrap().unwrap().into_inner();
        assert_eq!(t, Term::atom("ab"));
    }

    #[test]
    fn test_one_diagnostic_for_kata_kata() {
        let mut parser = Parser::new("kata kata.");
        let formulas = parser.parse_database_formulas().unwrap();
        assert!(formulas.is_empty());
        assert_eq!(
            messages(&parser),
            vec!["found atom 'kata' but expected a list of prolog clauses".to_string()]
        );
        let diagnostic = parser.errors().first().unwrap();
        assert_eq!((diagnostic.source.line, diagnostic.source.column), (1, 6));
    }

    #[test]
    fn test_recovery_continues_with_next_clause() {
        let mut parser = Parser::new("p(a).\nq(.\nr(b).\n");
        let formulas = parser.parse_database_formulas().unwrap();
        let heads: Vec<String> = formulas.iter().map(|f| f.to_string()).collect();
        assert_eq!(heads, vec!["p(a)", "r(b)"]);
        assert_eq!(parser.errors().len(), 1);
        assert_eq!(parser.errors().first().unwrap().source.line, 2);
    }

    #[test]
    fn test_non_identifier_heads_are_rejected() {
        let mut parser = Parser::new("'hello world'(x). + (a, b). '1'. ok(x).");
        let formulas = parser.parse_database_formulas().unwrap();
        let heads: Vec<String> = formulas.iter().map(|f| f.to_string()).collect();
        assert_eq!(heads, vec!["ok(x)"]);
        assert_eq!(parser.errors().len(), 3);
    }

    #[test]
    fn test_argument_errors_list_alternatives() {
        let mut parser = Parser::new("p(a b).");
        parser.parse_database_formulas().unwrap();
        assert_eq!(
            messages(&parser),
            vec!["found atom 'b' but expected either ',' or ')'".to_string()]
        );
    }

    #[test]
    fn test_semantic_errors_skip_only_their_clause() {
        let mut parser = Parser::new("p(a). X :- q. r. X is 1.");
        let formulas = parser.parse_database_formulas().unwrap();
        assert_eq!(formulas.len(), 2);
        assert_eq!(parser.errors().len(), 2);
        assert!(messages(&parser)[0].contains("variable X"));
        assert!(messages(&parser)[1].contains("is/2"));
    }

    #[test]
    fn test_spurious_input() {
        let mut parser = Parser::new("foo bar baz");
        let t = parser.parse_term().unwrap().unwrap();
        assert_eq!(t.value, Term::atom("foo"));
        assert_eq!(messages(&parser), vec![SPURIOUS_INPUT.to_string()]);
        let source = &parser.errors().first().unwrap().source;
        assert_eq!((source.start, source.stop), (4, 11));
    }

    #[test]
    fn test_spurious_input_runs_to_end_of_input() {
        let text = "foo bar  % trailing note\n";
        let mut parser = Parser::new(text);
        parser.parse_term().unwrap();
        let source = &parser.errors().first().unwrap().source;
        assert_eq!((source.start, source.stop), (4, text.chars().count()));
    }

    #[test]
    fn test_long_conjunctions_are_one_level_deep() {
        let goals: Vec<String> = (0..1200).map(|i| format!("a{i}")).collect();
        let text = format!("p :- {}.\nq(b).", goals.join(", "));
        let mut parser = Parser::new(&text);
        let formulas = parser.parse_database_formulas().unwrap();
        assert!(parser.errors().is_empty());
        assert_eq!(formulas.len(), 2);
        assert_eq!(formulas[0].body().unwrap().conjuncts().len(), 1200);

        let literals: Vec<String> = (0..1200)
            .map(|i| if i % 3 == 0 { format!("not(q{i})") } else { format!("q{i}") })
            .collect();
        let mut parser = Parser::new(&literals.join(", "));
        let update = parser.parse_update().unwrap().unwrap();
        assert_eq!(update.add_list().len(), 800);
        assert_eq!(update.delete_list().len(), 400);

        // only brackets and arguments count towards the limit
        let options = ParserOptions {
            max_depth: 4,
            ..ParserOptions::default()
        };
        let chain = (0..50).map(|i| format!("f(x{i}) ; g")).collect::<Vec<_>>().join(", ");
        let mut parser = Parser::with_options(&chain, SourceInfo::new(), options);
        assert!(parser.parse_term().unwrap().is_some());
        assert!(parser.errors().is_empty());
    }

    #[test]
    fn test_long_body_survives_the_diagnostic_pass() {
        let goals: Vec<String> = (0..1200).map(|i| format!("a{i}")).collect();
        let text = format!("p :- {}.\nq(.\nr.", goals.join(", "));
        let mut parser = Parser::new(&text);
        let formulas = parser.parse_database_formulas().unwrap();
        assert_eq!(formulas.len(), 2);
        assert_eq!(parser.errors().len(), 1);
        assert_eq!(parser.errors().first().unwrap().source.line, 2);
    }

    #[test]
    fn test_mixed_operator_chain_keeps_priorities() {
        assert_eq!(
            term("a :- b, c ; d -> e"),
            c(
                ":-",
                vec![
                    Term::atom("a"),
                    c(
                        ";",
                        vec![
                            c(",", vec![Term::atom("b"), Term::atom("c")]),
                            c("->", vec![Term::atom("d"), Term::atom("e")]),
                        ]
                    ),
                ]
            )
        );
        assert_eq!(
            term("X = 1 + 2 * 3 - 4"),
            c(
                "=",
                vec![
                    Term::var("X"),
                    c("-", vec![c("+", vec![int(1), c("*", vec![int(2), int(3)])]), int(4)]),
                ]
            )
        );
    }

    #[test]
    fn test_lexical_errors_are_reported_and_skipped() {
        let mut parser = Parser::new("p(a). q(b) \u{00a7}.");
        let formulas = parser.parse_database_formulas().unwrap();
        assert_eq!(formulas.len(), 2);
        assert_eq!(parser.errors().len(), 1);
        assert!(messages(&parser)[0].contains("unrecognized character"));
    }

    #[test]
    fn test_positions_are_rebased() {
        let origin = SourceInfo::at(Some("family.pl"), 10, 5, 100);
        let mut parser = Parser::with_source("p(a).\n  q(b).", origin);
        let formulas = parser.parse_database_formulas().unwrap();
        let first = formulas[0].source();
        assert_eq!((first.line, first.column, first.start, first.stop), (10, 5, 100, 105));
        let second = formulas[1].source();
        assert_eq!((second.line, second.column), (11, 3));
        assert_eq!(second.to_string(), "family.pl:11:3");
    }

    #[test]
    fn test_nesting_limit_is_a_fault() {
        let text = format!("{}a{}", "f(".repeat(100), ")".repeat(100));
        let options = ParserOptions {
            max_depth: 16,
            ..ParserOptions::default()
        };
        let mut parser = Parser::with_options(&text, SourceInfo::new(), options);
        assert!(matches!(
            parser.parse_term(),
            Err(ParseFault::NestingTooDeep { limit: 16, .. })
        ));
        assert!(Parser::new(&text).parse_term().unwrap().is_some());
    }

    #[test]
    fn test_terms_and_var() {
        let mut parser = Parser::new("a, f(X), [b]");
        let terms = parser.parse_terms().unwrap();
        assert_eq!(terms.len(), 3);
        assert_eq!(terms[1].value, c("f", vec![Term::var("X")]));

        let mut parser = Parser::new("Xs");
        assert_eq!(parser.parse_var().unwrap().unwrap().value, Term::var("Xs"));

        let mut parser = Parser::new("foo");
        assert!(parser.parse_var().unwrap().is_none());
        assert_eq!(
            messages(&parser),
            vec!["found atom 'foo' but expected a variable".to_string()]
        );
    }

    #[test]
    fn test_queries() {
        let mut parser = Parser::new("?- p(X). q, r.");
        let queries = parser.parse_queries().unwrap();
        assert!(parser.errors().is_empty());
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].term(), &c("p", vec![Term::var("X")]));
        assert_eq!(queries[0].free_vars(), vec!["X"]);

        let mut parser = Parser::new("X");
        assert!(parser.parse_query().unwrap().is_none());
        assert_eq!(parser.errors().len(), 1);
    }

    #[test]
    fn test_update() {
        let mut parser = Parser::new("p, not(q), r");
        let update = parser.parse_update().unwrap().unwrap();
        let adds: Vec<String> = update.add_list().iter().map(|f| f.to_string()).collect();
        let deletes: Vec<String> = update.delete_list().iter().map(|f| f.to_string()).collect();
        assert_eq!(adds, vec!["p", "r"]);
        assert_eq!(deletes, vec!["q"]);
    }

    #[test]
    fn test_single_pass_matches_two_phase() {
        let text = "p(X) :- X = [1, 2|T], - = a. q(. r.";
        let mut two = Parser::new(text);
        let options = ParserOptions {
            two_phase: false,
            ..ParserOptions::default()
        };
        let mut one = Parser::with_options(text, SourceInfo::new(), options);
        assert_eq!(
            two.parse_database_formulas().unwrap(),
            one.parse_database_formulas().unwrap()
        );
        assert_eq!(two.errors(), one.errors());
    }
}
