//! prolog_terms: reading, checking and unifying Prolog terms.
//!
//! Turns Prolog text into [`Term`] trees with an operator-precedence parser,
//! classifies terms as clauses, queries or updates, and computes most
//! general unifiers.
//!
//! # Features
//!
//! - ISO operator table with priorities and fixities
//! - Two-pass parsing: a fast pass for valid input, a backtracking pass
//!   that collects positioned diagnostics and recovers at clause boundaries
//! - Source positions re-based onto an enclosing file
//! - Clause, query and update validation
//! - Robinson unification with occurs check; substitution composition
//! - A write cache that batches database mutations for a backing engine
//!
//! # Example
//!
//! ```
//! use prolog_terms::{mgu, Parser, Term};
//!
//! let mut parser = Parser::new("parent(tom, X)");
//! let term = parser.parse_term().unwrap().unwrap().into_inner();
//! assert!(parser.errors().is_empty());
//!
//! let fact = Term::compound("parent", vec![Term::atom("tom"), Term::atom("bob")]);
//! let s = mgu(&term, &fact).unwrap();
//! assert_eq!(s.get("X"), Some(&Term::atom("bob")));
//! ```

pub mod ast;
pub mod cache;
pub mod diagnostic;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod source;
pub mod subst;
pub mod token;
pub mod unify;
pub mod validate;
pub mod write;

pub use ast::{Signature, Term};
pub use cache::{Database, Engine, EngineContext, EngineError, WriteCache};
pub use diagnostic::{Diagnostic, DiagnosticSet};
pub use lexer::{LexicalError, Lexer};
pub use ops::{Fixity, OpDef};
pub use parser::{parse_program, parse_term, DoubleQuotes, ParseFault, Parser, ParserOptions};
pub use source::{Located, SourceInfo};
pub use subst::{Substitution, SubstitutionError};
pub use token::{Lexeme, Span, Token};
pub use unify::{mgu, unify};
pub use validate::{DatabaseFormula, Query, SemanticError, Update};
