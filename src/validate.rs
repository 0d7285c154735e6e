//! Classification of raw terms into clauses, queries and updates.
//!
//! The parser hands every clause-level term to one of [`to_database_formula`],
//! [`to_query`] or [`to_update`]. Each either wraps the term in a validated
//! type or names the legality rule it broke.

use std::fmt;

use thiserror::Error;

use crate::ast::{Signature, Term};
use crate::lexer;
use crate::ops;
use crate::source::SourceInfo;
use crate::subst::Substitution;

/// A well-formed term that is not legal in the position it was used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("variable {0} cannot be the head of a clause")]
    VariableHead(String),
    #[error("{0} is not a predication")]
    NotPredication(String),
    #[error("cannot redefine built-in predicate {0}")]
    ProtectedPredicate(Signature),
    #[error("directive {0} cannot be stored as a clause")]
    Directive(String),
    #[error("{0} cannot be used as a goal")]
    IllegalGoal(String),
    #[error("clause {0} cannot be used as a goal")]
    ClauseAsGoal(String),
    #[error("{0} cannot be part of an update")]
    IllegalUpdate(String),
    #[error("negated literal not({0}) must be a plain predication")]
    NestedNegation(String),
}

/// A fact or rule that may be stored in a database.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseFormula {
    term: Term,
    source: SourceInfo,
}

impl DatabaseFormula {
    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    pub fn into_term(self) -> Term {
        self.term
    }

    /// The clause head; the whole term for facts.
    pub fn head(&self) -> &Term {
        match &self.term {
            Term::Compound { functor, args } if functor == ":-" && args.len() == 2 => &args[0],
            term => term,
        }
    }

    /// The clause body; `None` for facts.
    pub fn body(&self) -> Option<&Term> {
        match &self.term {
            Term::Compound { functor, args } if functor == ":-" && args.len() == 2 => {
                Some(&args[1])
            }
            _ => None,
        }
    }

    pub fn is_fact(&self) -> bool {
        self.body().is_none()
    }

    /// Signature of the predicate this clause defines.
    pub fn signature(&self) -> Signature {
        self.head().signature()
    }

    pub fn free_vars(&self) -> Vec<String> {
        self.term.free_vars()
    }

    /// Instantiate the clause. Substituting for variables cannot turn a
    /// legal head or body into an illegal one except by binding a body
    /// variable to a non-callable term, which the engine reports when run.
    pub fn apply_subst(&self, s: &Substitution) -> DatabaseFormula {
        DatabaseFormula {
            term: s.apply(&self.term),
            source: self.source.clone(),
        }
    }
}

impl fmt::Display for DatabaseFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.term.fmt(f)
    }
}

/// A goal that may be asked of a database.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    term: Term,
    source: SourceInfo,
}

impl Query {
    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    pub fn into_term(self) -> Term {
        self.term
    }

    pub fn signature(&self) -> Signature {
        self.term.signature()
    }

    pub fn free_vars(&self) -> Vec<String> {
        self.term.free_vars()
    }

    pub fn apply_subst(&self, s: &Substitution) -> Query {
        Query {
            term: s.apply(&self.term),
            source: self.source.clone(),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.term.fmt(f)
    }
}

/// A conjunction of literals to add and `not(Literal)`s to remove, split
/// once into the two lists in their written order.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    term: Term,
    source: SourceInfo,
    add_list: Vec<DatabaseFormula>,
    delete_list: Vec<DatabaseFormula>,
}

impl Update {
    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    pub fn add_list(&self) -> &[DatabaseFormula] {
        &self.add_list
    }

    pub fn delete_list(&self) -> &[DatabaseFormula] {
        &self.delete_list
    }

    pub fn is_empty(&self) -> bool {
        self.add_list.is_empty() && self.delete_list.is_empty()
    }

    pub fn signature(&self) -> Signature {
        self.term.signature()
    }

    pub fn free_vars(&self) -> Vec<String> {
        self.term.free_vars()
    }

    pub fn apply_subst(&self, s: &Substitution) -> Update {
        Update {
            term: s.apply(&self.term),
            source: self.source.clone(),
            add_list: self.add_list.iter().map(|f| f.apply_subst(s)).collect(),
            delete_list: self.delete_list.iter().map(|f| f.apply_subst(s)).collect(),
        }
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.term.fmt(f)
    }
}

/// Classify `term` as a storable clause.
///
/// `Head :- Body` requires a predication head that is not built in and a
/// legal goal as body; any other term is itself the head of a fact.
/// Directives (`:- G`, `?- G`) are rejected.
pub fn to_database_formula(term: Term, source: SourceInfo) -> Result<DatabaseFormula, SemanticError> {
    match &term {
        Term::Compound { functor, args } if functor == ":-" && args.len() == 2 => {
            check_head(&args[0])?;
            to_goal(&args[1])?;
        }
        Term::Compound { functor, args }
            if (functor == ":-" || functor == "?-") && args.len() == 1 =>
        {
            return Err(SemanticError::Directive(term.to_string()));
        }
        head => check_head(head)?,
    }
    Ok(DatabaseFormula { term, source })
}

/// Check that `term` may be called. Control constructs are taken apart and
/// their branches checked; any other callable term is accepted unchanged.
pub fn to_goal(term: &Term) -> Result<(), SemanticError> {
    match term {
        Term::Variable(_) | Term::Integer(_) | Term::Float(_) => {
            Err(SemanticError::IllegalGoal(term.to_string()))
        }
        Term::Compound { functor, args } if args.len() == 2 => match functor.as_str() {
            ":-" => Err(SemanticError::ClauseAsGoal(term.to_string())),
            "," | ";" | "->" | "*->" => {
                to_goal(&args[0])?;
                to_goal(&args[1])
            }
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Classify `term` as a query.
pub fn to_query(term: Term, source: SourceInfo) -> Result<Query, SemanticError> {
    to_goal(&term)?;
    Ok(Query { term, source })
}

/// Classify `term` as an update: every top-level conjunct is either a
/// literal to add, `not(Literal)` to delete, or `true`, which is skipped.
pub fn to_update(term: Term, source: SourceInfo) -> Result<Update, SemanticError> {
    let mut add_list = Vec::new();
    let mut delete_list = Vec::new();
    for conjunct in term.conjuncts() {
        if conjunct.is("true", 0) {
            continue;
        }
        if conjunct.is("not", 1) {
            let literal = &conjunct.args()[0];
            if literal.is("not", 1) || literal.is("\\+", 1) {
                return Err(SemanticError::NestedNegation(literal.to_string()));
            }
            check_update_literal(literal)?;
            delete_list.push(DatabaseFormula {
                term: literal.clone(),
                source: source.clone(),
            });
        } else {
            check_update_literal(conjunct)?;
            add_list.push(DatabaseFormula {
                term: conjunct.clone(),
                source: source.clone(),
            });
        }
    }
    Ok(Update {
        term,
        source,
        add_list,
        delete_list,
    })
}

/// Literals of an update are stored or removed as facts, so anything that
/// is not a plain user predication (disjunctions, implications, clauses,
/// comparisons) is refused.
fn check_update_literal(literal: &Term) -> Result<(), SemanticError> {
    if literal.is_callable() && ops::prolog_builtin(&literal.signature()) {
        return Err(SemanticError::IllegalUpdate(literal.to_string()));
    }
    check_head(literal)
}

fn check_head(head: &Term) -> Result<(), SemanticError> {
    match head {
        Term::Variable(name) => Err(SemanticError::VariableHead(name.clone())),
        Term::Integer(_) | Term::Float(_) => Err(SemanticError::NotPredication(head.to_string())),
        Term::Atom(_) | Term::Compound { .. } => {
            let signature = head.signature();
            if !is_predication(&signature) {
                return Err(SemanticError::NotPredication(head.to_string()));
            }
            if ops::prolog_builtin(&signature) {
                return Err(SemanticError::ProtectedPredicate(signature));
            }
            Ok(())
        }
    }
}

/// A predicate name is an unquoted identifier that is not a control
/// construct, so symbolic names, quoted names with layout, list cells and
/// the bracket atoms name no predicate.
fn is_predication(signature: &Signature) -> bool {
    lexer::is_identifier(&signature.name) && !ops::is_control_construct(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str, args: Vec<Term>) -> Term {
        Term::compound(name, args)
    }

    fn formula(term: Term) -> Result<DatabaseFormula, SemanticError> {
        to_database_formula(term, SourceInfo::new())
    }

    #[test]
    fn test_fact_and_rule() {
        let fact = formula(p("parent", vec![Term::atom("tom"), Term::atom("bob")])).unwrap();
        assert!(fact.is_fact());
        assert_eq!(fact.signature(), Signature::new("parent", 2));

        let rule = formula(p(
            ":-",
            vec![
                p("grandparent", vec![Term::var("X"), Term::var("Z")]),
                p(
                    ",",
                    vec![
                        p("parent", vec![Term::var("X"), Term::var("Y")]),
                        p("parent", vec![Term::var("Y"), Term::var("Z")]),
                    ],
                ),
            ],
        ))
        .unwrap();
        assert!(!rule.is_fact());
        assert_eq!(rule.signature(), Signature::new("grandparent", 2));
        assert_eq!(rule.free_vars(), vec!["X", "Z", "Y"]);
    }

    #[test]
    fn test_illegal_heads() {
        assert!(matches!(
            formula(p(":-", vec![Term::var("X"), Term::atom("true")])),
            Err(SemanticError::VariableHead(_))
        ));
        assert!(matches!(formula(Term::int(3)), Err(SemanticError::NotPredication(_))));
        assert!(matches!(
            formula(p(";", vec![Term::atom("a"), Term::atom("b")])),
            Err(SemanticError::NotPredication(_))
        ));
        assert!(matches!(
            formula(p("is", vec![Term::var("X"), Term::int(1)])),
            Err(SemanticError::ProtectedPredicate(_))
        ));
        assert!(matches!(
            formula(p(":-", vec![p("dynamic", vec![Term::atom("foo")])])),
            Err(SemanticError::Directive(_))
        ));
    }

    #[test]
    fn test_head_name_must_be_an_identifier() {
        for head in [
            p("hello world", vec![Term::atom("x")]),
            p("+", vec![Term::atom("a"), Term::atom("b")]),
            Term::atom("1"),
            Term::atom("Foo"),
            Term::atom("[]"),
        ] {
            assert!(
                matches!(formula(head.clone()), Err(SemanticError::NotPredication(_))),
                "{head} accepted as a head"
            );
        }
        assert!(formula(p("hello_world2", vec![Term::atom("x")])).is_ok());
        assert!(formula(p(":-", vec![p("+", vec![Term::atom("a")]), Term::atom("true")])).is_err());
    }

    #[test]
    fn test_illegal_bodies() {
        let rule = |body| formula(p(":-", vec![Term::atom("h"), body]));
        assert!(matches!(rule(Term::var("G")), Err(SemanticError::IllegalGoal(_))));
        assert!(matches!(
            rule(p(",", vec![Term::atom("a"), Term::int(1)])),
            Err(SemanticError::IllegalGoal(_))
        ));
        assert!(matches!(
            rule(p(";", vec![Term::atom("a"), p(":-", vec![Term::atom("b"), Term::atom("c")])])),
            Err(SemanticError::ClauseAsGoal(_))
        ));
        // calls through call/1 are left for the engine
        assert!(rule(p("call", vec![Term::var("G")])).is_ok());
    }

    #[test]
    fn test_query() {
        assert!(to_query(Term::atom("true"), SourceInfo::new()).is_ok());
        assert!(to_query(p("->", vec![Term::atom("a"), Term::atom("b")]), SourceInfo::new()).is_ok());
        assert!(matches!(
            to_query(Term::float(1.5), SourceInfo::new()),
            Err(SemanticError::IllegalGoal(_))
        ));
    }

    #[test]
    fn test_update_splits_in_order() {
        let term = Term::conjunction(vec![
            Term::atom("p"),
            p("not", vec![Term::atom("q")]),
            Term::atom("true"),
            Term::atom("r"),
        ]);
        let update = to_update(term, SourceInfo::new()).unwrap();
        let adds: Vec<_> = update.add_list().iter().map(|f| f.term().clone()).collect();
        let deletes: Vec<_> = update.delete_list().iter().map(|f| f.term().clone()).collect();
        assert_eq!(adds, vec![Term::atom("p"), Term::atom("r")]);
        assert_eq!(deletes, vec![Term::atom("q")]);
    }

    #[test]
    fn test_illegal_updates() {
        let update = |term| to_update(term, SourceInfo::new());
        assert!(matches!(
            update(p(";", vec![Term::atom("p"), Term::atom("q")])),
            Err(SemanticError::IllegalUpdate(_))
        ));
        assert!(matches!(
            update(p(",", vec![Term::atom("p"), p("=", vec![Term::var("X"), Term::atom("a")])])),
            Err(SemanticError::IllegalUpdate(_))
        ));
        assert!(matches!(
            update(p("not", vec![p("not", vec![Term::atom("q")])])),
            Err(SemanticError::NestedNegation(_))
        ));
        assert!(matches!(update(Term::var("X")), Err(SemanticError::VariableHead(_))));
    }

    #[test]
    fn test_apply_subst_reaches_both_lists() {
        let term = p(",", vec![p("p", vec![Term::var("X")]), p("not", vec![p("q", vec![Term::var("X")])])]);
        let update = to_update(term, SourceInfo::new()).unwrap();
        let mut s = Substitution::new();
        s.add_binding("X", Term::atom("a")).unwrap();
        let ground = update.apply_subst(&s);
        assert_eq!(ground.add_list()[0].term(), &p("p", vec![Term::atom("a")]));
        assert_eq!(ground.delete_list()[0].term(), &p("q", vec![Term::atom("a")]));
        assert!(ground.free_vars().is_empty());
    }
}
