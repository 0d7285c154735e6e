//! Term representation for Prolog.
//!
//! A [`Term`] is an immutable value tree: atoms, variables, numbers and
//! compounds. Lists are ordinary compounds, `'.'(Head, Tail)` ending in the
//! atom `[]`.

use std::fmt;

/// Name of the list constructor.
pub const CONS: &str = ".";
/// Name of the empty list.
pub const NIL: &str = "[]";
/// Name of the anonymous variable.
pub const ANONYMOUS: &str = "_";

/// A Prolog term.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Atom (symbol), a compound of arity 0
    Atom(String),
    /// Variable; two variables are the same variable iff their names match
    Variable(String),
    /// Integer literal
    Integer(i64),
    /// Float literal
    Float(f64),
    /// Compound term: functor(arg1, arg2, ...). Build it with
    /// [`Term::compound`], which turns an empty argument list into an atom;
    /// a compound built here with no arguments is still written as an atom.
    Compound { functor: String, args: Vec<Term> },
}

impl Term {
    /// Create a compound term. An empty argument list yields an atom, so a
    /// compound always has arity of at least one.
    pub fn compound(functor: impl Into<String>, args: Vec<Term>) -> Self {
        if args.is_empty() {
            Term::Atom(functor.into())
        } else {
            Term::Compound {
                functor: functor.into(),
                args,
            }
        }
    }

    /// Create an atom term.
    pub fn atom(name: impl Into<String>) -> Self {
        Term::Atom(name.into())
    }

    /// Create a variable term.
    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    /// Create an integer term.
    pub fn int(n: i64) -> Self {
        Term::Integer(n)
    }

    /// Create a float term.
    pub fn float(x: f64) -> Self {
        Term::Float(x)
    }

    /// The empty list `[]`.
    pub fn nil() -> Self {
        Term::Atom(NIL.to_string())
    }

    /// A list cell `'.'(head, tail)`.
    pub fn cons(head: Term, tail: Term) -> Self {
        Term::Compound {
            functor: CONS.to_string(),
            args: vec![head, tail],
        }
    }

    /// Create a list from a vector of terms.
    pub fn list(terms: Vec<Term>) -> Self {
        Self::list_with_tail(terms, Term::nil())
    }

    /// Create a list with a tail: [h1, h2 | tail]
    pub fn list_with_tail(heads: Vec<Term>, tail: Term) -> Self {
        let mut result = tail;
        for term in heads.into_iter().rev() {
            result = Term::cons(term, result);
        }
        result
    }

    /// Right-nested conjunction `(t1, (t2, (t3, ...)))`; `true` when empty.
    pub fn conjunction(terms: Vec<Term>) -> Self {
        let mut iter = terms.into_iter().rev();
        let Some(last) = iter.next() else {
            return Term::atom("true");
        };
        iter.fold(last, |acc, term| Term::compound(",", vec![term, acc]))
    }

    /// Returns true if this term is a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Returns true if this term is the anonymous variable `_`.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Term::Variable(name) if name == ANONYMOUS)
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Term::Atom(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Term::Integer(_) | Term::Float(_))
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Term::Compound { .. })
    }

    /// Atoms and compounds: the terms that can be called as goals.
    pub fn is_callable(&self) -> bool {
        matches!(self, Term::Atom(_) | Term::Compound { .. })
    }

    /// Returns true if this term is ground (no variables).
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Integer(_) | Term::Float(_) | Term::Atom(_) => true,
            Term::Variable(_) => false,
            Term::Compound { args, .. } => args.iter().all(|a| a.is_ground()),
        }
    }

    /// Returns true if this is `[]`.
    pub fn is_nil(&self) -> bool {
        matches!(self, Term::Atom(name) if name == NIL)
    }

    /// Returns true if this is the atom or compound `name/arity`.
    pub fn is(&self, name: &str, arity: usize) -> bool {
        match self {
            Term::Atom(n) => arity == 0 && n == name,
            Term::Compound { functor, args } => args.len() == arity && functor == name,
            _ => false,
        }
    }

    /// Functor name of an atom or compound.
    pub fn name(&self) -> Option<&str> {
        match self {
            Term::Atom(name) => Some(name),
            Term::Compound { functor, .. } => Some(functor),
            _ => None,
        }
    }

    /// Arguments of a compound; empty for every other term.
    pub fn args(&self) -> &[Term] {
        match self {
            Term::Compound { args, .. } => args,
            _ => &[],
        }
    }

    pub fn arity(&self) -> usize {
        self.args().len()
    }

    /// `name/arity`. Numbers use their value as name and variables their
    /// own name, both with arity 0.
    pub fn signature(&self) -> Signature {
        match self {
            Term::Atom(name) | Term::Variable(name) => Signature::new(name.clone(), 0),
            Term::Integer(n) => Signature::new(n.to_string(), 0),
            Term::Float(x) => Signature::new(format!("{x:?}"), 0),
            Term::Compound { functor, args } => Signature::new(functor.clone(), args.len()),
        }
    }

    /// Collect all variable names in this term, in order of first
    /// occurrence. The anonymous variable is not included.
    pub fn free_vars(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<String>) {
        match self {
            Term::Variable(name) => {
                if name != ANONYMOUS && !vars.contains(name) {
                    vars.push(name.clone());
                }
            }
            Term::Compound { args, .. } => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
            _ => {}
        }
    }

    /// Returns true if the variable `name` occurs in this term.
    pub fn contains_var(&self, name: &str) -> bool {
        match self {
            Term::Variable(v) => v == name,
            Term::Compound { args, .. } => args.iter().any(|a| a.contains_var(name)),
            _ => false,
        }
    }

    /// Elements and tail of a list-shaped term. A proper list has tail `[]`;
    /// any other term is returned as a list with no elements and itself as tail.
    pub fn as_list(&self) -> (Vec<&Term>, &Term) {
        let mut elements = Vec::new();
        let mut current = self;
        while let Term::Compound { functor, args } = current {
            if functor != CONS || args.len() != 2 {
                break;
            }
            elements.push(&args[0]);
            current = &args[1];
        }
        (elements, current)
    }

    /// Flatten a right- or left-nested `,`/2 tree into its conjuncts.
    pub fn conjuncts(&self) -> Vec<&Term> {
        let mut out = Vec::new();
        self.collect_conjuncts(&mut out);
        out
    }

    fn collect_conjuncts<'a>(&'a self, out: &mut Vec<&'a Term>) {
        let mut current = self;
        while let Term::Compound { functor, args } = current {
            if functor != "," || args.len() != 2 {
                break;
            }
            args[0].collect_conjuncts(out);
            current = &args[1];
        }
        out.push(current);
    }
}

/// Predicate identifier (name/arity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    pub name: String,
    pub arity: usize,
}

impl Signature {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_without_args_is_atom() {
        assert_eq!(Term::compound("foo", vec![]), Term::atom("foo"));
        assert!(Term::compound("foo", vec![Term::int(1)]).is_compound());
    }

    #[test]
    fn test_signature() {
        let t = Term::compound("parent", vec![Term::atom("tom"), Term::var("X")]);
        assert_eq!(t.signature().to_string(), "parent/2");
        assert_eq!(Term::atom("foo").signature().to_string(), "foo/0");
        assert_eq!(Term::int(42).signature().to_string(), "42/0");
        assert_eq!(Term::float(1.0).signature().to_string(), "1.0/0");
        assert_ne!(Term::float(1.0).signature(), Term::int(1).signature());
    }

    #[test]
    fn test_variables_compare_by_name() {
        assert_eq!(Term::var("X"), Term::var("X"));
        assert_ne!(Term::var("X"), Term::var("Y"));
    }

    #[test]
    fn test_free_vars_in_first_occurrence_order() {
        let t = Term::compound(
            "f",
            vec![
                Term::var("Y"),
                Term::compound("g", vec![Term::var("X"), Term::var("Y")]),
                Term::var("_"),
            ],
        );
        assert_eq!(t.free_vars(), vec!["Y".to_string(), "X".to_string()]);
        assert!(!t.is_ground());
        assert!(t.contains_var("X"));
        assert!(!t.contains_var("Z"));
    }

    #[test]
    fn test_list_construction() {
        let list = Term::list(vec![Term::int(1), Term::int(2)]);
        assert_eq!(
            list,
            Term::cons(Term::int(1), Term::cons(Term::int(2), Term::nil()))
        );
        let (elements, tail) = list.as_list();
        assert_eq!(elements.len(), 2);
        assert!(tail.is_nil());

        let open = Term::list_with_tail(vec![Term::atom("a")], Term::var("T"));
        let (elements, tail) = open.as_list();
        assert_eq!(elements, vec![&Term::atom("a")]);
        assert_eq!(tail, &Term::var("T"));
    }

    #[test]
    fn test_conjunction_round_trip() {
        let parts = vec![Term::atom("p"), Term::atom("q"), Term::atom("r")];
        let conj = Term::conjunction(parts.clone());
        assert_eq!(
            conj,
            Term::compound(
                ",",
                vec![
                    Term::atom("p"),
                    Term::compound(",", vec![Term::atom("q"), Term::atom("r")])
                ]
            )
        );
        let split: Vec<Term> = conj.conjuncts().into_iter().cloned().collect();
        assert_eq!(split, parts);
        assert_eq!(Term::conjunction(vec![]), Term::atom("true"));
    }

    #[test]
    fn test_is() {
        let t = Term::compound("not", vec![Term::atom("q")]);
        assert!(t.is("not", 1));
        assert!(!t.is("not", 2));
        assert!(Term::atom("true").is("true", 0));
        assert!(!Term::var("true").is("true", 0));
    }
}
