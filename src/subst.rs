//! Substitutions: finite maps from variable names to terms.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::ast::Term;
use crate::unify;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstitutionError {
    #[error("variable {var} is already bound")]
    AlreadyBound { var: String },
}

/// A substitution. Keys are unique; insertion order is kept for display
/// but does not take part in equality.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    bindings: Vec<(String, Term)>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Term bound to `var`, if any.
    pub fn get(&self, var: &str) -> Option<&Term> {
        self.bindings
            .iter()
            .find(|(name, _)| name == var)
            .map(|(_, term)| term)
    }

    pub fn contains(&self, var: &str) -> bool {
        self.get(var).is_some()
    }

    /// Bind `var` to `term`. Fails if `var` is already bound; an existing
    /// binding is never overwritten.
    pub fn add_binding(
        &mut self,
        var: impl Into<String>,
        term: Term,
    ) -> Result<(), SubstitutionError> {
        let var = var.into();
        if self.contains(&var) {
            return Err(SubstitutionError::AlreadyBound { var });
        }
        self.bindings.push((var, term));
        Ok(())
    }

    /// Unbind `var`, returning what it was bound to.
    pub fn remove(&mut self, var: &str) -> Option<Term> {
        let index = self.bindings.iter().position(|(name, _)| name == var)?;
        Some(self.bindings.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.bindings.iter().map(|(name, term)| (name.as_str(), term))
    }

    /// Bound variables in insertion order.
    pub fn vars(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(name, _)| name.as_str())
    }

    /// Replace every bound variable in `term`, following chains of bindings
    /// (`X -> Y`, `Y -> a`) to their end. A variable reached again while it
    /// is being expanded is left in place, so cyclic bindings terminate.
    pub fn apply(&self, term: &Term) -> Term {
        let mut expanding = Vec::new();
        self.apply_inner(term, &mut expanding)
    }

    fn apply_inner<'a>(&'a self, term: &Term, expanding: &mut Vec<&'a str>) -> Term {
        match term {
            Term::Variable(name) => {
                if expanding.contains(&name.as_str()) {
                    return term.clone();
                }
                match self.bindings.iter().find(|(var, _)| var == name) {
                    Some((var, bound)) => {
                        expanding.push(var.as_str());
                        let resolved = self.apply_inner(bound, expanding);
                        expanding.pop();
                        resolved
                    }
                    None => term.clone(),
                }
            }
            Term::Compound { functor, args } => Term::Compound {
                functor: functor.clone(),
                args: args.iter().map(|a| self.apply_inner(a, expanding)).collect(),
            },
            _ => term.clone(),
        }
    }

    /// The same bindings with every bound term fully resolved, so applying
    /// the result once is the same as applying it repeatedly.
    pub fn resolved(&self) -> Substitution {
        Substitution {
            bindings: self
                .bindings
                .iter()
                .map(|(var, term)| (var.clone(), self.apply(term)))
                .collect(),
        }
    }

    /// Remove every binding whose variable is not in `keep`. Returns true if
    /// anything was removed.
    pub fn retain_all(&mut self, keep: &HashSet<String>) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|(var, _)| keep.contains(var));
        self.bindings.len() != before
    }

    /// Does some bound variable reach itself through the bindings, as in
    /// `{X/Y, Y/X}` or `{X/f(X)}`? Unifiers never are.
    pub fn is_cyclic(&self) -> bool {
        let mut finished = HashSet::new();
        self.bindings
            .iter()
            .any(|(var, _)| self.reaches_itself(var, &mut Vec::new(), &mut finished))
    }

    fn reaches_itself<'a>(
        &'a self,
        var: &'a str,
        path: &mut Vec<&'a str>,
        finished: &mut HashSet<&'a str>,
    ) -> bool {
        if path.contains(&var) {
            return true;
        }
        if finished.contains(var) {
            return false;
        }
        let Some(bound) = self.get(var) else {
            return false;
        };
        path.push(var);
        let cyclic = any_var(bound, &mut |next| self.reaches_itself(next, path, finished));
        path.pop();
        finished.insert(var);
        cyclic
    }

    /// Merge `other` into this substitution.
    ///
    /// Terms bound here have `other` applied to them; variables bound only
    /// in `other` are added with the combined result applied; a variable
    /// bound in both has its two terms unified and that unifier merged in.
    /// Returns `None` when the two are inconsistent or this substitution
    /// is cyclic.
    pub fn combine(&self, other: &Substitution) -> Option<Substitution> {
        if self.is_cyclic() {
            return None;
        }
        let mut merged = self.clone();
        for (var, term) in &other.bindings {
            merged = unify::extend(&Term::Variable(var.clone()), term, merged)?;
        }
        Some(merged.resolved())
    }

    pub(crate) fn bind(&mut self, var: String, term: Term) {
        self.bindings.push((var, term));
    }
}

fn any_var<'a, F: FnMut(&'a str) -> bool>(term: &'a Term, f: &mut F) -> bool {
    match term {
        Term::Variable(name) => f(name),
        Term::Compound { args, .. } => args.iter().any(|arg| any_var(arg, f)),
        _ => false,
    }
}

impl PartialEq for Substitution {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .bindings
                .iter()
                .all(|(var, term)| other.get(var) == Some(term))
    }
}

/// `[X/a, Y/f(Z)]`
impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (var, term)) in self.bindings.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{var}/{term}")?;
        }
        f.write_str("]")
    }
}
