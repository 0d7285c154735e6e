//! Syntactic unification with occurs check.

use crate::ast::{Term, ANONYMOUS};
use crate::subst::Substitution;

/// Most general unifier of `x` and `y`, or `None` if they do not unify.
///
/// The result is fully resolved: no bound variable appears in any bound
/// term, so applying it is idempotent.
pub fn mgu(x: &Term, y: &Term) -> Option<Substitution> {
    extend(x, y, Substitution::new()).map(|s| s.resolved())
}

/// Extend `s` so that it unifies `x` and `y`. Consumes `s` and returns the
/// extension, or `None` on a clash, an occurs-check failure or a cyclic `s`.
pub fn unify(x: &Term, y: &Term, s: Substitution) -> Option<Substitution> {
    if s.is_cyclic() {
        return None;
    }
    extend(x, y, s)
}

/// [`unify`] for a substitution known to be acyclic. Every binding it adds
/// passes the occurs check, so the result is acyclic too.
pub(crate) fn extend(x: &Term, y: &Term, s: Substitution) -> Option<Substitution> {
    match (x, y) {
        _ if x == y => Some(s),
        (Term::Variable(v), _) => unify_var(v, y, s),
        (_, Term::Variable(v)) => unify_var(v, x, s),
        (
            Term::Compound { functor: f, args: xs },
            Term::Compound { functor: g, args: ys },
        ) => {
            if f != g || xs.len() != ys.len() {
                return None;
            }
            xs.iter()
                .zip(ys)
                .try_fold(s, |s, (a, b)| extend(a, b, s))
        }
        _ => None,
    }
}

fn unify_var(var: &str, x: &Term, mut s: Substitution) -> Option<Substitution> {
    // The anonymous variable matches anything and is never bound.
    if var == ANONYMOUS || x.is_anonymous() {
        return Some(s);
    }
    if let Some(bound) = s.get(var).cloned() {
        return extend(&bound, x, s);
    }
    if let Term::Variable(other) = x {
        if let Some(bound) = s.get(other).cloned() {
            return extend(&Term::Variable(var.to_string()), &bound, s);
        }
    }
    if occurs(var, x, &s) {
        return None;
    }
    s.bind(var.to_string(), x.clone());
    Some(s)
}

/// Does `var` occur in `x` once the bindings of `s` are followed?
fn occurs(var: &str, x: &Term, s: &Substitution) -> bool {
    match x {
        Term::Variable(v) if v == var => true,
        Term::Variable(v) => match s.get(v) {
            Some(bound) => occurs(var, bound, s),
            None => false,
        },
        Term::Compound { args, .. } => args.iter().any(|a| occurs(var, a, s)),
        _ => false,
    }
}
