//! Writing terms back as Prolog text.
//!
//! Operator compounds are written in operator notation with only the
//! parentheses the operator table requires, lists in bracket notation and
//! atoms quoted only where reading them back would otherwise change them.

use std::borrow::Cow;
use std::fmt;

use crate::ast::{Term, CONS};
use crate::lexer::{is_identifier, is_symbol_char};
use crate::ops::{self, ARG_PRIORITY, MAX_PRIORITY};

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(f, self, MAX_PRIORITY)
    }
}

/// `name`, quoted and escaped if it would not read back as the same atom.
pub fn atom_text(name: &str) -> Cow<'_, str> {
    if needs_quotes(name) {
        Cow::Owned(quote(name))
    } else {
        Cow::Borrowed(name)
    }
}

fn needs_quotes(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    match name {
        "[]" | "{}" | "!" | ";" => return false,
        "," | "|" | "." => return true,
        _ => {}
    }
    if first.is_lowercase() {
        return !is_identifier(name);
    }
    if name.chars().all(is_symbol_char) {
        return name.contains("/*");
    }
    true
}

fn quote(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('\'');
    for c in name.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    let text = format!("{x:?}");
    // The reader wants a fraction before any exponent: 1e20 -> 1.0e20
    match text.find('e') {
        Some(at) if !text[..at].contains('.') => {
            write!(f, "{}.0{}", &text[..at], &text[at..])
        }
        _ => f.write_str(&text),
    }
}

fn write_term(f: &mut fmt::Formatter<'_>, term: &Term, max: u16) -> fmt::Result {
    match term {
        Term::Variable(name) => f.write_str(name),
        Term::Integer(n) => write!(f, "{n}"),
        Term::Float(x) => write_float(f, *x),
        Term::Atom(name) => f.write_str(&atom_text(name)),
        // built directly rather than through Term::compound
        Term::Compound { functor, args } if args.is_empty() => f.write_str(&atom_text(functor)),
        Term::Compound { functor, args } => write_compound(f, term, functor, args, max),
    }
}

/// Operands of an operator; operator atoms are bracketed so they are not
/// read as operators themselves.
fn write_operand(f: &mut fmt::Formatter<'_>, term: &Term, max: u16) -> fmt::Result {
    match term {
        Term::Atom(name) if ops::is_op(name) => write!(f, "({})", atom_text(name)),
        Term::Compound { functor, args } if args.is_empty() && ops::is_op(functor) => {
            write!(f, "({})", atom_text(functor))
        }
        _ => write_term(f, term, max),
    }
}

fn write_compound(
    f: &mut fmt::Formatter<'_>,
    term: &Term,
    functor: &str,
    args: &[Term],
    max: u16,
) -> fmt::Result {
    match args {
        [_, _] if functor == CONS => return write_list(f, term),
        [inner] if functor == "{}" => {
            f.write_str("{")?;
            write_term(f, inner, MAX_PRIORITY)?;
            return f.write_str("}");
        }
        [left, right] => {
            if let Some(op) = ops::infix_op(functor) {
                let bracket = op.priority > max;
                if bracket {
                    f.write_str("(")?;
                }
                write_operand(f, left, op.left_max())?;
                if functor == "," {
                    f.write_str(", ")?;
                } else {
                    write!(f, " {} ", atom_text(functor))?;
                }
                write_operand(f, right, op.right_max())?;
                if bracket {
                    f.write_str(")")?;
                }
                return Ok(());
            }
        }
        [arg] => {
            if let Some(op) = ops::prefix_op(functor) {
                let bracket = op.priority > max;
                if bracket {
                    f.write_str("(")?;
                }
                write!(f, "{} ", atom_text(functor))?;
                write_operand(f, arg, op.right_max())?;
                if bracket {
                    f.write_str(")")?;
                }
                return Ok(());
            }
            if let Some(op) = ops::postfix_op(functor) {
                let bracket = op.priority > max;
                if bracket {
                    f.write_str("(")?;
                }
                write_operand(f, arg, op.left_max())?;
                write!(f, " {}", atom_text(functor))?;
                if bracket {
                    f.write_str(")")?;
                }
                return Ok(());
            }
        }
        _ => {}
    }

    f.write_str(&atom_text(functor))?;
    f.write_str("(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_term(f, arg, ARG_PRIORITY)?;
    }
    f.write_str(")")
}

fn write_list(f: &mut fmt::Formatter<'_>, term: &Term) -> fmt::Result {
    let (elements, tail) = term.as_list();
    f.write_str("[")?;
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_term(f, element, ARG_PRIORITY)?;
    }
    if !tail.is_nil() {
        f.write_str("|")?;
        write_term(f, tail, ARG_PRIORITY)?;
    }
    f.write_str("]")
}
