//! Operator table and built-in predicate registry.
//!
//! Both tables are built once on first use and are read-only afterwards, so
//! any number of parsers can consult them from any thread.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use crate::ast::Signature;

/// The highest operator priority.
pub const MAX_PRIORITY: u16 = 1200;

/// Priority at which arguments and list elements are read, so that `,`
/// separates them instead of acting as an operator.
pub const ARG_PRIORITY: u16 = 999;

/// Operator class: prefix, infix or postfix, and how it associates.
///
/// `x` marks an argument of strictly lower priority, `y` one of lower or
/// equal priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Fx,
    Fy,
    Xf,
    Xfx,
    Xfy,
    Yfx,
    NotOperator,
}

impl Fixity {
    pub fn is_prefix(self) -> bool {
        matches!(self, Fixity::Fx | Fixity::Fy)
    }

    pub fn is_infix(self) -> bool {
        matches!(self, Fixity::Xfx | Fixity::Xfy | Fixity::Yfx)
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, Fixity::Xf)
    }

    /// Arity of terms written with this operator.
    pub fn arity(self) -> usize {
        match self {
            Fixity::Fx | Fixity::Fy | Fixity::Xf => 1,
            Fixity::Xfx | Fixity::Xfy | Fixity::Yfx => 2,
            Fixity::NotOperator => 0,
        }
    }
}

impl fmt::Display for Fixity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Fixity::Fx => "fx",
            Fixity::Fy => "fy",
            Fixity::Xf => "xf",
            Fixity::Xfx => "xfx",
            Fixity::Xfy => "xfy",
            Fixity::Yfx => "yfx",
            Fixity::NotOperator => "not an operator",
        };
        f.write_str(s)
    }
}

/// One operator definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpDef {
    pub priority: u16,
    pub fixity: Fixity,
}

impl OpDef {
    /// Maximum priority of the left argument of an infix or postfix operator.
    pub fn left_max(&self) -> u16 {
        match self.fixity {
            Fixity::Yfx => self.priority,
            _ => self.priority.saturating_sub(1),
        }
    }

    /// Maximum priority of the right argument of an infix or prefix operator.
    pub fn right_max(&self) -> u16 {
        match self.fixity {
            Fixity::Xfy | Fixity::Fy => self.priority,
            _ => self.priority.saturating_sub(1),
        }
    }
}

/// Definitions of a single name in each operator position.
#[derive(Debug, Clone, Copy, Default)]
struct OpEntry {
    prefix: Option<OpDef>,
    infix: Option<OpDef>,
    postfix: Option<OpDef>,
}

const OPERATORS: &[(u16, Fixity, &[&str])] = &[
    (1200, Fixity::Xfx, &[":-", "-->"]),
    (1200, Fixity::Fx, &[":-", "?-"]),
    (1100, Fixity::Xfy, &[";"]),
    (1050, Fixity::Xfy, &["->", "*->"]),
    (1000, Fixity::Xfy, &[","]),
    (990, Fixity::Xfx, &[":="]),
    (900, Fixity::Fy, &["\\+"]),
    (
        1150,
        Fixity::Fx,
        &[
            "dynamic",
            "discontiguous",
            "initialization",
            "meta_predicate",
            "module_transparent",
            "multifile",
            "public",
            "thread_local",
            "table",
        ],
    ),
    (
        700,
        Fixity::Xfx,
        &[
            "=", "\\=", "==", "\\==", "@<", "@>", "@=<", "@>=", "=..", "is", "=:=", "=\\=", "<",
            ">", "=<", ">=", ">:<", ":<", "as",
        ],
    ),
    (600, Fixity::Xfy, &[":"]),
    (500, Fixity::Yfx, &["+", "-", "/\\", "\\/", "xor"]),
    (
        400,
        Fixity::Yfx,
        &["*", "/", "//", "rem", "mod", "div", "<<", ">>", "divmod", "rdiv"],
    ),
    (200, Fixity::Xfx, &["**"]),
    (200, Fixity::Xfy, &["^"]),
    (200, Fixity::Fy, &["-", "+", "\\"]),
    (1, Fixity::Fx, &["$"]),
];

static OPERATOR_TABLE: LazyLock<HashMap<&'static str, OpEntry>> = LazyLock::new(|| {
    let mut table: HashMap<&'static str, OpEntry> = HashMap::new();
    for &(priority, fixity, names) in OPERATORS {
        let def = OpDef { priority, fixity };
        for &name in names {
            let entry = table.entry(name).or_default();
            if fixity.is_prefix() {
                entry.prefix = Some(def);
            } else if fixity.is_infix() {
                entry.infix = Some(def);
            } else {
                entry.postfix = Some(def);
            }
        }
    }
    table
});

/// Prefix definition of `name`, if any.
pub fn prefix_op(name: &str) -> Option<OpDef> {
    OPERATOR_TABLE.get(name).and_then(|e| e.prefix)
}

/// Infix definition of `name`, if any.
pub fn infix_op(name: &str) -> Option<OpDef> {
    OPERATOR_TABLE.get(name).and_then(|e| e.infix)
}

/// Postfix definition of `name`, if any.
pub fn postfix_op(name: &str) -> Option<OpDef> {
    OPERATOR_TABLE.get(name).and_then(|e| e.postfix)
}

/// Returns true if `name` is an operator in any position.
pub fn is_op(name: &str) -> bool {
    OPERATOR_TABLE.contains_key(name)
}

/// Number of distinct operator names in the table.
pub fn operator_count() -> usize {
    OPERATOR_TABLE.len()
}

/// Operator definition for a signature: `name/2` looks up the infix
/// definition, `name/1` the prefix one and then the postfix one.
pub fn lookup(signature: &Signature) -> Option<OpDef> {
    let entry = OPERATOR_TABLE.get(signature.name.as_str())?;
    match signature.arity {
        1 => entry.prefix.or(entry.postfix),
        2 => entry.infix,
        _ => None,
    }
}

pub fn lookup_priority(signature: &Signature) -> Option<u16> {
    lookup(signature).map(|def| def.priority)
}

pub fn lookup_fixity(signature: &Signature) -> Option<Fixity> {
    lookup(signature).map(|def| def.fixity)
}

/// Control constructs: these can never be defined by a clause and are
/// taken apart by the goal validator rather than called.
const CONTROL_CONSTRUCTS: &[(&str, usize)] = &[
    (",", 2),
    (";", 2),
    ("|", 2),
    ("->", 2),
    ("*->", 2),
    ("\\+", 1),
    (":-", 1),
    (":-", 2),
    ("?-", 1),
    ("!", 0),
    ("call", 1),
    ("true", 0),
    ("fail", 0),
    ("false", 0),
];

const BUILTINS: &[(&str, usize)] = &[
    // control
    ("not", 1),
    ("call", 2),
    ("call", 3),
    ("call", 4),
    ("call", 5),
    ("call", 6),
    ("call", 7),
    ("call", 8),
    ("catch", 3),
    ("throw", 1),
    ("forall", 2),
    ("findall", 3),
    ("findall", 4),
    ("bagof", 3),
    ("setof", 3),
    ("aggregate_all", 3),
    ("once", 1),
    ("ignore", 1),
    ("halt", 0),
    ("halt", 1),
    // unification and comparison
    ("=", 2),
    ("\\=", 2),
    ("==", 2),
    ("\\==", 2),
    ("@<", 2),
    ("@>", 2),
    ("@=<", 2),
    ("@>=", 2),
    ("compare", 3),
    ("unify_with_occurs_check", 2),
    // arithmetic
    ("is", 2),
    ("=:=", 2),
    ("=\\=", 2),
    ("<", 2),
    (">", 2),
    ("=<", 2),
    (">=", 2),
    ("succ", 2),
    ("plus", 3),
    // type checking
    ("var", 1),
    ("nonvar", 1),
    ("atom", 1),
    ("number", 1),
    ("integer", 1),
    ("float", 1),
    ("atomic", 1),
    ("compound", 1),
    ("callable", 1),
    ("is_list", 1),
    ("ground", 1),
    ("string", 1),
    // term construction
    ("functor", 3),
    ("arg", 3),
    ("=..", 2),
    ("copy_term", 2),
    ("term_variables", 2),
    // atoms and strings
    ("atom_codes", 2),
    ("atom_chars", 2),
    ("char_code", 2),
    ("atom_length", 2),
    ("atom_concat", 3),
    ("sub_atom", 5),
    ("number_codes", 2),
    ("atom_number", 2),
    ("atom_string", 2),
    ("term_to_atom", 2),
    // database
    ("assert", 1),
    ("asserta", 1),
    ("assertz", 1),
    ("retract", 1),
    ("retractall", 1),
    ("abolish", 1),
    ("clause", 2),
    // lists
    ("length", 2),
    ("msort", 2),
    ("sort", 2),
    ("sort", 4),
    ("predsort", 3),
    ("keysort", 2),
    // output
    ("write", 1),
    ("writeln", 1),
    ("print", 1),
    ("write_canonical", 1),
    ("writeq", 1),
    ("nl", 0),
    ("format", 1),
    ("format", 2),
    // directives
    ("dynamic", 1),
    ("discontiguous", 1),
    ("multifile", 1),
    ("initialization", 1),
    ("module", 2),
    ("use_module", 1),
    ("use_module", 2),
    ("ensure_loaded", 1),
    ("op", 3),
];

static PROTECTED: LazyLock<HashSet<(&'static str, usize)>> = LazyLock::new(|| {
    CONTROL_CONSTRUCTS
        .iter()
        .chain(BUILTINS.iter())
        .copied()
        .collect()
});

fn contains<'a>(table: &HashSet<(&'a str, usize)>, signature: &'a Signature) -> bool {
    table.contains(&(signature.name.as_str(), signature.arity))
}

/// Returns true if `signature` names a built-in predicate or control
/// construct, which user clauses may not redefine.
pub fn prolog_builtin(signature: &Signature) -> bool {
    contains(&PROTECTED, signature)
}

/// Returns true if `signature` names a control construct (`,`, `;`, `->`,
/// `:-`, ...).
pub fn is_control_construct(signature: &Signature) -> bool {
    CONTROL_CONSTRUCTS
        .iter()
        .any(|&(name, arity)| arity == signature.arity && name == signature.name)
}
