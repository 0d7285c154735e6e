//! Write-cache in front of a backing reasoning engine.
//!
//! The engine accepts one mutation per call. A [`Database`] therefore queues
//! inserts and deletes in a [`WriteCache`] and sends them as one conjunction
//! `op1, (op2, ...)` just before the next query, or when flushed explicitly.
//!
//! All databases created from one [`EngineContext`] share its engine. Every
//! flush and query takes the context lock, so no read can observe a
//! half-applied batch from another database.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::ast::Term;
use crate::subst::Substitution;
use crate::validate::{DatabaseFormula, Query, Update};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("engine rejected {goal}: {reason}")]
    Rejected { goal: String, reason: String },
    #[error("batch of {operations} operations failed")]
    BatchFailed { operations: usize },
}

/// The backing engine. Implementations need not be thread safe; the
/// context serialises every call.
pub trait Engine {
    fn assert(&mut self, clause: &Term) -> Result<(), EngineError>;

    fn retract(&mut self, clause: &Term) -> Result<(), EngineError>;

    /// All solutions of `goal`, each as the bindings of its variables.
    fn solve(&mut self, goal: &Term) -> Result<Vec<Substitution>, EngineError>;
}

/// Shared engine plus the counter that names databases.
pub struct EngineContext<E> {
    engine: Mutex<E>,
    next_id: AtomicU64,
}

impl<E: Engine> EngineContext<E> {
    pub fn new(engine: E) -> Arc<Self> {
        Arc::new(Self {
            engine: Mutex::new(engine),
            next_id: AtomicU64::new(0),
        })
    }

    fn fresh_name(&self) -> String {
        format!("db{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        f(&mut self.engine.lock())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Operation {
    Insert(Term),
    Delete(Term),
}

impl Operation {
    fn goal(&self) -> Term {
        match self {
            Operation::Insert(clause) => Term::compound("assertz", vec![clause.clone()]),
            Operation::Delete(clause) => Term::compound("retract", vec![clause.clone()]),
        }
    }
}

/// Pending mutations in the order they were made.
#[derive(Debug, Default)]
pub struct WriteCache {
    pending: Vec<Operation>,
}

impl WriteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_insert(&mut self, clause: Term) {
        trace!(%clause, "queue insert");
        self.pending.push(Operation::Insert(clause));
    }

    pub fn push_delete(&mut self, clause: Term) {
        trace!(%clause, "queue delete");
        self.pending.push(Operation::Delete(clause));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// The pending operations as one goal, `None` when nothing is queued.
    pub fn batch(&self) -> Option<Term> {
        if self.pending.is_empty() {
            return None;
        }
        Some(Term::conjunction(self.pending.iter().map(Operation::goal).collect()))
    }

    /// Send everything queued to `engine`. A single operation goes through
    /// `assert`/`retract`; more are sent as one `solve` of the batch. The
    /// queue is empty afterwards whether or not the engine accepted it.
    pub fn flush_into<E: Engine>(&mut self, engine: &mut E) -> Result<(), EngineError> {
        let pending = std::mem::take(&mut self.pending);
        match pending.as_slice() {
            [] => Ok(()),
            [Operation::Insert(clause)] => engine.assert(clause),
            [Operation::Delete(clause)] => engine.retract(clause),
            operations => {
                let batch = Term::conjunction(operations.iter().map(Operation::goal).collect());
                if engine.solve(&batch)?.is_empty() {
                    return Err(EngineError::BatchFailed {
                        operations: operations.len(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// One named clause store inside a shared engine. Clauses and goals are
/// qualified with the database name, `db0 : p(a)`.
pub struct Database<E: Engine> {
    name: String,
    context: Arc<EngineContext<E>>,
    cache: WriteCache,
}

impl<E: Engine> Database<E> {
    pub fn new(context: Arc<EngineContext<E>>) -> Self {
        let name = context.fresh_name();
        Self {
            name,
            context,
            cache: WriteCache::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of queued operations not yet sent to the engine.
    pub fn pending(&self) -> usize {
        self.cache.len()
    }

    fn qualify(&self, term: &Term) -> Term {
        Term::compound(":", vec![Term::atom(self.name.as_str()), term.clone()])
    }

    pub fn insert(&mut self, formula: &DatabaseFormula) {
        let clause = self.qualify(formula.term());
        self.cache.push_insert(clause);
    }

    pub fn delete(&mut self, formula: &DatabaseFormula) {
        let clause = self.qualify(formula.term());
        self.cache.push_delete(clause);
    }

    /// Apply an update: retract its delete list, then assert its add list.
    pub fn insert_update(&mut self, update: &Update) {
        for formula in update.delete_list() {
            self.delete(formula);
        }
        for formula in update.add_list() {
            self.insert(formula);
        }
    }

    /// Undo an update by swapping the lists: retract the add list and
    /// assert the delete list.
    pub fn delete_update(&mut self, update: &Update) {
        for formula in update.add_list() {
            self.delete(formula);
        }
        for formula in update.delete_list() {
            self.insert(formula);
        }
    }

    /// Send queued operations now.
    pub fn flush(&mut self) -> Result<(), EngineError> {
        let context = Arc::clone(&self.context);
        context.with_engine(|engine| self.flush_locked(engine))
    }

    fn flush_locked(&mut self, engine: &mut E) -> Result<(), EngineError> {
        if self.cache.is_empty() {
            return Ok(());
        }
        debug!(database = %self.name, operations = self.cache.len(), "flushing write cache");
        self.cache.flush_into(engine).inspect_err(|error| {
            warn!(database = %self.name, %error, "engine rejected flush");
        })
    }

    /// Answer `query`, flushing pending writes first under the same lock.
    /// Each answer binds only the variables of the query.
    pub fn query(&mut self, query: &Query) -> Result<Vec<Substitution>, EngineError> {
        let context = Arc::clone(&self.context);
        let goal = self.qualify(query.term());
        let keep: HashSet<String> = query.free_vars().into_iter().collect();
        context.with_engine(|engine| {
            self.flush_locked(engine)?;
            let mut answers = engine.solve(&goal)?;
            for answer in &mut answers {
                answer.retain_all(&keep);
            }
            Ok(answers)
        })
    }
}
