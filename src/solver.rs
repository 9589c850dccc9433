use std::fmt::Display;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use crate::formula::{Cnf, Model};

pub mod brancher;
pub mod dpll;

pub use brancher::{Brancher, FirstUnassigned, MaxOccurrence, RandomOrder};
pub use dpll::{DpllSolver, LoadError};

/// Final answer of a solver run.
///
/// Timing out is a third outcome next to SAT/UNSAT, not an error.
#[derive(Debug)]
pub enum Verdict {
    /// Satisfiable, with a model that satisfies every clause.
    Sat(Model),
    /// No satisfying assignment exists.
    Unsat,
    /// The budget ran out before the search concluded.
    Timeout,
}

impl Verdict {
    pub fn is_sat(&self) -> bool {
        matches!(self, Verdict::Sat(_))
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, Verdict::Unsat)
    }

    pub fn model(&self) -> Option<&Model> {
        match self {
            Verdict::Sat(model) => Some(model),
            _ => None,
        }
    }

    pub fn into_model(self) -> Option<Model> {
        match self {
            Verdict::Sat(model) => Some(model),
            _ => None,
        }
    }
}

/// External cancellation for a potentially unbounded search.
///
/// The solver owns no wall-clock policy of its own; the caller hands it a
/// deadline and/or a shared interrupt flag, and the search loop checks the
/// budget once per decision.
#[derive(Clone, Default)]
pub struct Budget {
    deadline: Option<Instant>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Budget {
    /// A budget that never runs out.
    pub fn unlimited() -> Self {
        Default::default()
    }

    /// Expires `duration` from now.
    pub fn timeout(duration: Duration) -> Self {
        Budget {
            deadline: Instant::now().checked_add(duration),
            interrupt: None,
        }
    }

    /// Expires at the given instant.
    pub fn deadline(deadline: Instant) -> Self {
        Budget {
            deadline: Some(deadline),
            interrupt: None,
        }
    }

    /// Additionally expires once `flag` is set by another thread.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn is_exhausted(&self) -> bool {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        if let Some(flag) = &self.interrupt {
            if flag.load(Ordering::Relaxed) {
                return true;
            }
        }
        false
    }
}

/// Counters accumulated over one search, reported via the log on termination.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchStats {
    pub decisions: u64,
    pub propagations: u64,
    pub conflicts: u64,
}

impl Display for SearchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} decisions, {} propagations, {} conflicts",
            self.decisions, self.propagations, self.conflicts
        )
    }
}

pub trait Solver: Sized {
    /// Creates a new solver instance over a loaded formula.
    fn new(formula: Cnf) -> Result<Self, LoadError>;

    /// Solves a CNF SAT problem with the solver, running until a verdict.
    fn solve(self) -> Verdict {
        self.solve_within(&Budget::unlimited())
    }

    /// Solves until a verdict or until the budget is exhausted.
    fn solve_within(self, budget: &Budget) -> Verdict;
}
