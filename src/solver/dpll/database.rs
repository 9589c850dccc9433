/*!
Immutable clause storage with the two-watched-literal index.

Each clause with at least two literals keeps its watched literals in slots
0 and 1; the watch lists map a literal to the clauses currently watching it.
Input unit clauses are queued separately for level-0 seeding, and an empty
input clause only raises a flag since it makes the formula unsatisfiable
without any search.
*/

use std::fmt::Display;
use std::ops::{Index, IndexMut};

use typed_index_collections::TiVec;

use crate::formula::{Cnf, Literal};
use crate::prelude::*;

/// Index of a clause in the database.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClauseIdx(usize);

impl From<usize> for ClauseIdx {
    fn from(index: usize) -> Self {
        ClauseIdx(index)
    }
}

impl From<ClauseIdx> for usize {
    fn from(index: ClauseIdx) -> Self {
        index.0
    }
}

impl Display for ClauseIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "clause #{}", self.0)
    }
}

#[derive(Debug, Snafu)]
pub enum LoadError {
    #[snafu(display(
        "Clause {} references variable {} outside 1..={}",
        clause,
        variable,
        num_variables
    ))]
    MalformedFormula {
        clause: usize,
        variable: u32,
        num_variables: usize,
    },
    #[snafu(display("Failed to reserve memory for {} clauses", num_clauses))]
    OutOfMemory {
        num_clauses: usize,
        source: std::collections::TryReserveError,
    },
}

/// Watch lists indexed by literal.
#[derive(Debug)]
struct Watch {
    positive: Vec<Vec<ClauseIdx>>,
    negative: Vec<Vec<ClauseIdx>>,
}

impl Watch {
    fn new(num_variables: usize) -> Self {
        Watch {
            positive: vec![Vec::new(); num_variables],
            negative: vec![Vec::new(); num_variables],
        }
    }
}

impl Index<Literal> for Watch {
    type Output = Vec<ClauseIdx>;

    fn index(&self, literal: Literal) -> &Self::Output {
        if literal.positive() {
            &self.positive[literal.variable().index()]
        } else {
            &self.negative[literal.variable().index()]
        }
    }
}

impl IndexMut<Literal> for Watch {
    fn index_mut(&mut self, literal: Literal) -> &mut Self::Output {
        if literal.positive() {
            &mut self.positive[literal.variable().index()]
        } else {
            &mut self.negative[literal.variable().index()]
        }
    }
}

#[derive(Debug)]
pub struct ClauseDb {
    clauses: TiVec<ClauseIdx, Vec<Literal>>,
    watch: Watch,
    /// Input clauses of size one, assigned at level 0 before the search.
    units: Vec<ClauseIdx>,
    has_empty_clause: bool,
    num_variables: usize,
}

impl ClauseDb {
    /// Builds the watch-list index over the formula's clauses.
    /// No clause is ever added or removed afterwards.
    pub fn load(formula: &Cnf) -> Result<Self, LoadError> {
        let num_variables = formula.num_variables();
        let num_clauses = formula.clauses().len();

        let mut store: Vec<Vec<Literal>> = Vec::new();
        store
            .try_reserve(num_clauses)
            .context(OutOfMemory { num_clauses })?;

        let mut watch = Watch::new(num_variables);
        let mut units = Vec::new();
        let mut has_empty_clause = formula.has_empty_clause();

        for (index, clause) in formula.clauses().iter().enumerate() {
            let mut literals = clause.iter().collect::<Vec<_>>();

            for literal in &literals {
                ensure!(
                    literal.variable().index() < num_variables,
                    MalformedFormula {
                        clause: index,
                        variable: literal.variable().id(),
                        num_variables,
                    }
                );
            }

            // Well-formed input has no repeated variable within a clause;
            // dedup anyway so the two watch slots never alias.
            literals.sort_unstable_by_key(|literal| (literal.variable(), literal.positive()));
            literals.dedup();

            let idx = ClauseIdx::from(store.len());
            match literals.len() {
                0 => has_empty_clause = true,
                1 => units.push(idx),
                _ => {
                    watch[literals[0]].push(idx);
                    watch[literals[1]].push(idx);
                }
            }
            store.push(literals);
        }

        Ok(ClauseDb {
            clauses: TiVec::from(store),
            watch,
            units,
            has_empty_clause,
            num_variables,
        })
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn has_empty_clause(&self) -> bool {
        self.has_empty_clause
    }

    pub fn unit_clauses(&self) -> &[ClauseIdx] {
        &self.units
    }

    pub fn clause(&self, idx: ClauseIdx) -> &[Literal] {
        &self.clauses[idx]
    }

    pub fn clauses(&self) -> impl Iterator<Item = &[Literal]> {
        self.clauses.iter().map(|clause| clause.as_slice())
    }

    /// Clauses currently watching `literal`.
    pub fn watchers_of(&self, literal: Literal) -> &[ClauseIdx] {
        &self.watch[literal]
    }

    /// Ensures the watched slot 1 of `idx` holds `false_lit`, so slot 0 is
    /// the other watch.
    pub(super) fn normalize_watch(&mut self, idx: ClauseIdx, false_lit: Literal) {
        if self.clauses[idx][0] == false_lit {
            self.clauses[idx].swap(0, 1);
        }
        debug_assert_eq!(self.clauses[idx][1], false_lit);
    }

    /// Replaces the watch on `false_lit` (at `position` in its watch list)
    /// with the literal at `slot` of the clause.
    pub(super) fn move_watch(
        &mut self,
        idx: ClauseIdx,
        position: usize,
        false_lit: Literal,
        slot: usize,
    ) {
        self.clauses[idx].swap(1, slot);
        let new_watch = self.clauses[idx][1];
        debug_assert_ne!(new_watch, false_lit);

        self.watch[false_lit].swap_remove(position);
        debug_assert!(!self.watch[new_watch].contains(&idx));
        self.watch[new_watch].push(idx);
    }
}
