/*!
Unit propagation over the watched-literal index.

For every literal newly made true, only the clauses watching its complement
need a look: they are either satisfied, can move their watch to another
non-false literal, have become unit (forcing their remaining watch), or are
falsified (a conflict). Each forced assignment lands on the trail and is
itself processed later, so propagation runs to a fixpoint.
*/

use crate::solver::SearchStats;

use super::database::{ClauseDb, ClauseIdx};
use super::trail::{Reason, Trail};

#[derive(Debug, Default)]
pub(super) struct Propagator {
    /// Number of trail entries already propagated.
    head: usize,
}

impl Propagator {
    pub(super) fn new() -> Self {
        Default::default()
    }

    /// Clamps the queue head after the trail was backtracked.
    pub(super) fn rewind(&mut self, trail: &Trail) {
        self.head = self.head.min(trail.len());
    }

    /// Propagates until fixpoint or returns the falsified clause.
    /// Never unassigns anything; it only appends to the trail.
    pub(super) fn propagate(
        &mut self,
        db: &mut ClauseDb,
        trail: &mut Trail,
        stats: &mut SearchStats,
    ) -> Option<ClauseIdx> {
        while let Some(literal) = trail.entry(self.head) {
            let false_lit = !literal;

            let mut position = 0;
            'watchers: while position < db.watchers_of(false_lit).len() {
                let idx = db.watchers_of(false_lit)[position];
                db.normalize_watch(idx, false_lit);

                let other = db.clause(idx)[0];
                if trail.eval(other) == Some(true) {
                    position += 1;
                    continue;
                }

                for slot in 2..db.clause(idx).len() {
                    if trail.eval(db.clause(idx)[slot]) != Some(false) {
                        // The watch list entry at `position` is replaced by
                        // its last element, so `position` stays put.
                        db.move_watch(idx, position, false_lit, slot);
                        continue 'watchers;
                    }
                }

                match trail.eval(other) {
                    None => {
                        trace!("{} forces {}", idx, other);
                        trail.assign(other, Reason::Propagated(idx));
                        stats.propagations += 1;
                    }
                    Some(false) => {
                        trace!("{} is falsified", idx);
                        return Some(idx);
                    }
                    Some(true) => unreachable!("satisfied clause handled above"),
                }

                position += 1;
            }

            self.head += 1;
        }

        None
    }
}
