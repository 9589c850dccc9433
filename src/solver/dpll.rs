/*!
Iterative DPLL search driver.

The loop is decide → propagate → on conflict, backtrack chronologically (flip
the deepest unflipped decision) → SAT once every variable is assigned, UNSAT
once no decision remains to retract. Backtracking walks an explicit trail, so
the search depth never touches the call stack.
*/

use crate::formula::{Cnf, Literal, Model};
use crate::solver::{Brancher, Budget, SearchStats, Solver, Verdict};

use self::propagate::Propagator;

pub mod database;
mod propagate;
pub mod trail;

pub use self::database::{ClauseDb, ClauseIdx, LoadError};
pub use self::trail::{Reason, Trail};

use crate::solver::brancher::MaxOccurrence;

/// Decides where the search resumes after a clause was falsified.
///
/// This is the seam a CDCL extension would replace: a learning policy could
/// derive a clause from the conflict and jump to a computed level without
/// touching propagation, branching, or the trail.
pub trait ConflictPolicy {
    /// Unwinds the trail and returns the literal to assign next as a forced
    /// decision, or `None` when no decision remains to retract.
    fn resolve(&mut self, db: &ClauseDb, trail: &mut Trail, conflict: ClauseIdx)
        -> Option<Literal>;
}

/// Standard DPLL backtracking: undo levels from the deepest, flip the first
/// decision that was not yet tried both ways.
#[derive(Debug, Default)]
pub struct Chronological;

impl ConflictPolicy for Chronological {
    fn resolve(
        &mut self,
        _db: &ClauseDb,
        trail: &mut Trail,
        _conflict: ClauseIdx,
    ) -> Option<Literal> {
        while let Some((decision, flipped)) = trail.current_decision() {
            trail.backtrack_to(trail.level() - 1);
            if !flipped {
                return Some(!decision);
            }
        }

        None
    }
}

#[derive(Debug)]
pub struct DpllSolver<B = MaxOccurrence> {
    formula: Cnf,
    db: ClauseDb,
    trail: Trail,
    propagator: Propagator,
    brancher: B,
    policy: Chronological,
    stats: SearchStats,
}

impl<B: Brancher> DpllSolver<B> {
    pub fn with_brancher(formula: Cnf, brancher: B) -> Result<Self, LoadError> {
        let db = ClauseDb::load(&formula)?;
        let trail = Trail::new(formula.num_variables());

        Ok(DpllSolver {
            formula,
            db,
            trail,
            propagator: Propagator::new(),
            brancher,
            policy: Chronological,
            stats: SearchStats::default(),
        })
    }

    /// Assigns the input unit clauses at level 0.
    /// Returns `false` when two of them already contradict each other.
    fn seed_units(&mut self) -> bool {
        for position in 0..self.db.unit_clauses().len() {
            let idx = self.db.unit_clauses()[position];
            let literal = self.db.clause(idx)[0];
            match self.trail.eval(literal) {
                None => self.trail.assign(literal, Reason::Propagated(idx)),
                Some(false) => {
                    debug!("contradicting unit clauses at level 0 ({})", idx);
                    return false;
                }
                Some(true) => {}
            }
        }

        true
    }

    fn into_model(self) -> Model {
        // Unassigned variables are impossible here (the brancher returned
        // `None`), but filling with `true` keeps this total either way.
        let assignment = self
            .trail
            .values()
            .map(|value| value.unwrap_or(true))
            .collect::<Vec<_>>();

        Model::new(self.formula, assignment)
    }

    fn run(mut self, budget: &Budget) -> Verdict {
        debug!(
            "solving {} variables, {} clauses",
            self.formula.num_variables(),
            self.db.num_clauses()
        );

        if self.db.has_empty_clause() {
            debug!("empty clause in the input, no search needed");
            return Verdict::Unsat;
        }

        if !self.seed_units() {
            return Verdict::Unsat;
        }
        if let Some(conflict) =
            self.propagator
                .propagate(&mut self.db, &mut self.trail, &mut self.stats)
        {
            // Level 0 facts hold under every assignment.
            debug!("conflict at level 0 ({})", conflict);
            info!("UNSAT after {}", self.stats);
            return Verdict::Unsat;
        }

        loop {
            if budget.is_exhausted() {
                info!("giving up after {}", self.stats);
                return Verdict::Timeout;
            }

            let decision = match self.brancher.pick_decision(&self.db, &self.trail) {
                Some(literal) => literal,
                None => {
                    info!("SAT after {}", self.stats);
                    return Verdict::Sat(self.into_model());
                }
            };

            self.stats.decisions += 1;
            trace!("decide {} at level {}", decision, self.trail.level() + 1);
            self.trail.decide(decision, false);

            while let Some(conflict) =
                self.propagator
                    .propagate(&mut self.db, &mut self.trail, &mut self.stats)
            {
                self.stats.conflicts += 1;

                match self.policy.resolve(&self.db, &mut self.trail, conflict) {
                    Some(flip) => {
                        self.propagator.rewind(&self.trail);
                        trace!("flip to {} at level {}", flip, self.trail.level() + 1);
                        self.trail.decide(flip, true);
                    }
                    None => {
                        info!("UNSAT after {}", self.stats);
                        return Verdict::Unsat;
                    }
                }
            }
        }
    }
}

impl<B: Brancher + Default> Solver for DpllSolver<B> {
    fn new(formula: Cnf) -> Result<Self, LoadError> {
        Self::with_brancher(formula, B::default())
    }

    fn solve_within(self, budget: &Budget) -> Verdict {
        self.run(budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Variable;
    use crate::parser::parse_str;
    use crate::solver::brancher::{FirstUnassigned, RandomOrder};

    fn lit(dimacs: i64) -> Literal {
        let var = Variable::new(dimacs.abs() as usize).unwrap();
        Literal::new(var, dimacs > 0)
    }

    fn solve(input: &str) -> Verdict {
        let formula = parse_str(input).unwrap();
        DpllSolver::<MaxOccurrence>::new(formula).unwrap().solve()
    }

    #[test]
    fn single_unit_clause() {
        let verdict = solve("p cnf 1 1\n1 0\n");
        let model = verdict.model().unwrap();
        assert_eq!(model.assignment(), &[true]);
    }

    #[test]
    fn contradicting_units_fail_before_any_decision() {
        assert!(solve("p cnf 1 2\n1 0\n-1 0\n").is_unsat());
    }

    #[test]
    fn single_binary_clause() {
        let verdict = solve("p cnf 2 1\n1 -2 0\n");
        let model = verdict.model().unwrap();
        assert!(model.formula().evaluate(model.assignment()));
    }

    #[test]
    fn empty_clause_means_unsat_without_search() {
        assert!(solve("p cnf 2 2\n1 2 0\n0\n").is_unsat());
    }

    #[test]
    fn no_clauses_is_trivially_sat() {
        let verdict = solve("p cnf 3 0\n");
        assert_eq!(verdict.model().unwrap().assignment().len(), 3);
    }

    #[test]
    fn pigeonhole_three_into_two_is_unsat() {
        // x_{p,h} = pigeon p sits in hole h
        let verdict = solve(
            "p cnf 6 9\n\
             1 2 0\n3 4 0\n5 6 0\n\
             -1 -3 0\n-1 -5 0\n-3 -5 0\n\
             -2 -4 0\n-2 -6 0\n-4 -6 0\n",
        );
        assert!(verdict.is_unsat());
    }

    #[test]
    fn chronological_policy_flips_once_then_backtracks_further() {
        let cnf = parse_str("p cnf 2 1\n1 2 0\n").unwrap();
        let db = ClauseDb::load(&cnf).unwrap();
        let mut trail = Trail::new(2);
        let mut policy = Chronological;

        trail.decide(lit(-1), false);
        trail.decide(lit(-2), false);

        let conflict = ClauseIdx::from(0);
        assert_eq!(policy.resolve(&db, &mut trail, conflict), Some(lit(2)));
        assert_eq!(trail.level(), 1);

        trail.decide(lit(2), true);
        // A later conflict must not retry the flipped decision.
        assert_eq!(policy.resolve(&db, &mut trail, conflict), Some(lit(1)));
        assert_eq!(trail.level(), 0);

        trail.decide(lit(1), true);
        assert_eq!(policy.resolve(&db, &mut trail, conflict), None);
        assert_eq!(trail.level(), 0);
        assert!(trail.is_empty());
    }

    #[test]
    fn verdict_is_deterministic_for_a_fixed_brancher() {
        let input = "p cnf 4 6\n1 2 0\n-1 3 0\n-2 -3 0\n3 4 0\n-3 -4 0\n-1 -2 4 0\n";

        let first = solve(input);
        let second = solve(input);
        match (first, second) {
            (Verdict::Sat(a), Verdict::Sat(b)) => assert_eq!(a.assignment(), b.assignment()),
            (a, b) => panic!("verdicts diverged: {:?} vs {:?}", a, b),
        }
    }

    #[test]
    fn all_branchers_agree_on_satisfiability() {
        let input = "p cnf 4 6\n1 2 0\n-1 3 0\n-2 -3 0\n3 4 0\n-3 -4 0\n-1 -2 4 0\n";

        let with_max = solve(input);
        let with_first = DpllSolver::<FirstUnassigned>::new(parse_str(input).unwrap())
            .unwrap()
            .solve();
        let with_random = DpllSolver::with_brancher(parse_str(input).unwrap(), RandomOrder::new(7))
            .unwrap()
            .solve();

        assert_eq!(with_max.is_sat(), with_first.is_sat());
        assert_eq!(with_max.is_sat(), with_random.is_sat());
    }

    #[test]
    fn exhausted_budget_reports_timeout() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;

        let formula = parse_str("p cnf 2 1\n1 2 0\n").unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let budget = Budget::unlimited().with_interrupt(flag);

        let verdict = DpllSolver::<MaxOccurrence>::new(formula)
            .unwrap()
            .solve_within(&budget);
        assert!(matches!(verdict, Verdict::Timeout));
    }
}
