/*!
Decision heuristics.

The search loop only depends on the [`Brancher`] contract, so a heuristic
can be swapped without touching the loop itself.
*/

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::formula::{Literal, Variable};

use super::dpll::{ClauseDb, Trail};

pub trait Brancher {
    /// Chooses the next decision literal, or `None` once every variable is
    /// assigned (which means a satisfying assignment was found).
    fn pick_decision(&mut self, db: &ClauseDb, trail: &Trail) -> Option<Literal>;
}

/// Greedy activity heuristic: pick the unassigned variable occurring in the
/// most not-yet-satisfied clauses, with the polarity that satisfies more of
/// them. All ties break toward the lower variable ID and positive polarity,
/// keeping the search deterministic.
#[derive(Debug, Default)]
pub struct MaxOccurrence;

impl Brancher for MaxOccurrence {
    fn pick_decision(&mut self, db: &ClauseDb, trail: &Trail) -> Option<Literal> {
        let num_variables = db.num_variables();
        let mut positive = vec![0u32; num_variables];
        let mut negative = vec![0u32; num_variables];

        for clause in db.clauses() {
            if clause
                .iter()
                .any(|&literal| trail.eval(literal) == Some(true))
            {
                continue;
            }
            for &literal in clause {
                if trail.value_of(literal.variable()).is_none() {
                    let index = literal.variable().index();
                    if literal.positive() {
                        positive[index] += 1;
                    } else {
                        negative[index] += 1;
                    }
                }
            }
        }

        let mut best: Option<(u32, usize)> = None;
        for index in 0..num_variables {
            let variable = Variable::from_index(index).unwrap();
            if trail.value_of(variable).is_some() {
                continue;
            }
            let total = positive[index] + negative[index];
            if best.map_or(true, |(best_total, _)| total > best_total) {
                best = Some((total, index));
            }
        }

        best.map(|(_, index)| {
            let variable = Variable::from_index(index).unwrap();
            Literal::new(variable, positive[index] >= negative[index])
        })
    }
}

/// The simplest deterministic baseline: lowest-ID unassigned variable,
/// positive polarity.
#[derive(Debug, Default)]
pub struct FirstUnassigned;

impl Brancher for FirstUnassigned {
    fn pick_decision(&mut self, _db: &ClauseDb, trail: &Trail) -> Option<Literal> {
        trail
            .first_unassigned()
            .map(|variable| Literal::new(variable, true))
    }
}

/// Uniformly random unassigned variable and polarity. Seeded, so runs are
/// reproducible for a fixed seed.
#[derive(Debug)]
pub struct RandomOrder {
    rng: StdRng,
}

impl RandomOrder {
    pub fn new(seed: u64) -> Self {
        RandomOrder {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomOrder {
    fn default() -> Self {
        RandomOrder::new(0x5a7)
    }
}

impl Brancher for RandomOrder {
    fn pick_decision(&mut self, _db: &ClauseDb, trail: &Trail) -> Option<Literal> {
        let candidates = (0..trail.num_variables())
            .filter_map(Variable::from_index)
            .filter(|&variable| trail.value_of(variable).is_none())
            .collect::<Vec<_>>();

        if candidates.is_empty() {
            return None;
        }

        let variable = candidates[self.rng.gen_range(0..candidates.len())];
        Some(Literal::new(variable, self.rng.gen()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use crate::solver::dpll::ClauseDb;

    fn setup(input: &str) -> (ClauseDb, Trail) {
        let cnf = parse_str(input).unwrap();
        let db = ClauseDb::load(&cnf).unwrap();
        let trail = Trail::new(cnf.num_variables());
        (db, trail)
    }

    fn lit(dimacs: i64) -> Literal {
        let var = Variable::new(dimacs.abs() as usize).unwrap();
        Literal::new(var, dimacs > 0)
    }

    #[test]
    fn max_occurrence_prefers_the_busiest_variable() {
        // x2 occurs in three clauses, twice negatively.
        let (db, trail) = setup("p cnf 3 3\n1 -2 0\n-2 3 0\n2 3 0\n");
        let decision = MaxOccurrence.pick_decision(&db, &trail).unwrap();
        assert_eq!(decision.variable().id(), 2);
        assert!(!decision.positive());
    }

    #[test]
    fn max_occurrence_ignores_satisfied_clauses() {
        let (db, mut trail) = setup("p cnf 3 3\n1 -2 0\n-2 3 0\n2 3 0\n");
        trail.decide(lit(-2), false);

        // Only `2 3 0` is left unsatisfied and x2 is assigned, so x3 wins.
        let decision = MaxOccurrence.pick_decision(&db, &trail).unwrap();
        assert_eq!(decision.variable().id(), 3);
        assert!(decision.positive());
    }

    #[test]
    fn max_occurrence_ties_break_to_the_lowest_id() {
        let (db, trail) = setup("p cnf 2 1\n1 2 0\n");
        let decision = MaxOccurrence.pick_decision(&db, &trail).unwrap();
        assert_eq!(decision.variable().id(), 1);
        assert!(decision.positive());
    }

    #[test]
    fn branchers_signal_completion() {
        let (db, mut trail) = setup("p cnf 1 1\n1 0\n");
        trail.decide(lit(1), false);

        assert!(MaxOccurrence.pick_decision(&db, &trail).is_none());
        assert!(FirstUnassigned.pick_decision(&db, &trail).is_none());
        assert!(RandomOrder::default().pick_decision(&db, &trail).is_none());
    }

    #[test]
    fn random_order_is_reproducible_for_a_seed() {
        let (db, trail) = setup("p cnf 5 1\n1 2 3 4 5 0\n");

        let mut first = RandomOrder::new(42);
        let mut second = RandomOrder::new(42);
        for _ in 0..10 {
            assert_eq!(
                first.pick_decision(&db, &trail),
                second.pick_decision(&db, &trail)
            );
        }
    }
}
