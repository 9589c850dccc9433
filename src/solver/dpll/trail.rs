/*!
The assignment trail: every live assignment in chronological order, tagged
with its decision level and the reason it was made.
*/

use crate::formula::{Literal, Variable};

use super::database::ClauseIdx;

/// Why a literal entered the trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reason {
    Decision,
    Propagated(ClauseIdx),
}

#[derive(Clone, Copy, Debug)]
struct VarData {
    value: bool,
    level: usize,
    reason: Reason,
}

#[derive(Debug)]
struct LevelMark {
    /// Trail position of this level's decision literal.
    start: usize,
    decision: Literal,
    /// Whether the decision is already the second (complemented) try.
    flipped: bool,
}

#[derive(Debug)]
pub struct Trail {
    /// Variable index -> live assignment, `None` when unassigned.
    data: Vec<Option<VarData>>,
    /// Assigned literals in chronological order.
    entries: Vec<Literal>,
    levels: Vec<LevelMark>,
}

impl Trail {
    pub fn new(num_variables: usize) -> Self {
        Trail {
            data: vec![None; num_variables],
            entries: Vec::with_capacity(num_variables),
            levels: Vec::new(),
        }
    }

    pub fn num_variables(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current decision level; 0 when only propagated facts are on the trail.
    pub fn level(&self) -> usize {
        self.levels.len()
    }

    pub fn all_assigned(&self) -> bool {
        self.entries.len() == self.data.len()
    }

    pub fn entry(&self, index: usize) -> Option<Literal> {
        self.entries.get(index).copied()
    }

    pub fn value_of(&self, variable: Variable) -> Option<bool> {
        self.data[variable.index()].map(|data| data.value)
    }

    /// Value of the literal under the current partial assignment.
    pub fn eval(&self, literal: Literal) -> Option<bool> {
        self.value_of(literal.variable())
            .map(|value| value == literal.positive())
    }

    pub fn level_of(&self, variable: Variable) -> Option<usize> {
        self.data[variable.index()].map(|data| data.level)
    }

    pub fn reason_of(&self, variable: Variable) -> Option<Reason> {
        self.data[variable.index()].map(|data| data.reason)
    }

    /// Lowest-index variable without a value, if any.
    pub fn first_unassigned(&self) -> Option<Variable> {
        let index = self.data.iter().position(|data| data.is_none())?;
        Variable::from_index(index)
    }

    /// Values indexed by variable, `None` for unassigned variables.
    pub fn values(&self) -> impl Iterator<Item = Option<bool>> + '_ {
        self.data.iter().map(|data| data.map(|data| data.value))
    }

    /// Records an assignment at the current decision level.
    ///
    /// Assigning a variable that already holds a value is a bug in the
    /// caller (the propagator checks values before forcing), so this is a
    /// hard assertion rather than a recoverable error.
    pub fn assign(&mut self, literal: Literal, reason: Reason) {
        let slot = &mut self.data[literal.variable().index()];
        assert!(
            slot.is_none(),
            "conflicting assignment of {}",
            literal.variable()
        );

        *slot = Some(VarData {
            value: literal.positive(),
            level: self.levels.len(),
            reason,
        });
        self.entries.push(literal);
    }

    /// Opens a new decision level and assigns its decision literal.
    pub fn decide(&mut self, literal: Literal, flipped: bool) {
        self.levels.push(LevelMark {
            start: self.entries.len(),
            decision: literal,
            flipped,
        });
        self.assign(literal, Reason::Decision);
    }

    /// Decision literal of the deepest level and whether it was flipped.
    pub fn current_decision(&self) -> Option<(Literal, bool)> {
        self.levels.last().map(|mark| (mark.decision, mark.flipped))
    }

    /// Pops every entry above `level`, unassigning those variables.
    /// Runs in O(number of undone entries).
    pub fn backtrack_to(&mut self, level: usize) {
        assert!(level <= self.level());
        if level == self.level() {
            return;
        }

        let cut = self.levels[level].start;
        self.levels.truncate(level);
        for literal in self.entries.drain(cut..) {
            self.data[literal.variable().index()] = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(dimacs: i64) -> Literal {
        let var = Variable::new(dimacs.abs() as usize).unwrap();
        Literal::new(var, dimacs > 0)
    }

    #[test]
    fn assign_and_backtrack() {
        let mut trail = Trail::new(3);
        assert_eq!(trail.level(), 0);

        trail.assign(lit(1), Reason::Propagated(ClauseIdx::from(0)));
        trail.decide(lit(2), false);
        trail.assign(lit(-3), Reason::Propagated(ClauseIdx::from(1)));

        assert_eq!(trail.level(), 1);
        assert_eq!(trail.eval(lit(2)), Some(true));
        assert_eq!(trail.eval(lit(3)), Some(false));
        assert_eq!(trail.level_of(lit(3).variable()), Some(1));
        assert_eq!(trail.level_of(lit(1).variable()), Some(0));
        assert!(trail.all_assigned());

        trail.backtrack_to(0);
        assert_eq!(trail.level(), 0);
        assert_eq!(trail.eval(lit(2)), None);
        assert_eq!(trail.eval(lit(3)), None);
        // level-0 facts survive backtracking
        assert_eq!(trail.eval(lit(1)), Some(true));
    }

    #[test]
    fn backtrack_skips_intermediate_levels() {
        let mut trail = Trail::new(4);
        trail.decide(lit(1), false);
        trail.decide(lit(2), true);
        trail.decide(lit(3), false);

        trail.backtrack_to(1);
        assert_eq!(trail.level(), 1);
        assert_eq!(trail.len(), 1);
        assert_eq!(trail.current_decision(), Some((lit(1), false)));
    }

    #[test]
    fn first_unassigned_walks_in_order() {
        let mut trail = Trail::new(3);
        trail.decide(lit(1), false);
        assert_eq!(trail.first_unassigned(), Variable::new(2));
        trail.decide(lit(2), false);
        trail.decide(lit(-3), false);
        assert_eq!(trail.first_unassigned(), None);
    }

    #[test]
    #[should_panic(expected = "conflicting assignment")]
    fn double_assignment_is_a_bug() {
        let mut trail = Trail::new(1);
        trail.assign(lit(1), Reason::Decision);
        trail.assign(lit(-1), Reason::Decision);
    }
}
