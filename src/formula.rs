/*!
A module to represent conjunctive normal form formula.
*/

use std::{convert::TryInto, fmt::Display, num::NonZeroU32, str::FromStr};

use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum VariableParseError {
    #[snafu(display("Failed to parse Variable ID"))]
    ParseIntError { source: std::num::ParseIntError },
    #[snafu(display(
        "Variable ID {} is out of range (must be within 1 to {})",
        num,
        Variable::MAX_VARIABLE_ID
    ))]
    RangeError { num: usize },
}

/// Newtype wrapper for variable ID.
/// Invariant: 0 < ID <= MAX_VARIABLE_ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Variable(NonZeroU32);

impl Variable {
    pub const MAX_VARIABLE_ID: usize = std::u32::MAX as usize;

    /// Creates a variable from its 1-based DIMACS ID.
    /// Returns `None` if the ID is zero or too large.
    pub fn new(id: usize) -> Option<Self> {
        if id > Variable::MAX_VARIABLE_ID {
            return None;
        }
        Some(Variable(NonZeroU32::new(id.try_into().ok()?)?))
    }

    /// The 1-based DIMACS ID of this variable.
    pub fn id(&self) -> u32 {
        self.0.get()
    }

    pub fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// Creates a variable from a raw index.
    /// Returns `None` if the index is invalid.
    pub fn from_index(index: usize) -> Option<Self> {
        Variable::new(index.checked_add(1)?)
    }
}

impl FromStr for Variable {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let num = s.parse::<usize>().context(ParseIntError)?;
        Variable::new(num).context(RangeError { num })
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Literal {
    id: Variable,
    positive: bool,
}

impl Literal {
    pub fn new(id: Variable, positive: bool) -> Self {
        Literal { id, positive }
    }

    pub fn variable(&self) -> Variable {
        self.id
    }

    pub fn positive(&self) -> bool {
        self.positive
    }

    /// DIMACS encoding: the variable ID, negated for a negative literal.
    pub fn dimacs(&self) -> i64 {
        let id = i64::from(self.id.id());
        if self.positive {
            id
        } else {
            -id
        }
    }
}

impl FromStr for Literal {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (positive, id) = if let Some(rest) = s.strip_prefix('-') {
            (false, rest.parse()?)
        } else {
            (true, s.parse()?)
        };

        Ok(Literal { id, positive })
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.positive { "" } else { "¬" }, self.id)
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal {
            id: self.id,
            positive: !self.positive,
        }
    }
}

/// Disjunction of literals
#[derive(Debug, Clone)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    pub fn num_literals(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Literal> + '_ {
        self.literals.iter().copied()
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;

        let mut iter = self.literals.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for literal in iter {
            write!(f, " ∨ {}", literal)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Formula representation in Conjunctive Normal Form.
///
/// An empty clause in the input is not an error: it is a valid clause that no
/// assignment can satisfy. Such clauses are counted separately so the clause
/// list only holds clauses the search has to work on.
#[derive(Debug, Clone)]
pub struct Cnf {
    num_variables: usize,
    clauses: Vec<Clause>,
    empty_clauses: usize,
}

impl Cnf {
    pub fn new(num_variables: usize) -> Self {
        assert!(num_variables <= Variable::MAX_VARIABLE_ID);

        Cnf {
            num_variables,
            clauses: Vec::new(),
            empty_clauses: 0,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn clauses(&self) -> &Vec<Clause> {
        &self.clauses
    }

    pub fn add_clause(&mut self, clause: Clause) {
        if clause.is_empty() {
            self.empty_clauses += 1;
        } else {
            self.clauses.push(clause);
        }
    }

    pub fn empty_clause_count(&self) -> usize {
        self.empty_clauses
    }

    pub fn has_empty_clause(&self) -> bool {
        self.empty_clauses > 0
    }

    /// Evaluates the formula under a total assignment
    /// (`assignment[i]` is the value of the variable with index `i`).
    pub fn evaluate(&self, assignment: &[bool]) -> bool {
        assert!(assignment.len() == self.num_variables);

        self.empty_clauses == 0
            && self.clauses.iter().all(|clause| {
                clause
                    .iter()
                    .any(|literal| assignment[literal.variable().index()] == literal.positive())
            })
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CNF with {} variables (", self.num_variables)?;

        let mut iter = self.clauses.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for clause in iter {
            write!(f, " ∧ {}", clause)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Represents a satisfying assignment for a formula.
#[derive(Debug)]
pub struct Model {
    formula: Cnf,
    assignment: Vec<bool>,
}

impl Model {
    /// Creates a new model from a formula and an assignment.
    ///
    /// # Panics
    ///
    /// Panics when `assignment` is invalid (e.g., length mismatch, unsatisfying).
    pub fn new(formula: Cnf, assignment: Vec<bool>) -> Self {
        assert!(assignment.len() == formula.num_variables());
        assert!(
            formula.evaluate(&assignment),
            "assignment does not satisfy the formula"
        );

        Model {
            formula,
            assignment,
        }
    }

    pub fn formula(&self) -> &Cnf {
        &self.formula
    }

    pub fn assignment(&self) -> &[bool] {
        &self.assignment
    }

    /// Renders the assignment as DIMACS signed literals, e.g. `1 -2 3 0`.
    pub fn dimacs(&self) -> String {
        let mut out = String::new();
        for (idx, &val) in self.assignment.iter().enumerate() {
            let id = idx + 1;
            if val {
                out.push_str(&format!("{} ", id));
            } else {
                out.push_str(&format!("-{} ", id));
            }
        }
        out.push('0');
        out
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model for {}\nAssignment:", self.formula)?;
        for (idx, &val) in self.assignment.iter().enumerate() {
            write!(f, "\n  {}: {}", Variable::from_index(idx).unwrap(), val)?;
        }

        Ok(())
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
    fn literal_roundtrip() {
        let literal: Literal = "-3".parse().unwrap();
        assert_eq!(literal.variable().id(), 3);
        assert!(!literal.positive());
        assert_eq!(literal.dimacs(), -3);
        assert_eq!((!literal).dimacs(), 3);
    }

    #[test]
    fn zero_is_not_a_variable() {
        assert!("0".parse::<Literal>().is_err());
        assert!(Variable::new(0).is_none());
    }

    #[test]
    fn evaluate_checks_every_clause() {
        let mut cnf = Cnf::new(2);
        cnf.add_clause(Clause::new(vec![lit(1), lit(-2)]));
        cnf.add_clause(Clause::new(vec![lit(2)]));

        assert!(cnf.evaluate(&[true, true]));
        assert!(!cnf.evaluate(&[false, true]));
        assert!(!cnf.evaluate(&[true, false]));
    }

    #[test]
    fn empty_clause_is_counted_not_stored() {
        let mut cnf = Cnf::new(1);
        cnf.add_clause(Clause::new(vec![]));
        cnf.add_clause(Clause::new(vec![lit(1)]));

        assert_eq!(cnf.empty_clause_count(), 1);
        assert_eq!(cnf.clauses().len(), 1);
        assert!(!cnf.evaluate(&[true]));
    }
}
