/*!
DIMACS CNF parser.

Clauses are whitespace-separated signed integers terminated by `0` and may
span multiple lines. A lone `0` is a valid empty clause (the formula is then
trivially unsatisfiable), which is different from a malformed clause.
*/

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::formula::{Clause, Cnf, Literal, VariableParseError};
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("I/O error occurred while parsing CNF file '{}'", path.display()))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Invalid literal '{}' in line '{}'", token, line))]
    MalformedVariable {
        token: String,
        line: String,
        source: VariableParseError,
    },
    #[snafu(display("Clause terminator '0' is not the last token of line '{}'", line))]
    MisplacedTerminator { line: String },
    #[snafu(display("Last clause is not terminated with '0' ({} literals discarded)", count))]
    UnterminatedClause { count: usize },
    #[snafu(display("Problem line 'p cnf <num_variables> <num_clauses>' is not found"))]
    MalformedProblemDefinition,
    #[snafu(display(
        "Variable {} in line '{}' exceeds the declared variable count {}",
        id,
        line,
        num_variables
    ))]
    VariableOutOfRange {
        id: u32,
        line: String,
        num_variables: usize,
    },
    #[snafu(display(
        "The number of clauses ({}) does not match the clauses number in the problem definition ({})",
        found,
        expected,
    ))]
    ClauseCountMismatch { expected: usize, found: usize },
}

fn skippable(line: &str) -> bool {
    line.is_empty() || line.starts_with('c') || line.starts_with('%')
}

fn parse_lines<I>(lines: I) -> Result<Cnf, Error>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut lines = lines.into_iter();

    // skip until we find the problem definition
    let prob_line = loop {
        let line = lines.next().ok_or_else(|| MalformedProblemDefinition.build())?;
        let trimmed = line.as_ref().trim().to_owned();
        if skippable(&trimmed) {
            continue;
        }
        break trimmed;
    };

    let splitted = prob_line.split_whitespace().collect::<Vec<_>>();

    // We only support CNF DIMACS format
    ensure!(
        splitted.len() == 4 && splitted[0] == "p" && splitted[1] == "cnf",
        MalformedProblemDefinition
    );

    let (num_variables, num_clauses) =
        match (splitted[2].parse::<usize>(), splitted[3].parse::<usize>()) {
            (Ok(num_variables), Ok(num_clauses)) => (num_variables, num_clauses),
            _ => return MalformedProblemDefinition.fail(),
        };

    let mut cnf = Cnf::new(num_variables);
    let mut pending: Vec<Literal> = Vec::new();

    for line in lines {
        let trimmed = line.as_ref().trim();
        if skippable(trimmed) {
            continue;
        }

        let tokens = trimmed.split_whitespace().collect::<Vec<_>>();
        for (index, token) in tokens.iter().enumerate() {
            if *token == "0" {
                ensure!(
                    index == tokens.len() - 1,
                    MisplacedTerminator {
                        line: trimmed.to_owned(),
                    }
                );
                cnf.add_clause(Clause::new(std::mem::take(&mut pending)));
            } else {
                let literal = token.parse::<Literal>().with_context(|| MalformedVariable {
                    token: (*token).to_owned(),
                    line: trimmed.to_owned(),
                })?;
                ensure!(
                    literal.variable().index() < num_variables,
                    VariableOutOfRange {
                        id: literal.variable().id(),
                        line: trimmed.to_owned(),
                        num_variables,
                    }
                );
                pending.push(literal);
            }
        }
    }

    ensure!(
        pending.is_empty(),
        UnterminatedClause {
            count: pending.len(),
        }
    );

    ensure!(
        cnf.clauses().len() + cnf.empty_clause_count() == num_clauses,
        ClauseCountMismatch {
            found: cnf.clauses().len() + cnf.empty_clause_count(),
            expected: num_clauses,
        }
    );

    Ok(cnf)
}

/// Parses CNF formula from a file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Cnf, Error> {
    let path = path.as_ref();
    let file = BufReader::new(File::open(path).context(IoError {
        path: path.to_owned(),
    })?);

    let lines = file
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .context(IoError {
            path: path.to_owned(),
        })?;

    parse_lines(lines)
}

/// Parses CNF formula from in-memory text
pub fn parse_str(input: &str) -> Result<Cnf, Error> {
    parse_lines(input.lines())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_formula() {
        let cnf = parse_str("c a comment\np cnf 3 2\n1 -2 0\n2 3 0\n").unwrap();
        assert_eq!(cnf.num_variables(), 3);
        assert_eq!(cnf.clauses().len(), 2);
        assert_eq!(cnf.clauses()[0].num_literals(), 2);
    }

    #[test]
    fn clause_may_span_lines() {
        let cnf = parse_str("p cnf 3 1\n1 2\n3 0\n").unwrap();
        assert_eq!(cnf.clauses().len(), 1);
        assert_eq!(cnf.clauses()[0].num_literals(), 3);
    }

    #[test]
    fn lone_zero_is_an_empty_clause() {
        let cnf = parse_str("p cnf 2 2\n1 2 0\n0\n").unwrap();
        assert_eq!(cnf.clauses().len(), 1);
        assert_eq!(cnf.empty_clause_count(), 1);
        assert!(cnf.has_empty_clause());
    }

    #[test]
    fn rejects_interior_terminator() {
        let err = parse_str("p cnf 2 1\n1 0 2 0\n").unwrap_err();
        assert!(matches!(err, Error::MisplacedTerminator { .. }));
    }

    #[test]
    fn rejects_unterminated_clause() {
        let err = parse_str("p cnf 2 1\n1 2\n").unwrap_err();
        assert!(matches!(err, Error::UnterminatedClause { count: 2 }));
    }

    #[test]
    fn rejects_missing_header() {
        let err = parse_str("1 2 0\n").unwrap_err();
        assert!(matches!(err, Error::MalformedProblemDefinition));
    }

    #[test]
    fn rejects_variable_beyond_declared_count() {
        let err = parse_str("p cnf 2 1\n1 3 0\n").unwrap_err();
        assert!(matches!(err, Error::VariableOutOfRange { id: 3, .. }));
    }

    #[test]
    fn rejects_clause_count_mismatch() {
        let err = parse_str("p cnf 2 2\n1 2 0\n").unwrap_err();
        assert!(matches!(
            err,
            Error::ClauseCountMismatch {
                expected: 2,
                found: 1
            }
        ));
    }
}
