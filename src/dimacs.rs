use std::error::Error;
use std::fmt;

use log::debug;

use crate::clause_db::ClauseDb;
use crate::types::{Clause, Literal};

/// Failures while reading DIMACS CNF text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimacsError {
    MissingProblemLine,
    DuplicateProblemLine,
    BadProblemLine(String),
    BadLiteral(String),
    ClauseCountMismatch { declared: usize, found: usize },
    VariableCountMismatch { declared: usize, found: usize },
}

impl fmt::Display for DimacsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimacsError::MissingProblemLine => write!(f, "no problem line found"),
            DimacsError::DuplicateProblemLine => write!(f, "more than one problem line"),
            DimacsError::BadProblemLine(line) => write!(f, "malformed problem line: {line}"),
            DimacsError::BadLiteral(token) => write!(f, "malformed literal: {token}"),
            DimacsError::ClauseCountMismatch { declared, found } => {
                write!(f, "declared {declared} clauses, found {found}")
            }
            DimacsError::VariableCountMismatch { declared, found } => {
                write!(f, "declared {declared} variables, found {found}")
            }
        }
    }
}

impl Error for DimacsError {}

/// Parses DIMACS CNF text into a populated clause store. Variable names
/// are the decimal magnitudes from the input. The declared clause and
/// variable counts must match what the text actually contains.
pub fn parse(input: &str) -> Result<ClauseDb, DimacsError> {
    let mut db = ClauseDb::new();
    let mut declared: Option<(usize, usize)> = None;
    let mut pending: Vec<Literal> = Vec::new();
    let mut clause_count = 0usize;

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        if line.starts_with('p') {
            if declared.is_some() {
                return Err(DimacsError::DuplicateProblemLine);
            }
            declared = Some(parse_problem_line(line)?);
            continue;
        }

        // Clause lines: literals terminated by 0. A clause may span lines
        // and a line may hold several clauses.
        for token in line.split_whitespace() {
            let value: i64 = token
                .parse()
                .map_err(|_| DimacsError::BadLiteral(token.to_string()))?;
            if value == 0 {
                if !pending.is_empty() {
                    db.insert(Clause::from_lits(std::mem::take(&mut pending)));
                    clause_count += 1;
                }
                continue;
            }
            pending.push(Literal::new(value.abs().to_string(), value > 0));
        }
    }

    if !pending.is_empty() {
        db.insert(Clause::from_lits(pending));
        clause_count += 1;
    }

    let (variables, clauses) = declared.ok_or(DimacsError::MissingProblemLine)?;
    if clause_count != clauses {
        return Err(DimacsError::ClauseCountMismatch { declared: clauses, found: clause_count });
    }
    if db.variable_count() != variables {
        return Err(DimacsError::VariableCountMismatch {
            declared: variables,
            found: db.variable_count(),
        });
    }

    debug!("parsed {} clauses over {} variables", db.clause_count(), db.variable_count());
    Ok(db)
}

fn parse_problem_line(line: &str) -> Result<(usize, usize), DimacsError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        ["p", "cnf", variables, clauses] => {
            let variables = variables
                .parse()
                .map_err(|_| DimacsError::BadProblemLine(line.to_string()))?;
            let clauses = clauses
                .parse()
                .map_err(|_| DimacsError::BadProblemLine(line.to_string()))?;
            Ok((variables, clauses))
        }
        _ => Err(DimacsError::BadProblemLine(line.to_string())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let db = parse("c example\np cnf 3 2\n1 -2 0\n2 3 0\n").unwrap();
        assert_eq!(db.clause_count(), 2);
        assert_eq!(db.variable_count(), 3);
        assert_eq!(db.literal_count("2"), Some(2));
    }

    #[test]
    fn test_parse_clause_spanning_lines() {
        let db = parse("p cnf 3 1\n1 2\n3 0\n").unwrap();
        assert_eq!(db.clause_count(), 1);
        assert_eq!(db.all_clauses()[0].len(), 3);
    }

    #[test]
    fn test_parse_two_clauses_on_one_line() {
        let db = parse("p cnf 2 2\n1 0 -2 0\n").unwrap();
        assert_eq!(db.clause_count(), 2);
    }

    #[test]
    fn test_missing_problem_line() {
        assert_eq!(parse("1 2 0\n").unwrap_err(), DimacsError::MissingProblemLine);
    }

    #[test]
    fn test_duplicate_problem_line() {
        assert_eq!(
            parse("p cnf 1 1\np cnf 1 1\n1 0\n").unwrap_err(),
            DimacsError::DuplicateProblemLine
        );
    }

    #[test]
    fn test_bad_problem_line() {
        assert_eq!(
            parse("p cnf x 1\n1 0\n").unwrap_err(),
            DimacsError::BadProblemLine("p cnf x 1".to_string())
        );
    }

    #[test]
    fn test_bad_literal() {
        assert_eq!(
            parse("p cnf 1 1\n1 q 0\n").unwrap_err(),
            DimacsError::BadLiteral("q".to_string())
        );
    }

    #[test]
    fn test_clause_count_mismatch() {
        assert_eq!(
            parse("p cnf 2 3\n1 0\n2 0\n").unwrap_err(),
            DimacsError::ClauseCountMismatch { declared: 3, found: 2 }
        );
    }

    #[test]
    fn test_variable_count_mismatch() {
        assert_eq!(
            parse("p cnf 3 1\n1 2 0\n").unwrap_err(),
            DimacsError::VariableCountMismatch { declared: 3, found: 2 }
        );
    }
}
