use std::error::Error;
use std::fmt;

use crate::types::Clause;

/// Broken-invariant conditions surfaced by the engine. SAT and UNSAT are
/// ordinary `evaluate` results, never errors; these variants mean the
/// solver state itself is inconsistent and the run must abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// A clause was learnt a second time.
    DuplicateLearntClause(Clause),
    /// Conflict analysis was invoked without a recorded conflict node.
    MissingConflict,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::DuplicateLearntClause(c) => {
                write!(f, "clause already learnt: {c}")
            }
            SolverError::MissingConflict => {
                write!(f, "conflict analysis invoked without a recorded conflict")
            }
        }
    }
}

impl Error for SolverError {}
