//! A CDCL satisfiability solver over CNF formulas: unit propagation, an
//! implication graph with 1-UIP conflict analysis, clause learning, and
//! interchangeable branching heuristics.

pub mod clause_db;
pub mod config;
pub mod dimacs;
pub mod error;
pub mod graph;
pub mod heuristic;
pub mod solver;
pub mod types;

pub use clause_db::ClauseDb;
pub use config::{Config, HeuristicKind};
pub use error::SolverError;
pub use graph::ImplicationGraph;
pub use solver::{CdclSolver, SolverStats, UNSAT};
pub use types::{Clause, Literal, Variable};
