use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use log::debug;

use crate::error::SolverError;
use crate::types::Clause;

/// Holds the original clauses plus everything learnt during search, along
/// with the per-variable occurrence counters the branching heuristics read.
///
/// Clauses are kept in insertion order (originals in parse order, learnt
/// clauses appended) so that every scan over `all_clauses` is
/// deterministic.
#[derive(Debug)]
pub struct ClauseDb {
    clauses: Vec<Rc<Clause>>,
    members: HashSet<Rc<Clause>>,
    original_count: usize,
    variables: BTreeSet<String>,
    learnt: Vec<Rc<Clause>>,
    last_learnt: Option<Rc<Clause>>,
    literal_counts: HashMap<String, u32>,
    binary_literal_counts: HashMap<String, u32>,
}

impl ClauseDb {
    pub fn new() -> ClauseDb {
        ClauseDb {
            clauses: Vec::new(),
            members: HashSet::new(),
            original_count: 0,
            variables: BTreeSet::new(),
            learnt: Vec::new(),
            last_learnt: None,
            literal_counts: HashMap::new(),
            binary_literal_counts: HashMap::new(),
        }
    }

    /// Adds an original clause. An exact duplicate is ignored so the
    /// occurrence counters are not skewed by repeated input clauses.
    pub fn insert(&mut self, clause: Clause) -> Rc<Clause> {
        let (rc, added) = self.add(clause);
        if added {
            self.original_count += 1;
        }
        rc
    }

    /// Adds a clause learnt by conflict analysis. Learning the same clause
    /// twice is a broken-invariant condition, not a search outcome.
    pub fn insert_learnt(&mut self, clause: Clause) -> Result<Rc<Clause>, SolverError> {
        if self.learnt.iter().any(|c| **c == clause) {
            return Err(SolverError::DuplicateLearntClause(clause));
        }

        // A learnt clause equal to an original joins the learnt ledger
        // without duplicating it in the active set.
        let (rc, _) = self.add(clause);
        debug!("learnt clause: {rc}");
        self.learnt.push(Rc::clone(&rc));
        self.last_learnt = Some(Rc::clone(&rc));
        Ok(rc)
    }

    fn add(&mut self, clause: Clause) -> (Rc<Clause>, bool) {
        let rc = Rc::new(clause);
        if let Some(stored) = self.members.get(&rc) {
            return (Rc::clone(stored), false);
        }
        self.members.insert(Rc::clone(&rc));
        self.count_literals(&rc);
        self.clauses.push(Rc::clone(&rc));
        (rc, true)
    }

    fn count_literals(&mut self, clause: &Clause) {
        let binary = clause.len() == 2;
        for l in clause.literals() {
            self.variables.insert(l.name().to_string());
            *self.literal_counts.entry(l.name().to_string()).or_insert(0) += 1;
            if binary {
                *self.binary_literal_counts.entry(l.name().to_string()).or_insert(0) += 1;
            }
        }
    }

    /// The active set: originals plus everything learnt so far, in
    /// insertion order.
    pub fn all_clauses(&self) -> &[Rc<Clause>] {
        &self.clauses
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    pub fn learnt_count(&self) -> usize {
        self.learnt.len()
    }

    pub fn last_learnt(&self) -> Option<&Rc<Clause>> {
        self.last_learnt.as_ref()
    }

    pub fn clear_last_learnt(&mut self) {
        self.last_learnt = None;
    }

    /// Occurrence count of `name` over all clauses. `None` means the
    /// variable never occurs, which callers treat as zero.
    pub fn literal_count(&self, name: &str) -> Option<u32> {
        self.literal_counts.get(name).copied()
    }

    /// Occurrence count of `name` restricted to binary clauses.
    pub fn binary_clause_literal_count(&self, name: &str) -> Option<u32> {
        self.binary_literal_counts.get(name).copied()
    }

    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Drops the learnt clauses and their bookkeeping, keeping the original
    /// clauses, so the same formula can be solved again from scratch.
    pub fn reset(&mut self) {
        self.clauses.truncate(self.original_count);
        self.members = self.clauses.iter().map(Rc::clone).collect();
        self.learnt.clear();
        self.last_learnt = None;

        self.literal_counts.clear();
        self.binary_literal_counts.clear();
        self.variables.clear();
        let originals: Vec<Rc<Clause>> = self.clauses.iter().map(Rc::clone).collect();
        for clause in &originals {
            self.count_literals(clause);
        }
    }
}

impl Default for ClauseDb {
    fn default() -> Self {
        ClauseDb::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Literal;

    fn make_clause(lits: Vec<&str>) -> Clause {
        Clause::from_lits(
            lits.into_iter()
                .map(|s| match s.strip_prefix('-') {
                    Some(name) => Literal::new(name, false),
                    None => Literal::new(s, true),
                })
                .collect(),
        )
    }

    #[test]
    fn test_insert_counts_literals() {
        let mut db = ClauseDb::new();
        db.insert(make_clause(vec!["a", "b"]));
        db.insert(make_clause(vec!["a", "b", "c"]));
        assert_eq!(db.literal_count("a"), Some(2));
        assert_eq!(db.binary_clause_literal_count("a"), Some(1));
        assert_eq!(db.binary_clause_literal_count("c"), None);
        assert_eq!(db.variable_count(), 3);
    }

    #[test]
    fn test_insert_ignores_duplicates() {
        let mut db = ClauseDb::new();
        db.insert(make_clause(vec!["a", "b"]));
        db.insert(make_clause(vec!["b", "a"]));
        assert_eq!(db.clause_count(), 1);
        assert_eq!(db.literal_count("a"), Some(1));
    }

    #[test]
    fn test_duplicate_learnt_clause_is_an_error() {
        let mut db = ClauseDb::new();
        db.insert(make_clause(vec!["a", "b"]));
        assert!(db.insert_learnt(make_clause(vec!["-a", "c"])).is_ok());
        assert_eq!(
            db.insert_learnt(make_clause(vec!["c", "-a"])),
            Err(SolverError::DuplicateLearntClause(make_clause(vec!["-a", "c"])))
        );
    }

    #[test]
    fn test_last_learnt_tracking() {
        let mut db = ClauseDb::new();
        db.insert(make_clause(vec!["a", "b"]));
        db.insert_learnt(make_clause(vec!["-b"])).unwrap();
        assert_eq!(**db.last_learnt().unwrap(), make_clause(vec!["-b"]));
        db.clear_last_learnt();
        assert!(db.last_learnt().is_none());
    }

    #[test]
    fn test_reset_keeps_originals() {
        let mut db = ClauseDb::new();
        db.insert(make_clause(vec!["a", "b"]));
        db.insert(make_clause(vec!["-a"]));
        db.insert_learnt(make_clause(vec!["b", "c"])).unwrap();
        db.reset();
        assert_eq!(db.clause_count(), 2);
        assert_eq!(db.learnt_count(), 0);
        assert_eq!(db.literal_count("c"), None);
        assert_eq!(db.literal_count("b"), Some(1));
        // The same clause may be learnt again after a reset.
        assert!(db.insert_learnt(make_clause(vec!["b", "c"])).is_ok());
    }
}
