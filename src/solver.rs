use std::rc::Rc;

use log::{debug, trace, warn};

use crate::clause_db::ClauseDb;
use crate::config::Config;
use crate::error::SolverError;
use crate::graph::ImplicationGraph;
use crate::heuristic::{self, BranchingHeuristic};
use crate::types::{Clause, Literal, Variable};

pub const UNSAT: &str = "UNSAT";

/// Instrumentation counters for one run, zeroed by `reset`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SolverStats {
    pub decisions: u64,
    pub conflicts: u64,
    pub learnt_clauses: u64,
    pub propagations: u64,
}

/// The CDCL engine: unit propagation, branching, conflict analysis,
/// clause learning and backtracking over one clause store and one
/// implication graph, driven until SAT or UNSAT.
pub struct CdclSolver {
    db: ClauseDb,
    graph: ImplicationGraph,
    heuristic: Box<dyn BranchingHeuristic>,
    decision_level: i32,
    last_assigned: Option<String>,
    stats: SolverStats,
}

impl CdclSolver {
    pub fn new(db: ClauseDb, heuristic: Box<dyn BranchingHeuristic>) -> CdclSolver {
        let mut graph = ImplicationGraph::new();
        graph.initialize(db.all_clauses());
        CdclSolver {
            db,
            graph,
            heuristic,
            decision_level: 0,
            last_assigned: None,
            stats: SolverStats::default(),
        }
    }

    pub fn with_config(db: ClauseDb, config: &Config) -> CdclSolver {
        let heuristic = heuristic::build(config, &db);
        CdclSolver::new(db, heuristic)
    }

    /// Runs the state machine once. Returns the literal string `"UNSAT"`
    /// or a `<variable> <true|false>` listing of the satisfying
    /// assignment. Broken-invariant conditions surface as errors, never as
    /// an UNSAT verdict.
    pub fn evaluate(&mut self) -> Result<String, SolverError> {
        self.decision_level = 0;

        // Level 0 propagation over the unit clauses; a conflict here is
        // final.
        if self.propagate().is_some() {
            debug!("conflict during initial propagation");
            return Ok(UNSAT.to_string());
        }

        loop {
            if self.graph.all_assigned(self.db.variable_count()) {
                return Ok(self.graph.assignments_to_string());
            }

            let decision = match self.heuristic.pick(&self.graph, &self.db) {
                Some(v) => v,
                None => {
                    // Unreachable while the unassigned-count invariant
                    // holds; treated as an exhausted search.
                    warn!("no branching candidate although variables remain unassigned");
                    return Ok(UNSAT.to_string());
                }
            };

            self.stats.decisions += 1;
            self.decision_level += 1;
            debug!("decide {} at level {}", decision, self.decision_level);
            self.graph.add_decision_node(&decision, self.decision_level);
            self.last_assigned = Some(decision.name().to_string());

            while let Some(conflicted) = self.propagate() {
                self.stats.conflicts += 1;

                if self.decision_level == 0 {
                    return Ok(UNSAT.to_string());
                }

                let learnt = self.graph.analyze_conflict(&conflicted, self.decision_level)?;
                let backtrack_level = self.graph.backtrack_level();
                if backtrack_level < 0 {
                    return Ok(UNSAT.to_string());
                }

                let learnt = self.db.insert_learnt(learnt)?;
                self.stats.learnt_clauses += 1;
                self.heuristic.on_learnt_clause(&learnt);

                self.backtrack(backtrack_level);

                if !self.assert_learnt_literal(&learnt) {
                    warn!("learnt clause {learnt} has no unassigned literal after backtrack");
                    return Ok(UNSAT.to_string());
                }
                self.db.clear_last_learnt();
                self.heuristic.on_conflict();
            }
        }
    }

    /// Restores the engine, graph, store and heuristic to a fresh state
    /// over the same original formula.
    pub fn reset(&mut self) {
        self.db.reset();
        self.graph = ImplicationGraph::new();
        self.graph.initialize(self.db.all_clauses());
        self.decision_level = 0;
        self.last_assigned = None;
        self.stats = SolverStats::default();
        self.heuristic.reset(&self.db);
    }

    /// Implied-unit propagation to fixpoint as an iterative worklist. On a
    /// conflict, records the conflicted clause and the assignment in play
    /// and returns the clause.
    fn propagate(&mut self) -> Option<Rc<Clause>> {
        loop {
            if let Some(conflicted) = self.graph.find_conflicted_clause(self.db.all_clauses()) {
                let name = self
                    .last_assigned
                    .clone()
                    .or_else(|| conflicted.literals().first().map(|l| l.name().to_string()))
                    .unwrap_or_default();
                self.graph.set_conflict(&name, self.decision_level);
                debug!("conflicted clause {conflicted} at level {}", self.decision_level);
                return Some(conflicted);
            }

            let (forced, antecedent) = match self.find_implied_unit() {
                Some(found) => found,
                None => return None,
            };
            trace!("imply {} from {}", forced, antecedent);
            self.graph
                .add_implication_node(&forced, self.decision_level, &antecedent);
            self.last_assigned = Some(forced.name().to_string());
            self.stats.propagations += 1;
        }
    }

    /// The first clause, in store order, with exactly one unassigned
    /// literal and every other literal assigned an unsatisfying value.
    fn find_implied_unit(&self) -> Option<(Variable, Rc<Clause>)> {
        for clause in self.db.all_clauses() {
            let mut unassigned: Option<&Literal> = None;
            let mut satisfied = false;
            let mut open = false;

            for l in clause.literals() {
                match self.graph.assignment(l.name()) {
                    Some(a) if l.is_satisfied(a) => {
                        satisfied = true;
                        break;
                    }
                    Some(_) => {}
                    None => {
                        if unassigned.is_some() {
                            open = true;
                            break;
                        }
                        unassigned = Some(l);
                    }
                }
            }

            if satisfied || open {
                continue;
            }
            if let Some(l) = unassigned {
                let forced = Variable::new(l.name().to_string(), l.is_positive());
                return Some((forced, Rc::clone(clause)));
            }
            // All literals assigned and unsatisfying: a conflict, which the
            // caller's scan picks up before any further forcing.
        }
        None
    }

    fn backtrack(&mut self, level: i32) {
        debug!("backtrack to level {level}");
        self.graph.revert_to_level(level);
        self.decision_level = level;
        self.last_assigned = None;
    }

    /// Forces the single still-unassigned literal of the just-learnt
    /// clause, with that clause as antecedent. 1-UIP learning guarantees
    /// such a literal after backtracking.
    fn assert_learnt_literal(&mut self, learnt: &Rc<Clause>) -> bool {
        let lit = learnt
            .literals()
            .iter()
            .find(|l| self.graph.assignment(l.name()).is_none());

        match lit {
            Some(l) => {
                let forced = Variable::new(l.name().to_string(), l.is_positive());
                debug!("assert {} from learnt clause at level {}", forced, self.decision_level);
                self.graph
                    .add_implication_node(&forced, self.decision_level, learnt);
                self.last_assigned = Some(forced.name().to_string());
                true
            }
            None => false,
        }
    }

    pub fn db(&self) -> &ClauseDb {
        &self.db
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    pub fn decision_count(&self) -> u64 {
        self.stats.decisions
    }

    /// The current assignment of one variable, for inspection after a run.
    pub fn assignment(&self, name: &str) -> Option<bool> {
        self.graph.assignment(name)
    }
}
