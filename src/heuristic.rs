use std::collections::HashMap;

use log::trace;

use crate::clause_db::ClauseDb;
use crate::config::{Config, HeuristicKind};
use crate::graph::ImplicationGraph;
use crate::types::{Clause, Variable};

/// Branching policy: pick the next unassigned variable and its trial
/// value. The engine notifies the policy of learnt clauses and conflicts
/// so score-based variants can maintain their state.
///
/// `pick` returns `None` once no unassigned variable remains, which tells
/// the engine the search is complete rather than conflicted.
pub trait BranchingHeuristic {
    fn pick(&mut self, graph: &ImplicationGraph, db: &ClauseDb) -> Option<Variable>;

    fn on_learnt_clause(&mut self, _clause: &Clause) {}

    fn on_conflict(&mut self) {}

    fn reset(&mut self, _db: &ClauseDb) {}
}

pub fn build(config: &Config, db: &ClauseDb) -> Box<dyn BranchingHeuristic> {
    match config.heuristic {
        HeuristicKind::First => Box::new(FirstUnassigned),
        HeuristicKind::Random => Box::new(match config.seed {
            Some(seed) => RandomChoice::with_seed(seed),
            None => RandomChoice::new(),
        }),
        HeuristicKind::TwoClause => Box::new(FrequencyChoice::binary_clauses()),
        HeuristicKind::NClause => Box::new(FrequencyChoice::all_clauses()),
        HeuristicKind::Activity => Box::new(ActivityDecay::new(db, config.decay)),
    }
}

/// Lexically first unassigned variable, always tried positive.
pub struct FirstUnassigned;

impl BranchingHeuristic for FirstUnassigned {
    fn pick(&mut self, graph: &ImplicationGraph, _db: &ClauseDb) -> Option<Variable> {
        graph.unassigned().iter().next().map(|name| Variable::new(name.clone(), true))
    }
}

/// Uniform random choice over the unassigned pool, tried positive.
pub struct RandomChoice {
    rng: fastrand::Rng,
}

impl RandomChoice {
    pub fn new() -> RandomChoice {
        RandomChoice { rng: fastrand::Rng::new() }
    }

    pub fn with_seed(seed: u64) -> RandomChoice {
        RandomChoice { rng: fastrand::Rng::with_seed(seed) }
    }
}

impl Default for RandomChoice {
    fn default() -> Self {
        RandomChoice::new()
    }
}

impl BranchingHeuristic for RandomChoice {
    fn pick(&mut self, graph: &ImplicationGraph, _db: &ClauseDb) -> Option<Variable> {
        let unassigned = graph.unassigned();
        if unassigned.is_empty() {
            return None;
        }
        let index = self.rng.usize(..unassigned.len());
        unassigned.iter().nth(index).map(|name| Variable::new(name.clone(), true))
    }
}

/// Highest occurrence count wins, lexical tie-break. Counts come from the
/// clause store, either restricted to binary clauses or over all clauses.
/// Variables missing from the counter map form a fallback pool, consulted
/// only once the counted candidates are exhausted.
pub struct FrequencyChoice {
    binary_only: bool,
}

impl FrequencyChoice {
    pub fn binary_clauses() -> FrequencyChoice {
        FrequencyChoice { binary_only: true }
    }

    pub fn all_clauses() -> FrequencyChoice {
        FrequencyChoice { binary_only: false }
    }
}

impl BranchingHeuristic for FrequencyChoice {
    fn pick(&mut self, graph: &ImplicationGraph, db: &ClauseDb) -> Option<Variable> {
        let mut best: Option<(&String, u32)> = None;
        let mut fallback: Option<&String> = None;

        // The unassigned pool iterates in lexical order, so keeping only
        // strictly better candidates breaks ties toward the first name.
        for name in graph.unassigned() {
            let count = if self.binary_only {
                db.binary_clause_literal_count(name)
            } else {
                db.literal_count(name)
            };
            match count {
                Some(count) => {
                    if best.map_or(true, |(_, c)| count > c) {
                        best = Some((name, count));
                    }
                }
                None => {
                    if fallback.is_none() {
                        fallback = Some(name);
                    }
                }
            }
        }

        best.map(|(name, _)| name)
            .or(fallback)
            .map(|name| Variable::new(name.clone(), true))
    }
}

/// VSIDS-style activity scores: every literal of a learnt clause bumps its
/// variable by one, and all scores decay multiplicatively after each
/// conflict. The highest-scoring unassigned variable is tried positive.
pub struct ActivityDecay {
    scores: HashMap<String, f64>,
    decay: f64,
}

impl ActivityDecay {
    pub fn new(db: &ClauseDb, decay: f64) -> ActivityDecay {
        ActivityDecay { scores: Self::zeroed(db), decay }
    }

    fn zeroed(db: &ClauseDb) -> HashMap<String, f64> {
        db.variables().iter().map(|name| (name.clone(), 0.0)).collect()
    }

    fn score(&self, name: &str) -> f64 {
        self.scores.get(name).copied().unwrap_or(0.0)
    }
}

impl BranchingHeuristic for ActivityDecay {
    fn pick(&mut self, graph: &ImplicationGraph, _db: &ClauseDb) -> Option<Variable> {
        let mut best: Option<(&String, f64)> = None;
        for name in graph.unassigned() {
            let score = self.score(name);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((name, score));
            }
        }
        best.map(|(name, _)| Variable::new(name.clone(), true))
    }

    fn on_learnt_clause(&mut self, clause: &Clause) {
        for l in clause.literals() {
            *self.scores.entry(l.name().to_string()).or_insert(0.0) += 1.0;
        }
        trace!("bumped {} variables", clause.len());
    }

    fn on_conflict(&mut self) {
        for score in self.scores.values_mut() {
            *score *= self.decay;
        }
    }

    fn reset(&mut self, db: &ClauseDb) {
        self.scores = Self::zeroed(db);
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

    fn setup(clauses: Vec<Vec<&str>>) -> (ImplicationGraph, ClauseDb) {
        let mut db = ClauseDb::new();
        for c in clauses {
            db.insert(make_clause(c));
        }
        let mut graph = ImplicationGraph::new();
        graph.initialize(db.all_clauses());
        (graph, db)
    }

    #[test]
    fn test_first_unassigned_is_lexical() {
        let (graph, db) = setup(vec![vec!["c", "b"], vec!["a"]]);
        let mut h = FirstUnassigned;
        assert_eq!(h.pick(&graph, &db), Some(Variable::new("a", true)));
    }

    #[test]
    fn test_first_unassigned_skips_assigned() {
        let (mut graph, db) = setup(vec![vec!["a", "b"]]);
        graph.add_decision_node(&Variable::new("a", true), 1);
        let mut h = FirstUnassigned;
        assert_eq!(h.pick(&graph, &db), Some(Variable::new("b", true)));
    }

    #[test]
    fn test_random_choice_exhausts() {
        let (mut graph, db) = setup(vec![vec!["a"]]);
        let mut h = RandomChoice::with_seed(7);
        assert!(h.pick(&graph, &db).is_some());
        graph.add_decision_node(&Variable::new("a", true), 1);
        assert_eq!(h.pick(&graph, &db), None);
    }

    #[test]
    fn test_random_choice_picks_from_unassigned() {
        let (mut graph, db) = setup(vec![vec!["a", "b", "c"]]);
        graph.add_decision_node(&Variable::new("a", true), 1);
        graph.add_decision_node(&Variable::new("c", true), 2);
        let mut h = RandomChoice::with_seed(42);
        assert_eq!(h.pick(&graph, &db), Some(Variable::new("b", true)));
    }

    #[test]
    fn test_two_clause_frequency() {
        // "b" occurs in two binary clauses, "a" and "c" in one each.
        let (graph, db) = setup(vec![vec!["a", "b"], vec!["b", "c"], vec!["a", "c", "d"]]);
        let mut h = FrequencyChoice::binary_clauses();
        assert_eq!(h.pick(&graph, &db), Some(Variable::new("b", true)));
    }

    #[test]
    fn test_two_clause_fallback_pool() {
        // "d" never occurs in a binary clause; it is picked only after the
        // counted candidates run out.
        let (mut graph, db) = setup(vec![vec!["a", "b"], vec!["a", "c", "d"]]);
        graph.add_decision_node(&Variable::new("a", true), 1);
        graph.add_decision_node(&Variable::new("b", true), 2);
        graph.add_decision_node(&Variable::new("c", true), 3);
        let mut h = FrequencyChoice::binary_clauses();
        assert_eq!(h.pick(&graph, &db), Some(Variable::new("d", true)));
    }

    #[test]
    fn test_n_clause_frequency_tie_break() {
        // "a" and "b" both occur twice; lexical order wins.
        let (graph, db) = setup(vec![vec!["a", "b"], vec!["a", "b", "c"]]);
        let mut h = FrequencyChoice::all_clauses();
        assert_eq!(h.pick(&graph, &db), Some(Variable::new("a", true)));
    }

    #[test]
    fn test_activity_bump_and_pick() {
        let (graph, db) = setup(vec![vec!["a", "b"], vec!["b", "c"]]);
        let mut h = ActivityDecay::new(&db, 0.4);
        h.on_learnt_clause(&make_clause(vec!["-b", "c"]));
        h.on_learnt_clause(&make_clause(vec!["-c"]));
        assert_eq!(h.pick(&graph, &db), Some(Variable::new("c", true)));
    }

    #[test]
    fn test_activity_decay_and_reset() {
        let (graph, db) = setup(vec![vec!["a", "b"]]);
        let mut h = ActivityDecay::new(&db, 0.4);
        h.on_learnt_clause(&make_clause(vec!["-b"]));
        h.on_conflict();
        assert!((h.score("b") - 0.4).abs() < 1e-9);
        assert_eq!(h.pick(&graph, &db), Some(Variable::new("b", true)));
        h.reset(&db);
        assert_eq!(h.score("b"), 0.0);
        // Back to the lexical tie-break once scores are flat.
        assert_eq!(h.pick(&graph, &db), Some(Variable::new("a", true)));
    }
}
