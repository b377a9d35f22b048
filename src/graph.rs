use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;
use std::rc::Rc;

use log::{debug, trace};

use crate::error::SolverError;
use crate::types::{Clause, Variable};

/// One assignment in the graph: the value a variable took and the decision
/// level it was set at. Keyed by variable name in the assignment map, so a
/// variable has exactly one live node while assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    value: bool,
    level: i32,
}

impl Node {
    pub fn value(&self) -> bool {
        self.value
    }

    pub fn level(&self) -> i32 {
        self.level
    }
}

/// A directed edge from an antecedent assignment to the assignment it
/// helped force, annotated with the clause that did the forcing.
#[derive(Debug, Clone)]
struct Edge {
    from: String,
    to: String,
    antecedent: Rc<Clause>,
}

/// Assignment provenance: which variables are set, at which level, and
/// which clauses forced them. Supports 1-UIP conflict analysis and
/// decision-level rollback.
///
/// The unassigned pool is a `BTreeSet` and edges live in an
/// insertion-ordered arena, so every traversal here is deterministic.
pub struct ImplicationGraph {
    nodes: HashMap<String, Node>,
    unassigned: BTreeSet<String>,
    edges: Vec<Edge>,
    conflict: Option<(String, i32)>,
    backtrack_level: i32,
}

impl ImplicationGraph {
    pub fn new() -> ImplicationGraph {
        ImplicationGraph {
            nodes: HashMap::new(),
            unassigned: BTreeSet::new(),
            edges: Vec::new(),
            conflict: None,
            backtrack_level: -1,
        }
    }

    /// Seeds the unassigned-variable universe from the literal names in
    /// `clauses`. Called exactly once per fresh solve, before any
    /// assignment.
    pub fn initialize(&mut self, clauses: &[Rc<Clause>]) {
        for clause in clauses {
            for l in clause.literals() {
                self.unassigned.insert(l.name().to_string());
            }
        }
    }

    /// Records a branching choice. A variable that already has a node is
    /// left untouched, guarding against double assignment.
    pub fn add_decision_node(&mut self, variable: &Variable, level: i32) {
        self.add_node(variable, level);
    }

    /// Records a forced assignment and links an edge from every other
    /// literal of `antecedent` that currently has a node. An unassigned
    /// other literal is simply not linked; it cannot be part of the cause.
    pub fn add_implication_node(&mut self, variable: &Variable, level: i32, antecedent: &Rc<Clause>) {
        if !self.add_node(variable, level) {
            return;
        }

        for l in antecedent.literals() {
            if l.name() == variable.name() {
                continue;
            }
            if self.nodes.contains_key(l.name()) {
                self.add_edge(l.name(), variable.name(), antecedent);
            }
        }
    }

    fn add_node(&mut self, variable: &Variable, level: i32) -> bool {
        if self.nodes.contains_key(variable.name()) {
            return false;
        }
        self.unassigned.remove(variable.name());
        self.nodes
            .insert(variable.name().to_string(), Node { value: variable.value(), level });
        true
    }

    fn add_edge(&mut self, from: &str, to: &str, antecedent: &Rc<Clause>) {
        let duplicate = self
            .edges
            .iter()
            .any(|e| e.from == from && e.to == to && Rc::ptr_eq(&e.antecedent, antecedent));
        if duplicate {
            return;
        }
        self.edges.push(Edge {
            from: from.to_string(),
            to: to.to_string(),
            antecedent: Rc::clone(antecedent),
        });
    }

    /// Records the assignment that was in play when a conflict was found.
    /// Conflict analysis starts its frontier here.
    pub fn set_conflict(&mut self, name: &str, level: i32) {
        self.conflict = Some((name.to_string(), level));
    }

    pub fn assignment(&self, name: &str) -> Option<bool> {
        self.nodes.get(name).map(Node::value)
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn unassigned(&self) -> &BTreeSet<String> {
        &self.unassigned
    }

    pub fn assigned_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn all_assigned(&self, total_variables: usize) -> bool {
        self.nodes.len() == total_variables
    }

    /// Scans `clauses` in store order and returns the first clause whose
    /// literals are all assigned with none satisfied.
    pub fn find_conflicted_clause(&self, clauses: &[Rc<Clause>]) -> Option<Rc<Clause>> {
        clauses
            .iter()
            .find(|c| {
                c.literals().iter().all(|l| {
                    self.assignment(l.name())
                        .is_some_and(|a| !l.is_satisfied(a))
                })
            })
            .map(|c| Rc::clone(c))
    }

    /// Resolves the conflict back to the first unique implication point and
    /// returns the learnt clause. `backtrack_level` is valid immediately
    /// afterwards; -1 means the formula is unsatisfiable.
    ///
    /// Invoking this without a recorded conflict is a broken invariant, not
    /// an UNSAT outcome.
    pub fn analyze_conflict(
        &mut self,
        conflicted_clause: &Rc<Clause>,
        level: i32,
    ) -> Result<Clause, SolverError> {
        let (conflict_name, conflict_level) =
            self.conflict.take().ok_or(SolverError::MissingConflict)?;

        let mut learnt: Clause = (**conflicted_clause).clone();
        let mut analyzed: HashSet<Rc<Clause>> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();

        // The frontier starts from the conflicted node together with the
        // conflicted clause's assigned literals. Seeding the whole clause
        // matters: its literals on other implication branches must also be
        // resolved away before a unique implication point can emerge.
        let mut frontier: Vec<(String, i32)> = vec![(conflict_name, conflict_level)];
        for l in conflicted_clause.literals() {
            if frontier.iter().any(|(n, _)| n == l.name()) {
                continue;
            }
            if let Some(n) = self.nodes.get(l.name()) {
                frontier.push((l.name().to_string(), n.level));
            }
        }
        frontier.sort_by(|a, b| b.1.cmp(&a.1));

        self.backtrack_level = level;

        while !frontier.is_empty() {
            let (name, node_level) = frontier.remove(0);
            visited.insert(name.clone());

            // Clauses on unexamined edges into this node, in edge insertion
            // order. Only nodes at the conflict level are expanded.
            let mut to_analyze: Vec<Rc<Clause>> = Vec::new();
            if node_level == level {
                for edge in &self.edges {
                    if edge.to == name
                        && !analyzed.contains(&edge.antecedent)
                        && !to_analyze.contains(&edge.antecedent)
                    {
                        to_analyze.push(Rc::clone(&edge.antecedent));
                    }
                }
            }

            // A node with no antecedent clauses left is a decision (or a
            // node below the conflict level); its level is the fallback
            // backtrack target.
            if to_analyze.is_empty() {
                self.backtrack_level = node_level;
            }

            for clause in &to_analyze {
                for l in clause.literals() {
                    if visited.contains(l.name())
                        || frontier.iter().any(|(n, _)| n == l.name())
                    {
                        continue;
                    }
                    if let Some(n) = self.nodes.get(l.name()) {
                        frontier.push((l.name().to_string(), n.level));
                    }
                }
                trace!("resolve {learnt} with {clause}");
                learnt = learnt.resolve(clause);
                trace!("--> {learnt}");
                analyzed.insert(Rc::clone(clause));
            }

            // Stop once exactly one literal of the learnt clause sits at
            // the conflict level: the first unique implication point.
            let mut at_conflict_level = 0;
            let mut other_levels: Vec<i32> = Vec::new();
            for l in learnt.literals() {
                if let Some(n) = self.nodes.get(l.name()) {
                    if n.level == level {
                        at_conflict_level += 1;
                    } else {
                        other_levels.push(n.level);
                    }
                }
            }

            if at_conflict_level == 1 {
                self.backtrack_level = level - 1;
                for lv in other_levels {
                    if lv < level {
                        self.backtrack_level = self.backtrack_level.max(lv);
                    }
                }
                break;
            }

            // Highest decision level first; stable, so insertion order
            // breaks ties.
            frontier.sort_by(|a, b| b.1.cmp(&a.1));
        }

        debug!("learnt {learnt}, backtrack level {}", self.backtrack_level);
        Ok(learnt)
    }

    /// The level computed by the last `analyze_conflict` call.
    pub fn backtrack_level(&self) -> i32 {
        self.backtrack_level
    }

    /// Removes every node above `level`, with all touching edges, and
    /// returns those variables to the unassigned pool.
    pub fn revert_to_level(&mut self, level: i32) {
        let removed: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.level > level)
            .map(|(name, _)| name.clone())
            .collect();

        for name in &removed {
            self.nodes.remove(name);
            self.unassigned.insert(name.clone());
        }
        self.edges
            .retain(|e| self.nodes.contains_key(&e.from) && self.nodes.contains_key(&e.to));

        if let Some((_, conflict_level)) = &self.conflict {
            if *conflict_level > level {
                self.conflict = None;
            }
        }
        trace!("reverted to level {level}, {} variables unassigned", removed.len());
    }

    /// The assignment listing in the fixed output format: one
    /// `<name> <true|false>` line per assigned variable, sorted by name.
    pub fn assignments_to_string(&self) -> String {
        let mut names: Vec<&String> = self.nodes.keys().collect();
        names.sort();

        let mut out = String::new();
        for name in names {
            let _ = writeln!(out, "{} {}", name, self.nodes[name].value);
        }
        out
    }

    pub fn edges_to_string(&self) -> String {
        let mut out = String::new();
        for e in &self.edges {
            let _ = writeln!(out, "{} -> {}: {}", e.from, e.to, e.antecedent);
        }
        out
    }
}

impl Default for ImplicationGraph {
    fn default() -> Self {
        ImplicationGraph::new()
    }
}
