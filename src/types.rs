use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A signed occurrence of a variable inside a clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    name: String,
    positive: bool,
}

impl Literal {
    pub fn new(name: impl Into<String>, positive: bool) -> Literal {
        Literal { name: name.into(), positive }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_positive(&self) -> bool {
        self.positive
    }

    /// A literal is satisfied exactly when the assignment matches its sign.
    pub fn is_satisfied(&self, assignment: bool) -> bool {
        self.positive == assignment
    }

    pub fn negated(&self) -> Literal {
        Literal { name: self.name.clone(), positive: !self.positive }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", if self.positive { "" } else { "-" }, self.name)
    }
}

/// A variable with a concrete truth value, as chosen by a decision or
/// forced by propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    value: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: bool) -> Variable {
        Variable { name: name.into(), value }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> bool {
        self.value
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.value)
    }
}

/// A disjunction of literals. Literals are kept sorted and duplicate-free,
/// so equality and hashing behave like set equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause {
    lits: Box<[Literal]>,
}

impl Clause {
    pub fn from_lits(mut lits: Vec<Literal>) -> Clause {
        lits.sort();
        lits.dedup();
        Clause { lits: lits.into_boxed_slice() }
    }

    pub fn literals(&self) -> &[Literal] {
        &self.lits
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    pub fn literal_for(&self, name: &str) -> Option<&Literal> {
        self.lits.iter().find(|l| l.name() == name)
    }

    pub fn contains(&self, lit: &Literal) -> bool {
        self.lits.contains(lit)
    }

    /// True when at least one literal is satisfied under `assignments`.
    /// Unassigned variables count as unsatisfying.
    pub fn is_satisfied(&self, assignments: &HashMap<String, bool>) -> bool {
        self.lits
            .iter()
            .any(|l| assignments.get(l.name()).is_some_and(|&a| l.is_satisfied(a)))
    }

    /// Binary resolution with `other`: keep exactly the literals whose
    /// variable name occurs in only one of the two clauses. A variable
    /// appearing with both polarities (the pivot) cancels out.
    pub fn resolve(&self, other: &Clause) -> Clause {
        let mut by_name: BTreeMap<&str, Vec<&Literal>> = BTreeMap::new();
        for l in self.lits.iter().chain(other.lits.iter()) {
            let entry = by_name.entry(l.name()).or_default();
            if !entry.contains(&l) {
                entry.push(l);
            }
        }

        let lits = by_name
            .into_values()
            .filter(|ls| ls.len() == 1)
            .map(|ls| ls[0].clone())
            .collect();
        Clause::from_lits(lits)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, l) in self.lits.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{l}")?;
        }
        Ok(())
    }
}
