use clap::ValueEnum;

/// Branching policy selection, one per solver variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HeuristicKind {
    /// Lexically first unassigned variable.
    First,
    /// Uniform random unassigned variable.
    Random,
    /// Most frequent variable among binary clauses.
    TwoClause,
    /// Most frequent variable over all clauses.
    NClause,
    /// VSIDS-style activity decay.
    Activity,
}

/// Explicit engine configuration, passed into constructors instead of
/// process-wide settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub heuristic: HeuristicKind,
    /// Multiplicative activity decay applied after each conflict.
    pub decay: f64,
    /// Fixed seed for the random heuristic; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Number of timed solve iterations the harness runs.
    pub iterations: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            heuristic: HeuristicKind::First,
            decay: 0.4,
            seed: None,
            iterations: 1,
        }
    }
}

impl Config {
    pub fn with_heuristic(heuristic: HeuristicKind) -> Config {
        Config { heuristic, ..Config::default() }
    }
}
