//! Search strategies over the generalization lattice
//!
//! All strategies share one [`Search`] context: the node checker, the records of the lattice,
//! the step and time budget, and the best anonymous node found so far.
//! Node checks may run on the rayon thread pool; their results are committed on the search thread only.

use kanon_validator::errors::*;

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use kanon_validator::base::Transformation;
use kanon_validator::config::{SearchConfig, SearchStrategy};

use crate::checker::{NodeChecker, NodeResult};
use crate::lattice::{Lattice, SolutionSpace};
use crate::metrics::InformationLoss;

pub mod exhaustive;
pub mod genetic;
pub mod heuristic;

/// Limits of a search, checked between node checks.
#[derive(Clone, Debug)]
pub struct Budget {
    steps: Option<usize>,
    deadline: Option<Instant>,
    used: usize,
    exhausted: bool,
}

impl Budget {
    pub fn new(config: &SearchConfig) -> Self {
        Budget {
            steps: config.step_limit,
            deadline: config.time_limit_ms.map(|limit| Instant::now() + Duration::from_millis(limit)),
            used: 0,
            exhausted: false,
        }
    }

    /// Node checks left, if limited.
    pub fn remaining(&self) -> Option<usize> {
        self.steps.map(|steps| steps.saturating_sub(self.used))
    }

    pub fn spend(&mut self, checks: usize) {
        self.used += checks;
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn is_exhausted(&mut self) -> bool {
        if !self.exhausted {
            let steps = self.remaining() == Some(0);
            let time = self.deadline.map(|deadline| Instant::now() >= deadline).unwrap_or(false);
            if steps || time {
                tracing::warn!(checks = self.used, "search budget exhausted");
                self.exhausted = true;
            }
        }
        self.exhausted
    }
}

/// Whether a result is preferred over another: lower loss, then lower total level, then the lexicographically smaller node.
pub fn is_preferred(result: &NodeResult, other: &NodeResult) -> Result<bool> {
    Ok(match result.loss.compare_to(&other.loss)? {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => result.transformation.cmp_preference(&other.transformation) == Ordering::Less
    })
}

/// What a search found.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// Best anonymous node, if any was found.
    pub optimum: Option<NodeResult>,
    /// No node of the lattice is preferred over the optimum, or no node is anonymous.
    pub optimal: bool,
    pub strategy: SearchStrategy,
    pub checks: usize,
    pub lattice: Lattice,
}

/// State shared by the strategies.
pub struct Search<'a> {
    pub checker: &'a NodeChecker,
    pub lattice: Lattice,
    pub budget: Budget,
    pub optimum: Option<NodeResult>,
    parallel: bool,
}

impl<'a> Search<'a> {
    pub fn new(checker: &'a NodeChecker, space: SolutionSpace, config: &SearchConfig) -> Self {
        Search {
            checker,
            lattice: Lattice::new(space),
            budget: Budget::new(config),
            optimum: None,
            parallel: config.parallel,
        }
    }

    /// Check nodes, within the budget, and commit their results.
    pub fn check_batch(&mut self, mut nodes: Vec<Transformation>) -> Result<Vec<NodeResult>> {
        if self.budget.is_exhausted() {
            return Ok(Vec::new());
        }
        if let Some(remaining) = self.budget.remaining() {
            nodes.truncate(remaining);
        }

        let checker = self.checker;
        let results = if self.parallel && nodes.len() > 1 {
            nodes.par_iter().map(|node| checker.check(node)).collect::<Vec<NodeResult>>()
        } else {
            nodes.iter().map(|node| checker.check(node)).collect::<Vec<NodeResult>>()
        };
        self.budget.spend(results.len());

        for result in results.iter() {
            self.commit(result)?;
        }
        Ok(results)
    }

    pub fn check(&mut self, node: &Transformation) -> Result<Option<NodeResult>> {
        Ok(self.check_batch(vec![node.clone()])?.pop())
    }

    fn commit(&mut self, result: &NodeResult) -> Result<()> {
        let record = self.lattice.record_mut(&result.transformation);
        record.checked = true;
        record.anonymous = Some(result.anonymous);
        record.set_loss(result.loss.clone());
        record.set_bound(result.bound.clone());

        if result.anonymous {
            let improves = match &self.optimum {
                Some(optimum) => is_preferred(result, optimum)?,
                None => true
            };
            if improves {
                tracing::debug!(node = %result.transformation, loss = %result.loss, "new optimum");
                self.optimum = Some(result.clone());
            }
        }
        Ok(())
    }

    /// Generalizations of an anonymous node cannot be preferred over it.
    pub fn prunes_successors_of_anonymous(&self) -> bool {
        self.checker.is_criteria_monotonic() && self.checker.is_metric_monotonic()
    }

    /// Whether a lower bound on the loss of a node rules the node out.
    pub fn bound_excludes(&self, bound: &InformationLoss, node: &Transformation) -> Result<bool> {
        Ok(match &self.optimum {
            Some(optimum) => match bound.compare_to(&optimum.loss)? {
                Ordering::Greater => true,
                Ordering::Equal => optimum.transformation.cmp_preference(node) == Ordering::Less,
                Ordering::Less => false,
            },
            None => false
        })
    }

    /// Whether a lower bound on the loss of every generalization of a node rules them all out.
    ///
    /// Generalizations lie strictly above the node, so an optimum at most as high wins ties.
    pub fn bound_excludes_generalizations(&self, bound: &InformationLoss, node: &Transformation) -> Result<bool> {
        Ok(match &self.optimum {
            Some(optimum) => match bound.compare_to(&optimum.loss)? {
                Ordering::Greater => true,
                Ordering::Equal => optimum.transformation.level() <= node.level(),
                Ordering::Less => false,
            },
            None => false
        })
    }

    /// Whether the whole lattice has been checked.
    pub fn is_complete(&self) -> bool {
        self.lattice.num_checked() as u64 == self.lattice.space.size()
    }

    pub fn finish(mut self, strategy: SearchStrategy, optimal: bool) -> SearchOutcome {
        let optimal = optimal && !self.budget.is_exhausted() || self.is_complete();
        SearchOutcome {
            optimum: self.optimum,
            optimal,
            strategy,
            checks: self.budget.used(),
            lattice: self.lattice,
        }
    }
}


/// Run the configured strategy.
pub fn search(checker: &NodeChecker, space: SolutionSpace, config: &SearchConfig) -> Result<SearchOutcome> {
    let strategy = match config.strategy {
        SearchStrategy::Auto if space.size() <= config.exhaustive_threshold => SearchStrategy::Exhaustive,
        SearchStrategy::Auto => SearchStrategy::HeuristicBottomUp,
        strategy => strategy
    };
    if strategy == SearchStrategy::Exhaustive && space.size() > config.exhaustive_threshold {
        tracing::warn!(size = space.size(), threshold = config.exhaustive_threshold,
            "exhaustive search of a lattice above the size threshold");
    }
    tracing::info!(?strategy, size = space.size(), "starting search");

    let search = Search::new(checker, space, config);
    let outcome = match strategy {
        SearchStrategy::Exhaustive => exhaustive::search(search)?,
        SearchStrategy::HeuristicBottomUp => heuristic::best_first(search)?,
        SearchStrategy::HeuristicTopDown => heuristic::top_down(search)?,
        SearchStrategy::Genetic => genetic::search(search, &config.genetic, config.seed)?,
        SearchStrategy::Auto => return Err("no strategy selected".into()),
    };

    match &outcome.optimum {
        Some(optimum) => tracing::info!(
            checks = outcome.checks, optimal = outcome.optimal, node = %optimum.transformation, loss = %optimum.loss,
            "search finished"),
        None => tracing::info!(checks = outcome.checks, optimal = outcome.optimal, "search finished without a solution"),
    }
    Ok(outcome)
}
