use kanon_validator::errors::*;

use kanon_validator::base::Transformation;
use kanon_validator::config::SearchStrategy;

use crate::algorithms::{Search, SearchOutcome};

/// Check the lattice level by level, bottom up, each level as one parallel batch.
///
/// Nodes are skipped when
/// * a more specific node is anonymous, and both the privacy models and the metric are monotonic,
/// * the lower bound of a more specific node, or the node's own lower bound, rules them out.
pub fn search(mut search: Search) -> Result<SearchOutcome> {
    // under monotonic criteria, nothing is anonymous if the top is not
    if search.checker.is_criteria_monotonic() {
        let top = search.lattice.space.top();
        if let Some(result) = search.check(&top)? {
            if !result.anonymous {
                tracing::debug!("top node is not anonymous");
                return Ok(search.finish(SearchStrategy::Exhaustive, true));
            }
        }
    }

    let space = search.lattice.space.clone();
    for level in 0..=space.max_level() {
        if search.budget.is_exhausted() {
            break;
        }

        let mut candidates = Vec::new();
        for node in space.level(level) {
            if search.budget.remaining().map(|remaining| candidates.len() >= remaining).unwrap_or(false) {
                break;
            }
            if search.lattice.is_pruned(&node) {
                prune_successors(&mut search, &node);
                continue;
            }
            if let Some(bound) = search.checker.metric.lower_bound(&node) {
                if search.bound_excludes(&bound, &node)? {
                    tracing::debug!(node = %node, "pruned by lower bound");
                    search.lattice.record_mut(&node).pruned_by_bound = true;
                    if search.bound_excludes_generalizations(&bound, &node)? {
                        prune_successors(&mut search, &node);
                    }
                    continue;
                }
            }
            if !search.lattice.is_checked(&node) {
                candidates.push(node);
            }
        }

        for result in search.check_batch(candidates)? {
            if result.anonymous && search.prunes_successors_of_anonymous() {
                search.lattice.record_mut(&result.transformation).successors_pruned = true;
                prune_successors(&mut search, &result.transformation);
            } else if search.bound_excludes_generalizations(&result.bound, &result.transformation)? {
                search.lattice.record_mut(&result.transformation).successors_pruned = true;
                prune_successors(&mut search, &result.transformation);
            }
        }
    }

    Ok(search.finish(SearchStrategy::Exhaustive, true))
}

/// Carry the pruning of a node, and its anonymity under monotonic criteria, to its direct generalizations.
fn prune_successors(search: &mut Search, node: &Transformation) {
    let anonymous = search.lattice.anonymous(node) == Some(true) && search.checker.is_criteria_monotonic();
    for successor in search.lattice.space.successors(node) {
        let record = search.lattice.record_mut(&successor);
        record.successors_pruned = true;
        if anonymous && record.anonymous.is_none() {
            record.anonymous = Some(true);
        }
    }
}
