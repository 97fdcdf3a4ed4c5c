use kanon_validator::errors::*;

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use indexmap::IndexSet;
use noisy_float::prelude::{n64, N64};

use kanon_validator::base::Transformation;
use kanon_validator::config::SearchStrategy;

use crate::algorithms::{is_preferred, Search, SearchOutcome};
use crate::checker::NodeResult;
use crate::lattice::NodeId;

/// Nodes popped from the queue per batch, when checking in parallel.
fn batch_size() -> usize {
    rayon::current_num_threads().max(1)
}

/// Best-first search from the bottom, expanding the nodes with the lowest bound first.
///
/// Successors are only queued when they can still improve on the optimum.
/// If the queue runs empty within the budget, every node was either checked or ruled out.
pub fn best_first(mut search: Search) -> Result<SearchOutcome> {
    let space = search.lattice.space.clone();
    let mut queue = BinaryHeap::<Reverse<(N64, u32, Transformation)>>::new();
    let mut queued = IndexSet::<NodeId>::new();

    let bottom = space.bottom();
    queued.insert(space.id(&bottom));
    queue.push(Reverse((priority(&search, &bottom, 0.), bottom.level(), bottom)));

    while !queue.is_empty() {
        if search.budget.is_exhausted() {
            return Ok(search.finish(SearchStrategy::HeuristicBottomUp, false));
        }

        let mut batch = Vec::new();
        while batch.len() < batch_size() {
            let node = match queue.pop() {
                Some(Reverse((_, _, node))) => node,
                None => break
            };
            if let Some(bound) = search.checker.metric.lower_bound(&node) {
                if search.bound_excludes_generalizations(&bound, &node)? {
                    search.lattice.record_mut(&node).pruned_by_bound = true;
                    continue;
                }
                if search.bound_excludes(&bound, &node)? {
                    // the node itself is ruled out, its generalizations may not be
                    search.lattice.record_mut(&node).pruned_by_bound = true;
                    enqueue_successors(&mut search, &mut queue, &mut queued, &node, bound.value());
                    continue;
                }
            }
            batch.push(node);
        }

        for result in search.check_batch(batch)? {
            let expand = !(result.anonymous && search.prunes_successors_of_anonymous()) &&
                !search.bound_excludes_generalizations(&result.bound, &result.transformation)?;
            if expand {
                enqueue_successors(&mut search, &mut queue, &mut queued, &result.transformation, result.bound.value());
            } else {
                search.lattice.record_mut(&result.transformation).successors_pruned = true;
            }
        }
    }

    Ok(search.finish(SearchStrategy::HeuristicBottomUp, true))
}

/// Queue order of a node: its own lower bound if the metric offers one, or the bound inherited from the node that queued it.
fn priority(search: &Search, node: &Transformation, inherited: f64) -> N64 {
    let own = search.checker.metric.lower_bound(node).map(|bound| bound.value()).unwrap_or(inherited);
    n64(if own.is_finite() { own.max(inherited) } else { inherited })
}

fn enqueue_successors(
    search: &mut Search,
    queue: &mut BinaryHeap<Reverse<(N64, u32, Transformation)>>,
    queued: &mut IndexSet<NodeId>,
    node: &Transformation,
    inherited: f64,
) {
    let inherited = if inherited.is_finite() { inherited } else { 0. };
    for successor in search.lattice.space.successors(node) {
        if queued.insert(search.lattice.space.id(&successor)) {
            let priority = priority(search, &successor, inherited);
            queue.push(Reverse((priority, successor.level(), successor)));
        }
    }
}


/// Greedy descent from the top: repeatedly move to the best anonymous direct specialization.
///
/// Under monotonic privacy models, specializations of non-anonymous nodes are known to be non-anonymous, and skipped.
pub fn top_down(mut search: Search) -> Result<SearchOutcome> {
    let monotonic = search.checker.is_criteria_monotonic();
    let top = search.lattice.space.top();
    let mut current = match search.check(&top)? {
        Some(result) if result.anonymous => result,
        // under monotonic criteria, a non-anonymous top proves there is no solution
        Some(_) => return Ok(search.finish(SearchStrategy::HeuristicTopDown, monotonic)),
        None => return Ok(search.finish(SearchStrategy::HeuristicTopDown, false)),
    };

    loop {
        let candidates = search.lattice.space.predecessors(&current.transformation).into_iter()
            .filter(|node| !(monotonic && search.lattice.infer_anonymity(node) == Some(false)))
            .filter(|node| !search.lattice.is_checked(node))
            .collect::<Vec<Transformation>>();

        let mut best: Option<NodeResult> = None;
        for result in search.check_batch(candidates)? {
            if !result.anonymous {
                if monotonic {
                    mark_specializations_non_anonymous(&mut search, &result.transformation);
                }
                continue;
            }
            let improves = match &best {
                Some(best) => is_preferred(&result, best)?,
                None => true
            };
            if improves {
                best = Some(result);
            }
        }

        match best {
            Some(best) if is_preferred(&best, &current)? => current = best,
            _ => break
        }
    }

    Ok(search.finish(SearchStrategy::HeuristicTopDown, false))
}

fn mark_specializations_non_anonymous(search: &mut Search, node: &Transformation) {
    for predecessor in search.lattice.space.predecessors(node) {
        let record = search.lattice.record_mut(&predecessor);
        if record.anonymous.is_none() {
            record.anonymous = Some(false);
        }
    }
}
