//! Shared A\* skeleton for the rail and ship searches.
//!
//! Both searches have the same structure: a pool of search states with
//! parent links, a binary-heap frontier ordered by `g + h`, and a key-based
//! closed set where a key is closed the first time a state carrying it is
//! popped. They differ only in the state type, the successor rule, and the
//! pool cap, which are all parameters here.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashSet;
use std::hash::Hash;

/// A state entering the frontier: either a seed or a successor.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<S> {
    pub state: S,
    /// Path cost accumulated on arrival (for successors, the step cost; the
    /// search adds the parent's cost).
    pub cost: f32,
    /// Estimated remaining cost to the goal. Must not overestimate.
    pub heuristic: f32,
}

struct SearchNode<S> {
    state: S,
    distance: f32,
    previous: usize,
}

struct QueueEntry {
    score: f32,
    index: usize,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we pop the lowest score.
        other.score.total_cmp(&self.score)
    }
}

/// Run an A\* search.
///
/// - `seeds` enter the frontier with their own cost and heuristic.
/// - `successors(state, push)` emits the expansions of a popped state.
/// - `key` identifies states for the closed set; states with `None` are
///   never closed (used for synthetic start states).
/// - `max_nodes` caps the search pool; exhausting it fails the search.
///
/// Returns the chain of states from seed to goal inclusive, or `None` when
/// the frontier empties or the pool fills before a goal state is popped.
pub fn astar<S, K>(
    seeds: impl IntoIterator<Item = Candidate<S>>,
    mut successors: impl FnMut(&S, &mut dyn FnMut(Candidate<S>)),
    mut is_goal: impl FnMut(&S) -> bool,
    mut key: impl FnMut(&S) -> Option<K>,
    max_nodes: usize,
) -> Option<Vec<S>>
where
    S: Copy,
    K: Eq + Hash,
{
    let mut nodes: Vec<SearchNode<S>> = Vec::new();
    let mut queue: BinaryHeap<QueueEntry> = BinaryHeap::new();
    let mut closed: HashSet<K> = HashSet::new();

    for seed in seeds {
        if nodes.len() >= max_nodes {
            return None;
        }
        queue.push(QueueEntry {
            score: seed.cost + seed.heuristic,
            index: nodes.len(),
        });
        nodes.push(SearchNode {
            state: seed.state,
            distance: seed.cost,
            previous: usize::MAX,
        });
    }

    while let Some(entry) = queue.pop() {
        let index = entry.index;
        // Close on first pop; later pops of the same key are stale.
        if let Some(k) = key(&nodes[index].state) {
            if !closed.insert(k) {
                continue;
            }
        }

        if is_goal(&nodes[index].state) {
            let mut chain = Vec::new();
            let mut ii = index;
            loop {
                chain.push(nodes[ii].state);
                if nodes[ii].previous == usize::MAX {
                    break;
                }
                ii = nodes[ii].previous;
            }
            chain.reverse();
            return Some(chain);
        }

        let parent_distance = nodes[index].distance;
        let parent_state = nodes[index].state;
        let mut exhausted = false;
        successors(&parent_state, &mut |candidate| {
            if exhausted {
                return;
            }
            if let Some(k) = key(&candidate.state) {
                if closed.contains(&k) {
                    return;
                }
            }
            if nodes.len() >= max_nodes {
                exhausted = true;
                return;
            }
            let distance = parent_distance + candidate.cost;
            queue.push(QueueEntry {
                score: distance + candidate.heuristic,
                index: nodes.len(),
            });
            nodes.push(SearchNode {
                state: candidate.state,
                distance,
                previous: index,
            });
        });
        if exhausted {
            return None;
        }
    }

    None
}
