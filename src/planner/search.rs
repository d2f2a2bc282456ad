use std::cmp::Reverse;
use std::collections::HashMap;

use priority_queue::PriorityQueue;
use tracing::debug;

use super::heuristic::Heuristic;
use super::state::State;
use super::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Orders by `g + h`, ties on lower `h`. Reopens states reached more cheaply.
    Astar,
    /// Orders by `h`, ties on lower `g`.
    Greedy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Solved { path: Vec<usize>, cost: u64 },
    /// The reachable state space is exhausted.
    Unsolvable,
    LimitReached,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStatistics {
    pub expanded: usize,
    pub generated: usize,
    pub evaluated: usize,
    pub reopened: usize,
}

struct Node {
    g: u64,
    h: Option<u64>,
    parent: Option<(usize, usize)>,
    closed: bool,
}

fn priority(mode: SearchMode, g: u64, h: u64) -> Reverse<(u64, u64)> {
    match mode {
        SearchMode::Astar => Reverse((g.saturating_add(h), h)),
        SearchMode::Greedy => Reverse((h, g)),
    }
}

fn reconstruct_path(nodes: &[Node], current: usize) -> Vec<usize> {
    let mut total_path = Vec::new();
    let mut current = current;
    while let Some((parent, action)) = nodes[current].parent {
        total_path.push(action);
        current = parent;
    }
    total_path.reverse();
    total_path
}

/// Best-first search from the initial state of `task`. Returns the grounded
/// action indices of the plan when one is found.
pub fn best_first_search(task: &Task, heuristic: &mut Heuristic, mode: SearchMode, max_expansions: usize)
        -> (SearchOutcome, SearchStatistics) {
    let mut stats = SearchStatistics::default();
    let mut ids: HashMap<State, usize> = HashMap::new();
    let mut states: Vec<State> = Vec::new();
    let mut nodes: Vec<Node> = Vec::new();
    let mut open = PriorityQueue::new();

    let start = task.init().clone();
    stats.evaluated += 1;
    let h0 = match heuristic.evaluate(&start) {
        Some(h) => h,
        None => return (SearchOutcome::Unsolvable, stats),
    };
    ids.insert(start.clone(), 0);
    states.push(start);
    nodes.push(Node { g: 0, h: Some(h0), parent: None, closed: false });
    open.push(0usize, priority(mode, 0, h0));

    while let Some((current, _)) = open.pop() {
        nodes[current].closed = true;
        if task.is_goal(&states[current]) {
            let path = reconstruct_path(&nodes, current);
            debug!(event = "search_end", expanded = stats.expanded, generated = stats.generated, plan_length = path.len());
            return (SearchOutcome::Solved { path, cost: nodes[current].g }, stats);
        }
        if stats.expanded >= max_expansions {
            return (SearchOutcome::LimitReached, stats);
        }
        stats.expanded += 1;

        let state = states[current].clone();
        let g = nodes[current].g;
        for a in task.applicable_actions(&state) {
            let action = &task.actions()[a];
            let successor = task.apply(&state, action);
            let succ_g = g + action.cost as u64;
            stats.generated += 1;
            match ids.get(&successor) {
                Some(&known) => {
                    let node = &mut nodes[known];
                    if mode == SearchMode::Astar && succ_g < node.g {
                        if let Some(h) = node.h {
                            node.g = succ_g;
                            node.parent = Some((current, a));
                            if node.closed {
                                node.closed = false;
                                stats.reopened += 1;
                            }
                            open.push(known, priority(mode, succ_g, h));
                        }
                    }
                }
                None => {
                    stats.evaluated += 1;
                    let h = heuristic.evaluate(&successor);
                    let id = states.len();
                    ids.insert(successor.clone(), id);
                    states.push(successor);
                    // dead ends are remembered as closed so they are never evaluated twice
                    nodes.push(Node { g: succ_g, h, parent: Some((current, a)), closed: h.is_none() });
                    if let Some(h) = h {
                        open.push(id, priority(mode, succ_g, h));
                    }
                }
            }
        }
        if stats.expanded % 10_000 == 0 {
            debug!(event = "search_progress", expanded = stats.expanded, open = open.len(), states = states.len());
        }
    }
    (SearchOutcome::Unsolvable, stats)
}
