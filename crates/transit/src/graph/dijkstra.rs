use std::{cmp::Ordering, collections::BinaryHeap};

#[derive(Copy, Clone, Debug)]
pub(super) struct Edge {
    pub(super) to: usize,
    pub(super) weight: f64,
}

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node: usize,
}

impl Eq for State {}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra's algorithm over an adjacency list with non-negative weights.
///
/// Returns the total cost and the node sequence from `start` to `target`,
/// or `None` when `target` is unreachable.
pub(super) fn dijkstra_path(
    adjacency: &[Vec<Edge>],
    start: usize,
    target: usize,
) -> Option<(f64, Vec<usize>)> {
    let mut distances = vec![f64::INFINITY; adjacency.len()];
    let mut predecessors: Vec<Option<usize>> = vec![None; adjacency.len()];
    let mut heap = BinaryHeap::new();

    // Start node has distance 0
    distances[start] = 0.0;
    heap.push(State {
        cost: 0.0,
        node: start,
    });

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            break;
        }

        // Skip if we've found a better path
        if cost > distances[node] {
            continue;
        }

        for edge in &adjacency[node] {
            let next_cost = cost + edge.weight;
            if next_cost < distances[edge.to] {
                distances[edge.to] = next_cost;
                predecessors[edge.to] = Some(node);
                heap.push(State {
                    cost: next_cost,
                    node: edge.to,
                });
            }
        }
    }

    if distances[target].is_infinite() {
        return None;
    }

    let mut path = vec![target];
    let mut current = target;
    while let Some(previous) = predecessors[current] {
        path.push(previous);
        current = previous;
    }
    path.reverse();

    Some((distances[target], path))
}
