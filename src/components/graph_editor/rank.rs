use std::collections::HashMap;

use super::types::{Edge, Node};

pub const DEFAULT_DAMPING: f64 = 0.85;
pub const DEFAULT_ITERATIONS: usize = 20;

/// PageRank over the directed edges, one score per node in node order.
///
/// Runs exactly `iterations` rounds from a uniform start. A node without
/// outgoing edges hands its rank to nobody, so with dangling nodes the scores
/// sum to less than one.
pub fn page_rank(nodes: &[Node], edges: &[Edge], damping: f64, iterations: usize) -> Vec<f64> {
	let n = nodes.len();
	if n == 0 {
		return Vec::new();
	}

	let index: HashMap<&str, usize> = nodes
		.iter()
		.enumerate()
		.map(|(i, node)| (node.id.as_str(), i))
		.collect();
	let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
	for edge in edges {
		if let (Some(&from), Some(&to)) = (
			index.get(edge.source.as_str()),
			index.get(edge.target.as_str()),
		) {
			outgoing[from].push(to);
		}
	}

	let base = (1.0 - damping) / n as f64;
	let mut ranks = vec![1.0 / n as f64; n];
	let mut next = vec![0.0; n];
	for _ in 0..iterations {
		next.fill(0.0);
		for (from, targets) in outgoing.iter().enumerate() {
			if targets.is_empty() {
				continue;
			}
			let share = ranks[from] / targets.len() as f64;
			for &to in targets {
				next[to] += share;
			}
		}
		for value in next.iter_mut() {
			*value = base + damping * *value;
		}
		std::mem::swap(&mut ranks, &mut next);
	}
	ranks
}

/// Recomputes every node's rank in place.
pub fn assign_ranks(nodes: &mut [Node], edges: &[Edge], damping: f64, iterations: usize) {
	let ranks = page_rank(nodes, edges, damping, iterations);
	for (node, rank) in nodes.iter_mut().zip(ranks) {
		node.rank = Some(rank);
	}
}

/// Frame counter that lets ranking run on the first frame and then every
/// `every` frames.
#[derive(Clone, Debug)]
pub struct RankSchedule {
	every: u64,
	frame: u64,
}

impl RankSchedule {
	pub fn new(every: u64) -> Self {
		Self {
			every: every.max(1),
			frame: 0,
		}
	}

	/// Advances one frame; true when ranking is due on this frame.
	pub fn tick(&mut self) -> bool {
		let due = self.frame % self.every == 0;
		self.frame = self.frame.wrapping_add(1);
		due
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn nodes(ids: &[&str]) -> Vec<Node> {
		ids.iter().map(|id| Node::new(*id, *id, 0.0, 0.0, 10.0)).collect()
	}

	fn edge(a: &str, b: &str) -> Edge {
		Edge::new(a, b, 0.01, None).unwrap()
	}

	#[test]
	fn two_cycle_is_uniform() {
		let ranks = page_rank(&nodes(&["a", "b"]), &[edge("a", "b"), edge("b", "a")], 0.85, 20);
		assert!((ranks[0] - 0.5).abs() < 1e-12);
		assert!((ranks[1] - 0.5).abs() < 1e-12);
	}

	#[test]
	fn sums_to_one_without_dangling_nodes() {
		let ns = nodes(&["a", "b", "c", "d"]);
		let es = [
			edge("a", "b"),
			edge("b", "c"),
			edge("c", "a"),
			edge("c", "d"),
			edge("d", "b"),
		];
		for iterations in [1, 2, 7, 20] {
			let total: f64 = page_rank(&ns, &es, 0.85, iterations).iter().sum();
			assert!((total - 1.0).abs() < 1e-9, "{iterations}: {total}");
		}
	}

	#[test]
	fn dangling_mass_is_lost() {
		let total: f64 = page_rank(&nodes(&["a", "b"]), &[edge("a", "b")], 0.85, 5)
			.iter()
			.sum();
		assert!(total < 1.0);
	}

	#[test]
	fn first_iteration_matches_formula() {
		let ns = nodes(&["a", "b", "c"]);
		let ranks = page_rank(&ns, &[edge("a", "b"), edge("b", "c")], 0.85, 1);
		let base = 0.15 / 3.0;
		let third = 1.0 / 3.0;
		assert!((ranks[0] - base).abs() < 1e-12);
		assert!((ranks[1] - (base + 0.85 * third)).abs() < 1e-12);
		assert!((ranks[2] - (base + 0.85 * third)).abs() < 1e-12);
	}

	#[test]
	fn zero_iterations_is_uniform_and_empty_is_empty() {
		assert_eq!(page_rank(&nodes(&["a", "b"]), &[], 0.85, 0), vec![0.5, 0.5]);
		assert!(page_rank(&[], &[], 0.85, 20).is_empty());
	}

	#[test]
	fn assign_writes_every_node() {
		let mut ns = nodes(&["a", "b", "c"]);
		assign_ranks(&mut ns, &[edge("a", "b")], DEFAULT_DAMPING, DEFAULT_ITERATIONS);
		assert!(ns.iter().all(|n| n.rank.is_some()));
		assert!(ns[1].rank > ns[0].rank);
	}

	#[test]
	fn schedule_runs_first_then_every_nth() {
		let mut schedule = RankSchedule::new(3);
		let due: Vec<bool> = (0..7).map(|_| schedule.tick()).collect();
		assert_eq!(due, vec![true, false, false, true, false, false, true]);
	}
}
