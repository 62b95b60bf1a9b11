use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{Edge, Node};

/// Frame interval the spring constants are tuned for. Stepping with this `dt`
/// moves nodes by exactly `k * (d - L)` per edge.
pub const REFERENCE_DT: f64 = 0.016;

const MIN_DISTANCE: f64 = 1e-9;

/// How an edge's rest length follows the size of its endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestLength {
	/// Half the sum of the two footprint widths.
	HalfSum,
	/// `sqrt(wa * wb / 2)`.
	#[default]
	GeometricMean,
}

impl RestLength {
	pub fn between(self, a: &Node, b: &Node) -> f64 {
		match self {
			Self::HalfSum => (a.rect_width + b.rect_width) / 2.0,
			Self::GeometricMean => ((a.rect_width * b.rect_width) / 2.0).max(0.0).sqrt(),
		}
	}
}

/// Resolves every edge to the indices of its endpoints. Edges whose endpoints
/// are missing, or that loop back on themselves, resolve to `None`.
fn endpoint_indices(nodes: &[Node], edges: &[Edge]) -> Vec<Option<(usize, usize)>> {
	let index: HashMap<&str, usize> = nodes
		.iter()
		.enumerate()
		.map(|(i, node)| (node.id.as_str(), i))
		.collect();
	edges
		.iter()
		.map(|edge| {
			let from = *index.get(edge.source.as_str())?;
			let to = *index.get(edge.target.as_str())?;
			(from != to).then_some((from, to))
		})
		.collect()
}

/// Pulls (or pushes) each edge's endpoints toward its rest length. Both
/// endpoints move by the same amount in opposite directions; there is no mass
/// and no velocity carried between steps.
pub fn apply_springs(nodes: &mut [Node], edges: &mut [Edge], rest_length: RestLength, dt: f64) {
	let scale = dt / REFERENCE_DT;
	let pairs = endpoint_indices(nodes, edges);

	for (edge, pair) in edges.iter_mut().zip(pairs) {
		let Some((from, to)) = pair else {
			continue;
		};
		let rest = rest_length.between(&nodes[from], &nodes[to]);
		edge.rest_length = rest;

		let (dx, dy) = (nodes[to].x - nodes[from].x, nodes[to].y - nodes[from].y);
		let distance = (dx * dx + dy * dy).sqrt();
		// Coincident centers have no direction to pull along.
		if distance < MIN_DISTANCE {
			continue;
		}

		let force = edge.k * (distance - rest) * scale;
		let (fx, fy) = (dx / distance * force, dy / distance * force);
		nodes[from].x += fx;
		nodes[from].y += fy;
		nodes[to].x -= fx;
		nodes[to].y -= fy;
	}
}

/// One pass over all pairs: overlapping footprints are pushed apart by half the
/// overlap each, along whichever axis overlaps less. Residual overlap is left
/// for the next frame.
pub fn resolve_collisions(nodes: &mut [Node]) {
	let count = nodes.len();
	for i in 0..count {
		for j in (i + 1)..count {
			let (head, tail) = nodes.split_at_mut(j);
			separate(&mut head[i], &mut tail[0]);
		}
	}
}

fn separate(a: &mut Node, b: &mut Node) {
	let overlaps = a.left() < b.right()
		&& a.right() > b.left()
		&& a.top() < b.bottom()
		&& a.bottom() > b.top();
	if !overlaps {
		return;
	}

	let overlap_x = (a.right() - b.left()).min(b.right() - a.left());
	let overlap_y = (a.bottom() - b.top()).min(b.bottom() - a.top());

	if overlap_x < overlap_y {
		let offset = overlap_x / 2.0;
		if a.left() < b.left() {
			a.x -= offset;
			b.x += offset;
		} else {
			a.x += offset;
			b.x -= offset;
		}
	} else {
		let offset = overlap_y / 2.0;
		if a.top() < b.top() {
			a.y -= offset;
			b.y += offset;
		} else {
			a.y += offset;
			b.y -= offset;
		}
	}
}

/// A full layout step: springs first, then the collision pass.
pub fn step(nodes: &mut [Node], edges: &mut [Edge], rest_length: RestLength, dt: f64) {
	apply_springs(nodes, edges, rest_length, dt);
	resolve_collisions(nodes);
}
