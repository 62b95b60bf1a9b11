use std::collections::HashSet;

use log::debug;

use super::error::EditorError;
use super::types::{DIMENSION_COLORS, Dimension, DimensionId, Edge, Node};

/// Result of connecting a pair that may already be connected.
#[derive(Clone, Debug, PartialEq)]
pub enum Toggle {
	Added(Edge),
	Removed(Edge),
}

/// The shared simulation context: everything layout, ranking and the
/// interaction controller read and write.
///
/// Node order is insertion order; selection cycling and ranking output both
/// follow it.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	pub nodes: Vec<Node>,
	pub edges: Vec<Edge>,
	pub dimensions: Vec<Dimension>,
	pub current_dimension: Option<DimensionId>,
}

impl Graph {
	pub fn node_index(&self, id: &str) -> Option<usize> {
		self.nodes.iter().position(|node| node.id == id)
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|node| node.id == id)
	}

	pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
		self.nodes.iter_mut().find(|node| node.id == id)
	}

	/// First node, in insertion order, whose footprint contains the point.
	pub fn node_at(&self, x: f64, y: f64) -> Option<&Node> {
		self.nodes.iter().find(|node| node.contains(x, y))
	}

	/// Like [`Graph::node_at`] but skipping `exclude`.
	pub fn node_at_except(&self, x: f64, y: f64, exclude: &str) -> Option<&Node> {
		self.nodes
			.iter()
			.find(|node| node.id != exclude && node.contains(x, y))
	}

	pub fn node_within_radius(&self, x: f64, y: f64) -> Option<&Node> {
		self.nodes.iter().find(|node| node.within_radius(x, y))
	}

	pub fn add_node(&mut self, node: Node) {
		debug!("add node {} {:?}", node.id, node.name);
		self.nodes.push(node);
	}

	/// Removes a node together with every edge touching it. The cascaded edges
	/// are returned in the order they were removed.
	pub fn remove_node(&mut self, id: &str) -> Option<(Node, Vec<Edge>)> {
		let index = self.node_index(id)?;
		let node = self.nodes.remove(index);
		let edges = self.remove_edges_touching(id);
		debug!("remove node {id} with {} edges", edges.len());
		Some((node, edges))
	}

	pub fn remove_edges_touching(&mut self, id: &str) -> Vec<Edge> {
		let mut removed = Vec::new();
		// back to front, mirroring splice-while-iterating
		for index in (0..self.edges.len()).rev() {
			if self.edges[index].touches(id) {
				removed.push(self.edges.remove(index));
			}
		}
		removed
	}

	pub fn edge_index(&self, source: &str, target: &str) -> Option<usize> {
		self.edges.iter().position(|edge| edge.connects(source, target))
	}

	/// Directed: `a -> b` does not make `b -> a` connected.
	pub fn is_connected(&self, source: &str, target: &str) -> bool {
		self.edge_index(source, target).is_some()
	}

	/// Inserts an edge. Self-loops, unknown endpoints and a second edge for the
	/// same ordered pair are rejected.
	pub fn add_edge(&mut self, edge: Edge) -> Result<(), EditorError> {
		if edge.source == edge.target {
			return Err(EditorError::SelfLoop(edge.source));
		}
		for id in [&edge.source, &edge.target] {
			if self.node_index(id).is_none() {
				return Err(EditorError::UnknownNode(id.clone()));
			}
		}
		if self.is_connected(&edge.source, &edge.target) {
			return Err(EditorError::DuplicateEdge {
				from: edge.source,
				to: edge.target,
			});
		}
		debug!("add edge {} -> {}", edge.source, edge.target);
		self.edges.push(edge);
		Ok(())
	}

	pub fn remove_edge(&mut self, source: &str, target: &str) -> Option<Edge> {
		let index = self.edge_index(source, target)?;
		debug!("remove edge {source} -> {target}");
		Some(self.edges.remove(index))
	}

	/// Removes `source -> target` if present, otherwise creates it with
	/// stiffness `k` in the current dimension.
	pub fn toggle_edge(&mut self, source: &str, target: &str, k: f64) -> Result<Toggle, EditorError> {
		if let Some(edge) = self.remove_edge(source, target) {
			return Ok(Toggle::Removed(edge));
		}
		let edge = Edge::new(source, target, k, self.current_dimension.clone())?;
		self.add_edge(edge.clone())?;
		Ok(Toggle::Added(edge))
	}

	/// Ids of nodes sharing an edge with `id`, in either direction.
	pub fn neighbors(&self, id: &str) -> HashSet<String> {
		self.edges
			.iter()
			.filter_map(|edge| {
				if edge.source == id {
					Some(edge.target.clone())
				} else if edge.target == id {
					Some(edge.source.clone())
				} else {
					None
				}
			})
			.collect()
	}

	pub fn translate_all(&mut self, dx: f64, dy: f64) {
		for node in &mut self.nodes {
			node.x += dx;
			node.y += dy;
		}
	}

	/// Drops all nodes and edges. Dimensions survive a reset.
	pub fn clear(&mut self) {
		self.nodes.clear();
		self.edges.clear();
	}

	pub fn dimension(&self, id: &str) -> Option<&Dimension> {
		self.dimensions.iter().find(|dimension| dimension.id == id)
	}

	pub fn current_dimension(&self) -> Option<&Dimension> {
		self.current_dimension
			.as_deref()
			.and_then(|id| self.dimension(id))
	}

	pub fn ensure_default_dimension(&mut self) {
		if self.dimensions.is_empty() {
			let dimension = Dimension::new("Default", "#000000");
			self.current_dimension = Some(dimension.id.clone());
			self.dimensions.push(dimension);
		} else if self.current_dimension().is_none() {
			self.current_dimension = Some(self.dimensions[0].id.clone());
		}
	}

	/// Creates a dimension colored from the palette and makes it current.
	pub fn create_dimension(&mut self, name: &str) -> &Dimension {
		let color = DIMENSION_COLORS[self.dimensions.len() % DIMENSION_COLORS.len()];
		let dimension = Dimension::new(name.trim(), color);
		debug!("create dimension {:?} {}", dimension.name, dimension.color);
		self.current_dimension = Some(dimension.id.clone());
		self.dimensions.push(dimension);
		&self.dimensions[self.dimensions.len() - 1]
	}

	pub fn select_dimension(&mut self, id: &str) -> bool {
		if self.dimension(id).is_none() {
			return false;
		}
		self.current_dimension = Some(id.to_owned());
		true
	}

	/// Flips visibility and returns the new value.
	pub fn toggle_dimension_visibility(&mut self, id: &str) -> Option<bool> {
		let dimension = self
			.dimensions
			.iter_mut()
			.find(|dimension| dimension.id == id)?;
		dimension.visible = !dimension.visible;
		Some(dimension.visible)
	}

	/// Edges without a dimension, or in a dimension that no longer exists, are
	/// always shown.
	pub fn edge_visible(&self, edge: &Edge) -> bool {
		edge.dimension
			.as_deref()
			.and_then(|id| self.dimension(id))
			.is_none_or(|dimension| dimension.visible)
	}
}
