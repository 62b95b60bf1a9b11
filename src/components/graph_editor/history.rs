use log::{debug, warn};

use super::graph::Graph;
use super::types::{Edge, Node, NodeId};

/// One user mutation, carrying what is needed to reverse it.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
	NodeCreated(Node),
	NodeRemoved(Node),
	NodeRenamed {
		id: NodeId,
		old_name: String,
		new_name: String,
	},
	NodeRecolored {
		id: NodeId,
		old_color: String,
		new_color: String,
	},
	EdgeCreated(Edge),
	EdgeRemoved(Edge),
	CanvasReset,
}

impl Action {
	pub fn label(&self) -> &'static str {
		match self {
			Self::NodeCreated(_) => "add node",
			Self::NodeRemoved(_) => "remove node",
			Self::NodeRenamed { .. } => "rename node",
			Self::NodeRecolored { .. } => "recolor node",
			Self::EdgeCreated(_) => "add connection",
			Self::EdgeRemoved(_) => "remove connection",
			Self::CanvasReset => "reset canvas",
		}
	}

	/// Applies the inverse of this action to `graph`.
	///
	/// Reversing a node removal puts the node back without its edges; those
	/// come back through the `EdgeRemoved` entries recorded beneath it.
	/// Reversing a reset does nothing.
	pub fn revert(self, graph: &mut Graph) {
		match self {
			Self::NodeCreated(node) => {
				graph.remove_node(&node.id);
			}
			Self::NodeRemoved(node) => {
				if graph.node_index(&node.id).is_none() {
					graph.add_node(node);
				}
			}
			Self::NodeRenamed { id, old_name, .. } => match graph.node_mut(&id) {
				Some(node) => node.name = old_name,
				None => warn!("cannot undo rename, node {id} is gone"),
			},
			Self::NodeRecolored { id, old_color, .. } => match graph.node_mut(&id) {
				Some(node) => node.fill_color = old_color,
				None => warn!("cannot undo recolor, node {id} is gone"),
			},
			Self::EdgeCreated(edge) => {
				graph.remove_edge(&edge.source, &edge.target);
			}
			Self::EdgeRemoved(edge) => {
				let (source, target) = (edge.source.clone(), edge.target.clone());
				if let Err(err) = graph.add_edge(edge) {
					warn!("cannot restore connection {source} -> {target}: {err}");
				}
			}
			Self::CanvasReset => {}
		}
	}
}

/// Linear, unbounded undo stack.
#[derive(Clone, Debug, Default)]
pub struct History {
	entries: Vec<Action>,
}

impl History {
	pub fn record(&mut self, action: Action) {
		debug!("record {}", action.label());
		self.entries.push(action);
	}

	/// Pops the newest entry and reverses it. Returns what was undone.
	pub fn undo(&mut self, graph: &mut Graph) -> Option<Action> {
		let action = self.entries.pop()?;
		debug!("undo {}", action.label());
		action.clone().revert(graph);
		Some(action)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn graph() -> Graph {
		let mut graph = Graph::default();
		graph.add_node(Node::new("a", "A", 0.0, 0.0, 10.0));
		graph.add_node(Node::new("b", "B", 50.0, 0.0, 10.0));
		graph
	}

	#[test]
	fn undo_node_creation_cascades_edges() {
		let mut g = graph();
		let mut history = History::default();
		let c = Node::new("c", "C", 0.0, 50.0, 10.0);
		g.add_node(c.clone());
		history.record(Action::NodeCreated(c));
		g.toggle_edge("c", "a", 0.01).unwrap();

		history.undo(&mut g);
		assert_eq!(g.nodes.len(), 2);
		assert!(g.edges.is_empty());
		assert!(history.is_empty());
	}

	#[test]
	fn undo_rename_and_recolor() {
		let mut g = graph();
		let mut history = History::default();
		g.node_mut("a").unwrap().name = "Renamed".into();
		history.record(Action::NodeRenamed {
			id: "a".into(),
			old_name: "A".into(),
			new_name: "Renamed".into(),
		});
		g.node_mut("a").unwrap().fill_color = "red".into();
		history.record(Action::NodeRecolored {
			id: "a".into(),
			old_color: "blue".into(),
			new_color: "red".into(),
		});

		history.undo(&mut g);
		assert_eq!(g.node("a").unwrap().fill_color, "blue");
		history.undo(&mut g);
		assert_eq!(g.node("a").unwrap().name, "A");
	}

	#[test]
	fn undo_edge_entries() {
		let mut g = graph();
		let mut history = History::default();
		let edge = Edge::new("a", "b", 0.01, None).unwrap();
		g.add_edge(edge.clone()).unwrap();
		history.record(Action::EdgeCreated(edge.clone()));
		let removed = g.remove_edge("a", "b").unwrap();
		history.record(Action::EdgeRemoved(removed));

		history.undo(&mut g);
		assert!(g.is_connected("a", "b"));
		history.undo(&mut g);
		assert!(!g.is_connected("a", "b"));
	}

	#[test]
	fn restoring_edge_to_missing_node_is_skipped() {
		let mut g = graph();
		let mut history = History::default();
		history.record(Action::EdgeRemoved(Edge::new("a", "gone", 0.01, None).unwrap()));
		assert!(history.undo(&mut g).is_some());
		assert!(g.edges.is_empty());
	}

	#[test]
	fn reset_undo_is_a_no_op() {
		let mut g = graph();
		let mut history = History::default();
		history.record(Action::CanvasReset);
		g.clear();
		assert_eq!(history.undo(&mut g), Some(Action::CanvasReset));
		assert!(g.nodes.is_empty());
		assert_eq!(history.undo(&mut g), None);
	}
}
