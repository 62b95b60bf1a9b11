use std::collections::HashSet;

use log::{debug, info, warn};

use super::config::{EditorConfig, RenderMode};
use super::document::{Document, LoadReport};
use super::geometry::{TextMeasure, label_box};
use super::graph::{Graph, Toggle};
use super::history::{Action, History};
use super::layout;
use super::rank::{self, RankSchedule};
use super::types::{Node, NodeId, new_id};

/// Asks the user for a line of text. `None` means the prompt was cancelled.
pub trait Prompter {
	fn prompt(&mut self, message: &str, default: &str) -> Option<String>;
}

/// The parts of a key press the editor reacts to. `ctrl` is true for either
/// Control or Meta.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyInput {
	pub key: String,
	pub ctrl: bool,
	pub shift: bool,
}

impl KeyInput {
	pub fn new(key: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			..Self::default()
		}
	}

	pub fn ctrl(mut self) -> Self {
		self.ctrl = true;
		self
	}

	pub fn shift(mut self) -> Self {
		self.shift = true;
		self
	}
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<NodeId>,
	pub neighbors: HashSet<NodeId>,
	pub highlight_t: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<NodeId>,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub last_x: f64,
	pub last_y: f64,
}

/// Interaction controller: owns the graph and everything the pointer and
/// keyboard handlers mutate between animation frames.
pub struct EditorState {
	pub graph: Graph,
	pub history: History,
	pub config: EditorConfig,
	pub width: f64,
	pub height: f64,
	pub hover: HoverState,
	pub selected: Option<NodeId>,
	pub drag: DragState,
	/// Anchor of connect mode, entered by double-click or double-tap.
	pub connecting: Option<NodeId>,
	pub pan: PanState,
	pub animation_running: bool,
	last_tap_ms: Option<f64>,
	last_touch: (f64, f64),
	/// The tap that entered connect mode has not been released yet.
	pending_touch_connect: bool,
	rank_schedule: RankSchedule,
}

impl EditorState {
	pub fn new(config: EditorConfig, width: f64, height: f64) -> Self {
		let mut graph = Graph::default();
		graph.ensure_default_dimension();
		Self {
			graph,
			history: History::default(),
			rank_schedule: RankSchedule::new(config.rank_every),
			config,
			width,
			height,
			hover: HoverState::default(),
			selected: None,
			drag: DragState::default(),
			connecting: None,
			pan: PanState::default(),
			animation_running: true,
			last_tap_ms: None,
			last_touch: (0.0, 0.0),
			pending_touch_connect: false,
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	pub fn default_radius(&self) -> f64 {
		self.config.default_radius(self.width.min(self.height))
	}

	fn hit(&self, x: f64, y: f64) -> Option<NodeId> {
		self.graph.node_at(x, y).map(|node| node.id.clone())
	}

	pub fn set_hover(&mut self, node: Option<NodeId>) {
		if self.hover.node == node {
			return;
		}
		self.hover.neighbors = match &node {
			Some(id) => self.graph.neighbors(id),
			None => HashSet::new(),
		};
		self.hover.node = node;
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id) || self.hover.neighbors.contains(id)
	}

	// Pointer gestures

	/// Mouse button down. A node is selected and dragged unless connect mode
	/// is active; empty canvas starts a pan.
	pub fn press(&mut self, x: f64, y: f64) {
		match self.hit(x, y) {
			Some(id) => {
				self.selected = Some(id.clone());
				self.drag.node = if self.connecting.is_some() { None } else { Some(id) };
			}
			None => {
				self.pan = PanState {
					active: true,
					last_x: x,
					last_y: y,
				};
			}
		}
	}

	pub fn move_to(&mut self, x: f64, y: f64) {
		if let Some(id) = self.drag.node.clone() {
			if let Some(node) = self.graph.node_mut(&id) {
				node.x = x;
				node.y = y;
			}
			return;
		}

		let hovered = self.hit(x, y);
		self.set_hover(hovered);

		if self.pan.active {
			let (dx, dy) = (x - self.pan.last_x, y - self.pan.last_y);
			self.graph.translate_all(dx, dy);
			self.pan.last_x = x;
			self.pan.last_y = y;
		}
	}

	/// Mouse button up: finishes connect mode over a target, ends drag and pan.
	pub fn release(&mut self, x: f64, y: f64) {
		if self.connecting.is_some() {
			self.complete_connect(x, y);
		}
		self.drag.node = None;
		self.pan.active = false;
	}

	/// Pointer left the canvas.
	pub fn leave(&mut self) {
		self.drag.node = None;
		self.pan.active = false;
		self.set_hover(None);
	}

	fn complete_connect(&mut self, x: f64, y: f64) {
		let Some(anchor) = self.connecting.take() else {
			return;
		};
		let Some(target) = self
			.graph
			.node_at_except(x, y, &anchor)
			.map(|node| node.id.clone())
		else {
			debug!("connect from {anchor} released over nothing");
			return;
		};
		self.connect(&anchor, &target);
	}

	/// Double-click: cancels a drag or connect in progress, otherwise enters
	/// connect mode on a node or creates a node on empty canvas.
	pub fn double_click(&mut self, x: f64, y: f64, prompter: &mut impl Prompter) {
		if self.drag.node.is_some() || self.connecting.is_some() {
			self.drag.node = None;
			self.connecting = None;
			return;
		}
		self.activate(x, y, prompter);
	}

	fn activate(&mut self, x: f64, y: f64, prompter: &mut impl Prompter) -> bool {
		match self.hit(x, y) {
			Some(id) => {
				debug!("connect mode from {id}");
				self.drag.node = None;
				self.connecting = Some(id);
				true
			}
			None => {
				let name = prompter
					.prompt("Enter a name for the circle:", "")
					.unwrap_or_default();
				self.place_node(name, x, y);
				false
			}
		}
	}

	/// Plain click. With Shift held over a node, prompts for a new fill color.
	pub fn click(&mut self, x: f64, y: f64, shift: bool, prompter: &mut impl Prompter) {
		if !shift {
			return;
		}
		if let Some(id) = self.hit(x, y) {
			self.recolor(&id, prompter);
		}
	}

	/// Right-click. On a node, renames it; on empty canvas, selects or
	/// creates an edge dimension by name.
	pub fn context_menu(&mut self, x: f64, y: f64, prompter: &mut impl Prompter) {
		match self.hit(x, y) {
			Some(id) => self.rename(&id, prompter),
			None => self.choose_dimension(prompter),
		}
	}

	fn choose_dimension(&mut self, prompter: &mut impl Prompter) {
		let current = self
			.graph
			.current_dimension()
			.map(|dimension| dimension.name.clone())
			.unwrap_or_default();
		let Some(name) = prompter.prompt("Edge dimension (existing name or new):", &current) else {
			return;
		};
		let name = name.trim();
		if name.is_empty() {
			return;
		}
		let existing = self
			.graph
			.dimensions
			.iter()
			.find(|dimension| dimension.name == name)
			.map(|dimension| dimension.id.clone());
		match existing {
			Some(id) => {
				self.graph.select_dimension(&id);
			}
			None => {
				self.graph.create_dimension(name);
			}
		}
	}

	// Touch gestures

	pub fn touch_start(&mut self, x: f64, y: f64, now_ms: f64, prompter: &mut impl Prompter) {
		self.last_touch = (x, y);
		let since = self.last_tap_ms.map(|last| now_ms - last);
		self.last_tap_ms = Some(now_ms);

		if since.is_some_and(|dt| dt > 0.0 && dt < self.config.double_tap_ms) {
			if self.activate(x, y, prompter) {
				self.pending_touch_connect = true;
			}
			return;
		}

		if self.connecting.is_some() {
			return;
		}
		if let Some(node) = self.graph.node_within_radius(x, y) {
			self.drag.node = Some(node.id.clone());
		}
	}

	pub fn touch_move(&mut self, x: f64, y: f64) {
		self.last_touch = (x, y);
		let Some(id) = self.drag.node.clone() else {
			return;
		};
		if let Some(node) = self.graph.node_mut(&id) {
			node.x = x;
			node.y = y;
		}
	}

	pub fn touch_end(&mut self) {
		self.drag.node = None;
		if self.pending_touch_connect {
			self.pending_touch_connect = false;
			return;
		}
		if self.connecting.is_some() {
			let (x, y) = self.last_touch;
			self.complete_connect(x, y);
		}
	}

	// Keyboard

	/// Handles a key press. Returns true when the browser's default action
	/// should be suppressed.
	pub fn handle_key(&mut self, key: &KeyInput, prompter: &mut impl Prompter) -> bool {
		match key.key.as_str() {
			"Enter" if key.ctrl => {
				self.duplicate_selected(prompter);
				true
			}
			"Enter" if key.shift => {
				self.rename_selected(prompter);
				true
			}
			"Tab" => {
				self.cycle_selection(!key.shift);
				true
			}
			"Delete" => {
				self.delete_hovered();
				false
			}
			"z" | "Z" if key.ctrl => {
				self.undo();
				true
			}
			"h" | "H" if key.ctrl => {
				self.toggle_current_dimension();
				true
			}
			_ => false,
		}
	}

	// Recorded mutations

	/// Creates a node and records it. Returns its id.
	pub fn place_node(&mut self, name: impl Into<String>, x: f64, y: f64) -> NodeId {
		let node = Node::new(new_id(), name, x, y, self.default_radius());
		let id = node.id.clone();
		self.graph.add_node(node.clone());
		self.history.record(Action::NodeCreated(node));
		id
	}

	pub fn rename(&mut self, id: &str, prompter: &mut impl Prompter) {
		let Some(old_name) = self.graph.node(id).map(|node| node.name.clone()) else {
			return;
		};
		let Some(new_name) = prompter.prompt("Enter a name for the circle:", &old_name) else {
			return;
		};
		if let Some(node) = self.graph.node_mut(id) {
			node.name = new_name.clone();
		}
		self.history.record(Action::NodeRenamed {
			id: id.to_owned(),
			old_name,
			new_name,
		});
	}

	pub fn recolor(&mut self, id: &str, prompter: &mut impl Prompter) {
		let Some(old_color) = self.graph.node(id).map(|node| node.fill_color.clone()) else {
			return;
		};
		let Some(new_color) = prompter.prompt("Enter a new color for the circle:", &old_color) else {
			return;
		};
		if let Some(node) = self.graph.node_mut(id) {
			node.fill_color = new_color.clone();
		}
		self.history.record(Action::NodeRecolored {
			id: id.to_owned(),
			old_color,
			new_color,
		});
	}

	/// Toggles `source -> target` and records the change. A self-connection
	/// or an unknown endpoint is logged and ignored.
	pub fn connect(&mut self, source: &str, target: &str) {
		match self.graph.toggle_edge(source, target, self.config.spring_k) {
			Ok(Toggle::Added(edge)) => self.history.record(Action::EdgeCreated(edge)),
			Ok(Toggle::Removed(edge)) => self.history.record(Action::EdgeRemoved(edge)),
			Err(err) => warn!("cannot connect {source} -> {target}: {err}"),
		}
	}

	/// Removes `source -> target` if present, recording the removal.
	pub fn disconnect(&mut self, source: &str, target: &str) -> bool {
		match self.graph.remove_edge(source, target) {
			Some(edge) => {
				self.history.record(Action::EdgeRemoved(edge));
				true
			}
			None => false,
		}
	}

	/// Deletes the node under the pointer with its edges. The cascaded edges
	/// are recorded beneath the node so later undos can bring them back.
	pub fn delete_hovered(&mut self) -> bool {
		let Some(id) = self.hover.node.clone() else {
			return false;
		};
		self.delete_node(&id)
	}

	pub fn delete_node(&mut self, id: &str) -> bool {
		let Some((node, edges)) = self.graph.remove_node(id) else {
			return false;
		};
		for edge in edges {
			self.history.record(Action::EdgeRemoved(edge));
		}
		self.history.record(Action::NodeRemoved(node));
		self.forget_missing();
		true
	}

	/// Copies the selected node `duplicate_offset` down and right, named by
	/// prompt, connected to the original, and selected.
	pub fn duplicate_selected(&mut self, prompter: &mut impl Prompter) -> Option<NodeId> {
		let original = self.selected.clone()?;
		let (x, y) = {
			let node = self.graph.node(&original)?;
			(
				node.x + self.config.duplicate_offset,
				node.y + self.config.duplicate_offset,
			)
		};
		let name = prompter
			.prompt("Enter a name for the circle:", "")
			.unwrap_or_default();
		let id = self.place_node(name, x, y);
		if let Err(err) = self.graph.toggle_edge(&id, &original, self.config.spring_k) {
			warn!("cannot connect duplicate {id}: {err}");
		}
		self.selected = Some(id.clone());
		Some(id)
	}

	pub fn rename_selected(&mut self, prompter: &mut impl Prompter) {
		if let Some(id) = self.selected.clone() {
			self.rename(&id, prompter);
		}
	}

	/// Moves the selection through the nodes in insertion order, wrapping.
	pub fn cycle_selection(&mut self, forward: bool) {
		let count = self.graph.nodes.len();
		if count == 0 {
			return;
		}
		let current = self
			.selected
			.as_deref()
			.and_then(|id| self.graph.node_index(id));
		let next = match (current, forward) {
			(Some(index), true) => (index + 1) % count,
			(Some(index), false) => (index + count - 1) % count,
			(None, true) => 0,
			(None, false) => count - 1,
		};
		self.selected = Some(self.graph.nodes[next].id.clone());
	}

	/// Clears nodes and edges. Undoing the reset does not bring them back.
	pub fn reset(&mut self) {
		info!("reset canvas");
		self.graph.clear();
		self.history.record(Action::CanvasReset);
		self.forget_missing();
	}

	pub fn undo(&mut self) -> Option<Action> {
		let action = self.history.undo(&mut self.graph)?;
		self.forget_missing();
		Some(action)
	}

	pub fn toggle_current_dimension(&mut self) -> Option<bool> {
		let id = self.graph.current_dimension.clone()?;
		self.graph.toggle_dimension_visibility(&id)
	}

	/// Drops interaction references to nodes that no longer exist.
	fn forget_missing(&mut self) {
		let graph = &self.graph;
		let exists = |id: &Option<NodeId>| id.as_deref().is_some_and(|id| graph.node_index(id).is_some());
		if !exists(&self.selected) {
			self.selected = None;
		}
		if !exists(&self.drag.node) {
			self.drag.node = None;
		}
		if !exists(&self.connecting) {
			self.connecting = None;
		}
		if exists(&self.hover.node) {
			let id = self.hover.node.clone();
			self.hover.node = None;
			self.set_hover(id);
		} else {
			self.hover.node = None;
			self.hover.neighbors.clear();
		}
	}

	// Frame work

	/// Font size of a node's label in label-fitted mode.
	pub fn label_font(&self, node: &Node) -> f64 {
		self.config.label_font_px * self.rank_factor(node)
	}

	/// Radius of a node in circle mode.
	pub fn drawn_radius(&self, node: &Node) -> f64 {
		node.radius * self.rank_factor(node)
	}

	fn rank_factor(&self, node: &Node) -> f64 {
		node.rank
			.map_or(1.0, |rank| self.config.rank_scale(rank, self.graph.nodes.len()))
	}

	/// Refreshes every node's footprint for the active render mode. In
	/// label-fitted mode the wrapped lines are kept for drawing.
	pub fn measure(&mut self, measure: &mut impl TextMeasure) {
		let sizes: Vec<(f64, f64, Vec<String>)> = self
			.graph
			.nodes
			.iter()
			.map(|node| match self.config.render_mode {
				RenderMode::LabelFitted => {
					let label = label_box(
						&mut *measure,
						&node.name,
						self.label_font(node),
						self.config.label_padding,
						self.config.line_height,
					);
					(label.width, label.height, label.lines)
				}
				RenderMode::Circle => {
					let diameter = 2.0 * self.drawn_radius(node);
					(diameter, diameter, Vec::new())
				}
			})
			.collect();
		for (node, (width, height, lines)) in self.graph.nodes.iter_mut().zip(sizes) {
			node.set_footprint(width, height);
			node.label_lines = lines;
		}
	}

	/// One animation frame: ranking when due, then layout, then hover easing.
	pub fn tick(&mut self, dt: f64) {
		if self.rank_schedule.tick() {
			rank::assign_ranks(
				&mut self.graph.nodes,
				&self.graph.edges,
				self.config.damping,
				self.config.iterations,
			);
		}
		layout::step(
			&mut self.graph.nodes,
			&mut self.graph.edges,
			self.config.rest_length,
			dt,
		);

		let target = if self.hover.node.is_some() { 1.0 } else { 0.0 };
		self.hover.highlight_t += (target - self.hover.highlight_t) * 1.8 * dt;
		if self.hover.node.is_none() && self.hover.highlight_t < 0.01 {
			self.hover.highlight_t = 0.0;
		}
	}

	// Persistence

	pub fn to_document(&self) -> Document {
		Document::from_graph(&self.graph)
	}

	/// Finishes a file import and returns the notice to show. A failed read or
	/// malformed JSON leaves the graph untouched.
	pub fn import(&mut self, read: Result<String, String>) -> Option<String> {
		let text = match read {
			Ok(text) => text,
			Err(reason) => {
				warn!("import failed: cannot read file: {reason}");
				return Some(format!("Could not read file: {reason}"));
			}
		};
		match Document::from_json(&text) {
			Ok(document) => self.load_document(document).notice(),
			Err(err) => {
				warn!("import failed: {err}");
				Some(format!("Could not import file: {err}"))
			}
		}
	}

	/// Replaces the graph with `document`. History belongs to the old graph and
	/// is cleared.
	pub fn load_document(&mut self, document: Document) -> LoadReport {
		let (graph, report) = document.into_graph(self.default_radius());
		self.graph = graph;
		self.history = History::default();
		self.forget_missing();
		report
	}
}
