use super::error::EditorError;
use super::geometry::{point_in_circle, point_in_rect};

/// Opaque, stable node identity. Nodes are always looked up by id, never by
/// position in the node list.
pub type NodeId = String;
pub type DimensionId = String;

pub const DEFAULT_FILL: &str = "blue";
pub const DEFAULT_STROKE: &str = "black";
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

pub const DIMENSION_COLORS: &[&str] = &[
	"#FF0000", "#00FF00", "#0000FF", "#FF00FF", "#FFFF00", "#00FFFF", "#FFA500", "#800080",
];

pub fn new_id() -> String {
	uuid::Uuid::new_v4().to_string()
}

/// A labeled point in the diagram (a "circle" in saved documents).
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: NodeId,
	pub name: String,
	pub x: f64,
	pub y: f64,
	pub radius: f64,
	pub fill_color: String,
	pub stroke_color: String,
	pub stroke_width: f64,
	pub rank: Option<f64>,
	/// Footprint of the drawn node, refreshed on every draw. Zero until the
	/// node has been measured once.
	pub rect_width: f64,
	pub rect_height: f64,
	/// Wrapped label lines from the last label-fitted measurement.
	pub label_lines: Vec<String>,
}

impl Node {
	pub fn new(id: impl Into<NodeId>, name: impl Into<String>, x: f64, y: f64, radius: f64) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			x,
			y,
			radius,
			fill_color: DEFAULT_FILL.into(),
			stroke_color: DEFAULT_STROKE.into(),
			stroke_width: DEFAULT_STROKE_WIDTH,
			rank: None,
			rect_width: 0.0,
			rect_height: 0.0,
			label_lines: Vec::new(),
		}
	}

	pub fn with_style(
		mut self,
		fill_color: impl Into<String>,
		stroke_color: impl Into<String>,
		stroke_width: f64,
	) -> Self {
		self.fill_color = fill_color.into();
		self.stroke_color = stroke_color.into();
		self.stroke_width = stroke_width;
		self
	}

	pub fn set_footprint(&mut self, width: f64, height: f64) {
		self.rect_width = width.max(0.0);
		self.rect_height = height.max(0.0);
	}

	/// Hit test against the measured footprint. An unmeasured node cannot be hit.
	pub fn contains(&self, x: f64, y: f64) -> bool {
		if self.rect_width <= 0.0 || self.rect_height <= 0.0 {
			return false;
		}
		point_in_rect(
			x,
			y,
			self.x,
			self.y,
			self.rect_width / 2.0,
			self.rect_height / 2.0,
		)
	}

	/// Hit test against the nominal radius, used to pick up a node on a single tap.
	pub fn within_radius(&self, x: f64, y: f64) -> bool {
		point_in_circle(x, y, self.x, self.y, self.radius)
	}

	pub fn left(&self) -> f64 {
		self.x - self.rect_width / 2.0
	}

	pub fn right(&self) -> f64 {
		self.x + self.rect_width / 2.0
	}

	pub fn top(&self) -> f64 {
		self.y - self.rect_height / 2.0
	}

	pub fn bottom(&self) -> f64 {
		self.y + self.rect_height / 2.0
	}
}

/// Directed spring from `source` to `target`. Endpoints are held by id only.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub source: NodeId,
	pub target: NodeId,
	pub k: f64,
	pub dimension: Option<DimensionId>,
	/// Rest length used by the last layout step.
	pub rest_length: f64,
}

impl Edge {
	pub fn new(
		source: impl Into<NodeId>,
		target: impl Into<NodeId>,
		k: f64,
		dimension: Option<DimensionId>,
	) -> Result<Self, EditorError> {
		let (source, target) = (source.into(), target.into());
		if source == target {
			return Err(EditorError::SelfLoop(source));
		}
		Ok(Self {
			source,
			target,
			k: k.max(0.0),
			dimension,
			rest_length: 0.0,
		})
	}

	pub fn connects(&self, source: &str, target: &str) -> bool {
		self.source == source && self.target == target
	}

	pub fn touches(&self, id: &str) -> bool {
		self.source == id || self.target == id
	}
}

/// Named, colored grouping of edges that can be hidden as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimension {
	pub id: DimensionId,
	pub name: String,
	pub color: String,
	pub visible: bool,
}

impl Dimension {
	pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
		Self {
			id: new_id(),
			name: name.into(),
			color: color.into(),
			visible: true,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_node_has_no_footprint() {
		let node = Node::new("a", "Alpha", 10.0, 20.0, 16.0);
		assert_eq!((node.rect_width, node.rect_height), (0.0, 0.0));
		assert_eq!(node.fill_color, "blue");
		assert!(node.rank.is_none());
		assert!(!node.contains(10.0, 20.0));
	}

	#[test]
	fn footprint_drives_hit_test() {
		let mut node = Node::new("a", "Alpha", 0.0, 0.0, 5.0);
		node.set_footprint(40.0, 20.0);
		assert!(node.contains(19.0, 9.0));
		assert!(!node.contains(21.0, 0.0));
		assert!(node.within_radius(3.0, 4.0));
		assert!(!node.within_radius(4.0, 4.0));
	}

	#[test]
	fn self_edges_are_rejected() {
		assert!(matches!(
			Edge::new("a", "a", 0.01, None),
			Err(EditorError::SelfLoop(id)) if id == "a"
		));
		let edge = Edge::new("a", "b", -1.0, None).unwrap();
		assert_eq!(edge.k, 0.0);
		assert!(edge.connects("a", "b"));
		assert!(!edge.connects("b", "a"));
	}

	#[test]
	fn ids_are_unique() {
		assert_ne!(new_id(), new_id());
	}
}
