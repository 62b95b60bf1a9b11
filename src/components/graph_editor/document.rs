use std::collections::HashMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::error::EditorError;
use super::graph::Graph;
use super::types::{
	DEFAULT_FILL, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH, Dimension, Edge, Node, new_id,
};

/// Node ids were once millisecond timestamps saved as JSON numbers.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
enum LegacyId {
	Text(String),
	Number(serde_json::Number),
}

impl From<LegacyId> for String {
	fn from(id: LegacyId) -> Self {
		match id {
			LegacyId::Text(text) => text,
			LegacyId::Number(number) => number.to_string(),
		}
	}
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: serde::Deserializer<'de>,
{
	LegacyId::deserialize(deserializer).map(String::from)
}

fn default_fill() -> String {
	DEFAULT_FILL.into()
}

fn default_stroke() -> String {
	DEFAULT_STROKE.into()
}

fn default_stroke_width() -> f64 {
	DEFAULT_STROKE_WIDTH
}

fn default_visible() -> bool {
	true
}

/// A node as it appears under `circles`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleRecord {
	#[serde(default = "new_id", deserialize_with = "deserialize_id")]
	pub id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub x: f64,
	#[serde(default)]
	pub y: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub radius: Option<f64>,
	#[serde(default = "default_fill")]
	pub fill_color: String,
	#[serde(default = "default_stroke")]
	pub stroke_color: String,
	#[serde(default = "default_stroke_width")]
	pub stroke_width: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub page_rank: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rect_width: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rect_height: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct RawEndpoint {
	#[serde(
		default,
		skip_serializing_if = "Option::is_none",
		deserialize_with = "deserialize_optional_id"
	)]
	id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	name: Option<String>,
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Option::<LegacyId>::deserialize(deserializer).map(|id| id.map(String::from))
}

/// How a connection names one of its endpoints. Current documents use the
/// node id; older ones used the node name (or embedded a whole circle, of
/// which only these fields matter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEndpoint", into = "RawEndpoint")]
pub enum EndpointRef {
	Id(String),
	Name(String),
	Missing,
}

impl From<RawEndpoint> for EndpointRef {
	fn from(raw: RawEndpoint) -> Self {
		match (raw.id, raw.name) {
			(Some(id), _) => Self::Id(id),
			(None, Some(name)) => Self::Name(name),
			(None, None) => Self::Missing,
		}
	}
}

impl From<EndpointRef> for RawEndpoint {
	fn from(endpoint: EndpointRef) -> Self {
		match endpoint {
			EndpointRef::Id(id) => Self {
				id: Some(id),
				name: None,
			},
			EndpointRef::Name(name) => Self {
				id: None,
				name: Some(name),
			},
			EndpointRef::Missing => Self::default(),
		}
	}
}

impl EndpointRef {
	/// Resolves against the loaded circles: ids first, then names.
	fn resolve(&self, ids: &HashMap<&str, &str>, names: &HashMap<&str, &str>) -> Option<String> {
		match self {
			Self::Id(id) => ids.get(id.as_str()).map(|id| (*id).to_owned()),
			Self::Name(name) => names.get(name.as_str()).map(|id| (*id).to_owned()),
			Self::Missing => None,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRecord {
	#[serde(default = "new_id")]
	pub id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub color: String,
	#[serde(default = "default_visible")]
	pub is_visible: bool,
}

impl From<&Dimension> for DimensionRecord {
	fn from(dimension: &Dimension) -> Self {
		Self {
			id: dimension.id.clone(),
			name: dimension.name.clone(),
			color: dimension.color.clone(),
			is_visible: dimension.visible,
		}
	}
}

impl From<DimensionRecord> for Dimension {
	fn from(record: DimensionRecord) -> Self {
		Self {
			id: record.id,
			name: record.name,
			color: record.color,
			visible: record.is_visible,
		}
	}
}

fn default_k() -> f64 {
	0.01
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
	#[serde(rename = "circleA")]
	pub circle_a: EndpointRef,
	#[serde(rename = "circleB")]
	pub circle_b: EndpointRef,
	#[serde(default = "default_k")]
	pub k: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dimension: Option<DimensionRecord>,
}

/// The unit of persistence, import and export.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
	#[serde(default)]
	pub circles: Vec<CircleRecord>,
	#[serde(default)]
	pub connections: Vec<ConnectionRecord>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub edge_dimensions: Option<Vec<DimensionRecord>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub current_edge_dimension_id: Option<String>,
}

/// What loading a document had to leave out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
	/// `"from -> to"` for every connection that was dropped.
	pub skipped_edges: Vec<String>,
}

impl LoadReport {
	pub fn is_clean(&self) -> bool {
		self.skipped_edges.is_empty()
	}

	/// A short message for the user, if anything was skipped.
	pub fn notice(&self) -> Option<String> {
		match self.skipped_edges.len() {
			0 => None,
			1 => Some(format!("Skipped 1 connection: {}", self.skipped_edges[0])),
			n => Some(format!("Skipped {n} connections with unknown endpoints")),
		}
	}
}

fn describe(endpoint: &EndpointRef) -> &str {
	match endpoint {
		EndpointRef::Id(value) | EndpointRef::Name(value) => value,
		EndpointRef::Missing => "?",
	}
}

impl Document {
	pub fn from_json(json: &str) -> Result<Self, EditorError> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn to_json(&self) -> Result<String, EditorError> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn from_graph(graph: &Graph) -> Self {
		let circles = graph
			.nodes
			.iter()
			.map(|node| CircleRecord {
				id: node.id.clone(),
				name: node.name.clone(),
				x: node.x,
				y: node.y,
				radius: Some(node.radius),
				fill_color: node.fill_color.clone(),
				stroke_color: node.stroke_color.clone(),
				stroke_width: node.stroke_width,
				page_rank: node.rank,
				rect_width: Some(node.rect_width),
				rect_height: Some(node.rect_height),
			})
			.collect();
		let connections = graph
			.edges
			.iter()
			.map(|edge| ConnectionRecord {
				circle_a: EndpointRef::Id(edge.source.clone()),
				circle_b: EndpointRef::Id(edge.target.clone()),
				k: edge.k,
				dimension: edge
					.dimension
					.as_deref()
					.and_then(|id| graph.dimension(id))
					.map(DimensionRecord::from),
			})
			.collect();
		Self {
			circles,
			connections,
			edge_dimensions: Some(graph.dimensions.iter().map(DimensionRecord::from).collect()),
			current_edge_dimension_id: graph.current_dimension.clone(),
		}
	}

	/// Rebuilds a graph. Circles without a radius get `default_radius`;
	/// connections whose endpoints do not resolve (or that would be a self-loop
	/// or a duplicate) are skipped and listed in the report.
	pub fn into_graph(self, default_radius: f64) -> (Graph, LoadReport) {
		let mut graph = Graph {
			dimensions: self
				.edge_dimensions
				.unwrap_or_default()
				.into_iter()
				.map(Dimension::from)
				.collect(),
			current_dimension: self.current_edge_dimension_id,
			..Graph::default()
		};
		graph.ensure_default_dimension();

		for circle in self.circles {
			let mut node = Node::new(
				circle.id,
				circle.name,
				circle.x,
				circle.y,
				circle.radius.unwrap_or(default_radius),
			)
			.with_style(circle.fill_color, circle.stroke_color, circle.stroke_width);
			node.rank = circle.page_rank;
			node.set_footprint(
				circle.rect_width.unwrap_or_default(),
				circle.rect_height.unwrap_or_default(),
			);
			graph.add_node(node);
		}

		let mut report = LoadReport::default();
		let edges = {
			let ids: HashMap<&str, &str> = graph
				.nodes
				.iter()
				.map(|node| (node.id.as_str(), node.id.as_str()))
				.collect();
			let mut names: HashMap<&str, &str> = HashMap::new();
			for node in &graph.nodes {
				names.entry(node.name.as_str()).or_insert(node.id.as_str());
			}

			let mut edges = Vec::new();
			for connection in self.connections {
				let label = format!(
					"{} -> {}",
					describe(&connection.circle_a),
					describe(&connection.circle_b)
				);
				let endpoints = (
					connection.circle_a.resolve(&ids, &names),
					connection.circle_b.resolve(&ids, &names),
				);
				let (Some(source), Some(target)) = endpoints else {
					warn!("skipping connection {label}: unknown endpoint");
					report.skipped_edges.push(label);
					continue;
				};
				let dimension = connection
					.dimension
					.map(|record| record.id)
					.filter(|id| graph.dimension(id).is_some());
				match Edge::new(source, target, connection.k, dimension) {
					Ok(edge) => edges.push((edge, label)),
					Err(err) => {
						warn!("skipping connection {label}: {err}");
						report.skipped_edges.push(label);
					}
				}
			}
			edges
		};
		for (edge, label) in edges {
			if let Err(err) = graph.add_edge(edge) {
				warn!("skipping connection {label}: {err}");
				report.skipped_edges.push(label);
			}
		}

		info!(
			"loaded {} nodes, {} edges, {} skipped",
			graph.nodes.len(),
			graph.edges.len(),
			report.skipped_edges.len()
		);
		(graph, report)
	}
}

/// Node of the 3-D view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node3d {
	pub id: String,
	pub name: String,
	pub val: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link3d {
	pub source: String,
	pub target: String,
}

/// `{nodes, links}` shape consumed by the external 3-D renderer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph3d {
	pub nodes: Vec<Node3d>,
	pub links: Vec<Link3d>,
}

impl Graph3d {
	/// Projects a document. Links whose endpoints do not resolve are dropped.
	pub fn from_document(document: &Document) -> Self {
		let ids: HashMap<&str, &str> = document
			.circles
			.iter()
			.map(|circle| (circle.id.as_str(), circle.id.as_str()))
			.collect();
		let mut names: HashMap<&str, &str> = HashMap::new();
		for circle in &document.circles {
			names.entry(circle.name.as_str()).or_insert(circle.id.as_str());
		}

		Self {
			nodes: document
				.circles
				.iter()
				.map(|circle| Node3d {
					id: circle.id.clone(),
					name: circle.name.clone(),
					val: 1,
				})
				.collect(),
			links: document
				.connections
				.iter()
				.filter_map(|connection| {
					Some(Link3d {
						source: connection.circle_a.resolve(&ids, &names)?,
						target: connection.circle_b.resolve(&ids, &names)?,
					})
				})
				.collect(),
		}
	}

	pub fn to_json(&self) -> Result<String, EditorError> {
		Ok(serde_json::to_string(self)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> Graph {
		let mut graph = Graph::default();
		graph.ensure_default_dimension();
		graph.add_node(Node::new("a", "Alpha", 10.0, 20.0, 16.0));
		graph.add_node(Node::new("b", "Beta", 30.0, 40.0, 16.0).with_style("red", "black", 3.0));
		graph.toggle_edge("a", "b", 0.02).unwrap();
		graph
	}

	#[test]
	fn round_trip_keeps_identity_and_edges() {
		let graph = sample();
		let json = Document::from_graph(&graph).to_json().unwrap();
		let (loaded, report) = Document::from_json(&json).unwrap().into_graph(5.0);

		assert!(report.is_clean());
		let ids: Vec<_> = loaded.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["a", "b"]);
		assert_eq!(loaded.node("b").unwrap().fill_color, "red");
		assert_eq!((loaded.node("a").unwrap().x, loaded.node("a").unwrap().y), (10.0, 20.0));
		assert!(loaded.is_connected("a", "b"));
		assert_eq!(loaded.edges[0].k, 0.02);
		assert_eq!(loaded.current_dimension, graph.current_dimension);
		assert_eq!(loaded.edges[0].dimension, graph.current_dimension);
	}

	#[test]
	fn serialized_shape_uses_camel_case() {
		let json = Document::from_graph(&sample()).to_json().unwrap();
		let value: serde_json::Value = serde_json::from_str(&json).unwrap();
		assert_eq!(value["circles"][0]["fillColor"], "blue");
		assert_eq!(value["connections"][0]["circleA"]["id"], "a");
		assert_eq!(value["connections"][0]["dimension"]["isVisible"], true);
		assert!(value["currentEdgeDimensionId"].is_string());
		assert!(value["circles"][0].get("pageRank").is_none());
	}

	#[test]
	fn legacy_document_loads() {
		let json = r#"{
			"circles": [
				{"id": 1690000000000, "name": "one", "x": 1, "y": 2},
				{"id": "two", "name": "two", "x": 3, "y": 4, "radius": 7, "extra": true}
			],
			"connections": [
				{"circleA": {"name": "one"}, "circleB": {"id": "two", "x": 3}, "k": 0.05}
			]
		}"#;
		let (graph, report) = Document::from_json(json).unwrap().into_graph(12.0);
		assert!(report.is_clean());
		assert_eq!(graph.nodes[0].id, "1690000000000");
		assert_eq!(graph.nodes[0].radius, 12.0);
		assert_eq!(graph.nodes[1].radius, 7.0);
		assert_eq!(graph.nodes[0].fill_color, "blue");
		assert!(graph.is_connected("1690000000000", "two"));
		assert!(graph.edges[0].dimension.is_none());
		assert_eq!(graph.dimensions.len(), 1);
		assert_eq!(graph.dimensions[0].name, "Default");
	}

	#[test]
	fn unresolved_connections_are_reported() {
		let json = r#"{
			"circles": [{"id": "a"}, {"id": "b"}],
			"connections": [
				{"circleA": {"id": "a"}, "circleB": {"id": "ghost"}, "k": 0.01},
				{"circleA": {"id": "a"}, "circleB": {"id": "a"}, "k": 0.01},
				{"circleA": {"id": "a"}, "circleB": {"id": "b"}, "k": 0.01},
				{"circleA": {"id": "a"}, "circleB": {"id": "b"}, "k": 0.01},
				{"circleA": {}, "circleB": {"id": "b"}}
			]
		}"#;
		let (graph, report) = Document::from_json(json).unwrap().into_graph(10.0);
		assert_eq!(graph.edges.len(), 1);
		assert_eq!(report.skipped_edges.len(), 4);
		assert_eq!(report.skipped_edges[0], "a -> ghost");
		assert!(report.notice().unwrap().contains('4'));
	}

	#[test]
	fn unknown_dimensions_are_dropped_or_fall_back() {
		let json = r##"{
			"circles": [{"id": "a"}, {"id": "b"}],
			"connections": [{"circleA": {"id": "a"}, "circleB": {"id": "b"}, "k": 0.01,
				"dimension": {"id": "nope", "name": "x", "color": "#fff", "isVisible": true}}],
			"edgeDimensions": [
				{"id": "d1", "name": "one", "color": "#FF0000", "isVisible": false},
				{"id": "d2", "name": "two", "color": "#00FF00", "isVisible": true}
			],
			"currentEdgeDimensionId": "missing"
		}"##;
		let (graph, _) = Document::from_json(json).unwrap().into_graph(10.0);
		assert_eq!(graph.current_dimension.as_deref(), Some("d1"));
		assert_eq!(graph.edges[0].dimension, None);
		assert!(graph.edge_visible(&graph.edges[0]));
	}

	#[test]
	fn malformed_json_is_an_error() {
		assert!(matches!(Document::from_json("{\"circles\": 3"), Err(EditorError::Json(_))));
		assert!(matches!(Document::from_json("42"), Err(EditorError::Json(_))));
		let empty = Document::from_json("{}").unwrap();
		assert!(empty.circles.is_empty() && empty.connections.is_empty());
	}

	#[test]
	fn projects_to_3d() {
		let mut document = Document::from_graph(&sample());
		document.connections.push(ConnectionRecord {
			circle_a: EndpointRef::Name("Beta".into()),
			circle_b: EndpointRef::Id("a".into()),
			k: 0.01,
			dimension: None,
		});
		document.connections.push(ConnectionRecord {
			circle_a: EndpointRef::Id("a".into()),
			circle_b: EndpointRef::Id("ghost".into()),
			k: 0.01,
			dimension: None,
		});
		let projected = Graph3d::from_document(&document);
		assert_eq!(projected.nodes.len(), 2);
		assert_eq!(projected.nodes[0].name, "Alpha");
		assert_eq!(projected.nodes[1].val, 1);
		assert_eq!(
			projected.links,
			vec![
				Link3d { source: "a".into(), target: "b".into() },
				Link3d { source: "b".into(), target: "a".into() },
			]
		);
		let json = projected.to_json().unwrap();
		assert!(json.starts_with("{\"nodes\":"));
	}
}
