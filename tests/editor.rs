use force_graph_editor::graph_editor::geometry::TextMeasure;
use force_graph_editor::graph_editor::layout::REFERENCE_DT;
use force_graph_editor::graph_editor::rank::page_rank;
use force_graph_editor::graph_editor::storage::{
	KeyValueStore, MemoryStore, list_sessions, load_document, normalize_session_key, save_document,
};
use force_graph_editor::graph_editor::{
	Document, EditorConfig, EditorState, Graph3d, KeyInput, Prompter,
};

struct Monospace;

impl TextMeasure for Monospace {
	fn text_width(&mut self, text: &str, font_px: f64) -> f64 {
		text.chars().count() as f64 * font_px * 0.6
	}
}

struct Answer(Option<&'static str>);

impl Prompter for Answer {
	fn prompt(&mut self, _message: &str, _default: &str) -> Option<String> {
		self.0.map(str::to_owned)
	}
}

const CHAIN: &str = r#"{
	"circles": [
		{"id": "A", "name": "A", "x": 100, "y": 100, "radius": 20, "fillColor": "blue", "strokeColor": "black", "strokeWidth": 2},
		{"id": "B", "name": "B", "x": 105, "y": 102, "radius": 20, "fillColor": "blue", "strokeColor": "black", "strokeWidth": 2},
		{"id": "C", "name": "C", "x": 110, "y": 98, "radius": 20, "fillColor": "blue", "strokeColor": "black", "strokeWidth": 2}
	],
	"connections": [
		{"circleA": {"id": "A"}, "circleB": {"id": "B"}, "k": 0.01},
		{"circleA": {"id": "B"}, "circleB": {"id": "C"}, "k": 0.01}
	]
}"#;

fn distance(state: &EditorState, a: &str, b: &str) -> f64 {
	let (a, b) = (state.graph.node(a).unwrap(), state.graph.node(b).unwrap());
	((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn chain_editor() -> Result<EditorState, Box<dyn std::error::Error>> {
	let mut state = EditorState::new(EditorConfig::default(), 800.0, 600.0);
	let report = state.load_document(Document::from_json(CHAIN)?);
	assert!(report.is_clean());
	Ok(state)
}

#[test]
fn overlapping_chain_separates_after_one_tick() -> Result<(), Box<dyn std::error::Error>> {
	let mut state = chain_editor()?;
	let (ab, bc) = (distance(&state, "A", "B"), distance(&state, "B", "C"));

	state.measure(&mut Monospace);
	state.tick(REFERENCE_DT);

	assert!(distance(&state, "A", "B") > ab + 10.0);
	assert!(distance(&state, "B", "C") > bc + 10.0);
	assert!(state.graph.nodes.iter().all(|node| node.rank.is_some()));
	Ok(())
}

#[test]
fn first_rank_iteration_matches_hand_computation() -> Result<(), Box<dyn std::error::Error>> {
	let state = chain_editor()?;
	let ranks = page_rank(&state.graph.nodes, &state.graph.edges, 0.85, 1);

	let start = 1.0 / 3.0;
	let base = (1.0 - 0.85) / 3.0;
	let expected = [base, base + 0.85 * start, base + 0.85 * start];
	for (rank, want) in ranks.iter().zip(expected) {
		assert!((rank - want).abs() < 1e-12, "{rank} != {want}");
	}
	Ok(())
}

#[test]
fn connecting_twice_leaves_no_edge() -> Result<(), Box<dyn std::error::Error>> {
	let mut state = chain_editor()?;
	state.connect("A", "C");
	assert!(state.graph.is_connected("A", "C"));
	state.connect("A", "C");
	assert!(!state.graph.is_connected("A", "C"));
	assert_eq!(state.graph.edges.len(), 2);
	Ok(())
}

#[test]
fn undo_reverses_add_node_and_remove_connection() -> Result<(), Box<dyn std::error::Error>> {
	let mut state = chain_editor()?;

	state.place_node("D", 400.0, 400.0);
	assert_eq!(state.graph.nodes.len(), 4);
	state.handle_key(&KeyInput::new("z").ctrl(), &mut Answer(None));
	assert_eq!(state.graph.nodes.len(), 3);

	assert!(state.disconnect("A", "B"));
	state.undo();
	assert!(state.graph.is_connected("A", "B"));
	assert_eq!(state.graph.edges.len(), 2);
	Ok(())
}

#[test]
fn deleting_a_node_restores_edges_only_on_later_undos() -> Result<(), Box<dyn std::error::Error>> {
	let mut state = chain_editor()?;
	state.measure(&mut Monospace);
	let b = state.graph.node("B").unwrap().clone();
	state.move_to(b.x + b.rect_width / 2.0 - 0.5, b.y);
	assert_eq!(state.hover.node.as_deref(), Some("B"));

	assert!(state.delete_hovered());
	assert!(state.graph.edges.is_empty());

	state.undo();
	assert!(state.graph.node("B").is_some());
	assert!(state.graph.edges.is_empty());

	state.undo();
	state.undo();
	assert_eq!(state.graph.edges.len(), 2);
	Ok(())
}

#[test]
fn sessions_round_trip_through_the_store() -> Result<(), Box<dyn std::error::Error>> {
	let mut state = chain_editor()?;
	state.graph.node_mut("C").unwrap().name = "Renamed".into();

	let mut store = MemoryStore::default();
	let key = normalize_session_key("work");
	save_document(&mut store, &key, &state.to_document())?;
	store.set("other", "{}")?;
	assert_eq!(list_sessions(&store)?, vec![key.clone()]);

	let document = load_document(&store, &key)?.expect("session saved");
	let mut restored = EditorState::new(EditorConfig::default(), 800.0, 600.0);
	assert!(restored.load_document(document).is_clean());

	for (a, b) in state.graph.nodes.iter().zip(&restored.graph.nodes) {
		assert_eq!((&a.id, &a.name, a.x, a.y), (&b.id, &b.name, b.x, b.y));
	}
	let pairs = |s: &EditorState| {
		s.graph
			.edges
			.iter()
			.map(|e| (e.source.clone(), e.target.clone()))
			.collect::<Vec<_>>()
	};
	assert_eq!(pairs(&state), pairs(&restored));
	Ok(())
}

#[test]
fn three_d_projection_uses_ids() -> Result<(), Box<dyn std::error::Error>> {
	let document = Document::from_json(CHAIN)?;
	let graph = Graph3d::from_document(&document);
	let value: serde_json::Value = serde_json::from_str(&graph.to_json()?)?;
	assert_eq!(value["nodes"].as_array().map(Vec::len), Some(3));
	assert_eq!(value["nodes"][0]["val"], 1);
	assert_eq!(value["links"][1]["source"], "B");
	assert_eq!(value["links"][1]["target"], "C");
	Ok(())
}
