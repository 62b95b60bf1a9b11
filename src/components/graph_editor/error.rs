use thiserror::Error;

/// Failures raised by the editor core and its browser collaborators.
#[derive(Debug, Error)]
pub enum EditorError {
	/// The persisted document was not valid JSON or did not match the schema.
	#[error("invalid graph document: {0}")]
	Json(#[from] serde_json::Error),
	/// The key-value store rejected a read or write.
	#[error("storage unavailable: {0}")]
	Storage(String),
	/// A required DOM object (canvas, 2d context, window API) was missing.
	#[error("dom: {0}")]
	Dom(String),
	/// An edge was requested from a node to itself.
	#[error("node {0} cannot be connected to itself")]
	SelfLoop(String),
	/// An operation referenced a node id that is not in the graph.
	#[error("unknown node {0}")]
	UnknownNode(String),
	/// The ordered pair is already connected.
	#[error("{from} is already connected to {to}")]
	DuplicateEdge {
		/// Tail of the existing edge.
		from: String,
		/// Head of the existing edge.
		to: String,
	},
}

impl From<wasm_bindgen::JsValue> for EditorError {
	fn from(value: wasm_bindgen::JsValue) -> Self {
		Self::Dom(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}
