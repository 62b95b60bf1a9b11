mod component;
pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod history;
pub mod layout;
pub mod rank;
mod render;
pub mod state;
pub mod storage;
pub mod types;

pub use component::GraphEditor;
pub use config::{EditorConfig, RenderMode};
pub use document::{Document, Graph3d, LoadReport};
pub use error::EditorError;
pub use graph::{Graph, Toggle};
pub use history::{Action, History};
pub use state::{EditorState, KeyInput, Prompter};
pub use types::{Dimension, Edge, Node, NodeId};
