use log::warn;
use serde::{Deserialize, Serialize};

use super::layout::RestLength;

pub const SMALL_RADIUS_FACTOR: f64 = 0.02;
pub const MEDIUM_RADIUS_FACTOR: f64 = 0.04;
pub const LARGE_RADIUS_FACTOR: f64 = 0.06;
pub const ARROW_SIZE: f64 = 10.0;

/// How a node's footprint is drawn and measured.
///
/// Picked once when the editor is built; the renderer and the hit-test box both
/// follow it, so layout always sees the shape the user sees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderMode {
	/// Ellipse fitted around the (word-wrapped) label.
	#[default]
	LabelFitted,
	/// Fixed circle with the label shrunk to fit inside it.
	Circle,
}

impl RenderMode {
	fn parse(value: &str) -> Option<Self> {
		match value.to_ascii_lowercase().as_str() {
			"label" | "labelfitted" | "ellipse" => Some(Self::LabelFitted),
			"circle" => Some(Self::Circle),
			_ => None,
		}
	}
}

/// Tunables for the editor. Every field has a default; a page can override a
/// handful of them through its query string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
	pub render_mode: RenderMode,
	pub rest_length: RestLength,
	pub damping: f64,
	pub iterations: usize,
	/// Ranking runs on every `rank_every`-th frame.
	pub rank_every: u64,
	pub spring_k: f64,
	pub save_interval_ms: i32,
	pub double_tap_ms: f64,
	/// Offset of a duplicated node from its original, on both axes.
	pub duplicate_offset: f64,
	pub small_radius_factor: f64,
	pub medium_radius_factor: f64,
	pub large_radius_factor: f64,
	pub label_padding: f64,
	pub label_font_px: f64,
	pub line_height: f64,
}

impl Default for EditorConfig {
	fn default() -> Self {
		Self {
			render_mode: RenderMode::default(),
			rest_length: RestLength::default(),
			damping: 0.85,
			iterations: 20,
			rank_every: 60,
			spring_k: 0.01,
			save_interval_ms: 1000,
			double_tap_ms: 300.0,
			duplicate_offset: 50.0,
			small_radius_factor: SMALL_RADIUS_FACTOR,
			medium_radius_factor: MEDIUM_RADIUS_FACTOR,
			large_radius_factor: LARGE_RADIUS_FACTOR,
			label_padding: 10.0,
			label_font_px: 24.0,
			line_height: 1.2,
		}
	}
}

impl EditorConfig {
	/// Defaults overridden by `shape`, `damping`, `iterations` and `k` from a
	/// URL query string (with or without the leading `?`).
	pub fn from_query(search: &str) -> Self {
		let mut config = Self::default();
		let query = search.strip_prefix('?').unwrap_or(search);
		for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
			match key.as_ref() {
				"shape" => match RenderMode::parse(&value) {
					Some(mode) => config.render_mode = mode,
					None => warn!("ignoring unknown shape {value:?}"),
				},
				"damping" => match value.parse::<f64>() {
					Ok(d) if d > 0.0 && d < 1.0 => config.damping = d,
					_ => warn!("ignoring damping {value:?}, expected a number in (0, 1)"),
				},
				"iterations" => match value.parse::<usize>() {
					Ok(n) if n > 0 => config.iterations = n,
					_ => warn!("ignoring iterations {value:?}"),
				},
				"k" => match value.parse::<f64>() {
					Ok(k) if k >= 0.0 && k.is_finite() => config.spring_k = k,
					_ => warn!("ignoring spring constant {value:?}"),
				},
				_ => {}
			}
		}
		config
	}

	/// Default node radius for a canvas whose smaller edge is `smaller_edge`.
	pub fn default_radius(&self, smaller_edge: f64) -> f64 {
		smaller_edge * self.medium_radius_factor
	}

	/// Size multiplier for a node of rank `rank` among `node_count` nodes,
	/// relative to its unranked (medium) size. Interpolates from the small to
	/// the large radius factor by `rank * node_count`, so a higher rank always
	/// draws larger.
	pub fn rank_scale(&self, rank: f64, node_count: usize) -> f64 {
		if self.medium_radius_factor <= 0.0 {
			return 1.0;
		}
		let span = self.large_radius_factor - self.small_radius_factor;
		let factor = self.small_radius_factor + span * rank.max(0.0) * node_count as f64;
		factor / self.medium_radius_factor
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn query_overrides_known_keys() {
		let config = EditorConfig::from_query("?sessionId=abc&shape=circle&damping=0.5&k=0.2");
		assert_eq!(config.render_mode, RenderMode::Circle);
		assert_eq!(config.damping, 0.5);
		assert_eq!(config.spring_k, 0.2);
		assert_eq!(config.iterations, 20);
	}

	#[test]
	fn malformed_values_keep_defaults() {
		let config = EditorConfig::from_query("damping=2&iterations=zero&shape=hexagon");
		assert_eq!(config, EditorConfig::default());
	}

	#[test]
	fn partial_json_fills_defaults() {
		let config: EditorConfig = serde_json::from_str(r#"{"rankEvery": 10}"#).unwrap();
		assert_eq!(config.rank_every, 10);
		assert_eq!(config.save_interval_ms, 1000);
	}

	#[test]
	fn rank_scale_grows_with_rank() {
		let config = EditorConfig::default();
		assert!((config.rank_scale(0.0, 4) - 0.5).abs() < 1e-12);
		assert!((config.rank_scale(0.25, 4) - 1.5).abs() < 1e-12);
		assert!(config.rank_scale(0.135, 3) > config.rank_scale(0.05, 3));
	}
}
