use std::collections::HashMap;
use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::config::{ARROW_SIZE, RenderMode};
use super::geometry::{TextMeasure, adaptive_font_size};
use super::state::EditorState;
use super::types::Node;

const BACKGROUND: &str = "#fafafa";
const SELECTED_STROKE: &str = "red";
const CONNECT_STROKE: &str = "#2ca02c";

/// Text measurement through the canvas' own font metrics.
pub struct CanvasMeasure<'a> {
	ctx: &'a CanvasRenderingContext2d,
}

impl<'a> CanvasMeasure<'a> {
	pub fn new(ctx: &'a CanvasRenderingContext2d) -> Self {
		Self { ctx }
	}
}

impl TextMeasure for CanvasMeasure<'_> {
	fn text_width(&mut self, text: &str, font_px: f64) -> f64 {
		self.ctx.set_font(&font(font_px));
		self.ctx
			.measure_text(text)
			.map(|metrics| metrics.width())
			.unwrap_or(0.0)
	}
}

fn font(px: f64) -> String {
	format!("{px}px sans-serif")
}

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Refreshes footprints from the current labels. Runs before layout so the
/// collision pass sees what will be drawn.
pub fn measure(state: &mut EditorState, ctx: &CanvasRenderingContext2d) {
	state.measure(&mut CanvasMeasure::new(ctx));
}

pub fn render(state: &EditorState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
}

/// Distance from a node's center to the edge of its drawn shape along the unit
/// vector `(ux, uy)`.
fn boundary(state: &EditorState, node: &Node, ux: f64, uy: f64) -> f64 {
	match state.config.render_mode {
		RenderMode::Circle => state.drawn_radius(node),
		RenderMode::LabelFitted => {
			let (a, b) = (node.rect_width / 2.0, node.rect_height / 2.0);
			if a <= 0.0 || b <= 0.0 {
				return 0.0;
			}
			1.0 / ((ux / a).powi(2) + (uy / b).powi(2)).sqrt()
		}
	}
}

fn draw_edges(state: &EditorState, ctx: &CanvasRenderingContext2d) {
	let graph = &state.graph;
	let t = ease_out_cubic(state.hover.highlight_t);
	let has_highlight = state.hover.node.is_some();
	let index: HashMap<&str, &Node> = graph
		.nodes
		.iter()
		.map(|node| (node.id.as_str(), node))
		.collect();

	for edge in &graph.edges {
		if !graph.edge_visible(edge) {
			continue;
		}
		let (Some(&from), Some(&to)) = (
			index.get(edge.source.as_str()),
			index.get(edge.target.as_str()),
		) else {
			continue;
		};
		let (dx, dy) = (to.x - from.x, to.y - from.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		let (start, end) = (boundary(state, from, ux, uy), boundary(state, to, -ux, -uy));
		if start + end >= dist {
			continue;
		}

		let color = edge
			.dimension
			.as_deref()
			.and_then(|id| graph.dimension(id))
			.map_or("black", |dimension| dimension.color.as_str());
		let alpha = if !has_highlight
			|| (state.is_highlighted(&from.id) && state.is_highlighted(&to.id))
		{
			1.0
		} else {
			1.0 - 0.7 * t
		};

		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(color);
		ctx.set_fill_style_str(color);
		ctx.set_line_width(2.0);

		let (tip_x, tip_y) = (to.x - ux * end, to.y - uy * end);
		let (back_x, back_y) = (tip_x - ux * ARROW_SIZE, tip_y - uy * ARROW_SIZE);
		ctx.begin_path();
		ctx.move_to(from.x + ux * start, from.y + uy * start);
		ctx.line_to(back_x, back_y);
		ctx.stroke();

		let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &EditorState, ctx: &CanvasRenderingContext2d) {
	let t = ease_out_cubic(state.hover.highlight_t);
	let mut measure = CanvasMeasure::new(ctx);

	for node in &state.graph.nodes {
		let hovered = state.hover.node.as_deref() == Some(node.id.as_str());
		if hovered && t > 0.01 {
			draw_glow(node, state, ctx, t);
		}

		let stroke = if state.connecting.as_deref() == Some(node.id.as_str()) {
			CONNECT_STROKE
		} else if state.selected.as_deref() == Some(node.id.as_str()) {
			SELECTED_STROKE
		} else {
			node.stroke_color.as_str()
		};

		ctx.begin_path();
		match state.config.render_mode {
			RenderMode::LabelFitted => {
				let _ = ctx.ellipse(
					node.x,
					node.y,
					node.rect_width / 2.0,
					node.rect_height / 2.0,
					0.0,
					0.0,
					2.0 * PI,
				);
			}
			RenderMode::Circle => {
				let _ = ctx.arc(node.x, node.y, state.drawn_radius(node), 0.0, 2.0 * PI);
			}
		}
		ctx.close_path();
		ctx.set_fill_style_str(&node.fill_color);
		ctx.fill();
		ctx.set_line_width(node.stroke_width);
		ctx.set_stroke_style_str(stroke);
		ctx.stroke();

		ctx.set_fill_style_str("white");
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		match state.config.render_mode {
			RenderMode::LabelFitted => draw_label_lines(node, state, ctx),
			RenderMode::Circle => draw_circle_label(node, state, ctx, &mut measure),
		}
	}
}

fn draw_label_lines(node: &Node, state: &EditorState, ctx: &CanvasRenderingContext2d) {
	let font_px = state.label_font(node);
	let line_height = font_px * state.config.line_height;
	ctx.set_font(&font(font_px));
	let first = node.y - (node.label_lines.len() as f64 - 1.0) * line_height / 2.0;
	for (i, line) in node.label_lines.iter().enumerate() {
		let _ = ctx.fill_text(line, node.x, first + i as f64 * line_height);
	}
}

fn draw_circle_label(
	node: &Node,
	state: &EditorState,
	ctx: &CanvasRenderingContext2d,
	measure: &mut CanvasMeasure<'_>,
) {
	let radius = state.drawn_radius(node);
	let size = adaptive_font_size(measure, &node.name, radius * 1.8, 20);
	ctx.set_font(&font(size as f64));
	let _ = ctx.fill_text(&node.name, node.x, node.y);

	if let Some(rank) = node.rank {
		ctx.set_fill_style_str("black");
		ctx.set_font(&font(12.0));
		let _ = ctx.fill_text(&format!("Rank: {rank:.3}"), node.x, node.y + radius + 12.0);
	}
}

fn draw_glow(node: &Node, state: &EditorState, ctx: &CanvasRenderingContext2d, t: f64) {
	let inner = match state.config.render_mode {
		RenderMode::Circle => state.drawn_radius(node),
		RenderMode::LabelFitted => node.rect_width.max(node.rect_height) / 2.0,
	};
	let outer = inner * (1.2 + 0.4 * t);
	let Ok(gradient) = ctx.create_radial_gradient(node.x, node.y, inner * 0.8, node.x, node.y, outer)
	else {
		return;
	};
	let inner_color = format!("rgba(100, 180, 255, {})", 0.45 * t);
	if gradient.add_color_stop(0.0, &inner_color).is_err()
		|| gradient.add_color_stop(1.0, "rgba(100, 180, 255, 0)").is_err()
	{
		return;
	}
	ctx.begin_path();
	let _ = ctx.arc(node.x, node.y, outer, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
}
