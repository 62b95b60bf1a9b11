/// Measures rendered text. The canvas implements this in the browser; tests
/// plug in a fixed-advance fake.
pub trait TextMeasure {
	/// Width in pixels of `text` drawn at `font_px`.
	fn text_width(&mut self, text: &str, font_px: f64) -> f64;
}

/// Is `(x, y)` inside the axis-aligned rectangle centered on `(cx, cy)`?
/// Edges count as inside.
pub fn point_in_rect(x: f64, y: f64, cx: f64, cy: f64, half_width: f64, half_height: f64) -> bool {
	(x - cx).abs() <= half_width && (y - cy).abs() <= half_height
}

pub fn point_in_circle(x: f64, y: f64, cx: f64, cy: f64, radius: f64) -> bool {
	let (dx, dy) = (x - cx, y - cy);
	dx * dx + dy * dy <= radius * radius
}

/// Largest integer font size in `[1, max_font_size]` at which `text` fits in
/// `max_width`. Falls back to 1 when nothing fits.
///
/// Relies on measured width never shrinking as the font grows.
pub fn adaptive_font_size(
	measure: &mut impl TextMeasure,
	text: &str,
	max_width: f64,
	max_font_size: u32,
) -> u32 {
	let (mut low, mut high) = (1_u32, max_font_size.max(1));
	let mut best = 1;
	while low <= high {
		let mid = low + (high - low) / 2;
		if measure.text_width(text, mid as f64) <= max_width {
			best = mid;
			low = mid + 1;
		} else {
			high = mid - 1;
		}
	}
	best
}

/// Size of the box drawn around a label: one word per line, padded on all sides.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelBox {
	pub lines: Vec<String>,
	pub width: f64,
	pub height: f64,
	pub line_height: f64,
}

pub fn label_box(
	measure: &mut impl TextMeasure,
	text: &str,
	font_px: f64,
	padding: f64,
	line_height_factor: f64,
) -> LabelBox {
	let mut lines: Vec<String> = text.split_whitespace().map(str::to_owned).collect();
	if lines.is_empty() {
		lines.push(String::new());
	}
	let widest = lines
		.iter()
		.map(|line| measure.text_width(line, font_px))
		.fold(0.0_f64, f64::max);
	let line_height = font_px * line_height_factor;
	LabelBox {
		width: widest + 2.0 * padding,
		height: lines.len() as f64 * line_height + 2.0 * padding,
		lines,
		line_height,
	}
}


#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	/// Every character advances by `factor` times the font size.
	pub(crate) struct FixedAdvance(pub f64);

	impl TextMeasure for FixedAdvance {
		fn text_width(&mut self, text: &str, font_px: f64) -> f64 {
			text.chars().count() as f64 * font_px * self.0
		}
	}

	#[test]
	fn rectangle_edges_are_inside() {
		assert!(point_in_rect(10.0, 5.0, 0.0, 0.0, 10.0, 5.0));
		assert!(!point_in_rect(10.1, 0.0, 0.0, 0.0, 10.0, 5.0));
		assert!(!point_in_rect(0.0, -5.5, 0.0, 0.0, 10.0, 5.0));
	}

	#[test]
	fn circle_uses_euclidean_distance() {
		assert!(point_in_circle(3.0, 4.0, 0.0, 0.0, 5.0));
		assert!(!point_in_circle(3.6, 3.6, 0.0, 0.0, 5.0));
	}

	#[test]
	fn font_size_is_largest_that_fits() {
		let mut measure = FixedAdvance(0.5);
		// 10 chars * 0.5 * size <= 60  =>  size <= 12
		let size = adaptive_font_size(&mut measure, "abcdefghij", 60.0, 40);
		assert_eq!(size, 12);
		assert!(measure.text_width("abcdefghij", size as f64) <= 60.0);
		assert!(measure.text_width("abcdefghij", (size + 1) as f64) > 60.0);
	}

	#[test]
	fn font_size_stays_in_bounds() {
		let mut measure = FixedAdvance(0.5);
		assert_eq!(adaptive_font_size(&mut measure, "a", 1000.0, 40), 40);
		assert_eq!(adaptive_font_size(&mut measure, "long label", 0.5, 40), 1);
		assert_eq!(adaptive_font_size(&mut measure, "", 10.0, 0), 1);
	}

	#[test]
	fn label_box_wraps_words() {
		let mut measure = FixedAdvance(0.5);
		let label = label_box(&mut measure, "big red dog", 20.0, 10.0, 1.2);
		assert_eq!(label.lines, vec!["big", "red", "dog"]);
		assert_eq!(label.width, 3.0 * 10.0 + 20.0);
		assert!((label.height - (3.0 * 24.0 + 20.0)).abs() < 1e-9);

		let empty = label_box(&mut measure, "", 20.0, 10.0, 1.2);
		assert_eq!(empty.width, 20.0);
		assert_eq!(empty.lines.len(), 1);
	}
}
