//! What to draw for the surface. Front ends provide a [`Canvas`].

use serde::{Deserialize, Serialize};

use crate::model::{Extent, Geometry, Marker, MarkerId, Point, Shape};
use crate::surface::AnnotationSurface;

/// Space between the label text and the edge of its tag
pub const LABEL_PADDING: f64 = 10.0;
pub const LABEL_INSET: f64 = 5.0;
pub const SELECTED_OVERLAY_ALPHA: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 128, 0);
}

/// Parse `rgb` or `rrggbb` hex, with or without a leading `#`
pub fn hex_to_color(s: &str) -> Option<Rgb> {
    let s = s.strip_prefix('#').unwrap_or(s);
    if !s.is_ascii() {
        return None;
    }
    let expanded: String = match s.len() {
        3 => s.chars().flat_map(|c| [c, c]).collect(),
        6 => s.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    pub fill: Rgb,
    pub border: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub unselected: ColorPair,
    pub selected: ColorPair,
    pub label_text: Rgb,
    /// Painted under the outline of filled markers
    pub fill: Rgb,
}

impl Palette {
    fn pair(&self, selected: bool) -> ColorPair {
        if selected {
            self.selected
        } else {
            self.unselected
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            unselected: ColorPair {
                fill: Rgb(0xa2, 0xc5, 0xac),
                border: Rgb(0x92, 0xb5, 0x9c),
            },
            selected: ColorPair {
                fill: Rgb::GREEN,
                border: Rgb::GREEN,
            },
            label_text: Rgb::RED,
            fill: Rgb::WHITE,
        }
    }
}

/// How a marker id turns into the number printed on its label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelNumbering {
    /// `(id - 1) / 2 + 1` in floating point, so id 2 prints as 1.5
    #[default]
    Legacy,
    /// The id itself
    Sequential,
}

impl LabelNumbering {
    pub fn display_number(self, id: MarkerId) -> String {
        match self {
            LabelNumbering::Legacy => {
                let n = (f64::from(id.get()) - 1.0) / 2.0 + 1.0;
                format!("{}", n)
            }
            LabelNumbering::Sequential => id.to_string(),
        }
    }

    pub fn label(self, id: MarkerId) -> String {
        format!("Text{}", self.display_number(id))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub ascent: f64,
}

/// Drawing operations a front end must supply
pub trait Canvas {
    fn clear(&mut self, size: Extent);
    fn stroke_shape(&mut self, shape: Shape, geometry: &Geometry, color: Rgb);
    /// `alpha` is 1.0 for opaque fills
    fn fill_shape(&mut self, shape: Shape, geometry: &Geometry, color: Rgb, alpha: f64);
    fn fill_text(&mut self, text: &str, at: Point, color: Rgb);
    fn measure_text(&self, text: &str) -> TextMetrics;
}

/// Draw one marker: fill, outline, selection overlay, then the id tag
pub fn draw_marker<C: Canvas + ?Sized>(
    canvas: &mut C,
    marker: &Marker,
    palette: &Palette,
    numbering: LabelNumbering,
) {
    let g = &marker.geometry;
    let pair = palette.pair(marker.selected);

    if marker.filled {
        canvas.fill_shape(marker.shape, g, palette.fill, 1.0);
    }
    canvas.stroke_shape(marker.shape, g, pair.border);
    if marker.selected {
        canvas.fill_shape(marker.shape, g, palette.selected.fill, SELECTED_OVERLAY_ALPHA);
    }

    if marker.id.is_some() {
        let label = numbering.label(marker.id);
        let metrics = canvas.measure_text(&label);
        let tag = Geometry::new(
            g.origin.x,
            g.origin.y - metrics.ascent - LABEL_PADDING,
            metrics.width + LABEL_PADDING,
            metrics.ascent + LABEL_PADDING,
        );
        canvas.fill_shape(Shape::Rectangle, &tag, pair.fill, 1.0);
        canvas.fill_text(
            &label,
            Point::new(g.origin.x + LABEL_INSET, g.origin.y - LABEL_INSET),
            palette.label_text,
        );
    }
}

/// Draw the whole surface: every marker in creation order, then the live drag
pub fn draw_surface<C: Canvas + ?Sized>(
    canvas: &mut C,
    surface: &AnnotationSurface,
    palette: &Palette,
    numbering: LabelNumbering,
) {
    canvas.clear(surface.image_size());

    for marker in surface.markers() {
        draw_marker(canvas, marker, palette, numbering);
    }

    // The live drag is outlined only; fill applies once it is committed
    if let Some(drag) = surface.drag() {
        let preview = Marker::new(MarkerId::NONE, drag.geometry, drag.shape, false);
        draw_marker(canvas, &preview, palette, numbering);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerEvent;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear,
        Stroke(Shape, Rgb),
        Fill(Shape, Rgb, f64),
        Text(String, Point),
    }

    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
    }

    impl Canvas for Recorder {
        fn clear(&mut self, _size: Extent) {
            self.ops.push(Op::Clear);
        }

        fn stroke_shape(&mut self, shape: Shape, _geometry: &Geometry, color: Rgb) {
            self.ops.push(Op::Stroke(shape, color));
        }

        fn fill_shape(&mut self, shape: Shape, _geometry: &Geometry, color: Rgb, alpha: f64) {
            self.ops.push(Op::Fill(shape, color, alpha));
        }

        fn fill_text(&mut self, text: &str, at: Point, _color: Rgb) {
            self.ops.push(Op::Text(text.to_string(), at));
        }

        fn measure_text(&self, text: &str) -> TextMetrics {
            TextMetrics {
                width: text.len() as f64 * 6.0,
                ascent: 8.0,
            }
        }
    }

    #[test]
    fn test_hex_to_color() {
        assert_eq!(hex_to_color("a2c5ac"), Some(Rgb(0xa2, 0xc5, 0xac)));
        assert_eq!(hex_to_color("#fff"), Some(Rgb::WHITE));
        assert_eq!(hex_to_color("f0"), None);
        assert_eq!(hex_to_color("zzzzzz"), None);
    }

    #[test]
    fn test_legacy_numbering_keeps_fractional_labels() {
        let n = LabelNumbering::Legacy;
        assert_eq!(n.label(MarkerId(1)), "Text1");
        assert_eq!(n.label(MarkerId(2)), "Text1.5");
        assert_eq!(n.label(MarkerId(3)), "Text2");
        assert_eq!(LabelNumbering::Sequential.label(MarkerId(2)), "Text2");
    }

    #[test]
    fn test_selected_filled_marker_draw_order() {
        let palette = Palette::default();
        let geometry = Geometry::new(10.0, 30.0, 20.0, 20.0);
        let mut marker = Marker::new(MarkerId(1), geometry, Shape::Ellipse, true);
        marker.selected = true;

        let mut canvas = Recorder::default();
        draw_marker(&mut canvas, &marker, &palette, LabelNumbering::Legacy);

        assert_eq!(
            canvas.ops,
            vec![
                Op::Fill(Shape::Ellipse, Rgb::WHITE, 1.0),
                Op::Stroke(Shape::Ellipse, palette.selected.border),
                Op::Fill(Shape::Ellipse, palette.selected.fill, SELECTED_OVERLAY_ALPHA),
                Op::Fill(Shape::Rectangle, palette.selected.fill, 1.0),
                Op::Text("Text1".to_string(), Point::new(15.0, 25.0)),
            ]
        );
        assert!(marker.selected);
    }

    #[test]
    fn test_drag_preview_is_outline_only() {
        let mut surface = AnnotationSurface::new();
        surface.tool.fill_enabled = true;
        surface.handle_pointer(PointerEvent::down(40.0, 40.0));
        surface.handle_pointer(PointerEvent::moved(10.0, 10.0));

        let mut canvas = Recorder::default();
        draw_surface(&mut canvas, &surface, &Palette::default(), LabelNumbering::Legacy);

        assert_eq!(
            canvas.ops,
            vec![
                Op::Clear,
                Op::Stroke(Shape::Rectangle, Palette::default().unselected.border),
            ]
        );
        assert!(surface.drag().is_some_and(|d| d.filled));
    }
}
