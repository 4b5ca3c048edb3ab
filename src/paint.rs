//! Liste d'opérations de dessin pour un rafraîchissement
//! Draw operations for one repaint
//!
//! The dropper does not draw by itself: it describes each repaint as an
//! ordered list of [`DrawOp`] that the platform backend replays on its own
//! drawing surface (GDI device context, AppKit view).

use crate::color::Rgb;
use crate::config::{RING_DIVISOR, RING_FACTOR, TEXT_HEIGHT_DIVISOR, TEXT_WIDTH_DIVISOR};
use crate::shape::{Geometry, Point};

/// Font size in pixels (width of an average glyph, height of a line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSize {
    pub width: i32,
    pub height: i32,
}

impl FontSize {
    /// Derived from the dot radius, never smaller than one pixel.
    pub fn for_geometry(geometry: Geometry) -> Self {
        let min_half = geometry.min_half();
        Self {
            width: (min_half / TEXT_WIDTH_DIVISOR).max(1),
            height: (min_half / TEXT_HEIGHT_DIVISOR).max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOp {
    /// The base dot + pin bitmap at `origin`. Mask pixels fall outside the
    /// window region, so the backend never shows them.
    Bitmap { origin: Point },

    /// Filled circle with a one-pixel outline.
    Circle { center: Point, radius: i32, fill: Rgb, outline: Rgb },

    /// Text centered on `center` once measured, then moved by `nudge`.
    Text { text: String, center: Point, nudge: Point, color: Rgb, font: FontSize },
}

/// Radius of the preview disc drawn over the base dot.
pub fn preview_radius(geometry: Geometry) -> i32 {
    geometry.min_half() / RING_DIVISOR * RING_FACTOR
}

/// Top-left corner for text of the measured `extent` (width, height).
pub fn text_origin(center: Point, extent: (i32, i32), nudge: Point) -> Point {
    Point::new(
        center.x - extent.0 / 2 + nudge.x,
        center.y - extent.1 / 2 + nudge.y,
    )
}

/// Construit la liste complète d'un rafraîchissement
/// Builds the full list for one repaint
///
/// 1. base bitmap, clipped to the window region
/// 2. shadow disc one pixel down-right in the frame complement
/// 3. disc in the dot color
/// 4. hex text in the frame color
/// 5. same text one pixel up-left in the dot complement
pub fn compose(geometry: Geometry, frame: Rgb, dot: Rgb, dot_text: &str) -> Vec<DrawOp> {
    let center = geometry.center();
    let radius = preview_radius(geometry);
    let frame_complement = frame.complement();
    let font = FontSize::for_geometry(geometry);

    vec![
        DrawOp::Bitmap { origin: Point::default() },
        DrawOp::Circle {
            center: Point::new(center.x + 1, center.y + 1),
            radius,
            fill: frame_complement,
            outline: frame_complement,
        },
        DrawOp::Circle { center, radius, fill: dot, outline: dot },
        DrawOp::Text {
            text: dot_text.to_string(),
            center,
            nudge: Point::default(),
            color: frame,
            font,
        },
        DrawOp::Text {
            text: dot_text.to_string(),
            center,
            nudge: Point::new(-1, -1),
            color: dot.complement(),
            font,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_layers_in_order() {
        let geometry = Geometry::new(96, 96);
        let dot = Rgb::new(0x12, 0x34, 0x56);
        let ops = compose(geometry, Rgb::BLACK, dot, "#123456");

        assert_eq!(ops.len(), 5);
        assert_eq!(ops[0], DrawOp::Bitmap { origin: Point::new(0, 0) });
        assert_eq!(
            ops[1],
            DrawOp::Circle { center: Point::new(49, 49), radius: 36, fill: Rgb::WHITE, outline: Rgb::WHITE }
        );
        assert_eq!(ops[2], DrawOp::Circle { center: Point::new(48, 48), radius: 36, fill: dot, outline: dot });

        let font = FontSize { width: 8, height: 12 };
        assert_eq!(
            ops[3],
            DrawOp::Text {
                text: "#123456".into(),
                center: Point::new(48, 48),
                nudge: Point::new(0, 0),
                color: Rgb::BLACK,
                font,
            }
        );
        assert_eq!(
            ops[4],
            DrawOp::Text {
                text: "#123456".into(),
                center: Point::new(48, 48),
                nudge: Point::new(-1, -1),
                color: Rgb::new(0xed, 0xcb, 0xa9),
                font,
            }
        );
    }

    #[test]
    fn preview_radius_truncates() {
        // min_half 25 -> 25 / 4 * 3 = 18
        assert_eq!(preview_radius(Geometry::new(50, 60)), 18);
        assert_eq!(preview_radius(Geometry::new(8, 8)), 3);
    }

    #[test]
    fn tiny_font_is_at_least_one_pixel() {
        assert_eq!(FontSize::for_geometry(Geometry::new(8, 8)), FontSize { width: 1, height: 1 });
    }

    #[test]
    fn text_is_centered_then_nudged() {
        let origin = text_origin(Point::new(48, 48), (40, 12), Point::new(-1, -1));
        assert_eq!(origin, Point::new(27, 41));
    }
}
