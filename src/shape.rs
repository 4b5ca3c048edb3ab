//! =============================================================================
//! SHAPE.RS - Bitmap du point + épingle et région de la fenêtre
//! SHAPE.RS - Dot + pin bitmap and window region
//! =============================================================================
//!
//! The window is drawn procedurally into a small two-tone raster: every pixel
//! is either the frame color or the mask color. The visible region of the
//! window is every pixel that is not the mask color.

use crate::color::Rgb;

// =============================================================================
// GÉOMÉTRIE
// GEOMETRY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Taille client de la fenêtre
/// Window client size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Half of the shorter side: the radius of the dot.
    pub fn min_half(&self) -> i32 {
        self.width.min(self.height) / 2
    }

    /// Half of the longer side.
    pub fn max_half(&self) -> i32 {
        self.width.max(self.height) / 2
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2, self.height / 2)
    }

    pub fn area(&self) -> u64 {
        self.width.max(0) as u64 * self.height.max(0) as u64
    }
}

// =============================================================================
// CANVAS
// =============================================================================

/// Raster RGB en mémoire, ligne par ligne
/// In-memory RGB raster, row by row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: i32,
    height: i32,
    pixels: Vec<Rgb>,
}

impl Canvas {
    /// Creates a canvas filled with `background`.
    pub fn new(width: i32, height: i32, background: Rgb) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            pixels: vec![background; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    fn put(&mut self, x: i32, y: i32, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// Only called with in-bounds coordinates.
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Rows of pixels, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.pixels.chunks(self.width.max(1) as usize)
    }

    /// Disque plein de centre (cx, cy) et de rayon `radius`
    /// Filled disc centered on (cx, cy) with the given radius
    ///
    /// A pixel belongs to the disc when its center lies inside the circle,
    /// so the disc covers the box `[cx - r, cx + r) x [cy - r, cy + r)`.
    pub fn fill_circle(&mut self, center: Point, radius: i32, color: Rgb) {
        if radius <= 0 {
            return;
        }
        let r2 = (radius as i64) * (radius as i64) * 4;
        for y in center.y - radius..center.y + radius {
            for x in center.x - radius..center.x + radius {
                // Doubled coordinates keep the pixel center (x + 0.5) integral.
                let dx = 2 * (x - center.x) as i64 + 1;
                let dy = 2 * (y - center.y) as i64 + 1;
                if dx * dx + dy * dy <= r2 {
                    self.put(x, y, color);
                }
            }
        }
    }

    /// Rectangle plein, découpé aux bords du canvas
    /// Filled rectangle, clipped to the canvas
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgb) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width).min(self.width);
        let y1 = (y + height).min(self.height);
        for py in y0..y1 {
            for px in x0..x1 {
                self.put(px, py, color);
            }
        }
    }

    /// Rows as 32-bit BGRX words, top-down, for native blitting.
    pub fn to_bgra(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| [p.b, p.g, p.r, 0xFF])
            .collect()
    }
}

// =============================================================================
// BITMAP DU POINT
// DOT BITMAP
// =============================================================================

/// Dessine le point et son épingle
/// Draws the dot and its pin
///
/// The canvas starts in the mask color. The dot is a disc of radius
/// `min_half` in the middle; the pin is a square that fills the corner
/// pointing at the cursor.
pub fn dropper_bitmap(geometry: Geometry, frame: Rgb, mask: Rgb) -> Canvas {
    let Geometry { width: w, height: h } = geometry;
    let mut canvas = Canvas::new(w, h, mask);
    let min_half = geometry.min_half();
    let max_half = geometry.max_half();

    canvas.fill_circle(geometry.center(), min_half, frame);
    if w > h {
        canvas.fill_rect(max_half - min_half, min_half, min_half, min_half, frame);
    } else if w < h {
        canvas.fill_rect(0, max_half, min_half, min_half + 1, frame);
    } else {
        canvas.fill_rect(0, max_half, min_half, min_half, frame);
    }
    canvas
}

// =============================================================================
// RÉGION
// REGION
// =============================================================================

/// Horizontal run of visible pixels on one row, `x0..x1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub y: i32,
    pub x0: i32,
    pub x1: i32,
}

impl Span {
    pub fn len(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0
    }
}

/// Région visible d'une fenêtre, en segments horizontaux
/// Visible window region, as horizontal spans
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Region {
    spans: Vec<Span>,
}

impl Region {
    /// Every pixel that differs from `mask` is part of the region.
    pub fn from_mask(canvas: &Canvas, mask: Rgb) -> Self {
        let mut spans = Vec::new();
        for (y, row) in canvas.rows().enumerate() {
            let mut start: Option<i32> = None;
            for (x, pixel) in row.iter().enumerate() {
                match (start, *pixel != mask) {
                    (None, true) => start = Some(x as i32),
                    (Some(x0), false) => {
                        spans.push(Span { y: y as i32, x0, x1: x as i32 });
                        start = None;
                    }
                    _ => {}
                }
            }
            if let Some(x0) = start {
                spans.push(Span { y: y as i32, x0, x1: row.len() as i32 });
            }
        }
        Self { spans }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Number of visible pixels.
    pub fn area(&self) -> u64 {
        self.spans.iter().map(|s| s.len() as u64).sum()
    }

    pub fn contains(&self, point: Point) -> bool {
        self.spans
            .iter()
            .any(|s| s.y == point.y && point.x >= s.x0 && point.x < s.x1)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Rgb = Rgb::BLACK;
    const MASK: Rgb = Rgb::WHITE;

    #[test]
    fn region_is_smaller_than_bounding_box() {
        for (w, h) in [(96, 96), (120, 80), (80, 120), (8, 8), (9, 8), (8, 9), (200, 8), (8, 200), (33, 47)] {
            let geometry = Geometry::new(w, h);
            let canvas = dropper_bitmap(geometry, FRAME, MASK);
            let region = Region::from_mask(&canvas, MASK);
            assert!(!region.is_empty(), "{w}x{h}");
            assert!(region.area() < geometry.area(), "{w}x{h}: {}", region.area());
        }
    }

    #[test]
    fn square_dot_has_pin_in_bottom_left() {
        let canvas = dropper_bitmap(Geometry::new(96, 96), FRAME, MASK);
        let region = Region::from_mask(&canvas, MASK);
        // Pin corner points at the cursor.
        assert!(region.contains(Point::new(0, 95)));
        assert!(region.contains(Point::new(47, 95)));
        // The other three corners are transparent.
        assert!(!region.contains(Point::new(0, 0)));
        assert!(!region.contains(Point::new(95, 0)));
        assert!(!region.contains(Point::new(95, 95)));
        // Center of the dot.
        assert!(region.contains(Point::new(48, 48)));
    }

    #[test]
    fn wide_pin_is_offset_from_the_left() {
        let geometry = Geometry::new(120, 80);
        let canvas = dropper_bitmap(geometry, FRAME, MASK);
        // max_half - min_half = 20, pin spans x 20..60, y 40..80.
        assert_eq!(canvas.pixel(20, 79), Some(FRAME));
        assert_eq!(canvas.pixel(59, 40), Some(FRAME));
        assert_eq!(canvas.pixel(19, 79), Some(MASK));
    }

    #[test]
    fn tall_pin_is_one_pixel_taller() {
        let geometry = Geometry::new(80, 121);
        let canvas = dropper_bitmap(geometry, FRAME, MASK);
        // max_half = 60, pin covers y 60..101.
        assert_eq!(canvas.pixel(0, 100), Some(FRAME));
        assert_eq!(canvas.pixel(0, 101), Some(MASK));
    }

    #[test]
    fn circle_is_symmetric() {
        let mut canvas = Canvas::new(20, 20, MASK);
        canvas.fill_circle(Point::new(10, 10), 6, FRAME);
        for y in 0..20 {
            for x in 0..20 {
                assert_eq!(canvas.pixel(x, y), canvas.pixel(19 - x, y), "({x},{y})");
                assert_eq!(canvas.pixel(x, y), canvas.pixel(x, 19 - y), "({x},{y})");
            }
        }
        assert_eq!(canvas.pixel(10, 4), Some(FRAME));
        assert_eq!(canvas.pixel(10, 3), Some(MASK));
    }

    #[test]
    fn rect_is_clipped() {
        let mut canvas = Canvas::new(4, 4, MASK);
        canvas.fill_rect(-2, 2, 10, 10, FRAME);
        let region = Region::from_mask(&canvas, MASK);
        assert_eq!(region.area(), 8);
        assert_eq!(region.spans(), &[Span { y: 2, x0: 0, x1: 4 }, Span { y: 3, x0: 0, x1: 4 }]);
    }

    #[test]
    fn region_splits_runs() {
        let mut canvas = Canvas::new(6, 1, MASK);
        canvas.fill_rect(0, 0, 2, 1, FRAME);
        canvas.fill_rect(4, 0, 1, 1, FRAME);
        let region = Region::from_mask(&canvas, MASK);
        assert_eq!(region.spans(), &[Span { y: 0, x0: 0, x1: 2 }, Span { y: 0, x0: 4, x1: 5 }]);
    }

    #[test]
    fn bgra_layout() {
        let canvas = Canvas::new(1, 1, Rgb::new(1, 2, 3));
        assert_eq!(canvas.to_bgra(), vec![3, 2, 1, 0xFF]);
    }
}
