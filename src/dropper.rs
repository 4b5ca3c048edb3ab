//! =============================================================================
//! DROPPER.RS - État de la fenêtre pipette
//! DROPPER.RS - Color dropper window state
//! =============================================================================
//!
//! Platform independent half of the window. Construction builds the dot
//! bitmap and its region; every tick then follows the cursor and samples the
//! pixel under it; every repaint is described as a list of draw operations.
//!
//! # Cycle de vie / Lifecycle
//! - `Constructed`: bitmap and region built, timer not started
//! - `Running`: timer started, ticks move the window and resample
//! - `Disposed`: terminal, ticks and clicks are ignored

use std::time::Duration;

use crate::color::Rgb;
use crate::config::{DropperConfig, CURSOR_OFFSET, TIMER_INTERVAL_MS};
use crate::error::{DropperError, DropperResult};
use crate::paint::{self, DrawOp};
use crate::platform::Desktop;
use crate::shape::{self, Canvas, Geometry, Point, Region};
use crate::timer::{Ticker, TimerBackend};

// =============================================================================
// CLIC
// CLICK
// =============================================================================

/// Called when the window is clicked, with the color currently shown.
///
/// The dropper itself does nothing on click; an embedding application
/// supplies its own handler.
pub trait ClickHandler {
    fn on_click(&mut self, color: Rgb);
}

/// Default handler: ignores clicks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopClick;

impl ClickHandler for NoopClick {
    fn on_click(&mut self, _color: Rgb) {}
}

impl<F: FnMut(Rgb)> ClickHandler for F {
    fn on_click(&mut self, color: Rgb) {
        self(color)
    }
}

/// Clic sorti de la fenêtre, à exécuter hors de tout emprunt
/// Click taken out of the window, to run outside of any borrow
///
/// The handler may pump native events, which re-enter the backend and borrow
/// the window state again. Backends take the click under the borrow, release
/// it, dispatch, then hand the handler back with
/// [`DropperWindow::restore_click`].
pub struct PendingClick {
    handler: Box<dyn ClickHandler>,
    color: Rgb,
}

impl PendingClick {
    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Runs the handler and returns it.
    pub fn dispatch(mut self) -> Box<dyn ClickHandler> {
        self.handler.on_click(self.color);
        self.handler
    }
}

/// État des boutons de la souris
/// Mouse button state
///
/// Used by backends that poll the buttons on each tick instead of receiving
/// click events, since the cursor is never over the window.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MouseButtons {
    pub left: bool,
    pub right: bool,
}

impl MouseButtons {
    /// From a pressed-buttons bit mask: bit 0 is the left button, bit 1 the right.
    pub fn from_mask(mask: u64) -> Self {
        Self { left: mask & 1 != 0, right: mask & 2 != 0 }
    }

    /// Buttons down now that were up in `previous`.
    pub fn pressed_since(self, previous: Self) -> Self {
        Self {
            left: self.left && !previous.left,
            right: self.right && !previous.right,
        }
    }
}

// =============================================================================
// ÉTAT
// STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constructed,
    Running,
    Disposed,
}

/// Résultat d'un tick du timer
/// Result of one timer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// New top-left corner of the window, in screen coordinates.
    pub origin: Point,
    pub cursor: Point,
    pub color: Rgb,
    /// Whether the sampled color differs from the previous one.
    pub changed: bool,
}

pub struct ColorDropper {
    geometry: Geometry,
    frame: Rgb,
    mask: Rgb,
    dot: Rgb,
    dot_text: String,
    position: Option<Point>,
    bitmap: Canvas,
    region: Region,
    phase: Phase,
}

impl ColorDropper {
    /// Valide la configuration et construit le bitmap et sa région
    /// Validates the configuration and builds the bitmap and its region
    pub fn new(config: &DropperConfig) -> DropperResult<Self> {
        let palette = config.validate()?;
        let (width, height) = config.size;
        let geometry = Geometry::new(width as i32, height as i32);
        let bitmap = shape::dropper_bitmap(geometry, palette.frame, palette.mask);
        let region = Region::from_mask(&bitmap, palette.mask);

        tracing::info!(
            width,
            height,
            region_area = region.area(),
            "color dropper constructed"
        );

        Ok(Self {
            geometry,
            frame: palette.frame,
            mask: palette.mask,
            dot: palette.dot,
            dot_text: config.dot_color.clone(),
            position: config.position.map(|(x, y)| Point::new(x, y)),
            bitmap,
            region,
            phase: Phase::Constructed,
        })
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn frame_color(&self) -> Rgb {
        self.frame
    }

    pub fn mask_color(&self) -> Rgb {
        self.mask
    }

    pub fn dot_color(&self) -> Rgb {
        self.dot
    }

    /// Text drawn on the dot: the configured text until the first sample,
    /// then uppercase `#RRGGBB`.
    pub fn dot_text(&self) -> &str {
        &self.dot_text
    }

    pub fn bitmap(&self) -> &Canvas {
        &self.bitmap
    }

    /// Shape to apply to the native window.
    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_disposed(&self) -> bool {
        self.phase == Phase::Disposed
    }

    /// Top-left corner before the first tick: the configured position, or
    /// centered on a screen of the given size.
    pub fn initial_origin(&self, screen: Geometry) -> Point {
        self.position.unwrap_or_else(|| {
            Point::new(
                (screen.width - self.geometry.width) / 2,
                (screen.height - self.geometry.height) / 2,
            )
        })
    }

    /// Window origin for a cursor at `cursor`: above and right of it, so
    /// the pin points at the cursor without covering the sampled pixel.
    pub fn origin_for_cursor(&self, cursor: Point) -> Point {
        Point::new(
            cursor.x + CURSOR_OFFSET,
            cursor.y - self.geometry.height - CURSOR_OFFSET,
        )
    }

    pub fn start(&mut self) -> DropperResult<()> {
        match self.phase {
            Phase::Constructed => {
                self.phase = Phase::Running;
                tracing::info!("color dropper running");
                Ok(())
            }
            Phase::Running => Ok(()),
            Phase::Disposed => Err(DropperError::Disposed),
        }
    }

    /// Un tick du timer : suit le curseur et échantillonne le pixel
    /// One timer tick: follows the cursor and samples the pixel
    ///
    /// Returns `None` without touching `desktop` unless the dropper is
    /// running. When sampling fails the previous color is kept.
    pub fn tick(&mut self, desktop: &dyn Desktop) -> Option<TickOutcome> {
        if self.phase != Phase::Running {
            return None;
        }
        let cursor = desktop.cursor_position()?;
        let origin = self.origin_for_cursor(cursor);

        let mut changed = false;
        match desktop.pixel_at(cursor) {
            Some(color) => {
                let text = color.to_hex_upper();
                changed = color != self.dot || self.dot_text != text;
                if changed {
                    tracing::debug!(x = cursor.x, y = cursor.y, color = %color, "sampled color changed");
                }
                self.dot = color;
                self.dot_text = text;
            }
            None => {
                tracing::debug!(x = cursor.x, y = cursor.y, "pixel sampling failed; keeping previous color");
            }
        }

        Some(TickOutcome { origin, cursor, color: self.dot, changed })
    }

    /// Opérations de dessin du rafraîchissement courant
    /// Draw operations for the current repaint
    pub fn paint_ops(&self) -> Vec<DrawOp> {
        paint::compose(self.geometry, self.frame, self.dot, &self.dot_text)
    }

    pub fn dispose(&mut self) {
        if self.phase != Phase::Disposed {
            self.phase = Phase::Disposed;
            tracing::info!("color dropper disposed");
        }
    }
}

// =============================================================================
// FENÊTRE
// WINDOW
// =============================================================================

/// Dropper state plus the native timer and the click hook, as held by a
/// platform backend for the lifetime of its window.
pub struct DropperWindow<B: TimerBackend> {
    dropper: ColorDropper,
    ticker: Ticker<B>,
    /// `None` while a click is being dispatched.
    click: Option<Box<dyn ClickHandler>>,
}

impl<B: TimerBackend> DropperWindow<B> {
    pub fn new(dropper: ColorDropper, timer: B, click: Box<dyn ClickHandler>) -> Self {
        let interval = Duration::from_millis(TIMER_INTERVAL_MS as u64);
        Self { dropper, ticker: Ticker::new(timer, interval), click: Some(click) }
    }

    pub fn dropper(&self) -> &ColorDropper {
        &self.dropper
    }

    /// Starts the dropper, then its timer.
    pub fn start(&mut self) -> DropperResult<()> {
        self.dropper.start()?;
        self.ticker.start()
    }

    pub fn on_timer(&mut self, desktop: &dyn Desktop) -> Option<TickOutcome> {
        if !self.ticker.is_running() {
            return None;
        }
        self.dropper.tick(desktop)
    }

    /// Takes the click handler out with the color currently shown.
    ///
    /// Returns `None` once closed, or while an earlier click is still being
    /// dispatched.
    pub fn take_click(&mut self) -> Option<PendingClick> {
        if self.dropper.is_disposed() {
            return None;
        }
        let handler = self.click.take()?;
        Some(PendingClick { handler, color: self.dropper.dot_color() })
    }

    pub fn restore_click(&mut self, handler: Box<dyn ClickHandler>) {
        if self.click.is_none() {
            self.click = Some(handler);
        }
    }

    /// Dispatches a click in place, for callers that hold the window directly.
    pub fn on_click(&mut self) {
        if let Some(pending) = self.take_click() {
            let handler = pending.dispatch();
            self.restore_click(handler);
        }
    }

    pub fn paint_ops(&self) -> Vec<DrawOp> {
        self.dropper.paint_ops()
    }

    /// Stops the timer first, then disposes the dropper. Must run before the
    /// native window is destroyed.
    pub fn close(&mut self) {
        self.ticker.stop();
        self.dropper.dispose();
    }

    pub fn is_closed(&self) -> bool {
        self.dropper.is_disposed()
    }
}

impl<B: TimerBackend> Drop for DropperWindow<B> {
    fn drop(&mut self) {
        self.close();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::tests::RecordingTimer;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Fake desktop with a scripted cursor and a constant screen color.
    struct FakeDesktop {
        cursor: Point,
        color: Option<Rgb>,
        calls: Cell<usize>,
    }

    impl FakeDesktop {
        fn new(cursor: Point, color: Option<Rgb>) -> Self {
            Self { cursor, color, calls: Cell::new(0) }
        }
    }

    impl Desktop for FakeDesktop {
        fn cursor_position(&self) -> Option<Point> {
            self.calls.set(self.calls.get() + 1);
            Some(self.cursor)
        }

        fn pixel_at(&self, _at: Point) -> Option<Rgb> {
            self.calls.set(self.calls.get() + 1);
            self.color
        }
    }

    fn running() -> ColorDropper {
        let mut dropper = ColorDropper::new(&DropperConfig::default()).unwrap();
        dropper.start().unwrap();
        dropper
    }

    #[test]
    fn construction_builds_a_shaped_region() {
        let dropper = ColorDropper::new(&DropperConfig::default()).unwrap();
        assert_eq!(dropper.phase(), Phase::Constructed);
        assert!(dropper.region().area() < dropper.geometry().area());
        assert_eq!(dropper.dot_text(), "#FFFFFF");
    }

    #[test]
    fn tick_follows_the_cursor() {
        let mut dropper = running();
        let desktop = FakeDesktop::new(Point::new(500, 300), Some(Rgb::new(1, 2, 3)));
        let outcome = dropper.tick(&desktop).unwrap();
        assert_eq!(outcome.origin, Point::new(504, 300 - 96 - 4));
        assert_eq!(outcome.cursor, Point::new(500, 300));
        assert_eq!(outcome.color, Rgb::new(1, 2, 3));
        assert!(outcome.changed);
        assert_eq!(dropper.dot_text(), "#010203");

        let again = dropper.tick(&desktop).unwrap();
        assert!(!again.changed);
    }

    #[test]
    fn sampled_text_is_uppercase_html_syntax() {
        let mut dropper = running();
        dropper.tick(&FakeDesktop::new(Point::new(0, 0), Some(Rgb::new(255, 0, 0)))).unwrap();
        assert_eq!(dropper.dot_text(), "#FF0000");

        dropper.tick(&FakeDesktop::new(Point::new(0, 0), Some(Rgb::new(0xab, 0xcd, 0xef)))).unwrap();
        assert_eq!(dropper.dot_text(), "#ABCDEF");
    }

    #[test]
    fn oversized_config_is_an_error_not_a_panic() {
        let config = DropperConfig { size: (50_000, 50_000), ..DropperConfig::default() };
        assert!(matches!(
            ColorDropper::new(&config),
            Err(DropperError::InvalidSize { width: 50_000, height: 50_000 })
        ));
    }

    #[test]
    fn failed_sample_keeps_previous_color() {
        let mut dropper = running();
        dropper.tick(&FakeDesktop::new(Point::new(0, 0), Some(Rgb::new(9, 9, 9)))).unwrap();
        let outcome = dropper.tick(&FakeDesktop::new(Point::new(10, 10), None)).unwrap();
        assert_eq!(outcome.color, Rgb::new(9, 9, 9));
        assert!(!outcome.changed);
        assert_eq!(outcome.origin, Point::new(14, 10 - 96 - 4));
    }

    #[test]
    fn tick_before_start_does_nothing() {
        let mut dropper = ColorDropper::new(&DropperConfig::default()).unwrap();
        let desktop = FakeDesktop::new(Point::new(1, 1), Some(Rgb::BLACK));
        assert!(dropper.tick(&desktop).is_none());
        assert_eq!(desktop.calls.get(), 0);
    }

    #[test]
    fn disposed_dropper_never_touches_the_desktop() {
        let mut dropper = running();
        dropper.dispose();
        let desktop = FakeDesktop::new(Point::new(1, 1), Some(Rgb::BLACK));
        for _ in 0..5 {
            assert!(dropper.tick(&desktop).is_none());
        }
        assert_eq!(desktop.calls.get(), 0);
        assert!(matches!(dropper.start(), Err(DropperError::Disposed)));
    }

    #[test]
    fn initial_origin_centers_without_position() {
        let dropper = ColorDropper::new(&DropperConfig::default()).unwrap();
        assert_eq!(dropper.initial_origin(Geometry::new(1920, 1080)), Point::new(912, 492));

        let placed = ColorDropper::new(&DropperConfig {
            position: Some((5, 6)),
            ..DropperConfig::default()
        })
        .unwrap();
        assert_eq!(placed.initial_origin(Geometry::new(1920, 1080)), Point::new(5, 6));
    }

    #[test]
    fn paint_reflects_the_sampled_color() {
        let mut dropper = running();
        dropper.tick(&FakeDesktop::new(Point::new(0, 0), Some(Rgb::new(0x80, 0x80, 0x80)))).unwrap();
        let ops = dropper.paint_ops();
        match &ops[4] {
            DrawOp::Text { text, color, .. } => {
                assert_eq!(text, "#808080");
                assert_eq!(*color, Rgb::new(0x7f, 0x7f, 0x7f));
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn close_stops_timer_before_disposal_and_blocks_later_ticks() {
        let timer = RecordingTimer::default();
        let log = timer.log.clone();
        let mut window = DropperWindow::new(
            ColorDropper::new(&DropperConfig::default()).unwrap(),
            timer,
            Box::new(NoopClick),
        );
        window.start().unwrap();

        let desktop = FakeDesktop::new(Point::new(3, 4), Some(Rgb::WHITE));
        assert!(window.on_timer(&desktop).is_some());
        let calls_before_close = desktop.calls.get();

        window.close();
        assert!(window.is_closed());
        assert_eq!(*log.borrow(), vec!["start", "stop"]);

        // A tick already queued by the event loop arrives after close.
        assert!(window.on_timer(&desktop).is_none());
        assert_eq!(desktop.calls.get(), calls_before_close);

        drop(window);
        assert_eq!(*log.borrow(), vec!["start", "stop"]);
    }

    #[test]
    fn click_reports_current_color_until_closed() {
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let sink = clicks.clone();
        let mut window = DropperWindow::new(
            ColorDropper::new(&DropperConfig::default()).unwrap(),
            RecordingTimer::default(),
            Box::new(move |color: Rgb| sink.borrow_mut().push(color)),
        );
        window.start().unwrap();
        window.on_timer(&FakeDesktop::new(Point::new(0, 0), Some(Rgb::new(4, 5, 6))));
        window.on_click();
        window.close();
        window.on_click();
        assert_eq!(*clicks.borrow(), vec![Rgb::new(4, 5, 6)]);
    }

    #[test]
    fn click_handler_can_reenter_the_window_state() {
        // Same shape as a backend: the window lives in a shared cell and the
        // handler runs a nested tick, as a modal dialog pumping events would.
        type Slot = Rc<RefCell<Option<DropperWindow<RecordingTimer>>>>;
        let slot: Slot = Rc::new(RefCell::new(None));
        let nested_ticks = Rc::new(Cell::new(0));

        let inner = slot.clone();
        let ticks = nested_ticks.clone();
        let handler = move |_color: Rgb| {
            let mut guard = inner.borrow_mut();
            let window = guard.as_mut().unwrap();
            if window.on_timer(&FakeDesktop::new(Point::new(7, 7), Some(Rgb::BLACK))).is_some() {
                ticks.set(ticks.get() + 1);
            }
            // A nested click while this one runs is dropped.
            assert!(window.take_click().is_none());
        };

        let mut window = DropperWindow::new(
            ColorDropper::new(&DropperConfig::default()).unwrap(),
            RecordingTimer::default(),
            Box::new(handler),
        );
        window.start().unwrap();
        *slot.borrow_mut() = Some(window);

        for _ in 0..2 {
            let pending = slot.borrow_mut().as_mut().and_then(|w| w.take_click());
            let handler = pending.unwrap().dispatch();
            slot.borrow_mut().as_mut().unwrap().restore_click(handler);
        }
        assert_eq!(nested_ticks.get(), 2);

        let mut window = slot.borrow_mut().take().unwrap();
        window.close();
        assert!(window.take_click().is_none());
    }

    #[test]
    fn mouse_buttons_report_new_presses_only() {
        let up = MouseButtons::default();
        let left = MouseButtons::from_mask(0b01);
        let both = MouseButtons::from_mask(0b11);

        assert_eq!(left.pressed_since(up), MouseButtons { left: true, right: false });
        assert_eq!(left.pressed_since(left), MouseButtons::default());
        assert_eq!(both.pressed_since(left), MouseButtons { left: false, right: true });
        assert_eq!(MouseButtons::from_mask(0b100), up);
    }
}
