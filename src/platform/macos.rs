//! macOS implementation of the color dropper
//!
//! A borderless, non-opaque AppKit window whose view only paints the pixels
//! of the dropper region; everything else stays fully transparent, which
//! gives the window its dot + pin shape. An `NSTimer` drives the tracking.
//!
//! The window sits beside the cursor, so it never receives mouse events.
//! Each tick polls the global button state instead: a left press is the
//! click hook, a right press closes. Escape closes through the key window.

// Suppress deprecation warnings for legacy objc crate usage
#![allow(deprecated)]

// =============================================================================
// IMPORTS
// =============================================================================

// Objective-C runtime bindings for low-level messaging (legacy)
use objc::declare::ClassDecl;
use objc::runtime::{Object, Sel, BOOL};
use objc::{class, msg_send, sel, sel_impl};

// objc2 imports for modern Objective-C bindings
use objc2::runtime::AnyObject;
use objc2::ClassType;
use objc2_app_kit::{
    NSApplication, NSApplicationActivationPolicy, NSBezierPath, NSColor, NSStringDrawing, NSView,
    NSWindow as NSWindow2,
};
use objc2_foundation::{MainThreadMarker, NSDictionary, NSPoint, NSRect, NSSize, NSString};

// Core Graphics for sampling the pixel under the cursor
use core_graphics::display::CGDisplay;

use std::cell::RefCell;
use std::ptr::null_mut;
use std::rc::Rc;
use std::time::Duration;

use crate::color::Rgb;
use crate::config::DropperConfig;
use crate::dropper::{ClickHandler, ColorDropper, DropperWindow, MouseButtons};
use crate::error::{DropperError, DropperResult};
use crate::paint::{text_origin, DrawOp, FontSize};
use crate::platform::Desktop;
use crate::shape::{Canvas, Geometry, Point, Region};
use crate::timer::TimerBackend;

// Type alias for Objective-C object pointer (replaces deprecated cocoa::base::id)
type Id = *mut Object;

// Objective-C boolean constants (replaces deprecated cocoa::base::YES/NO)
const YES: BOOL = true as BOOL;
const NO: BOOL = false as BOOL;

// NSRect compatible with objc::Encode for use with add_method
// This is needed because objc2's NSRect doesn't implement objc::Encode
#[repr(C)]
#[derive(Copy, Clone, Debug)]
struct NSRectEncode {
    pub origin: NSPointEncode,
    pub size: NSSizeEncode,
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
struct NSPointEncode {
    pub x: f64,
    pub y: f64,
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
struct NSSizeEncode {
    pub width: f64,
    pub height: f64,
}

unsafe impl objc::Encode for NSRectEncode {
    fn encode() -> objc::Encoding {
        let encoding = format!(
            "{{CGRect={}{}}}",
            NSPointEncode::encode().as_str(),
            NSSizeEncode::encode().as_str()
        );
        unsafe { objc::Encoding::from_str(&encoding) }
    }
}

unsafe impl objc::Encode for NSPointEncode {
    fn encode() -> objc::Encoding {
        unsafe { objc::Encoding::from_str("{CGPoint=dd}") }
    }
}

unsafe impl objc::Encode for NSSizeEncode {
    fn encode() -> objc::Encoding {
        unsafe { objc::Encoding::from_str("{CGSize=dd}") }
    }
}

/// NSFloatingWindowLevel: above normal windows
const FLOATING_WINDOW_LEVEL: i64 = 3;

/// Escape key code on every macOS keyboard layout
const ESCAPE_KEY_CODE: u16 = 53;

// =============================================================================
// GLOBAL STATE
// =============================================================================

struct MacState {
    window: DropperWindow<NsTimer>,
    ns_window: Id,
    view: Id,
    /// Base bitmap and its region, shared with every repaint
    bitmap: Rc<Canvas>,
    region: Rc<Region>,
    /// Buttons seen on the previous tick
    buttons: MouseButtons,
}

thread_local! {
    /// Objective-C callbacks are plain functions; their state lives here.
    static STATE: RefCell<Option<MacState>> = const { RefCell::new(None) };
}

fn with_state<R>(f: impl FnOnce(&mut MacState) -> R) -> Option<R> {
    STATE.with(|cell| cell.borrow_mut().as_mut().map(f))
}

// =============================================================================
// TIMER
// =============================================================================

/// NSTimer scheduled on the main run loop, firing `dropperTick:` on the view
struct NsTimer {
    target: Id,
    timer: Id,
}

impl TimerBackend for NsTimer {
    fn start(&mut self, interval: Duration) -> DropperResult<()> {
        let timer: Id = unsafe {
            msg_send![class!(NSTimer),
                scheduledTimerWithTimeInterval: interval.as_secs_f64()
                target: self.target
                selector: sel!(dropperTick:)
                userInfo: null_mut::<Object>()
                repeats: YES
            ]
        };
        if timer.is_null() {
            return Err(DropperError::Platform("NSTimer scheduling failed".into()));
        }
        self.timer = timer;
        Ok(())
    }

    fn stop(&mut self) {
        if !self.timer.is_null() {
            unsafe {
                let _: () = msg_send![self.timer, invalidate];
            }
            self.timer = null_mut();
        }
    }
}

// =============================================================================
// DESKTOP
// =============================================================================

/// Height of the main display in points; converts between AppKit's
/// bottom-left origin and the top-left origin used by the dropper.
fn main_display_height() -> f64 {
    CGDisplay::main().bounds().size.height
}

struct MacDesktop;

impl Desktop for MacDesktop {
    fn cursor_position(&self) -> Option<Point> {
        let location: NSPoint = unsafe { msg_send![class!(NSEvent), mouseLocation] };
        let top_left_y = main_display_height() - location.y;
        Some(Point::new(location.x.round() as i32, top_left_y.round() as i32))
    }

    /// Captures a single pixel at the given top-left based coordinates
    fn pixel_at(&self, at: Point) -> Option<Rgb> {
        use core_graphics::geometry::{CGPoint, CGRect, CGSize};

        let rect = CGRect::new(
            &CGPoint::new(at.x as f64, at.y as f64),
            &CGSize::new(1.0, 1.0),
        );
        let image = CGDisplay::main().image_for_rect(rect)?;
        let data = image.data();

        // Most Mac displays use BGRA format
        if data.len() >= 4 {
            Some(Rgb::new(data[2], data[1], data[0]))
        } else {
            None
        }
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Runs the dropper window on macOS until it is closed
pub fn run(config: &DropperConfig, click: Box<dyn ClickHandler>) -> DropperResult<()> {
    let dropper = ColorDropper::new(config)?;
    let geometry = dropper.geometry();

    // Get main thread marker - required for UI operations
    let mtm = MainThreadMarker::new()
        .ok_or_else(|| DropperError::Platform("the dropper must run on the main thread".into()))?;

    let app = NSApplication::sharedApplication(mtm);
    // No dock icon, like a tool window
    app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);

    let view_class = register_view_class()?;
    let window_class = register_window_class()?;
    let screen_height = main_display_height();
    let screen_width = CGDisplay::main().bounds().size.width;
    let origin = dropper.initial_origin(Geometry::new(screen_width as i32, screen_height as i32));

    let (ns_window, view) = unsafe {
        let frame = NSRect::new(
            NSPoint::new(
                origin.x as f64,
                screen_height - origin.y as f64 - geometry.height as f64,
            ),
            NSSize::new(geometry.width as f64, geometry.height as f64),
        );

        // Borderless windows cannot become key without the subclass
        let window_alloc: Id = msg_send![window_class, alloc];
        let window: Id = msg_send![window_alloc,
            initWithContentRect: frame
            styleMask: 0u64        // NSWindowStyleMaskBorderless
            backing: 2u64          // NSBackingStoreBuffered = 2
            defer: NO
        ];
        if window.is_null() {
            return Err(DropperError::Platform("NSWindow creation failed".into()));
        }

        // Transparent everywhere the view does not paint
        let clear_color = NSColor::clearColor();
        let _: () = msg_send![window, setBackgroundColor: &*clear_color];
        let _: () = msg_send![window, setOpaque: NO];
        let _: () = msg_send![window, setHasShadow: NO];
        let _: () = msg_send![window, setLevel: FLOATING_WINDOW_LEVEL];
        let _: () = msg_send![window, setReleasedWhenClosed: NO];

        let view: Id = msg_send![view_class, alloc];
        let bounds = NSRect::new(NSPoint::new(0.0, 0.0), frame.size);
        let view: Id = msg_send![view, initWithFrame: bounds];

        let _: () = msg_send![window, setContentView: view];
        // Key window + first responder so keyDown: reaches the view
        let _: () = msg_send![window, makeKeyAndOrderFront: null_mut::<Object>()];
        let _: () = msg_send![window, makeFirstResponder: view];

        let running_app: Id = msg_send![class!(NSRunningApplication), currentApplication];
        let _: () = msg_send![running_app, activateWithOptions: 2u64]; // NSApplicationActivateIgnoringOtherApps
        (window, view)
    };

    let bitmap = Rc::new(dropper.bitmap().clone());
    let region = Rc::new(dropper.region().clone());
    // Buttons already held at startup do not count as a press
    let buttons = pressed_buttons();
    let mut window = DropperWindow::new(dropper, NsTimer { target: view, timer: null_mut() }, click);
    if let Err(err) = window.start() {
        unsafe {
            let _: () = msg_send![ns_window, close];
        }
        return Err(err);
    }
    STATE.with(|cell| {
        *cell.borrow_mut() = Some(MacState { window, ns_window, view, bitmap, region, buttons });
    });
    tracing::info!("dropper window shown");

    // Run the application event loop
    unsafe {
        app.run();
    }

    close_window();
    tracing::info!("dropper window closed");
    Ok(())
}

// =============================================================================
// CUSTOM CLASS REGISTRATION
// =============================================================================

fn register_view_class() -> DropperResult<&'static objc::runtime::Class> {
    if let Some(existing) = objc::runtime::Class::get("ColorDropperView") {
        return Ok(existing);
    }

    // Get NSView class via objc2 and convert to objc runtime class
    let superclass_ptr = NSView::class() as *const objc2::runtime::AnyClass as *const objc::runtime::Class;
    let superclass = unsafe { &*superclass_ptr };
    let mut decl = ClassDecl::new("ColorDropperView", superclass)
        .ok_or_else(|| DropperError::Platform("cannot declare ColorDropperView".into()))?;

    unsafe {
        decl.add_method(sel!(isFlipped), is_flipped as extern "C" fn(&Object, Sel) -> BOOL);
        decl.add_method(sel!(acceptsFirstResponder), accepts_first_responder as extern "C" fn(&Object, Sel) -> BOOL);
        decl.add_method(sel!(keyDown:), key_down as extern "C" fn(&Object, Sel, Id));
        decl.add_method(sel!(dropperTick:), dropper_tick as extern "C" fn(&Object, Sel, Id));
        decl.add_method(sel!(drawRect:), draw_rect as extern "C" fn(&Object, Sel, NSRectEncode));
    }

    Ok(decl.register())
}

fn register_window_class() -> DropperResult<&'static objc::runtime::Class> {
    if let Some(existing) = objc::runtime::Class::get("KeyableWindow") {
        return Ok(existing);
    }

    // Get NSWindow class via objc2 and convert to objc runtime class
    let superclass_ptr = NSWindow2::class() as *const objc2::runtime::AnyClass as *const objc::runtime::Class;
    let superclass = unsafe { &*superclass_ptr };
    let mut decl = ClassDecl::new("KeyableWindow", superclass)
        .ok_or_else(|| DropperError::Platform("cannot declare KeyableWindow".into()))?;

    unsafe {
        decl.add_method(sel!(canBecomeKeyWindow), can_become_key_window as extern "C" fn(&Object, Sel) -> BOOL);
    }

    Ok(decl.register())
}

// =============================================================================
// OBJECTIVE-C METHOD IMPLEMENTATIONS
// =============================================================================

/// Top-left origin, same as the dropper's coordinates
extern "C" fn is_flipped(_this: &Object, _cmd: Sel) -> BOOL {
    YES
}

extern "C" fn can_become_key_window(_this: &Object, _cmd: Sel) -> BOOL {
    YES
}

extern "C" fn accepts_first_responder(_this: &Object, _cmd: Sel) -> BOOL {
    YES
}

/// Global mouse button state, whichever window is under the cursor
fn pressed_buttons() -> MouseButtons {
    let mask: usize = unsafe { msg_send![class!(NSEvent), pressedMouseButtons] };
    MouseButtons::from_mask(mask as u64)
}

extern "C" fn dropper_tick(_this: &Object, _cmd: Sel, _timer: Id) {
    // Borrow released before AppKit calls back into drawRect:
    let ticked = with_state(|state| {
        let outcome = state.window.on_timer(&MacDesktop)?;
        let buttons = pressed_buttons();
        let pressed = buttons.pressed_since(state.buttons);
        state.buttons = buttons;
        Some((outcome, pressed, state.ns_window, state.view, state.window.dropper().geometry()))
    })
    .flatten();
    let Some((outcome, pressed, ns_window, view, geometry)) = ticked else {
        return;
    };

    if pressed.right {
        stop_application();
        return;
    }

    let bottom_left = NSPoint::new(
        outcome.origin.x as f64,
        main_display_height() - outcome.origin.y as f64 - geometry.height as f64,
    );
    unsafe {
        let _: () = msg_send![ns_window, setFrameOrigin: bottom_left];
        let _: () = msg_send![view, setNeedsDisplay: YES];
    }

    if pressed.left {
        dispatch_click();
    }
}

/// Runs the click hook with the state released: the hook may run a modal
/// loop that fires more ticks.
fn dispatch_click() {
    let Some(pending) = with_state(|state| state.window.take_click()).flatten() else {
        return;
    };
    let handler = pending.dispatch();
    with_state(move |state| state.window.restore_click(handler));
}

extern "C" fn key_down(_this: &Object, _cmd: Sel, event: Id) {
    let key_code: u16 = unsafe { msg_send![event, keyCode] };
    if key_code == ESCAPE_KEY_CODE {
        stop_application();
    }
}

/// Stops the timer, then hides and closes the window
fn close_window() {
    let state = STATE.with(|cell| cell.borrow_mut().take());
    if let Some(mut state) = state {
        state.window.close();
        unsafe {
            let _: () = msg_send![state.ns_window, orderOut: null_mut::<Object>()];
            let _: () = msg_send![state.ns_window, close];
        }
    }
}

/// Helper function to close the window and leave the run loop
fn stop_application() {
    close_window();

    if let Some(mtm) = MainThreadMarker::new() {
        let app = NSApplication::sharedApplication(mtm);
        unsafe {
            app.stop(None);
        }

        // Post a dummy event so the run loop notices the stop request
        let app_ptr: Id = &*app as *const NSApplication as Id;
        unsafe {
            let dummy_event: Id = msg_send![class!(NSEvent),
                otherEventWithType:15u64  // NSEventTypeApplicationDefined
                location:NSPoint::new(0.0, 0.0)
                modifierFlags:0u64
                timestamp:0.0f64
                windowNumber:0i64
                context:null_mut::<Object>()
                subtype:0i16
                data1:0i64
                data2:0i64
            ];
            let _: () = msg_send![app_ptr, postEvent:dummy_event atStart:YES];
        }
    }
}

// =============================================================================
// DRAWING
// =============================================================================

fn ns_color(color: Rgb) -> objc2::rc::Retained<NSColor> {
    NSColor::colorWithCalibratedRed_green_blue_alpha(
        color.r as f64 / 255.0,
        color.g as f64 / 255.0,
        color.b as f64 / 255.0,
        1.0,
    )
}

extern "C" fn draw_rect(_this: &Object, _cmd: Sel, _rect: NSRectEncode) {
    let frame = with_state(|state| {
        (
            state.window.paint_ops(),
            Rc::clone(&state.bitmap),
            Rc::clone(&state.region),
        )
    });
    let Some((ops, bitmap, region)) = frame else {
        return;
    };

    for op in &ops {
        match op {
            DrawOp::Bitmap { origin } => draw_bitmap(*origin, &bitmap, &region),
            DrawOp::Circle { center, radius, fill, outline } => draw_circle(*center, *radius, *fill, *outline),
            DrawOp::Text { text, center, nudge, color, font } => draw_text(text, *center, *nudge, *color, *font),
        }
    }
}

/// Paints only the region spans; mask pixels are left transparent
fn draw_bitmap(origin: Point, bitmap: &Canvas, region: &Region) {
    for span in region.spans() {
        let Some(color) = bitmap.pixel(span.x0, span.y) else {
            continue;
        };
        let rect = NSRect::new(
            NSPoint::new((origin.x + span.x0) as f64, (origin.y + span.y) as f64),
            NSSize::new(span.len() as f64, 1.0),
        );
        unsafe {
            ns_color(color).setFill();
            NSBezierPath::bezierPathWithRect(rect).fill();
        }
    }
}

fn draw_circle(center: Point, radius: i32, fill: Rgb, outline: Rgb) {
    let rect = NSRect::new(
        NSPoint::new((center.x - radius) as f64, (center.y - radius) as f64),
        NSSize::new((2 * radius) as f64, (2 * radius) as f64),
    );
    unsafe {
        let path = NSBezierPath::bezierPathWithOvalInRect(rect);
        ns_color(fill).setFill();
        path.fill();
        ns_color(outline).setStroke();
        path.setLineWidth(1.0);
        path.stroke();
    }
}

fn draw_text(text: &str, center: Point, nudge: Point, color: Rgb, font: FontSize) {
    unsafe {
        // Font sized by its pixel height
        let ns_font: Id = msg_send![class!(NSFont), systemFontOfSize: font.height as f64];
        let text_color = ns_color(color);

        let font_attr_key = NSString::from_str("NSFont");
        let color_attr_key = NSString::from_str("NSColor");

        // Attributes dictionary built with legacy msg_send
        let font_key_ptr: Id = &*font_attr_key as *const NSString as Id;
        let color_key_ptr: Id = &*color_attr_key as *const NSString as Id;
        let text_color_ptr: Id = &*text_color as *const NSColor as Id;
        let keys: [Id; 2] = [font_key_ptr, color_key_ptr];
        let values: [Id; 2] = [ns_font, text_color_ptr];
        let attributes: Id = msg_send![class!(NSDictionary), dictionaryWithObjects: values.as_ptr() forKeys: keys.as_ptr() count: 2usize];
        let attrs_ref: &NSDictionary<NSString, AnyObject> = &*(attributes as *const NSDictionary<_, _>);

        let ns_text = NSString::from_str(text);
        let extent: NSSize = ns_text.sizeWithAttributes(Some(attrs_ref));
        let origin = text_origin(center, (extent.width as i32, extent.height as i32), nudge);
        ns_text.drawAtPoint_withAttributes(NSPoint::new(origin.x as f64, origin.y as f64), Some(attrs_ref));
    }
}
