// =============================================================================
// COLOR DROPPER - VERSION WINDOWS
// =============================================================================
// Petite fenêtre popup découpée (SetWindowRgn) qui suit le curseur
// Small popup window shaped with SetWindowRgn that follows the cursor
//
// La fenêtre n'est jamais sous le curseur : elle capture la souris et
// enregistre ESC comme raccourci global pour recevoir clics et fermeture.
// The window is never under the cursor: it captures the mouse and registers
// ESC as a global hotkey so clicks and closing still reach it.
// =============================================================================

// -----------------------------------------------------------------------------
// IMPORTS - Types du crate
// IMPORTS - Crate types
// -----------------------------------------------------------------------------
use crate::color::Rgb;
use crate::config::{DropperConfig, TIMER_INTERVAL_MS};
use crate::dropper::{ClickHandler, ColorDropper, DropperWindow};
use crate::error::{DropperError, DropperResult};
use crate::paint::{text_origin, DrawOp, FontSize};
use crate::platform::Desktop;
use crate::shape::{Geometry, Point, Region};
use crate::timer::TimerBackend;

// -----------------------------------------------------------------------------
// IMPORTS - Windows API
// -----------------------------------------------------------------------------
use windows::{
    core::*,                                    // Types de base Windows / Windows core types
    Win32::{
        Foundation::*,                          // HWND, BOOL, POINT, SIZE...
        Graphics::Gdi::*,                       // GDI pour le dessin et les régions / GDI for drawing and regions
        System::LibraryLoader::GetModuleHandleW, // Handle du module courant / Current module handle
        UI::Input::KeyboardAndMouse::{          // Focus, capture et raccourci / Focus, capture and hotkey
            RegisterHotKey, ReleaseCapture, SetCapture, SetFocus, UnregisterHotKey, MOD_NOREPEAT, VK_ESCAPE,
        },
        UI::WindowsAndMessaging::*,             // Messages, fenêtres, timers / Messages, windows, timers
    },
};

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

// =============================================================================
// CONSTANTES
// CONSTANTS
// =============================================================================

/// Nom de la classe de fenêtre Windows
/// Windows window class name
const WINDOW_CLASS: &str = "ColorDropperShaped";

/// Identifiant du timer de suivi
/// Tracking timer ID
const TIMER_ID: usize = 1;

/// Valeur renvoyée par GetPixel hors de l'écran (CLR_INVALID)
/// Value returned by GetPixel outside the screen (CLR_INVALID)
const INVALID_PIXEL: u32 = 0xFFFF_FFFF;

/// Identifiant du raccourci global ESC
/// Global ESC hotkey ID
const HOTKEY_ID: i32 = 1;

// =============================================================================
// ÉTAT
// STATE
// =============================================================================

/// État de la fenêtre pour le thread UI
/// Window state for the UI thread
struct WinState {
    window: DropperWindow<Win32Timer>,
    /// Base bitmap, top-down BGRA, built once and shared with each paint
    bitmap: Rc<[u8]>,
}

thread_local! {
    /// The window procedure is a plain function; its state lives here.
    static STATE: RefCell<Option<WinState>> = const { RefCell::new(None) };
}

// =============================================================================
// TIMER
// =============================================================================

/// Timer Win32 attaché à la fenêtre (WM_TIMER)
/// Win32 timer attached to the window (WM_TIMER)
struct Win32Timer {
    hwnd: HWND,
}

impl TimerBackend for Win32Timer {
    fn start(&mut self, interval: Duration) -> DropperResult<()> {
        let id = unsafe { SetTimer(self.hwnd, TIMER_ID, interval.as_millis() as u32, None) };
        if id == 0 {
            return Err(DropperError::Platform("SetTimer failed".into()));
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Err(err) = unsafe { KillTimer(self.hwnd, TIMER_ID) } {
            tracing::warn!(%err, "KillTimer failed");
        }
    }
}

// =============================================================================
// BUREAU
// DESKTOP
// =============================================================================

/// Curseur et pixels de l'écran via GDI
/// Cursor and screen pixels through GDI
struct Win32Desktop;

impl Desktop for Win32Desktop {
    fn cursor_position(&self) -> Option<Point> {
        let mut pt = POINT::default();
        unsafe { GetCursorPos(&mut pt) }.ok()?;
        Some(Point::new(pt.x, pt.y))
    }

    fn pixel_at(&self, at: Point) -> Option<Rgb> {
        unsafe {
            let hdc_screen = GetDC(HWND::default());          // DC de l'écran / Screen DC
            if hdc_screen.is_invalid() {
                return None;
            }
            let color = GetPixel(hdc_screen, at.x, at.y);
            let _ = ReleaseDC(HWND::default(), hdc_screen);
            if color.0 == INVALID_PIXEL {
                return None;
            }
            // COLORREF: 0x00BBGGRR
            Some(Rgb::new(
                (color.0 & 0xFF) as u8,
                ((color.0 >> 8) & 0xFF) as u8,
                ((color.0 >> 16) & 0xFF) as u8,
            ))
        }
    }
}

#[inline]
fn colorref(color: Rgb) -> COLORREF {
    COLORREF(color.r as u32 | (color.g as u32) << 8 | (color.b as u32) << 16)
}

// =============================================================================
// RÉGION
// REGION
// =============================================================================

/// Construit une HRGN à partir des segments et l'applique à la fenêtre
/// Builds an HRGN from the spans and applies it to the window
///
/// The window takes ownership of the region on success.
fn apply_region(hwnd: HWND, region: &Region) -> DropperResult<()> {
    unsafe {
        let hrgn = CreateRectRgn(0, 0, 0, 0);
        if hrgn.is_invalid() {
            return Err(DropperError::Platform("CreateRectRgn failed".into()));
        }
        for span in region.spans() {
            let row = CreateRectRgn(span.x0, span.y, span.x1, span.y + 1);
            let _ = CombineRgn(hrgn, hrgn, row, RGN_OR);
            let _ = DeleteObject(row);
        }
        if SetWindowRgn(hwnd, hrgn, TRUE) == 0 {
            let _ = DeleteObject(hrgn);
            return Err(DropperError::Platform("SetWindowRgn failed".into()));
        }
    }
    tracing::debug!(spans = region.spans().len(), "window region applied");
    Ok(())
}

// =============================================================================
// DESSIN
// DRAWING
// =============================================================================

/// Rejoue les opérations de dessin dans un DC mémoire puis copie à l'écran
/// Replays the draw operations into a memory DC, then copies to the screen
fn paint_window(hdc: HDC, geometry: Geometry, ops: &[DrawOp], bitmap: &[u8]) {
    unsafe {
        // Double buffer pour éviter le scintillement
        // Double buffer to avoid flickering
        let hdc_mem = CreateCompatibleDC(hdc);
        let hbitmap = CreateCompatibleBitmap(hdc, geometry.width, geometry.height);
        if hbitmap.is_invalid() {
            let _ = DeleteDC(hdc_mem);
            return;
        }
        let old_bitmap = SelectObject(hdc_mem, hbitmap);
        let _ = SetBkMode(hdc_mem, TRANSPARENT);

        for op in ops {
            match op {
                DrawOp::Bitmap { origin } => draw_bitmap(hdc_mem, *origin, geometry, bitmap),
                DrawOp::Circle { center, radius, fill, outline } => {
                    draw_circle(hdc_mem, *center, *radius, *fill, *outline)
                }
                DrawOp::Text { text, center, nudge, color, font } => {
                    draw_text(hdc_mem, text, *center, *nudge, *color, *font)
                }
            }
        }

        let _ = BitBlt(hdc, 0, 0, geometry.width, geometry.height, hdc_mem, 0, 0, SRCCOPY);

        SelectObject(hdc_mem, old_bitmap);
        let _ = DeleteObject(hbitmap);
        let _ = DeleteDC(hdc_mem);
    }
}

/// Copie le bitmap de base. Les pixels de masque sont hors de la région
/// de la fenêtre et ne sont donc jamais visibles.
/// Copies the base bitmap. Mask pixels fall outside the window region and
/// are never shown.
unsafe fn draw_bitmap(hdc: HDC, origin: Point, geometry: Geometry, bitmap: &[u8]) {
    let bmi = BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: geometry.width,
            biHeight: -geometry.height,                   // Négatif = top-down / Negative = top-down
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let _ = SetDIBitsToDevice(
        hdc,
        origin.x,
        origin.y,
        geometry.width as u32,
        geometry.height as u32,
        0,
        0,
        0,
        geometry.height as u32,
        bitmap.as_ptr() as *const _,
        &bmi,
        DIB_RGB_COLORS,
    );
}

unsafe fn draw_circle(hdc: HDC, center: Point, radius: i32, fill: Rgb, outline: Rgb) {
    let brush = CreateSolidBrush(colorref(fill));
    let pen = CreatePen(PS_SOLID, 1, colorref(outline));
    let old_brush = SelectObject(hdc, brush);
    let old_pen = SelectObject(hdc, pen);

    let _ = Ellipse(
        hdc,
        center.x - radius,
        center.y - radius,
        center.x + radius,
        center.y + radius,
    );

    SelectObject(hdc, old_pen);
    SelectObject(hdc, old_brush);
    let _ = DeleteObject(pen);
    let _ = DeleteObject(brush);
}

unsafe fn draw_text(hdc: HDC, text: &str, center: Point, nudge: Point, color: Rgb, font: FontSize) {
    let mut face = [0u16; 32];
    for (slot, unit) in face.iter_mut().zip("Segoe UI".encode_utf16()) {
        *slot = unit;
    }
    let logfont = LOGFONTW {
        lfHeight: -font.height,                           // Négatif = hauteur en pixels / Negative = pixel height
        lfWidth: font.width,
        lfFaceName: face,
        ..Default::default()
    };
    let hfont = CreateFontIndirectW(&logfont);
    let old_font = SelectObject(hdc, hfont);

    let wide: Vec<u16> = text.encode_utf16().collect();
    let mut extent = SIZE::default();
    let _ = GetTextExtentPoint32W(hdc, &wide, &mut extent);
    let origin = text_origin(center, (extent.cx, extent.cy), nudge);

    let _ = SetTextColor(hdc, colorref(color));
    let _ = TextOutW(hdc, origin.x, origin.y, &wide);

    SelectObject(hdc, old_font);
    let _ = DeleteObject(hfont);
}

// =============================================================================
// WINDOW PROCEDURE
// =============================================================================

fn with_state<R>(f: impl FnOnce(&mut WinState) -> R) -> Option<R> {
    STATE.with(|cell| cell.borrow_mut().as_mut().map(f))
}

/// Appelle le gestionnaire de clic sans garder l'état emprunté
/// Calls the click handler without keeping the state borrowed
///
/// The handler may pump messages (a message box), which re-enters wnd_proc.
fn dispatch_click() {
    let Some(pending) = with_state(|state| state.window.take_click()).flatten() else {
        return;
    };
    let handler = pending.dispatch();
    with_state(move |state| state.window.restore_click(handler));
}

extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wp: WPARAM, lp: LPARAM) -> LRESULT {
    unsafe {
        match msg {
            WM_TIMER if wp.0 == TIMER_ID => {
                // Borrow released before SetWindowPos re-enters the procedure.
                let outcome = with_state(|state| state.window.on_timer(&Win32Desktop)).flatten();
                if let Some(outcome) = outcome {
                    let _ = SetWindowPos(
                        hwnd,
                        HWND_TOPMOST,
                        outcome.origin.x,
                        outcome.origin.y,
                        0,
                        0,
                        SWP_NOSIZE | SWP_NOACTIVATE,
                    );
                    let _ = InvalidateRect(hwnd, None, FALSE);
                }
                LRESULT(0)
            }
            WM_PAINT => {
                let mut ps = PAINTSTRUCT::default();
                let hdc = BeginPaint(hwnd, &mut ps);
                let frame = with_state(|state| {
                    (
                        state.window.dropper().geometry(),
                        state.window.paint_ops(),
                        Rc::clone(&state.bitmap),
                    )
                });
                if let Some((geometry, ops, bitmap)) = frame {
                    paint_window(hdc, geometry, &ops, &bitmap);
                }
                let _ = EndPaint(hwnd, &ps);
                LRESULT(0)
            }
            WM_ERASEBKGND => {
                // Ne pas effacer le fond (évite le scintillement)
                LRESULT(1)
            }
            WM_LBUTTONDOWN => {
                dispatch_click();
                LRESULT(0)
            }
            WM_RBUTTONDOWN => {
                let _ = DestroyWindow(hwnd);
                LRESULT(0)
            }
            WM_KEYDOWN if wp.0 == VK_ESCAPE.0 as usize => {
                let _ = DestroyWindow(hwnd);
                LRESULT(0)
            }
            WM_HOTKEY if wp.0 == HOTKEY_ID as usize => {
                let _ = DestroyWindow(hwnd);
                LRESULT(0)
            }
            WM_DESTROY => {
                let _ = UnregisterHotKey(hwnd, HOTKEY_ID);
                let _ = ReleaseCapture();
                // Timer stopped while the window handle is still valid.
                let state = STATE.with(|cell| cell.borrow_mut().take());
                if let Some(mut state) = state {
                    state.window.close();
                }
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcW(hwnd, msg, wp, lp),
        }
    }
}

// =============================================================================
// API PUBLIQUE
// =============================================================================

pub fn run(config: &DropperConfig, click: Box<dyn ClickHandler>) -> DropperResult<()> {
    let dropper = ColorDropper::new(config)?;
    let geometry = dropper.geometry();

    unsafe {
        let hinst = GetModuleHandleW(None)
            .map_err(|err| DropperError::Platform(format!("GetModuleHandleW: {err}")))?;
        let class_wide: Vec<u16> = WINDOW_CLASS.encode_utf16().chain(std::iter::once(0)).collect();
        let class_name = PCWSTR(class_wide.as_ptr());

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(wnd_proc),
            hInstance: hinst.into(),
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            lpszClassName: class_name,
            ..Default::default()
        };

        if RegisterClassExW(&wc) == 0 {
            return Err(DropperError::Platform("RegisterClassExW failed".into()));
        }

        let screen = Geometry::new(GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN));
        let origin = dropper.initial_origin(screen);

        // Popup sans bordure, toujours au-dessus, absent de la barre des tâches
        // Borderless popup, always on top, not in the taskbar
        let hwnd = CreateWindowExW(
            WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
            class_name,
            w!("Color Dropper"),
            WS_POPUP,
            origin.x,
            origin.y,
            geometry.width,
            geometry.height,
            None,
            None,
            hinst,
            None,
        );

        let hwnd = match hwnd {
            Ok(hwnd) => hwnd,
            Err(err) => {
                let _ = UnregisterClassW(class_name, hinst);
                return Err(DropperError::Platform(format!("CreateWindowExW: {err}")));
            }
        };

        if let Err(err) = apply_region(hwnd, dropper.region()) {
            let _ = DestroyWindow(hwnd);
            let _ = UnregisterClassW(class_name, hinst);
            return Err(err);
        }

        let bitmap: Rc<[u8]> = dropper.bitmap().to_bgra().into();
        let mut window = DropperWindow::new(dropper, Win32Timer { hwnd }, click);
        if let Err(err) = window.start() {
            drop(window);
            let _ = DestroyWindow(hwnd);
            let _ = UnregisterClassW(class_name, hinst);
            return Err(err);
        }
        STATE.with(|cell| *cell.borrow_mut() = Some(WinState { window, bitmap }));

        let _ = ShowWindow(hwnd, SW_SHOW);

        // Focus pour ESC, capture pour les clics hors de la fenêtre
        // Focus for ESC, capture for clicks outside the window
        let _ = SetForegroundWindow(hwnd);
        let _ = SetFocus(hwnd);
        let _ = SetCapture(hwnd);

        // ESC ferme même si une autre fenêtre prend le focus
        // ESC closes even if another window takes the focus
        if let Err(err) = RegisterHotKey(hwnd, HOTKEY_ID, MOD_NOREPEAT, VK_ESCAPE.0 as u32) {
            tracing::warn!(%err, "global ESC hotkey unavailable; ESC only works while focused");
        }
        tracing::info!(interval_ms = TIMER_INTERVAL_MS, "dropper window shown");

        // Boucle de messages / Message loop
        let mut msg = MSG::default();
        while GetMessageW(&mut msg, HWND::default(), 0, 0).0 > 0 {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        // WM_DESTROY normally took the state already.
        if let Some(mut state) = STATE.with(|cell| cell.borrow_mut().take()) {
            state.window.close();
        }
        let _ = UnregisterClassW(class_name, hinst);
    }

    tracing::info!("dropper window closed");
    Ok(())
}
