// =============================================================================
// platform/mod.rs - Fenêtre native / Native window
// =============================================================================

use crate::color::Rgb;
use crate::config::DropperConfig;
use crate::dropper::{ClickHandler, NoopClick};
use crate::error::DropperResult;
use crate::shape::Point;

/// Implémentation macOS
/// macOS implementation
#[cfg(target_os = "macos")]
pub mod macos;

/// Implémentation Windows
/// Windows implementation
#[cfg(target_os = "windows")]
pub mod windows;

/// Implémentation Linux (non implémentée)
/// Linux implementation (not implemented)
#[cfg(target_os = "linux")]
pub mod linux;

// =============================================================================
// BUREAU
// DESKTOP
// =============================================================================

/// Accès au curseur et aux pixels de l'écran
/// Access to the cursor and the screen pixels
///
/// Coordinates are global screen pixels with the origin at the top-left of
/// the main display.
pub trait Desktop {
    fn cursor_position(&self) -> Option<Point>;
    fn pixel_at(&self, at: Point) -> Option<Rgb>;
}

// =============================================================================
// FONCTION PUBLIQUE
// PUBLIC FUNCTION
// =============================================================================

/// Lance la fenêtre native et sa boucle d'événements
/// Opens the native window and runs its event loop until it is closed
pub fn run(config: &DropperConfig) -> DropperResult<()> {
    run_with(config, Box::new(NoopClick))
}

/// Same as [`run`], with a click handler supplied by the caller.
pub fn run_with(config: &DropperConfig, click: Box<dyn ClickHandler>) -> DropperResult<()> {
    #[cfg(target_os = "macos")]
    {
        macos::run(config, click)
    }

    #[cfg(target_os = "windows")]
    {
        windows::run(config, click)
    }

    #[cfg(target_os = "linux")]
    {
        linux::run(config, click)
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        let _ = (config, click);
        Err(crate::error::DropperError::Unsupported("native window"))
    }
}
