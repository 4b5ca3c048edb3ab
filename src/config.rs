//! Configuration constants and construction parameters
//!
//! These values control the appearance and behavior of the color dropper.

use std::path::Path;

use serde::Deserialize;

use crate::color::Rgb;
use crate::error::{DropperError, DropperResult};

// =============================================================================
// CONSTANTES
// CONSTANTS
// =============================================================================

/// Intervalle du timer de suivi (en millisecondes)
/// Tracking timer interval (in milliseconds)
///
/// 10 ms gives roughly 100 samples per second.
pub const TIMER_INTERVAL_MS: u32 = 10;

/// Distance between the cursor and the pin of the window (in pixels)
/// The window sits above and to the right of the cursor so that it never
/// covers the pixel being sampled.
pub const CURSOR_OFFSET: i32 = 4;

/// Default client size of the window (width, height)
pub const DEFAULT_SIZE: (u32, u32) = (96, 96);

/// Smallest accepted side. Below this the dot fills its whole bounding box
/// and the window would no longer be shaped.
pub const MIN_SIDE: u32 = 8;

/// Largest accepted side. Keeps the bitmap allocation and the `i32` window
/// coordinates bounded.
pub const MAX_SIDE: u32 = 4096;

/// Default frame (outline) color / Couleur du cadre par défaut
pub const DEFAULT_FRAME_COLOR: &str = "#000000";

/// Default mask (transparent) color / Couleur de masque par défaut
pub const DEFAULT_MASK_COLOR: &str = "#FFFFFF";

/// Default dot color shown before the first sample
/// Couleur du point affichée avant le premier échantillon
pub const DEFAULT_DOT_COLOR: &str = "#FFFFFF";

/// The preview dot radius is `min_half / RING_DIVISOR * RING_FACTOR`
pub const RING_DIVISOR: i32 = 4;
pub const RING_FACTOR: i32 = 3;

/// Font pixel size is `(min_half / TEXT_WIDTH_DIVISOR, min_half / TEXT_HEIGHT_DIVISOR)`
pub const TEXT_WIDTH_DIVISOR: i32 = 6;
pub const TEXT_HEIGHT_DIVISOR: i32 = 4;

// =============================================================================
// PARAMÈTRES DE CONSTRUCTION
// CONSTRUCTION PARAMETERS
// =============================================================================

/// Paramètres de construction de la fenêtre
/// Window construction parameters
///
/// Every field is optional in JSON; missing fields take the defaults above.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DropperConfig {
    /// Couleur du cadre / Frame outline color
    pub frame_color: String,

    /// Couleur transparente / Mask (transparent) color
    pub mask_color: String,

    /// Couleur initiale du point / Initial dot color
    pub dot_color: String,

    /// Top-left position on screen; `None` centers the window
    pub position: Option<(i32, i32)>,

    /// Client size (width, height)
    pub size: (u32, u32),
}

impl Default for DropperConfig {
    fn default() -> Self {
        Self {
            frame_color: DEFAULT_FRAME_COLOR.to_string(),
            mask_color: DEFAULT_MASK_COLOR.to_string(),
            dot_color: DEFAULT_DOT_COLOR.to_string(),
            position: None,
            size: DEFAULT_SIZE,
        }
    }
}

/// Couleurs résolues après validation
/// Colors resolved after validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub frame: Rgb,
    pub mask: Rgb,
    pub dot: Rgb,
}

impl DropperConfig {
    /// Parses a configuration from JSON text
    pub fn from_json_str(text: &str) -> DropperResult<Self> {
        serde_json::from_str(text).map_err(|err| DropperError::Config(err.to_string()))
    }

    /// Loads a configuration file. Unlike the optional config of a desktop
    /// app, a path given explicitly must exist and parse.
    pub fn load(path: &Path) -> DropperResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| DropperError::Config(format!("{}: {err}", path.display())))?;
        let config = Self::from_json_str(&contents)?;
        tracing::debug!(?path, "loaded dropper config");
        Ok(config)
    }

    /// Vérifie la taille et les couleurs
    /// Checks the size and every color
    pub fn validate(&self) -> DropperResult<Palette> {
        let (width, height) = self.size;
        if !(MIN_SIDE..=MAX_SIDE).contains(&width) || !(MIN_SIDE..=MAX_SIDE).contains(&height) {
            return Err(DropperError::InvalidSize { width, height });
        }
        let frame = Rgb::parse(&self.frame_color)?;
        let mask = Rgb::parse(&self.mask_color)?;
        let dot = Rgb::parse(&self.dot_color)?;
        if frame == mask {
            // The whole bitmap would be transparent.
            return Err(DropperError::Config(format!(
                "frame color {} equals mask color",
                self.frame_color
            )));
        }
        Ok(Palette { frame, mask, dot })
    }
}

// =============================================================================
// TESTS
// =============================================================================
