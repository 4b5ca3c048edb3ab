//! =============================================================================
//! Color Dropper
//! =============================================================================
//!
//! Petite fenêtre en forme de point avec une épingle qui suit le curseur et
//! affiche la couleur du pixel situé dessous.
//!
//! Small dot-and-pin shaped window that follows the mouse cursor and shows
//! the color of the pixel under it, with a complementary outline so the
//! value stays readable on any background.
//!
//! # Fonctionnalités / Features
//! - Fenêtre découpée à partir d'un bitmap / Window shaped from a bitmap mask
//! - Échantillonnage ~100 fois par seconde / Sampling ~100 times per second
//! - Code hexadécimal sur le point / Hex code drawn on the dot
//! - Clic laissé à l'application / Click left to the embedding application

// =============================================================================
// MODULES
// =============================================================================

/// Couleurs RGB et couleur complémentaire
/// RGB colors and complementary color
pub mod color;

/// Configuration partagée (constantes, paramètres)
/// Shared configuration (constants, parameters)
pub mod config;

/// État de la fenêtre
/// Window state
pub mod dropper;

pub mod error;

/// Opérations de dessin
/// Draw operations
pub mod paint;

/// Fenêtre native par plateforme
/// Native window per platform
pub mod platform;

/// Bitmap et région de la fenêtre
/// Window bitmap and region
pub mod shape;

pub mod timer;

pub use color::{complementary_color, ColorError, Rgb};
pub use config::DropperConfig;
pub use dropper::{
    ClickHandler, ColorDropper, DropperWindow, MouseButtons, NoopClick, PendingClick, Phase, TickOutcome,
};
pub use error::{DropperError, DropperResult};
