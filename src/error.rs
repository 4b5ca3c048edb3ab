// =============================================================================
// error.rs - Erreurs de la fenêtre / Dropper errors
// =============================================================================

use thiserror::Error;

use crate::color::ColorError;

pub type DropperResult<T> = std::result::Result<T, DropperError>;

#[derive(Debug, Error)]
pub enum DropperError {
    #[error(transparent)]
    Color(#[from] ColorError),

    #[error("window size {width}x{height} is too small to be shaped")]
    InvalidSize { width: u32, height: u32 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("window is already disposed")]
    Disposed,

    #[error("platform call failed: {0}")]
    Platform(String),

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}
