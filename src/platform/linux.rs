//! Linux implementation of the color dropper
//!
//! Not implemented yet. Shaped windows need the X11 SHAPE extension, and
//! reading screen pixels is restricted on Wayland.

use crate::config::DropperConfig;
use crate::dropper::{ClickHandler, ColorDropper};
use crate::error::{DropperError, DropperResult};

/// Validates the configuration, then reports the missing backend.
pub fn run(config: &DropperConfig, _click: Box<dyn ClickHandler>) -> DropperResult<()> {
    let dropper = ColorDropper::new(config)?;
    tracing::warn!(
        region_area = dropper.region().area(),
        "no native shaped window on Linux"
    );
    Err(DropperError::Unsupported("shaped dropper window"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dropper::NoopClick;

    #[test]
    fn reports_unsupported_after_validation() {
        let err = run(&DropperConfig::default(), Box::new(NoopClick)).unwrap_err();
        assert!(matches!(err, DropperError::Unsupported(_)));

        let bad = DropperConfig { size: (1, 1), ..DropperConfig::default() };
        let err = run(&bad, Box::new(NoopClick)).unwrap_err();
        assert!(matches!(err, DropperError::InvalidSize { .. }));
    }
}
