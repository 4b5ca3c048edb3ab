//! =============================================================================
//! Color Dropper - Application de démonstration
//! Color Dropper - Demo application
//! =============================================================================
//!
//! Ouvre la fenêtre pipette et la laisse suivre le curseur.
//! Opens the dropper window and lets it follow the cursor.
//!
//! # Options
//! - `--config <file.json>`: configuration JSON / JSON configuration
//! - `--frame <#rrggbb>`: couleur du cadre / frame color
//! - `--mask <#rrggbb>`: couleur transparente / mask color
//! - `--dot <#rrggbb>`: couleur initiale du point / initial dot color
//! - `--size <WxH>`: taille de la fenêtre / window size
//! - `--pos <X,Y>`: position initiale / initial position
//!
//! # Contrôles / Controls
//! - Clic droit ou ESC : quitter / Right click or ESC: exit

use std::path::Path;
use std::process::ExitCode;

use color_dropper::{platform, DropperConfig, DropperError, DropperResult};
use tracing_subscriber::EnvFilter;

// =============================================================================
// ARGUMENTS
// =============================================================================

fn parse_pair<T: std::str::FromStr>(value: &str, separator: char) -> Option<(T, T)> {
    let (a, b) = value.split_once(separator)?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

/// Construit la configuration depuis la ligne de commande
/// Builds the configuration from the command line
fn config_from_args(args: &[String]) -> DropperResult<DropperConfig> {
    let mut config = DropperConfig::default();

    // --config is applied first so the other flags override it
    if let Some(index) = args.iter().position(|a| a == "--config") {
        let path = args
            .get(index + 1)
            .ok_or_else(|| DropperError::Config("--config needs a path".into()))?;
        config = DropperConfig::load(Path::new(path))?;
    }

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| DropperError::Config(format!("{flag} needs a value")))
        };
        match flag.as_str() {
            "--config" => {
                value()?;
            }
            "--frame" => config.frame_color = value()?,
            "--mask" => config.mask_color = value()?,
            "--dot" => config.dot_color = value()?,
            "--size" => {
                let raw = value()?;
                config.size = parse_pair(&raw, 'x')
                    .ok_or_else(|| DropperError::Config(format!("invalid size {raw:?}, expected WxH")))?;
            }
            "--pos" => {
                let raw = value()?;
                config.position = Some(
                    parse_pair(&raw, ',')
                        .ok_or_else(|| DropperError::Config(format!("invalid position {raw:?}, expected X,Y")))?,
                );
            }
            other => {
                tracing::warn!(argument = other, "ignoring unknown argument");
            }
        }
    }

    Ok(config)
}

// =============================================================================
// POINT D'ENTRÉE
// ENTRY POINT
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = config_from_args(&args).and_then(|config| platform::run(&config));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "color dropper failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_gives_defaults() {
        assert_eq!(config_from_args(&[]).unwrap(), DropperConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let config = config_from_args(&args(&[
            "--frame", "#112233", "--size", "120x80", "--pos", "10,20", "--dot", "#abcdef",
        ]))
        .unwrap();
        assert_eq!(config.frame_color, "#112233");
        assert_eq!(config.dot_color, "#abcdef");
        assert_eq!(config.size, (120, 80));
        assert_eq!(config.position, Some((10, 20)));
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(matches!(config_from_args(&args(&["--size", "big"])), Err(DropperError::Config(_))));
        assert!(matches!(config_from_args(&args(&["--pos", "1"])), Err(DropperError::Config(_))));
        assert!(matches!(config_from_args(&args(&["--mask"])), Err(DropperError::Config(_))));
    }
}
