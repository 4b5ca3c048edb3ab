//! =============================================================================
//! COLOR.RS - Couleurs RGB et couleur complémentaire
//! COLOR.RS - RGB colors and complementary color
//! =============================================================================
//!
//! A color is a 24-bit RGB value written as six hex digits, with an optional
//! leading `#`. The complement inverts every channel (`255 - value`).

use std::fmt;

use thiserror::Error;

// =============================================================================
// ERREURS
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("expected 6 hex digits, got {len} characters in {input:?}")]
    InvalidLength { input: String, len: usize },

    #[error("invalid hex digit {digit:?} at position {position} in {input:?}")]
    InvalidDigit { input: String, position: usize, digit: char },
}

// =============================================================================
// TYPE RGB
// RGB TYPE
// =============================================================================

/// Couleur RGB 8 bits par canal
/// 8-bit per channel RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse une couleur "#RRGGBB" ou "RRGGBB"
    /// Parses a "#RRGGBB" or "RRGGBB" color
    pub fn parse(input: &str) -> Result<Self, ColorError> {
        let digits = strip_hash(input);
        let len = digits.chars().count();
        if len != 6 {
            return Err(ColorError::InvalidLength { input: input.to_string(), len });
        }
        if let Some((position, digit)) = digits.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidDigit { input: input.to_string(), position, digit });
        }
        // All six characters are ASCII hex digits past this point.
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or_default();
        Ok(Self::new(channel(0), channel(2), channel(4)))
    }

    /// Inverse chaque canal (255 - valeur)
    /// Inverts every channel (255 - value)
    #[inline]
    pub const fn complement(self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    /// Lowercase "#rrggbb"
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Uppercase "#RRGGBB", the form a sampled pixel is shown in.
    pub fn to_hex_upper(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

// =============================================================================
// COULEUR COMPLÉMENTAIRE
// COMPLEMENTARY COLOR
// =============================================================================

/// Retourne la couleur complémentaire au format "#rrggbb"
/// Returns the complementary color as "#rrggbb"
///
/// The output is uppercase only when the input digits are all uppercase,
/// meaning at least one letter and no lowercase letter. Digits-only input
/// such as `"#808080"` therefore gives lowercase output.
///
/// ```
/// use color_dropper::complementary_color;
///
/// assert_eq!(complementary_color("#FFFFFF").unwrap(), "#000000");
/// assert_eq!(complementary_color("#808080").unwrap(), "#7f7f7f");
/// ```
pub fn complementary_color(hex: &str) -> Result<String, ColorError> {
    let complement = Rgb::parse(hex)?.complement();
    if is_upper(strip_hash(hex)) {
        Ok(complement.to_hex_upper())
    } else {
        Ok(complement.to_hex())
    }
}

fn strip_hash(input: &str) -> &str {
    input.strip_prefix('#').unwrap_or(input)
}

/// Same rule as a cased-string "is upper" test: there is at least one
/// cased character and none of them is lowercase.
fn is_upper(digits: &str) -> bool {
    let mut cased = false;
    for c in digits.chars() {
        if c.is_lowercase() {
            return false;
        }
        cased |= c.is_uppercase();
    }
    cased
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_and_black_are_complements() {
        assert_eq!(complementary_color("#FFFFFF").unwrap(), "#000000");
        // No letters in the input, so the output comes out lowercase.
        let black = complementary_color("#000000").unwrap();
        assert!(black.eq_ignore_ascii_case("#FFFFFF"));
        assert_eq!(black, "#ffffff");
    }

    #[test]
    fn mid_gray_truncates() {
        assert_eq!(complementary_color("#808080").unwrap(), "#7f7f7f");
    }

    #[test]
    fn case_is_preserved() {
        assert_eq!(complementary_color("#A0B1C2").unwrap(), "#5F4E3D");
        assert_eq!(complementary_color("#a0b1c2").unwrap(), "#5f4e3d");
        // Mixed case is not all-uppercase.
        assert_eq!(complementary_color("#A0b1C2").unwrap(), "#5f4e3d");
    }

    #[test]
    fn hash_prefix_is_optional() {
        assert_eq!(complementary_color("FF0000").unwrap(), "#00FFFF");
        assert_eq!(complementary_color("ff0000").unwrap(), "#00ffff");
    }

    #[test]
    fn double_complement_is_identity() {
        for value in (0u32..=0xFF_FFFF).step_by(0x01_0F_3B) {
            let lower = format!("#{value:06x}");
            let back = complementary_color(&complementary_color(&lower).unwrap()).unwrap();
            assert_eq!(back, lower);

            let upper = format!("#{value:06X}");
            let back = complementary_color(&complementary_color(&upper).unwrap()).unwrap();
            assert!(back.eq_ignore_ascii_case(&upper));
        }
    }

    #[test]
    fn rgb_complement_is_involutive() {
        let color = Rgb::new(12, 200, 255);
        assert_eq!(color.complement(), Rgb::new(243, 55, 0));
        assert_eq!(color.complement().complement(), color);
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(
            complementary_color("#FFF"),
            Err(ColorError::InvalidLength { len: 3, .. })
        ));
        assert!(matches!(
            complementary_color("#FFFFFFF"),
            Err(ColorError::InvalidLength { len: 7, .. })
        ));
        assert!(matches!(
            complementary_color("#12G456"),
            Err(ColorError::InvalidDigit { position: 2, digit: 'G', .. })
        ));
        assert!(matches!(
            complementary_color("#12é456"),
            Err(ColorError::InvalidLength { .. }) | Err(ColorError::InvalidDigit { .. })
        ));
        assert!(complementary_color("").is_err());
    }

    #[test]
    fn formats_hex() {
        let color = Rgb::new(255, 0, 128);
        assert_eq!(color.to_hex(), "#ff0080");
        assert_eq!(color.to_hex_upper(), "#FF0080");
        assert_eq!(color.to_string(), "#ff0080");
    }
}
