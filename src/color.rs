// src/color.rs

//! Defines the 8-bit display pixel (`Color`) and its named constants.
//!
//! The display panel uses a packed 2:2:2:2 ARGB byte per pixel: alpha in the
//! two high bits, then red, green, blue. All framebuffer storage and the
//! bezel compositing path operate on this type directly, so a pixel copy is
//! a byte copy.

use serde::{Deserialize, Serialize};

/// A single packed display pixel (2 bits per channel, alpha-first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u8);

impl Color {
    /// Fully transparent; blending treats this as "no pixel".
    pub const CLEAR: Color = Color(0b0000_0000);
    /// Opaque black. The bezel border is filled with this value.
    pub const BLACK: Color = Color(0b1100_0000);
    pub const WHITE: Color = Color(0b1111_1111);

    /// Quantizes an 8-bit-per-channel RGB triple down to the packed format.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let quantize = |c: u8| c >> 6;
        Color(0b1100_0000 | (quantize(r) << 4) | (quantize(g) << 2) | quantize(b))
    }

    /// True if the alpha bits mark this pixel as fully opaque.
    pub fn is_opaque(self) -> bool {
        self.0 & 0b1100_0000 == 0b1100_0000
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::CLEAR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb_quantizes_to_two_bits_per_channel() {
        assert_eq!(Color::from_rgb(0, 0, 0), Color::BLACK);
        assert_eq!(Color::from_rgb(255, 255, 255), Color::WHITE);
        // Mid grey lands in the middle of the 2-bit range.
        assert_eq!(Color::from_rgb(128, 128, 128), Color(0b1110_1010));
    }

    #[test]
    fn opacity_follows_alpha_bits() {
        assert!(Color::BLACK.is_opaque());
        assert!(!Color::CLEAR.is_opaque());
    }
}
