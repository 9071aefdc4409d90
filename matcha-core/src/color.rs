//! Color representation for terminal cells
//!
//! Supports the default foreground/background, the 256-color palette, and
//! 24-bit direct color as set by SGR 38/48.

use serde::{Deserialize, Serialize};

/// Color of a cell's foreground or background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    /// Default terminal color (resolved by the display layer)
    Default,
    /// Indexed color (0-255)
    /// 0-7: standard colors
    /// 8-15: bright colors
    /// 16-231: 6x6x6 color cube
    /// 232-255: grayscale
    Indexed(u8),
    /// 24-bit direct color
    Rgb { r: u8, g: u8, b: u8 },
}

impl Color {
    /// Create a new indexed color
    pub fn indexed(index: u8) -> Self {
        Color::Indexed(index)
    }

    /// Create a new direct color
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::Default
    }
}
