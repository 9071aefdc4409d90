//! Overridable color palette (OSC 4 / OSC 104)
//!
//! The display layer owns the base 256-color table; this module tracks only
//! the entries an application has overridden at runtime.

use serde::{Deserialize, Serialize};

/// An RGB triple for a palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Runtime palette overrides, indexed 0-255
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    entries: Vec<Option<Rgb>>,
}

impl Palette {
    pub fn new() -> Self {
        Self {
            entries: vec![None; 256],
        }
    }

    /// Set a palette entry from an XParseColor-style spec.
    /// Returns false when the index or the spec is invalid.
    pub fn set(&mut self, index: usize, spec: &str) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        match parse_color_spec(spec) {
            Some(rgb) => {
                self.entries[index] = Some(rgb);
                true
            }
            None => false,
        }
    }

    /// Reset a single entry to the display default
    pub fn reset(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.entries[index] = None;
        true
    }

    /// Reset every entry
    pub fn reset_all(&mut self) {
        for entry in &mut self.entries {
            *entry = None;
        }
    }

    /// Get the override for an index, if any
    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.entries.get(index).copied().flatten()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an XParseColor-style color spec.
///
/// Accepted forms: `#RGB`, `#RRGGBB`, and `rgb:R/G/B` with 1-4 hex digits
/// per component (scaled to 8 bits from the most significant digits).
pub fn parse_color_spec(spec: &str) -> Option<Rgb> {
    if let Some(hex) = spec.strip_prefix('#') {
        return match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Rgb {
                    r: r * 17,
                    g: g * 17,
                    b: b * 17,
                })
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Rgb { r, g, b })
            }
            _ => None,
        };
    }

    if let Some(body) = spec.strip_prefix("rgb:") {
        let parts: Vec<&str> = body.split('/').collect();
        if parts.len() != 3 {
            return None;
        }
        let mut out = [0u8; 3];
        for (slot, part) in out.iter_mut().zip(&parts) {
            if part.is_empty() || part.len() > 4 {
                return None;
            }
            let value = u16::from_str_radix(part, 16).ok()?;
            // Scale to 8 bits: the leading digits are the most significant.
            *slot = match part.len() {
                1 => (value * 17) as u8,
                2 => value as u8,
                3 => (value >> 4) as u8,
                _ => (value >> 8) as u8,
            };
        }
        return Some(Rgb {
            r: out[0],
            g: out[1],
            b: out[2],
        });
    }

    None
}
