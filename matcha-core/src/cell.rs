//! Terminal cell representation
//!
//! Each cell in the grid holds one character plus its display attributes.
//! A double-width character occupies two cells: the left one has width 2,
//! the right one is a continuation with width 0 and no content.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Attributes that affect how a cell is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellAttributes {
    /// Foreground color
    pub fg: Color,
    /// Background color
    pub bg: Color,
    /// Bold text (SGR 1)
    pub bold: bool,
    /// Faint/dim text (SGR 2)
    pub faint: bool,
    /// Italic text (SGR 3)
    pub italic: bool,
    /// Underlined text (SGR 4)
    pub underline: bool,
    /// Blinking text (SGR 5/6)
    pub blink: bool,
    /// Inverse/reverse video (SGR 7)
    pub inverse: bool,
    /// Hidden/invisible text (SGR 8)
    pub hidden: bool,
    /// Strikethrough text (SGR 9)
    pub strikethrough: bool,
}

impl CellAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all rendition flags and restore default colors
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A single cell in the terminal grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// The character stored in this cell
    c: char,
    /// Display attributes
    pub attrs: CellAttributes,
    /// Width of this cell: 1 normal, 2 wide, 0 continuation of a wide cell
    width: u8,
}

impl Cell {
    /// Create a new blank cell
    pub fn new() -> Self {
        Self {
            c: ' ',
            attrs: CellAttributes::default(),
            width: 1,
        }
    }

    /// Create a cell with a character
    pub fn with_char(c: char) -> Self {
        Self {
            c,
            attrs: CellAttributes::default(),
            width: char_width(c),
        }
    }

    /// Set the character content, recomputing the width
    pub fn set_char(&mut self, c: char) {
        self.c = c;
        self.width = char_width(c);
    }

    /// Get the character content
    pub fn content(&self) -> char {
        self.c
    }

    /// Check if the cell holds no visible content
    pub fn is_blank(&self) -> bool {
        self.c == ' '
    }

    /// Get the display width of this cell
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Mark this cell as a wide character's left half
    pub fn set_wide(&mut self) {
        self.width = 2;
    }

    /// Turn this cell into the right-half placeholder of a wide character
    pub fn set_continuation(&mut self) {
        self.c = '\0';
        self.width = 0;
    }

    /// Check if this is a wide character's left half
    pub fn is_wide(&self) -> bool {
        self.width == 2
    }

    /// Check if this is a continuation cell
    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// Clear the cell to a space carrying the given colors.
    /// Rendition flags are dropped; only fg/bg survive, matching how
    /// erased regions inherit the cursor's colors.
    pub fn clear(&mut self, attrs: CellAttributes) {
        self.c = ' ';
        self.width = 1;
        self.attrs = CellAttributes {
            fg: attrs.fg,
            bg: attrs.bg,
            ..CellAttributes::default()
        };
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}

/// Display width of a character: 2 for wide (CJK etc.), 1 otherwise.
/// Zero-width combining marks report 0.
pub(crate) fn char_width(c: char) -> u8 {
    use unicode_width::UnicodeWidthChar;
    match c.width() {
        Some(w) => w.min(2) as u8,
        None => 1,
    }
}
