//! Cursor state management

use serde::{Deserialize, Serialize};

use crate::cell::CellAttributes;

/// Cursor visual style (DECSCUSR)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorStyle {
    /// Blinking block (styles 0 and 1)
    #[default]
    BlinkingBlock,
    /// Steady block (style 2)
    SteadyBlock,
    /// Blinking underline (style 3)
    BlinkingUnderline,
    /// Steady underline (style 4)
    SteadyUnderline,
    /// Blinking bar (style 5)
    BlinkingBar,
    /// Steady bar (style 6)
    SteadyBar,
}

impl CursorStyle {
    /// Map a DECSCUSR parameter (0-6) to a style
    pub fn from_decscusr(value: u16) -> Option<Self> {
        match value {
            0 | 1 => Some(CursorStyle::BlinkingBlock),
            2 => Some(CursorStyle::SteadyBlock),
            3 => Some(CursorStyle::BlinkingUnderline),
            4 => Some(CursorStyle::SteadyUnderline),
            5 => Some(CursorStyle::BlinkingBar),
            6 => Some(CursorStyle::SteadyBar),
            _ => None,
        }
    }
}

/// Cursor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Column position (0-indexed)
    pub col: usize,
    /// Row position (0-indexed)
    pub row: usize,
    /// Template attributes applied to newly written cells
    pub attrs: CellAttributes,
    /// Pending wrap: the cursor sits on the right margin and the next
    /// printable character wraps first
    pub pending_wrap: bool,
    /// Origin mode (DECOM): addressing is relative to the scroll region
    pub origin_mode: bool,
    /// Visual style
    pub style: CursorStyle,
}

impl Cursor {
    pub fn new() -> Self {
        Self {
            col: 0,
            row: 0,
            attrs: CellAttributes::default(),
            pending_wrap: false,
            origin_mode: false,
            style: CursorStyle::default(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Saved cursor state for DECSC/DECRC, one slot per screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SavedCursor {
    pub col: usize,
    pub row: usize,
    pub attrs: CellAttributes,
    pub origin_mode: bool,
}

impl SavedCursor {
    pub fn save(cursor: &Cursor) -> Self {
        Self {
            col: cursor.col,
            row: cursor.row,
            attrs: cursor.attrs,
            origin_mode: cursor.origin_mode,
        }
    }

    pub fn restore(&self, cursor: &mut Cursor) {
        cursor.col = self.col;
        cursor.row = self.row;
        cursor.attrs = self.attrs;
        cursor.origin_mode = self.origin_mode;
        cursor.pending_wrap = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_new() {
        let cursor = Cursor::new();
        assert_eq!(cursor.col, 0);
        assert_eq!(cursor.row, 0);
        assert!(!cursor.pending_wrap);
    }

    #[test]
    fn test_saved_cursor_round_trip() {
        let mut cursor = Cursor::new();
        cursor.col = 10;
        cursor.row = 5;
        cursor.attrs.bold = true;
        cursor.pending_wrap = true;

        let saved = SavedCursor::save(&cursor);
        cursor.reset();
        saved.restore(&mut cursor);

        assert_eq!(cursor.col, 10);
        assert_eq!(cursor.row, 5);
        assert!(cursor.attrs.bold);
        // Restoring always clears the pending wrap.
        assert!(!cursor.pending_wrap);
    }

    #[test]
    fn test_decscusr_mapping() {
        assert_eq!(
            CursorStyle::from_decscusr(0),
            Some(CursorStyle::BlinkingBlock)
        );
        assert_eq!(CursorStyle::from_decscusr(6), Some(CursorStyle::SteadyBar));
        assert_eq!(CursorStyle::from_decscusr(7), None);
    }
}
