//! Character set handling (SCS designation, SO/SI shifts)
//!
//! Four G-slots each hold either US-ASCII or the VT100 special graphics set;
//! an active-slot index selects which translation printable characters pass
//! through.

use serde::{Deserialize, Serialize};

/// Character sets a G-slot can be designated to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Charset {
    /// US-ASCII, no translation
    #[default]
    Ascii,
    /// VT100 special graphics (line drawing)
    Graphic0,
}

/// G0-G3 designations plus the active slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharsetTable {
    slots: [Charset; 4],
    active: usize,
}

impl CharsetTable {
    pub fn new() -> Self {
        Self {
            slots: [Charset::Ascii; 4],
            active: 0,
        }
    }

    /// Reset every slot to ASCII and select G0
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = Charset::Ascii;
        }
        self.active = 0;
    }

    /// Designate a slot (0-3) from the final byte of `ESC ( ) * +`.
    /// Unknown designators are reported to the caller.
    pub fn designate(&mut self, slot: usize, designator: char) -> bool {
        let charset = match designator {
            'B' => Charset::Ascii,
            '0' => Charset::Graphic0,
            _ => return false,
        };
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = charset;
        }
        true
    }

    /// Select the active slot (SO/SI, LS2/LS3)
    pub fn set_active(&mut self, slot: usize) {
        if slot < self.slots.len() {
            self.active = slot;
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    /// Translate a printable character through the active charset
    pub fn translate(&self, c: char) -> char {
        match self.slots[self.active] {
            Charset::Ascii => c,
            Charset::Graphic0 => graphic0(c),
        }
    }
}

impl Default for CharsetTable {
    fn default() -> Self {
        Self::new()
    }
}

/// VT100 special graphics translation for 0x41..0x7E
fn graphic0(c: char) -> char {
    match c {
        'A' => '↑',
        'B' => '↓',
        'C' => '→',
        'D' => '←',
        'E' => '█',
        'F' => '▚',
        'G' => '☃',
        '_' => ' ',
        '`' => '◆',
        'a' => '▒',
        'b' => '␉',
        'c' => '␌',
        'd' => '␍',
        'e' => '␊',
        'f' => '°',
        'g' => '±',
        'h' => '␤',
        'i' => '␋',
        'j' => '┘',
        'k' => '┐',
        'l' => '┌',
        'm' => '└',
        'n' => '┼',
        'o' => '⎺',
        'p' => '⎻',
        'q' => '─',
        'r' => '⎼',
        's' => '⎽',
        't' => '├',
        'u' => '┤',
        'v' => '┴',
        'w' => '┬',
        'x' => '│',
        'y' => '≤',
        'z' => '≥',
        '{' => 'π',
        '|' => '≠',
        '}' => '£',
        '~' => '·',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_passthrough() {
        let table = CharsetTable::new();
        assert_eq!(table.translate('q'), 'q');
        assert_eq!(table.translate('A'), 'A');
    }

    #[test]
    fn test_designate_and_shift() {
        let mut table = CharsetTable::new();
        assert!(table.designate(1, '0'));

        assert_eq!(table.translate('q'), 'q');
        table.set_active(1);
        assert_eq!(table.translate('q'), '─');
        assert_eq!(table.translate('x'), '│');
        table.set_active(0);
        assert_eq!(table.translate('q'), 'q');
    }

    #[test]
    fn test_graphics_corners() {
        let mut table = CharsetTable::new();
        table.designate(0, '0');
        assert_eq!(table.translate('j'), '┘');
        assert_eq!(table.translate('k'), '┐');
        assert_eq!(table.translate('l'), '┌');
        assert_eq!(table.translate('m'), '└');
        assert_eq!(table.translate('n'), '┼');
    }

    #[test]
    fn test_unknown_designator() {
        let mut table = CharsetTable::new();
        assert!(!table.designate(0, 'Z'));
        // Slot keeps its previous designation.
        assert_eq!(table.translate('q'), 'q');
    }

    #[test]
    fn test_reset() {
        let mut table = CharsetTable::new();
        table.designate(0, '0');
        table.set_active(2);
        table.reset();
        assert_eq!(table.active(), 0);
        assert_eq!(table.translate('q'), 'q');
    }
}
