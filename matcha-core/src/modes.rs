//! Terminal mode register
//!
//! One flag per tracked mode. Numeric DEC/ANSI mode dispatch lives in the
//! screen (set/reset can touch the cursor and the grids, not just a bit).

use serde::{Deserialize, Serialize};

/// Terminal mode flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modes {
    /// DECAWM - auto-wrap at the right margin
    pub wrap: bool,
    /// IRM - insert mode: printed characters shift the tail right
    pub insert: bool,
    /// SRM inverted - local echo of sent bytes
    pub echo: bool,
    /// LNM - LF implies CR
    pub crlf: bool,
    /// KAM - keyboard action mode (keyboard locked)
    pub kbd_lock: bool,
    /// DECCKM - application cursor keys
    pub app_cursor: bool,
    /// DECPAM/DECPNM - application keypad
    pub app_keypad: bool,
    /// DECSCNM - reverse video for the whole screen
    pub reverse: bool,
    /// DECTCEM inverted - cursor hidden
    pub hide: bool,
    /// Alternate screen active
    pub alt_screen: bool,
    /// X10 mouse compatibility reporting
    pub mouse_x10: bool,
    /// Report button presses and releases
    pub mouse_button: bool,
    /// Report motion while a button is held
    pub mouse_motion: bool,
    /// Report all pointer motion
    pub mouse_many: bool,
    /// SGR extended mouse coordinates
    pub mouse_sgr: bool,
    /// Focus in/out reporting
    pub focus: bool,
    /// Bracketed paste
    pub bracketed_paste: bool,
    /// 8-bit meta key encoding
    pub eight_bit: bool,
    /// UTF-8 byte-stream interpretation
    pub utf8: bool,
    /// A Sixel DCS payload is being consumed
    pub sixel: bool,
    /// Mirror the input stream to the printer sink
    pub print: bool,
}

impl Modes {
    pub fn new() -> Self {
        Self {
            wrap: true,
            insert: false,
            echo: false,
            crlf: false,
            kbd_lock: false,
            app_cursor: false,
            app_keypad: false,
            reverse: false,
            hide: false,
            alt_screen: false,
            mouse_x10: false,
            mouse_button: false,
            mouse_motion: false,
            mouse_many: false,
            mouse_sgr: false,
            focus: false,
            bracketed_paste: false,
            eight_bit: false,
            utf8: true,
            sixel: false,
            print: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Any mouse reporting mode active
    pub fn mouse_enabled(&self) -> bool {
        self.mouse_x10 || self.mouse_button || self.mouse_motion || self.mouse_many
    }

    /// Clear every mouse reporting mode (the variants are exclusive)
    pub fn clear_mouse(&mut self) {
        self.mouse_x10 = false;
        self.mouse_button = false;
        self.mouse_motion = false;
        self.mouse_many = false;
    }
}

impl Default for Modes {
    fn default() -> Self {
        Self::new()
    }
}
