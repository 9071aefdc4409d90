//! Input encodings the display layer writes to the PTY
//!
//! Mouse reports, focus reports, and bracketed paste. Key tables live in
//! the display layer; it hands finished byte strings to `Tty::send`.

use matcha_core::Modes;

/// Mouse buttons that can be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
}

impl MouseButton {
    fn code(self) -> u32 {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
            MouseButton::WheelUp => 64,
            MouseButton::WheelDown => 65,
        }
    }
}

/// Modifier keys held during a mouse event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

impl Modifiers {
    fn mask(self) -> u32 {
        (self.shift as u32) * 4 + (self.alt as u32) * 8 + (self.ctrl as u32) * 16
    }
}

/// Encode a mouse event per the active reporting and encoding modes.
/// Returns None when the event should not be reported.
pub fn encode_mouse(
    button: MouseButton,
    col: usize,
    row: usize,
    press: bool,
    modifiers: Modifiers,
    motion: bool,
    modes: &Modes,
) -> Option<Vec<u8>> {
    if !modes.mouse_enabled() {
        return None;
    }
    if motion && !(modes.mouse_motion || modes.mouse_many) {
        return None;
    }
    // X10 compatibility reports button presses only, without modifiers.
    if modes.mouse_x10 && (!press || motion) {
        return None;
    }

    let mut code = button.code();
    if motion {
        code += 32;
    }
    if !modes.mouse_x10 {
        code += modifiers.mask();
    }

    if modes.mouse_sgr {
        let terminator = if press || motion { 'M' } else { 'm' };
        return Some(
            format!("\x1b[<{};{};{}{}", code, col + 1, row + 1, terminator).into_bytes(),
        );
    }

    // Legacy encoding: release collapses to button 3, coordinates are
    // offset by 32 and clamped to one byte.
    if !press && !motion {
        code = (code & !0b11) | 3;
    }
    let cx = (col + 1 + 32).min(255) as u8;
    let cy = (row + 1 + 32).min(255) as u8;
    Some(vec![0x1B, b'[', b'M', (code + 32) as u8, cx, cy])
}

/// Focus in/out report (`CSI I` / `CSI O`)
pub fn encode_focus(focused: bool) -> &'static [u8] {
    if focused {
        b"\x1b[I"
    } else {
        b"\x1b[O"
    }
}

/// Prepare paste text for the PTY: newlines become carriage returns, and
/// the payload is bracketed when the application asked for it.
pub fn encode_paste(text: &str, bracketed: bool) -> Vec<u8> {
    let body = text.replace('\n', "\r");
    if bracketed {
        let mut out = Vec::with_capacity(body.len() + 12);
        out.extend_from_slice(b"\x1b[200~");
        out.extend_from_slice(body.as_bytes());
        out.extend_from_slice(b"\x1b[201~");
        out
    } else {
        body.into_bytes()
    }
}
