//! Terminal escape sequence parser
//!
//! A tagged-state machine over decoded code points. Bytes are decoded as
//! UTF-8 (or one code point per byte when UTF-8 is switched off or a Sixel
//! payload is being consumed) and then fed through the states. Controls
//! execute as soon as they arrive, even in the middle of a sequence; only
//! CAN, SUB, BEL, and C1 controls terminate an in-progress string.

use log::debug;

use crate::action::{Action, CsiAction, EscAction, OscAction};
use crate::params::Params;
use crate::utf8::{encode_utf8, Utf8Decoder, Utf8Result};

/// CSI parameter buffer cap; reaching it finalizes the sequence early
const MAX_CSI_LEN: usize = 512;
/// String (OSC/DCS/APC/PM/title) payload cap; further bytes are dropped
const MAX_STRING_LEN: usize = 8192;
/// Intermediate byte cap
const MAX_INTERMEDIATES: usize = 4;

const REPLACEMENT: char = '\u{FFFD}';

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Normal text
    Ground,
    /// After ESC
    Escape,
    /// ESC plus intermediate bytes (charset designation, `#`, `%`)
    EscapeIntermediate,
    /// After ESC [
    CsiEntry,
    /// Collecting CSI parameters
    CsiParam,
    /// Collecting CSI intermediates
    CsiIntermediate,
    /// Malformed CSI; consume until the final byte
    CsiIgnore,
    /// After ESC ]
    OscString,
    /// After ESC k (legacy title)
    TitleString,
    /// After ESC _
    ApcString,
    /// After ESC ^
    PmString,
    /// After ESC P
    DcsEntry,
    /// Collecting DCS parameters
    DcsParam,
    /// DCS payload; discarded until ST
    DcsPassthrough,
    /// Malformed DCS; discarded until ST
    DcsIgnore,
    /// Sixel payload; bytes are raw and discarded until ST
    SixelString,
}

/// The terminal parser
#[derive(Debug, Clone)]
pub struct Parser {
    state: ParserState,
    utf8: Utf8Decoder,
    /// UTF-8 interpretation of the byte stream (`ESC % G` / `ESC % @`)
    utf8_mode: bool,
    /// Raw CSI parameter bytes
    params_buf: Vec<u8>,
    intermediates: Vec<u8>,
    private_marker: bool,
    marker: u8,
    esc_intermediates: Vec<u8>,
    /// OSC/APC/PM/title payload
    string_buf: Vec<u8>,
    /// DCS parameter bytes
    dcs_params: Vec<u8>,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Ground,
            utf8: Utf8Decoder::new(),
            utf8_mode: true,
            params_buf: Vec::with_capacity(64),
            intermediates: Vec::with_capacity(MAX_INTERMEDIATES),
            private_marker: false,
            marker: 0,
            esc_intermediates: Vec::with_capacity(MAX_INTERMEDIATES),
            string_buf: Vec::with_capacity(256),
            dcs_params: Vec::with_capacity(16),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Whether a Sixel payload is currently being discarded
    pub fn in_sixel(&self) -> bool {
        self.state == ParserState::SixelString
    }

    pub fn utf8_mode(&self) -> bool {
        self.utf8_mode
    }

    /// Force the byte-stream interpretation (DEC private modes do this too)
    pub fn set_utf8_mode(&mut self, enabled: bool) {
        self.utf8_mode = enabled;
    }

    pub fn reset(&mut self) {
        self.state = ParserState::Ground;
        self.utf8.reset();
        self.utf8_mode = true;
        self.params_buf.clear();
        self.intermediates.clear();
        self.private_marker = false;
        self.marker = 0;
        self.esc_intermediates.clear();
        self.string_buf.clear();
        self.dcs_params.clear();
    }

    /// Feed a chunk of bytes, invoking the callback per action
    pub fn parse<F>(&mut self, data: &[u8], mut callback: F)
    where
        F: FnMut(Action),
    {
        for &byte in data {
            self.advance(byte, &mut callback);
        }
    }

    /// Feed a chunk and collect the actions (tests, tools)
    pub fn parse_collect(&mut self, data: &[u8]) -> Vec<Action> {
        let mut actions = Vec::new();
        self.parse(data, |action| actions.push(action));
        actions
    }

    fn advance<F>(&mut self, byte: u8, callback: &mut F)
    where
        F: FnMut(Action),
    {
        let c = if self.state == ParserState::SixelString || !self.utf8_mode {
            byte as char
        } else {
            match self.utf8.feed(byte) {
                Utf8Result::Pending => return,
                Utf8Result::Char(c) => c,
                Utf8Result::Invalid => REPLACEMENT,
            }
        };
        self.process(c, callback);
    }

    fn process<F>(&mut self, c: char, callback: &mut F)
    where
        F: FnMut(Action),
    {
        if self.in_string_state() {
            self.handle_string_char(c, callback);
            return;
        }

        if is_control(c) {
            self.handle_control(c as u32 as u8, callback);
            return;
        }

        match self.state {
            ParserState::Ground => callback(Action::Print(c)),
            ParserState::Escape => self.handle_escape(c, callback),
            ParserState::EscapeIntermediate => self.handle_escape_intermediate(c, callback),
            ParserState::CsiEntry => self.handle_csi_entry(c, callback),
            ParserState::CsiParam => self.handle_csi_param(c, callback),
            ParserState::CsiIntermediate => self.handle_csi_intermediate(c, callback),
            ParserState::CsiIgnore => {
                if let Some(byte) = ascii(c) {
                    if (0x40..=0x7E).contains(&byte) {
                        self.state = ParserState::Ground;
                    }
                }
            }
            ParserState::DcsEntry | ParserState::DcsParam => self.handle_dcs_param(c, callback),
            _ => unreachable!("string states handled above"),
        }
    }

    fn in_string_state(&self) -> bool {
        matches!(
            self.state,
            ParserState::OscString
                | ParserState::TitleString
                | ParserState::ApcString
                | ParserState::PmString
                | ParserState::DcsPassthrough
                | ParserState::DcsIgnore
                | ParserState::SixelString
        )
    }

    /// Controls execute immediately in any non-string state. ESC, CAN, and
    /// SUB cancel an in-progress sequence.
    fn handle_control<F>(&mut self, byte: u8, callback: &mut F)
    where
        F: FnMut(Action),
    {
        match byte {
            0x1B => self.enter_escape(),
            0x18 => self.state = ParserState::Ground,
            0x1A => {
                self.state = ParserState::Ground;
                callback(Action::Control(byte));
            }
            // BEL, BS, HT, LF, VT, FF, CR, SO, SI
            0x07..=0x0F => callback(Action::Control(byte)),
            // NEL, HTS, DECID
            0x85 | 0x88 | 0x9A => callback(Action::Control(byte)),
            0x90 => self.enter_string(ParserState::DcsEntry),
            0x9D => self.enter_string(ParserState::OscString),
            0x9E => self.enter_string(ParserState::PmString),
            0x9F => self.enter_string(ParserState::ApcString),
            // NUL, ENQ, XON, XOFF, DEL, ST outside a string, the rest of C1
            _ => {}
        }
    }

    fn enter_escape(&mut self) {
        self.state = ParserState::Escape;
        self.esc_intermediates.clear();
        self.params_buf.clear();
        self.intermediates.clear();
    }

    fn enter_string(&mut self, state: ParserState) {
        self.state = state;
        self.string_buf.clear();
        self.dcs_params.clear();
    }

    fn handle_escape<F>(&mut self, c: char, callback: &mut F)
    where
        F: FnMut(Action),
    {
        let byte = match ascii(c) {
            Some(b) => b,
            None => {
                self.state = ParserState::Ground;
                return;
            }
        };

        let action = match byte {
            b'[' => {
                self.enter_csi();
                return;
            }
            b']' => {
                self.enter_string(ParserState::OscString);
                return;
            }
            b'P' => {
                self.enter_string(ParserState::DcsEntry);
                return;
            }
            b'_' => {
                self.enter_string(ParserState::ApcString);
                return;
            }
            b'^' => {
                self.enter_string(ParserState::PmString);
                return;
            }
            b'k' => {
                self.enter_string(ParserState::TitleString);
                return;
            }
            b'(' | b')' | b'*' | b'+' | b'#' | b'%' => {
                self.esc_intermediates.push(byte);
                self.state = ParserState::EscapeIntermediate;
                return;
            }
            0x20..=0x2F => {
                self.esc_intermediates.push(byte);
                self.state = ParserState::EscapeIntermediate;
                return;
            }
            b'n' => EscAction::LockingShift(2),
            b'o' => EscAction::LockingShift(3),
            b'D' => EscAction::Index,
            b'E' => EscAction::NextLine,
            b'H' => EscAction::TabSet,
            b'M' => EscAction::ReverseIndex,
            b'Z' => EscAction::IdentifyTerminal,
            b'c' => EscAction::FullReset,
            b'=' => EscAction::AppKeypad(true),
            b'>' => EscAction::AppKeypad(false),
            b'7' => EscAction::SaveCursor,
            b'8' => EscAction::RestoreCursor,
            b'\\' => {
                // ST with no string pending
                self.state = ParserState::Ground;
                return;
            }
            _ => EscAction::Unknown(vec![byte]),
        };
        callback(Action::Esc(action));
        self.state = ParserState::Ground;
    }

    fn handle_escape_intermediate<F>(&mut self, c: char, callback: &mut F)
    where
        F: FnMut(Action),
    {
        let byte = match ascii(c) {
            Some(b) => b,
            None => {
                self.state = ParserState::Ground;
                return;
            }
        };

        match byte {
            0x20..=0x2F => {
                if self.esc_intermediates.len() < MAX_INTERMEDIATES {
                    self.esc_intermediates.push(byte);
                }
            }
            0x30..=0x7E => {
                let action = match (self.esc_intermediates.first().copied(), byte) {
                    (Some(b'('), d) => EscAction::DesignateCharset {
                        slot: 0,
                        designator: d as char,
                    },
                    (Some(b')'), d) => EscAction::DesignateCharset {
                        slot: 1,
                        designator: d as char,
                    },
                    (Some(b'*'), d) => EscAction::DesignateCharset {
                        slot: 2,
                        designator: d as char,
                    },
                    (Some(b'+'), d) => EscAction::DesignateCharset {
                        slot: 3,
                        designator: d as char,
                    },
                    (Some(b'#'), b'8') => EscAction::AlignmentTest,
                    (Some(b'%'), b'G') => {
                        self.utf8_mode = true;
                        EscAction::Utf8Charset(true)
                    }
                    (Some(b'%'), b'@') => {
                        self.utf8_mode = false;
                        EscAction::Utf8Charset(false)
                    }
                    _ => {
                        let mut data = self.esc_intermediates.clone();
                        data.push(byte);
                        EscAction::Unknown(data)
                    }
                };
                callback(Action::Esc(action));
                self.state = ParserState::Ground;
            }
            _ => self.state = ParserState::Ground,
        }
    }

    // --- CSI ---------------------------------------------------------------

    fn enter_csi(&mut self) {
        self.state = ParserState::CsiEntry;
        self.params_buf.clear();
        self.intermediates.clear();
        self.private_marker = false;
        self.marker = 0;
    }

    fn handle_csi_entry<F>(&mut self, c: char, callback: &mut F)
    where
        F: FnMut(Action),
    {
        let byte = match ascii(c) {
            Some(b) => b,
            None => {
                self.state = ParserState::CsiIgnore;
                return;
            }
        };
        match byte {
            b'?' | b'>' | b'<' | b'=' => {
                self.marker = byte;
                self.private_marker = byte == b'?';
                self.state = ParserState::CsiParam;
            }
            b'0'..=b'9' | b';' => {
                self.params_buf.push(byte);
                self.state = ParserState::CsiParam;
            }
            0x20..=0x2F => {
                self.intermediates.push(byte);
                self.state = ParserState::CsiIntermediate;
            }
            0x40..=0x7E => self.dispatch_csi(byte, callback),
            _ => self.state = ParserState::CsiIgnore,
        }
    }

    fn handle_csi_param<F>(&mut self, c: char, callback: &mut F)
    where
        F: FnMut(Action),
    {
        let byte = match ascii(c) {
            Some(b) => b,
            None => {
                self.state = ParserState::CsiIgnore;
                return;
            }
        };
        match byte {
            b'0'..=b'9' | b';' => {
                if self.params_buf.len() >= MAX_CSI_LEN {
                    // Oversized sequence: finalize with this byte.
                    debug!("csi overflow, finalizing early");
                    self.dispatch_csi(byte, callback);
                } else {
                    self.params_buf.push(byte);
                }
            }
            0x20..=0x2F => {
                self.intermediates.push(byte);
                self.state = ParserState::CsiIntermediate;
            }
            0x40..=0x7E => self.dispatch_csi(byte, callback),
            _ => self.state = ParserState::CsiIgnore,
        }
    }

    fn handle_csi_intermediate<F>(&mut self, c: char, callback: &mut F)
    where
        F: FnMut(Action),
    {
        let byte = match ascii(c) {
            Some(b) => b,
            None => {
                self.state = ParserState::CsiIgnore;
                return;
            }
        };
        match byte {
            0x20..=0x2F => {
                if self.intermediates.len() < MAX_INTERMEDIATES {
                    self.intermediates.push(byte);
                } else {
                    self.state = ParserState::CsiIgnore;
                }
            }
            0x40..=0x7E => self.dispatch_csi(byte, callback),
            _ => self.state = ParserState::CsiIgnore,
        }
    }

    fn dispatch_csi<F>(&mut self, final_byte: u8, callback: &mut F)
    where
        F: FnMut(Action),
    {
        let params = Params::parse(&self.params_buf);
        callback(Action::Csi(CsiAction {
            params,
            intermediates: self.intermediates.clone(),
            final_byte,
            private: self.private_marker,
            marker: self.marker,
        }));
        self.state = ParserState::Ground;
    }

    // --- DCS ---------------------------------------------------------------

    fn handle_dcs_param<F>(&mut self, c: char, callback: &mut F)
    where
        F: FnMut(Action),
    {
        let byte = match ascii(c) {
            Some(b) => b,
            None => {
                self.state = ParserState::DcsIgnore;
                return;
            }
        };
        match byte {
            b'0'..=b'9' | b';' => {
                if self.dcs_params.len() < MAX_CSI_LEN {
                    self.dcs_params.push(byte);
                }
                self.state = ParserState::DcsParam;
            }
            0x40..=0x7E => self.hook_dcs(byte, callback),
            _ => self.state = ParserState::DcsIgnore,
        }
    }

    fn hook_dcs<F>(&mut self, final_byte: u8, callback: &mut F)
    where
        F: FnMut(Action),
    {
        // A bare `ESC P q` starts a Sixel payload; everything else is a
        // device control string whose payload we discard.
        self.state = if final_byte == b'q' && self.dcs_params.is_empty() {
            ParserState::SixelString
        } else {
            ParserState::DcsPassthrough
        };
        self.string_buf.clear();
        callback(Action::DcsHook {
            params: Params::parse(&self.dcs_params),
            final_byte,
        });
    }

    // --- string sequences --------------------------------------------------

    fn handle_string_char<F>(&mut self, c: char, callback: &mut F)
    where
        F: FnMut(Action),
    {
        match c as u32 {
            0x07 | 0x9C => self.finish_string(ParserState::Ground, callback),
            0x1B => {
                self.finish_string(ParserState::Ground, callback);
                self.enter_escape();
            }
            0x18 => self.abort_string(callback),
            0x1A => {
                self.abort_string(callback);
                callback(Action::Control(0x1A));
            }
            0x80..=0x9F => {
                self.abort_string(callback);
                self.handle_control(c as u32 as u8, callback);
            }
            _ => self.collect_string_char(c),
        }
    }

    fn collect_string_char(&mut self, c: char) {
        match self.state {
            ParserState::SixelString | ParserState::DcsIgnore | ParserState::DcsPassthrough => {
                // Payload is detected but never stored.
            }
            _ => {
                if self.string_buf.len() + c.len_utf8() <= MAX_STRING_LEN {
                    encode_utf8(c, &mut self.string_buf);
                }
            }
        }
    }

    /// Dispatch the finished string and move to `next`
    fn finish_string<F>(&mut self, next: ParserState, callback: &mut F)
    where
        F: FnMut(Action),
    {
        match self.state {
            ParserState::OscString => self.dispatch_osc(callback),
            ParserState::TitleString => {
                let title = String::from_utf8_lossy(&self.string_buf).into_owned();
                callback(Action::Title(title));
            }
            ParserState::ApcString => callback(Action::Apc(std::mem::take(&mut self.string_buf))),
            ParserState::PmString => callback(Action::Pm(std::mem::take(&mut self.string_buf))),
            ParserState::DcsPassthrough | ParserState::SixelString => {
                callback(Action::DcsUnhook);
            }
            ParserState::DcsIgnore => {}
            _ => {}
        }
        self.string_buf.clear();
        self.state = next;
    }

    /// Drop the string without dispatching (CAN/SUB/C1 interruption)
    fn abort_string<F>(&mut self, callback: &mut F)
    where
        F: FnMut(Action),
    {
        if matches!(
            self.state,
            ParserState::DcsPassthrough | ParserState::SixelString
        ) {
            callback(Action::DcsUnhook);
        }
        self.string_buf.clear();
        self.state = ParserState::Ground;
    }

    fn dispatch_osc<F>(&mut self, callback: &mut F)
    where
        F: FnMut(Action),
    {
        let payload = String::from_utf8_lossy(&self.string_buf).into_owned();
        let args: Vec<&str> = payload.split(';').collect();
        let command: i32 = args[0].parse().unwrap_or(0);

        let action = match command {
            0 | 1 | 2 => OscAction::SetTitle(args.get(1).unwrap_or(&"").to_string()),
            4 => OscAction::SetColor {
                index: args.get(1).and_then(|s| s.parse().ok()).unwrap_or(-1),
                spec: args.get(2).unwrap_or(&"").to_string(),
            },
            104 => {
                let index = match args.get(1) {
                    None => None,
                    Some(s) if s.is_empty() => None,
                    Some(s) => Some(s.parse().unwrap_or(-1)),
                };
                OscAction::ResetColor(index)
            }
            // The payload is read from argument 2 regardless of which
            // selection argument 1 names.
            52 => OscAction::Clipboard(args.get(2).unwrap_or(&"").to_string()),
            _ => OscAction::Unknown {
                command,
                raw: payload.clone(),
            },
        };
        callback(Action::Osc(action));
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_control(c: char) -> bool {
    let u = c as u32;
    u < 0x20 || u == 0x7F || (0x80..=0x9F).contains(&u)
}

/// The code point as an ASCII byte, when it is one
fn ascii(c: char) -> Option<u8> {
    if c.is_ascii() {
        Some(c as u8)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"Hi");
        assert_eq!(actions, vec![Action::Print('H'), Action::Print('i')]);
    }

    #[test]
    fn test_controls() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x07\x08\x09\x0a\x0d");
        assert_eq!(
            actions,
            vec![
                Action::Control(0x07),
                Action::Control(0x08),
                Action::Control(0x09),
                Action::Control(0x0A),
                Action::Control(0x0D),
            ]
        );
    }

    #[test]
    fn test_csi_cup() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b[3;5H");
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            Action::Csi(csi) => {
                assert_eq!(csi.final_byte, b'H');
                assert_eq!(csi.params.as_slice(), &[3, 5]);
                assert!(!csi.private);
            }
            other => panic!("expected CSI, got {:?}", other),
        }
    }

    #[test]
    fn test_csi_private() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b[?1049h");
        match &actions[0] {
            Action::Csi(csi) => {
                assert!(csi.private);
                assert_eq!(csi.marker, b'?');
                assert_eq!(csi.params.raw(0), 1049);
                assert_eq!(csi.final_byte, b'h');
            }
            other => panic!("expected CSI, got {:?}", other),
        }
    }

    #[test]
    fn test_csi_intermediate() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b[2 q");
        match &actions[0] {
            Action::Csi(csi) => {
                assert_eq!(csi.intermediates, vec![b' ']);
                assert_eq!(csi.final_byte, b'q');
                assert_eq!(csi.params.raw(0), 2);
            }
            other => panic!("expected CSI, got {:?}", other),
        }
    }

    #[test]
    fn test_control_inside_csi() {
        // A CR embedded in a CSI sequence executes without breaking it.
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b[3\x0d2C");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0], Action::Control(0x0D));
        match &actions[1] {
            Action::Csi(csi) => {
                assert_eq!(csi.params.raw(0), 32);
                assert_eq!(csi.final_byte, b'C');
            }
            other => panic!("expected CSI, got {:?}", other),
        }
    }

    #[test]
    fn test_can_aborts_csi() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b[12\x18A");
        assert_eq!(actions, vec![Action::Print('A')]);
    }

    #[test]
    fn test_esc_single_byte() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b7\x1b8\x1bD\x1bM\x1bZ");
        assert_eq!(
            actions,
            vec![
                Action::Esc(EscAction::SaveCursor),
                Action::Esc(EscAction::RestoreCursor),
                Action::Esc(EscAction::Index),
                Action::Esc(EscAction::ReverseIndex),
                Action::Esc(EscAction::IdentifyTerminal),
            ]
        );
    }

    #[test]
    fn test_esc_charset() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b(0\x1b)B");
        assert_eq!(
            actions,
            vec![
                Action::Esc(EscAction::DesignateCharset {
                    slot: 0,
                    designator: '0'
                }),
                Action::Esc(EscAction::DesignateCharset {
                    slot: 1,
                    designator: 'B'
                }),
            ]
        );
    }

    #[test]
    fn test_esc_utf8_toggle() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b%@");
        assert_eq!(actions, vec![Action::Esc(EscAction::Utf8Charset(false))]);
        assert!(!parser.utf8_mode());

        // Latin-1 mode: a lone 0xE9 is a printable code point.
        let actions = parser.parse_collect(&[0xE9]);
        assert_eq!(actions, vec![Action::Print('\u{e9}')]);

        let actions = parser.parse_collect(b"\x1b%G");
        assert_eq!(actions, vec![Action::Esc(EscAction::Utf8Charset(true))]);
        assert!(parser.utf8_mode());
    }

    #[test]
    fn test_osc_title_bel() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b]0;My Title\x07");
        assert_eq!(
            actions,
            vec![Action::Osc(OscAction::SetTitle("My Title".to_string()))]
        );
    }

    #[test]
    fn test_osc_title_st() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b]2;abc\x1b\\");
        assert_eq!(
            actions,
            vec![Action::Osc(OscAction::SetTitle("abc".to_string()))]
        );
        assert_eq!(parser.state(), ParserState::Ground);
    }

    #[test]
    fn test_osc_color() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b]4;17;#102030\x07");
        assert_eq!(
            actions,
            vec![Action::Osc(OscAction::SetColor {
                index: 17,
                spec: "#102030".to_string()
            })]
        );
    }

    #[test]
    fn test_osc_reset_color() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b]104;5\x07\x1b]104\x07");
        assert_eq!(
            actions,
            vec![
                Action::Osc(OscAction::ResetColor(Some(5))),
                Action::Osc(OscAction::ResetColor(None)),
            ]
        );
    }

    #[test]
    fn test_osc_clipboard_reads_arg2() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b]52;c;aGVsbG8=\x07");
        assert_eq!(
            actions,
            vec![Action::Osc(OscAction::Clipboard("aGVsbG8=".to_string()))]
        );
    }

    #[test]
    fn test_legacy_title() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1bkold title\x1b\\");
        assert_eq!(actions, vec![Action::Title("old title".to_string())]);
    }

    #[test]
    fn test_apc_pm_discarded_payloads() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1b_payload\x1b\\\x1b^secret\x07");
        assert_eq!(
            actions,
            vec![
                Action::Apc(b"payload".to_vec()),
                Action::Pm(b"secret".to_vec()),
            ]
        );
    }

    #[test]
    fn test_sixel_detect_and_discard() {
        let mut parser = Parser::new();
        let mut actions = Vec::new();
        parser.parse(b"\x1bPq#0;2;0;0;0~~", |a| actions.push(a));
        assert!(parser.in_sixel());
        assert_eq!(
            actions,
            vec![Action::DcsHook {
                params: Params::parse(b""),
                final_byte: b'q'
            }]
        );

        parser.parse(b"\x1b\\A", |a| actions.push(a));
        assert!(!parser.in_sixel());
        assert_eq!(actions[1], Action::DcsUnhook);
        assert_eq!(actions[2], Action::Print('A'));
    }

    #[test]
    fn test_dcs_with_params_not_sixel() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(b"\x1bP1;2qdata\x1b\\");
        assert_eq!(
            actions,
            vec![
                Action::DcsHook {
                    params: Params::parse(b"1;2"),
                    final_byte: b'q'
                },
                Action::DcsUnhook,
            ]
        );
    }

    #[test]
    fn test_streaming_csi() {
        let mut parser = Parser::new();
        assert!(parser.parse_collect(b"\x1b[10").is_empty());
        let actions = parser.parse_collect(b";20H");
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_streaming_utf8() {
        let mut parser = Parser::new();
        assert!(parser.parse_collect(&[0xE4]).is_empty());
        assert!(parser.parse_collect(&[0xB8]).is_empty());
        assert_eq!(parser.parse_collect(&[0xAD]), vec![Action::Print('中')]);
    }

    #[test]
    fn test_invalid_utf8_replacement() {
        let mut parser = Parser::new();
        let actions = parser.parse_collect(&[0xFF]);
        assert_eq!(actions, vec![Action::Print('\u{FFFD}')]);
    }

    #[test]
    fn test_c1_osc_in_latin1_mode() {
        let mut parser = Parser::new();
        parser.set_utf8_mode(false);
        let actions = parser.parse_collect(b"\x9d0;t\x9c");
        assert_eq!(
            actions,
            vec![Action::Osc(OscAction::SetTitle("t".to_string()))]
        );
    }

    #[test]
    fn test_string_cap_drops_tail() {
        let mut parser = Parser::new();
        let mut input = b"\x1b]2;".to_vec();
        input.extend(std::iter::repeat(b'x').take(MAX_STRING_LEN + 100));
        input.push(0x07);
        let actions = parser.parse_collect(&input);
        match &actions[0] {
            Action::Osc(OscAction::SetTitle(title)) => {
                assert_eq!(title.len(), MAX_STRING_LEN - 2);
            }
            other => panic!("expected title, got {:?}", other),
        }
    }

    #[test]
    fn test_csi_overflow_finalizes_early() {
        let mut parser = Parser::new();
        let mut input = b"\x1b[".to_vec();
        input.extend(std::iter::repeat(b'1').take(MAX_CSI_LEN + 10));
        input.extend_from_slice(b"m");
        let actions = parser.parse_collect(&input);
        // The sequence completed (with a bogus final byte) instead of
        // consuming the stream forever.
        assert!(!actions.is_empty());
        assert_eq!(parser.state(), ParserState::Ground);
    }

    #[test]
    fn test_parser_reset() {
        let mut parser = Parser::new();
        parser.parse_collect(b"\x1b[12");
        assert_eq!(parser.state(), ParserState::CsiParam);
        parser.reset();
        assert_eq!(parser.state(), ParserState::Ground);
        assert_eq!(parser.parse_collect(b"A"), vec![Action::Print('A')]);
    }
}
