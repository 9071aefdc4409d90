//! Semantic actions produced by the parser

use crate::params::Params;

/// Actions produced by the parser
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Print a character at the cursor
    Print(char),

    /// Execute a C0 or C1 control
    Control(u8),

    /// Non-CSI escape sequence
    Esc(EscAction),

    /// Control Sequence Introducer
    Csi(CsiAction),

    /// Operating System Command
    Osc(OscAction),

    /// Legacy title sequence (`ESC k ... ST`)
    Title(String),

    /// A DCS final byte arrived; payload follows until ST
    DcsHook { params: Params, final_byte: u8 },

    /// The DCS payload terminated
    DcsUnhook,

    /// Application Program Command, consumed and ignored
    Apc(Vec<u8>),

    /// Privacy Message, consumed and ignored
    Pm(Vec<u8>),
}

/// Non-CSI escape sequences
#[derive(Debug, Clone, PartialEq)]
pub enum EscAction {
    /// ESC 7 - save cursor (DECSC)
    SaveCursor,
    /// ESC 8 - restore cursor (DECRC)
    RestoreCursor,
    /// ESC D - index (IND)
    Index,
    /// ESC E - next line (NEL)
    NextLine,
    /// ESC M - reverse index (RI)
    ReverseIndex,
    /// ESC H - set tab stop (HTS)
    TabSet,
    /// ESC Z - identify terminal (DECID)
    IdentifyTerminal,
    /// ESC c - full reset (RIS)
    FullReset,
    /// ESC = / ESC > - application/normal keypad
    AppKeypad(bool),
    /// ESC ( ) * + - designate a charset slot
    DesignateCharset { slot: usize, designator: char },
    /// ESC n / ESC o - locking shift G2/G3
    LockingShift(usize),
    /// ESC % G / ESC % @ - UTF-8 on/off
    Utf8Charset(bool),
    /// ESC # 8 - DEC screen alignment test (DECALN)
    AlignmentTest,
    /// Anything else; logged and dropped
    Unknown(Vec<u8>),
}

/// A complete CSI sequence
#[derive(Debug, Clone, PartialEq)]
pub struct CsiAction {
    /// Numeric parameters
    pub params: Params,
    /// Intermediate bytes (0x20-0x2F)
    pub intermediates: Vec<u8>,
    /// Final byte (0x40-0x7E)
    pub final_byte: u8,
    /// True when the sequence opened with `?`
    pub private: bool,
    /// The raw marker byte: 0 for none, or one of `? > < =`
    pub marker: u8,
}

impl CsiAction {
    /// Re-serialize to the byte form the parser consumed, for diagnostics
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0x1B, b'['];
        if self.marker != 0 {
            out.push(self.marker);
        }
        let args: Vec<String> = self.params.iter().map(|v| v.to_string()).collect();
        out.extend_from_slice(args.join(";").as_bytes());
        out.extend_from_slice(&self.intermediates);
        out.push(self.final_byte);
        out
    }
}

/// Operating System Commands the terminal understands
#[derive(Debug, Clone, PartialEq)]
pub enum OscAction {
    /// OSC 0/1/2 - set the window title
    SetTitle(String),
    /// OSC 4 - set a palette entry to an XParseColor-style spec
    SetColor { index: i32, spec: String },
    /// OSC 104 - reset one palette entry, or all when None
    ResetColor(Option<i32>),
    /// OSC 52 - set the clipboard from a base64 payload
    Clipboard(String),
    /// Anything else; logged and dropped
    Unknown { command: i32, raw: String },
}
