//! Matcha Parser - Terminal escape sequence parser
//!
//! Converts the raw PTY byte stream into semantic actions:
//! - Streaming UTF-8 decoding with replacement-character error handling
//! - C0/C1 control dispatch
//! - ESC, CSI, OSC, DCS, APC, PM and legacy-title sequences
//! - Sixel payload detection and discard
//!
//! The parser holds all cross-chunk state (partial UTF-8 sequences,
//! half-collected escapes), so callers can feed bytes in arbitrary chunks.

mod action;
mod params;
mod parser;
mod utf8;

pub use action::{Action, CsiAction, EscAction, OscAction};
pub use params::Params;
pub use parser::{Parser, ParserState};
pub use utf8::{encode_utf8, Utf8Decoder, Utf8Result};
