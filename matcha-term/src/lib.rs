//! Matcha Term - the terminal emulator core
//!
//! Glues the escape parser (`matcha-parser`) to the screen model
//! (`matcha-core`) and the PTY (`matcha-pty`):
//! - `Terminal`: applies parsed actions to the screen, queues device
//!   replies, surfaces title/bell/clipboard changes, mirrors to a printer
//!   sink, and echoes local input
//! - `Tty`: the read/write pump with write backpressure
//! - input encodings for mouse, focus, and bracketed paste
//! - TOML configuration
//!
//! The display layer (fonts, windows, clipboard ownership, key tables)
//! lives outside this workspace and talks to these types.

pub mod config;
pub mod input;
mod terminal;
mod tty;

pub use config::Config;
pub use terminal::Terminal;
pub use tty::Tty;
