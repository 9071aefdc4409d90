//! Matcha PTY - Unix pseudoterminal plumbing
//!
//! This crate owns everything that touches the kernel TTY layer:
//! - PTY pair creation via `openpty`
//! - Child process spawning with session/controlling-terminal setup
//! - Window size ioctls (TIOCGWINSZ / TIOCSWINSZ)
//! - Non-blocking master I/O
//!
//! Reference: <https://man7.org/linux/man-pages/man3/openpty.3.html>

mod child;
mod error;
mod pty;
mod size;

pub use child::{Child, ExitStatus};
pub use error::{Error, Result};
pub use pty::Pty;
pub use size::WindowSize;
