//! Error types for PTY operations

use std::io;
use thiserror::Error;

/// PTY error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error on the master side
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// PTY pair creation failed
    #[error("failed to create PTY: {0}")]
    PtyCreation(String),

    /// Child process could not be spawned
    #[error("failed to spawn child: {0}")]
    SpawnFailed(String),

    /// Window size ioctl failed
    #[error("failed to set window size: {0}")]
    WindowSize(String),

    /// Write to the child blocked and could not complete
    #[error("write error on tty: {0}")]
    PtyWrite(io::Error),

    /// Underlying system call failure
    #[error("system error: {0}")]
    Nix(#[from] nix::Error),
}

/// Result type for PTY operations
pub type Result<T> = std::result::Result<T, Error>;
