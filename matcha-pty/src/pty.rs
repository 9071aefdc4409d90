//! PTY pair management
//!
//! `openpty` opens both ends at once (the master is not fully functional on
//! every platform until the slave exists). The master is wrapped in a
//! `File` for std I/O; the slave is handed to the child at spawn time.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::pty::openpty;
use nix::sys::termios::{self, SetArg, Termios};

use crate::error::{Error, Result};
use crate::size::WindowSize;

/// A pseudoterminal master plus the not-yet-claimed slave end
pub struct Pty {
    master: OwnedFd,
    /// Slave end; taken by `Child::spawn`, kept open otherwise
    slave: Option<OwnedFd>,
    /// File wrapper over a dup of the master for std Read/Write
    file: File,
}

impl Pty {
    /// Create a new PTY pair with an initial window size
    pub fn new(size: WindowSize) -> Result<Self> {
        let ws = nix::pty::Winsize {
            ws_row: size.rows,
            ws_col: size.cols,
            ws_xpixel: size.pixel_width,
            ws_ypixel: size.pixel_height,
        };
        let pair = openpty(Some(&ws), None::<&Termios>)?;
        let file = File::from(
            pair.master
                .try_clone()
                .map_err(|e| Error::PtyCreation(e.to_string()))?,
        );
        Ok(Self {
            master: pair.master,
            slave: Some(pair.slave),
            file,
        })
    }

    pub fn master_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }

    /// Take the slave end for a child process
    pub(crate) fn take_slave(&mut self) -> Option<OwnedFd> {
        self.slave.take()
    }

    /// Toggle O_NONBLOCK on the master
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        let fd = self.master.as_raw_fd();
        let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
        let flags = if nonblocking {
            flags | OFlag::O_NONBLOCK
        } else {
            flags & !OFlag::O_NONBLOCK
        };
        fcntl(fd, FcntlArg::F_SETFL(flags))?;
        Ok(())
    }

    /// Push the window size to the kernel (TIOCSWINSZ)
    pub fn set_window_size(&self, size: WindowSize) -> Result<()> {
        let ws = size.to_winsize();
        let rc = unsafe {
            libc::ioctl(
                self.master.as_raw_fd(),
                libc::TIOCSWINSZ as libc::c_ulong,
                &ws,
            )
        };
        if rc == -1 {
            Err(Error::WindowSize(io::Error::last_os_error().to_string()))
        } else {
            Ok(())
        }
    }

    /// Read the window size back (TIOCGWINSZ)
    pub fn window_size(&self) -> Result<WindowSize> {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let rc = unsafe {
            libc::ioctl(
                self.master.as_raw_fd(),
                libc::TIOCGWINSZ as libc::c_ulong,
                &mut ws,
            )
        };
        if rc == -1 {
            Err(Error::WindowSize(io::Error::last_os_error().to_string()))
        } else {
            Ok(WindowSize::from(ws))
        }
    }

    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }

    /// Read without blocking; 0 when nothing is available
    pub fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.file.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }
}

impl AsRawFd for Pty {
    fn as_raw_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }
}

impl AsFd for Pty {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.master.as_fd()
    }
}

/// Configure the slave termios for a raw-ish 8-bit-clean line discipline
pub(crate) fn configure_slave(fd: BorrowedFd<'_>) -> Result<()> {
    let mut tio = termios::tcgetattr(fd)?;
    tio.input_flags &= !(termios::InputFlags::IGNBRK
        | termios::InputFlags::BRKINT
        | termios::InputFlags::PARMRK
        | termios::InputFlags::ISTRIP
        | termios::InputFlags::INLCR
        | termios::InputFlags::IGNCR
        | termios::InputFlags::IXON);
    tio.output_flags |= termios::OutputFlags::OPOST | termios::OutputFlags::ONLCR;
    tio.control_flags &= !(termios::ControlFlags::CSIZE | termios::ControlFlags::PARENB);
    tio.control_flags |= termios::ControlFlags::CS8;
    tio.control_chars[termios::SpecialCharacterIndices::VMIN as usize] = 1;
    tio.control_chars[termios::SpecialCharacterIndices::VTIME as usize] = 0;
    termios::tcsetattr(fd, SetArg::TCSANOW, &tio)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pty_creation() {
        let pty = Pty::new(WindowSize::default());
        assert!(pty.is_ok());
    }

    #[test]
    fn test_pty_window_size() {
        let pty = Pty::new(WindowSize::default()).unwrap();
        pty.set_window_size(WindowSize::new(120, 40)).unwrap();
        let size = pty.window_size().unwrap();
        assert_eq!(size.cols, 120);
        assert_eq!(size.rows, 40);
    }

    #[test]
    fn test_pty_nonblocking() {
        let pty = Pty::new(WindowSize::default()).unwrap();
        assert!(pty.set_nonblocking(true).is_ok());
        assert!(pty.set_nonblocking(false).is_ok());
    }

    #[test]
    fn test_pty_try_read_empty() {
        let mut pty = Pty::new(WindowSize::default()).unwrap();
        pty.set_nonblocking(true).unwrap();
        let mut buf = [0u8; 64];
        assert_eq!(pty.try_read(&mut buf).unwrap(), 0);
    }
}
