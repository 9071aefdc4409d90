//! The PTY pump
//!
//! Reads child output into the terminal and writes input back. Writes go
//! out in small chunks; while the kernel PTY buffer is full, readable
//! bytes are drained through the parser so the child can make progress.
//! Input ordering is preserved: a partial write never reorders bytes.

use std::io::ErrorKind;
use std::os::fd::AsFd;

use log::debug;
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};

use matcha_parser::{Utf8Decoder, Utf8Result};
use matcha_pty::{Child, Error, ExitStatus, Result, WindowSize};

use crate::config::Config;
use crate::terminal::Terminal;

/// Read buffer size
const READ_BUF_SIZE: usize = 8192;
/// Initial write chunk; writing more at once can clog the line
const WRITE_CHUNK: usize = 256;

/// A child shell attached to a terminal
pub struct Tty {
    child: Child,
    buf: [u8; READ_BUF_SIZE],
}

impl Tty {
    /// Spawn the configured shell
    pub fn spawn(config: &Config) -> Result<Self> {
        let size = WindowSize::new(config.cols as u16, config.rows as u16);
        let child = Child::spawn(config.shell.as_deref(), &config.term, size)?;
        Ok(Self {
            child,
            buf: [0; READ_BUF_SIZE],
        })
    }

    pub fn child(&self) -> &Child {
        &self.child
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.child.set_nonblocking(nonblocking)
    }

    /// Read once from the PTY and feed the terminal. Returns the number of
    /// bytes consumed; 0 means nothing was available (or EOF). Partial
    /// UTF-8 tails are carried over inside the parser.
    pub fn read(&mut self, term: &mut Terminal) -> Result<usize> {
        let n = match self.child.read(&mut self.buf) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(0),
            Err(e) if e.kind() == ErrorKind::Interrupted => return Ok(0),
            Err(e) => return Err(Error::Io(e)),
        };
        term.process(&self.buf[..n]);
        if term.has_responses() {
            let responses = term.take_responses();
            self.write(&responses, term)?;
        }
        Ok(n)
    }

    /// Write bytes to the child, draining its output while the kernel
    /// buffer is full.
    pub fn write(&mut self, data: &[u8], term: &mut Terminal) -> Result<()> {
        let mut rest = data;
        let mut limit = WRITE_CHUNK;

        while !rest.is_empty() {
            let (readable, writable) = {
                let fd = self.child.pty().as_fd();
                let mut fds = [PollFd::new(&fd, PollFlags::POLLIN | PollFlags::POLLOUT)];
                match poll(&mut fds, -1) {
                    Ok(_) => {}
                    Err(Errno::EINTR) => continue,
                    Err(e) => return Err(e.into()),
                }
                let revents = fds[0].revents().unwrap_or(PollFlags::empty());
                (
                    revents.contains(PollFlags::POLLIN),
                    revents.contains(PollFlags::POLLOUT),
                )
            };

            if writable {
                let chunk = limit.min(rest.len());
                match self.child.write(&rest[..chunk]) {
                    Ok(written) if written < rest.len() => {
                        // The kernel buffer is filling up; make room by
                        // consuming child output before continuing.
                        if rest.len() < limit {
                            let n = self.read(term)?;
                            if n > 0 {
                                limit = n;
                            }
                        }
                        rest = &rest[written..];
                    }
                    Ok(_) => break,
                    Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => return Err(Error::PtyWrite(e)),
                }
            }
            if readable {
                let n = self.read(term)?;
                if n > 0 {
                    limit = n;
                }
            }
        }
        Ok(())
    }

    /// Write bytes and locally echo them when SRM echo is on
    pub fn send(&mut self, data: &[u8], term: &mut Terminal) -> Result<()> {
        self.write(data, term)?;
        if !term.screen().modes().echo {
            return Ok(());
        }

        if term.screen().modes().utf8 && !term.screen().modes().sixel {
            let mut decoder = Utf8Decoder::new();
            for &byte in data {
                match decoder.feed(byte) {
                    Utf8Result::Char(c) => term.echo(c),
                    Utf8Result::Invalid => term.echo('\u{FFFD}'),
                    Utf8Result::Pending => {}
                }
            }
        } else {
            for &byte in data {
                term.echo(byte as char);
            }
        }
        Ok(())
    }

    /// Resize terminal and kernel PTY together
    pub fn resize(&mut self, term: &mut Terminal, cols: usize, rows: usize) -> Result<()> {
        term.resize(cols, rows);
        self.child.resize(WindowSize::new(cols as u16, rows as u16))
    }

    /// Non-blocking child exit check
    pub fn try_wait(&self) -> Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if let Some(status) = status {
            debug!("child exited: {:?}", status);
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn shell_config(script: &str) -> Config {
        Config {
            cols: 40,
            rows: 10,
            shell: Some(vec![
                "/bin/sh".to_string(),
                "-c".to_string(),
                script.to_string(),
            ]),
            ..Config::default()
        }
    }

    fn pump_until(
        tty: &mut Tty,
        term: &mut Terminal,
        deadline: Duration,
        done: impl Fn(&Terminal) -> bool,
    ) {
        let end = Instant::now() + deadline;
        while Instant::now() < end && !done(term) {
            match tty.read(term) {
                Ok(0) => std::thread::sleep(Duration::from_millis(5)),
                Ok(_) => {}
                Err(_) => break,
            }
        }
    }

    #[test]
    fn test_child_output_reaches_screen() {
        let config = shell_config("printf 'marker'");
        let mut term = Terminal::with_config(&config);
        let mut tty = Tty::spawn(&config).expect("spawn failed");
        tty.set_nonblocking(true).unwrap();

        pump_until(&mut tty, &mut term, Duration::from_secs(5), |t| {
            t.screen().line(0).text().contains("marker")
        });
        assert!(term.screen().line(0).text().contains("marker"));
    }

    #[test]
    fn test_write_reaches_child() {
        // cat echoes what we write back through the PTY.
        let config = shell_config("cat");
        let mut term = Terminal::with_config(&config);
        let mut tty = Tty::spawn(&config).expect("spawn failed");
        tty.set_nonblocking(true).unwrap();

        tty.write(b"ping\r", &mut term).unwrap();
        pump_until(&mut tty, &mut term, Duration::from_secs(5), |t| {
            t.screen().line(0).text().contains("ping")
        });
        assert!(term.screen().line(0).text().contains("ping"));
        let _ = tty.child().signal(nix::sys::signal::Signal::SIGTERM);
    }

    #[test]
    fn test_send_echoes_locally() {
        let config = shell_config("sleep 5");
        let mut term = Terminal::with_config(&config);
        let mut tty = Tty::spawn(&config).expect("spawn failed");
        tty.set_nonblocking(true).unwrap();

        // RM 12 turns local echo on.
        term.process(b"\x1b[12l");
        tty.send(b"hi", &mut term).unwrap();
        assert_eq!(term.screen().line(0).text(), "hi");
        let _ = tty.child().signal(nix::sys::signal::Signal::SIGTERM);
    }
}
