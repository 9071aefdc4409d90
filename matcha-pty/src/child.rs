//! Child process management
//!
//! Spawns the user's shell (or an explicit command) on the slave side of a
//! PTY: fork, new session, controlling terminal, stdio redirection, exec.

use std::env;
use std::ffi::CString;
use std::os::fd::{AsFd, AsRawFd};

use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{dup2, execvp, fork, setsid, ForkResult, Pid, Uid, User};

use crate::error::{Error, Result};
use crate::pty::{configure_slave, Pty};
use crate::size::WindowSize;

/// How a child ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Normal exit with a status code
    Exited(i32),
    /// Terminated by a signal
    Signaled(i32),
}

/// A child process attached to a PTY
pub struct Child {
    pty: Pty,
    pid: Pid,
}

impl Child {
    /// Spawn `command` (or the user's shell when None) on a fresh PTY.
    /// `term_name` is exported as `$TERM`.
    pub fn spawn(command: Option<&[String]>, term_name: &str, size: WindowSize) -> Result<Self> {
        let mut pty = Pty::new(size)?;
        let slave = pty
            .take_slave()
            .ok_or_else(|| Error::SpawnFailed("slave already taken".to_string()))?;

        let shell = default_shell();
        let argv: Vec<CString> = match command {
            Some(args) if !args.is_empty() => args
                .iter()
                .map(|a| CString::new(a.as_str()))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::SpawnFailed(e.to_string()))?,
            _ => vec![CString::new(shell.as_str())
                .map_err(|e| Error::SpawnFailed(e.to_string()))?],
        };

        match unsafe { fork() }? {
            ForkResult::Parent { child } => {
                drop(slave);
                Ok(Self { pty, pid: child })
            }
            ForkResult::Child => {
                // Only async-signal-safe-ish work from here to exec.
                if setsid().is_err() {
                    std::process::exit(1);
                }
                let slave_fd = slave.as_raw_fd();
                unsafe {
                    if libc::ioctl(slave_fd, libc::TIOCSCTTY as libc::c_ulong, 0) < 0 {
                        std::process::exit(1);
                    }
                }
                if configure_slave(slave.as_fd()).is_err() {
                    std::process::exit(1);
                }
                for target in 0..3 {
                    if dup2(slave_fd, target).is_err() {
                        std::process::exit(1);
                    }
                }
                drop(slave);

                env::remove_var("COLUMNS");
                env::remove_var("LINES");
                env::remove_var("TERMCAP");
                env::set_var("TERM", term_name);
                env::set_var("SHELL", &shell);

                let _ = execvp(&argv[0], &argv);
                std::process::exit(1);
            }
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn pty(&self) -> &Pty {
        &self.pty
    }

    pub fn pty_mut(&mut self) -> &mut Pty {
        &mut self.pty
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.pty.set_nonblocking(nonblocking)
    }

    /// Propagate a resize to the kernel and thus SIGWINCH to the child
    pub fn resize(&self, size: WindowSize) -> Result<()> {
        self.pty.set_window_size(size)
    }

    pub fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.pty.read(buf)
    }

    pub fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pty.write(buf)
    }

    /// Check for child exit without blocking
    pub fn try_wait(&self) -> Result<Option<ExitStatus>> {
        match waitpid(self.pid, Some(WaitPidFlag::WNOHANG))? {
            WaitStatus::StillAlive => Ok(None),
            WaitStatus::Exited(_, code) => Ok(Some(ExitStatus::Exited(code))),
            WaitStatus::Signaled(_, signal, _) => Ok(Some(ExitStatus::Signaled(signal as i32))),
            _ => Ok(None),
        }
    }

    /// Send a signal to the child
    pub fn signal(&self, signal: Signal) -> Result<()> {
        kill(self.pid, signal)?;
        Ok(())
    }
}

impl Drop for Child {
    fn drop(&mut self) {
        // Reap if already gone; otherwise hang up like a closing terminal.
        if let Ok(Some(_)) = self.try_wait() {
            return;
        }
        let _ = kill(self.pid, Signal::SIGHUP);
        let _ = waitpid(self.pid, Some(WaitPidFlag::WNOHANG));
    }
}

/// The user's preferred shell: $SHELL, then the passwd entry, then /bin/sh
fn default_shell() -> String {
    if let Ok(shell) = env::var("SHELL") {
        if !shell.is_empty() {
            return shell;
        }
    }
    if let Ok(Some(user)) = User::from_uid(Uid::current()) {
        let shell = user.shell.to_string_lossy();
        if !shell.is_empty() {
            return shell.into_owned();
        }
    }
    "/bin/sh".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use std::time::{Duration, Instant};

    #[test]
    fn test_default_shell_nonempty() {
        assert!(!default_shell().is_empty());
    }

    #[test]
    fn test_spawn_echo() {
        let command = vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            "printf hello".to_string(),
        ];
        let mut child =
            Child::spawn(Some(&command), "dumb", WindowSize::default()).expect("spawn failed");
        child.set_nonblocking(true).unwrap();

        let mut collected = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut buf = [0u8; 256];
        while Instant::now() < deadline && !collected.windows(5).any(|w| w == b"hello") {
            match child.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => collected.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(10))
                }
                // EIO means the child closed its side.
                Err(_) => break,
            }
        }
        assert!(collected.windows(5).any(|w| w == b"hello"));
    }

    #[test]
    fn test_try_wait_reports_exit() {
        let command = vec!["/bin/true".to_string()];
        let child = Child::spawn(Some(&command), "dumb", WindowSize::default()).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match child.try_wait().unwrap() {
                Some(status) => {
                    assert_eq!(status, ExitStatus::Exited(0));
                    break;
                }
                None if Instant::now() > deadline => panic!("child never exited"),
                None => std::thread::sleep(Duration::from_millis(10)),
            }
        }
    }
}
