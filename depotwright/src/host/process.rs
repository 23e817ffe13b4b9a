//! Launching setup processes.

use std::io;
use std::path::Path;
use std::process::{Child, Command};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::HostError;

const POLL_STEP: Duration = Duration::from_millis(20);

/// A running process started by a [`ProcessLauncher`].
pub trait ProcessHandle: Send {
    /// Waits up to `timeout` for the process to exit. Returns `true` once it
    /// has exited.
    fn wait_timeout(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Exit code after the process exited; `None` while running or when it was
    /// terminated by a signal.
    fn exit_code(&self) -> Option<i32>;

    /// Terminates the process.
    fn kill(&mut self) -> io::Result<()>;
}

/// Starts processes for install scripts.
pub trait ProcessLauncher: Send + Sync {
    /// Starts `image` with an optional command line.
    fn start(&self, image: &Path, args: Option<&str>) -> Result<Box<dyn ProcessHandle>, HostError>;
}

/// Launches real processes through `std::process`.
///
/// The command line is split with shell quoting rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessLauncher;

impl ProcessLauncher for SystemProcessLauncher {
    fn start(&self, image: &Path, args: Option<&str>) -> Result<Box<dyn ProcessHandle>, HostError> {
        let args = match args {
            Some(line) => shell_words::split(line).map_err(|e| HostError::Spawn {
                image: image.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, e.to_string()),
            })?,
            None => Vec::new(),
        };

        let mut command = Command::new(image);
        command.args(&args);
        if let Some(dir) = image.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            command.current_dir(dir);
        }

        debug!(image = %image.display(), ?args, "Starting process");
        let child = command.spawn().map_err(|source| HostError::Spawn {
            image: image.to_path_buf(),
            source,
        })?;

        Ok(Box::new(SystemProcess {
            child,
            exit_code: None,
        }))
    }
}

struct SystemProcess {
    child: Child,
    exit_code: Option<i32>,
}

impl ProcessHandle for SystemProcess {
    fn wait_timeout(&mut self, timeout: Duration) -> io::Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                self.exit_code = status.code();
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            thread::sleep(POLL_STEP.min(deadline - now));
        }
    }

    fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    fn kill(&mut self) -> io::Result<()> {
        self.child.kill()?;
        let status = self.child.wait()?;
        self.exit_code = status.code();
        Ok(())
    }
}
