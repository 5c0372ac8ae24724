use std::io::{Read, Write};

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};

use crate::error::SessionError;
use crate::process::{LaunchRequest, Launcher, Process};

/// Owns a portable-pty child process, master side, reader, and writer.
///
/// Dropping the handle kills the child.
pub struct PtyHandle {
    // Kept so the PTY stays open for as long as the handle lives.
    _master: Box<dyn MasterPty + Send>,
    reader: Option<Box<dyn Read + Send>>,
    writer: Box<dyn Write + Send>,
    child: Box<dyn Child + Send + Sync>,
    exit_code: Option<u32>,
}

impl PtyHandle {
    /// Spawn `request.program` with its arguments and environment in a new PTY.
    pub fn spawn(request: &LaunchRequest, cols: u16, rows: u16) -> Result<Self, SessionError> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| SessionError::Spawn(format!("failed to open PTY: {e}")))?;

        let mut cmd = CommandBuilder::new(&request.program);
        cmd.args(&request.args);
        for (key, value) in &request.env {
            cmd.env(key, value);
        }
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let child = pair.slave.spawn_command(cmd).map_err(|e| {
            SessionError::Spawn(format!("failed to spawn {}: {e}", request.program))
        })?;

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| SessionError::Spawn(format!("failed to clone reader: {e}")))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| SessionError::Spawn(format!("failed to take writer: {e}")))?;

        Ok(Self {
            _master: pair.master,
            reader: Some(reader),
            writer,
            child,
            exit_code: None,
        })
    }

    fn poll_exit(&mut self) -> Option<u32> {
        if self.exit_code.is_none() {
            if let Ok(Some(status)) = self.child.try_wait() {
                self.exit_code = Some(status.exit_code());
            }
        }
        self.exit_code
    }
}

impl Process for PtyHandle {
    fn write(&mut self, data: &[u8]) -> Result<(), SessionError> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        Ok(())
    }

    fn is_alive(&mut self) -> bool {
        self.poll_exit().is_none()
    }

    fn exit_code(&mut self) -> Option<u32> {
        self.poll_exit()
    }

    fn take_reader(&mut self) -> Option<Box<dyn Read + Send>> {
        self.reader.take()
    }

    fn pid(&self) -> Option<u32> {
        self.child.process_id()
    }
}

impl Drop for PtyHandle {
    fn drop(&mut self) {
        if self.poll_exit().is_none() {
            if let Err(e) = self.child.kill() {
                log::debug!("failed to kill interpreter: {e}");
            }
            let _ = self.child.wait();
        }
    }
}

/// Launches interpreters inside pseudo-terminals.
#[derive(Clone, Copy, Debug)]
pub struct PtyLauncher {
    pub cols: u16,
    pub rows: u16,
}

impl Default for PtyLauncher {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}

impl Launcher for PtyLauncher {
    fn launch(&self, request: &LaunchRequest) -> Result<Box<dyn Process>, SessionError> {
        let handle = PtyHandle::spawn(request, self.cols, self.rows)?;
        log::info!(
            "spawned {} (pid {:?}) for {}",
            request.program,
            handle.pid(),
            request.buffer
        );
        Ok(Box::new(handle))
    }
}
