use std::io::Read;

use crate::error::SessionError;

/// Everything the process-creation facility needs to start an interpreter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchRequest {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables, applied on top of the inherited environment.
    pub env: Vec<(String, String)>,
    /// Display buffer the process is attached to.
    pub buffer: String,
}

/// A running interpreter process.
pub trait Process {
    /// Write raw bytes to the process input.
    fn write(&mut self, data: &[u8]) -> Result<(), SessionError>;

    /// Whether the OS process is still running.
    fn is_alive(&mut self) -> bool;

    /// Exit code once the process has exited.
    fn exit_code(&mut self) -> Option<u32>;

    /// Hand the output reader to a dedicated thread. Returns `None` once
    /// taken, or for processes without readable output.
    fn take_reader(&mut self) -> Option<Box<dyn Read + Send>>;

    fn pid(&self) -> Option<u32>;
}

/// Creates interpreter processes.
pub trait Launcher {
    fn launch(&self, request: &LaunchRequest) -> Result<Box<dyn Process>, SessionError>;
}
