use tokio::sync::mpsc;
use tsrepl_ansi::{DisplayMode, OutputFilter};

use crate::error::SessionError;
use crate::process::Process;
use crate::pump::start_output_pump;
use crate::transcript::SharedTranscript;

/// Per-registry spawn counter; distinguishes a respawned session from the
/// one it replaced even though both use the same buffer.
pub type SessionId = u64;

/// Identifies one interpreter process and the buffer it is attached to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    pub id: SessionId,
    pub buffer: String,
}

/// A running interpreter paired with the transcript its output feeds.
pub struct InterpreterSession {
    handle: SessionHandle,
    process: Box<dyn Process>,
    transcript: SharedTranscript,
    stop_tx: Option<mpsc::Sender<()>>,
}

impl InterpreterSession {
    /// Wrap a freshly launched process and start pumping its output.
    ///
    /// Processes without a reader get no pump; their transcript stays empty.
    pub fn start(
        handle: SessionHandle,
        program: &str,
        mut process: Box<dyn Process>,
        mode: DisplayMode,
    ) -> Result<Self, SessionError> {
        let transcript = SharedTranscript::new();

        let stop_tx = match process.take_reader() {
            Some(reader) => {
                let (stop_tx, stop_rx) = mpsc::channel::<()>(1);
                start_output_pump(
                    handle.id,
                    program.to_string(),
                    reader,
                    transcript.clone(),
                    OutputFilter::new(mode),
                    stop_rx,
                )?;
                Some(stop_tx)
            }
            None => None,
        };

        Ok(Self {
            handle,
            process,
            transcript,
            stop_tx,
        })
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn transcript(&self) -> &SharedTranscript {
        &self.transcript
    }

    /// Check if the interpreter is still running.
    pub fn is_alive(&mut self) -> bool {
        self.process.is_alive()
    }

    pub fn exit_code(&mut self) -> Option<u32> {
        self.process.exit_code()
    }

    /// Write raw bytes to the interpreter input.
    pub fn write_input(&mut self, data: &[u8]) -> Result<(), SessionError> {
        self.process.write(data)
    }
}

impl Drop for InterpreterSession {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // Full or closed both mean the pump is already on its way out.
            let _ = tx.try_send(());
        }
    }
}
