//! Per-session output pump that reads interpreter output into the transcript.
//!
//! Each session gets its own dedicated OS thread because PTY reads are
//! blocking. The thread owns the reader and the display filter; it only
//! touches shared state when appending to the transcript, so a blocking read
//! never holds the transcript lock.

use std::io::{self, Read};
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tsrepl_ansi::OutputFilter;

use crate::session::SessionId;
use crate::transcript::SharedTranscript;

/// Start the read loop for a session on a dedicated OS thread.
pub fn start_output_pump(
    session_id: SessionId,
    program: String,
    reader: Box<dyn Read + Send>,
    transcript: SharedTranscript,
    filter: OutputFilter,
    mut stop_rx: mpsc::Receiver<()>,
) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name(format!("tsrepl-io-{session_id}"))
        .spawn(move || {
            pump_loop(&program, reader, &transcript, filter, &mut stop_rx);
        })
}

fn pump_loop(
    program: &str,
    mut reader: Box<dyn Read + Send>,
    transcript: &SharedTranscript,
    mut filter: OutputFilter,
    stop_rx: &mut mpsc::Receiver<()>,
) {
    let mut buf = [0u8; 65536];
    let mut decoder = Utf8Decoder::default();

    loop {
        match stop_rx.try_recv() {
            Ok(()) => return,
            Err(mpsc::error::TryRecvError::Disconnected) => return,
            Err(mpsc::error::TryRecvError::Empty) => {}
        }

        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            // A PTY reports EIO once the child side has closed.
            Err(e) => {
                log::debug!("output pump for {program} stopped: {e}");
                break;
            }
        };

        let text = decoder.decode(&buf[..n]);
        let spans = filter.filter(&text);
        transcript.lock().append(spans);
    }

    let tail = decoder.finish();
    let mut transcript = transcript.lock();
    if !tail.is_empty() {
        transcript.append(filter.filter(&tail));
    }
    transcript.append_text(&format!("\nProcess {program} finished\n"));
    log::info!("{program} exited");
}

/// Decodes a byte stream as UTF-8, holding back a multi-byte sequence that
/// is split across two reads.
#[derive(Default)]
pub(crate) struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub(crate) fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // valid_up_to guarantees this prefix is UTF-8.
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = rest.to_vec();
        out
    }

    /// Flush whatever is still held back, lossily.
    pub(crate) fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).to_string();
        self.pending.clear();
        tail
    }
}
