use tsrepl_ansi::DisplayMode;

use crate::session::SessionId;
use crate::transcript::SharedTranscript;

/// What the host needs to display a session buffer.
#[derive(Clone, Debug)]
pub struct SessionBuffer {
    pub name: String,
    pub session_id: SessionId,
    pub transcript: SharedTranscript,
    pub mode: DisplayMode,
}

/// The editor side of the system.
///
/// Positions are character offsets into the current buffer, starting at 0.
pub trait Host {
    /// Create or replace the display buffer for a freshly spawned session.
    /// This is where a host installs session-local key bindings.
    fn attach_session_buffer(&mut self, buffer: SessionBuffer);

    fn buffer_exists(&self, name: &str) -> bool;

    /// Show `name` and make it the current buffer.
    fn focus_buffer(&mut self, name: &str);

    /// Remember the current location so the user can return to it.
    fn push_mark(&mut self);

    /// Move the cursor to the end of the current buffer.
    fn goto_end(&mut self);

    /// Cursor position in the current buffer.
    fn point(&self) -> usize;

    /// Text between two positions of the current buffer.
    fn region_text(&self, start: usize, end: usize) -> String;

    /// Start and end positions of the current buffer.
    fn buffer_bounds(&self) -> (usize, usize);

    /// Position of the start of the line containing `pos`.
    fn line_start(&self, pos: usize) -> usize;

    /// Start of the balanced expression ending before `pos`, if any.
    fn backward_expression(&self, pos: usize) -> Option<usize>;
}
