use crate::render::AnsiRenderer;
use crate::strip::strip_cursor_codes;
use crate::style::StyledSpan;

/// Environment variable that makes a Node-based interpreter skip its own
/// readline echo and prompt redrawing.
pub const NO_READLINE_ENV: &str = "NODE_NO_READLINE";

/// How a session's output is prepared for display. Fixed at spawn time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    /// Strip cursor codes, then render SGR colors.
    Ansi,
    /// No filtering; the interpreter is told not to use readline instead.
    Plain,
}

impl DisplayMode {
    pub fn from_ansi_color(enabled: bool) -> Self {
        if enabled {
            DisplayMode::Ansi
        } else {
            DisplayMode::Plain
        }
    }

    /// Environment the interpreter must be spawned with for this mode.
    ///
    /// Only `Plain` sets anything; the two fallbacks are never combined.
    pub fn spawn_env(self) -> Vec<(String, String)> {
        match self {
            DisplayMode::Ansi => Vec::new(),
            DisplayMode::Plain => vec![(NO_READLINE_ENV.to_string(), "1".to_string())],
        }
    }
}

/// The output hook installed on a session buffer.
///
/// Receives each chunk of raw interpreter output and returns what should be
/// appended to the display buffer.
pub enum OutputFilter {
    Ansi(AnsiRenderer),
    Plain,
}

impl OutputFilter {
    pub fn new(mode: DisplayMode) -> Self {
        match mode {
            DisplayMode::Ansi => OutputFilter::Ansi(AnsiRenderer::new()),
            DisplayMode::Plain => OutputFilter::Plain,
        }
    }

    /// Transform one chunk of output.
    pub fn filter(&mut self, chunk: &str) -> Vec<StyledSpan> {
        match self {
            OutputFilter::Ansi(renderer) => {
                let stripped = strip_cursor_codes(chunk);
                renderer.render(stripped.as_bytes())
            }
            OutputFilter::Plain if chunk.is_empty() => Vec::new(),
            OutputFilter::Plain => vec![StyledSpan::plain(chunk)],
        }
    }
}
