use serde::{Deserialize, Serialize};

/// Launcher used when nothing else is configured.
pub const DEFAULT_PROGRAM: &str = "tsun";

/// Name of the display buffer a session is attached to.
pub const DEFAULT_BUFFER_NAME: &str = "*Typescript*";

/// Seeds the next interpreter spawn.
///
/// Changing a config never touches a session that is already running; only
/// the next spawn reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Interpreter launcher.
    pub program: String,
    /// Arguments passed to `program`, in order.
    pub args: Vec<String>,
    /// Render ANSI colors in the session buffer. When off, the interpreter
    /// is asked to disable readline instead.
    pub ansi_color: bool,
    pub buffer_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: Vec::new(),
            ansi_color: true,
            buffer_name: DEFAULT_BUFFER_NAME.to_string(),
        }
    }
}

impl SessionConfig {
    /// Split a full command line into program and arguments on whitespace.
    ///
    /// Returns `None` for a blank line.
    pub fn split_command_line(line: &str) -> Option<(String, Vec<String>)> {
        let mut words = line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some((program, words.collect()))
    }

    /// Copy of this config with program and arguments taken from `line`.
    ///
    /// Returns `None` for a blank line.
    pub fn with_command_line(&self, line: &str) -> Option<Self> {
        let (program, args) = Self::split_command_line(line)?;
        Some(Self {
            program,
            args,
            ..self.clone()
        })
    }

    /// The program and arguments joined back into one line, for display.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
