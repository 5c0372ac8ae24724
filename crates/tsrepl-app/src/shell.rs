//! Line-oriented driver: each input line is one editor command.

use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tsrepl_ansi::{paint, ColorDepth, StyledSpan};
use tsrepl_dispatch::Dispatcher;
use tsrepl_session::{Host, MemoryHost, SessionId, SessionManager};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// Time the output pump gets to append the exit notice.
const EXIT_GRACE: Duration = Duration::from_millis(200);

pub const HELP: &str = "\
commands (append ! to send/region/last/buffer/load to also focus the session):
  run [command line]    start the interpreter, or reuse the live one
  send <text>           send text
  open <file>           open a file as the current buffer
  goto <pos>            move the cursor in the current buffer
  region <start> <end>  send part of the current buffer
  last                  send the expression before the cursor
  buffer                send the whole current buffer
  load <file>           import a file as a module
  switch                focus the session buffer
  show                  print the session buffer
  help                  this text
  quit                  leave";

/// One parsed input line.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Run(Option<String>),
    Send { text: String, focus: bool },
    Open(PathBuf),
    Goto(usize),
    Region { start: usize, end: usize, focus: bool },
    Last { focus: bool },
    Buffer { focus: bool },
    Load { path: PathBuf, focus: bool },
    Switch,
    Show,
    Help,
    Quit,
}

impl Command {
    /// Parse a line; `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim_start();
        if line.trim().is_empty() {
            return Ok(None);
        }
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let (name, focus) = match word.strip_suffix('!') {
            Some(name) => (name, true),
            None => (word, false),
        };
        let arg = rest.trim();

        let command = match (name, focus) {
            ("run", false) => Command::Run((!arg.is_empty()).then(|| arg.to_string())),
            // Leading blanks only separate the text from the command word.
            ("send", _) => Command::Send {
                text: rest.trim_start().to_string(),
                focus,
            },
            ("open", false) => Command::Open(required_path(arg, "open")?),
            ("goto", false) => Command::Goto(
                arg.parse()
                    .with_context(|| format!("goto: invalid position {arg:?}"))?,
            ),
            ("region", _) => {
                let mut bounds = arg.split_whitespace().map(str::parse::<usize>);
                match (bounds.next(), bounds.next(), bounds.next()) {
                    (Some(Ok(start)), Some(Ok(end)), None) => Command::Region { start, end, focus },
                    _ => bail!("region: expected two positions"),
                }
            }
            ("last", _) => Command::Last { focus },
            ("buffer", _) => Command::Buffer { focus },
            ("load", _) => Command::Load {
                path: required_path(arg, "load")?,
                focus,
            },
            ("switch", false) => Command::Switch,
            ("show", false) => Command::Show,
            ("help", false) => Command::Help,
            ("quit" | "exit", false) => Command::Quit,
            _ => bail!("unknown command: {word} (try `help`)"),
        };
        Ok(Some(command))
    }

    /// Whether running this command may make the interpreter print.
    fn writes_input(&self) -> bool {
        matches!(
            self,
            Command::Run(_)
                | Command::Send { .. }
                | Command::Region { .. }
                | Command::Last { .. }
                | Command::Buffer { .. }
                | Command::Load { .. }
        )
    }
}

fn required_path(arg: &str, command: &str) -> Result<PathBuf> {
    if arg.is_empty() {
        bail!("{command}: expected a file name");
    }
    Ok(PathBuf::from(arg))
}

/// Whether the loop should keep reading.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// How long the shell waits for interpreter output.
#[derive(Clone, Copy, Debug)]
pub struct Timing {
    /// Upper bound on the wait after a command that writes to the session.
    pub reply: Duration,
    /// Upper bound on the wait once input has ended.
    pub drain: Duration,
    /// Output that has been silent this long counts as complete.
    pub quiet: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            reply: Duration::from_millis(500),
            drain: Duration::from_secs(3),
            quiet: Duration::from_millis(150),
        }
    }
}

/// Couples a session manager with an in-memory editor.
pub struct Shell {
    manager: SessionManager,
    host: MemoryHost,
    /// Session and character offset of the output already echoed.
    echoed: Option<(SessionId, usize)>,
    /// When output was last echoed.
    last_output: Option<Instant>,
    /// Repaint colors with this depth; `None` echoes bare text.
    paint: Option<ColorDepth>,
    timing: Timing,
}

impl Shell {
    pub fn new(manager: SessionManager, host: MemoryHost, paint: Option<ColorDepth>) -> Self {
        Self {
            manager,
            host,
            echoed: None,
            last_output: None,
            paint,
            timing: Timing::default(),
        }
    }

    /// Read commands until EOF or `quit`. Command errors are reported and
    /// the loop goes on. Output that arrives after the last command is still
    /// echoed, until the session goes quiet or exits.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> Result<()> {
        for line in input.lines() {
            let line = line.context("failed to read command")?;
            let command = match Command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    writeln!(out, "error: {e}")?;
                    continue;
                }
            };
            let writes = command.writes_input();
            match self.execute(command, out) {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) if writes => {
                    self.last_output = None;
                    self.settle(out, self.timing.reply)?;
                }
                Ok(Flow::Continue) => {
                    self.echo_new_output(out)?;
                }
                Err(e) => writeln!(out, "error: {e:#}")?,
            }
        }
        self.settle(out, self.timing.drain)
    }

    pub fn execute(&mut self, command: Command, out: &mut impl Write) -> Result<Flow> {
        let dispatcher = Dispatcher::new(&self.manager);
        match command {
            Command::Run(line) => {
                let handle = self.manager.ensure_session(&mut self.host, line.as_deref(), false)?;
                writeln!(out, "session {} in {}", handle.id, handle.buffer)?;
            }
            Command::Send { text, focus: false } => dispatcher.send_text(&mut self.host, &text)?,
            Command::Send { text, focus: true } => dispatcher.send_text_and_focus(&mut self.host, &text)?,
            Command::Open(path) => {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                self.host.open_buffer(&path.to_string_lossy(), &text);
            }
            Command::Goto(pos) => self.host.set_point(pos),
            Command::Region {
                start,
                end,
                focus: false,
            } => dispatcher.send_region(&mut self.host, start, end)?,
            Command::Region {
                start,
                end,
                focus: true,
            } => dispatcher.send_region_and_focus(&mut self.host, start, end)?,
            Command::Last { focus: false } => dispatcher.send_last_expression(&mut self.host)?,
            Command::Last { focus: true } => dispatcher.send_last_expression_and_focus(&mut self.host)?,
            Command::Buffer { focus: false } => dispatcher.send_buffer(&mut self.host)?,
            Command::Buffer { focus: true } => dispatcher.send_buffer_and_focus(&mut self.host)?,
            Command::Load { path, focus: false } => dispatcher.load_file(&mut self.host, &path)?,
            Command::Load { path, focus: true } => dispatcher.load_file_and_focus(&mut self.host, &path)?,
            Command::Switch => self.manager.switch_to_session(&mut self.host, true)?,
            Command::Show => {
                let handle = self
                    .manager
                    .current_handle()
                    .context("no interpreter session")?;
                if let Some(buffer) = self.host.session_buffer(&handle.buffer) {
                    let spans = buffer.transcript.lock().spans_since(0);
                    write!(out, "{}", self.render(&spans))?;
                    writeln!(out)?;
                }
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }

        log::debug!(
            "current buffer {:?} at {}",
            self.host.current_buffer(),
            self.host.point()
        );
        Ok(Flow::Continue)
    }

    /// Echo output until it has been quiet for a while, the session exits,
    /// or `limit` has passed. Quiet only counts once some output was seen.
    fn settle(&mut self, out: &mut impl Write, limit: Duration) -> Result<()> {
        let start = Instant::now();
        loop {
            self.echo_new_output(out)?;
            if self.manager.current_handle().is_none() {
                return Ok(());
            }
            if !self.manager.session_alive() {
                thread::sleep(EXIT_GRACE.min(limit));
                self.echo_new_output(out)?;
                return Ok(());
            }

            let now = Instant::now();
            let quiet = self
                .last_output
                .is_some_and(|at| now - at >= self.timing.quiet);
            if quiet || now - start >= limit {
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Print session output that arrived since the last call. Returns
    /// whether anything was printed.
    fn echo_new_output(&mut self, out: &mut impl Write) -> Result<bool> {
        let Some(handle) = self.manager.current_handle() else {
            return Ok(false);
        };
        let Some(buffer) = self.host.session_buffer(&handle.buffer) else {
            return Ok(false);
        };

        let seen = match self.echoed {
            Some((id, seen)) if id == handle.id => seen,
            _ => 0,
        };
        let fresh = buffer.transcript.lock().spans_since(seen);
        let count: usize = fresh.iter().map(|s| s.text.chars().count()).sum();
        if count > 0 {
            write!(out, "{}", self.render(&fresh))?;
            out.flush()?;
            self.last_output = Some(Instant::now());
        }
        self.echoed = Some((handle.id, seen + count));
        Ok(count > 0)
    }

    fn render(&self, spans: &[StyledSpan]) -> String {
        match self.paint {
            Some(depth) => paint(spans, depth),
            None => spans.iter().map(|s| s.text.as_str()).collect(),
        }
    }
}
