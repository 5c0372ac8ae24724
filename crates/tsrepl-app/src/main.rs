mod config;
mod shell;

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tsrepl_ansi::ColorDepth;
use tsrepl_session::{MemoryHost, PtyLauncher, SessionManager, SessionRegistry};

use shell::{Command, Shell, HELP};

/// Drive a TypeScript interpreter session with editor-style commands read
/// from standard input.
#[derive(Debug, Parser)]
#[command(name = "tsrepl", version)]
pub struct Cli {
    /// Config file (default: <config dir>/tsrepl/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Interpreter launcher
    #[arg(long)]
    pub program: Option<String>,

    /// Interpreter argument; repeat for more than one
    #[arg(long = "arg", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Do not render ANSI colors; ask the interpreter to skip readline instead
    #[arg(long)]
    pub no_ansi: bool,

    /// Name of the session buffer
    #[arg(long)]
    pub buffer_name: Option<String>,

    /// Start the interpreter before reading commands
    #[arg(long)]
    pub start: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let session_config = config::resolve(&cli)?;
    log::debug!("session config: {session_config:?}");

    let registry = SessionRegistry::shared(session_config);
    let manager = SessionManager::new(registry, Box::new(PtyLauncher::default()));
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let paint = stdout.is_terminal().then(color_depth);
    let mut shell = Shell::new(manager, MemoryHost::new(), paint);

    if stdin.is_terminal() {
        println!("{HELP}");
    }
    if cli.start {
        shell.execute(Command::Run(None), &mut stdout)?;
    }

    shell.run(stdin.lock(), &mut stdout)
}

/// 24-bit color when the terminal advertises it through `COLORTERM`.
fn color_depth() -> ColorDepth {
    match std::env::var("COLORTERM").as_deref() {
        Ok("truecolor" | "24bit") => ColorDepth::TrueColor,
        _ => ColorDepth::Indexed,
    }
}
