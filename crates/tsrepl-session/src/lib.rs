//! tsrepl-session: interpreter session lifecycle.
//!
//! This crate owns "the current interpreter session": it decides whether to
//! spawn a new interpreter or reuse the live one, pumps its output into a
//! transcript through the display filter, and moves editor focus to it.
//!
//! # Architecture
//!
//! - [`SessionManager`]: Ensure/switch operations over a [`SessionRegistry`].
//! - [`SessionRegistry`]: The single session slot plus the current [`SessionConfig`].
//! - [`InterpreterSession`]: A running process paired with its transcript.
//! - [`Launcher`] / [`Process`]: Seam to the process-creation facility;
//!   [`PtyLauncher`] is the real implementation.
//! - [`Host`]: Seam to the editor; [`MemoryHost`] is an in-memory implementation.

pub mod config;
pub mod error;
pub mod host;
pub mod manager;
pub mod memory;
pub mod process;
pub mod pty;
pub mod pump;
pub mod registry;
pub mod session;
pub mod transcript;

pub use config::SessionConfig;
pub use error::SessionError;
pub use host::{Host, SessionBuffer};
pub use manager::SessionManager;
pub use memory::MemoryHost;
pub use process::{LaunchRequest, Launcher, Process};
pub use pty::{PtyHandle, PtyLauncher};
pub use registry::{SessionRegistry, SharedRegistry};
pub use session::{InterpreterSession, SessionHandle, SessionId};
pub use transcript::{SharedTranscript, Transcript};
