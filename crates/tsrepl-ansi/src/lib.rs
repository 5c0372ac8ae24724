//! tsrepl-ansi: display filtering for interpreter output.
//!
//! Interpreter output is destined for a plain scrollback buffer, not a
//! terminal grid. This crate removes the cursor/erase codes a readline layer
//! emits and turns SGR colour codes into styled spans a host can paint.
//!
//! - [`strip_cursor_codes`]: Removes `ESC [ <digits> G|K|J` sequences.
//! - [`AnsiRenderer`]: Stateful SGR renderer built on `vte`.
//! - [`OutputFilter`]: The per-session hook chosen from a [`DisplayMode`].
//! - [`paint`]: Re-emits styled spans as SGR for a terminal host.

pub mod filter;
pub mod paint;
pub mod render;
pub mod strip;
pub mod style;

pub use filter::{DisplayMode, OutputFilter, NO_READLINE_ENV};
pub use paint::{paint, ColorDepth};
pub use render::AnsiRenderer;
pub use strip::strip_cursor_codes;
pub use style::{Color, Rgb, Style, StyleFlags, StyledSpan};
