use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Cursor-horizontal-absolute, erase-in-line and erase-in-display with an
/// explicit numeric argument. Readline emits these to redraw the prompt line.
static CURSOR_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9]+[GKJ]").expect("cursor code pattern is valid"));

/// Remove `ESC [ <digits> (G|K|J)` sequences from a chunk of output.
///
/// At least one digit is required: `ESC [ K` is left alone. Everything
/// outside the matched sequences is returned untouched. Borrows when there
/// is nothing to strip.
pub fn strip_cursor_codes(text: &str) -> Cow<'_, str> {
    CURSOR_CODE.replace_all(text, "")
}
