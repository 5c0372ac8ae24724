use std::collections::BTreeMap;

use crate::host::{Host, SessionBuffer};

struct TextBuffer {
    text: String,
    point: usize,
}

struct SessionView {
    buffer: SessionBuffer,
    point: usize,
}

/// An editor kept entirely in memory.
///
/// Holds plain text buffers, session buffers backed by transcripts, the
/// focused buffer and a mark ring. Used by the `tsrepl` driver and by tests.
#[derive(Default)]
pub struct MemoryHost {
    buffers: BTreeMap<String, TextBuffer>,
    sessions: BTreeMap<String, SessionView>,
    current: Option<String>,
    marks: Vec<(String, usize)>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or overwrite) a text buffer and make it current, with the
    /// cursor at its end.
    pub fn open_buffer(&mut self, name: &str, text: &str) {
        let point = text.chars().count();
        self.buffers.insert(
            name.to_string(),
            TextBuffer {
                text: text.to_string(),
                point,
            },
        );
        self.current = Some(name.to_string());
    }

    /// Remove a buffer of either kind. Returns whether it existed.
    pub fn kill_buffer(&mut self, name: &str) -> bool {
        let existed =
            self.buffers.remove(name).is_some() | self.sessions.remove(name).is_some();
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        existed
    }

    /// Move the cursor of the current buffer, clamped to its bounds.
    pub fn set_point(&mut self, pos: usize) {
        let end = self.buffer_bounds().1;
        let pos = pos.min(end);
        let Some(name) = self.current.clone() else {
            return;
        };
        if let Some(buffer) = self.buffers.get_mut(&name) {
            buffer.point = pos;
        } else if let Some(view) = self.sessions.get_mut(&name) {
            view.point = pos;
        }
    }

    pub fn current_buffer(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Locations saved by `push_mark`, oldest first.
    pub fn marks(&self) -> &[(String, usize)] {
        &self.marks
    }

    pub fn session_buffer(&self, name: &str) -> Option<&SessionBuffer> {
        self.sessions.get(name).map(|view| &view.buffer)
    }

    fn current_text(&self) -> String {
        let Some(name) = self.current.as_deref() else {
            return String::new();
        };
        if let Some(buffer) = self.buffers.get(name) {
            buffer.text.clone()
        } else if let Some(view) = self.sessions.get(name) {
            view.buffer.transcript.text()
        } else {
            String::new()
        }
    }
}

impl Host for MemoryHost {
    fn attach_session_buffer(&mut self, buffer: SessionBuffer) {
        // A buffer name is either a text buffer or a session buffer.
        self.buffers.remove(&buffer.name);
        let point = buffer.transcript.len();
        self.sessions
            .insert(buffer.name.clone(), SessionView { buffer, point });
    }

    fn buffer_exists(&self, name: &str) -> bool {
        self.buffers.contains_key(name) || self.sessions.contains_key(name)
    }

    fn focus_buffer(&mut self, name: &str) {
        if self.buffer_exists(name) {
            self.current = Some(name.to_string());
        }
    }

    fn push_mark(&mut self) {
        if let Some(name) = self.current.clone() {
            let point = self.point();
            self.marks.push((name, point));
        }
    }

    fn goto_end(&mut self) {
        let end = self.buffer_bounds().1;
        self.set_point(end);
    }

    fn point(&self) -> usize {
        let Some(name) = self.current.as_deref() else {
            return 0;
        };
        if let Some(buffer) = self.buffers.get(name) {
            buffer.point
        } else {
            self.sessions.get(name).map_or(0, |view| view.point)
        }
    }

    fn region_text(&self, start: usize, end: usize) -> String {
        let (start, end) = (start.min(end), start.max(end));
        self.current_text()
            .chars()
            .skip(start)
            .take(end - start)
            .collect()
    }

    fn buffer_bounds(&self) -> (usize, usize) {
        (0, self.current_text().chars().count())
    }

    fn line_start(&self, pos: usize) -> usize {
        let chars: Vec<char> = self.current_text().chars().collect();
        let pos = pos.min(chars.len());
        chars[..pos]
            .iter()
            .rposition(|&c| c == '\n')
            .map_or(0, |newline| newline + 1)
    }

    fn backward_expression(&self, pos: usize) -> Option<usize> {
        let chars: Vec<char> = self.current_text().chars().collect();
        let comments = comment_mask(&chars);
        expression_start(&chars, &comments, pos.min(chars.len()))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '`')
}

fn opening_for(c: char) -> Option<char> {
    match c {
        ')' => Some('('),
        ']' => Some('['),
        '}' => Some('{'),
        _ => None,
    }
}

/// Position of the opening quote of the string literal whose closing quote
/// sits at `close`.
fn string_start(chars: &[char], close: usize) -> Option<usize> {
    let quote = chars[close];
    let mut i = close;
    while i > 0 {
        i -= 1;
        if chars[i] == quote && !is_escaped(chars, i) {
            return Some(i);
        }
    }
    None
}

fn is_escaped(chars: &[char], at: usize) -> bool {
    let backslashes = chars[..at].iter().rev().take_while(|&&c| c == '\\').count();
    backslashes % 2 == 1
}

/// Marks every character that belongs to a `//` or `/* */` comment.
///
/// Lexes forward so that comment markers inside string literals, and quotes
/// inside comments, are classified correctly.
fn comment_mask(chars: &[char]) -> Vec<bool> {
    enum Lex {
        Code,
        Line,
        Block,
        Str(char),
    }

    let mut mask = vec![false; chars.len()];
    let mut state = Lex::Code;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match state {
            Lex::Code => match (c, next) {
                ('/', Some('/')) => {
                    state = Lex::Line;
                    mask[i] = true;
                }
                ('/', Some('*')) => {
                    state = Lex::Block;
                    mask[i] = true;
                    mask[i + 1] = true;
                    i += 1;
                }
                (q, _) if is_quote(q) => state = Lex::Str(q),
                _ => {}
            },
            Lex::Line => {
                if c == '\n' {
                    state = Lex::Code;
                } else {
                    mask[i] = true;
                }
            }
            Lex::Block => {
                mask[i] = true;
                if c == '*' && next == Some('/') {
                    mask[i + 1] = true;
                    i += 1;
                    state = Lex::Code;
                }
            }
            Lex::Str(quote) => {
                if c == '\\' {
                    i += 1;
                } else if c == quote {
                    state = Lex::Code;
                }
            }
        }
        i += 1;
    }
    mask
}

/// Position of the opening bracket matching the closing bracket at `close`,
/// skipping over string literals and comments.
fn bracket_start(chars: &[char], comments: &[bool], close: usize) -> Option<usize> {
    let mut stack = vec![opening_for(chars[close])?];
    let mut i = close;
    while i > 0 {
        i -= 1;
        let c = chars[i];
        if comments[i] {
            continue;
        }
        if is_quote(c) && !is_escaped(chars, i) {
            i = string_start(chars, i)?;
        } else if let Some(open) = opening_for(c) {
            stack.push(open);
        } else if stack.last() == Some(&c) {
            stack.pop();
            if stack.is_empty() {
                return Some(i);
            }
        } else if matches!(c, '(' | '[' | '{') {
            return None;
        }
    }
    None
}

/// Start of the balanced expression that ends before `pos`: a bracketed
/// group, a string literal or a word. Whitespace, comments and operator
/// punctuation before `pos` are skipped first.
fn expression_start(chars: &[char], comments: &[bool], pos: usize) -> Option<usize> {
    let mut i = pos;
    loop {
        while i > 0 && (chars[i - 1].is_whitespace() || comments[i - 1]) {
            i -= 1;
        }
        if i == 0 {
            return None;
        }
        let c = chars[i - 1];
        if opening_for(c).is_some() {
            return bracket_start(chars, comments, i - 1);
        }
        if is_quote(c) {
            return string_start(chars, i - 1);
        }
        if is_word_char(c) {
            let mut start = i - 1;
            while start > 0 && is_word_char(chars[start - 1]) {
                start -= 1;
            }
            return Some(start);
        }
        if matches!(c, '(' | '[' | '{') {
            return None;
        }
        i -= 1;
    }
}
