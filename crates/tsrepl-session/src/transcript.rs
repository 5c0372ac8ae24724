use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tsrepl_ansi::style::push_span;
use tsrepl_ansi::StyledSpan;

/// The contents of a session buffer: filtered interpreter output.
#[derive(Debug, Default)]
pub struct Transcript {
    spans: Vec<StyledSpan>,
    chars: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, spans: Vec<StyledSpan>) {
        for span in spans {
            self.chars += span.text.chars().count();
            push_span(&mut self.spans, span);
        }
    }

    pub fn append_text(&mut self, text: &str) {
        self.append(vec![StyledSpan::plain(text)]);
    }

    /// The spans from character offset `start` to the end, the first one
    /// cut at `start`.
    pub fn spans_since(&self, start: usize) -> Vec<StyledSpan> {
        let mut skip = start;
        let mut out = Vec::new();
        for span in &self.spans {
            let len = span.text.chars().count();
            if skip >= len {
                skip -= len;
                continue;
            }
            out.push(StyledSpan {
                text: span.text.chars().skip(skip).collect(),
                style: span.style,
            });
            skip = 0;
        }
        out
    }

    /// The buffer text with styling removed.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Length in characters; the end-of-buffer position.
    pub fn len(&self) -> usize {
        self.chars
    }

    pub fn is_empty(&self) -> bool {
        self.chars == 0
    }
}

/// A transcript shared between the output pump and the host.
#[derive(Clone, Debug, Default)]
pub struct SharedTranscript(Arc<Mutex<Transcript>>);

impl SharedTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the transcript. A panic on the pump thread does not make the
    /// buffer unreadable.
    pub fn lock(&self) -> MutexGuard<'_, Transcript> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn text(&self) -> String {
        self.lock().text()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether both handles point at the same buffer.
    pub fn same_as(&self, other: &SharedTranscript) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
