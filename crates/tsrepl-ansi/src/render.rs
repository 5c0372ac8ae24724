use vte::{Params, Parser, Perform};

use crate::style::{push_span, Color, Rgb, Style, StyleFlags, StyledSpan};

/// Collects printable text into styled spans while the parser runs.
#[derive(Default)]
struct SpanCollector {
    style: Style,
    pending: String,
    spans: Vec<StyledSpan>,
}

impl SpanCollector {
    /// Close the pending run so a style change starts a new span.
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending);
        push_span(
            &mut self.spans,
            StyledSpan {
                text,
                style: self.style,
            },
        );
    }

    fn take_spans(&mut self) -> Vec<StyledSpan> {
        self.flush();
        std::mem::take(&mut self.spans)
    }

    /// Apply one SGR (`ESC [ ... m`) parameter list to the current style.
    fn apply_sgr(&mut self, params: &Params) {
        let params: Vec<&[u16]> = params.iter().collect();
        if params.is_empty() {
            self.style = Style::default();
            return;
        }

        let mut i = 0;
        while i < params.len() {
            match params[i].first().copied().unwrap_or(0) {
                0 => self.style = Style::default(),
                1 => self.style.flags.insert(StyleFlags::BOLD),
                2 => self.style.flags.insert(StyleFlags::DIM),
                3 => self.style.flags.insert(StyleFlags::ITALIC),
                4 => self.style.flags.insert(StyleFlags::UNDERLINE),
                5 | 6 => self.style.flags.insert(StyleFlags::BLINK),
                7 => self.style.flags.insert(StyleFlags::INVERSE),
                8 => self.style.flags.insert(StyleFlags::HIDDEN),
                9 => self.style.flags.insert(StyleFlags::STRIKETHROUGH),
                21 | 22 => self.style.flags.remove(StyleFlags::BOLD | StyleFlags::DIM),
                23 => self.style.flags.remove(StyleFlags::ITALIC),
                24 => self.style.flags.remove(StyleFlags::UNDERLINE),
                25 => self.style.flags.remove(StyleFlags::BLINK),
                27 => self.style.flags.remove(StyleFlags::INVERSE),
                28 => self.style.flags.remove(StyleFlags::HIDDEN),
                29 => self.style.flags.remove(StyleFlags::STRIKETHROUGH),
                n @ 30..=37 => self.style.fg = Some(Color::Indexed((n - 30) as u8)),
                38 => {
                    let (color, consumed) = extended_color(&params, i);
                    if color.is_some() {
                        self.style.fg = color;
                    }
                    i += consumed;
                }
                39 => self.style.fg = None,
                n @ 40..=47 => self.style.bg = Some(Color::Indexed((n - 40) as u8)),
                48 => {
                    let (color, consumed) = extended_color(&params, i);
                    if color.is_some() {
                        self.style.bg = color;
                    }
                    i += consumed;
                }
                49 => self.style.bg = None,
                n @ 90..=97 => self.style.fg = Some(Color::Indexed((n - 90 + 8) as u8)),
                n @ 100..=107 => self.style.bg = Some(Color::Indexed((n - 100 + 8) as u8)),
                _ => {}
            }
            i += 1;
        }
    }
}

/// Decode a `38`/`48` extended color starting at `params[at]`.
///
/// Handles both the colon form (`38:5:n`, one param with subparams) and the
/// semicolon form (`38;5;n`, separate params). Returns the color and the
/// number of extra params consumed.
fn extended_color(params: &[&[u16]], at: usize) -> (Option<Color>, usize) {
    let head = params[at];
    if head.len() > 1 {
        return (color_from_parts(&head[1..]), 0);
    }

    let rest: Vec<u16> = params[at + 1..].iter().map(|p| p.first().copied().unwrap_or(0)).collect();
    match rest.first() {
        Some(5) => (color_from_parts(&rest[..rest.len().min(2)]), rest.len().min(2)),
        Some(2) => (color_from_parts(&rest[..rest.len().min(4)]), rest.len().min(4)),
        _ => (None, 0),
    }
}

fn color_from_parts(parts: &[u16]) -> Option<Color> {
    match parts {
        [5, idx, ..] => Some(Color::Indexed(*idx as u8)),
        // Colon form may carry a color-space id: 38:2:<cs>:r:g:b.
        [2, _, r, g, b] | [2, r, g, b, ..] => {
            Some(Color::Spec(Rgb::new(*r as u8, *g as u8, *b as u8)))
        }
        _ => None,
    }
}

impl Perform for SpanCollector {
    fn print(&mut self, c: char) {
        self.pending.push(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' | b'\t' => self.pending.push(byte as char),
            // Backspace
            0x08 => {
                self.pending.pop();
            }
            // CR, BEL and the rest mean nothing in a scrollback buffer.
            _ => {}
        }
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], ignore: bool, action: char) {
        if action != 'm' || ignore || !intermediates.is_empty() {
            // Cursor movement, erase, mode switches: dropped.
            return;
        }
        self.flush();
        self.apply_sgr(params);
    }
}

/// Renders ANSI-colored interpreter output into styled spans.
///
/// The parser and current style persist across calls, so an escape sequence
/// split between two output chunks still renders correctly. Only SGR
/// sequences affect the result; every other control sequence is dropped.
pub struct AnsiRenderer {
    parser: Parser,
    collector: SpanCollector,
}

impl AnsiRenderer {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            collector: SpanCollector::default(),
        }
    }

    /// Feed a chunk of output and return the spans it produced.
    pub fn render(&mut self, bytes: &[u8]) -> Vec<StyledSpan> {
        self.parser.advance(&mut self.collector, bytes);
        self.collector.take_spans()
    }
}

impl Default for AnsiRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(spans: &[StyledSpan]) -> String {
        spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_plain_text_passes_through() {
        let mut r = AnsiRenderer::new();
        let spans = r.render(b"hello\n");
        assert_eq!(spans, vec![StyledSpan::plain("hello\n")]);
    }

    #[test]
    fn test_foreground_color() {
        let mut r = AnsiRenderer::new();
        // ESC[31m sets foreground to red, ESC[39m resets it.
        let spans = r.render(b"a\x1b[31mR\x1b[39mb");
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].text, "R");
        assert_eq!(spans[1].style.fg, Some(Color::Indexed(1)));
        assert!(spans[2].style.is_plain());
        assert_eq!(text_of(&spans), "aRb");
    }

    #[test]
    fn test_bold_and_reset() {
        let mut r = AnsiRenderer::new();
        let spans = r.render(b"\x1b[1mB\x1b[0mn");
        assert!(spans[0].style.flags.contains(StyleFlags::BOLD));
        assert!(spans[1].style.is_plain());
    }

    #[test]
    fn test_empty_sgr_resets() {
        let mut r = AnsiRenderer::new();
        let spans = r.render(b"\x1b[4mu\x1b[mp");
        assert!(spans[0].style.flags.contains(StyleFlags::UNDERLINE));
        assert!(spans[1].style.is_plain());
    }

    #[test]
    fn test_bright_and_background() {
        let mut r = AnsiRenderer::new();
        let spans = r.render(b"\x1b[92;44mx");
        assert_eq!(spans[0].style.fg, Some(Color::Indexed(10)));
        assert_eq!(spans[0].style.bg, Some(Color::Indexed(4)));
    }

    #[test]
    fn test_256_and_truecolor() {
        let mut r = AnsiRenderer::new();
        let spans = r.render(b"\x1b[38;5;208ma\x1b[48;2;10;20;30mb");
        assert_eq!(spans[0].style.fg, Some(Color::Indexed(208)));
        assert_eq!(spans[1].style.bg, Some(Color::Spec(Rgb::new(10, 20, 30))));
        // The foreground carries over into the second span.
        assert_eq!(spans[1].style.fg, Some(Color::Indexed(208)));
    }

    #[test]
    fn test_colon_subparams() {
        let mut r = AnsiRenderer::new();
        let spans = r.render(b"\x1b[38:2:1:2:3mx");
        assert_eq!(spans[0].style.fg, Some(Color::Spec(Rgb::new(1, 2, 3))));
    }

    #[test]
    fn test_sequence_split_across_chunks() {
        let mut r = AnsiRenderer::new();
        let first = r.render(b"ok \x1b[3");
        assert_eq!(text_of(&first), "ok ");
        let second = r.render(b"3mwarn");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].text, "warn");
        assert_eq!(second[0].style.fg, Some(Color::Indexed(3)));
    }

    #[test]
    fn test_non_sgr_sequences_are_dropped() {
        let mut r = AnsiRenderer::new();
        let spans = r.render(b"a\x1b[K\x1b[2Ab\x1b]0;title\x07c");
        assert_eq!(text_of(&spans), "abc");
    }

    #[test]
    fn test_carriage_return_dropped() {
        let mut r = AnsiRenderer::new();
        let spans = r.render(b"line\r\n> ");
        assert_eq!(text_of(&spans), "line\n> ");
    }

    #[test]
    fn test_utf8_text() {
        let mut r = AnsiRenderer::new();
        let spans = r.render("λ → ok".as_bytes());
        assert_eq!(text_of(&spans), "λ → ok");
    }
}
