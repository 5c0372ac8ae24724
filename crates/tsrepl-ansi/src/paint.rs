//! Turning styled spans back into SGR escapes for a terminal.

use crate::style::{Color, Rgb, Style, StyleFlags, StyledSpan};

const RESET: &str = "\x1b[0m";

/// Which color encoding the target terminal understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorDepth {
    /// Palette colors stay palette references; the terminal's theme applies.
    Indexed,
    /// Every color is resolved to RGB and sent as 24-bit.
    TrueColor,
}

const FLAG_PARAMS: [(StyleFlags, u8); 8] = [
    (StyleFlags::BOLD, 1),
    (StyleFlags::DIM, 2),
    (StyleFlags::ITALIC, 3),
    (StyleFlags::UNDERLINE, 4),
    (StyleFlags::BLINK, 5),
    (StyleFlags::INVERSE, 7),
    (StyleFlags::HIDDEN, 8),
    (StyleFlags::STRIKETHROUGH, 9),
];

impl Style {
    /// The SGR sequence that selects this style from any prior state.
    pub fn sgr(&self, depth: ColorDepth) -> String {
        let mut params = vec!["0".to_string()];
        for (flag, param) in FLAG_PARAMS {
            if self.flags.contains(flag) {
                params.push(param.to_string());
            }
        }
        if let Some(fg) = self.fg {
            params.push(color_params(fg, depth, 30));
        }
        if let Some(bg) = self.bg {
            params.push(color_params(bg, depth, 40));
        }
        format!("\x1b[{}m", params.join(";"))
    }
}

/// `base` is 30 for foreground, 40 for background.
fn color_params(color: Color, depth: ColorDepth, base: u8) -> String {
    match (color, depth) {
        (Color::Indexed(idx @ 0..=7), ColorDepth::Indexed) => (base + idx).to_string(),
        (Color::Indexed(idx @ 8..=15), ColorDepth::Indexed) => (base + 60 + idx - 8).to_string(),
        (Color::Indexed(idx), ColorDepth::Indexed) => format!("{};5;{idx}", base + 8),
        (color, _) => {
            let Rgb { r, g, b } = color.to_rgb();
            format!("{};2;{r};{g};{b}", base + 8)
        }
    }
}

/// Render spans as terminal text. Styled spans are wrapped in their SGR
/// sequence and a reset; plain spans are written as-is.
pub fn paint(spans: &[StyledSpan], depth: ColorDepth) -> String {
    let mut out = String::new();
    for span in spans {
        if span.style.is_plain() {
            out.push_str(&span.text);
        } else {
            out.push_str(&span.style.sgr(depth));
            out.push_str(&span.text);
            out.push_str(RESET);
        }
    }
    out
}
