use bitflags::bitflags;

/// RGB color value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

bitflags! {
    /// Text attribute flags, packed into a single byte.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct StyleFlags: u8 {
        const BOLD          = 0b0000_0001;
        const ITALIC        = 0b0000_0010;
        const UNDERLINE     = 0b0000_0100;
        const STRIKETHROUGH = 0b0000_1000;
        const INVERSE       = 0b0001_0000;
        const DIM           = 0b0010_0000;
        const HIDDEN        = 0b0100_0000;
        const BLINK         = 0b1000_0000;
    }
}

/// A color as requested by the interpreter.
///
/// Palette indices are kept as-is so hosts can apply their own theme;
/// [`Color::to_rgb`] resolves them against the xterm defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Indexed(u8),
    Spec(Rgb),
}

/// Standard xterm-256color ANSI palette.
const ANSI_COLORS: [Rgb; 16] = [
    Rgb::new(0, 0, 0),       // Black
    Rgb::new(205, 0, 0),     // Red
    Rgb::new(0, 205, 0),     // Green
    Rgb::new(205, 205, 0),   // Yellow
    Rgb::new(0, 0, 238),     // Blue
    Rgb::new(205, 0, 205),   // Magenta
    Rgb::new(0, 205, 205),   // Cyan
    Rgb::new(229, 229, 229), // White
    Rgb::new(127, 127, 127), // Bright Black
    Rgb::new(255, 0, 0),     // Bright Red
    Rgb::new(0, 255, 0),     // Bright Green
    Rgb::new(255, 255, 0),   // Bright Yellow
    Rgb::new(92, 92, 255),   // Bright Blue
    Rgb::new(255, 0, 255),   // Bright Magenta
    Rgb::new(0, 255, 255),   // Bright Cyan
    Rgb::new(255, 255, 255), // Bright White
];

impl Color {
    /// Resolve to an RGB value using the xterm-256color palette.
    pub fn to_rgb(self) -> Rgb {
        match self {
            Color::Spec(rgb) => rgb,
            Color::Indexed(idx) => {
                let idx = idx as usize;
                if idx < 16 {
                    ANSI_COLORS[idx]
                } else if idx < 232 {
                    // 216-color cube (indices 16..232).
                    let n = idx - 16;
                    let r = (n / 36) % 6;
                    let g = (n / 6) % 6;
                    let b = n % 6;
                    let to_byte = |v: usize| if v == 0 { 0u8 } else { (55 + 40 * v) as u8 };
                    Rgb::new(to_byte(r), to_byte(g), to_byte(b))
                } else {
                    // Grayscale ramp (indices 232..256).
                    let v = (8 + 10 * (idx - 232)) as u8;
                    Rgb::new(v, v, v)
                }
            }
        }
    }
}

/// Display attributes applied to a run of text.
///
/// `None` colors mean "the host's default".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub flags: StyleFlags,
}

impl Style {
    pub fn is_plain(&self) -> bool {
        *self == Style::default()
    }
}

/// A run of text sharing one style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: Style,
}

impl StyledSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::default(),
        }
    }
}

/// Append `span` to `spans`, merging it into the last span when the styles match.
pub fn push_span(spans: &mut Vec<StyledSpan>, span: StyledSpan) {
    if span.text.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if last.style == span.style => last.text.push_str(&span.text),
        _ => spans.push(span),
    }
}
