//! Colours with opacity, and parsing of configured colour strings.

use crate::error::Error;

/// An sRGB colour with an opacity in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f64,
}

impl Rgba {
    /// Fully opaque colour.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 1.0 }
    }

    /// Same colour with the given opacity, clamped to `0.0..=1.0`.
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    /// CSS `rgba(r,g,b,a)` string usable as a canvas fill or stroke style.
    pub fn css(&self) -> String {
        format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.alpha)
    }

    /// `#rrggbb` form, dropping opacity.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `#rrggbb` when opaque, `#rrggbbaa` otherwise.
    pub fn hex_alpha(&self) -> String {
        if self.alpha >= 1.0 {
            return self.hex();
        }
        let alpha = (self.alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("{}{alpha:02x}", self.hex())
    }
}

impl TryFrom<String> for Rgba {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_color(&value).ok_or(Error::InvalidColor(value))
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.hex_alpha()
    }
}

/// Parse a colour string into an [`Rgba`].
///
/// Supports:
/// - Named colors: black, white, red, green, blue, yellow, cyan, magenta,
///   gray/grey, orange, purple, pink, brown
/// - Hex: `#RGB` (expanded to `#RRGGBB`), `#RRGGBB`
/// - Hex with opacity: `#RGBA`, `#RRGGBBAA`
/// - Case-insensitive, trims whitespace
pub fn parse_color(s: &str) -> Option<Rgba> {
    let s = s.trim();
    if s.starts_with('#') {
        parse_hex(s)
    } else {
        parse_named(s)
    }
}

fn parse_hex(s: &str) -> Option<Rgba> {
    let hex = s.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    match hex.len() {
        3 | 4 => {
            let color = Rgba::rgb(channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17);
            match hex.len() {
                4 => Some(color.with_alpha((channel(3..4)? * 17) as f64 / 255.0)),
                _ => Some(color),
            }
        }
        6 | 8 => {
            let color = Rgba::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?);
            match hex.len() {
                8 => Some(color.with_alpha(channel(6..8)? as f64 / 255.0)),
                _ => Some(color),
            }
        }
        _ => None,
    }
}

fn parse_named(s: &str) -> Option<Rgba> {
    let (r, g, b) = match s.to_lowercase().as_str() {
        "black"         => (0, 0, 0),
        "white"         => (255, 255, 255),
        "red"           => (255, 0, 0),
        "green"         => (0, 128, 0),
        "blue"          => (0, 0, 255),
        "yellow"        => (255, 255, 0),
        "cyan"          => (0, 255, 255),
        "magenta"       => (255, 0, 255),
        "gray" | "grey" => (128, 128, 128),
        "orange"        => (255, 165, 0),
        "purple"        => (128, 0, 128),
        "pink"          => (255, 192, 203),
        "brown"         => (139, 69, 19),
        _               => return None,
    };
    Some(Rgba::rgb(r, g, b))
}
