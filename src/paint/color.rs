use std::str::FromStr;

use crate::foundation::error::{PixError, PixResult};
use crate::foundation::math::{linear_to_srgb, srgb_to_linear};

/// Single color value parsed from a textual specification.
///
/// Stored as linear, straight-alpha RGBA. Accepted forms:
///
/// - `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` (sRGB encoded)
/// - `rgb(r, g, b)` / `rgba(r, g, b, a)` with linear float components
/// - CSS-style names (`black`, `white`, `red`, `transparent`, ...)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    rgba: [f64; 4],
}

impl Color {
    /// Parse a color specification.
    pub fn parse(spec: &str) -> PixResult<Self> {
        let s = spec.trim();
        if s.is_empty() {
            return Err(PixError::ColorParse("empty color specification".to_owned()));
        }
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let v = parse_components(args, 4, s)?;
            return Ok(Self::from_linear_rgba(v[0], v[1], v[2], v[3]));
        }
        if let Some(args) = lower
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let v = parse_components(args, 3, s)?;
            return Ok(Self::from_linear_rgba(v[0], v[1], v[2], 1.0));
        }
        named(&lower).ok_or_else(|| PixError::ColorParse(format!("unrecognized color \"{s}\"")))
    }

    /// Build from linear components.
    pub fn from_linear_rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { rgba: [r, g, b, a] }
    }

    /// Build from sRGB-encoded 8-bit components.
    pub fn from_srgb8(r: u8, g: u8, b: u8, a: u8) -> Self {
        let c = |v: u8| f64::from(srgb_to_linear(f32::from(v) / 255.0));
        Self::from_linear_rgba(c(r), c(g), c(b), f64::from(a) / 255.0)
    }

    /// Linear straight-alpha components.
    pub fn linear_rgba(self) -> [f64; 4] {
        self.rgba
    }

    /// Working-representation pixel.
    pub(crate) fn to_pixel(self) -> [f32; 4] {
        self.rgba.map(|v| v as f32)
    }

    pub(crate) fn from_pixel(px: [f32; 4]) -> Self {
        Self {
            rgba: px.map(f64::from),
        }
    }

    /// sRGB-encoded straight-alpha 8-bit components.
    pub fn to_srgb8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let [r, g, b, a] = self.to_pixel();
        [
            q(linear_to_srgb(r.max(0.0))),
            q(linear_to_srgb(g.max(0.0))),
            q(linear_to_srgb(b.max(0.0))),
            q(a),
        ]
    }
}

impl FromStr for Color {
    type Err = PixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_hex(hex: &str) -> PixResult<Color> {
    let err = || {
        PixError::ColorParse(format!(
            "hex color must be #rgb, #rgba, #rrggbb or #rrggbbaa, got \"#{hex}\""
        ))
    };
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(err());
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);

    let parsed = match hex.len() {
        3 => (nibble(0), nibble(1), nibble(2), Ok(255)),
        4 => (nibble(0), nibble(1), nibble(2), nibble(3)),
        6 => (byte(0), byte(2), byte(4), Ok(255)),
        8 => (byte(0), byte(2), byte(4), byte(6)),
        _ => return Err(err()),
    };
    match parsed {
        (Ok(r), Ok(g), Ok(b), Ok(a)) => Ok(Color::from_srgb8(r, g, b, a)),
        _ => Err(err()),
    }
}

fn parse_components(args: &str, n: usize, original: &str) -> PixResult<Vec<f64>> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != n {
        return Err(PixError::ColorParse(format!(
            "expected {n} components in \"{original}\""
        )));
    }
    parts
        .iter()
        .map(|p| {
            p.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    PixError::ColorParse(format!("invalid component \"{p}\" in \"{original}\""))
                })
        })
        .collect()
}

fn named(name: &str) -> Option<Color> {
    let c = match name {
        "black" => Color::from_srgb8(0, 0, 0, 255),
        "white" => Color::from_srgb8(255, 255, 255, 255),
        "red" => Color::from_srgb8(255, 0, 0, 255),
        "green" => Color::from_srgb8(0, 128, 0, 255),
        "lime" => Color::from_srgb8(0, 255, 0, 255),
        "blue" => Color::from_srgb8(0, 0, 255, 255),
        "yellow" => Color::from_srgb8(255, 255, 0, 255),
        "cyan" => Color::from_srgb8(0, 255, 255, 255),
        "magenta" => Color::from_srgb8(255, 0, 255, 255),
        "gray" | "grey" => Color::from_srgb8(128, 128, 128, 255),
        "orange" => Color::from_srgb8(255, 165, 0, 255),
        "purple" => Color::from_srgb8(128, 0, 128, 255),
        "transparent" | "none" => Color::from_linear_rgba(0.0, 0.0, 0.0, 0.0),
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
#[path = "../../tests/unit/paint/color.rs"]
mod tests;
