use std::collections::BTreeMap;
use std::sync::Arc;

use crate::foundation::error::{PixError, PixResult};

/// Storage type of a single channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// 8-bit unsigned normalized.
    U8,
    /// 16-bit unsigned normalized (native endian).
    U16,
    /// 32-bit IEEE float (native endian).
    Float,
}

impl ChannelType {
    /// Bytes occupied by one channel.
    pub fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::Float => 4,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::Float => "float",
        }
    }
}

/// Channel layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ColorModel {
    /// Red, green, blue, alpha.
    Rgba,
    /// Red, green, blue.
    Rgb,
    /// Luminance with alpha.
    Ya,
    /// Luminance only.
    Y,
}

impl ColorModel {
    /// Number of channels per pixel.
    pub fn channels(self) -> usize {
        match self {
            Self::Rgba => 4,
            Self::Rgb => 3,
            Self::Ya => 2,
            Self::Y => 1,
        }
    }

    /// Return `true` if the layout carries an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba | Self::Ya)
    }

    fn prefix(self, transfer: Transfer) -> &'static str {
        match (self, transfer) {
            (Self::Rgba, Transfer::Linear) => "RGBA",
            (Self::Rgb, Transfer::Linear) => "RGB",
            (Self::Ya, Transfer::Linear) => "YA",
            (Self::Y, Transfer::Linear) => "Y",
            (Self::Rgba, Transfer::Perceptual) => "R'G'B'A",
            (Self::Rgb, Transfer::Perceptual) => "R'G'B'",
            (Self::Ya, Transfer::Perceptual) => "Y'A",
            (Self::Y, Transfer::Perceptual) => "Y'",
        }
    }
}

/// Transfer curve applied to color channels (never to alpha).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Transfer {
    /// Linear light.
    Linear,
    /// sRGB perceptual encoding (primed names, e.g. `R'G'B'A u8`).
    Perceptual,
}

/// Opaque per-pixel encoding descriptor identified by its canonical name.
///
/// Two formats are equal iff their canonical names match.
#[derive(Clone, Debug)]
pub struct PixelFormat {
    name: Arc<str>,
    model: ColorModel,
    channel_type: ChannelType,
    transfer: Transfer,
}

impl PixelFormat {
    fn from_parts(model: ColorModel, transfer: Transfer, channel_type: ChannelType) -> Self {
        let name = format!("{} {}", model.prefix(transfer), channel_type.suffix());
        Self {
            name: name.into(),
            model,
            channel_type,
            transfer,
        }
    }

    /// Canonical name, e.g. `"RGBA float"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bytes needed to encode one pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        self.model.channels() * self.channel_type.bytes()
    }

    /// Channel layout.
    pub fn model(&self) -> ColorModel {
        self.model
    }

    /// Storage type of each channel.
    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    /// Transfer curve of color channels.
    pub fn transfer(&self) -> Transfer {
        self.transfer
    }

    /// Bytes needed to encode `width * height` pixels, or `None` on overflow.
    pub fn byte_len(&self, width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(self.bytes_per_pixel()))
    }
}

impl PartialEq for PixelFormat {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for PixelFormat {}

impl std::hash::Hash for PixelFormat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Catalog of supported encodings.
///
/// Covers every combination of color model (`RGBA`, `RGB`, `YA`, `Y`), transfer (linear or
/// primed/perceptual) and channel type (`u8`, `u16`, `float`).
#[derive(Clone, Debug)]
pub struct FormatRegistry {
    by_name: BTreeMap<String, PixelFormat>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FormatRegistry {
    /// Registry with every built-in encoding.
    pub fn builtin() -> Self {
        let mut by_name = BTreeMap::new();
        for model in [ColorModel::Rgba, ColorModel::Rgb, ColorModel::Ya, ColorModel::Y] {
            for transfer in [Transfer::Linear, Transfer::Perceptual] {
                for ty in [ChannelType::U8, ChannelType::U16, ChannelType::Float] {
                    let f = PixelFormat::from_parts(model, transfer, ty);
                    by_name.insert(f.name().to_owned(), f);
                }
            }
        }
        Self { by_name }
    }

    /// Resolve a canonical name. Side-effect free.
    pub fn lookup(&self, name: &str) -> PixResult<PixelFormat> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| PixError::UnknownFormat(name.to_owned()))
    }

    /// All canonical names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/format/pixel.rs"]
mod tests;
