use crate::foundation::math::{linear_to_srgb, luminance, srgb_to_linear};
use crate::format::pixel::{ChannelType, ColorModel, PixelFormat, Transfer};

fn read_channel(ty: ChannelType, bytes: &[u8]) -> f32 {
    match ty {
        ChannelType::U8 => f32::from(bytes[0]) / 255.0,
        ChannelType::U16 => f32::from(u16::from_ne_bytes([bytes[0], bytes[1]])) / 65535.0,
        ChannelType::Float => f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

fn write_channel(ty: ChannelType, v: f32, out: &mut [u8]) {
    match ty {
        ChannelType::U8 => out[0] = (v.clamp(0.0, 1.0) * 255.0).round() as u8,
        ChannelType::U16 => {
            let q = (v.clamp(0.0, 1.0) * 65535.0).round() as u16;
            out[..2].copy_from_slice(&q.to_ne_bytes());
        }
        ChannelType::Float => out[..4].copy_from_slice(&v.to_ne_bytes()),
    }
}

/// Decode tightly packed pixels of `format` into linear straight-alpha RGBA.
///
/// `bytes.len()` must equal `out.len() * format.bytes_per_pixel()`.
pub(crate) fn decode_pixels(format: &PixelFormat, bytes: &[u8], out: &mut [[f32; 4]]) {
    let ty = format.channel_type();
    let cb = ty.bytes();
    let bpp = format.bytes_per_pixel();
    let decode_color = |v: f32| match format.transfer() {
        Transfer::Linear => v,
        Transfer::Perceptual => srgb_to_linear(v),
    };

    for (px, src) in out.iter_mut().zip(bytes.chunks_exact(bpp)) {
        let ch = |i: usize| read_channel(ty, &src[i * cb..(i + 1) * cb]);
        *px = match format.model() {
            ColorModel::Rgba => [decode_color(ch(0)), decode_color(ch(1)), decode_color(ch(2)), ch(3)],
            ColorModel::Rgb => [decode_color(ch(0)), decode_color(ch(1)), decode_color(ch(2)), 1.0],
            ColorModel::Ya => {
                let y = decode_color(ch(0));
                [y, y, y, ch(1)]
            }
            ColorModel::Y => {
                let y = decode_color(ch(0));
                [y, y, y, 1.0]
            }
        };
    }
}

/// Encode linear straight-alpha RGBA into tightly packed pixels of `format`.
///
/// `out.len()` must equal `px.len() * format.bytes_per_pixel()`.
pub(crate) fn encode_pixels(format: &PixelFormat, px: &[[f32; 4]], out: &mut [u8]) {
    let ty = format.channel_type();
    let cb = ty.bytes();
    let bpp = format.bytes_per_pixel();
    let encode_color = |v: f32| match format.transfer() {
        Transfer::Linear => v,
        Transfer::Perceptual => linear_to_srgb(v.max(0.0)),
    };

    for (p, dst) in px.iter().zip(out.chunks_exact_mut(bpp)) {
        let mut put = |i: usize, v: f32| write_channel(ty, v, &mut dst[i * cb..(i + 1) * cb]);
        match format.model() {
            ColorModel::Rgba => {
                put(0, encode_color(p[0]));
                put(1, encode_color(p[1]));
                put(2, encode_color(p[2]));
                put(3, p[3]);
            }
            ColorModel::Rgb => {
                put(0, encode_color(p[0]));
                put(1, encode_color(p[1]));
                put(2, encode_color(p[2]));
            }
            ColorModel::Ya => {
                put(0, encode_color(luminance(*p)));
                put(1, p[3]);
            }
            ColorModel::Y => put(0, encode_color(luminance(*p))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/format/convert.rs"]
mod tests;
