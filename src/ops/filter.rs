use crate::buffer::raster::Raster;
use crate::foundation::core::Rectangle;
use crate::foundation::error::PixResult;
use crate::foundation::math::{hash_unit, linear_to_srgb, luminance, srgb_to_linear};
use crate::graph::node::Pin;
use crate::graph::value::ValueType;
use crate::ops::catalog::{
    Operation, OperationCatalog, OperationKind, ProcessContext, PropertySpec, RegionContext,
    ResolvedProperties,
};

pub(crate) fn register(catalog: &mut OperationCatalog) {
    catalog.register(ThresholdOp);
    catalog.register(InvertLinearOp);
    catalog.register(BrightnessContrastOp);
    catalog.register(GaussianBlurOp);
    catalog.register(EdgeSobelOp);
    catalog.register(ImageGradientOp);
    catalog.register(PixelizeOp);
    catalog.register(DitherOp);
    catalog.register(NoisePickOp);
    catalog.register(NormalMapOp);
    catalog.register(CropOp);
}

/// Apply `f` to every input pixel of the region of interest.
fn map_pixels(
    ctx: &ProcessContext<'_>,
    f: impl Fn([f32; 4]) -> [f32; 4] + Send + Sync,
) -> Raster {
    let mut out = ctx.input_or_empty().crop(ctx.roi);
    out.for_each_row(ctx.parallel, |_, row| {
        for px in row.iter_mut() {
            *px = f(*px);
        }
    });
    out
}

fn premultiply(px: [f32; 4]) -> [f32; 4] {
    [px[0] * px[3], px[1] * px[3], px[2] * px[3], px[3]]
}

fn unpremultiply(px: [f32; 4]) -> [f32; 4] {
    if px[3] <= f32::EPSILON {
        return [0.0; 4];
    }
    [px[0] / px[3], px[1] / px[3], px[2] / px[3], px[3]]
}

/// Binary luminance threshold: pixels inside `[value, high]` become white, others black.
pub struct ThresholdOp;

impl Operation for ThresholdOp {
    fn name(&self) -> &str {
        "gegl:threshold"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::optional("value", 0.5f64, "lower threshold"),
            PropertySpec::optional("high", 1.0f64, "upper threshold"),
        ]
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let low = ctx.props.double("value")? as f32;
        let high = ctx.props.double("high")? as f32;
        Ok(map_pixels(ctx, |px| {
            let l = luminance(px);
            let v = if l >= low && l <= high { 1.0 } else { 0.0 };
            [v, v, v, px[3]]
        }))
    }
}

/// `1 - c` on each color channel in linear light.
pub struct InvertLinearOp;

impl Operation for InvertLinearOp {
    fn name(&self) -> &str {
        "gegl:invert-linear"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        Ok(map_pixels(ctx, |px| {
            [1.0 - px[0], 1.0 - px[1], 1.0 - px[2], px[3]]
        }))
    }
}

/// `(c - 0.5) * contrast + brightness + 0.5` per color channel.
pub struct BrightnessContrastOp;

impl Operation for BrightnessContrastOp {
    fn name(&self) -> &str {
        "gegl:brightness-contrast"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::optional("contrast", 1.0f64, "contrast multiplier"),
            PropertySpec::optional("brightness", 0.0f64, "brightness offset"),
        ]
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let contrast = ctx.props.double("contrast")? as f32;
        let brightness = ctx.props.double("brightness")? as f32;
        let f = move |c: f32| (c - 0.5) * contrast + brightness + 0.5;
        Ok(map_pixels(ctx, |px| [f(px[0]), f(px[1]), f(px[2]), px[3]]))
    }
}

fn gaussian_kernel(sigma: f64) -> Vec<f32> {
    if sigma.is_nan() || sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (3.0 * sigma).ceil() as i64;
    let denom = 2.0 * sigma * sigma;
    let mut k: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f64) / denom).exp() as f32)
        .collect();
    let sum: f32 = k.iter().sum();
    for v in &mut k {
        *v /= sum;
    }
    k
}

fn blur_margin(sigma: f64) -> u32 {
    if sigma > 0.0 {
        (3.0 * sigma).ceil().min(f64::from(u16::MAX)) as u32
    } else {
        0
    }
}

fn blur_sigmas(props: &ResolvedProperties) -> PixResult<(f64, f64)> {
    let sx = props.double("std-dev-x")?;
    let sy = props.double("std-dev-y")?;
    for (name, v) in [("std-dev-x", sx), ("std-dev-y", sy)] {
        if !v.is_finite() || !(0.0..=1500.0).contains(&v) {
            return Err(props.invalid(name, format!("must be in 0..=1500, got {v}")));
        }
    }
    Ok((sx, sy))
}

/// Separable gaussian blur on premultiplied color; kernel radius `ceil(3 sigma)`.
pub struct GaussianBlurOp;

impl Operation for GaussianBlurOp {
    fn name(&self) -> &str {
        "gegl:gaussian-blur"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::optional("std-dev-x", 1.5f64, "horizontal standard deviation"),
            PropertySpec::optional("std-dev-y", 1.5f64, "vertical standard deviation"),
        ]
    }

    fn required_region(&self, props: &ResolvedProperties, _pin: Pin, roi: Rectangle) -> Rectangle {
        match blur_sigmas(props) {
            Ok((sx, sy)) => roi.expand(blur_margin(sx), blur_margin(sy)),
            Err(_) => roi,
        }
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let (sx, sy) = blur_sigmas(ctx.props)?;
        let input = ctx.input_or_empty();
        let kx = gaussian_kernel(sx);
        let ky = gaussian_kernel(sy);
        let rx = (kx.len() / 2) as i64;
        let ry = (ky.len() / 2) as i64;

        let band = ctx.roi.expand(0, ry as u32);
        let horizontal = Raster::generate(band, ctx.parallel, |x, y| {
            let mut acc = [0.0f32; 4];
            for (k, w) in kx.iter().enumerate() {
                let p = premultiply(input.get(x + k as i64 - rx, y));
                for c in 0..4 {
                    acc[c] += w * p[c];
                }
            }
            acc
        });
        Ok(Raster::generate(ctx.roi, ctx.parallel, |x, y| {
            let mut acc = [0.0f32; 4];
            for (k, w) in ky.iter().enumerate() {
                let p = horizontal.get(x, y + k as i64 - ry);
                for c in 0..4 {
                    acc[c] += w * p[c];
                }
            }
            unpremultiply(acc)
        }))
    }
}

const SOBEL_X: [[f32; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_Y: [[f32; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

fn convolve3(src: &Raster, x: i64, y: i64, k: &[[f32; 3]; 3]) -> [f32; 3] {
    let mut acc = [0.0f32; 3];
    for (j, row) in k.iter().enumerate() {
        for (i, w) in row.iter().enumerate() {
            if *w == 0.0 {
                continue;
            }
            let p = src.get(x + i as i64 - 1, y + j as i64 - 1);
            for c in 0..3 {
                acc[c] += w * p[c];
            }
        }
    }
    acc
}

/// Sobel edge detector on each color channel.
pub struct EdgeSobelOp;

impl Operation for EdgeSobelOp {
    fn name(&self) -> &str {
        "gegl:edge-sobel"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::optional("horizontal", true, "detect horizontal edges"),
            PropertySpec::optional("vertical", true, "detect vertical edges"),
            PropertySpec::optional("keep-sign", false, "keep the sign of single-direction results"),
        ]
    }

    fn required_region(&self, _props: &ResolvedProperties, _pin: Pin, roi: Rectangle) -> Rectangle {
        roi.expand(1, 1)
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let horizontal = ctx.props.boolean("horizontal")?;
        let vertical = ctx.props.boolean("vertical")?;
        let keep_sign = ctx.props.boolean("keep-sign")?;
        let input = ctx.input_or_empty();
        Ok(Raster::generate(ctx.roi, ctx.parallel, |x, y| {
            let gx = if horizontal {
                convolve3(&input, x, y, &SOBEL_X)
            } else {
                [0.0; 3]
            };
            let gy = if vertical {
                convolve3(&input, x, y, &SOBEL_Y)
            } else {
                [0.0; 3]
            };
            let mut out = [0.0f32, 0.0, 0.0, input.get(x, y)[3]];
            for c in 0..3 {
                out[c] = match (horizontal && vertical, keep_sign) {
                    (true, _) => (gx[c] * gx[c] + gy[c] * gy[c]).sqrt() / 4.0,
                    (false, true) => (gx[c] + gy[c]) / 8.0 + 0.5,
                    (false, false) => (gx[c] + gy[c]).abs() / 4.0,
                };
            }
            out
        }))
    }
}

/// Luminance gradient magnitude or direction.
pub struct ImageGradientOp;

impl Operation for ImageGradientOp {
    fn name(&self) -> &str {
        "gegl:image-gradient"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![PropertySpec::optional(
            "output-mode",
            "magnitude",
            "'magnitude' or 'direction'",
        )]
    }

    fn required_region(&self, _props: &ResolvedProperties, _pin: Pin, roi: Rectangle) -> Rectangle {
        roi.expand(1, 1)
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let direction = match ctx.props.string("output-mode")? {
            "magnitude" => false,
            "direction" => true,
            other => {
                return Err(ctx
                    .props
                    .invalid("output-mode", format!("unknown mode '{other}'")));
            }
        };
        let input = ctx.input_or_empty();
        let lum = |x: i64, y: i64| luminance(input.get(x, y));
        Ok(Raster::generate(ctx.roi, ctx.parallel, |x, y| {
            let gx = (lum(x + 1, y) - lum(x - 1, y)) * 0.5;
            let gy = (lum(x, y + 1) - lum(x, y - 1)) * 0.5;
            let v = if direction {
                (gy.atan2(gx) / std::f32::consts::TAU).rem_euclid(1.0)
            } else {
                (gx * gx + gy * gy).sqrt()
            };
            [v, v, v, 1.0]
        }))
    }
}

fn block_sizes(props: &ResolvedProperties) -> PixResult<(u32, u32)> {
    let get = |name: &str| -> PixResult<u32> {
        let v = props.int(name)?;
        u32::try_from(v)
            .ok()
            .filter(|v| (1..=2048).contains(v))
            .ok_or_else(|| props.invalid(name, format!("must be in 1..=2048, got {v}")))
    };
    Ok((get("size-x")?, get("size-y")?))
}

fn align_to_blocks(roi: Rectangle, bw: u32, bh: u32) -> Rectangle {
    if roi.is_empty() {
        return roi;
    }
    let (bw, bh) = (i64::from(bw), i64::from(bh));
    let x0 = i64::from(roi.x).div_euclid(bw) * bw;
    let y0 = i64::from(roi.y).div_euclid(bh) * bh;
    let x1 = (roi.right() + bw - 1).div_euclid(bw) * bw;
    let y1 = (roi.bottom() + bh - 1).div_euclid(bh) * bh;
    Rectangle::from_edges(x0, y0, x1, y1)
}

/// Block mosaic on the absolute `size-x x size-y` grid; each block takes the mean of its
/// defined pixels.
pub struct PixelizeOp;

impl Operation for PixelizeOp {
    fn name(&self) -> &str {
        "gegl:pixelize"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::optional("size-x", 16i64, "block width"),
            PropertySpec::optional("size-y", 16i64, "block height"),
        ]
    }

    fn required_region(&self, props: &ResolvedProperties, _pin: Pin, roi: Rectangle) -> Rectangle {
        match block_sizes(props) {
            Ok((bw, bh)) => align_to_blocks(roi, bw, bh),
            Err(_) => roi,
        }
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let (bw, bh) = block_sizes(ctx.props)?;
        let input = ctx.input_or_empty();
        let data = input.rect();
        let (bw, bh) = (i64::from(bw), i64::from(bh));
        let block_mean = |bx: i64, by: i64| -> [f32; 4] {
            let block = Rectangle::new(bx as i32, by as i32, bw as u32, bh as u32).intersect(data);
            if block.is_empty() {
                return [0.0; 4];
            }
            let mut acc = [0.0f32; 4];
            for y in i64::from(block.y)..block.bottom() {
                for x in i64::from(block.x)..block.right() {
                    let p = premultiply(input.get(x, y));
                    for c in 0..4 {
                        acc[c] += p[c];
                    }
                }
            }
            let n = block.area() as f32;
            unpremultiply(acc.map(|v| v / n))
        };
        Ok(Raster::generate(ctx.roi, ctx.parallel, |x, y| {
            block_mean(x.div_euclid(bw) * bw, y.div_euclid(bh) * bh)
        }))
    }
}

const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

fn quantize(v: f32, levels: u32, bias: f32) -> f32 {
    let steps = (levels - 1) as f32;
    ((v.clamp(0.0, 1.0) * steps + bias).floor().min(steps)) / steps
}

/// Ordered (Bayer 8x8) dither to a fixed number of levels per channel in perceptual space.
pub struct DitherOp;

impl Operation for DitherOp {
    fn name(&self) -> &str {
        "gegl:dither"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::optional("red-levels", 6i64, "levels for the red channel"),
            PropertySpec::optional("green-levels", 7i64, "levels for the green channel"),
            PropertySpec::optional("blue-levels", 6i64, "levels for the blue channel"),
            PropertySpec::optional("alpha-levels", 256i64, "levels for the alpha channel"),
        ]
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let mut levels = [0u32; 4];
        for (slot, name) in levels.iter_mut().zip([
            "red-levels",
            "green-levels",
            "blue-levels",
            "alpha-levels",
        ]) {
            let v = ctx.props.int(name)?;
            *slot = u32::try_from(v)
                .ok()
                .filter(|v| (2..=65536).contains(v))
                .ok_or_else(|| ctx.props.invalid(name, format!("must be in 2..=65536, got {v}")))?;
        }
        let mut out = ctx.input_or_empty().crop(ctx.roi);
        let x0 = i64::from(ctx.roi.x);
        out.for_each_row(ctx.parallel, |y, row| {
            for (i, px) in row.iter_mut().enumerate() {
                let x = x0 + i as i64;
                let bias = (f32::from(BAYER8[y.rem_euclid(8) as usize][x.rem_euclid(8) as usize])
                    + 0.5)
                    / 64.0;
                for c in 0..3 {
                    px[c] = srgb_to_linear(quantize(linear_to_srgb(px[c]), levels[c], bias));
                }
                px[3] = quantize(px[3], levels[3], bias);
            }
        });
        Ok(out)
    }
}

fn noise_pick_repeat(props: &ResolvedProperties) -> PixResult<u32> {
    let v = props.int("repeat")?;
    u32::try_from(v)
        .ok()
        .filter(|v| (1..=100).contains(v))
        .ok_or_else(|| props.invalid("repeat", format!("must be in 1..=100, got {v}")))
}

/// Replace a random share of pixels with a random 3x3 neighbour, `repeat` times.
pub struct NoisePickOp;

impl Operation for NoisePickOp {
    fn name(&self) -> &str {
        "gegl:noise-pick"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::optional("pct-random", 50.0f64, "percentage of pixels to replace"),
            PropertySpec::optional("repeat", 1i64, "number of passes"),
            PropertySpec::optional("seed", 0i64, "random seed"),
        ]
    }

    fn required_region(&self, props: &ResolvedProperties, _pin: Pin, roi: Rectangle) -> Rectangle {
        match noise_pick_repeat(props) {
            Ok(r) => roi.expand(r, r),
            Err(_) => roi,
        }
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let pct = ctx.props.double("pct-random")?;
        if !(0.0..=100.0).contains(&pct) {
            return Err(ctx.props.invalid("pct-random", "must be in 0..=100"));
        }
        let chance = (pct / 100.0) as f32;
        let repeat = noise_pick_repeat(ctx.props)?;
        let seed = ctx.props.int("seed")? as u64;

        let mut current = ctx.input_or_empty().crop(ctx.roi.expand(repeat, repeat));
        for pass in 0..repeat {
            let region = current.rect().shrink(1, 1);
            let salt = u64::from(pass) * 2;
            let src = &current;
            let next = Raster::generate(region, ctx.parallel, |x, y| {
                if hash_unit(seed, x, y, salt) >= chance {
                    return src.get(x, y);
                }
                let pick = (hash_unit(seed, x, y, salt + 1) * 9.0) as i64;
                src.get(x + pick.min(8) % 3 - 1, y + pick.min(8) / 3 - 1)
            });
            current = next;
        }
        Ok(current.crop(ctx.roi))
    }
}

/// Tangent-space normal map from luminance heights.
pub struct NormalMapOp;

impl Operation for NormalMapOp {
    fn name(&self) -> &str {
        "gegl:normal-map"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::optional("scale", 10.0f64, "height scale"),
            PropertySpec::optional("flip-x", false, "flip the X component"),
            PropertySpec::optional("flip-y", false, "flip the Y component"),
        ]
    }

    fn required_region(&self, _props: &ResolvedProperties, _pin: Pin, roi: Rectangle) -> Rectangle {
        roi.expand(1, 1)
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let scale = ctx.props.double("scale")? as f32;
        let fx = if ctx.props.boolean("flip-x")? { -1.0 } else { 1.0 };
        let fy = if ctx.props.boolean("flip-y")? { -1.0 } else { 1.0 };
        let input = ctx.input_or_empty();
        let h = |x: i64, y: i64| luminance(input.get(x, y));
        Ok(Raster::generate(ctx.roi, ctx.parallel, |x, y| {
            let dx = (h(x + 1, y) - h(x - 1, y)) * 0.5 * scale * fx;
            let dy = (h(x, y + 1) - h(x, y - 1)) * 0.5 * scale * fy;
            let len = (dx * dx + dy * dy + 1.0).sqrt();
            [
                -dx / len * 0.5 + 0.5,
                -dy / len * 0.5 + 0.5,
                1.0 / len * 0.5 + 0.5,
                input.get(x, y)[3],
            ]
        }))
    }
}

struct CropParams {
    rect: Rectangle,
    reset_origin: bool,
}

fn crop_params(props: &ResolvedProperties) -> PixResult<CropParams> {
    let x = props.double("x")?;
    let y = props.double("y")?;
    let w = props.double("width")?;
    let h = props.double("height")?;
    for (name, v) in [("x", x), ("y", y), ("width", w), ("height", h)] {
        if !v.is_finite() {
            return Err(props.invalid(name, "must be finite"));
        }
    }
    if w < 0.0 {
        return Err(props.invalid("width", "must be >= 0"));
    }
    if h < 0.0 {
        return Err(props.invalid("height", "must be >= 0"));
    }
    Ok(CropParams {
        rect: Rectangle::covering(kurbo::Rect::new(x, y, x + w, y + h)),
        reset_origin: props.boolean("reset-origin")?,
    })
}

/// Restrict the input to a rectangle, optionally moving the rectangle to the origin.
pub struct CropOp;

impl Operation for CropOp {
    fn name(&self) -> &str {
        "gegl:crop"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::optional("x", 0.0f64, "left edge"),
            PropertySpec::optional("y", 0.0f64, "top edge"),
            PropertySpec::optional("width", 0.0f64, "width"),
            PropertySpec::optional("height", 0.0f64, "height"),
            PropertySpec::optional("reset-origin", false, "move the result to (0, 0)"),
        ]
    }

    fn defined_region(&self, ctx: &RegionContext<'_>) -> PixResult<Rectangle> {
        let p = crop_params(ctx.props)?;
        let mut rect = match ctx.input {
            Some(input) => p.rect.intersect(input),
            None => p.rect,
        };
        if p.reset_origin {
            rect = rect.translate(-i64::from(p.rect.x), -i64::from(p.rect.y));
        }
        Ok(rect)
    }

    fn required_region(&self, props: &ResolvedProperties, _pin: Pin, roi: Rectangle) -> Rectangle {
        match crop_params(props) {
            Ok(p) if p.reset_origin => roi.translate(i64::from(p.rect.x), i64::from(p.rect.y)),
            _ => roi,
        }
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let p = crop_params(ctx.props)?;
        let input = ctx.input_or_empty();
        let (ox, oy) = if p.reset_origin {
            (i64::from(p.rect.x), i64::from(p.rect.y))
        } else {
            (0, 0)
        };
        let keep = p.rect;
        Ok(Raster::generate(ctx.roi, ctx.parallel, |x, y| {
            let (sx, sy) = (x + ox, y + oy);
            if keep.contains_point(sx, sy) {
                input.get(sx, sy)
            } else {
                [0.0; 4]
            }
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/filter.rs"]
mod tests;
