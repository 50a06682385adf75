use crate::buffer::raster::Raster;
use crate::foundation::core::Rectangle;
use crate::foundation::error::PixResult;
use crate::foundation::math::{Fnv1a64, hash_unit, smoothstep01, srgb_to_linear};
use crate::graph::value::ValueType;
use crate::ops::catalog::{
    Operation, OperationCatalog, OperationKind, ProcessContext, PropertySpec, RegionContext,
    ResolvedProperties,
};
use crate::paint::color::Color;

pub(crate) fn register(catalog: &mut OperationCatalog) {
    catalog.register(BufferSourceOp);
    catalog.register(ColorOp);
    catalog.register(PlasmaOp);
    catalog.register(PerlinNoiseOp);
}

/// Reads pixels from a caller-owned [`crate::Buffer`].
pub struct BufferSourceOp;

impl Operation for BufferSourceOp {
    fn name(&self) -> &str {
        "gegl:buffer-source"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Source
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![PropertySpec::required(
            "buffer",
            ValueType::Buffer,
            "buffer to read pixels from",
        )]
    }

    fn defined_region(&self, ctx: &RegionContext<'_>) -> PixResult<Rectangle> {
        Ok(ctx.props.buffer("buffer")?.extent())
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        ctx.props.buffer("buffer")?.read_raster(ctx.roi)
    }
}

/// Uniform color over the infinite plane.
pub struct ColorOp;

impl Operation for ColorOp {
    fn name(&self) -> &str {
        "gegl:color"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Source
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![PropertySpec::optional(
            "value",
            Color::from_linear_rgba(0.0, 0.0, 0.0, 1.0),
            "color to fill with",
        )]
    }

    fn defined_region(&self, _ctx: &RegionContext<'_>) -> PixResult<Rectangle> {
        Ok(Rectangle::INFINITE_PLANE)
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let px = ctx.props.color("value")?.to_pixel();
        Ok(Raster::generate(ctx.roi, ctx.parallel, |_, _| px))
    }
}

fn extent_from(props: &ResolvedProperties) -> PixResult<Rectangle> {
    let dim = |name: &str| -> PixResult<u32> {
        let v = props.int(name)?;
        u32::try_from(v).map_err(|_| props.invalid(name, format!("must be in 0..=u32::MAX, got {v}")))
    };
    Ok(Rectangle::new(0, 0, dim("width")?, dim("height")?))
}

fn value_noise(seed: u64, x: f32, y: f32, salt: u64) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let tx = smoothstep01(x - x0);
    let ty = smoothstep01(y - y0);
    let (ix, iy) = (x0 as i64, y0 as i64);
    let a = hash_unit(seed, ix, iy, salt);
    let b = hash_unit(seed, ix + 1, iy, salt);
    let c = hash_unit(seed, ix, iy + 1, salt);
    let d = hash_unit(seed, ix + 1, iy + 1, salt);
    let top = a + (b - a) * tx;
    let bottom = c + (d - c) * tx;
    top + (bottom - top) * ty
}

/// Plasma clouds: fractal value noise per channel over `width x height`.
pub struct PlasmaOp;

impl Operation for PlasmaOp {
    fn name(&self) -> &str {
        "gegl:plasma"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Source
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::optional("width", 1024i64, "width of the generated area"),
            PropertySpec::optional("height", 768i64, "height of the generated area"),
            PropertySpec::optional("seed", 0i64, "random seed"),
            PropertySpec::optional("turbulence", 1.0f64, "roughness of the clouds"),
        ]
    }

    fn defined_region(&self, ctx: &RegionContext<'_>) -> PixResult<Rectangle> {
        extent_from(ctx.props)
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let extent = extent_from(ctx.props)?;
        let turbulence = ctx.props.double("turbulence")?;
        if !turbulence.is_finite() || turbulence < 0.0 {
            return Err(ctx.props.invalid("turbulence", "must be a finite value >= 0"));
        }
        let mut h = Fnv1a64::new(0);
        h.write_i64(ctx.props.int("seed")?);
        let seed = h.finish();

        let decay = (0.5 * turbulence as f32).clamp(0.05, 0.95);
        let side = u64::from(extent.width.max(extent.height).max(2));
        let top = side.next_power_of_two() as f32 / 2.0;
        let roi = ctx.roi.intersect(extent);
        let mut out = Raster::generate(roi, ctx.parallel, |x, y| {
            let mut px = [0.0f32, 0.0, 0.0, 1.0];
            for (c, v) in px.iter_mut().take(3).enumerate() {
                let mut cell = top;
                let mut amp = 1.0f32;
                let mut sum = 0.0f32;
                let mut total = 0.0f32;
                while cell >= 1.0 {
                    sum += amp * value_noise(seed, x as f32 / cell, y as f32 / cell, c as u64);
                    total += amp;
                    amp *= decay;
                    cell /= 2.0;
                }
                *v = srgb_to_linear(sum / total);
            }
            px
        });
        if roi != ctx.roi {
            out = out.crop(ctx.roi);
        }
        Ok(out)
    }
}

fn gradient_dot(seed: u64, ix: i64, iy: i64, dx: f32, dy: f32) -> f32 {
    let angle = hash_unit(seed, ix, iy, 0x5eed) * std::f32::consts::TAU;
    angle.cos() * dx + angle.sin() * dy
}

fn perlin2(seed: u64, x: f32, y: f32) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let (fx, fy) = (x - x0, y - y0);
    let (ix, iy) = (x0 as i64, y0 as i64);
    let n00 = gradient_dot(seed, ix, iy, fx, fy);
    let n10 = gradient_dot(seed, ix + 1, iy, fx - 1.0, fy);
    let n01 = gradient_dot(seed, ix, iy + 1, fx, fy - 1.0);
    let n11 = gradient_dot(seed, ix + 1, iy + 1, fx - 1.0, fy - 1.0);
    let (u, v) = (smoothstep01(fx), smoothstep01(fy));
    let top = n00 + (n10 - n00) * u;
    let bottom = n01 + (n11 - n01) * u;
    top + (bottom - top) * v
}

/// Gray Perlin noise over the infinite plane.
pub struct PerlinNoiseOp;

impl Operation for PerlinNoiseOp {
    fn name(&self) -> &str {
        "gegl:perlin-noise"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Source
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::optional("alpha", 1.2f64, "amplitude falloff between octaves"),
            PropertySpec::optional("scale", 1.8f64, "frequency growth between octaves"),
            PropertySpec::optional("zoff", -1.0f64, "slice through the noise volume"),
            PropertySpec::optional("n", 3i64, "number of octaves"),
        ]
    }

    fn defined_region(&self, _ctx: &RegionContext<'_>) -> PixResult<Rectangle> {
        Ok(Rectangle::INFINITE_PLANE)
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let alpha = ctx.props.double("alpha")? as f32;
        let scale = ctx.props.double("scale")? as f32;
        let octaves = ctx.props.int("n")?;
        if !(1..=16).contains(&octaves) {
            return Err(ctx.props.invalid("n", "must be in 1..=16"));
        }
        if alpha <= 0.0 {
            return Err(ctx.props.invalid("alpha", "must be > 0"));
        }
        let mut h = Fnv1a64::new(1);
        h.write_u64(ctx.props.double("zoff")?.to_bits());
        let seed = h.finish();

        Ok(Raster::generate(ctx.roi, ctx.parallel, |x, y| {
            let (mut px, mut py) = (x as f32 / 50.0, y as f32 / 50.0);
            let mut sum = 0.0f32;
            let mut amp = 1.0f32;
            for _ in 0..octaves {
                sum += perlin2(seed, px, py) * amp;
                amp /= alpha;
                px *= scale;
                py *= scale;
            }
            let v = (sum * 0.5 + 0.5).clamp(0.0, 1.0);
            [v, v, v, 1.0]
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/source.rs"]
mod tests;
