use std::io::BufWriter;

use anyhow::Context;

use crate::buffer::raster::Raster;
use crate::foundation::core::Rectangle;
use crate::foundation::error::{PixError, PixResult};
use crate::foundation::math::{linear_to_srgb, srgb_to_linear};
use crate::graph::value::ValueType;
use crate::ops::catalog::{
    Operation, OperationCatalog, OperationKind, ProcessContext, PropertySpec, RegionContext,
    ResolvedProperties,
};

pub(crate) fn register(catalog: &mut OperationCatalog) {
    catalog.register(ImageLoadOp::new("gegl:png-load"));
    catalog.register(ImageLoadOp::new("gegl:jpg-load"));
    catalog.register(SvgLoadOp);
    catalog.register(PngSaveOp);
    catalog.register(JpgSaveOp);
}

fn codec_error(operation: &str, err: anyhow::Error) -> PixError {
    PixError::operation(operation, format!("{err:#}"))
}

fn path_property() -> PropertySpec {
    PropertySpec::required("path", ValueType::String, "file path")
}

/// Decode an encoded raster image into the working representation at origin `(0, 0)`.
#[tracing::instrument(level = "debug", skip(bytes), fields(len = bytes.len()))]
pub(crate) fn decode_image(bytes: &[u8], parallel: bool) -> anyhow::Result<Raster> {
    let img = image::load_from_memory(bytes)
        .context("decode image from memory")?
        .to_rgba32f();
    let (width, height) = img.dimensions();
    let src = img.into_raw();
    let mut out = Raster::new(Rectangle::new(0, 0, width, height));
    let w = width as usize;
    out.for_each_row(parallel, |y, row| {
        let base = y as usize * w * 4;
        for (i, px) in row.iter_mut().enumerate() {
            let s = &src[base + i * 4..base + i * 4 + 4];
            *px = [
                srgb_to_linear(s[0]),
                srgb_to_linear(s[1]),
                srgb_to_linear(s[2]),
                s[3].clamp(0.0, 1.0),
            ];
        }
    });
    Ok(out)
}

/// PNG or JPEG file loader, chosen by content.
pub struct ImageLoadOp {
    name: &'static str,
}

impl ImageLoadOp {
    fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Operation for ImageLoadOp {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Source
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![path_property()]
    }

    fn defined_region(&self, ctx: &RegionContext<'_>) -> PixResult<Rectangle> {
        let path = ctx.props.string("path")?;
        let (w, h) = image::image_dimensions(path)
            .with_context(|| format!("read image header of '{path}'"))
            .map_err(|e| codec_error(self.name, e))?;
        Ok(Rectangle::new(0, 0, w, h))
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(operation = self.name))]
    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let path = ctx.props.string("path")?;
        let raster = std::fs::read(path)
            .with_context(|| format!("read '{path}'"))
            .and_then(|bytes| decode_image(&bytes, ctx.parallel))
            .map_err(|e| codec_error(self.name, e))?;
        Ok(raster.crop(ctx.roi))
    }
}

fn parse_svg(path: &str) -> anyhow::Result<usvg::Tree> {
    let bytes = std::fs::read(path).with_context(|| format!("read '{path}'"))?;
    let opts = usvg::Options::default();
    usvg::Tree::from_data(&bytes, &opts).context("parse svg tree")
}

fn svg_size(tree: &usvg::Tree, props: &ResolvedProperties) -> PixResult<(u32, u32)> {
    fn dim(props: &ResolvedProperties, name: &str, intrinsic: f32) -> PixResult<u32> {
        let v = props.int(name)?;
        if v > 0 {
            return u32::try_from(v).map_err(|_| props.invalid(name, "too large"));
        }
        if !intrinsic.is_finite() || intrinsic <= 0.0 {
            return Err(props.invalid(name, "svg has invalid intrinsic size"));
        }
        Ok((intrinsic.ceil() as u32).max(1))
    }

    let size = tree.size();
    let w = dim(props, "width", size.width())?;
    let h = dim(props, "height", size.height())?;
    const MAX_DIM: u32 = 16_384;
    if w > MAX_DIM || h > MAX_DIM {
        return Err(PixError::operation(
            props.operation(),
            format!("svg raster size too large: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"),
        ));
    }
    Ok((w, h))
}

/// SVG file loader, rasterized with resvg at its intrinsic size or the requested one.
pub struct SvgLoadOp;

impl Operation for SvgLoadOp {
    fn name(&self) -> &str {
        "gegl:svg-load"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Source
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            path_property(),
            PropertySpec::optional("width", -1i64, "raster width, -1 for the intrinsic width"),
            PropertySpec::optional("height", -1i64, "raster height, -1 for the intrinsic height"),
        ]
    }

    fn defined_region(&self, ctx: &RegionContext<'_>) -> PixResult<Rectangle> {
        let tree = parse_svg(ctx.props.string("path")?).map_err(|e| codec_error(self.name(), e))?;
        let (w, h) = svg_size(&tree, ctx.props)?;
        Ok(Rectangle::new(0, 0, w, h))
    }

    #[tracing::instrument(level = "debug", skip(self, ctx))]
    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let tree = parse_svg(ctx.props.string("path")?).map_err(|e| codec_error(self.name(), e))?;
        let (w, h) = svg_size(&tree, ctx.props)?;
        let mut pixmap = resvg::tiny_skia::Pixmap::new(w, h)
            .ok_or_else(|| ctx.fail("failed to allocate svg pixmap"))?;
        let sx = w as f32 / tree.size().width();
        let sy = h as f32 / tree.size().height();
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::from_scale(sx, sy),
            &mut pixmap.as_mut(),
        );

        let premul = pixmap.data();
        let full = Rectangle::new(0, 0, w, h);
        let raster = Raster::generate(full, ctx.parallel, |x, y| {
            let i = full.index_of(x, y) * 4;
            unpremultiply8(&premul[i..i + 4])
        });
        Ok(raster.crop(ctx.roi))
    }
}

fn unpremultiply8(p: &[u8]) -> [f32; 4] {
    let a = f32::from(p[3]) / 255.0;
    if a <= 0.0 {
        return [0.0; 4];
    }
    let c = |v: u8| srgb_to_linear((f32::from(v) / 255.0 / a).min(1.0));
    [c(p[0]), c(p[1]), c(p[2]), a]
}

fn to_srgb_unit(v: f32) -> f32 {
    linear_to_srgb(v.clamp(0.0, 1.0))
}

fn rows_for_save(ctx: &ProcessContext<'_>) -> PixResult<(Raster, u32, u32)> {
    let roi = ctx.roi;
    if roi.is_empty() {
        return Err(ctx.fail("nothing to save: input region is empty"));
    }
    let input = ctx.input_or_empty();
    Ok((input.crop(roi), roi.width, roi.height))
}

/// PNG writer; 8 or 16 bits per channel, sRGB with alpha.
pub struct PngSaveOp;

impl Operation for PngSaveOp {
    fn name(&self) -> &str {
        "gegl:png-save"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Sink
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            path_property(),
            PropertySpec::optional("bitdepth", 8i64, "bits per channel (8 or 16)"),
        ]
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(roi = %ctx.roi))]
    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let path = ctx.props.string("path")?;
        let bitdepth = ctx.props.int("bitdepth")?;
        let (raster, w, h) = rows_for_save(ctx)?;

        let written = match bitdepth {
            8 => {
                let mut data = Vec::with_capacity(raster.pixels().len() * 4);
                for px in raster.pixels() {
                    for c in 0..3 {
                        data.push((to_srgb_unit(px[c]) * 255.0).round() as u8);
                    }
                    data.push((px[3].clamp(0.0, 1.0) * 255.0).round() as u8);
                }
                image::RgbaImage::from_raw(w, h, data)
                    .context("assemble rgba8 image")
                    .and_then(|img| {
                        img.save_with_format(path, image::ImageFormat::Png)
                            .with_context(|| format!("write png '{path}'"))
                    })
            }
            16 => {
                let mut data = Vec::with_capacity(raster.pixels().len() * 4);
                for px in raster.pixels() {
                    for c in 0..3 {
                        data.push((to_srgb_unit(px[c]) * 65535.0).round() as u16);
                    }
                    data.push((px[3].clamp(0.0, 1.0) * 65535.0).round() as u16);
                }
                image::ImageBuffer::<image::Rgba<u16>, _>::from_raw(w, h, data)
                    .context("assemble rgba16 image")
                    .and_then(|img| {
                        img.save_with_format(path, image::ImageFormat::Png)
                            .with_context(|| format!("write png '{path}'"))
                    })
            }
            other => {
                return Err(ctx
                    .props
                    .invalid("bitdepth", format!("must be 8 or 16, got {other}")));
            }
        };
        written.map_err(|e| codec_error(self.name(), e))?;
        tracing::debug!(path, width = w, height = h, "png written");
        Ok(raster)
    }
}

/// JPEG writer; alpha is dropped.
pub struct JpgSaveOp;

impl Operation for JpgSaveOp {
    fn name(&self) -> &str {
        "gegl:jpg-save"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Sink
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            path_property(),
            PropertySpec::optional("quality", 90i64, "JPEG compression quality (1..=100)"),
        ]
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(roi = %ctx.roi))]
    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let path = ctx.props.string("path")?;
        let quality = ctx.props.int("quality")?;
        let quality = u8::try_from(quality)
            .ok()
            .filter(|q| (1..=100).contains(q))
            .ok_or_else(|| {
                ctx.props
                    .invalid("quality", format!("must be in 1..=100, got {quality}"))
            })?;
        let (raster, w, h) = rows_for_save(ctx)?;

        let mut data = Vec::with_capacity(raster.pixels().len() * 3);
        for px in raster.pixels() {
            for c in 0..3 {
                data.push((to_srgb_unit(px[c]) * 255.0).round() as u8);
            }
        }
        image::RgbImage::from_raw(w, h, data)
            .context("assemble rgb8 image")
            .and_then(|img| {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("create '{path}'"))?;
                let encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(BufWriter::new(file), quality);
                img.write_with_encoder(encoder)
                    .with_context(|| format!("write jpeg '{path}'"))
            })
            .map_err(|e| codec_error(self.name(), e))?;
        tracing::debug!(path, width = w, height = h, quality, "jpeg written");
        Ok(raster)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/codec.rs"]
mod tests;
