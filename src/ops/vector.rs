use crate::buffer::raster::Raster;
use crate::foundation::core::Rectangle;
use crate::foundation::error::PixResult;
use crate::graph::value::ValueType;
use crate::ops::catalog::{
    Operation, OperationCatalog, OperationKind, ProcessContext, PropertySpec, RegionContext,
    ResolvedProperties,
};
use crate::ops::composite::source_over;
use crate::paint::color::Color;
use crate::paint::path::Path;

pub(crate) fn register(catalog: &mut OperationCatalog) {
    catalog.register(FillPathOp);
    catalog.register(VectorStrokeOp);
}

#[derive(Debug, Clone, Copy)]
enum Coverage {
    Fill { even_odd: bool },
    Stroke { width: f64 },
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let p = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(a) => out.move_to(p(a)),
            PathEl::LineTo(a) => out.line_to(p(a)),
            PathEl::QuadTo(a, b) => out.quad_to(p(a), p(b)),
            PathEl::CurveTo(a, b, c) => out.curve_to(p(a), p(b), p(c)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

/// Rasterize the coverage of `path` over `roi`; one alpha value per pixel, row-major.
fn rasterize_coverage(
    ctx: &ProcessContext<'_>,
    path: &Path,
    coverage: Coverage,
) -> PixResult<Vec<f32>> {
    let roi = ctx.roi;
    let w: u16 = roi
        .width
        .try_into()
        .map_err(|_| ctx.fail("region width exceeds u16 rasterizer limit"))?;
    let h: u16 = roi
        .height
        .try_into()
        .map_err(|_| ctx.fail("region height exceeds u16 rasterizer limit"))?;

    let mut rc = vello_cpu::RenderContext::new(w, h);
    rc.set_transform(vello_cpu::kurbo::Affine::translate((
        -f64::from(roi.x),
        -f64::from(roi.y),
    )));
    rc.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
    let cpu_path = bezpath_to_cpu(&path.to_bez_path());
    match coverage {
        Coverage::Fill { even_odd } => {
            rc.set_fill_rule(if even_odd {
                vello_cpu::peniko::Fill::EvenOdd
            } else {
                vello_cpu::peniko::Fill::NonZero
            });
            rc.fill_path(&cpu_path);
        }
        Coverage::Stroke { width } => {
            rc.set_stroke(vello_cpu::kurbo::Stroke::new(width));
            rc.stroke_path(&cpu_path);
        }
    }
    rc.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    rc.render_to_pixmap(&mut pixmap);
    Ok(pixmap
        .data_as_u8_slice()
        .chunks_exact(4)
        .map(|px| f32::from(px[3]) / 255.0)
        .collect())
}

/// Draw `color` through `coverage` over the input.
fn paint_over(
    ctx: &ProcessContext<'_>,
    color: Color,
    opacity: f64,
    coverage: Coverage,
) -> PixResult<Raster> {
    let path = ctx.props.path("d")?;
    let mut out = ctx.input_or_empty().crop(ctx.roi);
    if !path.is_renderable() || ctx.roi.is_empty() {
        if !path.is_empty() {
            tracing::warn!(node = %ctx.node, "path does not start with a move; nothing drawn");
        }
        return Ok(out);
    }
    let mask = rasterize_coverage(ctx, path, coverage)?;
    let base = color.to_pixel();
    let alpha = base[3] * opacity.clamp(0.0, 1.0) as f32;
    let w = ctx.roi.width as usize;
    let y0 = i64::from(ctx.roi.y);
    out.for_each_row(ctx.parallel, |y, row| {
        let m = &mask[(y - y0) as usize * w..][..w];
        for (px, cov) in row.iter_mut().zip(m) {
            if *cov > 0.0 {
                *px = source_over(*px, [base[0], base[1], base[2], alpha * cov]);
            }
        }
    });
    Ok(out)
}

fn painted_region(ctx: &RegionContext<'_>, pad: f64) -> PixResult<Rectangle> {
    let path = ctx.props.path("d")?;
    let drawn = path
        .bounds()
        .map(|b| Rectangle::covering(b.inflate(pad, pad)))
        .unwrap_or_default();
    Ok(ctx.inputs_union().union(drawn))
}

fn opacity(props: &ResolvedProperties) -> PixResult<f64> {
    let v = props.double("opacity")?;
    if !(0.0..=1.0).contains(&v) {
        return Err(props.invalid("opacity", format!("must be in 0..=1, got {v}")));
    }
    Ok(v)
}

/// Fill a path with a solid color over the input.
pub struct FillPathOp;

impl Operation for FillPathOp {
    fn name(&self) -> &str {
        "gegl:fill-path"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::required("d", ValueType::Path, "outline to fill"),
            PropertySpec::optional(
                "color",
                Color::from_linear_rgba(0.0, 0.0, 0.0, 1.0),
                "fill color",
            ),
            PropertySpec::optional("opacity", 1.0f64, "fill opacity"),
            PropertySpec::optional("fill-rule", "nonzero", "'nonzero' or 'evenodd'"),
        ]
    }

    fn defined_region(&self, ctx: &RegionContext<'_>) -> PixResult<Rectangle> {
        painted_region(ctx, 1.0)
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let even_odd = match ctx.props.string("fill-rule")? {
            "nonzero" => false,
            "evenodd" => true,
            other => {
                return Err(ctx
                    .props
                    .invalid("fill-rule", format!("unknown fill rule '{other}'")));
            }
        };
        paint_over(
            ctx,
            ctx.props.color("color")?,
            opacity(ctx.props)?,
            Coverage::Fill { even_odd },
        )
    }
}

fn stroke_width(props: &ResolvedProperties) -> PixResult<f64> {
    let v = props.double("width")?;
    if !v.is_finite() || !(0.0..=1000.0).contains(&v) {
        return Err(props.invalid("width", format!("must be in 0..=1000, got {v}")));
    }
    Ok(v)
}

/// Stroke a path with a solid color over the input.
pub struct VectorStrokeOp;

impl Operation for VectorStrokeOp {
    fn name(&self) -> &str {
        "gegl:vector-stroke"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::required("d", ValueType::Path, "outline to stroke"),
            PropertySpec::optional(
                "color",
                Color::from_linear_rgba(0.0, 0.0, 0.0, 1.0),
                "stroke color",
            ),
            PropertySpec::optional("width", 2.0f64, "stroke width"),
            PropertySpec::optional("opacity", 1.0f64, "stroke opacity"),
        ]
    }

    fn defined_region(&self, ctx: &RegionContext<'_>) -> PixResult<Rectangle> {
        let width = stroke_width(ctx.props)?;
        painted_region(ctx, width / 2.0 + 1.0)
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let width = stroke_width(ctx.props)?;
        paint_over(
            ctx,
            ctx.props.color("color")?,
            opacity(ctx.props)?,
            Coverage::Stroke { width },
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/vector.rs"]
mod tests;
