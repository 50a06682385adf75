use crate::buffer::raster::Raster;
use crate::foundation::error::PixResult;
use crate::foundation::math::{linear_to_srgb, srgb_to_linear};
use crate::graph::compose::ComposeOp;
use crate::ops::catalog::{
    Operation, OperationCatalog, OperationKind, ProcessContext, PropertySpec,
};

pub(crate) fn register(catalog: &mut OperationCatalog) {
    for op in ComposeOp::ALL {
        catalog.register(BlendOp { op });
    }
}

/// Separable blend of `aux` (source layer) over `input` (backdrop), then source-over.
pub struct BlendOp {
    op: ComposeOp,
}

/// Composite straight-alpha `src` over `dst` with blend function `op`.
pub(crate) fn blend_pixel(op: ComposeOp, dst: [f32; 4], src: [f32; 4], perceptual: bool) -> [f32; 4] {
    let (ab, as_) = (dst[3].clamp(0.0, 1.0), src[3].clamp(0.0, 1.0));
    let ao = as_ + ab * (1.0 - as_);
    if ao <= f32::EPSILON {
        return [0.0; 4];
    }
    let mut out = [0.0f32, 0.0, 0.0, ao];
    for c in 0..3 {
        let (cb, cs) = if perceptual {
            (linear_to_srgb(dst[c]), linear_to_srgb(src[c]))
        } else {
            (dst[c], src[c])
        };
        let mixed = (1.0 - ab) * as_ * cs + (1.0 - as_) * ab * cb + as_ * ab * op.blend(cb, cs);
        let v = mixed / ao;
        out[c] = if perceptual { srgb_to_linear(v) } else { v };
    }
    out
}

/// Plain source-over of straight-alpha `src` onto `dst`.
pub(crate) fn source_over(dst: [f32; 4], src: [f32; 4]) -> [f32; 4] {
    let (ab, as_) = (dst[3].clamp(0.0, 1.0), src[3].clamp(0.0, 1.0));
    let ao = as_ + ab * (1.0 - as_);
    if ao <= f32::EPSILON {
        return [0.0; 4];
    }
    let mut out = [0.0f32, 0.0, 0.0, ao];
    for c in 0..3 {
        out[c] = (as_ * src[c] + (1.0 - as_) * ab * dst[c]) / ao;
    }
    out
}

impl Operation for BlendOp {
    fn name(&self) -> &str {
        self.op.operation_name()
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Composer
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![PropertySpec::optional(
            "srgb",
            false,
            "blend in perceptual space instead of linear light",
        )]
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let perceptual = ctx.props.boolean("srgb")?;
        let backdrop = ctx.input_or_empty();
        let layer = ctx
            .aux
            .clone()
            .unwrap_or_else(|| std::sync::Arc::new(Raster::new(Default::default())));
        let op = self.op;
        Ok(Raster::generate(ctx.roi, ctx.parallel, |x, y| {
            blend_pixel(op, backdrop.get(x, y), layer.get(x, y), perceptual)
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/composite.rs"]
mod tests;
