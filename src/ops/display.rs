use std::sync::Mutex;

use crate::buffer::raster::Raster;
use crate::foundation::core::Rectangle;
use crate::foundation::error::{PixError, PixResult};
use crate::ops::catalog::{Operation, OperationCatalog, OperationKind, ProcessContext, PropertySpec};
use crate::paint::color::Color;

pub(crate) fn register(catalog: &mut OperationCatalog) {
    catalog.register(DisplayOp);
}

/// One frame handed to a [`DisplaySink`].
#[derive(Debug, Clone)]
pub struct DisplayFrame {
    /// Title requested by the display node.
    pub title: String,
    /// Region shown.
    pub rect: Rectangle,
    /// sRGB straight-alpha RGBA8 pixels, row-major over `rect`.
    pub rgba8: Vec<u8>,
}

/// Receiver for frames produced by `gegl:display` nodes.
///
/// Called once per display node per `process` call, from the thread running the engine.
pub trait DisplaySink: Send + Sync {
    /// Show one frame.
    fn show(&self, frame: DisplayFrame) -> PixResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryDisplay {
    frames: Mutex<Vec<DisplayFrame>>,
}

impl InMemoryDisplay {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames shown so far, oldest first.
    pub fn frames(&self) -> PixResult<Vec<DisplayFrame>> {
        self.frames
            .lock()
            .map(|f| f.clone())
            .map_err(|_| PixError::poisoned("display frames"))
    }
}

impl DisplaySink for InMemoryDisplay {
    fn show(&self, frame: DisplayFrame) -> PixResult<()> {
        self.frames
            .lock()
            .map_err(|_| PixError::poisoned("display frames"))?
            .push(frame);
        Ok(())
    }
}

/// Hands its input to the context's display sink and passes it through.
pub struct DisplayOp;

impl Operation for DisplayOp {
    fn name(&self) -> &str {
        "gegl:display"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Sink
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![PropertySpec::optional(
            "window-title",
            "",
            "title of the display window",
        )]
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        let out = ctx.input_or_empty().crop(ctx.roi);
        let Some(sink) = &ctx.display else {
            tracing::warn!(node = %ctx.node, "display node processed without a display sink");
            return Ok(out);
        };
        let mut rgba8 = Vec::with_capacity(out.pixels().len() * 4);
        for px in out.pixels() {
            rgba8.extend_from_slice(&Color::from_pixel(*px).to_srgb8());
        }
        sink.show(DisplayFrame {
            title: ctx.props.string("window-title")?.to_owned(),
            rect: ctx.roi,
            rgba8,
        })?;
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/display.rs"]
mod tests;
