//! Typed node builders.
//!
//! Each builder creates one node with a fixed operation identifier and fills in its property bag
//! under the catalog's property names. Builders never validate against the catalog; that happens
//! when the node is processed.

use crate::buffer::store::Buffer;
use crate::foundation::error::PixResult;
use crate::graph::compose::ComposeOp;
use crate::graph::graph::Graph;
use crate::graph::ids::NodeId;
use crate::graph::node::Pin;
use crate::graph::value::Properties;
use crate::paint::color::Color;
use crate::paint::path::Path;

/// Quality used by [`Graph::jpg_save`] when none is given.
pub const DEFAULT_JPEG_QUALITY: i64 = 90;

impl Graph {
    fn leaf(&mut self, operation: &str) -> PixResult<NodeId> {
        self.create_node(operation, Properties::new())
    }

    /// Connect `source` to `target`'s `input` pin.
    pub fn connect_to(&mut self, source: NodeId, target: NodeId) -> PixResult<()> {
        self.connect(source, target, Pin::Input)
    }

    /// Connect `source` to `target`'s `aux` pin.
    pub fn connect_to_aux(&mut self, source: NodeId, target: NodeId) -> PixResult<()> {
        self.connect(source, target, Pin::Aux)
    }

    /// Source reading pixels from `buffer`. The node becomes a co-owner of the buffer.
    pub fn buffer_source(&mut self, buffer: &Buffer) -> PixResult<NodeId> {
        self.create_node(
            "gegl:buffer-source",
            Properties::new().with("buffer", buffer.clone()),
        )
    }

    /// PNG writer.
    pub fn png_save(&mut self, path: &str) -> PixResult<NodeId> {
        self.create_node("gegl:png-save", Properties::new().with("path", path))
    }

    /// JPEG writer; `quality` defaults to [`DEFAULT_JPEG_QUALITY`].
    pub fn jpg_save(&mut self, path: &str, quality: Option<i64>) -> PixResult<NodeId> {
        self.create_node(
            "gegl:jpg-save",
            Properties::new()
                .with("quality", quality.unwrap_or(DEFAULT_JPEG_QUALITY))
                .with("path", path),
        )
    }

    /// PNG reader.
    pub fn png_load(&mut self, path: &str) -> PixResult<NodeId> {
        self.create_node("gegl:png-load", Properties::new().with("path", path))
    }

    /// JPEG reader.
    pub fn jpg_load(&mut self, path: &str) -> PixResult<NodeId> {
        self.create_node("gegl:jpg-load", Properties::new().with("path", path))
    }

    /// SVG rasterizer.
    pub fn svg_load(&mut self, path: &str) -> PixResult<NodeId> {
        self.create_node("gegl:svg-load", Properties::new().with("path", path))
    }

    /// Infinite-plane Perlin noise generator with default parameters.
    pub fn perlin_noise(&mut self) -> PixResult<NodeId> {
        self.leaf("gegl:perlin-noise")
    }

    /// Plasma cloud generator over `width x height`.
    pub fn plasma(&mut self, width: i64, height: i64, seed: i64) -> PixResult<NodeId> {
        self.create_node(
            "gegl:plasma",
            Properties::new()
                .with("width", width)
                .with("height", height)
                .with("seed", seed),
        )
    }

    /// Display sink.
    pub fn display(&mut self, window_title: &str) -> PixResult<NodeId> {
        self.create_node(
            "gegl:display",
            Properties::new().with("window-title", window_title),
        )
    }

    /// Crop to a rectangle, optionally moving its origin to `(0, 0)`.
    pub fn crop(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        reset_origin: bool,
    ) -> PixResult<NodeId> {
        self.create_node(
            "gegl:crop",
            Properties::new()
                .with("x", x)
                .with("y", y)
                .with("width", width)
                .with("height", height)
                .with("reset-origin", reset_origin),
        )
    }

    /// Separable gaussian blur.
    pub fn gaussian_blur(&mut self, std_dev_x: f64, std_dev_y: f64) -> PixResult<NodeId> {
        self.create_node(
            "gegl:gaussian-blur",
            Properties::new()
                .with("std-dev-x", std_dev_x)
                .with("std-dev-y", std_dev_y),
        )
    }

    /// Sobel edge detector.
    pub fn edge_sobel(&mut self) -> PixResult<NodeId> {
        self.leaf("gegl:edge-sobel")
    }

    /// Gradient magnitude.
    pub fn image_gradient(&mut self) -> PixResult<NodeId> {
        self.leaf("gegl:image-gradient")
    }

    /// Neon edge glow.
    pub fn edge_neon(&mut self, radius: f64, amount: f64) -> PixResult<NodeId> {
        self.create_node(
            "gegl:edge-neon",
            Properties::new()
                .with("radius", radius)
                .with("amount", amount),
        )
    }

    /// Random neighbour picking.
    pub fn noise_pick(&mut self, pct_random: f64, repeat: i64, seed: u32) -> PixResult<NodeId> {
        self.create_node(
            "gegl:noise-pick",
            Properties::new()
                .with("pct-random", pct_random)
                .with("repeat", repeat)
                .with("seed", seed),
        )
    }

    /// SLIC superpixels.
    pub fn slic(&mut self) -> PixResult<NodeId> {
        self.leaf("gegl:slic")
    }

    /// Waterpixels superpixels.
    pub fn waterpixels(&mut self) -> PixResult<NodeId> {
        self.leaf("gegl:waterpixels")
    }

    /// Luminance threshold.
    pub fn threshold(&mut self) -> PixResult<NodeId> {
        self.leaf("gegl:threshold")
    }

    /// Brightness/contrast adjustment.
    pub fn brightness_contrast(&mut self, brightness: f64, contrast: f64) -> PixResult<NodeId> {
        self.create_node(
            "gegl:brightness-contrast",
            Properties::new()
                .with("brightness", brightness)
                .with("contrast", contrast),
        )
    }

    /// Film negative development.
    pub fn negative_darkroom(&mut self) -> PixResult<NodeId> {
        self.leaf("gegl:negative-darkroom")
    }

    /// Height-to-normal map.
    pub fn normal_map(&mut self) -> PixResult<NodeId> {
        self.leaf("gegl:normal-map")
    }

    /// Ordered dither.
    pub fn dither(&mut self) -> PixResult<NodeId> {
        self.leaf("gegl:dither")
    }

    /// Block mosaic.
    pub fn pixelize(&mut self) -> PixResult<NodeId> {
        self.leaf("gegl:pixelize")
    }

    /// Invert in linear light.
    pub fn invert_linear(&mut self) -> PixResult<NodeId> {
        self.leaf("gegl:invert-linear")
    }

    /// Halftone newsprint.
    pub fn newsprint(&mut self) -> PixResult<NodeId> {
        self.leaf("gegl:newsprint")
    }

    /// Blend node selected by ordinal; see [`ComposeOp`].
    pub fn compose(&mut self, index: i64) -> PixResult<NodeId> {
        let op = ComposeOp::from_index(index)?;
        self.leaf(op.operation_name())
    }

    /// Fill `path` with `color` over the input.
    pub fn fill_path(&mut self, path: &Path, color: &Color) -> PixResult<NodeId> {
        self.create_node(
            "gegl:fill-path",
            Properties::new()
                .with("d", path.clone())
                .with("color", *color),
        )
    }

    /// Stroke `path` with `color` over the input.
    pub fn vector_stroke(&mut self, path: &Path, color: &Color) -> PixResult<NodeId> {
        self.create_node(
            "gegl:vector-stroke",
            Properties::new()
                .with("d", path.clone())
                .with("color", *color),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/dsl.rs"]
mod tests;
