//! pixgraph is a demand-driven node-graph image processing engine.
//!
//! Callers assemble a directed acyclic graph of image operations (load, generate, filter,
//! compose, save), then ask the [`RenderingEngine`] to evaluate a node:
//!
//! - Initialize a [`Context`] (operation catalog, pixel formats, options)
//! - Build a [`Graph`]: create nodes with an operation id and [`Properties`], connect
//!   `output -> input|aux` pins
//! - Call [`RenderingEngine::process`] on a sink node; dependencies are pulled depth-first and
//!   every node is evaluated once over exactly the region its consumers need
//!
//! Operation identifiers and properties are validated lazily, when a node is evaluated or the
//! catalog is queried, not when the node is created.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod format;
mod foundation;
mod graph;
mod ops;
mod paint;
mod render;
mod session;

pub use crate::buffer::raster::Raster;
pub use crate::buffer::store::Buffer;
pub use crate::format::pixel::{ChannelType, ColorModel, FormatRegistry, PixelFormat, Transfer};
pub use crate::foundation::core::{Point, Rectangle, make_rectangle};
pub use crate::foundation::error::{PixError, PixResult};
pub use crate::graph::compose::{ComposeOp, select_compose_operation};
pub use crate::graph::dsl::DEFAULT_JPEG_QUALITY;
pub use crate::graph::graph::Graph;
pub use crate::graph::ids::NodeId;
pub use crate::graph::node::{Node, Pin};
pub use crate::graph::value::{Properties, Value, ValueType};
pub use crate::ops::catalog::{
    Operation, OperationCatalog, OperationKind, ProcessContext, PropertyInfo, PropertySpec,
    RegionContext, ResolvedProperties,
};
pub use crate::ops::display::{DisplayFrame, DisplaySink, InMemoryDisplay};
pub use crate::paint::color::Color;
pub use crate::paint::path::{Path, PathSegment};
pub use crate::render::engine::{RenderStats, RenderingEngine};
pub use crate::session::context::{Context, ContextConfig};
