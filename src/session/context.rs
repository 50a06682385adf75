use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use crate::buffer::store::Buffer;
use crate::foundation::core::Rectangle;
use crate::foundation::error::{PixError, PixResult};
use crate::format::pixel::{FormatRegistry, PixelFormat};
use crate::graph::graph::Graph;
use crate::ops::catalog::{OperationCatalog, PropertyInfo};
use crate::ops::display::DisplaySink;
use crate::render::engine::RenderingEngine;

static NEXT_GRAPH_ID: AtomicU32 = AtomicU32::new(1);

/// Engine-wide options fixed at [`Context::init`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
    /// Allow row-parallel pixel loops (rayon) inside operations.
    pub parallel: bool,
    /// Size of a dedicated rayon pool. `None` uses the global pool.
    pub threads: Option<usize>,
    /// Largest region, in pixels, a single node may be asked to produce.
    pub max_region_pixels: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
            max_region_pixels: 1 << 28,
        }
    }
}

impl ContextConfig {
    /// Parse a JSON object; missing fields take their defaults.
    pub fn from_json_str(s: &str) -> PixResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| PixError::validation(format!("invalid context config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> PixResult<()> {
        if self.threads == Some(0) {
            return Err(PixError::validation("'threads' must be >= 1 when set"));
        }
        if self.max_region_pixels == 0 {
            return Err(PixError::validation("'max_region_pixels' must be >= 1"));
        }
        Ok(())
    }
}

fn build_thread_pool(threads: Option<usize>) -> PixResult<Option<rayon::ThreadPool>> {
    let Some(n) = threads else {
        return Ok(None);
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .map(Some)
        .map_err(|e| PixError::validation(format!("failed to build rayon thread pool: {e}")))
}

/// State shared by a context and everything created from it.
pub(crate) struct ContextShared {
    pub(crate) config: ContextConfig,
    pub(crate) catalog: OperationCatalog,
    pub(crate) formats: FormatRegistry,
    pub(crate) pool: Option<rayon::ThreadPool>,
    display: RwLock<Option<Arc<dyn DisplaySink>>>,
    alive: AtomicBool,
}

impl ContextShared {
    pub(crate) fn ensure_live(&self) -> PixResult<()> {
        if self.alive.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(PixError::ContextShutdown)
        }
    }

    pub(crate) fn display_sink(&self) -> PixResult<Option<Arc<dyn DisplaySink>>> {
        self.display
            .read()
            .map(|s| s.clone())
            .map_err(|_| PixError::poisoned("display sink"))
    }

    fn mark_dead(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }
}

/// Engine-wide state: operation catalog, format registry and options.
///
/// Every graph, buffer and engine is created from a context. After [`Context::shutdown`] (or
/// drop), graph construction and processing on anything created from it fail with
/// [`PixError::ContextShutdown`]. Independent contexts can coexist.
pub struct Context {
    shared: Arc<ContextShared>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.shared.config)
            .field("catalog", &self.shared.catalog)
            .finish()
    }
}

impl Context {
    /// Initialize with the built-in operation catalog.
    pub fn init(config: ContextConfig) -> PixResult<Self> {
        Self::init_with_catalog(config, OperationCatalog::with_builtins())
    }

    /// Initialize with a caller-assembled catalog.
    #[tracing::instrument(skip(catalog), fields(operations = catalog.list_operations().len()))]
    pub fn init_with_catalog(config: ContextConfig, catalog: OperationCatalog) -> PixResult<Self> {
        config.validate()?;
        let pool = if config.parallel {
            build_thread_pool(config.threads)?
        } else {
            None
        };
        tracing::info!("context initialized");
        Ok(Self {
            shared: Arc::new(ContextShared {
                config,
                catalog,
                formats: FormatRegistry::builtin(),
                pool,
                display: RwLock::new(None),
                alive: AtomicBool::new(true),
            }),
        })
    }

    /// Release engine-wide state. Later use of graphs and engines from this context fails.
    pub fn shutdown(self) {
        drop(self);
    }

    /// Return `true` until the context is shut down.
    pub fn is_live(&self) -> bool {
        self.shared.ensure_live().is_ok()
    }

    /// Options this context was initialized with.
    pub fn config(&self) -> &ContextConfig {
        &self.shared.config
    }

    /// Operation catalog.
    pub fn catalog(&self) -> &OperationCatalog {
        &self.shared.catalog
    }

    /// Every registered operation identifier.
    pub fn list_operations(&self) -> PixResult<Vec<String>> {
        self.shared.ensure_live()?;
        Ok(self.shared.catalog.list_operations())
    }

    /// Declared properties of `operation`; see [`OperationCatalog::list_properties`].
    pub fn list_properties(&self, operation: &str) -> PixResult<Vec<PropertyInfo>> {
        self.shared.ensure_live()?;
        self.shared.catalog.list_properties(operation)
    }

    /// Resolve a pixel format by canonical name.
    pub fn lookup_format(&self, name: &str) -> PixResult<PixelFormat> {
        self.shared.ensure_live()?;
        self.shared.formats.lookup(name)
    }

    /// Pixel format registry.
    pub fn formats(&self) -> &FormatRegistry {
        &self.shared.formats
    }

    /// Allocate a zero-initialized buffer.
    pub fn new_buffer(&self, extent: Rectangle, format: PixelFormat) -> PixResult<Buffer> {
        self.shared.ensure_live()?;
        Buffer::new(extent, format)
    }

    /// Create an empty graph.
    pub fn new_graph(&self) -> PixResult<Graph> {
        self.shared.ensure_live()?;
        let id = NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed);
        Ok(Graph::new(id, self.shared.clone()))
    }

    /// Rendering engine bound to this context.
    pub fn engine(&self) -> PixResult<RenderingEngine> {
        self.shared.ensure_live()?;
        Ok(RenderingEngine::new(self.shared.clone()))
    }

    /// Attach the sink that receives frames from `gegl:display` nodes.
    pub fn set_display_sink(&self, sink: Arc<dyn DisplaySink>) -> PixResult<()> {
        *self
            .shared
            .display
            .write()
            .map_err(|_| PixError::poisoned("display sink"))? = Some(sink);
        Ok(())
    }

    /// Detach the display sink.
    pub fn clear_display_sink(&self) -> PixResult<()> {
        *self
            .shared
            .display
            .write()
            .map_err(|_| PixError::poisoned("display sink"))? = None;
        Ok(())
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if self.shared.mark_dead() {
            tracing::info!("context shut down");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/context.rs"]
mod tests;
