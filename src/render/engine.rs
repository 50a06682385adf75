use std::sync::Arc;

use crate::buffer::raster::Raster;
use crate::buffer::store::Buffer;
use crate::foundation::core::Rectangle;
use crate::foundation::error::{PixError, PixResult};
use crate::format::pixel::PixelFormat;
use crate::graph::graph::Graph;
use crate::graph::ids::NodeId;
use crate::ops::catalog::ProcessContext;
use crate::render::plan::{self, Plan};
use crate::session::context::ContextShared;

/// Summary of one `process` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Region produced for the target.
    pub region: Rectangle,
    /// Nodes evaluated, in evaluation order. Each node appears at most once.
    pub evaluated: Vec<NodeId>,
    /// Sum of the evaluated regions' areas.
    pub pixels: u64,
}

impl RenderStats {
    /// Number of node evaluations.
    pub fn nodes_evaluated(&self) -> usize {
        self.evaluated.len()
    }
}

/// Demand-driven evaluator.
///
/// Each call is a fresh, complete pull: dependencies are resolved depth-first (`input` before
/// `aux`), every reachable node is evaluated exactly once over the union of the regions its
/// consumers need, and intermediate results are dropped as soon as their last consumer ran.
/// Nothing is cached across calls.
pub struct RenderingEngine {
    shared: Arc<ContextShared>,
}

impl std::fmt::Debug for RenderingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderingEngine")
            .field("config", &self.shared.config)
            .finish()
    }
}

impl RenderingEngine {
    pub(crate) fn new(shared: Arc<ContextShared>) -> Self {
        Self { shared }
    }

    /// Evaluate `node` over its whole defined region, committing every side effect along the way.
    #[tracing::instrument(skip(self, graph), fields(graph = graph.id()))]
    pub fn process(&self, graph: &Graph, node: NodeId) -> PixResult<RenderStats> {
        self.run(graph, node, None).map(|(_, stats)| stats)
    }

    /// Evaluate exactly `rect` of `node`'s output.
    ///
    /// Sink nodes on the way still commit their whole input.
    #[tracing::instrument(skip(self, graph), fields(graph = graph.id()))]
    pub fn process_region(
        &self,
        graph: &Graph,
        node: NodeId,
        rect: Rectangle,
    ) -> PixResult<RenderStats> {
        self.run(graph, node, Some(rect)).map(|(_, stats)| stats)
    }

    /// Evaluate `rect` of `node` and return it as a new buffer in `format`.
    ///
    /// Pixels outside the node's defined region are transparent.
    pub fn render(
        &self,
        graph: &Graph,
        node: NodeId,
        rect: Rectangle,
        format: &PixelFormat,
    ) -> PixResult<Buffer> {
        let (raster, _) = self.run(graph, node, Some(rect))?;
        Buffer::from_raster(&raster.crop(rect), format.clone())
    }

    /// Region where `node` produces data, without evaluating anything.
    pub fn defined_region(&self, graph: &Graph, node: NodeId) -> PixResult<Rectangle> {
        self.check(graph)?;
        let plan = plan::build(
            graph,
            &self.shared.catalog,
            node,
            Some(Rectangle::empty()),
            u64::MAX,
        )?;
        Ok(plan.nodes[plan.target].defined)
    }

    fn check(&self, graph: &Graph) -> PixResult<()> {
        self.shared.ensure_live()?;
        if !Arc::ptr_eq(graph.shared(), &self.shared) {
            return Err(PixError::validation(
                "graph and engine belong to different contexts",
            ));
        }
        Ok(())
    }

    fn run(
        &self,
        graph: &Graph,
        node: NodeId,
        request: Option<Rectangle>,
    ) -> PixResult<(Raster, RenderStats)> {
        self.check(graph)?;
        let plan = plan::build(
            graph,
            &self.shared.catalog,
            node,
            request,
            self.shared.config.max_region_pixels,
        )?;
        match &self.shared.pool {
            Some(pool) => pool.install(|| self.execute(plan)),
            None => self.execute(plan),
        }
    }

    fn execute(&self, plan: Plan) -> PixResult<(Raster, RenderStats)> {
        let display = self.shared.display_sink()?;
        let parallel = self.shared.config.parallel;
        let mut results: Vec<Option<Arc<Raster>>> = vec![None; plan.nodes.len()];
        let mut pending: Vec<u32> = plan.nodes.iter().map(|n| n.consumers).collect();
        let mut stats = RenderStats::default();

        for (i, pn) in plan.nodes.iter().enumerate() {
            let fetch = |src: Option<usize>| -> PixResult<Option<Arc<Raster>>> {
                match src {
                    None => Ok(None),
                    Some(s) => results[s].clone().map(Some).ok_or_else(|| {
                        PixError::operation(
                            pn.props.operation(),
                            format!("result of {} was released before use", plan.nodes[s].id),
                        )
                    }),
                }
            };
            let ctx = ProcessContext {
                node: pn.id,
                props: &pn.props,
                roi: pn.roi,
                defined: pn.defined,
                input: fetch(pn.input)?,
                aux: fetch(pn.aux)?,
                parallel,
                display: display.clone(),
            };

            tracing::debug!(node = %pn.id, operation = pn.props.operation(), region = %pn.roi, "evaluating node");
            let mut out = pn.op.process(&ctx)?;
            drop(ctx);
            if out.rect() != pn.roi {
                out = out.crop(pn.roi);
            }
            stats.evaluated.push(pn.id);
            stats.pixels += pn.roi.area();
            results[i] = Some(Arc::new(out));

            for (_, src) in pn.producers() {
                pending[src] = pending[src].saturating_sub(1);
                if pending[src] == 0 {
                    results[src] = None;
                }
            }
        }

        let target = &plan.nodes[plan.target];
        stats.region = target.roi;
        let out = results[plan.target]
            .take()
            .ok_or_else(|| PixError::operation(target.props.operation(), "target produced no result"))?;
        let raster = Arc::try_unwrap(out).unwrap_or_else(|shared| (*shared).clone());
        tracing::debug!(nodes = stats.nodes_evaluated(), pixels = stats.pixels, "process complete");
        Ok((raster, stats))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/engine.rs"]
mod tests;
