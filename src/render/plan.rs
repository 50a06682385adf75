use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::core::Rectangle;
use crate::foundation::error::{PixError, PixResult};
use crate::graph::graph::Graph;
use crate::graph::ids::NodeId;
use crate::graph::node::Pin;
use crate::ops::catalog::{
    Operation, OperationCatalog, OperationKind, RegionContext, ResolvedProperties,
};

/// One node of an evaluation plan, with its operation resolved and its region fixed.
pub(crate) struct PlanNode {
    pub(crate) id: NodeId,
    pub(crate) op: Arc<dyn Operation>,
    pub(crate) props: ResolvedProperties,
    pub(crate) input: Option<usize>,
    pub(crate) aux: Option<usize>,
    pub(crate) defined: Rectangle,
    pub(crate) roi: Rectangle,
    pub(crate) consumers: u32,
}

impl PlanNode {
    pub(crate) fn producers(&self) -> impl Iterator<Item = (Pin, usize)> + '_ {
        [(Pin::Input, self.input), (Pin::Aux, self.aux)]
            .into_iter()
            .filter_map(|(pin, src)| src.map(|s| (pin, s)))
    }
}

/// Dependency-first evaluation order for everything upstream of one target.
pub(crate) struct Plan {
    pub(crate) nodes: Vec<PlanNode>,
    pub(crate) target: usize,
}

enum Frame {
    Enter(NodeId),
    Exit(NodeId),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Post-order walk from `target`: every node appears after its `input` subtree, then its `aux`
/// subtree. Each node appears once.
pub(crate) fn topo_order(graph: &Graph, target: NodeId) -> PixResult<Vec<NodeId>> {
    let mut marks: HashMap<NodeId, Mark> = HashMap::new();
    let mut order = Vec::new();
    let mut stack = vec![Frame::Enter(target)];
    graph.node(target)?;

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(id) => {
                match marks.get(&id) {
                    Some(Mark::Done) => continue,
                    Some(Mark::Visiting) => {
                        return Err(PixError::CycleDetected { from: id, to: id });
                    }
                    None => {}
                }
                marks.insert(id, Mark::Visiting);
                stack.push(Frame::Exit(id));
                let node = graph.node(id)?;
                let incoming: Vec<_> = node.incoming().collect();
                for (_, src) in incoming.into_iter().rev() {
                    if marks.get(&src) == Some(&Mark::Visiting) {
                        return Err(PixError::CycleDetected { from: src, to: id });
                    }
                    stack.push(Frame::Enter(src));
                }
            }
            Frame::Exit(id) => {
                marks.insert(id, Mark::Done);
                order.push(id);
            }
        }
    }
    Ok(order)
}

/// Resolve operations, compute defined regions bottom-up and regions of interest top-down.
///
/// `request` is the region wanted from the target; `None` asks for its whole defined region.
/// Sink nodes always cover their whole defined region.
/// Nothing is evaluated here, so a failure leaves no side effects behind.
pub(crate) fn build(
    graph: &Graph,
    catalog: &OperationCatalog,
    target: NodeId,
    request: Option<Rectangle>,
    max_region_pixels: u64,
) -> PixResult<Plan> {
    let order = topo_order(graph, target)?;
    let index: HashMap<NodeId, usize> = order.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let mut nodes: Vec<PlanNode> = Vec::with_capacity(order.len());
    for &id in &order {
        let node = graph.node(id)?;
        let (op, props) = catalog.resolve(node.operation(), node.properties())?;
        let input = node.source(Pin::Input).and_then(|s| index.get(&s).copied());
        let aux = node.source(Pin::Aux).and_then(|s| index.get(&s).copied());
        let defined = op.defined_region(&RegionContext {
            props: &props,
            input: input.map(|i| nodes[i].defined),
            aux: aux.map(|i| nodes[i].defined),
        })?;
        for src in [input, aux].into_iter().flatten() {
            nodes[src].consumers += 1;
        }
        nodes.push(PlanNode {
            id,
            op,
            props,
            input,
            aux,
            defined,
            roi: Rectangle::empty(),
            consumers: 0,
        });
    }

    let target_index = order.len() - 1;
    let mut requested = vec![Rectangle::empty(); nodes.len()];
    requested[target_index] = request.unwrap_or(nodes[target_index].defined);

    for i in (0..nodes.len()).rev() {
        // Sinks commit their whole input no matter how little downstream consumers read.
        let roi = if nodes[i].op.kind() == OperationKind::Sink {
            nodes[i].defined
        } else {
            requested[i].intersect(nodes[i].defined)
        };
        if roi.area() > max_region_pixels {
            return Err(PixError::validation(format!(
                "{} ({}) would produce {roi} ({} pixels), above the {max_region_pixels} pixel limit",
                nodes[i].id,
                nodes[i].props.operation(),
                roi.area()
            )));
        }
        nodes[i].roi = roi;
        if roi.is_empty() {
            continue;
        }
        let needs: Vec<(usize, Rectangle)> = nodes[i]
            .producers()
            .map(|(pin, src)| (src, nodes[i].op.required_region(&nodes[i].props, pin, roi)))
            .collect();
        for (src, need) in needs {
            tracing::trace!(consumer = %nodes[i].id, producer = %nodes[src].id, region = %need, "region requested");
            requested[src] = requested[src].union(need);
        }
    }

    Ok(Plan {
        nodes,
        target: target_index,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/plan.rs"]
mod tests;
