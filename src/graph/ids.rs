/// Stable handle to a node inside a [`crate::Graph`].
///
/// Carries the owning graph and a slot generation, so handles to destroyed nodes and handles
/// from other graphs are detected instead of aliasing a recycled slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) graph: u32,
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) fn new(graph: u32, index: u32, generation: u32) -> Self {
        Self {
            graph,
            index,
            generation,
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}.{}v{}", self.graph, self.index, self.generation)
    }
}
