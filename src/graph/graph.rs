use std::sync::Arc;

use smallvec::SmallVec;

use crate::foundation::error::{PixError, PixResult};
use crate::graph::ids::NodeId;
use crate::graph::node::{Node, Pin};
use crate::graph::value::Properties;
use crate::session::context::ContextShared;

type Consumers = SmallVec<[(NodeId, Pin); 4]>;

#[derive(Debug)]
struct Entry {
    node: Node,
    external_refs: u32,
    consumers: Consumers,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Arena of nodes plus the directed `output -> input|aux` edges among them.
///
/// Nodes are addressed by generation-checked [`NodeId`] handles. Each node carries an external
/// reference count (starting at one on creation) and is kept alive while it has external
/// references or downstream consumers. Edges always form a DAG; an edge that would close a cycle
/// is rejected and leaves the graph unchanged.
///
/// Mutation is single-writer; the graph is `Send` but offers no interior synchronization.
pub struct Graph {
    id: u32,
    shared: Arc<ContextShared>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.id)
            .field("nodes", &self.live)
            .finish()
    }
}

impl Graph {
    pub(crate) fn new(id: u32, shared: Arc<ContextShared>) -> Self {
        Self {
            id,
            shared,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub(crate) fn shared(&self) -> &Arc<ContextShared> {
        &self.shared
    }

    /// Graph identifier, unique across every context in the process.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Return `true` when the graph holds no live node.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Return `true` if `id` names a live node of this graph.
    pub fn contains(&self, id: NodeId) -> bool {
        self.entry(id).is_ok()
    }

    /// Handles of all live nodes, in slot order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(move |(i, s)| {
            s.entry
                .as_ref()
                .map(|_| NodeId::new(self.id, i as u32, s.generation))
        })
    }

    /// Create a child node tagged with `operation`.
    ///
    /// Neither the operation identifier nor the properties are validated here; both are resolved
    /// against the catalog when the node is evaluated. The returned handle holds one external
    /// reference.
    pub fn create_node(
        &mut self,
        operation: impl Into<String>,
        properties: Properties,
    ) -> PixResult<NodeId> {
        self.shared.ensure_live()?;
        let node = Node::new(operation.into(), properties);
        let entry = Entry {
            node,
            external_refs: 1,
            consumers: SmallVec::new(),
        };
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                NodeId::new(self.id, index, slot.generation)
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .map_err(|_| PixError::validation("graph node capacity exceeded"))?;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                NodeId::new(self.id, index, 0)
            }
        };
        self.live += 1;
        tracing::trace!(node = %id, "node created");
        Ok(id)
    }

    /// Borrow the node behind `id`.
    pub fn node(&self, id: NodeId) -> PixResult<&Node> {
        self.entry(id).map(|e| &e.node)
    }

    /// Downstream `(consumer, pin)` pairs fed by `id`'s output.
    pub fn consumers(&self, id: NodeId) -> PixResult<&[(NodeId, Pin)]> {
        self.entry(id).map(|e| e.consumers.as_slice())
    }

    /// External reference count of `id` (edges are not counted).
    pub fn ref_count(&self, id: NodeId) -> PixResult<u32> {
        self.entry(id).map(|e| e.external_refs)
    }

    /// Add the edge `source.output -> target.pin`.
    ///
    /// Fails with [`PixError::DuplicateEdge`] if the pin is occupied and with
    /// [`PixError::CycleDetected`] if `target` is `source` or one of its ancestors. On failure the
    /// graph is unchanged.
    pub fn connect(&mut self, source: NodeId, target: NodeId, pin: Pin) -> PixResult<()> {
        self.shared.ensure_live()?;
        self.entry(source)?;
        let occupied = self.entry(target)?.node.source(pin);
        if pin == Pin::Output {
            return Err(PixError::UnknownPin(format!(
                "'{pin}' cannot receive an edge"
            )));
        }
        if occupied.is_some() {
            return Err(PixError::DuplicateEdge { node: target, pin });
        }
        if self.is_upstream(target, source) {
            return Err(PixError::CycleDetected {
                from: source,
                to: target,
            });
        }

        if let Some(slot) = self.entry_mut(target)?.node.slot_mut(pin) {
            *slot = Some(source);
        }
        self.entry_mut(source)?.consumers.push((target, pin));
        tracing::trace!(%source, %target, %pin, "edge connected");
        Ok(())
    }

    /// [`Graph::connect`] with the pin given by name.
    pub fn connect_by_name(&mut self, source: NodeId, target: NodeId, pin: &str) -> PixResult<()> {
        let pin = pin.parse::<Pin>()?;
        self.connect(source, target, pin)
    }

    /// Remove the edge terminating at `target.pin`, returning its producer.
    ///
    /// A producer left with no consumers and no external references is destroyed.
    pub fn disconnect(&mut self, target: NodeId, pin: Pin) -> PixResult<Option<NodeId>> {
        self.shared.ensure_live()?;
        let Some(slot) = self.entry_mut(target)?.node.slot_mut(pin) else {
            return Ok(None);
        };
        let Some(source) = slot.take() else {
            return Ok(None);
        };
        self.detach_consumer(source, target, pin);
        tracing::trace!(%source, %target, %pin, "edge disconnected");
        self.collect_if_orphaned(source);
        Ok(Some(source))
    }

    /// Add an external reference to `id`.
    pub fn retain(&mut self, id: NodeId) -> PixResult<()> {
        let entry = self.entry_mut(id)?;
        entry.external_refs = entry
            .external_refs
            .checked_add(1)
            .ok_or_else(|| PixError::validation("node reference count overflow"))?;
        Ok(())
    }

    /// Drop one external reference to `id`.
    ///
    /// The node is destroyed once it has neither external references nor consumers. Destroying a
    /// node removes the edges it terminates, which may in turn release upstream nodes that were
    /// only kept alive by those edges. Nodes that still have external references survive.
    pub fn release_node(&mut self, id: NodeId) -> PixResult<()> {
        let entry = self.entry_mut(id)?;
        if entry.external_refs == 0 {
            return Err(PixError::validation(format!(
                "{id} has no external reference to release"
            )));
        }
        entry.external_refs -= 1;
        self.collect_if_orphaned(id);
        Ok(())
    }

    /// Return `true` if `ancestor` is reachable by walking upstream from `from` (inclusive).
    fn is_upstream(&self, ancestor: NodeId, from: NodeId) -> bool {
        let mut stack: SmallVec<[NodeId; 16]> = SmallVec::new();
        let mut seen = std::collections::HashSet::new();
        stack.push(from);
        while let Some(id) = stack.pop() {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Ok(entry) = self.entry(id) {
                stack.extend(entry.node.incoming().map(|(_, src)| src));
            }
        }
        false
    }

    fn detach_consumer(&mut self, source: NodeId, target: NodeId, pin: Pin) {
        if let Ok(entry) = self.entry_mut(source)
            && let Some(pos) = entry
                .consumers
                .iter()
                .position(|&c| c == (target, pin))
        {
            entry.consumers.remove(pos);
        }
    }

    fn collect_if_orphaned(&mut self, id: NodeId) {
        let mut pending: SmallVec<[NodeId; 8]> = SmallVec::new();
        pending.push(id);
        while let Some(id) = pending.pop() {
            let orphaned = self
                .entry(id)
                .map(|e| e.external_refs == 0 && e.consumers.is_empty())
                .unwrap_or(false);
            if !orphaned {
                continue;
            }
            let slot = &mut self.slots[id.index as usize];
            let Some(entry) = slot.entry.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
            self.live -= 1;
            tracing::trace!(node = %id, "node destroyed");

            for (pin, source) in entry.node.incoming() {
                self.detach_consumer(source, id, pin);
                pending.push(source);
            }
        }
    }

    fn entry(&self, id: NodeId) -> PixResult<&Entry> {
        if id.graph != self.id {
            return Err(PixError::ForeignNode(id));
        }
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entry.as_ref())
            .ok_or(PixError::StaleNode(id))
    }

    fn entry_mut(&mut self, id: NodeId) -> PixResult<&mut Entry> {
        if id.graph != self.id {
            return Err(PixError::ForeignNode(id));
        }
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entry.as_mut())
            .ok_or(PixError::StaleNode(id))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/graph.rs"]
mod tests;
