//! Node-and-pin graph model.

pub(crate) mod compose;
pub(crate) mod dsl;
#[allow(clippy::module_inception)]
pub(crate) mod graph;
pub(crate) mod ids;
pub(crate) mod node;
pub(crate) mod value;
