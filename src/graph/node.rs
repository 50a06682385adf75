use std::str::FromStr;

use crate::foundation::error::PixError;
use crate::graph::ids::NodeId;
use crate::graph::value::{Properties, Value};

/// Named connection point on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pin {
    /// Primary upstream dependency.
    Input,
    /// Secondary upstream dependency (binary operations such as compose).
    Aux,
    /// Produced data; may fan out to many consumers.
    Output,
}

impl Pin {
    /// Pins that can receive an edge, in resolution order.
    pub const INPUTS: [Pin; 2] = [Pin::Input, Pin::Aux];

    /// Canonical pin name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Aux => "aux",
            Self::Output => "output",
        }
    }
}

impl FromStr for Pin {
    type Err = PixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(Self::Input),
            "aux" => Ok(Self::Aux),
            "output" => Ok(Self::Output),
            other => Err(PixError::UnknownPin(other.to_owned())),
        }
    }
}

impl std::fmt::Display for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation instance: identifier plus an immutable property bag.
///
/// The operation identifier is not validated at construction; an unknown name surfaces when the
/// catalog or the engine is asked to resolve it.
#[derive(Debug, Clone)]
pub struct Node {
    operation: String,
    properties: Properties,
    pub(crate) input: Option<NodeId>,
    pub(crate) aux: Option<NodeId>,
}

impl Node {
    pub(crate) fn new(operation: String, properties: Properties) -> Self {
        Self {
            operation,
            properties,
            input: None,
            aux: None,
        }
    }

    /// Operation identifier, e.g. `gegl:threshold`.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Property bag set at construction.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Shorthand for `properties().get(name)`.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Producer connected to `pin`, if any. `Output` never has a producer.
    pub fn source(&self, pin: Pin) -> Option<NodeId> {
        match pin {
            Pin::Input => self.input,
            Pin::Aux => self.aux,
            Pin::Output => None,
        }
    }

    pub(crate) fn slot_mut(&mut self, pin: Pin) -> Option<&mut Option<NodeId>> {
        match pin {
            Pin::Input => Some(&mut self.input),
            Pin::Aux => Some(&mut self.aux),
            Pin::Output => None,
        }
    }

    /// Connected input pins with their producers, `input` first.
    pub fn incoming(&self) -> impl Iterator<Item = (Pin, NodeId)> + '_ {
        Pin::INPUTS
            .into_iter()
            .filter_map(|pin| self.source(pin).map(|src| (pin, src)))
    }
}
