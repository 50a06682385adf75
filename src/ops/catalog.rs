use std::collections::BTreeMap;
use std::sync::Arc;

use crate::buffer::raster::Raster;
use crate::buffer::store::Buffer;
use crate::foundation::core::Rectangle;
use crate::foundation::error::{PixError, PixResult};
use crate::graph::ids::NodeId;
use crate::graph::node::Pin;
use crate::graph::value::{Properties, Value, ValueType};
use crate::ops::display::DisplaySink;
use crate::paint::color::Color;
use crate::paint::path::Path;

/// Role of an operation in a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// No inputs; produces data from properties.
    Source,
    /// Consumes `input`.
    Filter,
    /// Consumes `input` (backdrop) and `aux` (source layer).
    Composer,
    /// Consumes `input` and commits a side effect; passes `input` through on `output`.
    Sink,
}

/// Declared property of an operation.
#[derive(Debug, Clone)]
pub struct PropertySpec {
    /// Property name, e.g. `std-dev-x`.
    pub name: &'static str,
    /// Accepted value type.
    pub ty: ValueType,
    /// Value used when the node leaves the property unset; `None` means the property is required.
    pub default: Option<Value>,
    /// One-line description for tooling.
    pub description: &'static str,
}

impl PropertySpec {
    /// Required property with no default.
    pub fn required(name: &'static str, ty: ValueType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            default: None,
            description,
        }
    }

    /// Optional property falling back to `default`.
    pub fn optional(name: &'static str, default: impl Into<Value>, description: &'static str) -> Self {
        let default = default.into();
        Self {
            name,
            ty: default.value_type(),
            default: Some(default),
            description,
        }
    }
}

/// `(name, type tag)` pair reported by [`OperationCatalog::list_properties`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PropertyInfo {
    /// Property name.
    pub name: String,
    /// Type tag.
    #[serde(rename = "type")]
    pub ty: ValueType,
}

impl PropertyInfo {
    /// Type tag string (`int`, `double`, ...).
    pub fn type_tag(&self) -> &'static str {
        self.ty.as_str()
    }
}

/// Node properties after validation against the operation's schema, defaults filled in.
#[derive(Debug, Clone)]
pub struct ResolvedProperties {
    operation: Arc<str>,
    values: BTreeMap<&'static str, Value>,
}

impl ResolvedProperties {
    /// Operation these properties belong to.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Raw resolved value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    fn require<'a, T>(
        &'a self,
        name: &str,
        ty: ValueType,
        pick: impl FnOnce(&'a Value) -> Option<T>,
    ) -> PixResult<T> {
        self.values
            .get(name)
            .and_then(pick)
            .ok_or_else(|| PixError::property(&*self.operation, name, format!("expected {ty}")))
    }

    /// Integer property.
    pub fn int(&self, name: &str) -> PixResult<i64> {
        self.require(name, ValueType::Int, Value::as_int)
    }

    /// Float property (integers widen).
    pub fn double(&self, name: &str) -> PixResult<f64> {
        self.require(name, ValueType::Double, Value::as_double)
    }

    /// Boolean property.
    pub fn boolean(&self, name: &str) -> PixResult<bool> {
        self.require(name, ValueType::Boolean, Value::as_bool)
    }

    /// String property.
    pub fn string(&self, name: &str) -> PixResult<&str> {
        self.require(name, ValueType::String, Value::as_str)
    }

    /// Color property.
    pub fn color(&self, name: &str) -> PixResult<Color> {
        self.require(name, ValueType::Color, |v| v.as_color().copied())
    }

    /// Path property.
    pub fn path(&self, name: &str) -> PixResult<&Path> {
        self.require(name, ValueType::Path, Value::as_path)
    }

    /// Buffer property.
    pub fn buffer(&self, name: &str) -> PixResult<&Buffer> {
        self.require(name, ValueType::Buffer, Value::as_buffer)
    }

    /// Property error attributed to this operation.
    pub fn invalid(&self, name: &str, msg: impl Into<String>) -> PixError {
        PixError::property(&*self.operation, name, msg)
    }
}

/// Inputs to [`Operation::defined_region`].
#[derive(Debug, Clone, Copy)]
pub struct RegionContext<'a> {
    /// Resolved node properties.
    pub props: &'a ResolvedProperties,
    /// Defined region of the `input` producer, if connected.
    pub input: Option<Rectangle>,
    /// Defined region of the `aux` producer, if connected.
    pub aux: Option<Rectangle>,
}

impl RegionContext<'_> {
    /// Union of the connected producers' defined regions.
    pub fn inputs_union(&self) -> Rectangle {
        self.input
            .unwrap_or_default()
            .union(self.aux.unwrap_or_default())
    }
}

/// Everything an operation sees while producing one region.
pub struct ProcessContext<'a> {
    /// Node being evaluated.
    pub node: NodeId,
    /// Resolved node properties.
    pub props: &'a ResolvedProperties,
    /// Region to produce.
    pub roi: Rectangle,
    /// Defined region of this node.
    pub defined: Rectangle,
    /// Output of the `input` producer, covering at least what was requested from it.
    pub input: Option<Arc<Raster>>,
    /// Output of the `aux` producer.
    pub aux: Option<Arc<Raster>>,
    /// Whether row-parallel pixel loops are allowed.
    pub parallel: bool,
    /// Display sink attached to the context, if any.
    pub display: Option<Arc<dyn DisplaySink>>,
}

impl ProcessContext<'_> {
    /// The `input` raster, or an empty one (reading as transparent) when unconnected.
    pub fn input_or_empty(&self) -> Arc<Raster> {
        self.input
            .clone()
            .unwrap_or_else(|| Arc::new(Raster::new(Rectangle::empty())))
    }

    /// Operation-specific failure for this node.
    pub fn fail(&self, msg: impl Into<String>) -> PixError {
        PixError::operation(self.props.operation(), msg)
    }
}

/// An image operation implementation registered in an [`OperationCatalog`].
///
/// The engine asks for the defined region bottom-up, then for the regions required from each
/// input top-down, and finally calls [`Operation::process`] once per node with the union of all
/// requests (clipped to the defined region).
pub trait Operation: Send + Sync {
    /// Catalog identifier, e.g. `gegl:threshold`.
    fn name(&self) -> &str;

    /// Role in the graph.
    fn kind(&self) -> OperationKind;

    /// Declared properties. Empty for operations with nothing to configure.
    fn properties(&self) -> Vec<PropertySpec> {
        Vec::new()
    }

    /// Region where this operation produces data.
    fn defined_region(&self, ctx: &RegionContext<'_>) -> PixResult<Rectangle> {
        Ok(ctx.inputs_union())
    }

    /// Region needed from the producer on `pin` to produce `roi`.
    fn required_region(&self, props: &ResolvedProperties, pin: Pin, roi: Rectangle) -> Rectangle {
        let _ = (props, pin);
        roi
    }

    /// Produce pixels for `ctx.roi`.
    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster>;
}

#[derive(Clone)]
struct Registered {
    op: Arc<dyn Operation>,
    schema: Arc<[PropertySpec]>,
}

/// Registry of operations by identifier.
#[derive(Clone, Default)]
pub struct OperationCatalog {
    ops: BTreeMap<String, Registered>,
}

impl std::fmt::Debug for OperationCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationCatalog")
            .field("operations", &self.ops.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl OperationCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with every built-in operation.
    pub fn with_builtins() -> Self {
        let mut c = Self::new();
        crate::ops::source::register(&mut c);
        crate::ops::codec::register(&mut c);
        crate::ops::filter::register(&mut c);
        crate::ops::composite::register(&mut c);
        crate::ops::vector::register(&mut c);
        crate::ops::display::register(&mut c);
        c
    }

    /// Register `op` under its name, replacing any previous registration.
    pub fn register(&mut self, op: impl Operation + 'static) {
        self.register_arc(Arc::new(op));
    }

    /// Register a shared operation under its name.
    pub fn register_arc(&mut self, op: Arc<dyn Operation>) {
        let schema: Arc<[PropertySpec]> = op.properties().into();
        let name = op.name().to_owned();
        if self
            .ops
            .insert(name.clone(), Registered { op, schema })
            .is_some()
        {
            tracing::debug!(operation = %name, "operation registration replaced");
        }
    }

    /// Return `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Every registered identifier, sorted.
    pub fn list_operations(&self) -> Vec<String> {
        self.ops.keys().cloned().collect()
    }

    /// Declared `(name, type)` pairs of `operation`.
    ///
    /// Fails with [`PixError::UnknownOperation`] when `operation` is not registered or declares no
    /// properties; no partial result is returned.
    pub fn list_properties(&self, operation: &str) -> PixResult<Vec<PropertyInfo>> {
        let reg = self
            .ops
            .get(operation)
            .filter(|r| !r.schema.is_empty())
            .ok_or_else(|| PixError::UnknownOperation(operation.to_owned()))?;
        Ok(reg
            .schema
            .iter()
            .map(|p| PropertyInfo {
                name: p.name.to_owned(),
                ty: p.ty,
            })
            .collect())
    }

    /// Full property declarations of `operation`.
    pub fn property_specs(&self, operation: &str) -> PixResult<Arc<[PropertySpec]>> {
        self.ops
            .get(operation)
            .map(|r| r.schema.clone())
            .ok_or_else(|| PixError::UnknownOperation(operation.to_owned()))
    }

    /// Look up the implementation of `operation`.
    pub fn get(&self, operation: &str) -> PixResult<Arc<dyn Operation>> {
        self.ops
            .get(operation)
            .map(|r| r.op.clone())
            .ok_or_else(|| PixError::UnknownOperation(operation.to_owned()))
    }

    /// Validate `props` against `operation`'s schema and fill in defaults.
    ///
    /// Unknown names, values of the wrong type (integers are accepted where doubles are
    /// declared) and missing required properties fail with [`PixError::Property`].
    pub fn resolve(
        &self,
        operation: &str,
        props: &Properties,
    ) -> PixResult<(Arc<dyn Operation>, ResolvedProperties)> {
        let reg = self
            .ops
            .get(operation)
            .ok_or_else(|| PixError::UnknownOperation(operation.to_owned()))?;

        let mut values = BTreeMap::new();
        for (name, value) in props.iter() {
            let spec = reg
                .schema
                .iter()
                .find(|s| s.name == name)
                .ok_or_else(|| PixError::property(operation, name, "no such property"))?;
            let coerced = value.coerce(spec.ty).ok_or_else(|| {
                PixError::property(
                    operation,
                    name,
                    format!("expected {}, got {}", spec.ty, value.value_type()),
                )
            })?;
            values.insert(spec.name, coerced);
        }
        for spec in reg.schema.iter() {
            if values.contains_key(spec.name) {
                continue;
            }
            match &spec.default {
                Some(v) => {
                    values.insert(spec.name, v.clone());
                }
                None => {
                    return Err(PixError::property(
                        operation,
                        spec.name,
                        "required property is not set",
                    ));
                }
            }
        }

        Ok((
            reg.op.clone(),
            ResolvedProperties {
                operation: Arc::from(operation),
                values,
            },
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ops/catalog.rs"]
mod tests;
