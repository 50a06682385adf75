use crate::buffer::store::Buffer;
use crate::paint::color::Color;
use crate::paint::path::Path;

/// Type tag reported by catalog introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Signed integer.
    Int,
    /// Double-precision float.
    Double,
    /// Boolean flag.
    Boolean,
    /// UTF-8 string (file paths, titles).
    String,
    /// [`Color`] value.
    Color,
    /// [`Path`] value.
    Path,
    /// Shared [`Buffer`] reference.
    Buffer,
}

impl ValueType {
    /// Stable tag string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Color => "color",
            Self::Path => "path",
            Self::Buffer => "buffer",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of property value kinds.
#[derive(Debug, Clone)]
pub enum Value {
    /// Signed integer.
    Int(i64),
    /// Double-precision float.
    Double(f64),
    /// Boolean flag.
    Bool(bool),
    /// UTF-8 string.
    String(String),
    /// Parsed color.
    Color(Color),
    /// Vector path.
    Path(Path),
    /// Shared pixel buffer; the node becomes one of its owners.
    Buffer(Buffer),
}

impl Value {
    /// Tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Int,
            Self::Double(_) => ValueType::Double,
            Self::Bool(_) => ValueType::Boolean,
            Self::String(_) => ValueType::String,
            Self::Color(_) => ValueType::Color,
            Self::Path(_) => ValueType::Path,
            Self::Buffer(_) => ValueType::Buffer,
        }
    }

    /// Coerce into a value of type `ty`, if the conversion is lossless or conventional
    /// (integers widen to doubles).
    pub(crate) fn coerce(&self, ty: ValueType) -> Option<Value> {
        match (self, ty) {
            (v, t) if v.value_type() == t => Some(v.clone()),
            (Self::Int(i), ValueType::Double) => Some(Self::Double(*i as f64)),
            _ => None,
        }
    }

    /// Integer payload.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float payload; integers widen.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Color payload.
    pub fn as_color(&self) -> Option<&Color> {
        match self {
            Self::Color(v) => Some(v),
            _ => None,
        }
    }

    /// Path payload.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(v) => Some(v),
            _ => None,
        }
    }

    /// Buffer payload.
    pub fn as_buffer(&self) -> Option<&Buffer> {
        match self {
            Self::Buffer(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Color> for Value {
    fn from(v: Color) -> Self {
        Self::Color(v)
    }
}

impl From<Path> for Value {
    fn from(v: Path) -> Self {
        Self::Path(v)
    }
}

impl From<Buffer> for Value {
    fn from(v: Buffer) -> Self {
        Self::Buffer(v)
    }
}

/// Ordered property bag. Later inserts of the same name replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: Vec<(String, Value)>,
}

impl Properties {
    /// Empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Value of `name`, if set.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when no property is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/value.rs"]
mod tests;
