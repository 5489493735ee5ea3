use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::{
    exception::{ErrorKind, RunResult},
    heap::HeapId,
};

/// Insertion-ordered string-keyed mapping, as returned by `get_point`.
pub type DictPairs = IndexMap<String, Object>;

/// A host value passed to or returned from a [`Session`](crate::Session) call.
///
/// `Object` owns all its data except for `Ref`, which names an iterator or
/// capsule living in the session heap.
///
/// # JSON Serialization
///
/// [`Object::from_json`] and [`Object::to_json`] use natural mappings:
/// - `None` ↔ JSON `null`
/// - `Bool` ↔ JSON `true`/`false`
/// - `Int` ↔ JSON integer (floats are rejected)
/// - `String` ↔ JSON string
/// - `List` ↔ JSON array
/// - `Dict` ↔ JSON object
///
/// `Tuple` and `Ref` are output-only: `{"$tuple": [...]}` and `{"$ref": n}`.
///
/// For binary serialization the derived serde implementation is used instead.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Object {
    None,
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<Self>),
    Tuple(Vec<Self>),
    Dict(DictPairs),
    /// Reference to a heap-resident iterator or capsule.
    Ref(HeapId),
}

impl Object {
    /// Host type name used in error messages.
    ///
    /// Heap references report `"object"`; the session resolves their real type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::String(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Dict(_) => "dict",
            Self::Ref(_) => "object",
        }
    }

    pub fn from_json(value: JsonValue) -> RunResult<Self> {
        Ok(match value {
            JsonValue::Null => Self::None,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => {
                    return Err(ErrorKind::ArgumentError.with_msg(format_args!("unsupported number {n}")));
                }
            },
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect::<RunResult<_>>()?),
            JsonValue::Object(map) => Self::Dict(
                map.into_iter()
                    .map(|(k, v)| Self::from_json(v).map(|v| (k, v)))
                    .collect::<RunResult<_>>()?,
            ),
        })
    }

    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::None => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::from(*i),
            Self::String(s) => JsonValue::String(s.clone()),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            Self::Tuple(items) => {
                serde_json::json!({ "$tuple": items.iter().map(Self::to_json).collect::<Vec<_>>() })
            }
            Self::Dict(pairs) => JsonValue::Object(pairs.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
            Self::Ref(id) => serde_json::json!({ "$ref": id.index() }),
        }
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}
