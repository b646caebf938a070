//! Live example values.
//!
//! Request and response bodies are documented by example: the value handed to
//! a [`Content`](crate::model::Content) is classified into one of the kinds
//! below and the schema is inferred from it on every document build.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// A runtime value, classified into the closed set of kinds the inference
/// engine understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Example {
    Bool(bool),
    /// Any integral value. Unsigned values above `i64::MAX` become [`Example::Double`].
    Integer(i64),
    /// Single-precision float.
    Float(f32),
    /// Double-precision or arbitrary-precision decimal.
    Double(f64),
    String(String),
    Array(Vec<Example>),
    Object(IndexMap<String, Example>),
    /// Null or anything else without a schema kind.
    Unknown,
}

impl Example {
    /// Build an object example from `(key, value)` pairs, keeping their order.
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Example>,
    {
        Example::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build an array example.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Example>,
    {
        Example::Array(items.into_iter().map(Into::into).collect())
    }

    /// Convert any `Serialize` value through its JSON representation and
    /// classify the result.
    ///
    /// Serialization failures are not errors: the example degrades to
    /// [`Example::Unknown`] and a warning is logged.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => Example::from(json),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    type_name = std::any::type_name::<T>(),
                    "Example value could not be converted to JSON; using an empty schema"
                );
                Example::Unknown
            }
        }
    }
}

impl From<bool> for Example {
    fn from(v: bool) -> Self {
        Example::Bool(v)
    }
}

macro_rules! integer_example {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Example {
                fn from(v: $t) -> Self {
                    Example::Integer(i64::from(v))
                }
            }
        )*
    };
}

integer_example!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Example {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Example::Integer(i),
            Err(_) => Example::Double(v as f64),
        }
    }
}

impl From<usize> for Example {
    fn from(v: usize) -> Self {
        Example::from(v as u64)
    }
}

impl From<isize> for Example {
    fn from(v: isize) -> Self {
        Example::Integer(v as i64)
    }
}

impl From<f32> for Example {
    fn from(v: f32) -> Self {
        Example::Float(v)
    }
}

impl From<f64> for Example {
    fn from(v: f64) -> Self {
        Example::Double(v)
    }
}

impl From<&str> for Example {
    fn from(v: &str) -> Self {
        Example::String(v.to_string())
    }
}

impl From<String> for Example {
    fn from(v: String) -> Self {
        Example::String(v)
    }
}

impl<T: Into<Example>> From<Vec<T>> for Example {
    fn from(v: Vec<T>) -> Self {
        Example::array(v)
    }
}

impl<T: Into<Example>> From<Option<T>> for Example {
    fn from(v: Option<T>) -> Self {
        v.map_or(Example::Unknown, Into::into)
    }
}

impl<V: Into<Example>> From<IndexMap<String, V>> for Example {
    fn from(v: IndexMap<String, V>) -> Self {
        Example::object(v)
    }
}

impl From<Value> for Example {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Example::Unknown,
            Value::Bool(b) => Example::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Example::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Example::from(u)
                } else {
                    n.as_f64().map_or(Example::Unknown, Example::Double)
                }
            }
            Value::String(s) => Example::String(s),
            Value::Array(items) => Example::Array(items.into_iter().map(Example::from).collect()),
            Value::Object(map) => {
                Example::Object(map.into_iter().map(|(k, v)| (k, Example::from(v))).collect())
            }
        }
    }
}

impl From<&Value> for Example {
    fn from(v: &Value) -> Self {
        Example::from(v.clone())
    }
}
