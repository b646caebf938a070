//! Runtime value → Schema Object inference.
//!
//! Schemas are never authored by hand: they are recomputed from the current
//! example values on every build, so the examples double as documentation.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Number, Value};

use crate::example::Example;

/// Nesting limit for inference; deeper values get an empty schema.
pub const MAX_INFERENCE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaFormat {
    Int64,
    Float,
    Double,
}

/// OpenAPI Schema Object restricted to the shape inference produces.
///
/// `Schema::default()` is the empty `{}` schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<SchemaFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
}

impl Schema {
    /// Infer a schema from anything convertible into an [`Example`].
    pub fn infer(value: impl Into<Example>) -> Self {
        infer_schema(&value.into())
    }

    fn typed(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    fn with_format(mut self, format: SchemaFormat) -> Self {
        self.format = Some(format);
        self
    }

    fn with_example(mut self, example: Option<Value>) -> Self {
        self.example = example;
        self
    }

    /// True for the `{}` fallback schema.
    pub fn is_empty(&self) -> bool {
        *self == Schema::default()
    }
}

/// Infer a Schema Object from a runtime example. Total: never fails.
pub fn infer_schema(example: &Example) -> Schema {
    infer_at(example, 0)
}

fn infer_at(example: &Example, depth: usize) -> Schema {
    if depth > MAX_INFERENCE_DEPTH {
        tracing::warn!(
            max_depth = MAX_INFERENCE_DEPTH,
            "Example nesting exceeds inference depth; using an empty schema"
        );
        return Schema::default();
    }

    match example {
        Example::Bool(b) => {
            Schema::typed(SchemaType::Boolean).with_example(Some(Value::Bool(*b)))
        }
        Example::Integer(i) => Schema::typed(SchemaType::Integer)
            .with_format(SchemaFormat::Int64)
            .with_example(Some(Value::from(*i))),
        Example::Float(f) if !f.is_finite() => non_finite(f64::from(*f)),
        Example::Double(d) if !d.is_finite() => non_finite(*d),
        Example::Float(f) => Schema::typed(SchemaType::Number)
            .with_format(SchemaFormat::Float)
            .with_example(float_example(*f)),
        Example::Double(d) => Schema::typed(SchemaType::Number)
            .with_format(SchemaFormat::Double)
            .with_example(Number::from_f64(*d).map(Value::Number)),
        Example::String(s) => {
            Schema::typed(SchemaType::String).with_example(Some(Value::String(s.clone())))
        }
        Example::Array(items) => {
            let mut schema = Schema::typed(SchemaType::Array);
            // Only the first element is sampled; an empty array has no `items`.
            if let Some(first) = items.first() {
                schema.items = Some(Box::new(infer_at(first, depth + 1)));
            }
            schema
        }
        Example::Object(map) => {
            let properties = map
                .iter()
                .map(|(key, value)| (key.clone(), infer_at(value, depth + 1)))
                .collect();
            Schema {
                properties: Some(properties),
                ..Schema::typed(SchemaType::Object)
            }
        }
        Example::Unknown => {
            tracing::warn!("Unclassifiable example value; using an empty schema");
            Schema::default()
        }
    }
}

fn non_finite(value: f64) -> Schema {
    tracing::warn!(%value, "Non-finite number in example; using an empty schema");
    Schema::default()
}

/// Widen through the decimal representation so `3.14f32` is emitted as
/// `3.14` rather than `3.140000104904175`.
fn float_example(f: f32) -> Option<Value> {
    f.to_string()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn infer_json(example: impl Into<Example>) -> Value {
        serde_json::to_value(Schema::infer(example)).unwrap()
    }

    #[test]
    fn boolean() {
        assert_eq!(
            infer_json(true),
            json!({"type": "boolean", "example": true})
        );
    }

    #[test]
    fn single_precision_float_keeps_its_decimal_example() {
        assert_eq!(
            infer_json(3.14f32),
            json!({"type": "number", "format": "float", "example": 3.14})
        );
    }

    #[test]
    fn double_and_integer_formats() {
        assert_eq!(
            infer_json(2.5f64),
            json!({"type": "number", "format": "double", "example": 2.5})
        );
        assert_eq!(
            infer_json(42u8),
            json!({"type": "integer", "format": "int64", "example": 42})
        );
    }

    #[test]
    fn string() {
        assert_eq!(
            infer_json("fido"),
            json!({"type": "string", "example": "fido"})
        );
    }

    #[test]
    fn empty_array_has_no_items() {
        assert_eq!(infer_json(Vec::<i32>::new()), json!({"type": "array"}));
    }

    #[test]
    fn heterogeneous_array_samples_first_element() {
        let example = Example::Array(vec![Example::from("x"), Example::from(1)]);
        assert_eq!(
            infer_json(example),
            json!({"type": "array", "items": {"type": "string", "example": "x"}})
        );
    }

    #[test]
    fn nested_object() {
        let example = Example::from(json!({"a": 1, "b": ["x"]}));
        assert_eq!(
            infer_json(example),
            json!({
                "type": "object",
                "properties": {
                    "a": {"type": "integer", "format": "int64", "example": 1},
                    "b": {"type": "array", "items": {"type": "string", "example": "x"}}
                }
            })
        );
    }

    #[test]
    fn empty_object_still_has_properties() {
        assert_eq!(
            infer_json(json!({})),
            json!({"type": "object", "properties": {}})
        );
    }

    #[test]
    fn unknown_values_fall_back_to_empty_schema() {
        assert!(Schema::infer(Value::Null).is_empty());
        assert_eq!(infer_json(Value::Null), json!({}));
    }

    #[test]
    fn non_finite_numbers_fall_back_to_empty_schema() {
        assert_eq!(infer_json(f64::NAN), json!({}));
        assert_eq!(infer_json(f32::INFINITY), json!({}));
    }

    #[test]
    fn depth_guard_stops_runaway_nesting() {
        let mut example = Example::from("leaf");
        for _ in 0..(MAX_INFERENCE_DEPTH + 10) {
            example = Example::Array(vec![example]);
        }

        let mut schema = Schema::infer(example);
        let mut depth = 0;
        while let Some(items) = schema.items.take() {
            schema = *items;
            depth += 1;
        }
        assert!(schema.is_empty());
        assert_eq!(depth, MAX_INFERENCE_DEPTH + 1);
    }
}
