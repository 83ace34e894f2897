//! Tagged representation of the JSON Schema subset blocks support.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

/// Scalar JSON Schema types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    /// Infer the type of an enum member.
    pub fn of_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(Self::String),
            Value::Bool(_) => Some(Self::Boolean),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self::Integer),
            Value::Number(_) => Some(Self::Number),
            Value::Null => Some(Self::Null),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }
}

/// Any `type` keyword value a bare `additionalProperties` may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Primitive(PrimitiveType),
    Object,
    Array,
}

impl ValueType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            other => PrimitiveType::from_name(other).map(Self::Primitive),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primitive(p) => p.as_str(),
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionalProperties {
    /// `additionalProperties: true`
    Allowed,
    /// `additionalProperties: {"type": ...}`
    Typed(ValueType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionKind {
    OneOf,
    AnyOf,
}

impl CompositionKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::OneOf => "oneOf",
            Self::AnyOf => "anyOf",
        }
    }
}

/// A simplified schema fragment.
///
/// Only the keywords `type`, `properties`, `items`, `required`, `enum`,
/// `anyOf`, `oneOf`, `description` and `additionalProperties` can be
/// represented.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Primitive {
        kind: PrimitiveType,
        enum_values: Vec<Value>,
        description: Option<String>,
    },
    Object {
        properties: Vec<(String, SchemaNode)>,
        required: Vec<String>,
        additional_properties: Option<AdditionalProperties>,
        description: Option<String>,
    },
    Array {
        items: Box<SchemaNode>,
        description: Option<String>,
    },
    Composition {
        kind: CompositionKind,
        variants: Vec<SchemaNode>,
        description: Option<String>,
    },
}

impl SchemaNode {
    /// `{"type": "object"}` with an optional description.
    pub fn generic_object(description: Option<String>) -> Self {
        Self::Object {
            properties: Vec::new(),
            required: Vec::new(),
            additional_properties: None,
            description,
        }
    }

    pub fn primitive(kind: PrimitiveType) -> Self {
        Self::Primitive {
            kind,
            enum_values: Vec::new(),
            description: None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Primitive { description, .. }
            | Self::Object { description, .. }
            | Self::Array { description, .. }
            | Self::Composition { description, .. } => description.as_deref(),
        }
    }

    pub fn set_description(&mut self, text: Option<String>) {
        match self {
            Self::Primitive { description, .. }
            | Self::Object { description, .. }
            | Self::Array { description, .. }
            | Self::Composition { description, .. } => *description = text,
        }
    }

    /// Properties of an object node; empty for every other variant.
    pub fn properties(&self) -> &[(String, SchemaNode)] {
        match self {
            Self::Object { properties, .. } => properties,
            _ => &[],
        }
    }

    /// Names listed in `required` of an object node.
    pub fn required(&self) -> &[String] {
        match self {
            Self::Object { required, .. } => required,
            _ => &[],
        }
    }

    /// Render back into a JSON Schema value.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        match self {
            Self::Primitive {
                kind,
                enum_values,
                description,
            } => {
                out.insert("type".into(), json!(kind.as_str()));
                insert_description(&mut out, description);
                if !enum_values.is_empty() {
                    out.insert("enum".into(), Value::Array(enum_values.clone()));
                }
            }
            Self::Object {
                properties,
                required,
                additional_properties,
                description,
            } => {
                out.insert("type".into(), json!("object"));
                insert_description(&mut out, description);
                if !properties.is_empty() {
                    let props = properties
                        .iter()
                        .map(|(name, node)| (name.clone(), node.to_value()))
                        .collect::<Map<_, _>>();
                    out.insert("properties".into(), Value::Object(props));
                }
                if !required.is_empty() {
                    out.insert("required".into(), json!(required));
                }
                match additional_properties {
                    Some(AdditionalProperties::Allowed) => {
                        out.insert("additionalProperties".into(), Value::Bool(true));
                    }
                    Some(AdditionalProperties::Typed(ty)) => {
                        out.insert(
                            "additionalProperties".into(),
                            json!({ "type": ty.as_str() }),
                        );
                    }
                    None => {}
                }
            }
            Self::Array { items, description } => {
                out.insert("type".into(), json!("array"));
                insert_description(&mut out, description);
                out.insert("items".into(), items.to_value());
            }
            Self::Composition {
                kind,
                variants,
                description,
            } => {
                insert_description(&mut out, description);
                out.insert(
                    kind.keyword().into(),
                    Value::Array(variants.iter().map(Self::to_value).collect()),
                );
            }
        }
        Value::Object(out)
    }
}

fn insert_description(out: &mut Map<String, Value>, description: &Option<String>) {
    if let Some(text) = description {
        out.insert("description".into(), Value::String(text.clone()));
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
