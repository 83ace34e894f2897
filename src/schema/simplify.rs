//! Reduce cleaned schema fragments to a [`SchemaNode`].

use serde_json::{Map, Value};
use tracing::debug;

use super::node::{AdditionalProperties, CompositionKind, PrimitiveType, SchemaNode, ValueType};

/// Where a fragment sits relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Root,
    Property,
}

/// Simplify a top-level fragment (request body, response, variant, items).
///
/// `oneOf`/`anyOf` survive here; see [`simplify_property`] for the
/// property-level rule.
pub fn simplify(schema: &Value) -> SchemaNode {
    simplify_at(schema, Position::Root)
}

/// Simplify a fragment used as an object property or input field.
///
/// Compositions collapse to `{"type": "object"}` so the field type stays
/// expressible in the host platform's type system.
pub fn simplify_property(schema: &Value) -> SchemaNode {
    simplify_at(schema, Position::Property)
}

fn simplify_at(schema: &Value, position: Position) -> SchemaNode {
    let Some(obj) = schema.as_object() else {
        return SchemaNode::generic_object(None);
    };
    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);

    // Composition wins over properties/required: having both is invalid input.
    if let Some((kind, members)) = composition(obj) {
        if position == Position::Property {
            return SchemaNode::generic_object(description);
        }
        return SchemaNode::Composition {
            kind,
            variants: members.iter().map(simplify).collect(),
            description,
        };
    }

    if let Some(all_of) = obj.get("allOf").and_then(Value::as_array) {
        if let [single] = all_of.as_slice() {
            let mut node = simplify_at(single, position);
            if description.is_some() {
                node.set_description(description);
            }
            return node;
        }
        return SchemaNode::generic_object(description);
    }

    if obj.contains_key("not") {
        return SchemaNode::generic_object(description);
    }

    match resolve_type(obj) {
        Some(ValueType::Array) => SchemaNode::Array {
            items: Box::new(simplify_items(obj.get("items"))),
            description,
        },
        Some(ValueType::Object) => simplify_object(obj, description),
        Some(ValueType::Primitive(kind)) => SchemaNode::Primitive {
            kind,
            enum_values: obj
                .get("enum")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            description,
        },
        None => SchemaNode::generic_object(description),
    }
}

fn composition(obj: &Map<String, Value>) -> Option<(CompositionKind, &Vec<Value>)> {
    if let Some(members) = obj.get("oneOf").and_then(Value::as_array) {
        return Some((CompositionKind::OneOf, members));
    }
    obj.get("anyOf")
        .and_then(Value::as_array)
        .map(|members| (CompositionKind::AnyOf, members))
}

fn resolve_type(obj: &Map<String, Value>) -> Option<ValueType> {
    match obj.get("type") {
        Some(Value::String(name)) => return ValueType::from_name(name),
        Some(Value::Array(names)) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            let chosen = names
                .iter()
                .find(|n| **n != "null")
                .or_else(|| names.first());
            return chosen.and_then(|n| ValueType::from_name(n));
        }
        _ => {}
    }

    if obj.contains_key("properties") || obj.contains_key("additionalProperties") {
        return Some(ValueType::Object);
    }
    if obj.contains_key("items") {
        return Some(ValueType::Array);
    }
    obj.get("enum")
        .and_then(Value::as_array)
        .and_then(|values| values.iter().find_map(PrimitiveType::of_value))
        .map(ValueType::Primitive)
}

fn simplify_items(items: Option<&Value>) -> SchemaNode {
    match items {
        Some(items @ Value::Object(map)) if !map.is_empty() => simplify(items),
        _ => {
            debug!("array without usable items, defaulting to object items");
            SchemaNode::generic_object(None)
        }
    }
}

fn simplify_object(obj: &Map<String, Value>, description: Option<String>) -> SchemaNode {
    let properties: Vec<(String, SchemaNode)> = obj
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, schema)| (name.clone(), simplify_property(schema)))
                .collect()
        })
        .unwrap_or_default();

    let required = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .filter(|name| properties.iter().any(|(prop, _)| prop == name))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let additional_properties = obj.get("additionalProperties").map(additional_properties);

    SchemaNode::Object {
        properties,
        required,
        additional_properties,
        description,
    }
}

/// Anything but a bare `{"type": ...}` collapses to `true`.
fn additional_properties(value: &Value) -> AdditionalProperties {
    value
        .as_object()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.get("type"))
        .and_then(Value::as_str)
        .and_then(ValueType::from_name)
        .map_or(AdditionalProperties::Allowed, AdditionalProperties::Typed)
}
