//! Strip unsupported keywords and repair malformed schema fragments.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Keywords the block format does not accept. `x-*` extensions are
/// removed as well, see [`is_unsupported_keyword`].
pub const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "$id",
    "$schema",
    "const",
    "default",
    "deprecated",
    "discriminator",
    "example",
    "examples",
    "exclusiveMaximum",
    "exclusiveMinimum",
    "externalDocs",
    "format",
    "maxItems",
    "maxLength",
    "maxProperties",
    "maximum",
    "minItems",
    "minLength",
    "minProperties",
    "minimum",
    "multipleOf",
    "nullable",
    "pattern",
    "readOnly",
    "title",
    "uniqueItems",
    "writeOnly",
    "xml",
];

pub fn is_unsupported_keyword(key: &str) -> bool {
    key.starts_with("x-") || UNSUPPORTED_KEYWORDS.contains(&key)
}

/// Clean `schema`, resolving local `$ref`s against `root`.
///
/// A reference that is already being expanded further up the current path
/// becomes `{}`, so self-referencing schemas always terminate. Every other
/// use of a reference is expanded in place, so the output grows with the
/// number of paths through the component graph. Targets whose expansion hit
/// no cycle are cleaned once and reused.
pub fn clean_schema(root: &Value, schema: &Value) -> Value {
    Cleaner {
        root,
        active_refs: Vec::new(),
        resolved: HashMap::new(),
        cycle_cuts: 0,
    }
    .clean(schema)
}

struct Cleaner<'a> {
    root: &'a Value,
    active_refs: Vec<String>,
    /// Cleaned targets that do not depend on the active path
    resolved: HashMap<String, Value>,
    cycle_cuts: usize,
}

impl Cleaner<'_> {
    fn clean(&mut self, schema: &Value) -> Value {
        let Some(obj) = schema.as_object() else {
            return schema.clone();
        };

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            return self.clean_ref(reference, obj);
        }

        let mut out = Map::new();
        for (key, value) in obj {
            // JSON has no `undefined`; a null keyword is the closest thing.
            if value.is_null() || is_unsupported_keyword(key) {
                continue;
            }
            let cleaned = match key.as_str() {
                "properties" | "patternProperties" | "dependentSchemas" | "$defs"
                | "definitions" => self.clean_properties(value),
                "items" if value.is_array() => self.clean_members(value),
                "items" | "not" | "if" | "then" | "else" | "contains" | "propertyNames"
                | "unevaluatedItems" | "unevaluatedProperties" => self.clean(value),
                "prefixItems" => self.clean_members(value),
                "additionalProperties" => self.clean_additional_properties(value),
                "anyOf" | "oneOf" | "allOf" => self.clean_members(value),
                "required" => clean_required(value),
                _ => value.clone(),
            };
            out.insert(key.clone(), cleaned);
        }
        Value::Object(out)
    }

    fn clean_ref(&mut self, reference: &str, obj: &Map<String, Value>) -> Value {
        if self.active_refs.iter().any(|r| r == reference) {
            debug!(reference, "cyclic schema reference, using empty object");
            self.cycle_cuts += 1;
            return Value::Object(Map::new());
        }

        let cached = self.resolved.get(reference).cloned();
        let mut resolved = match cached {
            Some(cached) => cached,
            None => {
                let target = reference
                    .strip_prefix('#')
                    .and_then(|pointer| self.root.pointer(pointer));
                let Some(target) = target else {
                    warn!(reference, "unresolved schema reference, using empty object");
                    return Value::Object(Map::new());
                };

                let cuts_before = self.cycle_cuts;
                self.active_refs.push(reference.to_string());
                let cleaned = self.clean(target);
                self.active_refs.pop();
                // A cut expansion depends on the path it was reached from.
                if self.cycle_cuts == cuts_before {
                    self.resolved.insert(reference.to_string(), cleaned.clone());
                }
                cleaned
            }
        };

        // A sibling description documents this use site better than the target's.
        if let (Some(description), Value::Object(map)) =
            (obj.get("description").filter(|d| d.is_string()), &mut resolved)
        {
            map.insert("description".into(), description.clone());
        }
        resolved
    }

    fn clean_properties(&mut self, value: &Value) -> Value {
        let Some(props) = value.as_object() else {
            return Value::Object(Map::new());
        };
        let cleaned = props
            .iter()
            .filter(|(_, schema)| !schema.is_null())
            .map(|(name, schema)| (name.clone(), self.clean(schema)))
            .collect::<Map<_, _>>();
        Value::Object(cleaned)
    }

    fn clean_additional_properties(&mut self, value: &Value) -> Value {
        match value {
            Value::Object(map) if map.is_empty() => Value::Bool(true),
            Value::Object(_) => match self.clean(value) {
                Value::Object(map) if map.is_empty() => Value::Bool(true),
                cleaned => cleaned,
            },
            other => other.clone(),
        }
    }

    fn clean_members(&mut self, value: &Value) -> Value {
        match value.as_array() {
            Some(members) => Value::Array(
                members
                    .iter()
                    .filter(|m| !m.is_null())
                    .map(|m| self.clean(m))
                    .collect(),
            ),
            None => Value::Array(Vec::new()),
        }
    }
}

fn clean_required(value: &Value) -> Value {
    match value.as_array() {
        Some(names) => Value::Array(names.iter().filter(|n| n.is_string()).cloned().collect()),
        None => Value::Array(Vec::new()),
    }
}
