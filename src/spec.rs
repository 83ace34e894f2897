//! OpenAPI document → flat list of operations
//!
//! Loads the LaunchDarkly OpenAPI JSON (keeping document order) and extracts
//! one `ApiOperation` per path × method, with parameters, request body and
//! success response dereferenced.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::GenerateError;

/// Methods a block can wrap, in the order they are visited per path.
pub const SUPPORTED_METHODS: &[&str] = &["get", "post", "put", "patch", "delete"];

const IGNORED_PATH_ITEM_KEYS: &[&str] = &[
    "parameters",
    "summary",
    "description",
    "servers",
    "$ref",
];

/// Upper bound on `$ref` chains for parameters, bodies and responses.
const MAX_REF_HOPS: usize = 32;

/// A parsed API operation ready for block generation.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiOperation {
    /// operationId from the spec, if any
    pub operation_id: Option<String>,
    /// HTTP method, upper case
    pub method: String,
    /// URL path template (e.g. "/api/v2/projects/{projectKey}")
    pub path: String,
    /// First tag, if any
    pub tag: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub path_params: Vec<Param>,
    pub query_params: Vec<Param>,
    /// Request body JSON schema, not yet cleaned
    pub body_schema: Option<Value>,
    pub body_required: bool,
    /// JSON schema of the first 2xx response with a JSON body
    pub response_schema: Option<Value>,
    /// Whether the operation documents a 204 response
    pub no_content: bool,
}

/// A single API parameter.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Param {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub schema: Value,
}

impl Param {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            required: false,
            schema,
        }
    }
}

/// Read and parse the OpenAPI document at `path`.
pub fn load_spec(path: &Path) -> Result<Value, GenerateError> {
    let text = std::fs::read_to_string(path).map_err(|source| GenerateError::SpecRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_spec(&text).map_err(|err| match err {
        GenerateError::SpecParse { source, .. } => GenerateError::SpecParse {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Parse an OpenAPI document from a JSON string.
pub fn parse_spec(text: &str) -> Result<Value, GenerateError> {
    let spec: Value = serde_json::from_str(text).map_err(|source| GenerateError::SpecParse {
        path: Default::default(),
        source,
    })?;
    if !spec.is_object() {
        return Err(GenerateError::SpecNotObject);
    }
    Ok(spec)
}

/// Follow a chain of local `$ref`s starting at `value`.
///
/// Returns `None` if a reference cannot be resolved or the chain is too long.
pub fn resolve_ref<'a>(root: &'a Value, value: &'a Value) -> Option<&'a Value> {
    let mut current = value;
    for _ in 0..MAX_REF_HOPS {
        match current.get("$ref").and_then(Value::as_str) {
            Some(reference) => {
                current = reference
                    .strip_prefix('#')
                    .and_then(|pointer| root.pointer(pointer))?;
            }
            None => return Some(current),
        }
    }
    None
}

/// Extract all operations from an OpenAPI document, in document order.
///
/// Malformed path items and operations are skipped with a warning.
pub fn extract_operations(spec: &Value) -> Vec<ApiOperation> {
    let mut ops = Vec::new();

    let paths = match spec.get("paths").and_then(|p| p.as_object()) {
        Some(p) => p,
        None => {
            warn!("OpenAPI spec has no paths");
            return ops;
        }
    };

    for (path, path_item) in paths {
        let Some(path_item) = resolve_ref(spec, path_item).filter(|p| p.is_object()) else {
            warn!(path = %path, "path item missing or not an object, skipping");
            continue;
        };
        let path_level_params = path_item.get("parameters");

        for (key, operation) in path_item.as_object().into_iter().flatten() {
            if key.starts_with("x-") || IGNORED_PATH_ITEM_KEYS.contains(&key.as_str()) {
                continue;
            }
            if !SUPPORTED_METHODS.contains(&key.as_str()) {
                warn!(path = %path, method = %key, "unsupported method, skipping");
                continue;
            }
            if !operation.is_object() {
                warn!(path = %path, method = %key, "operation is not an object, skipping");
                continue;
            }
            ops.push(extract_single_operation(
                spec,
                path,
                key,
                operation,
                path_level_params,
            ));
        }
    }

    debug!(count = ops.len(), "extracted operations");
    ops
}

fn extract_single_operation(
    spec: &Value,
    path: &str,
    method: &str,
    operation: &Value,
    path_level_params: Option<&Value>,
) -> ApiOperation {
    let text = |key: &str| {
        operation
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let tag = operation
        .get("tags")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let (mut path_params, query_params) =
        collect_params(spec, path_level_params, operation.get("parameters"));

    // Path params follow the template; query params keep declaration order
    path_params.sort_by_cached_key(|p| path.find(&format!("{{{}}}", p.name)).unwrap_or(usize::MAX));

    let (body_schema, body_required) = extract_body(spec, operation);
    let (response_schema, no_content) = extract_response(spec, operation);

    ApiOperation {
        operation_id: text("operationId"),
        method: method.to_uppercase(),
        path: path.to_string(),
        tag,
        summary: text("summary"),
        description: text("description"),
        path_params,
        query_params,
        body_schema,
        body_required,
        response_schema,
        no_content,
    }
}

/// Merge path-level + operation-level parameters, split by location.
/// Operation-level overrides path-level per OpenAPI spec.
fn collect_params(
    spec: &Value,
    path_level: Option<&Value>,
    operation_level: Option<&Value>,
) -> (Vec<Param>, Vec<Param>) {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut param_map: HashMap<(String, String), Param> = HashMap::new();

    for source in [path_level, operation_level].iter().flatten() {
        if let Some(params) = source.as_array() {
            for param in params {
                let Some(param) = resolve_ref(spec, param) else {
                    warn!("unresolved parameter reference, skipping");
                    continue;
                };
                if let Some((p, location)) = parse_param(param) {
                    let key = (p.name.clone(), location);
                    if !param_map.contains_key(&key) {
                        order.push(key.clone());
                    }
                    param_map.insert(key, p);
                }
            }
        }
    }

    let mut path_params = Vec::new();
    let mut query_params = Vec::new();

    for key in order {
        let Some(p) = param_map.remove(&key) else {
            continue;
        };
        match key.1.as_str() {
            "path" => path_params.push(Param { required: true, ..p }),
            "query" => query_params.push(p),
            other => debug!(name = %p.name, location = other, "ignoring parameter"),
        }
    }

    (path_params, query_params)
}

/// JSON media type for a content map: `application/json` first, then any `*json*`.
fn json_media<'a>(content: &'a Value) -> Option<&'a Value> {
    let content = content.as_object()?;
    content.get("application/json").or_else(|| {
        content
            .iter()
            .find(|(mime, _)| mime.contains("json"))
            .map(|(_, media)| media)
    })
}

fn extract_body(spec: &Value, operation: &Value) -> (Option<Value>, bool) {
    let request_body = operation
        .get("requestBody")
        .and_then(|rb| resolve_ref(spec, rb));
    let body_required = request_body
        .and_then(|rb| rb.get("required"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let body_schema = request_body
        .and_then(|rb| rb.get("content"))
        .and_then(json_media)
        .and_then(|media| media.get("schema"))
        .cloned();

    (body_schema, body_required)
}

fn extract_response(spec: &Value, operation: &Value) -> (Option<Value>, bool) {
    let Some(responses) = operation.get("responses").and_then(|r| r.as_object()) else {
        return (None, false);
    };

    let no_content = responses.contains_key("204");
    let schema = responses
        .iter()
        .filter(|(status, _)| status.starts_with('2'))
        .filter_map(|(_, response)| resolve_ref(spec, response))
        .filter_map(|response| response.get("content").and_then(json_media))
        .find_map(|media| media.get("schema"))
        .cloned();

    (schema, no_content)
}

/// Parse a single parameter from its JSON representation.
fn parse_param(param: &Value) -> Option<(Param, String)> {
    let name = param.get("name")?.as_str()?.to_string();
    let location = param.get("in")?.as_str()?.to_string();
    let description = param
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let required = param
        .get("required")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let schema = param
        .get("schema")
        .cloned()
        .unwrap_or(serde_json::json!({"type": "string"}));

    Some((
        Param {
            name,
            description,
            required,
            schema,
        },
        location,
    ))
}
