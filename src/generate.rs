//! The generation pass: OpenAPI document → block definitions → files.

use std::path::PathBuf;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::block::{BlockDefinition, FieldLocation, InputField, RAW_BODY_FIELD};
use crate::config::GeneratorConfig;
use crate::emit::Emitter;
use crate::error::GenerateError;
use crate::naming::{self, NameRegistry};
use crate::schema::{self, clean_schema, simplify, simplify_property, SchemaNode};
use crate::spec::{extract_operations, load_spec, ApiOperation, Param};

/// Derive block definitions for every supported operation in `spec`.
///
/// Operations whose names cannot be derived are skipped with a warning.
pub fn build_blocks(spec: &Value, path_prefix: &str) -> Vec<BlockDefinition> {
    let mut registry = NameRegistry::new();
    extract_operations(spec)
        .iter()
        .filter_map(|op| build_block(spec, op, path_prefix, &mut registry))
        .collect()
}

/// Build one block, registering its name in `registry`.
pub fn build_block(
    spec: &Value,
    op: &ApiOperation,
    path_prefix: &str,
    registry: &mut NameRegistry,
) -> Option<BlockDefinition> {
    let Some(base) = naming::base_action_name(&op.method, &op.path, path_prefix) else {
        warn!(method = %op.method, path = %op.path, "cannot derive action name, skipping");
        return None;
    };
    let name = registry.register(&base);
    let category = naming::category(op.tag.as_deref(), &op.path, path_prefix);

    let mut inputs = Vec::new();
    for param in path_params(op) {
        inputs.push(param_field(spec, &param, FieldLocation::Path));
    }
    for param in &op.query_params {
        inputs.push(param_field(spec, param, FieldLocation::Query));
    }
    let raw_body = add_body_fields(spec, op, &mut inputs);

    debug!(block = %name, method = %op.method, path = %op.path, "built block");
    Some(BlockDefinition {
        name,
        description: describe(op),
        category,
        method: op.method.clone(),
        path: op.path.clone(),
        inputs,
        output: output_schema(spec, op),
        raw_body,
    })
}

/// Declared path params plus any placeholder the document forgot to declare.
fn path_params(op: &ApiOperation) -> Vec<Param> {
    let mut params = op.path_params.clone();
    for placeholder in naming::path_placeholders(&op.path) {
        if !params.iter().any(|p| p.name == placeholder) {
            debug!(path = %op.path, placeholder, "undeclared path parameter");
            let mut param = Param::new(placeholder, json!({"type": "string"}));
            param.required = true;
            params.push(param);
        }
    }
    params.retain(|p| op.path.contains(&format!("{{{}}}", p.name)));
    params
}

fn param_field(spec: &Value, param: &Param, location: FieldLocation) -> InputField {
    let field_type = simplify_property(&clean_schema(spec, &param.schema));
    let description = if param.description.is_empty() {
        field_type.description().unwrap_or_default().to_string()
    } else {
        param.description.clone()
    };
    InputField {
        name: param.name.clone(),
        display_name: naming::display_name(&param.name),
        description,
        field_type,
        required: param.required || location == FieldLocation::Path,
        location,
    }
}

/// Spread an object body into fields; anything else becomes one `body` field.
///
/// Returns whether the body is sent verbatim.
fn add_body_fields(spec: &Value, op: &ApiOperation, inputs: &mut Vec<InputField>) -> bool {
    let Some(raw) = &op.body_schema else {
        return false;
    };
    let body = simplify(&clean_schema(spec, raw));

    if body.properties().is_empty() {
        inputs.push(InputField {
            name: RAW_BODY_FIELD.to_string(),
            display_name: naming::display_name(RAW_BODY_FIELD),
            description: body
                .description()
                .unwrap_or("Request body")
                .to_string(),
            field_type: body,
            required: op.body_required,
            location: FieldLocation::Body,
        });
        return true;
    }

    for (name, prop) in body.properties() {
        if inputs.iter().any(|f| &f.name == name) {
            warn!(path = %op.path, field = %name, "body property shadows a parameter, skipping");
            continue;
        }
        inputs.push(InputField {
            name: name.clone(),
            display_name: naming::display_name(name),
            description: prop.description().unwrap_or_default().to_string(),
            field_type: prop.clone(),
            required: body.required().contains(name),
            location: FieldLocation::Body,
        });
    }
    false
}

fn output_schema(spec: &Value, op: &ApiOperation) -> SchemaNode {
    match &op.response_schema {
        Some(raw) => schema::field_type(spec, raw),
        None if op.no_content => simplify(&json!({
            "type": "object",
            "properties": {"success": {"type": "boolean"}},
            "required": ["success"]
        })),
        None => SchemaNode::generic_object(None),
    }
}

fn describe(op: &ApiOperation) -> String {
    op.summary
        .clone()
        .or_else(|| op.description.clone())
        .or_else(|| op.operation_id.clone())
        .unwrap_or_else(|| format!("{} {}", op.method, op.path))
}

/// Load the spec, build every block and write the TypeScript tree.
///
/// Returns the generated definitions and the files written.
pub fn run(config: &GeneratorConfig) -> Result<(Vec<BlockDefinition>, Vec<PathBuf>), GenerateError> {
    let spec = load_spec(&config.spec_path)?;
    let blocks = build_blocks(&spec, &config.path_prefix);
    let emitter = Emitter::new(&config.default_base_url)?;
    let written = emitter.write_all(&blocks, &config.out_dir)?;
    info!(
        blocks = blocks.len(),
        files = written.len(),
        out_dir = %config.out_dir.display(),
        "generated blocks"
    );
    Ok((blocks, written))
}
