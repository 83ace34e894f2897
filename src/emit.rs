//! Block definitions → TypeScript modules
//!
//! Every block becomes `<out>/<category>/<name>.ts`; `index.ts` maps names to
//! blocks and `request.ts` holds the shared HTTP helper. Strings reach the
//! output only through `serde_json` (the `json` helper or pre-rendered
//! literals), so quotes, backticks and newlines in descriptions are escaped.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::block::{BlockDefinition, FieldLocation, RAW_BODY_FIELD};
use crate::error::GenerateError;
use crate::http;
use crate::naming;

const BLOCK_TEMPLATE: &str = r#"// Generated by ld-blocks from the LaunchDarkly OpenAPI document. Do not edit.
import { appendQuery, request, type Block } from "../request";

export const {{ident}}: Block = {
  name: {{json name}},
  description: {{json description}},
  category: {{json category}},
  inputs: {
    default: {
      config: {{inputs}},
    },
  },
  outputs: {
    default: {
      type: {{output}},
    },
  },
  async onEvent(input, { events, secrets }) {
{{#if destructure}}
    const { {{destructure}} } = input.event.inputConfig;
{{/if}}
{{#if query_bindings}}
    const query = new URLSearchParams();
{{#each query_bindings}}
    appendQuery(query, {{json key}}, {{ident}});
{{/each}}
    const search = query.toString();
    const endpoint = {{endpoint}} + (search ? `?${search}` : "");
{{else}}
    const endpoint = {{endpoint}};
{{/if}}
{{#if mutating}}
{{#if raw_body}}
    const body = rest[{{json raw_field}}];
{{else}}
    const body = Object.fromEntries(
      Object.entries(rest).filter(([, value]) => value !== undefined),
    );
{{/if}}
    const result = await request(
      secrets.apiKey,
      secrets.baseUrl ?? {{json default_base_url}},
      endpoint,
      { method: {{json method}}, body },
    );
{{else}}
    const result = await request(
      secrets.apiKey,
      secrets.baseUrl ?? {{json default_base_url}},
      endpoint,
      { method: {{json method}} },
    );
{{/if}}
    await events.emit(result);
  },
};

export default {{ident}};
"#;

const INDEX_TEMPLATE: &str = r#"// Generated by ld-blocks from the LaunchDarkly OpenAPI document. Do not edit.
import type { Block } from "./request";
{{#each entries}}
import { {{ident}} } from {{json import_path}};
{{/each}}

export const blocks: Record<string, Block> = {
{{#each entries}}
  {{json name}}: {{ident}},
{{/each}}
};

export default blocks;
"#;

/// Runtime helper shared by every generated block.
pub const REQUEST_HELPER: &str = r#"// Generated by ld-blocks. Do not edit.
export type HttpMethod = "GET" | "POST" | "PUT" | "PATCH" | "DELETE";

export interface BlockContext {
  events: { emit(value: unknown): Promise<void> | void };
  secrets: { apiKey: string; baseUrl?: string };
}

export interface Block {
  name: string;
  description: string;
  category: string;
  inputs: { default: { config: Record<string, unknown> } };
  outputs: { default: { type: unknown } };
  onEvent(
    input: { event: { inputConfig: Record<string, any> } },
    context: BlockContext,
  ): Promise<void>;
}

const MUTATING: HttpMethod[] = ["POST", "PUT", "PATCH"];

export function appendQuery(query: URLSearchParams, key: string, value: unknown): void {
  if (value === undefined || value === null) {
    return;
  }
  for (const item of Array.isArray(value) ? value : [value]) {
    if (item === undefined || item === null) {
      continue;
    }
    query.append(key, typeof item === "object" ? JSON.stringify(item) : String(item));
  }
}

export async function request(
  apiKey: string,
  baseUrl: string,
  endpoint: string,
  { method, body }: { method: HttpMethod; body?: unknown },
): Promise<unknown> {
  const response = await fetch(`${baseUrl.replace(/\/+$/, "")}${endpoint}`, {
    method,
    headers: {
      Authorization: apiKey,
      "Content-Type": "application/json",
    },
    body: MUTATING.includes(method) && body !== undefined ? JSON.stringify(body) : undefined,
  });

  if (response.status >= 400) {
    const text = await response.text();
    throw new Error(`HTTP ${response.status}: ${text}`);
  }
  if (response.status === 204) {
    return { success: true };
  }
  const contentType = response.headers.get("content-type") ?? "";
  if (contentType.includes("json")) {
    return response.json();
  }
  return response.text();
}
"#;

const JS_RESERVED: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Names the generated handler declares or relies on.
const HANDLER_LOCALS: &[&str] = &[
    "Object",
    "String",
    "URLSearchParams",
    "appendQuery",
    "body",
    "encodeURIComponent",
    "endpoint",
    "events",
    "input",
    "query",
    "request",
    "rest",
    "result",
    "search",
    "secrets",
];

handlebars_helper!(json: |v: Json| serde_json::to_string(v).unwrap_or_default());

/// Renders blocks and the index with a preconfigured template registry.
pub struct Emitter {
    registry: Handlebars<'static>,
    default_base_url: String,
}

impl Emitter {
    pub fn new(default_base_url: &str) -> Result<Self, GenerateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(no_escape);
        registry.register_helper("json", Box::new(json));
        registry
            .register_template_string("block", BLOCK_TEMPLATE)
            .map_err(|source| GenerateError::Template {
                name: "block",
                source: Box::new(source),
            })?;
        registry
            .register_template_string("index", INDEX_TEMPLATE)
            .map_err(|source| GenerateError::Template {
                name: "index",
                source: Box::new(source),
            })?;

        Ok(Self {
            registry,
            default_base_url: default_base_url.to_string(),
        })
    }

    /// Render the module for a single block.
    pub fn render_block(&self, block: &BlockDefinition) -> Result<String, GenerateError> {
        let data = self.block_context(block);
        self.registry
            .render("block", &data)
            .map_err(|source| GenerateError::Render {
                block: block.name.clone(),
                source,
            })
    }

    /// Render `index.ts`, sorted by category then name.
    pub fn render_index(&self, blocks: &[BlockDefinition]) -> Result<String, GenerateError> {
        let entries: Vec<Value> = sorted(blocks)
            .into_iter()
            .map(|block| {
                json!({
                    "ident": js_identifier(&block.name, &mut HashSet::new()),
                    "name": block.name,
                    "import_path": format!("./{}", module_path(block)),
                })
            })
            .collect();

        self.registry
            .render("index", &json!({ "entries": entries }))
            .map_err(|source| GenerateError::Render {
                block: "index".to_string(),
                source,
            })
    }

    /// Write `request.ts`, one module per block and `index.ts` under `out_dir`.
    pub fn write_all(
        &self,
        blocks: &[BlockDefinition],
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, GenerateError> {
        let mut written = Vec::with_capacity(blocks.len() + 2);

        let helper = out_dir.join("request.ts");
        write_file(&helper, REQUEST_HELPER)?;
        written.push(helper);

        for block in blocks {
            let path = out_dir.join(format!("{}.ts", module_path(block)));
            write_file(&path, &self.render_block(block)?)?;
            debug!(block = %block.name, path = %path.display(), "wrote block");
            written.push(path);
        }

        let index = out_dir.join("index.ts");
        write_file(&index, &self.render_index(blocks)?)?;
        written.push(index);

        Ok(written)
    }

    fn block_context(&self, block: &BlockDefinition) -> Value {
        let mut used: HashSet<String> = HANDLER_LOCALS.iter().map(|s| s.to_string()).collect();
        let mut bindings = Vec::new();
        let mut path_idents = Vec::new();
        let mut query_bindings = Vec::new();

        for field in block.fields_at(FieldLocation::Path) {
            let ident = js_identifier(&field.name, &mut used);
            bindings.push(format!("{}: {}", js_string(&field.name), ident));
            path_idents.push((field.name.as_str(), ident));
        }
        for field in block.fields_at(FieldLocation::Query) {
            let ident = js_identifier(&field.name, &mut used);
            bindings.push(format!("{}: {}", js_string(&field.name), ident));
            query_bindings.push(json!({ "key": field.name, "ident": ident }));
        }

        let mutating = http::parse_method(&block.method)
            .map(|m| http::is_mutating(&m))
            .unwrap_or(false);
        if mutating {
            bindings.push("...rest".to_string());
        }

        json!({
            "ident": js_identifier(&block.name, &mut HashSet::new()),
            "name": block.name,
            "description": block.description,
            "category": block.category,
            "method": block.method,
            "inputs": indent(&pretty(&inputs_literal(block)), 6),
            "output": indent(&pretty(&block.output.to_value()), 6),
            "destructure": bindings.join(", "),
            "query_bindings": query_bindings,
            "endpoint": endpoint_literal(&block.path, &path_idents),
            "mutating": mutating,
            "raw_body": block.raw_body,
            "raw_field": RAW_BODY_FIELD,
            "default_base_url": self.default_base_url,
        })
    }
}

fn sorted(blocks: &[BlockDefinition]) -> Vec<&BlockDefinition> {
    let mut sorted: Vec<&BlockDefinition> = blocks.iter().collect();
    sorted.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.name.cmp(&b.name))
    });
    sorted
}

/// `<category-slug>/<name>`, relative to the output directory.
pub fn module_path(block: &BlockDefinition) -> String {
    format!("{}/{}", naming::slugify(&block.category), block.name)
}

fn inputs_literal(block: &BlockDefinition) -> Value {
    let fields = block
        .inputs
        .iter()
        .map(|field| {
            (
                field.name.clone(),
                json!({
                    "name": field.display_name,
                    "description": field.description,
                    "type": field.field_type.to_value(),
                    "required": field.required,
                }),
            )
        })
        .collect::<Map<_, _>>();
    Value::Object(fields)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn indent(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn js_string(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("{text:?}"))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// A valid, unused JavaScript identifier for `name`, recorded in `used`.
fn js_identifier(name: &str, used: &mut HashSet<String>) -> String {
    let mut ident = if is_identifier(name) {
        name.to_string()
    } else {
        naming::camel_case(name)
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect()
    };
    if ident.is_empty() {
        ident = "value".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if JS_RESERVED.contains(&ident.as_str()) {
        ident.push('_');
    }

    let mut candidate = ident.clone();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{ident}{n}");
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Template literal for `path` with placeholders bound to local identifiers.
fn endpoint_literal(path: &str, bindings: &[(&str, String)]) -> String {
    let mut out = String::from("`");
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let (text, after) = rest.split_at(start);
        push_template_text(&mut out, text);
        let Some(end) = after.find('}') else {
            push_template_text(&mut out, after);
            rest = "";
            break;
        };
        let name = &after[1..end];
        match bindings.iter().find(|(param, _)| *param == name) {
            Some((_, ident)) => {
                out.push_str(&format!("${{encodeURIComponent(String({ident}))}}"));
            }
            None => push_template_text(&mut out, &after[..=end]),
        }
        rest = &after[end + 1..];
    }
    push_template_text(&mut out, rest);
    out.push('`');
    out
}

fn push_template_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '`' => out.push_str("\\`"),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), GenerateError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| GenerateError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::InputField;
    use crate::schema::{PrimitiveType, SchemaNode};

    fn field(name: &str, location: FieldLocation) -> InputField {
        InputField {
            name: name.to_string(),
            display_name: naming::display_name(name),
            description: format!("The {name}"),
            field_type: SchemaNode::primitive(PrimitiveType::String),
            required: location == FieldLocation::Path,
            location,
        }
    }

    fn make_block(name: &str, category: &str, method: &str, path: &str) -> BlockDefinition {
        BlockDefinition {
            name: name.to_string(),
            description: format!("{method} {path}"),
            category: category.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            inputs: Vec::new(),
            output: SchemaNode::generic_object(None),
            raw_body: false,
        }
    }

    fn patch_flag_block() -> BlockDefinition {
        let mut block = make_block(
            "updateProjectsFlags",
            "Feature flags",
            "PATCH",
            "/api/v2/projects/{projectKey}/flags/{flagKey}",
        );
        block.inputs = vec![
            field("projectKey", FieldLocation::Path),
            field("flagKey", FieldLocation::Path),
            field("comment", FieldLocation::Body),
        ];
        block
    }

    fn emitter() -> Emitter {
        Emitter::new("https://app.launchdarkly.com").unwrap()
    }

    // -- endpoint_literal --

    #[test]
    fn endpoint_literal_interpolates_bound_params() {
        let literal = endpoint_literal(
            "/api/v2/projects/{projectKey}/flags/{flagKey}",
            &[("projectKey", "projectKey".into()), ("flagKey", "flagKey".into())],
        );
        assert_eq!(
            literal,
            "`/api/v2/projects/${encodeURIComponent(String(projectKey))}/flags/${encodeURIComponent(String(flagKey))}`"
        );
    }

    #[test]
    fn endpoint_literal_escapes_template_syntax() {
        let literal = endpoint_literal("/odd/`tick`/$x/{unbound}/{", &[]);
        assert_eq!(literal, "`/odd/\\`tick\\`/\\$x/{unbound}/{`");
    }

    // -- js_identifier --

    #[test]
    fn js_identifier_sanitizes_and_deduplicates() {
        let mut used = HashSet::new();
        assert_eq!(js_identifier("projectKey", &mut used), "projectKey");
        assert_eq!(js_identifier("environment-key", &mut used), "environmentKey");
        assert_eq!(js_identifier("default", &mut used), "default_");
        assert_eq!(js_identifier("2fa", &mut used), "_2fa");
        assert_eq!(js_identifier("project_key", &mut used), "project_key");
        assert_eq!(js_identifier("project-key", &mut used), "projectKey2");
    }

    #[test]
    fn js_identifier_avoids_handler_locals() {
        let mut used: HashSet<String> = HANDLER_LOCALS.iter().map(|s| s.to_string()).collect();
        assert_eq!(js_identifier("query", &mut used), "query2");
        assert_eq!(js_identifier("encodeURIComponent", &mut used), "encodeURIComponent2");
        assert_eq!(js_identifier("String", &mut used), "String2");
    }

    #[test]
    fn render_block_params_do_not_shadow_globals() {
        let mut block = make_block("listObjects", "Objects", "GET", "/api/v2/objects/{Object}");
        block.inputs = vec![
            field("Object", FieldLocation::Path),
            field("URLSearchParams", FieldLocation::Query),
        ];

        let rendered = emitter().render_block(&block).unwrap();

        assert!(rendered.contains(r#""Object": Object2, "URLSearchParams": URLSearchParams2"#));
        assert!(rendered.contains("encodeURIComponent(String(Object2))"));
        assert!(rendered.contains(r#"appendQuery(query, "URLSearchParams", URLSearchParams2);"#));
    }

    // -- render_block --

    #[test]
    fn render_block_destructures_path_params_out_of_body() {
        let rendered = emitter().render_block(&patch_flag_block()).unwrap();

        assert!(rendered.contains("export const updateProjectsFlags: Block = {"));
        assert!(rendered.contains(
            r#"const { "projectKey": projectKey, "flagKey": flagKey, ...rest } = input.event.inputConfig;"#
        ));
        assert!(rendered.contains(
            "const endpoint = `/api/v2/projects/${encodeURIComponent(String(projectKey))}/flags/${encodeURIComponent(String(flagKey))}`;"
        ));
        assert!(rendered.contains("Object.entries(rest).filter(([, value]) => value !== undefined)"));
        assert!(rendered.contains(r#"{ method: "PATCH", body }"#));
        assert!(rendered.contains("await events.emit(result);"));
    }

    #[test]
    fn render_block_get_has_no_body_or_rest() {
        let mut block = make_block("listProjects", "Projects", "GET", "/api/v2/projects");
        block.inputs = vec![field("limit", FieldLocation::Query)];

        let rendered = emitter().render_block(&block).unwrap();

        assert!(!rendered.contains("...rest"));
        assert!(!rendered.contains("const body"));
        assert!(rendered.contains(r#"appendQuery(query, "limit", limit);"#));
        assert!(rendered.contains(r#"{ method: "GET" }"#));
    }

    #[test]
    fn render_block_without_inputs_skips_destructuring() {
        let block = make_block("listTeams", "Teams", "GET", "/api/v2/teams");
        let rendered = emitter().render_block(&block).unwrap();
        assert!(!rendered.contains("input.event.inputConfig"));
        assert!(rendered.contains("const endpoint = `/api/v2/teams`;"));
    }

    #[test]
    fn render_block_raw_body_sends_body_field() {
        let mut block = make_block("updateTeams", "Teams", "PATCH", "/api/v2/teams/{teamKey}");
        block.inputs = vec![
            field("teamKey", FieldLocation::Path),
            field("body", FieldLocation::Body),
        ];
        block.raw_body = true;

        let rendered = emitter().render_block(&block).unwrap();
        assert!(rendered.contains(r#"const body = rest["body"];"#));
    }

    #[test]
    fn render_block_escapes_descriptions() {
        let mut block = make_block("listProjects", "Projects", "GET", "/api/v2/projects");
        block.description = "Lists \"all\" projects\n`${danger}` </script>".to_string();

        let rendered = emitter().render_block(&block).unwrap();

        assert!(rendered.contains(
            r#"description: "Lists \"all\" projects\n`${danger}` </script>","#
        ));
    }

    #[test]
    fn render_block_embeds_input_schema() {
        let rendered = emitter().render_block(&patch_flag_block()).unwrap();
        assert!(rendered.contains(r#""name": "Project Key""#));
        assert!(rendered.contains(r#""required": true"#));
        assert!(rendered.contains(r#"secrets.baseUrl ?? "https://app.launchdarkly.com""#));
    }

    // -- render_index --

    #[test]
    fn render_index_sorts_by_category_then_name() {
        let blocks = vec![
            make_block("listTeams", "Teams", "GET", "/api/v2/teams"),
            make_block("updateFlags", "Feature flags", "PATCH", "/api/v2/flags/{p}/{f}"),
            make_block("createTeams", "Teams", "POST", "/api/v2/teams"),
            make_block("deleteFlags", "Feature flags", "DELETE", "/api/v2/flags/{p}/{f}"),
        ];

        let index = emitter().render_index(&blocks).unwrap();

        let positions: Vec<usize> = [
            r#""deleteFlags": deleteFlags"#,
            r#""updateFlags": updateFlags"#,
            r#""createTeams": createTeams"#,
            r#""listTeams": listTeams"#,
        ]
        .iter()
        .map(|needle| index.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{index}");
        assert!(index.contains(r#"import { updateFlags } from "./feature-flags/updateFlags";"#));
    }

    // -- write_all --

    #[test]
    fn write_all_lays_out_category_directories() {
        let dir = tempfile::tempdir().unwrap();
        let blocks = vec![
            patch_flag_block(),
            make_block("listTeams", "Teams", "GET", "/api/v2/teams"),
        ];

        let written = emitter().write_all(&blocks, dir.path()).unwrap();

        assert_eq!(written.len(), 4);
        assert!(dir.path().join("request.ts").is_file());
        assert!(dir.path().join("feature-flags/updateProjectsFlags.ts").is_file());
        assert!(dir.path().join("teams/listTeams.ts").is_file());
        let index = fs::read_to_string(dir.path().join("index.ts")).unwrap();
        assert!(index.contains(r#"import { listTeams } from "./teams/listTeams";"#));
    }
}
