use std::fs;

use ld_blocks::{run, FieldLocation, GeneratorConfig};
use serde_json::json;

fn write_spec(dir: &std::path::Path) -> std::path::PathBuf {
    let spec = json!({
        "openapi": "3.0.3",
        "info": {"title": "LaunchDarkly REST API", "version": "2.0"},
        "components": {
            "schemas": {
                "Project": {
                    "type": "object",
                    "title": "Project",
                    "properties": {
                        "key": {"type": "string", "example": "default"},
                        "name": {"type": "string", "maxLength": 100},
                        "environments": {
                            "type": "array",
                            "items": {"$ref": "#/components/schemas/Environment"}
                        }
                    }
                },
                "Environment": {
                    "type": "object",
                    "properties": {
                        "key": {"type": "string"},
                        "project": {"$ref": "#/components/schemas/Project"}
                    }
                }
            }
        },
        "paths": {
            "/api/v2/projects": {
                "get": {
                    "tags": ["Projects"],
                    "summary": "List projects",
                    "parameters": [
                        {"name": "limit", "in": "query", "schema": {"type": "integer", "minimum": 1}}
                    ],
                    "responses": {
                        "200": {"content": {"application/json": {"schema": {
                            "type": "object",
                            "properties": {
                                "items": {"type": "array", "items": {"$ref": "#/components/schemas/Project"}}
                            }
                        }}}}
                    }
                },
                "post": {
                    "tags": ["Projects"],
                    "summary": "Create project",
                    "requestBody": {"content": {"application/json": {"schema": {
                        "type": "object",
                        "required": ["key", "name"],
                        "properties": {
                            "key": {"type": "string"},
                            "name": {"type": "string"}
                        }
                    }}}},
                    "responses": {"201": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Project"}}}}}
                }
            },
            "/api/v2/projects/{projectKey}/flags/{flagKey}": {
                "delete": {
                    "tags": ["Feature flags"],
                    "summary": "Delete feature flag",
                    "parameters": [
                        {"name": "projectKey", "in": "path", "required": true, "schema": {"type": "string"}},
                        {"name": "flagKey", "in": "path", "required": true, "schema": {"type": "string"}}
                    ],
                    "responses": {"204": {"description": "Action succeeded"}}
                }
            }
        }
    });
    let path = dir.join("openapi.json");
    fs::write(&path, serde_json::to_string_pretty(&spec).unwrap()).unwrap();
    path
}

#[test]
fn generates_block_tree_from_spec_file() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = write_spec(dir.path());
    let out = dir.path().join("blocks");

    let (blocks, written) = run(&GeneratorConfig::new(&spec_path, &out)).unwrap();

    let names: Vec<&str> = blocks.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["listProjects", "createProjects", "deleteProjectsFlags"]);
    assert_eq!(written.len(), blocks.len() + 2);

    assert!(out.join("request.ts").is_file());
    assert!(out.join("projects/listProjects.ts").is_file());
    assert!(out.join("projects/createProjects.ts").is_file());
    assert!(out.join("feature-flags/deleteProjectsFlags.ts").is_file());

    let index = fs::read_to_string(out.join("index.ts")).unwrap();
    let flags = index.find("\"deleteProjectsFlags\": deleteProjectsFlags").unwrap();
    let create = index.find("\"createProjects\": createProjects").unwrap();
    let list = index.find("\"listProjects\": listProjects").unwrap();
    assert!(flags < create && create < list, "{index}");
}

#[test]
fn generated_schemas_are_clean_and_finite() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = write_spec(dir.path());
    let out = dir.path().join("blocks");

    let (blocks, _) = run(&GeneratorConfig::new(&spec_path, &out)).unwrap();

    let list = &blocks[0];
    let limit = list.input("limit").unwrap();
    assert_eq!(limit.location, FieldLocation::Query);
    assert_eq!(limit.field_type.to_value(), json!({"type": "integer"}));

    let output = serde_json::to_string(&list.output).unwrap();
    assert!(!output.contains("$ref"));
    assert!(!output.contains("example"));
    assert!(!output.contains("maxLength"));

    let delete = &blocks[2];
    assert_eq!(
        delete.output.to_value(),
        json!({
            "type": "object",
            "properties": {"success": {"type": "boolean"}},
            "required": ["success"]
        })
    );

    let module = fs::read_to_string(out.join("feature-flags/deleteProjectsFlags.ts")).unwrap();
    assert!(module.contains("encodeURIComponent(String(projectKey))"));
    assert!(module.contains(r#"{ method: "DELETE" }"#));
}
