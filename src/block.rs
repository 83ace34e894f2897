//! Block definitions and their runtime handler.
//!
//! A `BlockDefinition` is what the generator produces for one operation. The
//! same definition drives both the emitted TypeScript module and
//! [`BlockDefinition::invoke`], which performs the call from Rust.

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::RuntimeConfig;
use crate::error::InvokeError;
use crate::http::{self, is_mutating, parse_method, RequestOptions};
use crate::schema::SchemaNode;

/// Input field carrying the whole request body when it is not an object.
pub const RAW_BODY_FIELD: &str = "body";

/// Where an input field ends up in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldLocation {
    Path,
    Query,
    Body,
}

/// One declared configuration field of a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputField {
    pub name: String,
    pub display_name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub field_type: SchemaNode,
    pub required: bool,
    pub location: FieldLocation,
}

/// A generated block: one LaunchDarkly operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    /// Collision-free action identifier, e.g. `updateFlags`
    pub name: String,
    pub description: String,
    pub category: String,
    /// HTTP method, upper case
    pub method: String,
    /// URL path template with `{param}` placeholders
    pub path: String,
    pub inputs: Vec<InputField>,
    pub output: SchemaNode,
    /// Send the `body` input verbatim instead of the remaining fields
    pub raw_body: bool,
}

/// Output channel a block forwards its result to.
pub trait EventSink {
    fn emit(&mut self, event: Value);
}

impl EventSink for Vec<Value> {
    fn emit(&mut self, event: Value) {
        self.push(event);
    }
}

impl BlockDefinition {
    pub fn fields_at(&self, location: FieldLocation) -> impl Iterator<Item = &InputField> + '_ {
        self.inputs.iter().filter(move |f| f.location == location)
    }

    pub fn input(&self, name: &str) -> Option<&InputField> {
        self.inputs.iter().find(|f| f.name == name)
    }

    /// Substitute path parameters and append defined query parameters.
    pub fn endpoint(&self, config: &Map<String, Value>) -> Result<String, InvokeError> {
        let mut url = self.path.clone();
        for field in self.fields_at(FieldLocation::Path) {
            let value = defined(config, &field.name).ok_or_else(|| {
                InvokeError::MissingPathParameter {
                    name: field.name.clone(),
                }
            })?;
            url = url.replace(
                &format!("{{{}}}", field.name),
                &urlencoding::encode(&scalar_text(value)),
            );
        }

        let mut pairs = Vec::new();
        for field in self.fields_at(FieldLocation::Query) {
            match defined(config, &field.name) {
                Some(Value::Array(values)) => {
                    for v in values.iter().filter(|v| !v.is_null()) {
                        pairs.push(query_pair(&field.name, v));
                    }
                }
                Some(value) => pairs.push(query_pair(&field.name, value)),
                None => {}
            }
        }
        if !pairs.is_empty() {
            url.push('?');
            url.push_str(&pairs.join("&"));
        }
        Ok(url)
    }

    /// Body for mutating methods: everything that is not a path or query
    /// parameter, with undefined (`null`) entries dropped.
    pub fn request_body(&self, config: &Map<String, Value>) -> Option<Value> {
        if self.raw_body {
            return defined(config, RAW_BODY_FIELD).cloned();
        }
        let body = config
            .iter()
            .filter(|(_, value)| !value.is_null())
            .filter(|(name, _)| {
                self.input(name)
                    .map_or(true, |f| f.location == FieldLocation::Body)
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect::<Map<_, _>>();
        Some(Value::Object(body))
    }

    /// Run the block: one request, result forwarded to `sink`.
    pub fn invoke(
        &self,
        client: &Client,
        runtime: &RuntimeConfig,
        input: &Value,
        sink: &mut dyn EventSink,
    ) -> Result<(), InvokeError> {
        let config = input.as_object().ok_or(InvokeError::InputNotObject)?;
        let method = parse_method(&self.method)?;
        let endpoint = self.endpoint(config)?;

        let mut options = RequestOptions::new(method.clone());
        if is_mutating(&method) {
            if let Some(body) = self.request_body(config) {
                options = options.body(body);
            }
        }

        debug!(block = %self.name, %endpoint, "invoking block");
        let result = http::request(
            client,
            &runtime.api_key,
            &runtime.base_url,
            &endpoint,
            options,
        )?;
        sink.emit(result);
        Ok(())
    }
}

fn defined<'a>(config: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    config.get(name).filter(|v| !v.is_null())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn query_pair(name: &str, value: &Value) -> String {
    format!(
        "{}={}",
        urlencoding::encode(name),
        urlencoding::encode(&scalar_text(value))
    )
}
