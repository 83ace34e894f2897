//! Error types for the ld-blocks crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a generation pass.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerateError {
    #[error("failed to read OpenAPI spec: {}", path.display())]
    SpecRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in OpenAPI spec: {}", path.display())]
    SpecParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("OpenAPI spec root must be a JSON object")]
    SpecNotObject,

    #[error("failed to register template `{name}`")]
    Template {
        name: &'static str,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("failed to render block `{block}`")]
    Render {
        block: String,
        #[source]
        source: handlebars::RenderError,
    },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the runtime HTTP helper.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RequestError {
    #[error("unsupported HTTP method: {method}")]
    UnsupportedMethod { method: String },

    #[error("HTTP request failed")]
    RequestFailed(#[source] reqwest::Error),

    #[error("failed to read response body")]
    ResponseRead(#[source] reqwest::Error),

    #[error("HTTP {}: {body}", status.as_u16())]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("response declared JSON but could not be parsed")]
    InvalidJson(#[source] serde_json::Error),
}

impl RequestError {
    /// HTTP status of a failed response, if the server answered at all.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while invoking a block.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvokeError {
    #[error("missing required path parameter: {name}")]
    MissingPathParameter { name: String },

    #[error("block input must be a JSON object")]
    InputNotObject,

    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Errors from assembling block input on the command line.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InputError {
    #[error("invalid JSON input")]
    InvalidJson(#[source] serde_json::Error),

    #[error("--json input must be a JSON object")]
    NotObject,

    #[error("invalid --field format: '{field}' (expected key=value)")]
    InvalidFieldFormat { field: String },
}
