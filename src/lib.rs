//! Generate workflow blocks for the LaunchDarkly REST API from its OpenAPI spec.
//!
//! Reads the OpenAPI JSON, turns every supported operation into a
//! [`BlockDefinition`] with cleaned input and output schemas, and writes one
//! TypeScript module per block plus an index. The same definitions can be
//! invoked directly through [`BlockDefinition::invoke`].
//!
//! # Usage
//!
//! ```no_run
//! use ld_blocks::{build_blocks, parse_spec, Emitter, DEFAULT_PATH_PREFIX};
//!
//! let spec = parse_spec(r#"{"openapi":"3.0.0","paths":{}}"#).unwrap();
//! let blocks = build_blocks(&spec, DEFAULT_PATH_PREFIX);
//!
//! let emitter = Emitter::new("https://app.launchdarkly.com").unwrap();
//! emitter.write_all(&blocks, std::path::Path::new("blocks")).unwrap();
//! ```

pub mod block;
pub mod config;
pub mod emit;
pub mod error;
pub mod generate;
pub mod http;
pub mod input;
pub mod naming;
pub mod schema;
pub mod spec;

pub use block::{BlockDefinition, EventSink, FieldLocation, InputField};
pub use config::{GeneratorConfig, RuntimeConfig, DEFAULT_BASE_URL};
pub use emit::Emitter;
pub use error::{GenerateError, InputError, InvokeError, RequestError};
pub use generate::{build_block, build_blocks, run};
pub use http::{request, RequestOptions};
pub use input::build_input;
pub use naming::{NameRegistry, DEFAULT_PATH_PREFIX};
pub use schema::{clean_schema, simplify, SchemaNode};
pub use spec::{extract_operations, load_spec, parse_spec, ApiOperation, Param};

// Re-export dependencies for downstream crates
pub use reqwest;
