//! JSON Schema handling for block inputs and outputs.
//!
//! Raw OpenAPI fragments go through two passes: [`clean_schema`] resolves
//! local references and strips keywords the block format cannot express,
//! then [`simplify`] reduces the result to a [`SchemaNode`].

pub mod clean;
pub mod node;
pub mod simplify;

pub use clean::{clean_schema, is_unsupported_keyword, UNSUPPORTED_KEYWORDS};
pub use node::{AdditionalProperties, CompositionKind, PrimitiveType, SchemaNode, ValueType};
pub use simplify::{simplify, simplify_property};

use serde_json::Value;

/// Clean then simplify a raw fragment taken from `root`.
pub fn field_type(root: &Value, schema: &Value) -> SchemaNode {
    simplify(&clean_schema(root, schema))
}
