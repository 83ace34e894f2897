//! Generator and runtime configuration.

use std::path::PathBuf;

use crate::naming::DEFAULT_PATH_PREFIX;

/// Public LaunchDarkly API host.
pub const DEFAULT_BASE_URL: &str = "https://app.launchdarkly.com";

/// Configuration for one generation pass.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct GeneratorConfig {
    /// OpenAPI JSON document to read
    pub spec_path: PathBuf,
    /// Directory receiving category folders and `index.ts`
    pub out_dir: PathBuf,
    /// Prefix ignored when deriving names and categories
    pub path_prefix: String,
    /// Base URL baked into generated blocks when no secret overrides it
    pub default_base_url: String,
}

impl GeneratorConfig {
    pub fn new(spec_path: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            spec_path: spec_path.into(),
            out_dir: out_dir.into(),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            default_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set the path prefix stripped before naming.
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    /// Set the base URL generated blocks fall back to.
    pub fn default_base_url(mut self, url: impl Into<String>) -> Self {
        self.default_base_url = url.into();
        self
    }
}

/// Credentials and endpoint used when a block is invoked.
#[derive(Clone)]
#[non_exhaustive]
pub struct RuntimeConfig {
    pub api_key: String,
    pub base_url: String,
}

impl RuntimeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

// Keep the API key out of logs.
impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}
