//! Configuration for Prism
//!
//! Typed TOML configuration for provider credentials, endpoints, and
//! model selection, with `{{ env.VAR }}` expansion for secrets.

mod env;
mod loader;
mod providers;

use indexmap::IndexMap;
use serde::Deserialize;

pub use env::expand_env;
pub use providers::{BedrockConfig, ProviderConfig, ProviderKind, VertexConfig, ZaiEntrypoint};

/// Root configuration document
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Log filter directive (e.g. "info", "prism_llm=debug")
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Provider configurations keyed by name
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,
}
