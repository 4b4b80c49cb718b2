use std::path::Path;

use crate::{Config, ProviderKind};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from a raw TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if env expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if a provider entry is missing its vendor-specific
    /// settings or carries settings for a different vendor
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, provider) in &self.providers {
            match provider.kind {
                ProviderKind::Bedrock => {
                    let Some(bedrock) = &provider.bedrock else {
                        anyhow::bail!("provider '{name}' has type \"bedrock\" but no [providers.{name}.bedrock] table");
                    };
                    if bedrock.region.is_empty() {
                        anyhow::bail!("provider '{name}': bedrock.region must not be empty");
                    }
                    if bedrock.endpoint_enabled && bedrock.endpoint_url.is_none() {
                        anyhow::bail!("provider '{name}': bedrock.endpoint_enabled requires bedrock.endpoint_url");
                    }
                }
                ProviderKind::Vertex => {
                    let Some(vertex) = &provider.vertex else {
                        anyhow::bail!("provider '{name}' has type \"vertex\" but no [providers.{name}.vertex] table");
                    };
                    if vertex.project_id.is_empty() || vertex.region.is_empty() {
                        anyhow::bail!("provider '{name}': vertex.project_id and vertex.region must not be empty");
                    }
                }
                _ => {
                    if provider.bedrock.is_some() {
                        anyhow::bail!("provider '{name}' carries a bedrock table but is not a bedrock provider");
                    }
                    if provider.vertex.is_some() {
                        anyhow::bail!("provider '{name}' carries a vertex table but is not a vertex provider");
                    }
                }
            }

            if provider.entrypoint.is_some() && provider.kind != ProviderKind::Zai {
                anyhow::bail!("provider '{name}': entrypoint is only valid for type \"zai\"");
            }
        }

        Ok(())
    }
}
