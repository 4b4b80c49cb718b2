use serde::{Deserialize, Serialize};

/// Static capability and price entry for one model
///
/// Read-only reference data; prices are USD per million tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Maximum output tokens per request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Context window in tokens
    pub context_window: u32,
    /// Whether the model accepts image input
    pub supports_images: bool,
    /// Whether the model supports prompt caching
    pub supports_prompt_cache: bool,
    /// Price per million uncached input tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_price: Option<f64>,
    /// Price per million output tokens (reasoning billed at this rate too)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_price: Option<f64>,
    /// Price per million cache-write tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_writes_price: Option<f64>,
    /// Price per million cache-read tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_reads_price: Option<f64>,
    /// Context-window price tiers; empty means untiered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tiers: Vec<PriceTier>,
    /// Vendor-recommended default sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_temperature: Option<f64>,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            max_tokens: None,
            context_window: 128_000,
            supports_images: false,
            supports_prompt_cache: false,
            input_price: None,
            output_price: None,
            cache_writes_price: None,
            cache_reads_price: None,
            tiers: Vec::new(),
            default_temperature: None,
        }
    }
}

/// Price overrides applying up to a context-window bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    /// Tier applies while input tokens fit within this bound
    pub context_window: u32,
    /// Input price override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_price: Option<f64>,
    /// Output price override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_price: Option<f64>,
    /// Cache-read price override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_reads_price: Option<f64>,
    /// Cache-write price override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_writes_price: Option<f64>,
}

/// A model id resolved against a vendor's static table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedModel {
    /// Model identifier sent to the vendor
    pub id: String,
    /// Capability and price info backing the id
    pub info: ModelInfo,
}

impl ResolvedModel {
    /// Resolve an optionally-configured id against a vendor model table
    ///
    /// A configured id that exists in the table gets that entry's info; an
    /// unknown id keeps the caller-supplied string with the default entry's
    /// info; no id at all resolves to the vendor default.
    pub fn resolve(
        configured: Option<&str>,
        default_id: &str,
        table: &[(&str, ModelInfo)],
    ) -> Self {
        let default_info = || {
            table
                .iter()
                .find(|(id, _)| *id == default_id)
                .map_or_else(ModelInfo::default, |(_, info)| info.clone())
        };

        match configured {
            Some(id) => {
                let info = table
                    .iter()
                    .find(|(known, _)| *known == id)
                    .map_or_else(default_info, |(_, info)| info.clone());
                Self { id: id.to_owned(), info }
            }
            None => Self {
                id: default_id.to_owned(),
                info: default_info(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<(&'static str, ModelInfo)> {
        vec![
            (
                "alpha-large",
                ModelInfo {
                    context_window: 200_000,
                    input_price: Some(3.0),
                    output_price: Some(15.0),
                    ..ModelInfo::default()
                },
            ),
            (
                "alpha-small",
                ModelInfo {
                    context_window: 32_000,
                    ..ModelInfo::default()
                },
            ),
        ]
    }

    #[test]
    fn unconfigured_id_resolves_to_default() {
        let resolved = ResolvedModel::resolve(None, "alpha-large", &table());
        assert_eq!(resolved.id, "alpha-large");
        assert_eq!(resolved.info.context_window, 200_000);
    }

    #[test]
    fn known_id_gets_its_own_info() {
        let resolved = ResolvedModel::resolve(Some("alpha-small"), "alpha-large", &table());
        assert_eq!(resolved.id, "alpha-small");
        assert_eq!(resolved.info.context_window, 32_000);
    }

    #[test]
    fn unknown_id_keeps_caller_string_with_default_info() {
        let resolved = ResolvedModel::resolve(Some("brand-new-model"), "alpha-large", &table());
        assert_eq!(resolved.id, "brand-new-model");
        assert_eq!(resolved.info.context_window, 200_000);
    }
}
