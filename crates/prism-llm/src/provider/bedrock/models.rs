//! Static Bedrock model table and id-based fallback guessing

use crate::types::ModelInfo;

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "anthropic.claude-sonnet-4-20250514-v1:0";

pub(super) fn models() -> Vec<(&'static str, ModelInfo)> {
    vec![
        (
            "anthropic.claude-sonnet-4-20250514-v1:0",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 200_000,
                supports_images: true,
                supports_prompt_cache: true,
                input_price: Some(3.0),
                output_price: Some(15.0),
                cache_writes_price: Some(3.75),
                cache_reads_price: Some(0.3),
                ..ModelInfo::default()
            },
        ),
        (
            "anthropic.claude-opus-4-20250514-v1:0",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 200_000,
                supports_images: true,
                supports_prompt_cache: true,
                input_price: Some(15.0),
                output_price: Some(75.0),
                cache_writes_price: Some(18.75),
                cache_reads_price: Some(1.5),
                ..ModelInfo::default()
            },
        ),
        (
            "anthropic.claude-3-5-sonnet-20241022-v2:0",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 200_000,
                supports_images: true,
                supports_prompt_cache: true,
                input_price: Some(3.0),
                output_price: Some(15.0),
                cache_writes_price: Some(3.75),
                cache_reads_price: Some(0.3),
                ..ModelInfo::default()
            },
        ),
        (
            "anthropic.claude-3-5-haiku-20241022-v1:0",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 200_000,
                supports_prompt_cache: true,
                input_price: Some(0.8),
                output_price: Some(4.0),
                cache_writes_price: Some(1.0),
                cache_reads_price: Some(0.08),
                ..ModelInfo::default()
            },
        ),
        (
            "anthropic.claude-3-opus-20240229-v1:0",
            ModelInfo {
                max_tokens: Some(4_096),
                context_window: 200_000,
                supports_images: true,
                input_price: Some(15.0),
                output_price: Some(75.0),
                ..ModelInfo::default()
            },
        ),
        (
            "amazon.nova-pro-v1:0",
            ModelInfo {
                max_tokens: Some(5_120),
                context_window: 300_000,
                supports_images: true,
                supports_prompt_cache: true,
                input_price: Some(0.8),
                output_price: Some(3.2),
                cache_reads_price: Some(0.2),
                ..ModelInfo::default()
            },
        ),
        (
            "amazon.nova-lite-v1:0",
            ModelInfo {
                max_tokens: Some(5_120),
                context_window: 300_000,
                supports_images: true,
                supports_prompt_cache: true,
                input_price: Some(0.06),
                output_price: Some(0.24),
                cache_reads_price: Some(0.015),
                ..ModelInfo::default()
            },
        ),
        (
            "meta.llama3-3-70b-instruct-v1:0",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 128_000,
                input_price: Some(0.72),
                output_price: Some(0.72),
                ..ModelInfo::default()
            },
        ),
        (
            "deepseek.r1-v1:0",
            ModelInfo {
                max_tokens: Some(32_768),
                context_window: 128_000,
                input_price: Some(1.35),
                output_price: Some(5.4),
                ..ModelInfo::default()
            },
        ),
    ]
}

/// Look up a base model id, falling back to substring guessing
///
/// Custom ARNs and provisioned models carry ids the static table cannot
/// know; the family substring is enough to pick workable limits and
/// prices. Entirely unknown ids get conservative defaults.
pub(super) fn find_model_info(base_id: &str) -> ModelInfo {
    let table = models();

    if let Some((_, info)) = table.iter().find(|(id, _)| *id == base_id) {
        return info.clone();
    }

    let family_keys = [
        "claude-sonnet-4",
        "claude-opus-4",
        "claude-3-5-sonnet",
        "claude-3-5-haiku",
        "claude-3-opus",
        "nova-pro",
        "nova-lite",
        "llama3",
        "deepseek.r1",
    ];

    for key in family_keys {
        if base_id.contains(key)
            && let Some((_, info)) = table.iter().find(|(id, _)| id.contains(key))
        {
            return info.clone();
        }
    }

    ModelInfo {
        max_tokens: Some(4_096),
        context_window: 128_000,
        ..ModelInfo::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_id_resolves() {
        let info = find_model_info("amazon.nova-pro-v1:0");
        assert_eq!(info.context_window, 300_000);
    }

    #[test]
    fn family_substring_guesses_info() {
        let info = find_model_info("us.anthropic.claude-3-5-sonnet-20241022-v2:0-custom");
        assert_eq!(info.input_price, Some(3.0));
        assert!(info.supports_prompt_cache);
    }

    #[test]
    fn unknown_id_gets_conservative_defaults() {
        let info = find_model_info("mystery.model-v9");
        assert_eq!(info.context_window, 128_000);
        assert!(info.input_price.is_none());
    }
}
