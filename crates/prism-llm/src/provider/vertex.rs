//! Google Vertex AI provider implementation
//!
//! Vertex serves the same `generateContent` surface as Gemini from a
//! regional host, addressed by project and location, with bearer-token
//! authentication.

use async_trait::async_trait;
use prism_config::{ProviderConfig, VertexConfig};
use prism_telemetry::Reporter;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::google_common;
use super::{ChunkStream, Provider};
use crate::convert::google::build_google_request;
use crate::error::LlmError;
use crate::types::{CallMetadata, Message, ModelInfo, PromptOptions, ResolvedModel, Role};

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

fn models() -> Vec<(&'static str, ModelInfo)> {
    vec![
        (
            "gemini-2.5-flash",
            ModelInfo {
                max_tokens: Some(65_536),
                context_window: 1_048_576,
                supports_images: true,
                supports_prompt_cache: true,
                input_price: Some(0.3),
                output_price: Some(2.5),
                cache_reads_price: Some(0.075),
                ..ModelInfo::default()
            },
        ),
        (
            "gemini-2.5-pro",
            ModelInfo {
                max_tokens: Some(65_536),
                context_window: 1_048_576,
                supports_images: true,
                supports_prompt_cache: true,
                input_price: Some(2.5),
                output_price: Some(15.0),
                cache_reads_price: Some(0.625),
                tiers: vec![crate::types::PriceTier {
                    context_window: 200_000,
                    input_price: Some(1.25),
                    output_price: Some(10.0),
                    cache_reads_price: Some(0.31),
                    cache_writes_price: None,
                }],
                ..ModelInfo::default()
            },
        ),
        (
            "gemini-2.0-flash-001",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 1_048_576,
                supports_images: true,
                supports_prompt_cache: true,
                input_price: Some(0.1),
                output_price: Some(0.4),
                cache_reads_price: Some(0.025),
                ..ModelInfo::default()
            },
        ),
    ]
}

/// Vertex AI handler
pub struct VertexProvider {
    client: Client,
    base_url: Url,
    access_token: Option<SecretString>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    model: ResolvedModel,
    reporter: Reporter,
}

impl VertexProvider {
    /// Create from provider configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` when the vertex settings table is absent
    /// or the derived endpoint URL is invalid.
    pub fn new(config: &ProviderConfig, reporter: Reporter) -> Result<Self, LlmError> {
        let Some(vertex) = &config.vertex else {
            return Err(LlmError::Config("vertex provider requires a vertex table".to_owned()));
        };

        let model = ResolvedModel::resolve(config.model.as_deref(), DEFAULT_MODEL, &models());
        let base_url = match &config.base_url {
            Some(url) => url.clone(),
            None => default_base_url(vertex)
                .map_err(|e| LlmError::Config(format!("invalid vertex endpoint: {e}")))?,
        };

        Ok(Self {
            client: Client::new(),
            base_url,
            access_token: config.api_key.clone(),
            temperature: config.temperature.or(model.info.default_temperature),
            max_tokens: config.max_tokens.or(model.info.max_tokens),
            model,
            reporter,
        })
    }

    /// Build the endpoint URL for a generation method
    fn method_url(&self, method: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{}:{method}", self.model.id)
    }

    /// Attach the bearer token when one is configured
    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }
}

/// Derive the regional publisher-model endpoint from vertex settings
fn default_base_url(vertex: &VertexConfig) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "https://{region}-aiplatform.googleapis.com/v1/projects/{project}/locations/{region}/publishers/google/models",
        region = vertex.region,
        project = vertex.project_id,
    ))
}

#[async_trait]
impl Provider for VertexProvider {
    fn name(&self) -> &'static str {
        "Vertex"
    }

    fn model(&self) -> ResolvedModel {
        self.model.clone()
    }

    async fn create_message(
        &self,
        system: &str,
        messages: &[Message],
        metadata: &CallMetadata,
    ) -> Result<ChunkStream, LlmError> {
        let request = build_google_request(system, messages, metadata, self.temperature, self.max_tokens);
        let url = format!("{}?alt=sse", self.method_url("streamGenerateContent"));
        let builder = self.with_auth(self.client.post(url)).json(&request);

        let response = google_common::send(builder, self.name(), &metadata.cancel, &self.reporter).await?;

        Ok(google_common::normalize_stream(response, self.model.info.clone()))
    }

    async fn complete_prompt(&self, prompt: &str, options: &PromptOptions) -> Result<String, LlmError> {
        let messages = [Message::text(Role::User, prompt)];
        let request = build_google_request(
            options.system.as_deref().unwrap_or(""),
            &messages,
            &CallMetadata::default(),
            self.temperature,
            self.max_tokens,
        );
        let builder = self.with_auth(self.client.post(self.method_url("generateContent"))).json(&request);

        let response = google_common::send(builder, self.name(), &options.cancel, &self.reporter).await?;

        google_common::complete(response, self.name(), &options.cancel, &self.reporter).await
    }
}

#[cfg(test)]
mod tests {
    use prism_telemetry::NoopReporter;
    use std::sync::Arc;

    use super::*;

    fn vertex_config() -> ProviderConfig {
        ProviderConfig {
            kind: prism_config::ProviderKind::Vertex,
            vertex: Some(VertexConfig {
                project_id: "acme-dev".to_owned(),
                region: "us-central1".to_owned(),
            }),
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn default_model_when_unconfigured() {
        let provider = VertexProvider::new(&vertex_config(), Arc::new(NoopReporter)).unwrap();
        assert_eq!(provider.model().id, DEFAULT_MODEL);
    }

    #[test]
    fn endpoint_is_derived_from_project_and_region() {
        let provider = VertexProvider::new(&vertex_config(), Arc::new(NoopReporter)).unwrap();
        assert_eq!(
            provider.method_url("generateContent"),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/acme-dev/locations/us-central1/publishers/google/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn missing_vertex_table_is_a_config_error() {
        let err = VertexProvider::new(&ProviderConfig::default(), Arc::new(NoopReporter)).err().unwrap();
        assert!(matches!(err, LlmError::Config(_)));
    }
}
