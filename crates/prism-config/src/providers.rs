use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Configuration for a single provider
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Which vendor this entry talks to
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model identifier; the vendor default is used when absent
    #[serde(default)]
    pub model: Option<String>,
    /// Sampling temperature override
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Maximum output tokens override
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Bedrock-specific settings (required when `type = "bedrock"`)
    #[serde(default)]
    pub bedrock: Option<BedrockConfig>,
    /// Vertex-specific settings (required when `type = "vertex"`)
    #[serde(default)]
    pub vertex: Option<VertexConfig>,
    /// Z.ai API entrypoint selection
    #[serde(default)]
    pub entrypoint: Option<ZaiEntrypoint>,
}

/// Supported provider vendors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// AWS Bedrock (Converse API)
    Bedrock,
    /// Google Gemini (Generative Language API)
    Gemini,
    /// Google Vertex AI
    Vertex,
    /// Groq
    #[default]
    Groq,
    /// xAI
    Xai,
    /// Fireworks AI
    Fireworks,
    /// DeepSeek
    Deepseek,
    /// Cerebras
    Cerebras,
    /// Chutes AI
    Chutes,
    /// Featherless AI
    Featherless,
    /// Hugging Face inference router
    Huggingface,
    /// SambaNova
    Sambanova,
    /// Z.ai
    Zai,
}

/// AWS Bedrock-specific configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BedrockConfig {
    /// AWS region
    pub region: String,
    /// Access key ID (optional, uses default credential chain if absent)
    #[serde(default)]
    pub access_key_id: Option<SecretString>,
    /// Secret access key
    #[serde(default)]
    pub secret_access_key: Option<SecretString>,
    /// Session token for temporary credentials
    #[serde(default)]
    pub session_token: Option<SecretString>,
    /// Full model/inference-profile ARN overriding the model id
    #[serde(default)]
    pub custom_arn: Option<String>,
    /// Route through a cross-region inference profile
    #[serde(default)]
    pub cross_region_inference: bool,
    /// Insert prompt-cache points for models that support them
    #[serde(default)]
    pub prompt_cache: bool,
    /// VPC endpoint URL
    #[serde(default)]
    pub endpoint_url: Option<Url>,
    /// Whether the VPC endpoint is active
    #[serde(default)]
    pub endpoint_enabled: bool,
}

/// Google Vertex AI-specific configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VertexConfig {
    /// GCP project id
    pub project_id: String,
    /// GCP region (e.g. "us-central1")
    pub region: String,
}

/// Z.ai serves two API lines with separate hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZaiEntrypoint {
    /// api.z.ai
    International,
    /// open.bigmodel.cn
    Mainland,
}
