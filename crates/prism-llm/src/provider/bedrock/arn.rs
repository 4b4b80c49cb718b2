//! Bedrock ARN parsing
//!
//! Bedrock addresses models through several resource types — foundation
//! models, inference profiles, prompt routers, custom and provisioned
//! models — all carried in ARN form. The parsed pieces drive model-info
//! lookup and region-mismatch detection.

/// Pieces extracted from a Bedrock model ARN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArn {
    /// Region segment of the ARN (empty for some custom resources)
    pub region: Option<String>,
    /// Resource type (e.g. "foundation-model", "inference-profile")
    pub model_type: String,
    /// Resource id (e.g. "anthropic.claude-3-opus-20240229-v1:0")
    pub model_id: String,
    /// Cross-region routing prefix on the id (e.g. "us."), when present
    pub cross_region_prefix: Option<String>,
}

impl ParsedArn {
    /// The model id with any cross-region prefix stripped
    pub fn base_model_id(&self) -> &str {
        self.cross_region_prefix
            .as_ref()
            .and_then(|prefix| self.model_id.strip_prefix(prefix.as_str()))
            .unwrap_or(&self.model_id)
    }
}

/// Parse a Bedrock model ARN
///
/// Accepts `arn:<partition>:bedrock:<region>:<account>:<type>/<id>`; the
/// id may itself contain colons (model version suffixes).
pub fn parse_model_arn(arn: &str) -> Option<ParsedArn> {
    let mut segments = arn.splitn(6, ':');

    if segments.next() != Some("arn") {
        return None;
    }
    let _partition = segments.next()?;
    if segments.next() != Some("bedrock") {
        return None;
    }
    let region = segments.next()?;
    let _account = segments.next()?;
    let resource = segments.next()?;

    let (model_type, model_id) = resource.split_once('/')?;
    if model_type.is_empty() || model_id.is_empty() {
        return None;
    }

    Some(ParsedArn {
        region: (!region.is_empty()).then(|| region.to_owned()),
        model_type: model_type.to_owned(),
        model_id: model_id.to_owned(),
        cross_region_prefix: detect_cross_region_prefix(model_id).map(ToOwned::to_owned),
    })
}

/// Cross-region routing prefix present on a model id, if any
fn detect_cross_region_prefix(model_id: &str) -> Option<&'static str> {
    ["us.", "eu.", "apac.", "us-gov."]
        .into_iter()
        .find(|prefix| model_id.starts_with(prefix))
}

/// Cross-region inference-profile prefix for a configured region
///
/// Returns `None` for regions with no published inference profiles.
pub fn cross_region_prefix_for(region: &str) -> Option<&'static str> {
    if region.starts_with("us-gov-") {
        Some("us-gov.")
    } else if region.starts_with("us-") || region.starts_with("ca-") {
        Some("us.")
    } else if region.starts_with("eu-") {
        Some("eu.")
    } else if region.starts_with("ap-") {
        Some("apac.")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foundation_model_arn_parses() {
        let parsed =
            parse_model_arn("arn:aws:bedrock:us-west-2:123:foundation-model/anthropic.claude-3-opus-20240229-v1:0")
                .unwrap();
        assert_eq!(parsed.model_id, "anthropic.claude-3-opus-20240229-v1:0");
        assert_eq!(parsed.model_type, "foundation-model");
        assert_eq!(parsed.region.as_deref(), Some("us-west-2"));
        assert_eq!(parsed.cross_region_prefix, None);
    }

    #[test]
    fn inference_profile_arn_detects_cross_region_prefix() {
        let parsed = parse_model_arn(
            "arn:aws:bedrock:eu-central-1:999:inference-profile/eu.anthropic.claude-sonnet-4-20250514-v1:0",
        )
        .unwrap();
        assert_eq!(parsed.model_type, "inference-profile");
        assert_eq!(parsed.cross_region_prefix.as_deref(), Some("eu."));
        assert_eq!(parsed.base_model_id(), "anthropic.claude-sonnet-4-20250514-v1:0");
    }

    #[test]
    fn prompt_router_arn_parses() {
        let parsed =
            parse_model_arn("arn:aws:bedrock:us-east-1:123:default-prompt-router/anthropic.claude:1").unwrap();
        assert_eq!(parsed.model_type, "default-prompt-router");
        assert_eq!(parsed.model_id, "anthropic.claude:1");
    }

    #[test]
    fn non_bedrock_arn_rejected() {
        assert!(parse_model_arn("arn:aws:iam::123:role/foo").is_none());
        assert!(parse_model_arn("anthropic.claude-3-opus-20240229-v1:0").is_none());
    }

    #[test]
    fn region_prefixes() {
        assert_eq!(cross_region_prefix_for("us-east-1"), Some("us."));
        assert_eq!(cross_region_prefix_for("ca-central-1"), Some("us."));
        assert_eq!(cross_region_prefix_for("eu-west-3"), Some("eu."));
        assert_eq!(cross_region_prefix_for("ap-northeast-1"), Some("apac."));
        assert_eq!(cross_region_prefix_for("us-gov-west-1"), Some("us-gov."));
        assert_eq!(cross_region_prefix_for("sa-east-1"), None);
    }
}
