//! Model alias table (C7 support). Grounded on the upstream
//! `Models.SHORT_TO_FULL_MODEL_MAP`: user-facing short names map to a
//! provider-qualified model id plus a default max-output-tokens value
//! for providers that need one declared upfront.

use crate::errors::RunError;

#[derive(Debug)]
pub struct ModelSpec {
    pub provider_id: &'static str,
    pub default_max_tokens: u32,
}

const ALIASES: &[(&str, ModelSpec)] = &[
    ("gpt-4o", ModelSpec { provider_id: "gpt-4o-2024-08-06", default_max_tokens: 4096 }),
    ("gpt-4o-mini", ModelSpec { provider_id: "gpt-4o-mini-2024-07-18", default_max_tokens: 4096 }),
    ("azure-gpt-4o", ModelSpec { provider_id: "azure/gpt-4o-2024-08-06", default_max_tokens: 4096 }),
    ("claude3-5", ModelSpec { provider_id: "claude-3-5-haiku-20241022", default_max_tokens: 4096 }),
    ("deepseek-v3", ModelSpec { provider_id: "deepseek/deepseek-chat", default_max_tokens: 4096 }),
    ("deepseek-r1", ModelSpec { provider_id: "deepseek-r1", default_max_tokens: 4096 }),
    ("llama3-1", ModelSpec { provider_id: "meta.llama3-1-405b-instruct-v1:0", default_max_tokens: 4096 }),
    ("llama3-3", ModelSpec { provider_id: "bedrock/us.meta.llama3-3-70b-instruct-v1:0", default_max_tokens: 4096 }),
    ("mistral-large", ModelSpec { provider_id: "bedrock/mistral.mistral-large-2407-v1:0", default_max_tokens: 4096 }),
];

/// Unknown aliases are a fatal config error, raised before any network
/// call is attempted, not a silent passthrough.
pub fn resolve(alias: &str) -> Result<&'static ModelSpec, RunError> {
    ALIASES
        .iter()
        .find(|(name, _)| *name == alias)
        .map(|(_, spec)| spec)
        .ok_or_else(|| {
            let known: Vec<&str> = ALIASES.iter().map(|(name, _)| *name).collect();
            RunError::Config(format!(
                "unknown model alias '{alias}'. Valid options are: {}",
                known.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_alias_resolves() {
        let spec = resolve("gpt-4o").unwrap();
        assert_eq!(spec.provider_id, "gpt-4o-2024-08-06");
    }

    #[test]
    fn unknown_alias_is_a_config_error() {
        let err = resolve("not-a-model").unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }
}
