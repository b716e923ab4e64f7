use clap::Args;

pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3400";

/// Hosted model settings, resolved once at startup.
#[derive(Debug, Clone, Args)]
pub struct ModelConfig {
    /// API key for the hosted model.
    #[arg(long, global = true, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true, env = "ANTHROPIC_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, global = true, env = "ANTHROPIC_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, global = true, env = "RAILMADAD_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,
}

impl ModelConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: base_url.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }

    pub fn require_api_key(&self) -> Result<&str, &'static str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err("ANTHROPIC_API_KEY environment variable not set"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_ignores_trailing_slash() {
        let config = ModelConfig::new("key", "http://127.0.0.1:9000/");
        assert_eq!(config.messages_url(), "http://127.0.0.1:9000/v1/messages");
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let mut config = ModelConfig::new("  ", DEFAULT_BASE_URL);
        assert!(config.require_api_key().is_err());

        config.api_key = None;
        assert!(config.require_api_key().is_err());

        config.api_key = Some("sk-test".to_string());
        assert_eq!(config.require_api_key(), Ok("sk-test"));
    }
}
