//! Runtime settings shared by every subcommand.
//!
//! Each flag can also come from the environment, which is how deployments
//! usually provide them.

use anyhow::Context;
use clap::Args;

use crate::cache::CachePolicy;
use crate::feedback::FeedbackConfig;

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub database_url: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "INSIGHTS_LOG", global = true, default_value = "info")]
    pub log_level: String,

    /// How long cached insights stay valid
    #[arg(long, env = "INSIGHTS_CACHE_TTL_MINUTES", global = true, default_value_t = 10)]
    pub cache_ttl_minutes: i64,

    /// Base URL of an OpenAI-compatible chat endpoint; feedback falls back to
    /// built-in lines when unset
    #[arg(long, env = "FEEDBACK_ENDPOINT", global = true)]
    pub feedback_endpoint: Option<String>,

    #[arg(long, env = "FEEDBACK_API_KEY", global = true, hide_env_values = true)]
    pub feedback_api_key: Option<String>,

    #[arg(long, env = "FEEDBACK_MODEL", global = true, default_value = "gpt-4.1-nano")]
    pub feedback_model: String,

    #[arg(long, env = "FEEDBACK_TIMEOUT_SECS", global = true, default_value_t = 5)]
    pub feedback_timeout_secs: u64,
}

impl Settings {
    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a Postgres instance")
    }

    pub fn cache_policy(&self, bypass: bool) -> CachePolicy {
        CachePolicy {
            ttl: chrono::Duration::minutes(self.cache_ttl_minutes.max(0)),
            bypass,
        }
    }

    pub fn feedback_config(&self) -> Option<FeedbackConfig> {
        let endpoint = self.feedback_endpoint.as_ref()?.trim();
        if endpoint.is_empty() {
            return None;
        }

        Some(FeedbackConfig {
            endpoint: endpoint.to_string(),
            api_key: self.feedback_api_key.clone(),
            model: self.feedback_model.clone(),
            timeout_secs: self.feedback_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        settings: Settings,
    }

    fn parse(args: &[&str]) -> Settings {
        let mut argv = vec!["focus-insights"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv).unwrap().settings
    }

    #[test]
    fn explicit_flags_override_defaults() {
        let settings = parse(&[
            "--database-url",
            "postgres://localhost/insights",
            "--cache-ttl-minutes",
            "3",
            "--feedback-endpoint",
            "https://llm.example.com/",
            "--feedback-model",
            "tiny",
        ]);

        assert_eq!(settings.database_url().unwrap(), "postgres://localhost/insights");
        assert_eq!(settings.cache_policy(false).ttl, chrono::Duration::minutes(3));

        let feedback = settings.feedback_config().unwrap();
        assert_eq!(feedback.endpoint, "https://llm.example.com/");
        assert_eq!(feedback.model, "tiny");
    }

    #[test]
    fn blank_endpoint_disables_feedback() {
        let settings = parse(&["--feedback-endpoint", "  "]);
        assert!(settings.feedback_config().is_none());
    }

    #[test]
    fn negative_ttl_clamps_to_zero() {
        let settings = parse(&["--cache-ttl-minutes=-4"]);
        let policy = settings.cache_policy(true);
        assert_eq!(policy.ttl, chrono::Duration::zero());
        assert!(policy.bypass);
    }
}
