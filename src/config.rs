//! Process configuration.
//!
//! Every setting is a CLI flag with an environment fallback; `.env` files are
//! loaded by the binary before parsing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::dispatch::ErrorReplyPolicy;
use crate::llms::providers::mistral::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::transport::slack::DEFAULT_API_BASE;

/// rebot - routes chat messages to capabilities chosen by an LLM
#[derive(Parser, Debug, Clone)]
#[command(name = "rebot", version)]
#[command(about = "Routes chat messages to capabilities chosen by an LLM")]
pub struct Settings {
    /// Address to listen on
    #[arg(long, env = "REBOT_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Mistral API key
    #[arg(long, env = "MISTRAL_API_KEY", hide_env_values = true)]
    pub mistral_api_key: String,

    /// Mistral API base URL
    #[arg(long, env = "MISTRAL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub mistral_base_url: String,

    /// Model used for both resolution phases
    #[arg(long, env = "MISTRAL_MODEL", default_value = DEFAULT_MODEL)]
    pub mistral_model: String,

    #[arg(long, env = "MISTRAL_TEMPERATURE", default_value_t = 0.7)]
    pub mistral_temperature: f64,

    #[arg(long, env = "MISTRAL_MAX_TOKENS", default_value_t = 500)]
    pub mistral_max_tokens: u32,

    /// Per-request timeout in seconds
    #[arg(long, env = "MISTRAL_TIMEOUT_SECS", default_value_t = 120)]
    pub mistral_timeout_secs: u64,

    /// Retries on 429/5xx and transport errors
    #[arg(long, env = "MISTRAL_MAX_RETRIES", default_value_t = 3)]
    pub mistral_max_retries: u32,

    /// Slack bot token (xoxb-...)
    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub slack_bot_token: String,

    /// Slack app signing secret, used to verify webhook requests
    #[arg(long, env = "SLACK_SIGNING_SECRET", hide_env_values = true)]
    pub slack_signing_secret: String,

    /// Accepted clock skew for signed Slack requests, in seconds
    #[arg(long, env = "SLACK_REPLAY_WINDOW_SECS", default_value_t = 300)]
    pub slack_replay_window_secs: u32,

    /// Slack Web API base URL
    #[arg(long, env = "SLACK_API_BASE", default_value = DEFAULT_API_BASE)]
    pub slack_api_base: String,

    /// SQLite file backing the event ledger
    #[arg(long, env = "REBOT_DB_PATH", default_value = "re-bot.db")]
    pub db_path: PathBuf,

    /// Drop ledger records older than this many days (unset: keep forever)
    #[arg(long, env = "REBOT_LEDGER_RETENTION_DAYS")]
    pub ledger_retention_days: Option<u32>,

    /// Send an apology to the user when handling a message fails
    #[arg(long, env = "REBOT_ERROR_REPLIES")]
    pub error_replies: bool,

    /// Events buffered between the webhook and the dispatcher
    #[arg(long, env = "REBOT_QUEUE_DEPTH", default_value_t = 256,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub queue_depth: u32,
}

impl Settings {
    pub fn queue_depth(&self) -> usize {
        self.queue_depth as usize
    }

    pub fn mistral_timeout(&self) -> Duration {
        Duration::from_secs(self.mistral_timeout_secs)
    }

    pub fn slack_replay_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.slack_replay_window_secs))
    }

    pub fn error_reply_policy(&self) -> ErrorReplyPolicy {
        if self.error_replies {
            ErrorReplyPolicy::Notify
        } else {
            ErrorReplyPolicy::Silent
        }
    }

    /// Retention window for the ledger, if pruning is enabled.
    pub fn retention(&self) -> Option<chrono::Duration> {
        self.ledger_retention_days
            .map(|days| chrono::Duration::days(i64::from(days)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 7] = [
        "rebot",
        "--mistral-api-key",
        "mk-test",
        "--slack-bot-token",
        "xoxb-test",
        "--slack-signing-secret",
        "signing-test",
    ];

    #[test]
    fn test_explicit_flags() {
        let mut args: Vec<&str> = REQUIRED.to_vec();
        args.extend([
            "--listen",
            "127.0.0.1:9000",
            "--mistral-model",
            "mistral-small",
            "--mistral-max-retries",
            "5",
            "--db-path",
            "/tmp/ledger.db",
            "--ledger-retention-days",
            "30",
            "--error-replies",
            "--queue-depth",
            "8",
        ]);
        let settings = Settings::try_parse_from(args).unwrap();

        assert_eq!(settings.listen, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(settings.mistral_api_key, "mk-test");
        assert_eq!(settings.slack_bot_token, "xoxb-test");
        assert_eq!(settings.slack_signing_secret, "signing-test");
        assert_eq!(settings.slack_replay_window(), chrono::Duration::seconds(300));
        assert_eq!(settings.mistral_model, "mistral-small");
        assert_eq!(settings.mistral_max_retries, 5);
        assert_eq!(settings.db_path, PathBuf::from("/tmp/ledger.db"));
        assert_eq!(settings.retention(), Some(chrono::Duration::days(30)));
        assert_eq!(settings.error_reply_policy(), ErrorReplyPolicy::Notify);
        assert_eq!(settings.queue_depth(), 8);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut args: Vec<&str> = REQUIRED.to_vec();
        args.extend(["--listen", "not-an-address"]);
        assert!(Settings::try_parse_from(args).is_err());

        let mut args: Vec<&str> = REQUIRED.to_vec();
        args.extend(["--queue-depth", "0"]);
        assert!(Settings::try_parse_from(args).is_err());
    }
}
