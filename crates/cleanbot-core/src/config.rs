use std::{env, fs, path::Path, time::Duration};

use crate::{domain::ChatId, errors::Error, Result};

/// Largest duration any setting may take. Keeps every derived deadline
/// representable as an `Instant`.
pub const MAX_SETTING: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub target_chat_id: ChatId,
    pub telegram_api_url: Option<String>,

    // Deletion
    pub delete_after: Duration,
    pub delete_attempts: u32,
    pub delete_retry_step: Duration,
    pub ledger_retention_margin: Duration,

    // Polling
    pub poll_timeout: Duration,
    pub poll_pause: Duration,
    pub poll_max_backoff: Duration,

    // Liveness
    pub port: u16,
    pub public_url: Option<String>,
    pub keepalive_interval: Duration,
    pub keepalive_timeout: Duration,
}

impl Config {
    /// Built-in defaults around the two required values.
    pub fn new(telegram_bot_token: impl Into<String>, target_chat_id: ChatId) -> Self {
        Self {
            telegram_bot_token: telegram_bot_token.into(),
            target_chat_id,
            telegram_api_url: None,
            delete_after: Duration::from_secs(3 * 60),
            delete_attempts: 3,
            delete_retry_step: Duration::from_secs(5),
            ledger_retention_margin: Duration::from_secs(60 * 60),
            poll_timeout: Duration::from_secs(30),
            poll_pause: Duration::from_millis(100),
            poll_max_backoff: Duration::from_secs(30),
            port: 8080,
            public_url: None,
            keepalive_interval: Duration::from_secs(8 * 60),
            keepalive_timeout: Duration::from_secs(30),
        }
    }

    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let raw_chat = env_str("TARGET_CHAT_ID")
            .or_else(|| env_str("GROUP_CHAT_ID"))
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("TARGET_CHAT_ID environment variable is required".to_string())
            })?;
        let target_chat_id = raw_chat
            .trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| Error::Config(format!("TARGET_CHAT_ID is not an integer: {raw_chat}")))?;

        let mut cfg = Self::new(telegram_bot_token, target_chat_id);

        cfg.telegram_api_url = env_str("TELEGRAM_API_URL").and_then(non_empty);

        if let Some(raw) = env_str("DELETE_AFTER").and_then(non_empty) {
            cfg.delete_after = parse_duration(&raw)
                .ok_or_else(|| Error::Config(format!("DELETE_AFTER is not a duration: {raw}")))?;
        }
        if let Some(n) = env_u32("DELETE_ATTEMPTS") {
            cfg.delete_attempts = n;
        }
        if let Some(s) = env_u64("DELETE_RETRY_STEP_SECS") {
            cfg.delete_retry_step = Duration::from_secs(s);
        }
        if let Some(s) = env_u64("POLL_TIMEOUT_SECS") {
            cfg.poll_timeout = Duration::from_secs(s);
        }

        if let Some(raw) = env_str("PORT").and_then(non_empty) {
            cfg.port = raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: {raw}")))?;
        }
        // Render exposes the service URL on its own; an explicit PUBLIC_URL wins.
        cfg.public_url = env_str("PUBLIC_URL")
            .and_then(non_empty)
            .or_else(|| env_str("RENDER_EXTERNAL_URL").and_then(non_empty))
            .map(|u| u.trim().trim_end_matches('/').to_string());
        if let Some(s) = env_u64("KEEPALIVE_INTERVAL_SECS") {
            cfg.keepalive_interval = Duration::from_secs(s.max(1));
        }

        cfg.check_ranges()?;
        Ok(cfg)
    }

    /// Reject durations too large to schedule against.
    pub fn check_ranges(&self) -> Result<()> {
        let settings = [
            ("DELETE_AFTER", self.delete_after),
            ("DELETE_RETRY_STEP_SECS", self.delete_retry_step),
            ("POLL_TIMEOUT_SECS", self.poll_timeout),
            ("KEEPALIVE_INTERVAL_SECS", self.keepalive_interval),
        ];
        for (key, value) in settings {
            if value > MAX_SETTING {
                return Err(Error::Config(format!(
                    "{key} is out of range: {}s (max {}s)",
                    value.as_secs(),
                    MAX_SETTING.as_secs()
                )));
            }
        }
        Ok(())
    }

    /// Age after which a ledger entry can no longer guard a pending deletion.
    pub fn ledger_retention(&self) -> Duration {
        self.delete_after
            .saturating_add(self.ledger_retention_margin)
    }

    /// Request timeout for the bot API client: a long poll plus headroom.
    pub fn api_request_timeout(&self) -> Duration {
        self.poll_timeout.saturating_add(Duration::from_secs(15))
    }
}

/// Parse `180`, `90s`, `3m`, or `3h`.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let s = raw.trim().to_ascii_lowercase();
    if s.is_empty() {
        return None;
    }

    let (digits, unit_secs) = match s.as_bytes()[s.len() - 1] {
        b's' => (&s[..s.len() - 1], 1),
        b'm' => (&s[..s.len() - 1], 60),
        b'h' => (&s[..s.len() - 1], 60 * 60),
        _ => (s.as_str(), 1),
    };

    let n = digits.trim().parse::<u64>().ok()?;
    n.checked_mul(unit_secs).map(Duration::from_secs)
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
