//! Self-ping to keep free-tier hosts from idling the process out.
//!
//! Failures are logged and otherwise ignored; the bot keeps working whether or
//! not the ping lands.

use std::{future::Future, time::Duration};

use anyhow::Context;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cleanbot_core::config::Config;

pub struct KeepAlive {
    http: reqwest::Client,
    ping_url: String,
    interval: Duration,
}

impl KeepAlive {
    pub fn new(base_url: &str, interval: Duration, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("cleanbot-keepalive/0.1")
            .build()
            .context("keep-alive http client build")?;
        Ok(Self {
            http,
            ping_url: format!("{}/ping", base_url.trim_end_matches('/')),
            interval,
        })
    }

    /// `None` when no public URL is configured.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Option<Self>> {
        let Some(base) = cfg.public_url.as_deref() else {
            return Ok(None);
        };
        Self::new(base, cfg.keepalive_interval, cfg.keepalive_timeout).map(Some)
    }

    pub fn ping_url(&self) -> &str {
        &self.ping_url
    }

    pub async fn ping_once(&self) -> anyhow::Result<()> {
        let resp = self
            .http
            .get(&self.ping_url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.ping_url))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("GET {} returned {status}", self.ping_url);
        }
        Ok(())
    }

    /// Ping every `interval` (first ping one interval after start) until
    /// `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(url = %self.ping_url, every = ?self.interval, "keep-alive ping started");
        let this = &self;
        ping_loop(self.interval, cancel, move || this.ping_once()).await;
    }
}

/// Run `ping` once per `period`, starting one period from now, until `cancel`
/// fires. Failures are logged and the loop goes on. A zero or unrepresentably
/// long period schedules nothing.
async fn ping_loop<F, Fut>(period: Duration, cancel: CancellationToken, mut ping: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let Some(first) = Instant::now()
        .checked_add(period)
        .filter(|_| !period.is_zero())
    else {
        warn!(?period, "keep-alive period out of range; not scheduling pings");
        return;
    };
    let mut tick = interval_at(first, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tick.tick() => match ping().await {
                Ok(()) => info!("keep-alive ping successful"),
                Err(e) => warn!(error = %format!("{e:#}"), "keep-alive ping failed"),
            },
        }
    }
}
