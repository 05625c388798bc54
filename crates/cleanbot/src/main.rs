use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use cleanbot_core::{
    config::Config,
    ledger::DedupLedger,
    poller::UpdatePoller,
    ports::BotApi,
    scheduler::{DeletionScheduler, RetryPolicy},
    stats::RuntimeStats,
};
use cleanbot_status::{KeepAlive, StatusState};
use cleanbot_telegram::TelegramBotApi;

#[tokio::main]
async fn main() -> Result<(), cleanbot_core::Error> {
    cleanbot_core::logging::init("cleanbot")?;

    let cfg = Arc::new(Config::load()?);
    info!(chat_id = %cfg.target_chat_id, "clean bot starting");
    info!("delete messages after {:?}", cfg.delete_after);

    let api: Arc<dyn BotApi> = Arc::new(TelegramBotApi::from_config(&cfg)?);

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            ctrl_c_cancel.cancel();
        }
    });

    run(cfg, api, cancel).await
}

/// Verify the credential, then serve status, keep-alive and the poller until
/// `cancel` fires.
async fn run(
    cfg: Arc<Config>,
    api: Arc<dyn BotApi>,
    cancel: CancellationToken,
) -> Result<(), cleanbot_core::Error> {
    // Never poll with a credential Telegram has not accepted.
    let me = api.verify_credential().await.map_err(|e| {
        error!(error = %e, "failed to verify bot");
        cleanbot_core::Error::Api(e)
    })?;
    info!(
        "bot verified: {} (@{})",
        me.first_name,
        me.username.as_deref().unwrap_or("-")
    );

    let stats = Arc::new(RuntimeStats::new());
    let ledger = Arc::new(DedupLedger::new(cfg.ledger_retention()));
    let deletions = DeletionScheduler::new(
        api.clone(),
        RetryPolicy::from_config(&cfg),
        stats.clone(),
    );

    let status = StatusState {
        cfg: cfg.clone(),
        stats: stats.clone(),
        ledger: ledger.clone(),
    };
    let server_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = cleanbot_status::serve(status, server_cancel).await {
            error!(error = %format!("{e:#}"), "status server error");
        }
    });

    match KeepAlive::from_config(&cfg) {
        Ok(Some(keepalive)) => {
            tokio::spawn(keepalive.run(cancel.clone()));
        }
        Ok(None) => info!("no PUBLIC_URL configured; keep-alive ping disabled"),
        Err(e) => warn!(error = %format!("{e:#}"), "keep-alive disabled"),
    }

    let mut poller = UpdatePoller::new(&cfg, api, ledger, deletions, stats.clone());
    poller.run(cancel).await;

    let pending = stats.in_flight();
    if pending > 0 {
        warn!(pending, "exiting with deletions still pending");
    }

    Ok(())
}
