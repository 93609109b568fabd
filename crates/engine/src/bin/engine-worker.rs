//! engine-worker — the edge rule engine process.
//!
//! Pipeline: data bus (SUB) → sample queues → single-/multi-parameter
//! schedulers → notification hub / durable store / command bus (PUB).
//!
//! Configuration comes from the environment (see `EngineConfig`); a
//! `.env` file is loaded when present. Rule files are watched for
//! changes and the affected scheduler is restarted in place.

use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use edgerule_bus::{
    BusPublisher, MemoryBusPublisher, Transport, ZmqBusSubscriber, ZmqCommandPublisher,
};
use edgerule_core::config::{load_dotenv, EngineConfig};
use edgerule_engine::{Dispatcher, MultiParamExecutor, SampleFeed, SingleParamExecutor};
use edgerule_notify::{AlertNotifier, HttpHubNotifier, MemoryNotifier};
use edgerule_rules::{BoundsEvaluator, RuleEvaluator, RuleFileWatcher};
use edgerule_store::{DurableStore, MemoryStore};

// ── CLI ─────────────────────────────────────────────────────────────

/// Edge rule engine — bus-fed telemetry rule evaluation and alerting.
#[derive(Parser, Debug)]
#[command(name = "engine-worker", version, about)]
struct Cli {
    /// Path to a .env file (defaults to ./.env when present).
    #[arg(long, env = "ENGINE_ENV_FILE")]
    env_file: Option<String>,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)?;
            info!(path = %path, "loaded environment file");
        }
        None => load_dotenv(),
    }

    let config = EngineConfig::from_env();
    config.log_summary();

    // Bus endpoints.
    let subscriber = ZmqBusSubscriber::new(Transport::tcp(
        &config.bus.host,
        config.bus.subscribe_port,
    ));
    let publisher: Arc<dyn BusPublisher> = if config.bus.command_enabled {
        let transport = Transport::tcp(&config.bus.host, config.bus.publish_port);
        Arc::new(ZmqCommandPublisher::connect(&transport).await?)
    } else {
        Arc::new(MemoryBusPublisher::new())
    };

    // Delivery targets.
    let store: Arc<dyn DurableStore> = Arc::new(MemoryStore::new());
    let notifier: Arc<dyn AlertNotifier> = match (config.notify.enabled, &config.notify.hub_url) {
        (true, Some(url)) => Arc::new(HttpHubNotifier::new(url.clone())),
        (true, None) => {
            warn!("notifications enabled but NOTIFY_HUB_URL is unset, recording locally");
            Arc::new(MemoryNotifier::new())
        }
        (false, _) => Arc::new(MemoryNotifier::new()),
    };
    let evaluator: Arc<dyn RuleEvaluator> = Arc::new(BoundsEvaluator::new());
    let dispatch = Arc::new(Dispatcher::new(notifier, store, publisher, &config.bus));

    // Ingestion.
    let feed = Arc::new(SampleFeed::new());
    let (ingest_cancel, ingest_cancel_rx) = watch::channel(false);
    let ingest = tokio::spawn(Arc::clone(&feed).run_ingest(
        subscriber,
        config.bus.clone(),
        ingest_cancel_rx,
    ));

    // Schedulers.
    let single = Arc::new(SingleParamExecutor::new(
        config.single_rule.clone(),
        Arc::clone(&feed),
        Arc::clone(&evaluator),
        Arc::clone(&dispatch),
    ));
    let multi = Arc::new(MultiParamExecutor::new(
        config.multi_rule.clone(),
        Arc::clone(&feed),
        Arc::clone(&evaluator),
        Arc::clone(&dispatch),
    ));

    if config.single_rule.enabled {
        if let Err(e) = single.start() {
            warn!(error = %e, "single-parameter scheduler did not start");
        }
    }
    if config.multi_rule.enabled {
        if let Err(e) = multi.start() {
            warn!(error = %e, "multi-parameter scheduler did not start");
        }
    }

    // Rule-file watchers: a change restarts the affected scheduler with
    // the new rule file. Held for the process lifetime.
    let mut watchers = Vec::new();
    if config.single_rule.enabled {
        let exec = Arc::clone(&single);
        match spawn_restart_on_change(&config.single_rule.rule_dir, move || {
            let exec = Arc::clone(&exec);
            async move {
                exec.stop().await;
                exec.start().map_err(|e| e.to_string())
            }
        }) {
            Ok(watcher) => watchers.push(watcher),
            Err(e) => warn!(error = %e, "single rule watcher failed to start"),
        }
    }
    if config.multi_rule.enabled {
        let exec = Arc::clone(&multi);
        match spawn_restart_on_change(&config.multi_rule.rule_dir, move || {
            let exec = Arc::clone(&exec);
            async move {
                exec.stop().await;
                exec.start().map_err(|e| e.to_string())
            }
        }) {
            Ok(watcher) => watchers.push(watcher),
            Err(e) => warn!(error = %e, "multi rule watcher failed to start"),
        }
    }

    info!("engine-worker running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    single.stop().await;
    multi.stop().await;
    let _ = ingest_cancel.send(true);
    let _ = ingest.await;
    drop(watchers);

    info!("engine-worker exited cleanly");
    Ok(())
}

/// Start a rule-file watcher and restart the scheduler via `restart`
/// whenever the rule directory changes.
fn spawn_restart_on_change<F, Fut>(
    rule_dir: &std::path::Path,
    restart: F,
) -> Result<RuleFileWatcher, edgerule_rules::RuleError>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<(), String>> + Send,
{
    let watcher = RuleFileWatcher::start(rule_dir)?;
    let mut rx = watcher.subscribe();
    let dir = rule_dir.display().to_string();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            if !*rx.borrow() {
                continue;
            }
            info!(rule_dir = %dir, "rule file changed, restarting scheduler");
            if let Err(e) = restart().await {
                warn!(rule_dir = %dir, error = %e, "scheduler restart failed");
            }
        }
    });
    Ok(watcher)
}
