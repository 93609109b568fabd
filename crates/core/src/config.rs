use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub bus: BusConfig,
    pub single_rule: SingleRuleConfig,
    pub multi_rule: MultiRuleConfig,
    pub notify: NotifyConfig,
}

impl EngineConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            bus: BusConfig::from_env(),
            single_rule: SingleRuleConfig::from_env(),
            multi_rule: MultiRuleConfig::from_env(),
            notify: NotifyConfig::from_env(),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  bus:     host={}, sub_port={}, pub_port={}, topic={}, read_interval={}s",
            self.bus.host,
            self.bus.subscribe_port,
            self.bus.publish_port,
            self.bus.subscribe_topic,
            self.bus.data_read_interval_secs
        );
        tracing::info!(
            "  bus:     persist={}, stream={} (cap {}), commands={}",
            self.bus.persist_enabled,
            self.bus.stream_enabled,
            self.bus.stream_length,
            self.bus.command_enabled
        );
        tracing::info!(
            "  single:  enabled={}, rules={}, interval={}s",
            self.single_rule.enabled,
            self.single_rule.rule_dir.display(),
            self.single_rule.execution_secs
        );
        tracing::info!(
            "  multi:   enabled={}, rules={}, interval={}s, width={}",
            self.multi_rule.enabled,
            self.multi_rule.rule_dir.display(),
            self.multi_rule.execution_secs,
            self.multi_rule.parameters_to_analyze
        );
        tracing::info!(
            "  notify:  enabled={}, hub={}",
            self.notify.enabled,
            self.notify.hub_url.as_deref().unwrap_or("(none)")
        );
    }
}

// ── Data bus ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Bus broker host.
    pub host: String,
    /// Port the sample publisher binds / this process subscribes on.
    pub subscribe_port: u16,
    /// Port command messages are published on.
    pub publish_port: u16,
    /// Topic carrying telemetry samples.
    pub subscribe_topic: String,
    /// Topic command messages are published to.
    pub publish_topic: String,
    /// Fixed delay between bus polls, in seconds.
    pub data_read_interval_secs: u64,
    /// Write composite records to the durable store on a match.
    pub persist_enabled: bool,
    /// Additionally append raw samples to a capped stream.
    pub stream_enabled: bool,
    /// Maximum entries kept per stream.
    pub stream_length: usize,
    /// Publish command messages on a match.
    pub command_enabled: bool,
}

impl BusConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("BUS_HOST", "127.0.0.1"),
            subscribe_port: env_u16("BUS_SUBSCRIBE_PORT", 5560),
            publish_port: env_u16("BUS_PUBLISH_PORT", 5561),
            subscribe_topic: env_or("BUS_SUBSCRIBE_TOPIC", "datamessage"),
            publish_topic: env_or("BUS_PUBLISH_TOPIC", "commandmessage"),
            data_read_interval_secs: env_u64("BUS_READ_INTERVAL_SECS", 1),
            persist_enabled: env_bool("STORE_PERSIST_ENABLED", true),
            stream_enabled: env_bool("STORE_STREAM_ENABLED", false),
            stream_length: env_usize("STORE_STREAM_LENGTH", 1000),
            command_enabled: env_bool("COMMAND_MESSAGE_ENABLED", false),
        }
    }
}

// ── Single-parameter rules ────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleRuleConfig {
    pub enabled: bool,
    /// Root directory searched recursively for `rule.json`.
    pub rule_dir: PathBuf,
    /// Tick interval in seconds.
    pub execution_secs: u64,
}

impl SingleRuleConfig {
    fn from_env() -> Self {
        Self {
            enabled: env_bool("SINGLE_RULE_ENABLED", true),
            rule_dir: PathBuf::from(env_or("SINGLE_RULE_DIR", "rules/single")),
            execution_secs: env_u64("SINGLE_RULE_EXECUTION_SECS", 10),
        }
    }
}

// ── Multi-parameter rules ─────────────────────────────────────

/// Hard cap on correlated parameters per batch.
pub const MAX_CORRELATION_WIDTH: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiRuleConfig {
    pub enabled: bool,
    /// Root directory searched recursively for `rule.json`.
    pub rule_dir: PathBuf,
    /// Tick interval in seconds.
    pub execution_secs: u64,
    /// Distinct parameter ids required before a correlated batch is emitted.
    pub parameters_to_analyze: usize,
}

impl MultiRuleConfig {
    fn from_env() -> Self {
        let width = env_usize("MULTI_RULE_PARAMETERS", MAX_CORRELATION_WIDTH);
        Self {
            enabled: env_bool("MULTI_RULE_ENABLED", true),
            rule_dir: PathBuf::from(env_or("MULTI_RULE_DIR", "rules/multi")),
            execution_secs: env_u64("MULTI_RULE_EXECUTION_SECS", 10),
            parameters_to_analyze: width.clamp(1, MAX_CORRELATION_WIDTH),
        }
    }
}

// ── Notification hub ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub enabled: bool,
    /// Base URL of the monitoring server's alert hub.
    pub hub_url: Option<String>,
}

impl NotifyConfig {
    fn from_env() -> Self {
        Self {
            enabled: env_bool("NOTIFICATION_ENABLED", true),
            hub_url: env_opt("NOTIFY_HUB_URL"),
        }
    }
}
