//! Telemetry samples and command messages exchanged over the data bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator used in composite records persisted to the durable store.
pub const RECORD_SEPARATOR: &str = "**";

/// Separator used when concatenating correlated parameter values.
pub const VALUE_SEPARATOR: &str = " | ";

/// One timestamped parameter reading from a machine or device.
///
/// Samples are immutable once produced by the bus adapter: they flow
/// through exactly one queue slot, are consumed by exactly one scheduler
/// tick, and are then discarded or embedded in a dispatch record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Parameter identifier (e.g. "Temperature").
    pub id: String,
    /// String-encoded scalar value as it arrived on the bus.
    pub value: String,
    /// When the reading was taken.
    pub time: DateTime<Utc>,
    /// Originating device/machine id.
    pub source: String,
}

impl Sample {
    /// Convenience constructor stamping the current time.
    pub fn new(id: impl Into<String>, value: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            time: Utc::now(),
            source: source.into(),
        }
    }
}

/// Parameter health as reported to the monitoring server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterStatus {
    Healthy,
    NotOk,
}

impl ParameterStatus {
    /// Wire form used by the notification hub.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterStatus::Healthy => "Healthy",
            ParameterStatus::NotOk => "NotOk",
        }
    }
}

impl std::fmt::Display for ParameterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action carried by a command message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandAction {
    Ok,
    Nok,
}

impl std::fmt::Display for CommandAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandAction::Ok => f.write_str("OK"),
            CommandAction::Nok => f.write_str("NOK"),
        }
    }
}

/// What kind of endpoint a command message targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandType {
    Device,
    Application,
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandType::Device => f.write_str("Device"),
            CommandType::Application => f.write_str("Application"),
        }
    }
}

/// Command published back onto the bus when a rule fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub command_action: CommandAction,
    pub parameter_id: String,
    pub command_type: CommandType,
    pub machine_id: String,
}

impl CommandMessage {
    /// Build the not-ok device command for a sample that failed its rule.
    pub fn nok_for(sample: &Sample) -> Self {
        Self {
            command_action: CommandAction::Nok,
            parameter_id: sample.id.clone(),
            command_type: CommandType::Device,
            machine_id: sample.source.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_serde_roundtrip() {
        let sample = Sample::new("P1", "42", "machine-7");
        let json = serde_json::to_string(&sample).unwrap();
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(sample, back);
    }

    #[test]
    fn nok_command_copies_identity() {
        let sample = Sample::new("Pressure", "980", "press-02");
        let cmd = CommandMessage::nok_for(&sample);
        assert_eq!(cmd.command_action, CommandAction::Nok);
        assert_eq!(cmd.command_type, CommandType::Device);
        assert_eq!(cmd.parameter_id, "Pressure");
        assert_eq!(cmd.machine_id, "press-02");
    }

    #[test]
    fn status_wire_form() {
        assert_eq!(ParameterStatus::Healthy.as_str(), "Healthy");
        assert_eq!(ParameterStatus::NotOk.as_str(), "NotOk");
        assert_eq!(CommandAction::Nok.to_string(), "NOK");
    }
}
