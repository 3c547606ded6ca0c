use serde::{Deserialize, Serialize};

/// Well-known pipeline stages emitted by the agent. The stage field itself is
/// an open enumeration: the backend may add stages at any time, and unknown
/// values are kept and displayed verbatim.
pub mod stage {
    pub const ACTIVATION: &str = "activation";
    pub const WEBHOOK_RECEIVED: &str = "webhook_received";
    pub const AGENT_TRIGGERED: &str = "agent_triggered";
    pub const GATHERING_CONTEXT: &str = "gathering_context";
    pub const CLAUDE_ANALYSIS: &str = "claude_analysis";
    pub const COMPLETE: &str = "complete";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Success,
    Alert,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Success => "SUCCESS",
            LogLevel::Alert => "ALERT",
        }
    }
}

/// One unit of agent telemetry, immutable once parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// ISO-8601 text, used only for display ordering within a session.
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub incident_id: Option<String>,
    #[serde(default)]
    pub integration: Option<String>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    /// Fractional completion in [0, 1].
    #[serde(default)]
    pub progress: Option<f64>,
    /// Open payload; complete-stage entries may carry the full analysis here.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Broadcast to consumers when a complete-stage entry carries an analysis
/// payload, so panels can refresh without re-polling the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEvent {
    pub incident_id: String,
    pub stage: String,
    pub metadata: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_round_trips_upper_case_wire_values() {
        let level: LogLevel = serde_json::from_str("\"SUCCESS\"").expect("level should decode");
        assert_eq!(level, LogLevel::Success);
        assert_eq!(serde_json::to_string(&level).expect("encode"), "\"SUCCESS\"");
        assert_eq!(level.as_str(), "SUCCESS");
    }

    #[test]
    fn entry_decodes_camel_case_fields_and_defaults_optionals() {
        let raw = r#"{
            "timestamp": "2026-08-29T10:15:00Z",
            "level": "INFO",
            "message": "webhook received",
            "incidentId": "INC-42",
            "actionType": "pagerduty.ingest",
            "stage": "webhook_received",
            "progress": 0.2
        }"#;
        let entry: LogEntry = serde_json::from_str(raw).expect("entry should decode");
        assert_eq!(entry.incident_id.as_deref(), Some("INC-42"));
        assert_eq!(entry.action_type.as_deref(), Some("pagerduty.ingest"));
        assert_eq!(entry.stage.as_deref(), Some(stage::WEBHOOK_RECEIVED));
        assert!(entry.integration.is_none());
        assert!(entry.metadata.is_none());
    }

    #[test]
    fn unknown_stage_values_are_preserved_verbatim() {
        let raw = r#"{
            "timestamp": "2026-08-29T10:15:00Z",
            "level": "DEBUG",
            "message": "new pipeline step",
            "stage": "quantum_triage"
        }"#;
        let entry: LogEntry = serde_json::from_str(raw).expect("entry should decode");
        assert_eq!(entry.stage.as_deref(), Some("quantum_triage"));
    }
}
