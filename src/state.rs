use std::collections::BTreeSet;

use serde::Serialize;

use crate::entry::LogEntry;

/// Read-only snapshot published to consumers on every change. The controller
/// is the sole writer; consumers receive clones and must not feed them back.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamState {
    /// Oldest first, length bounded by the configured cap.
    pub logs: Vec<LogEntry>,
    pub connected: bool,
    pub active_incidents: BTreeSet<String>,
    /// Sticky: carried forward when later entries omit a stage.
    pub current_stage: Option<String>,
    /// Sticky: carried forward when later entries omit progress.
    pub current_progress: Option<f64>,
}
