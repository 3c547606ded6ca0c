use std::collections::BTreeSet;

use crate::entry::{CompletionEvent, LogEntry, stage};

/// Derives per-incident lifecycle state from the entry stream.
///
/// An incident is unseen until an `activation` entry names it, active until a
/// matching `complete` entry arrives, and gone afterwards. Completion of an
/// incident we never saw activate (a reconnect gap) is a no-op removal.
#[derive(Debug, Default)]
pub struct IncidentTracker {
    active: BTreeSet<String>,
    current_stage: Option<String>,
    current_progress: Option<f64>,
}

impl IncidentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one entry, returning a completion notification when a
    /// complete-stage entry carries an analysis payload.
    pub fn observe(&mut self, entry: &LogEntry) -> Option<CompletionEvent> {
        // Sticky fields: carried forward until a later entry overrides them.
        if let Some(s) = &entry.stage {
            self.current_stage = Some(s.clone());
        }
        if let Some(p) = entry.progress {
            self.current_progress = Some(p);
        }

        let Some(incident_id) = entry.incident_id.as_deref().filter(|id| !id.is_empty()) else {
            return None;
        };

        match entry.stage.as_deref() {
            Some(stage::ACTIVATION) => {
                if self.active.insert(incident_id.to_string()) {
                    tracing::info!("Incident {} activated", incident_id);
                }
                None
            }
            Some(stage::COMPLETE) => {
                if self.active.remove(incident_id) {
                    tracing::info!("Incident {} completed", incident_id);
                }
                entry.metadata.as_ref().map(|metadata| CompletionEvent {
                    incident_id: incident_id.to_string(),
                    stage: stage::COMPLETE.to_string(),
                    metadata: metadata.clone(),
                })
            }
            _ => None,
        }
    }

    pub fn active(&self) -> &BTreeSet<String> {
        &self.active
    }

    pub fn current_stage(&self) -> Option<&str> {
        self.current_stage.as_deref()
    }

    pub fn current_progress(&self) -> Option<f64> {
        self.current_progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::LogLevel;

    fn entry(incident_id: Option<&str>, stage: Option<&str>, progress: Option<f64>) -> LogEntry {
        LogEntry {
            timestamp: "2026-08-29T10:00:00Z".to_string(),
            level: LogLevel::Info,
            message: "test".to_string(),
            incident_id: incident_id.map(str::to_string),
            integration: None,
            action_type: None,
            stage: stage.map(str::to_string),
            progress,
            metadata: None,
        }
    }

    #[test]
    fn incident_is_active_strictly_between_activation_and_completion() {
        let mut tracker = IncidentTracker::new();
        assert!(!tracker.active().contains("INC-1"));

        tracker.observe(&entry(Some("INC-1"), Some(stage::ACTIVATION), None));
        assert!(tracker.active().contains("INC-1"));

        tracker.observe(&entry(Some("INC-1"), Some(stage::GATHERING_CONTEXT), None));
        assert!(tracker.active().contains("INC-1"));

        tracker.observe(&entry(Some("INC-1"), Some(stage::COMPLETE), None));
        assert!(!tracker.active().contains("INC-1"));
    }

    #[test]
    fn intermediate_stages_never_change_membership() {
        let mut tracker = IncidentTracker::new();
        tracker.observe(&entry(Some("INC-2"), Some(stage::CLAUDE_ANALYSIS), Some(0.7)));
        assert!(tracker.active().is_empty());
    }

    #[test]
    fn entries_without_incident_id_never_affect_membership() {
        let mut tracker = IncidentTracker::new();
        tracker.observe(&entry(None, Some(stage::ACTIVATION), None));
        tracker.observe(&entry(Some(""), Some(stage::ACTIVATION), None));
        assert!(tracker.active().is_empty());
    }

    #[test]
    fn completion_before_activation_is_a_noop() {
        let mut tracker = IncidentTracker::new();
        tracker.observe(&entry(Some("INC-3"), Some(stage::COMPLETE), None));
        assert!(tracker.active().is_empty());
    }

    #[test]
    fn stage_and_progress_are_sticky_across_entries_that_omit_them() {
        let mut tracker = IncidentTracker::new();
        tracker.observe(&entry(None, Some(stage::GATHERING_CONTEXT), Some(0.4)));
        tracker.observe(&entry(Some("INC-X"), None, None));
        assert_eq!(tracker.current_stage(), Some(stage::GATHERING_CONTEXT));
        assert_eq!(tracker.current_progress(), Some(0.4));
    }

    #[test]
    fn completion_event_is_emitted_only_when_metadata_is_present() {
        let mut tracker = IncidentTracker::new();
        tracker.observe(&entry(Some("INC-4"), Some(stage::ACTIVATION), None));

        let bare = tracker.observe(&entry(Some("INC-4"), Some(stage::COMPLETE), None));
        assert!(bare.is_none());

        tracker.observe(&entry(Some("INC-5"), Some(stage::ACTIVATION), None));
        let mut done = entry(Some("INC-5"), Some(stage::COMPLETE), None);
        done.metadata = Some(serde_json::json!({ "analysis": "root cause: expired cert" }));
        let event = tracker.observe(&done).expect("completion event expected");
        assert_eq!(event.incident_id, "INC-5");
        assert_eq!(event.stage, stage::COMPLETE);
        assert_eq!(event.metadata["analysis"], "root cause: expired cert");
    }

    #[test]
    fn active_set_stays_bounded_under_sustained_churn() {
        let mut tracker = IncidentTracker::new();
        for i in 0..10_000 {
            let id = format!("INC-{}", i);
            tracker.observe(&entry(Some(&id), Some(stage::ACTIVATION), None));
            tracker.observe(&entry(Some(&id), Some(stage::COMPLETE), None));
        }
        assert!(tracker.active().is_empty());
    }
}
