use serde::Deserialize;
use tracing::warn;

use crate::entry::LogEntry;

/// What one raw line decoded to.
#[derive(Debug)]
pub enum ParsedMessage {
    /// Keep-alive sentinel; never shown.
    Heartbeat,
    Entry(LogEntry),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    data: Option<serde_json::Value>,
}

/// Decodes one raw message into a heartbeat or a log entry. Malformed
/// payloads are dropped with a diagnostic; a single bad message must never
/// terminate the stream.
pub fn parse_message(raw: &str) -> Option<ParsedMessage> {
    let envelope: Envelope = match serde_json::from_str(raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Discarding malformed stream payload: {}", e);
            return None;
        }
    };

    if envelope.kind.as_deref() == Some("heartbeat") {
        return Some(ParsedMessage::Heartbeat);
    }

    let data = envelope.data?;
    match serde_json::from_value::<LogEntry>(data) {
        Ok(entry) => Some(ParsedMessage::Entry(entry)),
        Err(e) => {
            warn!("Discarding stream payload with undecodable entry: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::LogLevel;

    #[test]
    fn heartbeat_produces_no_entry() {
        let parsed = parse_message(r#"{"type":"heartbeat"}"#).expect("heartbeat should parse");
        assert!(matches!(parsed, ParsedMessage::Heartbeat));
    }

    #[test]
    fn data_envelope_decodes_into_an_entry() {
        let raw = r#"{"data":{"timestamp":"2026-08-29T10:00:00Z","level":"SUCCESS","message":"done","incidentId":"INC-9","stage":"complete"}}"#;
        let parsed = parse_message(raw).expect("entry should parse");
        let ParsedMessage::Entry(entry) = parsed else {
            panic!("expected an entry");
        };
        assert_eq!(entry.level, LogLevel::Success);
        assert_eq!(entry.incident_id.as_deref(), Some("INC-9"));
    }

    #[test]
    fn malformed_json_is_discarded() {
        assert!(parse_message("{not json").is_none());
    }

    #[test]
    fn envelope_without_heartbeat_or_data_is_discarded() {
        assert!(parse_message(r#"{"type":"mystery"}"#).is_none());
    }

    #[test]
    fn data_that_is_not_entry_shaped_is_discarded() {
        assert!(parse_message(r#"{"data":{"level":"LOUD"}}"#).is_none());
    }
}
