use tokio::io::AsyncBufReadExt;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::controller::StreamController;

/// Lifecycle events one connection can produce, in the order they can occur.
/// Every dispatch passes the epoch of the connection that produced the event
/// alongside it, so the controller can drop events from a connection it
/// already tore down.
#[derive(Debug)]
pub(crate) enum TransportEvent {
    Opened,
    Message(String),
    Closed,
}

#[derive(Debug, thiserror::Error)]
enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("stream read failed: {0}")]
    Read(#[from] std::io::Error),
}

/// Drives a single connection to the log endpoint for its whole lifetime.
/// Any failure (request error, non-success status, read error, server EOF)
/// ends in exactly one `Closed` dispatch; retrying is the controller's
/// reconnect policy, never the transport's.
pub(crate) async fn run(controller: StreamController, epoch: u64, incident_filter: Option<String>) {
    if let Err(e) = run_once(&controller, epoch, incident_filter.as_deref()).await {
        warn!("Log stream connection ended: {}", e);
    } else {
        debug!("Log stream closed by server");
    }
    controller.dispatch(epoch, TransportEvent::Closed).await;
}

async fn run_once(
    controller: &StreamController,
    epoch: u64,
    incident_filter: Option<&str>,
) -> Result<(), TransportError> {
    let config = controller.config();
    let mut query: Vec<(&str, &str)> = vec![("client_id", config.client_id.as_str())];
    if let Some(incident_id) = incident_filter {
        query.push(("incident_id", incident_id));
    }

    let response = controller
        .http()
        .get(config.endpoint.clone())
        .query(&query)
        .send()
        .await?
        .error_for_status()?;

    controller.dispatch(epoch, TransportEvent::Opened).await;

    // Read the event stream line-by-line.
    let stream = response.bytes_stream();
    let reader = tokio_util::io::StreamReader::new(stream.map(|r| r.map_err(std::io::Error::other)));
    let mut lines = tokio::io::BufReader::new(reader);
    let mut line_buf = String::new();

    loop {
        line_buf.clear();
        match lines.read_line(&mut line_buf).await {
            Ok(0) => break, // EOF
            Ok(_) => {
                if let Some(payload) = frame_payload(&line_buf) {
                    controller
                        .dispatch(epoch, TransportEvent::Message(payload.to_string()))
                        .await;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Extracts the payload from one wire line. Blank separator lines and SSE
/// comments carry nothing; a `data:` prefix is stripped so both SSE framing
/// and plain newline-delimited JSON are accepted.
fn frame_payload(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    Some(line.strip_prefix("data:").map(str::trim).unwrap_or(line))
}
