use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::buffer::LogBuffer;
use crate::config::StreamConfig;
use crate::entry::CompletionEvent;
use crate::parser::{self, ParsedMessage};
use crate::state::StreamState;
use crate::tracker::IncidentTracker;
use crate::transport::{self, TransportEvent};

/// Facade over the live agent-log stream: owns the connection, the bounded
/// history, and the incident lifecycle state, and publishes a fresh
/// [`StreamState`] snapshot on every change.
///
/// Cheap to clone; all clones share one subscription. A controller is owned
/// explicitly by whoever needs the stream (a UI adapter, a service, a test
/// harness) and is torn down with [`StreamController::disconnect`].
#[derive(Clone)]
pub struct StreamController {
    shared: Arc<Shared>,
}

struct Shared {
    config: StreamConfig,
    http: reqwest::Client,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<StreamState>,
    completion_tx: broadcast::Sender<CompletionEvent>,
}

struct Inner {
    /// Connection generation. Bumped on every open and on disconnect; events
    /// tagged with an older epoch belong to a torn-down connection and are
    /// dropped, so no stray late callback can mutate state.
    epoch: u64,
    /// True between connect() and disconnect().
    session: bool,
    incident_filter: Option<String>,
    connected: bool,
    buffer: LogBuffer,
    tracker: IncidentTracker,
    transport: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
}

impl StreamController {
    pub fn new(config: StreamConfig) -> Self {
        let (state_tx, _) = watch::channel(StreamState::default());
        let (completion_tx, _) = broadcast::channel(64);
        let log_cap = config.log_cap;
        Self {
            shared: Arc::new(Shared {
                config,
                http: reqwest::Client::new(),
                inner: Mutex::new(Inner {
                    epoch: 0,
                    session: false,
                    incident_filter: None,
                    connected: false,
                    buffer: LogBuffer::new(log_cap),
                    tracker: IncidentTracker::new(),
                    transport: None,
                    reconnect: None,
                }),
                state_tx,
                completion_tx,
            }),
        }
    }

    /// Opens the stream, scoped to one incident when a filter is given. Any
    /// previous connection and pending reconnect timer are torn down first.
    /// Returns once the state mutation is done; connecting happens in the
    /// background and is reported through the `connected` snapshot field.
    pub async fn connect(&self, incident_filter: Option<&str>) {
        let mut inner = self.shared.inner.lock().await;
        inner.session = true;
        inner.incident_filter = incident_filter.map(str::to_string);
        info!(
            "Opening agent log stream (incident filter: {:?})",
            inner.incident_filter
        );
        self.open_locked(&mut inner);
    }

    /// Closes the stream and cancels any pending reconnect. Idempotent.
    /// History and incident state are kept; only the connection goes away.
    pub async fn disconnect(&self) {
        let mut inner = self.shared.inner.lock().await;
        inner.session = false;
        inner.epoch += 1; // invalidate in-flight events from this connection
        if let Some(timer) = inner.reconnect.take() {
            timer.abort();
        }
        if let Some(task) = inner.transport.take() {
            task.abort();
        }
        if inner.connected {
            inner.connected = false;
            self.publish(&inner);
        }
    }

    /// Empties the display history. Connection state is untouched; with no
    /// subscription this is a no-op.
    pub async fn clear_logs(&self) {
        let mut inner = self.shared.inner.lock().await;
        if inner.buffer.is_empty() {
            return;
        }
        inner.buffer.clear();
        self.publish(&inner);
    }

    /// Skips any pending reconnect timer and reopens immediately with the
    /// current filter. No-op when nothing was ever connected.
    pub async fn reconnect_now(&self) {
        let mut inner = self.shared.inner.lock().await;
        if !inner.session {
            return;
        }
        self.open_locked(&mut inner);
    }

    /// Snapshot feed; the receiver always holds the latest [`StreamState`].
    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.shared.state_tx.subscribe()
    }

    /// Latest snapshot without subscribing.
    pub fn state(&self) -> StreamState {
        self.shared.state_tx.borrow().clone()
    }

    /// Completion notifications for consumers that react to finished
    /// incidents (e.g. an analysis panel) without polling.
    pub fn completions(&self) -> broadcast::Receiver<CompletionEvent> {
        self.shared.completion_tx.subscribe()
    }

    pub(crate) fn config(&self) -> &StreamConfig {
        &self.shared.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.shared.http
    }

    /// Single entry point for all transport lifecycle events. Every mutation
    /// of stream state happens here or in the imperative methods, always to
    /// completion under the lock.
    pub(crate) async fn dispatch(&self, epoch: u64, event: TransportEvent) {
        let mut inner = self.shared.inner.lock().await;
        if epoch != inner.epoch {
            debug!("Dropping event from stale connection (epoch {})", epoch);
            return;
        }
        match event {
            TransportEvent::Opened => {
                info!("Agent log stream connected");
                inner.connected = true;
                self.publish(&inner);
            }
            TransportEvent::Message(raw) => match parser::parse_message(&raw) {
                Some(ParsedMessage::Entry(entry)) => {
                    if let Some(done) = inner.tracker.observe(&entry) {
                        // Ignored if no receivers
                        let _ = self.shared.completion_tx.send(done);
                    }
                    inner.buffer.append(entry);
                    self.publish(&inner);
                }
                // Heartbeats keep the connection alive; malformed payloads
                // were already logged by the parser. Neither changes state.
                Some(ParsedMessage::Heartbeat) | None => {}
            },
            TransportEvent::Closed => {
                inner.connected = false;
                inner.transport = None;
                self.publish(&inner);
                if inner.reconnect.is_none() {
                    let delay = self.shared.config.reconnect_delay;
                    info!("Agent log stream dropped, reconnecting in {:?}", delay);
                    let controller = self.clone();
                    inner.reconnect = Some(tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        controller.retry(epoch).await;
                    }));
                }
            }
        }
    }

    async fn retry(&self, epoch: u64) {
        let mut inner = self.shared.inner.lock().await;
        if epoch != inner.epoch {
            return; // superseded by an explicit connect() or disconnect()
        }
        inner.reconnect = None;
        self.open_locked(&mut inner);
    }

    /// Replaces the live connection: bumps the epoch so events from the old
    /// one become stale, then spawns a fresh transport with the current
    /// filter. Buffer and tracker are left alone.
    fn open_locked(&self, inner: &mut Inner) {
        inner.epoch += 1;
        if let Some(timer) = inner.reconnect.take() {
            timer.abort();
        }
        if let Some(task) = inner.transport.take() {
            task.abort();
        }
        inner.transport = Some(tokio::spawn(transport::run(
            self.clone(),
            inner.epoch,
            inner.incident_filter.clone(),
        )));
    }

    fn publish(&self, inner: &Inner) {
        self.shared.state_tx.send_replace(StreamState {
            logs: inner.buffer.to_vec(),
            connected: inner.connected,
            active_incidents: inner.tracker.active().clone(),
            current_stage: inner.tracker.current_stage().map(str::to_string),
            current_progress: inner.tracker.current_progress(),
        });
    }

    #[cfg(test)]
    pub(crate) async fn current_epoch(&self) -> u64 {
        self.shared.inner.lock().await.epoch
    }
}
