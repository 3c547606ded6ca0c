//! Live agent-log stream client for the incident-response dashboard.
//!
//! Opens a long-lived server-push feed of agent telemetry, rebuilds
//! per-incident lifecycle state from the interleaved entries, keeps a
//! bounded display history, and reconnects on its own after a drop without
//! losing or duplicating what consumers already saw. A stream outage
//! degrades to a stale display, never to a crashed dashboard.
//!
//! ```no_run
//! use agentstream::{StreamConfig, StreamController};
//!
//! # async fn demo() -> Result<(), agentstream::StreamError> {
//! let config = StreamConfig::new("http://127.0.0.1:8080/api/agent/logs/stream")?;
//! let controller = StreamController::new(config);
//! let mut snapshots = controller.subscribe();
//! let mut completions = controller.completions();
//!
//! controller.connect(Some("INC-42")).await;
//! while snapshots.changed().await.is_ok() {
//!     let state = snapshots.borrow_and_update().clone();
//!     // render state.logs, state.active_incidents, ...
//! }
//! controller.disconnect().await;
//! # Ok(())
//! # }
//! ```

mod buffer;
mod config;
mod controller;
mod entry;
mod error;
mod parser;
mod state;
mod tracker;
mod transport;

pub use config::{DEFAULT_LOG_CAP, DEFAULT_RECONNECT_DELAY, StreamConfig};
pub use controller::StreamController;
pub use entry::{CompletionEvent, LogEntry, LogLevel, stage};
pub use error::StreamError;
pub use state::StreamState;
