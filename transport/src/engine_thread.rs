//! The dedicated OS thread that owns the `MatchingEngine`.
//!
//! Bridges the async `tokio` world to a plain `std::thread` running a
//! blocking receive loop, since the engine must never suspend or yield
//! mid-`process`. Inputs arrive over a bounded `std::sync::mpsc` channel
//! (the single synchronization point the engine observes); outputs are
//! forwarded, one `Vec<OutputMessage>` per processed input, over an
//! unbounded `tokio::sync::mpsc` channel back to the async router task.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use engine_core::{EngineLimits, InputMessage, MatchingEngine, OutputMessage};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{error, warn};

use crate::error::TransportError;

/// How long the engine thread blocks on an empty queue before checking the
/// shutdown flag again.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Counts messages dropped under backpressure, for diagnostics.
#[derive(Default)]
pub struct DropCounters {
    pub inbound_dropped: AtomicU64,
}

/// A cloneable handle for submitting input to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    input_tx: SyncSender<InputMessage>,
    drops: Arc<DropCounters>,
}

impl EngineHandle {
    /// Never blocks: if the inbound queue is full, the message is dropped
    /// and the drop counter is incremented rather than applying
    /// backpressure to the caller. Returns `Err` only so the caller can
    /// log; the caller must not retry or surface an error to the client.
    pub fn try_submit(&self, msg: InputMessage) -> Result<(), TransportError> {
        match self.input_tx.try_send(msg) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                let total = self.drops.inbound_dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(total_dropped = total, "inbound queue full; message dropped");
                Err(TransportError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(TransportError::EngineStopped),
        }
    }
}

/// Spawns the engine thread around an already-constructed `engine` (so the
/// caller can pre-register known symbols before handing ownership to the
/// thread) and returns a handle to submit input, a receiver for batched
/// output, and the thread's `JoinHandle`.
pub fn spawn(
    mut engine: MatchingEngine,
    capacity: usize,
    shutdown: Arc<AtomicBool>,
) -> (EngineHandle, UnboundedReceiver<Vec<OutputMessage>>, JoinHandle<()>) {
    let (input_tx, input_rx) = sync_channel::<InputMessage>(capacity);
    let (output_tx, output_rx) = unbounded_channel::<Vec<OutputMessage>>();
    let drops = Arc::new(DropCounters::default());

    let join_handle = std::thread::Builder::new()
        .name("matching-engine".to_string())
        .spawn(move || {
            loop {
                match input_rx.recv_timeout(POLL_INTERVAL) {
                    Ok(msg) => match engine.process(msg) {
                        Ok(outputs) => {
                            if output_tx.send(outputs).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            error!(error = %err, "invariant violation on the engine thread");
                            panic!("matching engine invariant violation: {err}");
                        }
                    },
                    Err(RecvTimeoutError::Timeout) => {
                        if shutdown.load(Ordering::Relaxed) {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })
        .expect("failed to spawn the matching engine thread");

    (EngineHandle { input_tx, drops }, output_rx, join_handle)
}
