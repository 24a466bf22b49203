//! Long-lived connection to the server's update stream.
//!
//! One `StreamManager` owns at most one read loop at a time. Every attempt
//! runs under its own `CancellationToken`; starting a new attempt cancels
//! the previous one, and `shutdown` cancels whatever is running and parks
//! the manager in `Closed` for good.
//!
//! State transitions:
//!
//! ```text
//! Idle -> Connecting -> Streaming -> Reconnecting -> Connecting ...
//!   ^         |              |
//!   +---------+--------------+   (no credential, or credential rejected)
//!
//! any state -> Closed            (shutdown)
//! ```

use std::sync::Arc;

use futures::StreamExt;
use parking_lot::{Mutex, ReentrantMutex};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::framing::LineDecoder;
use super::types::StreamEvent;
use crate::config::CoreConfig;
use crate::constants::{paths, ACCESS_KEY_HEADER};
use crate::session::Session;

/// Receives every decoded event, in arrival order, on the read loop's task.
pub type EventCallback = Arc<dyn Fn(StreamEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No connection and none scheduled
    Idle,
    Connecting,
    Streaming,
    /// Waiting out the fixed delay before the next attempt
    Reconnecting,
    /// Shut down; terminal
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("stream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("stream rejected with status {0}")]
    Status(u16),
    #[error("access key rejected by stream endpoint")]
    Unauthorized,
    #[error("stream ended by server")]
    Ended,
}

#[derive(Default)]
struct Control {
    closed: bool,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl Control {
    /// Cancel the current loop, if any. The task is aborted too so an open
    /// response body is dropped right away rather than at its next await.
    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Inner {
    client: reqwest::Client,
    config: CoreConfig,
    session: Session,
    callback: EventCallback,
    state_tx: watch::Sender<StreamState>,
    control: Mutex<Control>,
    /// Held while the callback runs. Teardown takes it after cancelling so
    /// that no callback is running, or will run, once teardown returns.
    /// Reentrant so a callback may itself reconnect or shut down.
    delivery: ReentrantMutex<()>,
}

pub struct StreamManager {
    inner: Arc<Inner>,
}

impl StreamManager {
    pub fn new<F>(config: CoreConfig, session: Session, callback: F) -> Result<Self, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        // No total timeout: the body is expected to stay open indefinitely.
        let client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()?;
        let (state_tx, _) = watch::channel(StreamState::Idle);

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                config,
                session,
                callback: Arc::new(callback),
                state_tx,
                control: Mutex::new(Control::default()),
                delivery: ReentrantMutex::new(()),
            }),
        })
    }

    /// Open the stream. Alias of `reconnect`.
    pub fn start(&self) {
        self.reconnect();
    }

    /// Drop any current connection or pending retry and connect afresh with
    /// the session's current credential. Without a credential the manager
    /// goes to `Idle` and nothing is sent. No-op after `shutdown`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn reconnect(&self) {
        let mut control = self.inner.control.lock();
        if control.closed {
            debug!("stream manager closed, ignoring reconnect");
            return;
        }

        control.stop();

        if self.inner.session.token().is_none() {
            debug!("no access key, update stream stays idle");
            self.inner.state_tx.send_replace(StreamState::Idle);
            drop(control);
            self.inner.wait_for_delivery();
            return;
        }

        let cancel = CancellationToken::new();
        self.inner.state_tx.send_replace(StreamState::Connecting);
        let task = tokio::spawn(run(self.inner.clone(), cancel.clone()));
        control.cancel = Some(cancel);
        control.task = Some(task);
        drop(control);

        self.inner.wait_for_delivery();
    }

    /// Cancel the read loop and any pending retry. Terminal: later calls to
    /// `start` or `reconnect` do nothing. When this returns no callback is
    /// running and none will be invoked.
    pub fn shutdown(&self) {
        {
            let mut control = self.inner.control.lock();
            if control.closed {
                return;
            }
            control.closed = true;
            control.stop();
            self.inner.state_tx.send_replace(StreamState::Closed);
        }
        self.inner.wait_for_delivery();
        info!("update stream shut down");
    }

    pub fn state(&self) -> StreamState {
        *self.inner.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<StreamState> {
        self.inner.state_tx.subscribe()
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Inner {
    /// Publish a state change, unless `cancel` belongs to a superseded loop.
    fn set_state(&self, cancel: &CancellationToken, state: StreamState) {
        let _control = self.control.lock();
        if !cancel.is_cancelled() {
            self.state_tx.send_replace(state);
        }
    }

    fn wait_for_delivery(&self) {
        drop(self.delivery.lock());
    }

    /// Hand one event to the callback. False once the loop is cancelled.
    fn deliver(&self, cancel: &CancellationToken, event: StreamEvent) -> bool {
        let _delivery = self.delivery.lock();
        if cancel.is_cancelled() {
            return false;
        }
        (self.callback)(event);
        true
    }

    /// One connection attempt. `Ok` means the loop was cancelled mid-read;
    /// every other way out of the read is an error.
    async fn stream_once(&self, token: &str, cancel: &CancellationToken) -> Result<(), StreamError> {
        let response = self
            .client
            .get(self.config.endpoint(paths::STREAM))
            .header(ACCESS_KEY_HEADER, token)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(StreamError::Unauthorized);
        }
        if !status.is_success() {
            return Err(StreamError::Status(status.as_u16()));
        }

        self.set_state(cancel, StreamState::Streaming);
        info!("update stream connected");

        let mut decoder = LineDecoder::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            for event in decoder.push(&chunk?) {
                if !self.deliver(cancel, event) {
                    return Ok(());
                }
            }
        }

        Err(StreamError::Ended)
    }
}

async fn run(inner: Arc<Inner>, cancel: CancellationToken) {
    loop {
        let Some(token) = inner.session.token() else {
            debug!("access key gone, update stream going idle");
            inner.set_state(&cancel, StreamState::Idle);
            return;
        };
        inner.set_state(&cancel, StreamState::Connecting);

        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = inner.stream_once(&token, &cancel) => result,
        };

        match result {
            Ok(()) => return,
            Err(StreamError::Unauthorized) => {
                warn!("update stream rejected access key, logging out");
                inner.set_state(&cancel, StreamState::Idle);
                inner.session.invalidate();
                return;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    delay_ms = inner.config.reconnect_delay.as_millis() as u64,
                    "update stream lost, reconnecting"
                );
            }
        }

        inner.set_state(&cancel, StreamState::Reconnecting);
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(inner.config.reconnect_delay) => {}
        }
    }
}
