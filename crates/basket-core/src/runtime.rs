use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::{ApiError, HttpApi};
use crate::config::CoreConfig;
use crate::session::{Session, SessionState};
use crate::streaming::{StreamError, StreamManager, StreamState};
use crate::sync::{Coordinator, SyncError};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to build API client: {0}")]
    Api(#[from] ApiError),
    #[error("failed to build stream client: {0}")]
    Stream(#[from] StreamError),
}

/// Wires the session, the CRUD client, the coordinator and the update
/// stream together for one logged-in household.
pub struct CoreRuntime {
    session: Session,
    coordinator: Coordinator,
    stream: Arc<StreamManager>,
    cancel: CancellationToken,
    watcher: Option<JoinHandle<()>>,
}

impl CoreRuntime {
    pub fn new(config: CoreConfig, session: Session) -> Result<Self, RuntimeError> {
        let api = HttpApi::new(config.clone(), session.clone())?;
        let coordinator = Coordinator::new(Arc::new(api));
        let stream = StreamManager::new(config, session.clone(), coordinator.event_handler())?;

        Ok(Self {
            session,
            coordinator,
            stream: Arc::new(stream),
            cancel: CancellationToken::new(),
            watcher: None,
        })
    }

    /// Load the initial data, open the update stream and start following
    /// credential changes. The stream is opened even if the first load
    /// fails; its error is returned after.
    pub async fn start(&mut self) -> Result<(), SyncError> {
        let loaded = self.coordinator.refresh().await;

        self.stream.start();
        if self.watcher.is_none() {
            self.watcher = Some(tokio::spawn(follow_connection(
                self.session.subscribe(),
                self.stream.subscribe_state(),
                self.stream.clone(),
                self.coordinator.clone(),
                self.cancel.clone(),
            )));
        }

        loaded
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn stream_state(&self) -> StreamState {
        self.stream.state()
    }

    pub fn subscribe_stream_state(&self) -> watch::Receiver<StreamState> {
        self.stream.subscribe_state()
    }

    /// Drop the current connection and connect again with the session's
    /// current credential.
    pub fn reconnect(&self) {
        self.stream.reconnect();
    }

    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
        self.stream.shutdown();
        self.coordinator.shutdown();
    }
}

impl Drop for CoreRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Reconnect when the credential changes, and refresh whenever the stream
/// comes back after an outage since events sent meanwhile were missed.
async fn follow_connection(
    mut session_rx: watch::Receiver<SessionState>,
    mut stream_rx: watch::Receiver<StreamState>,
    stream: Arc<StreamManager>,
    coordinator: Coordinator,
    cancel: CancellationToken,
) {
    let mut connected_before = *stream_rx.borrow_and_update() == StreamState::Streaming;
    let _ = session_rx.borrow_and_update();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            changed = session_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                let state = *session_rx.borrow_and_update();
                info!(?state, "session changed, restarting update stream");
                stream.reconnect();
                if state == SessionState::LoggedIn {
                    coordinator.request_refresh();
                }
            }
            changed = stream_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                let state = *stream_rx.borrow_and_update();
                if state == StreamState::Streaming {
                    if connected_before {
                        debug!("update stream back, resyncing");
                        coordinator.request_refresh();
                    }
                    connected_before = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::convert::Infallible;
    use std::time::Duration;

    async fn sse() -> Response {
        let chunks = futures::stream::iter(vec![Ok::<_, Infallible>(
            "data: {\"type\": \"shopping_updated\", \"data\": {}}\n\n".to_string(),
        )]);
        let body = Body::from_stream(futures::StreamExt::chain(chunks, futures::stream::pending()));
        ([("content-type", "text/event-stream")], body).into_response()
    }

    async fn serve() -> String {
        let app = Router::new()
            .route("/api/sse", get(sse))
            .route(
                "/api/products",
                get(|| async { Json(json!([{"id": 1, "name": "Mleko", "sort_order": 1}])) }),
            )
            .route(
                "/api/shopping",
                get(|| async {
                    Json(json!([{
                        "id": 5, "product_id": 1, "custom_name": null, "is_checked": false,
                        "product_name": "Mleko", "product_sort_order": 1
                    }]))
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_start_loads_and_follows_stream() {
        let base = serve().await;
        let mut runtime = CoreRuntime::new(CoreConfig::new(base), Session::with_token("key")).unwrap();

        runtime.start().await.unwrap();
        assert_eq!(runtime.coordinator().plain_list()[0].display_name(), "Mleko");

        // The event on the stream causes a second refresh
        let coordinator = runtime.coordinator().clone();
        tokio::time::timeout(Duration::from_secs(5), async {
            while coordinator.snapshot().version < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("stream event did not trigger a refresh");
        assert_eq!(runtime.stream_state(), StreamState::Streaming);

        runtime.shutdown();
        assert_eq!(runtime.stream_state(), StreamState::Closed);
    }

    #[tokio::test]
    async fn test_logout_idles_stream() {
        let base = serve().await;
        let session = Session::with_token("key");
        let mut runtime = CoreRuntime::new(CoreConfig::new(base), session.clone()).unwrap();
        runtime.start().await.unwrap();

        let mut states = runtime.subscribe_stream_state();
        tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| *s == StreamState::Streaming))
            .await
            .unwrap()
            .unwrap();

        session.invalidate();
        tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| *s == StreamState::Idle))
            .await
            .unwrap()
            .unwrap();
    }
}
