//! Test utilities for notebook-client
//!
//! Provides an in-process HTTP server for integration tests and a scripted
//! [`AskTransport`] for driving [`AskClient`](crate::ask::AskClient) without
//! a network.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ask::{AskEventStream, AskStreamEvent, AskTransport, StreamError, StreamResult};
use crate::{NotebookClient, Result};

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: NotebookClient,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Create a new test server from an axum Router
    ///
    /// # Example
    ///
    /// ```ignore
    /// use axum::{routing::get, Json, Router};
    /// use notebook_client::testing::TestServer;
    ///
    /// let router = Router::new().route("/api/notebooks", get(|| async { Json(vec![]) }));
    /// let server = TestServer::start(router).await?;
    /// let notebooks = server.client.list_notebooks().await?;
    /// ```
    pub async fn start(router: axum::Router) -> Result<Self> {
        Self::start_inner(router, None).await
    }

    /// Like [`start`](Self::start), with a client that sends a bearer token
    pub async fn start_with_token(router: axum::Router, token: &str) -> Result<Self> {
        Self::start_inner(router, Some(token)).await
    }

    async fn start_inner(router: axum::Router, token: Option<&str>) -> Result<Self> {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let base_url = format!("http://{}", addr);
        let client = NotebookClient::with_auth(&base_url, token)?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get a reference to the client
    pub fn client(&self) -> &NotebookClient {
        &self.client
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// What a [`ScriptedTransport`] does for one `open` call
pub enum Script {
    /// Yield these items, then end the stream
    Events(Vec<StreamResult<AskStreamEvent>>),
    /// Yield whatever the test sends; the stream ends when the sender drops
    Feed(mpsc::UnboundedReceiver<StreamResult<AskStreamEvent>>),
    /// Fail to connect
    Fail(StreamError),
    /// Never finish connecting
    HangOnOpen,
}

impl Script {
    /// A stream that yields `events` and ends
    pub fn events(events: Vec<AskStreamEvent>) -> Self {
        Script::Events(events.into_iter().map(Ok).collect())
    }
}

/// In-memory [`AskTransport`] that plays back one [`Script`] per question
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            questions: Mutex::new(Vec::new()),
        }
    }

    /// Questions seen so far, in order
    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().clone()
    }
}

#[async_trait]
impl AskTransport for ScriptedTransport {
    async fn open(
        &self,
        question: &str,
        _cancel: &CancellationToken,
    ) -> StreamResult<AskEventStream> {
        self.questions.lock().push(question.to_string());
        let script = self.scripts.lock().pop_front();

        match script {
            Some(Script::Events(items)) => Ok(stream::iter(items).boxed()),
            Some(Script::Feed(rx)) => Ok(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })
            .boxed()),
            Some(Script::Fail(e)) => Err(e),
            Some(Script::HangOnOpen) => std::future::pending().await,
            None => Err(StreamError::Transport("no script left".into())),
        }
    }
}

/// Wait for a condition with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_transport_plays_scripts_in_order() {
        let transport = ScriptedTransport::new(vec![
            Script::events(vec![AskStreamEvent::Complete]),
            Script::Fail(StreamError::Transport("down".into())),
        ]);
        let token = CancellationToken::new();

        let events: Vec<_> = transport
            .open("one", &token)
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Ok(AskStreamEvent::Complete)));

        assert!(transport.open("two", &token).await.is_err());
        assert!(matches!(
            transport.open("three", &token).await,
            Err(StreamError::Transport(_))
        ));
        assert_eq!(transport.questions(), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_wait_for_times_out() {
        assert!(!wait_for(|| async { false }, Duration::from_millis(30)).await);
        assert!(wait_for(|| async { true }, Duration::from_millis(30)).await);
    }
}
