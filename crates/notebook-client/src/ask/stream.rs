//! Ask event stream and the transport seam

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::parser::DataLineParser;
use super::types::{AskStreamEvent, StreamError, StreamResult};

/// Boxed stream of ask events, as handed out by an [`AskTransport`]
pub type AskEventStream = Pin<Box<dyn Stream<Item = StreamResult<AskStreamEvent>> + Send>>;

/// Opens the event stream for one question.
///
/// `cancel` belongs to the caller; implementations should give up on
/// pending connection work once it fires and return
/// [`StreamError::Cancelled`].
#[async_trait]
pub trait AskTransport: Send + Sync {
    async fn open(&self, question: &str, cancel: &CancellationToken)
        -> StreamResult<AskEventStream>;
}

/// Ask events decoded from a response body
///
/// Implements `Stream<Item = Result<AskStreamEvent, StreamError>>`. The
/// stream ends when the body ends; a body error is yielded once and ends the
/// stream.
pub struct AskStream {
    byte_stream: Pin<Box<dyn Stream<Item = StreamResult<Bytes>> + Send>>,
    parser: DataLineParser,
    buffered: VecDeque<AskStreamEvent>,
    finished: bool,
}

impl AskStream {
    /// Wrap any byte stream whose error converts into [`StreamError`]
    pub fn new<S, E>(byte_stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<StreamError> + 'static,
    {
        Self {
            byte_stream: Box::pin(byte_stream.map(|chunk| chunk.map_err(Into::into))),
            parser: DataLineParser::new(),
            buffered: VecDeque::new(),
            finished: false,
        }
    }

    /// Wrap a streaming HTTP response body
    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(response.bytes_stream())
    }

    /// Box the stream for use behind [`AskTransport`]
    pub fn boxed(self) -> AskEventStream {
        Box::pin(self)
    }
}

impl Stream for AskStream {
    type Item = StreamResult<AskStreamEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.buffered.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if this.finished {
                return Poll::Ready(None);
            }

            match this.byte_stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.buffered.extend(this.parser.feed(&bytes));
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    this.buffered.extend(this.parser.finish());
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
