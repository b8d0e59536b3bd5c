//! One lifetime of the upstream connection
//!
//! A session is the negotiated framing plus a finite, non-restartable
//! sequence of chunks. Once the sequence ends a new session has to be
//! obtained from the connector.

use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::registry::ContentFraming;

/// Boxed chunk sequence of a session
pub type ChunkStream = BoxStream<'static, Result<Bytes>>;

/// A live upstream session
pub struct UpstreamSession {
    framing: Option<ContentFraming>,
    chunks: ChunkStream,
    read_timeout: Option<Duration>,
    finished: bool,
}

impl UpstreamSession {
    /// Wrap a chunk stream
    ///
    /// `framing` is `None` when the device did not declare a content type.
    pub fn new<S>(framing: Option<ContentFraming>, chunks: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            framing,
            chunks: chunks.boxed(),
            read_timeout: None,
            finished: false,
        }
    }

    /// Session over a fixed list of chunks that then ends normally
    #[cfg(test)]
    pub(crate) fn from_chunks<I>(framing: Option<ContentFraming>, chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self::new(framing, stream::iter(chunks.into_iter().map(Ok)))
    }

    /// Session fed from a channel
    ///
    /// For sources that push data instead of being polled. The session ends
    /// normally once every sender is dropped.
    pub fn channel(
        framing: Option<ContentFraming>,
        capacity: usize,
    ) -> (mpsc::Sender<Result<Bytes>>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let chunks = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        (tx, Self::new(framing, chunks))
    }

    /// Fail the session if no chunk arrives within `timeout` (zero disables)
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Framing declared by the device for this session
    pub fn framing(&self) -> Option<&ContentFraming> {
        self.framing.as_ref()
    }

    /// Await the next chunk
    ///
    /// `None` means the device closed the stream. An error ends the session
    /// as well; later calls return `None`.
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes>> {
        if self.finished {
            return None;
        }

        let next = match self.read_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.chunks.next()).await {
                Ok(next) => next,
                Err(_) => Some(Err(Error::StreamRead(format!(
                    "upstream stalled, no data for {:?}",
                    limit
                )))),
            },
            None => self.chunks.next().await,
        };

        if !matches!(next, Some(Ok(_))) {
            self.finished = true;
        }
        next
    }
}

impl std::fmt::Debug for UpstreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamSession")
            .field("framing", &self.framing)
            .field("read_timeout", &self.read_timeout)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
