//! Bounded hand-off between the sitemap phase and the detail phase.
//!
//! The queue is filled completely by the list crawler, closed, and then
//! drained by the detail crawler. A full queue is an error, never a wait:
//! discovery must not stall behind slow detail fetches, but lost pages have
//! to show up somewhere.

use crate::error::{Error, QueueError};
use futures::Stream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use url::Url;

/// A detail page to fetch, with the publisher slug inferred from its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub url: Url,
    pub publisher: Option<String>,
}

/// Bounded FIFO of [`DetailRequest`]s.
#[derive(Debug)]
pub struct WorkQueue {
    tx: mpsc::Sender<DetailRequest>,
    rx: mpsc::Receiver<DetailRequest>,
    capacity: usize,
}

impl WorkQueue {
    /// Create a queue holding at most `capacity` requests.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::Config("work queue capacity must be greater than zero".into()));
        }
        let (tx, rx) = mpsc::channel(capacity);
        Ok(Self { tx, rx, capacity })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of requests currently waiting.
    pub fn len(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueue a request without waiting.
    pub fn push(&self, request: DetailRequest, cancel: &CancellationToken) -> Result<(), QueueError> {
        if cancel.is_cancelled() {
            return Err(QueueError::Cancelled);
        }
        self.tx.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => QueueError::Full {
                capacity: self.capacity,
            },
            TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    /// Close the queue for writing and hand back the pending requests in FIFO order.
    pub fn close(self) -> QueueDrain {
        let WorkQueue { tx, rx, .. } = self;
        drop(tx);
        QueueDrain { rx }
    }
}

/// Read side of a closed [`WorkQueue`].
#[derive(Debug)]
pub struct QueueDrain {
    rx: mpsc::Receiver<DetailRequest>,
}

impl QueueDrain {
    /// Stream the remaining requests; ends once the queue is empty.
    pub fn into_stream(self) -> impl Stream<Item = DetailRequest> + Send {
        let mut rx = self.rx;
        futures::stream::poll_fn(move |cx| rx.poll_recv(cx))
    }
}
