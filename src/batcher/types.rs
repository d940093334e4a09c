use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::oneshot;

/// Errors surfaced through [`Batcher::add`](super::Batcher::add) and the
/// [`Completion`] returned by
/// [`Batcher::add_no_wait`](super::Batcher::add_no_wait).
///
/// Cloneable so a single batch outcome can resolve every item in the batch.
#[derive(Debug, Clone, Error)]
pub enum BatcherError {
    /// A single item's byte size alone exceeds the configured batch byte
    /// ceiling. Rejected before enqueue; the handler never sees it.
    #[error("item size {size} exceeds maximum batch byte size = {limit}")]
    ItemTooLarge { size: usize, limit: usize },

    /// The batcher has been shut down; no new items are accepted.
    #[error("batcher has been shut down")]
    Shutdown,

    /// The handler failed for the batch containing this item.
    ///
    /// The original error is preserved unchanged as the source.
    #[error("handler failed")]
    Handler(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

/// Capability for items that can report their serialized byte size.
///
/// The size is sampled once, when the item is added, and feeds the
/// `max_batch_byte_size` accounting. The default implementation reports 0,
/// so types without a meaningful size opt in with an empty impl:
///
/// ```rust,ignore
/// struct AckId(u64);
/// impl Sizable for AckId {}
/// ```
pub trait Sizable {
    /// Serialized byte size of this item, 0 if unknown.
    fn byte_size(&self) -> usize {
        0
    }
}

impl Sizable for String {
    fn byte_size(&self) -> usize {
        self.len()
    }
}

impl Sizable for &str {
    fn byte_size(&self) -> usize {
        self.len()
    }
}

impl Sizable for Vec<u8> {
    fn byte_size(&self) -> usize {
        self.len()
    }
}

macro_rules! impl_zero_sized {
    ($($t:ty),*) => {$(
        impl Sizable for $t {}
    )*}
}

impl_zero_sized!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, ());

/// Deferred outcome of one added item.
///
/// Resolves once the batch containing the item settles: `Ok(())` when the
/// handler succeeded, or the handler's error broadcast to every item of the
/// batch. Items rejected before enqueue come back as an already-resolved
/// `Completion`. Dropping it does not cancel anything; the batch still runs.
#[must_use = "a Completion reports whether the item was handled"]
pub struct Completion {
    inner: CompletionInner,
}

enum CompletionInner {
    Ready(Option<Result<(), BatcherError>>),
    Waiting(oneshot::Receiver<Result<(), BatcherError>>),
}

impl Completion {
    pub(crate) fn ready(result: Result<(), BatcherError>) -> Self {
        Completion {
            inner: CompletionInner::Ready(Some(result)),
        }
    }

    pub(crate) fn waiting(rx: oneshot::Receiver<Result<(), BatcherError>>) -> Self {
        Completion {
            inner: CompletionInner::Waiting(rx),
        }
    }
}

impl Future for Completion {
    type Output = Result<(), BatcherError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            CompletionInner::Ready(result) => {
                let result = result.take().expect("Completion polled after ready");
                Poll::Ready(result)
            }
            CompletionInner::Waiting(rx) => match Pin::new(rx).poll(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
                // Sender dropped: the batcher was torn down before dispatch.
                Poll::Ready(Err(_)) => Poll::Ready(Err(BatcherError::Shutdown)),
            },
        }
    }
}
