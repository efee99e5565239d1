// ── Reactive store streams ──
//
// Subscription types for consuming store changes.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::StoreSnapshot;

pub use filter::{AttackFilter, ServerFilter};

/// A subscription to the store.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed()`](Self::changed) or by converting to a `Stream`. Only
/// mutations that actually changed state wake subscribers.
pub struct StoreStream {
    current: Arc<StoreSnapshot>,
    receiver: watch::Receiver<Arc<StoreSnapshot>>,
}

impl StoreStream {
    pub(crate) fn new(mut receiver: watch::Receiver<Arc<StoreSnapshot>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<StoreSnapshot> {
        &self.current
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<StoreSnapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The first item is the snapshot current at conversion time.
    pub fn into_stream(self) -> StoreWatchStream {
        StoreWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Rapid mutations may be coalesced: a slow reader sees the newest
/// snapshot, never a torn one.
pub struct StoreWatchStream {
    inner: WatchStream<Arc<StoreSnapshot>>,
}

impl Stream for StoreWatchStream {
    type Item = Arc<StoreSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
