//! Replay-latest feeds: one publisher, any number of subscribers.
//!
//! A subscriber always sees the most recent value on subscribe and is woken on
//! every replacement. Derived receivers keep only their mapping function and
//! recompute from the borrowed snapshot on each read, so two derived values
//! read from the same snapshot always agree.

use std::{fmt, sync::Arc};

use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::error::CatalogError;

/// Published state of a feed.
#[derive(Debug, Clone, PartialEq)]
pub enum Feed<T> {
    /// Nothing has been emitted yet.
    Pending,
    Ready(T),
    /// The latest load failed. `last` is the most recent value emitted
    /// before the failure, if any.
    Failed {
        error: CatalogError,
        last: Option<T>,
    },
}

impl<T> Feed<T> {
    /// Most recently emitted value, surviving later failures.
    pub fn latest(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Failed { last, .. } => last.as_ref(),
            Self::Pending => None,
        }
    }

    pub fn into_latest(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Failed { last, .. } => last,
            Self::Pending => None,
        }
    }

    pub fn error(&self) -> Option<&CatalogError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> Feed<U> {
        match self {
            Self::Pending => Feed::Pending,
            Self::Ready(value) => Feed::Ready(f(value)),
            Self::Failed { error, last } => Feed::Failed {
                error: error.clone(),
                last: last.as_ref().map(f),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("feed publisher dropped")]
pub struct FeedClosed;

/// Sending half. Only the owner of the data mutates the feed.
pub struct Publisher<T> {
    tx: watch::Sender<Feed<T>>,
}

impl<T> Publisher<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Feed::Pending);
        Self { tx }
    }

    /// Replaces the current value, returning the previous one.
    pub fn publish(&self, value: T) -> Feed<T> {
        self.tx.send_replace(Feed::Ready(value))
    }

    /// Marks the feed failed, keeping the last emitted value readable.
    pub fn fail(&self, error: CatalogError) -> Feed<T> {
        let mut previous = Feed::Pending;
        self.tx.send_modify(|feed| {
            let last = feed.latest().cloned();
            previous = std::mem::replace(feed, Feed::Failed { error, last });
        });
        previous
    }

    pub fn current(&self) -> Feed<T> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> FeedReceiver<T> {
        FeedReceiver {
            rx: self.tx.subscribe(),
            derive: Arc::new(|value: &T| value.clone()),
        }
    }
}

impl<T> Default for Publisher<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

type DeriveFn<T, U> = Arc<dyn Fn(&T) -> U + Send + Sync>;

/// Receiving half, optionally viewed through a derivation of the source value.
pub struct FeedReceiver<T, U = T> {
    rx: watch::Receiver<Feed<T>>,
    derive: DeriveFn<T, U>,
}

impl<T, U> Clone for FeedReceiver<T, U> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
            derive: Arc::clone(&self.derive),
        }
    }
}

impl<T, U> fmt::Debug for FeedReceiver<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedReceiver").finish_non_exhaustive()
    }
}

impl<T, U> FeedReceiver<T, U>
where
    T: Clone + Send + Sync + 'static,
    U: 'static,
{
    /// Latest value, derived now from the latest source snapshot.
    pub fn current(&self) -> Feed<U> {
        let snapshot = self.rx.borrow();
        (*snapshot).map(|value| (self.derive)(value))
    }

    /// Reads two derivations against one snapshot.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(&Feed<T>) -> R) -> R {
        let snapshot = self.rx.borrow();
        f(&snapshot)
    }

    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Waits for the next emission after the last one observed by `changed`.
    pub async fn changed(&mut self) -> Result<Feed<U>, FeedClosed> {
        self.rx.changed().await.map_err(|_| FeedClosed)?;
        let snapshot = self.rx.borrow_and_update();
        Ok((*snapshot).map(|value| (self.derive)(value)))
    }

    pub fn map<V: 'static>(
        self,
        f: impl Fn(&U) -> V + Send + Sync + 'static,
    ) -> FeedReceiver<T, V> {
        let derive = self.derive;
        FeedReceiver {
            rx: self.rx,
            derive: Arc::new(move |value: &T| f(&derive(value))),
        }
    }

    /// Current value first, then one item per emission.
    pub fn into_stream(self) -> impl Stream<Item = Feed<U>> + Send + 'static
    where
        U: Send,
    {
        let derive = self.derive;
        WatchStream::new(self.rx).map(move |feed| feed.map(|value| derive(value)))
    }
}

#[cfg(test)]
#[path = "tests/stream_tests.rs"]
mod tests;
