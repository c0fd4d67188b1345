//! Cancellable background tasks owned by a screen.

use alloc::rc::Rc;
use core::cell::Cell;
use core::future::Future;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;

/// Cancellation flag shared between a screen and the task it owns.
///
/// The task wraps its work in [`run`](Self::run); the screen cancels the
/// token when it is left or closed. A token supports one waiter at a time.
#[derive(Clone)]
pub struct CancelToken(Rc<TokenInner>);

struct TokenInner {
    cancelled: Cell<bool>,
    signal: Signal<NoopRawMutex, ()>,
}

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self(Rc::new(TokenInner {
            cancelled: Cell::new(false),
            signal: Signal::new(),
        }))
    }

    /// Cancel. Idempotent.
    pub fn cancel(&self) {
        if !self.0.cancelled.replace(true) {
            self.0.signal.signal(());
        }
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.get()
    }

    /// Resolves once cancelled.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.0.signal.wait().await;
    }

    /// Drive `fut` until it completes or the token is cancelled.
    ///
    /// Returns `None` when cancelled first.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }
        match select(fut, self.cancelled()).await {
            Either::First(out) => Some(out),
            Either::Second(()) => None,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
