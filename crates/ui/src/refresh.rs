//! Refresh scheduler: redraws dirty widgets and pushes the framebuffer to
//! the panel.
//!
//! One [`RefreshLock`] serialises physical refreshes. Application code that
//! must keep a partially updated framebuffer off the glass holds it; the
//! scheduler never starts a refresh (or, on segmented panels, a band) while
//! someone else holds it.
//!
//! - **Synchronous**: the lock is held across the sweep and the whole flush.
//! - **Segmented**: the sweep runs under the lock, then each row-band takes
//!   the lock on its own, so a waiting task gets in between bands.

use alloc::rc::Rc;
use core::cell::RefCell;

use embassy_futures::select::{select, Either};
use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;
use platform::{DisplayDriver, DisplayError};

use crate::config::SEGMENT_DIVISORS;
use crate::error::GuiError;
use crate::manager::Gui;

/// Lock guarding physical refreshes.
pub type RefreshLock = Mutex<NoopRawMutex, ()>;

/// How a frame reaches the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefreshStrategy {
    /// One blocking flush per frame.
    Synchronous,
    /// `n` equal row-bands per frame.
    Segmented(u32),
}

impl RefreshStrategy {
    /// Pick a strategy for a panel of `height` rows.
    ///
    /// Panels without band support are synchronous. Otherwise the panel's
    /// preferred band count is used if it divides the height, else the
    /// largest of 7, 5, 3, 2 that does; if none does, synchronous.
    pub fn plan(height: u32, segmented: bool, preferred: Option<u32>) -> Self {
        if !segmented || height == 0 {
            return RefreshStrategy::Synchronous;
        }
        let divides = |n: u32| n > 1 && height % n == 0;
        preferred
            .filter(|n| divides(*n))
            .or_else(|| SEGMENT_DIVISORS.iter().copied().find(|n| divides(*n)))
            .map_or(RefreshStrategy::Synchronous, RefreshStrategy::Segmented)
    }
}

/// Drives periodic refresh of one panel.
pub struct RefreshScheduler<D: DisplayDriver> {
    gui: Gui,
    panel: Rc<RefCell<D>>,
    strategy: RefreshStrategy,
}

impl<D: DisplayDriver> RefreshScheduler<D> {
    /// Scheduler for `panel`, which must be the panel `gui` draws into.
    pub fn new(gui: Gui, panel: Rc<RefCell<D>>) -> Self {
        let strategy = {
            let p = panel.borrow();
            RefreshStrategy::plan(
                p.dimensions().height,
                p.supports_segmented(),
                p.preferred_segments(),
            )
        };
        tracing::debug!(?strategy, "refresh strategy");
        Self {
            gui,
            panel,
            strategy,
        }
    }

    /// Chosen strategy.
    pub fn strategy(&self) -> RefreshStrategy {
        self.strategy
    }

    /// One cycle: sweep dirty widgets, then refresh the panel.
    pub async fn refresh_once(&self) -> Result<(), GuiError> {
        if self.gui.take_settle() {
            // Let tasks woken by the last navigation run first.
            yield_now().await;
        }
        match self.strategy {
            RefreshStrategy::Synchronous => {
                {
                    let _guard = self.gui.refresh_lock().lock().await;
                    self.gui.sweep()?;
                    self.flush()?;
                }
                yield_now().await;
            }
            RefreshStrategy::Segmented(segments) => {
                {
                    let _guard = self.gui.refresh_lock().lock().await;
                    self.gui.sweep()?;
                }
                for index in 0..segments {
                    loop {
                        let busy = self.panel.borrow().is_busy();
                        if !busy {
                            break;
                        }
                        yield_now().await;
                    }
                    {
                        let _guard = self.gui.refresh_lock().lock().await;
                        self.push_segment(index, segments)?;
                    }
                    yield_now().await;
                }
            }
        }
        Ok(())
    }

    /// Refresh forever. Returns only on error.
    pub async fn run(&self) -> Result<(), GuiError> {
        loop {
            self.refresh_once().await?;
        }
    }

    /// Refresh until shutdown is requested or the panel fails, then tear
    /// down: cancel every task registered on any stacked screen, let them
    /// observe it, clear and flush the panel, and empty the navigation
    /// stack. A refresh error is returned after teardown.
    pub async fn monitor(&self) -> Result<(), GuiError> {
        let outcome = match select(self.run(), self.gui.wait_shutdown()).await {
            Either::First(result) => result,
            Either::Second(()) => Ok(()),
        };
        if let Err(err) = &outcome {
            tracing::error!(?err, "refresh failed, shutting down");
            self.gui.shutdown();
        }
        self.gui.teardown();
        yield_now().await;
        let cleared = {
            let _guard = self.gui.refresh_lock().lock().await;
            self.clear_panel()
        };
        tracing::debug!("gui shut down");
        outcome.and(cleared)
    }

    fn clear_panel(&self) -> Result<(), GuiError> {
        self.gui.display().clear()?;
        self.flush()
    }

    fn flush(&self) -> Result<(), GuiError> {
        let mut panel = self.panel.try_borrow_mut().map_err(|_| DisplayError::Busy)?;
        panel.show().map_err(|err| {
            tracing::error!(?err, "panel flush failed");
            GuiError::Display(DisplayError::Communication)
        })
    }

    fn push_segment(&self, index: u32, segments: u32) -> Result<(), GuiError> {
        let mut panel = self.panel.try_borrow_mut().map_err(|_| DisplayError::Busy)?;
        panel.refresh_segment(index, segments).map_err(|err| {
            tracing::error!(?err, index, segments, "panel band refresh failed");
            GuiError::Display(DisplayError::Communication)
        })
    }
}
