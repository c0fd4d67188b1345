//! Gesture recognition over raw button edges.
//!
//! The tracker is a pure state machine: callers pass the current
//! [`Instant`] with every event and poll it once
//! [`next_deadline`](GestureTracker::next_deadline) has passed. That keeps
//! the timing logic testable without a clock.
//!
//! Rules:
//!
//! - A press arms a long-press deadline for that button; its release (or any
//!   other press) disarms it.
//! - With double-click detection on, a second press of select inside the
//!   window is reported as [`Gesture::DoubleClick`] instead of a press.
//!   Other buttons always report plain presses.
//! - Every new press disarms the timers of the previous gesture, so a stale
//!   timer never fires into a new one.

use embassy_time::{Duration, Instant};
use platform::{Button, InputEvent};

use crate::config::GestureTiming;

/// Recognised gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gesture {
    /// Button went down.
    Press(Button),
    /// Button came up.
    Release(Button),
    /// Button held past the long-press threshold.
    LongPress(Button),
    /// Second press inside the double-click window.
    DoubleClick(Button),
    /// Encoder detents (positive = clockwise).
    Rotate(i32),
}

/// Long-press / double-click timer state.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    long_press: Duration,
    double_click: Duration,
    detect_double: bool,
    long_armed: Option<(Button, Instant)>,
    last_press: Option<(Button, Instant)>,
}

impl GestureTracker {
    /// Tracker using `timing`. `detect_double` enables double-click
    /// recognition (rigs that do not use it get every press immediately).
    pub fn new(timing: &GestureTiming, detect_double: bool) -> Self {
        Self {
            long_press: timing.long_press,
            double_click: timing.double_click,
            detect_double,
            long_armed: None,
            last_press: None,
        }
    }

    /// Feed one device event observed at `now`.
    pub fn on_event(&mut self, event: InputEvent, now: Instant) -> Gesture {
        match event {
            InputEvent::ButtonPress(button) => self.press(button, now),
            InputEvent::ButtonRelease(button) => {
                if self.long_armed.is_some_and(|(b, _)| b == button) {
                    self.long_armed = None;
                }
                Gesture::Release(button)
            }
            InputEvent::ButtonLongPress(button) => {
                self.disarm();
                Gesture::LongPress(button)
            }
            InputEvent::ButtonDoubleClick(button) => {
                self.disarm();
                Gesture::DoubleClick(button)
            }
            InputEvent::RotaryIncrement(delta) => Gesture::Rotate(delta),
        }
    }

    fn press(&mut self, button: Button, now: Instant) -> Gesture {
        let double = self.detect_double
            && button == Button::Select
            && self.last_press.is_some_and(|(b, at)| {
                b == button && now.checked_duration_since(at).is_some_and(|d| d <= self.double_click)
            });
        if double {
            self.disarm();
            return Gesture::DoubleClick(button);
        }
        self.last_press = Some((button, now));
        self.long_armed = Some((button, now + self.long_press));
        Gesture::Press(button)
    }

    fn disarm(&mut self) {
        self.long_armed = None;
        self.last_press = None;
    }

    /// Earliest instant at which [`poll`](Self::poll) has something to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let long = self.long_armed.map(|(_, at)| at);
        let double = self
            .last_press
            .filter(|_| self.detect_double)
            .map(|(_, at)| at + self.double_click);
        match (long, double) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire expired timers at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<Gesture> {
        if let Some((_, at)) = self.last_press {
            if !self.detect_double || now >= at + self.double_click {
                // Window closed: the next press starts a fresh gesture.
                self.last_press = None;
            }
        }
        match self.long_armed {
            Some((button, at)) if now >= at => {
                self.disarm();
                Some(Gesture::LongPress(button))
            }
            _ => None,
        }
    }
}
