//! Gesture → operation translation and the input task.
//!
//! | Rig | NORMAL | ADJUST | PRECISION |
//! |-----|--------|--------|-----------|
//! | 5 buttons | next/prev move, inc/dec adjust, long select → precision | n/a | select → NORMAL |
//! | 3 buttons (next, prev, select) | next/prev move, double select → ADJUST | next/prev adjust, long select → precision, double select → NORMAL | next/prev adjust (fine), select → ADJUST |
//! | 2 buttons (next, select) | next moves | n/a | n/a |
//! | encoder | rotation moves, double select → ADJUST | rotation adjusts, select → precision | select → ADJUST |

use embassy_futures::select::{select, Either};
use embassy_time::{Instant, Timer};
use heapless::Vec;
use platform::{Button, InputDevice, InputEvent};

use super::gesture::{Gesture, GestureTracker};
use super::InputMode;
use crate::error::GuiError;
use crate::manager::Gui;
use crate::screen::Direction;

/// Most operations one event can produce (fast encoder spins are capped).
pub const MAX_OPS: usize = 8;

/// Operations produced by one event or timeout.
pub type Ops = Vec<Operation, MAX_OPS>;

/// Which physical controls drive the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rig {
    /// Discrete buttons. Next and select are always present.
    Buttons {
        /// A prev button is wired.
        prev: bool,
        /// Increase and decrease buttons are wired.
        increase_decrease: bool,
    },
    /// Rotary encoder with a push-button select.
    Encoder,
}

impl Rig {
    /// Next, prev, select, increase, decrease.
    pub const FIVE_BUTTON: Rig = Rig::Buttons {
        prev: true,
        increase_decrease: true,
    };
    /// Next, prev, select. Next/prev double as adjust in ADJUST mode.
    pub const THREE_BUTTON: Rig = Rig::Buttons {
        prev: true,
        increase_decrease: false,
    };
    /// Next, select.
    pub const TWO_BUTTON: Rig = Rig::Buttons {
        prev: false,
        increase_decrease: false,
    };

    /// Three buttons: adjust mode is toggled with a double click.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            Rig::Buttons {
                prev: true,
                increase_decrease: false
            }
        )
    }

    fn uses_double_click(&self) -> bool {
        self.is_degraded() || *self == Rig::Encoder
    }
}

/// Semantic UI operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    /// Focus the next eligible widget.
    MoveNext,
    /// Focus the previous eligible widget.
    MovePrev,
    /// Select the focused widget.
    Select,
    /// Select released.
    Unselect,
    /// Adjust the focused widget. `control` is the held button driving
    /// hold-to-repeat; `None` for encoder steps.
    Adjust {
        /// Button whose release ends the adjustment.
        control: Option<Button>,
        /// Signed step count.
        delta: i32,
    },
    /// Enter precision mode.
    EnterPrecision,
    /// Leave precision mode.
    CancelPrecision,
    /// NORMAL ⇄ ADJUST.
    ToggleAdjustMode,
}

/// Turns device events into operations on a [`Gui`].
pub struct InputEngine {
    gui: Gui,
    rig: Rig,
    tracker: GestureTracker,
    ratio: i32,
    detents: i32,
    pressed: Option<Button>,
}

impl InputEngine {
    /// Engine for `rig`, with timing and encoder ratio from the GUI config.
    pub fn new(gui: Gui, rig: Rig) -> Self {
        let config = *gui.config();
        Self {
            tracker: GestureTracker::new(&config.timing, rig.uses_double_click()),
            ratio: i32::try_from(config.encoder_ratio).unwrap_or(i32::MAX).max(1),
            detents: 0,
            pressed: None,
            gui,
            rig,
        }
    }

    /// Configured rig.
    pub fn rig(&self) -> Rig {
        self.rig
    }

    /// When the next gesture timer expires.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tracker.next_deadline()
    }

    /// Translate one device event observed at `now`.
    ///
    /// While a button is down, presses of any other button (and their
    /// releases) are dropped.
    pub fn handle_event(&mut self, event: InputEvent, now: Instant) -> Ops {
        if !self.accept(event) {
            tracing::trace!(
                ?event,
                held = ?self.pressed,
                "event dropped while another button is down"
            );
            return Ops::new();
        }
        let gesture = self.tracker.on_event(event, now);
        self.translate(gesture)
    }

    fn accept(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::ButtonPress(button) => match self.pressed {
                Some(down) if down != button => false,
                _ => {
                    self.pressed = Some(button);
                    true
                }
            },
            InputEvent::ButtonRelease(button) => {
                let ours = self.pressed == Some(button);
                if ours {
                    self.pressed = None;
                }
                ours
            }
            _ => true,
        }
    }

    /// Fire expired gesture timers at `now`.
    pub fn handle_timeout(&mut self, now: Instant) -> Ops {
        match self.tracker.poll(now) {
            Some(gesture) => self.translate(gesture),
            None => Ops::new(),
        }
    }

    fn translate(&mut self, gesture: Gesture) -> Ops {
        let mode = self.gui.mode();
        let mut ops = Ops::new();
        match self.rig {
            Rig::Encoder => self.translate_encoder(gesture, mode, &mut ops),
            Rig::Buttons {
                increase_decrease, ..
            } => self.translate_buttons(gesture, mode, increase_decrease, &mut ops),
        }
        if !ops.is_empty() {
            tracing::trace!(?gesture, ?mode, ops = ops.len(), "gesture translated");
        }
        ops
    }

    fn translate_buttons(&self, gesture: Gesture, mode: InputMode, inc_dec: bool, ops: &mut Ops) {
        let degraded = self.rig.is_degraded();
        let adjusting = mode != InputMode::Normal;
        let op = match gesture {
            Gesture::Press(Button::Next) if degraded && adjusting => Operation::Adjust {
                control: Some(Button::Next),
                delta: 1,
            },
            Gesture::Press(Button::Prev) if degraded && adjusting => Operation::Adjust {
                control: Some(Button::Prev),
                delta: -1,
            },
            Gesture::Press(Button::Next) => Operation::MoveNext,
            Gesture::Press(Button::Prev) => Operation::MovePrev,
            Gesture::Press(Button::Increase) => Operation::Adjust {
                control: Some(Button::Increase),
                delta: 1,
            },
            Gesture::Press(Button::Decrease) => Operation::Adjust {
                control: Some(Button::Decrease),
                delta: -1,
            },
            Gesture::Press(Button::Select) if mode == InputMode::Precision => {
                Operation::CancelPrecision
            }
            // Waiting to see whether this becomes a long press or double click.
            Gesture::Press(Button::Select) if degraded && adjusting => return,
            Gesture::Press(Button::Select) => Operation::Select,
            Gesture::Release(Button::Select) => Operation::Unselect,
            Gesture::LongPress(Button::Select) => {
                let allowed = if degraded {
                    mode == InputMode::Adjust
                } else {
                    inc_dec && mode == InputMode::Normal
                };
                if !allowed {
                    return;
                }
                Operation::EnterPrecision
            }
            Gesture::DoubleClick(Button::Select) if degraded => Operation::ToggleAdjustMode,
            Gesture::DoubleClick(Button::Select) => Operation::Select,
            _ => return,
        };
        let _ = ops.push(op);
    }

    fn translate_encoder(&mut self, gesture: Gesture, mode: InputMode, ops: &mut Ops) {
        let op = match gesture {
            Gesture::Rotate(delta) => {
                self.detents = self.detents.saturating_add(delta);
                let steps = self.detents / self.ratio;
                self.detents %= self.ratio;
                if steps == 0 {
                    return;
                }
                if mode != InputMode::Normal {
                    let _ = ops.push(Operation::Adjust {
                        control: None,
                        delta: steps,
                    });
                    return;
                }
                let op = if steps > 0 {
                    Operation::MoveNext
                } else {
                    Operation::MovePrev
                };
                let count = usize::try_from(steps.unsigned_abs())
                    .unwrap_or(MAX_OPS)
                    .min(MAX_OPS);
                for _ in 0..count {
                    let _ = ops.push(op);
                }
                return;
            }
            Gesture::Press(Button::Select) => match mode {
                InputMode::Normal => Operation::Select,
                InputMode::Adjust => Operation::EnterPrecision,
                InputMode::Precision => Operation::CancelPrecision,
            },
            Gesture::Release(Button::Select) => Operation::Unselect,
            Gesture::DoubleClick(Button::Select) => Operation::ToggleAdjustMode,
            Gesture::Press(Button::Next) => Operation::MoveNext,
            Gesture::Press(Button::Prev) => Operation::MovePrev,
            _ => return,
        };
        let _ = ops.push(op);
    }

    /// Perform one operation. Button-driven adjustments keep repeating
    /// while `input` reports the button held.
    pub async fn apply<I: InputDevice>(&self, op: Operation, input: &I) -> Result<(), GuiError> {
        match op {
            Operation::MoveNext => self.gui.move_focus(Direction::Next),
            Operation::MovePrev => self.gui.move_focus(Direction::Prev),
            Operation::Select => self.gui.select(),
            Operation::Unselect => {
                self.gui.unselect();
                Ok(())
            }
            Operation::Adjust {
                control: Some(button),
                delta,
            } => {
                let held: &dyn Fn() -> bool = &|| input.is_held(button);
                self.gui.adjust(delta, Some(held)).await
            }
            Operation::Adjust {
                control: None,
                delta,
            } => self.gui.adjust(delta, None).await,
            Operation::EnterPrecision => {
                self.gui.enter_precision();
                Ok(())
            }
            Operation::CancelPrecision => {
                self.gui.cancel_precision();
                Ok(())
            }
            Operation::ToggleAdjustMode => {
                self.gui.toggle_adjust_mode();
                Ok(())
            }
        }
    }

    /// Translate and apply one event observed now.
    pub async fn dispatch<I: InputDevice>(
        &mut self,
        event: InputEvent,
        input: &I,
    ) -> Result<(), GuiError> {
        let ops = self.handle_event(event, Instant::now());
        for op in ops {
            self.apply(op, input).await?;
        }
        Ok(())
    }

    /// Input task: wait for events or gesture deadlines and apply the
    /// resulting operations, until shutdown is requested.
    pub async fn run<I: InputDevice>(&mut self, input: &mut I) -> Result<(), GuiError> {
        let gui = self.gui.clone();
        while !gui.is_shut_down() {
            let deadline = self.tracker.next_deadline();
            let next = async {
                match deadline {
                    Some(at) => match select(input.wait_for_event(), Timer::at(at)).await {
                        Either::First(event) => Some(event),
                        Either::Second(()) => None,
                    },
                    None => Some(input.wait_for_event().await),
                }
            };
            let woken = select(next, gui.wait_shutdown()).await;
            let ops = match woken {
                Either::First(Some(event)) => self.handle_event(event, Instant::now()),
                Either::First(None) => self.handle_timeout(Instant::now()),
                Either::Second(()) => break,
            };
            for op in ops {
                self.apply(op, input).await?;
            }
        }
        tracing::debug!("input task stopped");
        Ok(())
    }
}
