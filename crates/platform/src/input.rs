//! Input device abstraction

/// Input device trait for buttons and encoders
pub trait InputDevice {
    /// Wait for next input event (async, power-efficient)
    fn wait_for_event(&mut self) -> impl core::future::Future<Output = InputEvent>;

    /// Poll for event (non-blocking)
    fn poll_event(&mut self) -> Option<InputEvent>;

    /// Whether `button` is physically held down right now.
    ///
    /// Hold-to-repeat loops poll this between steps.
    fn is_held(&self, button: Button) -> bool;
}

/// Input events from buttons and encoders.
///
/// Debounced edges only. A device that runs its own gesture timers may emit
/// [`ButtonLongPress`](Self::ButtonLongPress) and
/// [`ButtonDoubleClick`](Self::ButtonDoubleClick) directly; otherwise the UI
/// input engine derives them from press/release timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    /// Button pressed
    ButtonPress(Button),
    /// Button released
    ButtonRelease(Button),
    /// Button held for extended period
    ButtonLongPress(Button),
    /// Second press inside the double-click window
    ButtonDoubleClick(Button),
    /// Rotary encoder increment (positive = clockwise)
    RotaryIncrement(i32),
}

/// Physical controls a UI rig can be wired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Move focus forward
    Next,
    /// Move focus backward (doubles as decrease on 3-button rigs)
    Prev,
    /// Select / OK (encoder push on encoder rigs)
    Select,
    /// Increase the focused value
    Increase,
    /// Decrease the focused value
    Decrease,
}
