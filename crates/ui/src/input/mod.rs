//! Input handling: gesture recognition and translation of gestures into
//! navigation and adjustment operations for the current screen.
//!
//! ```text
//! InputDevice events ──► GestureTracker ──► InputEngine ──► Gui operations
//!   press/release          long press,        per rig and     move, select,
//!   rotary detents         double click       input mode      adjust, modes
//! ```

pub mod engine;
pub mod gesture;

pub use engine::{InputEngine, Operation, Rig};
pub use gesture::{Gesture, GestureTracker};

/// How increase/decrease (or the encoder) is currently interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputMode {
    /// Next/prev (or rotation) move focus.
    #[default]
    Normal,
    /// Rotation (or next/prev on 3-button rigs) adjusts the focused widget.
    Adjust,
    /// Adjustment in fine steps.
    Precision,
}
