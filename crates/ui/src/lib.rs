//! UI runtime for small displays driven by buttons or a rotary encoder.
//!
//! The crate owns four concerns:
//!
//! - **Navigation**: a stack of [`Screen`]s (full screens and modal
//!   windows), opened from [`ScreenBuilder`]s and left with
//!   [`Gui::back`] or by navigating to a screen already on the stack.
//! - **Focus**: each screen keeps an ordered list of focusable widgets;
//!   [`Gui::move_focus`] walks it, skipping hidden and greyed-out entries.
//! - **Input**: [`InputEngine`] turns raw [`platform::InputEvent`]s into
//!   gestures (long press, double click) and then into focus, select and
//!   adjust operations according to the button [`Rig`].
//! - **Refresh**: [`RefreshScheduler`] redraws dirty widgets and pushes the
//!   framebuffer to the panel, serialised by the [`RefreshLock`].
//!
//! Everything is single-threaded: widgets and screens live in `Rc`s and
//! the futures run on one executor (Embassy on target, a tokio `LocalSet`
//! on the host).
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use platform::mocks::MockDisplay;
//! use ui::widgets::Slider;
//! use ui::{Geometry, Gui, GuiConfig, ScreenBuilder};
//!
//! let panel = Rc::new(RefCell::new(MockDisplay::new(128, 64)));
//! let gui = Gui::new(&panel, GuiConfig::default());
//! gui.open(ScreenBuilder::new(|gui| {
//!     Slider::new(gui, Geometry::new(10, 10, 8, 100), 0.5)?;
//!     Ok(())
//! }))
//! .unwrap();
//! assert!(gui.focused().is_some());
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::print_stdout)]
#![allow(clippy::module_name_repetitions)]
#![allow(async_fn_in_trait)]

extern crate alloc;

pub mod config;
pub mod display;
pub mod error;
pub mod input;
pub mod manager;
pub mod navigation;
pub mod refresh;
pub mod screen;
pub mod task;
pub mod widget;
pub mod widgets;

pub use config::{GestureTiming, GuiConfig, Palette};
pub use display::Display;
pub use error::GuiError;
pub use input::{InputEngine, InputMode, Operation, Rig};
pub use manager::Gui;
pub use navigation::Navigator;
pub use refresh::{RefreshLock, RefreshScheduler, RefreshStrategy};
pub use screen::{
    Direction, NavMode, Screen, ScreenBuilder, ScreenKind, ScreenRef, Target, TaskPolicy, View,
    WindowFrame,
};
pub use task::CancelToken;
pub use widget::{
    AdjustStep, Adjustable, Callback, Colors, Geometry, Value, Widget, WidgetBase, WidgetHandle,
    WidgetId, WidgetRef,
};
