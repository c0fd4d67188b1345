//! Hardware Abstraction Layer (HAL) for the button/encoder UI runtime
//!
//! This crate provides trait-based abstractions for the two pieces of
//! hardware the UI consumes, enabling development and testing without a
//! physical panel or buttons.
//!
//! # Architecture Layers
//!
//! ```text
//! Application screens and widgets
//!         ↓
//! UI runtime (ui crate)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Panel driver / GPIO + encoder driver
//! ```
//!
//! - [`DisplayDriver`] / [`Canvas`] - framebuffer drawing and panel refresh
//! - [`InputDevice`] - debounced button and rotary encoder events
//!
//! # Features
//!
//! - `std`: Enable standard library support and the [`mocks`] module
//! - `defmt`: Enable defmt logging derives
//!
//! # Example
//!
//! ```no_run
//! use platform::DisplayDriver;
//!
//! fn flush<D: DisplayDriver>(display: &mut D) {
//!     display.show().ok();
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

extern crate alloc;

pub mod display;
pub mod input;
pub mod mocks;

// Re-export main high-level traits
pub use display::{Canvas, DisplayDriver, DisplayError};
pub use input::{Button, InputDevice, InputEvent};
