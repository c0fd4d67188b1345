//! Runtime configuration: gesture timing, palette, encoder ratio.
//!
//! Built with a fluent builder, the same shape the platform crate uses for
//! its peripheral configs:
//!
//! ```
//! use ui::config::GuiConfig;
//!
//! let config = GuiConfig::new()
//!     .long_press_ms(800)
//!     .double_click_ms(300)
//!     .encoder_ratio(4);
//! assert_eq!(config.timing.long_press.as_millis(), 800);
//! ```

use embassy_time::Duration;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

/// Default hold time before a press counts as a long press.
pub const LONG_PRESS_MS: u64 = 1000;

/// Default window in which a second press counts as a double click.
pub const DOUBLE_CLICK_MS: u64 = 400;

/// Default period after which a held increase/decrease button doubles its step.
pub const HOLD_ACCEL_MS: u64 = 500;

/// Row-band counts tried (largest first) when the panel's preferred band
/// count does not divide its height.
pub const SEGMENT_DIVISORS: [u32; 4] = [7, 5, 3, 2];

/// Maximum number of simultaneously stacked screens.
pub const MAX_SCREEN_DEPTH: usize = 8;

/// Timers used by the gesture recogniser and hold-to-repeat loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureTiming {
    /// Hold time for a long press.
    pub long_press: Duration,
    /// Double-click window.
    pub double_click: Duration,
    /// Step-doubling period while an adjust button is held.
    pub hold_accel: Duration,
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self {
            long_press: Duration::from_millis(LONG_PRESS_MS),
            double_click: Duration::from_millis(DOUBLE_CLICK_MS),
            hold_accel: Duration::from_millis(HOLD_ACCEL_MS),
        }
    }
}

/// Colors used for screen background, text and focus borders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Screen background; also used to erase borders.
    pub background: Rgb565,
    /// Default widget foreground.
    pub foreground: Rgb565,
    /// Focus border in normal navigation.
    pub focus: Rgb565,
    /// Focus border while adjusting a value.
    pub adjust: Rgb565,
    /// Focus border in precision mode.
    pub precision: Rgb565,
    /// Substitute for every non-background color on greyed-out widgets.
    pub grey: Rgb565,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb565::BLACK,
            foreground: Rgb565::WHITE,
            focus: Rgb565::WHITE,
            adjust: Rgb565::GREEN,
            precision: Rgb565::YELLOW,
            grey: Rgb565::new(16, 32, 16),
        }
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuiConfig {
    /// Gesture timers.
    pub timing: GestureTiming,
    /// Colors.
    pub palette: Palette,
    /// Encoder detents per logical step (minimum 1).
    pub encoder_ratio: u32,
}

impl GuiConfig {
    /// Configuration with default timing, palette and a 1:1 encoder.
    pub fn new() -> Self {
        Self {
            timing: GestureTiming::default(),
            palette: Palette::default(),
            encoder_ratio: 1,
        }
    }

    /// Set the long-press threshold.
    #[must_use]
    pub fn long_press_ms(mut self, ms: u64) -> Self {
        self.timing.long_press = Duration::from_millis(ms);
        self
    }

    /// Set the double-click window.
    #[must_use]
    pub fn double_click_ms(mut self, ms: u64) -> Self {
        self.timing.double_click = Duration::from_millis(ms);
        self
    }

    /// Set the hold-acceleration period.
    #[must_use]
    pub fn hold_accel_ms(mut self, ms: u64) -> Self {
        self.timing.hold_accel = Duration::from_millis(ms);
        self
    }

    /// Set encoder detents per step. Zero is treated as one.
    #[must_use]
    pub fn encoder_ratio(mut self, ratio: u32) -> Self {
        self.encoder_ratio = ratio.max(1);
        self
    }

    /// Replace the palette.
    #[must_use]
    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self::new()
    }
}
