//! Display abstraction layer
//!
//! Two traits split the panel into its drawing side and its refresh side:
//!
//! - [`Canvas`]: object-safe pixel primitives (filled/outline rectangle,
//!   lines, pixel, one-line text) in [`Rgb565`]. Every
//!   [`DrawTarget`] whose color converts from [`Rgb565`] gets it for free.
//! - [`DisplayDriver`]: pushes the framebuffer to the glass, either as one
//!   blocking flush or band by band for slow (e-paper) panels.

use embedded_graphics::mono_font::{ascii::FONT_6X10, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment,
};
use embedded_graphics::text::{Baseline, Text};

/// Refresh side of a physical panel.
///
/// Drawing happens into the driver's framebuffer through [`DrawTarget`];
/// nothing reaches the glass until [`show`](Self::show) or the last
/// [`refresh_segment`](Self::refresh_segment) of a frame runs.
pub trait DisplayDriver: DrawTarget {
    /// Error type for refresh operations
    type DriverError: core::fmt::Debug;

    /// Synchronous whole-frame flush (blocks until the frame is out).
    fn show(&mut self) -> Result<(), Self::DriverError>;

    /// Whether the panel can be refreshed in row-bands.
    fn supports_segmented(&self) -> bool {
        false
    }

    /// Row-band count the controller prefers, if any.
    ///
    /// Ignored unless it divides the panel height.
    fn preferred_segments(&self) -> Option<u32> {
        None
    }

    /// Push band `index` of `segments` equal row-bands to the panel.
    ///
    /// The default flushes the whole frame once the last band is requested,
    /// which is correct (if not incremental) for any panel.
    fn refresh_segment(&mut self, index: u32, segments: u32) -> Result<(), Self::DriverError> {
        if index.saturating_add(1) >= segments {
            self.show()
        } else {
            Ok(())
        }
    }

    /// Panel still busy with the previous band (e-paper BUSY line).
    fn is_busy(&self) -> bool {
        false
    }

    /// Get display dimensions
    fn dimensions(&self) -> Size {
        self.bounding_box().size
    }
}

/// Object-safe drawing primitives used by the UI runtime.
pub trait Canvas {
    /// Framebuffer dimensions in pixels.
    fn extent(&self) -> Size;

    /// Filled rectangle.
    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), DisplayError>;

    /// One-pixel outline drawn inside `area`.
    fn rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), DisplayError>;

    /// Arbitrary one-pixel line, both end points inclusive.
    fn line(&mut self, start: Point, end: Point, color: Rgb565) -> Result<(), DisplayError>;

    /// Single pixel.
    fn pixel(&mut self, at: Point, color: Rgb565) -> Result<(), DisplayError>;

    /// One line of text, top-left anchored, in the built-in 6×10 font.
    fn text(&mut self, at: Point, text: &str, color: Rgb565) -> Result<(), DisplayError>;
}

impl<T> Canvas for T
where
    T: DrawTarget,
    T::Color: From<Rgb565>,
{
    fn extent(&self) -> Size {
        self.bounding_box().size
    }

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), DisplayError> {
        self.fill_solid(&area, T::Color::from(color))
            .map_err(|_| DisplayError::Draw)
    }

    fn rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), DisplayError> {
        let style = PrimitiveStyleBuilder::new()
            .stroke_color(T::Color::from(color))
            .stroke_width(1)
            .stroke_alignment(StrokeAlignment::Inside)
            .build();
        area.into_styled(style)
            .draw(self)
            .map_err(|_| DisplayError::Draw)
    }

    fn line(&mut self, start: Point, end: Point, color: Rgb565) -> Result<(), DisplayError> {
        Line::new(start, end)
            .into_styled(PrimitiveStyle::with_stroke(T::Color::from(color), 1))
            .draw(self)
            .map_err(|_| DisplayError::Draw)
    }

    fn pixel(&mut self, at: Point, color: Rgb565) -> Result<(), DisplayError> {
        Pixel(at, T::Color::from(color))
            .draw(self)
            .map_err(|_| DisplayError::Draw)
    }

    fn text(&mut self, at: Point, text: &str, color: Rgb565) -> Result<(), DisplayError> {
        let style = MonoTextStyle::new(&FONT_6X10, T::Color::from(color));
        Text::with_baseline(text, at, style, Baseline::Top)
            .draw(self)
            .map(|_| ())
            .map_err(|_| DisplayError::Draw)
    }
}

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Communication error
    Communication,
    /// Display busy
    Busy,
    /// Invalid state
    InvalidState,
    /// Framebuffer rejected a draw call
    Draw,
}

#[cfg(feature = "std")]
impl std::error::Error for DisplayError {}

impl core::fmt::Display for DisplayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Communication => write!(f, "Display communication error"),
            Self::Busy => write!(f, "Display is busy"),
            Self::InvalidState => write!(f, "Display in invalid state"),
            Self::Draw => write!(f, "Framebuffer draw failed"),
        }
    }
}
