//! Shared drawing surface with greyed-out color substitution.

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use platform::{Canvas, DisplayError};

use crate::config::Palette;

/// Drawing adapter over the panel's framebuffer.
///
/// While grey mode is on, every color other than the palette background is
/// replaced by the palette grey. Widgets switch it on for their own draw and
/// the runtime switches it back off afterwards.
pub struct Display {
    canvas: Rc<RefCell<dyn Canvas>>,
    size: Size,
    grey: Cell<bool>,
    palette: Palette,
}

impl Display {
    /// Wrap a shared canvas.
    pub fn new(canvas: Rc<RefCell<dyn Canvas>>, palette: Palette) -> Self {
        let size = canvas.borrow().extent();
        Self {
            canvas,
            size,
            grey: Cell::new(false),
            palette,
        }
    }

    /// Framebuffer size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Whole-screen rectangle.
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(Point::zero(), self.size)
    }

    /// Palette in use.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Switch grey substitution on or off.
    pub fn use_grey(&self, grey: bool) {
        self.grey.set(grey);
    }

    /// Whether grey substitution is on.
    pub fn is_grey(&self) -> bool {
        self.grey.get()
    }

    fn color(&self, color: Rgb565) -> Rgb565 {
        if self.grey.get() && color != self.palette.background {
            self.palette.grey
        } else {
            color
        }
    }

    fn with_canvas(
        &self,
        f: impl FnOnce(&mut dyn Canvas) -> Result<(), DisplayError>,
    ) -> Result<(), DisplayError> {
        // The panel is borrowed elsewhere only while a refresh is in flight.
        let mut canvas = self.canvas.try_borrow_mut().map_err(|_| DisplayError::Busy)?;
        f(&mut *canvas)
    }

    /// Fill the whole screen with the background color.
    pub fn clear(&self) -> Result<(), DisplayError> {
        let bg = self.palette.background;
        let area = self.bounds();
        self.with_canvas(|c| c.fill_rect(area, bg))
    }

    /// Filled rectangle.
    pub fn fill_rect(&self, area: Rectangle, color: Rgb565) -> Result<(), DisplayError> {
        let color = self.color(color);
        self.with_canvas(|c| c.fill_rect(area, color))
    }

    /// One-pixel outline.
    pub fn rect(&self, area: Rectangle, color: Rgb565) -> Result<(), DisplayError> {
        let color = self.color(color);
        self.with_canvas(|c| c.rect(area, color))
    }

    /// Horizontal line of `len` pixels.
    pub fn hline(&self, x: i32, y: i32, len: u32, color: Rgb565) -> Result<(), DisplayError> {
        if len == 0 {
            return Ok(());
        }
        let end = x.saturating_add(i32::try_from(len - 1).unwrap_or(i32::MAX));
        self.line(Point::new(x, y), Point::new(end, y), color)
    }

    /// Vertical line of `len` pixels.
    pub fn vline(&self, x: i32, y: i32, len: u32, color: Rgb565) -> Result<(), DisplayError> {
        if len == 0 {
            return Ok(());
        }
        let end = y.saturating_add(i32::try_from(len - 1).unwrap_or(i32::MAX));
        self.line(Point::new(x, y), Point::new(x, end), color)
    }

    /// Line between two inclusive end points.
    pub fn line(&self, start: Point, end: Point, color: Rgb565) -> Result<(), DisplayError> {
        let color = self.color(color);
        self.with_canvas(|c| c.line(start, end, color))
    }

    /// Single pixel.
    pub fn pixel(&self, at: Point, color: Rgb565) -> Result<(), DisplayError> {
        let color = self.color(color);
        self.with_canvas(|c| c.pixel(at, color))
    }

    /// One line of text with its top-left corner at `at`.
    pub fn text(&self, at: Point, text: &str, color: Rgb565) -> Result<(), DisplayError> {
        let color = self.color(color);
        self.with_canvas(|c| c.text(at, text, color))
    }
}
