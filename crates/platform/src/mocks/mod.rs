//! Mock implementations for testing
//!
//! This module provides mock implementations of the platform traits for use
//! in unit and integration tests.

#![cfg(any(test, feature = "std"))]

use alloc::vec;
use alloc::vec::Vec;

use crate::*;
use embedded_graphics::{pixelcolor::Rgb565, prelude::*};

/// Mock display implementation
///
/// Keeps a full RGB565 framebuffer so tests can assert on what was painted,
/// and counts flushes and refreshed bands.
pub struct MockDisplay {
    width: u32,
    height: u32,
    pixels: Vec<Rgb565>,
    refresh_count: usize,
    segments: Vec<(u32, u32)>,
    segmented: bool,
    preferred: Option<u32>,
    failing: bool,
}

impl MockDisplay {
    /// Create new mock display (synchronous refresh only)
    pub fn new(width: u32, height: u32) -> Self {
        let len = usize::try_from(width.saturating_mul(height)).unwrap_or(0);
        Self {
            width,
            height,
            pixels: vec![Rgb565::BLACK; len],
            refresh_count: 0,
            segments: Vec::new(),
            segmented: false,
            preferred: None,
            failing: false,
        }
    }

    /// Create a mock panel that refreshes in row-bands
    pub fn segmented(width: u32, height: u32, preferred: Option<u32>) -> Self {
        Self {
            segmented: true,
            preferred,
            ..Self::new(width, height)
        }
    }

    /// Number of completed frames (full flushes or last bands)
    pub fn refresh_count(&self) -> usize {
        self.refresh_count
    }

    /// Every `(index, segments)` band pushed so far
    pub fn segments(&self) -> &[(u32, u32)] {
        &self.segments
    }

    /// Color at `(x, y)`, `None` outside the panel
    pub fn pixel_at(&self, x: i32, y: i32) -> Option<Rgb565> {
        let x = u32::try_from(x).ok().filter(|x| *x < self.width)?;
        let y = u32::try_from(y).ok().filter(|y| *y < self.height)?;
        let idx = usize::try_from(y * self.width + x).ok()?;
        self.pixels.get(idx).copied()
    }

    /// Make every refresh fail with [`DisplayError::Communication`]
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Paint the whole framebuffer (test setup)
    pub fn paint(&mut self, color: Rgb565) {
        self.pixels.iter_mut().for_each(|p| *p = color);
    }
}

impl DrawTarget for MockDisplay {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };
            if x >= self.width || y >= self.height {
                continue;
            }
            if let Some(p) = usize::try_from(y * self.width + x)
                .ok()
                .and_then(|idx| self.pixels.get_mut(idx))
            {
                *p = color;
            }
        }
        Ok(())
    }
}

impl OriginDimensions for MockDisplay {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DisplayDriver for MockDisplay {
    type DriverError = DisplayError;

    fn show(&mut self) -> Result<(), Self::DriverError> {
        if self.failing {
            return Err(DisplayError::Communication);
        }
        self.refresh_count += 1;
        Ok(())
    }

    fn supports_segmented(&self) -> bool {
        self.segmented
    }

    fn preferred_segments(&self) -> Option<u32> {
        self.preferred
    }

    fn refresh_segment(&mut self, index: u32, segments: u32) -> Result<(), Self::DriverError> {
        if self.failing {
            return Err(DisplayError::Communication);
        }
        self.segments.push((index, segments));
        if index + 1 == segments {
            self.refresh_count += 1;
        }
        Ok(())
    }
}

/// Mock input device
pub struct MockInput {
    events: heapless::Deque<InputEvent, 16>,
    held: heapless::Vec<Button, 5>,
}

impl MockInput {
    /// Create new mock input
    pub fn new() -> Self {
        Self {
            events: heapless::Deque::new(),
            held: heapless::Vec::new(),
        }
    }

    /// Add event to queue
    pub fn add_event(&mut self, event: InputEvent) -> Result<(), InputEvent> {
        self.events.push_back(event)
    }

    /// Mark `button` as physically held (or released)
    pub fn set_held(&mut self, button: Button, held: bool) {
        self.held.retain(|b| *b != button);
        if held {
            let _ = self.held.push(button);
        }
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
        self.held.clear();
    }
}

impl Default for MockInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDevice for MockInput {
    async fn wait_for_event(&mut self) -> InputEvent {
        loop {
            if let Some(event) = self.events.pop_front() {
                return event;
            }
            embassy_time::Timer::after_millis(10).await;
        }
    }

    fn poll_event(&mut self) -> Option<InputEvent> {
        self.events.pop_front()
    }

    fn is_held(&self, button: Button) -> bool {
        self.held.contains(&button)
    }
}
