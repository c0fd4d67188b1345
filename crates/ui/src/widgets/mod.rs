//! Stock widgets.
//!
//! - [`Label`]: passive text
//! - [`Button`]: select fires its callback
//! - [`Slider`]: adjustable float in `0.0..=1.0`, optional [`Label`]
//! - [`Listbox`]: adjustable index, one callback or one per entry
//!
//! All text uses the built-in 6×10 font.

pub mod button;
pub mod label;
pub mod listbox;
pub mod slider;

pub use button::Button;
pub use label::Label;
pub use listbox::{Entries, Listbox};
pub use slider::Slider;

use embedded_graphics::prelude::Point;

use crate::widget::Geometry;

/// Glyph width of the built-in font.
pub const CHAR_WIDTH: u32 = 6;
/// Glyph height of the built-in font.
pub const CHAR_HEIGHT: u32 = 10;

/// Width of `text` in pixels.
pub fn text_width(text: &str) -> u32 {
    u32::try_from(text.chars().count())
        .unwrap_or(u32::MAX)
        .saturating_mul(CHAR_WIDTH)
}

/// Longest prefix of `text` that fits in `width` pixels.
pub(crate) fn fit(text: &str, width: u32) -> &str {
    let max = usize::try_from(width / CHAR_WIDTH).unwrap_or(usize::MAX);
    match text.char_indices().nth(max) {
        Some((end, _)) => text.get(..end).unwrap_or(text),
        None => text,
    }
}

/// Top-left point that centres `text` inside `geometry`.
pub(crate) fn centred(geometry: &Geometry, text: &str) -> Point {
    let text_w = i64::from(text_width(text).min(geometry.width));
    let dx = (i64::from(geometry.width) - text_w) / 2;
    let dy = (i64::from(geometry.height) - i64::from(CHAR_HEIGHT)).max(0) / 2;
    Point::new(
        geometry.col.saturating_add(i32::try_from(dx).unwrap_or(0)),
        geometry.row.saturating_add(i32::try_from(dy).unwrap_or(0)),
    )
}
