//! Vertical list of text entries.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use platform::DisplayError;

use super::{fit, CHAR_HEIGHT};
use crate::display::Display;
use crate::error::GuiError;
use crate::manager::Gui;
use crate::widget::{
    Adjustable, AdjustStep, Callback, Colors, Geometry, Value, Widget, WidgetBase, WidgetHandle,
    WidgetRef,
};

/// Row pitch of one entry.
pub const ENTRY_HEIGHT: u32 = CHAR_HEIGHT + 2;

/// Listbox contents.
pub enum Entries {
    /// Plain entries; the listbox callback (if any) handles all of them.
    Plain(Vec<String>),
    /// Each entry carries its own callback.
    WithCallbacks(Vec<(String, Callback)>),
}

/// Scrollable choice. Increase/decrease (or rotation) moves the
/// highlight; select fires the callback for the highlighted entry.
pub struct Listbox {
    base: WidgetBase,
    entries: Vec<String>,
}

impl Listbox {
    /// Listbox at `(row, col)`, `width` wide and tall enough for every entry.
    ///
    /// Supplying `callback` together with [`Entries::WithCallbacks`] fails
    /// with [`GuiError::DuplicateCallback`].
    pub fn new(
        gui: &Gui,
        row: i32,
        col: i32,
        width: u32,
        entries: Entries,
        callback: Option<Callback>,
    ) -> Result<WidgetHandle<Self>, GuiError> {
        let (texts, callback) = match entries {
            Entries::Plain(texts) => (texts, callback),
            Entries::WithCallbacks(_) if callback.is_some() => {
                return Err(GuiError::DuplicateCallback)
            }
            Entries::WithCallbacks(pairs) => {
                let (texts, callbacks): (Vec<String>, Vec<Callback>) = pairs.into_iter().unzip();
                (texts, Some(dispatch(callbacks)))
            }
        };
        let rows = u32::try_from(texts.len()).unwrap_or(u32::MAX).max(1);
        let geometry = Geometry::new(row, col, rows.saturating_mul(ENTRY_HEIGHT), width);
        let colors = Colors::from_palette(&gui.config().palette);
        let base = WidgetBase::new(gui, "Listbox", geometry, colors)?
            .with_active(true)
            .with_value(Value::Int(0))
            .with_callback(callback);
        gui.register(Self {
            base,
            entries: texts,
        })
    }

    /// Index of the highlighted entry.
    pub fn selected(&self) -> usize {
        self.base
            .value()
            .as_i32()
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(0)
    }

    /// Text of the highlighted entry.
    pub fn selected_text(&self) -> Option<&str> {
        self.entries.get(self.selected()).map(String::as_str)
    }

    /// Every entry.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

/// Callback that forwards to the callback of the highlighted entry.
fn dispatch(callbacks: Vec<Callback>) -> Callback {
    Rc::new(move |widget: &WidgetRef| {
        let index = widget
            .borrow()
            .base()
            .value()
            .as_i32()
            .and_then(|v| usize::try_from(v).ok());
        if let Some(callback) = index.and_then(|i| callbacks.get(i)) {
            callback(widget);
        }
    })
}

impl Adjustable for Listbox {
    fn step(&self) -> AdjustStep {
        AdjustStep {
            min_delta: 1.0,
            max_delta: 1.0,
        }
    }

    /// Increase moves the highlight up the list. The callback waits for
    /// select.
    fn adjust(&mut self, amount: f32) -> bool {
        let last = i32::try_from(self.entries.len()).unwrap_or(i32::MAX) - 1;
        if last < 0 || amount == 0.0 {
            return false;
        }
        let current = i32::try_from(self.selected()).unwrap_or(0);
        let next = if amount > 0.0 { current - 1 } else { current + 1 };
        self.base.set_value(Value::Int(next.clamp(0, last)));
        false
    }

    fn precision_capable(&self) -> bool {
        false
    }
}

impl Widget for Listbox {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn draw(&mut self, display: &Display) -> Result<(), DisplayError> {
        let g = self.base.geometry();
        let colors = self.base.colors();
        let selected = self.selected();
        let mut y = g.row;
        for (i, text) in self.entries.iter().enumerate() {
            let text = fit(text, g.width.saturating_sub(2));
            let color = if i == selected {
                display.fill_rect(
                    Rectangle::new(Point::new(g.col, y), Size::new(g.width, ENTRY_HEIGHT)),
                    colors.fg,
                )?;
                colors.bg
            } else {
                colors.fg
            };
            display.text(Point::new(g.col + 1, y + 1), text, color)?;
            y = y.saturating_add(i32::try_from(ENTRY_HEIGHT).unwrap_or(i32::MAX));
        }
        Ok(())
    }

    fn select(&mut self) -> bool {
        !self.entries.is_empty()
    }

    fn as_adjustable(&mut self) -> Option<&mut dyn Adjustable> {
        Some(self)
    }
}

impl WidgetHandle<Listbox> {
    /// Index of the highlighted entry.
    pub fn selected(&self) -> usize {
        self.borrow().selected()
    }

    /// Text of the highlighted entry.
    pub fn selected_text(&self) -> Option<String> {
        self.borrow().selected_text().map(String::from)
    }
}
