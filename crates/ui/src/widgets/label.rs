//! Passive text label.

use alloc::string::{String, ToString};

use embedded_graphics::prelude::Point;
use platform::DisplayError;

use super::{fit, text_width, CHAR_HEIGHT};
use crate::display::Display;
use crate::error::GuiError;
use crate::manager::Gui;
use crate::widget::{Colors, Geometry, Widget, WidgetBase, WidgetHandle};

/// One line of text. Never takes focus.
pub struct Label {
    base: WidgetBase,
    text: String,
}

impl Label {
    /// Label sized to `text` at `(row, col)`.
    pub fn new(gui: &Gui, row: i32, col: i32, text: &str) -> Result<WidgetHandle<Self>, GuiError> {
        let geometry = Geometry::new(row, col, CHAR_HEIGHT, text_width(text).max(1));
        let colors = Colors::from_palette(&gui.config().palette);
        Self::with_geometry(gui, geometry, colors, text)
    }

    /// Label with explicit geometry and colors. Text wider than the
    /// geometry is cut at the last whole glyph.
    pub fn with_geometry(
        gui: &Gui,
        geometry: Geometry,
        colors: Colors,
        text: &str,
    ) -> Result<WidgetHandle<Self>, GuiError> {
        let base = WidgetBase::new(gui, "Label", geometry, colors)?;
        gui.register(Self {
            base,
            text: text.to_string(),
        })
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text; redrawn on the next sweep.
    pub fn set_text(&mut self, text: &str) {
        if self.text != text {
            self.text = text.to_string();
            self.base.mark_dirty();
        }
    }
}

impl Widget for Label {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn draw(&mut self, display: &Display) -> Result<(), DisplayError> {
        let g = self.base.geometry();
        let text = fit(&self.text, g.width);
        display.text(Point::new(g.col, g.row), text, self.base.colors().fg)
    }
}

impl WidgetHandle<Label> {
    /// Current text.
    pub fn text(&self) -> String {
        self.borrow().text().to_string()
    }

    /// Replace the text; redrawn on the next sweep.
    pub fn set_text(&self, text: &str) {
        self.borrow_mut().set_text(text);
    }
}
