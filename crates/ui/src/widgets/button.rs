//! Push button.

use alloc::rc::Rc;
use alloc::string::{String, ToString};

use platform::DisplayError;

use super::{centred, fit};
use crate::display::Display;
use crate::error::GuiError;
use crate::manager::Gui;
use crate::widget::{Colors, Geometry, Widget, WidgetBase, WidgetHandle, WidgetRef};

/// Labelled button. Select fires the callback; the button is drawn
/// inverted while select is held.
pub struct Button {
    base: WidgetBase,
    text: String,
    pressed: bool,
}

impl Button {
    /// Button with palette colors.
    pub fn new(
        gui: &Gui,
        geometry: Geometry,
        text: &str,
        on_press: impl Fn(&WidgetRef) + 'static,
    ) -> Result<WidgetHandle<Self>, GuiError> {
        let colors = Colors::from_palette(&gui.config().palette);
        Self::with_colors(gui, geometry, colors, text, on_press)
    }

    /// Button with explicit colors.
    pub fn with_colors(
        gui: &Gui,
        geometry: Geometry,
        colors: Colors,
        text: &str,
        on_press: impl Fn(&WidgetRef) + 'static,
    ) -> Result<WidgetHandle<Self>, GuiError> {
        let base = WidgetBase::new(gui, "Button", geometry, colors)?
            .with_active(true)
            .with_callback(Some(Rc::new(on_press)));
        gui.register(Self {
            base,
            text: text.to_string(),
            pressed: false,
        })
    }

    /// Caption.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Select currently held on this button.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

impl Widget for Button {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn draw(&mut self, display: &Display) -> Result<(), DisplayError> {
        let g = self.base.geometry();
        let colors = self.base.colors();
        let (text_color, fill) = if self.pressed {
            (colors.bg, Some(colors.fg))
        } else {
            (colors.fg, None)
        };
        if let Some(fill) = fill {
            display.fill_rect(g.rect(), fill)?;
        }
        display.rect(g.rect(), colors.fg)?;
        let text = fit(&self.text, g.width);
        display.text(centred(&g, text), text, text_color)
    }

    fn select(&mut self) -> bool {
        self.pressed = true;
        self.base.mark_dirty();
        true
    }

    fn unselect(&mut self) {
        if self.pressed {
            self.pressed = false;
            self.base.mark_dirty();
        }
    }

    fn leave(&mut self) {
        self.unselect();
    }
}
