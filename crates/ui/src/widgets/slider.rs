//! Horizontal slider over `0.0..=1.0`.

use alloc::format;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use platform::DisplayError;

use super::label::Label;
use crate::display::Display;
use crate::error::GuiError;
use crate::manager::Gui;
use crate::widget::{
    Adjustable, AdjustStep, Colors, Geometry, Value, Widget, WidgetBase, WidgetHandle,
};

/// Adjustable bar. Every value change fires the callback and, when a
/// label is attached, updates it with the value as a percentage.
pub struct Slider {
    base: WidgetBase,
    step: AdjustStep,
    label: Option<WidgetHandle<Label>>,
}

impl Slider {
    /// Slider at `value` with default step sizes and palette colors.
    pub fn new(gui: &Gui, geometry: Geometry, value: f32) -> Result<WidgetHandle<Self>, GuiError> {
        let colors = Colors::from_palette(&gui.config().palette);
        Self::with_options(gui, geometry, colors, value, AdjustStep::default(), None)
    }

    /// Slider with explicit colors, step sizes and an optional label.
    pub fn with_options(
        gui: &Gui,
        geometry: Geometry,
        colors: Colors,
        value: f32,
        step: AdjustStep,
        label: Option<WidgetHandle<Label>>,
    ) -> Result<WidgetHandle<Self>, GuiError> {
        let base = WidgetBase::new(gui, "Slider", geometry, colors)?
            .with_active(true)
            .with_value(Value::Float(value));
        let slider = Self { base, step, label };
        slider.sync_label();
        gui.register(slider)
    }

    /// Current position.
    pub fn position(&self) -> f32 {
        self.base.value().as_f32().unwrap_or(0.0)
    }

    fn sync_label(&self) {
        if let Some(label) = &self.label {
            #[allow(clippy::cast_possible_truncation)]
            let percent = round_half_away(self.position() * 100.0) as i32;
            label.set_text(&format!("{percent}%"));
        }
    }
}

// `f32::round` needs std.
fn round_half_away(v: f32) -> f32 {
    if v >= 0.0 {
        (v + 0.5) - ((v + 0.5) % 1.0)
    } else {
        (v - 0.5) - ((v - 0.5) % 1.0)
    }
}

impl Adjustable for Slider {
    fn step(&self) -> AdjustStep {
        self.step
    }

    fn adjust(&mut self, amount: f32) -> bool {
        let changed = self
            .base
            .set_value(Value::Float(self.position() + amount));
        if changed {
            self.sync_label();
        }
        changed
    }
}

impl Widget for Slider {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn draw(&mut self, display: &Display) -> Result<(), DisplayError> {
        let g = self.base.geometry();
        let fg = self.base.colors().fg;
        display.rect(g.rect(), fg)?;
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let filled = (self.position() * g.width as f32) as u32;
        if filled > 0 {
            display.fill_rect(
                Rectangle::new(Point::new(g.col, g.row), Size::new(filled, g.height)),
                fg,
            )?;
        }
        Ok(())
    }

    fn as_adjustable(&mut self) -> Option<&mut dyn Adjustable> {
        Some(self)
    }

    fn label(&self) -> Option<WidgetHandle<Label>> {
        self.label.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::round_half_away;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_half_away(49.5), 50.0);
        assert_eq!(round_half_away(49.4), 49.0);
        assert_eq!(round_half_away(0.0), 0.0);
    }
}
