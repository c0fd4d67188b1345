//! Shared fixtures for the ui integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::cell::RefCell;
use std::rc::Rc;

use platform::mocks::MockDisplay;
use ui::widgets::{Label, Slider};
use ui::{Geometry, Gui, GuiConfig, ScreenBuilder, ScreenRef, WidgetHandle};

pub const WIDTH: u32 = 128;
pub const HEIGHT: u32 = 64;

pub type Panel = Rc<RefCell<MockDisplay>>;

/// Runtime over a 128×64 mock panel.
pub fn gui() -> (Panel, Gui) {
    gui_with(GuiConfig::default())
}

pub fn gui_with(config: GuiConfig) -> (Panel, Gui) {
    let panel = Rc::new(RefCell::new(MockDisplay::new(WIDTH, HEIGHT)));
    let gui = Gui::new(&panel, config);
    (panel, gui)
}

/// Slot a screen builder fills with the handles it created.
pub type Sliders = Rc<RefCell<Vec<WidgetHandle<Slider>>>>;

/// Screen with `n` stacked sliders, all at `value`. Handles land in the
/// returned slot once the screen is built.
pub fn sliders(n: usize, value: f32) -> (ScreenBuilder, Sliders) {
    let slot: Sliders = Rc::default();
    let out = slot.clone();
    let builder = ScreenBuilder::new(move |gui| {
        for i in 0..n {
            let row = 2 + 7 * i32::try_from(i).unwrap();
            let handle = Slider::new(gui, Geometry::new(row, 4, 4, 60), value)?;
            out.borrow_mut().push(handle);
        }
        Ok(())
    });
    (builder, slot)
}

/// Screen with a title label and one slider.
pub fn titled(title: &'static str) -> ScreenBuilder {
    ScreenBuilder::new(move |gui| {
        Label::new(gui, 0, 0, title)?;
        Slider::new(gui, Geometry::new(20, 10, 8, 80), 0.5)?;
        Ok(())
    })
}

pub fn current(gui: &Gui) -> ScreenRef {
    gui.current_screen().expect("a current screen")
}

/// Number of active widgets on `screen` reporting focus.
pub fn focus_count(screen: &ScreenRef) -> usize {
    screen
        .widgets()
        .iter()
        .filter(|w| w.borrow().base().has_focus())
        .count()
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
