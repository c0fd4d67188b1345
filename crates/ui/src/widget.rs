//! Widget model.
//!
//! Every widget embeds a [`WidgetBase`] holding the state the runtime needs
//! (geometry, flags, value, change callback, owning screen) and implements
//! [`Widget`] for its own drawing and behaviour. Widgets are shared as
//! [`WidgetRef`] (`Rc<RefCell<dyn Widget>>`); [`WidgetHandle`] is the typed
//! view the application keeps.
//!
//! Callbacks never run while the widget is borrowed: the runtime releases
//! the borrow first, so a callback may freely read the widget, change other
//! widgets or navigate.

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use core::cell::{Ref, RefCell, RefMut};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use platform::DisplayError;

use crate::config::Palette;
use crate::display::Display;
use crate::error::GuiError;
use crate::input::InputMode;
use crate::manager::Gui;
use crate::screen::{Screen, ScreenRef};
use crate::widgets::Label;

/// Shared, dynamically typed widget.
pub type WidgetRef = Rc<RefCell<dyn Widget>>;

/// Change / activation callback. Receives the widget that fired it.
pub type Callback = Rc<dyn Fn(&WidgetRef)>;

/// Identity of a widget, unique within one [`Gui`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WidgetId(pub(crate) u32);

/// Widget value.
///
/// Floats are clamped to `0.0..=1.0` on every write.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    /// No value (labels, buttons).
    None,
    /// On/off.
    Bool(bool),
    /// Index or count.
    Int(i32),
    /// Normalised position.
    Float(f32),
}

impl Value {
    /// Value with floats clamped into range.
    #[must_use]
    pub fn clamped(self) -> Self {
        match self {
            Value::Float(v) if v.is_nan() => Value::Float(0.0),
            Value::Float(v) => Value::Float(v.clamp(0.0, 1.0)),
            other => other,
        }
    }

    /// Float payload, if any.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer payload, if any.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

/// Position and size in absolute screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Geometry {
    /// Top edge.
    pub row: i32,
    /// Left edge.
    pub col: i32,
    /// Height in pixels.
    pub height: u32,
    /// Width in pixels.
    pub width: u32,
}

/// Gap between a widget and its border.
const BORDER_GAP: i32 = 2;

impl Geometry {
    /// New geometry.
    pub const fn new(row: i32, col: i32, height: u32, width: u32) -> Self {
        Self {
            row,
            col,
            height,
            width,
        }
    }

    /// The widget's own area.
    pub fn rect(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.col, self.row),
            Size::new(self.width, self.height),
        )
    }

    /// The border rectangle, two pixels outside the widget on every side.
    pub fn frame(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.col - BORDER_GAP, self.row - BORDER_GAP),
            Size::new(self.width.saturating_add(4), self.height.saturating_add(4)),
        )
    }

    /// Whether the widget (border included) touches `area`.
    pub fn overlaps(&self, area: &Rectangle) -> bool {
        !self.frame().intersection(area).is_zero_sized()
    }

    /// Pull the widget back inside a display of `screen` size.
    ///
    /// Returns the adjusted geometry and whether anything moved.
    pub(crate) fn clamp_to(self, screen: Size) -> (Self, bool) {
        let (row, moved_row) = clamp_axis(self.row, self.height, screen.height);
        let (col, moved_col) = clamp_axis(self.col, self.width, screen.width);
        (Self { row, col, ..self }, moved_row || moved_col)
    }
}

fn clamp_axis(pos: i32, len: u32, limit: u32) -> (i32, bool) {
    let (pos64, len64, limit64) = (i64::from(pos), i64::from(len), i64::from(limit));
    if pos64 < 0 {
        (0, true)
    } else if pos64 + len64 >= limit64 {
        let fixed = (limit64 - len64 - 1).max(0);
        (i32::try_from(fixed).unwrap_or(0), true)
    } else {
        (pos, false)
    }
}

/// Widget colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colors {
    /// Foreground (text, bars).
    pub fg: Rgb565,
    /// Fill behind the widget content.
    pub bg: Rgb565,
    /// Permanent border color; `None` draws a border only while focused.
    pub border: Option<Rgb565>,
}

impl Colors {
    /// Palette foreground on palette background, no border.
    pub fn from_palette(palette: &Palette) -> Self {
        Self {
            fg: palette.foreground,
            bg: palette.background,
            border: None,
        }
    }

    /// Set the foreground.
    #[must_use]
    pub fn fg(mut self, color: Rgb565) -> Self {
        self.fg = color;
        self
    }

    /// Set the background.
    #[must_use]
    pub fn bg(mut self, color: Rgb565) -> Self {
        self.bg = color;
        self
    }

    /// Draw a permanent border.
    #[must_use]
    pub fn border(mut self, color: Rgb565) -> Self {
        self.border = Some(color);
        self
    }
}

/// Inputs to the border decision for one draw.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FocusContext {
    pub focused: bool,
    pub mode: InputMode,
    pub adjustable: bool,
    pub precision_capable: bool,
}

/// State shared by every widget.
pub struct WidgetBase {
    id: WidgetId,
    kind: &'static str,
    geometry: Geometry,
    colors: Colors,
    active: bool,
    visible: bool,
    dirty: bool,
    greyed: bool,
    value: Value,
    callback: Option<Callback>,
    owner: Weak<Screen>,
    has_border: bool,
}

impl WidgetBase {
    /// Base for a widget on the screen currently being built (or the
    /// current screen when none is being built).
    ///
    /// Geometry that does not fit the display is pulled inside and a
    /// warning is logged.
    pub fn new(
        gui: &Gui,
        kind: &'static str,
        geometry: Geometry,
        colors: Colors,
    ) -> Result<Self, GuiError> {
        let screen = gui.target_screen().ok_or(GuiError::NoCurrentScreen)?;
        let (geometry, moved) = geometry.clamp_to(gui.display().size());
        if moved {
            tracing::warn!(
                kind,
                row = geometry.row,
                col = geometry.col,
                "widget extends beyond the display; moved inside"
            );
        }
        Ok(Self {
            id: gui.next_widget_id(),
            kind,
            geometry,
            colors,
            active: false,
            visible: true,
            dirty: true,
            greyed: false,
            value: Value::None,
            callback: None,
            owner: Rc::downgrade(&screen),
            has_border: false,
        })
    }

    /// Initial value.
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value.clamped();
        self
    }

    /// Whether the widget takes part in focus navigation.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Change / activation callback.
    #[must_use]
    pub fn with_callback(mut self, callback: Option<Callback>) -> Self {
        self.callback = callback;
        self
    }

    /// Start greyed out.
    #[must_use]
    pub fn with_greyed(mut self, greyed: bool) -> Self {
        self.greyed = greyed;
        self
    }

    /// Identity.
    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// Widget type name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Position and size.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Colors.
    pub fn colors(&self) -> Colors {
        self.colors
    }

    /// Replace the colors; redrawn on the next sweep.
    pub fn set_colors(&mut self, colors: Colors) {
        self.colors = colors;
        self.dirty = true;
    }

    /// Takes part in focus navigation.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Drawn by screen sweeps.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.dirty = true;
        }
    }

    /// Needs a redraw.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Request a redraw on the next sweep.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Drawn in grey and skipped by focus navigation.
    pub fn is_greyed(&self) -> bool {
        self.greyed
    }

    pub(crate) fn set_greyed(&mut self, greyed: bool) -> bool {
        if self.greyed == greyed {
            return false;
        }
        self.greyed = greyed;
        self.dirty = true;
        true
    }

    /// Current value.
    pub fn value(&self) -> Value {
        self.value
    }

    /// Store a value. Returns whether it changed; a change marks the widget
    /// dirty. The callback is fired by the caller once the borrow is gone.
    pub fn set_value(&mut self, value: Value) -> bool {
        let value = value.clamped();
        if value == self.value {
            return false;
        }
        self.value = value;
        self.dirty = true;
        true
    }

    /// Callback, if any.
    pub fn callback(&self) -> Option<Callback> {
        self.callback.clone()
    }

    /// Replace the callback.
    pub fn set_callback(&mut self, callback: Option<Callback>) {
        self.callback = callback;
    }

    /// Screen the widget was built on, while it is alive.
    pub fn owner(&self) -> Option<ScreenRef> {
        self.owner.upgrade()
    }

    /// Active and selected on its owning screen.
    pub fn has_focus(&self) -> bool {
        self.active
            && self
                .owner
                .upgrade()
                .is_some_and(|screen| screen.selected_id() == Some(self.id))
    }

    /// Border and background fill, ahead of the widget's own content.
    pub(crate) fn draw_frame(
        &mut self,
        display: &Display,
        ctx: FocusContext,
    ) -> Result<(), DisplayError> {
        display.use_grey(self.greyed);
        let palette = *display.palette();
        let frame = self.geometry.frame();
        if ctx.focused {
            let color = match ctx.mode {
                InputMode::Precision if ctx.precision_capable => palette.precision,
                InputMode::Adjust | InputMode::Precision if ctx.adjustable => palette.adjust,
                _ => palette.focus,
            };
            display.rect(frame, color)?;
            self.has_border = true;
        } else if let Some(color) = self.colors.border {
            display.rect(frame, color)?;
            self.has_border = true;
        } else if self.has_border {
            display.rect(frame, palette.background)?;
            self.has_border = false;
        }
        if self.visible {
            display.fill_rect(self.geometry.rect(), self.colors.bg)?;
        }
        Ok(())
    }
}

/// Step sizes for hold-to-repeat adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdjustStep {
    /// First step in normal adjust mode.
    pub min_delta: f32,
    /// Upper bound in precision mode (normal mode caps at 4 × `min_delta`).
    pub max_delta: f32,
}

impl Default for AdjustStep {
    fn default() -> Self {
        Self {
            min_delta: 0.01,
            max_delta: 0.1,
        }
    }
}

/// Widgets whose value can be nudged by increase/decrease or the encoder.
pub trait Adjustable {
    /// Step sizes.
    fn step(&self) -> AdjustStep {
        AdjustStep::default()
    }

    /// Apply a signed change. Returns whether the change callback should
    /// fire.
    fn adjust(&mut self, amount: f32) -> bool;

    /// Whether long-press precision mode applies.
    fn precision_capable(&self) -> bool {
        true
    }
}

/// Behaviour of a concrete widget.
pub trait Widget {
    /// Shared state.
    fn base(&self) -> &WidgetBase;

    /// Shared state, mutably.
    fn base_mut(&mut self) -> &mut WidgetBase;

    /// Draw the content. Border and background are already painted.
    fn draw(&mut self, _display: &Display) -> Result<(), DisplayError> {
        Ok(())
    }

    /// Focus arrived.
    fn enter(&mut self) {}

    /// Focus left.
    fn leave(&mut self) {}

    /// Select pressed while focused. Returns whether the callback fires.
    fn select(&mut self) -> bool {
        false
    }

    /// Select released.
    fn unselect(&mut self) {}

    /// Value-adjust capability.
    fn as_adjustable(&mut self) -> Option<&mut dyn Adjustable> {
        None
    }

    /// Attached text label, for widgets that carry one.
    fn label(&self) -> Option<WidgetHandle<Label>> {
        None
    }
}

/// Typed, cheaply cloned handle to a registered widget.
pub struct WidgetHandle<W>(Rc<RefCell<W>>);

impl<W> Clone for WidgetHandle<W> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<W: Widget + 'static> WidgetHandle<W> {
    pub(crate) fn new(widget: W) -> Self {
        Self(Rc::new(RefCell::new(widget)))
    }

    /// Dynamically typed reference, as stored by screens.
    pub fn as_dyn(&self) -> WidgetRef {
        self.0.clone()
    }

    /// Borrow the widget.
    pub fn borrow(&self) -> Ref<'_, W> {
        self.0.borrow()
    }

    /// Borrow the widget mutably.
    pub fn borrow_mut(&self) -> RefMut<'_, W> {
        self.0.borrow_mut()
    }

    /// Identity.
    pub fn id(&self) -> WidgetId {
        self.0.borrow().base().id()
    }

    /// Current value.
    pub fn value(&self) -> Value {
        self.0.borrow().base().value()
    }

    /// Store a value and fire the callback if it changed.
    pub fn set_value(&self, value: Value) -> bool {
        set_value(&self.as_dyn(), value)
    }

    /// Focused on its screen.
    pub fn has_focus(&self) -> bool {
        self.0.borrow().base().has_focus()
    }

    /// Greyed out.
    pub fn greyed_out(&self) -> bool {
        self.0.borrow().base().is_greyed()
    }

    /// Grey out or restore an active widget, redrawing it immediately.
    /// Passive widgets ignore the request.
    pub fn set_greyed_out(&self, greyed: bool) -> Result<(), GuiError> {
        let changed = {
            let mut widget = self.0.borrow_mut();
            let base = widget.base_mut();
            base.is_active() && base.set_greyed(greyed)
        };
        if changed {
            if let Some(gui) = self.gui() {
                gui.show_widget(&self.as_dyn())?;
            }
        }
        Ok(())
    }

    /// Show or hide.
    pub fn set_visible(&self, visible: bool) {
        self.0.borrow_mut().base_mut().set_visible(visible);
    }

    /// Install the change / activation callback.
    pub fn on_change(&self, callback: impl Fn(&WidgetRef) + 'static) {
        self.0
            .borrow_mut()
            .base_mut()
            .set_callback(Some(Rc::new(callback)));
    }

    /// Request a redraw on the next sweep.
    pub fn mark_dirty(&self) {
        self.0.borrow_mut().base_mut().mark_dirty();
    }

    /// Text of the attached label.
    pub fn label_text(&self) -> Result<String, GuiError> {
        label_text(&self.as_dyn())
    }

    /// Replace the text of the attached label.
    pub fn set_label_text(&self, text: &str) -> Result<(), GuiError> {
        set_label_text(&self.as_dyn(), text)
    }

    fn gui(&self) -> Option<Gui> {
        self.0.borrow().base().owner().and_then(|s| s.gui())
    }
}

/// Fire `widget`'s callback, if it has one.
pub fn fire_callback(widget: &WidgetRef) {
    let callback = widget.borrow().base().callback();
    if let Some(callback) = callback {
        callback(widget);
    }
}

/// Store a value on any widget, firing its callback if the value changed.
pub fn set_value(widget: &WidgetRef, value: Value) -> bool {
    let changed = widget.borrow_mut().base_mut().set_value(value);
    if changed {
        fire_callback(widget);
    }
    changed
}

/// Text of a widget's attached label.
pub fn label_text(widget: &WidgetRef) -> Result<String, GuiError> {
    let label = widget.borrow().label().ok_or(GuiError::NoLabel)?;
    let text = label.text();
    Ok(text)
}

/// Replace the text of a widget's attached label.
pub fn set_label_text(widget: &WidgetRef, text: &str) -> Result<(), GuiError> {
    let label = widget.borrow().label().ok_or(GuiError::NoLabel)?;
    label.set_text(text);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_float_values_clamp() {
        assert_eq!(Value::Float(1.5).clamped(), Value::Float(1.0));
        assert_eq!(Value::Float(-0.2).clamped(), Value::Float(0.0));
        assert_eq!(Value::Float(f32::NAN).clamped(), Value::Float(0.0));
        assert_eq!(Value::Int(-3).clamped(), Value::Int(-3));
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Float(0.5).as_f32(), Some(0.5));
        assert_eq!(Value::Int(2).as_i32(), Some(2));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::None.as_f32(), None);
    }

    #[test]
    fn test_geometry_inside_is_untouched() {
        let g = Geometry::new(10, 10, 20, 30);
        assert_eq!(g.clamp_to(Size::new(128, 64)), (g, false));
    }

    #[test]
    fn test_geometry_negative_clamps_to_zero() {
        let (g, moved) = Geometry::new(-5, -1, 10, 10).clamp_to(Size::new(128, 64));
        assert!(moved);
        assert_eq!((g.row, g.col), (0, 0));
    }

    #[test]
    fn test_geometry_past_edge_pulls_back() {
        let (g, moved) = Geometry::new(60, 120, 10, 20).clamp_to(Size::new(128, 64));
        assert!(moved);
        assert_eq!(g.row, 64 - 10 - 1);
        assert_eq!(g.col, 128 - 20 - 1);
    }

    #[test]
    fn test_frame_is_two_pixels_outside() {
        let frame = Geometry::new(10, 20, 5, 6).frame();
        assert_eq!(frame.top_left, Point::new(18, 8));
        assert_eq!(frame.size, Size::new(10, 9));
    }

    #[test]
    fn test_overlap_includes_border() {
        let g = Geometry::new(10, 10, 10, 10);
        let touching_border = Rectangle::new(Point::new(21, 10), Size::new(5, 5));
        let far = Rectangle::new(Point::new(40, 40), Size::new(5, 5));
        assert!(g.overlaps(&touching_border));
        assert!(!g.overlaps(&far));
    }
}
