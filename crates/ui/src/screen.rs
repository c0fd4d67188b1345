//! Screens: containers of widgets with focus state and owned tasks.
//!
//! A screen is built from a [`ScreenBuilder`] when navigated to, and lives
//! as long as it is on the navigation stack (or someone holds a
//! [`ScreenRef`]). Modal windows are screens of kind
//! [`ScreenKind::Window`]: they cover a rectangle of their parent and block
//! forward navigation until closed.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::error::GuiError;
use crate::manager::{Gui, GuiInner};
use crate::task::CancelToken;
use crate::widget::{WidgetId, WidgetRef};

/// Shared screen.
pub type ScreenRef = Rc<Screen>;

/// How a navigation request treats the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NavMode {
    /// Return to a screen already on the stack, closing everything above.
    Back,
    /// Push a new screen over the current one.
    Stack,
    /// Swap the current screen for a new one; the new one inherits its parent.
    Replace,
}

/// Focus movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// First eligible widget.
    First,
    /// Next eligible widget, wrapping.
    Next,
    /// Previous eligible widget, wrapping.
    Prev,
    /// Last eligible widget.
    Last,
}

/// When a registered task is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskPolicy {
    /// Whenever the screen stops being current.
    CancelOnLeave,
    /// Only when the screen is closed (popped or replaced).
    CancelOnClose,
}

/// Placement and colors of a modal window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFrame {
    /// Top edge.
    pub row: i32,
    /// Left edge.
    pub col: i32,
    /// Height.
    pub height: u32,
    /// Width.
    pub width: u32,
    /// Draw an outline around the window.
    pub draw_border: bool,
    /// Outline color; `None` uses the palette foreground.
    pub fg: Option<Rgb565>,
    /// Fill color; `None` uses the palette background.
    pub bg: Option<Rgb565>,
}

impl WindowFrame {
    /// Bordered window at `(row, col)` of the given size.
    pub const fn new(row: i32, col: i32, height: u32, width: u32) -> Self {
        Self {
            row,
            col,
            height,
            width,
            draw_border: true,
            fg: None,
            bg: None,
        }
    }

    /// No outline.
    #[must_use]
    pub fn borderless(mut self) -> Self {
        self.draw_border = false;
        self
    }

    /// Outline color.
    #[must_use]
    pub fn fg(mut self, color: Rgb565) -> Self {
        self.fg = Some(color);
        self
    }

    /// Fill color.
    #[must_use]
    pub fn bg(mut self, color: Rgb565) -> Self {
        self.bg = Some(color);
        self
    }

    /// Window rectangle.
    pub fn rect(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.col, self.row),
            Size::new(self.width, self.height),
        )
    }
}

/// Full screen or modal window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    /// Covers the whole display.
    Full,
    /// Modal window over part of its parent.
    Window(WindowFrame),
}

/// Lifecycle hooks of a screen. All optional.
pub trait View {
    /// Before the screen is drawn on becoming current.
    fn on_open(&mut self, _gui: &Gui) {}

    /// After the screen has been drawn.
    fn after_open(&mut self, _gui: &Gui) {}

    /// When the screen stops being current.
    fn on_hide(&mut self, _gui: &Gui) {}
}

impl View for () {}

type BuildFn = Box<dyn FnOnce(&Gui) -> Result<Box<dyn View>, GuiError>>;

/// Recipe for a screen, run when it is navigated to.
///
/// The closure creates the screen's widgets (they register with the screen
/// under construction) and returns its [`View`].
pub struct ScreenBuilder {
    kind: ScreenKind,
    splash: bool,
    build: BuildFn,
}

impl ScreenBuilder {
    /// Full-screen builder.
    pub fn new<V, F>(build: F) -> Self
    where
        V: View + 'static,
        F: FnOnce(&Gui) -> Result<V, GuiError> + 'static,
    {
        Self::with_kind(ScreenKind::Full, build)
    }

    /// Modal window builder.
    pub fn window<V, F>(frame: WindowFrame, build: F) -> Self
    where
        V: View + 'static,
        F: FnOnce(&Gui) -> Result<V, GuiError> + 'static,
    {
        Self::with_kind(ScreenKind::Window(frame), build)
    }

    fn with_kind<V, F>(kind: ScreenKind, build: F) -> Self
    where
        V: View + 'static,
        F: FnOnce(&Gui) -> Result<V, GuiError> + 'static,
    {
        Self {
            kind,
            splash: false,
            build: Box::new(move |gui| build(gui).map(|v| Box::new(v) as Box<dyn View>)),
        }
    }

    /// Allow the screen to have no active widgets.
    #[must_use]
    pub fn splash(mut self) -> Self {
        self.splash = true;
        self
    }

    /// Kind of screen this builds.
    pub fn kind(&self) -> ScreenKind {
        self.kind
    }

    pub(crate) fn into_parts(self) -> (ScreenKind, bool, BuildFn) {
        (self.kind, self.splash, self.build)
    }
}

/// Navigation target: a screen to build, or one that already exists.
pub enum Target {
    /// Build a new screen (STACK, REPLACE).
    Build(ScreenBuilder),
    /// An existing screen (BACK).
    Existing(ScreenRef),
}

impl From<ScreenBuilder> for Target {
    fn from(builder: ScreenBuilder) -> Self {
        Target::Build(builder)
    }
}

impl From<ScreenRef> for Target {
    fn from(screen: ScreenRef) -> Self {
        Target::Existing(screen)
    }
}

impl From<&ScreenRef> for Target {
    fn from(screen: &ScreenRef) -> Self {
        Target::Existing(screen.clone())
    }
}

struct Entry {
    id: WidgetId,
    widget: WidgetRef,
}

#[derive(Default)]
struct FocusState {
    widgets: Vec<WidgetRef>,
    active: Vec<Entry>,
    selected: Option<usize>,
}

/// A screen or modal window.
pub struct Screen {
    id: u32,
    kind: ScreenKind,
    splash: bool,
    parent: Weak<Screen>,
    gui: Weak<GuiInner>,
    focus: RefCell<FocusState>,
    tasks: RefCell<Vec<(CancelToken, TaskPolicy)>>,
    view: RefCell<Option<Box<dyn View>>>,
}

impl Screen {
    pub(crate) fn new(
        id: u32,
        kind: ScreenKind,
        splash: bool,
        parent: Option<&ScreenRef>,
        gui: Weak<GuiInner>,
    ) -> Self {
        Self {
            id,
            kind,
            splash,
            parent: parent.map_or_else(Weak::new, Rc::downgrade),
            gui,
            focus: RefCell::new(FocusState::default()),
            tasks: RefCell::new(Vec::new()),
            view: RefCell::new(None),
        }
    }

    /// Identity, unique within one [`Gui`].
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Full screen or window.
    pub fn kind(&self) -> ScreenKind {
        self.kind
    }

    /// Modal window.
    pub fn is_modal(&self) -> bool {
        matches!(self.kind, ScreenKind::Window(_))
    }

    /// Allowed to have no active widgets.
    pub fn is_splash(&self) -> bool {
        self.splash
    }

    /// Screen this one returns to on [`Gui::back`].
    pub fn parent(&self) -> Option<ScreenRef> {
        self.parent.upgrade()
    }

    /// The runtime the screen belongs to.
    pub fn gui(&self) -> Option<Gui> {
        self.gui.upgrade().map(Gui::from_inner)
    }

    /// Area the screen occupies on a display of `display` size.
    pub fn area(&self, display: Size) -> Rectangle {
        match self.kind {
            ScreenKind::Full => Rectangle::new(Point::zero(), display),
            ScreenKind::Window(frame) => frame.rect(),
        }
    }

    /// Translate a window-relative `(row, col)` to absolute coordinates.
    /// Full screens use absolute coordinates already.
    pub fn locn(&self, row: i32, col: i32) -> (i32, i32) {
        match self.kind {
            ScreenKind::Full => (row, col),
            ScreenKind::Window(frame) => (frame.row + row, frame.col + col),
        }
    }

    /// Every widget, in registration order.
    pub fn widgets(&self) -> Vec<WidgetRef> {
        self.focus.borrow().widgets.clone()
    }

    /// Number of active widgets.
    pub fn active_len(&self) -> usize {
        self.focus.borrow().active.len()
    }

    /// Index of the selected entry in the active list.
    pub fn selected_index(&self) -> Option<usize> {
        self.focus.borrow().selected
    }

    /// Identity of the selected entry.
    pub fn selected_id(&self) -> Option<WidgetId> {
        let focus = self.focus.borrow();
        focus
            .selected
            .and_then(|i| focus.active.get(i))
            .map(|e| e.id)
    }

    /// The focused widget: the selected entry, if visible and not greyed.
    pub fn focused(&self) -> Option<WidgetRef> {
        let index = self.selected_index()?;
        self.eligible(index)
    }

    /// Active widget at `index` if it may hold focus.
    pub(crate) fn eligible(&self, index: usize) -> Option<WidgetRef> {
        let widget = self.focus.borrow().active.get(index)?.widget.clone();
        let ok = widget
            .try_borrow()
            .map(|w| w.base().is_visible() && !w.base().is_greyed())
            .unwrap_or(false);
        ok.then_some(widget)
    }

    pub(crate) fn index_of(&self, id: WidgetId) -> Option<usize> {
        self.focus.borrow().active.iter().position(|e| e.id == id)
    }

    pub(crate) fn set_selected(&self, index: Option<usize>) {
        self.focus.borrow_mut().selected = index;
    }

    /// Append a widget. An active, usable widget takes focus when nothing
    /// usable had it yet.
    pub(crate) fn add_widget(&self, id: WidgetId, widget: WidgetRef, active: bool, usable: bool) {
        let mut focus = self.focus.borrow_mut();
        focus.widgets.push(widget.clone());
        if !active {
            return;
        }
        let none_usable = focus.active.iter().all(|e| {
            e.widget
                .try_borrow()
                .map(|w| w.base().is_greyed())
                .unwrap_or(true)
        });
        focus.active.push(Entry { id, widget });
        if none_usable && usable {
            focus.selected = Some(focus.active.len() - 1);
        }
    }

    /// Tie a task's lifetime to this screen.
    pub fn register_task(&self, token: CancelToken, policy: TaskPolicy) {
        self.tasks.borrow_mut().push((token, policy));
    }

    /// Number of registered (not yet cancelled) tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Cancel leave-scoped tasks, or all of them when `closing`.
    pub(crate) fn cancel_tasks(&self, closing: bool) {
        let mut cancelled = 0usize;
        self.tasks.borrow_mut().retain(|(token, policy)| {
            if closing || *policy == TaskPolicy::CancelOnLeave {
                token.cancel();
                cancelled += 1;
                false
            } else {
                true
            }
        });
        if cancelled > 0 {
            tracing::debug!(screen = self.id, cancelled, closing, "screen tasks cancelled");
        }
    }

    pub(crate) fn set_view(&self, view: Box<dyn View>) {
        *self.view.borrow_mut() = Some(view);
    }

    /// Run a lifecycle hook with the view taken out, so the hook may use
    /// the screen (and navigate) freely.
    pub(crate) fn with_view(&self, gui: &Gui, hook: impl FnOnce(&mut dyn View, &Gui)) {
        let taken = self.view.borrow_mut().take();
        if let Some(mut view) = taken {
            hook(view.as_mut(), gui);
            *self.view.borrow_mut() = Some(view);
        }
    }
}

impl core::fmt::Debug for Screen {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Screen")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("widgets", &self.focus.borrow().widgets.len())
            .field("selected", &self.selected_index())
            .finish()
    }
}
