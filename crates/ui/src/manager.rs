//! The screen manager.
//!
//! [`Gui`] owns the navigation stack, the drawing adapter, the input mode
//! and the refresh lock. It is a cheap `Rc` handle: widgets, callbacks,
//! the input engine and the refresh scheduler all hold clones.
//!
//! Navigation draws the new screen immediately; later widget changes are
//! picked up by the refresh scheduler's sweep of dirty widgets.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::any::Any;
use core::cell::{Cell, RefCell};
use core::future::poll_fn;
use core::task::Poll;

use embassy_futures::yield_now;
use embassy_sync::mutex::Mutex;
use embassy_sync::waitqueue::MultiWakerRegistration;
use embassy_time::Instant;
use embedded_graphics::primitives::Rectangle;
use platform::Canvas;

use crate::config::GuiConfig;
use crate::display::Display;
use crate::error::GuiError;
use crate::input::InputMode;
use crate::navigation::Navigator;
use crate::refresh::RefreshLock;
use crate::screen::{Direction, NavMode, Screen, ScreenBuilder, ScreenKind, ScreenRef, Target, TaskPolicy};
use crate::task::CancelToken;
use crate::widget::{fire_callback, AdjustStep, FocusContext, Widget, WidgetHandle, WidgetId, WidgetRef};

/// Tasks that may wait on shutdown at the same time.
const SHUTDOWN_WAITERS: usize = 4;

pub(crate) struct GuiInner {
    display: Display,
    config: GuiConfig,
    nav: RefCell<Navigator>,
    building: RefCell<Option<ScreenRef>>,
    mode: Cell<InputMode>,
    precision_return: Cell<InputMode>,
    refresh_lock: RefreshLock,
    shutdown_waiters: RefCell<MultiWakerRegistration<SHUTDOWN_WAITERS>>,
    shut_down: Cell<bool>,
    full_redraw: Cell<bool>,
    settle: Cell<bool>,
    next_widget: Cell<u32>,
    next_screen: Cell<u32>,
    window_value: RefCell<Option<Box<dyn Any>>>,
}

/// Screen manager handle.
#[derive(Clone)]
pub struct Gui(Rc<GuiInner>);

impl Gui {
    /// Runtime drawing into `panel`.
    pub fn new<D: Canvas + 'static>(panel: &Rc<RefCell<D>>, config: GuiConfig) -> Self {
        let canvas: Rc<RefCell<dyn Canvas>> = panel.clone();
        Self::with_canvas(canvas, config)
    }

    /// Runtime drawing into an already type-erased canvas.
    pub fn with_canvas(canvas: Rc<RefCell<dyn Canvas>>, config: GuiConfig) -> Self {
        Self(Rc::new(GuiInner {
            display: Display::new(canvas, config.palette),
            config,
            nav: RefCell::new(Navigator::new()),
            building: RefCell::new(None),
            mode: Cell::new(InputMode::Normal),
            precision_return: Cell::new(InputMode::Normal),
            refresh_lock: Mutex::new(()),
            shutdown_waiters: RefCell::new(MultiWakerRegistration::new()),
            shut_down: Cell::new(false),
            full_redraw: Cell::new(false),
            settle: Cell::new(false),
            next_widget: Cell::new(0),
            next_screen: Cell::new(0),
            window_value: RefCell::new(None),
        }))
    }

    pub(crate) fn from_inner(inner: Rc<GuiInner>) -> Self {
        Self(inner)
    }

    /// Configuration.
    pub fn config(&self) -> &GuiConfig {
        &self.0.config
    }

    /// Drawing adapter.
    pub fn display(&self) -> &Display {
        &self.0.display
    }

    /// Lock serialising physical refreshes. Hold it to keep the panel from
    /// being refreshed while the framebuffer is mid-update.
    pub fn refresh_lock(&self) -> &RefreshLock {
        &self.0.refresh_lock
    }

    // ── Screens ──────────────────────────────────────────────────────────

    /// Screen at the top of the stack.
    pub fn current_screen(&self) -> Option<ScreenRef> {
        self.0.nav.borrow().current()
    }

    /// Number of stacked screens.
    pub fn depth(&self) -> usize {
        self.0.nav.borrow().depth()
    }

    /// Screen new widgets attach to: the one being built, else the current.
    pub fn target_screen(&self) -> Option<ScreenRef> {
        let building = self.0.building.borrow().clone();
        building.or_else(|| self.current_screen())
    }

    fn is_current(&self, screen: &ScreenRef) -> bool {
        self.current_screen()
            .is_some_and(|current| Rc::ptr_eq(&current, screen))
    }

    /// Navigate. STACK and REPLACE take a [`ScreenBuilder`], BACK takes a
    /// screen already on the stack.
    ///
    /// Every error is raised before any state changes.
    pub fn navigate(&self, target: impl Into<Target>, mode: NavMode) -> Result<(), GuiError> {
        match (mode, target.into()) {
            (NavMode::Back, Target::Existing(screen)) => self.backward(&screen),
            (NavMode::Back, Target::Build(_)) => Err(GuiError::ExpectedScreenInstance),
            (NavMode::Stack | NavMode::Replace, Target::Existing(_)) => {
                Err(GuiError::ExpectedScreenBuilder)
            }
            (NavMode::Stack, Target::Build(builder)) => self.forward(builder, false),
            (NavMode::Replace, Target::Build(builder)) => self.forward(builder, true),
        }
    }

    /// Push a new screen (STACK).
    pub fn open(&self, builder: ScreenBuilder) -> Result<(), GuiError> {
        self.forward(builder, false)
    }

    /// Swap the current screen for a new one (REPLACE). The replaced screen
    /// is closed, so all of its tasks are cancelled, CancelOnClose included.
    pub fn replace(&self, builder: ScreenBuilder) -> Result<(), GuiError> {
        self.forward(builder, true)
    }

    /// Return to the current screen's parent. At the root this requests
    /// shutdown.
    pub fn back(&self) -> Result<(), GuiError> {
        let current = self.current_screen().ok_or(GuiError::NoCurrentScreen)?;
        match current.parent() {
            Some(parent) if self.0.nav.borrow().contains(&parent) => self.backward(&parent),
            _ => {
                self.shutdown();
                Ok(())
            }
        }
    }

    fn forward(&self, builder: ScreenBuilder, replace: bool) -> Result<(), GuiError> {
        let old = self.current_screen();
        if old.as_ref().is_some_and(|s| s.is_modal()) {
            return Err(GuiError::ModalForward);
        }
        let (kind, splash, build) = builder.into_parts();
        if replace && matches!(kind, ScreenKind::Window(_)) {
            return Err(GuiError::WindowReplace);
        }
        if !replace && self.0.nav.borrow().is_full() {
            return Err(GuiError::StackFull);
        }

        let parent = if replace {
            old.as_ref().and_then(|s| s.parent())
        } else {
            old.clone()
        };
        let screen = Rc::new(Screen::new(
            self.next_screen_id(),
            kind,
            splash,
            parent.as_ref(),
            Rc::downgrade(&self.0),
        ));

        let outer = self.0.building.replace(Some(screen.clone()));
        let built = build(self);
        *self.0.building.borrow_mut() = outer;
        let view = built?;
        if !splash && screen.active_len() == 0 {
            return Err(GuiError::NoActiveWidgets);
        }
        screen.set_view(view);

        if let Some(old) = &old {
            self.leave(old, replace);
        }
        {
            let mut nav = self.0.nav.borrow_mut();
            if replace {
                nav.replace(screen.clone())?;
            } else {
                nav.push(screen.clone())?;
            }
            tracing::debug!(
                screen = screen.id(),
                depth = nav.depth(),
                replace,
                "screen opened"
            );
        }
        self.open_screen(&screen, old.as_ref())
    }

    fn backward(&self, target: &ScreenRef) -> Result<(), GuiError> {
        let old = self.current_screen().ok_or(GuiError::NoCurrentScreen)?;
        if Rc::ptr_eq(&old, target) {
            return Ok(());
        }
        if !self.0.nav.borrow().contains(target) {
            return Err(GuiError::NotOnStack);
        }
        self.leave(&old, true);
        let popped = self.0.nav.borrow_mut().pop_to(target)?;
        for screen in popped.iter().filter(|s| !Rc::ptr_eq(s, &old)) {
            screen.cancel_tasks(true);
        }
        tracing::debug!(screen = target.id(), closed = popped.len(), "returned to screen");
        self.open_screen(target, Some(&old))
    }

    fn leave(&self, screen: &ScreenRef, closing: bool) {
        screen.cancel_tasks(closing);
        screen.with_view(self, |view, gui| view.on_hide(gui));
    }

    fn open_screen(&self, screen: &ScreenRef, previous: Option<&ScreenRef>) -> Result<(), GuiError> {
        self.0.settle.set(true);
        self.0.display.use_grey(false);
        self.cancel_precision();
        screen.with_view(self, |view, gui| view.on_open(gui));
        if !self.is_current(screen) {
            // on_open navigated elsewhere.
            return Ok(());
        }
        self.draw_opened(screen, previous)?;
        screen.with_view(self, |view, gui| view.after_open(gui));
        Ok(())
    }

    fn draw_opened(&self, screen: &ScreenRef, previous: Option<&ScreenRef>) -> Result<(), GuiError> {
        let display = &self.0.display;
        let palette = *display.palette();
        match screen.kind() {
            ScreenKind::Window(frame) => {
                display.fill_rect(frame.rect(), frame.bg.unwrap_or(palette.background))?;
                if frame.draw_border {
                    display.rect(frame.rect(), frame.fg.unwrap_or(palette.foreground))?;
                }
                self.redraw(screen, true)
            }
            ScreenKind::Full => {
                let closed_window = previous.and_then(|prev| match prev.kind() {
                    ScreenKind::Window(frame)
                        if prev.parent().is_some_and(|p| Rc::ptr_eq(&p, screen)) =>
                    {
                        Some(frame.rect())
                    }
                    _ => None,
                });
                match closed_window {
                    Some(area) => self.repair(screen, area),
                    None => {
                        display.clear()?;
                        self.redraw(screen, true)
                    }
                }
            }
        }
    }

    /// Blank `area` and redraw the widgets it touched.
    fn repair(&self, screen: &ScreenRef, area: Rectangle) -> Result<(), GuiError> {
        self.0
            .display
            .fill_rect(area, self.0.display.palette().background)?;
        for widget in screen.widgets() {
            let hit = widget
                .try_borrow()
                .map(|w| w.base().is_visible() && w.base().geometry().overlaps(&area))
                .unwrap_or(false);
            if hit {
                self.show_widget(&widget)?;
            }
        }
        Ok(())
    }

    fn redraw(&self, screen: &ScreenRef, force: bool) -> Result<(), GuiError> {
        for widget in screen.widgets() {
            let needed = widget
                .try_borrow()
                .map(|w| w.base().is_dirty() || (force && w.base().is_visible()))
                .unwrap_or(false);
            if needed {
                self.show_widget(&widget)?;
            }
        }
        Ok(())
    }

    /// Draw every dirty widget of the current screen (all of them after
    /// [`request_full_redraw`](Self::request_full_redraw)).
    pub(crate) fn sweep(&self) -> Result<(), GuiError> {
        let force = self.0.full_redraw.take();
        match self.current_screen() {
            Some(screen) => self.redraw(&screen, force),
            None => Ok(()),
        }
    }

    /// Redraw every widget on the next refresh.
    pub fn request_full_redraw(&self) {
        self.0.full_redraw.set(true);
    }

    pub(crate) fn take_settle(&self) -> bool {
        self.0.settle.replace(false)
    }

    /// Draw one widget: border, background, content.
    ///
    /// Widgets not on the current screen (and widgets already borrowed
    /// further up the call stack) are skipped; returns whether it drew.
    pub(crate) fn show_widget(&self, widget: &WidgetRef) -> Result<bool, GuiError> {
        let Ok(mut w) = widget.try_borrow_mut() else {
            return Ok(false);
        };
        let Some(owner) = w.base().owner() else {
            return Ok(false);
        };
        if !self.is_current(&owner) {
            return Ok(false);
        }
        let display = &self.0.display;
        let result = if w.base().is_visible() {
            let (adjustable, precision_capable) = match w.as_adjustable() {
                Some(a) => (true, a.precision_capable()),
                None => (false, false),
            };
            let ctx = FocusContext {
                focused: w.base().has_focus(),
                mode: self.mode(),
                adjustable,
                precision_capable,
            };
            w.base_mut()
                .draw_frame(display, ctx)
                .and_then(|()| w.draw(display))
        } else {
            display.fill_rect(w.base().geometry().frame(), display.palette().background)
        };
        display.use_grey(false);
        result?;
        w.base_mut().clear_dirty();
        Ok(true)
    }

    // ── Widgets ──────────────────────────────────────────────────────────

    pub(crate) fn next_widget_id(&self) -> WidgetId {
        let id = self.0.next_widget.get();
        self.0.next_widget.set(id.wrapping_add(1));
        WidgetId(id)
    }

    fn next_screen_id(&self) -> u32 {
        let id = self.0.next_screen.get();
        self.0.next_screen.set(id.wrapping_add(1));
        id
    }

    /// Register a constructed widget with its screen and return its handle.
    pub fn register<W: Widget + 'static>(&self, widget: W) -> Result<WidgetHandle<W>, GuiError> {
        let handle = WidgetHandle::new(widget);
        self.add_widget(handle.as_dyn())?;
        Ok(handle)
    }

    /// Append a widget to the screen it was built for. The first usable
    /// active widget of a screen takes focus.
    pub fn add_widget(&self, widget: WidgetRef) -> Result<(), GuiError> {
        let (owner, id, active, usable) = {
            let w = widget.borrow();
            let base = w.base();
            (base.owner(), base.id(), base.is_active(), !base.is_greyed())
        };
        let screen = owner.ok_or(GuiError::NoCurrentScreen)?;
        screen.add_widget(id, widget, active, usable);
        Ok(())
    }

    // ── Focus ────────────────────────────────────────────────────────────

    /// Focused widget of the current screen.
    pub fn focused(&self) -> Option<WidgetRef> {
        self.current_screen().and_then(|s| s.focused())
    }

    /// Move focus among the current screen's eligible active widgets.
    pub fn move_focus(&self, direction: Direction) -> Result<(), GuiError> {
        let Some(screen) = self.current_screen() else {
            return Ok(());
        };
        let len = screen.active_len();
        if len == 0 {
            return Ok(());
        }
        let (start, forward) = match direction {
            Direction::First => (None, true),
            Direction::Last => (None, false),
            Direction::Next => (screen.selected_index(), true),
            Direction::Prev => (screen.selected_index(), false),
        };
        let previous = screen.focused();
        for offset in 1..=len {
            let index = step_index(start, offset, len, forward);
            if let Some(candidate) = screen.eligible(index) {
                return self.transfer_focus(&screen, index, previous, &candidate);
            }
        }
        Ok(())
    }

    /// Focus a specific widget. Returns `false` if it is not an eligible
    /// active widget of the current screen.
    pub fn move_to(&self, widget: &WidgetRef) -> Result<bool, GuiError> {
        let Some(screen) = self.current_screen() else {
            return Ok(false);
        };
        let Ok(id) = widget.try_borrow().map(|w| w.base().id()) else {
            return Ok(false);
        };
        let Some(index) = screen.index_of(id) else {
            return Ok(false);
        };
        let Some(candidate) = screen.eligible(index) else {
            return Ok(false);
        };
        let previous = screen.focused();
        self.transfer_focus(&screen, index, previous, &candidate)?;
        Ok(true)
    }

    fn transfer_focus(
        &self,
        screen: &ScreenRef,
        index: usize,
        previous: Option<WidgetRef>,
        next: &WidgetRef,
    ) -> Result<(), GuiError> {
        if previous.is_some() && screen.selected_index() == Some(index) {
            return Ok(());
        }
        self.cancel_precision();
        screen.set_selected(Some(index));
        if let Some(previous) = previous {
            if let Ok(mut w) = previous.try_borrow_mut() {
                w.leave();
            }
            self.show_widget(&previous)?;
        }
        if let Ok(mut w) = next.try_borrow_mut() {
            w.enter();
        }
        self.show_widget(next)?;
        Ok(())
    }

    fn is_focused(&self, widget: &WidgetRef) -> bool {
        let Ok(id) = widget.try_borrow().map(|w| w.base().id()) else {
            return false;
        };
        self.current_screen()
            .is_some_and(|s| s.focused().is_some() && s.selected_id() == Some(id))
    }

    fn mark_focused_dirty(&self) {
        if let Some(widget) = self.focused() {
            if let Ok(mut w) = widget.try_borrow_mut() {
                w.base_mut().mark_dirty();
            }
        }
    }

    // ── Operations forwarded to the focused widget ──────────────────────

    /// Select pressed. With nothing focused, focus moves to the first
    /// eligible widget instead.
    pub fn select(&self) -> Result<(), GuiError> {
        if self.current_screen().is_none() {
            return Ok(());
        }
        match self.focused() {
            Some(widget) => {
                let fire = widget.try_borrow_mut().map(|mut w| w.select()).unwrap_or(false);
                if fire {
                    fire_callback(&widget);
                }
                Ok(())
            }
            None => self.move_focus(Direction::First),
        }
    }

    /// Select released.
    pub fn unselect(&self) {
        if let Some(widget) = self.focused() {
            if let Ok(mut w) = widget.try_borrow_mut() {
                w.unselect();
            }
        }
    }

    /// Adjust the focused widget by `delta` steps.
    ///
    /// With `held`, this is a button press: one step now, then while
    /// `held()` stays true the step doubles every hold-acceleration period
    /// (capped) and is applied again. Without it (encoder), `delta` steps
    /// are applied once. With nothing focused, or a focused widget that
    /// cannot be adjusted, focus moves to the first (positive) or last
    /// (negative) eligible widget.
    pub async fn adjust(&self, delta: i32, held: Option<&dyn Fn() -> bool>) -> Result<(), GuiError> {
        if delta == 0 || self.current_screen().is_none() {
            return Ok(());
        }
        let fallback = if delta > 0 { Direction::First } else { Direction::Last };
        let Some(widget) = self.focused() else {
            return self.move_focus(fallback);
        };
        let Some(step) = adjust_step(&widget) else {
            return self.move_focus(fallback);
        };

        let (mut amount, max) = if self.mode() == InputMode::Precision {
            (step.min_delta * 0.1, step.max_delta)
        } else {
            (step.min_delta, step.min_delta * 4.0)
        };
        let sign = if delta > 0 { 1.0 } else { -1.0 };

        let Some(held) = held else {
            #[allow(clippy::cast_precision_loss)]
            let steps = delta as f32;
            self.nudge(&widget, steps * amount);
            return Ok(());
        };

        self.nudge(&widget, sign * amount);
        let accel = self.0.config.timing.hold_accel;
        let mut since = Instant::now();
        while held() && self.is_focused(&widget) {
            yield_now().await;
            if since.elapsed() >= accel {
                amount = (amount * 2.0).min(max);
                self.nudge(&widget, sign * amount);
                since = Instant::now();
            }
        }
        Ok(())
    }

    fn nudge(&self, widget: &WidgetRef, amount: f32) {
        let fire = widget
            .try_borrow_mut()
            .ok()
            .and_then(|mut w| w.as_adjustable().map(|a| a.adjust(amount)))
            .unwrap_or(false);
        if fire {
            fire_callback(widget);
        }
    }

    // ── Input mode ───────────────────────────────────────────────────────

    /// Current input mode.
    pub fn mode(&self) -> InputMode {
        self.0.mode.get()
    }

    /// Switch mode; the focused widget's border follows on the next sweep.
    pub fn set_mode(&self, mode: InputMode) {
        let old = self.0.mode.replace(mode);
        if old != mode {
            tracing::debug!(?old, ?mode, "input mode changed");
            self.mark_focused_dirty();
        }
    }

    /// NORMAL ⇄ ADJUST. Precision counts as adjusting and returns to NORMAL.
    pub fn toggle_adjust_mode(&self) {
        match self.mode() {
            InputMode::Normal => self.set_mode(InputMode::Adjust),
            InputMode::Adjust | InputMode::Precision => self.set_mode(InputMode::Normal),
        }
    }

    /// Enter precision mode on a focused precision-capable widget.
    /// Returns whether the mode changed.
    pub fn enter_precision(&self) -> bool {
        let mode = self.mode();
        if mode == InputMode::Precision {
            return false;
        }
        let capable = self
            .focused()
            .is_some_and(|w| precision_capable(&w));
        if !capable {
            return false;
        }
        self.0.precision_return.set(mode);
        self.set_mode(InputMode::Precision);
        true
    }

    /// Leave precision mode, back to the mode it was entered from.
    /// Returns whether the mode changed.
    pub fn cancel_precision(&self) -> bool {
        if self.mode() != InputMode::Precision {
            return false;
        }
        self.set_mode(self.0.precision_return.get());
        true
    }

    // ── Tasks, window values, shutdown ──────────────────────────────────

    /// Tie a task to the screen being built (or the current screen).
    pub fn register_task(&self, token: CancelToken, policy: TaskPolicy) -> Result<(), GuiError> {
        let screen = self.target_screen().ok_or(GuiError::NoCurrentScreen)?;
        screen.register_task(token, policy);
        Ok(())
    }

    /// Store the result of a modal dialog for the screen below to read.
    pub fn set_window_value<T: Any>(&self, value: T) {
        *self.0.window_value.borrow_mut() = Some(Box::new(value));
    }

    /// Last stored dialog result, if it has type `T`.
    pub fn window_value<T: Any + Clone>(&self) -> Option<T> {
        self.0
            .window_value
            .borrow()
            .as_ref()
            .and_then(|v| (**v).downcast_ref::<T>())
            .cloned()
    }

    /// Forget the stored dialog result.
    pub fn clear_window_value(&self) {
        self.0.window_value.borrow_mut().take();
    }

    /// Request shutdown. The refresh scheduler's
    /// [`monitor`](crate::refresh::RefreshScheduler::monitor) performs it.
    pub fn shutdown(&self) {
        if !self.0.shut_down.replace(true) {
            tracing::debug!("shutdown requested");
            self.0.shutdown_waiters.borrow_mut().wake();
        }
    }

    /// Shutdown has been requested.
    pub fn is_shut_down(&self) -> bool {
        self.0.shut_down.get()
    }

    /// Resolves once shutdown has been requested.
    pub async fn wait_shutdown(&self) {
        poll_fn(|cx| {
            if self.is_shut_down() {
                return Poll::Ready(());
            }
            self.0.shutdown_waiters.borrow_mut().register(cx.waker());
            Poll::Pending
        })
        .await;
    }

    /// Cancel every task of every stacked screen and empty the stack.
    pub(crate) fn teardown(&self) {
        let popped = self.0.nav.borrow_mut().clear();
        for screen in &popped {
            screen.cancel_tasks(true);
        }
        self.0.building.borrow_mut().take();
        self.0.mode.set(InputMode::Normal);
        tracing::debug!(closed = popped.len(), "screens torn down");
    }
}

fn step_index(start: Option<usize>, offset: usize, len: usize, forward: bool) -> usize {
    match (start, forward) {
        (Some(s), true) => (s + offset) % len,
        (None, true) => (offset - 1) % len,
        (Some(s), false) => (s + len - offset % len) % len,
        (None, false) => len - offset,
    }
}

fn adjust_step(widget: &WidgetRef) -> Option<AdjustStep> {
    let mut w = widget.try_borrow_mut().ok()?;
    w.as_adjustable().map(|a| a.step())
}

fn precision_capable(widget: &WidgetRef) -> bool {
    let Ok(mut w) = widget.try_borrow_mut() else {
        return false;
    };
    w.as_adjustable().is_some_and(|a| a.precision_capable())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::step_index;

    #[test]
    fn test_step_index_forward_wraps() {
        let seq: alloc::vec::Vec<usize> = (1..=4).map(|o| step_index(Some(2), o, 4, true)).collect();
        assert_eq!(seq, [3, 0, 1, 2]);
    }

    #[test]
    fn test_step_index_backward_wraps() {
        let seq: alloc::vec::Vec<usize> = (1..=4).map(|o| step_index(Some(1), o, 4, false)).collect();
        assert_eq!(seq, [0, 3, 2, 1]);
    }

    #[test]
    fn test_step_index_first_and_last() {
        let first: alloc::vec::Vec<usize> = (1..=3).map(|o| step_index(None, o, 3, true)).collect();
        let last: alloc::vec::Vec<usize> = (1..=3).map(|o| step_index(None, o, 3, false)).collect();
        assert_eq!(first, [0, 1, 2]);
        assert_eq!(last, [2, 1, 0]);
    }
}
