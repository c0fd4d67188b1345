//! Navigation stack: a bounded stack of [`ScreenRef`]s.
//!
//! The stack is capped at [`MAX_SCREEN_DEPTH`] entries (embedded-safe, no
//! heap for the stack itself). Pushing onto a full stack is an error the
//! caller reports; nothing is dropped silently.

use heapless::Vec;

use crate::config::MAX_SCREEN_DEPTH;
use crate::error::GuiError;
use crate::screen::ScreenRef;

/// Screens popped by one navigation, topmost first.
pub type Popped = Vec<ScreenRef, MAX_SCREEN_DEPTH>;

/// Navigation stack bounded at [`MAX_SCREEN_DEPTH`] entries.
#[derive(Debug, Default)]
pub struct Navigator {
    stack: Vec<ScreenRef, MAX_SCREEN_DEPTH>,
}

impl Navigator {
    /// Create an empty navigator.
    pub fn new() -> Self {
        Navigator { stack: Vec::new() }
    }

    /// Screen at the top of the stack.
    #[must_use]
    pub fn current(&self) -> Option<ScreenRef> {
        self.stack.last().cloned()
    }

    /// Push a new screen.
    pub fn push(&mut self, screen: ScreenRef) -> Result<(), GuiError> {
        self.stack.push(screen).map_err(|_| GuiError::StackFull)
    }

    /// Replace the top screen without growing the stack. On an empty stack
    /// this is a push.
    pub fn replace(&mut self, screen: ScreenRef) -> Result<Option<ScreenRef>, GuiError> {
        match self.stack.last_mut() {
            Some(top) => Ok(Some(core::mem::replace(top, screen))),
            None => self.push(screen).map(|()| None),
        }
    }

    /// Pop everything above `target`, which becomes the top.
    pub fn pop_to(&mut self, target: &ScreenRef) -> Result<Popped, GuiError> {
        if !self.contains(target) {
            return Err(GuiError::NotOnStack);
        }
        let mut popped = Popped::new();
        while let Some(top) = self.stack.last() {
            if ScreenRef::ptr_eq(top, target) {
                break;
            }
            if let Some(screen) = self.stack.pop() {
                // Capacities match, so this never overflows.
                let _ = popped.push(screen);
            }
        }
        Ok(popped)
    }

    /// Empty the stack, topmost first.
    pub fn clear(&mut self) -> Popped {
        let mut popped = Popped::new();
        while let Some(screen) = self.stack.pop() {
            let _ = popped.push(screen);
        }
        popped
    }

    /// Whether `screen` is on the stack.
    pub fn contains(&self, screen: &ScreenRef) -> bool {
        self.stack.iter().any(|s| ScreenRef::ptr_eq(s, screen))
    }

    /// Every stacked screen, bottom first.
    pub fn iter(&self) -> impl Iterator<Item = &ScreenRef> {
        self.stack.iter()
    }

    /// Return the number of entries currently on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// No room for another push.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.stack.is_full()
    }
}
