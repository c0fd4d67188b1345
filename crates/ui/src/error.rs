//! Error type for navigation, widget construction and drawing.

use platform::DisplayError;

/// Errors raised by the UI runtime.
///
/// Navigation errors are raised before anything changes: the current
/// screen, the stack and focus are left exactly as they were.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GuiError {
    /// No screen is current (or being built) to attach to.
    NoCurrentScreen,
    /// A non-splash screen finished construction without an active widget.
    NoActiveWidgets,
    /// STACK or REPLACE was given an existing screen instead of a builder.
    ExpectedScreenBuilder,
    /// BACK was given a builder instead of an existing screen.
    ExpectedScreenInstance,
    /// Forward navigation attempted while a modal window is current.
    ModalForward,
    /// A modal window cannot replace the current screen.
    WindowReplace,
    /// BACK target is not on the navigation stack.
    NotOnStack,
    /// The navigation stack is at capacity.
    StackFull,
    /// Text requested from a widget that has no label.
    NoLabel,
    /// Both per-entry callbacks and a widget callback were supplied.
    DuplicateCallback,
    /// The display rejected a draw or refresh.
    Display(DisplayError),
}

impl From<DisplayError> for GuiError {
    fn from(err: DisplayError) -> Self {
        GuiError::Display(err)
    }
}

impl core::fmt::Display for GuiError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            GuiError::NoCurrentScreen => write!(f, "No current screen"),
            GuiError::NoActiveWidgets => write!(f, "Screen has no active widgets"),
            GuiError::ExpectedScreenBuilder => {
                write!(f, "Forward navigation requires a screen builder")
            }
            GuiError::ExpectedScreenInstance => {
                write!(f, "Back navigation requires an existing screen")
            }
            GuiError::ModalForward => write!(f, "Cannot navigate forward from a modal window"),
            GuiError::WindowReplace => write!(f, "A modal window cannot replace a screen"),
            GuiError::NotOnStack => write!(f, "Screen is not on the navigation stack"),
            GuiError::StackFull => write!(f, "Navigation stack is full"),
            GuiError::NoLabel => write!(f, "Widget has no label"),
            GuiError::DuplicateCallback => {
                write!(f, "Cannot specify a callback together with per-entry callbacks")
            }
            GuiError::Display(e) => write!(f, "{e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GuiError {}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_display_error_converts() {
        let err: GuiError = DisplayError::Busy.into();
        assert_eq!(err, GuiError::Display(DisplayError::Busy));
        assert_eq!(err.to_string(), "Display is busy");
    }

    #[test]
    fn test_messages_are_distinct() {
        assert_ne!(
            GuiError::ExpectedScreenBuilder.to_string(),
            GuiError::ExpectedScreenInstance.to_string()
        );
    }
}
