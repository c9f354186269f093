//! Pointer and scroll gesture decoding
//!
//! Pure mapping from raw pointer input to thumbnail actions; the thumbnail
//! decides whether and how to run them.

use crate::common::types::{Button, Modifiers, ScrollDirection};
use crate::constants::thumbnail;

use super::cycle::CycleDirection;

/// What a button release asks the thumbnail to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseAction {
    /// Flip the meaning of the scroll wheel (resize vs. switch source)
    ToggleWheelMode,
    /// Remove the thumbnail
    Dismiss,
    /// Politely ask the source window to close
    CloseSource,
    /// Not ours; let the event propagate
    Ignore,
}

/// What an up/down scroll asks the thumbnail to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollAction {
    /// Signed opacity change
    AdjustOpacity(i16),
    /// Mirror the neighbouring window in tab order
    Cycle(CycleDirection),
    /// Signed scale change
    Resize(f64),
}

/// A press only matters when it completes a primary double click
pub fn is_activation(button: Button, click_count: u8) -> bool {
    button == Button::Primary && click_count == 2
}

pub fn decode_release(button: Button) -> ReleaseAction {
    match button {
        Button::Primary => ReleaseAction::ToggleWheelMode,
        Button::Secondary => ReleaseAction::Dismiss,
        Button::Middle => ReleaseAction::CloseSource,
        Button::Other(_) => ReleaseAction::Ignore,
    }
}

/// Only vertical wheel directions carry actions
pub fn is_actionable(direction: ScrollDirection) -> bool {
    matches!(direction, ScrollDirection::Up | ScrollDirection::Down)
}

/// Decode an up/down scroll. Shift always adjusts opacity; otherwise the wheel
/// cycles windows when exactly one of `reverse_wheel` and ctrl is set, and
/// resizes when both or neither are.
pub fn decode_scroll(
    direction: ScrollDirection,
    modifiers: Modifiers,
    reverse_wheel: bool,
) -> Option<ScrollAction> {
    let up = match direction {
        ScrollDirection::Up => true,
        ScrollDirection::Down => false,
        ScrollDirection::Left | ScrollDirection::Right | ScrollDirection::Smooth => return None,
    };

    let action = if modifiers.shift {
        let step = thumbnail::OPACITY_STEP as i16;
        ScrollAction::AdjustOpacity(if up { step } else { -step })
    } else if reverse_wheel != modifiers.ctrl {
        ScrollAction::Cycle(if up {
            CycleDirection::Previous
        } else {
            CycleDirection::Next
        })
    } else {
        // wheel up shrinks, wheel down grows
        ScrollAction::Resize(if up {
            -thumbnail::SCALE_STEP
        } else {
            thumbnail::SCALE_STEP
        })
    };

    Some(action)
}
