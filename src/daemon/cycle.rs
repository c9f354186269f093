//! Source window cycling
//!
//! Picks the neighbour of the mirrored window in the windowing system's tab order.
//! Only normal, visible, taskbar-listed windows take part.

use tracing::debug;

use crate::common::types::WindowId;

use super::backend::TabEntry;

/// Direction of a cycling step through the tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Previous,
    Next,
}

impl CycleDirection {
    pub fn step(self) -> isize {
        match self {
            CycleDirection::Previous => -1,
            CycleDirection::Next => 1,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            CycleDirection::Previous => CycleDirection::Next,
            CycleDirection::Next => CycleDirection::Previous,
        }
    }
}

/// Tab order restricted to windows a thumbnail may mirror, order preserved
pub fn switchable_windows(tab_list: &[TabEntry]) -> Vec<WindowId> {
    tab_list
        .iter()
        .filter(|entry| entry.is_switchable())
        .map(|entry| entry.window)
        .collect()
}

/// `index + step` wrapped into `0..len` in both directions
pub fn wrap_index(index: usize, step: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    (index as isize + step).rem_euclid(len as isize) as usize
}

/// Window following `current` in `direction`, or None when `current` is not listed.
/// A single-entry list yields `current` itself.
pub fn neighbour(windows: &[WindowId], current: WindowId, direction: CycleDirection) -> Option<WindowId> {
    let Some(index) = windows.iter().position(|&w| w == current) else {
        debug!(window = %current, "Current source not in tab order, not cycling");
        return None;
    };

    Some(windows[wrap_index(index, direction.step(), windows.len())])
}
