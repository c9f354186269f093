//! Thumbnail dragging
//!
//! A primary press arms the tracker; once the pointer travels past the drag
//! threshold the overlay follows the pointer, and the primary release drops it.
//! A secondary press mid-drag cancels; the releases that belong to the cancelled
//! gesture are swallowed so they do not trigger click actions.

use std::cell::Cell;
use std::rc::Rc;

use crate::common::types::{Button, Position};

/// Process-wide duration of the snap-back animation of cancelled drags (ms).
///
/// Shared by every thumbnail of the process. Writers are not coordinated:
/// overlapping drags of different thumbnails see last-writer-wins.
#[derive(Debug, Clone)]
pub struct SnapBackSetting(Rc<Cell<u32>>);

impl SnapBackSetting {
    pub fn new(millis: u32) -> Self {
        Self(Rc::new(Cell::new(millis)))
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }

    pub fn set(&self, millis: u32) {
        self.0.set(millis);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMotion {
    /// Pointer moved but no drag is in progress
    Ignored,
    /// The overlay should move to this position
    Moved(Position),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragRelease {
    /// Not part of a drag; decode as a click
    Click,
    /// Drag finished at these overlay coordinates
    Dropped(Position),
    /// Release belongs to a cancelled drag
    Swallowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Idle,
    Pending {
        press: Position,
        origin: Position,
    },
    Dragging {
        press: Position,
        origin: Position,
        current: Position,
    },
    Cancelled {
        primary_held: bool,
        canceller_held: Option<Button>,
    },
}

#[derive(Debug, Default)]
pub struct DragTracker {
    state: State,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, State::Dragging { .. })
    }

    /// Primary button went down at `press` while the overlay sat at `origin`
    pub fn press(&mut self, press: Position, origin: Position) {
        if matches!(self.state, State::Idle | State::Pending { .. }) {
            self.state = State::Pending { press, origin };
        }
    }

    pub fn motion(&mut self, root: Position, threshold: u16) -> DragMotion {
        match self.state {
            State::Pending { press, origin } => {
                let (dx, dy) = root.delta_from(press);
                if dx.unsigned_abs().max(dy.unsigned_abs()) < threshold {
                    return DragMotion::Ignored;
                }
                let current = origin.offset(dx, dy);
                self.state = State::Dragging {
                    press,
                    origin,
                    current,
                };
                DragMotion::Moved(current)
            }
            State::Dragging { press, origin, .. } => {
                let (dx, dy) = root.delta_from(press);
                let current = origin.offset(dx, dy);
                self.state = State::Dragging {
                    press,
                    origin,
                    current,
                };
                DragMotion::Moved(current)
            }
            State::Idle | State::Cancelled { .. } => DragMotion::Ignored,
        }
    }

    pub fn release(&mut self, button: Button, root: Position) -> DragRelease {
        match (self.state, button) {
            (State::Dragging { press, origin, .. }, Button::Primary) => {
                let (dx, dy) = root.delta_from(press);
                self.state = State::Idle;
                DragRelease::Dropped(origin.offset(dx, dy))
            }
            (State::Pending { .. }, Button::Primary) => {
                self.state = State::Idle;
                DragRelease::Click
            }
            (
                State::Cancelled {
                    mut primary_held,
                    mut canceller_held,
                },
                released,
            ) => {
                if released == Button::Primary {
                    primary_held = false;
                } else if canceller_held == Some(released) {
                    canceller_held = None;
                } else {
                    return DragRelease::Click;
                }
                self.state = if primary_held || canceller_held.is_some() {
                    State::Cancelled {
                        primary_held,
                        canceller_held,
                    }
                } else {
                    State::Idle
                };
                DragRelease::Swallowed
            }
            _ => DragRelease::Click,
        }
    }

    /// Abort a running drag because `button` was pressed. Returns the last
    /// overlay coordinates of the drag, or None when nothing was being dragged.
    pub fn cancel(&mut self, button: Button) -> Option<Position> {
        let State::Dragging { current, .. } = self.state else {
            return None;
        };
        self.state = State::Cancelled {
            primary_held: true,
            canceller_held: Some(button),
        };
        Some(current)
    }
}
