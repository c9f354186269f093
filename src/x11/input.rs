//! Translation of core pointer events into thumbnail pointer events

use x11rb::protocol::xproto::{ButtonPressEvent, ButtonReleaseEvent, KeyButMask, MotionNotifyEvent};

use crate::common::types::{Button, Modifiers, PointerEvent, Position, ScrollDirection};
use crate::constants::mouse;

pub fn button(detail: u8) -> Button {
    match detail {
        mouse::BUTTON_PRIMARY => Button::Primary,
        mouse::BUTTON_MIDDLE => Button::Middle,
        mouse::BUTTON_SECONDARY => Button::Secondary,
        other => Button::Other(other),
    }
}

/// Core protocol scroll wheels arrive as presses of buttons 4-7
pub fn scroll_direction(detail: u8) -> Option<ScrollDirection> {
    match detail {
        mouse::SCROLL_UP => Some(ScrollDirection::Up),
        mouse::SCROLL_DOWN => Some(ScrollDirection::Down),
        mouse::SCROLL_LEFT => Some(ScrollDirection::Left),
        mouse::SCROLL_RIGHT => Some(ScrollDirection::Right),
        _ => None,
    }
}

pub fn modifiers(state: KeyButMask) -> Modifiers {
    Modifiers {
        shift: state.contains(KeyButMask::SHIFT),
        ctrl: state.contains(KeyButMask::CONTROL),
    }
}

/// Detects multi-clicks: presses of the same button on the same window,
/// close in time and space, raise the count.
#[derive(Debug, Default)]
pub struct ClickCounter {
    last: Option<LastClick>,
}

#[derive(Debug, Clone, Copy)]
struct LastClick {
    window: u32,
    detail: u8,
    time: u32,
    root: Position,
    count: u8,
}

impl ClickCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a press and return its click count (1 for a single click)
    pub fn register(
        &mut self,
        window: u32,
        detail: u8,
        time: u32,
        root: Position,
        interval_ms: u32,
        max_distance: u16,
    ) -> u8 {
        let count = match self.last {
            Some(last)
                if last.window == window
                    && last.detail == detail
                    && time.wrapping_sub(last.time) <= interval_ms
                    && within(last.root, root, max_distance) =>
            {
                last.count.saturating_add(1)
            }
            _ => 1,
        };

        self.last = Some(LastClick {
            window,
            detail,
            time,
            root,
            count,
        });
        count
    }
}

fn within(a: Position, b: Position, max_distance: u16) -> bool {
    let (dx, dy) = a.delta_from(b);
    dx.unsigned_abs() <= max_distance && dy.unsigned_abs() <= max_distance
}

/// Press or scroll, depending on the button
pub fn press_event(event: &ButtonPressEvent, click_count: u8) -> PointerEvent {
    match scroll_direction(event.detail) {
        Some(direction) => PointerEvent::Scroll {
            direction,
            modifiers: modifiers(event.state),
        },
        None => PointerEvent::Press {
            button: button(event.detail),
            click_count,
            root: Position::new(event.root_x, event.root_y),
            time: event.time,
        },
    }
}

/// Releases of wheel buttons carry no meaning and yield None
pub fn release_event(event: &ButtonReleaseEvent) -> Option<PointerEvent> {
    if scroll_direction(event.detail).is_some() {
        return None;
    }
    Some(PointerEvent::Release {
        button: button(event.detail),
        root: Position::new(event.root_x, event.root_y),
        time: event.time,
    })
}

pub fn motion_event(event: &MotionNotifyEvent) -> PointerEvent {
    PointerEvent::Motion {
        root: Position::new(event.root_x, event.root_y),
    }
}
