//! Domain types for type safety and clarity

pub mod domain;
pub mod geometry;

pub use domain::{
    Button, EventResponse, Modifiers, OverlayId, PointerEvent, ScrollDirection, WindowId,
};
pub use geometry::{Dimensions, Position, WindowGeometry};
