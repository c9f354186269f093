//! Geometric types for X11 coordinates and dimensions
//!
//! Provides type-safe wrappers for positions and sizes to avoid
//! common integer confusion (e.g., swapping width/height or x/y).

use serde::{Deserialize, Serialize};

/// A position in 2D space (X11 root coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

impl Position {
    /// Create a new position
    pub fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Position shifted by the given deltas, saturating at the i16 bounds
    pub fn offset(self, dx: i16, dy: i16) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Component-wise difference `self - other`
    pub fn delta_from(self, other: Position) -> (i16, i16) {
        (
            self.x.saturating_sub(other.x),
            self.y.saturating_sub(other.y),
        )
    }
}

impl From<(i16, i16)> for Position {
    fn from(tuple: (i16, i16)) -> Self {
        Self::new(tuple.0, tuple.1)
    }
}

/// Width × height of a window or thumbnail
/// Using a newtype prevents accidentally swapping width and height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
}

impl Dimensions {
    /// Create new dimensions
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Dimensions multiplied by `scale`, rounded, never below 1×1
    pub fn scaled(self, scale: f64) -> Self {
        let apply = |v: u16| ((v as f64 * scale).round() as u16).max(1);
        Self {
            width: apply(self.width),
            height: apply(self.height),
        }
    }
}

/// Root-relative placement and native size of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowGeometry {
    pub position: Position,
    pub dimensions: Dimensions,
}

impl WindowGeometry {
    pub fn new(x: i16, y: i16, width: u16, height: u16) -> Self {
        Self {
            position: Position::new(x, y),
            dimensions: Dimensions::new(width, height),
        }
    }
}
