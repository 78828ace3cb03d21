use serde::{Deserialize, Serialize};

/// A point in source-frame pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }
}

/// An axis-aligned bounding rectangle in source-frame pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn center(self) -> Point {
        Point::new(
            self.x + i32::try_from(self.width / 2).unwrap_or(0),
            self.y + i32::try_from(self.height / 2).unwrap_or(0),
        )
    }

    #[must_use]
    pub fn area(self) -> f64 {
        f64::from(self.width) * f64::from(self.height)
    }

    /// Width divided by height. A zero height counts as 1 so degenerate
    /// rectangles never divide by zero.
    #[must_use]
    pub fn aspect_ratio(self) -> f64 {
        let height = if self.height == 0 { 1 } else { self.height };
        f64::from(self.width) / f64::from(height)
    }
}
