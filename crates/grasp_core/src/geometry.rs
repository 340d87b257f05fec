//! Points, rects, and the coordinate snapshots interactions carry

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A 2D point (or offset) in pointer coordinate space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length when used as an offset
    pub fn hypot(self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A bounding rectangle in top/left/bottom/right form
///
/// This is the shape rect checkers return. The unit space is the same as
/// pointer coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Rect {
    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Build from an origin and a size
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(y, x, y + height, x + width)
    }

    /// Top-left corner, the origin of a synthetic gesture path
    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// A coordinate snapshot at one tick of an interaction
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Coords {
    /// Page-space position
    pub page: Point,
    /// Viewport-space position
    pub client: Point,
    /// Milliseconds since the scope was created
    pub time_stamp: f64,
}

impl Coords {
    /// Coordinates where page and client space coincide
    pub fn at(point: Point, time_stamp: f64) -> Self {
        Self {
            page: point,
            client: point,
            time_stamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_xywh() {
        let rect = Rect::from_xywh(10.0, 20.0, 100.0, 50.0);
        assert_eq!(rect, Rect::new(20.0, 10.0, 70.0, 110.0));
        assert_eq!(rect.origin(), Point::new(10.0, 20.0));
        assert_eq!(rect.width(), 100.0);
        assert_eq!(rect.height(), 50.0);
    }

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(110.0, -30.0);
        let b = Point::new(10.0, 20.0);
        assert_eq!(a - b, Point::new(100.0, -50.0));
        assert_eq!(b + Point::new(3.0, 4.0), Point::new(13.0, 24.0));
        assert_eq!(Point::new(3.0, 4.0).hypot(), 5.0);
    }
}
