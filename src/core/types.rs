//! Basic geometric types shared by the flip engine.

use std::ops::{Add, Mul, Sub};

use bitflags::bitflags;

use crate::core::error::{FlipError, FlipResult};

/// A 2D point (or vector) in device-independent units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, other: Point) -> f32 {
        (*self - other).length()
    }

    pub fn dot(&self, other: Point) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Linear interpolation, `t = 0` gives `self`.
    pub fn lerp(&self, other: Point, t: f32) -> Point {
        *self + (other - *self) * t
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(&self) -> Option<Point> {
        let len = self.length();
        if len <= f32::EPSILON || !len.is_finite() {
            None
        } else {
            Some(Point::new(self.x / len, self.y / len))
        }
    }

    /// Counter-clockwise perpendicular (in y-down screen space it points clockwise).
    pub fn perpendicular(&self) -> Point {
        Point::new(-self.y, self.x)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
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

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// A line segment.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    pub fn midpoint(&self) -> Point {
        self.start.lerp(self.end, 0.5)
    }

    /// Unit normal of the segment, `None` when the segment has no length.
    pub fn normal(&self) -> Option<Point> {
        (self.end - self.start).normalized().map(|d| d.perpendicular())
    }

    /// Signed distance of `p` from the infinite line through the segment,
    /// positive on the side [`Segment::normal`] points to.
    pub fn signed_distance(&self, p: Point) -> Option<f32> {
        self.normal().map(|n| (p - self.start).dot(n))
    }

    pub fn translated(&self, offset: Point) -> Segment {
        Segment::new(self.start + offset, self.end + offset)
    }
}

/// A simple polygon given by its vertices in order.
///
/// Shapes produced by the solver are convex. A polygon with fewer than three
/// vertices is degenerate and has nothing to draw.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn from_rect(width: f32, height: f32) -> Self {
        Self::new(vec![
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        ])
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the polygon encloses no area worth drawing.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3 || self.area() <= 1e-3
    }

    /// Unsigned area (shoelace formula).
    pub fn area(&self) -> f32 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            twice += a.x * b.y - b.x * a.y;
        }
        (twice * 0.5).abs()
    }

    /// Vertex average. Good enough for side tests on convex shapes.
    pub fn centroid(&self) -> Option<Point> {
        if self.points.is_empty() {
            return None;
        }
        let sum = self.points.iter().fold(Point::ZERO, |acc, p| acc + *p);
        Some(sum * (1.0 / self.points.len() as f32))
    }

    pub fn map(&self, f: impl Fn(Point) -> Point) -> Polygon {
        Polygon::new(self.points.iter().map(|p| f(*p)).collect())
    }

    pub fn translated(&self, offset: Point) -> Polygon {
        self.map(|p| p + offset)
    }
}

/// Size of a single page. Both sides are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    width: f32,
    height: f32,
}

impl PageRect {
    pub fn new(width: f32, height: f32) -> FlipResult<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(FlipError::InvalidPageRect { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn diagonal(&self) -> f32 {
        (self.width * self.width + self.height * self.height).sqrt()
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width && p.y <= self.height
    }

    pub fn to_polygon(&self) -> Polygon {
        Polygon::from_rect(self.width, self.height)
    }
}

/// Page corner a fold originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn is_left(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::BottomLeft)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }

    /// Position of the corner in page-local coordinates.
    pub fn position(&self, rect: PageRect) -> Point {
        let x = if self.is_left() { 0.0 } else { rect.width() };
        let y = if self.is_top() { 0.0 } else { rect.height() };
        Point::new(x, y)
    }

    /// Same vertical edge, given horizontal side.
    pub fn with_side(&self, left: bool) -> Corner {
        match (left, self.is_top()) {
            (true, true) => Corner::TopLeft,
            (true, false) => Corner::BottomLeft,
            (false, true) => Corner::TopRight,
            (false, false) => Corner::BottomRight,
        }
    }

    pub fn as_flag(&self) -> Corners {
        match self {
            Corner::TopLeft => Corners::TOP_LEFT,
            Corner::TopRight => Corners::TOP_RIGHT,
            Corner::BottomLeft => Corners::BOTTOM_LEFT,
            Corner::BottomRight => Corners::BOTTOM_RIGHT,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "top-left" | "tl" => Some(Self::TopLeft),
            "top-right" | "tr" | "top" => Some(Self::TopRight),
            "bottom-left" | "bl" => Some(Self::BottomLeft),
            "bottom-right" | "br" | "bottom" => Some(Self::BottomRight),
            _ => None,
        }
    }
}

bitflags! {
    /// Set of corners, used for hit testing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Corners: u8 {
        const TOP_LEFT = 0b0001;
        const TOP_RIGHT = 0b0010;
        const BOTTOM_LEFT = 0b0100;
        const BOTTOM_RIGHT = 0b1000;

        const LEFT = Self::TOP_LEFT.bits() | Self::BOTTOM_LEFT.bits();
        const RIGHT = Self::TOP_RIGHT.bits() | Self::BOTTOM_RIGHT.bits();
    }
}

impl Corners {
    /// Iterate the individual corners contained in the set.
    pub fn corners(&self) -> impl Iterator<Item = Corner> + '_ {
        Corner::ALL
            .into_iter()
            .filter(move |c| self.contains(c.as_flag()))
    }
}

/// Which way a flip moves through the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    Forward,
    Backward,
}

impl FlipDirection {
    /// Corner side a flip in this direction is grabbed from.
    pub fn grabs_left(&self) -> bool {
        matches!(self, FlipDirection::Backward)
    }

    pub fn for_corner(corner: Corner) -> Self {
        if corner.is_left() {
            FlipDirection::Backward
        } else {
            FlipDirection::Forward
        }
    }
}
