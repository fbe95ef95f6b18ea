//! Fold geometry solver.
//!
//! Given a page rectangle, the corner being lifted and the point the corner
//! has been dragged to (the control point), the solver builds the fold line as
//! the perpendicular bisector of corner and control point, splits the page
//! along it and mirrors the lifted part over the line.
//!
//! All work happens in a canonical frame where the active corner is the top
//! right corner and the leaf is hinged on the left edge; the other three
//! corners are reflections of that case.
//!
//! # Foreshortening
//!
//! The lifted leaf is not rendered as a flat mirror image. A single global
//! compression factor, `k = 1 - FORESHORTENING * sin(pi * progress)`, pulls
//! every mirrored vertex toward the fold line. The leaf looks flat at rest
//! and when fully turned, and most compressed halfway through the turn.

use std::f32::consts::PI;

use crate::core::error::{FlipError, FlipResult};
use crate::core::types::{Corner, PageRect, Point, Polygon, Segment};

/// Maximum compression of the mirrored leaf, reached at progress 0.5.
pub const FORESHORTENING: f32 = 0.3;

/// Control points closer than this to the corner produce no fold.
const MIN_FOLD_DISTANCE: f32 = 0.5;

/// Tolerance when deduplicating fold line intersections.
const INTERSECTION_EPSILON: f32 = 1e-3;

/// Output of a successful solve. Coordinates are page-local.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldGeometry {
    /// Control point after clamping to the drag envelope
    pub control_point: Point,
    /// Crease, running between its two intersections with the page border
    pub fold_line: Segment,
    /// Part of the page that stays flat
    pub static_shape: Polygon,
    /// Part of the page uncovered by the lifted leaf. It is also the texture
    /// source of the leaf, vertex for vertex with `folding_shape`.
    pub revealed_shape: Polygon,
    /// The lifted leaf: `revealed_shape` mirrored over the fold line and
    /// foreshortened
    pub folding_shape: Polygon,
    /// Flip progress in [0, 1]
    pub progress: f32,
}

/// Maps page-local coordinates to the canonical top-right frame and back.
/// The mapping is its own inverse.
#[derive(Debug, Clone, Copy)]
struct CornerFrame {
    width: f32,
    height: f32,
    flip_x: bool,
    flip_y: bool,
}

impl CornerFrame {
    fn new(rect: PageRect, corner: Corner) -> Self {
        Self {
            width: rect.width(),
            height: rect.height(),
            flip_x: corner.is_left(),
            flip_y: !corner.is_top(),
        }
    }

    fn map(&self, p: Point) -> Point {
        Point::new(
            if self.flip_x { self.width - p.x } else { p.x },
            if self.flip_y { self.height - p.y } else { p.y },
        )
    }
}

/// Pull `p` back onto the circle around `center` if it lies outside it.
fn limit_to_circle(center: Point, radius: f32, p: Point) -> Point {
    let offset = p - center;
    let dist = offset.length();
    if dist <= radius || dist <= f32::EPSILON {
        p
    } else {
        center + offset * (radius / dist)
    }
}

/// Clamp a control point to the region a leaf hinged on the far edge can
/// reach: the corner stays within `width` of the hinge corner on its own
/// edge, within the diagonal of the other hinge corner, and never rises past
/// its own horizontal edge.
pub fn clamp_control_point(rect: PageRect, corner: Corner, point: Point) -> Point {
    let frame = CornerFrame::new(rect, corner);
    let mut p = frame.map(point);
    if !p.is_finite() {
        return corner.position(rect);
    }

    let hinge_near = Point::new(0.0, 0.0);
    let hinge_far = Point::new(0.0, rect.height());
    p.y = p.y.max(0.0);
    // Alternating projections onto the two discs; both keep y >= 0.
    for _ in 0..4 {
        p = limit_to_circle(hinge_near, rect.width(), p);
        p = limit_to_circle(hinge_far, rect.diagonal(), p);
    }
    p = limit_to_circle(hinge_near, rect.width(), p);

    frame.map(p)
}

/// Flip progress for an (already clamped) control point: distance travelled
/// from the corner relative to the distance to its mirror image across the
/// hinge.
pub fn progress_for(rect: PageRect, corner: Corner, control_point: Point) -> f32 {
    let travelled = control_point.distance(corner.position(rect));
    (travelled / (2.0 * rect.width())).clamp(0.0, 1.0)
}

/// Compression applied to the mirrored leaf at `progress`.
pub fn foreshortening(progress: f32) -> f32 {
    1.0 - FORESHORTENING * (PI * progress.clamp(0.0, 1.0)).sin()
}

/// Target control point for a settled session: the corner itself when flat,
/// its mirror image across the hinge when turned.
pub fn rest_point(rect: PageRect, corner: Corner, turned: bool) -> Point {
    let at = corner.position(rect);
    if !turned {
        return at;
    }
    let x = if corner.is_left() {
        2.0 * rect.width()
    } else {
        -rect.width()
    };
    Point::new(x, at.y)
}

/// Split a convex polygon by the line through `origin` with normal `normal`.
///
/// Returns (points with d <= 0, points with d >= 0, crossings).
fn split_convex(poly: &Polygon, origin: Point, normal: Point) -> (Polygon, Polygon, Vec<Point>) {
    let mut negative = Vec::with_capacity(poly.len() + 2);
    let mut positive = Vec::with_capacity(poly.len() + 2);
    let mut crossings: Vec<Point> = Vec::with_capacity(2);
    fn push_crossing(p: Point, crossings: &mut Vec<Point>) {
        if !crossings.iter().any(|c| c.distance(p) < INTERSECTION_EPSILON) {
            crossings.push(p);
        }
    }

    let n = poly.len();
    for i in 0..n {
        let cur = poly.points[i];
        let next = poly.points[(i + 1) % n];
        let dc = (cur - origin).dot(normal);
        let dn = (next - origin).dot(normal);

        if dc >= 0.0 {
            positive.push(cur);
        }
        if dc <= 0.0 {
            negative.push(cur);
        }
        if dc == 0.0 {
            push_crossing(cur, &mut crossings);
        }
        if (dc > 0.0 && dn < 0.0) || (dc < 0.0 && dn > 0.0) {
            let t = dc / (dc - dn);
            let x = cur.lerp(next, t);
            positive.push(x);
            negative.push(x);
            push_crossing(x, &mut crossings);
        }
    }

    (Polygon::new(negative), Polygon::new(positive), crossings)
}

/// Solve the fold for `control_point` dragged from `corner`.
///
/// The control point is clamped to the drag envelope first. Fails with
/// [`FlipError::DegenerateFold`] when no fold line exists (control point on
/// the corner); callers treat that as a flat page at progress 0.
pub fn solve(rect: PageRect, corner: Corner, control_point: Point) -> FlipResult<FoldGeometry> {
    let clamped = clamp_control_point(rect, corner, control_point);
    let progress = progress_for(rect, corner, clamped);

    let frame = CornerFrame::new(rect, corner);
    let c = Point::new(rect.width(), 0.0);
    let p = frame.map(clamped);
    if c.distance(p) < MIN_FOLD_DISTANCE {
        return Err(FlipError::DegenerateFold);
    }

    let mid = c.lerp(p, 0.5);
    let normal = (c - p).normalized().ok_or(FlipError::DegenerateFold)?;
    let page = Polygon::from_rect(rect.width(), rect.height());
    let (static_part, lifted_part, crossings) = split_convex(&page, mid, normal);
    if crossings.len() != 2 || lifted_part.is_degenerate() {
        return Err(FlipError::DegenerateFold);
    }

    let k = foreshortening(progress);
    let folded = lifted_part.map(|x| {
        let d = (x - mid).dot(normal);
        x - normal * ((1.0 + k) * d)
    });

    let (a, b) = (crossings[0], crossings[1]);
    let fold_line = if a.y <= b.y {
        Segment::new(a, b)
    } else {
        Segment::new(b, a)
    };

    Ok(FoldGeometry {
        control_point: clamped,
        fold_line: Segment::new(frame.map(fold_line.start), frame.map(fold_line.end)),
        static_shape: static_part.map(|x| frame.map(x)),
        revealed_shape: lifted_part.map(|x| frame.map(x)),
        folding_shape: folded.map(|x| frame.map(x)),
        progress,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> PageRect {
        PageRect::new(400.0, 600.0).unwrap()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_corner_is_degenerate() {
        for corner in Corner::ALL {
            let at = corner.position(rect());
            assert_eq!(solve(rect(), corner, at), Err(FlipError::DegenerateFold));
        }
    }

    #[test]
    fn test_horizontal_drag_gives_vertical_fold() {
        let geo = solve(rect(), Corner::TopRight, Point::new(200.0, 0.0)).unwrap();
        assert!(close(geo.fold_line.start.x, 300.0));
        assert!(close(geo.fold_line.end.x, 300.0));
        assert!(close(geo.fold_line.start.y, 0.0));
        assert!(close(geo.fold_line.end.y, 600.0));
        assert!(close(geo.progress, 0.25));
        // Static part is the left 300 units, revealed part the right 100.
        assert!(close(geo.static_shape.area(), 300.0 * 600.0));
        assert!(close(geo.revealed_shape.area(), 100.0 * 600.0));
    }

    #[test]
    fn test_diagonal_fold_cuts_corner_triangle() {
        let geo = solve(rect(), Corner::BottomRight, Point::new(300.0, 500.0)).unwrap();
        // Bisector of (400,600)-(300,500) is x + y = 900.
        for p in [geo.fold_line.start, geo.fold_line.end] {
            assert!(close(p.x + p.y, 900.0));
        }
        assert_eq!(geo.revealed_shape.len(), 3);
        let total = geo.static_shape.area() + geo.revealed_shape.area();
        assert!(close(total, 400.0 * 600.0));
    }

    #[test]
    fn test_mirrored_leaf_lies_on_static_side() {
        let geo = solve(rect(), Corner::TopRight, Point::new(250.0, 80.0)).unwrap();
        let corner = Corner::TopRight.position(rect());
        let side = |p: Point| geo.fold_line.signed_distance(p).unwrap();
        let corner_side = side(corner).signum();
        let leaf_centroid = geo.folding_shape.centroid().unwrap();
        assert_eq!(side(leaf_centroid).signum(), -corner_side);
    }

    #[test]
    fn test_full_turn_folds_whole_page() {
        let target = rest_point(rect(), Corner::TopRight, true);
        assert_eq!(target, Point::new(-400.0, 0.0));
        let geo = solve(rect(), Corner::TopRight, target).unwrap();
        assert_eq!(geo.progress, 1.0);
        assert!(geo.static_shape.is_degenerate());
        assert!(close(geo.revealed_shape.area(), 400.0 * 600.0));
        // Fully turned leaf is an exact mirror over the hinge.
        for p in &geo.folding_shape.points {
            assert!(p.x <= 1e-3);
        }
    }

    #[test]
    fn test_left_corner_mirrors_right_corner() {
        let right = solve(rect(), Corner::TopRight, Point::new(320.0, 40.0)).unwrap();
        let left = solve(rect(), Corner::TopLeft, Point::new(80.0, 40.0)).unwrap();
        assert!(close(right.progress, left.progress));
        assert!(close(right.fold_line.start.x, 400.0 - left.fold_line.start.x));
        assert!(close(right.static_shape.area(), left.static_shape.area()));
    }

    #[test]
    fn test_progress_monotonic_along_edge() {
        let mut prev = 0.0;
        for step in 1..=40 {
            let x = 400.0 - step as f32 * 20.0;
            let geo = solve(rect(), Corner::TopRight, Point::new(x, 0.0)).unwrap();
            assert!(geo.progress >= prev);
            prev = geo.progress;
        }
        assert_eq!(prev, 1.0);
    }

    #[test]
    fn test_huge_drag_clamps_to_envelope_edge() {
        for x in [1.0e20, f32::MAX] {
            let clamped = clamp_control_point(rect(), Corner::TopRight, Point::new(x, 0.0));
            assert!(close(clamped.x, 400.0) && close(clamped.y, 0.0), "{:?}", clamped);
            assert!(close(progress_for(rect(), Corner::TopRight, clamped), 0.0));
        }
        let clamped = clamp_control_point(rect(), Corner::TopRight, Point::new(-1.0e20, 0.0));
        assert!(close(clamped.x, -400.0));
        assert!(close(progress_for(rect(), Corner::TopRight, clamped), 1.0));
    }

    #[test]
    fn test_progress_clamped_for_wild_input() {
        for p in [
            Point::new(-1.0e6, 3.0e5),
            Point::new(1.0e6, -1.0e6),
            Point::new(-4000.0, 9000.0),
        ] {
            let clamped = clamp_control_point(rect(), Corner::BottomLeft, p);
            let progress = progress_for(rect(), Corner::BottomLeft, clamped);
            assert!((0.0..=1.0).contains(&progress));
        }
        let geo = solve(rect(), Corner::TopRight, Point::new(-1.0e6, 50.0)).unwrap();
        assert!((0.0..=1.0).contains(&geo.progress));
        assert!(geo.control_point.distance(Point::ZERO) <= 400.0 + 1e-2);
    }

    #[test]
    fn test_clamp_keeps_corner_on_its_edge() {
        let p = clamp_control_point(rect(), Corner::TopRight, Point::new(300.0, -50.0));
        assert!(close(p.y, 0.0));
        let p = clamp_control_point(rect(), Corner::BottomRight, Point::new(300.0, 700.0));
        assert!(close(p.y, 600.0));
    }

    #[test]
    fn test_foreshortening_extremes() {
        assert_eq!(foreshortening(0.0), 1.0);
        assert!(close(foreshortening(1.0), 1.0));
        assert!(close(foreshortening(0.5), 1.0 - FORESHORTENING));
    }
}
