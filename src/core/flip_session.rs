//! Flip session - one page turn from grab (or programmatic start) to settle.
//!
//! A session owns the fold state of the turning leaf. Every frame it either
//! follows the pointer (dragging) or the animation curve (animating), and
//! [`FlipSession::frame`] turns the current fold state into a fresh
//! [`FrameGeometry`] for the renderer.

use std::f32::consts::PI;
use std::time::Duration;

use log::{debug, trace};

use crate::core::animation::{FlipAnimation, FlipEasing};
use crate::core::flip_config::FlipSettings;
use crate::core::geometry::{self, FoldGeometry};
use crate::core::shadow::{self, ShadowLayer};
use crate::core::spread::LeafPages;
use crate::core::types::{Corner, FlipDirection, PageRect, Point, Polygon, Segment};

/// Downward bulge of the corner path for programmatic flips, relative to
/// page height.
const PROGRAMMATIC_LIFT: f32 = 0.25;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Leaf follows the pointer
    Dragging,
    /// Leaf follows the animation curve
    Animating,
    /// Reached 0 or 1; waiting to be committed and dropped
    Settled,
}

/// Fold of the turning leaf. Coordinates are leaf-local.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldState {
    pub active_corner: Corner,
    pub control_point: Point,
    pub progress: f32,
}

/// Everything the renderer needs for one frame. Coordinates are spread-local.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameGeometry {
    pub page_rect: PageRect,
    /// Top-left of the turning leaf inside the spread
    pub leaf_origin: Point,
    pub corner: Corner,
    pub direction: FlipDirection,
    pub state: SessionState,
    pub progress: f32,
    /// Flat part of the leaf, showing `pages.front`
    pub static_shape: Polygon,
    /// Area uncovered by the lift, showing `pages.revealed`. Also the texture
    /// source of `folding_shape`.
    pub revealed_shape: Polygon,
    /// The lifted leaf, showing `pages.back`
    pub folding_shape: Polygon,
    /// `None` when the page lies flat
    pub fold_line: Option<Segment>,
    pub shadow_layers: Vec<ShadowLayer>,
    pub pages: LeafPages,
}

impl FrameGeometry {
    pub fn is_flat(&self) -> bool {
        self.fold_line.is_none()
    }
}

/// Corner path followed while animating.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FlipPath {
    from: Point,
    to: Point,
    /// Signed vertical bulge at the middle of the path
    lift: f32,
}

impl FlipPath {
    fn point_at(&self, s: f32) -> Point {
        let s = s.clamp(0.0, 1.0);
        self.from.lerp(self.to, s) + Point::new(0.0, self.lift * (PI * s).sin())
    }
}

/// What a session turns and where it lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipPlan {
    /// First page of the spread the flip starts from
    pub page_index: usize,
    /// First page of the spread shown once the flip commits
    pub destination: usize,
    pub direction: FlipDirection,
    pub corner: Corner,
    pub rect: PageRect,
    pub leaf_origin: Point,
    pub pages: LeafPages,
}

/// A single page turn.
#[derive(Debug, Clone)]
pub struct FlipSession {
    plan: FlipPlan,
    fold: FoldState,
    state: SessionState,
    animation: Option<FlipAnimation>,
    path: Option<FlipPath>,
    /// Control point minus pointer, fixed when an animating leaf is grabbed
    grab_offset: Point,
    flipping_time: Duration,
    easing: FlipEasing,
}

impl FlipSession {
    fn new(plan: FlipPlan, settings: &FlipSettings) -> Self {
        Self {
            fold: FoldState {
                active_corner: plan.corner,
                control_point: plan.corner.position(plan.rect),
                progress: 0.0,
            },
            plan,
            state: SessionState::Idle,
            animation: None,
            path: None,
            grab_offset: Point::ZERO,
            flipping_time: settings.flipping_time,
            easing: settings.easing,
        }
    }

    /// Session driven by the pointer, starting at `point` (spread-local).
    pub fn dragging(plan: FlipPlan, settings: &FlipSettings, point: Point) -> Self {
        let mut session = Self::new(plan, settings);
        session.state = SessionState::Dragging;
        session.drag_to(point);
        debug!(
            "flip session: drag from {:?} ({:?}) page {} -> {}",
            plan.corner, plan.direction, plan.page_index, plan.destination
        );
        session
    }

    /// Session animating from flat to turned without pointer input.
    pub fn animated(plan: FlipPlan, settings: &FlipSettings) -> Self {
        let mut session = Self::new(plan, settings);
        let lift_sign = if plan.corner.is_top() { 1.0 } else { -1.0 };
        session.path = Some(FlipPath {
            from: plan.corner.position(plan.rect),
            to: geometry::rest_point(plan.rect, plan.corner, true),
            lift: lift_sign * PROGRAMMATIC_LIFT * plan.rect.height(),
        });
        session.animation = Some(FlipAnimation::new(0.0, 1.0, session.flipping_time, session.easing));
        session.state = SessionState::Animating;
        debug!(
            "flip session: animate {:?} page {} -> {}",
            plan.direction, plan.page_index, plan.destination
        );
        session
    }

    pub fn plan(&self) -> &FlipPlan {
        &self.plan
    }

    pub fn page_index(&self) -> usize {
        self.plan.page_index
    }

    pub fn destination(&self) -> usize {
        self.plan.destination
    }

    pub fn direction(&self) -> FlipDirection {
        self.plan.direction
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn fold(&self) -> &FoldState {
        &self.fold
    }

    pub fn progress(&self) -> f32 {
        self.fold.progress
    }

    /// Curve currently driving the leaf, if animating.
    pub fn animation(&self) -> Option<&FlipAnimation> {
        self.animation.as_ref()
    }

    /// Where the session is heading: `Some(1.0)` commit, `Some(0.0)` cancel,
    /// `None` while the pointer decides.
    pub fn target_progress(&self) -> Option<f32> {
        match self.state {
            SessionState::Animating => self.animation.as_ref().map(|a| a.target_progress),
            SessionState::Settled => Some(self.fold.progress),
            _ => None,
        }
    }

    /// Control point in spread coordinates.
    pub fn control_point(&self) -> Point {
        self.fold.control_point + self.plan.leaf_origin
    }

    /// Follow the pointer. Ignored unless dragging.
    pub fn drag_to(&mut self, point: Point) {
        if self.state != SessionState::Dragging {
            return;
        }
        let local = point + self.grab_offset - self.plan.leaf_origin;
        let clamped = geometry::clamp_control_point(self.plan.rect, self.plan.corner, local);
        self.fold.control_point = clamped;
        self.fold.progress = geometry::progress_for(self.plan.rect, self.plan.corner, clamped);
        trace!("flip session: drag to {:?}, progress {:.3}", clamped, self.fold.progress);
    }

    /// Let go of the leaf and animate it to turned (`commit`) or flat.
    pub fn release(&mut self, commit: bool) {
        if self.state != SessionState::Dragging {
            return;
        }
        self.animation = Some(FlipAnimation::scaled(
            self.fold.progress,
            target_for(commit),
            self.flipping_time,
            self.easing,
        ));
        self.path = Some(self.settle_path(commit));
        self.state = SessionState::Animating;
        debug!("flip session: released at {:.3}, commit={}", self.fold.progress, commit);
    }

    /// Send the leaf toward a new terminal value without a jump.
    pub fn redirect(&mut self, commit: bool) {
        match self.state {
            SessionState::Dragging => self.release(commit),
            SessionState::Animating => {
                let target = target_for(commit);
                let Some(animation) = self.animation.as_mut() else {
                    return;
                };
                if animation.target_progress == target {
                    return;
                }
                animation.redirect(target, self.flipping_time);
                // The corner stays put; only the destination moves.
                self.path = Some(self.settle_path(commit));
                debug!("flip session: redirected at {:.3} toward {}", self.fold.progress, target);
            }
            SessionState::Idle | SessionState::Settled => {}
        }
    }

    fn settle_path(&self, commit: bool) -> FlipPath {
        FlipPath {
            from: self.fold.control_point,
            to: geometry::rest_point(self.plan.rect, self.plan.corner, commit),
            lift: 0.0,
        }
    }

    /// Take an animating leaf back under the pointer. The leaf keeps its
    /// place; later drags move it by the pointer's displacement.
    pub fn grab(&mut self, point: Point) {
        if self.state != SessionState::Animating {
            return;
        }
        self.grab_offset = self.control_point() - point;
        self.animation = None;
        self.path = None;
        self.state = SessionState::Dragging;
        self.drag_to(point);
        debug!("flip session: leaf re-grabbed at {:.3}", self.fold.progress);
    }

    /// Advance the animation by `dt`. Returns the progress and whether the
    /// session has settled.
    pub fn advance(&mut self, dt: Duration) -> (f32, bool) {
        if self.state != SessionState::Animating {
            return (self.fold.progress, self.state == SessionState::Settled);
        }
        let (Some(animation), Some(path)) = (self.animation.as_mut(), self.path) else {
            return (self.fold.progress, false);
        };

        let (curve, done) = animation.advance(dt);
        if done {
            let turned = curve >= 1.0;
            self.fold.progress = curve;
            self.fold.control_point = geometry::rest_point(self.plan.rect, self.plan.corner, turned);
            self.animation = None;
            self.path = None;
            self.state = SessionState::Settled;
            debug!("flip session: settled at {}", curve);
        } else {
            // Progress is that of the drawn corner, not the raw curve.
            let (rect, corner) = (self.plan.rect, self.plan.corner);
            let point = geometry::clamp_control_point(rect, corner, path.point_at(animation.fraction()));
            self.fold.control_point = point;
            self.fold.progress = geometry::progress_for(rect, corner, point);
        }
        (self.fold.progress, done)
    }

    /// Stop where the leaf is, snapping to the nearest terminal value.
    /// Returns true when that is the turned state.
    pub fn settle_now(&mut self) -> bool {
        self.settle_to(self.fold.progress >= 0.5)
    }

    /// Stop at once, flat or turned.
    pub fn settle_to(&mut self, turned: bool) -> bool {
        self.fold.progress = target_for(turned);
        self.fold.control_point = geometry::rest_point(self.plan.rect, self.plan.corner, turned);
        self.animation = None;
        self.path = None;
        self.state = SessionState::Settled;
        debug!("flip session: settled immediately, turned={}", turned);
        turned
    }

    /// Settled on the turned side.
    pub fn is_committed(&self) -> bool {
        self.state == SessionState::Settled && self.fold.progress >= 1.0
    }

    /// Frame description for the current fold state.
    pub fn frame(&self, settings: &FlipSettings) -> FrameGeometry {
        let origin = self.plan.leaf_origin;
        let mut frame = FrameGeometry {
            page_rect: self.plan.rect,
            leaf_origin: origin,
            corner: self.plan.corner,
            direction: self.plan.direction,
            state: self.state,
            progress: self.fold.progress,
            static_shape: self.plan.rect.to_polygon().translated(origin),
            revealed_shape: Polygon::default(),
            folding_shape: Polygon::default(),
            fold_line: None,
            shadow_layers: Vec::new(),
            pages: self.plan.pages,
        };

        match geometry::solve(self.plan.rect, self.plan.corner, self.fold.control_point) {
            Ok(FoldGeometry {
                fold_line,
                static_shape,
                revealed_shape,
                folding_shape,
                ..
            }) => {
                frame.shadow_layers = shadow::shadows(
                    &fold_line,
                    &folding_shape,
                    self.fold.progress,
                    settings.max_shadow_opacity,
                    settings.draw_shadow,
                )
                .iter()
                .map(|layer| layer.translated(origin))
                .collect();
                frame.fold_line = Some(fold_line.translated(origin));
                frame.static_shape = static_shape.translated(origin);
                frame.revealed_shape = revealed_shape.translated(origin);
                frame.folding_shape = folding_shape.translated(origin);
            }
            Err(err) => {
                // Leaf at rest on its corner: draw the page flat.
                frame.progress = 0.0;
                trace!("flip session: flat frame ({})", err);
            }
        }
        frame
    }
}

fn target_for(commit: bool) -> f32 {
    if commit { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_micros(16_667);

    fn plan() -> FlipPlan {
        FlipPlan {
            page_index: 0,
            destination: 1,
            direction: FlipDirection::Forward,
            corner: Corner::TopRight,
            rect: PageRect::new(400.0, 600.0).unwrap(),
            leaf_origin: Point::ZERO,
            pages: LeafPages {
                front: Some(0),
                back: None,
                revealed: Some(1),
            },
        }
    }

    fn run_to_end(session: &mut FlipSession) -> f32 {
        for _ in 0..10_000 {
            let (p, done) = session.advance(FRAME);
            if done {
                return p;
            }
        }
        panic!("session never settled");
    }

    #[test]
    fn test_programmatic_flip_settles_turned() {
        let settings = FlipSettings::default();
        let mut session = FlipSession::animated(plan(), &settings);
        assert!(session.frame(&settings).is_flat());
        assert!(!session.advance(FRAME).1);
        let mid = session.frame(&settings);
        assert!(!mid.is_flat());
        assert_eq!(mid.shadow_layers.len(), 2);
        assert_eq!(run_to_end(&mut session), 1.0);
        assert!(session.is_committed());
        assert_eq!(session.fold().control_point, Point::new(-400.0, 0.0));
    }

    #[test]
    fn test_release_without_commit_returns_flat() {
        let settings = FlipSettings::default();
        let mut session = FlipSession::dragging(plan(), &settings, Point::new(380.0, 10.0));
        session.drag_to(Point::new(340.0, 20.0));
        let p = session.progress();
        assert!(p > 0.0 && p < 0.5);
        session.release(false);
        assert_eq!(session.state(), SessionState::Animating);
        assert_eq!(run_to_end(&mut session), 0.0);
        assert!(!session.is_committed());
        assert!(session.frame(&settings).is_flat());
    }

    #[test]
    fn test_redirect_keeps_leaf_in_place() {
        let settings = FlipSettings::default();
        let mut session = FlipSession::animated(plan(), &settings);
        for _ in 0..12 {
            session.advance(FRAME);
        }
        let before = session.progress();
        let point_before = session.fold().control_point;
        session.redirect(false);
        assert_eq!(session.progress(), before);
        assert_eq!(session.fold().control_point, point_before);
        assert_eq!(session.target_progress(), Some(0.0));

        let (after, _) = session.advance(FRAME);
        assert!((after - before).abs() < 0.1);
        assert_eq!(run_to_end(&mut session), 0.0);
    }

    #[test]
    fn test_grab_then_release_commits() {
        let settings = FlipSettings::default();
        let mut session = FlipSession::animated(plan(), &settings);
        for _ in 0..5 {
            session.advance(FRAME);
        }
        let before = session.progress();
        let at = session.control_point();
        let press = at + Point::new(40.0, 30.0);
        session.grab(press);
        assert_eq!(session.state(), SessionState::Dragging);
        assert!((session.progress() - before).abs() < 1e-4);
        assert!(session.control_point().distance(at) < 1e-3);

        session.drag_to(press + Point::new(-400.0, 0.0));
        assert!(session.progress() > 0.5);
        session.release(true);
        assert_eq!(run_to_end(&mut session), 1.0);
    }

    #[test]
    fn test_progress_tracks_drawn_corner() {
        let settings = FlipSettings::default();
        let mut session = FlipSession::animated(plan(), &settings);
        for _ in 0..8 {
            let (p, _) = session.advance(FRAME);
            let corner = Corner::TopRight.position(plan().rect);
            let expected = session.fold().control_point.distance(corner) / 800.0;
            assert!((p - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_flat_frame_reports_zero_progress() {
        let settings = FlipSettings::default();
        let session = FlipSession::dragging(plan(), &settings, Point::new(399.8, 0.1));
        assert!(session.progress() > 0.0);
        let frame = session.frame(&settings);
        assert!(frame.is_flat());
        assert_eq!(frame.progress, 0.0);
    }

    #[test]
    fn test_settle_now_rounds_to_nearest() {
        let settings = FlipSettings::default();
        let mut near_start = FlipSession::dragging(plan(), &settings, Point::new(300.0, 0.0));
        assert!(!near_start.settle_now());
        assert_eq!(near_start.progress(), 0.0);

        let mut near_end = FlipSession::dragging(plan(), &settings, Point::new(-200.0, 0.0));
        assert!(near_end.settle_now());
        assert_eq!(near_end.progress(), 1.0);
        assert!(near_end.is_committed());
    }

    #[test]
    fn test_frame_translated_into_spread() {
        let settings = FlipSettings::default();
        let mut p = plan();
        p.leaf_origin = Point::new(400.0, 0.0);
        let session = FlipSession::dragging(p, &settings, Point::new(600.0, 0.0));
        let frame = session.frame(&settings);
        let fold = frame.fold_line.unwrap();
        // Leaf-local drag to x=200 puts the crease at x=300, spread x=700.
        assert!((fold.start.x - 700.0).abs() < 1e-3);
        assert_eq!(frame.leaf_origin, Point::new(400.0, 0.0));
    }

    #[test]
    fn test_shadows_follow_settings() {
        let settings = FlipSettings {
            draw_shadow: false,
            ..FlipSettings::default()
        };
        let session = FlipSession::dragging(plan(), &settings, Point::new(200.0, 100.0));
        assert!(session.frame(&settings).shadow_layers.is_empty());
    }
}
