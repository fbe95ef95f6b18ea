//! Pointer gesture handling.
//!
//! Every pointer-down first goes through [`hit_test`], which classifies the
//! point without touching any state. The [`GestureMachine`] then moves
//! through
//!
//! ```text
//! Idle -> CandidateCheck -> Dragging -> Committing | Cancelling -> Settled -> Idle
//! ```
//!
//! and tells the controller what to do with each event through a
//! [`GestureAction`]. Once content owns a gesture, every event up to the
//! matching pointer-up is passed through untouched.

use log::{debug, trace};

use crate::core::flip_config::{FlipSettings, ViewMode};
use crate::core::types::{Corner, Corners, FlipDirection, PageRect, Point};

/// Pointer event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Raw pointer event in spread-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Point,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, x: f32, y: f32) -> Self {
        Self {
            phase,
            position: Point::new(x, y),
        }
    }

    pub fn down(x: f32, y: f32) -> Self {
        Self::new(PointerPhase::Down, x, y)
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerPhase::Move, x, y)
    }

    pub fn up(x: f32, y: f32) -> Self {
        Self::new(PointerPhase::Up, x, y)
    }

    pub fn cancel() -> Self {
        Self::new(PointerPhase::Cancel, 0.0, 0.0)
    }
}

/// Leaf currently animating, as seen by the hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafHandle {
    /// Control point in spread coordinates
    pub point: Point,
    pub corner: Corner,
    pub direction: FlipDirection,
}

/// Everything the hit test needs to know about the book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitContext {
    pub rect: PageRect,
    pub view_mode: ViewMode,
    /// Hot zone radius as a fraction of the page diagonal
    pub trigger_area: f32,
    pub can_forward: bool,
    pub can_backward: bool,
    pub leaf: Option<LeafHandle>,
}

impl HitContext {
    pub fn new(rect: PageRect, settings: &FlipSettings) -> Self {
        Self {
            rect,
            view_mode: settings.view_mode,
            trigger_area: settings.corner_trigger_area_size,
            can_forward: false,
            can_backward: false,
            leaf: None,
        }
    }

    fn radius(&self) -> f32 {
        self.trigger_area * self.rect.diagonal()
    }

    /// Corners a flip may start from right now.
    pub fn eligible_corners(&self) -> Corners {
        let mut corners = Corners::empty();
        if self.can_forward {
            corners |= Corners::RIGHT;
        }
        if self.can_backward {
            corners |= Corners::LEFT;
        }
        corners
    }

    /// Corner position in spread coordinates. Right corners belong to the
    /// right-hand page in double mode.
    pub fn corner_position(&self, corner: Corner) -> Point {
        let at = corner.position(self.rect);
        match (self.view_mode, corner.is_left()) {
            (ViewMode::Double, false) => at + Point::new(self.rect.width(), 0.0),
            _ => at,
        }
    }
}

/// Result of the hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    /// Inside the hot zone of an eligible corner
    Corner {
        corner: Corner,
        direction: FlipDirection,
    },
    /// On the leaf of the session in flight
    Leaf(LeafHandle),
    /// Anywhere else; belongs to page content
    Content,
}

/// Classify a pointer-down. Pure: no state is read or written besides `ctx`.
pub fn hit_test(ctx: &HitContext, point: Point) -> HitTarget {
    let radius = ctx.radius();
    if radius <= 0.0 || !point.is_finite() {
        return HitTarget::Content;
    }

    if let Some(leaf) = ctx.leaf {
        return if leaf.point.distance(point) <= radius {
            HitTarget::Leaf(leaf)
        } else {
            HitTarget::Content
        };
    }

    ctx.eligible_corners()
        .corners()
        .map(|corner| (corner, ctx.corner_position(corner).distance(point)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(corner, _)| HitTarget::Corner {
            corner,
            direction: FlipDirection::for_corner(corner),
        })
        .unwrap_or(HitTarget::Content)
}

/// Gesture state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePhase {
    Idle,
    /// Corner pressed; not yet moved past the jitter threshold
    CandidateCheck {
        corner: Corner,
        direction: FlipDirection,
        origin: Point,
    },
    /// Leaf follows the pointer
    Dragging {
        corner: Corner,
        direction: FlipDirection,
        origin: Point,
    },
    /// Animating to turned
    Committing,
    /// Animating back to flat
    Cancelling,
    /// Session finished; passes straight on to Idle
    Settled,
}

/// What the controller should do with an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    /// Deliver the event to page content unchanged
    PassThrough,
    /// Event consumed, nothing to do yet
    Claimed,
    /// Corner press released without moving: a click on content
    Tap(Point),
    /// Start a drag session from `corner`
    BeginDrag {
        corner: Corner,
        direction: FlipDirection,
        point: Point,
    },
    /// Move the dragged leaf
    Drag(Point),
    /// Pointer let go of the leaf
    Release { commit: bool },
    /// Pointer took the animating leaf back
    Regrab(Point),
    /// Gesture cancelled by the platform
    Abort,
}

/// Pointer gesture state machine.
#[derive(Debug, Clone)]
pub struct GestureMachine {
    phase: GesturePhase,
    /// Content claimed the current pointer sequence
    content_owned: bool,
}

impl Default for GestureMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureMachine {
    pub fn new() -> Self {
        Self {
            phase: GesturePhase::Idle,
            content_owned: false,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// A pointer currently holds a corner or the leaf.
    pub fn is_pointer_active(&self) -> bool {
        matches!(
            self.phase,
            GesturePhase::CandidateCheck { .. } | GesturePhase::Dragging { .. }
        )
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, GesturePhase::Dragging { .. })
    }

    /// Feed one pointer event. `progress` is the progress of the session in
    /// flight, if any.
    pub fn handle(
        &mut self,
        event: &PointerEvent,
        ctx: &HitContext,
        settings: &FlipSettings,
        progress: f32,
    ) -> GestureAction {
        let action = match event.phase {
            PointerPhase::Down => self.pointer_down(ctx, event.position),
            PointerPhase::Move => self.pointer_move(event.position, settings.tap_threshold),
            PointerPhase::Up => self.pointer_up(event.position, settings.swipe_distance, progress),
            PointerPhase::Cancel => self.pointer_cancel(),
        };
        trace!("gesture: {:?} -> {:?} ({:?})", event.phase, action, self.phase);
        action
    }

    fn pointer_down(&mut self, ctx: &HitContext, point: Point) -> GestureAction {
        if self.is_pointer_active() {
            // Second pointer while one is already down.
            return GestureAction::PassThrough;
        }
        self.content_owned = false;

        match (self.phase, hit_test(ctx, point)) {
            (GesturePhase::Idle | GesturePhase::Settled, HitTarget::Corner { corner, direction }) => {
                self.phase = GesturePhase::CandidateCheck {
                    corner,
                    direction,
                    origin: point,
                };
                debug!("gesture: corner {:?} pressed", corner);
                GestureAction::Claimed
            }
            (GesturePhase::Committing | GesturePhase::Cancelling, HitTarget::Leaf(leaf)) => {
                self.phase = GesturePhase::Dragging {
                    corner: leaf.corner,
                    direction: leaf.direction,
                    origin: point,
                };
                debug!("gesture: leaf re-grabbed");
                GestureAction::Regrab(point)
            }
            _ => {
                self.content_owned = true;
                GestureAction::PassThrough
            }
        }
    }

    fn pointer_move(&mut self, point: Point, threshold: f32) -> GestureAction {
        if self.content_owned {
            return GestureAction::PassThrough;
        }
        match self.phase {
            GesturePhase::CandidateCheck {
                corner,
                direction,
                origin,
            } => {
                if point.distance(origin) <= threshold {
                    return GestureAction::Claimed;
                }
                self.phase = GesturePhase::Dragging {
                    corner,
                    direction,
                    origin,
                };
                debug!("gesture: drag from {:?}", corner);
                GestureAction::BeginDrag {
                    corner,
                    direction,
                    point,
                }
            }
            GesturePhase::Dragging { .. } => GestureAction::Drag(point),
            _ => GestureAction::PassThrough,
        }
    }

    fn pointer_up(&mut self, point: Point, swipe_distance: f32, progress: f32) -> GestureAction {
        if std::mem::take(&mut self.content_owned) {
            return GestureAction::PassThrough;
        }
        match self.phase {
            GesturePhase::CandidateCheck { .. } => {
                self.phase = GesturePhase::Idle;
                GestureAction::Tap(point)
            }
            GesturePhase::Dragging {
                direction, origin, ..
            } => {
                // Displacement toward the hinge side.
                let travelled = match direction {
                    FlipDirection::Forward => origin.x - point.x,
                    FlipDirection::Backward => point.x - origin.x,
                };
                let commit = travelled >= swipe_distance || progress >= 0.5;
                self.phase = if commit {
                    GesturePhase::Committing
                } else {
                    GesturePhase::Cancelling
                };
                debug!(
                    "gesture: released after {:.1} (progress {:.3}), commit={}",
                    travelled, progress, commit
                );
                GestureAction::Release { commit }
            }
            _ => GestureAction::PassThrough,
        }
    }

    fn pointer_cancel(&mut self) -> GestureAction {
        if std::mem::take(&mut self.content_owned) {
            return GestureAction::PassThrough;
        }
        match self.phase {
            GesturePhase::CandidateCheck { .. } => {
                self.phase = GesturePhase::Idle;
                GestureAction::Claimed
            }
            GesturePhase::Dragging { .. } => {
                debug!("gesture: drag cancelled");
                self.phase = GesturePhase::Settled;
                GestureAction::Abort
            }
            _ => GestureAction::PassThrough,
        }
    }

    /// A session is animating without a pointer (release or programmatic).
    pub fn animating(&mut self, commit: bool) {
        if self.is_pointer_active() {
            return;
        }
        self.phase = if commit {
            GesturePhase::Committing
        } else {
            GesturePhase::Cancelling
        };
    }

    /// The session in flight reached its resting state.
    pub fn settle(&mut self) {
        if self.phase != GesturePhase::Idle {
            trace!("gesture: settled");
        }
        // Settled has no visible state of its own.
        self.phase = GesturePhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> PageRect {
        PageRect::new(400.0, 600.0).unwrap()
    }

    fn ctx() -> HitContext {
        HitContext {
            can_forward: true,
            can_backward: true,
            ..HitContext::new(rect(), &FlipSettings::default())
        }
    }

    #[test]
    fn test_hit_test_corners() {
        // 0.15 * 721.1 = 108.2
        assert_eq!(
            hit_test(&ctx(), Point::new(390.0, 10.0)),
            HitTarget::Corner {
                corner: Corner::TopRight,
                direction: FlipDirection::Forward
            }
        );
        assert_eq!(
            hit_test(&ctx(), Point::new(20.0, 580.0)),
            HitTarget::Corner {
                corner: Corner::BottomLeft,
                direction: FlipDirection::Backward
            }
        );
        assert_eq!(hit_test(&ctx(), Point::new(200.0, 300.0)), HitTarget::Content);
    }

    #[test]
    fn test_hit_test_respects_eligibility() {
        let first_page = HitContext {
            can_backward: false,
            ..ctx()
        };
        assert_eq!(hit_test(&first_page, Point::new(5.0, 5.0)), HitTarget::Content);
    }

    #[test]
    fn test_hit_test_double_mode_right_page() {
        let double = HitContext {
            view_mode: ViewMode::Double,
            ..ctx()
        };
        assert_eq!(hit_test(&double, Point::new(390.0, 10.0)), HitTarget::Content);
        assert!(matches!(
            hit_test(&double, Point::new(795.0, 595.0)),
            HitTarget::Corner {
                corner: Corner::BottomRight,
                ..
            }
        ));
    }

    #[test]
    fn test_content_press_never_leaves_idle() {
        let settings = FlipSettings::default();
        let mut machine = GestureMachine::new();
        let events = [
            PointerEvent::down(200.0, 300.0),
            PointerEvent::moved(390.0, 10.0),
            PointerEvent::moved(100.0, 10.0),
            PointerEvent::up(100.0, 10.0),
        ];
        for event in &events {
            assert_eq!(machine.handle(event, &ctx(), &settings, 0.0), GestureAction::PassThrough);
            assert_eq!(machine.phase(), GesturePhase::Idle);
        }
    }

    #[test]
    fn test_small_jitter_is_a_tap() {
        let settings = FlipSettings::default();
        let mut machine = GestureMachine::new();
        let down = PointerEvent::down(395.0, 5.0);
        assert_eq!(machine.handle(&down, &ctx(), &settings, 0.0), GestureAction::Claimed);
        let jitter = PointerEvent::moved(393.0, 7.0);
        assert_eq!(machine.handle(&jitter, &ctx(), &settings, 0.0), GestureAction::Claimed);
        let up = PointerEvent::up(393.0, 7.0);
        assert_eq!(
            machine.handle(&up, &ctx(), &settings, 0.0),
            GestureAction::Tap(Point::new(393.0, 7.0))
        );
        assert_eq!(machine.phase(), GesturePhase::Idle);
    }

    #[test]
    fn test_drag_release_decision() {
        let settings = FlipSettings::default();
        let mut machine = GestureMachine::new();
        machine.handle(&PointerEvent::down(395.0, 5.0), &ctx(), &settings, 0.0);
        let action = machine.handle(&PointerEvent::moved(350.0, 20.0), &ctx(), &settings, 0.0);
        assert!(matches!(action, GestureAction::BeginDrag { corner: Corner::TopRight, .. }));
        assert_eq!(
            machine.handle(&PointerEvent::moved(340.0, 20.0), &ctx(), &settings, 0.06),
            GestureAction::Drag(Point::new(340.0, 20.0))
        );
        assert_eq!(
            machine.handle(&PointerEvent::up(340.0, 20.0), &ctx(), &settings, 0.06),
            GestureAction::Release { commit: false }
        );
        assert_eq!(machine.phase(), GesturePhase::Cancelling);

        machine.settle();
        machine.handle(&PointerEvent::down(395.0, 5.0), &ctx(), &settings, 0.0);
        machine.handle(&PointerEvent::moved(250.0, 40.0), &ctx(), &settings, 0.18);
        assert_eq!(
            machine.handle(&PointerEvent::up(250.0, 40.0), &ctx(), &settings, 0.18),
            GestureAction::Release { commit: true }
        );
        assert_eq!(machine.phase(), GesturePhase::Committing);
    }

    #[test]
    fn test_regrab_animating_leaf() {
        let settings = FlipSettings::default();
        let mut machine = GestureMachine::new();
        machine.animating(true);
        let leaf = LeafHandle {
            point: Point::new(100.0, 80.0),
            corner: Corner::TopRight,
            direction: FlipDirection::Forward,
        };
        let flying = HitContext {
            leaf: Some(leaf),
            ..ctx()
        };
        // A corner press does not start a second flip.
        assert_eq!(
            machine.handle(&PointerEvent::down(395.0, 5.0), &flying, &settings, 0.4),
            GestureAction::PassThrough
        );
        machine.handle(&PointerEvent::up(395.0, 5.0), &flying, &settings, 0.4);
        assert_eq!(
            machine.handle(&PointerEvent::down(110.0, 90.0), &flying, &settings, 0.4),
            GestureAction::Regrab(Point::new(110.0, 90.0))
        );
        assert!(machine.is_dragging());
    }

    #[test]
    fn test_cancel_aborts_drag() {
        let settings = FlipSettings::default();
        let mut machine = GestureMachine::new();
        machine.handle(&PointerEvent::down(395.0, 595.0), &ctx(), &settings, 0.0);
        machine.handle(&PointerEvent::moved(300.0, 560.0), &ctx(), &settings, 0.1);
        assert_eq!(
            machine.handle(&PointerEvent::cancel(), &ctx(), &settings, 0.1),
            GestureAction::Abort
        );
        machine.settle();
        assert_eq!(machine.phase(), GesturePhase::Idle);
    }
}
