//! Flip controller - the public surface of the engine.
//!
//! The controller owns the page cursor, the gesture machine and at most one
//! [`FlipSession`]. Hosts feed it pointer events and frame ticks and get
//! [`FrameGeometry`] back; page and state changes are published on a channel.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, trace, warn};

use crate::core::error::{FlipError, FlipResult};
use crate::core::flip_config::FlipSettings;
use crate::core::flip_session::{FlipPlan, FlipSession, FrameGeometry, SessionState};
use crate::core::gesture::{GestureAction, GestureMachine, GesturePhase, HitContext, LeafHandle, PointerEvent};
use crate::core::spread::{LeafPages, Spread, SpreadLayout};
use crate::core::types::{Corner, FlipDirection, PageRect};

/// Notifications kept for a host that does not drain them. When full, the
/// oldest is dropped.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Size a page is rendered at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageConstraints {
    pub width: f32,
    pub height: f32,
}

impl From<PageRect> for PageConstraints {
    fn from(rect: PageRect) -> Self {
        Self {
            width: rect.width(),
            height: rect.height(),
        }
    }
}

/// Supplies page content by index. The engine never looks inside it.
pub trait PageContentProvider {
    type Content;

    fn render(&self, index: usize, constraints: PageConstraints) -> Self::Content;
}

/// Where a rendered page goes in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRole {
    /// Flat left page of the spread
    Left,
    /// Flat right page of the spread
    Right,
    /// Front of the turning leaf, drawn on the static shape
    Front,
    /// Back of the turning leaf, drawn on the folding shape
    Back,
    /// Page uncovered under the lifted corner
    Revealed,
}

/// One page rendered for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage<C> {
    pub index: usize,
    pub role: PageRole,
    pub content: C,
}

/// Coarse flip state, for host hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipState {
    /// Nothing moving
    Read,
    /// Leaf under the pointer
    UserFold,
    /// Corner pressed, not yet dragged
    FoldCorner,
    /// Leaf animating on its own
    Flipping,
}

/// Notification published by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// Visible spread changed; fired once per committed flip or jump
    PageChanged(Spread),
    StateChanged(FlipState),
}

/// Current page of a book. Always holds the first page of a spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageIndexCursor {
    current_page_index: usize,
    page_count: usize,
}

impl PageIndexCursor {
    pub fn new(page_count: usize) -> FlipResult<Self> {
        if page_count == 0 {
            return Err(FlipError::EmptyBook);
        }
        Ok(Self {
            current_page_index: 0,
            page_count,
        })
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page_index
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Validate a page index against the book.
    pub fn check(&self, index: usize) -> FlipResult<usize> {
        if index < self.page_count {
            Ok(index)
        } else {
            Err(FlipError::IndexOutOfRange {
                index,
                page_count: self.page_count,
            })
        }
    }

    /// Move to `index`. Returns true if the cursor moved.
    fn set(&mut self, index: usize) -> bool {
        let index = index.min(self.page_count - 1);
        let moved = index != self.current_page_index;
        self.current_page_index = index;
        moved
    }
}

/// Page flip controller.
///
/// Notifications queue up to [`EVENT_QUEUE_CAPACITY`]; hosts should drain
/// them once per frame through [`FlipController::drain_events`] or a
/// receiver from [`FlipController::event_receiver`].
pub struct FlipController<P: PageContentProvider> {
    provider: P,
    settings: FlipSettings,
    rect: PageRect,
    cursor: PageIndexCursor,
    session: Option<FlipSession>,
    gesture: GestureMachine,
    state: FlipState,
    events_tx: Sender<PageEvent>,
    events_rx: Receiver<PageEvent>,
}

impl<P: PageContentProvider> FlipController<P> {
    pub fn new(provider: P, page_count: usize, rect: PageRect, settings: FlipSettings) -> FlipResult<Self> {
        let cursor = PageIndexCursor::new(page_count)?;
        let (events_tx, events_rx) = bounded(EVENT_QUEUE_CAPACITY);
        debug!(
            "flip controller: {} pages, {:?} mode, page {}x{}",
            page_count,
            settings.view_mode,
            rect.width(),
            rect.height()
        );
        Ok(Self {
            provider,
            settings,
            rect,
            cursor,
            session: None,
            gesture: GestureMachine::new(),
            state: FlipState::Read,
            events_tx,
            events_rx,
        })
    }

    // ---- Queries ----

    pub fn current_page_index(&self) -> usize {
        self.cursor.current_page_index()
    }

    pub fn page_count(&self) -> usize {
        self.cursor.page_count()
    }

    pub fn settings(&self) -> &FlipSettings {
        &self.settings
    }

    pub fn page_rect(&self) -> PageRect {
        self.rect
    }

    pub fn state(&self) -> FlipState {
        self.state
    }

    pub fn gesture_phase(&self) -> GesturePhase {
        self.gesture.phase()
    }

    pub fn session(&self) -> Option<&FlipSession> {
        self.session.as_ref()
    }

    /// A session is in flight (dragging or animating).
    pub fn is_flipping(&self) -> bool {
        self.session.is_some()
    }

    pub fn layout(&self) -> SpreadLayout {
        SpreadLayout::new(self.page_count(), self.settings.view_mode, self.settings.show_cover)
    }

    pub fn current_spread(&self) -> Spread {
        self.layout().spread_of(self.current_page_index())
    }

    fn spread_index(&self) -> usize {
        self.layout().spread_index_of(self.current_page_index())
    }

    pub fn has_next_page(&self) -> bool {
        self.spread_index() + 1 < self.layout().spread_count()
    }

    pub fn has_previous_page(&self) -> bool {
        self.spread_index() > 0
    }

    /// `flip_next` would do something right now.
    pub fn can_flip_next(&self) -> bool {
        self.can_flip(FlipDirection::Forward)
    }

    /// `flip_prev` would do something right now.
    pub fn can_flip_prev(&self) -> bool {
        self.can_flip(FlipDirection::Backward)
    }

    fn can_flip(&self, direction: FlipDirection) -> bool {
        if self.gesture.is_pointer_active() {
            return false;
        }
        match &self.session {
            // A redirect only helps if it changes where the leaf is going.
            Some(session) => session.target_progress() != Some(redirect_target(session, direction)),
            None => match direction {
                FlipDirection::Forward => self.has_next_page(),
                FlipDirection::Backward => self.has_previous_page(),
            },
        }
    }

    /// Receiver for page and state notifications. Every clone sees each
    /// event once, whichever receives it first.
    pub fn event_receiver(&self) -> Receiver<PageEvent> {
        self.events_rx.clone()
    }

    /// Take all pending notifications.
    pub fn drain_events(&self) -> Vec<PageEvent> {
        self.events_rx.try_iter().collect()
    }

    // ---- Jumps ----

    /// Jump to the next spread without animation. No-op on the last spread.
    pub fn next_page(&mut self) {
        self.settle_now();
        if self.has_next_page() {
            let target = self.layout().spread(self.spread_index() + 1);
            self.jump_to(target);
        }
    }

    /// Jump to the previous spread without animation. No-op on the first spread.
    pub fn previous_page(&mut self) {
        self.settle_now();
        if self.has_previous_page() {
            let target = self.layout().spread(self.spread_index() - 1);
            self.jump_to(target);
        }
    }

    /// Jump to the spread holding `index` without animation. A session in
    /// flight settles on whichever side shows `index`, or at its nearest end
    /// when neither does.
    pub fn go_to_page(&mut self, index: usize) -> FlipResult<()> {
        let index = self.cursor.check(index).inspect_err(|err| warn!("go_to_page: {}", err))?;
        let layout = self.layout();
        let target = layout.spread_of(index);
        match self.session.as_ref().map(|s| layout.spread_of(s.destination())) {
            Some(destination) if destination == target => self.settle_to(true),
            Some(_) if target == self.current_spread() => self.settle_to(false),
            _ => self.settle_now(),
        }
        if target == self.current_spread() {
            trace!("go_to_page({}): already visible", index);
            return Ok(());
        }
        self.jump_to(target);
        Ok(())
    }

    fn jump_to(&mut self, spread: Spread) {
        let Some(first) = spread.first_page() else {
            return;
        };
        if self.cursor.set(first) {
            debug!("page changed to {:?}", spread);
            self.emit(PageEvent::PageChanged(spread));
        }
    }

    // ---- Animated flips ----

    /// Turn to the next spread. While a session is in flight the leaf is
    /// redirected instead. `corner` picks top or bottom; the side follows
    /// the direction.
    pub fn flip_next(&mut self, corner: Option<Corner>) -> bool {
        self.flip(FlipDirection::Forward, corner)
    }

    /// Turn to the previous spread. See [`FlipController::flip_next`].
    pub fn flip_prev(&mut self, corner: Option<Corner>) -> bool {
        self.flip(FlipDirection::Backward, corner)
    }

    fn flip(&mut self, direction: FlipDirection, corner: Option<Corner>) -> bool {
        if self.gesture.is_pointer_active() {
            warn!("flip {:?} ignored: pointer holds the page", direction);
            return false;
        }
        if self.session.is_some() {
            return self.redirect_toward(direction);
        }

        let layout = self.layout();
        let index = self.spread_index();
        let target = match direction {
            FlipDirection::Forward if self.has_next_page() => layout.spread(index + 1),
            FlipDirection::Backward if self.has_previous_page() => layout.spread(index - 1),
            _ => {
                trace!("flip {:?}: no page in that direction", direction);
                return false;
            }
        };
        self.start_animated(direction, target, corner)
    }

    /// Animate to the spread holding `index`, skipping the spreads between.
    pub fn flip_to_page(&mut self, index: usize, corner: Option<Corner>) -> FlipResult<()> {
        let index = self.cursor.check(index).inspect_err(|err| warn!("flip_to_page: {}", err))?;
        if self.gesture.is_pointer_active() {
            warn!("flip_to_page({}) ignored: pointer holds the page", index);
            return Ok(());
        }

        let layout = self.layout();
        let target = layout.spread_of(index);
        let in_flight = self
            .session
            .as_ref()
            .map(|s| (s.page_index(), s.destination(), s.direction()));
        if let Some((origin, destination, direction)) = in_flight {
            if target == layout.spread_of(destination) {
                self.redirect_toward(direction);
                return Ok(());
            }
            if target == layout.spread_of(origin) {
                let back = match direction {
                    FlipDirection::Forward => FlipDirection::Backward,
                    FlipDirection::Backward => FlipDirection::Forward,
                };
                self.redirect_toward(back);
                return Ok(());
            }
            self.settle_now();
        }

        let current = self.spread_index();
        let wanted = layout.spread_index_of(index);
        if wanted == current {
            return Ok(());
        }
        let direction = if wanted > current {
            FlipDirection::Forward
        } else {
            FlipDirection::Backward
        };
        self.start_animated(direction, target, corner);
        Ok(())
    }

    fn redirect_toward(&mut self, direction: FlipDirection) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let target = redirect_target(session, direction);
        if session.target_progress() == Some(target) {
            return false;
        }
        let commit = target >= 1.0;
        session.redirect(commit);
        self.gesture.animating(commit);
        self.set_state(FlipState::Flipping);
        true
    }

    fn plan(&self, direction: FlipDirection, target: Spread, corner: Corner) -> FlipPlan {
        let layout = self.layout();
        let from = self.current_spread();
        FlipPlan {
            page_index: self.current_page_index(),
            destination: target.first_page().unwrap_or(0),
            direction,
            corner,
            rect: self.rect,
            leaf_origin: layout.leaf_offset(self.rect, direction),
            pages: LeafPages::for_turn(&layout, from, target, direction),
        }
    }

    fn start_animated(&mut self, direction: FlipDirection, target: Spread, corner: Option<Corner>) -> bool {
        let corner = corner.unwrap_or(Corner::TopRight).with_side(direction.grabs_left());
        let plan = self.plan(direction, target, corner);
        self.session = Some(FlipSession::animated(plan, &self.settings));
        self.gesture.animating(true);
        self.set_state(FlipState::Flipping);
        true
    }

    // ---- Input and frames ----

    fn hit_context(&self) -> HitContext {
        let idle = self.session.is_none();
        let leaf = self
            .session
            .as_ref()
            .filter(|s| s.state() == SessionState::Animating)
            .map(|s| LeafHandle {
                point: s.control_point(),
                corner: s.plan().corner,
                direction: s.direction(),
            });
        HitContext {
            can_forward: idle && self.has_next_page(),
            can_backward: idle && self.has_previous_page(),
            leaf,
            ..HitContext::new(self.rect, &self.settings)
        }
    }

    /// Feed a pointer event. `PassThrough` and `Tap` results belong to page
    /// content.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> GestureAction {
        let ctx = self.hit_context();
        let progress = self.session.as_ref().map(|s| s.progress()).unwrap_or(0.0);
        let action = self.gesture.handle(&event, &ctx, &self.settings, progress);

        match action {
            GestureAction::Claimed => {
                if matches!(self.gesture.phase(), GesturePhase::CandidateCheck { .. }) {
                    self.set_state(FlipState::FoldCorner);
                } else if self.session.is_none() {
                    self.set_state(FlipState::Read);
                }
            }
            GestureAction::Tap(_) => self.set_state(FlipState::Read),
            GestureAction::BeginDrag {
                corner,
                direction,
                point,
            } => {
                let layout = self.layout();
                let index = self.spread_index();
                let target = match direction {
                    FlipDirection::Forward => layout.spread(index + 1),
                    FlipDirection::Backward => layout.spread(index.saturating_sub(1)),
                };
                let plan = self.plan(direction, target, corner);
                self.session = Some(FlipSession::dragging(plan, &self.settings, point));
                self.set_state(FlipState::UserFold);
            }
            GestureAction::Drag(point) => {
                if let Some(session) = self.session.as_mut() {
                    session.drag_to(point);
                }
            }
            GestureAction::Release { commit } => {
                if let Some(session) = self.session.as_mut() {
                    session.release(commit);
                }
                self.set_state(FlipState::Flipping);
            }
            GestureAction::Regrab(point) => {
                if let Some(session) = self.session.as_mut() {
                    session.grab(point);
                }
                self.set_state(FlipState::UserFold);
            }
            GestureAction::Abort => self.settle_now(),
            GestureAction::PassThrough => {}
        }
        action
    }

    /// Advance the session by `dt` and return the frame to draw, or `None`
    /// when nothing is turning. The frame on which a session settles is
    /// still returned.
    pub fn tick(&mut self, dt: Duration) -> Option<FrameGeometry> {
        let session = self.session.as_mut()?;
        let (_, done) = session.advance(dt);
        let frame = session.frame(&self.settings);
        if done {
            self.finish_session();
        }
        Some(frame)
    }

    /// Frame for the current state without advancing time.
    pub fn frame(&self) -> Option<FrameGeometry> {
        self.session.as_ref().map(|s| s.frame(&self.settings))
    }

    /// Render the pages visible in the current state through the provider.
    pub fn render_pages(&self) -> Vec<RenderedPage<P::Content>> {
        let constraints = PageConstraints::from(self.rect);
        let spread = self.current_spread();
        let mut roles: Vec<(Option<usize>, PageRole)> = Vec::with_capacity(4);

        match &self.session {
            None => {
                roles.push((spread.left, PageRole::Left));
                roles.push((spread.right, PageRole::Right));
            }
            Some(session) => {
                let pages = session.plan().pages;
                if self.layout().spread_width(self.rect) > self.rect.width() {
                    match session.direction() {
                        FlipDirection::Forward => roles.push((spread.left, PageRole::Left)),
                        FlipDirection::Backward => roles.push((spread.right, PageRole::Right)),
                    }
                }
                roles.push((pages.revealed, PageRole::Revealed));
                roles.push((pages.front, PageRole::Front));
                roles.push((pages.back, PageRole::Back));
            }
        }

        roles
            .into_iter()
            .filter_map(|(index, role)| {
                index.map(|index| RenderedPage {
                    index,
                    role,
                    content: self.provider.render(index, constraints),
                })
            })
            .collect()
    }

    // ---- Configuration ----

    /// New page size. A session in flight keeps the size it started with.
    pub fn resize(&mut self, rect: PageRect) {
        debug!("flip controller: resize to {}x{}", rect.width(), rect.height());
        self.rect = rect;
    }

    /// Replace the settings snapshot. A session in flight settles first and
    /// the cursor moves to the start of its spread under the new layout.
    pub fn update_settings(&mut self, settings: FlipSettings) {
        self.settle_now();
        if self.gesture.phase() != GesturePhase::Idle {
            self.gesture = GestureMachine::new();
            self.set_state(FlipState::Read);
        }
        let before = self.current_spread();
        self.settings = settings;
        let spread = self.current_spread();
        debug!("flip controller: settings replaced ({:?} mode)", self.settings.view_mode);
        if let Some(first) = spread.first_page() {
            self.cursor.set(first);
        }
        if spread != before {
            self.emit(PageEvent::PageChanged(spread));
        }
    }

    // ---- Internals ----

    /// Settle the session in flight at its nearest end, committing it if
    /// that is the turned side.
    fn settle_now(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.settle_now();
            self.finish_session();
        }
    }

    fn settle_to(&mut self, turned: bool) {
        if let Some(session) = self.session.as_mut() {
            session.settle_to(turned);
            self.finish_session();
        }
    }

    fn finish_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.gesture.settle();
        if session.is_committed() {
            let spread = self.layout().spread_of(session.destination());
            self.jump_to(spread);
        } else {
            debug!("flip from page {} cancelled", session.page_index());
        }
        self.set_state(FlipState::Read);
    }

    fn set_state(&mut self, state: FlipState) {
        if self.state != state {
            trace!("flip state {:?} -> {:?}", self.state, state);
            self.state = state;
            self.emit(PageEvent::StateChanged(state));
        }
    }

    fn emit(&self, event: PageEvent) {
        // The controller holds a receiver, so the channel never disconnects.
        if let Err(TrySendError::Full(event)) = self.events_tx.try_send(event) {
            if let Ok(dropped) = self.events_rx.try_recv() {
                trace!("event queue full, dropped {:?}", dropped);
            }
            let _ = self.events_tx.try_send(event);
        }
    }
}

/// Terminal progress that moves a session's leaf toward `direction`.
fn redirect_target(session: &FlipSession, direction: FlipDirection) -> f32 {
    if session.direction() == direction { 1.0 } else { 0.0 }
}
