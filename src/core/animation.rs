//! Flip animation curve - time based progress between two fold states.

use std::time::Duration;

/// Easing function for flip animations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlipEasing {
    Linear,
    #[default]
    EaseOut,
    EaseIn,
    EaseInOut,
}

impl FlipEasing {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(Self::Linear),
            "ease-out" | "easeout" | "out" => Some(Self::EaseOut),
            "ease-in" | "easein" | "in" => Some(Self::EaseIn),
            "ease-in-out" | "easeinout" | "in-out" => Some(Self::EaseInOut),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseOut => "ease-out",
            Self::EaseIn => "ease-in",
            Self::EaseInOut => "ease-in-out",
        }
    }

    /// Map normalized time to normalized progress. Both ends are fixed points
    /// and the curve never leaves [0, 1].
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t * t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Progress animation of a single flip session.
///
/// Progress runs from `start_progress` to `target_progress` over
/// `total_duration`, shaped by `easing`. A redirect restarts the curve from
/// the current value so the leaf never jumps.
#[derive(Debug, Clone)]
pub struct FlipAnimation {
    /// Progress when the current curve started
    pub start_progress: f32,

    /// Terminal value: 0.0 (flat) or 1.0 (turned)
    pub target_progress: f32,

    /// Time spent on the current curve
    pub elapsed: Duration,

    /// Length of the current curve
    pub total_duration: Duration,

    /// Easing function
    pub easing: FlipEasing,

    /// Progress at the last advance
    progress: f32,

    /// Set once normalized time reached 1
    completed: bool,
}

impl FlipAnimation {
    pub fn new(start: f32, target: f32, duration: Duration, easing: FlipEasing) -> Self {
        let start = start.clamp(0.0, 1.0);
        Self {
            start_progress: start,
            target_progress: target.clamp(0.0, 1.0),
            elapsed: Duration::ZERO,
            total_duration: duration,
            easing,
            progress: start,
            completed: false,
        }
    }

    /// Curve whose length scales with the distance still to travel, so a
    /// release near the end settles quickly.
    pub fn scaled(start: f32, target: f32, full_duration: Duration, easing: FlipEasing) -> Self {
        let span = (target - start).abs().clamp(0.0, 1.0);
        Self::new(start, target, full_duration.mul_f32(span), easing)
    }

    /// Advance by `dt`. Returns the new progress and whether the curve is done.
    ///
    /// On completion the progress is exactly the target value.
    pub fn advance(&mut self, dt: Duration) -> (f32, bool) {
        if self.completed {
            return (self.progress, true);
        }

        self.elapsed += dt;
        let t = if self.total_duration.is_zero() {
            1.0
        } else {
            self.elapsed.as_secs_f32() / self.total_duration.as_secs_f32()
        };

        if t >= 1.0 {
            self.progress = self.target_progress;
            self.completed = true;
            return (self.progress, true);
        }

        let eased = self.easing.apply(t);
        self.progress =
            self.start_progress + (self.target_progress - self.start_progress) * eased;
        (self.progress, false)
    }

    /// Point the curve at a new target, starting from the current progress.
    pub fn redirect(&mut self, target: f32, full_duration: Duration) {
        let current = self.progress;
        *self = Self::scaled(current, target, full_duration, self.easing);
    }

    /// Fraction of the way from start to target, in [0, 1].
    pub fn fraction(&self) -> f32 {
        let span = self.target_progress - self.start_progress;
        if span.abs() <= f32::EPSILON {
            1.0
        } else {
            ((self.progress - self.start_progress) / span).clamp(0.0, 1.0)
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }
}
