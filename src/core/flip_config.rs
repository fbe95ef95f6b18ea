//! Flip configuration.
//!
//! `FlipSettings` is an immutable snapshot from the engine's point of view:
//! hosts build one (directly or through the string option interface) and hand
//! the whole value to the controller. Values are clamped when they are set.

use std::collections::HashMap;
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::core::animation::FlipEasing;
use crate::core::error::{FlipError, FlipResult};

/// How many pages are visible at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// One page per spread (portrait)
    #[default]
    Single,
    /// Two facing pages per spread (landscape)
    Double,
}

impl ViewMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single" | "portrait" | "one" => Some(Self::Single),
            "double" | "landscape" | "spread" | "two" => Some(Self::Double),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
        }
    }
}

/// Recognized option keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionKey {
    CornerTriggerAreaSize,
    SwipeDistance,
    FlippingTime,
    DrawShadow,
    MaxShadowOpacity,
    UsePortrait,
    ViewMode,
    ShowCover,
    Easing,
    TapThreshold,
}

/// Option names, including the camelCase spellings hosts commonly pass through.
static OPTION_NAMES: Lazy<HashMap<&'static str, OptionKey>> = Lazy::new(|| {
    HashMap::from([
        ("corner-trigger-area-size", OptionKey::CornerTriggerAreaSize),
        ("cornerTriggerAreaSize", OptionKey::CornerTriggerAreaSize),
        ("swipe-distance", OptionKey::SwipeDistance),
        ("swipeDistance", OptionKey::SwipeDistance),
        ("flipping-time", OptionKey::FlippingTime),
        ("flippingTime", OptionKey::FlippingTime),
        ("draw-shadow", OptionKey::DrawShadow),
        ("drawShadow", OptionKey::DrawShadow),
        ("max-shadow-opacity", OptionKey::MaxShadowOpacity),
        ("maxShadowOpacity", OptionKey::MaxShadowOpacity),
        ("use-portrait", OptionKey::UsePortrait),
        ("usePortrait", OptionKey::UsePortrait),
        ("page-view-mode", OptionKey::ViewMode),
        ("pageViewMode", OptionKey::ViewMode),
        ("view-mode", OptionKey::ViewMode),
        ("show-cover", OptionKey::ShowCover),
        ("showCover", OptionKey::ShowCover),
        ("easing", OptionKey::Easing),
        ("flip-easing", OptionKey::Easing),
        ("tap-threshold", OptionKey::TapThreshold),
        ("tapThreshold", OptionKey::TapThreshold),
    ])
});

/// Flip behaviour settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FlipSettings {
    /// Corner hot zone radius as a fraction of the page diagonal (0.0 - 0.5)
    pub corner_trigger_area_size: f32,

    /// Drag distance (units) a release needs to commit the flip
    pub swipe_distance: f32,

    /// Duration of a full flip, from flat to turned
    pub flipping_time: Duration,

    /// Draw fold shadows
    pub draw_shadow: bool,

    /// Shadow opacity ceiling (0.0 - 1.0)
    pub max_shadow_opacity: f32,

    /// Single or double page spread
    pub view_mode: ViewMode,

    /// In double mode, show page 0 alone as a cover
    pub show_cover: bool,

    /// Curve used for settle and programmatic flips
    pub easing: FlipEasing,

    /// Pointer jitter tolerated before a corner press becomes a drag
    pub tap_threshold: f32,
}

impl Default for FlipSettings {
    fn default() -> Self {
        Self {
            corner_trigger_area_size: 0.15,
            swipe_distance: 80.0,
            flipping_time: Duration::from_millis(700),
            draw_shadow: true,
            max_shadow_opacity: 1.0,
            view_mode: ViewMode::Single,
            show_cover: false,
            easing: FlipEasing::EaseOut,
            tap_threshold: 5.0,
        }
    }
}

impl FlipSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set option by name. Unknown names and unparsable values are errors;
    /// out-of-range numbers are clamped.
    pub fn set_option(&mut self, name: &str, value: &str) -> FlipResult<()> {
        let key = OPTION_NAMES
            .get(name)
            .copied()
            .ok_or_else(|| FlipError::UnknownOption(name.to_string()))?;
        let invalid = || FlipError::InvalidOptionValue {
            name: name.to_string(),
            value: value.to_string(),
        };

        match key {
            OptionKey::CornerTriggerAreaSize => {
                let v = parse_f32(value).ok_or_else(invalid)?;
                self.corner_trigger_area_size = v.clamp(0.0, 0.5);
            }
            OptionKey::SwipeDistance => {
                let v = parse_f32(value).ok_or_else(invalid)?;
                self.swipe_distance = v.max(0.0);
            }
            OptionKey::FlippingTime => {
                let ms = value.trim().parse::<u64>().map_err(|_| invalid())?;
                self.flipping_time = Duration::from_millis(ms.min(10_000));
            }
            OptionKey::DrawShadow => {
                self.draw_shadow = parse_bool(value).ok_or_else(invalid)?;
            }
            OptionKey::MaxShadowOpacity => {
                let v = parse_f32(value).ok_or_else(invalid)?;
                self.max_shadow_opacity = v.clamp(0.0, 1.0);
            }
            OptionKey::UsePortrait => {
                let portrait = parse_bool(value).ok_or_else(invalid)?;
                self.view_mode = if portrait { ViewMode::Single } else { ViewMode::Double };
            }
            OptionKey::ViewMode => {
                self.view_mode = ViewMode::from_str(value).ok_or_else(invalid)?;
            }
            OptionKey::ShowCover => {
                self.show_cover = parse_bool(value).ok_or_else(invalid)?;
            }
            OptionKey::Easing => {
                self.easing = FlipEasing::from_str(value).ok_or_else(invalid)?;
            }
            OptionKey::TapThreshold => {
                let v = parse_f32(value).ok_or_else(invalid)?;
                self.tap_threshold = v.max(0.0);
            }
        }
        Ok(())
    }

    /// Builder form of [`FlipSettings::set_option`].
    pub fn with_option(mut self, name: &str, value: &str) -> FlipResult<Self> {
        self.set_option(name, value)?;
        Ok(self)
    }

    /// Get option value as string
    pub fn get_option(&self, name: &str) -> Option<String> {
        let key = OPTION_NAMES.get(name)?;
        Some(match key {
            OptionKey::CornerTriggerAreaSize => self.corner_trigger_area_size.to_string(),
            OptionKey::SwipeDistance => self.swipe_distance.to_string(),
            OptionKey::FlippingTime => self.flipping_time.as_millis().to_string(),
            OptionKey::DrawShadow => bool_str(self.draw_shadow),
            OptionKey::MaxShadowOpacity => self.max_shadow_opacity.to_string(),
            OptionKey::UsePortrait => bool_str(self.view_mode == ViewMode::Single),
            OptionKey::ViewMode => self.view_mode.as_str().to_string(),
            OptionKey::ShowCover => bool_str(self.show_cover),
            OptionKey::Easing => self.easing.as_str().to_string(),
            OptionKey::TapThreshold => self.tap_threshold.to_string(),
        })
    }

    /// Shadow opacity ceiling, or zero when shadows are off.
    pub fn effective_shadow_opacity(&self) -> f32 {
        if self.draw_shadow {
            self.max_shadow_opacity.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

fn parse_f32(s: &str) -> Option<f32> {
    s.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "t" | "true" | "1" | "yes" | "on" => Some(true),
        "nil" | "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn bool_str(b: bool) -> String {
    if b { "true".to_string() } else { "false".to_string() }
}
