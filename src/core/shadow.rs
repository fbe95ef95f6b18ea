//! Fold shadows.
//!
//! Two layers, drawn in order:
//!
//! 1. Under-fold shadow: a band along the fold line on the side that does
//!    not move, fading away from the crease. Opacity grows linearly with
//!    progress.
//! 2. Cast shadow: covers the lifted leaf, darkest at the crease. Opacity
//!    follows `sin(pi * progress)`, strongest when the leaf stands upright.

use std::f32::consts::PI;

use log::trace;

use crate::core::types::{Point, Polygon, Segment};

/// Under-fold band width relative to the depth of the lifted leaf.
const UNDER_FOLD_WIDTH_RATIO: f32 = 0.3;

/// Below this the band or leaf is too thin to draw.
const MIN_SHADOW_EXTENT: f32 = 0.5;

/// Which shadow a layer represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowKind {
    UnderFold,
    Cast,
}

/// Linear opacity ramp from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowGradient {
    pub start: Point,
    pub end: Point,
    pub start_opacity: f32,
    pub end_opacity: f32,
}

impl ShadowGradient {
    /// Opacity at `p`, projected onto the ramp axis.
    pub fn opacity_at(&self, p: Point) -> f32 {
        let axis = self.end - self.start;
        let len_sq = axis.dot(axis);
        let t = if len_sq <= f32::EPSILON {
            0.0
        } else {
            ((p - self.start).dot(axis) / len_sq).clamp(0.0, 1.0)
        };
        self.start_opacity + (self.end_opacity - self.start_opacity) * t
    }

    fn translated(&self, offset: Point) -> ShadowGradient {
        ShadowGradient {
            start: self.start + offset,
            end: self.end + offset,
            ..*self
        }
    }
}

/// One shadow polygon with its gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowLayer {
    pub kind: ShadowKind,
    pub shape: Polygon,
    pub gradient: ShadowGradient,
}

impl ShadowLayer {
    pub fn translated(&self, offset: Point) -> ShadowLayer {
        ShadowLayer {
            kind: self.kind,
            shape: self.shape.translated(offset),
            gradient: self.gradient.translated(offset),
        }
    }
}

/// Under-fold shadow opacity at `progress`.
pub fn under_fold_opacity(progress: f32, max_opacity: f32) -> f32 {
    let max = max_opacity.clamp(0.0, 1.0);
    (max * progress.clamp(0.0, 1.0)).clamp(0.0, max)
}

/// Cast shadow opacity at `progress`.
pub fn cast_opacity(progress: f32, max_opacity: f32) -> f32 {
    let max = max_opacity.clamp(0.0, 1.0);
    (max * (PI * progress.clamp(0.0, 1.0)).sin()).clamp(0.0, max)
}

/// Shadow layers for a fold. Empty when `draw_shadow` is off; a layer whose
/// geometry collapses is skipped rather than reported.
pub fn shadows(
    fold_line: &Segment,
    folding_shape: &Polygon,
    progress: f32,
    max_opacity: f32,
    draw_shadow: bool,
) -> Vec<ShadowLayer> {
    if !draw_shadow {
        return Vec::new();
    }

    let (Some(normal), Some(leaf_center)) = (fold_line.normal(), folding_shape.centroid()) else {
        trace!("shadows: no fold line or empty leaf, skipping");
        return Vec::new();
    };

    // Orient the normal toward the leaf.
    let toward_leaf = if (leaf_center - fold_line.start).dot(normal) >= 0.0 {
        normal
    } else {
        normal * -1.0
    };
    let depth = folding_shape
        .points
        .iter()
        .map(|p| (*p - fold_line.start).dot(toward_leaf))
        .fold(0.0_f32, f32::max);
    if depth < MIN_SHADOW_EXTENT || fold_line.length() < MIN_SHADOW_EXTENT {
        trace!("shadows: leaf depth {:.2} too small, skipping", depth);
        return Vec::new();
    }

    let mid = fold_line.midpoint();
    let mut layers = Vec::with_capacity(2);

    let band = depth * UNDER_FOLD_WIDTH_RATIO;
    let away = toward_leaf * -band;
    layers.push(ShadowLayer {
        kind: ShadowKind::UnderFold,
        shape: Polygon::new(vec![
            fold_line.start,
            fold_line.end,
            fold_line.end + away,
            fold_line.start + away,
        ]),
        gradient: ShadowGradient {
            start: mid,
            end: mid + away,
            start_opacity: under_fold_opacity(progress, max_opacity),
            end_opacity: 0.0,
        },
    });

    if !folding_shape.is_degenerate() {
        layers.push(ShadowLayer {
            kind: ShadowKind::Cast,
            shape: folding_shape.clone(),
            gradient: ShadowGradient {
                start: mid,
                end: mid + toward_leaf * depth,
                start_opacity: cast_opacity(progress, max_opacity),
                end_opacity: 0.0,
            },
        });
    }

    layers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical_fold() -> (Segment, Polygon) {
        // Crease at x = 300, leaf mirrored onto the left of it.
        let fold = Segment::new(Point::new(300.0, 0.0), Point::new(300.0, 600.0));
        let leaf = Polygon::new(vec![
            Point::new(300.0, 0.0),
            Point::new(200.0, 0.0),
            Point::new(200.0, 600.0),
            Point::new(300.0, 600.0),
        ]);
        (fold, leaf)
    }

    #[test]
    fn test_disabled_returns_nothing() {
        let (fold, leaf) = vertical_fold();
        assert!(shadows(&fold, &leaf, 0.5, 1.0, false).is_empty());
    }

    #[test]
    fn test_two_layers_in_order() {
        let (fold, leaf) = vertical_fold();
        let layers = shadows(&fold, &leaf, 0.25, 0.8, true);
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].kind, ShadowKind::UnderFold);
        assert_eq!(layers[1].kind, ShadowKind::Cast);

        // Band sits on the far side of the crease from the leaf.
        let band_center = layers[0].shape.centroid().unwrap();
        assert!(band_center.x > 300.0);
        assert!((layers[0].gradient.start_opacity - 0.2).abs() < 1e-5);
        assert_eq!(layers[1].shape, leaf);
    }

    #[test]
    fn test_opacity_profiles() {
        assert_eq!(under_fold_opacity(0.0, 1.0), 0.0);
        assert_eq!(under_fold_opacity(1.0, 0.6), 0.6);
        assert!(cast_opacity(0.5, 1.0) > cast_opacity(0.1, 1.0));
        assert!(cast_opacity(0.5, 1.0) > cast_opacity(0.9, 1.0));
        assert!(cast_opacity(1.0, 1.0) < 1e-5);
        // Ceiling itself is clamped.
        assert_eq!(under_fold_opacity(1.0, 7.0), 1.0);
        assert_eq!(cast_opacity(0.5, -1.0), 0.0);
    }

    #[test]
    fn test_all_opacities_within_ceiling() {
        let (fold, leaf) = vertical_fold();
        for i in 0..=20 {
            let progress = i as f32 / 20.0;
            for layer in shadows(&fold, &leaf, progress, 0.7, true) {
                for o in [layer.gradient.start_opacity, layer.gradient.end_opacity] {
                    assert!((0.0..=0.7).contains(&o));
                }
            }
        }
    }

    #[test]
    fn test_degenerate_inputs_degrade() {
        let point_fold = Segment::new(Point::new(1.0, 1.0), Point::new(1.0, 1.0));
        let (_, leaf) = vertical_fold();
        assert!(shadows(&point_fold, &leaf, 0.5, 1.0, true).is_empty());
        let (fold, _) = vertical_fold();
        assert!(shadows(&fold, &Polygon::default(), 0.5, 1.0, true).is_empty());
    }

    #[test]
    fn test_gradient_sampling() {
        let g = ShadowGradient {
            start: Point::new(0.0, 0.0),
            end: Point::new(10.0, 0.0),
            start_opacity: 1.0,
            end_opacity: 0.0,
        };
        assert_eq!(g.opacity_at(Point::new(5.0, 3.0)), 0.5);
        assert_eq!(g.opacity_at(Point::new(-5.0, 0.0)), 1.0);
    }
}
