//! Vertex export for GPU rendering of a flip frame.

use bytemuck::{Pod, Zeroable};

use crate::core::flip_session::FrameGeometry;
use crate::core::shadow::{ShadowKind, ShadowLayer};
use crate::core::types::{Point, Polygon};

/// Layer tags, in draw order.
pub const LAYER_STATIC: u32 = 0;
pub const LAYER_REVEALED: u32 = 1;
pub const LAYER_UNDER_FOLD_SHADOW: u32 = 2;
pub const LAYER_FOLDING: u32 = 3;
pub const LAYER_CAST_SHADOW: u32 = 4;

/// Vertex of a flip frame triangle.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FlipVertex {
    /// Spread position
    pub position: [f32; 2],
    /// Page texture coordinates (0..1); zero on shadow layers
    pub tex_coords: [f32; 2],
    /// Shadow opacity on shadow layers, 1.0 on page layers
    pub shade: f32,
    /// One of the `LAYER_*` tags
    pub layer: u32,
}

/// Attribute of [`FlipVertex`], for building a vertex buffer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub offset: usize,
    pub components: u32,
    pub shader_location: u32,
}

impl FlipVertex {
    pub const ATTRIBUTES: [VertexAttribute; 4] = [
        VertexAttribute {
            offset: 0,
            components: 2,
            shader_location: 0,
        },
        VertexAttribute {
            offset: std::mem::size_of::<[f32; 2]>(),
            components: 2,
            shader_location: 1,
        },
        VertexAttribute {
            offset: 2 * std::mem::size_of::<[f32; 2]>(),
            components: 1,
            shader_location: 2,
        },
        VertexAttribute {
            offset: 2 * std::mem::size_of::<[f32; 2]>() + std::mem::size_of::<f32>(),
            components: 1,
            shader_location: 3,
        },
    ];

    pub fn stride() -> usize {
        std::mem::size_of::<FlipVertex>()
    }
}

/// Triangle list for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameVertices {
    pub vertices: Vec<FlipVertex>,
}

impl FrameVertices {
    /// Flatten `frame` into triangles. Shapes with fewer than three points
    /// are skipped.
    pub fn from_frame(frame: &FrameGeometry) -> Self {
        let mut out = Self::default();
        let size = Point::new(frame.page_rect.width(), frame.page_rect.height());
        let page_uv = |p: Point| {
            let local = p - frame.leaf_origin;
            [local.x / size.x, local.y / size.y]
        };

        out.push_fan(&frame.static_shape, LAYER_STATIC, |p, _| (page_uv(p), 1.0));
        out.push_fan(&frame.revealed_shape, LAYER_REVEALED, |p, _| (page_uv(p), 1.0));

        for layer in frame.shadow_layers.iter().filter(|l| l.kind == ShadowKind::UnderFold) {
            out.push_shadow(layer, LAYER_UNDER_FOLD_SHADOW);
        }

        // The back of the leaf samples the page it covered, mirrored.
        let source = &frame.revealed_shape.points;
        out.push_fan(&frame.folding_shape, LAYER_FOLDING, |p, i| {
            let [u, v] = page_uv(source.get(i).copied().unwrap_or(p));
            ([1.0 - u, v], 1.0)
        });

        for layer in frame.shadow_layers.iter().filter(|l| l.kind == ShadowKind::Cast) {
            out.push_shadow(layer, LAYER_CAST_SHADOW);
        }
        out
    }

    fn push_shadow(&mut self, layer: &ShadowLayer, tag: u32) {
        self.push_fan(&layer.shape, tag, |p, _| ([0.0, 0.0], layer.gradient.opacity_at(p)));
    }

    fn push_fan(&mut self, poly: &Polygon, layer: u32, attrs: impl Fn(Point, usize) -> ([f32; 2], f32)) {
        if poly.len() < 3 {
            return;
        }
        let vertex = |i: usize| {
            let p = poly.points[i];
            let (tex_coords, shade) = attrs(p, i);
            FlipVertex {
                position: [p.x, p.y],
                tex_coords,
                shade,
                layer,
            }
        };
        for i in 1..poly.len() - 1 {
            self.vertices.extend([vertex(0), vertex(i), vertex(i + 1)]);
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices of one layer.
    pub fn layer(&self, tag: u32) -> impl Iterator<Item = &FlipVertex> + '_ {
        self.vertices.iter().filter(move |v| v.layer == tag)
    }

    /// Raw bytes for a vertex buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flip_config::FlipSettings;
    use crate::core::flip_session::{FlipPlan, FlipSession};
    use crate::core::spread::LeafPages;
    use crate::core::types::{Corner, FlipDirection, PageRect};

    fn session_at(point: Point) -> FlipSession {
        let plan = FlipPlan {
            page_index: 0,
            destination: 1,
            direction: FlipDirection::Forward,
            corner: Corner::TopRight,
            rect: PageRect::new(400.0, 600.0).unwrap(),
            leaf_origin: Point::ZERO,
            pages: LeafPages::default(),
        };
        FlipSession::dragging(plan, &FlipSettings::default(), point)
    }

    #[test]
    fn test_flat_frame_is_one_quad() {
        let frame = session_at(Point::new(400.0, 0.0)).frame(&FlipSettings::default());
        let verts = FrameVertices::from_frame(&frame);
        assert_eq!(verts.len(), 6);
        assert!(verts.vertices.iter().all(|v| v.layer == LAYER_STATIC));
        assert_eq!(verts.as_bytes().len(), 6 * FlipVertex::stride());
    }

    #[test]
    fn test_folded_frame_layers() {
        let frame = session_at(Point::new(200.0, 0.0)).frame(&FlipSettings::default());
        let verts = FrameVertices::from_frame(&frame);
        for tag in [
            LAYER_STATIC,
            LAYER_REVEALED,
            LAYER_UNDER_FOLD_SHADOW,
            LAYER_FOLDING,
            LAYER_CAST_SHADOW,
        ] {
            assert!(verts.layer(tag).count() >= 3, "layer {} missing", tag);
        }
        for v in verts.layer(LAYER_FOLDING) {
            assert!((0.0..=1.0).contains(&v.tex_coords[0]));
            assert!((0.0..=1.0).contains(&v.tex_coords[1]));
        }
        for v in verts.layer(LAYER_CAST_SHADOW) {
            assert!((0.0..=1.0).contains(&v.shade));
        }
    }

    #[test]
    fn test_attribute_offsets() {
        assert_eq!(FlipVertex::stride(), 24);
        assert_eq!(FlipVertex::ATTRIBUTES[0].offset, 0);
        assert_eq!(FlipVertex::ATTRIBUTES[3].offset, 20);
    }

    #[test]
    fn test_zeroed_is_valid() {
        let v: FlipVertex = bytemuck::Zeroable::zeroed();
        assert_eq!(v.position, [0.0, 0.0]);
        assert_eq!(v.layer, 0);
    }
}
