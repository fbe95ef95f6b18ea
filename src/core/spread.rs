//! Spread layout: which pages are visible together and where they sit.
//!
//! Single mode shows one page per spread. Double mode shows facing pages;
//! with a cover, page 0 sits alone on the right of the first spread and
//! the rest pair up as (1, 2), (3, 4), ...

use crate::core::flip_config::ViewMode;
use crate::core::types::{FlipDirection, PageRect, Point};

/// Pages visible in one spread. In single mode only `left` is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Spread {
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl Spread {
    /// First visible page, the value the cursor stores.
    pub fn first_page(&self) -> Option<usize> {
        self.left.or(self.right)
    }

    pub fn contains(&self, page: usize) -> bool {
        self.left == Some(page) || self.right == Some(page)
    }
}

/// Page-to-spread mapping for one book configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpreadLayout {
    pub page_count: usize,
    pub mode: ViewMode,
    pub show_cover: bool,
}

impl SpreadLayout {
    pub fn new(page_count: usize, mode: ViewMode, show_cover: bool) -> Self {
        Self {
            page_count,
            mode,
            show_cover,
        }
    }

    fn page(&self, index: usize) -> Option<usize> {
        (index < self.page_count).then_some(index)
    }

    pub fn spread_count(&self) -> usize {
        match (self.mode, self.show_cover) {
            (ViewMode::Single, _) => self.page_count,
            (ViewMode::Double, false) => self.page_count.div_ceil(2),
            (ViewMode::Double, true) => {
                if self.page_count == 0 {
                    0
                } else {
                    1 + self.page_count / 2
                }
            }
        }
    }

    /// Spread holding `page`. Pages past the end map to the last spread.
    pub fn spread_index_of(&self, page: usize) -> usize {
        let page = page.min(self.page_count.saturating_sub(1));
        match (self.mode, self.show_cover) {
            (ViewMode::Single, _) => page,
            (ViewMode::Double, false) => page / 2,
            (ViewMode::Double, true) => page.div_ceil(2),
        }
    }

    pub fn spread(&self, index: usize) -> Spread {
        match (self.mode, self.show_cover) {
            (ViewMode::Single, _) => Spread {
                left: self.page(index),
                right: None,
            },
            (ViewMode::Double, false) => Spread {
                left: self.page(2 * index),
                right: self.page(2 * index + 1),
            },
            (ViewMode::Double, true) => {
                if index == 0 {
                    Spread {
                        left: None,
                        right: self.page(0),
                    }
                } else {
                    Spread {
                        left: self.page(2 * index - 1),
                        right: self.page(2 * index),
                    }
                }
            }
        }
    }

    pub fn spread_of(&self, page: usize) -> Spread {
        self.spread(self.spread_index_of(page))
    }

    /// First page of the spread holding `page`.
    pub fn normalize(&self, page: usize) -> usize {
        self.spread_of(page).first_page().unwrap_or(0)
    }

    /// Width of the whole spread area for a page size.
    pub fn spread_width(&self, rect: PageRect) -> f32 {
        match self.mode {
            ViewMode::Single => rect.width(),
            ViewMode::Double => 2.0 * rect.width(),
        }
    }

    /// Offset of the turning leaf inside the spread area. Forward flips turn
    /// the right-hand page, backward flips the left-hand one.
    pub fn leaf_offset(&self, rect: PageRect, direction: FlipDirection) -> Point {
        match (self.mode, direction) {
            (ViewMode::Double, FlipDirection::Forward) => Point::new(rect.width(), 0.0),
            _ => Point::ZERO,
        }
    }
}

/// Page roles while a leaf turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeafPages {
    /// Page on the front of the turning leaf, drawn on the static part
    pub front: Option<usize>,
    /// Page on the back of the leaf, drawn on the folding shape
    pub back: Option<usize>,
    /// Page uncovered under the lifted corner
    pub revealed: Option<usize>,
}

impl LeafPages {
    /// Roles for a turn from spread `from` to spread `to`.
    pub fn for_turn(layout: &SpreadLayout, from: Spread, to: Spread, direction: FlipDirection) -> Self {
        match (layout.mode, direction) {
            (ViewMode::Single, _) => LeafPages {
                front: from.left,
                back: None,
                revealed: to.left,
            },
            (ViewMode::Double, FlipDirection::Forward) => LeafPages {
                front: from.right,
                back: to.left,
                revealed: to.right,
            },
            (ViewMode::Double, FlipDirection::Backward) => LeafPages {
                front: from.left,
                back: to.right,
                revealed: to.left,
            },
        }
    }
}
