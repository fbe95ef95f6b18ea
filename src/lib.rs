//! Page Flip Engine
//!
//! Geometry and state machine behind an interactive page-turn effect: pages
//! that can be dragged by a corner, released, or turned programmatically,
//! folding along a straight crease with shadows and an eased settle.
//!
//! # Architecture
//!
//! ```text
//! pointer events ──► GestureMachine ──┐
//!                                     ├──► FlipSession ──► geometry + shadow ──► FrameGeometry
//! flip_next / flip_to_page ───────────┘        ▲
//!                                              └── FlipAnimation (per tick)
//! ```
//!
//! [`FlipController`] ties it together and publishes [`PageEvent`]s. Drawing
//! is left to the host; `backend::vertex` flattens a frame into GPU vertices.

pub mod core;
pub mod backend;

pub use crate::core::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install `env_logger` for hosts without their own logger. Safe to call more
/// than once.
pub fn init() {
    if env_logger::try_init().is_ok() {
        log::info!("page-flip engine v{} initialized", VERSION);
    }
}
