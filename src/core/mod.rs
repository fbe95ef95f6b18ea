//! Flip engine core: geometry, shadows, animation, gestures and the controller.

pub mod types;
pub mod error;
pub mod flip_config;
pub mod geometry;
pub mod shadow;
pub mod animation;
pub mod spread;
pub mod flip_session;
pub mod gesture;
pub mod controller;

pub use types::*;
pub use error::*;
pub use flip_config::*;
pub use geometry::*;
pub use shadow::*;
pub use animation::*;
pub use spread::*;
pub use flip_session::*;
pub use gesture::*;
pub use controller::*;
