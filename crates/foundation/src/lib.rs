//! Identifiers and coordinate math shared by the map-facing crates.

pub mod ids;
pub mod math;

pub use ids::*;
pub use math::{Position, Vec2, Viewport};
