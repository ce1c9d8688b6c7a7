//! Deterministic arena simulation
//!
//! All gameplay logic lives here:
//! - Turn-paced: one call to [`Arena::tick`] is one turn
//! - Seeded RNG owned by the arena, no global state
//! - Stable iteration order (by entity index)
//! - No rendering or platform dependencies

pub mod actions;
pub mod collision;
pub mod geometry;
pub mod grid;
pub mod lifecycle;
pub mod physics;
pub mod state;
pub mod tick;

pub use actions::ShipCommand;
pub use collision::{Impact, Target};
pub use geometry::{Capsule, Circle, ConvexPolygon, Ray, RoundedPolygon, Shape, Torus};
pub use grid::SpatialGrid;
pub use state::{
    Arena, Asteroid, AsteroidTier, Beam, Color, DebrisSegment, LogSink, Particle, ScanResult, Ship,
    ShipType, Torpedo,
};
