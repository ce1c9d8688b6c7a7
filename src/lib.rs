//! Astro Arena - a toroidal arena where scripted ships fight among asteroids
//!
//! Core modules:
//! - `sim`: Arena simulation (entity store, physics, collisions, combat, lifecycle)
//! - `config`: Data-driven arena tuning
//!
//! Rendering, the host turn loop and the ship scripting language live outside
//! this crate. They talk to the arena through the actions in `sim::actions`
//! and by reading the public entity collections on [`sim::Arena`].

pub mod config;
pub mod sim;

pub use config::ArenaConfig;
pub use sim::{Arena, ShipCommand};

use glam::Vec2;

/// Default tuning values
pub mod consts {
    /// Host tick rate (turns per second)
    pub const TICK_RATE_HZ: f64 = 30.0;
    /// Turn limit for a single match
    pub const MAX_TURNS: u32 = 10_000;
    /// Action budget a ship script may spend per turn
    pub const MAX_SCRIPT_COST: u32 = 30;

    /// World dimensions (wraps on both axes)
    pub const WORLD_WIDTH: f32 = 2048.0;
    pub const WORLD_HEIGHT: f32 = 2048.0;
    /// Broad-phase cell edge length
    pub const GRID_CELL_SIZE: f32 = 128.0;

    /// Ship defaults
    pub const SHIP_START_HP: i32 = 10;
    pub const SHIP_MAX_FUEL: f32 = 100.0;
    pub const THRUST_POWER: f32 = 0.25;
    pub const THRUST_FUEL_COST: f32 = 0.05;
    /// Thrust still delivered on an empty tank (fraction of requested power)
    pub const EMPTY_TANK_THRUST: f32 = 0.25;
    pub const MAX_VELOCITY: f32 = 4.0;
    /// Degrees per turn
    pub const ROTATION_SPEED: f32 = 3.0;
    pub const SHIP_DRAG: f32 = 0.98;
    /// Velocity components below this snap to zero
    pub const MIN_VELOCITY: f32 = 0.001;
    pub const SHIP_CAPSULE_HALF_LENGTH: f32 = 15.0;
    pub const SHIP_CAPSULE_RADIUS: f32 = 7.5;
    /// Ship triangle size in screen pixels (matches the renderer)
    pub const SHIP_DRAW_SIZE: f32 = 55.0;

    /// Weapons
    pub const PHASER_RANGE: f32 = 500.0;
    pub const PHASER_DAMAGE: i32 = 1;
    pub const PHASER_COOLDOWN: u32 = 30;
    pub const PHASER_BEAM_LIFETIME: u32 = 3;
    pub const PHOTON_SPEED: f32 = 20.0;
    pub const PHOTON_DAMAGE: i32 = 3;
    pub const PHOTON_COOLDOWN: u32 = 60;
    pub const PHOTON_LIFETIME: u32 = 100;
    pub const PHOTON_RADIUS: f32 = 5.0;
    pub const SCAN_RANGE: f32 = 600.0;

    /// Asteroids
    pub const NUM_INITIAL_ASTEROIDS: usize = 8;
    pub const LARGE_ASTEROID_SIZE: f32 = 75.0;
    pub const MEDIUM_ASTEROID_SIZE: f32 = 37.5;
    pub const SMALL_ASTEROID_SIZE: f32 = 18.0;
    pub const LARGE_ASTEROID_HP: i32 = 3;
    pub const MEDIUM_ASTEROID_HP: i32 = 2;
    pub const SMALL_ASTEROID_HP: i32 = 1;
    pub const ASTEROID_MAX_SPEED: f32 = 2.0;
    pub const FUEL_PICKUP_AMOUNT: f32 = 30.0;
    pub const FUEL_PICKUP_RADIUS: f32 = 50.0;
    /// Fuel restored to the shooter on any weapon hit on an asteroid
    pub const FUEL_HIT_REWARD: f32 = 5.0;
    /// Turns between edge spawns while the field is thin
    pub const EDGE_SPAWN_INTERVAL: u32 = 90;

    /// Particles
    pub const PARTICLE_LIFETIME: u32 = 45;
    pub const PARTICLE_MIN_SPEED: f32 = 1.0;
    pub const PARTICLE_MAX_SPEED: f32 = 6.0;
    pub const PARTICLE_DRAG: f32 = 0.96;
    pub const PARTICLE_LENGTH: f32 = 28.0;

    /// Ship debris (Asteroids-style breakup)
    pub const SHIP_DEBRIS_LIFETIME: u32 = 60;
    pub const SHIP_DEBRIS_DRAG: f32 = 0.97;
    pub const SHIP_DEBRIS_COUNT_PER_EDGE: usize = 2;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360
    if a >= 360.0 { 0.0 } else { a }
}

/// Shortest signed rotation from `from` to `to`, in degrees within [-180, 180]
#[inline]
pub fn angle_difference(from: f32, to: f32) -> f32 {
    let diff = (to - from).rem_euclid(360.0);
    if diff > 180.0 { diff - 360.0 } else { diff }
}

/// Bearing from `from` to `to` in degrees (atan2 convention, not normalized)
#[inline]
pub fn bearing_degrees(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x).to_degrees()
}

/// Unit vector for a facing angle in degrees
#[inline]
pub fn heading(degrees: f32) -> Vec2 {
    polar_to_cartesian(1.0, degrees.to_radians())
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Wrap a position into [0, width) x [0, height)
#[inline]
pub fn wrap_position(pos: Vec2, size: Vec2) -> Vec2 {
    Vec2::new(wrap_axis(pos.x, size.x), wrap_axis(pos.y, size.y))
}

#[inline]
fn wrap_axis(v: f32, extent: f32) -> f32 {
    let w = v.rem_euclid(extent);
    if w >= extent { 0.0 } else { w }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert!((normalize_degrees(-90.0) - 270.0).abs() < 1e-4);
        assert!((normalize_degrees(725.0) - 5.0).abs() < 1e-4);
        assert!(normalize_degrees(-1e-7) < 360.0);
    }

    #[test]
    fn test_angle_difference_takes_short_way() {
        assert!((angle_difference(350.0, 10.0) - 20.0).abs() < 1e-4);
        assert!((angle_difference(10.0, 350.0) + 20.0).abs() < 1e-4);
        assert!((angle_difference(0.0, 90.0) - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_bearing() {
        let b = bearing_degrees(Vec2::ZERO, Vec2::new(0.0, 10.0));
        assert!((b - 90.0).abs() < 1e-4);
        let b = bearing_degrees(Vec2::ZERO, Vec2::new(-10.0, 0.0));
        assert!((b.abs() - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_wrap_scenario() {
        let size = Vec2::new(WORLD, WORLD);
        let p = wrap_position(Vec2::new(2052.0, 1024.0), size);
        assert!((p.x - 4.0).abs() < 1e-3);
        assert_eq!(p.y, 1024.0);
        let p = wrap_position(Vec2::new(-3.0, -2048.0), size);
        assert!((p.x - 2045.0).abs() < 1e-3);
        assert_eq!(p.y, 0.0);
    }

    const WORLD: f32 = consts::WORLD_WIDTH;

    proptest! {
        #[test]
        fn wrap_is_idempotent_inside_bounds(x in 0.0f32..WORLD, y in 0.0f32..WORLD) {
            let size = Vec2::splat(WORLD);
            let p = Vec2::new(x, y);
            prop_assert_eq!(wrap_position(p, size), p);
        }

        #[test]
        fn wrap_is_total(x in -1.0e5f32..1.0e5, y in -1.0e5f32..1.0e5) {
            let size = Vec2::splat(WORLD);
            let p = wrap_position(Vec2::new(x, y), size);
            prop_assert!(p.x >= 0.0 && p.x < WORLD);
            prop_assert!(p.y >= 0.0 && p.y < WORLD);
        }

        #[test]
        fn normalize_stays_in_range(a in -1.0e5f32..1.0e5) {
            let n = normalize_degrees(a);
            prop_assert!((0.0..360.0).contains(&n));
        }
    }
}
