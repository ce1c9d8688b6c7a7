//! Arena tuning
//!
//! Every value defaults to the numbers in [`crate::consts`]. A JSON file may
//! override any subset of them; missing sections and fields keep defaults.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// World extents, broad phase and asteroid population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Edge length of a broad-phase grid cell
    pub grid_cell_size: f32,
    /// Large asteroids created by the initial fill
    pub initial_asteroids: usize,
    /// Turns between edge spawns (0 disables trickle spawning)
    pub edge_spawn_interval: u32,
    /// Trickle spawning only runs while fewer asteroids than this are alive
    pub min_asteroids: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            grid_cell_size: GRID_CELL_SIZE,
            initial_asteroids: NUM_INITIAL_ASTEROIDS,
            edge_spawn_interval: EDGE_SPAWN_INTERVAL,
            min_asteroids: NUM_INITIAL_ASTEROIDS / 2,
        }
    }
}

impl WorldConfig {
    /// World size as a vector
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Ship hull and propulsion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    pub start_hp: i32,
    /// Starting fuel, also the tank capacity
    pub max_fuel: f32,
    pub thrust_power: f32,
    /// Fuel consumed per unit of requested power
    pub thrust_fuel_cost: f32,
    /// Fraction of thrust still delivered on an empty tank
    pub empty_tank_thrust: f32,
    pub max_velocity: f32,
    /// Degrees per turn
    pub rotation_speed: f32,
    pub drag: f32,
    pub min_velocity: f32,
    pub capsule_half_length: f32,
    pub capsule_radius: f32,
    /// Triangle size in screen pixels, converted to world units at death
    pub draw_size: f32,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            start_hp: SHIP_START_HP,
            max_fuel: SHIP_MAX_FUEL,
            thrust_power: THRUST_POWER,
            thrust_fuel_cost: THRUST_FUEL_COST,
            empty_tank_thrust: EMPTY_TANK_THRUST,
            max_velocity: MAX_VELOCITY,
            rotation_speed: ROTATION_SPEED,
            drag: SHIP_DRAG,
            min_velocity: MIN_VELOCITY,
            capsule_half_length: SHIP_CAPSULE_HALF_LENGTH,
            capsule_radius: SHIP_CAPSULE_RADIUS,
            draw_size: SHIP_DRAW_SIZE,
        }
    }
}

/// Phaser, photon torpedo and scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub phaser_range: f32,
    pub phaser_damage: i32,
    pub phaser_cooldown: u32,
    pub beam_lifetime: u32,
    pub photon_speed: f32,
    pub photon_damage: i32,
    pub photon_cooldown: u32,
    pub photon_lifetime: u32,
    pub photon_radius: f32,
    pub scan_range: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            phaser_range: PHASER_RANGE,
            phaser_damage: PHASER_DAMAGE,
            phaser_cooldown: PHASER_COOLDOWN,
            beam_lifetime: PHASER_BEAM_LIFETIME,
            photon_speed: PHOTON_SPEED,
            photon_damage: PHOTON_DAMAGE,
            photon_cooldown: PHOTON_COOLDOWN,
            photon_lifetime: PHOTON_LIFETIME,
            photon_radius: PHOTON_RADIUS,
            scan_range: SCAN_RANGE,
        }
    }
}

/// Asteroid tiers, fragmentation and fuel economy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidConfig {
    pub large_size: f32,
    pub medium_size: f32,
    pub small_size: f32,
    pub large_hp: i32,
    pub medium_hp: i32,
    pub small_hp: i32,
    pub large_sides: usize,
    pub medium_sides: usize,
    pub small_sides: usize,
    pub max_speed: f32,
    pub fuel_pickup_amount: f32,
    pub fuel_pickup_radius: f32,
    pub fuel_hit_reward: f32,
    /// Extra speed given to fragments pushed away from an attacker
    pub push_speed: f32,
    /// Radians between neighbouring fragments in a directed breakup
    pub fragment_spread: f32,
}

impl Default for AsteroidConfig {
    fn default() -> Self {
        Self {
            large_size: LARGE_ASTEROID_SIZE,
            medium_size: MEDIUM_ASTEROID_SIZE,
            small_size: SMALL_ASTEROID_SIZE,
            large_hp: LARGE_ASTEROID_HP,
            medium_hp: MEDIUM_ASTEROID_HP,
            small_hp: SMALL_ASTEROID_HP,
            large_sides: 8,
            medium_sides: 7,
            small_sides: 6,
            max_speed: ASTEROID_MAX_SPEED,
            fuel_pickup_amount: FUEL_PICKUP_AMOUNT,
            fuel_pickup_radius: FUEL_PICKUP_RADIUS,
            fuel_hit_reward: FUEL_HIT_REWARD,
            push_speed: 1.5,
            fragment_spread: 0.8,
        }
    }
}

/// Cosmetic particles and ship debris
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub particle_lifetime: u32,
    pub particle_min_speed: f32,
    pub particle_max_speed: f32,
    pub particle_drag: f32,
    pub particle_length: f32,
    pub particle_wrap: bool,
    pub debris_lifetime: u32,
    pub debris_drag: f32,
    pub debris_per_edge: usize,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            particle_lifetime: PARTICLE_LIFETIME,
            particle_min_speed: PARTICLE_MIN_SPEED,
            particle_max_speed: PARTICLE_MAX_SPEED,
            particle_drag: PARTICLE_DRAG,
            particle_length: PARTICLE_LENGTH,
            particle_wrap: true,
            debris_lifetime: SHIP_DEBRIS_LIFETIME,
            debris_drag: SHIP_DEBRIS_DRAG,
            debris_per_edge: SHIP_DEBRIS_COUNT_PER_EDGE,
        }
    }
}

/// Complete arena configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub world: WorldConfig,
    pub ship: ShipConfig,
    pub weapons: WeaponConfig,
    pub asteroids: AsteroidConfig,
    pub effects: EffectsConfig,
}

impl ArenaConfig {
    /// Parse a (possibly partial) JSON document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from a JSON file, falling back to defaults if it is missing or invalid
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded arena config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Invalid arena config {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read arena config {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }
}
