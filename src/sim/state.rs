//! Arena entity store
//!
//! Every entity class lives in a flat `Vec`. Indices are stable for the whole
//! session: dead ships and asteroids stay in place with `alive = false`, so a
//! torpedo's owner index or a host-side ship handle never dangles.

use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::{Capsule, Circle, ConvexPolygon, Torus};
use super::grid::SpatialGrid;
use crate::config::{ArenaConfig, AsteroidConfig, ShipConfig};
use crate::heading;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Offset each color channel independently by up to `spread`
    pub fn jittered<R: Rng + ?Sized>(self, rng: &mut R, spread: i16) -> Self {
        let mut channel = |c: u8| (c as i16 + rng.random_range(-spread..=spread)).clamp(0, 255) as u8;
        Self {
            r: channel(self.r),
            g: channel(self.g),
            b: channel(self.b),
            a: self.a,
        }
    }
}

/// Immutable ship class descriptor, owned by the host's registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipType {
    pub name: String,
}

impl ShipType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Outcome of the last scan
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanResult {
    /// Something was in range
    pub hit: bool,
    pub distance: f32,
    /// Bearing in degrees, [0, 360)
    pub angle: f32,
}

/// A ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Facing in degrees, [0, 360)
    pub angle: f32,
    /// Facing the ship is rotating toward
    pub target_angle: f32,
    pub hp: i32,
    pub fuel: f32,
    pub alive: bool,
    pub phaser_cooldown: u32,
    pub photon_cooldown: u32,
    pub scan: ScanResult,
    /// Last signalled value (-1 = none this turn)
    pub signal: i32,
    pub color: Color,
    #[serde(skip)]
    pub kind: Option<Arc<ShipType>>,
}

impl Ship {
    pub fn new(kind: Option<Arc<ShipType>>, pos: Vec2, angle: f32, color: Color, config: &ShipConfig) -> Self {
        let angle = crate::normalize_degrees(angle);
        Self {
            pos,
            vel: Vec2::ZERO,
            angle,
            target_angle: angle,
            hp: config.start_hp,
            fuel: config.max_fuel,
            alive: true,
            phaser_cooldown: 0,
            photon_cooldown: 0,
            scan: ScanResult::default(),
            signal: -1,
            color,
            kind,
        }
    }

    /// Display name from the ship type, "Ship" if untyped
    pub fn name(&self) -> &str {
        self.kind.as_deref().map_or("Ship", |k| k.name.as_str())
    }

    /// Unit vector along the current facing
    pub fn heading(&self) -> Vec2 {
        heading(self.angle)
    }

    pub fn can_fire_phaser(&self) -> bool {
        self.alive && self.phaser_cooldown == 0
    }

    pub fn can_fire_photon(&self) -> bool {
        self.alive && self.photon_cooldown == 0
    }

    /// Collision hull: a capsule along the facing axis
    pub fn capsule(&self, config: &ShipConfig) -> Capsule {
        let half = self.heading() * config.capsule_half_length;
        Capsule::new(self.pos - half, self.pos + half, config.capsule_radius)
    }
}

/// Asteroid size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsteroidTier {
    Large,
    Medium,
    Small,
}

impl AsteroidTier {
    /// Classify a continuous size against the tier thresholds
    pub fn from_size(size: f32, config: &AsteroidConfig) -> Self {
        if size > config.medium_size {
            AsteroidTier::Large
        } else if size > config.small_size {
            AsteroidTier::Medium
        } else {
            AsteroidTier::Small
        }
    }

    pub fn size(self, config: &AsteroidConfig) -> f32 {
        match self {
            AsteroidTier::Large => config.large_size,
            AsteroidTier::Medium => config.medium_size,
            AsteroidTier::Small => config.small_size,
        }
    }

    pub fn hp(self, config: &AsteroidConfig) -> i32 {
        match self {
            AsteroidTier::Large => config.large_hp,
            AsteroidTier::Medium => config.medium_hp,
            AsteroidTier::Small => config.small_hp,
        }
    }

    /// Outline vertex count
    pub fn sides(self, config: &AsteroidConfig) -> usize {
        match self {
            AsteroidTier::Large => config.large_sides,
            AsteroidTier::Medium => config.medium_sides,
            AsteroidTier::Small => config.small_sides,
        }
    }

    /// Tier of the fragments produced on breakup (`None`: consumed)
    pub fn fragment(self) -> Option<AsteroidTier> {
        match self {
            AsteroidTier::Large => Some(AsteroidTier::Medium),
            AsteroidTier::Medium => Some(AsteroidTier::Small),
            AsteroidTier::Small => None,
        }
    }
}

/// An asteroid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub hp: i32,
    pub alive: bool,
    /// Outline relative to `pos`, shared by rendering and collision
    pub outline: ConvexPolygon,
}

impl Asteroid {
    pub fn tier(&self, config: &AsteroidConfig) -> AsteroidTier {
        AsteroidTier::from_size(self.size, config)
    }
}

/// A photon torpedo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Torpedo {
    pub pos: Vec2,
    /// Position before the last integration step (sweep start)
    pub prev_pos: Vec2,
    pub vel: Vec2,
    /// Turns left before the torpedo fizzles
    pub lifetime: u32,
    pub damage: i32,
    /// Index of the firing ship
    pub owner: Option<usize>,
    pub alive: bool,
    /// Spin/pulse animation phase
    pub anim: f32,
}

impl Torpedo {
    pub fn circle(&self, radius: f32) -> Circle {
        Circle::new(self.pos, radius)
    }
}

/// Phaser beam (visual only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beam {
    pub start: Vec2,
    pub end: Vec2,
    pub lifetime: u32,
    pub start_lifetime: u32,
    pub color: Color,
    pub alive: bool,
}

impl Beam {
    /// Remaining intensity, 1 when fresh
    pub fn fade(&self) -> f32 {
        fade(self.lifetime, self.start_lifetime)
    }
}

/// Vector spark (visual only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Streak length scale
    pub length: f32,
    pub lifetime: u32,
    pub start_lifetime: u32,
    pub color: Color,
    pub alive: bool,
}

impl Particle {
    pub fn fade(&self) -> f32 {
        fade(self.lifetime, self.start_lifetime)
    }
}

/// Piece of a destroyed ship's outline (visual only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebrisSegment {
    pub a: Vec2,
    pub b: Vec2,
    /// Drift applied to both endpoints
    pub vel: Vec2,
    /// Spin about the midpoint (radians per turn)
    pub ang_vel: f32,
    pub lifetime: u32,
    pub start_lifetime: u32,
    pub color: Color,
    pub alive: bool,
}

impl DebrisSegment {
    pub fn fade(&self) -> f32 {
        fade(self.lifetime, self.start_lifetime)
    }
}

fn fade(lifetime: u32, start: u32) -> f32 {
    if start == 0 {
        0.0
    } else {
        lifetime as f32 / start as f32
    }
}

/// Narrative event callback
pub type LogSink = Box<dyn FnMut(&str)>;

/// The arena: sole owner of every entity collection
pub struct Arena {
    pub config: ArenaConfig,
    pub ships: Vec<Ship>,
    pub torpedoes: Vec<Torpedo>,
    pub beams: Vec<Beam>,
    pub particles: Vec<Particle>,
    pub asteroids: Vec<Asteroid>,
    pub debris: Vec<DebrisSegment>,
    /// Where ships signalled this turn
    pub signals: Vec<Vec2>,
    /// Screen pixels per world unit, maintained by the renderer
    pub render_scale: f32,
    /// Completed simulation steps
    pub time_ticks: u64,
    /// Turns until the next edge spawn is allowed
    pub edge_spawn_cooldown: u32,
    pub(crate) grid: SpatialGrid,
    pub(crate) rng: Pcg32,
    seed: u64,
    log_sink: Option<LogSink>,
}

impl Arena {
    /// Create an empty arena with its own seeded generator
    pub fn new(config: ArenaConfig, seed: u64) -> Self {
        let grid = SpatialGrid::new(config.world.grid_cell_size, config.world.size());
        Self {
            config,
            ships: Vec::new(),
            torpedoes: Vec::new(),
            beams: Vec::new(),
            particles: Vec::new(),
            asteroids: Vec::new(),
            debris: Vec::new(),
            signals: Vec::new(),
            render_scale: 1.0,
            time_ticks: 0,
            edge_spawn_cooldown: 0,
            grid,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            log_sink: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Drop every entity for a new session (the generator keeps running)
    pub fn reset(&mut self) {
        self.ships.clear();
        self.torpedoes.clear();
        self.beams.clear();
        self.particles.clear();
        self.asteroids.clear();
        self.debris.clear();
        self.signals.clear();
        self.time_ticks = 0;
        self.edge_spawn_cooldown = 0;
        self.rebuild_grid();
    }

    /// Register a ship and return its stable index
    pub fn add_ship(&mut self, kind: Option<Arc<ShipType>>, pos: Vec2, angle: f32, color: Color) -> usize {
        let pos = self.torus().wrap(pos);
        self.ships.push(Ship::new(kind, pos, angle, color, &self.config.ship));
        self.ships.len() - 1
    }

    pub fn torus(&self) -> Torus {
        Torus::new(self.config.world.size())
    }

    pub fn alive_ships(&self) -> impl Iterator<Item = (usize, &Ship)> {
        self.ships.iter().enumerate().filter(|(_, s)| s.alive)
    }

    pub fn alive_asteroid_count(&self) -> usize {
        self.asteroids.iter().filter(|a| a.alive).count()
    }

    /// Route narrative events to an external sink (in addition to `log`)
    pub fn set_log_sink(&mut self, sink: impl FnMut(&str) + 'static) {
        self.log_sink = Some(Box::new(sink));
    }

    pub fn clear_log_sink(&mut self) {
        self.log_sink = None;
    }

    pub(crate) fn narrate(&mut self, message: &str) {
        log::info!("{message}");
        if let Some(sink) = self.log_sink.as_mut() {
            sink(message);
        }
    }

    pub(crate) fn ship_name(&self, index: usize) -> String {
        self.ships
            .get(index)
            .map_or("Ship", |s| s.name())
            .to_string()
    }

    /// Re-bin bodies, recreating the grid if the world or cell size changed
    pub(crate) fn rebuild_grid(&mut self) {
        let world = &self.config.world;
        if !self.grid.matches(world.grid_cell_size, world.size()) {
            self.grid = SpatialGrid::new(world.grid_cell_size, world.size());
        }
        self.grid.rebuild(&self.ships, &self.asteroids);
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("seed", &self.seed)
            .field("time_ticks", &self.time_ticks)
            .field("ships", &self.ships.len())
            .field("asteroids", &self.asteroids.len())
            .field("torpedoes", &self.torpedoes.len())
            .field("particles", &self.particles.len())
            .field("debris", &self.debris.len())
            .field("has_log_sink", &self.log_sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_tier_thresholds() {
        let cfg = AsteroidConfig::default();
        assert_eq!(AsteroidTier::from_size(75.0, &cfg), AsteroidTier::Large);
        assert_eq!(AsteroidTier::from_size(37.5, &cfg), AsteroidTier::Medium);
        assert_eq!(AsteroidTier::from_size(20.0, &cfg), AsteroidTier::Medium);
        assert_eq!(AsteroidTier::from_size(18.0, &cfg), AsteroidTier::Small);
        assert_eq!(AsteroidTier::Large.fragment(), Some(AsteroidTier::Medium));
        assert_eq!(AsteroidTier::Small.fragment(), None);
        assert!(AsteroidTier::Large.hp(&cfg) > AsteroidTier::Small.hp(&cfg));
    }

    #[test]
    fn test_add_ship_defaults() {
        let mut arena = Arena::new(ArenaConfig::default(), 1);
        let kind = Arc::new(ShipType::new("Viper"));
        let idx = arena.add_ship(Some(kind), Vec2::new(100.0, 200.0), -90.0, Color::WHITE);
        let ship = &arena.ships[idx];
        assert_eq!(ship.name(), "Viper");
        assert_eq!(ship.hp, arena.config.ship.start_hp);
        assert_eq!(ship.fuel, arena.config.ship.max_fuel);
        assert!((ship.angle - 270.0).abs() < 1e-4);
        assert_eq!(ship.target_angle, ship.angle);
        assert_eq!(ship.signal, -1);

        let anon = arena.add_ship(None, Vec2::ZERO, 0.0, Color::WHITE);
        assert_eq!(arena.ships[anon].name(), "Ship");
        assert_eq!(arena.ship_name(99), "Ship");
    }

    #[test]
    fn test_ship_capsule_follows_facing() {
        let cfg = ShipConfig::default();
        let ship = Ship::new(None, Vec2::new(50.0, 50.0), 90.0, Color::WHITE, &cfg);
        let cap = ship.capsule(&cfg);
        assert!((cap.a - Vec2::new(50.0, 35.0)).length() < 1e-3);
        assert!((cap.b - Vec2::new(50.0, 65.0)).length() < 1e-3);
        assert_eq!(cap.radius, cfg.capsule_radius);
    }

    #[test]
    fn test_torpedo_circle_matches_inflated_sweep() {
        use crate::sim::geometry::{Ray, Shape};

        let torpedo = Torpedo {
            pos: Vec2::new(100.0, 0.0),
            prev_pos: Vec2::new(80.0, 0.0),
            vel: Vec2::new(20.0, 0.0),
            lifetime: 10,
            damage: 3,
            owner: Some(0),
            alive: true,
            anim: 0.0,
        };
        // A point sweeping into the torpedo's circle meets it where a circle
        // sweeping into the point would
        let ray = Ray::segment(Vec2::new(120.0, 0.0), Vec2::new(100.0, 0.0));
        let t = torpedo.circle(5.0).raycast(&ray).unwrap();
        assert!((t - 0.75).abs() < 1e-4);
    }

    #[test]
    fn test_log_sink_receives_messages() {
        let mut arena = Arena::new(ArenaConfig::default(), 1);
        arena.narrate("no sink yet");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        arena.set_log_sink(move |msg| sink.borrow_mut().push(msg.to_string()));
        arena.narrate("hello");
        arena.clear_log_sink();
        arena.narrate("dropped");

        assert_eq!(*seen.borrow(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_color_jitter_stays_in_range() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..200 {
            let c = Color::rgb(250, 5, 128).jittered(&mut rng, 40);
            assert!(c.r >= 210);
            assert!(c.g <= 45);
            assert!((88..=168).contains(&c.b));
            assert_eq!(c.a, 255);
        }
    }
}
