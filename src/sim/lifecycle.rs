//! Spawning, breakup and destruction
//!
//! Everything that creates or retires entities: asteroid fills and edge
//! spawns, the fragmentation cascade, ship kills with their debris, particle
//! bursts, and reaping of spent effects between turns.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;

use super::geometry::ConvexPolygon;
use super::state::{Arena, Asteroid, AsteroidTier, Color, DebrisSegment, Particle};
use crate::{bearing_degrees, heading, polar_to_cartesian};

/// Uniform sample from `[lo, hi)`, or `lo` for an empty range
fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Irregular convex outline: vertices at even angles with radii jittered
/// by +-30%, then hulled
pub fn random_outline<R: Rng + ?Sized>(rng: &mut R, sides: usize, radius: f32) -> ConvexPolygon {
    let sides = sides.max(3);
    let points: Vec<Vec2> = (0..sides)
        .map(|i| {
            let theta = i as f32 / sides as f32 * TAU;
            polar_to_cartesian(uniform(rng, radius * 0.7, radius * 1.3), theta)
        })
        .collect();
    ConvexPolygon::from_points(&points).unwrap_or_else(|| ConvexPolygon::regular(sides, radius))
}

impl Arena {
    /// Add an asteroid of the given tier with a fresh outline
    pub fn spawn_asteroid(&mut self, tier: AsteroidTier, pos: Vec2, vel: Vec2) -> usize {
        let cfg = &self.config.asteroids;
        let (size, hp, sides) = (tier.size(cfg), tier.hp(cfg), tier.sides(cfg));
        let outline = random_outline(&mut self.rng, sides, size);
        let pos = self.torus().wrap(pos);
        self.asteroids.push(Asteroid {
            pos,
            vel,
            size,
            hp,
            alive: true,
            outline,
        });
        self.asteroids.len() - 1
    }

    /// Initial fill: large asteroids at random interior positions
    pub fn spawn_asteroids(&mut self, count: usize) {
        const MARGIN: f32 = 100.0;
        let world = self.config.world.size();
        let max_speed = self.config.asteroids.max_speed;
        for _ in 0..count {
            let pos = Vec2::new(
                uniform(&mut self.rng, MARGIN, world.x - MARGIN),
                uniform(&mut self.rng, MARGIN, world.y - MARGIN),
            );
            let angle = self.rng.random_range(0.0..TAU);
            let speed = uniform(&mut self.rng, 0.3, max_speed);
            self.spawn_asteroid(AsteroidTier::Large, pos, polar_to_cartesian(speed, angle));
        }
        log::debug!("Spawned {count} asteroids");
    }

    /// Trickle spawn: one large asteroid just inside a random edge, drifting
    /// toward the world centre
    pub fn spawn_asteroid_from_edge(&mut self) -> usize {
        const INSET: f32 = 8.0;
        let world = self.config.world.size();
        let max_speed = self.config.asteroids.max_speed;

        let pos = match self.rng.random_range(0..4) {
            0 => Vec2::new(uniform(&mut self.rng, 0.0, world.x), INSET),
            1 => Vec2::new(world.x - INSET, uniform(&mut self.rng, 0.0, world.y)),
            2 => Vec2::new(uniform(&mut self.rng, 0.0, world.x), world.y - INSET),
            _ => Vec2::new(INSET, uniform(&mut self.rng, 0.0, world.y)),
        };
        let inward = bearing_degrees(pos, world * 0.5).to_radians();
        let angle = inward + self.rng.random_range(-PI / 12.0..PI / 12.0);
        let speed = uniform(&mut self.rng, 0.4, max_speed);

        log::debug!("Edge spawn at ({:.0}, {:.0})", pos.x, pos.y);
        self.spawn_asteroid(AsteroidTier::Large, pos, polar_to_cartesian(speed, angle))
    }

    /// Initial population for a new session
    pub fn populate(&mut self) {
        self.spawn_asteroids(self.config.world.initial_asteroids);
        self.edge_spawn_cooldown = self.config.world.edge_spawn_interval;
    }

    /// Keep the field from emptying: while fewer asteroids than the
    /// configured minimum are alive, spawn one from an edge every interval
    pub fn trickle_spawn(&mut self) -> bool {
        let interval = self.config.world.edge_spawn_interval;
        if interval == 0 {
            return false;
        }
        self.edge_spawn_cooldown = self.edge_spawn_cooldown.saturating_sub(1);
        if self.edge_spawn_cooldown > 0 || self.alive_asteroid_count() >= self.config.world.min_asteroids {
            return false;
        }
        self.spawn_asteroid_from_edge();
        self.edge_spawn_cooldown = interval;
        true
    }

    /// Split an asteroid one tier down, or consume a small one and hand its
    /// fuel to the first alive ship in reach. With an `origin`, fragments fan
    /// out away from it.
    pub fn break_asteroid(&mut self, index: usize, origin: Option<Vec2>) {
        let Some(asteroid) = self.asteroids.get_mut(index).filter(|a| a.alive) else {
            return;
        };
        asteroid.alive = false;
        let (pos, vel) = (asteroid.pos, asteroid.vel);
        let tier = asteroid.tier(&self.config.asteroids);

        let cfg = &self.config.asteroids;
        let (max_speed, push, spread) = (cfg.max_speed, cfg.push_speed, cfg.fragment_spread);
        let (pickup_radius, pickup) = (cfg.fuel_pickup_radius, cfg.fuel_pickup_amount);

        let Some(fragment) = tier.fragment() else {
            let collector = self
                .ships
                .iter()
                .position(|s| s.alive && s.pos.distance(pos) < pickup_radius);
            if let Some(si) = collector {
                self.refuel(si, pickup);
                let name = self.ship_name(si);
                self.narrate(&format!("{name} collects fuel!"));
            }
            return;
        };

        let push_angle = origin.map(|o| bearing_degrees(o, pos).to_radians());
        let count: i32 = self.rng.random_range(2..=3);
        for i in 0..count {
            let mut angle = self.rng.random_range(0.0..TAU);
            let mut speed = uniform(&mut self.rng, 0.5, max_speed);
            if let Some(base) = push_angle {
                angle = base + (i - count / 2) as f32 * spread;
                speed += push;
            }
            self.spawn_asteroid(fragment, pos, vel + polar_to_cartesian(speed, angle));
        }
        log::debug!("Asteroid {index} ({tier:?}) broke into {count} {fragment:?} fragments");
    }

    /// Destroy a ship: narrate, burst, and shatter its outline into debris
    pub fn kill_ship(&mut self, index: usize, message: &str) {
        let Some(ship) = self.ships.get_mut(index).filter(|s| s.alive) else {
            return;
        };
        ship.alive = false;
        let (pos, vel, angle, color) = (ship.pos, ship.vel, ship.angle, ship.color);

        self.narrate(message);
        self.burst(pos, 150, color, 1.2, 1.5);
        self.burst(pos, 80, Color::rgb(255, 255, 220), 2.2, 0.8);

        // Triangle as drawn, converted from screen pixels to world units
        let draw_size = self.config.ship.draw_size;
        let size = if self.render_scale > 1e-5 {
            draw_size / self.render_scale
        } else {
            draw_size
        };
        let nose = pos + heading(angle) * size;
        let rad = angle.to_radians();
        let left = pos + polar_to_cartesian(size * 0.6, rad + 2.4);
        let right = pos + polar_to_cartesian(size * 0.6, rad - 2.4);
        let centroid = (nose + left + right) / 3.0;

        let fx = &self.config.effects;
        let (per_edge, lifetime) = (fx.debris_per_edge.max(1), fx.debris_lifetime as i32);
        for (a, b) in [(nose, left), (left, right), (right, nose)] {
            for i in 0..per_edge {
                let (j0, j1): (f32, f32) = (self.rng.random_range(-0.07..0.07), self.rng.random_range(-0.07..0.07));
                let mut t0 = (i as f32 / per_edge as f32 + j0).clamp(0.0, 1.0);
                let mut t1 = ((i + 1) as f32 / per_edge as f32 + j1).clamp(0.0, 1.0);
                if t1 < t0 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                let (p0, p1) = (a.lerp(b, t0), a.lerp(b, t1));

                let outward = ((p0 + p1) * 0.5 - centroid).try_normalize().unwrap_or(Vec2::X);
                let speed: f32 = self.rng.random_range(0.6..1.8);
                let life = (lifetime + self.rng.random_range(-10..=10)).max(20) as u32;

                self.debris.push(DebrisSegment {
                    a: p0,
                    b: p1,
                    vel: vel + outward * speed + Vec2::new(0.0, 0.15),
                    ang_vel: self.rng.random_range(-0.05..0.05),
                    lifetime: life,
                    start_lifetime: life,
                    color,
                    alive: true,
                });
            }
        }
    }

    /// Sparks flying out of `origin` in random directions, each with its own
    /// speed, lifetime, length and color jitter
    pub fn spawn_particle_burst(
        &mut self,
        origin: Vec2,
        count: usize,
        color: Color,
        speed_scale: f32,
        life_scale: f32,
        length: f32,
    ) {
        let fx = &self.config.effects;
        let (min_speed, max_speed) = (fx.particle_min_speed, fx.particle_max_speed);
        let base_life = fx.particle_lifetime as i32;

        self.particles.reserve(count);
        for _ in 0..count {
            let angle = self.rng.random_range(0.0..TAU);
            let speed = uniform(&mut self.rng, min_speed, max_speed) * speed_scale;
            let life = self.rng.random_range(base_life - 15..=base_life + 15);
            let life = ((life as f32 * life_scale) as i32).max(10) as u32;
            let stretch: f32 = self.rng.random_range(0.7..1.3);
            let length = length * stretch;
            let color = color.jittered(&mut self.rng, 40);

            self.particles.push(Particle {
                pos: origin,
                vel: polar_to_cartesian(speed, angle),
                length,
                lifetime: life,
                start_lifetime: life,
                color,
                alive: true,
            });
        }
    }

    /// Burst with the configured streak length
    pub(crate) fn burst(&mut self, origin: Vec2, count: usize, color: Color, speed_scale: f32, life_scale: f32) {
        let length = self.config.effects.particle_length;
        self.spawn_particle_burst(origin, count, color, speed_scale, life_scale, length);
    }

    /// Add fuel to an alive ship, capped at the tank size
    pub fn refuel(&mut self, index: usize, amount: f32) {
        let max = self.config.ship.max_fuel;
        if let Some(ship) = self.ships.get_mut(index).filter(|s| s.alive) {
            ship.fuel = (ship.fuel + amount).clamp(0.0, max);
        }
    }

    /// Drop spent torpedoes, beams and particles. Ships and asteroids keep
    /// their indices for the whole session.
    pub fn reap(&mut self) {
        self.torpedoes.retain(|t| t.alive);
        self.beams.retain(|b| b.alive);
        self.particles.retain(|p| p.alive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::sim::state::{Beam, Torpedo};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn arena() -> Arena {
        Arena::new(ArenaConfig::default(), 5)
    }

    #[test]
    fn test_random_outline_is_convex_and_sized() {
        let mut rng = Pcg32::seed_from_u64(9);
        for _ in 0..50 {
            let poly = random_outline(&mut rng, 8, 75.0);
            assert!(poly.vertices().len() >= 3);
            assert!(poly.doubled_area() > 0.0);
            assert!(poly.bounding_radius() <= 75.0 * 1.3 + 1e-3);
            assert!(poly.contains(Vec2::ZERO));
        }
    }

    #[test]
    fn test_large_breaks_into_medium() {
        let mut arena = arena();
        let idx = arena.spawn_asteroid(AsteroidTier::Large, Vec2::splat(1000.0), Vec2::new(1.0, 0.0));
        arena.break_asteroid(idx, Some(Vec2::new(900.0, 1000.0)));

        assert!(!arena.asteroids[idx].alive);
        let fragments = &arena.asteroids[idx + 1..];
        assert!((2..=3).contains(&fragments.len()));
        for f in fragments {
            assert_eq!(f.tier(&arena.config.asteroids), AsteroidTier::Medium);
            assert_eq!(f.hp, arena.config.asteroids.medium_hp);
            assert_eq!(f.pos, Vec2::splat(1000.0));
            // Pushed away from the attacker on the left
            assert!(f.vel.x > 0.0);
        }
    }

    #[test]
    fn test_medium_breaks_into_small_without_origin() {
        let mut arena = arena();
        let idx = arena.spawn_asteroid(AsteroidTier::Medium, Vec2::splat(1000.0), Vec2::ZERO);
        arena.break_asteroid(idx, None);
        let fragments = &arena.asteroids[idx + 1..];
        assert!((2..=3).contains(&fragments.len()));
        assert!(
            fragments
                .iter()
                .all(|f| f.tier(&arena.config.asteroids) == AsteroidTier::Small)
        );
    }

    #[test]
    fn test_small_asteroid_fuels_only_ship_in_reach() {
        let mut arena = arena();
        let near = arena.add_ship(None, Vec2::new(1030.0, 1000.0), 0.0, Color::WHITE);
        let far = arena.add_ship(None, Vec2::new(1200.0, 1000.0), 0.0, Color::WHITE);
        arena.ships[near].fuel = 10.0;
        arena.ships[far].fuel = 10.0;
        let idx = arena.spawn_asteroid(AsteroidTier::Small, Vec2::splat(1000.0), Vec2::ZERO);

        arena.break_asteroid(idx, None);
        assert_eq!(arena.asteroids.len(), 1);
        assert_eq!(arena.ships[near].fuel, 10.0 + arena.config.asteroids.fuel_pickup_amount);
        assert_eq!(arena.ships[far].fuel, 10.0);

        // Pickup is capped at the tank size
        arena.ships[near].fuel = 95.0;
        let idx = arena.spawn_asteroid(AsteroidTier::Small, Vec2::splat(1000.0), Vec2::ZERO);
        arena.break_asteroid(idx, None);
        assert_eq!(arena.ships[near].fuel, arena.config.ship.max_fuel);
    }

    #[test]
    fn test_break_is_idempotent_and_tolerates_bad_index() {
        let mut arena = arena();
        let idx = arena.spawn_asteroid(AsteroidTier::Large, Vec2::splat(500.0), Vec2::ZERO);
        arena.break_asteroid(idx, None);
        let count = arena.asteroids.len();
        arena.break_asteroid(idx, None);
        arena.break_asteroid(999, None);
        assert_eq!(arena.asteroids.len(), count);
    }

    #[test]
    fn test_kill_ship_spawns_debris_once() {
        let mut arena = arena();
        let idx = arena.add_ship(None, Vec2::splat(700.0), 45.0, Color::rgb(10, 200, 30));
        arena.ships[idx].vel = Vec2::new(2.0, 0.0);

        arena.kill_ship(idx, "gone");
        let per_edge = arena.config.effects.debris_per_edge;
        assert!(!arena.ships[idx].alive);
        assert_eq!(arena.debris.len(), 3 * per_edge);
        assert_eq!(arena.particles.len(), 230);
        for seg in &arena.debris {
            assert!(seg.lifetime >= 20);
            assert_eq!(seg.lifetime, seg.start_lifetime);
            assert_eq!(seg.color, Color::rgb(10, 200, 30));
            assert!(seg.ang_vel.abs() <= 0.05);
        }

        arena.kill_ship(idx, "gone again");
        arena.kill_ship(42, "nobody");
        assert_eq!(arena.debris.len(), 3 * per_edge);
    }

    #[test]
    fn test_debris_uses_render_scale() {
        let mut arena = arena();
        arena.render_scale = 0.5;
        let idx = arena.add_ship(None, Vec2::splat(700.0), 0.0, Color::WHITE);
        arena.kill_ship(idx, "gone");
        // Nose sits draw_size / scale ahead of the ship
        let reach = arena
            .debris
            .iter()
            .flat_map(|s| [s.a, s.b])
            .map(|p| p.x - 700.0)
            .fold(f32::MIN, f32::max);
        assert!(reach > arena.config.ship.draw_size * 1.5);
    }

    #[test]
    fn test_particle_burst_ranges() {
        let mut arena = arena();
        arena.spawn_particle_burst(Vec2::splat(10.0), 100, Color::rgb(200, 100, 50), 1.0, 1.0, 28.0);
        assert_eq!(arena.particles.len(), 100);
        for p in &arena.particles {
            assert!((30..=60).contains(&p.lifetime));
            let speed = p.vel.length();
            assert!((0.99..6.01).contains(&speed));
            assert!((28.0 * 0.7..28.0 * 1.3 + 1e-3).contains(&p.length));
        }

        // Lifetimes never drop below the floor
        arena.spawn_particle_burst(Vec2::ZERO, 20, Color::WHITE, 1.0, 0.01, 28.0);
        assert!(arena.particles[100..].iter().all(|p| p.lifetime == 10));
    }

    #[test]
    fn test_edge_spawn_heads_inward() {
        let mut arena = arena();
        let world = arena.config.world.size();
        for _ in 0..20 {
            let idx = arena.spawn_asteroid_from_edge();
            let a = &arena.asteroids[idx];
            let to_centre = world * 0.5 - a.pos;
            assert!(a.vel.dot(to_centre) > 0.0);
            assert_eq!(a.tier(&arena.config.asteroids), AsteroidTier::Large);
        }
    }

    #[test]
    fn test_trickle_spawn_respects_cooldown_and_population() {
        let mut arena = arena();
        arena.config.world.edge_spawn_interval = 3;
        arena.config.world.min_asteroids = 2;

        let spawned: Vec<bool> = (0..7).map(|_| arena.trickle_spawn()).collect();
        assert_eq!(spawned, vec![true, false, false, true, false, false, false]);
        assert_eq!(arena.alive_asteroid_count(), 2);
    }

    #[test]
    fn test_populate_fills_interior() {
        let mut arena = arena();
        arena.populate();
        assert_eq!(arena.asteroids.len(), arena.config.world.initial_asteroids);
        for a in &arena.asteroids {
            assert!((100.0..=1948.0).contains(&a.pos.x));
            assert!((100.0..=1948.0).contains(&a.pos.y));
            assert!(a.vel.length() <= arena.config.asteroids.max_speed + 1e-4);
        }
    }

    #[test]
    fn test_reap_keeps_ships_and_asteroids() {
        let mut arena = arena();
        let ship = arena.add_ship(None, Vec2::ZERO, 0.0, Color::WHITE);
        arena.ships[ship].alive = false;
        let rock = arena.spawn_asteroid(AsteroidTier::Small, Vec2::ZERO, Vec2::ZERO);
        arena.asteroids[rock].alive = false;
        arena.torpedoes.push(Torpedo {
            pos: Vec2::ZERO,
            prev_pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            lifetime: 0,
            damage: 1,
            owner: None,
            alive: false,
            anim: 0.0,
        });
        arena.beams.push(Beam {
            start: Vec2::ZERO,
            end: Vec2::X,
            lifetime: 0,
            start_lifetime: 3,
            color: Color::WHITE,
            alive: false,
        });

        arena.reap();
        assert!(arena.torpedoes.is_empty());
        assert!(arena.beams.is_empty());
        assert_eq!(arena.ships.len(), 1);
        assert_eq!(arena.asteroids.len(), 1);
    }
}
