//! Collision passes
//!
//! Two passes run after physics each turn, each on a freshly rebuilt grid:
//! - discrete: alive ships against nearby asteroids (capsule vs polygon)
//! - swept: alive torpedoes against nearby ships and asteroids, resolved to
//!   the single earliest time of impact along the torpedo's path this turn

use glam::Vec2;

use super::geometry::{Ray, RoundedPolygon};
use super::state::{Arena, Color};

/// What a ray or sweep struck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Ship(usize),
    Asteroid(usize),
}

/// Nearest hit along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub target: Target,
    /// Ray parameter of the first contact
    pub t: f32,
    pub point: Vec2,
}

impl Arena {
    /// Earliest hit of `ray` (a circle of `radius` when positive) against
    /// the listed ships and asteroids, each tested across the world seams.
    ///
    /// Ships are evaluated before asteroids and a later candidate must be
    /// strictly nearer to replace the current best.
    pub fn first_impact(
        &self,
        ray: &Ray,
        radius: f32,
        ships: impl IntoIterator<Item = usize>,
        asteroids: impl IntoIterator<Item = usize>,
        exclude_ship: Option<usize>,
    ) -> Option<Impact> {
        self.nearest_impact(ray, radius, ships, asteroids, exclude_ship, true)
    }

    /// Earliest hit of a thin ray that ignores any shape enclosing its
    /// origin, so a beam fired from inside a rock passes out through it
    pub fn first_impact_from_outside(
        &self,
        ray: &Ray,
        ships: impl IntoIterator<Item = usize>,
        asteroids: impl IntoIterator<Item = usize>,
        exclude_ship: Option<usize>,
    ) -> Option<Impact> {
        self.nearest_impact(ray, 0.0, ships, asteroids, exclude_ship, false)
    }

    fn nearest_impact(
        &self,
        ray: &Ray,
        radius: f32,
        ships: impl IntoIterator<Item = usize>,
        asteroids: impl IntoIterator<Item = usize>,
        exclude_ship: Option<usize>,
        hit_at_origin: bool,
    ) -> Option<Impact> {
        let torus = self.torus();
        let mut best: Option<Impact> = None;
        let mut consider = |target: Target, hit: Option<f32>| {
            let hit = hit.filter(|&t| hit_at_origin || t > 0.0);
            if let Some(t) = hit.filter(|&t| best.is_none_or(|b| t < b.t)) {
                best = Some(Impact {
                    target,
                    t,
                    point: ray.at(t),
                });
            }
        };

        for si in ships {
            if Some(si) == exclude_ship {
                continue;
            }
            let Some(ship) = self.ships.get(si).filter(|s| s.alive) else {
                continue;
            };
            let hull = ship.capsule(&self.config.ship).inflated(radius);
            consider(Target::Ship(si), torus.raycast(&hull, Vec2::ZERO, ray));
        }

        for ai in asteroids {
            let Some(asteroid) = self.asteroids.get(ai).filter(|a| a.alive) else {
                continue;
            };
            let hull = RoundedPolygon::new(&asteroid.outline, radius);
            consider(Target::Asteroid(ai), torus.raycast(&hull, asteroid.pos, ray));
        }

        best
    }

    /// Ship and asteroid indices binned around any of `points`, sorted and
    /// without repeats
    pub fn candidates_near(&self, points: &[Vec2]) -> (Vec<usize>, Vec<usize>) {
        let mut cells: Vec<usize> = Vec::with_capacity(9 * points.len());
        for &p in points {
            for cell in self.grid.neighborhood_of(p) {
                if !cells.contains(&cell) {
                    cells.push(cell);
                }
            }
        }

        let mut ships: Vec<usize> = cells.iter().flat_map(|&c| self.grid.ships_in(c)).copied().collect();
        let mut asteroids: Vec<usize> = cells
            .iter()
            .flat_map(|&c| self.grid.asteroids_in(c))
            .copied()
            .collect();
        ships.sort_unstable();
        ships.dedup();
        asteroids.sort_unstable();
        asteroids.dedup();
        (ships, asteroids)
    }

    /// Ships touching asteroids lose one hp each, and so do the asteroids
    pub fn resolve_ship_asteroid_collisions(&mut self) {
        self.rebuild_grid();
        let torus = self.torus();

        for si in 0..self.ships.len() {
            if !self.ships[si].alive {
                continue;
            }
            let (_, candidates) = self.candidates_near(&[self.ships[si].pos]);

            for ai in candidates {
                let ship = &self.ships[si];
                if !ship.alive {
                    break;
                }
                let Some(asteroid) = self.asteroids.get(ai).filter(|a| a.alive) else {
                    continue;
                };
                let capsule = ship.capsule(&self.config.ship);
                if !torus.capsule_overlaps_polygon(&capsule, &asteroid.outline, asteroid.pos) {
                    continue;
                }

                let pos = ship.pos;
                self.ships[si].hp -= 1;
                self.asteroids[ai].hp -= 1;
                self.burst(pos, 24, Color::rgb(255, 150, 120), 1.0, 1.0);

                if self.ships[si].hp <= 0 {
                    let message = format!("{} destroyed by asteroid collision!", self.ship_name(si));
                    self.kill_ship(si, &message);
                }
                if self.asteroids[ai].hp <= 0 {
                    self.break_asteroid(ai, Some(pos));
                }
            }
        }
    }

    /// Sweep every live torpedo from its previous to its current position
    /// and resolve at most one impact per torpedo
    pub fn resolve_torpedo_collisions(&mut self) {
        self.rebuild_grid();
        let photon_radius = self.config.weapons.photon_radius;

        for ti in 0..self.torpedoes.len() {
            let torpedo = &self.torpedoes[ti];
            if !torpedo.alive {
                continue;
            }
            // Sweep the torpedo's circle by growing the targets instead
            let shape = torpedo.circle(photon_radius);
            let ray = Ray::segment(torpedo.prev_pos, shape.center);
            let (ships, asteroids) = self.candidates_near(&[torpedo.prev_pos, shape.center]);
            let Some(impact) = self.first_impact(&ray, shape.radius, ships, asteroids, torpedo.owner) else {
                continue;
            };

            let torpedo = &mut self.torpedoes[ti];
            torpedo.alive = false;
            let (owner, damage, pos) = (torpedo.owner, torpedo.damage, torpedo.pos);

            match impact.target {
                Target::Ship(si) => {
                    let hit_pos = self.ships[si].pos;
                    self.ships[si].hp -= damage;
                    self.burst(hit_pos, 42, Color::rgb(255, 200, 140), 1.0, 1.0);
                    self.burst(hit_pos, 20, Color::rgb(255, 255, 200), 1.7, 0.5);

                    let attacker = owner.map_or_else(|| "Ship".to_string(), |o| self.ship_name(o));
                    let victim = self.ship_name(si);
                    self.narrate(&format!("{attacker}'s torpedo hits {victim} for {damage} damage!"));
                    if self.ships[si].hp <= 0 {
                        self.kill_ship(si, &format!("{victim} is destroyed!"));
                    }
                }
                Target::Asteroid(ai) => {
                    self.burst(impact.point, 48, Color::rgb(255, 180, 140), 1.0, 1.0);
                    self.burst(impact.point, 25, Color::rgb(255, 255, 200), 1.8, 0.6);
                    self.break_asteroid(ai, Some(pos));
                    if let Some(owner) = owner {
                        let reward = self.config.asteroids.fuel_hit_reward;
                        self.refuel(owner, reward);
                    }
                }
            }
        }
    }
}
