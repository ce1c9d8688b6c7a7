//! Ship actions
//!
//! The entry points a ship controller calls, addressed by ship index. Every
//! action is a silent no-op for a dead ship or an index that does not exist;
//! weapons are also no-ops while cooling down.

use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Target;
use super::geometry::Ray;
use super::state::{Arena, Beam, Color, ScanResult, Torpedo};
use crate::{bearing_degrees, normalize_degrees};

/// One action requested by a ship controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShipCommand {
    Wait,
    /// Accelerate along the facing; power 1 is a full burn
    Thrust(f32),
    /// Set the facing to rotate toward, in degrees
    TurnDeg(f32),
    FirePhaser,
    FirePhoton,
    Scan,
    Signal(i32),
    TurnToScan,
}

impl ShipCommand {
    /// Energy cost charged against a script's per-turn budget
    pub fn cost(&self) -> u32 {
        match self {
            ShipCommand::Wait => 0,
            ShipCommand::Thrust(_) => 2,
            ShipCommand::TurnDeg(_) => 1,
            ShipCommand::FirePhaser => 3,
            ShipCommand::FirePhoton => 4,
            ShipCommand::Scan => 1,
            ShipCommand::Signal(_) => 1,
            ShipCommand::TurnToScan => 1,
        }
    }
}

impl Arena {
    /// Dispatch a command for one ship
    pub fn apply(&mut self, ship: usize, command: ShipCommand) {
        match command {
            ShipCommand::Wait => {}
            ShipCommand::Thrust(power) => self.thrust(ship, power),
            ShipCommand::TurnDeg(degrees) => self.turn_deg(ship, degrees),
            ShipCommand::FirePhaser => self.fire_phaser(ship),
            ShipCommand::FirePhoton => self.fire_photon(ship),
            ShipCommand::Scan => self.scan(ship),
            ShipCommand::Signal(value) => self.signal(ship, value),
            ShipCommand::TurnToScan => self.turn_to_scan(ship),
        }
    }

    /// Burn fuel to push along the facing. A tank that cannot cover the burn
    /// blends the thrust down toward the empty-tank floor and drains to zero.
    pub fn thrust(&mut self, index: usize, power: f32) {
        let cfg = &self.config.ship;
        let Some(ship) = self.ships.get_mut(index).filter(|s| s.alive) else {
            return;
        };

        let cost = power.abs() * cfg.thrust_fuel_cost;
        let effective = if ship.fuel >= cost {
            ship.fuel -= cost;
            power
        } else if ship.fuel <= 0.0 {
            power * cfg.empty_tank_thrust
        } else {
            let ratio = ship.fuel / cost;
            ship.fuel = 0.0;
            power * (ratio + (1.0 - ratio) * cfg.empty_tank_thrust)
        };

        ship.vel += ship.heading() * effective * cfg.thrust_power;
        ship.vel = ship.vel.clamp_length_max(cfg.max_velocity);
    }

    /// Set the facing to rotate toward; physics turns the ship at its rate
    pub fn turn_deg(&mut self, index: usize, degrees: f32) {
        if let Some(ship) = self.ships.get_mut(index).filter(|s| s.alive) {
            ship.target_angle = normalize_degrees(degrees);
        }
    }

    /// Instant ray along the facing. The nearest ship or asteroid in range
    /// takes the hit; one beam is drawn either way. Shapes overlapping the
    /// firing ship's centre are not hit.
    pub fn fire_phaser(&mut self, index: usize) {
        let weapons = &self.config.weapons;
        let (cooldown, range, damage) = (weapons.phaser_cooldown, weapons.phaser_range, weapons.phaser_damage);
        let beam_lifetime = weapons.beam_lifetime;
        let Some(ship) = self.ships.get_mut(index).filter(|s| s.can_fire_phaser()) else {
            return;
        };
        ship.phaser_cooldown = cooldown;
        let origin = ship.pos;
        let ray = Ray::new(origin, ship.heading(), range);

        let (ships, asteroids) = (0..self.ships.len(), 0..self.asteroids.len());
        let impact = self.first_impact_from_outside(&ray, ships, asteroids, Some(index));
        let end = impact.map_or(ray.at(range), |hit| hit.point);
        self.beams.push(Beam {
            start: origin,
            end,
            lifetime: beam_lifetime,
            start_lifetime: beam_lifetime,
            color: Color::rgb(255, 100, 100),
            alive: true,
        });

        let attacker = self.ship_name(index);
        match impact.map(|hit| hit.target) {
            Some(Target::Ship(victim)) => {
                self.ships[victim].hp -= damage;
                self.burst(end, 28, Color::rgb(255, 160, 120), 0.8, 0.7);
                let name = self.ship_name(victim);
                self.narrate(&format!("{attacker} hits {name} with phaser for {damage} damage!"));
                if self.ships[victim].hp <= 0 {
                    self.kill_ship(victim, &format!("{name} is destroyed!"));
                }
            }
            Some(Target::Asteroid(rock)) => {
                self.burst(end, 36, Color::rgb(255, 120, 120), 0.9, 0.8);
                self.break_asteroid(rock, Some(origin));
                let reward = self.config.asteroids.fuel_hit_reward;
                self.refuel(index, reward);
            }
            None => self.narrate(&format!("{attacker} fires phaser and misses.")),
        }
    }

    /// Launch a torpedo along the facing, inheriting the ship's velocity
    pub fn fire_photon(&mut self, index: usize) {
        let weapons = &self.config.weapons;
        let (cooldown, speed) = (weapons.photon_cooldown, weapons.photon_speed);
        let (lifetime, damage) = (weapons.photon_lifetime, weapons.photon_damage);
        let Some(ship) = self.ships.get_mut(index).filter(|s| s.can_fire_photon()) else {
            return;
        };
        ship.photon_cooldown = cooldown;
        let (pos, vel) = (ship.pos, ship.vel + ship.heading() * speed);

        let anim = self.rng.random_range(0.0..TAU);
        self.torpedoes.push(Torpedo {
            pos,
            prev_pos: pos,
            vel,
            lifetime,
            damage,
            owner: Some(index),
            alive: true,
            anim,
        });
        let attacker = self.ship_name(index);
        self.narrate(&format!("{attacker} fires photon torpedo!"));
    }

    /// Record the nearest other ship or asteroid within scan range
    pub fn scan(&mut self, index: usize) {
        let range = self.config.weapons.scan_range;
        let Some(me) = self.ships.get(index).filter(|s| s.alive) else {
            return;
        };
        let from = me.pos;

        let ships = self
            .ships
            .iter()
            .enumerate()
            .filter(|&(i, s)| i != index && s.alive)
            .map(|(_, s)| s.pos);
        let asteroids = self.asteroids.iter().filter(|a| a.alive).map(|a| a.pos);

        let mut result = ScanResult {
            hit: false,
            distance: range,
            angle: 0.0,
        };
        for pos in ships.chain(asteroids) {
            let dist = from.distance(pos);
            if dist < result.distance {
                result = ScanResult {
                    hit: true,
                    distance: dist,
                    angle: normalize_degrees(bearing_degrees(from, pos)),
                };
            }
        }
        self.ships[index].scan = result;
    }

    /// Broadcast a value and mark the ship's position for observers
    pub fn signal(&mut self, index: usize, value: i32) {
        if let Some(ship) = self.ships.get_mut(index).filter(|s| s.alive) {
            ship.signal = value;
            let pos = ship.pos;
            self.signals.push(pos);
        }
    }

    /// Aim at whatever the last scan found
    pub fn turn_to_scan(&mut self, index: usize) {
        if let Some(ship) = self.ships.get_mut(index).filter(|s| s.alive && s.scan.hit) {
            ship.target_angle = ship.scan.angle;
        }
    }
}
