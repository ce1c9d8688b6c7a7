//! Per-turn integration
//!
//! Advances every entity class by one turn. Ships, asteroids and (optionally)
//! particles wrap at the world edges; torpedoes, beams and debris do not.

use glam::Vec2;

use super::state::Arena;
use crate::{angle_difference, normalize_degrees};

/// Rotate `angle` toward `target` by at most `max_step` degrees
pub fn rotate_toward(angle: f32, target: f32, max_step: f32) -> f32 {
    let diff = angle_difference(angle, target);
    if diff.abs() <= max_step {
        normalize_degrees(target)
    } else {
        normalize_degrees(angle + max_step.copysign(diff))
    }
}

impl Arena {
    /// Integrate one turn of motion and age every timed entity
    pub fn update_physics(&mut self) {
        let torus = self.torus();

        let ship_cfg = &self.config.ship;
        for ship in self.ships.iter_mut().filter(|s| s.alive) {
            ship.angle = rotate_toward(ship.angle, ship.target_angle, ship_cfg.rotation_speed);

            ship.pos = torus.wrap(ship.pos + ship.vel);
            ship.vel *= ship_cfg.drag;
            if ship.vel.x.abs() < ship_cfg.min_velocity {
                ship.vel.x = 0.0;
            }
            if ship.vel.y.abs() < ship_cfg.min_velocity {
                ship.vel.y = 0.0;
            }
        }

        for asteroid in self.asteroids.iter_mut().filter(|a| a.alive) {
            asteroid.pos = torus.wrap(asteroid.pos + asteroid.vel);
        }

        for torpedo in self.torpedoes.iter_mut().filter(|t| t.alive) {
            torpedo.prev_pos = torpedo.pos;
            torpedo.pos += torpedo.vel;
            torpedo.anim += 1.0;
            torpedo.lifetime = torpedo.lifetime.saturating_sub(1);
            if torpedo.lifetime == 0 {
                torpedo.alive = false;
            }
        }

        for beam in self.beams.iter_mut().filter(|b| b.alive) {
            beam.lifetime = beam.lifetime.saturating_sub(1);
            if beam.lifetime == 0 {
                beam.alive = false;
            }
        }

        let fx = &self.config.effects;
        for particle in self.particles.iter_mut().filter(|p| p.alive) {
            particle.pos += particle.vel;
            if fx.particle_wrap {
                particle.pos = torus.wrap(particle.pos);
            }
            particle.vel *= fx.particle_drag;
            particle.lifetime = particle.lifetime.saturating_sub(1);
            if particle.lifetime == 0 {
                particle.alive = false;
            }
        }

        for seg in self.debris.iter_mut() {
            seg.a += seg.vel;
            seg.b += seg.vel;
            if seg.ang_vel.abs() > 1e-6 {
                let mid = (seg.a + seg.b) * 0.5;
                let spin = Vec2::from_angle(seg.ang_vel);
                seg.a = mid + spin.rotate(seg.a - mid);
                seg.b = mid + spin.rotate(seg.b - mid);
            }
            seg.vel *= fx.debris_drag;
            seg.lifetime = seg.lifetime.saturating_sub(1);
            if seg.lifetime == 0 {
                seg.alive = false;
            }
        }
        self.debris.retain(|seg| seg.alive);
    }
}
