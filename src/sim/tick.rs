//! Turn controller
//!
//! One turn runs in a fixed order:
//! reap -> start_turn -> ship commands -> physics -> ship/asteroid pass ->
//! torpedo sweep -> edge trickle spawn.

use super::actions::ShipCommand;
use super::state::Arena;

impl Arena {
    /// Per-turn bookkeeping: clear signal markers, cool weapons down and
    /// forget last turn's scan and signal
    pub fn start_turn(&mut self) {
        self.signals.clear();
        for ship in self.ships.iter_mut().filter(|s| s.alive) {
            ship.phaser_cooldown = ship.phaser_cooldown.saturating_sub(1);
            ship.photon_cooldown = ship.photon_cooldown.saturating_sub(1);
            ship.signal = -1;
            ship.scan.hit = false;
        }
    }

    /// Advance the world once the turn's commands have been applied
    pub fn step(&mut self) {
        self.update_physics();
        self.resolve_ship_asteroid_collisions();
        self.resolve_torpedo_collisions();
        self.trickle_spawn();
        self.time_ticks += 1;
    }

    /// Run a full turn. Commands are applied in order; a ship may appear
    /// more than once.
    pub fn tick(&mut self, commands: &[(usize, ShipCommand)]) {
        self.reap();
        self.start_turn();
        for &(ship, command) in commands {
            self.apply(ship, command);
        }
        self.step();
    }
}
