//! Astro Arena headless host
//!
//! Runs a match between built-in hunter bots and narrates it through the log.

#[cfg(not(target_arch = "wasm32"))]
mod host {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use astro_arena::consts::{MAX_SCRIPT_COST, MAX_TURNS, TICK_RATE_HZ};
    use astro_arena::sim::{Color, ShipType};
    use astro_arena::{Arena, ArenaConfig, ShipCommand, angle_difference};
    use clap::Parser;
    use glam::Vec2;

    const PALETTE: [Color; 4] = [
        Color::rgb(90, 200, 255),
        Color::rgb(255, 120, 90),
        Color::rgb(140, 255, 120),
        Color::rgb(255, 220, 90),
    ];
    const NAMES: [&str; 4] = ["Hunter", "Reaver", "Warden", "Comet"];

    #[derive(Parser, Debug)]
    #[command(name = "astro-arena", version)]
    #[command(about = "Run a headless match between hunter bots in a wrapped asteroid field")]
    pub struct Options {
        /// Arena config JSON; missing sections use defaults
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Stop after this many turns even with several ships alive
        #[arg(long, default_value_t = MAX_TURNS)]
        turns: u32,
        #[arg(long, default_value_t = 4)]
        ships: usize,
        /// Pace turns at the tick rate instead of running flat out
        #[arg(long)]
        realtime: bool,
        /// Print the default config as JSON and exit
        #[arg(long)]
        print_config: bool,
    }

    /// Scan, aim, shoot, chase. Spends at most the script budget.
    fn hunt(arena: &mut Arena, ship: usize) {
        let mut budget = MAX_SCRIPT_COST;
        let mut run = |arena: &mut Arena, command: ShipCommand| {
            if command.cost() <= budget {
                budget -= command.cost();
                arena.apply(ship, command);
            }
        };

        run(arena, ShipCommand::Scan);
        let me = &arena.ships[ship];
        let scan = me.scan;
        if !scan.hit {
            let wander = me.angle + 5.0;
            run(arena, ShipCommand::TurnDeg(wander));
            run(arena, ShipCommand::Thrust(0.6));
            return;
        }

        run(arena, ShipCommand::TurnToScan);
        let me = &arena.ships[ship];
        let (angle, phaser_ready, photon_ready, fuel) =
            (me.angle, me.phaser_cooldown == 0, me.photon_cooldown == 0, me.fuel);
        if angle_difference(angle, scan.angle).abs() < 10.0 {
            if phaser_ready && scan.distance < arena.config.weapons.phaser_range {
                run(arena, ShipCommand::FirePhaser);
            }
            if photon_ready {
                run(arena, ShipCommand::FirePhoton);
            }
        }
        if scan.distance > 200.0 {
            run(arena, ShipCommand::Thrust(1.0));
        }
        if fuel < 20.0 {
            run(arena, ShipCommand::Signal(1));
        }
    }

    pub fn run(options: Options) {
        if options.print_config {
            match ArenaConfig::default().to_json() {
                Ok(json) => println!("{json}"),
                Err(e) => log::error!("Cannot serialize config: {e}"),
            }
            return;
        }

        let config = options
            .config
            .as_deref()
            .map_or_else(ArenaConfig::default, ArenaConfig::load);
        let mut arena = Arena::new(config, options.seed);
        arena.populate();

        // Ships evenly spaced on a ring, facing the centre
        let centre = arena.config.world.size() * 0.5;
        let ring = centre.min_element() * 0.6;
        for i in 0..options.ships {
            let theta = i as f32 / options.ships as f32 * std::f32::consts::TAU;
            let pos = centre + Vec2::from_angle(theta) * ring;
            let kind = Arc::new(ShipType::new(NAMES[i % NAMES.len()]));
            arena.add_ship(Some(kind), pos, theta.to_degrees() + 180.0, PALETTE[i % PALETTE.len()]);
        }
        log::info!(
            "Match start: {} ships, {} asteroids, seed {}",
            arena.ships.len(),
            arena.asteroids.len(),
            arena.seed()
        );

        let frame = Duration::from_secs_f64(1.0 / TICK_RATE_HZ);
        let mut next_frame = Instant::now();
        for turn in 0..options.turns {
            if arena.alive_ships().count() <= 1 {
                break;
            }

            arena.reap();
            arena.start_turn();
            let alive: Vec<usize> = arena.alive_ships().map(|(i, _)| i).collect();
            for ship in alive {
                hunt(&mut arena, ship);
            }
            arena.step();

            if turn % 300 == 0 {
                log::debug!("Turn {turn}: {arena:?}");
            }
            if options.realtime {
                next_frame += frame;
                let now = Instant::now();
                if next_frame > now {
                    std::thread::sleep(next_frame - now);
                } else {
                    next_frame = now;
                }
            }
        }

        let survivors: Vec<&str> = arena.alive_ships().map(|(_, s)| s.name()).collect();
        match survivors.as_slice() {
            [winner] => log::info!("{winner} wins after {} turns", arena.time_ticks),
            [] => log::info!("No survivors after {} turns", arena.time_ticks),
            many => log::info!("Draw after {} turns: {}", arena.time_ticks, many.join(", ")),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use clap::CommandFactory;

        #[test]
        fn test_cli_definition() {
            Options::command().debug_assert();
        }

        #[test]
        fn test_defaults() {
            let options = Options::try_parse_from(["astro-arena"]).unwrap();
            assert_eq!(options.config, None);
            assert_eq!(options.seed, 42);
            assert_eq!(options.turns, MAX_TURNS);
            assert_eq!(options.ships, 4);
            assert!(!options.realtime);
            assert!(!options.print_config);
        }

        #[test]
        fn test_equals_and_spaced_values() {
            let options =
                Options::try_parse_from(["astro-arena", "--seed=7", "--turns", "5", "--realtime", "arena.json"])
                    .unwrap();
            assert_eq!(options.seed, 7);
            assert_eq!(options.turns, 5);
            assert!(options.realtime);
            assert_eq!(options.config, Some(PathBuf::from("arena.json")));
        }

        #[test]
        fn test_rejects_bad_values() {
            assert!(Options::try_parse_from(["astro-arena", "--seed", "many"]).is_err());
            assert!(Options::try_parse_from(["astro-arena", "--warp"]).is_err());
        }

        #[test]
        fn test_short_match_runs() {
            let options = Options::try_parse_from(["astro-arena", "--turns", "20", "--ships", "2"]).unwrap();
            run(options);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    host::run(host::Options::parse());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The arena is a library on the web; the host there is the page
}
