//! Broad-phase uniform grid
//!
//! Buckets alive ships and asteroids by cell. Cell coordinates wrap modulo the
//! grid on both axes, so positions outside the nominal world (torpedoes are
//! not wrapped) still land in a valid bucket. The grid only stores indices
//! into the arena collections and is rebuilt before every collision pass.

use glam::Vec2;

use super::state::{Asteroid, Ship};

#[derive(Debug, Clone, Default)]
pub struct SpatialGrid {
    cell_size: f32,
    world: Vec2,
    cols: i32,
    rows: i32,
    ships: Vec<Vec<usize>>,
    asteroids: Vec<Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32, world: Vec2) -> Self {
        let size = cell_size.max(1.0);
        let cols = ((world.x / size).ceil() as i32).max(1);
        let rows = ((world.y / size).ceil() as i32).max(1);
        let cells = (cols * rows) as usize;
        Self {
            cell_size,
            world,
            cols,
            rows,
            ships: vec![Vec::new(); cells],
            asteroids: vec![Vec::new(); cells],
        }
    }

    /// Whether this grid was laid out for the given parameters
    pub fn matches(&self, cell_size: f32, world: Vec2) -> bool {
        self.cell_size == cell_size && self.world == world && !self.ships.is_empty()
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    /// Unwrapped cell coordinate (floor division)
    pub fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        let size = self.cell_size.max(1.0);
        ((pos.x / size).floor() as i32, (pos.y / size).floor() as i32)
    }

    /// Bucket index for any cell coordinate, wrapped onto the grid
    pub fn cell_index(&self, cx: i32, cy: i32) -> usize {
        let x = cx.rem_euclid(self.cols);
        let y = cy.rem_euclid(self.rows);
        (y * self.cols + x) as usize
    }

    pub fn cell_index_of(&self, pos: Vec2) -> usize {
        let (cx, cy) = self.cell_of(pos);
        self.cell_index(cx, cy)
    }

    /// Clear and re-bin every alive ship and asteroid
    pub fn rebuild(&mut self, ships: &[Ship], asteroids: &[Asteroid]) {
        for bucket in self.ships.iter_mut().chain(self.asteroids.iter_mut()) {
            bucket.clear();
        }
        for (i, ship) in ships.iter().enumerate().filter(|(_, s)| s.alive) {
            let cell = self.cell_index_of(ship.pos);
            self.ships[cell].push(i);
        }
        for (i, asteroid) in asteroids.iter().enumerate().filter(|(_, a)| a.alive) {
            let cell = self.cell_index_of(asteroid.pos);
            self.asteroids[cell].push(i);
        }
    }

    /// Buckets of the 3x3 block around a cell, wrapped, without repeats
    /// (small grids fold the block onto itself)
    pub fn neighborhood(&self, cx: i32, cy: i32) -> Vec<usize> {
        let mut cells = Vec::with_capacity(9);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let idx = self.cell_index(cx + dx, cy + dy);
                if !cells.contains(&idx) {
                    cells.push(idx);
                }
            }
        }
        cells
    }

    pub fn neighborhood_of(&self, pos: Vec2) -> Vec<usize> {
        let (cx, cy) = self.cell_of(pos);
        self.neighborhood(cx, cy)
    }

    pub fn ships_in(&self, cell: usize) -> &[usize] {
        self.ships.get(cell).map_or(&[], Vec::as_slice)
    }

    pub fn asteroids_in(&self, cell: usize) -> &[usize] {
        self.asteroids.get(cell).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShipConfig;
    use crate::sim::geometry::ConvexPolygon;
    use crate::sim::state::Color;

    fn grid() -> SpatialGrid {
        SpatialGrid::new(128.0, Vec2::splat(2048.0))
    }

    fn asteroid_at(pos: Vec2, alive: bool) -> Asteroid {
        Asteroid {
            pos,
            vel: Vec2::ZERO,
            size: 75.0,
            hp: 3,
            alive,
            outline: ConvexPolygon::regular(8, 75.0),
        }
    }

    #[test]
    fn test_dimensions() {
        let g = grid();
        assert_eq!(g.cols(), 16);
        assert_eq!(g.rows(), 16);
        // Partial cells round up
        let g = SpatialGrid::new(100.0, Vec2::new(250.0, 99.0));
        assert_eq!((g.cols(), g.rows()), (3, 1));
    }

    #[test]
    fn test_out_of_range_cells_wrap() {
        let g = grid();
        assert_eq!(g.cell_of(Vec2::new(-1.0, 130.0)), (-1, 1));
        assert_eq!(g.cell_index(-1, 0), g.cell_index(15, 0));
        assert_eq!(g.cell_index(16, 16), g.cell_index(0, 0));
        assert_eq!(g.cell_index_of(Vec2::new(2048.0 + 5.0, 3.0)), g.cell_index(0, 0));
        assert_eq!(g.cell_index_of(Vec2::new(-4100.0, 0.0)), g.cell_index(15, 0));
    }

    #[test]
    fn test_neighborhood_wraps_at_corner() {
        let g = grid();
        let cells = g.neighborhood(0, 0);
        assert_eq!(cells.len(), 9);
        assert!(cells.contains(&g.cell_index(15, 15)));
        assert!(cells.contains(&g.cell_index(1, 1)));
        assert!(cells.contains(&g.cell_index(15, 1)));
    }

    #[test]
    fn test_neighborhood_on_tiny_grid_has_no_repeats() {
        let g = SpatialGrid::new(128.0, Vec2::new(256.0, 128.0));
        let cells = g.neighborhood(0, 0);
        assert_eq!(cells.len(), 2);
    }

    #[test]
    fn test_rebuild_bins_only_alive_bodies() {
        let mut g = grid();
        let cfg = ShipConfig::default();
        let mut ships = vec![
            Ship::new(None, Vec2::new(10.0, 10.0), 0.0, Color::WHITE, &cfg),
            Ship::new(None, Vec2::new(10.0, 10.0), 0.0, Color::WHITE, &cfg),
        ];
        ships[1].alive = false;
        let asteroids = vec![
            asteroid_at(Vec2::new(300.0, 10.0), true),
            asteroid_at(Vec2::new(300.0, 10.0), false),
        ];
        g.rebuild(&ships, &asteroids);

        assert_eq!(g.ships_in(g.cell_index(0, 0)), &[0]);
        assert_eq!(g.asteroids_in(g.cell_index(2, 0)), &[0]);

        // Rebuild clears previous contents
        g.rebuild(&[], &[]);
        assert!(g.ships_in(g.cell_index(0, 0)).is_empty());
        assert!(g.asteroids_in(g.cell_index(2, 0)).is_empty());
    }

    #[test]
    fn test_seam_neighbor_is_found() {
        let mut g = grid();
        let asteroids = vec![asteroid_at(Vec2::new(2040.0, 1000.0), true)];
        g.rebuild(&[], &asteroids);
        let found = g
            .neighborhood_of(Vec2::new(5.0, 1000.0))
            .into_iter()
            .any(|cell| g.asteroids_in(cell).contains(&0));
        assert!(found);
    }
}
