//! Randomized maze layouts.
//!
//! Carves a perfect maze with randomized Prim, braids away most dead ends,
//! then cuts a ghost base with a single door into the middle and reconnects
//! anything the base cut off. Power pellets go in the four corners.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::{Dir, GridPos, Maze, Tile, TileGrid};
use crate::error::MazeError;

const PEN_W: i32 = 9;
const PEN_H: i32 = 5;
const BRAID_CHANCE: f32 = 0.45;
const EXTRA_OPENINGS: f32 = 0.08;
pub const MIN_WIDTH: i32 = 11;
pub const MIN_HEIGHT: i32 = 9;

#[derive(Clone, Copy, Debug)]
struct PenBounds {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl PenBounds {
    fn centered(width: i32, height: i32) -> Self {
        let mut pen_w = PEN_W.min(width - 2);
        let mut pen_h = PEN_H.min(height - 2);
        if pen_w % 2 == 0 {
            pen_w -= 1;
        }
        if pen_h % 2 == 0 {
            pen_h -= 1;
        }
        pen_w = pen_w.max(3);
        pen_h = pen_h.max(3);

        let x0 = (width - pen_w) / 2;
        let y0 = (height - pen_h) / 2;
        Self {
            x0,
            y0,
            x1: x0 + pen_w - 1,
            y1: y0 + pen_h - 1,
        }
    }

    const fn contains(&self, pos: GridPos) -> bool {
        pos.x >= self.x0 && pos.x <= self.x1 && pos.y >= self.y0 && pos.y <= self.y1
    }

    const fn is_ring(&self, pos: GridPos) -> bool {
        self.contains(pos)
            && (pos.x == self.x0 || pos.x == self.x1 || pos.y == self.y0 || pos.y == self.y1)
    }
}

/// Builds a random playable maze of exactly `width` x `height` tiles.
pub fn generate_maze(rng: &mut impl Rng, width: i32, height: i32) -> Result<TileGrid, MazeError> {
    if width < MIN_WIDTH || height < MIN_HEIGHT {
        return Err(MazeError::TooSmall {
            width,
            height,
            min_width: MIN_WIDTH,
            min_height: MIN_HEIGHT,
        });
    }

    let mut grid = TileGrid::filled(width, height, Tile::Wall);
    let cells_w = (width - 1) / 2;
    let cells_h = (height - 1) / 2;

    carve_prim(&mut grid, cells_w, cells_h, rng);
    braid(&mut grid, cells_w, cells_h, rng);

    let pen = PenBounds::centered(width, height);
    carve_pen(&mut grid, &pen);
    ensure_connected(&mut grid, &pen);

    for corner in [
        GridPos::new(1, 1),
        GridPos::new(width - 2, 1),
        GridPos::new(1, height - 2),
        GridPos::new(width - 2, height - 2),
    ] {
        if grid.tile(corner) == Tile::Path {
            grid.set(corner, Tile::PowerPellet);
        }
    }

    for y in 0..height {
        for x in 0..width {
            if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                grid.set(GridPos::new(x, y), Tile::Boundary);
            }
        }
    }

    debug!(width, height, "generated maze\n{grid}");
    Ok(grid)
}

// ============================================================================
// Carving
// ============================================================================

const fn cell_pos(cx: i32, cy: i32) -> GridPos {
    GridPos::new(cx * 2 + 1, cy * 2 + 1)
}

fn wall_between(cx: i32, cy: i32, nx: i32, ny: i32) -> GridPos {
    let a = cell_pos(cx, cy);
    let b = cell_pos(nx, ny);
    GridPos::new((a.x + b.x) / 2, (a.y + b.y) / 2)
}

fn cell_neighbors(cx: i32, cy: i32, cells_w: i32, cells_h: i32) -> impl Iterator<Item = (i32, i32)> {
    [Dir::Up, Dir::Down, Dir::Left, Dir::Right]
        .into_iter()
        .filter_map(move |dir| {
            let (dx, dy) = dir.delta();
            let (nx, ny) = (cx + dx, cy + dy);
            (nx >= 0 && ny >= 0 && nx < cells_w && ny < cells_h).then_some((nx, ny))
        })
}

fn carve_prim(grid: &mut TileGrid, cells_w: i32, cells_h: i32, rng: &mut impl Rng) {
    let idx = |cx: i32, cy: i32| (cy * cells_w + cx) as usize;
    let mut in_maze = vec![false; (cells_w * cells_h) as usize];
    let mut frontier: Vec<(i32, i32)> = Vec::new();

    let start = (rng.gen_range(0..cells_w), rng.gen_range(0..cells_h));
    in_maze[idx(start.0, start.1)] = true;
    grid.set(cell_pos(start.0, start.1), Tile::Path);
    frontier.extend(cell_neighbors(start.0, start.1, cells_w, cells_h));

    while !frontier.is_empty() {
        let (cx, cy) = frontier.swap_remove(rng.gen_range(0..frontier.len()));
        if in_maze[idx(cx, cy)] {
            continue;
        }

        let carved: Vec<(i32, i32)> = cell_neighbors(cx, cy, cells_w, cells_h)
            .filter(|&(nx, ny)| in_maze[idx(nx, ny)])
            .collect();
        let Some(&(nx, ny)) = carved.choose(rng) else {
            continue;
        };

        in_maze[idx(cx, cy)] = true;
        grid.set(wall_between(cx, cy, nx, ny), Tile::Path);
        grid.set(cell_pos(cx, cy), Tile::Path);
        frontier.extend(
            cell_neighbors(cx, cy, cells_w, cells_h)
                .filter(|&(x, y)| !in_maze[idx(x, y)]),
        );
    }
}

fn braid(grid: &mut TileGrid, cells_w: i32, cells_h: i32, rng: &mut impl Rng) {
    for cy in 0..cells_h {
        for cx in 0..cells_w {
            let mut open = 0;
            let mut closed = Vec::new();
            for (nx, ny) in cell_neighbors(cx, cy, cells_w, cells_h) {
                if grid.tile(wall_between(cx, cy, nx, ny)) == Tile::Wall {
                    closed.push((nx, ny));
                } else {
                    open += 1;
                }
            }

            let dead_end = open == 1 && rng.gen::<f32>() < BRAID_CHANCE;
            if dead_end || rng.gen::<f32>() < EXTRA_OPENINGS {
                if let Some(&(nx, ny)) = closed.choose(rng) {
                    grid.set(wall_between(cx, cy, nx, ny), Tile::Path);
                    grid.set(cell_pos(nx, ny), Tile::Path);
                }
            }
        }
    }
}

fn carve_pen(grid: &mut TileGrid, pen: &PenBounds) {
    for y in pen.y0..=pen.y1 {
        for x in pen.x0..=pen.x1 {
            let pos = GridPos::new(x, y);
            let tile = if pen.is_ring(pos) {
                Tile::Wall
            } else {
                Tile::GhostSpawn
            };
            grid.set(pos, tile);
        }
    }

    let door = GridPos::new((pen.x0 + pen.x1) / 2, pen.y0);
    grid.set(door, Tile::Door);

    // Corridor from the door up to the first open tile.
    let mut pos = door.step(Dir::Up);
    while pos.y > 0 && grid.tile(pos) == Tile::Wall {
        grid.set(pos, Tile::Path);
        pos = pos.step(Dir::Up);
    }
}

// ============================================================================
// Connectivity
// ============================================================================

fn is_open(grid: &TileGrid, pen: &PenBounds, pos: GridPos) -> bool {
    !pen.contains(pos) && matches!(grid.tile(pos), Tile::Path | Tile::PowerPellet)
}

fn interior(grid: &TileGrid) -> impl Iterator<Item = GridPos> + '_ {
    (1..grid.height() - 1).flat_map(move |y| (1..grid.width() - 1).map(move |x| GridPos::new(x, y)))
}

fn flood(grid: &TileGrid, pen: &PenBounds, start: GridPos) -> Vec<bool> {
    let idx = |pos: GridPos| (pos.y * grid.width() + pos.x) as usize;
    let mut seen = vec![false; (grid.width() * grid.height()) as usize];
    let mut stack = vec![start];
    seen[idx(start)] = true;
    while let Some(pos) = stack.pop() {
        for dir in Dir::SCAN {
            let next = pos.step(dir);
            if !grid.is_valid(next) || seen[idx(next)] || !is_open(grid, pen, next) {
                continue;
            }
            seen[idx(next)] = true;
            stack.push(next);
        }
    }
    seen
}

fn ensure_connected(grid: &mut TileGrid, pen: &PenBounds) {
    let Some(start) = interior(grid).find(|&pos| is_open(grid, pen, pos)) else {
        return;
    };
    let width = grid.width();
    let reached = |seen: &[bool], pos: GridPos| seen[(pos.y * width + pos.x) as usize];

    let mut seen = flood(grid, pen, start);
    for _ in 0..grid.width() * grid.height() {
        if interior(grid).all(|pos| !is_open(grid, pen, pos) || reached(&seen, pos)) {
            return;
        }

        // Open the first wall that touches both a reached and an unreached tile.
        let bridge = interior(grid).find(|&pos| {
            if grid.tile(pos) != Tile::Wall || pen.is_ring(pos) {
                return false;
            }
            let mut touches_reached = false;
            let mut touches_unreached = false;
            for dir in Dir::SCAN {
                let next = pos.step(dir);
                if is_open(grid, pen, next) {
                    if reached(&seen, next) {
                        touches_reached = true;
                    } else {
                        touches_unreached = true;
                    }
                }
            }
            touches_reached && touches_unreached
        });

        let Some(bridge) = bridge else {
            return;
        };
        grid.set(bridge, Tile::Path);
        seen = flood(grid, pen, start);
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn generated(seed: u64) -> TileGrid {
        let mut rng = StdRng::seed_from_u64(seed);
        generate_maze(&mut rng, 31, 21).unwrap()
    }

    #[test]
    fn rejects_tiny_mazes() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            generate_maze(&mut rng, 7, 7),
            Err(MazeError::TooSmall { .. })
        ));
    }

    #[test]
    fn keeps_requested_size_with_boundary_ring() {
        let grid = generated(7);
        assert_eq!((grid.width(), grid.height()), (31, 21));
        for x in 0..31 {
            assert_eq!(grid.tile(GridPos::new(x, 0)), Tile::Boundary);
            assert_eq!(grid.tile(GridPos::new(x, 20)), Tile::Boundary);
        }
        for y in 0..21 {
            assert_eq!(grid.tile(GridPos::new(0, y)), Tile::Boundary);
            assert_eq!(grid.tile(GridPos::new(30, y)), Tile::Boundary);
        }
    }

    #[test]
    fn has_base_with_single_door() {
        let grid = generated(11);
        assert_eq!(grid.tiles_of(Tile::Door).len(), 1);
        assert!(!grid.tiles_of(Tile::GhostSpawn).is_empty());

        let door = grid.tiles_of(Tile::Door)[0];
        assert_eq!(grid.tile(door.step(Dir::Down)), Tile::GhostSpawn);
        assert!(matches!(
            grid.tile(door.step(Dir::Up)),
            Tile::Path | Tile::PowerPellet
        ));
    }

    #[test]
    fn open_tiles_are_connected() {
        for seed in 0..5 {
            let grid = generated(seed);
            let open: Vec<GridPos> = grid
                .tiles_of(Tile::Path)
                .into_iter()
                .chain(grid.tiles_of(Tile::PowerPellet))
                .collect();

            let mut seen = vec![open[0]];
            let mut stack = vec![open[0]];
            while let Some(pos) = stack.pop() {
                for dir in Dir::SCAN {
                    let next = pos.step(dir);
                    if open.contains(&next) && !seen.contains(&next) {
                        seen.push(next);
                        stack.push(next);
                    }
                }
            }
            assert_eq!(seen.len(), open.len(), "seed {seed} left tiles unreachable");
        }
    }

    #[test]
    fn same_seed_same_maze() {
        assert_eq!(generated(42), generated(42));
    }
}
