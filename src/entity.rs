//! Positional core shared by the player and the ghosts.
//!
//! An entity lives in two coordinate systems at once. The grid coordinate is
//! what the AI reasons about and only changes on arrival. The pixel coordinate
//! glides toward the center of the target tile a fixed distance per tick.

use crate::maze::{Dir, GridPos, Maze, TileMask};

/// Continuous on-screen position, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelPos {
    pub x: f32,
    pub y: f32,
}

/// Pixel center of the tile at `pos`.
#[must_use]
pub fn cell_center(pos: GridPos, cell_size: f32) -> PixelPos {
    PixelPos {
        x: pos.x as f32 * cell_size + cell_size / 2.0,
        y: pos.y as f32 * cell_size + cell_size / 2.0,
    }
}

/// Tile whose area contains `pixel`.
#[must_use]
pub fn containing_cell(pixel: PixelPos, cell_size: f32) -> GridPos {
    GridPos::new(
        (pixel.x / cell_size).floor() as i32,
        (pixel.y / cell_size).floor() as i32,
    )
}

#[derive(Clone, Debug)]
pub struct Entity {
    grid: GridPos,
    target: GridPos,
    pixel: PixelPos,
    speed: f32,
    cell_size: f32,
    passable: TileMask,
}

impl Entity {
    #[must_use]
    pub fn new(pos: GridPos, speed: f32, cell_size: f32, passable: TileMask) -> Self {
        Self {
            grid: pos,
            target: pos,
            pixel: cell_center(pos, cell_size),
            speed,
            cell_size,
            passable,
        }
    }

    pub const fn grid(&self) -> GridPos {
        self.grid
    }

    pub const fn target(&self) -> GridPos {
        self.target
    }

    pub const fn pixel(&self) -> PixelPos {
        self.pixel
    }

    pub const fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn is_at_target(&self) -> bool {
        self.grid == self.target
    }

    /// Direction of the step in progress, `None` when standing on the target.
    #[must_use]
    pub fn heading(&self) -> Option<Dir> {
        Dir::from_delta(
            (self.target.x - self.grid.x).signum(),
            (self.target.y - self.grid.y).signum(),
        )
    }

    /// Advances one tick toward the target tile center. Returns `true` once
    /// the entity has arrived, at which point grid and pixel both sit exactly
    /// on the target.
    pub fn move_towards_target(&mut self) -> bool {
        let goal = cell_center(self.target, self.cell_size);
        let dx = goal.x - self.pixel.x;
        let dy = goal.y - self.pixel.y;
        let dist = dx.hypot(dy);

        if dist <= self.speed {
            self.pixel = goal;
            self.grid = self.target;
            return true;
        }

        if dist > 0.0 {
            self.pixel.x += dx / dist * self.speed;
            self.pixel.y += dy / dist * self.speed;
        }
        false
    }

    /// Whether `pos` is inside the maze and its tile is one this entity may stand on.
    pub fn can_enter(&self, maze: &dyn Maze, pos: GridPos) -> bool {
        maze.is_valid(pos) && self.passable.contains(maze.tile(pos).mask())
    }

    /// Retargets to the neighbouring tile `(dx, dy)` away. Leaves the entity
    /// untouched and returns `false` when that tile cannot be entered.
    pub fn set_new_target(&mut self, dx: i32, dy: i32, maze: &dyn Maze) -> bool {
        let candidate = self.grid.offset(dx, dy);
        if !self.can_enter(maze, candidate) {
            return false;
        }
        self.target = candidate;
        true
    }

    pub fn step_toward(&mut self, dir: Dir, maze: &dyn Maze) -> bool {
        let (dx, dy) = dir.delta();
        self.set_new_target(dx, dy, maze)
    }

    /// Places the entity on `pos` with grid, target and pixel aligned.
    pub fn teleport(&mut self, pos: GridPos) {
        self.grid = pos;
        self.target = pos;
        self.pixel = cell_center(pos, self.cell_size);
    }

    /// Highest-scoring enterable neighbour, scanning [`Dir::SCAN`]. The first
    /// direction wins a tie. `None` when every neighbour is blocked.
    pub fn best_step<F>(&self, maze: &dyn Maze, mut score: F) -> Option<Dir>
    where
        F: FnMut(GridPos) -> f32,
    {
        let mut best: Option<(Dir, f32)> = None;
        for dir in Dir::SCAN {
            let next = self.grid.step(dir);
            if !self.can_enter(maze, next) {
                continue;
            }
            let value = score(next);
            if best.map_or(true, |(_, top)| value > top) {
                best = Some((dir, value));
            }
        }
        best.map(|(dir, _)| dir)
    }

    /// Enterable neighbouring directions in scan order.
    pub fn open_steps(&self, maze: &dyn Maze) -> Vec<Dir> {
        Dir::SCAN
            .into_iter()
            .filter(|&dir| self.can_enter(maze, self.grid.step(dir)))
            .collect()
    }
}
