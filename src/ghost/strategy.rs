//! Chase targets.
//!
//! Every ghost shares the same movement rules and differs only in which tile
//! it aims for while chasing. A [`ChaseStrategy`] answers that one question.

use std::fmt;

use crate::maze::{GridPos, Maze};
use crate::player::PlayerView;

pub trait ChaseStrategy: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Tile this ghost wants to reach while chasing.
    fn chase_target(&self, player: &PlayerView, ghost: GridPos, maze: &dyn Maze) -> GridPos;
}

/// Heads straight for the player's tile.
#[derive(Clone, Copy, Debug, Default)]
pub struct Direct;

impl ChaseStrategy for Direct {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn chase_target(&self, player: &PlayerView, _ghost: GridPos, _maze: &dyn Maze) -> GridPos {
        player.pos
    }
}

/// Aims `lead` tiles ahead of the player along the axis it is moving on.
#[derive(Clone, Copy, Debug)]
pub struct Ambush {
    pub lead: i32,
}

impl ChaseStrategy for Ambush {
    fn name(&self) -> &'static str {
        "ambush"
    }

    fn chase_target(&self, player: &PlayerView, _ghost: GridPos, maze: &dyn Maze) -> GridPos {
        let (dx, dy) = if player.target.x != player.pos.x {
            ((player.target.x - player.pos.x).signum(), 0)
        } else {
            (0, (player.target.y - player.pos.y).signum())
        };
        maze.clamp(player.pos.offset(dx * self.lead, dy * self.lead))
    }
}

/// Mirrors itself through the player to come in from the far side.
#[derive(Clone, Copy, Debug, Default)]
pub struct Flank;

impl ChaseStrategy for Flank {
    fn name(&self) -> &'static str {
        "flank"
    }

    fn chase_target(&self, player: &PlayerView, ghost: GridPos, maze: &dyn Maze) -> GridPos {
        maze.clamp(GridPos::new(
            2 * player.pos.x - ghost.x,
            2 * player.pos.y - ghost.y,
        ))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Innermost tile of this corner, just inside the boundary ring.
    #[must_use]
    pub fn tile(self, maze: &dyn Maze) -> GridPos {
        let right = (maze.width() - 2).max(0);
        let bottom = (maze.height() - 2).max(0);
        match self {
            Self::TopLeft => GridPos::new(1, 1),
            Self::TopRight => GridPos::new(right, 1),
            Self::BottomLeft => GridPos::new(1, bottom),
            Self::BottomRight => GridPos::new(right, bottom),
        }
    }
}

/// Chases from afar, but falls back to guarding its corner once it gets
/// within `radius` tiles of the player.
#[derive(Clone, Copy, Debug)]
pub struct Patrol {
    pub corner: Corner,
    pub radius: f32,
}

impl ChaseStrategy for Patrol {
    fn name(&self) -> &'static str {
        "patrol"
    }

    fn chase_target(&self, player: &PlayerView, ghost: GridPos, maze: &dyn Maze) -> GridPos {
        if ghost.distance(player.pos) > self.radius {
            player.pos
        } else {
            self.corner.tile(maze)
        }
    }
}
