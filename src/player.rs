//! The player entity and its rule-based autopilot.
//!
//! The autopilot is a one-step greedy scorer, not a search. When any ghost is
//! edible it hunts the nearest one. Otherwise every open neighbour is scored
//! by pull toward the remaining pellets minus push away from nearby ghosts.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::config::SimConfig;
use crate::entity::Entity;
use crate::ghost::GhostView;
use crate::maze::{GridPos, Maze, TileMask};
use crate::pellets::Pellets;

/// Tiles the player may walk on. The ghost door stays shut to it.
pub const PLAYER_PASSABLE: TileMask = TileMask::PATH
    .union(TileMask::POWER_PELLET)
    .union(TileMask::GHOST_SPAWN);

/// What ghosts may know about the player during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerView {
    pub pos: GridPos,
    pub target: GridPos,
}

#[derive(Clone, Copy, Debug)]
struct Autopilot {
    danger_radius: f32,
    danger_weight: f32,
}

impl Autopilot {
    fn utility(&self, tile: GridPos, pellets: [&Pellets; 2], ghosts: &[GhostView]) -> f32 {
        let mut score = 0.0;
        for pellet in pellets.into_iter().flat_map(Pellets::iter) {
            score += pellet.value as f32 / tile.distance(pellet.pos).max(1.0);
        }
        for ghost in ghosts.iter().filter(|ghost| ghost.is_dangerous()) {
            let distance = tile.distance(ghost.pos);
            if distance < self.danger_radius {
                score -= self.danger_weight / distance.max(1.0);
            }
        }
        score
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    body: Entity,
    score: u32,
    alive: bool,
    autopilot: Autopilot,
}

impl Player {
    #[must_use]
    pub fn new(pos: GridPos, config: &SimConfig) -> Self {
        Self {
            body: Entity::new(pos, config.player_speed, config.cell_size, PLAYER_PASSABLE),
            score: 0,
            alive: true,
            autopilot: Autopilot {
                danger_radius: config.danger_radius,
                danger_weight: config.danger_weight,
            },
        }
    }

    pub const fn body(&self) -> &Entity {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Entity {
        &mut self.body
    }

    pub const fn score(&self) -> u32 {
        self.score
    }

    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    pub fn add_score(&mut self, points: u32) {
        self.score += points;
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            pos: self.body.grid(),
            target: self.body.target(),
        }
    }

    /// Manual steering entry point; see [`Entity::set_new_target`].
    pub fn set_new_target(&mut self, dx: i32, dy: i32, maze: &dyn Maze) -> bool {
        self.body.set_new_target(dx, dy, maze)
    }

    /// Eats the power pellet on the player's tile. Returns the points gained.
    pub fn eat_pellet(&mut self, power_pellets: &mut Pellets) -> u32 {
        self.consume(power_pellets)
    }

    /// Eats the score pellet on the player's tile. Returns the points gained.
    pub fn eat_score_pellet(&mut self, score_pellets: &mut Pellets) -> u32 {
        self.consume(score_pellets)
    }

    fn consume(&mut self, pellets: &mut Pellets) -> u32 {
        let Some(pellet) = pellets.take(self.body.grid()) else {
            return 0;
        };
        self.score += pellet.value;
        pellet.value
    }

    /// Picks the next tile. Returns `true` when a new target was set.
    pub fn autopilot_step(
        &mut self,
        maze: &dyn Maze,
        power_pellets: &Pellets,
        score_pellets: &Pellets,
        ghosts: &[GhostView],
        rng: &mut impl Rng,
    ) -> bool {
        let here = self.body.grid();
        let prey = ghosts
            .iter()
            .filter(|ghost| ghost.vulnerable)
            .min_by_key(|ghost| ghost.pos.distance_sq(here));

        let step = if let Some(prey) = prey {
            debug!(%here, prey = %prey.pos, "autopilot hunting");
            self.body.best_step(maze, |next| -next.distance(prey.pos))
        } else if power_pellets.is_empty() && score_pellets.is_empty() {
            self.body.open_steps(maze).choose(rng).copied()
        } else {
            let autopilot = self.autopilot;
            self.body.best_step(maze, |next| {
                autopilot.utility(next, [power_pellets, score_pellets], ghosts)
            })
        };

        step.map_or(false, |dir| self.body.step_toward(dir, maze))
    }
}
