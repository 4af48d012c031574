//! Ghosts: an [`Entity`] driven by a small state machine.
//!
//! ```text
//!            set_edible                 eaten
//!   Chasing ───────────▶ Frightened ───────────▶ Respawning ──(timer)──┐
//!      ▲  ◀───(timer)────────┘                   (no delay)│           │
//!      │                                                   ▼           ▼
//!      └──────(timer)──── Waiting ◀──(at base)──────── Returning  teleport home
//!                            ▲                                         │
//!                            └─────────────────────────────────────────┘
//! ```
//!
//! A returning ghost that runs out of [`RETURN_STEP_BUDGET`] steps without
//! reaching a base is teleported onto the nearest one.
//!
//! Each tick runs exactly one branch, checked in order: waiting, frightened
//! countdown, respawn countdown, then movement for the resulting state.

pub mod strategy;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::config::{secs_to_ticks, SimConfig};
use crate::constants::{
    ALPHA_BLINK, ALPHA_OPAQUE, BLINK_PERIOD_SECS, BLINK_WINDOW_SECS, RETURN_STEP_BUDGET,
};
use crate::entity::Entity;
use crate::maze::{Dir, GridPos, Maze, Tile, TileMask};
use crate::player::PlayerView;
use strategy::ChaseStrategy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GhostState {
    Chasing,
    /// Edible and running from the player.
    Frightened { ticks_left: u32 },
    /// Just eaten: frozen where it was caught until the countdown ends.
    Respawning { ticks_left: u32 },
    /// Travelling back to the nearest base tile at return speed.
    Returning { steps_left: u32 },
    /// Parked in the base before rejoining the chase.
    Waiting { ticks_left: u32 },
}

/// What other entities may know about a ghost during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GhostView {
    pub pos: GridPos,
    pub vulnerable: bool,
    pub returning: bool,
    pub waiting: bool,
}

impl GhostView {
    /// A ghost that can catch the player right now.
    pub const fn is_dangerous(&self) -> bool {
        !self.vulnerable && !self.returning && !self.waiting
    }
}

#[derive(Clone, Copy, Debug)]
struct Tuning {
    speed: f32,
    return_speed: f32,
    respawn_secs: f32,
    base_wait_secs: f32,
}

#[derive(Debug)]
pub struct Ghost {
    name: String,
    color: Rgb,
    body: Entity,
    state: GhostState,
    death_count: u32,
    strategy: Box<dyn ChaseStrategy>,
    tuning: Tuning,
}

impl Ghost {
    pub fn new(
        name: impl Into<String>,
        color: Rgb,
        pos: GridPos,
        strategy: Box<dyn ChaseStrategy>,
        config: &SimConfig,
    ) -> Self {
        Self {
            name: name.into(),
            color,
            body: Entity::new(pos, config.ghost_speed, config.cell_size, TileMask::WALKABLE),
            state: GhostState::Chasing,
            death_count: 0,
            strategy,
            tuning: Tuning {
                speed: config.ghost_speed,
                return_speed: config.ghost_return_speed,
                respawn_secs: config.respawn_secs,
                base_wait_secs: config.base_wait_secs,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn color(&self) -> Rgb {
        self.color
    }

    pub const fn body(&self) -> &Entity {
        &self.body
    }

    pub const fn state(&self) -> GhostState {
        self.state
    }

    pub const fn death_count(&self) -> u32 {
        self.death_count
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub const fn is_vulnerable(&self) -> bool {
        matches!(self.state, GhostState::Frightened { ticks_left } if ticks_left > 0)
    }

    pub const fn is_returning(&self) -> bool {
        matches!(
            self.state,
            GhostState::Respawning { .. } | GhostState::Returning { .. }
        )
    }

    pub const fn is_waiting(&self) -> bool {
        matches!(self.state, GhostState::Waiting { .. })
    }

    pub const fn vulnerable_ticks(&self) -> u32 {
        match self.state {
            GhostState::Frightened { ticks_left } => ticks_left,
            _ => 0,
        }
    }

    pub const fn respawn_ticks(&self) -> u32 {
        match self.state {
            GhostState::Respawning { ticks_left } => ticks_left,
            _ => 0,
        }
    }

    pub const fn wait_ticks(&self) -> u32 {
        match self.state {
            GhostState::Waiting { ticks_left } => ticks_left,
            _ => 0,
        }
    }

    /// Render opacity: blinks during the last moments of being frightened.
    pub fn alpha(&self, fps: u32) -> u8 {
        let GhostState::Frightened { ticks_left } = self.state else {
            return ALPHA_OPAQUE;
        };
        if ticks_left >= secs_to_ticks(BLINK_WINDOW_SECS, fps) {
            return ALPHA_OPAQUE;
        }
        let period = secs_to_ticks(BLINK_PERIOD_SECS, fps).max(1);
        if (ticks_left / period) % 2 == 0 {
            ALPHA_OPAQUE
        } else {
            ALPHA_BLINK
        }
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            pos: self.body.grid(),
            vulnerable: self.is_vulnerable(),
            returning: self.is_returning(),
            waiting: self.is_waiting(),
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Makes the ghost edible for `duration` ticks. Ghosts that were eaten
    /// and have not rejoined the chase yet are unaffected.
    pub fn set_edible(&mut self, duration: u32) {
        match self.state {
            GhostState::Chasing | GhostState::Frightened { .. } => {
                self.state = if duration == 0 {
                    GhostState::Chasing
                } else {
                    GhostState::Frightened {
                        ticks_left: duration,
                    }
                };
                debug!(ghost = %self.name, duration, "frightened");
            }
            GhostState::Respawning { .. }
            | GhostState::Returning { .. }
            | GhostState::Waiting { .. } => {}
        }
    }

    /// The player caught this ghost. Without a respawn delay it walks home.
    pub fn set_returning_to_spawn(&mut self, fps: u32) {
        self.death_count += 1;
        let ticks_left = secs_to_ticks(self.tuning.respawn_secs, fps);
        self.state = if ticks_left == 0 {
            GhostState::Returning {
                steps_left: RETURN_STEP_BUDGET,
            }
        } else {
            GhostState::Respawning { ticks_left }
        };
        info!(ghost = %self.name, deaths = self.death_count, "eaten");
    }

    /// Parks the ghost for `base_wait / deaths` seconds; every death makes
    /// the next wait shorter.
    pub fn set_waiting(&mut self, fps: u32) {
        let deaths = self.death_count.max(1);
        let ticks_left = secs_to_ticks(self.tuning.base_wait_secs / deaths as f32, fps);
        self.state = if ticks_left == 0 {
            GhostState::Chasing
        } else {
            GhostState::Waiting { ticks_left }
        };
        debug!(ghost = %self.name, ticks_left, "waiting in base");
    }

    /// Puts the ghost back on `pos` in its starting state.
    pub fn reset(&mut self, pos: GridPos) {
        self.body.teleport(pos);
        self.body.set_speed(self.tuning.speed);
        self.state = GhostState::Chasing;
    }

    // ========================================================================
    // Per-tick Update
    // ========================================================================

    pub fn advance(&mut self, maze: &dyn Maze, player: &PlayerView, fps: u32, rng: &mut impl Rng) {
        match self.state {
            GhostState::Waiting { ticks_left } => {
                let ticks_left = ticks_left.saturating_sub(1);
                if ticks_left == 0 {
                    self.state = GhostState::Chasing;
                    self.body.set_speed(self.tuning.speed);
                    info!(ghost = %self.name, "finished waiting, resuming chase");
                } else {
                    self.state = GhostState::Waiting { ticks_left };
                }
                return;
            }
            GhostState::Frightened { ticks_left } => {
                let ticks_left = ticks_left.saturating_sub(1);
                if ticks_left == 0 {
                    self.state = GhostState::Chasing;
                    info!(ghost = %self.name, "no longer edible");
                } else {
                    self.state = GhostState::Frightened { ticks_left };
                }
            }
            _ => {}
        }

        if let GhostState::Respawning { ticks_left } = self.state {
            let ticks_left = ticks_left.saturating_sub(1);
            if ticks_left == 0 {
                let bases = maze.tiles_of(Tile::GhostSpawn);
                let home = bases.choose(rng).copied().unwrap_or(self.body.grid());
                self.respawn_at(home, fps);
            } else {
                self.state = GhostState::Respawning { ticks_left };
            }
            return;
        }

        if !self.body.move_towards_target() {
            return;
        }

        match self.state {
            GhostState::Returning { steps_left } => self.return_home(steps_left, maze, fps, rng),
            GhostState::Frightened { .. } => self.flee(player.pos, maze, rng),
            _ => self.chase(player, maze, rng),
        }
    }

    fn respawn_at(&mut self, home: GridPos, fps: u32) {
        self.reset(home);
        self.set_waiting(fps);
        info!(ghost = %self.name, %home, "respawned at base");
    }

    /// One step toward the nearest base: horizontal first, then vertical,
    /// then any open direction.
    fn return_home(&mut self, steps_left: u32, maze: &dyn Maze, fps: u32, rng: &mut impl Rng) {
        self.body.set_speed(self.tuning.return_speed);
        let here = self.body.grid();
        let bases = maze.tiles_of(Tile::GhostSpawn);
        let Some(&home) = bases.iter().min_by_key(|base| base.distance_sq(here)) else {
            self.move_random(maze, rng);
            return;
        };
        if home == here {
            self.respawn_at(home, fps);
            return;
        }
        if steps_left == 0 {
            debug!(ghost = %self.name, %here, %home, "no way home, teleporting");
            self.respawn_at(home, fps);
            return;
        }
        self.state = GhostState::Returning {
            steps_left: steps_left - 1,
        };

        let dx = (home.x - here.x).signum();
        let dy = (home.y - here.y).signum();
        if dx != 0 && self.body.set_new_target(dx, 0, maze) {
            return;
        }
        if dy != 0 && self.body.set_new_target(0, dy, maze) {
            return;
        }
        self.move_random(maze, rng);
    }

    fn flee(&mut self, player: GridPos, maze: &dyn Maze, rng: &mut impl Rng) {
        let escape = self.body.best_step(maze, |next| next.distance(player));
        self.take_step(escape, maze, rng);
    }

    fn chase(&mut self, player: &PlayerView, maze: &dyn Maze, rng: &mut impl Rng) {
        let target = self.strategy.chase_target(player, self.body.grid(), maze);
        let step = self.body.best_step(maze, |next| -next.distance(target));
        debug!(ghost = %self.name, strategy = self.strategy.name(), %target, ?step, "chasing");
        self.take_step(step, maze, rng);
    }

    fn take_step(&mut self, step: Option<Dir>, maze: &dyn Maze, rng: &mut impl Rng) {
        if let Some(dir) = step {
            if self.body.step_toward(dir, maze) {
                return;
            }
        }
        self.move_random(maze, rng);
    }

    fn move_random(&mut self, maze: &dyn Maze, rng: &mut impl Rng) {
        let mut dirs = Dir::SCAN;
        dirs.shuffle(rng);
        for dir in dirs {
            if self.body.step_toward(dir, maze) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::strategy::Direct;
    use super::*;
    use crate::entity::cell_center;
    use crate::maze::TileGrid;

    const FPS: u32 = 10;

    fn config() -> SimConfig {
        SimConfig::default().with_fps(FPS)
    }

    fn ghost_at(pos: GridPos) -> Ghost {
        Ghost::new("Blinky", Rgb(255, 0, 0), pos, Box::new(Direct), &config())
    }

    fn still_player(x: i32, y: i32) -> PlayerView {
        PlayerView {
            pos: GridPos::new(x, y),
            target: GridPos::new(x, y),
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(9)
    }

    fn room() -> TileGrid {
        TileGrid::parse(
            "
#########
#.......#
#.......#
#...S...#
#.......#
#.......#
#########
",
        )
        .unwrap()
    }

    #[test]
    fn edible_lasts_exactly_duration_ticks() {
        let maze = room();
        let mut ghost = ghost_at(GridPos::new(1, 1));
        let player = still_player(7, 5);
        let mut rng = rng();

        ghost.set_edible(5);
        for tick in 1..=5 {
            assert!(ghost.is_vulnerable(), "vulnerable before tick {tick}");
            ghost.advance(&maze, &player, FPS, &mut rng);
        }
        assert!(!ghost.is_vulnerable());
        assert_eq!(ghost.state(), GhostState::Chasing);
    }

    #[test]
    fn edible_refresh_resets_timer() {
        let mut ghost = ghost_at(GridPos::new(1, 1));
        ghost.set_edible(5);
        ghost.set_edible(9);
        assert_eq!(ghost.vulnerable_ticks(), 9);
    }

    #[test]
    fn respawn_cycle_freezes_then_teleports_and_waits() {
        let maze = room();
        let start = GridPos::new(2, 2);
        let mut ghost = ghost_at(start);
        let player = still_player(7, 5);
        let mut rng = rng();

        ghost.set_returning_to_spawn(FPS);
        assert!(ghost.is_returning());
        let delay = ghost.respawn_ticks();
        assert_eq!(delay, 50);

        for _ in 1..delay {
            ghost.advance(&maze, &player, FPS, &mut rng);
            assert_eq!(ghost.body().grid(), start);
            assert_eq!(ghost.body().target(), start);
            assert_eq!(ghost.body().pixel(), cell_center(start, config().cell_size));
        }

        ghost.advance(&maze, &player, FPS, &mut rng);
        assert_eq!(ghost.body().grid(), GridPos::new(4, 3));
        assert_eq!(ghost.death_count(), 1);
        assert_eq!(ghost.wait_ticks(), 100);
        assert!(!ghost.is_returning());
    }

    #[test]
    fn more_deaths_wait_less() {
        let mut ghost = ghost_at(GridPos::new(4, 3));
        for _ in 0..3 {
            ghost.set_returning_to_spawn(FPS);
        }
        ghost.set_waiting(FPS);
        assert_eq!(ghost.wait_ticks(), 33);

        ghost.set_returning_to_spawn(FPS);
        ghost.set_waiting(FPS);
        assert_eq!(ghost.wait_ticks(), 25);
    }

    #[test]
    fn waiting_counts_down_without_moving() {
        let maze = room();
        let mut ghost = ghost_at(GridPos::new(4, 3));
        let player = still_player(1, 1);
        let mut rng = rng();

        ghost.set_returning_to_spawn(FPS);
        ghost.set_waiting(FPS);
        let before = ghost.wait_ticks();
        assert!(before > 2);

        ghost.advance(&maze, &player, FPS, &mut rng);
        ghost.advance(&maze, &player, FPS, &mut rng);

        assert_eq!(ghost.wait_ticks(), before - 2);
        assert_eq!(ghost.body().grid(), GridPos::new(4, 3));
        assert_eq!(ghost.body().target(), GridPos::new(4, 3));
    }

    #[test]
    fn waiting_ends_in_chase_at_normal_speed() {
        let maze = room();
        let mut ghost = ghost_at(GridPos::new(4, 3));
        let mut rng = rng();
        ghost.death_count = 100;
        ghost.set_waiting(FPS);
        assert_eq!(ghost.wait_ticks(), 1);

        ghost.advance(&maze, &still_player(1, 1), FPS, &mut rng);
        assert_eq!(ghost.state(), GhostState::Chasing);
        assert_eq!(ghost.body().speed(), config().ghost_speed);
    }

    #[test]
    fn flees_to_farthest_neighbour() {
        let maze = room();
        let mut ghost = ghost_at(GridPos::new(3, 3));
        let player = still_player(4, 3);
        let mut rng = rng();

        ghost.set_edible(20);
        ghost.advance(&maze, &player, FPS, &mut rng);
        assert_eq!(ghost.body().target(), GridPos::new(2, 3));
    }

    #[test]
    fn flee_tie_goes_to_first_scan_direction() {
        let maze = room();
        let mut ghost = ghost_at(GridPos::new(3, 3));
        // down to (3, 4) and right to (4, 3) are both sqrt(5) away
        let player = still_player(2, 2);

        ghost.set_edible(20);
        ghost.advance(&maze, &player, FPS, &mut rng());
        assert_eq!(ghost.body().target(), GridPos::new(3, 4));
    }

    #[test]
    fn boxed_in_ghost_stays_put() {
        let maze = TileGrid::parse(
            "
#####
#.W.#
#W.W#
#.W.#
#####
",
        )
        .unwrap();
        let mut ghost = ghost_at(GridPos::new(2, 2));
        let player = still_player(1, 1);
        let mut rng = rng();

        ghost.set_edible(20);
        for _ in 0..3 {
            ghost.advance(&maze, &player, FPS, &mut rng);
        }
        assert_eq!(ghost.body().grid(), GridPos::new(2, 2));
        assert_eq!(ghost.body().target(), GridPos::new(2, 2));
    }

    #[test]
    fn chases_toward_player() {
        let maze = room();
        let mut ghost = ghost_at(GridPos::new(1, 3));
        let mut rng = rng();
        ghost.advance(&maze, &still_player(6, 3), FPS, &mut rng);
        assert_eq!(ghost.body().target(), GridPos::new(2, 3));
    }

    #[test]
    fn keeps_gliding_between_tiles() {
        let maze = room();
        let mut ghost = ghost_at(GridPos::new(1, 3));
        let mut rng = rng();
        let player = still_player(6, 3);

        ghost.advance(&maze, &player, FPS, &mut rng);
        ghost.advance(&maze, &player, FPS, &mut rng);
        assert_eq!(ghost.body().grid(), GridPos::new(1, 3));
        assert_eq!(ghost.body().target(), GridPos::new(2, 3));
        assert!(ghost.body().pixel().x > cell_center(GridPos::new(1, 3), 32.0).x);
    }

    /// The only base is walled off from the left: heading right is blocked
    /// at (3, 3) and the pocket has no vertical way out.
    fn pocket() -> TileGrid {
        TileGrid::parse(
            "
#######
#.....#
#.WWW.#
#..WWS#
#######
",
        )
        .unwrap()
    }

    fn walker_at(pos: GridPos) -> Ghost {
        let config = SimConfig {
            respawn_secs: 0.0,
            ..config()
        };
        Ghost::new("Blinky", Rgb(255, 0, 0), pos, Box::new(Direct), &config)
    }

    #[test]
    fn edible_ignored_while_respawning() {
        let maze = pocket();
        let mut ghost = ghost_at(GridPos::new(1, 3));
        let player = still_player(1, 1);
        let mut rng = rng();

        ghost.set_returning_to_spawn(FPS);
        ghost.set_edible(5);
        assert_eq!(ghost.state(), GhostState::Respawning { ticks_left: 50 });
        assert!(!ghost.is_vulnerable());

        for _ in 0..50 {
            ghost.advance(&maze, &player, FPS, &mut rng);
        }
        assert!(ghost.is_waiting());
        assert_eq!(ghost.body().grid(), GridPos::new(5, 3));
    }

    #[test]
    fn without_respawn_delay_walks_home() {
        let maze = room();
        let mut ghost = walker_at(GridPos::new(1, 3));
        let player = still_player(7, 1);
        let mut rng = rng();

        ghost.set_returning_to_spawn(FPS);
        assert_eq!(
            ghost.state(),
            GhostState::Returning {
                steps_left: RETURN_STEP_BUDGET
            }
        );
        ghost.set_edible(30);
        assert!(ghost.is_returning());
        assert!(!ghost.is_vulnerable());

        ghost.advance(&maze, &player, FPS, &mut rng);
        assert_eq!(ghost.body().target(), GridPos::new(2, 3));
        assert_eq!(ghost.body().speed(), config().ghost_return_speed);

        for _ in 0..200 {
            ghost.advance(&maze, &player, FPS, &mut rng);
            if ghost.is_waiting() {
                break;
            }
        }
        assert!(ghost.is_waiting());
        assert_eq!(ghost.body().grid(), GridPos::new(4, 3));
    }

    #[test]
    fn walk_home_gives_up_in_dead_end_pocket() {
        let maze = pocket();
        let mut ghost = walker_at(GridPos::new(1, 3));
        let player = still_player(1, 1);
        let mut rng = rng();

        ghost.set_returning_to_spawn(FPS);
        // 32 px tiles at 4 px per tick: 8 ticks per step
        let limit = (RETURN_STEP_BUDGET as usize + 2) * 8;
        for _ in 0..limit {
            ghost.advance(&maze, &player, FPS, &mut rng);
            if ghost.is_waiting() {
                break;
            }
            assert!(ghost.body().grid().x <= 2, "ghost left the pocket");
        }
        assert!(ghost.is_waiting());
        assert_eq!(ghost.body().grid(), GridPos::new(5, 3));
        assert_eq!(ghost.body().speed(), config().ghost_speed);
    }

    #[test]
    fn walk_home_tries_horizontal_first() {
        let maze = room();
        let mut ghost = walker_at(GridPos::new(2, 1));
        ghost.set_returning_to_spawn(FPS);

        ghost.advance(&maze, &still_player(7, 5), FPS, &mut rng());
        assert_eq!(ghost.body().target(), GridPos::new(3, 1));
    }

    #[test]
    fn walk_home_takes_any_open_tile_when_both_axes_blocked() {
        let maze = TileGrid::parse(
            "
#######
#..W..#
#.WW..#
#....S#
#######
",
        )
        .unwrap();
        let mut ghost = walker_at(GridPos::new(2, 1));
        ghost.set_returning_to_spawn(FPS);

        ghost.advance(&maze, &still_player(5, 1), FPS, &mut rng());
        assert_eq!(ghost.body().target(), GridPos::new(1, 1));
        assert!(ghost.is_returning());
    }

    #[test]
    fn edible_ignored_while_waiting() {
        let mut ghost = ghost_at(GridPos::new(4, 3));
        ghost.set_returning_to_spawn(FPS);
        ghost.set_waiting(FPS);
        ghost.set_edible(30);
        assert!(ghost.is_waiting());
        assert!(!ghost.is_vulnerable());
    }

    #[test]
    fn alpha_blinks_near_recovery() {
        let mut ghost = ghost_at(GridPos::new(1, 1));
        assert_eq!(ghost.alpha(FPS), ALPHA_OPAQUE);

        ghost.set_edible(60);
        assert_eq!(ghost.alpha(FPS), ALPHA_OPAQUE);

        // 2s window, 0.25s period at 10 fps: 3 ticks per phase
        ghost.set_edible(19);
        assert_eq!(ghost.alpha(FPS), ALPHA_OPAQUE);
        ghost.set_edible(17);
        assert_eq!(ghost.alpha(FPS), ALPHA_BLINK);
    }

    #[test]
    fn view_reflects_state() {
        let mut ghost = ghost_at(GridPos::new(1, 1));
        assert!(ghost.view().is_dangerous());
        ghost.set_edible(3);
        assert!(ghost.view().vulnerable);
        ghost.set_returning_to_spawn(FPS);
        let view = ghost.view();
        assert!(view.returning && !view.vulnerable && !view.is_dangerous());
    }
}
