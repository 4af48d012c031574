//! One level of play: the maze, its entities, and the tick that moves them.
//!
//! A tick runs in a fixed order. Views of the player and every ghost are
//! taken first, so all decisions in the tick see the same picture. Then the
//! player moves and eats, the ghosts move, and contacts are resolved.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::error::SetupError;
use crate::ghost::{Ghost, GhostView};
use crate::maze::{Dir, GridPos, Maze};
use crate::pellets::Pellets;
use crate::player::Player;
use crate::populate::{populate, Population};

/// Who steers the player this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    /// Keyboard steering. `None` means no key is held and the player stops
    /// at the next tile.
    Manual(Option<Dir>),
    Autopilot,
}

/// Something that happened during a tick, for the front end to react to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickEvent {
    PelletEaten { pos: GridPos, value: u32 },
    PowerPellet { pos: GridPos, value: u32 },
    GhostEaten { name: String, pos: GridPos },
    PlayerCaught { by: String, lives_left: u32 },
    GameOver { score: u32 },
    Cleared { score: u32 },
}

pub struct Level<M: Maze> {
    maze: M,
    config: SimConfig,
    rng: StdRng,
    player: Player,
    ghosts: Vec<Ghost>,
    power_pellets: Pellets,
    score_pellets: Pellets,
    player_start: GridPos,
    ghost_starts: Vec<GridPos>,
    lives: u32,
    heading: Option<Dir>,
    ticks: u64,
}

impl<M: Maze> Level<M> {
    /// Validates `config` and populates `maze`. A `seed` in the config makes
    /// every run on the same maze replay identically.
    pub fn new(maze: M, config: SimConfig) -> Result<Self, SetupError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(maze, config, rng, 0)
    }

    fn with_rng(maze: M, config: SimConfig, mut rng: StdRng, score: u32) -> Result<Self, SetupError> {
        let Population {
            mut player,
            ghosts,
            power_pellets,
            score_pellets,
        } = populate(&maze, &config, &mut rng)?;
        player.add_score(score);

        let player_start = player.body().grid();
        let ghost_starts = ghosts.iter().map(|ghost| ghost.body().grid()).collect();
        let lives = config.lives;

        Ok(Self {
            maze,
            config,
            rng,
            player,
            ghosts,
            power_pellets,
            score_pellets,
            player_start,
            ghost_starts,
            lives,
            heading: None,
            ticks: 0,
        })
    }

    /// Moves on to a fresh maze, keeping score, lives and the random stream.
    pub fn next_level(self, maze: M) -> Result<Self, SetupError> {
        let lives = self.lives;
        let mut level = Self::with_rng(maze, self.config, self.rng, self.player.score())?;
        level.lives = lives;
        info!(score = level.player.score(), lives, "next level");
        Ok(level)
    }

    pub fn maze(&self) -> &M {
        &self.maze
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn power_pellets(&self) -> &Pellets {
        &self.power_pellets
    }

    pub fn score_pellets(&self) -> &Pellets {
        &self.score_pellets
    }

    pub const fn lives(&self) -> u32 {
        self.lives
    }

    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_cleared(&self) -> bool {
        self.power_pellets.is_empty() && self.score_pellets.is_empty()
    }

    pub fn is_over(&self) -> bool {
        !self.player.is_alive()
    }

    /// Runs one simulation step. Does nothing once the game is over or the
    /// board is clear.
    pub fn tick(&mut self, control: Control) -> Vec<TickEvent> {
        let mut events = Vec::new();
        if self.is_over() || self.is_cleared() {
            return events;
        }
        self.ticks += 1;

        let player_view = self.player.view();
        let ghost_views: Vec<GhostView> = self.ghosts.iter().map(Ghost::view).collect();

        self.move_player(control, &ghost_views);
        let powered = self.consume(&mut events);

        let fps = self.config.fps;
        for ghost in &mut self.ghosts {
            ghost.advance(&self.maze, &player_view, fps, &mut self.rng);
        }

        // armed after the ghosts moved so the full duration counts from next tick
        if powered {
            let duration = self.config.edible_ticks();
            for ghost in &mut self.ghosts {
                ghost.set_edible(duration);
            }
        }

        self.resolve_contacts(&mut events);

        if self.is_cleared() {
            let score = self.player.score();
            info!(score, ticks = self.ticks, "level cleared");
            events.push(TickEvent::Cleared { score });
        }
        events
    }

    fn move_player(&mut self, control: Control, ghosts: &[GhostView]) {
        if !self.player.body_mut().move_towards_target() {
            return;
        }
        match control {
            Control::Autopilot => {
                self.player.autopilot_step(
                    &self.maze,
                    &self.power_pellets,
                    &self.score_pellets,
                    ghosts,
                    &mut self.rng,
                );
            }
            Control::Manual(None) => self.heading = None,
            Control::Manual(Some(dir)) => {
                let body = self.player.body_mut();
                if body.step_toward(dir, &self.maze) {
                    self.heading = Some(dir);
                } else if let Some(current) = self.heading {
                    // keep rolling until the turn opens up
                    if !body.step_toward(current, &self.maze) {
                        self.heading = None;
                    }
                }
            }
        }
    }

    /// Eats whatever lies on the player's tile. Returns whether a power
    /// pellet was among it.
    fn consume(&mut self, events: &mut Vec<TickEvent>) -> bool {
        let pos = self.player.body().grid();

        let power = self.player.eat_pellet(&mut self.power_pellets);
        if power > 0 {
            info!(%pos, duration = self.config.edible_ticks(), "power pellet eaten");
            events.push(TickEvent::PowerPellet { pos, value: power });
        }

        let value = self.player.eat_score_pellet(&mut self.score_pellets);
        if value > 0 {
            events.push(TickEvent::PelletEaten { pos, value });
        }
        power > 0
    }

    fn resolve_contacts(&mut self, events: &mut Vec<TickEvent>) {
        let pos = self.player.body().grid();
        let fps = self.config.fps;
        let mut caught_by = None;

        for ghost in self.ghosts.iter_mut().filter(|ghost| ghost.body().grid() == pos) {
            if ghost.is_vulnerable() {
                ghost.set_returning_to_spawn(fps);
                self.player.add_score(self.config.ghost_bonus);
                events.push(TickEvent::GhostEaten {
                    name: ghost.name().to_owned(),
                    pos,
                });
            } else if ghost.view().is_dangerous() && caught_by.is_none() {
                caught_by = Some(ghost.name().to_owned());
            } else {
                debug!(ghost = ghost.name(), %pos, "contact ignored");
            }
        }

        let Some(by) = caught_by else {
            return;
        };
        self.lives = self.lives.saturating_sub(1);
        info!(ghost = %by, lives_left = self.lives, "player caught");
        events.push(TickEvent::PlayerCaught {
            by,
            lives_left: self.lives,
        });

        if self.lives == 0 {
            self.player.kill();
            let score = self.player.score();
            info!(score, "game over");
            events.push(TickEvent::GameOver { score });
        } else {
            self.reset_positions();
        }
    }

    fn reset_positions(&mut self) {
        self.player.body_mut().teleport(self.player_start);
        self.heading = None;
        for (ghost, &start) in self.ghosts.iter_mut().zip(&self.ghost_starts) {
            ghost.reset(start);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghost::GhostState;
    use crate::maze::TileGrid;

    const FPS: u32 = 10;

    fn config() -> SimConfig {
        SimConfig {
            ghost_count: 1,
            ..SimConfig::default().with_fps(FPS).with_seed(5)
        }
    }

    fn level(layout: &str) -> Level<TileGrid> {
        Level::new(TileGrid::parse(layout).unwrap(), config()).unwrap()
    }

    fn run_until<M: Maze>(
        level: &mut Level<M>,
        control: Control,
        limit: usize,
        mut done: impl FnMut(&TickEvent) -> bool,
    ) -> Option<TickEvent> {
        for _ in 0..limit {
            if let Some(event) = level.tick(control).into_iter().find(|event| done(event)) {
                return Some(event);
            }
        }
        None
    }

    #[test]
    fn rejects_bad_config() {
        let maze = TileGrid::parse("###\n#S#\n###").unwrap();
        let config = SimConfig::default().with_fps(0);
        assert!(matches!(
            Level::new(maze, config),
            Err(SetupError::Config(_))
        ));
    }

    #[test]
    fn rejects_maze_without_base() {
        let maze = TileGrid::parse("####\n#..#\n####").unwrap();
        assert!(matches!(
            Level::new(maze, config()),
            Err(SetupError::Populate(_))
        ));
    }

    #[test]
    fn manual_steering_eats_pellets_in_order() {
        let mut level = level(
            "
########
#....WS#
########
",
        );
        let before = level.score_pellets().len();
        let event = run_until(&mut level, Control::Manual(Some(Dir::Right)), 200, |event| {
            matches!(event, TickEvent::PelletEaten { .. })
        });
        assert_eq!(
            event,
            Some(TickEvent::PelletEaten {
                pos: GridPos::new(2, 1),
                value: 2
            })
        );
        assert_eq!(level.score_pellets().len(), before - 1);
        assert_eq!(level.player().score(), 2);
    }

    #[test]
    fn released_key_stops_at_next_tile() {
        let mut level = level(
            "
########
#....WS#
########
",
        );
        level.tick(Control::Manual(Some(Dir::Right)));
        for _ in 0..100 {
            level.tick(Control::Manual(None));
        }
        assert_eq!(level.player().body().grid(), GridPos::new(2, 1));
        assert!(level.player().body().is_at_target());
    }

    #[test]
    fn power_pellet_frightens_every_ghost() {
        let mut level = level(
            "
#########
#.o...WS#
#########
",
        );
        let event = run_until(&mut level, Control::Manual(Some(Dir::Right)), 200, |event| {
            matches!(event, TickEvent::PowerPellet { .. })
        });
        assert!(event.is_some());
        assert_eq!(level.player().score(), 10);
        let duration = config().edible_ticks();
        assert_eq!(
            level.ghosts()[0].state(),
            GhostState::Frightened {
                ticks_left: duration
            }
        );

        for _ in 0..duration {
            assert!(level.ghosts()[0].is_vulnerable());
            level.tick(Control::Manual(None));
        }
        assert_eq!(level.ghosts()[0].state(), GhostState::Chasing);
    }

    #[test]
    fn chasing_ghost_costs_a_life_and_resets() {
        let mut level = level(
            "
#######
#...S.#
#######
",
        );
        let event = run_until(&mut level, Control::Manual(None), 500, |event| {
            matches!(event, TickEvent::PlayerCaught { .. })
        });
        assert_eq!(
            event,
            Some(TickEvent::PlayerCaught {
                by: "Blinky".into(),
                lives_left: 2
            })
        );
        assert_eq!(level.lives(), 2);
        assert!(!level.is_over());
        assert_eq!(level.player().body().grid(), GridPos::new(1, 1));
        assert_eq!(level.ghosts()[0].body().grid(), GridPos::new(4, 1));
    }

    #[test]
    fn last_life_ends_the_game() {
        let mut level = level(
            "
#######
#...S.#
#######
",
        );
        let event = run_until(&mut level, Control::Manual(None), 5_000, |event| {
            matches!(event, TickEvent::GameOver { .. })
        });
        assert!(event.is_some());
        assert!(level.is_over());
        assert_eq!(level.lives(), 0);
        assert!(level.tick(Control::Autopilot).is_empty());
    }

    #[test]
    fn frightened_ghost_is_eaten_for_a_bonus() {
        let mut level = level(
            "
######
#..S.#
######
",
        );
        let ghost = level.ghosts()[0].body().grid();
        level.ghosts[0].set_edible(1_000);
        level.player.body_mut().teleport(ghost);

        let events = level.tick(Control::Manual(None));
        assert!(events.contains(&TickEvent::GhostEaten {
            name: "Blinky".into(),
            pos: ghost
        }));
        assert_eq!(level.player().score(), 200);
        assert!(level.ghosts()[0].is_returning());
        assert_eq!(level.lives(), config().lives);
    }

    #[test]
    fn clearing_the_board_is_reported_once() {
        let mut level = level(
            "
######
#..WS#
######
",
        );
        let event = run_until(&mut level, Control::Autopilot, 500, |event| {
            matches!(event, TickEvent::Cleared { .. })
        });
        assert_eq!(event, Some(TickEvent::Cleared { score: 2 }));
        assert!(level.is_cleared());
        assert!(level.tick(Control::Autopilot).is_empty());
    }

    #[test]
    fn next_level_keeps_score_and_lives() {
        let layout = "
######
#..WS#
######
";
        let mut level = level(layout);
        run_until(&mut level, Control::Autopilot, 500, |event| {
            matches!(event, TickEvent::Cleared { .. })
        });
        level.lives = 2;

        let next = level.next_level(TileGrid::parse(layout).unwrap()).unwrap();
        assert_eq!(next.player().score(), 2);
        assert_eq!(next.lives(), 2);
        assert_eq!(next.ticks(), 0);
        assert!(!next.is_cleared());
    }
}
