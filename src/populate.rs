//! Level start: scatters the player, the ghosts and the pellets onto a maze.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::config::SimConfig;
use crate::error::PopulateError;
use crate::ghost::strategy::{Ambush, ChaseStrategy, Corner, Direct, Flank, Patrol};
use crate::ghost::{Ghost, Rgb};
use crate::maze::{GridPos, Maze, Tile};
use crate::pellets::{PelletKind, Pellets};
use crate::player::Player;

/// Everything a level needs besides the maze itself.
#[derive(Debug)]
pub struct Population {
    pub player: Player,
    pub ghosts: Vec<Ghost>,
    pub power_pellets: Pellets,
    pub score_pellets: Pellets,
}

const ROSTER: [(&str, Rgb); 4] = [
    ("Blinky", Rgb(255, 0, 0)),
    ("Pinky", Rgb(255, 184, 255)),
    ("Inky", Rgb(0, 255, 255)),
    ("Clyde", Rgb(255, 184, 82)),
];

/// Patrol ghosts past the first roster lap take the next corner round.
const CORNERS: [Corner; 4] = [
    Corner::BottomLeft,
    Corner::BottomRight,
    Corner::TopLeft,
    Corner::TopRight,
];

fn strategy_for(slot: usize, config: &SimConfig) -> Box<dyn ChaseStrategy> {
    match slot % ROSTER.len() {
        0 => Box::new(Direct),
        1 => Box::new(Ambush {
            lead: config.ambush_lead,
        }),
        2 => Box::new(Flank),
        _ => Box::new(Patrol {
            corner: CORNERS[(slot / ROSTER.len()) % CORNERS.len()],
            radius: config.patrol_radius,
        }),
    }
}

/// Builds the entity set for `maze`.
///
/// The player starts on the first path tile in row-major order. Ghosts take
/// shuffled base tiles, doubling up when there are more ghosts than bases.
/// Every power-pellet tile gets a power pellet and every other path tile gets
/// a score pellet, except the player's own start.
pub fn populate(
    maze: &dyn Maze,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> Result<Population, PopulateError> {
    let start = maze
        .tiles_of(Tile::Path)
        .into_iter()
        .next()
        .ok_or(PopulateError::NoPlayerStart)?;

    let mut bases = maze.tiles_of(Tile::GhostSpawn);
    if bases.is_empty() {
        return Err(PopulateError::NoGhostSpawn);
    }
    bases.shuffle(rng);

    let ghosts: Vec<Ghost> = (0..config.ghost_count)
        .map(|slot| {
            let (name, color) = ROSTER[slot % ROSTER.len()];
            let pos = bases[slot % bases.len()];
            Ghost::new(name, color, pos, strategy_for(slot, config), config)
        })
        .collect();

    let power_pellets = scatter(
        maze,
        Tile::PowerPellet,
        PelletKind::Power,
        config.power_pellet_value,
        start,
    );
    let score_pellets = scatter(
        maze,
        Tile::Path,
        PelletKind::Score,
        config.score_pellet_value,
        start,
    );

    info!(
        %start,
        ghosts = ghosts.len(),
        power = power_pellets.len(),
        score = score_pellets.len(),
        "level populated"
    );

    Ok(Population {
        player: Player::new(start, config),
        ghosts,
        power_pellets,
        score_pellets,
    })
}

fn scatter(maze: &dyn Maze, tile: Tile, kind: PelletKind, value: u32, skip: GridPos) -> Pellets {
    let mut pellets = Pellets::new(kind);
    for pos in maze.tiles_of(tile).into_iter().filter(|&pos| pos != skip) {
        pellets.place(pos, value);
    }
    pellets
}
