//! Error types for the simulation core.
//!
//! Only setup can fail. Once a [`Level`](crate::level::Level) exists, every
//! per-tick path resolves to "stay put" or "move randomly" instead of
//! returning an error.

/// Errors raised while reading or generating a maze layout.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MazeError {
    #[error("maze layout is empty")]
    Empty,

    #[error("row {row} has {found} tiles, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown tile {ch:?} at ({x}, {y})")]
    UnknownTile { ch: char, x: usize, y: usize },

    #[error("maze of {width}x{height} is too small (minimum {min_width}x{min_height})")]
    TooSmall {
        width: i32,
        height: i32,
        min_width: i32,
        min_height: i32,
    },
}

/// Errors raised while placing entities on a maze at level start.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PopulateError {
    #[error("maze has no ghost spawn tile")]
    NoGhostSpawn,

    #[error("maze has no path tile for the player to start on")]
    NoPlayerStart,
}

/// Rejected simulation settings.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("fps must be greater than zero")]
    ZeroFps,

    #[error("cell size must be positive, got {0}")]
    NonPositiveCellSize(f32),

    #[error("{name} must be positive, got {value}")]
    NonPositiveSpeed { name: &'static str, value: f32 },

    #[error("at least one ghost is required")]
    NoGhosts,
}

/// Any failure while building a level.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Maze(#[from] MazeError),

    #[error(transparent)]
    Populate(#[from] PopulateError),
}
