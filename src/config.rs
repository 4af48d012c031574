use crate::constants::*;
use crate::error::ConfigError;

// ============================================================================
// Simulation Configuration
// ============================================================================

/// Tunables for one simulation run.
///
/// Speeds are pixels per tick and durations are seconds; [`SimConfig::ticks`]
/// converts a duration to a tick count at the configured `fps`.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    pub cell_size: f32,
    pub fps: u32,
    pub player_speed: f32,
    pub ghost_speed: f32,
    pub ghost_return_speed: f32,
    pub edible_secs: f32,
    pub respawn_secs: f32,
    pub base_wait_secs: f32,
    pub ghost_count: usize,
    pub power_pellet_value: u32,
    pub score_pellet_value: u32,
    pub ghost_bonus: u32,
    pub lives: u32,
    pub danger_radius: f32,
    pub danger_weight: f32,
    pub ambush_lead: i32,
    pub patrol_radius: f32,
    // None seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            fps: DEFAULT_FPS,
            player_speed: PLAYER_SPEED,
            ghost_speed: GHOST_SPEED,
            ghost_return_speed: GHOST_RETURN_SPEED,
            edible_secs: EDIBLE_SECS,
            respawn_secs: RESPAWN_SECS,
            base_wait_secs: BASE_WAIT_SECS,
            ghost_count: GHOST_COUNT,
            power_pellet_value: POWER_PELLET_VALUE,
            score_pellet_value: SCORE_PELLET_VALUE,
            ghost_bonus: GHOST_BONUS,
            lives: START_LIVES,
            danger_radius: DANGER_RADIUS,
            danger_weight: DANGER_WEIGHT,
            ambush_lead: AMBUSH_LEAD,
            patrol_radius: PATROL_RADIUS,
            seed: None,
        }
    }
}

impl SimConfig {
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::ZeroFps);
        }
        if self.cell_size <= 0.0 {
            return Err(ConfigError::NonPositiveCellSize(self.cell_size));
        }
        for (name, value) in [
            ("player_speed", self.player_speed),
            ("ghost_speed", self.ghost_speed),
            ("ghost_return_speed", self.ghost_return_speed),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositiveSpeed { name, value });
            }
        }
        if self.ghost_count == 0 {
            return Err(ConfigError::NoGhosts);
        }
        Ok(())
    }

    /// Number of ticks covering `secs` seconds, rounded to the nearest tick.
    #[must_use]
    pub fn ticks(&self, secs: f32) -> u32 {
        secs_to_ticks(secs, self.fps)
    }

    #[must_use]
    pub fn edible_ticks(&self) -> u32 {
        self.ticks(self.edible_secs)
    }
}

#[must_use]
pub fn secs_to_ticks(secs: f32, fps: u32) -> u32 {
    (secs * fps as f32).round().max(0.0) as u32
}
