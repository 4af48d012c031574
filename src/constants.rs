// ============================================================================
// Grid & Pixels
// ============================================================================

pub const CELL_SIZE: f32 = 32.0; // pixels per tile edge
pub const DEFAULT_FPS: u32 = 60; // simulation ticks per second
pub const DEFAULT_GRID_W: i32 = 31;
pub const DEFAULT_GRID_H: i32 = 21;

// ============================================================================
// Speeds (pixels per tick)
// ============================================================================

pub const PLAYER_SPEED: f32 = 2.5;
pub const GHOST_SPEED: f32 = 2.0;
pub const GHOST_RETURN_SPEED: f32 = 4.0;

// ============================================================================
// Timers (seconds, converted to ticks with the configured fps)
// ============================================================================

pub const EDIBLE_SECS: f32 = 6.0;
pub const RESPAWN_SECS: f32 = 5.0;
pub const BASE_WAIT_SECS: f32 = 10.0; // divided by the ghost's death count
pub const BLINK_WINDOW_SECS: f32 = 2.0; // frightened ghosts blink when this close to recovering
pub const BLINK_PERIOD_SECS: f32 = 0.25;

// ============================================================================
// Scoring
// ============================================================================

pub const POWER_PELLET_VALUE: u32 = 10;
pub const SCORE_PELLET_VALUE: u32 = 2;
pub const GHOST_BONUS: u32 = 200;
pub const START_LIVES: u32 = 3;

// ============================================================================
// Ghost AI
// ============================================================================

pub const GHOST_COUNT: usize = 4;
pub const AMBUSH_LEAD: i32 = 4; // tiles ahead of the player
pub const PATROL_RADIUS: f32 = 8.0; // patrol ghosts give up the chase inside this distance
pub const RETURN_STEP_BUDGET: u32 = 200; // tiles walked home before teleporting

// ============================================================================
// Player autopilot
// ============================================================================

pub const DANGER_RADIUS: f32 = 3.0;
pub const DANGER_WEIGHT: f32 = 100.0;

// ============================================================================
// Alpha
// ============================================================================

pub const ALPHA_OPAQUE: u8 = 255;
pub const ALPHA_BLINK: u8 = 128;
