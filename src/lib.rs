//! Maze chase simulation core.
//!
//! Entities glide between tile centers on a [`maze::Maze`], ghosts run a
//! small state machine with pluggable chase targets, and the player can be
//! steered by hand or by a greedy autopilot. [`level::Level`] ties it all
//! together into a fixed-order tick.

pub mod config;
pub mod constants;
pub mod entity;
pub mod error;
pub mod ghost;
pub mod level;
pub mod maze;
pub mod pellets;
pub mod player;
pub mod populate;
