//! Hazard Snake - a terminal snake game with timed obstacles
//!
//! This library provides:
//! - Core game logic and the concurrent obstacle workers (game module)
//! - Background-flushed top score persistence (persistence module)
//! - TUI rendering, keyboard input and frame metrics
//! - The interactive frame loop (modes module)

pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod persistence;
pub mod render;
