pub mod human;

pub use human::{GameSummary, HumanMode};
