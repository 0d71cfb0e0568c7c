pub mod features;
pub mod health;
pub mod predict;

use clap::ValueEnum;

/// Model slot selector shared by subcommands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Slot {
    Speed,
    Congestion,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Speed => "speed",
            Slot::Congestion => "congestion",
        }
    }
}
