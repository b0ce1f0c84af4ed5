pub mod config;
pub mod error;
pub mod grade;
pub mod mods;
pub mod packets;
pub mod player;
pub mod pp;
pub mod profile;
pub mod progress;
pub mod registry;
pub mod setup;
pub mod stats;
pub mod updater;
pub mod utils;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use grade::{get_grade, Grade};
pub use mods::Mods;
pub use player::Player;
pub use progress::{SilentReporter, UpdateReporter};
pub use stats::{PerformanceSummary, StatsAggregator};
pub use updater::{SelfUpdater, UpdateCheck, UpdateReport};
