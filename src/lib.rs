//! Story Face: narrated stories with a synchronized animated face

pub mod cli;
pub mod config;
pub mod logging;
pub mod narration;
pub mod sound;

pub use cli::Cli;
pub use config::Options;
pub use logging::LogLevel;
pub use narration::{Narrator, NarratorConfig};
