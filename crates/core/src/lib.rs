pub mod config;
pub mod definition;

pub use config::Settings;
pub use definition::*;
