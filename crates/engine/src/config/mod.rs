mod loader;
mod validation;

pub use loader::{ConfigError, EngineConfig};
pub use loader::load_config;
