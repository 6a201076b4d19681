mod loader;
mod paths;
mod types;

pub use types::{Config, ENV_SETTINGS_PATH, ENV_TARGET};
