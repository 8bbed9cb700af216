//! Configuration management.

mod settings;
mod xdg;

pub use settings::{ClientConfig, ConfigError, ConfigOverrides, DEFAULT_HTTP_BASE};
pub use xdg::{XdgDirs, APP_DIR};
