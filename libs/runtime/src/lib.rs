//! Process bootstrap shared by the binaries: layered configuration and
//! logging initialisation.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{AppConfig, CliArgs, LoggingConfig, Section, ServerConfig};
pub use logging::init_logging_from_config;
pub use paths::{resolve_home_dir, HomeDirError};
