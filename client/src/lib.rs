pub mod config;

pub use config::{load_env_file, Config, RegistrySource, ReportFormat, StartupArgs};
