use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use env_registry::{ActiveConfig, EnvError, Environment, EnvironmentRegistry, Result};
use log::{info, warn};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Human,
    Json,
}

/// Startup inputs. Each flag falls back to its environment variable.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sudoku-client-env")]
#[command(about = "Show which sudoku solver backend this client targets")]
pub struct StartupArgs {
    /// Deploy stage to target: production (prod) or test
    #[arg(long, env = "SOLVER_ENV")]
    pub environment: Option<String>,
    /// Override the API URL of the selected environment
    #[arg(long, env = "SOLVER_API_URL")]
    pub api_url: Option<String>,
    /// JSON registry file replacing the built-in one
    #[arg(long, env = "SOLVER_REGISTRY")]
    pub registry: Option<PathBuf>,
    /// Output format of the report
    #[arg(long, value_enum, default_value_t = ReportFormat::Human)]
    pub format: ReportFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    Builtin,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    active: ActiveConfig,
    source: RegistrySource,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    #[serde(flatten)]
    active: &'a ActiveConfig,
    solve_url: String,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Loads `explicit` when given, otherwise an optional `.env` in the working
/// directory. Runs before the logger exists, so it returns the loaded file
/// instead of logging it.
pub fn load_env_file(explicit: Option<&str>) -> Result<Option<PathBuf>> {
    match non_empty(explicit) {
        Some(path) => dotenv::from_filename(path)
            .map(Some)
            .map_err(|e| EnvError::Io(format!("{}: {}", path, e))),
        None => Ok(dotenv::dotenv().ok()),
    }
}

impl Config {
    pub fn load(args: &StartupArgs) -> Result<Self> {
        let environment = Self::resolve_environment(args.environment.as_deref())?;
        info!("Loading configuration for environment: {}", environment);

        let (registry, source) = Self::load_registry(args.registry.as_deref())?;
        let registry = match non_empty(args.api_url.as_deref()) {
            Some(api_url) => registry.with_override(environment, api_url)?,
            None => registry,
        };

        let config = Config {
            active: registry.activate(environment)?,
            source,
        };

        config.validate()?;
        config.log_configuration();

        Ok(config)
    }

    /// Unset or blank input selects the default environment; anything else must be a known name.
    pub fn resolve_environment(requested: Option<&str>) -> Result<Environment> {
        match non_empty(requested) {
            Some(name) => name.parse(),
            None => {
                let fallback = Environment::default();
                info!("No environment requested, using default: {}", fallback);
                Ok(fallback)
            }
        }
    }

    fn load_registry(path: Option<&Path>) -> Result<(EnvironmentRegistry, RegistrySource)> {
        match path.filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => {
                info!("Loading environment registry from {}", path.display());
                let registry = EnvironmentRegistry::from_json_file(path)?;
                Ok((registry, RegistrySource::File(path.to_path_buf())))
            }
            None => Ok((EnvironmentRegistry::builtin()?, RegistrySource::Builtin)),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.is_production() && self.active.config().is_loopback() {
            return Err(EnvError::InvalidUrl {
                environment: self.environment(),
                url: self.active.api_url().to_string(),
                reason: "production cannot target a loopback host".to_string(),
            });
        }

        Ok(())
    }

    fn log_configuration(&self) {
        info!("Configuration loaded successfully");
        info!("Environment: {}", self.environment());
        info!("API URL: {}", self.active.api_url());
        match &self.source {
            RegistrySource::Builtin => info!("Registry: built-in"),
            RegistrySource::File(path) => info!("Registry: {}", path.display()),
        }

        if self.is_production() && self.active.config().parsed_url().scheme() == "http" {
            warn!("Production API URL is not using https");
        }
    }

    /// The active configuration, to be handed to whatever talks to the solver.
    pub fn active(&self) -> &ActiveConfig {
        &self.active
    }

    pub fn environment(&self) -> Environment {
        self.active.environment()
    }

    pub fn source(&self) -> &RegistrySource {
        &self.source
    }

    pub fn is_production(&self) -> bool {
        self.environment().is_production()
    }

    pub fn is_test(&self) -> bool {
        self.environment().is_test()
    }

    pub fn report(&self, format: ReportFormat) -> Result<String> {
        let solve_url = self.active.solve_url()?;
        match format {
            ReportFormat::Human => Ok(format!(
                "environment={} apiUrl={} solveUrl={}",
                self.environment(),
                self.active.api_url(),
                solve_url
            )),
            ReportFormat::Json => Ok(serde_json::to_string(&Report {
                active: &self.active,
                solve_url: solve_url.to_string(),
            })?),
        }
    }
}
