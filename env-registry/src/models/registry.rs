use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::error::{EnvError, Result};
use crate::models::environment::Environment;

pub const PRODUCTION_API_URL: &str = "https://sa-sudoku-solver.herokuapp.com";
pub const TEST_API_URL: &str = "http://localhost:5000";

/// Route of the remote solver that accepts a board and returns the solution.
pub const SOLVE_ROUTE: &str = "solve";

fn parse_api_url(environment: Environment, raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvError::InvalidUrl {
            environment,
            url: raw.to_string(),
            reason: "URL is empty".to_string(),
        });
    }

    let parsed = Url::parse(trimmed).map_err(|e| EnvError::InvalidUrl {
        environment,
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(EnvError::UnsupportedScheme {
                environment,
                scheme: other.to_string(),
            })
        }
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(EnvError::InvalidUrl {
            environment,
            url: raw.to_string(),
            reason: "URL has no host".to_string(),
        });
    }

    Ok(parsed)
}

/// Settings for a single environment. Only constructible with a valid URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    api_url: String,
    #[serde(skip)]
    parsed: Url,
}

impl EnvironmentConfig {
    pub fn new(environment: Environment, api_url: &str) -> Result<Self> {
        let parsed = parse_api_url(environment, api_url)?;
        Ok(Self {
            api_url: api_url.trim().to_string(),
            parsed,
        })
    }

    /// The base URL exactly as configured.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn parsed_url(&self) -> &Url {
        &self.parsed
    }

    pub fn is_loopback(&self) -> bool {
        match self.parsed.host() {
            Some(Host::Domain(domain)) => {
                let domain = domain.strip_suffix('.').unwrap_or(domain);
                domain == "localhost" || domain.ends_with(".localhost")
            }
            Some(Host::Ipv4(ip)) => ip.is_loopback(),
            Some(Host::Ipv6(ip)) => ip
                .to_ipv4_mapped()
                .map_or(ip.is_loopback(), |v4| v4.is_loopback()),
            None => false,
        }
    }

    /// Replaces the URL on this copy. The registry it came from is untouched.
    pub fn set_api_url(&mut self, environment: Environment, api_url: &str) -> Result<()> {
        *self = Self::new(environment, api_url)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryEntry {
    #[serde(rename = "apiUrl")]
    api_url: String,
}

/// Fixed mapping from environment to its settings. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentRegistry {
    entries: BTreeMap<Environment, EnvironmentConfig>,
}

impl EnvironmentRegistry {
    pub fn builtin() -> Result<Self> {
        Self::from_entries([
            (Environment::Production, PRODUCTION_API_URL),
            (Environment::Test, TEST_API_URL),
        ])
    }

    /// Builds a registry that must cover every [`Environment`].
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Environment, S)>,
        S: AsRef<str>,
    {
        let mut map = BTreeMap::new();
        for (environment, api_url) in entries {
            let config = EnvironmentConfig::new(environment, api_url.as_ref())?;
            if map.insert(environment, config).is_some() {
                return Err(EnvError::Conversion(format!(
                    "Duplicate registry entry for environment: {}",
                    environment
                )));
            }
        }

        if let Some(missing) = Environment::ALL.iter().find(|env| !map.contains_key(*env)) {
            return Err(EnvError::MissingEntry(*missing));
        }

        Ok(Self { entries: map })
    }

    /// Parses `{"production": {"apiUrl": "..."}, "test": {"apiUrl": "..."}}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, RegistryEntry> = serde_json::from_str(json)?;
        let entries = raw
            .into_iter()
            .map(|(name, entry)| -> Result<(Environment, String)> {
                Ok((name.parse()?, entry.api_url))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_entries(entries)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading environment registry from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Returns a registry whose entry for `environment` points at `api_url`.
    pub fn with_override(mut self, environment: Environment, api_url: &str) -> Result<Self> {
        let config = EnvironmentConfig::new(environment, api_url)?;
        info!("Overriding API URL for {}: {}", environment, config.api_url());
        self.entries.insert(environment, config);
        Ok(self)
    }

    /// Independent copy of the entry for `environment`.
    pub fn select(&self, environment: Environment) -> Result<EnvironmentConfig> {
        self.entries
            .get(&environment)
            .cloned()
            .ok_or(EnvError::MissingEntry(environment))
    }

    pub fn select_by_name(&self, name: &str) -> Result<EnvironmentConfig> {
        self.select(name.parse()?)
    }

    pub fn activate(&self, environment: Environment) -> Result<ActiveConfig> {
        let config = self.select(environment)?;
        info!("Active environment: {} ({})", environment, config.api_url());
        Ok(ActiveConfig { environment, config })
    }

    pub fn environments(&self) -> impl Iterator<Item = Environment> + '_ {
        self.entries.keys().copied()
    }
}

/// The configuration in effect for this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveConfig {
    environment: Environment,
    #[serde(flatten)]
    config: EnvironmentConfig,
}

impl ActiveConfig {
    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn api_url(&self) -> &str {
        self.config.api_url()
    }

    /// Joins `path` onto the base URL. The base is treated as a directory and
    /// the result must stay on the same origin, under the base path.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let rejected = |reason: &str| EnvError::InvalidUrl {
            environment: self.environment,
            url: path.to_string(),
            reason: reason.to_string(),
        };

        if Url::parse(path).is_ok() {
            return Err(rejected("route must be relative to the API URL"));
        }

        let mut base = self.config.parsed_url().clone();
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }

        let joined = base
            .join(path.trim_start_matches('/'))
            .map_err(|e| rejected(&e.to_string()))?;

        if joined.origin() != base.origin() || !joined.path().starts_with(base.path()) {
            return Err(rejected("route escapes the API URL"));
        }

        Ok(joined)
    }

    pub fn solve_url(&self) -> Result<Url> {
        self.endpoint(SOLVE_ROUTE)
    }
}
