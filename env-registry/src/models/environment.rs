use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EnvError;

/// Deploy stage the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[serde(alias = "prod")]
    Production,
    Test,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Production, Environment::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_test(&self) -> bool {
        matches!(self, Environment::Test)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prod" | "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            _ => Err(EnvError::UnknownEnvironment(s.to_string())),
        }
    }
}
