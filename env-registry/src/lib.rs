pub mod models {
    pub mod environment;
    pub mod registry;
}

pub mod error;

// Re-export commonly used items
pub use error::{EnvError, Result};

pub use models::{
    environment::Environment,
    registry::{
        ActiveConfig, EnvironmentConfig, EnvironmentRegistry, PRODUCTION_API_URL, SOLVE_ROUTE,
        TEST_API_URL,
    },
};
