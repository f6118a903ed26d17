use serde::{Deserialize, Serialize};

/// PostgreSQL configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_pool_size: usize,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "fleet".to_string(),
            username: "fleet".to_string(),
            password: "fleet".to_string(),
            max_pool_size: 10,
        }
    }
}
