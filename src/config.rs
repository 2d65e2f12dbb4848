//! Settings layered from an optional TOML file and `WALLETDB_*` environment
//! variables, environment winning.

use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::persist::{DEFAULT_MAX_BIND_PARAMETERS, PersistenceMode};

pub const DEFAULT_CONFIG_FILE: &str = "walletdb.toml";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Wallet database file, in memory when absent.
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default = "default_max_bind_parameters")]
    pub max_bind_parameters: usize,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_max_bind_parameters() -> usize {
    DEFAULT_MAX_BIND_PARAMETERS
}

fn default_log_filter() -> String {
    "walletdb=info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: None,
            max_bind_parameters: default_max_bind_parameters(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Loads `path` (or the default file) if it exists, then the environment.
    pub fn load(path: Option<&str>) -> Result<Settings> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("WALLETDB").try_parsing(true))
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }

    pub fn persistence_mode(&self) -> PersistenceMode {
        match &self.database {
            Some(path) => PersistenceMode::File(path.clone()),
            None => PersistenceMode::InMemory,
        }
    }
}
