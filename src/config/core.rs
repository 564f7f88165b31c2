use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::parallel::{ExecutionConfig, ExecutionStrategy, Scheduler};

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Prefix of environment variables overriding settings
pub const ENV_PREFIX: &str = "INDEXING_";

const REPO_CONFIG: &str = "indexing.toml";

/// Process-wide executor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorSettings {
    /// Maximum number of parallel index tasks (0 = derive from the CPU count)
    pub max_parallel_index_tasks: usize,

    /// Percentage of CPU cores used when `max_parallel_index_tasks` is 0
    pub thread_percentage: u8,

    /// Threads in a dedicated scheduler pool (0 = shared rayon pool)
    pub scheduler_threads: usize,

    /// Database identity attached to diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            max_parallel_index_tasks: 0,
            thread_percentage: 75,
            scheduler_threads: 0,
            database: None,
        }
    }
}

impl ExecutorSettings {
    pub fn load() -> Result<Self> {
        Self::load_with_custom_config(None)
    }

    pub fn load_with_custom_config(custom_config: Option<&str>) -> Result<Self> {
        let settings: Self = Self::figment(custom_config)
            .extract()
            .context("Failed to load executor settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// The layered provider chain, exposed for inspection.
    pub fn figment(custom_config: Option<&str>) -> Figment {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        figment = match custom_config {
            Some(path) if path.ends_with(".json") => figment.merge(Json::file(path)),
            Some(path) => figment.merge(Toml::file(path)),
            None => figment.merge(Toml::file(REPO_CONFIG)),
        };

        // Environment variables always have highest priority
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.thread_percentage) {
            return Err(ConfigError::InvalidThreadPercentage(self.thread_percentage).into());
        }
        Ok(())
    }

    /// Effective parallelism: the explicit setting, or a share of the CPU cores.
    pub fn resolved_parallelism(&self) -> usize {
        if self.max_parallel_index_tasks > 0 {
            self.max_parallel_index_tasks
        } else {
            ExecutionStrategy::calculate_optimal_workers(0, self.thread_percentage)
        }
    }

    /// Build the per-call configuration these settings describe.
    pub fn execution_config(&self) -> Result<ExecutionConfig> {
        let scheduler = match self.scheduler_threads {
            0 => Scheduler::global(),
            threads => Scheduler::new(threads)?,
        };

        let config = ExecutionConfig::new(self.resolved_parallelism())?.with_scheduler(scheduler);
        Ok(match &self.database {
            Some(database) => config.with_database(database.clone()),
            None => config,
        })
    }
}
