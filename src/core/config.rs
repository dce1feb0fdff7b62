use crate::core::errors::ConfigError;
use std::env;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub log_level: Level,
}

/// Feature engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the YAML settings file the extraction engine is built from.
    /// Its schema is owned by the engine, not this service.
    pub settings_path: PathBuf,
}

/// Batch processing configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of extractions running concurrently within a batch
    pub max_concurrent_extractions: usize,
    /// When set, batch paths from the request body must resolve inside
    /// this directory; unset means any local path is accepted.
    pub batch_root: Option<PathBuf>,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub batch: BatchConfig,
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Self::load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_env() -> Result<Self, ConfigError> {
        // Parse log level
        let log_level = env::var("LOG_LEVEL")
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "trace" => Some(Level::TRACE),
                "debug" => Some(Level::DEBUG),
                "info" => Some(Level::INFO),
                "warn" | "warning" => Some(Level::WARN),
                "error" => Some(Level::ERROR),
                _ => None,
            })
            .unwrap_or(Level::INFO);

        Ok(Self {
            server: ServerConfig {
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8000),
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                log_level,
            },
            engine: EngineConfig {
                settings_path: env::var("ENGINE_SETTINGS_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("radiomics_settings.yaml")),
            },
            batch: BatchConfig {
                max_concurrent_extractions: env::var("MAX_CONCURRENT_EXTRACTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        // Extraction is CPU-bound; half the cores keeps the
                        // blocking pool responsive under mixed load.
                        let cores = num_cpus::get();
                        std::cmp::max(cores / 2, 2)
                    }),
                batch_root: env::var("BATCH_ROOT")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from),
            },
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.max_concurrent_extractions == 0 {
            return Err(ConfigError::InvalidConcurrency(
                self.batch.max_concurrent_extractions,
            ));
        }

        if let Some(root) = &self.batch.batch_root {
            if !Path::new(root).is_dir() {
                return Err(ConfigError::InvalidBatchRoot(root.display().to_string()));
            }
        }

        Ok(())
    }

    pub fn server_port(&self) -> u16 {
        self.server.port
    }

    pub fn server_host(&self) -> &str {
        &self.server.host
    }

    pub fn log_level(&self) -> Level {
        self.server.log_level
    }

    pub fn engine_settings_path(&self) -> &Path {
        &self.engine.settings_path
    }

    pub fn max_concurrent_extractions(&self) -> usize {
        self.batch.max_concurrent_extractions
    }

    pub fn batch_root(&self) -> Option<&Path> {
        self.batch.batch_root.as_deref()
    }
}

// Note: No Default implementation because Config::new() can fail
// Users should explicitly call Config::new()? and handle errors

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server: ServerConfig {
                port: 8000,
                host: "127.0.0.1".to_string(),
                log_level: Level::INFO,
            },
            engine: EngineConfig {
                settings_path: PathBuf::from("radiomics_settings.yaml"),
            },
            batch: BatchConfig {
                max_concurrent_extractions: 4,
                batch_root: None,
            },
        }
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = base_config();
        config.batch.max_concurrent_extractions = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency(0))
        ));
    }

    #[test]
    fn missing_batch_root_is_rejected() {
        let mut config = base_config();
        config.batch.batch_root = Some(PathBuf::from("/definitely/not/a/real/dir"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBatchRoot(_))
        ));
    }

    #[test]
    fn default_shape_validates() {
        assert!(base_config().validate().is_ok());
    }
}
