use crate::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Training pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Artifact and dataset locations
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: NEPHROMIND_)
            .add_source(
                config::Environment::with_prefix("NEPHROMIND")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where the trained artifact bundle is persisted
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    /// Candidate training CSVs, first existing path wins
    #[serde(default = "default_dataset_paths")]
    pub dataset_paths: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            dataset_paths: default_dataset_paths(),
        }
    }
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("data/kidney_model.json")
}

fn default_dataset_paths() -> Vec<String> {
    vec![
        "archive/kidney_data.csv".to_string(),
        "archive/Chronic_Kidney_Dsease_data.csv".to_string(),
        "backend/archive/kidney_data.csv".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = Config::load().unwrap();
        assert_eq!(config.pipeline.n_selected_features, 20);
        assert_eq!(config.pipeline.sensitivity_floor, 0.98);
        assert!(!config.storage.dataset_paths.is_empty());
    }

    #[test]
    fn test_storage_defaults() {
        let storage = StorageConfig::default();
        assert_eq!(storage.artifact_path, PathBuf::from("data/kidney_model.json"));
        assert_eq!(storage.dataset_paths.len(), 3);
    }
}
