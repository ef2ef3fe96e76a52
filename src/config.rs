//! Конфигурация конвейера (YAML)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_processing: ProcessingConfig,
    #[serde(default)]
    pub paths: PathConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub categorical_columns: Vec<String>,
    pub numerical_columns: Vec<String>,
    #[serde(rename = "Skewness_threshold")]
    pub skewness_threshold: f64,
    pub num_features: usize,
    #[serde(default = "default_label_column")]
    pub label_column: String,
    #[serde(default = "default_drop_columns")]
    pub drop_columns: Vec<String>,
    #[serde(default = "default_k_neighbors")]
    pub k_neighbors: usize,
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Признаков на дерево леса; если не задано, ceil(sqrt(p))
    #[serde(default)]
    pub max_features: Option<usize>,
    #[serde(default = "default_random_state")]
    pub random_state: u64,
    /// Кодировать test по словарю, построенному на train
    #[serde(default)]
    pub shared_category_codes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(default = "default_train_file")]
    pub train_file: PathBuf,
    #[serde(default = "default_test_file")]
    pub test_file: PathBuf,
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,
}

fn default_label_column() -> String { "booking_status".to_string() }
fn default_drop_columns() -> Vec<String> {
    vec!["Unnamed: 0".to_string(), "Booking_ID".to_string()]
}
fn default_k_neighbors() -> usize { 5 }
fn default_n_estimators() -> usize { 100 }
fn default_random_state() -> u64 { 42 }
fn default_train_file() -> PathBuf { PathBuf::from("artifacts/raw/train.csv") }
fn default_test_file() -> PathBuf { PathBuf::from("artifacts/raw/test.csv") }
fn default_processed_dir() -> PathBuf { PathBuf::from("artifacts/processed") }

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            train_file: default_train_file(),
            test_file: default_test_file(),
            processed_dir: default_processed_dir(),
        }
    }
}

impl PathConfig {
    pub fn processed_train_file(&self) -> PathBuf {
        self.processed_dir.join("processed_train.csv")
    }

    pub fn processed_test_file(&self) -> PathBuf {
        self.processed_dir.join("processed_test.csv")
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        tracing::info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.data_processing.validate()?;
        Ok(config)
    }
}

impl ProcessingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_features == 0 {
            return Err(ConfigError::Invalid("num_features must be at least 1".into()));
        }
        if self.k_neighbors == 0 {
            return Err(ConfigError::Invalid("k_neighbors must be at least 1".into()));
        }
        if self.n_estimators == 0 {
            return Err(ConfigError::Invalid("n_estimators must be at least 1".into()));
        }
        if self.max_features == Some(0) {
            return Err(ConfigError::Invalid("max_features must be at least 1".into()));
        }
        if !self.skewness_threshold.is_finite() {
            return Err(ConfigError::Invalid("Skewness_threshold must be finite".into()));
        }
        if self.label_column.is_empty() {
            return Err(ConfigError::Invalid("label_column must not be empty".into()));
        }
        if self.numerical_columns.contains(&self.label_column) {
            return Err(ConfigError::Invalid(format!(
                "label column '{}' cannot be numerical",
                self.label_column
            )));
        }
        if let Some(col) = self
            .categorical_columns
            .iter()
            .find(|c| self.numerical_columns.contains(c))
        {
            return Err(ConfigError::Invalid(format!(
                "column '{}' is both categorical and numerical",
                col
            )));
        }
        if let Some(col) = self.drop_columns.iter().find(|c| {
            **c == self.label_column
                || self.categorical_columns.contains(c)
                || self.numerical_columns.contains(c)
        }) {
            return Err(ConfigError::Invalid(format!(
                "column '{}' is dropped but also used as a feature or label",
                col
            )));
        }
        Ok(())
    }
}
