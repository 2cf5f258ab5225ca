//! Pipeline files.
//!
//! A pipeline file is TOML holding a global `database` and a `[[job]]` array.
//! Relative paths are resolved against the directory of the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use etl_ingest::DEFAULT_ENCODING;
use etl_load::DEFAULT_DATABASE;
use etl_model::{TableName, TransformDescriptor, ValidationTable};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read pipeline file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pipeline file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("pipeline file {path} declares no jobs")]
    NoJobs { path: PathBuf },

    #[error("job '{name}' is declared more than once")]
    DuplicateJob { name: String },

    #[error("no job named '{name}'")]
    UnknownJob { name: String },
}

fn default_database() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE)
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineFile {
    #[serde(default = "default_database")]
    pub database: PathBuf,
    #[serde(default, rename = "job")]
    pub jobs: Vec<JobConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    pub name: String,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    #[serde(default)]
    pub cleaning: CleaningConfig,
    #[serde(default)]
    pub validation: ValidationTable,
    #[serde(default, rename = "transform")]
    pub transforms: Vec<TransformDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub path: PathBuf,
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationConfig {
    pub table: TableName,
    #[serde(default)]
    pub indexes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleaningConfig {
    /// Rows with a null or blank value in any of these fields are dropped.
    #[serde(default)]
    pub required: Vec<String>,
}

impl PipelineFile {
    /// Reads and parses a pipeline file, resolving relative paths.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if file.jobs.is_empty() {
            return Err(ConfigError::NoJobs {
                path: path.to_path_buf(),
            });
        }
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        file.resolve_paths(base);
        Ok(file)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Makes the database and every source path absolute relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        self.database = resolve(base, &self.database);
        for job in &mut self.jobs {
            job.source.path = resolve(base, &job.source.path);
        }
    }

    /// Jobs to run: every job in declaration order, or the one named.
    pub fn select(&self, name: Option<&str>) -> Result<Vec<&JobConfig>, ConfigError> {
        for (idx, job) in self.jobs.iter().enumerate() {
            if self.jobs[..idx].iter().any(|other| other.name == job.name) {
                return Err(ConfigError::DuplicateJob {
                    name: job.name.clone(),
                });
            }
        }
        match name {
            None => Ok(self.jobs.iter().collect()),
            Some(name) => self
                .jobs
                .iter()
                .find(|job| job.name == name)
                .map(|job| vec![job])
                .ok_or_else(|| ConfigError::UnknownJob {
                    name: name.to_string(),
                }),
        }
    }

    /// Builds the run request for `job` against this file's database.
    pub fn request(&self, job: &JobConfig) -> PipelineRequest {
        PipelineRequest {
            source_path: job.source.path.clone(),
            encoding: job.source.encoding.clone(),
            database: self.database.clone(),
            destination_table: job.destination.table.clone(),
            validation_rules: job.validation.clone(),
            transform_rules: job.transforms.clone(),
            cleaning: job.cleaning.clone(),
            indexes: job.destination.indexes.clone(),
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Everything one run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    pub source_path: PathBuf,
    pub encoding: String,
    pub database: PathBuf,
    pub destination_table: TableName,
    pub validation_rules: ValidationTable,
    pub transform_rules: Vec<TransformDescriptor>,
    pub cleaning: CleaningConfig,
    pub indexes: Vec<String>,
}

impl PipelineRequest {
    /// A request with no rules, default encoding and default database.
    pub fn new(source_path: impl Into<PathBuf>, destination_table: TableName) -> Self {
        Self {
            source_path: source_path.into(),
            encoding: default_encoding(),
            database: default_database(),
            destination_table,
            validation_rules: ValidationTable::new(),
            transform_rules: Vec::new(),
            cleaning: CleaningConfig::default(),
            indexes: Vec::new(),
        }
    }
}
