// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Export configuration: database connection parameters and the options
//! structure that collapses the plain/sharded/zipped/direct-upload
//! pipeline variants into one exporter and one sink.

use crate::error::ExportError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Connection parameters for the transactional store. Doubles as the pool
/// key: two configs that differ only in pool bounds share a pool.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DbConfig {
    pub database: String,
    pub user: String,
    pub password: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connections opened eagerly when the pool is created.
    #[serde(default = "default_min_connections")]
    pub min_connections: usize,
    /// Upper bound on simultaneous connections per pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_port() -> u16 {
    5432
}

fn default_min_connections() -> usize {
    0
}

fn default_max_connections() -> usize {
    5
}

impl DbConfig {
    /// Read connection parameters from the `WH_DB_*` environment variables.
    pub fn from_env() -> Result<Self, ExportError> {
        Ok(DbConfig {
            database: require_env("WH_DB_DATABASE")?,
            user: require_env("WH_DB_USER")?,
            password: require_env("WH_DB_PASSWORD")?,
            host: require_env("WH_DB_HOST")?,
            port: parse_env("WH_PORT", default_port())?,
            min_connections: parse_env("MIN_DB_CONNECTIONS", default_min_connections())?,
            max_connections: parse_env("MAX_DB_CONNECTIONS", default_max_connections())?,
        })
    }

    pub(crate) fn pg_config(&self) -> tokio_postgres::Config {
        let mut cfg = tokio_postgres::Config::new();
        cfg.dbname(&self.database)
            .user(&self.user)
            .password(&self.password)
            .host(&self.host)
            .port(self.port);
        cfg
    }
}

fn require_env(name: &str) -> Result<String, ExportError> {
    std::env::var(name)
        .map_err(|_| ExportError::Configuration(format!("{} is not set", name)))
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ExportError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ExportError::Configuration(format!("{} is not a number: {}", name, value))),
        Err(_) => Ok(default),
    }
}

/// How generated shard files are persisted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkMode {
    /// Bundle every shard into one `{schema}.zip` per run.
    Archive,
    /// Upload each shard to object storage, skipping pre-existing keys.
    Upload,
}

/// Destination bucket for [`SinkMode::Upload`].
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BucketConfig {
    pub bucket: String,
    /// Key prefix under the bucket; the schema name when empty.
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, R2).
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_region() -> String {
    "us-east-2".to_string()
}

/// Options shared by the exporter, sink, and pipeline driver.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExportOptions {
    /// Rows fetched per page.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    /// Rows per shard file; `None` means one unbounded shard per table.
    #[serde(default = "default_max_rows_per_shard")]
    pub max_rows_per_shard: Option<u64>,
    /// Enumerate tables smallest-first so quick wins land early.
    #[serde(default = "default_true")]
    pub order_by_size: bool,
    /// Directory where shard files are written before sinking.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    pub sink: SinkMode,
    #[serde(default)]
    pub bucket: Option<BucketConfig>,
}

fn default_batch_size() -> u64 {
    1000
}

fn default_max_rows_per_shard() -> Option<u64> {
    Some(200_000)
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl ExportOptions {
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.batch_size == 0 {
            return Err(ExportError::Configuration(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if self.max_rows_per_shard == Some(0) {
            return Err(ExportError::Configuration(
                "max_rows_per_shard must be greater than 0".to_string(),
            ));
        }
        if self.sink == SinkMode::Upload && self.bucket.is_none() {
            return Err(ExportError::Configuration(
                "upload sink requires a bucket section".to_string(),
            ));
        }
        Ok(())
    }
}
