// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Warehouse export pipeline: dump every table of a Postgres schema to
//! CSV shard files and sink them into a compressed archive or
//! S3-compatible object storage with idempotent-by-skip uploads.

pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod pool;
pub mod sink;
pub mod source;
pub mod store;

pub use crate::config::{BucketConfig, DbConfig, ExportOptions, SinkMode};
pub use crate::error::ExportError;
pub use crate::export::{export_table, shard_count};
pub use crate::pipeline::{RunReport, TableOutcome, remove_stale_exports, run_export};
pub use crate::pool::{PoolManager, ScopedConnection};
pub use crate::source::{Page, TableDescriptor, TableSource};
pub use crate::store::{ObjectStore, S3Store};
