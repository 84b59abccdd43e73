// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Table exporter: streams a table's rows in fixed-size pages into one or
//! more CSV shard files, one header line per shard.

use crate::config::ExportOptions;
use crate::error::ExportError;
use crate::source::{TableDescriptor, TableSource};
use log::{debug, info};
use std::path::PathBuf;

/// Number of shard files for a table: `ceil(total / quota)`, with an
/// empty table still producing one header-only shard.
pub fn shard_count(total_rows: u64, max_rows_per_shard: u64) -> u64 {
    (total_rows.div_ceil(max_rows_per_shard)).max(1)
}

/// Export one table to `opts.output_dir`, returning the generated shard
/// paths in shard order.
pub async fn export_table(
    source: &dyn TableSource,
    table: &TableDescriptor,
    opts: &ExportOptions,
) -> Result<Vec<PathBuf>, ExportError> {
    if opts.max_rows_per_shard == Some(0) {
        return Err(ExportError::Configuration(
            "max_rows_per_shard must be greater than 0".to_string(),
        ));
    }
    let total_rows = source.count_rows(table).await?;
    let num_shards = match opts.max_rows_per_shard {
        Some(quota) => shard_count(total_rows, quota),
        None => 1,
    };
    std::fs::create_dir_all(&opts.output_dir)?;

    let mut generated = Vec::with_capacity(num_shards as usize);
    for shard in 1..=num_shards {
        let file_name = match opts.max_rows_per_shard {
            Some(_) => format!("{}_shard_{}.csv", table.name, shard),
            None => format!("{}.csv", table.name),
        };
        let path = opts.output_dir.join(file_name);
        info!(
            "Creating CSV from table {}, shard {} of {}",
            table.name, shard, num_shards
        );
        write_shard(source, table, opts, shard, &path).await?;
        generated.push(path);
    }
    Ok(generated)
}

/// Pages through one shard's slice of the table. The page size is clamped
/// to the shard's remaining quota, so shards never overlap even when the
/// quota is not a multiple of the batch size.
async fn write_shard(
    source: &dyn TableSource,
    table: &TableDescriptor,
    opts: &ExportOptions,
    shard: u64,
    path: &std::path::Path,
) -> Result<(), ExportError> {
    let base = opts
        .max_rows_per_shard
        .map(|quota| (shard - 1) * quota)
        .unwrap_or(0);
    let mut writer = csv::Writer::from_path(path)?;
    let mut offset = base;
    let mut header_written = false;

    loop {
        let page_size = match opts.max_rows_per_shard {
            Some(quota) => opts.batch_size.min(base + quota - offset),
            None => opts.batch_size,
        };
        if page_size == 0 {
            break; // shard quota reached
        }
        let page = source.fetch_page(table, page_size, offset).await?;
        if !header_written && !page.columns.is_empty() {
            writer.write_record(&page.columns)?;
            header_written = true;
        }
        if page.rows.is_empty() {
            break;
        }
        debug!(
            "Fetched {} rows from {} at offset {}",
            page.rows.len(),
            table.name,
            offset
        );
        offset += page.rows.len() as u64;
        for row in &page.rows {
            writer.write_record(row.iter().map(|v| v.as_deref().unwrap_or_default()))?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_count_rounds_up() {
        assert_eq!(shard_count(0, 1000), 1);
        assert_eq!(shard_count(1, 1000), 1);
        assert_eq!(shard_count(1000, 1000), 1);
        assert_eq!(shard_count(1001, 1000), 2);
        assert_eq!(shard_count(5000, 1000), 5);
    }
}
