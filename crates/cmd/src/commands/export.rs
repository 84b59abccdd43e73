// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! `silo export`: dump a schema's tables to CSV shards and sink them.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use std::path::PathBuf;
use warehouse::{
    BucketConfig, DbConfig, ExportOptions, ObjectStore, PoolManager, S3Store, SinkMode,
    remove_stale_exports, run_export,
};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Schema whose tables are exported
    #[arg(long)]
    schema: String,

    /// YAML file with an export options section
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rows fetched per page
    #[arg(long)]
    batch_size: Option<u64>,

    /// Rows per shard file
    #[arg(long)]
    max_rows_per_shard: Option<u64>,

    /// Bundle all shards into one zip archive
    #[arg(long, conflicts_with = "upload")]
    archive: bool,

    /// Upload each shard to object storage
    #[arg(long, conflicts_with = "archive")]
    upload: bool,

    /// Destination bucket (upload mode)
    #[arg(long)]
    bucket: Option<String>,

    /// Key prefix under the bucket; defaults to the schema name
    #[arg(long)]
    folder: Option<String>,

    /// Bucket region (upload mode)
    #[arg(long)]
    region: Option<String>,

    /// Custom S3-compatible endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Directory shard files are written to before sinking
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Remove stray CSV files from a previous interrupted run first
    #[arg(long)]
    clean: bool,
}

pub async fn export_command(args: ExportArgs) -> Result<()> {
    let opts = build_options(&args)?;
    opts.validate()?;

    if args.clean {
        remove_stale_exports(&opts.output_dir)
            .with_context(|| format!("could not sweep {}", opts.output_dir.display()))?;
    }

    let db = DbConfig::from_env()?;
    let pools = PoolManager::new();
    let conn = pools.acquire(&db).await?;

    let store = match (&opts.sink, &opts.bucket) {
        (SinkMode::Upload, Some(bucket)) => Some(S3Store::new(bucket)?),
        _ => None,
    };

    let report = run_export(
        &conn,
        store.as_ref().map(|s| s as &dyn ObjectStore),
        &args.schema,
        &opts,
    )
    .await?;

    println!(
        "Exported {}/{} tables from schema {}",
        report.exported(),
        report.outcomes.len(),
        report.schema
    );
    for outcome in &report.outcomes {
        if let Err(e) = &outcome.result {
            println!("  failed: {}: {}", outcome.table, e);
        }
    }
    Ok(())
}

/// Options come from the YAML file when given, otherwise from flags;
/// flags override file values either way.
fn build_options(args: &ExportArgs) -> Result<ExportOptions> {
    let mut opts = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            serde_yaml_ng::from_str(&content)
                .with_context(|| "failed to parse YAML configuration")?
        }
        None => {
            let sink = sink_from_flags(args)?
                .ok_or_else(|| anyhow!("pass --archive or --upload (or a --config file)"))?;
            ExportOptions {
                batch_size: 1000,
                max_rows_per_shard: Some(200_000),
                order_by_size: true,
                output_dir: PathBuf::from("."),
                sink,
                bucket: None,
            }
        }
    };

    if let Some(sink) = sink_from_flags(args)? {
        opts.sink = sink;
    }
    if let Some(batch_size) = args.batch_size {
        opts.batch_size = batch_size;
    }
    if let Some(quota) = args.max_rows_per_shard {
        opts.max_rows_per_shard = Some(quota);
    }
    if let Some(output_dir) = &args.output_dir {
        opts.output_dir = output_dir.clone();
    }
    if let Some(bucket) = &args.bucket {
        opts.bucket = Some(BucketConfig {
            bucket: bucket.clone(),
            folder: args.folder.clone(),
            region: args.region.clone().unwrap_or_else(|| "us-east-2".to_string()),
            endpoint: args.endpoint.clone(),
        });
    }
    Ok(opts)
}

fn sink_from_flags(args: &ExportArgs) -> Result<Option<SinkMode>> {
    match (args.archive, args.upload) {
        (true, false) => Ok(Some(SinkMode::Archive)),
        (false, true) => Ok(Some(SinkMode::Upload)),
        (false, false) => Ok(None),
        (true, true) => Err(anyhow!("--archive and --upload are mutually exclusive")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ExportArgs {
        ExportArgs {
            schema: "transactional".to_string(),
            config: None,
            batch_size: None,
            max_rows_per_shard: None,
            archive: true,
            upload: false,
            bucket: None,
            folder: None,
            region: None,
            endpoint: None,
            output_dir: None,
            clean: false,
        }
    }

    #[test]
    fn flags_alone_build_archive_options() {
        let opts = build_options(&args()).expect("options");
        assert_eq!(opts.sink, SinkMode::Archive);
        assert_eq!(opts.batch_size, 1000);
    }

    #[test]
    fn missing_sink_selection_is_an_error() {
        let mut a = args();
        a.archive = false;
        assert!(build_options(&a).is_err());
    }

    #[test]
    fn yaml_config_is_honored_with_flag_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("silo.yaml");
        std::fs::write(
            &path,
            "sink: upload\n\
             batch_size: 500\n\
             bucket:\n\
             \x20 bucket: gj-etl-db-csv\n\
             \x20 region: us-east-2\n",
        )
        .expect("write config");

        let mut a = args();
        a.archive = false;
        a.config = Some(path);
        a.batch_size = Some(250);
        let opts = build_options(&a).expect("options");
        assert_eq!(opts.sink, SinkMode::Upload);
        assert_eq!(opts.batch_size, 250);
        assert_eq!(opts.bucket.as_ref().map(|b| b.bucket.as_str()), Some("gj-etl-db-csv"));
    }
}
