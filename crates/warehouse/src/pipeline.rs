// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Pipeline driver: enumerate tables, export each, sink each, report
//! progress. Per-table failures are captured as typed outcomes and never
//! abort the run; bucket provisioning is the one fatal path.

use crate::config::{ExportOptions, SinkMode};
use crate::error::ExportError;
use crate::export::export_table;
use crate::sink::{ArchiveSink, Sink, UploadSink};
use crate::source::TableSource;
use crate::store::ObjectStore;
use log::{error, info};
use std::path::{Path, PathBuf};

/// One table's export-and-sink result.
pub struct TableOutcome {
    pub table: String,
    pub result: Result<Vec<PathBuf>, ExportError>,
}

/// Aggregated results of one schema run.
pub struct RunReport {
    pub schema: String,
    pub outcomes: Vec<TableOutcome>,
}

impl RunReport {
    pub fn exported(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.exported()
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }
}

/// Export every table of `schema` and sink the generated shards.
///
/// A crash mid-run leaves already-sunk tables sunk; direct-upload reruns
/// skip pre-existing objects, archive reruns redo everything.
pub async fn run_export(
    source: &dyn TableSource,
    store: Option<&dyn ObjectStore>,
    schema: &str,
    opts: &ExportOptions,
) -> Result<RunReport, ExportError> {
    opts.validate()?;
    info!("Exporting all tables from schema {}...", schema);

    let mut sink = match opts.sink {
        SinkMode::Archive => Sink::Archive(ArchiveSink::create(schema, &opts.output_dir)?),
        SinkMode::Upload => {
            let store = store.ok_or_else(|| {
                ExportError::Configuration("upload sink requires an object store".to_string())
            })?;
            // Fatal when this fails: there is nowhere to put anything.
            store.ensure_bucket().await?;
            let folder = opts
                .bucket
                .as_ref()
                .and_then(|b| b.folder.clone())
                .unwrap_or_else(|| schema.to_string());
            Sink::Upload(UploadSink::new(store, &folder, &opts.output_dir))
        }
    };

    let tables = source.list_tables(schema, opts.order_by_size).await?;
    let total = tables.len();
    info!("Total tables to export: {}", total);

    let mut outcomes = Vec::with_capacity(total);
    for (i, table) in tables.iter().enumerate() {
        let result = match export_table(source, table, opts).await {
            Ok(files) => sink.consume(&files).await.map(|_| files),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            error!("Failed to export table {}. Error: {}", table.name, e);
        }
        outcomes.push(TableOutcome {
            table: table.name.clone(),
            result,
        });
        info!("Progress: {}/{} tables exported.", i + 1, total);
    }

    sink.finish()?;
    info!("All tables exported.");
    Ok(RunReport {
        schema: schema.to_string(),
        outcomes,
    })
}

/// Sweep stray shard files left behind by an interrupted previous run.
/// Recurses into subdirectories, where an interrupted upload run may
/// have staged shards under `{output_dir}/{folder}`.
pub fn remove_stale_exports(folder: &Path) -> std::io::Result<()> {
    if !folder.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_dir() {
            remove_stale_exports(&path)?;
        } else if path.extension().is_some_and(|ext| ext == "csv") {
            match std::fs::remove_file(&path) {
                Ok(()) => info!("Successfully removed {}", path.display()),
                Err(e) => error!("Failed to remove {}. Error: {}", path.display(), e),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn stale_sweep_only_touches_csv_files() -> std::io::Result<()> {
        let dir = tempdir()?;
        let stale = dir.path().join("accounts_shard_1.csv");
        let kept = dir.path().join("notes.txt");
        std::fs::write(&stale, "id\n")?;
        std::fs::write(&kept, "keep me")?;

        remove_stale_exports(dir.path())?;

        assert!(!stale.exists());
        assert!(kept.exists());
        Ok(())
    }

    #[test]
    fn stale_sweep_reaches_staged_upload_folders() -> std::io::Result<()> {
        let dir = tempdir()?;
        let staging = dir.path().join("transactional");
        std::fs::create_dir_all(&staging)?;
        let staged = staging.join("accounts_shard_2.csv");
        let kept = staging.join("manifest.json");
        std::fs::write(&staged, "id\n")?;
        std::fs::write(&kept, "{}")?;

        remove_stale_exports(dir.path())?;

        assert!(!staged.exists());
        assert!(kept.exists());
        Ok(())
    }

    #[test]
    fn stale_sweep_ignores_missing_folder() {
        assert!(remove_stale_exports(Path::new("definitely/not/here")).is_ok());
    }
}
