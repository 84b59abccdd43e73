// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Locating downloadable file records nested in report responses, and
//! best-effort download of each file to local disk.

use crate::client::Client;
use crate::error::ReportError;
use crate::models::FileRecord;
use log::{debug, error, info};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Where in a report response the file objects live.
pub struct DownloadRequest<'a> {
    /// Report path including embeds, e.g. `/Deposits?embeds=FileAttachments`.
    pub report_path: &'a str,
    /// Chains of keys from each entity to its file objects; lists fan out.
    pub nested_paths: &'a [&'a [&'a str]],
}

/// Outcome of one file download.
#[derive(Debug, PartialEq, Eq)]
pub enum Downloaded {
    Saved(PathBuf),
    /// 404 from the file host, or a record without a download URL.
    Missing,
}

impl Client {
    /// Fetch the filtered report for `entity_ids` and return every file
    /// record found under the request's nested paths.
    pub async fn resolve_download(
        &self,
        entity_ids: &[i64],
        request: &DownloadRequest<'_>,
    ) -> Result<Vec<FileRecord>, ReportError> {
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = filtered_report_url(self.base_url(), request.report_path, entity_ids);
        debug!("resolve_download - fetching from {}", url);
        let Some(content) = self.fetch_report(&url).await? else {
            return Ok(Vec::new());
        };

        let report: Value = serde_json::from_str(&content)?;
        let mut records = Vec::new();
        if let Some(entities) = report.as_array() {
            for entity in entities {
                for path in request.nested_paths {
                    for file in collect_path(entity, path) {
                        if let Some(record) = FileRecord::from_value(file) {
                            records.push(record);
                        }
                    }
                }
            }
        }
        Ok(records)
    }

    /// Download one file under `folder/{FileID}/{Name}{Extension}`.
    /// A 404 is a soft miss; any other failure propagates.
    pub async fn fetch_file(
        &self,
        record: &FileRecord,
        folder: &Path,
    ) -> Result<Downloaded, ReportError> {
        let Some(url) = &record.download_url else {
            debug!("File {} has no download URL, skipping", record.file_id);
            return Ok(Downloaded::Missing);
        };
        let path = folder.join(record.relative_path());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let response = self.http().get(url).send().await?;
        let status = response.status().as_u16();
        if status == 404 {
            error!("Download of {} failed: HTTP 404", record.relative_path());
            return Ok(Downloaded::Missing);
        }
        if !(200..300).contains(&status) {
            return Err(ReportError::Fetch { status });
        }

        let bytes = response.bytes().await?;
        std::fs::write(&path, &bytes)?;
        info!("Fetched {} to {}", record.relative_path(), path.display());
        Ok(Downloaded::Saved(path))
    }
}

/// `{base}{path}&filters=FileAttachments.EntityKeyID,in,(ids)` with ids
/// deduplicated and sorted so the URL is stable across runs.
fn filtered_report_url(base: &str, report_path: &str, entity_ids: &[i64]) -> String {
    let mut ids: Vec<i64> = entity_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    let joined = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "{}{}&filters=FileAttachments.EntityKeyID,in,({})",
        base, report_path, joined
    )
}

/// Walk one key chain through a JSON value, fanning out over arrays.
fn collect_path<'v>(value: &'v Value, path: &[&str]) -> Vec<&'v Value> {
    match path.split_first() {
        None => match value {
            Value::Null => Vec::new(),
            _ => vec![value],
        },
        Some((head, rest)) => match value.get(head) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .flat_map(|item| collect_path(item, rest))
                .collect(),
            Some(child) => collect_path(child, rest),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filtered_url_dedups_and_sorts_ids() {
        let url = filtered_report_url(
            "https://api.example.com",
            "/Deposits?embeds=FileAttachments",
            &[3969, 1471, 3969, 17930],
        );
        assert_eq!(
            url,
            "https://api.example.com/Deposits?embeds=FileAttachments\
             &filters=FileAttachments.EntityKeyID,in,(1471,3969,17930)"
        );
    }

    #[test]
    fn nested_path_fans_out_over_lists() {
        let entity = json!({
            "DepositID": 19472,
            "FileAttachments": [
                {"File": {"FileID": 1, "Name": "a", "Extension": ".pdf"}},
                {"File": {"FileID": 2, "Name": "b", "Extension": ".png"}},
                {"File": null},
            ]
        });
        let files = collect_path(&entity, &["FileAttachments", "File"]);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].get("FileID"), Some(&json!(1)));
    }

    #[test]
    fn scalar_path_resolves_single_object() {
        let entity = json!({"File": {"FileID": 7}});
        let files = collect_path(&entity, &["File"]);
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn missing_key_yields_nothing() {
        let entity = json!({"Other": 1});
        assert!(collect_path(&entity, &["FileAttachments", "File"]).is_empty());
    }
}
