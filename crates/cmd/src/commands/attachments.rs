// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! `silo attachments`: resolve and download file attachments referenced
//! by the report API for the given entity types. Only entity types with
//! a known numeric type id are accepted; the report path itself is
//! derived from the entity name.

use anyhow::{Result, anyhow};
use clap::Args;
use log::debug;
use reportapi::{
    ApiCredentials, Client, DownloadRequest, Downloaded, MemoryTokenStore, entity_type_id,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct AttachmentsArgs {
    /// Entity types to mirror, e.g. Deposit, Check, Unit
    #[arg(long, required = true)]
    entity: Vec<String>,

    /// Entity key ids whose attachments are fetched
    #[arg(long, value_delimiter = ',', required = true)]
    ids: Vec<i64>,

    /// Local folder attachments are mirrored into
    #[arg(long, default_value = "rm_files")]
    folder: PathBuf,
}

pub async fn attachments_command(args: AttachmentsArgs) -> Result<()> {
    let credentials = ApiCredentials::from_env()?;
    let tokens = match std::env::var("API_TOKEN") {
        Ok(token) if !token.is_empty() => MemoryTokenStore::seeded(&token),
        _ => MemoryTokenStore::new(),
    };
    let client = Client::new(credentials, Arc::new(tokens))?;

    for entity in &args.entity {
        let report_path = report_path(entity)?;
        let request = DownloadRequest {
            report_path: &report_path,
            nested_paths: &[&["FileAttachments", "File"]],
        };

        let records = client
            .resolve_download(&args.ids, &request)
            .await
            .map_err(|e| anyhow!("could not resolve {} attachments: {}", entity, e))?;

        let mut saved = 0;
        let mut missing = 0;
        for record in &records {
            match client.fetch_file(record, &args.folder).await? {
                Downloaded::Saved(_) => saved += 1,
                Downloaded::Missing => missing += 1,
            }
        }
        println!(
            "{}: {} attachments found, {} downloaded, {} missing",
            entity,
            records.len(),
            saved,
            missing
        );
    }
    Ok(())
}

/// Build the report path for one entity type, rejecting entities the
/// type table does not know.
fn report_path(entity: &str) -> Result<String> {
    let type_id = entity_type_id(entity)
        .ok_or_else(|| anyhow!("unknown entity type: {}", entity))?;
    debug!("Entity {} has type id {}", entity, type_id);
    Ok(format!("/{}s?embeds=FileAttachments", entity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_entities_build_report_paths() {
        assert_eq!(
            report_path("Deposit").expect("path"),
            "/Deposits?embeds=FileAttachments"
        );
    }

    #[test]
    fn unknown_entities_are_rejected() {
        assert!(report_path("Castle").is_err());
    }
}
