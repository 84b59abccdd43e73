// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Shard sinks: bundle generated files into one compressed archive per
//! run, or upload each file to object storage with an existence check so
//! reruns skip already-migrated shards.

use crate::error::ExportError;
use crate::store::ObjectStore;
use log::{info, warn};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

/// Internal directory prefix for archive entries, carried over from the
/// layout consumers of the archive already expect.
const ARCHIVE_PREFIX: &str = "csv_files";

pub enum Sink<'a> {
    Archive(ArchiveSink),
    Upload(UploadSink<'a>),
}

impl<'a> Sink<'a> {
    /// Persist one table's shard files, deleting local copies as they are
    /// durably stored.
    pub async fn consume(&mut self, files: &[PathBuf]) -> Result<(), ExportError> {
        match self {
            Sink::Archive(archive) => {
                for file in files {
                    archive.append(file)?;
                }
                Ok(())
            }
            Sink::Upload(upload) => {
                for file in files {
                    upload.upload(file).await?;
                }
                Ok(())
            }
        }
    }

    /// Finalize the sink; archives are not valid until this runs.
    pub fn finish(self) -> Result<(), ExportError> {
        match self {
            Sink::Archive(archive) => archive.finish(),
            Sink::Upload(_) => Ok(()),
        }
    }
}

pub struct ArchiveSink {
    zip: ZipWriter<File>,
    path: PathBuf,
}

impl ArchiveSink {
    pub fn create(schema: &str, out_dir: &Path) -> Result<Self, ExportError> {
        std::fs::create_dir_all(out_dir)?;
        let path = out_dir.join(format!("{}.zip", schema));
        let zip = ZipWriter::new(File::create(&path)?);
        Ok(ArchiveSink { zip, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, file: &Path) -> Result<(), ExportError> {
        let name = file_name(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip.start_file(format!("{}/{}", ARCHIVE_PREFIX, name), options)?;
        io::copy(&mut File::open(file)?, &mut self.zip)?;
        std::fs::remove_file(file)?;
        info!("Archived {}", name);
        Ok(())
    }

    fn finish(mut self) -> Result<(), ExportError> {
        self.zip.finish()?;
        Ok(())
    }
}

pub struct UploadSink<'a> {
    store: &'a dyn ObjectStore,
    /// Key prefix under the bucket; also the local staging folder name.
    folder: String,
    staging: PathBuf,
}

impl<'a> UploadSink<'a> {
    pub fn new(store: &'a dyn ObjectStore, folder: &str, out_dir: &Path) -> Self {
        UploadSink {
            store,
            folder: folder.to_string(),
            staging: out_dir.join(folder),
        }
    }

    async fn upload(&self, file: &Path) -> Result<(), ExportError> {
        let name = file_name(file);
        let key = format!("{}/{}", self.folder, name);
        if self.store.exists(&key).await? {
            info!("Skipping {}, already uploaded.", name);
            return Ok(());
        }

        std::fs::create_dir_all(&self.staging)?;
        let staged = self.staging.join(&name);
        std::fs::rename(file, &staged)?;

        self.store.put_file(&staged, &key).await?;
        info!("Successfully uploaded {} to {}", name, key);

        if staged.exists() {
            std::fs::remove_file(&staged)?;
        } else {
            warn!("{} does not exist on the local filesystem.", name);
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn archive_bundles_and_removes_local_files() -> Result<(), ExportError> {
        let dir = tempdir()?;
        let shard = dir.path().join("accounts_shard_1.csv");
        std::fs::write(&shard, "id,name\n1,alice\n")?;

        let mut sink = ArchiveSink::create("transactional", dir.path())?;
        let archive_path = sink.path().to_path_buf();
        sink.append(&shard)?;
        sink.finish()?;

        assert!(!shard.exists());
        let mut archive = zip::ZipArchive::new(File::open(&archive_path)?)?;
        assert_eq!(archive.len(), 1);
        let entry = archive.by_index(0)?;
        assert_eq!(entry.name(), "csv_files/accounts_shard_1.csv");
        Ok(())
    }
}
