// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for warehouse export operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("object storage error: {0}")]
    Storage(#[from] s3::error::S3Error),

    #[error("object storage credentials error: {0}")]
    Credentials(#[from] s3::creds::error::CredentialsError),

    #[error("bucket provisioning failed for {bucket}: {reason}")]
    BucketProvisioning { bucket: String, reason: String },

    #[error("upload of {key} rejected with HTTP {code}")]
    UploadRejected { key: String, code: u16 },

    #[error("malformed row count for {schema}.{table}: {value:?}")]
    MalformedCount {
        schema: String,
        table: String,
        value: Option<String>,
    },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<String> for ExportError {
    fn from(s: String) -> Self {
        ExportError::Configuration(s)
    }
}
