// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Object storage operations consumed by the upload sink: existence
//! check, idempotent bucket creation, file upload. The trait is the seam
//! for the in-memory store used in tests; production wraps `s3::Bucket`.

use crate::config::BucketConfig;
use crate::error::ExportError;
use log::info;
use s3::bucket::Bucket;
use s3::bucket_ops::BucketConfiguration;
use s3::creds::Credentials;
use s3::region::Region;
use std::path::Path;

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create the destination bucket if absent. "Already exists" is
    /// success; any other failure is the pipeline's one fatal path.
    async fn ensure_bucket(&self) -> Result<(), ExportError>;

    async fn exists(&self, key: &str) -> Result<bool, ExportError>;

    async fn put_file(&self, local: &Path, key: &str) -> Result<(), ExportError>;
}

pub struct S3Store {
    bucket: Box<Bucket>,
    name: String,
    region: Region,
    credentials: Credentials,
}

impl S3Store {
    /// Credentials come from the default provider chain (environment,
    /// profile, instance metadata), matching the original deployment.
    pub fn new(config: &BucketConfig) -> Result<Self, ExportError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|_| ExportError::Configuration(format!("unknown region {}", config.region)))?,
        };
        let credentials = Credentials::default()?;
        let bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())?;
        Ok(S3Store {
            bucket: Box::new(bucket),
            name: config.bucket.clone(),
            region,
            credentials,
        })
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    async fn ensure_bucket(&self) -> Result<(), ExportError> {
        match self.bucket.exists().await {
            Ok(true) => {
                info!("Bucket {} already exists.", self.name);
                return Ok(());
            }
            Ok(false) => info!("Bucket {} does not exist. Attempting to create...", self.name),
            Err(e) => {
                return Err(ExportError::BucketProvisioning {
                    bucket: self.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
        let response = Bucket::create(
            &self.name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
            .map_err(|e| ExportError::BucketProvisioning {
                bucket: self.name.clone(),
                reason: e.to_string(),
            })?;
        // 409 means another run created it between the check and now.
        if response.success() || response.response_code == 409 {
            info!("Successfully created bucket {}.", self.name);
            Ok(())
        } else {
            Err(ExportError::BucketProvisioning {
                bucket: self.name.clone(),
                reason: response.response_text,
            })
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, ExportError> {
        // Any head failure is treated as "not present", so a transient
        // error at worst re-uploads an object.
        Ok(self.bucket.head_object(key).await.is_ok())
    }

    async fn put_file(&self, local: &Path, key: &str) -> Result<(), ExportError> {
        let bytes = tokio::fs::read(local).await?;
        let response = self.bucket.put_object(key, &bytes).await?;
        if response.status_code() == 200 {
            Ok(())
        } else {
            Err(ExportError::UploadRejected {
                key: key.to_string(),
                code: response.status_code(),
            })
        }
    }
}
