// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! API credentials and the file records extracted from report responses.

use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata keys carried alongside each downloadable file.
pub const FILE_METADATA_FIELDS: [&str; 6] = [
    "FileID",
    "Description",
    "CreateDate",
    "UpdateDate",
    "CreateUserID",
    "UpdateUserID",
];

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiCredentials {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub location_id: String,
}

impl ApiCredentials {
    /// Read credentials from the `RM_API_*` environment variables.
    pub fn from_env() -> Result<Self, ReportError> {
        Ok(ApiCredentials {
            base_url: require_env("RM_API_URL")?,
            username: require_env("RM_API_USERNAME")?,
            password: require_env("RM_API_PASSWORD")?,
            location_id: require_env("RM_API_LOCATION_ID")?,
        })
    }
}

fn require_env(name: &str) -> Result<String, ReportError> {
    std::env::var(name).map_err(|_| ReportError::Configuration(format!("{} is not set", name)))
}

/// A downloadable file located in a report response.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub file_id: i64,
    pub name: String,
    pub extension: String,
    pub download_url: Option<String>,
    pub metadata: BTreeMap<String, Value>,
}

impl FileRecord {
    /// Extract a record from one file object; `None` when the object has
    /// no `FileID`.
    pub fn from_value(value: &Value) -> Option<FileRecord> {
        let file_id = value.get("FileID")?.as_i64()?;
        let metadata = FILE_METADATA_FIELDS
            .iter()
            .filter_map(|key| value.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect();
        Some(FileRecord {
            file_id,
            name: value
                .get("Name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            extension: value
                .get("Extension")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            download_url: value
                .get("DownloadURL")
                .and_then(Value::as_str)
                .map(str::to_string),
            metadata,
        })
    }

    /// Relative path the file is saved under: `{FileID}/{Name}{Extension}`.
    pub fn relative_path(&self) -> String {
        format!("{}/{}{}", self.file_id, self.name, self.extension)
    }
}

/// Numeric entity type ids used by attachment filters.
pub fn entity_type_id(entity: &str) -> Option<i32> {
    Some(match entity {
        "Resident" => 1,
        "Prospect" => 2,
        "Property" => 3,
        "Unit" => 4,
        "Vendor" => 6,
        "Owner" => 7,
        "Contact" => 8,
        "Journal" => 24,
        "Bill" => 28,
        "Noncommercial Lease" => 30,
        "CC Trans" => 38,
        "Check" => 111,
        "Deposit" => 118,
        _ => return None,
    })
}
