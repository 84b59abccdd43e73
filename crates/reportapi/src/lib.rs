// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Thin client for the property-management report API: token-based
//! authentication with refresh-on-401, filtered report fetches, and
//! extraction and download of file attachments nested in report
//! responses.

pub mod client;
pub mod download;
pub mod error;
pub mod models;
pub mod token;

pub use crate::client::Client;
pub use crate::download::{DownloadRequest, Downloaded};
pub use crate::error::ReportError;
pub use crate::models::{ApiCredentials, FILE_METADATA_FIELDS, FileRecord, entity_type_id};
pub use crate::token::{MemoryTokenStore, TokenStore};
