// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the report API client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not retrieve report: HTTP {status}")]
    Fetch { status: u16 },

    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("malformed report payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Configuration(String),
}
