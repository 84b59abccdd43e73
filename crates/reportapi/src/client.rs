// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Report API client: token-authenticated report fetches with a single
//! refresh-and-retry on 401.

use crate::error::ReportError;
use crate::models::ApiCredentials;
use crate::token::TokenStore;
use log::{debug, error, info};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const TOKEN_HEADER: &str = "X-RM12Api-ApiToken";
const TIMEOUT_SECONDS: u64 = 60;

pub struct Client {
    http: reqwest::Client,
    credentials: ApiCredentials,
    tokens: Arc<dyn TokenStore>,
}

impl Client {
    pub fn new(
        credentials: ApiCredentials,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, ReportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECONDS))
            .build()?;
        Ok(Client {
            http,
            credentials,
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.credentials.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Exchange the configured credentials for a fresh token and store it.
    pub async fn refresh_token(&self) -> Result<String, ReportError> {
        let url = format!("{}/Authentication/AuthorizeUser", self.credentials.base_url);
        let body = json!({
            "username": self.credentials.username,
            "password": self.credentials.password,
            "locationid": self.credentials.location_id,
        });
        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(ReportError::Auth(format!(
                "received non-200 status code: {}",
                status
            )));
        }
        let token = normalize_token(&response.text().await?);
        if token.contains("error") {
            return Err(ReportError::Auth(format!("error in API response: {}", token)));
        }
        self.tokens.set(&token);
        Ok(token)
    }

    /// Fetch a report. 200/206 yield the body, 204 yields `None`; a 401
    /// triggers exactly one token refresh and one retry, and a second
    /// failure propagates.
    pub async fn fetch_report(&self, url: &str) -> Result<Option<String>, ReportError> {
        if self.tokens.get().is_none() {
            info!("Refreshing API token");
            self.refresh_token().await?;
        }
        match self.try_fetch(url).await {
            Err(ReportError::Fetch { status: 401 }) => {
                info!("Token rejected, refreshing and retrying once");
                self.refresh_token().await?;
                self.try_fetch(url).await
            }
            other => other,
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<Option<String>, ReportError> {
        let token = self.tokens.get().unwrap_or_default();
        let response = self
            .http
            .get(url)
            .header(TOKEN_HEADER, token)
            .send()
            .await?;
        let status = response.status().as_u16();
        match status {
            200 | 206 => {
                debug!("Got report from: {}", url);
                Ok(Some(strip_bom(response.text().await?)))
            }
            204 => {
                debug!("Got report without content from: {}", url);
                Ok(None)
            }
            _ => {
                error!("Could not retrieve report: URL: {} HTTP {}", url, status);
                Err(ReportError::Fetch { status })
            }
        }
    }
}

/// Token bodies arrive wrapped in JSON string quotes.
fn normalize_token(raw: &str) -> String {
    raw.trim().trim_matches('"').to_string()
}

/// Report bodies may carry a UTF-8 byte order mark.
fn strip_bom(text: String) -> String {
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_quotes_are_stripped() {
        assert_eq!(normalize_token("\"abc123\"\n"), "abc123");
        assert_eq!(normalize_token("abc123"), "abc123");
    }

    #[test]
    fn bom_is_stripped() {
        assert_eq!(strip_bom("\u{feff}[]".to_string()), "[]");
        assert_eq!(strip_bom("[]".to_string()), "[]");
    }
}
