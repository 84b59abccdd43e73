// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Client behavior against a canned local HTTP endpoint: token refresh
//! on rejection and report status mapping. No real report API involved.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use reportapi::{ApiCredentials, Client, MemoryTokenStore, ReportError, TokenStore};

/// Serves one canned response per report request, in order. Token
/// requests always succeed with a fresh token and are counted.
async fn spawn_api(report_responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let auth_hits = Arc::new(AtomicUsize::new(0));
    let hits = auth_hits.clone();
    tokio::spawn(async move {
        let mut reports = report_responses.into_iter();
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let mut buf = vec![0u8; 4096];
            let mut read = 0;
            while read < buf.len() {
                match socket.read(&mut buf[read..]).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        read += n;
                        if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                }
            }
            let request = String::from_utf8_lossy(&buf[..read]).into_owned();
            let response = if request.starts_with("POST /Authentication/AuthorizeUser") {
                hits.fetch_add(1, Ordering::SeqCst);
                canned(200, "\"fresh-token\"")
            } else {
                match reports.next() {
                    Some((status, body)) => canned(status, body),
                    None => canned(500, "out of canned responses"),
                }
            };
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    (format!("http://{}", addr), auth_hits)
}

fn canned(status: u16, body: &str) -> String {
    let reason = match status {
        200 => "OK",
        204 => "No Content",
        401 => "Unauthorized",
        _ => "Error",
    };
    if status == 204 {
        "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_string()
    } else {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        )
    }
}

fn credentials(base_url: &str) -> ApiCredentials {
    ApiCredentials {
        base_url: base_url.to_string(),
        username: "api-user".to_string(),
        password: "api-pass".to_string(),
        location_id: "1".to_string(),
    }
}

#[tokio::test]
async fn rejected_token_is_refreshed_exactly_once() -> Result<(), ReportError> {
    let (base, auth_hits) = spawn_api(vec![(401, ""), (200, "[]")]).await;
    let store = Arc::new(MemoryTokenStore::seeded("stale"));
    let client = Client::new(credentials(&base), store.clone())?;

    let url = format!("{}/Deposits?embeds=FileAttachments", base);
    let body = client.fetch_report(&url).await?;

    assert_eq!(body.as_deref(), Some("[]"));
    assert_eq!(auth_hits.load(Ordering::SeqCst), 1);
    assert_eq!(store.get().as_deref(), Some("fresh-token"));
    Ok(())
}

#[tokio::test]
async fn report_without_content_maps_to_none() -> Result<(), ReportError> {
    let (base, auth_hits) = spawn_api(vec![(204, "")]).await;
    let client = Client::new(credentials(&base), Arc::new(MemoryTokenStore::seeded("tok")))?;

    let url = format!("{}/Units?embeds=FileAttachments", base);
    let body = client.fetch_report(&url).await?;

    assert!(body.is_none());
    assert_eq!(auth_hits.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn second_rejection_propagates() {
    let (base, auth_hits) = spawn_api(vec![(401, ""), (401, "")]).await;
    let client = Client::new(credentials(&base), Arc::new(MemoryTokenStore::seeded("stale")))
        .expect("client");

    let url = format!("{}/Checks?embeds=FileAttachments", base);
    let result = client.fetch_report(&url).await;

    assert!(matches!(result, Err(ReportError::Fetch { status: 401 })));
    assert_eq!(auth_hits.load(Ordering::SeqCst), 1);
}
