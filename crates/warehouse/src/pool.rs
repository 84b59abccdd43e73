// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Bounded connection pools keyed by connection parameters.
//!
//! The manager owns every pool for the life of the process and is passed
//! by reference to callers; dropping it closes all pooled connections.
//! A [`ScopedConnection`] returns its client to the pool when it goes out
//! of scope rather than closing it.

use crate::config::DbConfig;
use crate::error::ExportError;
use log::{debug, error, info};
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_postgres::{Client, NoTls};

/// (database, user, password, host)
pub type PoolKey = (String, String, String, String);

pub struct PoolManager {
    pools: tokio::sync::Mutex<HashMap<PoolKey, Arc<Pool>>>,
}

struct Pool {
    config: DbConfig,
    idle: std::sync::Mutex<Vec<Client>>,
    permits: Arc<Semaphore>,
}

impl PoolManager {
    pub fn new() -> Self {
        PoolManager {
            pools: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Hand out a scoped connection, creating the pool for this key on
    /// first use. Store-unreachable errors propagate; no retry here.
    pub async fn acquire(&self, config: &DbConfig) -> Result<ScopedConnection, ExportError> {
        let key = pool_key(config);
        let pool = {
            let mut pools = self.pools.lock().await;
            match pools.get(&key) {
                Some(pool) => pool.clone(),
                None => {
                    info!(
                        "Opening pool for database {} on {} as {}",
                        config.database, config.host, config.user
                    );
                    let pool = Arc::new(Pool::bootstrap(config).await?);
                    pools.insert(key, pool.clone());
                    pool
                }
            }
        };
        pool.checkout().await
    }
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new()
    }
}

fn pool_key(config: &DbConfig) -> PoolKey {
    (
        config.database.clone(),
        config.user.clone(),
        config.password.clone(),
        config.host.clone(),
    )
}

impl Pool {
    async fn bootstrap(config: &DbConfig) -> Result<Self, ExportError> {
        let mut idle = Vec::with_capacity(config.min_connections);
        for _ in 0..config.min_connections {
            idle.push(connect(config).await?);
        }
        Ok(Pool {
            config: config.clone(),
            idle: std::sync::Mutex::new(idle),
            permits: Arc::new(Semaphore::new(config.max_connections.max(1))),
        })
    }

    async fn checkout(self: &Arc<Self>) -> Result<ScopedConnection, ExportError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ExportError::Configuration("connection pool closed".to_string()))?;
        let reused = self.idle.lock().ok().and_then(|mut idle| idle.pop());
        let client = match reused {
            Some(client) => {
                debug!("Reusing pooled connection to {}", self.config.database);
                client
            }
            None => connect(&self.config).await?,
        };
        Ok(ScopedConnection {
            client: Some(client),
            pool: self.clone(),
            _permit: permit,
        })
    }
}

async fn connect(config: &DbConfig) -> Result<Client, ExportError> {
    let (client, connection) = config.pg_config().connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("Database connection terminated: {}", e);
        }
    });
    Ok(client)
}

/// A connection borrowed from a pool for the duration of one operation.
pub struct ScopedConnection {
    client: Option<Client>,
    pool: Arc<Pool>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for ScopedConnection {
    type Target = Client;

    fn deref(&self) -> &Client {
        // Some until Drop takes it.
        self.client.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        if let (Some(client), Ok(mut idle)) = (self.client.take(), self.pool.idle.lock()) {
            idle.push(client);
        }
    }
}
