// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

//! Read interface between the exporter and the transactional store.
//!
//! All SELECT statements are consolidated behind the [`TableSource`]
//! trait, decoupling SQL from the export loop; tests substitute an
//! in-memory source. The Postgres implementation uses the simple-query
//! protocol so every value arrives in the store's native text
//! representation, which is exactly what lands in the CSV output.

use crate::error::ExportError;
use crate::pool::ScopedConnection;
use tokio_postgres::{Client, SimpleQueryMessage};

/// Snapshot of one table taken at enumeration time. No invariant is
/// enforced against concurrent schema changes during export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub schema: String,
    pub name: String,
    /// Total on-disk size in bytes, used for smallest-first ordering.
    pub size_bytes: i64,
}

impl TableDescriptor {
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }
}

/// One page of rows plus the column names of the result set.
#[derive(Debug, Default)]
pub struct Page {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[async_trait::async_trait]
pub trait TableSource: Send + Sync {
    /// List tables in `schema`, smallest first when `by_size` is set.
    async fn list_tables(
        &self,
        schema: &str,
        by_size: bool,
    ) -> Result<Vec<TableDescriptor>, ExportError>;

    async fn count_rows(&self, table: &TableDescriptor) -> Result<u64, ExportError>;

    /// `SELECT * ... LIMIT limit OFFSET offset` in stable fetch order.
    async fn fetch_page(
        &self,
        table: &TableDescriptor,
        limit: u64,
        offset: u64,
    ) -> Result<Page, ExportError>;
}

#[async_trait::async_trait]
impl TableSource for Client {
    async fn list_tables(
        &self,
        schema: &str,
        by_size: bool,
    ) -> Result<Vec<TableDescriptor>, ExportError> {
        let sql = format!(
            "SELECT table_name, \
                    pg_total_relation_size(quote_ident(table_schema) || '.' || quote_ident(table_name)) AS size \
             FROM   information_schema.tables \
             WHERE  table_schema = {schema} \
             ORDER  BY {order}",
            schema = quote_literal(schema),
            order = if by_size { "size" } else { "table_name" },
        );
        let mut tables = Vec::new();
        for message in self.simple_query(&sql).await? {
            if let SimpleQueryMessage::Row(row) = message {
                let name = row.try_get(0)?.unwrap_or_default().to_string();
                let size_bytes = row
                    .try_get(1)?
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_default();
                tables.push(TableDescriptor {
                    schema: schema.to_string(),
                    name,
                    size_bytes,
                });
            }
        }
        Ok(tables)
    }

    async fn count_rows(&self, table: &TableDescriptor) -> Result<u64, ExportError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.qualified());
        for message in self.simple_query(&sql).await? {
            if let SimpleQueryMessage::Row(row) = message {
                let value = row.try_get(0)?;
                return value
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| ExportError::MalformedCount {
                        schema: table.schema.clone(),
                        table: table.name.clone(),
                        value: value.map(str::to_string),
                    });
            }
        }
        Err(ExportError::MalformedCount {
            schema: table.schema.clone(),
            table: table.name.clone(),
            value: None,
        })
    }

    async fn fetch_page(
        &self,
        table: &TableDescriptor,
        limit: u64,
        offset: u64,
    ) -> Result<Page, ExportError> {
        let sql = format!(
            "SELECT * FROM {} LIMIT {} OFFSET {}",
            table.qualified(),
            limit,
            offset
        );
        let mut page = Page::default();
        for message in self.simple_query(&sql).await? {
            match message {
                SimpleQueryMessage::RowDescription(columns) => {
                    page.columns = columns.iter().map(|c| c.name().to_string()).collect();
                }
                SimpleQueryMessage::Row(row) => {
                    let mut values = Vec::with_capacity(row.len());
                    for i in 0..row.len() {
                        values.push(row.try_get(i)?.map(str::to_string));
                    }
                    page.rows.push(values);
                }
                _ => {}
            }
        }
        Ok(page)
    }
}

#[async_trait::async_trait]
impl TableSource for ScopedConnection {
    async fn list_tables(
        &self,
        schema: &str,
        by_size: bool,
    ) -> Result<Vec<TableDescriptor>, ExportError> {
        (**self).list_tables(schema, by_size).await
    }

    async fn count_rows(&self, table: &TableDescriptor) -> Result<u64, ExportError> {
        (**self).count_rows(table).await
    }

    async fn fetch_page(
        &self,
        table: &TableDescriptor,
        limit: u64,
        offset: u64,
    ) -> Result<Page, ExportError> {
        (**self).fetch_page(table, limit, offset).await
    }
}

pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
