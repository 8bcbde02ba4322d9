//! PostgreSQL access: one connection per run, scoped so it is always closed.

mod read;
mod write;

pub use read::{count_rows, load_table};
pub use write::replace_table;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use sqlx::{Connection, PgConnection};
use tracing::{info, warn};

use crate::config::DbConfig;

pub struct Database {
    conn: PgConnection,
}

impl Database {
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let conn = PgConnection::connect_with(&config.connect_options())
            .await
            .with_context(|| format!("connecting to {config:?}"))?;
        info!(db = ?config, "connected");
        Ok(Self { conn })
    }

    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Graceful shutdown. Dropping a `Database` also releases the socket,
    /// just without the terminate handshake.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await.context("closing connection")?;
        info!("connection closed");
        Ok(())
    }
}

/// Open a connection, run `body`, and close the connection whether or not
/// `body` succeeded. The body's error takes precedence over a close error.
pub async fn with_database<T, F>(config: &DbConfig, body: F) -> Result<T>
where
    F: for<'c> FnOnce(&'c mut Database) -> BoxFuture<'c, Result<T>>,
{
    let mut db = Database::connect(config).await?;
    let outcome = body(&mut db).await;
    let closed = db.close().await;

    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "close failed after an earlier error");
            Err(err)
        }
    }
}
