//! Connection management: open, validate, and reconnect on staleness.
//!
//! Every store operation acquires the shared [`tokio_rusqlite::Connection`]
//! through [`ConnectionManager::acquire`], which pings it first. A file-backed
//! connection that fails the ping is replaced by a freshly opened one; an
//! in-memory connection cannot be reopened without losing its data, so its
//! failure is returned as-is.

use std::path::PathBuf;

use tokio::sync::RwLock;
use tokio_rusqlite::Connection;

use crate::{Result, schema::SCHEMA};

enum Target {
  File(PathBuf),
  Memory,
}

pub(crate) struct ConnectionManager {
  target: Target,
  conn:   RwLock<Connection>,
}

impl ConnectionManager {
  pub async fn open(path: PathBuf) -> Result<Self> {
    let conn = connect(&Target::File(path.clone())).await?;
    Ok(Self { target: Target::File(path), conn: RwLock::new(conn) })
  }

  pub async fn open_in_memory() -> Result<Self> {
    let conn = connect(&Target::Memory).await?;
    Ok(Self { target: Target::Memory, conn: RwLock::new(conn) })
  }

  /// Return a validated connection handle, reopening it if it went stale.
  pub async fn acquire(&self) -> Result<Connection> {
    let conn = self.conn.read().await.clone();
    let err = match ping(&conn).await {
      Ok(()) => return Ok(conn),
      Err(e) => e,
    };

    let Target::File(path) = &self.target else {
      return Err(err.into());
    };

    tracing::warn!(error = %err, path = %path.display(), "database connection is stale, reconnecting");
    let mut guard = self.conn.write().await;
    // Another task may already have replaced it.
    if ping(&guard).await.is_ok() {
      return Ok(guard.clone());
    }
    let fresh = connect(&self.target).await?;
    *guard = fresh.clone();
    Ok(fresh)
  }
}

async fn connect(target: &Target) -> Result<Connection> {
  let conn = match target {
    Target::File(path) => Connection::open(path).await?,
    Target::Memory => Connection::open_in_memory().await?,
  };
  conn
    .call(|conn| {
      conn.execute_batch(SCHEMA)?;
      Ok(())
    })
    .await?;
  Ok(conn)
}

async fn ping(conn: &Connection) -> tokio_rusqlite::Result<()> {
  conn
    .call(|conn| {
      conn.query_row("SELECT 1", [], |_| Ok(()))?;
      Ok(())
    })
    .await
}
