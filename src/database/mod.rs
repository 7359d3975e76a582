use std::io;
use std::path::PathBuf;

use log::info;
use rocket::tokio::task;
use thiserror::Error;

pub mod drivers;

use self::drivers::{DbConnector, DriverTarget};
use crate::config::DatabaseConfig;
use crate::model::SongId;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("error parsing url: {0}")]
    Url(#[from] url::ParseError),

    #[error("unknown scheme: {0}")]
    UnknownScheme(String),

    #[error("postgres: {0}")]
    Postgres(#[from] postgres::Error),

    #[error("error reading fixtures {}: {source}", .path.display())]
    FixturesIo {
        path: PathBuf,
        source: io::Error,
    },

    #[error("error parsing fixtures {}: {source}", .path.display())]
    FixturesJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The row vanished or changed between read and write.
    #[error("song {0} was changed or removed concurrently")]
    Concurrency(SongId),

    #[error("mock store lock poisoned")]
    Poisoned,

    #[error("database task failed: {0}")]
    Task(#[from] task::JoinError),
}

/// Managed state handing out connectors. Reads go to `read_url` when it is
/// configured, everything that mutates goes to `write_url`.
pub struct Database {
    read: DriverTarget,
    write: DriverTarget,
}

impl Database {
    pub fn from_config(config: &DatabaseConfig) -> Result<Database, DbError> {
        let write = DriverTarget::from_url(config.write_url())?;
        let read = if config.read_url() == config.write_url() {
            write.clone()
        } else {
            DriverTarget::from_url(config.read_url())?
        };
        info!("database read target: {}, write target: {}", read.scheme(), write.scheme());
        Ok(Database { read: read, write: write })
    }

    #[cfg(test)]
    pub fn from_target(target: DriverTarget) -> Database {
        Database {
            read: target.clone(),
            write: target,
        }
    }

    /// Runs `f` on a fresh read connection off the async executor.
    pub async fn read<T, F>(&self, f: F) -> Result<T, DbError>
        where F: FnOnce(&mut dyn DbConnector) -> Result<T, DbError> + Send + 'static,
              T: Send + 'static
    {
        run_blocking(self.read.clone(), f).await
    }

    pub async fn write<T, F>(&self, f: F) -> Result<T, DbError>
        where F: FnOnce(&mut dyn DbConnector) -> Result<T, DbError> + Send + 'static,
              T: Send + 'static
    {
        run_blocking(self.write.clone(), f).await
    }
}

async fn run_blocking<T, F>(target: DriverTarget, f: F) -> Result<T, DbError>
    where F: FnOnce(&mut dyn DbConnector) -> Result<T, DbError> + Send + 'static,
          T: Send + 'static
{
    task::spawn_blocking(move || {
        let mut conn = target.connect()?;
        f(&mut *conn)
    }).await?
}
