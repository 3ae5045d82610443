use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread,
};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::oneshot;

use super::{KvStore, Mutation};

const SCHEMA_VERSION: i32 = 1;

type StoreTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// SQLite-backed [`KvStore`].
///
/// The connection lives on a dedicated worker thread; every call is shipped there as a
/// closure and answered over a oneshot channel. Tasks run one at a time, so
/// [`KvStore::update`] is atomic across all clones of the store. The worker exits once
/// the last clone is dropped.
#[derive(Clone)]
pub struct SqliteStore {
    tasks: mpsc::Sender<StoreTask>,
    scope: Arc<str>,
}

impl SqliteStore {
    pub fn new(db_path: PathBuf, scope: &str) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create store directory {}", parent.display())
            })?;
        }

        let conn = open_connection(&db_path)?;
        let (tasks, queue) = mpsc::channel::<StoreTask>();

        thread::Builder::new()
            .name("immersion-store".into())
            .spawn(move || {
                let mut conn = conn;
                for task in queue {
                    task(&mut conn);
                }
                info!("Store thread shutting down");
            })
            .context("failed to spawn store worker thread")?;

        info!("Store initialized at {} (scope {scope})", db_path.display());

        Ok(Self {
            tasks,
            scope: Arc::from(scope),
        })
    }

    async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tasks
            .send(Box::new(move |conn| {
                if reply_tx.send(task(conn)).is_err() {
                    error!("Store caller dropped before receiving result");
                }
            }))
            .map_err(|_| anyhow!("store thread is gone"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("store thread terminated unexpectedly"))?
    }
}

fn open_connection(db_path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(db_path)
        .with_context(|| format!("failed to open SQLite database {}", db_path.display()))?;

    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        error!("Failed to enable WAL mode: {err}");
    }

    ensure_schema(&mut conn)?;
    Ok(conn)
}

/// Create `kv_entries` on a fresh database; refuse files written by a newer schema.
fn ensure_schema(conn: &mut Connection) -> Result<()> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    match version {
        SCHEMA_VERSION => Ok(()),
        0 => {
            let tx = conn.transaction().context("failed to open schema transaction")?;
            tx.execute_batch(include_str!("schemas/schema_v1.sql"))
                .context("failed to execute schema_v1.sql")?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)
                .context("failed to update user_version pragma")?;
            tx.commit().context("failed to commit schema")
        }
        newer => bail!("store schema version {newer} is newer than supported {SCHEMA_VERSION}"),
    }
}

fn read_value(conn: &Connection, scope: &str, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM kv_entries WHERE scope = ?1 AND key = ?2",
        params![scope, key],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .with_context(|| format!("failed to read '{key}'"))
}

fn write_value(conn: &Connection, scope: &str, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv_entries (scope, key, value, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(scope, key) DO UPDATE SET
             value = excluded.value,
             updated_at = excluded.updated_at",
        params![scope, key, value, Utc::now().to_rfc3339()],
    )
    .with_context(|| format!("failed to write '{key}'"))?;
    Ok(())
}

fn delete_value(conn: &Connection, scope: &str, key: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM kv_entries WHERE scope = ?1 AND key = ?2",
        params![scope, key],
    )
    .with_context(|| format!("failed to remove '{key}'"))?;
    Ok(())
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let scope = self.scope.clone();
        let key = key.to_string();
        self.execute(move |conn| read_value(conn, &scope, &key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let scope = self.scope.clone();
        let key = key.to_string();
        let value = value.to_string();
        self.execute(move |conn| write_value(conn, &scope, &key, &value))
            .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let scope = self.scope.clone();
        let key = key.to_string();
        self.execute(move |conn| delete_value(conn, &scope, &key)).await
    }

    async fn update(&self, key: &str, mutation: Mutation) -> Result<Option<String>> {
        let scope = self.scope.clone();
        let key = key.to_string();
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .with_context(|| format!("failed to open transaction for '{key}'"))?;
            let current = read_value(&tx, &scope, &key)?;
            let next = mutation(current)?;
            match &next {
                Some(value) => write_value(&tx, &scope, &key, value)?,
                None => delete_value(&tx, &scope, &key)?,
            }
            tx.commit()
                .with_context(|| format!("failed to commit update of '{key}'"))?;
            Ok(next)
        })
        .await
    }
}
