use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{error, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::oneshot;

use super::{migrations::run_migrations, SlotStore};

/// How long a statement waits on a lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum WorkerMsg {
    Run(Job),
    Stop,
}

/// The thread that owns the connection. Dropping the last `Database` clone
/// stops it and waits for queued jobs to drain.
struct Worker {
    jobs: mpsc::Sender<WorkerMsg>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        let handle = match self.thread.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handle) = handle else {
            return;
        };

        if self.jobs.send(WorkerMsg::Stop).is_err() {
            warn!("storage thread already gone at shutdown");
        }
        if let Err(panic) = handle.join() {
            error!("storage thread panicked: {panic:?}");
        }
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;

    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        warn!("WAL journal unavailable, using SQLite default: {err}");
    }
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("failed to set busy timeout")?;

    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

fn serve(mut conn: Connection, jobs: mpsc::Receiver<WorkerMsg>) {
    for msg in jobs {
        match msg {
            WorkerMsg::Run(job) => job(&mut conn),
            WorkerMsg::Stop => break,
        }
    }
    info!("storage thread stopped");
}

/// SQLite-backed slot store.
///
/// The connection lives on a dedicated thread; callers ship closures to it and
/// await the reply, so the async side never blocks on disk I/O.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    path: Arc<PathBuf>,
}

impl Database {
    /// Opens (creating if needed) the database file and brings its schema up
    /// to date before returning.
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }

        let (jobs_tx, jobs_rx) = mpsc::channel();
        let (opened_tx, opened_rx) = mpsc::sync_channel::<Result<()>>(1);
        let thread_path = path.clone();

        let thread = thread::Builder::new()
            .name("shelf-scanner-db".into())
            .spawn(move || match open_connection(&thread_path) {
                Ok(conn) => {
                    if opened_tx.send(Ok(())).is_ok() {
                        serve(conn, jobs_rx);
                    }
                }
                Err(err) => {
                    let _ = opened_tx.send(Err(err));
                }
            })
            .context("failed to spawn storage thread")?;

        opened_rx
            .recv()
            .context("storage thread exited during startup")??;

        info!("Slot database ready at {}", path.display());

        Ok(Self {
            worker: Arc::new(Worker {
                jobs: jobs_tx,
                thread: Mutex::new(Some(thread)),
            }),
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Runs `job` on the storage thread and hands back its result.
    pub async fn execute<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.worker
            .jobs
            .send(WorkerMsg::Run(Box::new(move |conn| {
                // caller may have given up; nothing to do then
                let _ = reply_tx.send(job(conn));
            })))
            .map_err(|_| anyhow!("storage thread is not running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("storage thread dropped the job"))?
    }
}

#[async_trait]
impl SlotStore for Database {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.query_row(
                "SELECT value FROM kv_slots WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("failed to read slot {key}"))
        })
        .await
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO kv_slots (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("failed to write slot {key}"))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_slot_reads_as_none() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
        assert_eq!(db.read("shelf_scanner_items").await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_overwrites_and_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.sqlite3");

        {
            let db = Database::new(path.clone()).unwrap();
            db.write("slot", "[]").await.unwrap();
            db.write("slot", "[1]").await.unwrap();
            assert_eq!(db.path(), path.as_path());
        }

        let reopened = Database::new(path).unwrap();
        assert_eq!(reopened.read("slot").await.unwrap().as_deref(), Some("[1]"));
    }
}
