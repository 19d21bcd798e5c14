/*!
 * SQLite connection shared by the repository.
 *
 * One `rusqlite::Connection` sits behind a `parking_lot::Mutex`. Async callers
 * go through `execute_async` / `transaction_async`, which hop onto tokio's
 * blocking pool so a slow query never stalls the runtime.
 */

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::schema;

/// Database file created under the data directory when none is configured
const DATABASE_FILE: &str = "tubelingo.db";

/// Application directory under the user's data directory
const DATABASE_DIR: &str = "tubelingo";

/// Path reported for in-memory databases
const IN_MEMORY_PATH: &str = ":memory:";

/// How long a writer waits on a lock held by another tubelingo process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the tubelingo database
#[derive(Clone)]
pub struct DatabaseConnection {
    db_path: PathBuf,
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseConnection {
    /// Open (or create) the database file at `db_path` and bootstrap the schema
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
        }

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        info!("Opened database {}", db_path.display());

        Self::bootstrap(conn, db_path)
    }

    /// Private in-memory database, used by tests and benches
    pub fn new_in_memory() -> Result<Self> {
        debug!("Opening in-memory database");
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;

        Self::bootstrap(conn, PathBuf::from(IN_MEMORY_PATH))
    }

    fn bootstrap(conn: Connection, db_path: PathBuf) -> Result<Self> {
        schema::initialize_schema(&conn)
            .with_context(|| format!("Failed to initialize schema in {}", db_path.display()))?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// `<data_local_dir>/tubelingo/tubelingo.db`
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .ok_or_else(|| anyhow!("Could not determine a data directory for the database"))?;

        Ok(base_dir.join(DATABASE_DIR).join(DATABASE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == IN_MEMORY_PATH
    }

    /// Run `f` on the calling thread; only for code that is already blocking
    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connection.lock();
        f(&conn)
    }

    /// Run `f` on the blocking pool
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run_blocking(move |conn| f(conn)).await
    }

    /// Run `f` inside a transaction on the blocking pool
    ///
    /// Commits only when `f` returns `Ok`; otherwise the dropped transaction
    /// rolls back.
    pub async fn transaction_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run_blocking(move |conn| {
            let tx = conn.transaction()?;
            let result = f(&tx)?;
            tx.commit()?;
            Ok(result)
        })
        .await
    }

    async fn run_blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);

        tokio::task::spawn_blocking(move || {
            let mut conn = connection.lock();
            f(&mut conn)
        })
        .await
        .context("Database task panicked")?
    }
}
