//! redb-based key-value storage for parked order lists
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `parked_orders` | storage key (`prefix` / `prefix + scope`) | JSON array of `ParkedOrder` | One list per tenant |
//!
//! Values are stored as raw JSON text. Parsing happens in the store, so a
//! corrupt payload is readable here and rejected one layer up.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: once `set()` returns
//! the payload survives power loss on the terminal.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for parked order lists: key = storage key, value = JSON payload
const PARKED_ORDERS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("parked_orders");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Durable string key-value slot store
///
/// Implementations must be safe to share between the caller thread and the
/// expiry sweeper task.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw payload stored under `key`
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the payload stored under `key`
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// All keys currently holding a payload
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// Key-value store backed by redb
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").field("db", &"<redb::Database>").finish()
    }
}

impl RedbStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(db)
    }

    /// Open an in-memory database (tests, ephemeral terminals)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(db)
    }

    fn init_tables(db: Database) -> StorageResult<Self> {
        // 读事务打开不存在的表会报错，启动时先建表
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PARKED_ORDERS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PARKED_ORDERS_TABLE)?;
        Ok(table.get(key)?.map(|guard| guard.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PARKED_ORDERS_TABLE)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PARKED_ORDERS_TABLE)?;

        let mut keys = Vec::new();
        for result in table.iter()? {
            let (key, _) = result?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}
