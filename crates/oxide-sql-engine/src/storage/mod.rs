//! Storage/transaction/locking *contracts*.
//!
//! The spec treats the page cache, B-tree/hash index internals, heap
//! storage, WAL and undo log as external collaborators reachable only
//! through these traits. [`mem`] provides one reference implementation
//! backed by `Vec`/`BTreeMap`, used by this workspace's own tests and
//! demos — it does not claim to be a production page store.

pub mod mem;

use std::sync::Arc;
use std::time::Duration;

use oxide_sql_core::ast::IsolationLevel;
use oxide_sql_types::{Error, Row, RowId, Schema, Value};

/// Lock mode requested by a scan or DML statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// How a lock request behaves on conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    #[default]
    Wait,
    NoWait,
    SkipLocked,
}

/// An opaque transaction identifier, unique for the lifetime of the
/// transaction manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxId(pub u64);

/// A live transaction handle.
pub trait Transaction: Send + Sync {
    fn id(&self) -> TxId;
    fn isolation_level(&self) -> IsolationLevel;
    fn set_isolation_level(&self, level: IsolationLevel);
    fn is_read_only(&self) -> bool;
    fn set_read_only(&self, read_only: bool);
}

/// Resolves row-version visibility for one statement or transaction
/// snapshot.
pub trait ReadView: Send + Sync {
    /// Whether a row created by `creator` is visible under this snapshot.
    fn is_visible(&self, creator: TxId) -> bool;
}

/// `begin`/`commit`/`rollback` plus read-view creation.
pub trait TransactionManager: Send + Sync {
    fn begin(&self, isolation: IsolationLevel, read_only: bool) -> Result<Arc<dyn Transaction>, Error>;
    fn commit(&self, tx: &Arc<dyn Transaction>) -> Result<(), Error>;
    fn rollback(&self, tx: &Arc<dyn Transaction>) -> Result<(), Error>;
    fn get_or_create_read_view(&self, tx: &Arc<dyn Transaction>) -> Result<Arc<dyn ReadView>, Error>;
}

/// Row-level lock manager, indexed by (database, table, index name,
/// composite key).
pub trait RecordLockManager: Send + Sync {
    fn would_conflict(&self, db: &str, table: &str, index: &str, key: &str, tx: TxId, mode: LockMode) -> bool;
    fn acquire_lock(
        &self,
        db: &str,
        table: &str,
        index: &str,
        key: &str,
        tx: TxId,
        mode: LockMode,
        wait_policy: WaitPolicy,
        timeout: Duration,
    ) -> Result<(), Error>;
    fn release_all(&self, tx: TxId);
}

/// Referential-action enforcement, driven by the statement driver with
/// row-lookup/child-existence callbacks it supplies.
pub trait ForeignKeyManager: Send + Sync {
    fn add_foreign_key(&self, child_table: &str, fk_name: &str, parent_table: &str);
    fn drop_foreign_key(&self, child_table: &str, fk_name: &str);
    fn foreign_keys_referencing(&self, db: &str, table: &str) -> Vec<String>;
}

/// `has_privilege`/`grant`/`revoke`.
pub trait PrivilegeStore: Send + Sync {
    fn has_privilege(&self, user: &str, host: &str, privilege: &str, database: Option<&str>, table: Option<&str>) -> bool;
    fn grant(&self, user: &str, host: &str, privilege: &str, database: Option<&str>, table: Option<&str>);
    fn revoke(&self, user: &str, host: &str, privilege: &str, database: Option<&str>, table: Option<&str>);
}

/// Process-wide named-lock registry backing `GET_LOCK`/`RELEASE_LOCK`.
pub trait NamedLockManager: Send + Sync {
    fn get_lock(&self, name: &str, owner: TxId, timeout: Duration) -> Result<bool, Error>;
    fn release_lock(&self, name: &str, owner: TxId) -> bool;
    fn is_free_lock(&self, name: &str) -> bool;
    fn release_all_locks(&self, owner: TxId);
}

/// A streamed sequence of rows, as returned by `Table::scan`/`Index`
/// lookups. Implementors may back this with an in-memory `Vec` iterator or
/// a real cursor over a page store.
pub type RowStream<'a> = Box<dyn Iterator<Item = Result<Row, Error>> + 'a>;

/// A handle to one table's storage.
pub trait Table: Send + Sync {
    fn schema(&self) -> Arc<Schema>;
    fn scan(&self, read_view: Option<&Arc<dyn ReadView>>) -> RowStream<'_>;
    fn get_row_by_slot(&self, row_id: RowId) -> Result<Option<Row>, Error>;
    fn insert_row(&self, values: Vec<Value>, creator: TxId) -> Result<RowId, Error>;
    fn update_row(&self, row_id: RowId, new_values: Vec<Value>) -> Result<(), Error>;
    fn delete_row(&self, row_id: RowId) -> Result<(), Error>;
    fn flush(&self) -> Result<(), Error>;
    fn optimize(&self) -> Result<(), Error>;
    fn next_auto_increment(&self) -> u64;
    fn advance_auto_increment(&self, at_least: u64);
}

/// A secondary (or primary) index over one table.
pub trait Index: Send + Sync {
    fn lookup(&self, key: &Value) -> Vec<RowId>;
    fn range_scan(&self, lo: Option<&Value>, hi: Option<&Value>) -> Vec<RowId>;
    fn scan_all(&self) -> Vec<RowId>;
}

/// The four kinds of named routine a database stores alongside tables and
/// views. `Function` and `Procedure` are kept distinct because MySQL
/// resolves `CALL foo()` and `SELECT foo()` against separate namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineKind {
    Procedure,
    Function,
    Trigger,
    Event,
}

/// Database/table/view/routine metadata store.
///
/// Views, procedures, functions, triggers and events are stored as their
/// original `CREATE ...` source text: the catalog is a dumb registry, not
/// a semantic store, so the driver re-parses the definition each time it
/// needs the AST (mirroring how MySQL's `information_schema.ROUTINES`
/// and `VIEWS` keep the body/definition as text).
pub trait Catalog: Send + Sync {
    fn database_exists(&self, name: &str) -> bool;
    fn create_database(&self, name: &str) -> Result<(), Error>;
    fn drop_database(&self, name: &str) -> Result<(), Error>;
    fn list_tables(&self, database: &str) -> Vec<String>;
    fn list_views(&self, database: &str) -> Vec<String>;
    fn get_table(&self, database: &str, table: &str) -> Result<Arc<dyn Table>, Error>;
    fn get_table_schema(&self, database: &str, table: &str) -> Result<Arc<Schema>, Error>;
    fn create_table(&self, database: &str, table: &str, schema: Arc<Schema>) -> Result<(), Error>;
    fn drop_table(&self, database: &str, table: &str) -> Result<(), Error>;
    fn update_table_schema(&self, database: &str, table: &str, schema: Arc<Schema>) -> Result<(), Error>;
    fn flush(&self) -> Result<(), Error>;
    fn save_catalog(&self) -> Result<(), Error>;

    /// Looks up a view's stored `SELECT` source text.
    fn get_view(&self, database: &str, name: &str) -> Result<Option<String>, Error>;
    fn create_view(&self, database: &str, name: &str, select_source: String) -> Result<(), Error>;
    fn drop_view(&self, database: &str, name: &str) -> Result<(), Error>;

    /// Looks up a routine's stored `CREATE ...` source text.
    fn get_routine(&self, database: &str, kind: RoutineKind, name: &str) -> Result<Option<String>, Error>;
    fn add_routine(&self, database: &str, kind: RoutineKind, name: &str, source: String) -> Result<(), Error>;
    fn remove_routine(&self, database: &str, kind: RoutineKind, name: &str) -> Result<(), Error>;
    fn list_routines(&self, database: &str, kind: RoutineKind) -> Vec<String>;

    /// Whether `table` carries a foreign key named `fk_name`. Backs
    /// `ALTER TABLE ... DROP FOREIGN KEY` existence checks; cascade target
    /// lookups for enforcement go through [`ForeignKeyManager`] instead.
    fn has_foreign_key(&self, database: &str, table: &str, fk_name: &str) -> bool;
    fn record_foreign_key(&self, database: &str, table: &str, fk_name: &str);
    fn forget_foreign_key(&self, database: &str, table: &str, fk_name: &str);
}
