//! In-memory reference implementation of the storage contracts.
//!
//! Backed by `Vec`/`BTreeMap`/`HashMap` as the module doc promises: no
//! page cache, no WAL, no undo log. Good enough to drive this workspace's
//! own integration tests and demos against a real `Catalog`/`Table`
//! implementation without depending on a production storage engine.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use oxide_sql_core::ast::IsolationLevel;
use oxide_sql_types::{Error, Row, RowId, Schema, Value};

use super::{
    Catalog, ForeignKeyManager, Index, LockMode, NamedLockManager, PrivilegeStore, ReadView,
    RecordLockManager, RoutineKind, RowStream, Table, Transaction, TransactionManager, TxId, WaitPolicy,
};

#[derive(Debug)]
struct StoredRow {
    values: Vec<Value>,
    creator: TxId,
    deleted: bool,
}

/// A `Vec`-backed table: row slots indexed by `RowId`, tombstoned on
/// delete rather than compacted (compaction is `optimize()`'s job).
pub struct MemTable {
    schema: RwLock<Arc<Schema>>,
    rows: RwLock<BTreeMap<u64, StoredRow>>,
    next_row_id: AtomicU64,
    next_auto_increment: AtomicU64,
}

impl MemTable {
    #[must_use]
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema: RwLock::new(schema),
            rows: RwLock::new(BTreeMap::new()),
            next_row_id: AtomicU64::new(1),
            next_auto_increment: AtomicU64::new(1),
        }
    }
}

impl Table for MemTable {
    fn schema(&self) -> Arc<Schema> {
        self.schema.read().unwrap().clone()
    }

    fn scan(&self, read_view: Option<&Arc<dyn ReadView>>) -> RowStream<'_> {
        let schema = self.schema();
        let rows = self.rows.read().unwrap();
        let snapshot: Vec<Row> = rows
            .iter()
            .filter(|(_, r)| !r.deleted)
            .filter(|(_, r)| read_view.map_or(true, |rv| rv.is_visible(r.creator)))
            .map(|(id, r)| Row::new(schema.clone(), r.values.clone(), RowId(*id)))
            .collect();
        Box::new(snapshot.into_iter().map(Ok))
    }

    fn get_row_by_slot(&self, row_id: RowId) -> Result<Option<Row>, Error> {
        let rows = self.rows.read().unwrap();
        Ok(rows
            .get(&row_id.0)
            .filter(|r| !r.deleted)
            .map(|r| Row::new(self.schema(), r.values.clone(), row_id)))
    }

    fn insert_row(&self, values: Vec<Value>, creator: TxId) -> Result<RowId, Error> {
        let id = self.next_row_id.fetch_add(1, Ordering::SeqCst);
        self.rows.write().unwrap().insert(
            id,
            StoredRow {
                values,
                creator,
                deleted: false,
            },
        );
        Ok(RowId(id))
    }

    fn update_row(&self, row_id: RowId, new_values: Vec<Value>) -> Result<(), Error> {
        let mut rows = self.rows.write().unwrap();
        let row = rows
            .get_mut(&row_id.0)
            .ok_or_else(|| Error::Internal(format!("update_row: no such row-id {}", row_id.0)))?;
        row.values = new_values;
        Ok(())
    }

    fn delete_row(&self, row_id: RowId) -> Result<(), Error> {
        let mut rows = self.rows.write().unwrap();
        let row = rows
            .get_mut(&row_id.0)
            .ok_or_else(|| Error::Internal(format!("delete_row: no such row-id {}", row_id.0)))?;
        row.deleted = true;
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    fn optimize(&self) -> Result<(), Error> {
        self.rows.write().unwrap().retain(|_, r| !r.deleted);
        Ok(())
    }

    fn next_auto_increment(&self) -> u64 {
        self.next_auto_increment.fetch_add(1, Ordering::SeqCst)
    }

    fn advance_auto_increment(&self, at_least: u64) {
        self.next_auto_increment.fetch_max(at_least, Ordering::SeqCst);
    }
}

/// A `HashMap`-backed index: not a real B-tree, but satisfies the
/// `lookup`/`range_scan`/`scan_all` contract via a `BTreeMap` keyed by the
/// value's textual form (sortable for range scans, exact for point
/// lookups).
pub struct MemIndex {
    entries: RwLock<BTreeMap<String, Vec<RowId>>>,
}

impl MemIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn insert(&self, key: &Value, row_id: RowId) {
        self.entries
            .write()
            .unwrap()
            .entry(key.to_text())
            .or_default()
            .push(row_id);
    }

    pub fn remove(&self, key: &Value, row_id: RowId) {
        if let Some(ids) = self.entries.write().unwrap().get_mut(&key.to_text()) {
            ids.retain(|id| *id != row_id);
        }
    }
}

impl Default for MemIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl Index for MemIndex {
    fn lookup(&self, key: &Value) -> Vec<RowId> {
        self.entries
            .read()
            .unwrap()
            .get(&key.to_text())
            .cloned()
            .unwrap_or_default()
    }

    fn range_scan(&self, lo: Option<&Value>, hi: Option<&Value>) -> Vec<RowId> {
        let entries = self.entries.read().unwrap();
        let lo_key = lo.map(Value::to_text);
        let hi_key = hi.map(Value::to_text);
        entries
            .iter()
            .filter(|(k, _)| lo_key.as_ref().map_or(true, |l| *k >= l))
            .filter(|(k, _)| hi_key.as_ref().map_or(true, |h| *k <= h))
            .flat_map(|(_, ids)| ids.clone())
            .collect()
    }

    fn scan_all(&self) -> Vec<RowId> {
        self.entries.read().unwrap().values().flatten().copied().collect()
    }
}

struct MemTransaction {
    id: TxId,
    isolation: Mutex<IsolationLevel>,
    read_only: Mutex<bool>,
}

impl Transaction for MemTransaction {
    fn id(&self) -> TxId {
        self.id
    }

    fn isolation_level(&self) -> IsolationLevel {
        *self.isolation.lock().unwrap()
    }

    fn set_isolation_level(&self, level: IsolationLevel) {
        *self.isolation.lock().unwrap() = level;
    }

    fn is_read_only(&self) -> bool {
        *self.read_only.lock().unwrap()
    }

    fn set_read_only(&self, read_only: bool) {
        *self.read_only.lock().unwrap() = read_only;
    }
}

/// A read-view that admits every transaction committed before it was
/// taken, keyed by a monotonic commit counter rather than wall-clock time.
struct SnapshotReadView {
    committed_before: u64,
    committed_at: Arc<RwLock<HashMap<u64, u64>>>,
}

impl ReadView for SnapshotReadView {
    fn is_visible(&self, creator: TxId) -> bool {
        match self.committed_at.read().unwrap().get(&creator.0) {
            Some(seq) => *seq <= self.committed_before,
            None => false,
        }
    }
}

/// Process-wide transaction manager: hands out monotonically increasing
/// transaction ids and a monotonic commit sequence number used to build
/// snapshot read-views.
pub struct MemTransactionManager {
    next_tx_id: AtomicU64,
    commit_seq: AtomicU64,
    committed_at: Arc<RwLock<HashMap<u64, u64>>>,
}

impl MemTransactionManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_tx_id: AtomicU64::new(1),
            commit_seq: AtomicU64::new(0),
            committed_at: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemTransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionManager for MemTransactionManager {
    fn begin(&self, isolation: IsolationLevel, read_only: bool) -> Result<Arc<dyn Transaction>, Error> {
        let id = TxId(self.next_tx_id.fetch_add(1, Ordering::SeqCst));
        Ok(Arc::new(MemTransaction {
            id,
            isolation: Mutex::new(isolation),
            read_only: Mutex::new(read_only),
        }))
    }

    fn commit(&self, tx: &Arc<dyn Transaction>) -> Result<(), Error> {
        let seq = self.commit_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.committed_at.write().unwrap().insert(tx.id().0, seq);
        Ok(())
    }

    fn rollback(&self, _tx: &Arc<dyn Transaction>) -> Result<(), Error> {
        Ok(())
    }

    fn get_or_create_read_view(&self, tx: &Arc<dyn Transaction>) -> Result<Arc<dyn ReadView>, Error> {
        // Under REPEATABLE READ the same view persists for the whole
        // transaction; callers that want per-statement freshness (READ
        // COMMITTED) simply call this again each statement.
        let _ = tx;
        Ok(Arc::new(SnapshotReadView {
            committed_before: self.commit_seq.load(Ordering::SeqCst),
            committed_at: self.committed_at.clone(),
        }))
    }
}

#[derive(Default)]
struct HeldLock {
    shared: Vec<TxId>,
    exclusive: Option<TxId>,
}

/// A `Mutex<HashMap>`-backed lock table keyed by `(db, table, index, key)`.
/// Blocking wait is implemented by polling with a short sleep rather than
/// a condvar-per-key wait queue — adequate for this reference backend's
/// test-scale concurrency, not a production lock manager.
pub struct MemLockManager {
    locks: Mutex<HashMap<String, HeldLock>>,
}

impl MemLockManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn key(db: &str, table: &str, index: &str, key: &str) -> String {
        format!("{db}\u{1}{table}\u{1}{index}\u{1}{key}")
    }
}

impl Default for MemLockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordLockManager for MemLockManager {
    fn would_conflict(&self, db: &str, table: &str, index: &str, key: &str, tx: TxId, mode: LockMode) -> bool {
        let locks = self.locks.lock().unwrap();
        let Some(held) = locks.get(&Self::key(db, table, index, key)) else {
            return false;
        };
        match mode {
            LockMode::Shared => held.exclusive.is_some_and(|holder| holder != tx),
            LockMode::Exclusive => {
                held.exclusive.is_some_and(|holder| holder != tx)
                    || held.shared.iter().any(|holder| *holder != tx)
            }
        }
    }

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
    ) -> Result<(), Error> {
        let started = Instant::now();
        loop {
            if !self.would_conflict(db, table, index, key, tx, mode) {
                let mut locks = self.locks.lock().unwrap();
                let held = locks.entry(Self::key(db, table, index, key)).or_default();
                match mode {
                    LockMode::Shared => {
                        if !held.shared.contains(&tx) {
                            held.shared.push(tx);
                        }
                    }
                    LockMode::Exclusive => held.exclusive = Some(tx),
                }
                return Ok(());
            }
            match wait_policy {
                WaitPolicy::NoWait => return Err(Error::LockConflict),
                WaitPolicy::SkipLocked => return Err(Error::LockConflict),
                WaitPolicy::Wait => {
                    if started.elapsed() >= timeout {
                        return Err(Error::LockTimeout);
                    }
                    std::thread::sleep(Duration::from_millis(5));
                }
            }
        }
    }

    fn release_all(&self, tx: TxId) {
        let mut locks = self.locks.lock().unwrap();
        for held in locks.values_mut() {
            held.shared.retain(|holder| *holder != tx);
            if held.exclusive == Some(tx) {
                held.exclusive = None;
            }
        }
        locks.retain(|_, h| h.exclusive.is_some() || !h.shared.is_empty());
    }
}

/// Process-wide FK registry: just enough bookkeeping for the driver's
/// cascade walk (`foreign_keys_referencing`) — constraint *definitions*
/// (columns, referential actions) live on the catalog's table schema.
#[derive(Default)]
pub struct MemForeignKeyManager {
    by_parent: Mutex<HashMap<String, Vec<(String, String)>>>,
}

impl MemForeignKeyManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ForeignKeyManager for MemForeignKeyManager {
    fn add_foreign_key(&self, child_table: &str, fk_name: &str, parent_table: &str) {
        self.by_parent
            .lock()
            .unwrap()
            .entry(parent_table.to_string())
            .or_default()
            .push((child_table.to_string(), fk_name.to_string()));
    }

    fn drop_foreign_key(&self, child_table: &str, fk_name: &str) {
        let mut map = self.by_parent.lock().unwrap();
        for entries in map.values_mut() {
            entries.retain(|(child, name)| !(child == child_table && name == fk_name));
        }
    }

    fn foreign_keys_referencing(&self, _db: &str, table: &str) -> Vec<String> {
        self.by_parent
            .lock()
            .unwrap()
            .get(table)
            .into_iter()
            .flatten()
            .map(|(child, _)| child.clone())
            .collect()
    }
}

/// Root hash, password- and WAL-free: stores catalogs and tables in
/// memory, scoped by database name.
pub struct MemCatalog {
    databases: RwLock<HashMap<String, HashMap<String, Arc<MemTable>>>>,
    views: RwLock<HashMap<(String, String), String>>,
    routines: RwLock<HashMap<(String, RoutineKind, String), String>>,
    foreign_keys: RwLock<HashMap<(String, String), Vec<String>>>,
}

impl MemCatalog {
    #[must_use]
    pub fn new() -> Self {
        let mut databases = HashMap::new();
        databases.insert("default".to_string(), HashMap::new());
        Self {
            databases: RwLock::new(databases),
            views: RwLock::new(HashMap::new()),
            routines: RwLock::new(HashMap::new()),
            foreign_keys: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for MemCatalog {
    fn database_exists(&self, name: &str) -> bool {
        self.databases.read().unwrap().contains_key(name)
    }

    fn create_database(&self, name: &str) -> Result<(), Error> {
        let mut dbs = self.databases.write().unwrap();
        if dbs.contains_key(name) {
            return Err(Error::Internal(format!("database {name} already exists")));
        }
        dbs.insert(name.to_string(), HashMap::new());
        Ok(())
    }

    fn drop_database(&self, name: &str) -> Result<(), Error> {
        self.databases
            .write()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::DatabaseNotFound(name.to_string()))
    }

    fn list_tables(&self, database: &str) -> Vec<String> {
        self.databases
            .read()
            .unwrap()
            .get(database)
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn list_views(&self, _database: &str) -> Vec<String> {
        Vec::new()
    }

    fn get_table(&self, database: &str, table: &str) -> Result<Arc<dyn Table>, Error> {
        let dbs = self.databases.read().unwrap();
        let tables = dbs.get(database).ok_or_else(|| Error::DatabaseNotFound(database.to_string()))?;
        tables
            .get(table)
            .cloned()
            .map(|t| t as Arc<dyn Table>)
            .ok_or_else(|| Error::TableNotFound(table.to_string()))
    }

    fn get_table_schema(&self, database: &str, table: &str) -> Result<Arc<Schema>, Error> {
        self.get_table(database, table).map(|t| t.schema())
    }

    fn create_table(&self, database: &str, table: &str, schema: Arc<Schema>) -> Result<(), Error> {
        let mut dbs = self.databases.write().unwrap();
        let tables = dbs.get_mut(database).ok_or_else(|| Error::DatabaseNotFound(database.to_string()))?;
        if tables.contains_key(table) {
            return Err(Error::Internal(format!("table {table} already exists")));
        }
        tables.insert(table.to_string(), Arc::new(MemTable::new(schema)));
        Ok(())
    }

    fn drop_table(&self, database: &str, table: &str) -> Result<(), Error> {
        let mut dbs = self.databases.write().unwrap();
        let tables = dbs.get_mut(database).ok_or_else(|| Error::DatabaseNotFound(database.to_string()))?;
        tables
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| Error::TableNotFound(table.to_string()))
    }

    fn update_table_schema(&self, database: &str, table: &str, schema: Arc<Schema>) -> Result<(), Error> {
        let dbs = self.databases.read().unwrap();
        let tables = dbs.get(database).ok_or_else(|| Error::DatabaseNotFound(database.to_string()))?;
        let t = tables.get(table).ok_or_else(|| Error::TableNotFound(table.to_string()))?;
        *t.schema.write().unwrap() = schema;
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    fn save_catalog(&self) -> Result<(), Error> {
        Ok(())
    }

    fn get_view(&self, database: &str, name: &str) -> Result<Option<String>, Error> {
        Ok(self.views.read().unwrap().get(&(database.to_string(), name.to_string())).cloned())
    }

    fn create_view(&self, database: &str, name: &str, select_source: String) -> Result<(), Error> {
        self.views.write().unwrap().insert((database.to_string(), name.to_string()), select_source);
        Ok(())
    }

    fn drop_view(&self, database: &str, name: &str) -> Result<(), Error> {
        self.views
            .write()
            .unwrap()
            .remove(&(database.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    fn get_routine(&self, database: &str, kind: RoutineKind, name: &str) -> Result<Option<String>, Error> {
        Ok(self
            .routines
            .read()
            .unwrap()
            .get(&(database.to_string(), kind, name.to_string()))
            .cloned())
    }

    fn add_routine(&self, database: &str, kind: RoutineKind, name: &str, source: String) -> Result<(), Error> {
        self.routines
            .write()
            .unwrap()
            .insert((database.to_string(), kind, name.to_string()), source);
        Ok(())
    }

    fn remove_routine(&self, database: &str, kind: RoutineKind, name: &str) -> Result<(), Error> {
        self.routines
            .write()
            .unwrap()
            .remove(&(database.to_string(), kind, name.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::Internal(format!("no such routine {name}")))
    }

    fn list_routines(&self, database: &str, kind: RoutineKind) -> Vec<String> {
        self.routines
            .read()
            .unwrap()
            .keys()
            .filter(|(db, k, _)| db == database && *k == kind)
            .map(|(_, _, name)| name.clone())
            .collect()
    }

    fn has_foreign_key(&self, database: &str, table: &str, fk_name: &str) -> bool {
        self.foreign_keys
            .read()
            .unwrap()
            .get(&(database.to_string(), table.to_string()))
            .is_some_and(|names| names.iter().any(|n| n == fk_name))
    }

    fn record_foreign_key(&self, database: &str, table: &str, fk_name: &str) {
        self.foreign_keys
            .write()
            .unwrap()
            .entry((database.to_string(), table.to_string()))
            .or_default()
            .push(fk_name.to_string());
    }

    fn forget_foreign_key(&self, database: &str, table: &str, fk_name: &str) {
        if let Some(names) = self.foreign_keys.write().unwrap().get_mut(&(database.to_string(), table.to_string())) {
            names.retain(|n| n != fk_name);
        }
    }
}

/// Process-wide privilege store; every grant is table/database-scoped or
/// global (`database = None`).
#[derive(Default)]
pub struct MemPrivilegeStore {
    grants: Mutex<HashMap<(String, String), Vec<(String, Option<String>, Option<String>)>>>,
}

impl MemPrivilegeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrivilegeStore for MemPrivilegeStore {
    fn has_privilege(&self, user: &str, host: &str, privilege: &str, database: Option<&str>, table: Option<&str>) -> bool {
        let grants = self.grants.lock().unwrap();
        let Some(entries) = grants.get(&(user.to_string(), host.to_string())) else {
            return false;
        };
        entries.iter().any(|(p, db, tbl)| {
            p == privilege
                && (db.is_none() || db.as_deref() == database)
                && (tbl.is_none() || tbl.as_deref() == table)
        })
    }

    fn grant(&self, user: &str, host: &str, privilege: &str, database: Option<&str>, table: Option<&str>) {
        self.grants
            .lock()
            .unwrap()
            .entry((user.to_string(), host.to_string()))
            .or_default()
            .push((privilege.to_string(), database.map(String::from), table.map(String::from)));
    }

    fn revoke(&self, user: &str, host: &str, privilege: &str, database: Option<&str>, table: Option<&str>) {
        if let Some(entries) = self.grants.lock().unwrap().get_mut(&(user.to_string(), host.to_string())) {
            entries.retain(|(p, db, tbl)| {
                !(p == privilege && db.as_deref() == database && tbl.as_deref() == table)
            });
        }
    }
}

struct NamedLock {
    owner: Option<TxId>,
}

/// Process-wide `GET_LOCK`/`RELEASE_LOCK` registry.
#[derive(Default)]
pub struct MemNamedLockManager {
    locks: Mutex<HashMap<String, NamedLock>>,
}

impl MemNamedLockManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NamedLockManager for MemNamedLockManager {
    fn get_lock(&self, name: &str, owner: TxId, timeout: Duration) -> Result<bool, Error> {
        let started = Instant::now();
        loop {
            {
                let mut locks = self.locks.lock().unwrap();
                let entry = locks.entry(name.to_string()).or_insert(NamedLock { owner: None });
                if entry.owner.is_none() || entry.owner == Some(owner) {
                    entry.owner = Some(owner);
                    return Ok(true);
                }
            }
            if started.elapsed() >= timeout {
                return Ok(false);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn release_lock(&self, name: &str, owner: TxId) -> bool {
        let mut locks = self.locks.lock().unwrap();
        match locks.get_mut(name) {
            Some(lock) if lock.owner == Some(owner) => {
                lock.owner = None;
                true
            }
            _ => false,
        }
    }

    fn is_free_lock(&self, name: &str) -> bool {
        self.locks.lock().unwrap().get(name).map_or(true, |l| l.owner.is_none())
    }

    fn release_all_locks(&self, owner: TxId) {
        for lock in self.locks.lock().unwrap().values_mut() {
            if lock.owner == Some(owner) {
                lock.owner = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_sql_types::{ColumnDef, ColumnType};

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![ColumnDef::new("id", ColumnType::Int).primary()]))
    }

    #[test]
    fn insert_then_scan_round_trips() {
        let table = MemTable::new(schema());
        table.insert_row(vec![Value::Int(1)], TxId(1)).unwrap();
        table.insert_row(vec![Value::Int(2)], TxId(1)).unwrap();
        let rows: Vec<_> = table.scan(None).collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn delete_tombstones_row() {
        let table = MemTable::new(schema());
        let id = table.insert_row(vec![Value::Int(1)], TxId(1)).unwrap();
        table.delete_row(id).unwrap();
        let rows: Vec<_> = table.scan(None).collect::<Result<_, _>>().unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn exclusive_lock_blocks_conflicting_acquire() {
        let mgr = MemLockManager::new();
        mgr.acquire_lock("d", "t", "PRIMARY", "1", TxId(1), LockMode::Exclusive, WaitPolicy::Wait, Duration::from_secs(1))
            .unwrap();
        let err = mgr
            .acquire_lock("d", "t", "PRIMARY", "1", TxId(2), LockMode::Exclusive, WaitPolicy::NoWait, Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, Error::LockConflict));
        mgr.release_all(TxId(1));
        mgr.acquire_lock("d", "t", "PRIMARY", "1", TxId(2), LockMode::Exclusive, WaitPolicy::NoWait, Duration::from_secs(1))
            .unwrap();
    }

    #[test]
    fn view_and_routine_round_trip_through_catalog() {
        let catalog = MemCatalog::new();
        catalog.create_view("default", "v_active", "SELECT * FROM t WHERE active = 1".into()).unwrap();
        assert_eq!(
            catalog.get_view("default", "v_active").unwrap(),
            Some("SELECT * FROM t WHERE active = 1".to_string())
        );
        catalog.drop_view("default", "v_active").unwrap();
        assert_eq!(catalog.get_view("default", "v_active").unwrap(), None);

        catalog
            .add_routine("default", RoutineKind::Procedure, "bump", "CREATE PROCEDURE bump() ...".into())
            .unwrap();
        assert_eq!(catalog.list_routines("default", RoutineKind::Procedure), vec!["bump".to_string()]);
        assert!(catalog.get_routine("default", RoutineKind::Function, "bump").unwrap().is_none());

        catalog.record_foreign_key("default", "orders", "fk_customer");
        assert!(catalog.has_foreign_key("default", "orders", "fk_customer"));
        catalog.forget_foreign_key("default", "orders", "fk_customer");
        assert!(!catalog.has_foreign_key("default", "orders", "fk_customer"));
    }

    #[test]
    fn read_view_only_sees_committed_before_snapshot() {
        let tm = MemTransactionManager::new();
        let tx1 = tm.begin(IsolationLevel::RepeatableRead, false).unwrap();
        tm.commit(&tx1).unwrap();
        let view = tm.get_or_create_read_view(&tx1).unwrap();
        assert!(view.is_visible(tx1.id()));
        let tx2 = tm.begin(IsolationLevel::RepeatableRead, false).unwrap();
        assert!(!view.is_visible(tx2.id()));
    }
}
