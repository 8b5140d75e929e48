//! End-to-end scenarios driven entirely through `Session::execute`, backed
//! by the in-memory reference storage so these tests exercise statement
//! dispatch, the operator builder and constraint enforcement together
//! rather than any one module in isolation.

use std::sync::{Arc, Mutex};

use oxide_sql_driver::{ExecResult, Registry, Session};
use oxide_sql_engine::storage::mem::{MemCatalog, MemLockManager, MemTransactionManager};
use oxide_sql_types::Value;

fn new_session() -> Session {
    let catalog = Arc::new(MemCatalog::new());
    let txn_manager = Arc::new(MemTransactionManager::new());
    let lock_manager = Arc::new(MemLockManager::new());
    Session::new(catalog, Arc::new(Mutex::new(Registry::new())), txn_manager, Some(lock_manager), "default")
}

fn exec(session: &mut Session, sql: &str) -> ExecResult {
    session.execute(sql).unwrap_or_else(|e| panic!("{sql}: {e}"))
}

fn rows_of(result: ExecResult) -> Vec<Vec<Value>> {
    match result {
        ExecResult::Query { rows, .. } => rows.into_iter().map(|r| r.values).collect(),
        other => panic!("expected a row set, got {other:?}"),
    }
}

#[test]
fn insert_select_round_trips_with_auto_increment() {
    let mut session = new_session();
    exec(&mut session, "CREATE TABLE users (id INT PRIMARY KEY AUTO_INCREMENT, name VARCHAR(50) NOT NULL)");
    let inserted = exec(&mut session, "INSERT INTO users (name) VALUES ('Alice'), ('Bob')");
    match inserted {
        ExecResult::Modified { affected_rows, last_insert_id } => {
            assert_eq!(affected_rows, 2);
            assert_eq!(last_insert_id, Some(1));
        }
        other => panic!("expected Modified, got {other:?}"),
    }

    let rows = rows_of(exec(&mut session, "SELECT id, name FROM users ORDER BY id"));
    assert_eq!(rows, vec![vec![Value::BigInt(1), Value::Text("Alice".into())], vec![Value::BigInt(2), Value::Text("Bob".into())]]);
}

#[test]
fn not_null_violation_is_rejected() {
    let mut session = new_session();
    exec(&mut session, "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(50) NOT NULL)");
    let err = session.execute("INSERT INTO users (id) VALUES (1)").unwrap_err();
    assert!(err.to_string().to_lowercase().contains("name"));
}

#[test]
fn update_then_delete_affect_matching_rows_only() {
    let mut session = new_session();
    exec(&mut session, "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(50), active BOOLEAN)");
    exec(&mut session, "INSERT INTO users (id, name, active) VALUES (1, 'Alice', true), (2, 'Bob', false)");

    let updated = exec(&mut session, "UPDATE users SET active = true WHERE id = 2");
    assert!(matches!(updated, ExecResult::Modified { affected_rows: 1, .. }));

    let deleted = exec(&mut session, "DELETE FROM users WHERE active = false");
    assert!(matches!(deleted, ExecResult::Modified { affected_rows: 0, .. }));

    let rows = rows_of(exec(&mut session, "SELECT id FROM users ORDER BY id"));
    assert_eq!(rows, vec![vec![Value::BigInt(1)], vec![Value::BigInt(2)]]);
}

#[test]
fn foreign_key_cascade_delete_removes_children() {
    let mut session = new_session();
    exec(&mut session, "CREATE TABLE customers (id INT PRIMARY KEY)");
    exec(
        &mut session,
        "CREATE TABLE orders (id INT PRIMARY KEY, customer_id INT, \
         FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE)",
    );
    exec(&mut session, "INSERT INTO customers (id) VALUES (1), (2)");
    exec(&mut session, "INSERT INTO orders (id, customer_id) VALUES (10, 1), (11, 1), (12, 2)");

    exec(&mut session, "DELETE FROM customers WHERE id = 1");

    let remaining = rows_of(exec(&mut session, "SELECT id FROM orders ORDER BY id"));
    assert_eq!(remaining, vec![vec![Value::BigInt(12)]]);
}

#[test]
fn foreign_key_insert_rejects_unknown_parent() {
    let mut session = new_session();
    exec(&mut session, "CREATE TABLE customers (id INT PRIMARY KEY)");
    exec(
        &mut session,
        "CREATE TABLE orders (id INT PRIMARY KEY, customer_id INT, FOREIGN KEY (customer_id) REFERENCES customers(id))",
    );
    let err = session.execute("INSERT INTO orders (id, customer_id) VALUES (1, 99)").unwrap_err();
    assert!(err.to_string().to_lowercase().contains("foreign"));
}

#[test]
fn before_insert_trigger_rewrites_new_row() {
    let mut session = new_session();
    exec(&mut session, "CREATE TABLE accounts (id INT PRIMARY KEY, balance INT)");
    exec(
        &mut session,
        "CREATE TRIGGER floor_balance BEFORE INSERT ON accounts \
         FOR EACH ROW BEGIN IF NEW.balance < 0 THEN SET NEW.balance = 0; END IF; END",
    );
    exec(&mut session, "INSERT INTO accounts (id, balance) VALUES (1, -50)");

    let rows = rows_of(exec(&mut session, "SELECT balance FROM accounts WHERE id = 1"));
    assert_eq!(rows, vec![vec![Value::BigInt(0)]]);
}

#[test]
fn stored_procedure_out_param_and_nested_call_write_back() {
    let mut session = new_session();
    exec(&mut session, "CREATE TABLE counters (id INT PRIMARY KEY, hits INT)");
    exec(&mut session, "INSERT INTO counters (id, hits) VALUES (1, 0)");
    exec(
        &mut session,
        "CREATE PROCEDURE bump_counter(IN target INT, OUT new_hits INT) \
         BEGIN UPDATE counters SET hits = hits + 1 WHERE id = target; \
         SET new_hits = (SELECT hits FROM counters WHERE id = target); END",
    );
    exec(
        &mut session,
        "CREATE PROCEDURE bump_twice(IN target INT) \
         BEGIN DECLARE ignored INT; CALL bump_counter(target, ignored); CALL bump_counter(target, ignored); END",
    );

    exec(&mut session, "CALL bump_twice(1)");

    let rows = rows_of(exec(&mut session, "SELECT hits FROM counters WHERE id = 1"));
    assert_eq!(rows, vec![vec![Value::BigInt(2)]]);
}

#[test]
fn explicit_transaction_rolls_back_all_statements_together() {
    let mut session = new_session();
    exec(&mut session, "CREATE TABLE ledger (id INT PRIMARY KEY, amount INT)");
    exec(&mut session, "BEGIN");
    exec(&mut session, "INSERT INTO ledger (id, amount) VALUES (1, 100)");
    exec(&mut session, "INSERT INTO ledger (id, amount) VALUES (2, 200)");
    exec(&mut session, "ROLLBACK");

    let rows = rows_of(exec(&mut session, "SELECT id FROM ledger"));
    assert!(rows.is_empty());
}

#[test]
fn committed_transaction_is_visible_afterward() {
    let mut session = new_session();
    exec(&mut session, "CREATE TABLE ledger (id INT PRIMARY KEY, amount INT)");
    exec(&mut session, "BEGIN");
    exec(&mut session, "INSERT INTO ledger (id, amount) VALUES (1, 100)");
    exec(&mut session, "COMMIT");

    let rows = rows_of(exec(&mut session, "SELECT id, amount FROM ledger"));
    assert_eq!(rows, vec![vec![Value::BigInt(1), Value::BigInt(100)]]);
}

#[test]
fn show_tables_and_describe_report_schema() {
    let mut session = new_session();
    exec(&mut session, "CREATE TABLE widgets (id INT PRIMARY KEY, label VARCHAR(20))");

    let tables = rows_of(exec(&mut session, "SHOW TABLES"));
    assert_eq!(tables, vec![vec![Value::Text("widgets".into())]]);

    let described = rows_of(exec(&mut session, "DESCRIBE widgets"));
    assert_eq!(described.len(), 2);
}
