//! Per-connection session state and the public SQL entry point.
//!
//! A [`Session`] owns one connection's worth of state — the active
//! database, an optional open transaction, pending `SET TRANSACTION`
//! overrides, and session system variables — while the [`Registry`] and
//! storage [`Catalog`] are shared (behind `Arc`) with every other session
//! on the same catalog, exactly like every connection against one
//! `mysqld` instance sees the same tables and routines.
//!
//! Absent an explicit `BEGIN`, every statement runs under its own
//! throwaway transaction (MySQL's `autocommit=1` default): [`Session::autocommit`]
//! opens one, hands the statement a [`BuildCtx`] built from it, and
//! commits or rolls it back based on the statement's outcome.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use oxide_sql_core::ast::{CallStatement, IsolationLevel, TransactionScope};
use oxide_sql_core::{Parser, Statement};
use oxide_sql_engine::storage::{Catalog, RecordLockManager, RoutineKind, Transaction, TransactionManager};
use oxide_sql_types::{Row, Schema, Value};
use tracing::{debug, instrument};

use crate::builder::{build_select, eval_constant, run_to_rows, BuildCtx};
use crate::ddl;
use crate::dml::{self, MutationResult};
use crate::error::{DriverError, Result};
use crate::procedure::{self, Frame};
use crate::registry::{Registry, TriggerDef};
use crate::show;

/// The outcome of one [`Session::execute`] call.
#[derive(Debug, Clone)]
pub enum ExecResult {
    /// A row set, for `SELECT`/`SHOW`/`DESCRIBE`.
    Query { columns: Arc<Schema>, rows: Vec<Row> },
    /// Rows affected by `INSERT`/`UPDATE`/`DELETE`.
    Modified { affected_rows: u64, last_insert_id: Option<u64> },
    /// A DDL/transaction/session statement that produced no rows.
    Ddl(String),
}

impl From<MutationResult> for ExecResult {
    fn from(result: MutationResult) -> Self {
        Self::Modified { affected_rows: result.affected_rows, last_insert_id: result.last_insert_id }
    }
}

/// One connection's worth of driver state against a shared catalog.
pub struct Session {
    catalog: Arc<dyn Catalog>,
    registry: Arc<Mutex<Registry>>,
    txn_manager: Arc<dyn TransactionManager>,
    lock_manager: Option<Arc<dyn RecordLockManager>>,
    database: String,
    transaction: Option<Arc<dyn Transaction>>,
    next_isolation: Option<IsolationLevel>,
    next_read_only: Option<bool>,
    default_isolation: IsolationLevel,
    lock_timeout: Duration,
    spill_budget_bytes: usize,
    variables: HashMap<String, Value>,
}

impl Session {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        registry: Arc<Mutex<Registry>>,
        txn_manager: Arc<dyn TransactionManager>,
        lock_manager: Option<Arc<dyn RecordLockManager>>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            registry,
            txn_manager,
            lock_manager,
            database: database.into(),
            transaction: None,
            next_isolation: None,
            next_read_only: None,
            default_isolation: IsolationLevel::RepeatableRead,
            lock_timeout: Duration::from_secs(50),
            spill_budget_bytes: 64 * 1024 * 1024,
            variables: HashMap::new(),
        }
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn use_database(&mut self, database: impl Into<String>) {
        self.database = database.into();
    }

    fn registry_snapshot(&self) -> Registry {
        self.registry.lock().expect("registry mutex poisoned").clone()
    }

    /// Parses and executes one SQL statement.
    #[instrument(skip(self, sql), fields(database = %self.database))]
    pub fn execute(&mut self, sql: &str) -> Result<ExecResult> {
        let mut parser = Parser::new(sql);
        let stmt = parser.parse_statement()?;
        debug!(statement = %stmt, "executing statement");
        self.execute_statement(&stmt)
    }

    /// Runs `body` against a [`BuildCtx`] bound to an open transaction,
    /// opening and committing/rolling back a throwaway one first if this
    /// session has no `BEGIN` of its own in progress.
    fn autocommit<T>(&mut self, body: impl FnOnce(&mut Self, &BuildCtx) -> Result<T>) -> Result<T> {
        let owns_tx = self.transaction.is_none();
        if owns_tx {
            let tx = self.txn_manager.begin(self.default_isolation, false).map_err(DriverError::Engine)?;
            self.transaction = Some(tx);
        }
        let tx = self.transaction.clone().expect("transaction set above or by the caller's BEGIN");
        let read_view = self.txn_manager.get_or_create_read_view(&tx).map_err(DriverError::Engine)?;
        let ctx = BuildCtx::new(
            self.catalog.clone(),
            self.database.clone(),
            tx.id(),
            Some(read_view),
            self.lock_manager.clone(),
            self.spill_budget_bytes,
            self.lock_timeout,
        );
        let result = body(self, &ctx);
        if owns_tx {
            let tx = self.transaction.take().expect("autocommit transaction vanished");
            match &result {
                Ok(_) => self.txn_manager.commit(&tx).map_err(DriverError::Engine)?,
                Err(_) => self.txn_manager.rollback(&tx).map_err(DriverError::Engine)?,
            }
        }
        result
    }

    /// Runs a nested statement for effect (a trigger/procedure body's
    /// `Exec(stmt)` leaf, or a nested `CALL`), sharing `stack` so a nested
    /// `CALL`'s `OUT`/`INOUT` parameters write back into the running
    /// procedure's own locals.
    ///
    /// `SELECT`/`INSERT`/`UPDATE`/`DELETE` are dispatched directly against
    /// `ctx` folded with `stack`'s frames (via [`procedure::ctx_with_frames`])
    /// rather than through [`Session::execute_statement`], so embedded SQL
    /// can reference the enclosing procedure/trigger's `DECLARE`d locals
    /// and `OLD`/`NEW` columns by name, and so it shares the caller's
    /// transaction rather than opening a throwaway one of its own. Any
    /// other nested statement kind (there is no legitimate use for DDL or
    /// `BEGIN`/`COMMIT` inside a routine body) falls back to the ordinary
    /// top-level dispatch.
    fn execute_nested(&mut self, stmt: &Statement, stack: &mut Vec<Frame>, ctx: &BuildCtx) -> Result<()> {
        match stmt {
            Statement::Call(call) => self.run_procedure(call, ctx, stack),
            Statement::Select(select) => {
                let framed = procedure::ctx_with_frames(ctx, stack);
                run_to_rows(build_select(&framed, select)?)?;
                Ok(())
            }
            Statement::Insert(insert) => {
                let framed = procedure::ctx_with_frames(ctx, stack);
                let registry = self.registry_snapshot();
                let mut exec = |s: &Statement, st: &mut Vec<Frame>| self.execute_nested(s, st, ctx);
                dml::insert_rows(&framed, &registry, insert, &mut exec).map(|_| ())
            }
            Statement::Update(update) => {
                let framed = procedure::ctx_with_frames(ctx, stack);
                let registry = self.registry_snapshot();
                let mut exec = |s: &Statement, st: &mut Vec<Frame>| self.execute_nested(s, st, ctx);
                dml::update_rows(&framed, &registry, update, &mut exec).map(|_| ())
            }
            Statement::Delete(delete) => {
                let framed = procedure::ctx_with_frames(ctx, stack);
                let registry = self.registry_snapshot();
                let mut exec = |s: &Statement, st: &mut Vec<Frame>| self.execute_nested(s, st, ctx);
                dml::delete_rows(&framed, &registry, delete, &mut exec).map(|_| ())
            }
            other => {
                self.execute_statement(other)?;
                Ok(())
            }
        }
    }

    /// Looks up `call.name` in the registry and runs its body against a
    /// fresh frame pushed onto `stack`, binding `IN` arguments from the
    /// caller's own frames and writing `OUT`/`INOUT` arguments back once
    /// the body returns.
    fn run_procedure(&mut self, call: &CallStatement, ctx: &BuildCtx, stack: &mut Vec<Frame>) -> Result<()> {
        let def = {
            let registry = self.registry.lock().expect("registry mutex poisoned");
            registry.procedure(&self.database, &call.name).cloned()
        };
        let Some(def) = def else {
            return Err(DriverError::UnknownRoutine(call.name.clone()));
        };
        let callee = procedure::bind_params(&def.params, &call.args, stack, ctx)?;
        stack.push(callee);
        let outcome = {
            let mut exec = |stmt: &Statement, inner_stack: &mut Vec<Frame>| self.execute_nested(stmt, inner_stack, ctx);
            procedure::run_block(&def.body, stack, ctx, &mut exec)
        };
        let callee = stack.pop().unwrap_or_default();
        outcome?;
        if let Some(caller) = stack.last_mut() {
            procedure::write_back_out_params(&def.params, &call.args, &callee, caller);
        }
        Ok(())
    }

    fn execute_statement(&mut self, stmt: &Statement) -> Result<ExecResult> {
        match stmt {
            Statement::Select(select) => self.autocommit(|_session, ctx| {
                let op = build_select(ctx, select)?;
                let (columns, rows) = run_to_rows(op)?;
                Ok(ExecResult::Query { columns, rows })
            }),
            Statement::Insert(insert) => self.autocommit(|session, ctx| {
                let registry = session.registry_snapshot();
                let mut exec = |stmt: &Statement, stack: &mut Vec<Frame>| session.execute_nested(stmt, stack, ctx);
                dml::insert_rows(ctx, &registry, insert, &mut exec).map(ExecResult::from)
            }),
            Statement::Update(update) => self.autocommit(|session, ctx| {
                let registry = session.registry_snapshot();
                let mut exec = |stmt: &Statement, stack: &mut Vec<Frame>| session.execute_nested(stmt, stack, ctx);
                dml::update_rows(ctx, &registry, update, &mut exec).map(ExecResult::from)
            }),
            Statement::Delete(delete) => self.autocommit(|session, ctx| {
                let registry = session.registry_snapshot();
                let mut exec = |stmt: &Statement, stack: &mut Vec<Frame>| session.execute_nested(stmt, stack, ctx);
                dml::delete_rows(ctx, &registry, delete, &mut exec).map(ExecResult::from)
            }),
            Statement::CreateDatabase(s) => self.autocommit(|_session, ctx| {
                ddl::create_database(ctx, s)?;
                Ok(ExecResult::Ddl(format!("CREATE DATABASE {}", s.name)))
            }),
            Statement::DropDatabase(s) => self.autocommit(|_session, ctx| {
                ddl::drop_database(ctx, s)?;
                Ok(ExecResult::Ddl(format!("DROP DATABASE {}", s.name)))
            }),
            Statement::CreateTable(s) => self.autocommit(|session, ctx| {
                let mut registry = session.registry.lock().expect("registry mutex poisoned");
                ddl::create_table(ctx, &mut registry, s)?;
                Ok(ExecResult::Ddl(format!("CREATE TABLE {}", s.name)))
            }),
            Statement::DropTable(s) => self.autocommit(|session, ctx| {
                let mut registry = session.registry.lock().expect("registry mutex poisoned");
                ddl::drop_table(ctx, &mut registry, s)?;
                Ok(ExecResult::Ddl(format!("DROP TABLE {}", s.name)))
            }),
            Statement::AlterTable(s) => self.autocommit(|session, ctx| {
                let mut registry = session.registry.lock().expect("registry mutex poisoned");
                ddl::alter_table(ctx, &mut registry, s)?;
                Ok(ExecResult::Ddl(format!("ALTER TABLE {}", s.table)))
            }),
            Statement::CreateIndex(s) => self.autocommit(|session, ctx| {
                let mut registry = session.registry.lock().expect("registry mutex poisoned");
                ddl::create_index(ctx, &mut registry, s)?;
                Ok(ExecResult::Ddl(format!("CREATE INDEX {}", s.name)))
            }),
            Statement::DropIndex(s) => self.autocommit(|session, ctx| {
                let mut registry = session.registry.lock().expect("registry mutex poisoned");
                ddl::drop_index(ctx, &mut registry, s)?;
                Ok(ExecResult::Ddl(format!("DROP INDEX {}", s.name)))
            }),
            Statement::CreateView(s) => self.autocommit(|_session, ctx| {
                ddl::create_view(ctx, s)?;
                Ok(ExecResult::Ddl(format!("CREATE VIEW {}", s.name)))
            }),
            Statement::DropView(s) => self.autocommit(|_session, ctx| {
                ddl::drop_view(ctx, s)?;
                Ok(ExecResult::Ddl(format!("DROP VIEW {}", s.name)))
            }),
            Statement::CreateTrigger(s) => {
                let trigger =
                    TriggerDef { name: s.name.clone(), table: s.table.clone(), timing: s.timing, event: s.event, body: s.body.clone() };
                let mut registry = self.registry.lock().expect("registry mutex poisoned");
                registry.add_trigger(&self.database, trigger);
                self.catalog
                    .add_routine(&self.database, RoutineKind::Trigger, &s.name, stmt.to_string())
                    .map_err(DriverError::Engine)?;
                Ok(ExecResult::Ddl(format!("CREATE TRIGGER {}", s.name)))
            }
            Statement::CreateProcedure(s) => {
                let mut registry = self.registry.lock().expect("registry mutex poisoned");
                registry.add_procedure(&self.database, s.clone());
                self.catalog
                    .add_routine(&self.database, RoutineKind::Procedure, &s.name, stmt.to_string())
                    .map_err(DriverError::Engine)?;
                Ok(ExecResult::Ddl(format!("CREATE PROCEDURE {}", s.name)))
            }
            Statement::CreateFunction(s) => {
                let mut registry = self.registry.lock().expect("registry mutex poisoned");
                registry.add_function(&self.database, s.clone());
                self.catalog
                    .add_routine(&self.database, RoutineKind::Function, &s.name, stmt.to_string())
                    .map_err(DriverError::Engine)?;
                Ok(ExecResult::Ddl(format!("CREATE FUNCTION {}", s.name)))
            }
            Statement::CreateEvent(s) => {
                let mut registry = self.registry.lock().expect("registry mutex poisoned");
                registry.add_event(&self.database, s.clone());
                self.catalog
                    .add_routine(&self.database, RoutineKind::Event, &s.name, stmt.to_string())
                    .map_err(DriverError::Engine)?;
                Ok(ExecResult::Ddl(format!("CREATE EVENT {}", s.name)))
            }
            Statement::Call(call) => self.autocommit(|session, ctx| {
                let mut stack = Vec::new();
                session.run_procedure(call, ctx, &mut stack)?;
                Ok(ExecResult::Ddl(format!("CALL {}", call.name)))
            }),
            Statement::Begin(begin) => {
                if self.transaction.is_some() {
                    return Err(DriverError::TransactionAlreadyOpen);
                }
                let isolation = begin.isolation.or(self.next_isolation).unwrap_or(self.default_isolation);
                let read_only = begin.read_only || self.next_read_only.unwrap_or(false);
                let tx = self.txn_manager.begin(isolation, read_only).map_err(DriverError::Engine)?;
                self.transaction = Some(tx);
                self.next_isolation = None;
                self.next_read_only = None;
                Ok(ExecResult::Ddl("BEGIN".into()))
            }
            Statement::Commit => {
                let tx = self.transaction.take().ok_or_else(|| DriverError::Unsupported("no transaction is open".into()))?;
                self.txn_manager.commit(&tx).map_err(DriverError::Engine)?;
                Ok(ExecResult::Ddl("COMMIT".into()))
            }
            Statement::Rollback => {
                let tx = self.transaction.take().ok_or_else(|| DriverError::Unsupported("no transaction is open".into()))?;
                self.txn_manager.rollback(&tx).map_err(DriverError::Engine)?;
                Ok(ExecResult::Ddl("ROLLBACK".into()))
            }
            Statement::SetTransaction(s) => {
                match s.scope {
                    TransactionScope::Next => {
                        self.next_isolation = s.isolation.or(self.next_isolation);
                        self.next_read_only = s.read_only.or(self.next_read_only);
                    }
                    TransactionScope::Session | TransactionScope::Global => {
                        if let Some(level) = s.isolation {
                            self.default_isolation = level;
                        }
                    }
                }
                Ok(ExecResult::Ddl("SET TRANSACTION".into()))
            }
            Statement::SetVariable(s) => {
                let ctx = self.build_probe_ctx();
                let value = eval_constant(&s.value, &ctx)?;
                let key = if s.global { format!("@@global.{}", s.name.to_lowercase()) } else { s.name.to_lowercase() };
                self.variables.insert(key, value);
                Ok(ExecResult::Ddl(format!("SET {}", s.name)))
            }
            Statement::Show(show) => self.autocommit(|_session, ctx| {
                let op = show::build_show(ctx, show)?;
                let (columns, rows) = run_to_rows(op)?;
                Ok(ExecResult::Query { columns, rows })
            }),
            Statement::Describe { table } => self.autocommit(|_session, ctx| {
                let op = show::build_describe(ctx, &ctx.database, table)?;
                let (columns, rows) = run_to_rows(op)?;
                Ok(ExecResult::Query { columns, rows })
            }),
        }
    }

    /// A [`BuildCtx`] with no live transaction, for evaluating a constant
    /// expression (`SET name = expr`) that cannot itself touch table data.
    fn build_probe_ctx(&self) -> BuildCtx {
        BuildCtx::new(
            self.catalog.clone(),
            self.database.clone(),
            oxide_sql_engine::storage::TxId(0),
            None,
            self.lock_manager.clone(),
            self.spill_budget_bytes,
            self.lock_timeout,
        )
    }
}
