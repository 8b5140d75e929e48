//! INSERT/UPDATE/DELETE execution.
//!
//! INSERT validates (NOT NULL/CHECK/FOREIGN KEY) and fills defaults and
//! auto-increment values before persisting each row. UPDATE/DELETE run a
//! plan phase — collect every target row up front against a snapshot of
//! the table — followed by a mutate phase, so a self-referential `WHERE`
//! sees a consistent view regardless of mutation order. Every mutation
//! fires `BEFORE`/`AFTER` triggers through [`crate::procedure`], with
//! `BEFORE` trigger bodies able to rewrite `NEW` via `SET NEW.col = ...`.

use std::sync::Arc;

use oxide_sql_core::ast::{
    ConflictAction, DeleteStatement, Expr, InsertSource, InsertStatement, TableRef, TriggerEvent, TriggerTiming,
    UpdateStatement,
};
use oxide_sql_engine::operators::{Filter, Operator};
use oxide_sql_engine::storage::Table;
use oxide_sql_types::{Row, RowId, Schema, Value};

use crate::builder::{build_from, build_select, compile_expr, eval_constant, run_to_rows, BuildCtx};
use crate::constraints::{self, CascadeAction};
use crate::error::{DriverError, Result};
use crate::procedure::{self, Frame, RunNested};
use crate::registry::Registry;

/// Rows affected and, for an INSERT that filled an auto-increment column,
/// the first value generated — MySQL's `LAST_INSERT_ID()` semantics.
#[derive(Debug, Default, Clone, Copy)]
pub struct MutationResult {
    pub affected_rows: u64,
    pub last_insert_id: Option<u64>,
}

fn database_of(schema: &Option<String>, ctx: &BuildCtx) -> String {
    schema.clone().unwrap_or_else(|| ctx.database.clone())
}

fn fire_triggers(
    ctx: &BuildCtx,
    registry: &Registry,
    database: &str,
    table: &str,
    timing: TriggerTiming,
    event: TriggerEvent,
    old: Option<Row>,
    new: Option<Row>,
    exec: &mut RunNested<'_>,
) -> Result<(Option<Row>, Option<Row>)> {
    let mut frame = Frame::for_trigger(old, new);
    for trigger in registry.triggers_for(database, table, timing, event) {
        let mut stack = vec![std::mem::take(&mut frame)];
        procedure::run_block(&trigger.body, &mut stack, ctx, exec)?;
        frame = stack.pop().unwrap_or_default();
    }
    Ok((frame.old, frame.new))
}

fn apply_cascades(ctx: &BuildCtx, actions: Vec<CascadeAction>) -> Result<()> {
    for action in actions {
        match action {
            CascadeAction::DeleteRow { database, table, row_id } => {
                let t = ctx.catalog.get_table(&database, &table).map_err(DriverError::Engine)?;
                t.delete_row(row_id).map_err(DriverError::Engine)?;
            }
            CascadeAction::NullColumns { database, table, row_id, columns } => {
                let t = ctx.catalog.get_table(&database, &table).map_err(DriverError::Engine)?;
                if let Some(mut row) = t.get_row_by_slot(row_id).map_err(DriverError::Engine)? {
                    for ordinal in columns {
                        row.values[ordinal] = Value::Null;
                    }
                    t.update_row(row_id, row.values).map_err(DriverError::Engine)?;
                }
            }
            CascadeAction::Restrict { table } => {
                return Err(DriverError::Engine(oxide_sql_types::Error::ForeignKeyViolation(table)));
            }
        }
    }
    Ok(())
}

// --- INSERT --------------------------------------------------------------

pub fn insert_rows(
    ctx: &BuildCtx,
    registry: &Registry,
    stmt: &InsertStatement,
    exec: &mut RunNested<'_>,
) -> Result<MutationResult> {
    let database = database_of(&stmt.schema, ctx);
    let table = ctx.catalog.get_table(&database, &stmt.table).map_err(DriverError::Engine)?;
    let schema = table.schema();

    let target_ordinals: Vec<usize> = if stmt.columns.is_empty() {
        (0..schema.len()).collect()
    } else {
        stmt.columns
            .iter()
            .map(|c| schema.ordinal(c).ok_or_else(|| DriverError::UnknownColumn(c.to_string())))
            .collect::<Result<Vec<_>>>()?
    };

    let source_rows: Vec<Vec<Value>> = match &stmt.values {
        InsertSource::Values(rows) => rows
            .iter()
            .map(|exprs| exprs.iter().map(|e| eval_constant(e, ctx)).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?,
        InsertSource::Query(select) => {
            let op = build_select(ctx, select)?;
            let (_, rows) = run_to_rows(op)?;
            rows.into_iter().map(|r| r.values).collect()
        }
        InsertSource::DefaultValues => vec![Vec::new()],
    };

    let mut affected = 0u64;
    let mut last_insert_id = None;

    for source in source_rows {
        let mut values = vec![Value::Null; schema.len()];
        for (i, ordinal) in target_ordinals.iter().enumerate() {
            if let Some(v) = source.get(i) {
                values[*ordinal] = v.clone();
            }
        }
        for (ordinal, col) in schema.columns().iter().enumerate() {
            if values[ordinal].is_null() && !target_ordinals.contains(&ordinal) {
                if let Some(default) = &col.default {
                    values[ordinal] = default.clone();
                }
            }
            if col.auto_increment {
                if values[ordinal].is_null() {
                    let next = table.next_auto_increment();
                    values[ordinal] = Value::BigInt(next as i64);
                    last_insert_id.get_or_insert(next);
                } else if let Some(explicit) = as_u64(&values[ordinal]) {
                    table.advance_auto_increment(explicit + 1);
                }
            }
        }

        let working_row = Row::new(schema.clone(), values, RowId(0));
        let (_, new) = fire_triggers(
            ctx,
            registry,
            &database,
            &stmt.table,
            TriggerTiming::Before,
            TriggerEvent::Insert,
            None,
            Some(working_row),
            exec,
        )?;
        let values = new.map_or_else(Vec::new, |r| r.values);

        if let Some(conflict_row_id) = find_conflicting_row(&table, &schema, stmt.on_conflict.as_ref(), &values)? {
            match stmt.on_conflict.as_ref().map(|c| &c.action) {
                Some(ConflictAction::DoNothing) => continue,
                Some(ConflictAction::DoUpdate(assignments)) => {
                    let mut updated = table
                        .get_row_by_slot(conflict_row_id)
                        .map_err(DriverError::Engine)?
                        .ok_or_else(|| DriverError::Engine(oxide_sql_types::Error::Internal("conflicting row vanished".into())))?;
                    for assignment in assignments {
                        let ordinal = schema.ordinal(&assignment.column).ok_or_else(|| DriverError::UnknownColumn(assignment.column.clone()))?;
                        let evaluator = compile_expr(&assignment.value, &schema, ctx)?;
                        updated.values[ordinal] = evaluator.eval(&updated).map_err(DriverError::Engine)?;
                    }
                    table.update_row(conflict_row_id, updated.values).map_err(DriverError::Engine)?;
                    affected += 1;
                    continue;
                }
                None => {}
            }
        }

        constraints::enforce_not_null(&schema, &values)?;
        let persisted = Row::new(schema.clone(), values.clone(), RowId(0));
        constraints::enforce_checks(registry, ctx, &database, &stmt.table, &persisted)?;
        constraints::enforce_foreign_keys(registry, &ctx.catalog, &database, &stmt.table, &schema, &values)?;

        let row_id = table.insert_row(values.clone(), ctx.tx).map_err(DriverError::Engine)?;
        affected += 1;

        fire_triggers(
            ctx,
            registry,
            &database,
            &stmt.table,
            TriggerTiming::After,
            TriggerEvent::Insert,
            None,
            Some(Row::new(schema.clone(), values, row_id)),
            exec,
        )?;
    }

    Ok(MutationResult { affected_rows: affected, last_insert_id })
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Int(i) => Some((*i).max(0) as u64),
        Value::BigInt(i) => Some((*i).max(0) as u64),
        _ => None,
    }
}

fn find_conflicting_row(
    table: &Arc<dyn Table>,
    schema: &Schema,
    on_conflict: Option<&oxide_sql_core::ast::OnConflict>,
    values: &[Value],
) -> Result<Option<RowId>> {
    let Some(on_conflict) = on_conflict else { return Ok(None) };
    let ordinals: Vec<usize> = on_conflict
        .columns
        .iter()
        .map(|c| schema.ordinal(c).ok_or_else(|| DriverError::UnknownColumn(c.to_string())))
        .collect::<Result<Vec<_>>>()?;
    for row in table.scan(None) {
        let row = row.map_err(DriverError::Engine)?;
        if ordinals.iter().all(|&o| row.get(o) == values.get(o)) {
            return Ok(Some(row.row_id));
        }
    }
    Ok(None)
}

// --- UPDATE / DELETE plan phase -------------------------------------------

struct TargetRow {
    row_id: RowId,
    current: Row,
    eval_schema: Arc<Schema>,
    eval_row: Row,
}

fn select_targets(
    ctx: &BuildCtx,
    table: &Arc<dyn Table>,
    target_schema: &Arc<Schema>,
    alias: &str,
    from: Option<&TableRef>,
    where_clause: Option<&Expr>,
) -> Result<Vec<TargetRow>> {
    let rows: Vec<Row> = table.scan(ctx.read_view.as_ref()).collect::<std::result::Result<_, _>>().map_err(DriverError::Engine)?;
    let mut out = Vec::new();
    match from {
        None => {
            for row in rows {
                let include = match where_clause {
                    Some(expr) => {
                        let evaluator = compile_expr(expr, target_schema, ctx)?;
                        evaluator.eval(&row).map_err(DriverError::Engine)?.as_bool().map_err(DriverError::Engine)?.unwrap_or(false)
                    }
                    None => true,
                };
                if include {
                    out.push(TargetRow {
                        row_id: row.row_id,
                        current: row.clone(),
                        eval_schema: target_schema.clone(),
                        eval_row: row,
                    });
                }
            }
        }
        Some(from_ref) => {
            let aliased_schema = Arc::new(target_schema.realias(alias));
            for row in rows {
                let bound_row = Row::new(aliased_schema.clone(), row.values.clone(), row.row_id);
                let ctx2 = ctx.with_outer_frame(aliased_schema.clone(), bound_row);
                let right_op = build_from(&ctx2, from_ref)?;
                let right_schema = right_op.schema();
                let filtered: Box<dyn Operator> = match where_clause {
                    Some(expr) => Box::new(Filter::new(right_op, compile_expr(expr, &right_schema, &ctx2)?)),
                    None => right_op,
                };
                let (result_schema, matched) = run_to_rows(filtered)?;
                if let Some(first) = matched.into_iter().next() {
                    out.push(TargetRow { row_id: row.row_id, current: row.clone(), eval_schema: result_schema, eval_row: first });
                }
            }
        }
    }
    Ok(out)
}

// --- UPDATE ----------------------------------------------------------------

pub fn update_rows(
    ctx: &BuildCtx,
    registry: &Registry,
    stmt: &UpdateStatement,
    exec: &mut RunNested<'_>,
) -> Result<MutationResult> {
    let database = database_of(&stmt.schema, ctx);
    let table = ctx.catalog.get_table(&database, &stmt.table).map_err(DriverError::Engine)?;
    let target_schema = table.schema();
    let alias = stmt.alias.clone().unwrap_or_else(|| stmt.table.clone());

    let targets = select_targets(ctx, &table, &target_schema, &alias, stmt.from.as_ref(), stmt.where_clause.as_ref())?;

    let mut affected = 0u64;
    for target in targets {
        let mut new_values = target.current.values.clone();
        for assignment in &stmt.assignments {
            let ordinal = target_schema
                .ordinal(&assignment.column)
                .ok_or_else(|| DriverError::UnknownColumn(assignment.column.clone()))?;
            let evaluator = compile_expr(&assignment.value, &target.eval_schema, ctx)?;
            new_values[ordinal] = evaluator.eval(&target.eval_row).map_err(DriverError::Engine)?;
        }

        let new_row = Row::new(target_schema.clone(), new_values, target.row_id);
        let (old, new) = fire_triggers(
            ctx,
            registry,
            &database,
            &stmt.table,
            TriggerTiming::Before,
            TriggerEvent::Update,
            Some(target.current.clone()),
            Some(new_row),
            exec,
        )?;
        let new_values = new.map_or_else(|| target.current.values.clone(), |r| r.values);
        let old_row = old.unwrap_or_else(|| target.current.clone());

        constraints::enforce_not_null(&target_schema, &new_values)?;
        let persisted = Row::new(target_schema.clone(), new_values.clone(), target.row_id);
        constraints::enforce_checks(registry, ctx, &database, &stmt.table, &persisted)?;
        constraints::enforce_foreign_keys(registry, &ctx.catalog, &database, &stmt.table, &target_schema, &new_values)?;

        table.update_row(target.row_id, new_values.clone()).map_err(DriverError::Engine)?;
        affected += 1;

        let cascades = constraints::plan_cascades(registry, &ctx.catalog, &database, &stmt.table, &old_row, false)?;
        apply_cascades(ctx, cascades)?;

        fire_triggers(
            ctx,
            registry,
            &database,
            &stmt.table,
            TriggerTiming::After,
            TriggerEvent::Update,
            Some(old_row),
            Some(Row::new(target_schema.clone(), new_values, target.row_id)),
            exec,
        )?;
    }
    Ok(MutationResult { affected_rows: affected, last_insert_id: None })
}

// --- DELETE ----------------------------------------------------------------

pub fn delete_rows(
    ctx: &BuildCtx,
    registry: &Registry,
    stmt: &DeleteStatement,
    exec: &mut RunNested<'_>,
) -> Result<MutationResult> {
    let database = database_of(&stmt.schema, ctx);
    let table = ctx.catalog.get_table(&database, &stmt.table).map_err(DriverError::Engine)?;
    let target_schema = table.schema();

    let targets = select_targets(ctx, &table, &target_schema, stmt.alias.as_deref().unwrap_or(&stmt.table), None, stmt.where_clause.as_ref())?;

    let mut affected = 0u64;
    for target in targets {
        let (old, _) = fire_triggers(
            ctx,
            registry,
            &database,
            &stmt.table,
            TriggerTiming::Before,
            TriggerEvent::Delete,
            Some(target.current.clone()),
            None,
            exec,
        )?;
        let old_row = old.unwrap_or(target.current);

        let cascades = constraints::plan_cascades(registry, &ctx.catalog, &database, &stmt.table, &old_row, true)?;
        apply_cascades(ctx, cascades)?;

        table.delete_row(target.row_id).map_err(DriverError::Engine)?;
        affected += 1;

        fire_triggers(
            ctx,
            registry,
            &database,
            &stmt.table,
            TriggerTiming::After,
            TriggerEvent::Delete,
            Some(old_row),
            None,
            exec,
        )?;
    }
    Ok(MutationResult { affected_rows: affected, last_insert_id: None })
}
