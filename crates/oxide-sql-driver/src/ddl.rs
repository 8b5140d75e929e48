//! `CREATE`/`DROP`/`ALTER` dispatch for tables, databases, indexes and
//! views: translates the parser's `ColumnDef`/`TableConstraint` vocabulary
//! into the runtime [`Schema`], drives the storage [`Catalog`], and keeps
//! the driver-side [`Registry`] (constraint shapes the catalog itself does
//! not track) in step.
//!
//! `CREATE INDEX`/`DROP INDEX` are bookkeeping-only in this engine: the
//! storage `Catalog` contract has no index-creation hook (only
//! `Table::scan`/`get_row_by_slot`), so a secondary index declared here does
//! not accelerate scans — queries remain correct, just unaccelerated. See
//! `DESIGN.md`.

use std::sync::Arc;

use oxide_sql_core::ast::{
    AlterAction, AlterTableStatement, CreateDatabaseStatement, CreateIndexStatement, CreateTableStatement,
    CreateViewStatement, DropDatabaseStatement, DropIndexStatement, DropTableStatement, DropViewStatement,
    TableConstraint,
};
use oxide_sql_types::{ColumnDef, Schema};

use crate::builder::{eval_constant, BuildCtx};
use crate::error::{DriverError, Result};
use crate::registry::Registry;

/// Converts a parsed column definition to its runtime counterpart,
/// evaluating a constant `DEFAULT` expression if one was given.
fn to_runtime_column(col: &oxide_sql_core::ast::ColumnDef, ctx: &BuildCtx) -> Result<ColumnDef> {
    let mut runtime = ColumnDef::new(&col.name, crate::value_conv::data_type_to_column_type(&col.data_type));
    runtime.nullable = col.nullable && !col.primary_key;
    runtime.primary_key = col.primary_key;
    runtime.auto_increment = col.autoincrement;
    if let Some(expr) = &col.default {
        runtime.default = Some(eval_constant(expr, ctx)?);
    }
    Ok(runtime)
}

/// Folds a column's own inline `PRIMARY KEY`/`UNIQUE` flags into table-level
/// constraints, so `Registry::table_constraints` sees a single uniform
/// shape regardless of whether the constraint was declared inline or via a
/// trailing `CONSTRAINT`/`PRIMARY KEY (...)` clause.
fn inline_constraints(columns: &[oxide_sql_core::ast::ColumnDef]) -> Vec<TableConstraint> {
    let mut out = Vec::new();
    let pk_cols: Vec<String> = columns.iter().filter(|c| c.primary_key).map(|c| c.name.clone()).collect();
    if !pk_cols.is_empty() {
        out.push(TableConstraint::PrimaryKey { name: None, columns: pk_cols });
    }
    for col in columns.iter().filter(|c| c.unique && !c.primary_key) {
        out.push(TableConstraint::Unique { name: None, columns: vec![col.name.clone()] });
    }
    out
}

fn database_of(schema: &Option<String>, ctx: &BuildCtx) -> String {
    schema.clone().unwrap_or_else(|| ctx.database.clone())
}

pub fn create_table(ctx: &BuildCtx, registry: &mut Registry, stmt: &CreateTableStatement) -> Result<()> {
    let database = database_of(&stmt.schema, ctx);
    if stmt.if_not_exists && ctx.catalog.list_tables(&database).iter().any(|t| t.eq_ignore_ascii_case(&stmt.name)) {
        return Ok(());
    }
    let columns = stmt.columns.iter().map(|c| to_runtime_column(c, ctx)).collect::<Result<Vec<_>>>()?;
    ctx.catalog
        .create_table(&database, &stmt.name, Arc::new(Schema::new(columns)))
        .map_err(DriverError::Engine)?;

    let mut constraints = inline_constraints(&stmt.columns);
    constraints.extend(stmt.constraints.iter().cloned());
    for constraint in &constraints {
        if let TableConstraint::ForeignKey { name, .. } = constraint {
            let fk_name = name.clone().unwrap_or_else(|| format!("fk_{}", stmt.name));
            ctx.catalog.record_foreign_key(&database, &stmt.name, &fk_name);
        }
    }
    registry.set_table_constraints(&database, &stmt.name, constraints);
    Ok(())
}

pub fn drop_table(ctx: &BuildCtx, registry: &mut Registry, stmt: &DropTableStatement) -> Result<()> {
    let database = database_of(&stmt.schema, ctx);
    match ctx.catalog.drop_table(&database, &stmt.name) {
        Ok(()) => {
            registry.drop_table(&database, &stmt.name);
            Ok(())
        }
        Err(e) if stmt.if_exists => {
            let _ = e;
            Ok(())
        }
        Err(e) => Err(DriverError::Engine(e)),
    }
}

pub fn create_database(ctx: &BuildCtx, stmt: &CreateDatabaseStatement) -> Result<()> {
    if stmt.if_not_exists && ctx.catalog.database_exists(&stmt.name) {
        return Ok(());
    }
    ctx.catalog.create_database(&stmt.name).map_err(DriverError::Engine)
}

pub fn drop_database(ctx: &BuildCtx, stmt: &DropDatabaseStatement) -> Result<()> {
    match ctx.catalog.drop_database(&stmt.name) {
        Ok(()) => Ok(()),
        Err(e) if stmt.if_exists => {
            let _ = e;
            Ok(())
        }
        Err(e) => Err(DriverError::Engine(e)),
    }
}

/// Records an index's shape in the registry as a `Unique` table constraint
/// when it enforces uniqueness; non-unique secondary indexes are recorded
/// only so `SHOW INDEX`/`DROP INDEX` can see them, since there is no
/// physical structure behind them to build.
pub fn create_index(ctx: &BuildCtx, registry: &mut Registry, stmt: &CreateIndexStatement) -> Result<()> {
    let schema = ctx.catalog.get_table_schema(&ctx.database, &stmt.table).map_err(DriverError::Engine)?;
    for col in &stmt.columns {
        if schema.ordinal(col).is_none() {
            return Err(DriverError::UnknownColumn(col.clone()));
        }
    }
    if stmt.unique {
        registry.add_table_constraint(
            &ctx.database,
            &stmt.table,
            TableConstraint::Unique { name: Some(stmt.name.clone()), columns: stmt.columns.clone() },
        );
    }
    Ok(())
}

pub fn drop_index(ctx: &BuildCtx, registry: &mut Registry, stmt: &DropIndexStatement) -> Result<()> {
    registry.remove_table_constraint(&ctx.database, &stmt.table, &stmt.name);
    Ok(())
}

pub fn create_view(ctx: &BuildCtx, stmt: &CreateViewStatement) -> Result<()> {
    if !stmt.or_replace {
        if let Some(existing) = ctx.catalog.get_view(&ctx.database, &stmt.name).map_err(DriverError::Engine)? {
            let _ = existing;
            return Err(DriverError::Engine(oxide_sql_types::Error::Internal(format!(
                "view '{}' already exists",
                stmt.name
            ))));
        }
    }
    ctx.catalog
        .create_view(&ctx.database, &stmt.name, stmt.query.to_string())
        .map_err(DriverError::Engine)
}

pub fn drop_view(ctx: &BuildCtx, stmt: &DropViewStatement) -> Result<()> {
    match ctx.catalog.drop_view(&ctx.database, &stmt.name) {
        Ok(()) => Ok(()),
        Err(e) if stmt.if_exists => {
            let _ = e;
            Ok(())
        }
        Err(e) => Err(DriverError::Engine(e)),
    }
}

pub fn alter_table(ctx: &BuildCtx, registry: &mut Registry, stmt: &AlterTableStatement) -> Result<()> {
    let database = ctx.database.clone();
    for action in &stmt.actions {
        apply_alter_action(ctx, registry, &database, &stmt.table, action)?;
    }
    Ok(())
}

fn apply_alter_action(
    ctx: &BuildCtx,
    registry: &mut Registry,
    database: &str,
    table: &str,
    action: &AlterAction,
) -> Result<()> {
    match action {
        AlterAction::AddColumn(col) => {
            let schema = ctx.catalog.get_table_schema(database, table).map_err(DriverError::Engine)?;
            let mut columns = schema.columns().to_vec();
            columns.push(to_runtime_column(col, ctx)?);
            ctx.catalog.update_table_schema(database, table, Arc::new(Schema::new(columns))).map_err(DriverError::Engine)
        }
        AlterAction::DropColumn(name) => {
            let schema = ctx.catalog.get_table_schema(database, table).map_err(DriverError::Engine)?;
            let columns: Vec<_> = schema.columns().iter().filter(|c| !c.name.eq_ignore_ascii_case(name)).cloned().collect();
            if columns.len() == schema.len() {
                return Err(DriverError::UnknownColumn(name.clone()));
            }
            ctx.catalog.update_table_schema(database, table, Arc::new(Schema::new(columns))).map_err(DriverError::Engine)
        }
        AlterAction::ModifyColumn(col) => {
            let schema = ctx.catalog.get_table_schema(database, table).map_err(DriverError::Engine)?;
            let replacement = to_runtime_column(col, ctx)?;
            let columns: Vec<_> = schema
                .columns()
                .iter()
                .map(|c| if c.name.eq_ignore_ascii_case(&col.name) { replacement.clone() } else { c.clone() })
                .collect();
            ctx.catalog.update_table_schema(database, table, Arc::new(Schema::new(columns))).map_err(DriverError::Engine)
        }
        AlterAction::ChangeColumn { old_name, new_col } => {
            let schema = ctx.catalog.get_table_schema(database, table).map_err(DriverError::Engine)?;
            let replacement = to_runtime_column(new_col, ctx)?;
            let columns: Vec<_> = schema
                .columns()
                .iter()
                .map(|c| if c.name.eq_ignore_ascii_case(old_name) { replacement.clone() } else { c.clone() })
                .collect();
            ctx.catalog.update_table_schema(database, table, Arc::new(Schema::new(columns))).map_err(DriverError::Engine)
        }
        AlterAction::RenameColumn { old_name, new_name } => {
            let schema = ctx.catalog.get_table_schema(database, table).map_err(DriverError::Engine)?;
            let columns: Vec<_> = schema
                .columns()
                .iter()
                .cloned()
                .map(|mut c| {
                    if c.name.eq_ignore_ascii_case(old_name) {
                        c.name = new_name.clone();
                    }
                    c
                })
                .collect();
            ctx.catalog.update_table_schema(database, table, Arc::new(Schema::new(columns))).map_err(DriverError::Engine)
        }
        AlterAction::RenameTable(new_name) => {
            let schema = ctx.catalog.get_table_schema(database, table).map_err(DriverError::Engine)?;
            let old_table = ctx.catalog.get_table(database, table).map_err(DriverError::Engine)?;
            ctx.catalog.create_table(database, new_name, schema).map_err(DriverError::Engine)?;
            let new_table = ctx.catalog.get_table(database, new_name).map_err(DriverError::Engine)?;
            for row in old_table.scan(None) {
                let row = row.map_err(DriverError::Engine)?;
                new_table.insert_row(row.values, ctx.tx).map_err(DriverError::Engine)?;
            }
            ctx.catalog.drop_table(database, table).map_err(DriverError::Engine)?;
            let constraints = registry.table_constraints(database, table).to_vec();
            registry.drop_table(database, table);
            registry.set_table_constraints(database, new_name, constraints);
            Ok(())
        }
        AlterAction::AddConstraint(constraint) => {
            if let TableConstraint::ForeignKey { name, .. } = constraint {
                let fk_name = name.clone().unwrap_or_else(|| format!("fk_{table}"));
                ctx.catalog.record_foreign_key(database, table, &fk_name);
            }
            registry.add_table_constraint(database, table, constraint.clone());
            Ok(())
        }
        AlterAction::DropPrimaryKey => {
            let remaining: Vec<_> = registry
                .table_constraints(database, table)
                .iter()
                .filter(|c| !matches!(c, TableConstraint::PrimaryKey { .. }))
                .cloned()
                .collect();
            registry.set_table_constraints(database, table, remaining);
            Ok(())
        }
        AlterAction::DropForeignKey(name) => {
            registry.remove_table_constraint(database, table, name);
            ctx.catalog.forget_foreign_key(database, table, name);
            Ok(())
        }
        AlterAction::DropIndexConstraint(name) => {
            registry.remove_table_constraint(database, table, name);
            Ok(())
        }
        AlterAction::DropCheck(name) => {
            registry.remove_table_constraint(database, table, name);
            Ok(())
        }
    }
}
