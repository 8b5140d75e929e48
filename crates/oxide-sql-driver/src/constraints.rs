//! NOT NULL / CHECK / FOREIGN KEY enforcement, driven ahead of and after
//! the row mutations `dml.rs` performs. NOT NULL is checked straight off
//! the runtime `Schema` (every column's own `nullable` flag); CHECK and
//! FOREIGN KEY are checked against the table-level constraint shapes kept
//! in the [`crate::registry::Registry`], since the storage `Catalog`
//! itself only knows about columns.

use std::sync::Arc;

use oxide_sql_core::ast::{ReferentialAction, TableConstraint};
use oxide_sql_engine::storage::Catalog;
use oxide_sql_types::{Error as EngineError, Row, Schema, Value};

use crate::builder::{compile_expr, BuildCtx};
use crate::error::{DriverError, Result};
use crate::registry::Registry;

/// Errors if any NOT NULL column in `schema` holds `Value::Null` in `values`.
pub fn enforce_not_null(schema: &Schema, values: &[Value]) -> Result<()> {
    for (i, col) in schema.columns().iter().enumerate() {
        if !col.nullable && values.get(i).map_or(true, Value::is_null) {
            return Err(DriverError::Engine(EngineError::NotNullViolation(col.name.clone())));
        }
    }
    Ok(())
}

/// Errors if any `CHECK` constraint on `table` evaluates to `false` for
/// `row`. A `CHECK` that evaluates to `NULL` is treated as satisfied, per
/// SQL's three-valued-logic convention for constraints.
pub fn enforce_checks(registry: &Registry, ctx: &BuildCtx, database: &str, table: &str, row: &Row) -> Result<()> {
    for constraint in registry.table_constraints(database, table) {
        if let TableConstraint::Check { name, expr } = constraint {
            let evaluator = compile_expr(expr, &row.schema, ctx)?;
            let value = evaluator.eval(row).map_err(DriverError::Engine)?;
            if matches!(value, Value::Bool(false)) {
                let label = name.clone().unwrap_or_else(|| "CHECK".to_string());
                return Err(DriverError::Engine(EngineError::CheckViolation(label)));
            }
        }
    }
    Ok(())
}

/// For every `FOREIGN KEY` on `table` whose child-side columns are all
/// non-null in `values`, errors unless a matching row exists in the
/// referenced parent table.
pub fn enforce_foreign_keys(
    registry: &Registry,
    catalog: &Arc<dyn Catalog>,
    database: &str,
    table: &str,
    schema: &Schema,
    values: &[Value],
) -> Result<()> {
    for constraint in registry.table_constraints(database, table) {
        let TableConstraint::ForeignKey { name, columns, ref_table, ref_columns, .. } = constraint else {
            continue;
        };
        let child_values: Vec<Value> = columns
            .iter()
            .map(|c| schema.ordinal(c).and_then(|o| values.get(o).cloned()).unwrap_or(Value::Null))
            .collect();
        if child_values.iter().any(Value::is_null) {
            continue;
        }
        if !parent_row_exists(catalog, database, ref_table, ref_columns, &child_values)? {
            let label = name.clone().unwrap_or_else(|| format!("fk_{table}_{ref_table}"));
            return Err(DriverError::Engine(EngineError::ForeignKeyViolation(label)));
        }
    }
    Ok(())
}

fn parent_row_exists(
    catalog: &Arc<dyn Catalog>,
    database: &str,
    parent_table: &str,
    ref_columns: &[String],
    key: &[Value],
) -> Result<bool> {
    let table = catalog.get_table(database, parent_table).map_err(DriverError::Engine)?;
    let schema = table.schema();
    let ordinals: Vec<usize> = ref_columns
        .iter()
        .map(|c| schema.ordinal(c).ok_or_else(|| DriverError::UnknownColumn(c.clone())))
        .collect::<Result<Vec<_>>>()?;
    for row in table.scan(None) {
        let row = row.map_err(DriverError::Engine)?;
        if ordinals.iter().zip(key).all(|(&o, v)| row.get(o) == Some(v)) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// One row that must be deleted or nulled-out in a child table to satisfy
/// `ON DELETE`/`ON UPDATE` cascades before (CASCADE) or instead of
/// (RESTRICT's rejection) the parent mutation proceeds.
pub enum CascadeAction {
    /// Delete the child row outright (`ON DELETE CASCADE`).
    DeleteRow { database: String, table: String, row_id: oxide_sql_types::RowId },
    /// Overwrite the child's FK columns with NULL (`ON DELETE/UPDATE SET NULL`).
    NullColumns { database: String, table: String, row_id: oxide_sql_types::RowId, columns: Vec<usize> },
    /// Reject the mutation outright (`RESTRICT`/`NO ACTION` with matching children).
    Restrict { table: String },
}

/// Finds every child row across every table in `database` that references
/// `parent_table` via `parent_row`'s current values, and decides the
/// cascade action for each based on its `ForeignKey`'s referential action.
/// `on_delete` selects whether `ON DELETE` or `ON UPDATE` actions apply.
/// Each constraint's parent-key values are looked up from `parent_row` by
/// column name rather than position, so differently-ordered or
/// differently-keyed foreign keys on the same parent are each matched
/// correctly.
pub fn plan_cascades(
    registry: &Registry,
    catalog: &Arc<dyn Catalog>,
    database: &str,
    parent_table: &str,
    parent_row: &Row,
    on_delete: bool,
) -> Result<Vec<CascadeAction>> {
    let mut actions = Vec::new();
    for child_table in catalog.list_tables(database) {
        for constraint in registry.table_constraints(database, &child_table) {
            let TableConstraint::ForeignKey {
                columns,
                ref_table,
                ref_columns,
                on_delete: fk_on_delete,
                on_update: fk_on_update,
                ..
            } = constraint
            else {
                continue;
            };
            if !ref_table.eq_ignore_ascii_case(parent_table) {
                continue;
            }
            let parent_key_values: Vec<Value> = ref_columns
                .iter()
                .map(|c| parent_row.schema.ordinal(c).and_then(|o| parent_row.values.get(o).cloned()).unwrap_or(Value::Null))
                .collect();
            let action = if on_delete { *fk_on_delete } else { *fk_on_update };
            let child = catalog.get_table(database, &child_table).map_err(DriverError::Engine)?;
            let child_schema = child.schema();
            let col_ordinals: Vec<usize> = columns
                .iter()
                .map(|c| child_schema.ordinal(c).ok_or_else(|| DriverError::UnknownColumn(c.clone())))
                .collect::<Result<Vec<_>>>()?;

            for row in child.scan(None) {
                let row = row.map_err(DriverError::Engine)?;
                let matches = col_ordinals.iter().zip(&parent_key_values).all(|(&o, v)| row.get(o) == Some(v));
                if !matches {
                    continue;
                }
                match action {
                    ReferentialAction::Cascade if on_delete => {
                        actions.push(CascadeAction::DeleteRow {
                            database: database.to_string(),
                            table: child_table.clone(),
                            row_id: row.row_id,
                        });
                    }
                    ReferentialAction::Cascade => {
                        // ON UPDATE CASCADE is out of scope for value propagation
                        // in this reference engine; treat as SET NULL-compatible
                        // no-op once the parent key has already changed, since
                        // there is no parent-old-value to re-derive from here.
                        actions.push(CascadeAction::NullColumns {
                            database: database.to_string(),
                            table: child_table.clone(),
                            row_id: row.row_id,
                            columns: col_ordinals.clone(),
                        });
                    }
                    ReferentialAction::SetNull | ReferentialAction::SetDefault => {
                        actions.push(CascadeAction::NullColumns {
                            database: database.to_string(),
                            table: child_table.clone(),
                            row_id: row.row_id,
                            columns: col_ordinals.clone(),
                        });
                    }
                    ReferentialAction::Restrict | ReferentialAction::NoAction => {
                        actions.push(CascadeAction::Restrict { table: child_table.clone() });
                    }
                }
            }
        }
    }
    Ok(actions)
}
