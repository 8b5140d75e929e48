//! `SHOW DATABASES`/`TABLES`/`COLUMNS` and `DESCRIBE`: synthesizes a result
//! schema+rows from catalog metadata, the same pattern
//! `information_schema.rs`'s doc comment describes — `LIKE`/`WHERE`
//! filtering is applied afterward by wrapping the synthesized rows in a
//! `Filter`, never baked into the row synthesis itself.

use std::sync::Arc;

use oxide_sql_core::ast::{BinaryOp, ShowKind, ShowStatement};
use oxide_sql_engine::expr::Evaluator;
use oxide_sql_engine::operators::{Filter, InformationSchema, Operator};
use oxide_sql_types::{ColumnDef, ColumnType, Row, RowId, Schema, Value};

use crate::builder::{compile_expr, BuildCtx};
use crate::error::Result;

fn text_schema(names: &[&str]) -> Arc<Schema> {
    Arc::new(Schema::new(names.iter().map(|n| ColumnDef::new(*n, ColumnType::Text)).collect()))
}

fn text_row(schema: &Arc<Schema>, values: Vec<&str>) -> Row {
    Row::new(schema.clone(), values.into_iter().map(|v| Value::Text(v.to_string())).collect(), RowId(0))
}

fn describe_rows(schema: &Arc<Schema>) -> Vec<Row> {
    let out_schema = text_schema(&["Field", "Type", "Null", "Key", "Default", "Extra"]);
    schema
        .columns()
        .iter()
        .map(|col| {
            let null = if col.nullable { "YES" } else { "NO" };
            let key = if col.primary_key { "PRI" } else { "" };
            let extra = if col.auto_increment { "auto_increment" } else { "" };
            let default = col.default.as_ref().map_or_else(|| "NULL".to_string(), Value::to_text);
            Row::new(
                out_schema.clone(),
                vec![
                    Value::Text(col.name.clone()),
                    Value::Text(format!("{:?}", col.col_type)),
                    Value::Text(null.to_string()),
                    Value::Text(key.to_string()),
                    Value::Text(default),
                    Value::Text(extra.to_string()),
                ],
                RowId(0),
            )
        })
        .collect()
}

/// Builds the operator tree for `DESCRIBE table` / `SHOW COLUMNS FROM table`.
pub fn build_describe(ctx: &BuildCtx, database: &str, table: &str) -> Result<Box<dyn Operator>> {
    let schema = ctx.catalog.get_table_schema(database, table).map_err(crate::error::DriverError::Engine)?;
    let out_schema = text_schema(&["Field", "Type", "Null", "Key", "Default", "Extra"]);
    Ok(Box::new(InformationSchema::new(out_schema, describe_rows(&schema))))
}

fn apply_filters(ctx: &BuildCtx, mut op: Box<dyn Operator>, show: &ShowStatement, name_column: &str) -> Result<Box<dyn Operator>> {
    if let Some(pattern) = &show.like_pattern {
        let schema = op.schema();
        let ordinal = schema.ordinal(name_column).ok_or_else(|| crate::error::DriverError::UnknownColumn(name_column.to_string()))?;
        let predicate = Evaluator::Binary {
            op: BinaryOp::Like,
            left: Box::new(Evaluator::Column(ordinal)),
            right: Box::new(Evaluator::Constant(Value::Text(pattern.clone()))),
        };
        op = Box::new(Filter::new(op, predicate));
    }
    if let Some(where_clause) = &show.where_clause {
        let schema = op.schema();
        let predicate = compile_expr(where_clause, &schema, ctx)?;
        op = Box::new(Filter::new(op, predicate));
    }
    Ok(op)
}

/// Builds the operator tree for a `SHOW ...` statement.
pub fn build_show(ctx: &BuildCtx, show: &ShowStatement) -> Result<Box<dyn Operator>> {
    let (op, name_column): (Box<dyn Operator>, &str) = match &show.kind {
        ShowKind::Databases => {
            let schema = text_schema(&["Database"]);
            let rows = vec![
                text_row(&schema, vec!["information_schema"]),
                text_row(&schema, vec![&ctx.database]),
            ];
            (Box::new(InformationSchema::new(schema, rows)), "Database")
        }
        ShowKind::Tables { database } => {
            let db = database.clone().unwrap_or_else(|| ctx.database.clone());
            let schema = text_schema(&["Tables_in_database"]);
            let rows: Vec<Row> = ctx
                .catalog
                .list_tables(&db)
                .into_iter()
                .map(|name| Row::new(schema.clone(), vec![Value::Text(name)], RowId(0)))
                .collect();
            (Box::new(InformationSchema::new(schema, rows)), "Tables_in_database")
        }
        ShowKind::Columns { table } => {
            let schema = ctx.catalog.get_table_schema(&ctx.database, table).map_err(crate::error::DriverError::Engine)?;
            let out_schema = text_schema(&["Field", "Type", "Null", "Key", "Default", "Extra"]);
            (Box::new(InformationSchema::new(out_schema, describe_rows(&schema))), "Field")
        }
    };
    apply_filters(ctx, op, show, name_column)
}
