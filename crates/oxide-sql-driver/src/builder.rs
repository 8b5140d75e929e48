//! Translates a parsed `SELECT` (and the `SELECT`-shaped parts of
//! `INSERT ... SELECT`, `CREATE VIEW`, and scalar/`EXISTS`/`IN` subqueries)
//! into a driven operator tree, assembled bottom-up the way the query
//! actually runs: scan/join first, then filter, group, window, project,
//! combine, order, limit.
//!
//! CTEs are materialized once per query (iterating recursive members to a
//! fixed point) before anything referencing them by name is built. Views
//! are expanded by re-parsing their stored `SELECT` text and recursing.
//! Correlated subqueries compile to a [`oxide_sql_engine::expr::CompiledSubquery`]
//! whose factory closure rebuilds the operator tree per outer row, binding
//! the outer row's columns as constants; the correlation check that picks
//! the cache key is intentionally conservative (it can flag an
//! uncorrelated subquery as correlated, never the reverse).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use oxide_sql_core::ast::{
    BinaryOp, Expr, FunctionCall, JoinClause, JoinType, Literal, LockMode as AstLockMode, OrderDirection,
    Quantifier as AstQuantifier, SelectColumn, SelectStatement, SetOp, TableRef, WaitPolicy as AstWaitPolicy,
};
use oxide_sql_core::{Parser, Statement};
use oxide_sql_engine::expr::{is_aggregate_name, CompiledSubquery, Evaluator, Quantifier as EngineQuantifier, SubqueryFactory};
use oxide_sql_engine::operators::{
    Alias, AggregateKind, AggregateSpec, CteOperator, Distinct, Dual, Except, Filter, GroupBy, Intersect,
    JoinCondition, Limit, LockingContext, NestedLoopJoin, Operator, OrderBy as OrderByOp, Project, ProjectColumn,
    SetOpQuantifier, SortKey, TableScan, Union, Window, WindowFunction, WindowSpec as EngineWindowSpec,
};
use oxide_sql_engine::storage::{
    Catalog, LockMode as StorageLockMode, ReadView, RecordLockManager, TxId, WaitPolicy as StorageWaitPolicy,
};
use oxide_sql_types::{canonical_group_key, ColumnDef, ColumnType, Error as EngineError, Row, Schema, Value};

use crate::error::DriverError;
use crate::value_conv;

type Result<T> = std::result::Result<T, DriverError>;

/// Everything the builder needs beyond the statement itself: storage
/// handles, the active snapshot/lock policy, CTEs materialized so far in
/// the enclosing query, and (while compiling a correlated subquery's body)
/// the chain of outer schemas/rows a bare column reference may bind to.
#[derive(Clone)]
pub struct BuildCtx {
    pub catalog: Arc<dyn Catalog>,
    pub database: String,
    pub tx: TxId,
    pub read_view: Option<Arc<dyn ReadView>>,
    pub lock_manager: Option<Arc<dyn RecordLockManager>>,
    pub lock_timeout: Duration,
    pub locking: Option<LockingContext>,
    pub ctes: Arc<HashMap<String, (Arc<Schema>, Arc<Vec<Row>>)>>,
    pub spill_budget_bytes: usize,
    agg_map: Option<Arc<HashMap<String, usize>>>,
    win_map: Option<Arc<HashMap<String, usize>>>,
    outer_frames: Vec<(Arc<Schema>, Row)>,
}

impl BuildCtx {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        database: impl Into<String>,
        tx: TxId,
        read_view: Option<Arc<dyn ReadView>>,
        lock_manager: Option<Arc<dyn RecordLockManager>>,
        spill_budget_bytes: usize,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            database: database.into(),
            tx,
            read_view,
            lock_manager,
            lock_timeout,
            locking: None,
            ctes: Arc::new(HashMap::new()),
            spill_budget_bytes,
            agg_map: None,
            win_map: None,
            outer_frames: Vec::new(),
        }
    }

    /// Returns a copy of this context with one extra outer binding scope
    /// pushed, so a bare column reference that does not resolve locally
    /// falls through to `row`'s columns under `schema`. Used by the
    /// procedural-statement interpreter to make local variables and
    /// `OLD`/`NEW` trigger rows visible to `compile_expr`.
    #[must_use]
    pub(crate) fn with_outer_frame(&self, schema: Arc<Schema>, row: Row) -> Self {
        let mut ctx = self.clone();
        ctx.outer_frames.push((schema, row));
        ctx
    }
}

fn to_engine_error(err: DriverError) -> EngineError {
    match err {
        DriverError::Engine(e) => e,
        other => EngineError::Internal(other.to_string()),
    }
}

/// Depth-first walk of an expression tree, stopping at the boundary of a
/// nested `SELECT` (its own columns/WHERE/HAVING belong to a different
/// resolution scope and are not visited here).
fn walk_expr(expr: &Expr, f: &mut impl FnMut(&Expr)) {
    f(expr);
    match expr {
        Expr::Binary { left, right, .. } => {
            walk_expr(left, f);
            walk_expr(right, f);
        }
        Expr::Unary { operand, .. } => walk_expr(operand, f),
        Expr::Function(call) => {
            for arg in &call.args {
                walk_expr(arg, f);
            }
        }
        Expr::IsNull { expr, .. } => walk_expr(expr, f),
        Expr::In { expr, list, .. } => {
            walk_expr(expr, f);
            for item in list {
                if !matches!(item, Expr::Subquery(_)) {
                    walk_expr(item, f);
                }
            }
        }
        Expr::Between { expr, low, high, .. } => {
            walk_expr(expr, f);
            walk_expr(low, f);
            walk_expr(high, f);
        }
        Expr::Case { operand, when_clauses, else_clause } => {
            if let Some(operand) = operand {
                walk_expr(operand, f);
            }
            for (when, then) in when_clauses {
                walk_expr(when, f);
                walk_expr(then, f);
            }
            if let Some(else_clause) = else_clause {
                walk_expr(else_clause, f);
            }
        }
        Expr::Cast { expr, .. } => walk_expr(expr, f),
        Expr::Paren(inner) => walk_expr(inner, f),
        Expr::Quantified { left, .. } => walk_expr(left, f),
        Expr::MatchAgainst { against, .. } => walk_expr(against, f),
        Expr::Exists { .. } | Expr::Subquery(_) => {}
        Expr::Literal(_) | Expr::Column { .. } | Expr::SessionVar { .. } | Expr::Parameter { .. } | Expr::Wildcard { .. } => {}
    }
}

// --- aggregate / window discovery -----------------------------------------

fn collect_aggregate_expr(expr: &Expr, out: &mut Vec<Expr>) {
    walk_expr(expr, &mut |e| {
        if let Expr::Function(call) = e {
            if call.over.is_none() && is_aggregate_name(&call.name) {
                out.push(e.clone());
            }
        }
    });
}

fn contains_aggregate_expr(expr: &Expr) -> bool {
    let mut found = false;
    walk_expr(expr, &mut |e| {
        if let Expr::Function(call) = e {
            if call.over.is_none() && is_aggregate_name(&call.name) {
                found = true;
            }
        }
    });
    found
}

fn collect_window_expr(expr: &Expr, out: &mut Vec<Expr>) {
    walk_expr(expr, &mut |e| {
        if let Expr::Function(call) = e {
            if call.over.is_some() {
                out.push(e.clone());
            }
        }
    });
}

fn dedup_exprs(exprs: &mut Vec<Expr>) {
    let mut seen = std::collections::HashSet::new();
    exprs.retain(|e| seen.insert(format!("{e:?}")));
}

// --- correlation detection --------------------------------------------------

/// Conservative (over-inclusive) structural check: true if any bare column
/// reference anywhere inside `select` — including beneath its own nested
/// subqueries — happens to name a column that exists in `outer`. This never
/// misses a real correlation; it may flag a same-named-but-unrelated column
/// as correlated, which only costs a cache-key computation, not correctness.
fn is_correlated(select: &SelectStatement, outer: &Schema) -> bool {
    let mut found = false;
    check_select(select, outer, &mut found);
    found
}

fn check_select(select: &SelectStatement, outer: &Schema, found: &mut bool) {
    if *found {
        return;
    }
    if let Some(where_clause) = &select.where_clause {
        check_expr(where_clause, outer, found);
    }
    if let Some(having) = &select.having {
        check_expr(having, outer, found);
    }
    for col in &select.columns {
        check_expr(&col.expr, outer, found);
    }
    for g in &select.group_by {
        check_expr(g, outer, found);
    }
    for ob in &select.order_by {
        check_expr(&ob.expr, outer, found);
    }
    if let Some(from) = &select.from {
        check_table_ref(from, outer, found);
    }
    for leg in &select.set_ops {
        check_select(&leg.select, outer, found);
    }
}

fn check_table_ref(table_ref: &TableRef, outer: &Schema, found: &mut bool) {
    match table_ref {
        TableRef::Table { .. } => {}
        TableRef::Subquery { query, .. } => check_select(query, outer, found),
        TableRef::Join { left, join } => {
            check_table_ref(left, outer, found);
            check_table_ref(&join.table, outer, found);
            if let Some(on) = &join.on {
                check_expr(on, outer, found);
            }
        }
    }
}

fn check_expr(expr: &Expr, outer: &Schema, found: &mut bool) {
    if *found {
        return;
    }
    walk_expr(expr, &mut |e| {
        if let Expr::Column { table, name, .. } = e {
            let hit = match table {
                Some(t) => outer.ordinal_qualified(t, name).is_some(),
                None => outer.ordinal(name).is_some(),
            };
            if hit {
                *found = true;
            }
        }
    });
    match expr {
        Expr::Subquery(s) | Expr::Exists { subquery: s, .. } | Expr::Quantified { subquery: s, .. } => {
            check_select(s, outer, found);
        }
        Expr::In { list, .. } => {
            for item in list {
                if let Expr::Subquery(s) = item {
                    check_select(s, outer, found);
                }
            }
        }
        _ => {}
    }
}

// --- scalar expression compilation -----------------------------------------

fn map_quantifier(q: AstQuantifier) -> EngineQuantifier {
    match q {
        AstQuantifier::All => EngineQuantifier::All,
        AstQuantifier::Any => EngineQuantifier::Any,
    }
}

fn resolve_column(schema: &Schema, ctx: &BuildCtx, table: Option<&str>, name: &str) -> Result<Evaluator> {
    let local = match table {
        Some(t) => schema.ordinal_qualified(t, name),
        None => schema.ordinal(name),
    };
    if let Some(ordinal) = local {
        return Ok(Evaluator::Column(ordinal));
    }
    for (outer_schema, outer_row) in ctx.outer_frames.iter().rev() {
        let ordinal = match table {
            Some(t) => outer_schema.ordinal_qualified(t, name),
            None => outer_schema.ordinal(name),
        };
        if let Some(ordinal) = ordinal {
            let value = outer_row.get(ordinal).cloned().unwrap_or(Value::Null);
            return Ok(Evaluator::Constant(value));
        }
    }
    Err(DriverError::UnknownColumn(match table {
        Some(t) => format!("{t}.{name}"),
        None => name.to_string(),
    }))
}

/// Compiles an AST expression against `schema` into an evaluator. `schema`
/// is whatever the current stage of the operator tree outputs at the point
/// this expression will run — the FROM/JOIN schema for a `WHERE`, the
/// `GROUP BY` output for a `HAVING`, and so on.
pub fn compile_expr(expr: &Expr, schema: &Schema, ctx: &BuildCtx) -> Result<Evaluator> {
    match expr {
        Expr::Literal(lit) => Ok(Evaluator::Constant(value_conv::literal_to_value(lit))),
        Expr::Column { table, name, .. } => resolve_column(schema, ctx, table.as_deref(), name),
        Expr::Binary { left, op, right } => Ok(Evaluator::Binary {
            op: *op,
            left: Box::new(compile_expr(left, schema, ctx)?),
            right: Box::new(compile_expr(right, schema, ctx)?),
        }),
        Expr::Unary { op, operand } => Ok(Evaluator::Unary {
            op: *op,
            operand: Box::new(compile_expr(operand, schema, ctx)?),
        }),
        Expr::Function(call) => compile_scalar_function(expr, call, schema, ctx),
        Expr::Subquery(subquery) => Ok(Evaluator::ScalarSubquery(compile_subquery(ctx, schema, subquery)?)),
        Expr::Exists { subquery, negated } => Ok(Evaluator::Exists {
            subquery: compile_subquery(ctx, schema, subquery)?,
            negated: *negated,
        }),
        Expr::Quantified { left, op, quantifier, subquery } => Ok(Evaluator::Quantified {
            left: Box::new(compile_expr(left, schema, ctx)?),
            op: *op,
            quantifier: map_quantifier(*quantifier),
            subquery: compile_subquery(ctx, schema, subquery)?,
        }),
        Expr::MatchAgainst { columns, against } => {
            let ordinals = columns
                .iter()
                .map(|c| schema.ordinal(c).ok_or_else(|| DriverError::UnknownColumn(c.clone())))
                .collect::<Result<Vec<_>>>()?;
            Ok(Evaluator::MatchAgainst {
                columns: ordinals,
                against: Box::new(compile_expr(against, schema, ctx)?),
            })
        }
        Expr::SessionVar { name, global } => Ok(Evaluator::SessionVar { name: name.clone(), global: *global }),
        Expr::IsNull { expr: inner, negated } => Ok(Evaluator::IsNull {
            operand: Box::new(compile_expr(inner, schema, ctx)?),
            negated: *negated,
        }),
        Expr::In { expr: inner, list, negated } => {
            if let [Expr::Subquery(subquery)] = list.as_slice() {
                return Ok(Evaluator::InSubquery {
                    expr: Box::new(compile_expr(inner, schema, ctx)?),
                    subquery: compile_subquery(ctx, schema, subquery)?,
                    negated: *negated,
                });
            }
            let compiled_list = list.iter().map(|e| compile_expr(e, schema, ctx)).collect::<Result<Vec<_>>>()?;
            Ok(Evaluator::InList {
                expr: Box::new(compile_expr(inner, schema, ctx)?),
                list: compiled_list,
                negated: *negated,
            })
        }
        Expr::Between { expr: inner, low, high, negated } => Ok(Evaluator::Between {
            expr: Box::new(compile_expr(inner, schema, ctx)?),
            low: Box::new(compile_expr(low, schema, ctx)?),
            high: Box::new(compile_expr(high, schema, ctx)?),
            negated: *negated,
        }),
        Expr::Case { operand, when_clauses, else_clause } => Ok(Evaluator::Case {
            operand: operand.as_ref().map(|o| compile_expr(o, schema, ctx)).transpose()?.map(Box::new),
            when_then: when_clauses
                .iter()
                .map(|(when, then)| Ok((compile_expr(when, schema, ctx)?, compile_expr(then, schema, ctx)?)))
                .collect::<Result<Vec<_>>>()?,
            else_clause: else_clause.as_ref().map(|e| compile_expr(e, schema, ctx)).transpose()?.map(Box::new),
        }),
        Expr::Cast { expr: inner, data_type } => Ok(Evaluator::Cast {
            expr: Box::new(compile_expr(inner, schema, ctx)?),
            target: value_conv::data_type_to_cast_target(data_type),
        }),
        Expr::Paren(inner) => compile_expr(inner, schema, ctx),
        Expr::Parameter { position, .. } => Ok(Evaluator::Parameter(if *position == 0 { None } else { Some(*position) })),
        Expr::Wildcard { .. } => Err(DriverError::Unsupported("'*' is only valid directly in a SELECT column list".into())),
    }
}

fn compile_scalar_function(expr: &Expr, call: &FunctionCall, schema: &Schema, ctx: &BuildCtx) -> Result<Evaluator> {
    let key = format!("{expr:?}");
    if call.over.is_some() {
        if let Some(map) = &ctx.win_map {
            if let Some(&ordinal) = map.get(&key) {
                return Ok(Evaluator::Column(ordinal));
            }
        }
        return Err(DriverError::Unsupported(format!(
            "window function '{}' is not in a position its OVER clause can be resolved from",
            call.name
        )));
    }
    if is_aggregate_name(&call.name) {
        if let Some(map) = &ctx.agg_map {
            if let Some(&ordinal) = map.get(&key) {
                return Ok(Evaluator::Column(ordinal));
            }
        }
        return Err(DriverError::Unsupported(format!("'{}' may only appear in a GROUP BY query", call.name)));
    }
    let args = call.args.iter().map(|a| compile_expr(a, schema, ctx)).collect::<Result<Vec<_>>>()?;
    Ok(Evaluator::FunctionCall { name: call.name.clone(), args, distinct: call.distinct })
}

fn compile_subquery(ctx: &BuildCtx, schema: &Schema, subquery: &SelectStatement) -> Result<Arc<CompiledSubquery>> {
    let correlated = is_correlated(subquery, schema);
    let select = subquery.clone();
    let base_ctx = ctx.clone();
    let outer_schema = Arc::new(schema.clone());
    let factory: SubqueryFactory = Arc::new(move |outer_row: Option<&Row>| {
        let mut inner_ctx = base_ctx.clone();
        if let Some(row) = outer_row {
            inner_ctx.outer_frames.push((outer_schema.clone(), row.clone()));
        }
        build_select(&inner_ctx, &select).map(|op| op as Box<dyn Operator>).map_err(to_engine_error)
    });
    Ok(Arc::new(CompiledSubquery::new(factory, correlated)))
}

// --- aggregates -------------------------------------------------------------

fn aggregate_output_type(call: &FunctionCall) -> ColumnType {
    match call.name.to_ascii_uppercase().as_str() {
        "COUNT" => ColumnType::BigInt,
        "GROUP_CONCAT" => ColumnType::Text,
        _ => ColumnType::Double,
    }
}

fn compile_aggregate_kind(call: &FunctionCall, schema: &Schema, ctx: &BuildCtx) -> Result<AggregateKind> {
    let upper = call.name.to_ascii_uppercase();
    let first_arg = |call: &FunctionCall| -> Result<Evaluator> { compile_expr(&call.args[0], schema, ctx) };
    Ok(match upper.as_str() {
        "COUNT" => {
            if matches!(call.args.as_slice(), [Expr::Wildcard { .. }]) {
                AggregateKind::Count { arg: None, distinct: call.distinct }
            } else {
                AggregateKind::Count { arg: Some(first_arg(call)?), distinct: call.distinct }
            }
        }
        "SUM" => AggregateKind::Sum { arg: first_arg(call)?, distinct: call.distinct },
        "AVG" => AggregateKind::Avg { arg: first_arg(call)?, distinct: call.distinct },
        "MIN" => AggregateKind::Min(first_arg(call)?),
        "MAX" => AggregateKind::Max(first_arg(call)?),
        "GROUP_CONCAT" => AggregateKind::GroupConcat {
            arg: first_arg(call)?,
            distinct: call.distinct,
            separator: ",".to_string(),
        },
        other => return Err(DriverError::Unsupported(format!("unknown aggregate function '{other}'"))),
    })
}

fn group_by_output_column(expr: &Expr, schema: &Schema, index: usize) -> ColumnDef {
    if let Expr::Column { table, name, .. } = expr {
        let ordinal = match table {
            Some(t) => schema.ordinal_qualified(t, name),
            None => schema.ordinal(name),
        };
        if let Some(col) = ordinal.and_then(|o| schema.column(o)) {
            return col.clone();
        }
    }
    ColumnDef::new(format!("group_{index}"), ColumnType::Text)
}

// --- window functions --------------------------------------------------------

fn literal_i64(expr: &Expr) -> Result<i64> {
    match expr {
        Expr::Literal(Literal::Integer(i)) => Ok(*i),
        _ => Err(DriverError::Unsupported("expected a constant integer argument".into())),
    }
}

fn window_output_type(name: &str) -> ColumnType {
    match name {
        "ROW_NUMBER" | "RANK" | "DENSE_RANK" | "NTILE" | "COUNT" => ColumnType::BigInt,
        "CUME_DIST" | "PERCENT_RANK" => ColumnType::Double,
        _ => ColumnType::Double,
    }
}

fn compile_window_spec(call: &FunctionCall, schema: &Schema, ctx: &BuildCtx) -> Result<EngineWindowSpec> {
    let over = call
        .over
        .as_ref()
        .ok_or_else(|| DriverError::Unsupported(format!("'{}' requires an OVER clause", call.name)))?;
    let partition_by = over.partition_by.iter().map(|e| compile_expr(e, schema, ctx)).collect::<Result<Vec<_>>>()?;
    let order_by = over
        .order_by
        .iter()
        .map(|ob| {
            Ok(SortKey {
                evaluator: compile_expr(&ob.expr, schema, ctx)?,
                descending: matches!(ob.direction, OrderDirection::Desc),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let upper = call.name.to_ascii_uppercase();
    let arg = |i: usize| -> Result<Evaluator> { compile_expr(&call.args[i], schema, ctx) };
    let function = match upper.as_str() {
        "ROW_NUMBER" => WindowFunction::RowNumber,
        "RANK" => WindowFunction::Rank,
        "DENSE_RANK" => WindowFunction::DenseRank,
        "NTILE" => WindowFunction::Ntile(literal_i64(&call.args[0])?),
        "LAG" => WindowFunction::Lag {
            arg: arg(0)?,
            offset: call.args.get(1).map(literal_i64).transpose()?.unwrap_or(1),
            default: call.args.get(2).map(|e| compile_expr(e, schema, ctx)).transpose()?.unwrap_or(Evaluator::Constant(Value::Null)),
        },
        "LEAD" => WindowFunction::Lead {
            arg: arg(0)?,
            offset: call.args.get(1).map(literal_i64).transpose()?.unwrap_or(1),
            default: call.args.get(2).map(|e| compile_expr(e, schema, ctx)).transpose()?.unwrap_or(Evaluator::Constant(Value::Null)),
        },
        "FIRST_VALUE" => WindowFunction::FirstValue(arg(0)?),
        "LAST_VALUE" => WindowFunction::LastValue(arg(0)?),
        "NTH_VALUE" => WindowFunction::NthValue(arg(0)?, literal_i64(&call.args[1])?),
        "CUME_DIST" => WindowFunction::CumeDist,
        "PERCENT_RANK" => WindowFunction::PercentRank,
        "SUM" => WindowFunction::Sum(arg(0)?),
        "AVG" => WindowFunction::Avg(arg(0)?),
        "MIN" => WindowFunction::Min(arg(0)?),
        "MAX" => WindowFunction::Max(arg(0)?),
        "COUNT" => {
            if matches!(call.args.as_slice(), [Expr::Wildcard { .. }]) {
                WindowFunction::Count(None)
            } else {
                WindowFunction::Count(Some(arg(0)?))
            }
        }
        other => return Err(DriverError::Unsupported(format!("unknown window function '{other}'"))),
    };
    let output = ColumnDef::new(call.name.to_lowercase(), window_output_type(&upper));
    Ok(EngineWindowSpec { function, partition_by, order_by, output })
}

// --- SELECT column list ------------------------------------------------------

fn default_column_name(expr: &Expr) -> String {
    match expr {
        Expr::Column { name, .. } => name.clone(),
        Expr::Function(call) => call.name.to_lowercase(),
        Expr::Literal(_) => "literal".to_string(),
        _ => "expr".to_string(),
    }
}

fn infer_output_type(expr: &Expr, schema: &Schema) -> ColumnType {
    match expr {
        Expr::Column { table, name, .. } => {
            let ordinal = match table {
                Some(t) => schema.ordinal_qualified(t, name),
                None => schema.ordinal(name),
            };
            ordinal.and_then(|o| schema.column(o)).map_or(ColumnType::Text, |c| c.col_type.clone())
        }
        Expr::Cast { data_type, .. } => value_conv::data_type_to_column_type(data_type),
        Expr::Literal(Literal::Integer(_)) => ColumnType::BigInt,
        Expr::Literal(Literal::Float(_)) => ColumnType::Double,
        Expr::Literal(Literal::Boolean(_)) => ColumnType::Boolean,
        Expr::Function(call) if is_aggregate_name(&call.name) => aggregate_output_type(call),
        _ => ColumnType::Text,
    }
}

fn expand_select_column(col: &SelectColumn, schema: &Schema, ctx: &BuildCtx, out: &mut Vec<ProjectColumn>) -> Result<()> {
    match &col.expr {
        Expr::Wildcard { table: None } => {
            for (i, c) in schema.columns().iter().enumerate() {
                out.push(ProjectColumn { evaluator: Evaluator::Column(i), output: c.clone() });
            }
            Ok(())
        }
        Expr::Wildcard { table: Some(t) } => {
            for (i, c) in schema.columns().iter().enumerate() {
                if c.table.as_deref().is_some_and(|x| x.eq_ignore_ascii_case(t)) {
                    out.push(ProjectColumn { evaluator: Evaluator::Column(i), output: c.clone() });
                }
            }
            Ok(())
        }
        other => {
            let evaluator = compile_expr(other, schema, ctx)?;
            let name = col.alias.clone().unwrap_or_else(|| default_column_name(other));
            let output = ColumnDef::new(name, infer_output_type(other, schema));
            out.push(ProjectColumn { evaluator, output });
            Ok(())
        }
    }
}

fn eval_const_u64(expr: &Option<Expr>, ctx: &BuildCtx) -> Result<Option<u64>> {
    let Some(expr) = expr else { return Ok(None) };
    let empty = Schema::empty();
    let evaluator = compile_expr(expr, &empty, ctx)?;
    let row = Row::new(Arc::new(empty), Vec::new(), oxide_sql_types::RowId(0));
    let value = evaluator.eval(&row).map_err(DriverError::Engine)?;
    match value {
        Value::Int(i) => Ok(Some(i.max(0) as u64)),
        Value::BigInt(i) => Ok(Some(i.max(0) as u64)),
        other => Err(DriverError::Unsupported(format!("LIMIT/OFFSET must be an integer, found {other:?}"))),
    }
}

/// Evaluates a constant expression with no row context, for column
/// `DEFAULT` clauses and other DDL-time literals.
pub(crate) fn eval_constant(expr: &Expr, ctx: &BuildCtx) -> Result<Value> {
    let empty = Schema::empty();
    let evaluator = compile_expr(expr, &empty, ctx)?;
    let row = Row::new(Arc::new(empty), Vec::new(), oxide_sql_types::RowId(0));
    evaluator.eval(&row).map_err(DriverError::Engine)
}

// --- FROM / JOIN --------------------------------------------------------------

fn alias_op(op: Box<dyn Operator>, alias: Option<&str>) -> Box<dyn Operator> {
    match alias {
        Some(a) => Box::new(Alias::new(op, a)),
        None => op,
    }
}

pub(crate) fn build_from(ctx: &BuildCtx, table_ref: &TableRef) -> Result<Box<dyn Operator>> {
    match table_ref {
        TableRef::Table { schema: db_override, name, alias } => {
            if db_override.is_none() {
                if let Some((cte_schema, rows)) = ctx.ctes.get(&name.to_lowercase()) {
                    let op: Box<dyn Operator> = Box::new(CteOperator::new(cte_schema.clone(), rows.clone()));
                    return Ok(alias_op(op, alias.as_deref()));
                }
            }
            let database = db_override.clone().unwrap_or_else(|| ctx.database.clone());
            if let Some(view_source) = ctx.catalog.get_view(&database, name).map_err(DriverError::Engine)? {
                let mut parser = Parser::new(&view_source);
                let view_select = match parser.parse_statement()? {
                    Statement::Select(select) => select,
                    _ => return Err(DriverError::Unsupported(format!("view '{name}' does not store a SELECT"))),
                };
                let op = build_select(ctx, &view_select)?;
                return Ok(alias_op(op, alias.as_deref().or(Some(name.as_str()))));
            }
            let table = ctx.catalog.get_table(&database, name).map_err(DriverError::Engine)?;
            let op: Box<dyn Operator> = Box::new(TableScan::new(
                database,
                name.clone(),
                table,
                ctx.read_view.clone(),
                ctx.locking.clone(),
                ctx.lock_manager.clone(),
            ));
            Ok(alias_op(op, alias.as_deref().or(Some(name.as_str()))))
        }
        TableRef::Subquery { query, alias } => {
            let op = build_select(ctx, query)?;
            Ok(Box::new(Alias::new(op, alias)))
        }
        TableRef::Join { left, join } => build_join(ctx, left, join),
    }
}

fn build_join(ctx: &BuildCtx, left: &TableRef, join: &JoinClause) -> Result<Box<dyn Operator>> {
    let left_op = build_from(ctx, left)?;
    let right_op = build_from(ctx, &join.table)?;
    let left_schema = left_op.schema();
    let right_schema = right_op.schema();
    let combined = Schema::join(&left_schema, &right_schema);

    let mut predicate = join.on.as_ref().map(|e| compile_expr(e, &combined, ctx)).transpose()?;
    for column in &join.using {
        let l = left_schema.ordinal(column).ok_or_else(|| DriverError::UnknownColumn(column.clone()))?;
        let r = right_schema.ordinal(column).ok_or_else(|| DriverError::UnknownColumn(column.clone()))?;
        let eq = Evaluator::Binary {
            op: BinaryOp::Eq,
            left: Box::new(Evaluator::Column(l)),
            right: Box::new(Evaluator::Column(left_schema.len() + r)),
        };
        predicate = Some(match predicate {
            Some(p) => Evaluator::Binary { op: BinaryOp::And, left: Box::new(p), right: Box::new(eq) },
            None => eq,
        });
    }

    let condition = match join.join_type {
        JoinType::Inner => predicate.map_or(JoinCondition::Cross, JoinCondition::Inner),
        JoinType::Left => JoinCondition::Left(predicate.unwrap_or(Evaluator::Constant(Value::Bool(true)))),
        JoinType::Right => JoinCondition::Right(predicate.unwrap_or(Evaluator::Constant(Value::Bool(true)))),
        JoinType::Full => JoinCondition::Full(predicate.unwrap_or(Evaluator::Constant(Value::Bool(true)))),
        JoinType::Cross => JoinCondition::Cross,
    };
    Ok(Box::new(NestedLoopJoin::new(left_op, right_op, condition)))
}

// --- CTE materialization ------------------------------------------------------

pub(crate) fn run_to_rows(mut op: Box<dyn Operator>) -> Result<(Arc<Schema>, Vec<Row>)> {
    op.open().map_err(DriverError::Engine)?;
    let schema = op.schema();
    let mut rows = Vec::new();
    while let Some(row) = op.next().map_err(DriverError::Engine)? {
        rows.push(row);
    }
    op.close().map_err(DriverError::Engine)?;
    Ok((schema, rows))
}

const RECURSIVE_CTE_ITERATION_LIMIT: usize = 10_000;

fn materialize_recursive_cte(
    ctx: &BuildCtx,
    base: &HashMap<String, (Arc<Schema>, Arc<Vec<Row>>)>,
    cte: &oxide_sql_core::ast::CteDef,
) -> Result<(Arc<Schema>, Arc<Vec<Row>>)> {
    let anchor = SelectStatement { set_ops: Vec::new(), ..(*cte.query).clone() };
    let mut map = base.clone();
    let anchor_ctx = BuildCtx { ctes: Arc::new(map.clone()), ..ctx.clone() };
    let (schema, anchor_rows) = run_to_rows(build_select(&anchor_ctx, &anchor)?)?;

    let mut seen: std::collections::HashSet<String> =
        anchor_rows.iter().map(|r| canonical_group_key(&r.values)).collect();
    let mut all_rows = anchor_rows;
    let mut frontier = all_rows.clone();
    let name_key = cte.name.to_lowercase();

    let mut iteration = 0usize;
    while !frontier.is_empty() {
        iteration += 1;
        if iteration > RECURSIVE_CTE_ITERATION_LIMIT {
            return Err(DriverError::RecursionLimit(cte.name.clone()));
        }
        map.insert(name_key.clone(), (schema.clone(), Arc::new(std::mem::take(&mut frontier))));
        let leg_ctx = BuildCtx { ctes: Arc::new(map.clone()), ..ctx.clone() };

        let mut new_rows = Vec::new();
        for leg in &cte.query.set_ops {
            let (_, rows) = run_to_rows(build_select(&leg_ctx, &leg.select)?)?;
            for row in rows {
                let key = canonical_group_key(&row.values);
                if seen.insert(key) {
                    new_rows.push(row.rebind(schema.clone()));
                }
            }
        }
        all_rows.extend(new_rows.iter().cloned());
        frontier = new_rows;
    }
    Ok((schema, Arc::new(all_rows)))
}

fn materialize_ctes(ctx: &mut BuildCtx, ctes: &[oxide_sql_core::ast::CteDef]) -> Result<()> {
    let mut map = (*ctx.ctes).clone();
    for cte in ctes {
        let entry = if cte.recursive {
            materialize_recursive_cte(ctx, &map, cte)?
        } else {
            let inner_ctx = BuildCtx { ctes: Arc::new(map.clone()), ..ctx.clone() };
            let (schema, rows) = run_to_rows(build_select(&inner_ctx, &cte.query)?)?;
            (schema, Arc::new(rows))
        };
        map.insert(cte.name.to_lowercase(), entry);
    }
    ctx.ctes = Arc::new(map);
    Ok(())
}

// --- top-level SELECT builder -------------------------------------------------

fn map_lock_mode(mode: AstLockMode) -> StorageLockMode {
    match mode {
        AstLockMode::Update => StorageLockMode::Exclusive,
        AstLockMode::Share => StorageLockMode::Shared,
    }
}

fn map_wait_policy(policy: AstWaitPolicy) -> StorageWaitPolicy {
    match policy {
        AstWaitPolicy::Wait => StorageWaitPolicy::Wait,
        AstWaitPolicy::NoWait => StorageWaitPolicy::NoWait,
        AstWaitPolicy::SkipLocked => StorageWaitPolicy::SkipLocked,
    }
}

/// Builds the operator tree for one `SELECT`, including its CTEs, joins,
/// grouping, windowing, set operations, ordering and limiting.
pub fn build_select(ctx: &BuildCtx, select: &SelectStatement) -> Result<Box<dyn Operator>> {
    let mut ctx = ctx.clone();

    if let Some(locking) = &select.locking {
        ctx.locking = Some(LockingContext {
            mode: map_lock_mode(locking.mode),
            wait_policy: map_wait_policy(locking.wait),
            tx: ctx.tx,
            timeout: ctx.lock_timeout,
        });
    }

    if !select.ctes.is_empty() {
        materialize_ctes(&mut ctx, &select.ctes)?;
    }

    let mut op: Box<dyn Operator> = match &select.from {
        Some(table_ref) => build_from(&ctx, table_ref)?,
        None => Box::new(Dual::new()),
    };

    if let Some(where_clause) = &select.where_clause {
        let schema = op.schema();
        let predicate = compile_expr(where_clause, &schema, &ctx)?;
        op = Box::new(Filter::new(op, predicate));
    }

    let has_having_aggregate = select.having.as_ref().is_some_and(contains_aggregate_expr);
    let has_select_aggregate = select.columns.iter().any(|c| contains_aggregate_expr(&c.expr));
    if !select.group_by.is_empty() || has_having_aggregate || has_select_aggregate {
        let base_schema = op.schema();
        let group_exprs = select.group_by.iter().map(|e| compile_expr(e, &base_schema, &ctx)).collect::<Result<Vec<_>>>()?;
        let group_output: Vec<ColumnDef> =
            select.group_by.iter().enumerate().map(|(i, e)| group_by_output_column(e, &base_schema, i)).collect();

        let mut agg_exprs = Vec::new();
        for col in &select.columns {
            collect_aggregate_expr(&col.expr, &mut agg_exprs);
        }
        if let Some(having) = &select.having {
            collect_aggregate_expr(having, &mut agg_exprs);
        }
        for ob in &select.order_by {
            collect_aggregate_expr(&ob.expr, &mut agg_exprs);
        }
        dedup_exprs(&mut agg_exprs);

        let mut map = HashMap::with_capacity(agg_exprs.len());
        let mut aggregates = Vec::with_capacity(agg_exprs.len());
        for (i, expr) in agg_exprs.iter().enumerate() {
            let Expr::Function(call) = expr else {
                return Err(DriverError::Unsupported("internal: aggregate discovery returned a non-function expression".into()));
            };
            let kind = compile_aggregate_kind(call, &base_schema, &ctx)?;
            aggregates.push(AggregateSpec { kind, output: ColumnDef::new(format!("agg_{i}"), aggregate_output_type(call)) });
            map.insert(format!("{expr:?}"), group_output.len() + i);
        }
        ctx.agg_map = Some(Arc::new(map));
        op = Box::new(GroupBy::new(op, group_exprs, aggregates, group_output, ctx.spill_budget_bytes));
    }

    if let Some(having) = &select.having {
        let schema = op.schema();
        let predicate = compile_expr(having, &schema, &ctx)?;
        op = Box::new(Filter::new(op, predicate));
    }

    let mut window_exprs = Vec::new();
    for col in &select.columns {
        collect_window_expr(&col.expr, &mut window_exprs);
    }
    for ob in &select.order_by {
        collect_window_expr(&ob.expr, &mut window_exprs);
    }
    dedup_exprs(&mut window_exprs);
    if !window_exprs.is_empty() {
        let schema = op.schema();
        let base_len = schema.len();
        let mut specs = Vec::with_capacity(window_exprs.len());
        let mut map = HashMap::with_capacity(window_exprs.len());
        for (i, expr) in window_exprs.iter().enumerate() {
            let Expr::Function(call) = expr else {
                return Err(DriverError::Unsupported("internal: window discovery returned a non-function expression".into()));
            };
            specs.push(compile_window_spec(call, &schema, &ctx)?);
            map.insert(format!("{expr:?}"), base_len + i);
        }
        ctx.win_map = Some(Arc::new(map));
        op = Box::new(Window::new(op, specs));
    }

    let schema = op.schema();
    let mut columns = Vec::new();
    for col in &select.columns {
        expand_select_column(col, &schema, &ctx, &mut columns)?;
    }
    op = Box::new(Project::new(op, columns));

    if select.distinct {
        op = Box::new(Distinct::new(op));
    }

    for leg in &select.set_ops {
        let right = build_select(&ctx, &leg.select)?;
        let quantifier = if leg.all { SetOpQuantifier::All } else { SetOpQuantifier::Distinct };
        op = match leg.op {
            SetOp::Union => Box::new(Union::new(op, right, quantifier)),
            SetOp::Intersect => Box::new(Intersect::new(op, right, quantifier)),
            SetOp::Except => Box::new(Except::new(op, right, quantifier)),
        };
    }

    if !select.order_by.is_empty() {
        let schema = op.schema();
        let keys = select
            .order_by
            .iter()
            .map(|ob| {
                Ok(SortKey {
                    evaluator: compile_expr(&ob.expr, &schema, &ctx)?,
                    descending: matches!(ob.direction, OrderDirection::Desc),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        op = Box::new(OrderByOp::new(op, keys));
    }

    if select.limit.is_some() || select.offset.is_some() {
        let count = eval_const_u64(&select.limit, &ctx)?;
        let offset = eval_const_u64(&select.offset, &ctx)?.unwrap_or(0);
        op = Box::new(Limit::new(op, offset, count));
    }

    Ok(op)
}
