//! Stored procedure/function/trigger execution: a stack of call frames,
//! each holding its `DECLARE`d locals and (for a trigger body) the bound
//! `OLD`/`NEW` rows, and an interpreter over [`ProcStatement`] that
//! implements `IF`/`WHILE`/`REPEAT`/`LOOP`/`LEAVE`/`ITERATE`/`RETURN`.
//!
//! A frame's locals are exposed to `compile_expr` the same way a
//! correlated subquery's outer row is: as a synthetic single-row schema
//! pushed onto [`crate::builder::BuildCtx`]'s outer-frame stack, so
//! ordinary column-reference resolution also resolves `DECLARE`d
//! variables and `OLD.col`/`NEW.col` trigger references.

use std::collections::HashMap;
use std::sync::Arc;

use oxide_sql_core::ast::{Expr, ProcParam, ProcStatement};
use oxide_sql_types::{ColumnDef, ColumnType, Row, RowId, Schema, Value};

use crate::builder::{compile_expr, BuildCtx};
use crate::error::{DriverError, Result};
use crate::value_conv;

/// One call-level scope: a stored procedure/function invocation or a
/// trigger firing. `old`/`new` are only populated while running a trigger
/// body.
#[derive(Default)]
pub struct Frame {
    pub locals: HashMap<String, Value>,
    pub old: Option<Row>,
    pub new: Option<Row>,
    pub return_value: Option<Value>,
}

impl Frame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_trigger(old: Option<Row>, new: Option<Row>) -> Self {
        Self { old, new, ..Self::default() }
    }

    fn set_local(&mut self, name: &str, value: Value) {
        self.locals.insert(name.to_lowercase(), value);
    }

    fn get_local(&self, name: &str) -> Option<&Value> {
        self.locals.get(&name.to_lowercase())
    }
}

/// How a block's execution ended: fell through normally, or is bubbling a
/// `LEAVE`/`ITERATE`/`RETURN` up to the statement that can handle it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowSignal {
    Normal,
    Leave(String),
    Iterate(String),
    Return,
}

/// Builds the synthetic schema+row exposing one frame's locals and
/// `OLD`/`NEW` columns to [`compile_expr`] as an outer binding scope.
fn frame_binding(frame: &Frame) -> (Arc<Schema>, Row) {
    let mut columns = Vec::new();
    let mut values = Vec::new();
    for (name, value) in &frame.locals {
        columns.push(ColumnDef::new(name.clone(), value_type_of(value)));
        values.push(value.clone());
    }
    if let Some(old) = &frame.old {
        for col in old.schema.columns() {
            columns.push(col.clone().with_table("OLD"));
        }
        values.extend(old.values.iter().cloned());
    }
    if let Some(new) = &frame.new {
        for col in new.schema.columns() {
            columns.push(col.clone().with_table("NEW"));
        }
        values.extend(new.values.iter().cloned());
    }
    let schema = Arc::new(Schema::new(columns));
    let row = Row::new(schema.clone(), values, RowId(0));
    (schema, row)
}

fn value_type_of(value: &Value) -> ColumnType {
    match value {
        Value::Int(_) => ColumnType::Int,
        Value::BigInt(_) => ColumnType::BigInt,
        Value::Float(_) => ColumnType::Float,
        Value::Double(_) => ColumnType::Double,
        Value::Decimal(_) => ColumnType::Decimal { precision: 20, scale: 6 },
        Value::Bool(_) => ColumnType::Boolean,
        Value::Blob(_) => ColumnType::Blob,
        _ => ColumnType::Text,
    }
}

/// Handles `SET NEW.col = value` / `SET OLD.col = value` inside a trigger
/// body by writing straight into the bound `NEW`/`OLD` row, rather than
/// creating a plain local named e.g. `"new.col"`. Returns `false` for any
/// other assignment target, leaving it to the caller's local-variable path.
fn set_trigger_field(frame: &mut Frame, name: &str, value: &Value) -> bool {
    let Some((qualifier, column)) = name.split_once('.') else { return false };
    let row = if qualifier.eq_ignore_ascii_case("NEW") {
        frame.new.as_mut()
    } else if qualifier.eq_ignore_ascii_case("OLD") {
        frame.old.as_mut()
    } else {
        None
    };
    let Some(row) = row else { return false };
    let Some(ordinal) = row.schema.ordinal(column) else { return false };
    row.values[ordinal] = value.clone();
    true
}

/// Builds a [`BuildCtx`] with every frame on `stack` folded in as an outer
/// binding scope, exposing their `DECLARE`d locals and `OLD`/`NEW` columns
/// to ordinary column resolution — used both to evaluate one expression
/// (see [`eval_in_scope`]) and to run a whole nested *statement* (a
/// procedure/trigger body's `Exec(stmt)` leaf) so embedded SQL can
/// reference the enclosing scope's variables by name.
#[must_use]
pub fn ctx_with_frames(ctx: &BuildCtx, stack: &[Frame]) -> BuildCtx {
    let mut framed = ctx.clone();
    for frame in stack {
        let (schema, row) = frame_binding(frame);
        framed = framed.with_outer_frame(schema, row);
    }
    framed
}

/// Evaluates `expr` in the scope of the innermost frame on `stack`,
/// resolving `DECLARE`d locals and `OLD`/`NEW` columns before falling
/// through to plain column resolution (empty in procedural context).
pub fn eval_in_scope(expr: &Expr, stack: &[Frame], ctx: &BuildCtx) -> Result<Value> {
    let eval_ctx = ctx_with_frames(ctx, stack);
    let empty = Schema::empty();
    let evaluator = compile_expr(expr, &empty, &eval_ctx)?;
    let probe = Row::new(Arc::new(empty), Vec::new(), RowId(0));
    evaluator.eval(&probe).map_err(DriverError::Engine)
}

/// A callback a caller (the session, or `dml.rs` firing a trigger) supplies
/// to run a nested [`oxide_sql_core::ast::Statement`] for effect — this
/// module has no statement-dispatch logic of its own.
pub type RunNested<'a> = dyn FnMut(&oxide_sql_core::ast::Statement, &mut Vec<Frame>) -> Result<()> + 'a;

/// Runs `body` against `stack`'s top frame, returning the [`FlowSignal`]
/// that ended it. `exec` is invoked for an `Exec(stmt)` leaf, running a
/// nested DML/DQL statement for effect; it is supplied by the session so
/// this module does not need to depend on session dispatch directly.
pub fn run_block(
    body: &[ProcStatement],
    stack: &mut Vec<Frame>,
    ctx: &BuildCtx,
    exec: &mut RunNested<'_>,
) -> Result<FlowSignal> {
    for stmt in body {
        match run_statement(stmt, stack, ctx, exec)? {
            FlowSignal::Normal => {}
            signal => return Ok(signal),
        }
    }
    Ok(FlowSignal::Normal)
}

fn run_statement(
    stmt: &ProcStatement,
    stack: &mut Vec<Frame>,
    ctx: &BuildCtx,
    exec: &mut RunNested<'_>,
) -> Result<FlowSignal> {
    match stmt {
        ProcStatement::If { branches, else_branch } => {
            for (cond, body) in branches {
                if eval_in_scope(cond, stack, ctx)?.as_bool().map_err(DriverError::Engine)? == Some(true) {
                    return run_block(body, stack, ctx, exec);
                }
            }
            run_block(else_branch, stack, ctx, exec)
        }
        ProcStatement::While { label, cond, body } => {
            while eval_in_scope(cond, stack, ctx)?.as_bool().map_err(DriverError::Engine)? == Some(true) {
                match run_block(body, stack, ctx, exec)? {
                    FlowSignal::Normal => {}
                    FlowSignal::Iterate(l) if label.as_deref() == Some(l.as_str()) => {}
                    FlowSignal::Leave(l) if label.as_deref() == Some(l.as_str()) => return Ok(FlowSignal::Normal),
                    other => return Ok(other),
                }
            }
            Ok(FlowSignal::Normal)
        }
        ProcStatement::Repeat { label, body, until } => loop {
            match run_block(body, stack, ctx, exec)? {
                FlowSignal::Normal => {}
                FlowSignal::Iterate(l) if label.as_deref() == Some(l.as_str()) => {}
                FlowSignal::Leave(l) if label.as_deref() == Some(l.as_str()) => return Ok(FlowSignal::Normal),
                other => return Ok(other),
            }
            if eval_in_scope(until, stack, ctx)?.as_bool().map_err(DriverError::Engine)? == Some(true) {
                return Ok(FlowSignal::Normal);
            }
        },
        ProcStatement::Loop { label, body } => loop {
            match run_block(body, stack, ctx, exec)? {
                FlowSignal::Normal => {}
                FlowSignal::Iterate(l) if label.as_deref() == Some(l.as_str()) => {}
                FlowSignal::Leave(l) if label.as_deref() == Some(l.as_str()) => return Ok(FlowSignal::Normal),
                other => return Ok(other),
            }
        },
        ProcStatement::Leave(label) => Ok(FlowSignal::Leave(label.clone())),
        ProcStatement::Iterate(label) => Ok(FlowSignal::Iterate(label.clone())),
        ProcStatement::Return(expr) => {
            if let Some(expr) = expr {
                let value = eval_in_scope(expr, stack, ctx)?;
                if let Some(frame) = stack.last_mut() {
                    frame.return_value = Some(value);
                }
            }
            Ok(FlowSignal::Return)
        }
        ProcStatement::SetVar { name, value } => {
            let value = eval_in_scope(value, stack, ctx)?;
            if let Some(frame) = stack.last_mut() {
                if !set_trigger_field(frame, name, &value) {
                    frame.set_local(name, value);
                }
            }
            Ok(FlowSignal::Normal)
        }
        ProcStatement::Declare { name, data_type, default } => {
            let value = match default {
                Some(expr) => eval_in_scope(expr, stack, ctx)?,
                None => value_conv::default_for_column_type(&value_conv::data_type_to_column_type(data_type)),
            };
            if let Some(frame) = stack.last_mut() {
                frame.set_local(name, value);
            }
            Ok(FlowSignal::Normal)
        }
        ProcStatement::Call { name, args } => {
            let call = oxide_sql_core::ast::CallStatement { name: name.clone(), args: args.clone() };
            exec(&oxide_sql_core::ast::Statement::Call(call), stack)?;
            Ok(FlowSignal::Normal)
        }
        ProcStatement::Exec(inner) => {
            exec(inner, stack)?;
            Ok(FlowSignal::Normal)
        }
    }
}

/// Binds `args` (evaluated in the caller's scope) to `params` in a fresh
/// callee frame, honoring each parameter's `IN`/`OUT`/`INOUT` mode —
/// `OUT`/`INOUT` parameters are written back into the caller's matching
/// local variable after the body returns, when the corresponding call
/// argument is itself a bare variable reference.
pub fn bind_params(params: &[ProcParam], args: &[Expr], caller: &[Frame], ctx: &BuildCtx) -> Result<Frame> {
    let mut frame = Frame::new();
    for (param, arg) in params.iter().zip(args) {
        let value = if matches!(param.mode, oxide_sql_core::ast::ParamMode::Out) {
            value_conv::default_for_column_type(&value_conv::data_type_to_column_type(&param.data_type))
        } else {
            eval_in_scope(arg, caller, ctx)?
        };
        frame.set_local(&param.name, value);
    }
    Ok(frame)
}

/// Writes `OUT`/`INOUT` parameters from `callee` back into `caller`'s
/// local matching the call-site argument, when that argument is a bare
/// variable reference.
pub fn write_back_out_params(params: &[ProcParam], args: &[Expr], callee: &Frame, caller: &mut Frame) {
    for (param, arg) in params.iter().zip(args) {
        if matches!(param.mode, oxide_sql_core::ast::ParamMode::In) {
            continue;
        }
        if let Expr::Column { table: None, name, .. } = arg {
            if let Some(value) = callee.get_local(&param.name) {
                caller.set_local(name, value.clone());
            }
        }
    }
}
