//! The expression evaluator: compiles AST expressions to a typed tree that,
//! given a row, returns a value without side effects (except time-of-day
//! and named-lock functions, which are marked impure in the function
//! catalog).

mod functions;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use oxide_sql_core::ast::{BinaryOp, UnaryOp};
use oxide_sql_types::{canonical_group_key, Error, Row, Value};

use crate::operators::Operator;

pub use functions::{call_builtin, is_aggregate_name};

/// A subquery's operator-tree factory: given the correlated outer row (or
/// `None` for a non-correlated subquery), builds a fresh, unopened operator
/// tree. The evaluator drives it to completion itself.
pub type SubqueryFactory = Arc<dyn Fn(Option<&Row>) -> Result<Box<dyn Operator>, Error> + Send + Sync>;

/// A compiled subquery reference: non-correlated subqueries memoize a
/// single result; correlated ones are keyed by the outer row's canonical
/// value-tuple string.
pub struct CompiledSubquery {
    pub factory: SubqueryFactory,
    pub correlated: bool,
    cache: Mutex<HashMap<String, Vec<Row>>>,
}

impl CompiledSubquery {
    #[must_use]
    pub fn new(factory: SubqueryFactory, correlated: bool) -> Self {
        Self {
            factory,
            correlated,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache_key(&self, outer: Option<&Row>) -> String {
        match (self.correlated, outer) {
            (true, Some(row)) => canonical_group_key(&row.values),
            _ => String::new(),
        }
    }

    /// Runs the subquery (if not already cached for this outer row) and
    /// returns its full result set.
    pub fn rows(&self, outer: Option<&Row>) -> Result<Vec<Row>, Error> {
        let key = self.cache_key(outer);
        if let Some(rows) = self.cache.lock().unwrap().get(&key) {
            return Ok(rows.clone());
        }
        let mut op = (self.factory)(outer)?;
        op.open()?;
        let mut rows = Vec::new();
        let result = loop {
            match op.next() {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        op.close()?;
        result?;
        self.cache.lock().unwrap().insert(key, rows.clone());
        Ok(rows)
    }
}

impl std::fmt::Debug for CompiledSubquery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSubquery")
            .field("correlated", &self.correlated)
            .finish_non_exhaustive()
    }
}

/// Quantifier for `= ALL (...)` / `= ANY (...)` / `= SOME (...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    All,
    Any,
}

/// A compiled, typed expression tree. Evaluation is a small recursive
/// descent; the only dynamic dispatch is the function-call leaf's table
/// lookup.
#[derive(Debug)]
pub enum Evaluator {
    Constant(Value),
    /// Resolved column ordinal in the row's schema (includes window
    /// function output columns, which the window operator appends below
    /// SELECT projection — the evaluator never computes one itself).
    Column(usize),
    SessionVar { name: String, global: bool },
    Parameter(Option<usize>),
    Binary {
        op: BinaryOp,
        left: Box<Evaluator>,
        right: Box<Evaluator>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Evaluator>,
    },
    IsNull {
        operand: Box<Evaluator>,
        negated: bool,
    },
    InList {
        expr: Box<Evaluator>,
        list: Vec<Evaluator>,
        negated: bool,
    },
    InSubquery {
        expr: Box<Evaluator>,
        subquery: Arc<CompiledSubquery>,
        negated: bool,
    },
    Between {
        expr: Box<Evaluator>,
        low: Box<Evaluator>,
        high: Box<Evaluator>,
        negated: bool,
    },
    Case {
        operand: Option<Box<Evaluator>>,
        when_then: Vec<(Evaluator, Evaluator)>,
        else_clause: Option<Box<Evaluator>>,
    },
    Cast {
        expr: Box<Evaluator>,
        target: CastTarget,
    },
    FunctionCall {
        name: String,
        args: Vec<Evaluator>,
        distinct: bool,
    },
    Exists {
        subquery: Arc<CompiledSubquery>,
        negated: bool,
    },
    ScalarSubquery(Arc<CompiledSubquery>),
    Quantified {
        left: Box<Evaluator>,
        op: BinaryOp,
        quantifier: Quantifier,
        subquery: Arc<CompiledSubquery>,
    },
    MatchAgainst {
        columns: Vec<usize>,
        against: Box<Evaluator>,
    },
}

/// A simplified cast target; the evaluator only needs enough of
/// `oxide_sql_core::ast::DataType` to dispatch a conversion rule.
#[derive(Debug, Clone)]
pub enum CastTarget {
    Integer,
    BigInt,
    Float,
    Double,
    Decimal,
    Boolean,
    Char,
    Text,
    Date,
    Time,
    DateTime,
    Timestamp,
    Json,
}

impl Evaluator {
    /// Evaluates this expression against `row`. The only side effects
    /// permitted are from impure builtins (`NOW`, `SLEEP`, `GET_LOCK`, ...).
    pub fn eval(&self, row: &Row) -> Result<Value, Error> {
        match self {
            Self::Constant(v) => Ok(v.clone()),
            Self::Column(ord) => Ok(row.get(*ord).cloned().unwrap_or(Value::Null)),
            Self::SessionVar { .. } => Ok(Value::Null),
            Self::Parameter(_) => Err(Error::TypeMismatch("unbound parameter at evaluation time".into())),
            Self::Binary { op, left, right } => self.eval_binary(*op, left, right, row),
            Self::Unary { op, operand } => self.eval_unary(*op, operand, row),
            Self::IsNull { operand, negated } => {
                let is_null = operand.eval(row)?.is_null();
                Ok(Value::Bool(is_null != *negated))
            }
            Self::InList { expr, list, negated } => self.eval_in_list(expr, list, *negated, row),
            Self::InSubquery {
                expr,
                subquery,
                negated,
            } => self.eval_in_subquery(expr, subquery, *negated, row),
            Self::Between { expr, low, high, negated } => self.eval_between(expr, low, high, *negated, row),
            Self::Case {
                operand,
                when_then,
                else_clause,
            } => self.eval_case(operand.as_deref(), when_then, else_clause.as_deref(), row),
            Self::Cast { expr, target } => Self::eval_cast(&expr.eval(row)?, target),
            Self::FunctionCall { name, args, distinct } => {
                let mut values = Vec::with_capacity(args.len());
                for a in args {
                    values.push(a.eval(row)?);
                }
                call_builtin(name, &values, *distinct)
            }
            Self::Exists { subquery, negated } => {
                let rows = subquery.rows(Some(row))?;
                Ok(Value::Bool(!rows.is_empty() != *negated))
            }
            Self::ScalarSubquery(subquery) => {
                let rows = subquery.rows(Some(row))?;
                match rows.len() {
                    0 => Ok(Value::Null),
                    _ => rows[0].values.first().cloned().ok_or_else(|| {
                        Error::Internal("scalar subquery returned a row with no columns".into())
                    }),
                }
            }
            Self::Quantified {
                left,
                op,
                quantifier,
                subquery,
            } => self.eval_quantified(left, *op, *quantifier, subquery, row),
            Self::MatchAgainst { columns, against } => self.eval_match_against(columns, against, row),
        }
    }

    fn eval_binary(&self, op: BinaryOp, left: &Self, right: &Self, row: &Row) -> Result<Value, Error> {
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let l = left.eval(row)?.as_bool()?;
            let r = right.eval(row)?.as_bool()?;
            let result = if op == BinaryOp::And {
                Value::kleene_and(l, r)
            } else {
                Value::kleene_or(l, r)
            };
            return Ok(result.map_or(Value::Null, Value::Bool));
        }
        let l = left.eval(row)?;
        let r = right.eval(row)?;
        match op {
            BinaryOp::Add => l.checked_add(&r),
            BinaryOp::Sub => l.checked_sub(&r),
            BinaryOp::Mul => l.checked_mul(&r),
            BinaryOp::Div => l.checked_div(&r),
            BinaryOp::Mod => Self::modulo(&l, &r),
            BinaryOp::Concat => Self::concat(&l, &r),
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                Self::compare(op, &l, &r)
            }
            BinaryOp::Like => Self::like(&l, &r, false),
            BinaryOp::Regexp => Self::regexp(&l, &r),
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::LeftShift | BinaryOp::RightShift => {
                Self::bitwise(op, &l, &r)
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn modulo(l: &Value, r: &Value) -> Result<Value, Error> {
        if l.is_null() || r.is_null() {
            return Ok(Value::Null);
        }
        let is_float = matches!(l, Value::Float(_) | Value::Double(_)) || matches!(r, Value::Float(_) | Value::Double(_));
        let a = l_as_f64(l)?;
        let b = l_as_f64(r)?;
        if b == 0.0 {
            return Err(Error::Overflow("modulo by zero".into()));
        }
        if is_float {
            Ok(Value::Double(a % b))
        } else {
            Ok(Value::BigInt((a as i64) % (b as i64)))
        }
    }

    fn concat(l: &Value, r: &Value) -> Result<Value, Error> {
        if l.is_null() || r.is_null() {
            return Ok(Value::Null);
        }
        Ok(Value::Text(format!("{}{}", l.to_text(), r.to_text())))
    }

    fn compare(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, Error> {
        let Some(ord) = l.sql_compare(r)? else {
            return Ok(Value::Null);
        };
        use std::cmp::Ordering::{Equal, Greater, Less};
        let result = match op {
            BinaryOp::Eq => ord == Equal,
            BinaryOp::NotEq => ord != Equal,
            BinaryOp::Lt => ord == Less,
            BinaryOp::LtEq => ord != Greater,
            BinaryOp::Gt => ord == Greater,
            BinaryOp::GtEq => ord != Less,
            _ => unreachable!("non-comparison op passed to compare"),
        };
        Ok(Value::Bool(result))
    }

    fn like(value: &Value, pattern: &Value, case_sensitive: bool) -> Result<Value, Error> {
        if value.is_null() || pattern.is_null() {
            return Ok(Value::Null);
        }
        let regex = functions::like_to_regex(&pattern.to_text(), case_sensitive)?;
        Ok(Value::Bool(regex.is_match(&value.to_text())))
    }

    fn regexp(value: &Value, pattern: &Value) -> Result<Value, Error> {
        if value.is_null() || pattern.is_null() {
            return Ok(Value::Null);
        }
        let re = regex::Regex::new(&pattern.to_text())
            .map_err(|e| Error::TypeMismatch(format!("invalid REGEXP pattern: {e}")))?;
        Ok(Value::Bool(re.is_match(&value.to_text())))
    }

    fn bitwise(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, Error> {
        if l.is_null() || r.is_null() {
            return Ok(Value::Null);
        }
        let a = l_as_f64(l)? as i64;
        let b = l_as_f64(r)? as i64;
        Ok(Value::BigInt(match op {
            BinaryOp::BitAnd => a & b,
            BinaryOp::BitOr => a | b,
            BinaryOp::LeftShift => a << b,
            BinaryOp::RightShift => a >> b,
            _ => unreachable!("non-bitwise op passed to bitwise"),
        }))
    }

    fn eval_unary(&self, op: UnaryOp, operand: &Self, row: &Row) -> Result<Value, Error> {
        let v = operand.eval(row)?;
        match op {
            UnaryOp::Not => Ok(Value::kleene_not(v.as_bool()?).map_or(Value::Null, Value::Bool)),
            UnaryOp::Neg => {
                if v.is_null() {
                    return Ok(Value::Null);
                }
                Value::Int(0).checked_sub(&v)
            }
            UnaryOp::BitNot => {
                if v.is_null() {
                    return Ok(Value::Null);
                }
                Ok(Value::BigInt(!(l_as_f64(&v)? as i64)))
            }
        }
    }

    fn eval_in_list(&self, expr: &Self, list: &[Self], negated: bool, row: &Row) -> Result<Value, Error> {
        let lhs = expr.eval(row)?;
        if lhs.is_null() {
            return Ok(Value::Null);
        }
        let mut saw_null = false;
        for item in list {
            let rhs = item.eval(row)?;
            match lhs.sql_compare(&rhs)? {
                Some(std::cmp::Ordering::Equal) => return Ok(Value::Bool(!negated)),
                None => saw_null = true,
                _ => {}
            }
        }
        if saw_null {
            Ok(Value::Null)
        } else {
            Ok(Value::Bool(negated))
        }
    }

    fn eval_in_subquery(
        &self,
        expr: &Self,
        subquery: &CompiledSubquery,
        negated: bool,
        row: &Row,
    ) -> Result<Value, Error> {
        let lhs = expr.eval(row)?;
        if lhs.is_null() {
            return Ok(Value::Null);
        }
        let rows = subquery.rows(Some(row))?;
        let mut saw_null = false;
        for candidate in &rows {
            let Some(rhs) = candidate.values.first() else {
                continue;
            };
            match lhs.sql_compare(rhs)? {
                Some(std::cmp::Ordering::Equal) => return Ok(Value::Bool(!negated)),
                None => saw_null = true,
                _ => {}
            }
        }
        if saw_null {
            Ok(Value::Null)
        } else {
            Ok(Value::Bool(negated))
        }
    }

    fn eval_between(&self, expr: &Self, low: &Self, high: &Self, negated: bool, row: &Row) -> Result<Value, Error> {
        let v = expr.eval(row)?;
        let lo = low.eval(row)?;
        let hi = high.eval(row)?;
        let ge_lo = v.sql_compare(&lo)?;
        let le_hi = v.sql_compare(&hi)?;
        let in_range = match (ge_lo, le_hi) {
            (Some(a), Some(b)) => Some(a != std::cmp::Ordering::Less && b != std::cmp::Ordering::Greater),
            _ => None,
        };
        Ok(in_range.map_or(Value::Null, |b| Value::Bool(b != negated)))
    }

    fn eval_case(
        &self,
        operand: Option<&Self>,
        when_then: &[(Self, Self)],
        else_clause: Option<&Self>,
        row: &Row,
    ) -> Result<Value, Error> {
        let base = match operand {
            Some(e) => Some(e.eval(row)?),
            None => None,
        };
        for (when, then) in when_then {
            let matched = match &base {
                Some(b) => matches!(b.sql_compare(&when.eval(row)?)?, Some(std::cmp::Ordering::Equal)),
                None => when.eval(row)?.as_bool()?.unwrap_or(false),
            };
            if matched {
                return then.eval(row);
            }
        }
        match else_clause {
            Some(e) => e.eval(row),
            None => Ok(Value::Null),
        }
    }

    fn eval_cast(value: &Value, target: &CastTarget) -> Result<Value, Error> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        functions::cast(value, target)
    }

    fn eval_quantified(
        &self,
        left: &Self,
        op: BinaryOp,
        quantifier: Quantifier,
        subquery: &CompiledSubquery,
        row: &Row,
    ) -> Result<Value, Error> {
        let lhs = left.eval(row)?;
        let rows = subquery.rows(Some(row))?;
        if rows.is_empty() {
            return Ok(Value::Bool(quantifier == Quantifier::All));
        }
        let mut saw_null = false;
        let mut any_true = false;
        let mut all_true = true;
        for candidate in &rows {
            let Some(rhs) = candidate.values.first() else {
                continue;
            };
            let result = Self::compare(op, &lhs, rhs)?;
            match result {
                Value::Bool(true) => any_true = true,
                Value::Bool(false) => all_true = false,
                Value::Null => saw_null = true,
                _ => {}
            }
        }
        match quantifier {
            Quantifier::Any => {
                if any_true {
                    Ok(Value::Bool(true))
                } else if saw_null {
                    Ok(Value::Null)
                } else {
                    Ok(Value::Bool(false))
                }
            }
            Quantifier::All => {
                if !all_true {
                    Ok(Value::Bool(false))
                } else if saw_null {
                    Ok(Value::Null)
                } else {
                    Ok(Value::Bool(true))
                }
            }
        }
    }

    fn eval_match_against(&self, columns: &[usize], against: &Self, row: &Row) -> Result<Value, Error> {
        let needle = against.eval(row)?.to_text().to_lowercase();
        if needle.is_empty() {
            return Ok(Value::Bool(false));
        }
        let haystack = columns
            .iter()
            .filter_map(|ord| row.get(*ord))
            .map(Value::to_text)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Ok(Value::Bool(
            needle.split_whitespace().any(|term| haystack.contains(term)),
        ))
    }
}

fn l_as_f64(v: &Value) -> Result<f64, Error> {
    match v {
        Value::TinyInt(n) => Ok(f64::from(*n)),
        Value::SmallInt(n) => Ok(f64::from(*n)),
        Value::Int(n) => Ok(f64::from(*n)),
        Value::BigInt(n) => Ok(*n as f64),
        Value::Float(n) => Ok(f64::from(*n)),
        Value::Double(n) => Ok(*n),
        Value::Decimal(d) => Ok(d.to_f64()),
        other => Err(Error::NonNumericOperand(format!(
            "expected a numeric value, found {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_sql_types::{ColumnDef, ColumnType, RowId, Schema};
    use std::sync::Arc as StdArc;

    fn row_with(values: Vec<Value>) -> Row {
        let columns = values
            .iter()
            .enumerate()
            .map(|(i, _)| ColumnDef::new(format!("c{i}"), ColumnType::Int))
            .collect();
        Row::new(StdArc::new(Schema::new(columns)), values, RowId(1))
    }

    #[test]
    fn and_is_kleene() {
        let eval = Evaluator::Binary {
            op: BinaryOp::And,
            left: Box::new(Evaluator::Constant(Value::Bool(false))),
            right: Box::new(Evaluator::Constant(Value::Null)),
        };
        assert_eq!(eval.eval(&row_with(vec![])).unwrap(), Value::Bool(false));
    }

    #[test]
    fn between_with_null_bound_is_null() {
        let eval = Evaluator::Between {
            expr: Box::new(Evaluator::Constant(Value::Int(5))),
            low: Box::new(Evaluator::Constant(Value::Int(1))),
            high: Box::new(Evaluator::Constant(Value::Null)),
            negated: false,
        };
        assert_eq!(eval.eval(&row_with(vec![])).unwrap(), Value::Null);
    }

    #[test]
    fn concat_null_propagates() {
        let eval = Evaluator::Binary {
            op: BinaryOp::Concat,
            left: Box::new(Evaluator::Constant(Value::Text("a".into()))),
            right: Box::new(Evaluator::Constant(Value::Null)),
        };
        assert_eq!(eval.eval(&row_with(vec![])).unwrap(), Value::Null);
    }

    #[test]
    fn column_out_of_range_is_null_not_panic() {
        let eval = Evaluator::Column(5);
        assert_eq!(eval.eval(&row_with(vec![Value::Int(1)])).unwrap(), Value::Null);
    }
}
