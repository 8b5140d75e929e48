//! `Window`: buffers the full input, partitions and sorts it per
//! declared window-function spec, and appends one computed column per
//! spec in declaration order.
//!
//! Only running and whole-partition frames are computed (no explicit
//! `ROWS BETWEEN` frame clauses), matching the conformance surface this
//! engine targets.

use std::collections::HashMap;
use std::sync::Arc;

use oxide_sql_types::{canonical_group_key, ColumnDef, Error, Row, Schema, Value};

use crate::expr::Evaluator;

use super::order_by::SortKey;
use super::{Lifecycle, Operator};

/// One window-function kind and its arguments.
pub enum WindowFunction {
    RowNumber,
    Rank,
    DenseRank,
    Ntile(i64),
    Lag { arg: Evaluator, offset: i64, default: Evaluator },
    Lead { arg: Evaluator, offset: i64, default: Evaluator },
    FirstValue(Evaluator),
    LastValue(Evaluator),
    NthValue(Evaluator, i64),
    CumeDist,
    PercentRank,
    Sum(Evaluator),
    Avg(Evaluator),
    Min(Evaluator),
    Max(Evaluator),
    Count(Option<Evaluator>),
}

/// A declared `... OVER (PARTITION BY ... ORDER BY ...)` specification:
/// its function, partitioning, ordering, and output column.
pub struct WindowSpec {
    pub function: WindowFunction,
    pub partition_by: Vec<Evaluator>,
    pub order_by: Vec<SortKey>,
    pub output: ColumnDef,
}

fn partition_key(exprs: &[Evaluator], row: &Row) -> Result<String, Error> {
    let mut values = Vec::with_capacity(exprs.len());
    for e in exprs {
        values.push(e.eval(row)?);
    }
    Ok(canonical_group_key(&values))
}

fn sort_partition(keys: &[SortKey], rows: &mut [usize], source: &[Row]) -> Result<(), Error> {
    let mut err = None;
    rows.sort_by(|&a, &b| {
        for key in keys {
            let l = match key.evaluator.eval(&source[a]) {
                Ok(v) => v,
                Err(e) => {
                    err.get_or_insert(e);
                    return std::cmp::Ordering::Equal;
                }
            };
            let r = match key.evaluator.eval(&source[b]) {
                Ok(v) => v,
                Err(e) => {
                    err.get_or_insert(e);
                    return std::cmp::Ordering::Equal;
                }
            };
            let ord = l.order_cmp(&r);
            let ord = if key.descending { ord.reverse() } else { ord };
            if ord != std::cmp::Ordering::Equal {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });
    err.map_or(Ok(()), Err)
}

fn running_numeric(kind: &str, arg: &Evaluator, rows: &[usize], source: &[Row], upto: usize) -> Result<Value, Error> {
    let mut sum: Option<Value> = None;
    let mut count = 0i64;
    let mut min: Option<Value> = None;
    let mut max: Option<Value> = None;
    for &idx in &rows[..=upto] {
        let v = arg.eval(&source[idx])?;
        if v.is_null() {
            continue;
        }
        count += 1;
        sum = Some(match sum {
            Some(prev) => prev.checked_add(&v)?,
            None => v.clone(),
        });
        min = Some(match min {
            Some(prev) if prev.sql_compare(&v)? == Some(std::cmp::Ordering::Less) => prev,
            _ => v.clone(),
        });
        max = Some(match max {
            Some(prev) if prev.sql_compare(&v)? == Some(std::cmp::Ordering::Greater) => prev,
            _ => v.clone(),
        });
    }
    Ok(match kind {
        "sum" => sum.unwrap_or(Value::Null),
        "avg" => match sum {
            Some(s) if count > 0 => s.checked_div(&Value::BigInt(count))?,
            _ => Value::Null,
        },
        "min" => min.unwrap_or(Value::Null),
        "max" => max.unwrap_or(Value::Null),
        "count" => Value::BigInt(count),
        _ => unreachable!("unknown running aggregate kind"),
    })
}

fn whole_partition_numeric(kind: &str, arg: &Evaluator, rows: &[usize], source: &[Row]) -> Result<Value, Error> {
    if rows.is_empty() {
        return running_numeric(kind, arg, rows, source, 0);
    }
    running_numeric(kind, arg, rows, source, rows.len() - 1)
}

fn count_star(rows: &[usize]) -> Value {
    Value::BigInt(rows.len() as i64)
}

/// Computes one partition's output values for a single window spec, in
/// sorted-position order (parallel to `rows`).
fn compute_partition(spec: &WindowSpec, rows: &[usize], source: &[Row]) -> Result<Vec<Value>, Error> {
    let n = rows.len();
    let running = !spec.order_by.is_empty();
    let mut out = vec![Value::Null; n];
    match &spec.function {
        WindowFunction::RowNumber => {
            for (pos, slot) in out.iter_mut().enumerate() {
                *slot = Value::BigInt(pos as i64 + 1);
            }
        }
        WindowFunction::Rank | WindowFunction::DenseRank => {
            let dense = matches!(spec.function, WindowFunction::DenseRank);
            let mut rank = 0i64;
            let mut seen = 0i64;
            for pos in 0..n {
                seen += 1;
                let tied_prev = pos > 0 && rows_tied(&spec.order_by, &source[rows[pos - 1]], &source[rows[pos]])?;
                if !tied_prev {
                    rank = if dense { rank + 1 } else { seen };
                }
                out[pos] = Value::BigInt(rank);
            }
        }
        WindowFunction::Ntile(buckets) => {
            let buckets = (*buckets).max(1);
            let bucket_size = (n as i64 + buckets - 1) / buckets;
            for (pos, slot) in out.iter_mut().enumerate() {
                *slot = Value::BigInt((pos as i64 / bucket_size.max(1)) + 1);
            }
        }
        WindowFunction::Lag { arg, offset, default } => {
            for pos in 0..n {
                let src = pos as i64 - offset;
                out[pos] = if src >= 0 && (src as usize) < n {
                    arg.eval(&source[rows[src as usize]])?
                } else {
                    default.eval(&source[rows[pos]])?
                };
            }
        }
        WindowFunction::Lead { arg, offset, default } => {
            for pos in 0..n {
                let src = pos as i64 + offset;
                out[pos] = if src >= 0 && (src as usize) < n {
                    arg.eval(&source[rows[src as usize]])?
                } else {
                    default.eval(&source[rows[pos]])?
                };
            }
        }
        WindowFunction::FirstValue(arg) => {
            if n > 0 {
                let v = arg.eval(&source[rows[0]])?;
                out.iter_mut().for_each(|slot| *slot = v.clone());
            }
        }
        WindowFunction::LastValue(arg) => {
            if n > 0 {
                let v = arg.eval(&source[rows[n - 1]])?;
                out.iter_mut().for_each(|slot| *slot = v.clone());
            }
        }
        WindowFunction::NthValue(arg, n_th) => {
            let idx = (*n_th - 1).max(0) as usize;
            let v = if idx < n { arg.eval(&source[rows[idx]])? } else { Value::Null };
            out.iter_mut().for_each(|slot| *slot = v.clone());
        }
        WindowFunction::CumeDist => {
            for pos in 0..n {
                let mut le = 0usize;
                for other in 0..n {
                    if !rows_after(&spec.order_by, &source[rows[other]], &source[rows[pos]])? {
                        le += 1;
                    }
                }
                out[pos] = Value::Double(le as f64 / n as f64);
            }
        }
        WindowFunction::PercentRank => {
            let mut rank = 0i64;
            let mut seen = 0i64;
            let mut ranks = vec![0i64; n];
            for pos in 0..n {
                seen += 1;
                let tied_prev = pos > 0 && rows_tied(&spec.order_by, &source[rows[pos - 1]], &source[rows[pos]])?;
                if !tied_prev {
                    rank = seen;
                }
                ranks[pos] = rank;
            }
            for pos in 0..n {
                out[pos] = if n <= 1 {
                    Value::Double(0.0)
                } else {
                    Value::Double((ranks[pos] - 1) as f64 / (n as f64 - 1.0))
                };
            }
        }
        WindowFunction::Sum(arg) | WindowFunction::Avg(arg) | WindowFunction::Min(arg) | WindowFunction::Max(arg) => {
            let kind = match &spec.function {
                WindowFunction::Sum(_) => "sum",
                WindowFunction::Avg(_) => "avg",
                WindowFunction::Min(_) => "min",
                WindowFunction::Max(_) => "max",
                _ => unreachable!(),
            };
            if running {
                for pos in 0..n {
                    out[pos] = running_numeric(kind, arg, rows, source, pos)?;
                }
            } else {
                let v = whole_partition_numeric(kind, arg, rows, source)?;
                out.iter_mut().for_each(|slot| *slot = v.clone());
            }
        }
        WindowFunction::Count(arg) => {
            if running {
                for pos in 0..n {
                    out[pos] = match arg {
                        Some(arg) => running_numeric("count", arg, rows, source, pos)?,
                        None => Value::BigInt(pos as i64 + 1),
                    };
                }
            } else {
                let v = match arg {
                    Some(arg) => whole_partition_numeric("count", arg, rows, source)?,
                    None => count_star(rows),
                };
                out.iter_mut().for_each(|slot| *slot = v.clone());
            }
        }
    }
    Ok(out)
}

fn rows_tied(keys: &[SortKey], a: &Row, b: &Row) -> Result<bool, Error> {
    for key in keys {
        let l = key.evaluator.eval(a)?;
        let r = key.evaluator.eval(b)?;
        if l.order_cmp(&r) != std::cmp::Ordering::Equal {
            return Ok(false);
        }
    }
    Ok(true)
}

/// True if `other`'s sort position is strictly after `target`'s.
fn rows_after(keys: &[SortKey], other: &Row, target: &Row) -> Result<bool, Error> {
    for key in keys {
        let l = key.evaluator.eval(other)?;
        let r = key.evaluator.eval(target)?;
        let ord = l.order_cmp(&r);
        let ord = if key.descending { ord.reverse() } else { ord };
        match ord {
            std::cmp::Ordering::Less => return Ok(false),
            std::cmp::Ordering::Greater => return Ok(true),
            std::cmp::Ordering::Equal => continue,
        }
    }
    Ok(false)
}

/// Buffers the full input, evaluates every declared window spec per
/// partition, and emits the input rows extended by one column per spec.
pub struct Window {
    input: Box<dyn Operator>,
    specs: Vec<WindowSpec>,
    schema: Arc<Schema>,
    output: Vec<Row>,
    cursor: usize,
    state: Lifecycle,
}

impl Window {
    #[must_use]
    pub fn new(input: Box<dyn Operator>, specs: Vec<WindowSpec>) -> Self {
        let mut columns = input.schema().columns().to_vec();
        columns.extend(specs.iter().map(|s| s.output.clone()));
        let schema = Arc::new(Schema::new(columns));
        Self {
            input,
            specs,
            schema,
            output: Vec::new(),
            cursor: 0,
            state: Lifecycle::default(),
        }
    }
}

impl Operator for Window {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.input.open()?;
        self.output.clear();
        self.cursor = 0;

        let mut rows = Vec::new();
        while let Some(row) = self.input.next()? {
            rows.push(row);
        }

        let mut extra: Vec<Vec<Value>> = vec![Vec::with_capacity(self.specs.len()); rows.len()];
        for spec in &self.specs {
            let mut partitions: HashMap<String, Vec<usize>> = HashMap::new();
            let mut order: Vec<String> = Vec::new();
            for (idx, row) in rows.iter().enumerate() {
                let key = partition_key(&spec.partition_by, row)?;
                partitions
                    .entry(key.clone())
                    .or_insert_with(|| {
                        order.push(key.clone());
                        Vec::new()
                    })
                    .push(idx);
            }
            for key in &order {
                let mut members = partitions.remove(key).expect("key was just inserted");
                sort_partition(&spec.order_by, &mut members, &rows)?;
                let values = compute_partition(spec, &members, &rows)?;
                for (pos, &row_idx) in members.iter().enumerate() {
                    extra[row_idx].push(values[pos].clone());
                }
            }
        }

        for (row, extra_values) in rows.into_iter().zip(extra.into_iter()) {
            let mut values = row.values;
            values.extend(extra_values);
            self.output.push(Row::new(self.schema.clone(), values, row.row_id));
        }
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>, Error> {
        if self.cursor >= self.output.len() {
            return Ok(None);
        }
        let row = self.output[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(row))
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.close();
        self.output.clear();
        self.input.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_sql_types::{ColumnType, RowId};

    struct Fixed(Vec<i32>, usize);
    impl Operator for Fixed {
        fn schema(&self) -> Arc<Schema> {
            Arc::new(Schema::new(vec![ColumnDef::new("n", ColumnType::Int)]))
        }
        fn open(&mut self) -> Result<(), Error> {
            self.1 = 0;
            Ok(())
        }
        fn next(&mut self) -> Result<Option<Row>, Error> {
            if self.1 >= self.0.len() {
                return Ok(None);
            }
            let v = self.0[self.1];
            self.1 += 1;
            Ok(Some(Row::new(self.schema(), vec![Value::Int(v)], RowId(0))))
        }
        fn close(&mut self) -> Result<(), Error> {
            Ok(())
        }
    }

    #[test]
    fn row_number_orders_within_single_partition() {
        let input = Box::new(Fixed(vec![30, 10, 20], 0));
        let specs = vec![WindowSpec {
            function: WindowFunction::RowNumber,
            partition_by: vec![],
            order_by: vec![SortKey {
                evaluator: Evaluator::Column(0),
                descending: false,
            }],
            output: ColumnDef::new("rn", ColumnType::BigInt),
        }];
        let mut window = Window::new(input, specs);
        window.open().unwrap();
        let mut seen = Vec::new();
        while let Some(row) = window.next().unwrap() {
            seen.push((row.values[0].clone(), row.values[1].clone()));
        }
        assert_eq!(seen[0], (Value::Int(30), Value::BigInt(1)));
        assert_eq!(seen[1], (Value::Int(10), Value::BigInt(2)));
        assert_eq!(seen[2], (Value::Int(20), Value::BigInt(3)));
        window.close().unwrap();
    }

    #[test]
    fn count_over_whole_partition_with_no_order_by_is_constant() {
        let input = Box::new(Fixed(vec![1, 2, 3], 0));
        let specs = vec![WindowSpec {
            function: WindowFunction::Count(None),
            partition_by: vec![],
            order_by: vec![],
            output: ColumnDef::new("c", ColumnType::BigInt),
        }];
        let mut window = Window::new(input, specs);
        window.open().unwrap();
        while let Some(row) = window.next().unwrap() {
            assert_eq!(row.values[1], Value::BigInt(3));
        }
        window.close().unwrap();
    }
}
