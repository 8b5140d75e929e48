//! `GroupBy`: single-pass hash aggregation, with a spillable fallback that
//! buffers input to disk and re-aggregates in one extra pass when the
//! number of live groups would exceed the configured memory budget.

use std::collections::HashMap;
use std::sync::Arc;

use oxide_sql_types::{canonical_group_key, ColumnDef, Error, Row, Schema, Value};

use crate::expr::Evaluator;
use crate::spill::RowSpiller;

use super::{Lifecycle, Operator};

/// One aggregate function applied within a group.
pub enum AggregateKind {
    Count { arg: Option<Evaluator>, distinct: bool },
    Sum { arg: Evaluator, distinct: bool },
    Avg { arg: Evaluator, distinct: bool },
    Min(Evaluator),
    Max(Evaluator),
    GroupConcat { arg: Evaluator, distinct: bool, separator: String },
}

/// A declared aggregate column: its function and its output column.
pub struct AggregateSpec {
    pub kind: AggregateKind,
    pub output: ColumnDef,
}

/// An `AggregateKind` stripped of its `Evaluator` argument — carries only
/// what `update_value`/`merge`/`finalize` need to dispatch. Unlike
/// `AggregateKind`, this is plain data (`Send + Sync`), so it is what
/// crosses a `thread::spawn` boundary in `ParallelAggregate`.
#[derive(Clone)]
pub(crate) enum AggregateKindTag {
    Count { distinct: bool },
    Sum { distinct: bool },
    Avg { distinct: bool },
    Min,
    Max,
    GroupConcat { distinct: bool, separator: String },
}

impl From<&AggregateKind> for AggregateKindTag {
    fn from(kind: &AggregateKind) -> Self {
        match kind {
            AggregateKind::Count { distinct, .. } => Self::Count { distinct: *distinct },
            AggregateKind::Sum { distinct, .. } => Self::Sum { distinct: *distinct },
            AggregateKind::Avg { distinct, .. } => Self::Avg { distinct: *distinct },
            AggregateKind::Min(_) => Self::Min,
            AggregateKind::Max(_) => Self::Max,
            AggregateKind::GroupConcat { distinct, separator, .. } => Self::GroupConcat {
                distinct: *distinct,
                separator: separator.clone(),
            },
        }
    }
}

pub(crate) struct AggState {
    count: i64,
    sum: Option<Value>,
    min: Option<Value>,
    max: Option<Value>,
    concat: Vec<String>,
    seen: std::collections::HashSet<String>,
}

impl AggState {
    pub(crate) fn new() -> Self {
        Self {
            count: 0,
            sum: None,
            min: None,
            max: None,
            concat: Vec::new(),
            seen: std::collections::HashSet::new(),
        }
    }

    pub(crate) fn update(&mut self, kind: &AggregateKind, row: &Row) -> Result<(), Error> {
        match kind {
            AggregateKind::Count { arg, distinct } => {
                let include = match arg {
                    Some(e) => !e.eval(row)?.is_null(),
                    None => true,
                };
                if include && self.dedup_ok(distinct, arg.as_ref(), row)? {
                    self.count += 1;
                }
            }
            AggregateKind::Sum { arg, distinct } => {
                let v = arg.eval(row)?;
                if !v.is_null() && self.dedup_ok(distinct, Some(arg), row)? {
                    self.sum = Some(match &self.sum {
                        Some(prev) => prev.checked_add(&v)?,
                        None => v,
                    });
                }
            }
            AggregateKind::Avg { arg, distinct } => {
                let v = arg.eval(row)?;
                if !v.is_null() && self.dedup_ok(distinct, Some(arg), row)? {
                    self.sum = Some(match &self.sum {
                        Some(prev) => prev.checked_add(&v)?,
                        None => v,
                    });
                    self.count += 1;
                }
            }
            AggregateKind::Min(arg) => {
                let v = arg.eval(row)?;
                if !v.is_null() {
                    self.min = Some(match &self.min {
                        Some(prev) if prev.sql_compare(&v)? == Some(std::cmp::Ordering::Less) => prev.clone(),
                        _ => v,
                    });
                }
            }
            AggregateKind::Max(arg) => {
                let v = arg.eval(row)?;
                if !v.is_null() {
                    self.max = Some(match &self.max {
                        Some(prev) if prev.sql_compare(&v)? == Some(std::cmp::Ordering::Greater) => prev.clone(),
                        _ => v,
                    });
                }
            }
            AggregateKind::GroupConcat { arg, distinct, .. } => {
                let v = arg.eval(row)?;
                if !v.is_null() && self.dedup_ok(distinct, Some(arg), row)? {
                    self.concat.push(v.to_text());
                }
            }
        }
        Ok(())
    }

    fn dedup_ok(&mut self, distinct: &bool, arg: Option<&Evaluator>, row: &Row) -> Result<bool, Error> {
        if !*distinct {
            return Ok(true);
        }
        let Some(arg) = arg else { return Ok(true) };
        let key = canonical_group_key(std::slice::from_ref(&arg.eval(row)?));
        Ok(self.seen.insert(key))
    }

    /// Same update logic as `update`, but takes an already-evaluated value
    /// instead of an `Evaluator` + `Row` — used by `ParallelAggregate`,
    /// which evaluates arguments on the calling thread before handing
    /// plain `Value`s to worker threads (an `Evaluator` embeds `Arc<RefCell<..>>`
    /// subquery caches and so cannot cross a `thread::spawn` boundary).
    pub(crate) fn update_value(&mut self, kind: &AggregateKindTag, value: Option<Value>) -> Result<(), Error> {
        match kind {
            AggregateKindTag::Count { distinct } => {
                let include = value.as_ref().map_or(true, |v| !v.is_null());
                if include && self.dedup_ok_value(*distinct, value.as_ref()) {
                    self.count += 1;
                }
            }
            AggregateKindTag::Sum { distinct } => {
                if let Some(v) = value {
                    if !v.is_null() && self.dedup_ok_value(*distinct, Some(&v)) {
                        self.sum = Some(match self.sum.take() {
                            Some(prev) => prev.checked_add(&v)?,
                            None => v,
                        });
                    }
                }
            }
            AggregateKindTag::Avg { distinct } => {
                if let Some(v) = value {
                    if !v.is_null() && self.dedup_ok_value(*distinct, Some(&v)) {
                        self.sum = Some(match self.sum.take() {
                            Some(prev) => prev.checked_add(&v)?,
                            None => v,
                        });
                        self.count += 1;
                    }
                }
            }
            AggregateKindTag::Min => {
                if let Some(v) = value {
                    if !v.is_null() {
                        self.min = Some(match self.min.take() {
                            Some(prev) if prev.sql_compare(&v)? == Some(std::cmp::Ordering::Less) => prev,
                            _ => v,
                        });
                    }
                }
            }
            AggregateKindTag::Max => {
                if let Some(v) = value {
                    if !v.is_null() {
                        self.max = Some(match self.max.take() {
                            Some(prev) if prev.sql_compare(&v)? == Some(std::cmp::Ordering::Greater) => prev,
                            _ => v,
                        });
                    }
                }
            }
            AggregateKindTag::GroupConcat { distinct, .. } => {
                if let Some(v) = value {
                    if !v.is_null() && self.dedup_ok_value(*distinct, Some(&v)) {
                        self.concat.push(v.to_text());
                    }
                }
            }
        }
        Ok(())
    }

    fn dedup_ok_value(&mut self, distinct: bool, value: Option<&Value>) -> bool {
        if !distinct {
            return true;
        }
        let Some(v) = value else { return true };
        let key = canonical_group_key(std::slice::from_ref(v));
        self.seen.insert(key)
    }

    /// Associatively combines another partition's partial state for the
    /// same group into this one — used by `ParallelAggregate` to merge
    /// worker-local partials.
    pub(crate) fn merge(&mut self, kind: &AggregateKindTag, other: Self) -> Result<(), Error> {
        match kind {
            AggregateKindTag::Count { .. } => self.count += other.count,
            AggregateKindTag::Sum { .. } => {
                self.sum = match (self.sum.take(), other.sum) {
                    (Some(a), Some(b)) => Some(a.checked_add(&b)?),
                    (a, b) => a.or(b),
                };
            }
            AggregateKindTag::Avg { .. } => {
                self.sum = match (self.sum.take(), other.sum) {
                    (Some(a), Some(b)) => Some(a.checked_add(&b)?),
                    (a, b) => a.or(b),
                };
                self.count += other.count;
            }
            AggregateKindTag::Min => {
                self.min = match (&self.min, &other.min) {
                    (Some(a), Some(b)) if a.sql_compare(b)? == Some(std::cmp::Ordering::Greater) => Some(b.clone()),
                    (Some(a), _) => Some(a.clone()),
                    (None, b) => b.clone(),
                };
            }
            AggregateKindTag::Max => {
                self.max = match (&self.max, &other.max) {
                    (Some(a), Some(b)) if a.sql_compare(b)? == Some(std::cmp::Ordering::Less) => Some(b.clone()),
                    (Some(a), _) => Some(a.clone()),
                    (None, b) => b.clone(),
                };
            }
            AggregateKindTag::GroupConcat { .. } => self.concat.extend(other.concat),
        }
        Ok(())
    }

    pub(crate) fn finalize(&self, kind: &AggregateKindTag) -> Value {
        match kind {
            AggregateKindTag::Count { .. } => Value::BigInt(self.count),
            AggregateKindTag::Sum { .. } => self.sum.clone().unwrap_or(Value::Null),
            AggregateKindTag::Avg { .. } => match &self.sum {
                Some(sum) if self.count > 0 => sum.checked_div(&Value::BigInt(self.count)).unwrap_or(Value::Null),
                _ => Value::Null,
            },
            AggregateKindTag::Min => self.min.clone().unwrap_or(Value::Null),
            AggregateKindTag::Max => self.max.clone().unwrap_or(Value::Null),
            AggregateKindTag::GroupConcat { separator, .. } => {
                if self.concat.is_empty() {
                    Value::Null
                } else {
                    Value::Text(self.concat.join(separator))
                }
            }
        }
    }
}

/// Buffers all input, groups by the canonical key of `group_exprs`, and
/// emits one row per group plus the finalized aggregate values. With no
/// grouping keys and empty input, emits a single row of initial aggregate
/// values, matching the conformance rule for `COUNT(*) = 0` over an empty
/// table.
pub struct GroupBy {
    input: Box<dyn Operator>,
    group_exprs: Vec<Evaluator>,
    aggregates: Vec<AggregateSpec>,
    schema: Arc<Schema>,
    spill_budget_bytes: usize,
    output: Vec<Row>,
    cursor: usize,
    state: Lifecycle,
}

impl GroupBy {
    #[must_use]
    pub fn new(
        input: Box<dyn Operator>,
        group_exprs: Vec<Evaluator>,
        aggregates: Vec<AggregateSpec>,
        group_output: Vec<ColumnDef>,
        spill_budget_bytes: usize,
    ) -> Self {
        let mut columns = group_output;
        columns.extend(aggregates.iter().map(|a| a.output.clone()));
        let schema = Arc::new(Schema::new(columns));
        Self {
            input,
            group_exprs,
            aggregates,
            schema,
            spill_budget_bytes,
            output: Vec::new(),
            cursor: 0,
            state: Lifecycle::default(),
        }
    }

    fn aggregate(&mut self, rows: impl Iterator<Item = Result<Row, Error>>) -> Result<(), Error> {
        let tags: Vec<AggregateKindTag> = self.aggregates.iter().map(|a| AggregateKindTag::from(&a.kind)).collect();
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, (Vec<Value>, Vec<AggState>)> = HashMap::new();
        for row in rows {
            let row = row?;
            let mut keys = Vec::with_capacity(self.group_exprs.len());
            for expr in &self.group_exprs {
                keys.push(expr.eval(&row)?);
            }
            let key = canonical_group_key(&keys);
            let entry = groups.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                (keys.clone(), self.aggregates.iter().map(|_| AggState::new()).collect())
            });
            for (spec, state) in self.aggregates.iter().zip(entry.1.iter_mut()) {
                state.update(&spec.kind, &row)?;
            }
        }
        if groups.is_empty() && self.group_exprs.is_empty() {
            let states: Vec<AggState> = self.aggregates.iter().map(|_| AggState::new()).collect();
            let mut values = Vec::new();
            for (tag, state) in tags.iter().zip(states.iter()) {
                values.push(state.finalize(tag));
            }
            self.output.push(Row::new(self.schema.clone(), values, oxide_sql_types::RowId(0)));
            return Ok(());
        }
        for key in order {
            let (keys, states) = groups.remove(&key).expect("key was just inserted");
            let mut values = keys;
            for (tag, state) in tags.iter().zip(states.iter()) {
                values.push(state.finalize(tag));
            }
            self.output.push(Row::new(self.schema.clone(), values, oxide_sql_types::RowId(0)));
        }
        Ok(())
    }
}

impl Operator for GroupBy {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.input.open()?;
        self.output.clear();
        self.cursor = 0;

        // Buffer input through a spiller so very large inputs degrade to a
        // disk-backed single extra pass rather than an unbounded HashMap.
        let mut spiller = RowSpiller::new(self.input.schema(), self.spill_budget_bytes);
        while let Some(row) = self.input.next()? {
            spiller.push(row, None)?;
        }
        let rows = spiller.finish_unordered()?;
        self.aggregate(rows)?;
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
