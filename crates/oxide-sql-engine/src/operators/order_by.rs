//! `OrderBy` (in-memory total sort), `ExternalSort` (memory-budgeted
//! spilling k-way merge) and `Limit`.

use std::sync::Arc;

use oxide_sql_types::{Error, Row, Schema};

use crate::expr::Evaluator;
use crate::spill::{RowComparator, RowSpiller};

use super::{Lifecycle, Operator};

/// One `ORDER BY` key: the evaluator producing the sort value and its
/// direction.
pub struct SortKey {
    pub evaluator: Evaluator,
    pub descending: bool,
}

fn compare_rows(keys: &[SortKey], a: &Row, b: &Row) -> Result<std::cmp::Ordering, Error> {
    for key in keys {
        let l = key.evaluator.eval(a)?;
        let r = key.evaluator.eval(b)?;
        let ord = l.order_cmp(&r);
        let ord = if key.descending { ord.reverse() } else { ord };
        if ord != std::cmp::Ordering::Equal {
            return Ok(ord);
        }
    }
    Ok(std::cmp::Ordering::Equal)
}

/// Total in-memory sort over declared keys; `NULL` orders low.
pub struct OrderBy {
    input: Box<dyn Operator>,
    keys: Vec<SortKey>,
    buffered: Vec<Row>,
    cursor: usize,
    state: Lifecycle,
}

impl OrderBy {
    #[must_use]
    pub fn new(input: Box<dyn Operator>, keys: Vec<SortKey>) -> Self {
        Self {
            input,
            keys,
            buffered: Vec::new(),
            cursor: 0,
            state: Lifecycle::default(),
        }
    }
}

impl Operator for OrderBy {
    fn schema(&self) -> Arc<Schema> {
        self.input.schema()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.input.open()?;
        self.buffered.clear();
        while let Some(row) = self.input.next()? {
            self.buffered.push(row);
        }
        let mut err = None;
        self.buffered.sort_by(|a, b| {
            compare_rows(&self.keys, a, b).unwrap_or_else(|e| {
                err.get_or_insert(e);
                std::cmp::Ordering::Equal
            })
        });
        if let Some(e) = err {
            return Err(e);
        }
        self.cursor = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>, Error> {
        if self.cursor >= self.buffered.len() {
            return Ok(None);
        }
        let row = self.buffered[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(row))
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.close();
        self.buffered.clear();
        self.input.close()
    }
}

/// Memory-budgeted k-way-merge sort: spills sorted runs to temp files once
/// the buffered bytes cross `spill_budget_bytes`, then merges.
pub struct ExternalSort {
    input: Box<dyn Operator>,
    keys: Arc<Vec<SortKey>>,
    spill_budget_bytes: usize,
    stream: Option<Box<dyn Iterator<Item = Result<Row, Error>> + Send>>,
    state: Lifecycle,
}

impl ExternalSort {
    #[must_use]
    pub fn new(input: Box<dyn Operator>, keys: Vec<SortKey>, spill_budget_bytes: usize) -> Self {
        Self {
            input,
            keys: Arc::new(keys),
            spill_budget_bytes,
            stream: None,
            state: Lifecycle::default(),
        }
    }

    fn comparator(&self) -> RowComparator {
        let keys = self.keys.clone();
        Arc::new(move |a: &Row, b: &Row| compare_rows(&keys, a, b).unwrap_or(std::cmp::Ordering::Equal))
    }
}

impl Operator for ExternalSort {
    fn schema(&self) -> Arc<Schema> {
        self.input.schema()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.input.open()?;
        let cmp = self.comparator();
        let mut spiller = RowSpiller::new(self.input.schema(), self.spill_budget_bytes);
        while let Some(row) = self.input.next()? {
            spiller.push(row, Some(&cmp))?;
        }
        self.stream = Some(spiller.finish_sorted(cmp)?);
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>, Error> {
        match &mut self.stream {
            Some(stream) => stream.next().transpose(),
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.close();
        self.stream = None;
        self.input.close()
    }
}

/// Skips `offset` rows then emits up to `count`. Either may be zero.
pub struct Limit {
    input: Box<dyn Operator>,
    offset: u64,
    count: Option<u64>,
    skipped: u64,
    emitted: u64,
    state: Lifecycle,
}

impl Limit {
    #[must_use]
    pub fn new(input: Box<dyn Operator>, offset: u64, count: Option<u64>) -> Self {
        Self {
            input,
            offset,
            count,
            skipped: 0,
            emitted: 0,
            state: Lifecycle::default(),
        }
    }
}

impl Operator for Limit {
    fn schema(&self) -> Arc<Schema> {
        self.input.schema()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.skipped = 0;
        self.emitted = 0;
        self.input.open()
    }

    fn next(&mut self) -> Result<Option<Row>, Error> {
        if let Some(count) = self.count {
            if self.emitted >= count {
                return Ok(None);
            }
        }
        while self.skipped < self.offset {
            if self.input.next()?.is_none() {
                return Ok(None);
            }
            self.skipped += 1;
        }
        let Some(row) = self.input.next()? else {
            return Ok(None);
        };
        self.emitted += 1;
        Ok(Some(row))
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.close();
        self.input.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::Dual;
    use oxide_sql_types::Value;

    #[test]
    fn limit_zero_count_emits_nothing() {
        let mut limit = Limit::new(Box::new(Dual::new()), 0, Some(0));
        limit.open().unwrap();
        assert!(limit.next().unwrap().is_none());
        limit.close().unwrap();
    }

    #[test]
    fn order_by_sorts_null_low() {
        struct Fixed(Vec<Value>, usize);
        impl Operator for Fixed {
            fn schema(&self) -> Arc<Schema> {
                Arc::new(Schema::empty())
            }
            fn open(&mut self) -> Result<(), Error> {
                self.1 = 0;
                Ok(())
            }
            fn next(&mut self) -> Result<Option<Row>, Error> {
                if self.1 >= self.0.len() {
                    return Ok(None);
                }
                let v = self.0[self.1].clone();
                self.1 += 1;
                Ok(Some(Row::new(Arc::new(Schema::empty()), vec![v], oxide_sql_types::RowId(0))))
            }
            fn close(&mut self) -> Result<(), Error> {
                Ok(())
            }
        }
        let input = Box::new(Fixed(vec![Value::Int(2), Value::Null, Value::Int(1)], 0));
        let keys = vec![SortKey {
            evaluator: Evaluator::Column(0),
            descending: false,
        }];
        let mut sort = OrderBy::new(input, keys);
        sort.open().unwrap();
        assert_eq!(sort.next().unwrap().unwrap().values[0], Value::Null);
        assert_eq!(sort.next().unwrap().unwrap().values[0], Value::Int(1));
        assert_eq!(sort.next().unwrap().unwrap().values[0], Value::Int(2));
        sort.close().unwrap();
    }
}
