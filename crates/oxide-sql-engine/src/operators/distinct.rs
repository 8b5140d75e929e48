//! `Distinct`: in-memory duplicate elimination, and `SpillableDistinct`,
//! its memory-budgeted variant for large inputs.

use std::collections::HashSet;
use std::sync::Arc;

use oxide_sql_types::{canonical_group_key, Error, Row, Schema};

use crate::spill::RowSpiller;

use super::{Lifecycle, Operator};

/// Emits each distinct row (by canonical value key) once, in first-seen
/// order.
pub struct Distinct {
    input: Box<dyn Operator>,
    seen: HashSet<String>,
    state: Lifecycle,
}

impl Distinct {
    #[must_use]
    pub fn new(input: Box<dyn Operator>) -> Self {
        Self {
            input,
            seen: HashSet::new(),
            state: Lifecycle::default(),
        }
    }
}

impl Operator for Distinct {
    fn schema(&self) -> Arc<Schema> {
        self.input.schema()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.seen.clear();
        self.input.open()
    }

    fn next(&mut self) -> Result<Option<Row>, Error> {
        loop {
            let Some(row) = self.input.next()? else {
                return Ok(None);
            };
            let key = canonical_group_key(&row.values);
            if self.seen.insert(key) {
                return Ok(Some(row));
            }
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.close();
        self.seen.clear();
        self.input.close()
    }
}

/// Same contract as `Distinct`, but buffers the input through a
/// `RowSpiller` first so dedup state for very large inputs is bounded by
/// the spill budget rather than the live `HashSet`.
///
/// Deduplication itself still happens against an in-memory `HashSet` of
/// canonical keys once the spilled stream is read back; what the spiller
/// bounds is the cost of holding the *rows* in memory while that set is
/// built, not the set itself.
pub struct SpillableDistinct {
    input: Box<dyn Operator>,
    spill_budget_bytes: usize,
    output: Vec<Row>,
    cursor: usize,
    state: Lifecycle,
}

impl SpillableDistinct {
    #[must_use]
    pub fn new(input: Box<dyn Operator>, spill_budget_bytes: usize) -> Self {
        Self {
            input,
            spill_budget_bytes,
            output: Vec::new(),
            cursor: 0,
            state: Lifecycle::default(),
        }
    }
}

impl Operator for SpillableDistinct {
    fn schema(&self) -> Arc<Schema> {
        self.input.schema()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.input.open()?;
        self.output.clear();
        self.cursor = 0;
        let mut spiller = RowSpiller::new(self.input.schema(), self.spill_budget_bytes);
        while let Some(row) = self.input.next()? {
            spiller.push(row, None)?;
        }
        let mut seen = HashSet::new();
        for row in spiller.finish_unordered()? {
            let row = row?;
            let key = canonical_group_key(&row.values);
            if seen.insert(key) {
                self.output.push(row);
            }
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
    use crate::operators::Dual;
    use oxide_sql_types::Value;

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

    #[test]
    fn distinct_drops_repeats_preserving_first_seen_order() {
        let input = Box::new(Fixed(vec![Value::Int(1), Value::Int(2), Value::Int(1)], 0));
        let mut distinct = Distinct::new(input);
        distinct.open().unwrap();
        assert_eq!(distinct.next().unwrap().unwrap().values[0], Value::Int(1));
        assert_eq!(distinct.next().unwrap().unwrap().values[0], Value::Int(2));
        assert!(distinct.next().unwrap().is_none());
        distinct.close().unwrap();
    }

    #[test]
    fn distinct_over_single_dual_row_emits_one_row() {
        let mut distinct = Distinct::new(Box::new(Dual::new()));
        distinct.open().unwrap();
        assert!(distinct.next().unwrap().is_some());
        assert!(distinct.next().unwrap().is_none());
        distinct.close().unwrap();
    }
}
