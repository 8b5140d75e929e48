//! `UNION`, `INTERSECT` and `EXCEPT`, each with an `ALL`/`DISTINCT`
//! quantifier.

use std::collections::HashMap;
use std::sync::Arc;

use oxide_sql_types::{canonical_group_key, Error, Row, Schema};

use super::{Lifecycle, Operator};

/// Whether a set operation keeps duplicate rows (`ALL`) or collapses them
/// (`DISTINCT`, the SQL default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpQuantifier {
    All,
    Distinct,
}

/// Buffers both inputs eagerly; the combined row stream is computed once
/// at `open()` since every set operation needs to see both sides in full
/// before it can decide what to emit (duplicate counts, membership).
fn buffer(op: &mut dyn Operator) -> Result<Vec<Row>, Error> {
    let mut rows = Vec::new();
    while let Some(row) = op.next()? {
        rows.push(row);
    }
    Ok(rows)
}

fn multiset_counts(rows: &[Row]) -> HashMap<String, (Row, i64)> {
    let mut counts: HashMap<String, (Row, i64)> = HashMap::new();
    for row in rows {
        let key = canonical_group_key(&row.values);
        counts
            .entry(key)
            .and_modify(|(_, n)| *n += 1)
            .or_insert_with(|| (row.clone(), 1));
    }
    counts
}

/// `left UNION [ALL] right`.
pub struct Union {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    quantifier: SetOpQuantifier,
    output: Vec<Row>,
    cursor: usize,
    state: Lifecycle,
}

impl Union {
    #[must_use]
    pub fn new(left: Box<dyn Operator>, right: Box<dyn Operator>, quantifier: SetOpQuantifier) -> Self {
        Self {
            left,
            right,
            quantifier,
            output: Vec::new(),
            cursor: 0,
            state: Lifecycle::default(),
        }
    }
}

impl Operator for Union {
    fn schema(&self) -> Arc<Schema> {
        self.left.schema()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.left.open()?;
        self.right.open()?;
        let mut left_rows = buffer(self.left.as_mut())?;
        let right_rows = buffer(self.right.as_mut())?;
        left_rows.extend(right_rows);
        self.output = match self.quantifier {
            SetOpQuantifier::All => left_rows,
            SetOpQuantifier::Distinct => {
                let mut seen = std::collections::HashSet::new();
                left_rows
                    .into_iter()
                    .filter(|row| seen.insert(canonical_group_key(&row.values)))
                    .collect()
            }
        };
        self.cursor = 0;
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
        self.left.close()?;
        self.right.close()
    }
}

/// `left INTERSECT [ALL] right`: rows present in both sides. With `ALL`,
/// a row's multiplicity is `min(count_left, count_right)`.
pub struct Intersect {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    quantifier: SetOpQuantifier,
    output: Vec<Row>,
    cursor: usize,
    state: Lifecycle,
}

impl Intersect {
    #[must_use]
    pub fn new(left: Box<dyn Operator>, right: Box<dyn Operator>, quantifier: SetOpQuantifier) -> Self {
        Self {
            left,
            right,
            quantifier,
            output: Vec::new(),
            cursor: 0,
            state: Lifecycle::default(),
        }
    }
}

impl Operator for Intersect {
    fn schema(&self) -> Arc<Schema> {
        self.left.schema()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.left.open()?;
        self.right.open()?;
        let left_rows = buffer(self.left.as_mut())?;
        let right_rows = buffer(self.right.as_mut())?;
        let left_counts = multiset_counts(&left_rows);
        let right_counts = multiset_counts(&right_rows);
        self.output.clear();
        for (key, (row, left_n)) in &left_counts {
            if let Some((_, right_n)) = right_counts.get(key) {
                let n = match self.quantifier {
                    SetOpQuantifier::All => (*left_n).min(*right_n),
                    SetOpQuantifier::Distinct => 1,
                };
                for _ in 0..n {
                    self.output.push(row.clone());
                }
            }
        }
        self.cursor = 0;
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
        self.left.close()?;
        self.right.close()
    }
}

/// `left EXCEPT [ALL] right`: rows of `left` not present in `right`. With
/// `ALL`, a row's multiplicity is `max(count_left - count_right, 0)`.
pub struct Except {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    quantifier: SetOpQuantifier,
    output: Vec<Row>,
    cursor: usize,
    state: Lifecycle,
}

impl Except {
    #[must_use]
    pub fn new(left: Box<dyn Operator>, right: Box<dyn Operator>, quantifier: SetOpQuantifier) -> Self {
        Self {
            left,
            right,
            quantifier,
            output: Vec::new(),
            cursor: 0,
            state: Lifecycle::default(),
        }
    }
}

impl Operator for Except {
    fn schema(&self) -> Arc<Schema> {
        self.left.schema()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.left.open()?;
        self.right.open()?;
        let left_rows = buffer(self.left.as_mut())?;
        let right_rows = buffer(self.right.as_mut())?;
        let left_counts = multiset_counts(&left_rows);
        let right_counts = multiset_counts(&right_rows);
        self.output.clear();
        for (key, (row, left_n)) in &left_counts {
            let right_n = right_counts.get(key).map_or(0, |(_, n)| *n);
            let remaining = (*left_n - right_n).max(0);
            let n = match self.quantifier {
                SetOpQuantifier::All => remaining,
                SetOpQuantifier::Distinct => i64::from(remaining > 0),
            };
            for _ in 0..n {
                self.output.push(row.clone());
            }
        }
        self.cursor = 0;
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
        self.left.close()?;
        self.right.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::Dual;

    #[test]
    fn union_distinct_of_two_dual_rows_emits_one_row() {
        let mut union = Union::new(Box::new(Dual::new()), Box::new(Dual::new()), SetOpQuantifier::Distinct);
        union.open().unwrap();
        assert!(union.next().unwrap().is_some());
        assert!(union.next().unwrap().is_none());
        union.close().unwrap();
    }

    #[test]
    fn union_all_of_two_dual_rows_emits_two_rows() {
        let mut union = Union::new(Box::new(Dual::new()), Box::new(Dual::new()), SetOpQuantifier::All);
        union.open().unwrap();
        assert!(union.next().unwrap().is_some());
        assert!(union.next().unwrap().is_some());
        assert!(union.next().unwrap().is_none());
        union.close().unwrap();
    }

    #[test]
    fn except_of_identical_inputs_is_empty() {
        let mut except = Except::new(Box::new(Dual::new()), Box::new(Dual::new()), SetOpQuantifier::Distinct);
        except.open().unwrap();
        assert!(except.next().unwrap().is_none());
        except.close().unwrap();
    }

    #[test]
    fn intersect_of_identical_inputs_keeps_the_row() {
        let mut intersect = Intersect::new(Box::new(Dual::new()), Box::new(Dual::new()), SetOpQuantifier::Distinct);
        intersect.open().unwrap();
        assert!(intersect.next().unwrap().is_some());
        assert!(intersect.next().unwrap().is_none());
        intersect.close().unwrap();
    }
}
