//! `NestedLoopJoin`: inner/left/right/full/cross join over two child
//! operators, evaluated as a predicate over the combined schema.

use std::sync::Arc;

use oxide_sql_types::{Error, Row, Schema, Value};

use crate::expr::Evaluator;

use super::{Lifecycle, Operator};

/// Join kind and predicate.
pub enum JoinCondition {
    Inner(Evaluator),
    Left(Evaluator),
    Right(Evaluator),
    Full(Evaluator),
    Cross,
}

impl JoinCondition {
    fn predicate(&self) -> Option<&Evaluator> {
        match self {
            Self::Inner(e) | Self::Left(e) | Self::Right(e) | Self::Full(e) => Some(e),
            Self::Cross => None,
        }
    }
}

/// A nested-loop join: materializes the right (inner) input once on `open`,
/// then for each left row scans the buffered right rows evaluating the join
/// predicate. Outer joins pad the missing side with `NULL` when no inner
/// row matched.
pub struct NestedLoopJoin {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    condition: JoinCondition,
    schema: Arc<Schema>,
    right_buffered: Vec<Row>,
    right_matched: Vec<bool>,
    left_row: Option<Row>,
    left_matched_any: bool,
    right_cursor: usize,
    emitting_unmatched_right: bool,
    unmatched_right_cursor: usize,
    state: Lifecycle,
}

impl NestedLoopJoin {
    #[must_use]
    pub fn new(left: Box<dyn Operator>, right: Box<dyn Operator>, condition: JoinCondition) -> Self {
        let schema = Arc::new(Schema::join(&left.schema(), &right.schema()));
        Self {
            left,
            right,
            condition,
            schema,
            right_buffered: Vec::new(),
            right_matched: Vec::new(),
            left_row: None,
            left_matched_any: false,
            right_cursor: 0,
            emitting_unmatched_right: false,
            unmatched_right_cursor: 0,
            state: Lifecycle::default(),
        }
    }

    fn combine(&self, left: &[Value], right: &[Value]) -> Row {
        let mut values = Vec::with_capacity(left.len() + right.len());
        values.extend_from_slice(left);
        values.extend_from_slice(right);
        Row::new(self.schema.clone(), values, oxide_sql_types::RowId(0))
    }

    fn matches(&self, row: &Row) -> Result<bool, Error> {
        match self.condition.predicate() {
            Some(pred) => Ok(pred.eval(row)?.as_bool()?.unwrap_or(false)),
            None => Ok(true),
        }
    }

    fn nulls(n: usize) -> Vec<Value> {
        vec![Value::Null; n]
    }

    fn advance_left(&mut self) -> Result<bool, Error> {
        let Some(row) = self.left.next()? else {
            return Ok(false);
        };
        self.left_row = Some(row);
        self.left_matched_any = false;
        self.right_cursor = 0;
        Ok(true)
    }
}

impl Operator for NestedLoopJoin {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.left.open()?;
        self.right.open()?;
        self.right_buffered.clear();
        while let Some(row) = self.right.next()? {
            self.right_buffered.push(row);
        }
        self.right_matched = vec![false; self.right_buffered.len()];
        self.left_row = None;
        self.emitting_unmatched_right = false;
        self.unmatched_right_cursor = 0;
        self.advance_left()?;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>, Error> {
        let right_outer = matches!(self.condition, JoinCondition::Right(_) | JoinCondition::Full(_));
        let left_outer = matches!(self.condition, JoinCondition::Left(_) | JoinCondition::Full(_));
        loop {
            if self.emitting_unmatched_right {
                while self.unmatched_right_cursor < self.right_buffered.len() {
                    let idx = self.unmatched_right_cursor;
                    self.unmatched_right_cursor += 1;
                    if !self.right_matched[idx] {
                        let right_len = self.right_buffered[idx].values.len();
                        let left_len = self.schema.len() - right_len;
                        return Ok(Some(self.combine(&Self::nulls(left_len), &self.right_buffered[idx].values)));
                    }
                }
                return Ok(None);
            }
            let Some(left_row) = self.left_row.clone() else {
                if right_outer {
                    self.emitting_unmatched_right = true;
                    continue;
                }
                return Ok(None);
            };
            while self.right_cursor < self.right_buffered.len() {
                let idx = self.right_cursor;
                self.right_cursor += 1;
                let candidate = self.combine(&left_row.values, &self.right_buffered[idx].values);
                if self.matches(&candidate)? {
                    self.left_matched_any = true;
                    self.right_matched[idx] = true;
                    return Ok(Some(candidate));
                }
            }
            let unmatched = !self.left_matched_any;
            if !self.advance_left()? {
                self.left_row = None;
            }
            if unmatched && left_outer {
                let right_len = self.schema.len() - left_row.values.len();
                return Ok(Some(self.combine(&left_row.values, &Self::nulls(right_len))));
            }
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.close();
        self.left.close()?;
        self.right.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::Dual;
    use oxide_sql_core::ast::BinaryOp;

    #[test]
    fn cross_join_of_two_dual_rows_emits_one_row() {
        let mut join = NestedLoopJoin::new(Box::new(Dual::new()), Box::new(Dual::new()), JoinCondition::Cross);
        join.open().unwrap();
        assert!(join.next().unwrap().is_some());
        assert!(join.next().unwrap().is_none());
        join.close().unwrap();
    }

    #[test]
    fn inner_join_false_predicate_emits_nothing() {
        let predicate = Evaluator::Binary {
            op: BinaryOp::Eq,
            left: Box::new(Evaluator::Constant(Value::Int(1))),
            right: Box::new(Evaluator::Constant(Value::Int(2))),
        };
        let mut join = NestedLoopJoin::new(Box::new(Dual::new()), Box::new(Dual::new()), JoinCondition::Inner(predicate));
        join.open().unwrap();
        assert!(join.next().unwrap().is_none());
        join.close().unwrap();
    }
}
