//! `CteOperator`: emits rows from an already-materialized CTE result set.
//!
//! The operator builder materializes a CTE (including iterating recursive
//! CTEs to a fixed point and deduplicating across iterations) once, before
//! any operator referencing it by name is built; this operator is just the
//! read-side handle over that materialized `Vec<Row>`.

use std::sync::Arc;

use oxide_sql_types::{Error, Row, Schema};

use super::{Lifecycle, Operator};

/// A read-only view over a CTE's materialized rows, shared (via `Arc`) by
/// every operator tree referencing the CTE within the surrounding query.
pub struct CteOperator {
    schema: Arc<Schema>,
    rows: Arc<Vec<Row>>,
    cursor: usize,
    state: Lifecycle,
}

impl CteOperator {
    #[must_use]
    pub fn new(schema: Arc<Schema>, rows: Arc<Vec<Row>>) -> Self {
        Self {
            schema,
            rows,
            cursor: 0,
            state: Lifecycle::default(),
        }
    }
}

impl Operator for CteOperator {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.cursor = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>, Error> {
        if self.cursor >= self.rows.len() {
            return Ok(None);
        }
        let row = self.rows[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(row))
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_sql_types::{ColumnDef, ColumnType, RowId, Value};

    #[test]
    fn replays_materialized_rows_in_order() {
        let schema = Arc::new(Schema::new(vec![ColumnDef::new("n", ColumnType::Int)]));
        let rows = Arc::new(vec![
            Row::new(schema.clone(), vec![Value::Int(1)], RowId(0)),
            Row::new(schema.clone(), vec![Value::Int(2)], RowId(1)),
        ]);
        let mut cte = CteOperator::new(schema, rows);
        cte.open().unwrap();
        assert_eq!(cte.next().unwrap().unwrap().values[0], Value::Int(1));
        assert_eq!(cte.next().unwrap().unwrap().values[0], Value::Int(2));
        assert!(cte.next().unwrap().is_none());
        cte.close().unwrap();
    }

    #[test]
    fn reopen_after_close_replays_from_start() {
        let schema = Arc::new(Schema::new(vec![ColumnDef::new("n", ColumnType::Int)]));
        let rows = Arc::new(vec![Row::new(schema.clone(), vec![Value::Int(7)], RowId(0))]);
        let mut cte = CteOperator::new(schema, rows);
        cte.open().unwrap();
        cte.next().unwrap();
        cte.close().unwrap();
        cte.open().unwrap();
        assert_eq!(cte.next().unwrap().unwrap().values[0], Value::Int(7));
        cte.close().unwrap();
    }
}
