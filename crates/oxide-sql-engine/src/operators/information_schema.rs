//! `InformationSchema`: emits a pre-computed set of metadata rows.
//!
//! The driver builds the row set (table/column/index listings, etc.) by
//! reading the catalog before constructing this operator; `LIKE` pattern
//! filtering and an optional `WHERE` clause are applied downstream by
//! wrapping this operator in `Filter`, per the statement driver's
//! `SHOW`/`DESCRIBE` handling.

use std::sync::Arc;

use oxide_sql_types::{Error, Row, Schema};

use super::{Lifecycle, Operator};

pub struct InformationSchema {
    schema: Arc<Schema>,
    rows: Vec<Row>,
    cursor: usize,
    state: Lifecycle,
}

impl InformationSchema {
    #[must_use]
    pub fn new(schema: Arc<Schema>, rows: Vec<Row>) -> Self {
        Self {
            schema,
            rows,
            cursor: 0,
            state: Lifecycle::default(),
        }
    }
}

impl Operator for InformationSchema {
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
    fn emits_the_supplied_rows_then_ends() {
        let schema = Arc::new(Schema::new(vec![ColumnDef::new("table_name", ColumnType::Text)]));
        let rows = vec![Row::new(schema.clone(), vec![Value::Text("users".into())], RowId(0))];
        let mut info = InformationSchema::new(schema, rows);
        info.open().unwrap();
        assert_eq!(info.next().unwrap().unwrap().values[0], Value::Text("users".into()));
        assert!(info.next().unwrap().is_none());
        info.close().unwrap();
    }
}
