//! `Dual`: the single-row, zero-column operator backing `SELECT` with no
//! `FROM` clause (MySQL's implicit `DUAL` table).

use std::sync::Arc;

use oxide_sql_types::{Error, Row, Schema};

use super::{Lifecycle, Operator};

pub struct Dual {
    schema: Arc<Schema>,
    emitted: bool,
    state: Lifecycle,
}

impl Dual {
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: Arc::new(Schema::empty()),
            emitted: false,
            state: Lifecycle::default(),
        }
    }
}

impl Default for Dual {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for Dual {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.emitted = false;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>, Error> {
        if self.emitted {
            return Ok(None);
        }
        self.emitted = true;
        Ok(Some(Row::new(self.schema.clone(), Vec::new(), oxide_sql_types::RowId(0))))
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_exactly_one_row() {
        let mut dual = Dual::new();
        dual.open().unwrap();
        assert!(dual.next().unwrap().is_some());
        assert!(dual.next().unwrap().is_none());
        dual.close().unwrap();
    }
}
