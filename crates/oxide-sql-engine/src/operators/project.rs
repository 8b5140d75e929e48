//! `Filter`/`Project`/`Alias`: the single-input row-transforming operators.

use std::sync::Arc;

use oxide_sql_types::{ColumnDef, Error, Row, Schema};

use crate::expr::Evaluator;

use super::{Lifecycle, Operator};

/// Emits input rows for which a `Bool`-valued predicate evaluates to true;
/// `false` and `NULL` are skipped.
pub struct Filter {
    input: Box<dyn Operator>,
    predicate: Evaluator,
    state: Lifecycle,
}

impl Filter {
    #[must_use]
    pub fn new(input: Box<dyn Operator>, predicate: Evaluator) -> Self {
        Self {
            input,
            predicate,
            state: Lifecycle::default(),
        }
    }
}

impl Operator for Filter {
    fn schema(&self) -> Arc<Schema> {
        self.input.schema()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.input.open()
    }

    fn next(&mut self) -> Result<Option<Row>, Error> {
        loop {
            let Some(row) = self.input.next()? else {
                return Ok(None);
            };
            if self.predicate.eval(&row)?.as_bool()?.unwrap_or(false) {
                return Ok(Some(row));
            }
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.close();
        self.input.close()
    }
}

/// One output column of a [`Project`]: the compiled evaluator producing its
/// value plus its declared output name and type.
pub struct ProjectColumn {
    pub evaluator: Evaluator,
    pub output: ColumnDef,
}

/// Emits a row per input row with values computed by a list of evaluators;
/// the output schema carries the projection's declared names and types.
pub struct Project {
    input: Box<dyn Operator>,
    columns: Vec<ProjectColumn>,
    schema: Arc<Schema>,
    state: Lifecycle,
}

impl Project {
    #[must_use]
    pub fn new(input: Box<dyn Operator>, columns: Vec<ProjectColumn>) -> Self {
        let schema = Arc::new(Schema::new(columns.iter().map(|c| c.output.clone()).collect()));
        Self {
            input,
            columns,
            schema,
            state: Lifecycle::default(),
        }
    }
}

impl Operator for Project {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.input.open()
    }

    fn next(&mut self) -> Result<Option<Row>, Error> {
        let Some(row) = self.input.next()? else {
            return Ok(None);
        };
        let mut values = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            values.push(col.evaluator.eval(&row)?);
        }
        Ok(Some(Row::new(self.schema.clone(), values, row.row_id)))
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.close();
        self.input.close()
    }
}

/// Re-binds the input schema under a new table name; values are unchanged.
pub struct Alias {
    input: Box<dyn Operator>,
    schema: Arc<Schema>,
    state: Lifecycle,
}

impl Alias {
    #[must_use]
    pub fn new(input: Box<dyn Operator>, alias: &str) -> Self {
        let schema = Arc::new(input.schema().realias(alias));
        Self {
            input,
            schema,
            state: Lifecycle::default(),
        }
    }
}

impl Operator for Alias {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn open(&mut self) -> Result<(), Error> {
        self.state.open()?;
        self.input.open()
    }

    fn next(&mut self) -> Result<Option<Row>, Error> {
        Ok(self.input.next()?.map(|row| row.rebind(self.schema.clone())))
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
    fn filter_skips_false_and_null() {
        let predicate = Evaluator::Constant(Value::Bool(false));
        let mut filter = Filter::new(Box::new(Dual::new()), predicate);
        filter.open().unwrap();
        assert!(filter.next().unwrap().is_none());
        filter.close().unwrap();
    }

    #[test]
    fn project_computes_declared_columns() {
        let columns = vec![ProjectColumn {
            evaluator: Evaluator::Constant(Value::Int(42)),
            output: ColumnDef::new("answer", oxide_sql_types::ColumnType::Int),
        }];
        let mut project = Project::new(Box::new(Dual::new()), columns);
        project.open().unwrap();
        let row = project.next().unwrap().unwrap();
        assert_eq!(row.values, vec![Value::Int(42)]);
        assert!(project.next().unwrap().is_none());
        project.close().unwrap();
    }
}
