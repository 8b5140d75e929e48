//! The spill subsystem: memory-budgeted buffering that overflows to temp
//! files, shared by [`crate::operators::ExternalSort`] and the spillable
//! variants of `Distinct`/`GroupBy`.

use std::io::{BufReader, BufWriter, Write};
use std::sync::Arc;

use oxide_sql_types::{Error, Row, Schema, Value};

/// A row comparator shared across spill runs; boxed so `ExternalSort` can
/// build one from a declared list of sort keys without generic parameters
/// leaking into the operator trait.
pub type RowComparator = Arc<dyn Fn(&Row, &Row) -> std::cmp::Ordering + Send + Sync>;

/// Deterministic, budgeting-only size estimate for a row — not used for any
/// correctness decision, only to decide when to spill.
#[must_use]
pub fn estimate_row_bytes(row: &Row) -> usize {
    row.values.iter().map(estimate_value_bytes).sum::<usize>() + 32
}

fn estimate_value_bytes(value: &Value) -> usize {
    match value {
        Value::Null | Value::Bool(_) => 1,
        Value::TinyInt(_) => 1,
        Value::SmallInt(_) => 2,
        Value::Int(_) | Value::Float(_) => 4,
        Value::BigInt(_) | Value::Double(_) | Value::Decimal(_) => 8,
        Value::Char(s) | Value::VarChar(s) | Value::Text(s) => s.len(),
        Value::Date(_) => 4,
        Value::Time(_) | Value::DateTime(_) | Value::Timestamp(_) => 8,
        Value::Json(j) => j.to_string().len(),
        Value::Blob(b) => b.len(),
    }
}

/// A serializable row, used only for the on-disk run format.
#[derive(serde::Serialize, serde::Deserialize)]
struct WireRow {
    values: Vec<WireValue>,
    row_id: u64,
}

#[derive(serde::Serialize, serde::Deserialize)]
enum WireValue {
    Null,
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Decimal(i128, u8),
    Bool(bool),
    Char(String),
    VarChar(String),
    Text(String),
    Date(String),
    Time(String),
    DateTime(String),
    Timestamp(String),
    Json(String),
    Blob(Vec<u8>),
}

impl WireValue {
    fn from_value(v: &Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::TinyInt(n) => Self::TinyInt(*n),
            Value::SmallInt(n) => Self::SmallInt(*n),
            Value::Int(n) => Self::Int(*n),
            Value::BigInt(n) => Self::BigInt(*n),
            Value::Float(n) => Self::Float(*n),
            Value::Double(n) => Self::Double(*n),
            Value::Decimal(d) => Self::Decimal(d.mantissa(), d.scale()),
            Value::Bool(b) => Self::Bool(*b),
            Value::Char(s) => Self::Char(s.clone()),
            Value::VarChar(s) => Self::VarChar(s.clone()),
            Value::Text(s) => Self::Text(s.clone()),
            Value::Date(d) => Self::Date(d.to_string()),
            Value::Time(t) => Self::Time(t.to_string()),
            Value::DateTime(dt) => Self::DateTime(dt.to_string()),
            Value::Timestamp(dt) => Self::Timestamp(dt.to_string()),
            Value::Json(j) => Self::Json(j.to_string()),
            Value::Blob(b) => Self::Blob(b.clone()),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::TinyInt(n) => Value::TinyInt(n),
            Self::SmallInt(n) => Value::SmallInt(n),
            Self::Int(n) => Value::Int(n),
            Self::BigInt(n) => Value::BigInt(n),
            Self::Float(n) => Value::Float(n),
            Self::Double(n) => Value::Double(n),
            Self::Decimal(m, s) => Value::Decimal(oxide_sql_types::Decimal::new(m, s)),
            Self::Bool(b) => Value::Bool(b),
            Self::Char(s) => Value::Char(s),
            Self::VarChar(s) => Value::VarChar(s),
            Self::Text(s) => Value::Text(s),
            Self::Date(s) => Value::Date(
                s.parse()
                    .unwrap_or_else(|_| chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
            ),
            Self::Time(s) => Value::Time(
                s.parse()
                    .unwrap_or_else(|_| chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap()),
            ),
            Self::DateTime(s) => Value::DateTime(
                chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                    .unwrap_or_else(|_| chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()),
            ),
            Self::Timestamp(s) => Value::Timestamp(
                chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                    .unwrap_or_else(|_| chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()),
            ),
            Self::Json(s) => Value::Json(serde_json::from_str(&s).unwrap_or(serde_json::Value::Null)),
            Self::Blob(b) => Value::Blob(b),
        }
    }
}

/// A single spilled run: a temp file of newline-delimited JSON rows, opened
/// for sequential read.
struct Run {
    reader: BufReader<std::fs::File>,
    schema: Arc<Schema>,
}

impl Run {
    fn next_row(&mut self) -> Result<Option<Row>, Error> {
        use std::io::BufRead;
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).map_err(Error::SpillIo)?;
        if n == 0 {
            return Ok(None);
        }
        let wire: WireRow =
            serde_json::from_str(line.trim_end()).map_err(|e| Error::Internal(format!("corrupt spill run: {e}")))?;
        let values = wire.values.into_iter().map(WireValue::into_value).collect();
        Ok(Some(Row::new(self.schema.clone(), values, oxide_sql_types::RowId(wire.row_id))))
    }
}

/// Accumulates rows in memory up to a byte budget, spilling sorted runs to
/// temp files beyond that. Used directly by `ExternalSort`; `GroupBy`'s
/// spillable path uses it to buffer input for a second aggregation pass
/// when the live group-state would otherwise exceed the budget.
pub struct RowSpiller {
    schema: Arc<Schema>,
    budget_bytes: usize,
    buffer: Vec<Row>,
    buffer_bytes: usize,
    runs: Vec<tempfile::NamedTempFile>,
}

impl RowSpiller {
    #[must_use]
    pub fn new(schema: Arc<Schema>, budget_bytes: usize) -> Self {
        Self {
            schema,
            budget_bytes,
            buffer: Vec::new(),
            buffer_bytes: 0,
            runs: Vec::new(),
        }
    }

    #[must_use]
    pub fn spilled(&self) -> bool {
        !self.runs.is_empty()
    }

    /// Pushes one row, spilling the current buffer as a sorted run (via
    /// `sort_key`) when the byte budget is exceeded.
    pub fn push(&mut self, row: Row, sort_key: Option<&RowComparator>) -> Result<(), Error> {
        self.buffer_bytes += estimate_row_bytes(&row);
        self.buffer.push(row);
        if self.buffer_bytes > self.budget_bytes {
            self.spill_buffer(sort_key)?;
        }
        Ok(())
    }

    fn spill_buffer(&mut self, sort_key: Option<&RowComparator>) -> Result<(), Error> {
        if let Some(cmp) = sort_key {
            self.buffer.sort_by(|a, b| cmp(a, b));
        }
        let file = tempfile::NamedTempFile::new().map_err(Error::SpillIo)?;
        {
            let mut writer = BufWriter::new(file.reopen().map_err(Error::SpillIo)?);
            for row in &self.buffer {
                let wire = WireRow {
                    values: row.values.iter().map(WireValue::from_value).collect(),
                    row_id: row.row_id.0,
                };
                let line = serde_json::to_string(&wire).map_err(|e| Error::Internal(format!("spill encode: {e}")))?;
                writer.write_all(line.as_bytes()).map_err(Error::SpillIo)?;
                writer.write_all(b"\n").map_err(Error::SpillIo)?;
            }
            writer.flush().map_err(Error::SpillIo)?;
        }
        self.runs.push(file);
        self.buffer.clear();
        self.buffer_bytes = 0;
        Ok(())
    }

    /// Finalizes the spiller into a single sorted row stream. If nothing
    /// spilled, sorts the in-memory buffer directly; otherwise performs a
    /// k-way merge of the spilled runs plus any remaining buffered rows.
    pub fn finish_sorted(
        mut self,
        sort_key: RowComparator,
    ) -> Result<Box<dyn Iterator<Item = Result<Row, Error>> + Send>, Error> {
        if self.runs.is_empty() {
            self.buffer.sort_by(|a, b| sort_key(a, b));
            return Ok(Box::new(self.buffer.into_iter().map(Ok)));
        }
        if !self.buffer.is_empty() {
            self.spill_buffer(Some(&sort_key))?;
        }
        let mut runs = Vec::with_capacity(self.runs.len());
        for file in &self.runs {
            let reader = BufReader::new(file.reopen().map_err(Error::SpillIo)?);
            runs.push(Run {
                reader,
                schema: self.schema.clone(),
            });
        }
        Ok(Box::new(KWayMerge::new(runs, self.runs, sort_key)?))
    }

    /// Finalizes into a simple concatenation (buffer then each run in
    /// order), with no ordering guarantee — used by the spillable
    /// aggregation fallback, which re-aggregates everything in one pass
    /// regardless of input order.
    pub fn finish_unordered(mut self) -> Result<Box<dyn Iterator<Item = Result<Row, Error>> + Send>, Error> {
        if self.runs.is_empty() {
            return Ok(Box::new(self.buffer.into_iter().map(Ok)));
        }
        if !self.buffer.is_empty() {
            self.spill_buffer(None)?;
        }
        let mut runs = Vec::with_capacity(self.runs.len());
        for file in &self.runs {
            let reader = BufReader::new(file.reopen().map_err(Error::SpillIo)?);
            runs.push(Run {
                reader,
                schema: self.schema.clone(),
            });
        }
        Ok(Box::new(ConcatRuns { runs, cursor: 0 }))
    }
}

/// Repeatedly emits the smallest head across readers, advancing that
/// reader — a textbook k-way merge. Holds the run's backing temp files so
/// they are deleted once the merge (and this iterator) is dropped.
struct KWayMerge {
    runs: Vec<Run>,
    heads: Vec<Option<Row>>,
    sort_key: RowComparator,
    _files: Vec<tempfile::NamedTempFile>,
}

impl KWayMerge {
    fn new(mut runs: Vec<Run>, files: Vec<tempfile::NamedTempFile>, sort_key: RowComparator) -> Result<Self, Error> {
        let mut heads = Vec::with_capacity(runs.len());
        for run in &mut runs {
            heads.push(run.next_row()?);
        }
        Ok(Self {
            runs,
            heads,
            sort_key,
            _files: files,
        })
    }
}

impl Iterator for KWayMerge {
    type Item = Result<Row, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut best: Option<usize> = None;
        for (i, head) in self.heads.iter().enumerate() {
            if let Some(row) = head {
                match best {
                    None => best = Some(i),
                    Some(b) => {
                        if (self.sort_key)(row, self.heads[b].as_ref().unwrap()) == std::cmp::Ordering::Less {
                            best = Some(i);
                        }
                    }
                }
            }
        }
        let idx = best?;
        let result = self.heads[idx].take();
        match self.runs[idx].next_row() {
            Ok(next) => self.heads[idx] = next,
            Err(e) => return Some(Err(e)),
        }
        result.map(Ok)
    }
}

struct ConcatRuns {
    runs: Vec<Run>,
    cursor: usize,
}

impl Iterator for ConcatRuns {
    type Item = Result<Row, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.runs.len() {
            match self.runs[self.cursor].next_row() {
                Ok(Some(row)) => return Some(Ok(row)),
                Ok(None) => self.cursor += 1,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
