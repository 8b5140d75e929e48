//! Column definitions and row schemas.

use std::collections::HashMap;
use std::sync::Arc;

use crate::value::Value;

/// Runtime SQL column type (a trimmed-down mirror of the parser's
/// `DataType`, carrying only what the value model needs: no `CHECK`/
/// constraint text, since those live on the owning table in the catalog).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal { precision: u16, scale: u16 },
    Boolean,
    Char(u32),
    VarChar(u32),
    Text,
    Date,
    Time,
    DateTime,
    Timestamp,
    Json,
    Blob,
}

impl ColumnType {
    /// The value that fills a column of this type when no default and no
    /// explicit value are supplied, prior to NOT NULL enforcement.
    #[must_use]
    pub fn null_value(&self) -> Value {
        Value::Null
    }
}

/// One column of a [`Schema`]: name, type, size, nullability, key role and
/// default.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    /// Table this column belongs to in a join-composed schema, if any; used
    /// to build the `T_c` qualified-flat lookup name.
    pub table: Option<String>,
    pub col_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub default: Option<Value>,
}

impl ColumnDef {
    #[must_use]
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            table: None,
            col_type,
            nullable: true,
            primary_key: false,
            auto_increment: false,
            default: None,
        }
    }

    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Ordered list of column definitions with a case-insensitive name index.
/// Immutable once built — DDL replaces the whole [`Schema`] in the catalog
/// rather than mutating it in place.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<ColumnDef>,
    index: HashMap<String, usize>,
}

impl Schema {
    #[must_use]
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            index.entry(col.name.to_lowercase()).or_insert(i);
            if let Some(table) = &col.table {
                index
                    .entry(format!("{}_{}", table.to_lowercase(), col.name.to_lowercase()))
                    .or_insert(i);
            }
        }
        Self { columns, index }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn column(&self, ordinal: usize) -> Option<&ColumnDef> {
        self.columns.get(ordinal)
    }

    /// Unqualified, case-insensitive lookup; the first matching ordinal
    /// wins on ambiguity (callers that must detect ambiguity should use
    /// [`Schema::ordinals`]).
    #[must_use]
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_lowercase()).copied()
    }

    /// All ordinals whose bare column name matches, for ambiguity checks.
    #[must_use]
    pub fn ordinals(&self, name: &str) -> Vec<usize> {
        let lower = name.to_lowercase();
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name.to_lowercase() == lower)
            .map(|(i, _)| i)
            .collect()
    }

    /// Qualified lookup `T.c`: tries the flattened `T_c` name first (how
    /// join-composed schemas are built), then falls back to the bare name.
    #[must_use]
    pub fn ordinal_qualified(&self, table: &str, column: &str) -> Option<usize> {
        self.index
            .get(&format!("{}_{}", table.to_lowercase(), column.to_lowercase()))
            .or_else(|| self.index.get(&column.to_lowercase()))
            .copied()
    }

    /// Builds the combined schema of a join, flattening the right side's
    /// column names to `{table}_{col}` where a table qualifier is known so
    /// `T.c` binding can use the qualified-flat lookup rule.
    #[must_use]
    pub fn join(left: &Self, right: &Self) -> Self {
        let mut columns = left.columns.clone();
        columns.extend(right.columns.iter().cloned());
        Self::new(columns)
    }

    /// Re-derives a schema with every column's `table` field overwritten,
    /// used by the `Alias` operator to re-bind a child's output under a new
    /// table name without touching any values.
    #[must_use]
    pub fn realias(&self, table: &str) -> Self {
        let columns = self
            .columns
            .iter()
            .cloned()
            .map(|mut c| {
                c.table = Some(table.to_string());
                c
            })
            .collect();
        Self::new(columns)
    }
}

/// An opaque identifier for a row's physical slot. Only meaningful relative
/// to the storage engine's current state; never persist across DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u64);

/// A row of values bound to a schema. Cloning is cheap: the schema is
/// shared via `Arc`, so rebinding (projection/alias) swaps the pointer
/// rather than deep-copying column metadata.
#[derive(Debug, Clone)]
pub struct Row {
    pub schema: Arc<Schema>,
    pub values: Vec<Value>,
    pub row_id: RowId,
}

impl Row {
    #[must_use]
    pub fn new(schema: Arc<Schema>, values: Vec<Value>, row_id: RowId) -> Self {
        Self {
            schema,
            values,
            row_id,
        }
    }

    #[must_use]
    pub fn get(&self, ordinal: usize) -> Option<&Value> {
        self.values.get(ordinal)
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.schema.ordinal(name).and_then(|i| self.values.get(i))
    }

    /// Rebinds this row under a different schema of the same arity,
    /// without copying the values — used by `Alias` and projection passes
    /// that only rename columns.
    #[must_use]
    pub fn rebind(self, schema: Arc<Schema>) -> Self {
        Self {
            schema,
            values: self.values,
            row_id: self.row_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(vec![
            ColumnDef::new("id", ColumnType::Int).with_table("t").primary(),
            ColumnDef::new("name", ColumnType::VarChar(255)).with_table("t"),
        ])
    }

    #[test]
    fn bare_and_qualified_lookup_agree() {
        let s = schema();
        assert_eq!(s.ordinal("id"), Some(0));
        assert_eq!(s.ordinal_qualified("t", "id"), Some(0));
        assert_eq!(s.ordinal_qualified("other", "id"), Some(0));
    }

    #[test]
    fn join_flattens_qualified_names() {
        let left = schema();
        let right = Schema::new(vec![ColumnDef::new("id", ColumnType::Int).with_table("u")]);
        let combined = Schema::join(&left, &right);
        assert_eq!(combined.len(), 3);
        assert_eq!(combined.ordinal_qualified("u", "id"), Some(2));
        assert_eq!(combined.ordinal_qualified("t", "id"), Some(0));
    }
}
