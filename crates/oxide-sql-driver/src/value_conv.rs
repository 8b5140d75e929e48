//! Conversions between the parser's literal/type vocabulary and the
//! runtime's `Value`/`ColumnType` vocabulary. Pure, side-effect-free
//! mapping code shared by the operator builder and DDL dispatch.

use oxide_sql_core::ast::{DataType, Literal};
use oxide_sql_engine::expr::CastTarget;
use oxide_sql_types::{ColumnType, Decimal, Value};

/// Converts a parsed literal into its runtime value. `Blob` literals land
/// as `Value::Blob`; everything else is a direct tag-for-tag mapping.
#[must_use]
pub fn literal_to_value(literal: &Literal) -> Value {
    match literal {
        Literal::Integer(i) => Value::BigInt(*i),
        Literal::Float(f) => Value::Double(*f),
        Literal::String(s) => Value::Text(s.clone()),
        Literal::Blob(b) => Value::Blob(b.clone()),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

/// Maps a parsed `DataType` to the runtime's `ColumnType`. `Custom` types
/// (dialect-specific names the parser didn't recognize, e.g. `ENUM(...)`)
/// fall back to `Text`, since there is no narrower runtime representation
/// for an unrecognized type name.
#[must_use]
pub fn data_type_to_column_type(data_type: &DataType) -> ColumnType {
    match data_type {
        DataType::Tinyint => ColumnType::TinyInt,
        DataType::Smallint => ColumnType::SmallInt,
        DataType::Integer => ColumnType::Int,
        DataType::Bigint => ColumnType::BigInt,
        DataType::Float => ColumnType::Float,
        DataType::Double => ColumnType::Double,
        DataType::Decimal { precision, scale } => ColumnType::Decimal {
            precision: precision.unwrap_or(10),
            scale: scale.unwrap_or(0),
        },
        DataType::Char(len) => ColumnType::Char(len.unwrap_or(1)),
        DataType::Varchar(len) => ColumnType::VarChar(len.unwrap_or(255)),
        DataType::Text => ColumnType::Text,
        DataType::Blob => ColumnType::Blob,
        DataType::Date => ColumnType::Date,
        DataType::Time => ColumnType::Time,
        DataType::Timestamp => ColumnType::Timestamp,
        DataType::Datetime => ColumnType::DateTime,
        DataType::Json => ColumnType::Json,
        DataType::Boolean => ColumnType::Boolean,
        DataType::Custom(_) => ColumnType::Text,
    }
}

/// Maps a parsed `DataType` to the evaluator's simplified `CAST` target.
/// `CHAR(n)`/`VARCHAR(n)` both collapse to `CastTarget::Char`/`Text` since
/// the evaluator's `CAST` only needs the conversion rule, not the declared
/// width. Types with no sensible cast rule (`Blob`, `Custom`) fall back to
/// `Text`, matching MySQL's behavior of stringifying unrecognized cast
/// targets rather than rejecting them.
#[must_use]
pub fn data_type_to_cast_target(data_type: &DataType) -> CastTarget {
    match data_type {
        DataType::Tinyint | DataType::Smallint | DataType::Integer => CastTarget::Integer,
        DataType::Bigint => CastTarget::BigInt,
        DataType::Float => CastTarget::Float,
        DataType::Double => CastTarget::Double,
        DataType::Decimal { .. } => CastTarget::Decimal,
        DataType::Boolean => CastTarget::Boolean,
        DataType::Char(_) => CastTarget::Char,
        DataType::Varchar(_) | DataType::Text | DataType::Blob | DataType::Custom(_) => CastTarget::Text,
        DataType::Date => CastTarget::Date,
        DataType::Time => CastTarget::Time,
        DataType::Datetime => CastTarget::DateTime,
        DataType::Timestamp => CastTarget::Timestamp,
        DataType::Json => CastTarget::Json,
    }
}

/// Casts a value to the runtime default for `data_type`, used to fill in
/// `DECLARE`d local variables and default-value columns with no explicit
/// initializer.
#[must_use]
pub fn default_for_column_type(column_type: &ColumnType) -> Value {
    column_type.null_value()
}

/// Coerces `value` loosely toward `target`'s "natural" representation for
/// the handful of cases the rest of the driver needs outside the
/// evaluator's own `CAST` handling (e.g. normalizing an auto-increment
/// fill to `BigInt`). This is intentionally narrow — full cast semantics
/// live in the evaluator's compiled `Cast` node.
#[must_use]
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Decimal(d) => Some(*d),
        Value::Int(i) => Some(Decimal::new(i128::from(*i), 0)),
        Value::BigInt(i) => Some(Decimal::new(i128::from(*i), 0)),
        Value::Double(f) => Some(Decimal::from_f64(*f, 6)),
        Value::Float(f) => Some(Decimal::from_f64(f64::from(*f), 6)),
        _ => None,
    }
}
