//! The `Value` tagged union and its SQL-flavored comparison/arithmetic rules.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::decimal::Decimal;
use crate::Error;

/// A single SQL value, carrying its own type tag.
///
/// Conversions between variants are always explicit (via [`Value::cast_to`]
/// or arithmetic promotion), never implicit.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Bool(bool),
    Char(String),
    VarChar(String),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    /// Timestamp, distinct from `DateTime` in that it tracks a
    /// timezone-normalized instant (stored here as UTC wall-clock).
    Timestamp(NaiveDateTime),
    Json(serde_json::Value),
    Blob(Vec<u8>),
}

/// Rank used to pick the widest type when promoting a numeric pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum NumericRank {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Decimal,
    Float,
    Double,
}

impl Value {
    /// Human-readable type name, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::TinyInt(_) => "TINYINT",
            Self::SmallInt(_) => "SMALLINT",
            Self::Int(_) => "INT",
            Self::BigInt(_) => "BIGINT",
            Self::Float(_) => "FLOAT",
            Self::Double(_) => "DOUBLE",
            Self::Decimal(_) => "DECIMAL",
            Self::Bool(_) => "BOOLEAN",
            Self::Char(_) => "CHAR",
            Self::VarChar(_) => "VARCHAR",
            Self::Text(_) => "TEXT",
            Self::Date(_) => "DATE",
            Self::Time(_) => "TIME",
            Self::DateTime(_) => "DATETIME",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::Json(_) => "JSON",
            Self::Blob(_) => "BLOB",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn numeric_rank(&self) -> Option<NumericRank> {
        match self {
            Self::TinyInt(_) => Some(NumericRank::TinyInt),
            Self::SmallInt(_) => Some(NumericRank::SmallInt),
            Self::Int(_) => Some(NumericRank::Int),
            Self::BigInt(_) => Some(NumericRank::BigInt),
            Self::Decimal(_) => Some(NumericRank::Decimal),
            Self::Float(_) => Some(NumericRank::Float),
            Self::Double(_) => Some(NumericRank::Double),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::TinyInt(_)
                | Self::SmallInt(_)
                | Self::Int(_)
                | Self::BigInt(_)
                | Self::Decimal(_)
                | Self::Float(_)
                | Self::Double(_)
        )
    }

    fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::TinyInt(n) => Some(Decimal::new(i128::from(*n), 0)),
            Self::SmallInt(n) => Some(Decimal::new(i128::from(*n), 0)),
            Self::Int(n) => Some(Decimal::new(i128::from(*n), 0)),
            Self::BigInt(n) => Some(Decimal::new(i128::from(*n), 0)),
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::TinyInt(n) => Some(f64::from(*n)),
            Self::SmallInt(n) => Some(f64::from(*n)),
            Self::Int(n) => Some(f64::from(*n)),
            Self::BigInt(n) => Some(*n as f64),
            Self::Decimal(d) => Some(d.to_f64()),
            Self::Float(n) => Some(f64::from(*n)),
            Self::Double(n) => Some(*n),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::TinyInt(n) => Some(i64::from(*n)),
            Self::SmallInt(n) => Some(i64::from(*n)),
            Self::Int(n) => Some(i64::from(*n)),
            Self::BigInt(n) => Some(*n),
            _ => None,
        }
    }

    /// Promotes two numeric operands to their common representation per
    /// `{TinyInt < SmallInt < Int < BigInt < Decimal < Float < Double}`.
    fn promote(&self, other: &Self) -> Result<PromotedPair, Error> {
        let (Some(lr), Some(rr)) = (self.numeric_rank(), other.numeric_rank()) else {
            let bad = if self.numeric_rank().is_none() { self } else { other };
            return Err(Error::NonNumericOperand(format!(
                "expected a numeric value, found {}",
                bad.type_name()
            )));
        };
        let rank = lr.max(rr);
        Ok(match rank {
            NumericRank::Double | NumericRank::Float => {
                PromotedPair::Float(self.as_f64().unwrap(), other.as_f64().unwrap())
            }
            NumericRank::Decimal => {
                PromotedPair::Decimal(self.as_decimal().unwrap(), other.as_decimal().unwrap())
            }
            NumericRank::BigInt | NumericRank::Int | NumericRank::SmallInt | NumericRank::TinyInt => {
                PromotedPair::Int(self.as_i64().unwrap(), other.as_i64().unwrap())
            }
        })
    }

    /// `a + b`, with NULL propagation and overflow reported as an error.
    pub fn checked_add(&self, other: &Self) -> Result<Self, Error> {
        self.numeric_binop(
            other,
            i64::checked_add,
            Decimal::checked_add,
            |a, b| Some(a + b),
        )
    }

    /// `a - b`.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, Error> {
        self.numeric_binop(
            other,
            i64::checked_sub,
            Decimal::checked_sub,
            |a, b| Some(a - b),
        )
    }

    /// `a * b`.
    pub fn checked_mul(&self, other: &Self) -> Result<Self, Error> {
        self.numeric_binop(
            other,
            i64::checked_mul,
            Decimal::checked_mul,
            |a, b| Some(a * b),
        )
    }

    /// `a / b`.
    pub fn checked_div(&self, other: &Self) -> Result<Self, Error> {
        self.numeric_binop(
            other,
            |a, b| if b == 0 { None } else { a.checked_div(b) },
            Decimal::checked_div,
            |a, b| if b == 0.0 { None } else { Some(a / b) },
        )
    }

    fn numeric_binop(
        &self,
        other: &Self,
        int_op: impl FnOnce(i64, i64) -> Option<i64>,
        decimal_op: impl FnOnce(&Decimal, &Decimal) -> Result<Decimal, Error>,
        float_op: impl FnOnce(f64, f64) -> Option<f64>,
    ) -> Result<Self, Error> {
        if self.is_null() || other.is_null() {
            return Ok(Self::Null);
        }
        match self.promote(other)? {
            PromotedPair::Float(a, b) => float_op(a, b)
                .map(Self::Double)
                .ok_or_else(|| Error::Overflow("floating-point operation overflow".into())),
            PromotedPair::Decimal(a, b) => decimal_op(&a, &b).map(Self::Decimal),
            PromotedPair::Int(a, b) => int_op(a, b).map(Self::BigInt).ok_or_else(|| {
                Error::Overflow(format!("integer arithmetic overflow ({self} op {other})"))
            }),
        }
    }

    /// Three-valued comparison: `None` if either side is NULL (the SQL
    /// result is UNKNOWN), otherwise the ordering after numeric/text
    /// promotion.
    pub fn sql_compare(&self, other: &Self) -> Result<Option<Ordering>, Error> {
        if self.is_null() || other.is_null() {
            return Ok(None);
        }
        self.compare_non_null(other).map(Some)
    }

    fn compare_non_null(&self, other: &Self) -> Result<Ordering, Error> {
        if self.is_numeric() && other.is_numeric() {
            return Ok(match self.promote(other)? {
                PromotedPair::Float(a, b) => {
                    a.partial_cmp(&b).ok_or_else(|| Error::TypeMismatch("NaN comparison".into()))?
                }
                PromotedPair::Decimal(a, b) => a.cmp(&b),
                PromotedPair::Int(a, b) => a.cmp(&b),
            });
        }
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Ok(a.cmp(b)),
            (Self::Char(a) | Self::VarChar(a) | Self::Text(a), Self::Char(b) | Self::VarChar(b) | Self::Text(b)) => {
                Ok(a.cmp(b))
            }
            (Self::Date(a), Self::Date(b)) => Ok(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Ok(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Ok(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Ok(a.cmp(b)),
            (Self::Blob(a), Self::Blob(b)) => Ok(a.cmp(b)),
            _ => Err(Error::TypeMismatch(format!(
                "cannot compare {} with {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// Total order for `ORDER BY`: NULL sorts before every non-null value,
    /// equal NULLs are equal. Used only for sort keys, never for SQL
    /// equality semantics.
    #[must_use]
    pub fn order_cmp(&self, other: &Self) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.compare_non_null(other).unwrap_or(Ordering::Equal),
        }
    }

    /// Kleene AND.
    #[must_use]
    pub fn kleene_and(a: Option<bool>, b: Option<bool>) -> Option<bool> {
        match (a, b) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        }
    }

    /// Kleene OR.
    #[must_use]
    pub fn kleene_or(a: Option<bool>, b: Option<bool>) -> Option<bool> {
        match (a, b) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        }
    }

    /// Kleene NOT.
    #[must_use]
    pub const fn kleene_not(a: Option<bool>) -> Option<bool> {
        match a {
            Some(b) => Some(!b),
            None => None,
        }
    }

    /// Interprets the value as a three-valued boolean, for use as a
    /// `Filter` predicate result or a `WHERE`/`CHECK` condition.
    pub fn as_bool(&self) -> Result<Option<bool>, Error> {
        match self {
            Self::Null => Ok(None),
            Self::Bool(b) => Ok(Some(*b)),
            Self::TinyInt(_) | Self::SmallInt(_) | Self::Int(_) | Self::BigInt(_) | Self::Decimal(_) | Self::Float(_) | Self::Double(_) => {
                Ok(Some(self.as_f64().unwrap_or(0.0) != 0.0))
            }
            other => Err(Error::NonBooleanPredicate(format!(
                "expected a boolean-valued predicate, found {}",
                other.type_name()
            ))),
        }
    }

    /// A string form suitable for the canonical group-key / `LIKE` textual
    /// comparisons. Differs from `Display` only in that it never surfaces
    /// `NULL` text ambiguously with the string `"NULL"` (callers building
    /// group keys should additionally consult [`Value::is_null`]).
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::TinyInt(n) => n.to_string(),
            Self::SmallInt(n) => n.to_string(),
            Self::Int(n) => n.to_string(),
            Self::BigInt(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Double(n) => n.to_string(),
            Self::Decimal(d) => d.to_string(),
            Self::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Self::Char(s) | Self::VarChar(s) | Self::Text(s) => s.clone(),
            Self::Date(d) => d.to_string(),
            Self::Time(t) => t.to_string(),
            Self::DateTime(dt) | Self::Timestamp(dt) => dt.to_string(),
            Self::Json(j) => j.to_string(),
            Self::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }
}

enum PromotedPair {
    Float(f64, f64),
    Decimal(Decimal, Decimal),
    Int(i64, i64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            _ => write!(f, "{}", self.to_text()),
        }
    }
}

/// Builds the canonical group-key string for a tuple of values: textual
/// forms joined with a reserved delimiter, with a sentinel for NULL so two
/// tuples hash-collide iff they are value-equal (NULL = NULL here, unlike
/// `sql_compare`'s three-valued semantics — this is the GROUP BY contract,
/// not a comparison operator).
#[must_use]
pub fn canonical_group_key(values: &[Value]) -> String {
    const DELIM: char = '\u{1F}';
    const NULL_SENTINEL: &str = "\u{1}NULL\u{1}";
    let mut key = String::new();
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            key.push(DELIM);
        }
        if v.is_null() {
            key.push_str(NULL_SENTINEL);
        } else {
            key.push_str(v.type_name());
            key.push(DELIM);
            key.push_str(&v.to_text());
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_propagates_through_arithmetic() {
        assert_eq!(Value::Null.checked_add(&Value::Int(1)).unwrap(), Value::Null);
    }

    #[test]
    fn arithmetic_promotes_to_widest_type() {
        let sum = Value::Int(1).checked_add(&Value::Double(2.5)).unwrap();
        assert_eq!(sum, Value::Double(3.5));
    }

    #[test]
    fn sql_compare_is_three_valued() {
        assert_eq!(Value::Int(1).sql_compare(&Value::Null).unwrap(), None);
        assert_eq!(
            Value::Int(1).sql_compare(&Value::Int(2)).unwrap(),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn order_cmp_sorts_null_low() {
        assert_eq!(Value::Null.order_cmp(&Value::Int(0)), Ordering::Less);
        assert_eq!(Value::Int(0).order_cmp(&Value::Null), Ordering::Greater);
    }

    #[test]
    fn group_key_distinguishes_null_and_type() {
        let a = canonical_group_key(&[Value::Null, Value::Int(1)]);
        let b = canonical_group_key(&[Value::Null, Value::Int(1)]);
        let c = canonical_group_key(&[Value::Int(0), Value::Int(1)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn overflow_is_reported() {
        let max = Value::BigInt(i64::MAX);
        let err = max.checked_add(&Value::BigInt(1)).unwrap_err();
        assert!(matches!(err, Error::Overflow(_)));
    }
}
