//! Fixed-point decimal arithmetic for `Value::Decimal`.
//!
//! The workspace has no existing decimal dependency to inherit (the teacher
//! never needed one), so exact decimal values and running sums are
//! represented as `mantissa * 10^-scale` over an `i128`, wide enough for
//! MySQL's `DECIMAL(65, 30)` ceiling in practice.

use std::cmp::Ordering;
use std::fmt;

use crate::Error;

/// A fixed-point decimal number: `mantissa * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: i128,
    scale: u8,
}

impl Decimal {
    /// Builds a decimal directly from its scaled representation.
    #[must_use]
    pub const fn new(mantissa: i128, scale: u8) -> Self {
        Self { mantissa, scale }
    }

    /// The additive identity.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// The underlying scaled integer.
    #[must_use]
    pub const fn mantissa(&self) -> i128 {
        self.mantissa
    }

    /// Number of digits after the decimal point.
    #[must_use]
    pub const fn scale(&self) -> u8 {
        self.scale
    }

    /// Parses a decimal literal such as `"-12.340"`.
    pub fn parse(s: &str) -> std::result::Result<Self, Error> {
        let s = s.trim();
        let (sign, s) = match s.strip_prefix('-') {
            Some(rest) => (-1i128, rest),
            None => (1i128, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        let scale = u8::try_from(frac_part.len())
            .map_err(|_| Error::Overflow(format!("decimal literal '{s}' has too many fractional digits")))?;
        let digits: String = format!("{int_part}{frac_part}");
        let digits = if digits.is_empty() { "0" } else { &digits };
        let mantissa: i128 = digits
            .parse()
            .map_err(|_| Error::InvalidCast(format!("'{s}' is not a valid decimal literal")))?;
        Ok(Self::new(sign * mantissa, scale))
    }

    fn rescaled_to(&self, scale: u8) -> std::result::Result<i128, Error> {
        match scale.cmp(&self.scale) {
            Ordering::Equal => Ok(self.mantissa),
            Ordering::Greater => {
                let factor = 10i128
                    .checked_pow(u32::from(scale - self.scale))
                    .ok_or_else(|| Error::Overflow("decimal rescale overflow".into()))?;
                self.mantissa
                    .checked_mul(factor)
                    .ok_or_else(|| Error::Overflow("decimal rescale overflow".into()))
            }
            Ordering::Less => {
                let factor = 10i128.pow(u32::from(self.scale - scale));
                Ok(self.mantissa / factor)
            }
        }
    }

    /// Checked addition; common scale is the wider of the two operands.
    pub fn checked_add(&self, other: &Self) -> std::result::Result<Self, Error> {
        let scale = self.scale.max(other.scale);
        let a = self.rescaled_to(scale)?;
        let b = other.rescaled_to(scale)?;
        let m = a
            .checked_add(b)
            .ok_or_else(|| Error::Overflow("decimal addition overflow".into()))?;
        Ok(Self::new(m, scale))
    }

    /// Checked subtraction; common scale is the wider of the two operands.
    pub fn checked_sub(&self, other: &Self) -> std::result::Result<Self, Error> {
        let scale = self.scale.max(other.scale);
        let a = self.rescaled_to(scale)?;
        let b = other.rescaled_to(scale)?;
        let m = a
            .checked_sub(b)
            .ok_or_else(|| Error::Overflow("decimal subtraction overflow".into()))?;
        Ok(Self::new(m, scale))
    }

    /// Checked multiplication; result scale is the sum of operand scales.
    pub fn checked_mul(&self, other: &Self) -> std::result::Result<Self, Error> {
        let scale = self
            .scale
            .checked_add(other.scale)
            .ok_or_else(|| Error::Overflow("decimal multiplication overflow".into()))?;
        let m = self
            .mantissa
            .checked_mul(other.mantissa)
            .ok_or_else(|| Error::Overflow("decimal multiplication overflow".into()))?;
        Ok(Self::new(m, scale))
    }

    /// Checked division; widens the result scale to at least 6 digits past
    /// the wider operand scale, matching MySQL's `DIV_PRECISION_INCREMENT`
    /// default of 4 (rounded up for headroom).
    pub fn checked_div(&self, other: &Self) -> std::result::Result<Self, Error> {
        if other.mantissa == 0 {
            return Err(Error::Overflow("division by zero".into()));
        }
        let result_scale = self.scale.max(other.scale).saturating_add(6);
        let shift = u32::from(result_scale.saturating_sub(self.scale)) + u32::from(other.scale);
        let factor = 10i128
            .checked_pow(shift)
            .ok_or_else(|| Error::Overflow("decimal division overflow".into()))?;
        let numerator = self
            .mantissa
            .checked_mul(factor)
            .ok_or_else(|| Error::Overflow("decimal division overflow".into()))?;
        Ok(Self::new(numerator / other.mantissa, result_scale))
    }

    /// Lossy conversion to `f64`, used by functions with no exact-decimal
    /// requirement (e.g. `SQRT`).
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(i32::from(self.scale))
    }

    /// Builds a decimal from a lossy `f64` source (e.g. a `CAST(... AS
    /// DECIMAL)` of a `DOUBLE`), rounding to `scale` fractional digits.
    #[must_use]
    pub fn from_f64(value: f64, scale: u8) -> Self {
        let factor = 10f64.powi(i32::from(scale));
        Self::new((value * factor).round() as i128, scale)
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        let a = self.rescaled_to(scale).unwrap_or(self.mantissa);
        let b = other.rescaled_to(scale).unwrap_or(other.mantissa);
        a.cmp(&b)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let negative = self.mantissa < 0;
        let abs = self.mantissa.unsigned_abs();
        let digits = abs.to_string();
        let scale = self.scale as usize;
        let padded = if digits.len() <= scale {
            format!("{:0>width$}", digits, width = scale + 1)
        } else {
            digits
        };
        let split = padded.len() - scale;
        let (int_part, frac_part) = padded.split_at(split);
        if negative {
            write!(f, "-")?;
        }
        write!(f, "{int_part}.{frac_part}")
    }
}
