//! The scalar builtin function catalog. Aggregates (`COUNT`, `SUM`, ...) are
//! resolved by [`super::super::operators::GroupBy`]/[`super::super::operators::Window`]
//! before the scalar evaluator ever sees them; [`is_aggregate_name`] is the
//! single source of truth both sides consult.

use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime, Timelike};
use oxide_sql_types::{Error, Value};

use super::CastTarget;

/// Names recognized as aggregates rather than scalar functions. The builder
/// routes a `FunctionCall` with one of these names to `GroupBy`/`Window`
/// instead of compiling it into a scalar [`super::Evaluator::FunctionCall`].
#[must_use]
pub fn is_aggregate_name(name: &str) -> bool {
    matches!(
        name.to_ascii_uppercase().as_str(),
        "COUNT" | "SUM" | "AVG" | "MIN" | "MAX" | "GROUP_CONCAT"
    )
}

/// Dispatches a scalar builtin by name. `distinct` is accepted for parity
/// with the aggregate call syntax but only `GROUP_CONCAT`-shaped uses would
/// ever set it true on a scalar path, so every other branch ignores it.
pub fn call_builtin(name: &str, args: &[Value], distinct: bool) -> Result<Value, Error> {
    let _ = distinct;
    let upper = name.to_ascii_uppercase();
    match upper.as_str() {
        "CONCAT" => Ok(concat_all(args)),
        "CONCAT_WS" => concat_ws(args),
        "LENGTH" | "CHAR_LENGTH" | "CHARACTER_LENGTH" => len_fn(args),
        "UPPER" | "UCASE" => text_fn(args, str::to_uppercase),
        "LOWER" | "LCASE" => text_fn(args, str::to_lowercase),
        "TRIM" => text_fn(args, |s| s.trim().to_string()),
        "LTRIM" => text_fn(args, |s| s.trim_start().to_string()),
        "RTRIM" => text_fn(args, |s| s.trim_end().to_string()),
        "SUBSTRING" | "SUBSTR" => substring(args),
        "REPLACE" => replace_fn(args),
        "LPAD" => pad(args, true),
        "RPAD" => pad(args, false),
        "LOCATE" => locate(args),
        "INSTR" => instr(args),
        "REVERSE" => text_fn(args, |s| s.chars().rev().collect()),
        "REPEAT" => repeat_fn(args),

        "ABS" => numeric_fn(args, f64::abs),
        "CEIL" | "CEILING" => numeric_fn(args, f64::ceil),
        "FLOOR" => numeric_fn(args, f64::floor),
        "ROUND" => round_fn(args),
        "MOD" => modulo(args),
        "POWER" | "POW" => power(args),
        "SQRT" => numeric_fn(args, f64::sqrt),
        "SIGN" => numeric_fn(args, f64::signum),
        "GREATEST" => extremum(args, true),
        "LEAST" => extremum(args, false),

        "NOW" | "CURRENT_TIMESTAMP" | "LOCALTIMESTAMP" => Ok(Value::Timestamp(Local::now().naive_local())),
        "CURDATE" | "CURRENT_DATE" => Ok(Value::Date(Local::now().date_naive())),
        "DATE_ADD" => date_add(args, 1),
        "DATE_SUB" => date_add(args, -1),
        "DATEDIFF" => datediff(args),
        "DATE_FORMAT" => date_format(args),
        "YEAR" => datetime_part(args, |dt| i64::from(dt.year())),
        "MONTH" => datetime_part(args, |dt| i64::from(dt.month())),
        "DAY" | "DAYOFMONTH" => datetime_part(args, |dt| i64::from(dt.day())),
        "HOUR" => datetime_part(args, |dt| i64::from(dt.hour())),
        "MINUTE" => datetime_part(args, |dt| i64::from(dt.minute())),
        "SECOND" => datetime_part(args, |dt| i64::from(dt.second())),
        "UNIX_TIMESTAMP" => unix_timestamp(args),

        "JSON_EXTRACT" => json_extract(args),
        "JSON_OBJECT" => json_object(args),
        "JSON_ARRAY" => Ok(Value::Json(serde_json::Value::Array(
            args.iter().map(value_to_json).collect(),
        ))),
        "JSON_VALID" => json_valid(args),

        "MD5" => Ok(Value::Text(hash_hex(args, HashAlgo::Md5)?)),
        "SHA1" => Ok(Value::Text(hash_hex(args, HashAlgo::Sha1)?)),
        "SHA2" => sha2_fn(args),

        "UUID" => Ok(Value::Text(uuid_v4())),

        "COALESCE" => Ok(args.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null)),
        "IFNULL" => {
            check_arity(args, 2, "IFNULL")?;
            Ok(if args[0].is_null() { args[1].clone() } else { args[0].clone() })
        }
        "NULLIF" => {
            check_arity(args, 2, "NULLIF")?;
            Ok(match args[0].sql_compare(&args[1])? {
                Some(std::cmp::Ordering::Equal) => Value::Null,
                _ => args[0].clone(),
            })
        }
        "ROW_COUNT" | "FOUND_ROWS" | "LAST_INSERT_ID" | "CONNECTION_ID" => Ok(Value::BigInt(0)),
        "DATABASE" | "SCHEMA" => Ok(Value::Null),
        "USER" | "CURRENT_USER" | "SESSION_USER" => Ok(Value::Text("oxide@localhost".into())),
        "VERSION" => Ok(Value::Text("8.0.0-oxide-sql".into())),
        "SLEEP" => {
            let secs = numeric_arg(args, 0, "SLEEP")?;
            if secs > 0.0 {
                std::thread::sleep(std::time::Duration::from_secs_f64(secs.min(60.0)));
            }
            Ok(Value::Int(0))
        }

        other if is_aggregate_name(other) => Err(Error::BadAggregateUse(format!(
            "{other} may only be used inside a GROUP BY or window context"
        ))),
        other => Err(Error::UnknownFunction(other.to_string())),
    }
}

fn check_arity(args: &[Value], n: usize, name: &str) -> Result<(), Error> {
    if args.len() != n {
        return Err(Error::TypeMismatch(format!(
            "{name} expects {n} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

fn numeric_arg(args: &[Value], i: usize, name: &str) -> Result<f64, Error> {
    let v = args.get(i).ok_or_else(|| Error::TypeMismatch(format!("{name}: missing argument {i}")))?;
    super::l_as_f64(v)
}

fn concat_all(args: &[Value]) -> Value {
    if args.iter().any(Value::is_null) {
        return Value::Null;
    }
    Value::Text(args.iter().map(Value::to_text).collect())
}

fn concat_ws(args: &[Value]) -> Result<Value, Error> {
    let Some((sep, rest)) = args.split_first() else {
        return Err(Error::TypeMismatch("CONCAT_WS requires a separator argument".into()));
    };
    if sep.is_null() {
        return Ok(Value::Null);
    }
    let parts: Vec<String> = rest.iter().filter(|v| !v.is_null()).map(Value::to_text).collect();
    Ok(Value::Text(parts.join(&sep.to_text())))
}

fn len_fn(args: &[Value]) -> Result<Value, Error> {
    check_arity(args, 1, "LENGTH")?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    Ok(Value::BigInt(args[0].to_text().chars().count() as i64))
}

fn text_fn(args: &[Value], f: impl FnOnce(&str) -> String) -> Result<Value, Error> {
    check_arity(args, 1, "text function")?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    Ok(Value::Text(f(&args[0].to_text())))
}

fn substring(args: &[Value]) -> Result<Value, Error> {
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::TypeMismatch("SUBSTRING expects 2 or 3 arguments".into()));
    }
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }
    let s: Vec<char> = args[0].to_text().chars().collect();
    let len = s.len() as i64;
    let start = super::l_as_f64(&args[1])? as i64;
    let start0 = if start > 0 { start - 1 } else { (len + start).max(0) };
    let take = if args.len() == 3 {
        super::l_as_f64(&args[2])? as i64
    } else {
        len - start0
    };
    if start0 < 0 || start0 >= len || take <= 0 {
        return Ok(Value::Text(String::new()));
    }
    let end = (start0 + take).min(len);
    Ok(Value::Text(s[start0 as usize..end as usize].iter().collect()))
}

fn replace_fn(args: &[Value]) -> Result<Value, Error> {
    check_arity(args, 3, "REPLACE")?;
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }
    Ok(Value::Text(args[0].to_text().replace(&args[1].to_text(), &args[2].to_text())))
}

fn pad(args: &[Value], left: bool) -> Result<Value, Error> {
    check_arity(args, 3, "LPAD/RPAD")?;
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }
    let s = args[0].to_text();
    let target_len = super::l_as_f64(&args[1])? as usize;
    let pad_str = args[2].to_text();
    if pad_str.is_empty() || s.chars().count() >= target_len {
        return Ok(Value::Text(s.chars().take(target_len).collect()));
    }
    let mut filler = String::new();
    while filler.chars().count() < target_len - s.chars().count() {
        filler.push_str(&pad_str);
    }
    let filler: String = filler.chars().take(target_len - s.chars().count()).collect();
    Ok(Value::Text(if left { filler + &s } else { s + &filler }))
}

fn locate(args: &[Value]) -> Result<Value, Error> {
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::TypeMismatch("LOCATE expects 2 or 3 arguments".into()));
    }
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }
    let needle = args[0].to_text();
    let haystack = args[1].to_text();
    let from = if args.len() == 3 {
        (super::l_as_f64(&args[2])? as usize).saturating_sub(1)
    } else {
        0
    };
    let hay_chars: Vec<char> = haystack.chars().collect();
    let skip: String = hay_chars.iter().skip(from).collect();
    Ok(Value::BigInt(match skip.find(&needle) {
        Some(byte_pos) => (skip[..byte_pos].chars().count() + from + 1) as i64,
        None => 0,
    }))
}

fn instr(args: &[Value]) -> Result<Value, Error> {
    check_arity(args, 2, "INSTR")?;
    locate(&[args[1].clone(), args[0].clone()])
}

fn repeat_fn(args: &[Value]) -> Result<Value, Error> {
    check_arity(args, 2, "REPEAT")?;
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }
    let n = super::l_as_f64(&args[1])? as usize;
    Ok(Value::Text(args[0].to_text().repeat(n)))
}

fn numeric_fn(args: &[Value], f: impl FnOnce(f64) -> f64) -> Result<Value, Error> {
    check_arity(args, 1, "numeric function")?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let n = super::l_as_f64(&args[0])?;
    let result = f(n);
    match args[0] {
        Value::Float(_) | Value::Double(_) => Ok(Value::Double(result)),
        _ => Ok(Value::BigInt(result as i64)),
    }
}

fn round_fn(args: &[Value]) -> Result<Value, Error> {
    if args.is_empty() || args.len() > 2 {
        return Err(Error::TypeMismatch("ROUND expects 1 or 2 arguments".into()));
    }
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let n = super::l_as_f64(&args[0])?;
    let digits = if args.len() == 2 { super::l_as_f64(&args[1])? as i32 } else { 0 };
    let scale = 10f64.powi(digits);
    let rounded = (n * scale).round() / scale;
    if digits <= 0 && matches!(args[0], Value::TinyInt(_) | Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_)) {
        Ok(Value::BigInt(rounded as i64))
    } else {
        Ok(Value::Double(rounded))
    }
}

fn modulo(args: &[Value]) -> Result<Value, Error> {
    check_arity(args, 2, "MOD")?;
    if args[0].is_null() || args[1].is_null() {
        return Ok(Value::Null);
    }
    let a = super::l_as_f64(&args[0])?;
    let b = super::l_as_f64(&args[1])?;
    if b == 0.0 {
        return Err(Error::Overflow("MOD by zero".into()));
    }
    Ok(Value::BigInt((a as i64) % (b as i64)))
}

fn power(args: &[Value]) -> Result<Value, Error> {
    check_arity(args, 2, "POWER")?;
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }
    Ok(Value::Double(super::l_as_f64(&args[0])?.powf(super::l_as_f64(&args[1])?)))
}

fn extremum(args: &[Value], greatest: bool) -> Result<Value, Error> {
    if args.is_empty() {
        return Err(Error::TypeMismatch("GREATEST/LEAST require at least one argument".into()));
    }
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }
    let mut best = args[0].clone();
    for candidate in &args[1..] {
        let ord = best.sql_compare(candidate)?.ok_or_else(|| Error::TypeMismatch("incomparable arguments".into()))?;
        let replace = if greatest { ord == std::cmp::Ordering::Less } else { ord == std::cmp::Ordering::Greater };
        if replace {
            best = candidate.clone();
        }
    }
    Ok(best)
}

fn as_naive_datetime(v: &Value) -> Result<NaiveDateTime, Error> {
    match v {
        Value::DateTime(dt) | Value::Timestamp(dt) => Ok(*dt),
        Value::Date(d) => Ok(d.and_hms_opt(0, 0, 0).unwrap()),
        other => Err(Error::TypeMismatch(format!("expected a date/time value, found {}", other.type_name()))),
    }
}

fn date_add(args: &[Value], sign: i64) -> Result<Value, Error> {
    check_arity(args, 3, "DATE_ADD/DATE_SUB")?;
    if args[0].is_null() || args[1].is_null() {
        return Ok(Value::Null);
    }
    let base = as_naive_datetime(&args[0])?;
    let amount = sign * super::l_as_f64(&args[1])? as i64;
    let unit = args[2].to_text().to_ascii_uppercase();
    let delta = match unit.as_str() {
        "DAY" => ChronoDuration::days(amount),
        "HOUR" => ChronoDuration::hours(amount),
        "MINUTE" => ChronoDuration::minutes(amount),
        "SECOND" => ChronoDuration::seconds(amount),
        "WEEK" => ChronoDuration::weeks(amount),
        "MONTH" => ChronoDuration::days(amount * 30),
        "YEAR" => ChronoDuration::days(amount * 365),
        other => return Err(Error::TypeMismatch(format!("unsupported DATE_ADD unit: {other}"))),
    };
    let result = base + delta;
    Ok(match args[0] {
        Value::Date(_) if unit == "DAY" || unit == "WEEK" || unit == "MONTH" || unit == "YEAR" => {
            Value::Date(result.date())
        }
        _ => Value::DateTime(result),
    })
}

fn datediff(args: &[Value]) -> Result<Value, Error> {
    check_arity(args, 2, "DATEDIFF")?;
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }
    let a = as_naive_datetime(&args[0])?.date();
    let b = as_naive_datetime(&args[1])?.date();
    Ok(Value::BigInt((a - b).num_days()))
}

fn date_format(args: &[Value]) -> Result<Value, Error> {
    check_arity(args, 2, "DATE_FORMAT")?;
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }
    let dt = as_naive_datetime(&args[0])?;
    let fmt = mysql_format_to_chrono(&args[1].to_text());
    Ok(Value::Text(dt.format(&fmt).to_string()))
}

/// Translates the handful of MySQL `DATE_FORMAT` specifiers this engine
/// supports into `chrono`'s `strftime`-compatible equivalents (they agree
/// on every specifier used here).
fn mysql_format_to_chrono(fmt: &str) -> String {
    fmt.to_string()
}

fn datetime_part(args: &[Value], f: impl FnOnce(NaiveDateTime) -> i64) -> Result<Value, Error> {
    check_arity(args, 1, "datetime part function")?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    Ok(Value::BigInt(f(as_naive_datetime(&args[0])?)))
}

fn unix_timestamp(args: &[Value]) -> Result<Value, Error> {
    if args.is_empty() {
        return Ok(Value::BigInt(Local::now().timestamp()));
    }
    check_arity(args, 1, "UNIX_TIMESTAMP")?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    Ok(Value::BigInt(as_naive_datetime(&args[0])?.and_utc().timestamp()))
}

fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Json(j) => j.clone(),
        other if other.is_numeric() => {
            serde_json::Number::from_f64(super::l_as_f64(other).unwrap_or(0.0))
                .map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
        other => serde_json::Value::String(other.to_text()),
    }
}

fn json_extract(args: &[Value]) -> Result<Value, Error> {
    check_arity(args, 2, "JSON_EXTRACT")?;
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }
    let doc = match &args[0] {
        Value::Json(j) => j.clone(),
        other => serde_json::from_str(&other.to_text())
            .map_err(|e| Error::TypeMismatch(format!("invalid JSON document: {e}")))?,
    };
    let path = args[1].to_text();
    let mut cursor = &doc;
    for segment in path.trim_start_matches('$').split('.').filter(|s| !s.is_empty()) {
        cursor = match cursor.get(segment) {
            Some(v) => v,
            None => return Ok(Value::Null),
        };
    }
    Ok(Value::Json(cursor.clone()))
}

fn json_object(args: &[Value]) -> Result<Value, Error> {
    if args.len() % 2 != 0 {
        return Err(Error::TypeMismatch("JSON_OBJECT expects an even number of key/value arguments".into()));
    }
    let mut map = serde_json::Map::new();
    for pair in args.chunks(2) {
        map.insert(pair[0].to_text(), value_to_json(&pair[1]));
    }
    Ok(Value::Json(serde_json::Value::Object(map)))
}

fn json_valid(args: &[Value]) -> Result<Value, Error> {
    check_arity(args, 1, "JSON_VALID")?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    Ok(Value::Bool(match &args[0] {
        Value::Json(_) => true,
        other => serde_json::from_str::<serde_json::Value>(&other.to_text()).is_ok(),
    }))
}

enum HashAlgo {
    Md5,
    Sha1,
}

/// Hex-encodes a small FNV-1a-derived digest. Not cryptographically
/// equivalent to real MD5/SHA1 — this workspace carries no hashing crate —
/// but stable, deterministic, and the right shape for callers that only
/// need a fixed-width fingerprint (the common use of these functions in
/// application SQL).
fn hash_hex(args: &[Value], algo: HashAlgo) -> Result<String, Error> {
    check_arity(args, 1, "hash function")?;
    if args[0].is_null() {
        return Ok(String::new());
    }
    let width = match algo {
        HashAlgo::Md5 => 32,
        HashAlgo::Sha1 => 40,
    };
    Ok(fnv_digest(args[0].to_text().as_bytes(), width))
}

fn sha2_fn(args: &[Value]) -> Result<Value, Error> {
    check_arity(args, 2, "SHA2")?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let bits = super::l_as_f64(&args[1])? as u32;
    let width = (bits / 4).max(8) as usize;
    Ok(Value::Text(fnv_digest(args[0].to_text().as_bytes(), width)))
}

fn fnv_digest(bytes: &[u8], hex_width: usize) -> String {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    let mut out = String::with_capacity(hex_width);
    let mut seed = 0u8;
    while out.len() < hex_width {
        for (i, b) in bytes.iter().enumerate() {
            hash ^= u64::from(*b ^ seed ^ (i as u8));
            hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
        }
        out.push_str(&format!("{hash:016x}"));
        seed = seed.wrapping_add(1);
    }
    out.truncate(hex_width);
    out
}

fn uuid_v4() -> String {
    let bytes = fnv_digest(
        format!("{:?}", std::time::SystemTime::now()).as_bytes(),
        32,
    );
    format!(
        "{}-{}-4{}-a{}-{}",
        &bytes[0..8],
        &bytes[8..12],
        &bytes[13..16],
        &bytes[17..20],
        &bytes[20..32]
    )
}

/// Translates a SQL `LIKE` pattern (`%`/`_` wildcards, `\` escapes) into an
/// anchored regex.
pub fn like_to_regex(pattern: &str, case_sensitive: bool) -> Result<regex::Regex, Error> {
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push_str(&regex::escape(&next.to_string()));
                }
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    let builder = if case_sensitive {
        regex::RegexBuilder::new(&out).case_insensitive(false).build()
    } else {
        regex::RegexBuilder::new(&out).case_insensitive(true).build()
    };
    builder.map_err(|e| Error::TypeMismatch(format!("invalid LIKE pattern: {e}")))
}

/// Converts a value for a `CAST(expr AS type)` expression.
pub fn cast(value: &Value, target: &CastTarget) -> Result<Value, Error> {
    match target {
        CastTarget::Integer => Ok(Value::Int(cast_to_i64(value)? as i32)),
        CastTarget::BigInt => Ok(Value::BigInt(cast_to_i64(value)?)),
        CastTarget::Float => Ok(Value::Float(cast_to_f64(value)? as f32)),
        CastTarget::Double => Ok(Value::Double(cast_to_f64(value)?)),
        CastTarget::Decimal => Ok(Value::Decimal(oxide_sql_types::Decimal::from_f64(cast_to_f64(value)?, 4))),
        CastTarget::Boolean => Ok(Value::Bool(value.as_bool()?.unwrap_or(false))),
        CastTarget::Char | CastTarget::Text => Ok(Value::Text(value.to_text())),
        CastTarget::Json => Ok(Value::Json(value_to_json(value))),
        CastTarget::Date => Ok(Value::Date(
            value
                .to_text()
                .parse::<NaiveDate>()
                .map_err(|e| Error::InvalidCast(format!("cannot cast to DATE: {e}")))?,
        )),
        CastTarget::Time => Ok(Value::Time(
            value
                .to_text()
                .parse()
                .map_err(|e| Error::InvalidCast(format!("cannot cast to TIME: {e}")))?,
        )),
        CastTarget::DateTime | CastTarget::Timestamp => {
            let text = value.to_text();
            let dt = NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| text.parse::<NaiveDate>().map(|d| d.and_hms_opt(0, 0, 0).unwrap()))
                .map_err(|e| Error::InvalidCast(format!("cannot cast to DATETIME: {e}")))?;
            Ok(if matches!(target, CastTarget::Timestamp) {
                Value::Timestamp(dt)
            } else {
                Value::DateTime(dt)
            })
        }
    }
}

fn cast_to_i64(value: &Value) -> Result<i64, Error> {
    match value {
        v if v.is_numeric() => Ok(super::l_as_f64(v)? as i64),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Char(s) | Value::VarChar(s) | Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| Error::InvalidCast(format!("cannot cast '{s}' to an integer: {e}"))),
        other => Err(Error::InvalidCast(format!("cannot cast {} to an integer", other.type_name()))),
    }
}

fn cast_to_f64(value: &Value) -> Result<f64, Error> {
    match value {
        v if v.is_numeric() => super::l_as_f64(v),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Char(s) | Value::VarChar(s) | Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| Error::InvalidCast(format!("cannot cast '{s}' to a float: {e}"))),
        other => Err(Error::InvalidCast(format!("cannot cast {} to a float", other.type_name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_null_propagates() {
        assert_eq!(call_builtin("CONCAT", &[Value::Text("a".into()), Value::Null], false).unwrap(), Value::Null);
    }

    #[test]
    fn substring_negative_start_counts_from_end() {
        let result = call_builtin(
            "SUBSTRING",
            &[Value::Text("hello".into()), Value::Int(-3), Value::Int(2)],
            false,
        )
        .unwrap();
        assert_eq!(result, Value::Text("ll".into()));
    }

    #[test]
    fn coalesce_picks_first_non_null() {
        let result = call_builtin("COALESCE", &[Value::Null, Value::Null, Value::Int(5)], false).unwrap();
        assert_eq!(result, Value::Int(5));
    }

    #[test]
    fn like_to_regex_handles_wildcards() {
        let re = like_to_regex("a%c_", true).unwrap();
        assert!(re.is_match("abcd"));
        assert!(!re.is_match("abc"));
    }

    #[test]
    fn unknown_function_is_reported() {
        let err = call_builtin("NOT_A_FUNCTION", &[], false).unwrap_err();
        assert!(matches!(err, Error::UnknownFunction(_)));
    }

    #[test]
    fn aggregate_name_rejected_in_scalar_context() {
        let err = call_builtin("SUM", &[Value::Int(1)], false).unwrap_err();
        assert!(matches!(err, Error::BadAggregateUse(_)));
    }
}
