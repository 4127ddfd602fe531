//! Permissive numeric coercion.
//!
//! Payroll inputs come from hand-edited forms, so numeric fields are
//! read the same way the host UI reads them: a value that is missing,
//! `null`, not a number, or an unparsable string collapses to zero.
//! These helpers are used through `#[serde(deserialize_with = ...)]`
//! so the engine itself only ever sees plain `f64` values.
//!
//! Strings are parsed the way the host UI parses them, including the
//! `0x`, `0o` and `0b` prefixes, and a one-element array reads as its
//! element.  The one deliberate difference is that `Infinity`, overflow
//! and every other non-finite result read as `0` rather than passing
//! through.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce an arbitrary JSON value into a finite number.
///
/// Numbers pass through, numeric strings are parsed after trimming,
/// `true` is `1`, a one-element array is coerced through its element,
/// and everything else is `0`.  Non-finite results are also mapped to
/// `0`.
pub fn coerce(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_number(s),
        Value::Bool(true) => 1.0,
        Value::Array(items) => match items.as_slice() {
            // An array is read through its string form, where a
            // boolean element is not numeric.
            [Value::Bool(_)] => 0.0,
            [item] => coerce(item),
            _ => 0.0,
        },
        _ => 0.0,
    };
    finite_or_zero(n)
}

fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0o" | "0O") => 8,
        Some("0b" | "0B") => 2,
        _ => return trimmed.parse::<f64>().unwrap_or(0.0),
    };
    parse_radix(&trimmed[2..], radix).unwrap_or(0.0)
}

/// Unsigned digits in the given radix; `None` if empty or malformed.
fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0, |acc: f64, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    })
}

/// Map NaN and infinities to `0`.
pub fn finite_or_zero(n: f64) -> f64 {
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Treat zero as "not set", mirroring the truthiness checks applied to
/// optional clamps and rate overrides.
pub fn non_zero(value: Option<f64>) -> Option<f64> {
    value.map(finite_or_zero).filter(|v| *v != 0.0)
}

/// Clamp negative quantities (hours, days) to zero.
pub fn non_negative(n: f64) -> f64 {
    finite_or_zero(n).max(0.0)
}

/// Deserialize any JSON value as a number, defaulting to `0`.
///
/// Combine with `#[serde(default)]` so that missing fields also read
/// as zero.
pub fn lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(coerce).unwrap_or(0.0))
}

/// Deserialize an optional number.  `null` reads as `None`; any other
/// value is coerced with [`coerce`].
pub fn lenient_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(coerce(&v)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(12.5), 12.5)]
    #[case(json!("  7 "), 7.0)]
    #[case(json!(""), 0.0)]
    #[case(json!("abc"), 0.0)]
    #[case(json!(null), 0.0)]
    #[case(json!(false), 0.0)]
    #[case(json!(true), 1.0)]
    #[case(json!([1, 2]), 0.0)]
    #[case(json!("NaN"), 0.0)]
    #[case(json!("Infinity"), 0.0)]
    #[case(json!("0x10"), 16.0)]
    #[case(json!("0XfF"), 255.0)]
    #[case(json!("0o17"), 15.0)]
    #[case(json!("0b101"), 5.0)]
    #[case(json!("0x"), 0.0)]
    #[case(json!("0xg1"), 0.0)]
    #[case(json!("-0x10"), 0.0)]
    #[case(json!([5]), 5.0)]
    #[case(json!([" 7 "]), 7.0)]
    #[case(json!([[3]]), 3.0)]
    #[case(json!([]), 0.0)]
    #[case(json!([null]), 0.0)]
    #[case(json!([true]), 0.0)]
    fn test_coerce(#[case] input: Value, #[case] expected: f64) {
        assert_eq!(coerce(&input), expected);
    }

    #[derive(Deserialize)]
    struct FormFields {
        #[serde(default, deserialize_with = "lenient")]
        amount: f64,
        #[serde(default, deserialize_with = "lenient_opt")]
        cap: Option<f64>,
    }

    #[test]
    fn test_missing_and_null_fields_read_as_zero() {
        let fields: FormFields = serde_json::from_value(json!({})).unwrap();
        assert_eq!(fields.amount, 0.0);
        assert_eq!(fields.cap, None);

        let fields: FormFields = serde_json::from_value(json!({"amount": null, "cap": null})).unwrap();
        assert_eq!(fields.amount, 0.0);
        assert_eq!(fields.cap, None);

        let fields: FormFields = serde_json::from_value(json!({"amount": "1500", "cap": "x"})).unwrap();
        assert_eq!(fields.amount, 1500.0);
        assert_eq!(fields.cap, Some(0.0));
    }

    #[test]
    fn test_non_zero_and_non_negative() {
        assert_eq!(non_zero(Some(0.0)), None);
        assert_eq!(non_zero(Some(f64::NAN)), None);
        assert_eq!(non_zero(Some(-5.0)), Some(-5.0));
        assert_eq!(non_zero(None), None);
        assert_eq!(non_negative(-3.0), 0.0);
        assert_eq!(non_negative(4.0), 4.0);
    }
}
