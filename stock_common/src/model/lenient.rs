//! Numeric coercion for loosely-typed JSON.
//!
//! The provider sends prices as strings (`"150.50"`), clients may send numbers,
//! `null`, or nothing at all. Everything that is not a finite number becomes
//! `None` here, and `0` for fields that default.
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Extract a finite number from a JSON number or a numeric string.
pub fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Replace non-finite values with zero and fold `-0.0` into `0.0`.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value + 0.0 } else { 0.0 }
}

/// `deserialize_with` helper: number, numeric string, `null`, garbage → `f64` (0 on failure).
pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value).unwrap_or(0.0))
}

/// `deserialize_with` helper: number, numeric string → `Some`, anything else → `None`.
pub fn optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// `deserialize_with` helper: string fields that may arrive as `null`.
pub fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings_are_accepted() {
        assert_eq!(number_from_value(&json!(1.5)), Some(1.5));
        assert_eq!(number_from_value(&json!(" -2.25 ")), Some(-2.25));
        assert_eq!(number_from_value(&json!("abc")), None);
        assert_eq!(number_from_value(&json!(null)), None);
        assert_eq!(number_from_value(&json!("NaN")), None);
    }

    #[test]
    fn negative_zero_is_folded() {
        assert!(finite_or_zero(-0.0).is_sign_positive());
        assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(finite_or_zero(3.0), 3.0);
    }
}
