//! Scalar coercions shared by the caster, the sanitizers and the evaluator.
//!
//! Submitted form values arrive as strings, so numeric checks accept
//! numeric-looking strings while boolean checks never do.

use serde_json::{Number, Value};

/// Parse a numeric-looking string (surrounding whitespace allowed).
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let n = s.parse::<f64>().ok()?;
    n.is_finite().then_some(n)
}

/// Whether the value is a number or a numeric-looking string.
pub fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => parse_number(s).is_some(),
        _ => false,
    }
}

/// Numeric value of numbers and numeric strings.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Integer conversion; fractions truncate toward zero.
pub fn to_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| u.min(i64::MAX as u64) as i64))
            .unwrap_or_else(|| n.as_f64().map(|f| f as i64).unwrap_or(0)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| parse_number(s).map(|f| f as i64))
                .unwrap_or(0)
        }
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

/// Float conversion; non-numeric values become `0.0`.
pub fn to_float(value: &Value) -> f64 {
    match value {
        Value::Bool(b) => f64::from(u8::from(*b)),
        other => as_f64(other).unwrap_or(0.0),
    }
}

/// Truthiness of a submitted value.
///
/// `null`, `false`, `0`, `""`, `"0"` and empty collections are false.
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// String conversion; `true` is `"1"`, `false`, `null` and collections are `""`.
pub fn to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        _ => String::new(),
    }
}

/// JSON number from a float, `0` when not representable.
pub fn float_value(f: f64) -> Value {
    Value::Number(Number::from_f64(f).unwrap_or_else(|| Number::from(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric() {
        assert!(is_numeric(&json!("5")));
        assert!(is_numeric(&json!(" 2.5 ")));
        assert!(is_numeric(&json!(-3)));
        assert!(!is_numeric(&json!("5px")));
        assert!(!is_numeric(&json!("")));
        assert!(!is_numeric(&json!(true)));
        assert!(!is_numeric(&json!("NaN")));
    }

    #[test]
    fn test_to_int() {
        assert_eq!(to_int(&json!("5")), 5);
        assert_eq!(to_int(&json!("7.9")), 7);
        assert_eq!(to_int(&json!(-2.5)), -2);
        assert_eq!(to_int(&json!("abc")), 0);
        assert_eq!(to_int(&json!(true)), 1);
    }

    #[test]
    fn test_truthiness() {
        assert!(!to_bool(&json!("0")));
        assert!(!to_bool(&json!("")));
        assert!(!to_bool(&json!([])));
        assert!(to_bool(&json!("false")));
        assert!(to_bool(&json!(0.1)));
    }

    #[test]
    fn test_to_string() {
        assert_eq!(to_string(&json!(true)), "1");
        assert_eq!(to_string(&json!(false)), "");
        assert_eq!(to_string(&json!(12)), "12");
        assert_eq!(to_string(&json!({"a": 1})), "");
    }
}
