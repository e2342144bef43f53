use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Decimal places kept for non-integer numbers in canonical output.
pub const FLOAT_DECIMALS: i32 = 6;

// Canonical report bytes:
// - UTF-8 JSON, no insignificant whitespace
// - object keys sorted lexicographically
// - integers as-is; other numbers rounded to FLOAT_DECIMALS places
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> CoreResult<Vec<u8>> {
    let v = serde_json::to_value(value)?;
    let normalized = normalize_value(v)?;
    let s = serde_json::to_string(&normalized)?;
    Ok(s.into_bytes())
}

pub fn to_canonical_string<T: Serialize>(value: &T) -> CoreResult<String> {
    let bytes = to_canonical_bytes(value)?;
    String::from_utf8(bytes)
        .map_err(|e| CoreError::DeterminismViolation(format!("canonical JSON not UTF-8: {}", e)))
}

fn normalize_value(v: Value) -> CoreResult<Value> {
    match v {
        Value::Object(map) => {
            let mut btm: BTreeMap<String, Value> = BTreeMap::new();
            for (k, vv) in map {
                btm.insert(k, normalize_value(vv)?);
            }
            // serde_json::Map may preserve insertion order; rebuild in sorted order.
            let mut out = serde_json::Map::new();
            for (k, vv) in btm {
                out.insert(k, vv);
            }
            Ok(Value::Object(out))
        }
        Value::Array(arr) => {
            let mut out = Vec::with_capacity(arr.len());
            for vv in arr {
                out.push(normalize_value(vv)?);
            }
            Ok(Value::Array(out))
        }
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return Ok(Value::Number(n));
            }
            let f = n.as_f64().ok_or_else(|| {
                CoreError::DeterminismViolation("number is not representable as f64".to_string())
            })?;
            let scale = 10f64.powi(FLOAT_DECIMALS);
            let rounded = (f * scale).round() / scale;
            Number::from_f64(rounded)
                .map(Value::Number)
                .ok_or_else(|| {
                    CoreError::DeterminismViolation(
                        "canonical JSON forbids non-finite numbers".to_string(),
                    )
                })
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_and_floats_rounded() {
        let v = json!({"b": 0.1234567891, "a": [1, {"z": 2, "y": 0.5}]});
        let s = to_canonical_string(&v).unwrap();
        assert_eq!(s, r#"{"a":[1,{"y":0.5,"z":2}],"b":0.123457}"#);
    }
}
