use serde_json::Value;

/// Distinguishes a field omitted from a PATCH body from one explicitly set
/// to null, so handlers can treat "leave unchanged" and "clear" differently.
pub enum NullableValue {
    Omitted,
    Null,
    String(String),
}

pub fn classify_nullable(optional_value: Option<&Value>) -> Result<NullableValue, String> {
    match optional_value {
        None => Ok(NullableValue::Omitted),
        Some(Value::Null) => Ok(NullableValue::Null),
        Some(Value::String(s)) => Ok(NullableValue::String(s.to_owned())),
        Some(other) => Err(format!("expected string or null, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_nullable, NullableValue};
    use serde_json::json;

    #[test]
    fn classifies_omitted_null_and_string() {
        assert!(matches!(classify_nullable(None), Ok(NullableValue::Omitted)));
        assert!(matches!(
            classify_nullable(Some(&json!(null))),
            Ok(NullableValue::Null)
        ));
        assert!(matches!(
            classify_nullable(Some(&json!("x"))),
            Ok(NullableValue::String(_))
        ));
        assert!(classify_nullable(Some(&json!(5))).is_err());
    }
}
