//! Decoding for fields the panel stores as JSON text
//!
//! Several inbound fields (`settings`, `streamSettings`, `sniffing`,
//! `allocate`) come back either as a JSON object or as a string holding that
//! object serialized. Use with `#[serde(default, deserialize_with = "nested::optional")]`.

use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode an optional field that may be a JSON object or a JSON-encoded string
///
/// Strings are unwrapped until a non-string value remains, so an object that
/// was encoded more than once still decodes. `null` and the empty string map
/// to `None`.
pub(crate) fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    unwrap_value(value).map_err(D::Error::custom)
}

fn unwrap_value<T: DeserializeOwned>(value: Value) -> Result<Option<T>, serde_json::Error> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => unwrap_value(serde_json::from_str(&text)?),
        value => T::deserialize(value).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Inner {
        strategy: String,
        refresh: i64,
        dest_override: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    struct Outer {
        #[serde(default, deserialize_with = "optional")]
        inner: Option<Inner>,
    }

    #[test]
    fn test_null_and_empty_string_are_none() {
        let outer: Outer = serde_json::from_str(r#"{"inner": null}"#).unwrap();
        assert!(outer.inner.is_none());

        let outer: Outer = serde_json::from_str(r#"{"inner": ""}"#).unwrap();
        assert!(outer.inner.is_none());

        let outer: Outer = serde_json::from_str(r#"{}"#).unwrap();
        assert!(outer.inner.is_none());
    }

    #[test]
    fn test_string_with_invalid_json_is_an_error() {
        let result = serde_json::from_str::<Outer>(r#"{"inner": "{not json"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_string_in_string_is_unwrapped() {
        let inner = json!({"strategy": "always", "refresh": 5, "destOverride": ["tls"]});
        let once = Value::String(inner.to_string());
        let twice = Value::String(once.to_string());

        let outer: Outer = serde_json::from_value(json!({ "inner": twice })).unwrap();
        let expected = Inner {
            strategy: "always".to_string(),
            refresh: 5,
            dest_override: vec!["tls".to_string()],
        };
        assert_eq!(outer.inner, Some(expected));
    }

    #[test]
    fn test_wrong_shape_is_an_error() {
        let result = serde_json::from_str::<Outer>(r#"{"inner": 42}"#);
        assert!(result.is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_string_wrapped_equals_plain_object(
            strategy in "[a-zA-Z ]{0,12}",
            refresh in any::<i64>(),
            dest_override in prop::collection::vec("[a-z]{1,6}", 0..4),
        ) {
            let inner = Inner { strategy, refresh, dest_override };
            let object = serde_json::to_value(&inner).unwrap();
            let wrapped = Value::String(object.to_string());

            let plain: Outer = serde_json::from_value(json!({ "inner": object })).unwrap();
            let encoded: Outer = serde_json::from_value(json!({ "inner": wrapped })).unwrap();

            prop_assert_eq!(plain.inner.as_ref(), Some(&inner));
            prop_assert_eq!(encoded.inner, plain.inner);
        }
    }
}
