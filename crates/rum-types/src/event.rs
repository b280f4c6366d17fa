//! Event records and caller attributes.
//!
//! Field names follow the collector's wire shape (`ev`, `sid`, `rid`, `ts`,
//! `eid`, `source`, `attrs`) so a serialized [`EventRecord`] can be sent as-is.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Caller attributes, in insertion order.
pub type Attributes = IndexMap<String, AttributeValue>;

/// A single attribute value.
///
/// Closed over the shapes the collector accepts, so encoding is total.
/// Serializes as the bare JSON value (no tag).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Map(Attributes),
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Attributes> for AttributeValue {
    fn from(v: Attributes) -> Self {
        Self::Map(v)
    }
}

/// One event, fully stamped and ready to sign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event name.
    #[serde(rename = "ev")]
    pub name: String,
    #[serde(rename = "sid")]
    pub session_id: i64,
    #[serde(rename = "rid")]
    pub reporting_id: String,
    /// Unix seconds at build time.
    #[serde(rename = "ts")]
    pub timestamp_seconds: i32,
    #[serde(rename = "eid")]
    pub event_id: i64,
    /// SDK identity, e.g. `"rust"`.
    #[serde(rename = "source")]
    pub source_tag: String,
    #[serde(rename = "attrs")]
    pub attributes: Attributes,
}

/// A batch entry as the caller supplied it.
///
/// Either half may be missing; such entries are skipped when the batch is
/// built.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Attributes>,
}

impl RawEvent {
    /// A complete entry.
    pub fn new(name: impl Into<String>, attrs: Attributes) -> Self {
        Self {
            ev: Some(name.into()),
            attrs: Some(attrs),
        }
    }

    /// Split into `(name, attrs)` if both halves are present.
    pub fn into_parts(self) -> Option<(String, Attributes)> {
        match (self.ev, self.attrs) {
            (Some(name), Some(attrs)) => Some((name, attrs)),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_attrs() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("aaa".into(), "bbb".into());
        attrs.insert("bbb".into(), 123.into());
        attrs
    }

    #[test]
    fn test_attribute_values_serialize_untagged() {
        let mut nested = Attributes::new();
        nested.insert("ok".into(), true.into());
        let mut attrs = sample_attrs();
        attrs.insert("ratio".into(), 0.5.into());
        attrs.insert("nested".into(), nested.into());

        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(
            json,
            r#"{"aaa":"bbb","bbb":123,"ratio":0.5,"nested":{"ok":true}}"#
        );
    }

    #[test]
    fn test_attribute_values_parse_by_shape() {
        let attrs: Attributes =
            serde_json::from_str(r#"{"s":"x","i":7,"f":1.25,"b":false,"m":{"k":1}}"#).unwrap();
        assert_eq!(attrs["s"], AttributeValue::String("x".into()));
        assert_eq!(attrs["i"], AttributeValue::Int(7));
        assert_eq!(attrs["f"], AttributeValue::Float(1.25));
        assert_eq!(attrs["b"], AttributeValue::Bool(false));
        assert!(matches!(attrs["m"], AttributeValue::Map(_)));
    }

    #[test]
    fn test_event_record_wire_names() {
        let record = EventRecord {
            name: "error".into(),
            session_id: 1,
            reporting_id: "2".into(),
            timestamp_seconds: 3,
            event_id: 4,
            source_tag: "rust".into(),
            attributes: sample_attrs(),
        };
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();

        let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        for key in ["ev", "sid", "rid", "ts", "eid", "source", "attrs"] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert_eq!(obj["ev"], "error");
        assert_eq!(obj["source"], "rust");
    }

    #[test]
    fn test_raw_event_parts() {
        assert!(RawEvent::new("x", sample_attrs()).into_parts().is_some());

        let no_attrs = RawEvent { ev: Some("x".into()), attrs: None };
        assert!(no_attrs.into_parts().is_none());

        let no_name = RawEvent { ev: None, attrs: Some(sample_attrs()) };
        assert!(no_name.into_parts().is_none());
    }

    #[test]
    fn test_raw_event_parses_partial_entries() {
        let raw: Vec<RawEvent> =
            serde_json::from_str(r#"[{"ev":"x"},{"ev":"y","attrs":{"a":1}}]"#).unwrap();
        assert!(raw[0].attrs.is_none());
        assert_eq!(raw[1].ev.as_deref(), Some("y"));
    }
}
