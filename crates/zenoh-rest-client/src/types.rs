//! Data model shared by all client operations

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// One key/value observation from the zenoh REST plugin.
///
/// Wire shape: `{"key": string, "value": <raw JSON>, "encoding": string?, "time": string?}`.
///
/// `value` is kept as an uninterpreted raw JSON blob: the client decodes it
/// from its outer transport framing only and never imposes a schema. Callers
/// pair it with `encoding` to interpret the payload themselves, or use
/// [`Sample::decode_value`] when they know the shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Concrete key this value was observed under (never a pattern)
    pub key: String,

    /// Opaque payload, passed through unmodified
    pub value: Box<RawValue>,

    /// Optional MIME-like hint describing how to interpret `value`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    /// Optional timestamp, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl Sample {
    /// Build a sample from any serializable value.
    ///
    /// Mostly useful for tests and for servers that echo samples back.
    pub fn new<T: Serialize>(key: impl Into<String>, value: &T) -> serde_json::Result<Self> {
        Ok(Self {
            key: key.into(),
            value: serde_json::value::to_raw_value(value)?,
            encoding: None,
            time: None,
        })
    }

    /// Set the encoding hint
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Set the timestamp
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Decode the raw payload into a concrete type
    pub fn decode_value<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(self.value.get())
    }

    /// The raw payload exactly as it appeared on the wire
    pub fn value_text(&self) -> &str {
        self.value.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_roundtrip_keeps_value_raw() {
        let json = r#"{"key":"demo/a","value":{"nested":[1,2]},"encoding":"application/json"}"#;
        let sample: Sample = serde_json::from_str(json).unwrap();

        assert_eq!(sample.key, "demo/a");
        assert_eq!(sample.value_text(), r#"{"nested":[1,2]}"#);
        assert_eq!(sample.encoding.as_deref(), Some("application/json"));
        assert!(sample.time.is_none());
    }

    #[test]
    fn test_decode_value() {
        let sample = Sample::new("demo/hello", &"hi").unwrap();
        let decoded: String = sample.decode_value().unwrap();
        assert_eq!(decoded, "hi");
    }

    #[test]
    fn test_optional_fields_omitted_when_serialized() {
        let sample = Sample::new("demo/a", &42).unwrap();
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"key":"demo/a","value":42}"#);
    }
}
