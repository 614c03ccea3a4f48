//! The content-type bound codec.

use std::io::{self, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::content_type::ContentType;
use crate::emoji;
use crate::error::EncodingError;

/// Root element used when a value is written as XML.
pub const XML_ROOT: &str = "response";

/// Bidirectional value <-> bytes conversion for one [`ContentType`].
///
/// A `Codec` is a plain value: it holds no buffers between calls and is
/// `Copy`, so one instance can be shared freely across request tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Codec {
    content_type: ContentType,
}

impl Codec {
    /// Create a codec for the given content type.
    #[must_use]
    pub const fn new(content_type: ContentType) -> Self {
        Self { content_type }
    }

    /// Create a JSON codec.
    #[must_use]
    pub const fn json() -> Self {
        Self::new(ContentType::Json)
    }

    /// The content type this codec reads and writes.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Decode `bytes`, ignoring fields the target does not declare.
    pub fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, EncodingError> {
        let _span = tracing::trace_span!("unmarshal", content_type = %self.content_type).entered();
        let ct = self.content_type;

        match ct {
            ContentType::Json => {
                serde_json::from_slice(bytes).map_err(|e| EncodingError::decode(ct, e))
            }
            ContentType::Xml => {
                let text = std::str::from_utf8(bytes).map_err(|e| EncodingError::decode(ct, e))?;
                quick_xml::de::from_str(text).map_err(|e| EncodingError::decode(ct, e))
            }
            ContentType::Yaml => {
                serde_yaml::from_slice(bytes).map_err(|e| EncodingError::decode(ct, e))
            }
            ContentType::Toml => {
                let text = std::str::from_utf8(bytes).map_err(|e| EncodingError::decode(ct, e))?;
                toml::from_str(text).map_err(|e| EncodingError::decode(ct, e))
            }
            ContentType::Emoji => emoji::from_emoji(bytes),
        }
    }

    /// Decode `bytes`, rejecting fields the target does not declare.
    ///
    /// Strictness applies to JSON, the format request bodies arrive in by
    /// default. Every other content type decodes as [`Codec::unmarshal`].
    pub fn unmarshal_strict<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, EncodingError> {
        if self.content_type != ContentType::Json {
            return self.unmarshal(bytes);
        }

        let _span = tracing::trace_span!("unmarshal_strict", content_type = %self.content_type).entered();
        let ct = self.content_type;

        let mut unknown = Vec::new();
        let mut de = serde_json::Deserializer::from_slice(bytes);
        let value: T = serde_ignored::deserialize(&mut de, |path| unknown.push(path.to_string()))
            .map_err(|e| EncodingError::decode(ct, e))?;
        de.end().map_err(|e| EncodingError::decode(ct, e))?;

        if unknown.is_empty() {
            Ok(value)
        } else {
            Err(EncodingError::UnknownFields {
                content_type: ct,
                fields: unknown,
            })
        }
    }

    /// Write the serialized form of `value` into `writer`.
    pub fn encode<W: Write, T: Serialize + ?Sized>(
        &self,
        mut writer: W,
        value: &T,
    ) -> Result<(), EncodingError> {
        let _span = tracing::trace_span!("encode", content_type = %self.content_type).entered();
        let ct = self.content_type;

        match ct {
            ContentType::Json => {
                serde_json::to_writer(writer, value).map_err(|e| EncodingError::encode(ct, e))
            }
            ContentType::Xml => {
                let mut tree = serde_json::to_value(value).map_err(|e| EncodingError::encode(ct, e))?;
                strip_nulls(&mut tree);
                let text = quick_xml::se::to_string_with_root(XML_ROOT, &tree)
                    .map_err(|e| EncodingError::encode(ct, e))?;
                writer
                    .write_all(text.as_bytes())
                    .map_err(|e| EncodingError::encode(ct, e))
            }
            ContentType::Yaml => {
                serde_yaml::to_writer(writer, value).map_err(|e| EncodingError::encode(ct, e))
            }
            ContentType::Toml => {
                let text = toml::to_string(value).map_err(|e| EncodingError::encode(ct, e))?;
                writer
                    .write_all(text.as_bytes())
                    .map_err(|e| EncodingError::encode(ct, e))
            }
            ContentType::Emoji => {
                let text = emoji::to_emoji(value)?;
                writer
                    .write_all(text.as_bytes())
                    .map_err(|e| EncodingError::encode(ct, e))
            }
        }
    }

    /// Serialize `value` into a fresh buffer.
    pub fn encode_to_vec<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, EncodingError> {
        let mut buf = Vec::with_capacity(256);
        self.encode(&mut buf, value)?;
        Ok(buf)
    }

    /// Serialize `value` into memory and return a readable view of it.
    pub fn encode_to_reader<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<io::Cursor<Vec<u8>>, EncodingError> {
        self.encode_to_vec(value).map(io::Cursor::new)
    }
}

/// Drop `null` members so XML leaves absent fields out instead of writing
/// empty elements that read back as present.
fn strip_nulls(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(members) => {
            members.retain(|_, v| !v.is_null());
            members.values_mut().for_each(strip_nulls);
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::Read;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Example {
        name: String,
        count: u32,
        enabled: bool,
    }

    #[derive(Debug, Deserialize)]
    struct NameOnly {
        name: String,
    }

    fn example() -> Example {
        Example {
            name: "whisk".to_owned(),
            count: 3,
            enabled: true,
        }
    }

    #[test]
    fn test_should_report_content_type() {
        assert_eq!(Codec::default().content_type(), ContentType::Json);
        assert_eq!(Codec::new(ContentType::Toml).content_type(), ContentType::Toml);
    }

    #[test]
    fn test_should_round_trip_struct_in_every_format() {
        for ct in ContentType::ALL {
            let codec = Codec::new(ct);
            let bytes = codec.encode_to_vec(&example()).unwrap();
            let back: Example = codec.unmarshal(&bytes).unwrap();
            assert_eq!(back, example(), "failed for {ct}");
        }
    }

    #[test]
    fn test_should_write_json_into_writer() {
        let mut buf = Vec::new();
        Codec::json().encode(&mut buf, &example()).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            r#"{"name":"whisk","count":3,"enabled":true}"#,
        );
    }

    #[test]
    fn test_should_wrap_xml_in_root_element() {
        let bytes = Codec::new(ContentType::Xml).encode_to_vec(&example()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("<response>"), "got {text}");
        assert!(text.contains("<name>whisk</name>"));
    }

    #[test]
    fn test_should_leave_absent_fields_out_of_xml() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Sparse {
            name: String,
            note: Option<String>,
            nested: Option<Example>,
        }

        let codec = Codec::new(ContentType::Xml);
        let sparse = Sparse {
            name: "whisk".to_owned(),
            note: None,
            nested: None,
        };
        let text = String::from_utf8(codec.encode_to_vec(&sparse).unwrap()).unwrap();
        assert_eq!(text, "<response><name>whisk</name></response>");

        let back: Sparse = codec.unmarshal(text.as_bytes()).unwrap();
        assert_eq!(back, sparse);
    }

    #[test]
    fn test_should_encode_to_reader() {
        let mut reader = Codec::json().encode_to_reader(&example()).unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert!(text.contains("\"whisk\""));
    }

    #[test]
    fn test_should_ignore_unknown_fields_when_lenient() {
        let parsed: NameOnly = Codec::json()
            .unmarshal(br#"{"name":"x","extra":1}"#)
            .unwrap();
        assert_eq!(parsed.name, "x");
    }

    #[test]
    fn test_should_reject_unknown_fields_when_strict() {
        let err = Codec::json()
            .unmarshal_strict::<NameOnly>(br#"{"name":"x","extra":1}"#)
            .unwrap_err();
        match err {
            EncodingError::UnknownFields { fields, content_type } => {
                assert_eq!(content_type, ContentType::Json);
                assert_eq!(fields, vec!["extra".to_owned()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_should_accept_known_fields_when_strict() {
        let parsed: NameOnly = Codec::json().unmarshal_strict(br#"{"name":"x"}"#).unwrap();
        assert_eq!(parsed.name, "x");
    }

    #[test]
    fn test_should_reject_trailing_garbage_when_strict() {
        let err = Codec::json()
            .unmarshal_strict::<NameOnly>(br#"{"name":"x"} {"#)
            .unwrap_err();
        assert!(matches!(err, EncodingError::Decode { .. }));
    }

    #[test]
    fn test_should_fail_decode_on_ill_formed_input() {
        for ct in ContentType::ALL {
            let err = Codec::new(ct).unmarshal::<Example>(b"\xff\xfe not valid").unwrap_err();
            assert!(!err.is_encode(), "failed for {ct}");
            assert_eq!(err.content_type(), ct);
        }
    }

    #[test]
    fn test_should_fail_encode_for_unrepresentable_values() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], "bytes as keys".to_owned());
        let err = Codec::json().encode_to_vec(&map).unwrap_err();
        assert!(err.is_encode());
        assert_eq!(err.content_type(), ContentType::Json);
    }

    #[test]
    fn test_should_round_trip_map_through_emoji() {
        let mut value = BTreeMap::new();
        value.insert("Name".to_owned(), "name".to_owned());

        let codec = Codec::new(ContentType::Emoji);
        let bytes = codec.encode_to_vec(&value).unwrap();
        let back: BTreeMap<String, String> = codec.unmarshal(&bytes).unwrap();
        assert_eq!(back, value);
    }
}
