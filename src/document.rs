//! # Config Documents
//!
//! YAML encoding for config documents. A [`Document`] is any value YAML can
//! represent; typed structs go through the same path via serde.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ErrorKind, SerializationError};

/// An untyped config document: nested mappings, sequences and scalars.
pub type Document = serde_yaml::Value;

/// Controls what `write_config` does with a file that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Truncate and rewrite the existing file in place.
    #[default]
    Keep,
    /// Remove the existing file before writing a fresh one.
    Replace,
}

impl From<bool> for OverwritePolicy {
    fn from(replace: bool) -> Self {
        if replace {
            OverwritePolicy::Replace
        } else {
            OverwritePolicy::Keep
        }
    }
}

/// Parses raw file content. Invalid UTF-8 is a parse error like any other
/// malformed input.
pub(crate) fn parse<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ErrorKind> {
    serde_yaml::from_slice(bytes).map_err(ErrorKind::Parse)
}

pub(crate) fn render<T: Serialize + ?Sized>(value: &T) -> Result<String, ErrorKind> {
    serde_yaml::to_string(value)
        .map_err(|e| ErrorKind::Serialization(SerializationError::Yaml(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Split {
        test_size: f64,
        columns: Vec<String>,
    }

    #[test]
    fn parses_nested_documents() {
        let doc: Document = parse(b"a:\n  b: [1, 2]\n  c: true\n").unwrap();
        assert_eq!(doc["a"]["b"][1].as_i64(), Some(2));
        assert_eq!(doc["a"]["c"].as_bool(), Some(true));
    }

    #[test]
    fn typed_mismatch_is_a_parse_error() {
        let err = parse::<Split>(b"test_size: oops\ncolumns: []\n").unwrap_err();
        assert!(matches!(err, ErrorKind::Parse(_)));

        let split: Split = parse(b"test_size: 0.2\ncolumns: [id, case_status]\n").unwrap();
        assert_eq!(split.columns, vec!["id", "case_status"]);
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        let err = parse::<Document>(b"key: [unclosed\n").unwrap_err();
        assert!(matches!(err, ErrorKind::Parse(_)));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let err = parse::<Document>(b"name: \xff\xfe\n").unwrap_err();
        assert!(matches!(err, ErrorKind::Parse(_)));
    }

    #[test]
    fn render_then_parse_is_stable() {
        let doc: Document = parse(b"x: 1\nnested:\n  - a\n  - b\n").unwrap();
        let text = render(&doc).unwrap();
        assert_eq!(parse::<Document>(text.as_bytes()).unwrap(), doc);
    }

    #[test]
    fn bool_maps_to_policy() {
        assert_eq!(OverwritePolicy::from(true), OverwritePolicy::Replace);
        assert_eq!(OverwritePolicy::from(false), OverwritePolicy::Keep);
    }
}
