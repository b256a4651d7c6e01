//! # Artifact Serialization Utilities
//!
//! Functions for saving and loading opaque artifacts (fitted models,
//! preprocessors, label encoders...). Uses `serde` for serialization and
//! `bincode` as the binary format.
//!
//! No type tag is written: the bytes decode into whatever type the loader asks
//! for, so callers must load with the type they saved.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, Read, Write};

use crate::error::{ErrorKind, SerializationError};

// --- Codec Options ---

/// The bincode configuration the crate writes with (same byte layout as
/// `bincode::serialize_into`), capped at `limit` bytes when decoding.
///
/// Length prefixes are read before the bytes behind them, so without a cap a
/// corrupt prefix turns into a huge allocation.
pub(crate) fn options(limit: u64) -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(limit)
}

/// Sorts a bincode decode failure into a content error or a genuine read
/// failure. Running out of bytes, hitting the size cap or invalid UTF-8 all
/// mean the content is bad, not the file handle.
pub(crate) fn decode_error(err: bincode::Error) -> ErrorKind {
    match *err {
        bincode::ErrorKind::Io(e)
            if !matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData
            ) =>
        {
            ErrorKind::Io(e)
        }
        other => ErrorKind::Serialization(SerializationError::Bincode(Box::new(other))),
    }
}

// --- Save Function ---

/// Encodes `value` into `writer`. Does not flush.
pub(crate) fn encode_into<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> Result<(), ErrorKind> {
    bincode::serialize_into(writer, value)?;
    Ok(())
}

// --- Load Function ---

/// Decodes a value of type `T` from `reader`, reading at most `limit` bytes.
///
/// Truncated, oversized or otherwise undecodable content fails with
/// `ErrorKind::Serialization`.
pub(crate) fn decode_from<R: Read, T: DeserializeOwned>(reader: R, limit: u64) -> Result<T, ErrorKind> {
    options(limit).deserialize_from(reader).map_err(decode_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct StandardScaler {
        mean: Vec<f64>,
        scale: Vec<f64>,
        feature_names: BTreeMap<String, usize>,
    }

    fn scaler() -> StandardScaler {
        StandardScaler {
            mean: vec![0.5, 12.0],
            scale: vec![1.0, 3.5],
            feature_names: [("age".to_string(), 0), ("wage".to_string(), 1)].into(),
        }
    }

    fn encoded() -> Vec<u8> {
        let mut buf = Vec::new();
        encode_into(&mut buf, &scaler()).unwrap();
        buf
    }

    #[test]
    fn decodes_what_was_encoded() {
        let buf = encoded();
        let back: StandardScaler = decode_from(buf.as_slice(), buf.len() as u64).unwrap();
        assert_eq!(back, scaler());
    }

    #[test]
    fn options_match_the_encoder_layout() {
        let buf = encoded();
        assert_eq!(options(u64::MAX).serialize(&scaler()).unwrap(), buf);
    }

    #[test]
    fn truncated_input_is_a_serialization_error() {
        let mut buf = encoded();
        buf.truncate(buf.len() / 2);
        let err = decode_from::<_, StandardScaler>(buf.as_slice(), buf.len() as u64).unwrap_err();
        assert!(matches!(err, ErrorKind::Serialization(_)));
    }

    #[test]
    fn huge_length_prefix_fails_without_allocating() {
        let buf = u64::MAX.to_le_bytes();
        let err = decode_from::<_, String>(&buf[..], buf.len() as u64).unwrap_err();
        assert!(matches!(err, ErrorKind::Serialization(_)));

        // a length that fits in memory but not in the file
        let buf = (1u64 << 40).to_le_bytes();
        let err = decode_from::<_, Vec<u8>>(&buf[..], buf.len() as u64).unwrap_err();
        assert!(matches!(err, ErrorKind::Serialization(_)));
    }

    #[test]
    fn invalid_bytes_are_a_serialization_error() {
        // bool must be 0 or 1
        let err = decode_from::<_, bool>(&[7u8][..], 1).unwrap_err();
        assert!(matches!(err, ErrorKind::Serialization(_)));

        // string length 2 followed by invalid UTF-8
        let mut buf = 2u64.to_le_bytes().to_vec();
        buf.extend_from_slice(&[0xff, 0xfe]);
        let err = decode_from::<_, String>(buf.as_slice(), buf.len() as u64).unwrap_err();
        assert!(matches!(err, ErrorKind::Serialization(_)));
    }

    #[test]
    fn other_read_failures_stay_io() {
        let err = decode_error(Box::new(bincode::ErrorKind::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "denied",
        ))));
        assert!(matches!(err, ErrorKind::Io(_)));
    }
}
