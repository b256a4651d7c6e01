//! # Array Storage Format
//!
//! Self-describing binary layout for [`ArrayData`]:
//!
//! ```text
//! b"ASARR" | version: u8 | bincode(ArrayHeader) | bincode(FlatData)
//! ```
//!
//! The header carries the element type and shape, so a loader can refuse
//! object-typed arrays before decoding any element data. Elements are stored
//! flat in logical (row-major) order.

use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::io::{self, Read, Write};

use bincode::Options;

use super::{ArrayData, DType, ObjectValue};
use crate::error::{ErrorKind, SerializationError};
use crate::utils::serialization;

const MAGIC: &[u8; 5] = b"ASARR";
const FORMAT_VERSION: u8 = 1;

// --- Load Policy ---

/// Whether object-typed arrays may be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectArrays {
    #[default]
    Allow,
    Reject,
}

// --- On-disk Records ---

#[derive(Serialize, Deserialize, Debug)]
struct ArrayHeader {
    dtype: DType,
    shape: Vec<usize>,
}

/// Flat element buffer. Variant order must not change: bincode encodes the
/// variant index.
#[derive(Serialize, Deserialize, Debug)]
enum FlatData<'a> {
    Bool(Cow<'a, [bool]>),
    I8(Cow<'a, [i8]>),
    I16(Cow<'a, [i16]>),
    I32(Cow<'a, [i32]>),
    I64(Cow<'a, [i64]>),
    U8(Cow<'a, [u8]>),
    U16(Cow<'a, [u16]>),
    U32(Cow<'a, [u32]>),
    U64(Cow<'a, [u64]>),
    F32(Cow<'a, [f32]>),
    F64(Cow<'a, [f64]>),
    Object(Cow<'a, [ObjectValue]>),
}

/// Borrows the elements when the array is in standard layout, copies them
/// out in logical order otherwise.
fn flatten<T: Clone>(array: &ArrayD<T>) -> Cow<'_, [T]> {
    match array.as_slice() {
        Some(slice) => Cow::Borrowed(slice),
        None => Cow::Owned(array.iter().cloned().collect()),
    }
}

impl<'a> FlatData<'a> {
    fn from_array(data: &'a ArrayData) -> Self {
        match data {
            ArrayData::Bool(a) => FlatData::Bool(flatten(a)),
            ArrayData::I8(a) => FlatData::I8(flatten(a)),
            ArrayData::I16(a) => FlatData::I16(flatten(a)),
            ArrayData::I32(a) => FlatData::I32(flatten(a)),
            ArrayData::I64(a) => FlatData::I64(flatten(a)),
            ArrayData::U8(a) => FlatData::U8(flatten(a)),
            ArrayData::U16(a) => FlatData::U16(flatten(a)),
            ArrayData::U32(a) => FlatData::U32(flatten(a)),
            ArrayData::U64(a) => FlatData::U64(flatten(a)),
            ArrayData::F32(a) => FlatData::F32(flatten(a)),
            ArrayData::F64(a) => FlatData::F64(flatten(a)),
            ArrayData::Object(a) => FlatData::Object(flatten(a)),
        }
    }

    fn dtype(&self) -> DType {
        match self {
            FlatData::Bool(_) => DType::Bool,
            FlatData::I8(_) => DType::I8,
            FlatData::I16(_) => DType::I16,
            FlatData::I32(_) => DType::I32,
            FlatData::I64(_) => DType::I64,
            FlatData::U8(_) => DType::U8,
            FlatData::U16(_) => DType::U16,
            FlatData::U32(_) => DType::U32,
            FlatData::U64(_) => DType::U64,
            FlatData::F32(_) => DType::F32,
            FlatData::F64(_) => DType::F64,
            FlatData::Object(_) => DType::Object,
        }
    }

    fn len(&self) -> usize {
        match self {
            FlatData::Bool(v) => v.len(),
            FlatData::I8(v) => v.len(),
            FlatData::I16(v) => v.len(),
            FlatData::I32(v) => v.len(),
            FlatData::I64(v) => v.len(),
            FlatData::U8(v) => v.len(),
            FlatData::U16(v) => v.len(),
            FlatData::U32(v) => v.len(),
            FlatData::U64(v) => v.len(),
            FlatData::F32(v) => v.len(),
            FlatData::F64(v) => v.len(),
            FlatData::Object(v) => v.len(),
        }
    }

    /// Rebuilds the n-dimensional array. The caller has already checked the
    /// element count against `shape`.
    fn into_array(self, shape: &[usize]) -> Result<ArrayData, SerializationError> {
        fn build<T: Clone>(
            shape: &[usize],
            data: Cow<'_, [T]>,
        ) -> Result<ArrayD<T>, SerializationError> {
            let len = data.len();
            ArrayD::from_shape_vec(IxDyn(shape), data.into_owned()).map_err(|e| {
                SerializationError::Shape {
                    shape: shape.to_vec(),
                    len,
                    reason: e.to_string(),
                }
            })
        }

        Ok(match self {
            FlatData::Bool(v) => ArrayData::Bool(build(shape, v)?),
            FlatData::I8(v) => ArrayData::I8(build(shape, v)?),
            FlatData::I16(v) => ArrayData::I16(build(shape, v)?),
            FlatData::I32(v) => ArrayData::I32(build(shape, v)?),
            FlatData::I64(v) => ArrayData::I64(build(shape, v)?),
            FlatData::U8(v) => ArrayData::U8(build(shape, v)?),
            FlatData::U16(v) => ArrayData::U16(build(shape, v)?),
            FlatData::U32(v) => ArrayData::U32(build(shape, v)?),
            FlatData::U64(v) => ArrayData::U64(build(shape, v)?),
            FlatData::F32(v) => ArrayData::F32(build(shape, v)?),
            FlatData::F64(v) => ArrayData::F64(build(shape, v)?),
            FlatData::Object(v) => ArrayData::Object(build(shape, v)?),
        })
    }
}

// --- Write ---

/// Encodes `data` into `writer`. Does not flush.
pub(crate) fn write_array<W: Write>(writer: &mut W, data: &ArrayData) -> Result<(), ErrorKind> {
    writer.write_all(MAGIC)?;
    writer.write_all(&[FORMAT_VERSION])?;

    let header = ArrayHeader {
        dtype: data.dtype(),
        shape: data.shape().to_vec(),
    };
    bincode::serialize_into(&mut *writer, &header)?;
    bincode::serialize_into(&mut *writer, &FlatData::from_array(data))?;
    Ok(())
}

// --- Read ---

/// Maps a bincode failure while decoding array content to `Corrupt`, keeping
/// genuine read failures as I/O errors.
fn content_error(part: &str, err: bincode::Error) -> ErrorKind {
    match serialization::decode_error(err) {
        ErrorKind::Io(e) => ErrorKind::Io(e),
        other => ErrorKind::Corrupt(format!("undecodable array {part}: {other}")),
    }
}

/// Decodes an array from `reader`, reading at most `limit` bytes and refusing
/// object-typed arrays under [`ObjectArrays::Reject`] before their elements
/// are read.
pub(crate) fn read_array<R: Read>(
    reader: &mut R,
    limit: u64,
    policy: ObjectArrays,
) -> Result<ArrayData, ErrorKind> {
    // Fixed prefix: magic bytes followed by the format version
    let mut prefix = [0u8; 6];
    match reader.read_exact(&mut prefix) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(ErrorKind::Corrupt("file too short for an array header".into()));
        }
        Err(e) => return Err(e.into()),
    }
    if &prefix[..MAGIC.len()] != MAGIC {
        return Err(ErrorKind::Corrupt("missing array magic".into()));
    }
    let version = prefix[MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(ErrorKind::UnsupportedVersion(version));
    }

    // Neither header nor data can be longer than what is left of the file
    let budget = limit.saturating_sub(prefix.len() as u64);

    let header: ArrayHeader = serialization::options(budget)
        .deserialize_from(&mut *reader)
        .map_err(|e| content_error("header", e))?;
    if header.dtype.is_object() && policy == ObjectArrays::Reject {
        return Err(ErrorKind::ObjectArrayRejected);
    }
    let expected = header
        .shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| ErrorKind::Corrupt(format!("shape {:?} overflows", header.shape)))?;

    let flat: FlatData<'static> = serialization::options(budget)
        .deserialize_from(&mut *reader)
        .map_err(|e| content_error("data", e))?;
    if flat.dtype() != header.dtype {
        return Err(ErrorKind::Corrupt(format!(
            "header declares {} but data holds {}",
            header.dtype,
            flat.dtype()
        )));
    }
    if flat.len() != expected {
        return Err(ErrorKind::Corrupt(format!(
            "shape {:?} needs {} elements, found {}",
            header.shape,
            expected,
            flat.len()
        )));
    }
    Ok(flat.into_array(&header.shape)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Axis};

    fn encode(data: &ArrayData) -> Vec<u8> {
        let mut buf = Vec::new();
        write_array(&mut buf, data).unwrap();
        buf
    }

    fn decode(bytes: &[u8], policy: ObjectArrays) -> Result<ArrayData, ErrorKind> {
        read_array(&mut &bytes[..], bytes.len() as u64, policy)
    }

    #[test]
    fn preserves_shape_dtype_and_values() {
        let data = ArrayData::from(array![[1i32, 2], [3, 4], [5, 6]]);
        let bytes = encode(&data);
        assert!(bytes.starts_with(MAGIC));
        let back = decode(&bytes, ObjectArrays::Allow).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn non_standard_layout_is_written_in_logical_order() {
        let transposed = array![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]].reversed_axes();
        let data = ArrayData::from(transposed.clone());
        let bytes = encode(&data);
        let back = decode(&bytes, ObjectArrays::Allow).unwrap();
        let arr = back.into_array::<f32>().unwrap();
        assert_eq!(arr.shape(), &[3, 2]);
        assert_eq!(arr, transposed.into_dyn());
        let second_row: Vec<f32> = arr.index_axis(Axis(0), 1).iter().copied().collect();
        assert_eq!(second_row, vec![2.0, 5.0]);
    }

    #[test]
    fn object_arrays_respect_policy() {
        let data = ArrayData::from(array![ObjectValue::from("a"), ObjectValue::Int(2)]);
        let bytes = encode(&data);
        let err = decode(&bytes, ObjectArrays::Reject).unwrap_err();
        assert!(matches!(err, ErrorKind::ObjectArrayRejected));
        let back = decode(&bytes, ObjectArrays::Allow).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn rejects_foreign_and_truncated_input() {
        let err = decode(b"\x93NUMPY\x01\x00", ObjectArrays::Allow).unwrap_err();
        assert!(matches!(err, ErrorKind::Corrupt(_)));

        let err = decode(b"ASA", ObjectArrays::Allow).unwrap_err();
        assert!(matches!(err, ErrorKind::Corrupt(_)));

        let mut bytes = encode(&ArrayData::from(array![1u8, 2, 3]));
        bytes[MAGIC.len()] = 9;
        let err = decode(&bytes, ObjectArrays::Allow).unwrap_err();
        assert!(matches!(err, ErrorKind::UnsupportedVersion(9)));
    }

    #[test]
    fn truncated_body_is_corrupt() {
        let bytes = encode(&ArrayData::from(array![[1.0f64, 2.0], [3.0, 4.0]]));
        for cut in [8, bytes.len() / 2, bytes.len() - 1] {
            let err = decode(&bytes[..cut], ObjectArrays::Allow).unwrap_err();
            assert!(matches!(err, ErrorKind::Corrupt(_)), "cut at {cut}: {err}");
        }
    }

    #[test]
    fn oversized_length_prefix_is_corrupt() {
        let mut bytes = encode(&ArrayData::from(array![ObjectValue::from("a")]));
        // the string's u64 length prefix sits right before its single byte
        let at = bytes.len() - 9;
        bytes[at..at + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        let err = decode(&bytes, ObjectArrays::Allow).unwrap_err();
        assert!(matches!(err, ErrorKind::Corrupt(_)));

        let mut bytes = encode(&ArrayData::from(array![1u32, 2]));
        // element count prefix of the flat data, just before 2 x 4 bytes
        let at = bytes.len() - 16;
        bytes[at..at + 8].copy_from_slice(&(1u64 << 40).to_le_bytes());
        let err = decode(&bytes, ObjectArrays::Allow).unwrap_err();
        assert!(matches!(err, ErrorKind::Corrupt(_)));
    }

    #[test]
    fn element_count_must_match_shape() {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.push(FORMAT_VERSION);
        let header = ArrayHeader {
            dtype: DType::I64,
            shape: vec![2, 2],
        };
        bincode::serialize_into(&mut buf, &header).unwrap();
        bincode::serialize_into(&mut buf, &FlatData::I64(Cow::Owned(vec![1, 2, 3]))).unwrap();
        let err = decode(&buf, ObjectArrays::Allow).unwrap_err();
        assert!(matches!(err, ErrorKind::Corrupt(msg) if msg.contains("needs 4 elements")));
    }

    #[test]
    fn zero_sized_arrays_survive() {
        let data = ArrayData::from(ArrayD::<f64>::zeros(IxDyn(&[0, 3])));
        let bytes = encode(&data);
        let back = decode(&bytes, ObjectArrays::Allow).unwrap();
        assert_eq!(back.shape(), &[0, 3]);
        assert!(back.is_empty());
    }
}
