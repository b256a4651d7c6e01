//! # Typed Arrays
//!
//! Defines [`ArrayData`], an `ndarray::ArrayD` tagged with its element type,
//! and the on-disk array format used by the store (see [`storage`]).
//!
//! Numeric element types map one-to-one onto `ndarray` element types. Arrays
//! whose elements are arbitrary values use [`ObjectValue`].

use ndarray::{Array, ArrayD, Dimension};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod storage;

pub use storage::ObjectArrays;

// --- Element Type Tag ---

/// Element type of an [`ArrayData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// Arbitrary dynamically typed elements.
    Object,
}

impl DType {
    pub fn name(&self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::I8 => "int8",
            DType::I16 => "int16",
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::U8 => "uint8",
            DType::U16 => "uint16",
            DType::U32 => "uint32",
            DType::U64 => "uint64",
            DType::F32 => "float32",
            DType::F64 => "float64",
            DType::Object => "object",
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, DType::Object)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// --- Object Elements ---

/// A dynamically typed array element, for arrays that mix strings, numbers
/// and nested lists the way object-typed columns do in dataframes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ObjectValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<ObjectValue>),
}

impl ObjectValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ObjectValue::Float(v) => Some(*v),
            ObjectValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ObjectValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ObjectValue::Null)
    }
}

impl fmt::Display for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectValue::Null => write!(f, "None"),
            ObjectValue::Bool(b) => write!(f, "{b}"),
            ObjectValue::Int(i) => write!(f, "{i}"),
            ObjectValue::Float(v) => write!(f, "{v}"),
            ObjectValue::Str(s) => write!(f, "{s:?}"),
            ObjectValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            ObjectValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for ObjectValue {
    fn from(v: bool) -> Self {
        ObjectValue::Bool(v)
    }
}

impl From<i64> for ObjectValue {
    fn from(v: i64) -> Self {
        ObjectValue::Int(v)
    }
}

impl From<f64> for ObjectValue {
    fn from(v: f64) -> Self {
        ObjectValue::Float(v)
    }
}

impl From<&str> for ObjectValue {
    fn from(v: &str) -> Self {
        ObjectValue::Str(v.to_string())
    }
}

impl From<String> for ObjectValue {
    fn from(v: String) -> Self {
        ObjectValue::Str(v)
    }
}

impl<T: Into<ObjectValue>> From<Vec<T>> for ObjectValue {
    fn from(v: Vec<T>) -> Self {
        ObjectValue::List(v.into_iter().map(Into::into).collect())
    }
}

// --- ArrayData ---

/// An n-dimensional array together with its element type.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Bool(ArrayD<bool>),
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    Object(ArrayD<ObjectValue>),
}

/// Runs `$body` with `$arr` bound to the inner `ArrayD` of whichever variant
/// `$data` holds.
macro_rules! dispatch {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            ArrayData::Bool($arr) => $body,
            ArrayData::I8($arr) => $body,
            ArrayData::I16($arr) => $body,
            ArrayData::I32($arr) => $body,
            ArrayData::I64($arr) => $body,
            ArrayData::U8($arr) => $body,
            ArrayData::U16($arr) => $body,
            ArrayData::U32($arr) => $body,
            ArrayData::U64($arr) => $body,
            ArrayData::F32($arr) => $body,
            ArrayData::F64($arr) => $body,
            ArrayData::Object($arr) => $body,
        }
    };
}

impl ArrayData {
    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::Bool(_) => DType::Bool,
            ArrayData::I8(_) => DType::I8,
            ArrayData::I16(_) => DType::I16,
            ArrayData::I32(_) => DType::I32,
            ArrayData::I64(_) => DType::I64,
            ArrayData::U8(_) => DType::U8,
            ArrayData::U16(_) => DType::U16,
            ArrayData::U32(_) => DType::U32,
            ArrayData::U64(_) => DType::U64,
            ArrayData::F32(_) => DType::F32,
            ArrayData::F64(_) => DType::F64,
            ArrayData::Object(_) => DType::Object,
        }
    }

    pub fn shape(&self) -> &[usize] {
        dispatch!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        dispatch!(self, a => a.ndim())
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        dispatch!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the inner array if it holds elements of type `T`.
    pub fn view<T: Element>(&self) -> Option<&ArrayD<T>> {
        T::peel(self)
    }

    /// Unwraps the inner array if it holds elements of type `T`, otherwise
    /// hands `self` back unchanged.
    pub fn into_array<T: Element>(self) -> Result<ArrayD<T>, ArrayData> {
        T::peel_owned(self)
    }
}

impl<T: Element, D: Dimension> From<Array<T, D>> for ArrayData {
    fn from(array: Array<T, D>) -> Self {
        T::wrap(array.into_dyn())
    }
}

// --- Element Trait ---

mod sealed {
    pub trait Sealed {}
}

/// Element types an [`ArrayData`] can hold.
pub trait Element: Clone + sealed::Sealed + Sized {
    const DTYPE: DType;

    fn wrap(array: ArrayD<Self>) -> ArrayData;

    fn peel(data: &ArrayData) -> Option<&ArrayD<Self>>;

    fn peel_owned(data: ArrayData) -> Result<ArrayD<Self>, ArrayData>;
}

macro_rules! impl_element {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const DTYPE: DType = DType::$variant;

                fn wrap(array: ArrayD<Self>) -> ArrayData {
                    ArrayData::$variant(array)
                }

                fn peel(data: &ArrayData) -> Option<&ArrayD<Self>> {
                    match data {
                        ArrayData::$variant(a) => Some(a),
                        _ => None,
                    }
                }

                fn peel_owned(data: ArrayData) -> Result<ArrayD<Self>, ArrayData> {
                    match data {
                        ArrayData::$variant(a) => Ok(a),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_element! {
    Bool => bool,
    I8 => i8,
    I16 => i16,
    I32 => i32,
    I64 => i64,
    U8 => u8,
    U16 => u16,
    U32 => u32,
    U64 => u64,
    F32 => f32,
    F64 => f64,
    Object => ObjectValue,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn from_fixed_dim_array_keeps_shape_and_dtype() {
        let data = ArrayData::from(array![[1i32, 2], [3, 4], [5, 6]]);
        assert_eq!(data.dtype(), DType::I32);
        assert_eq!(data.shape(), &[3, 2]);
        assert_eq!(data.len(), 6);
        assert_eq!(data.ndim(), 2);
    }

    #[test]
    fn view_and_into_array_check_element_type() {
        let data = ArrayData::from(array![1.5f64, 2.5]);
        assert!(data.view::<f32>().is_none());
        assert_eq!(data.view::<f64>().map(|a| a.len()), Some(2));

        let data = data.into_array::<i64>().unwrap_err();
        let arr = data.into_array::<f64>().unwrap();
        assert_eq!(arr.as_slice(), Some(&[1.5, 2.5][..]));
    }

    #[test]
    fn object_values_display() {
        let v = ObjectValue::from(vec![ObjectValue::Int(1), "a".into(), ObjectValue::Null]);
        assert_eq!(v.to_string(), "[1, \"a\", None]");
        assert_eq!(ObjectValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(DType::Object.to_string(), "object");
    }
}
