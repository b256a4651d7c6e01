//! # Artifact Store
//!
//! Persistence helpers for ML pipelines: YAML config documents, opaque
//! bincode artifacts (fitted models, encoders), typed n-dimensional arrays and
//! column removal for arrow tables, all behind one [`ArtifactStore`] facade.
//!
//! ```no_run
//! use artifact_store::{ArrayData, ArtifactStore, OverwritePolicy};
//! use ndarray::array;
//!
//! # fn main() -> artifact_store::Result<()> {
//! let store = ArtifactStore::new();
//! let schema = store.read_config("config/schema.yaml")?;
//! store.write_config("artifacts/schema.yaml", &schema, OverwritePolicy::Replace)?;
//! store.save_array("artifacts/train.arr", &ArrayData::from(array![[1i32, 2], [3, 4]]))?;
//! let train = store.load_array("artifacts/train.arr")?;
//! assert_eq!(train.shape(), &[2, 2]);
//! # Ok(())
//! # }
//! ```

pub mod array;
pub mod document;
pub mod error;
pub mod store;
pub mod table;
mod utils;

pub use array::{ArrayData, DType, Element, ObjectArrays, ObjectValue};
pub use document::{Document, OverwritePolicy};
pub use error::{ErrorKind, Operation, Result, SerializationError, StoreError};
pub use store::{
    ArtifactStore, EventSink, LogSink, MemorySink, NullSink, RecordedEvent, StoreConfig,
    StoreEvent,
};
pub use table::MissingColumns;
