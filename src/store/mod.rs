//! # Artifact Store
//!
//! The facade pipeline code talks to. Each operation does one read or write,
//! reports the outcome to the store's [`EventSink`] and returns either the
//! result or a [`StoreError`] that records where in the caller it was invoked.

use arrow::record_batch::RecordBatch;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::array::{storage, ArrayData, ObjectArrays};
use crate::document::{self, Document, OverwritePolicy};
use crate::error::{ErrorKind, Operation, Result, StoreError};
use crate::table;
use crate::utils::{fs, serialization};

pub mod config;
pub mod sink;

pub use config::StoreConfig;
pub use sink::{EventSink, LogSink, MemorySink, NullSink, RecordedEvent, StoreEvent};

type Outcome<T> = std::result::Result<T, ErrorKind>;

/// Save/load operations for config documents, artifacts and arrays, plus
/// column removal for tables.
///
/// Holds no state besides its configuration and event sink; every call is
/// independent. Cheap to clone.
#[derive(Clone)]
pub struct ArtifactStore {
    config: StoreConfig,
    sink: Arc<dyn EventSink>,
}

impl fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactStore {
    /// A store with default settings that logs through the `log` facade.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        ArtifactStore {
            config,
            sink: Arc::new(LogSink),
        }
    }

    /// Replaces the event sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Path an operation on `path` would touch.
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.config.resolve(path.as_ref())
    }

    // --- Config Documents ---

    /// Reads a YAML file into an untyped [`Document`].
    #[track_caller]
    pub fn read_config<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        self.read_config_as(path)
    }

    /// Reads a YAML file into `T`. A document that does not fit `T` is a parse
    /// error.
    #[track_caller]
    pub fn read_config_as<T: DeserializeOwned, P: AsRef<Path>>(&self, path: P) -> Result<T> {
        let at = Location::caller();
        let path = self.resolve(path);
        // Only opening/reading the file is an I/O failure; bad UTF-8 or bad
        // YAML inside it is reported by the parser
        let outcome = std::fs::read(&path)
            .map_err(ErrorKind::from)
            .and_then(|bytes| document::parse(&bytes));
        self.report(Operation::ReadConfig, Some(&path), at, outcome, |_| None)
    }

    /// Writes `document` as YAML.
    ///
    /// With [`OverwritePolicy::Replace`] an existing file is removed first;
    /// with [`OverwritePolicy::Keep`] it is truncated and rewritten in place.
    /// The document is rendered before the target is touched, so a value that
    /// cannot be rendered leaves any existing file alone.
    #[track_caller]
    pub fn write_config<T, P>(&self, path: P, document: &T, policy: OverwritePolicy) -> Result<()>
    where
        T: Serialize + ?Sized,
        P: AsRef<Path>,
    {
        let at = Location::caller();
        let path = self.resolve(path);
        let outcome = self.write_config_inner(&path, document, policy);
        self.report(Operation::WriteConfig, Some(&path), at, outcome, |_| None)
    }

    fn write_config_inner<T: Serialize + ?Sized>(
        &self,
        path: &Path,
        document: &T,
        policy: OverwritePolicy,
    ) -> Outcome<()> {
        // Render first: nothing on disk changes if the document can't be rendered
        let text = document::render(document)?;

        // Replace unlinks the old file; Keep lets File::create truncate it
        if policy == OverwritePolicy::Replace && fs::remove_if_exists(path)? {
            log::trace!(target: "artifact_store", "removed existing {}", path.display());
        }

        self.prepare_target(path)?;
        let mut writer = fs::create_writer(path)?;
        std::io::Write::write_all(&mut writer, text.as_bytes())?;
        // Flush explicitly so a failed write is reported, not dropped
        fs::finish(writer)?;
        Ok(())
    }

    // --- Artifacts ---

    /// Serializes `value` to `path` with bincode.
    #[track_caller]
    pub fn save_artifact<T, P>(&self, path: P, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
        P: AsRef<Path>,
    {
        let at = Location::caller();
        let path = self.resolve(path);
        let outcome = self.prepare_target(&path).and_then(|()| {
            // Create (or truncate) the file and stream the encoding into it
            let mut writer = fs::create_writer(&path)?;
            serialization::encode_into(&mut writer, value)?;
            Ok(fs::finish(writer)?)
        });
        self.report(Operation::SaveArtifact, Some(&path), at, outcome, |_| None)
    }

    /// Deserializes a `T` from `path`. No type information is stored, so `T`
    /// must be the type that was saved.
    #[track_caller]
    pub fn load_artifact<T: DeserializeOwned, P: AsRef<Path>>(&self, path: P) -> Result<T> {
        let at = Location::caller();
        let path = self.resolve(path);
        // The file length caps how much the decoder may read or allocate
        let outcome = fs::open_reader(&path)
            .map_err(ErrorKind::from)
            .and_then(|(reader, len)| serialization::decode_from(reader, len));
        self.report(Operation::LoadArtifact, Some(&path), at, outcome, |_| None)
    }

    // --- Arrays ---

    /// Writes `array` in the store's binary array format.
    #[track_caller]
    pub fn save_array<P: AsRef<Path>>(&self, path: P, array: &ArrayData) -> Result<()> {
        let at = Location::caller();
        let path = self.resolve(path);
        let outcome = self.prepare_target(&path).and_then(|()| {
            // Header (dtype + shape) and flat data go out in one pass
            let mut writer = fs::create_writer(&path)?;
            storage::write_array(&mut writer, array)?;
            Ok(fs::finish(writer)?)
        });
        self.report(Operation::SaveArray, Some(&path), at, outcome, |_| {
            Some(describe_array(array))
        })
    }

    /// Loads an array using the store's configured object-array policy.
    #[track_caller]
    pub fn load_array<P: AsRef<Path>>(&self, path: P) -> Result<ArrayData> {
        self.load_array_with(path, self.config.object_arrays)
    }

    /// Loads an array with an explicit object-array policy.
    #[track_caller]
    pub fn load_array_with<P: AsRef<Path>>(&self, path: P, policy: ObjectArrays) -> Result<ArrayData> {
        let at = Location::caller();
        let path = self.resolve(path);
        // Same cap as artifacts: no length prefix can claim more than the file holds
        let outcome = fs::open_reader(&path)
            .map_err(ErrorKind::from)
            .and_then(|(mut reader, len)| storage::read_array(&mut reader, len, policy));
        self.report(Operation::LoadArray, Some(&path), at, outcome, |a| {
            Some(describe_array(a))
        })
    }

    // --- Tables ---

    /// Returns a copy of `table` without `columns`. Names the table lacks are
    /// handled according to the configured
    /// [`MissingColumns`](crate::MissingColumns) policy.
    #[track_caller]
    pub fn drop_columns(&self, table: &RecordBatch, columns: &[&str]) -> Result<RecordBatch> {
        let at = Location::caller();
        // Tables live in memory, so there is no path to report
        let outcome = table::drop_columns(table, columns, self.config.missing_columns);
        let before = table.num_columns();
        self.report(Operation::DropColumns, None, at, outcome, |t| {
            Some(format!("dropped {}, kept {}", before - t.num_columns(), t.num_columns()))
        })
    }

    // --- Helpers ---

    fn prepare_target(&self, path: &Path) -> Outcome<()> {
        if self.config.create_parents {
            fs::ensure_parent_dir(path)?;
        }
        Ok(())
    }

    /// Attaches call-site context to failures and tells the sink how the
    /// operation went.
    fn report<T>(
        &self,
        op: Operation,
        path: Option<&Path>,
        at: &'static Location<'static>,
        outcome: Outcome<T>,
        describe: impl FnOnce(&T) -> Option<String>,
    ) -> Result<T> {
        match outcome {
            Ok(value) => {
                // Detail is only computed for successes; failures carry the error
                let detail = describe(&value);
                self.sink.succeeded(&StoreEvent {
                    op,
                    path,
                    detail: detail.as_deref(),
                });
                Ok(value)
            }
            Err(kind) => {
                let err = StoreError::new(op, path, at, kind);
                self.sink.failed(&err);
                Err(err)
            }
        }
    }
}

fn describe_array(array: &ArrayData) -> String {
    format!("{} {:?}", array.dtype(), array.shape())
}
