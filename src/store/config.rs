//! # Store Configuration
//!
//! Settings an [`ArtifactStore`](super::ArtifactStore) is built from. Usually
//! embedded in a pipeline's own YAML config, but can also be loaded on its own.
//!
//! ```yaml
//! root: artifacts
//! object_arrays: allow
//! missing_columns: error
//! create_parents: true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::array::ObjectArrays;
use crate::table::MissingColumns;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Base directory for relative paths. `None` resolves against the process
    /// working directory.
    pub root: Option<PathBuf>,
    /// Load policy for object-typed arrays.
    pub object_arrays: ObjectArrays,
    /// Behaviour of `drop_columns` for names the table does not have.
    pub missing_columns: MissingColumns,
    /// Create missing parent directories before writing.
    pub create_parents: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            root: None,
            object_arrays: ObjectArrays::Allow,
            missing_columns: MissingColumns::Error,
            create_parents: true,
        }
    }
}

impl StoreConfig {
    /// Reads a config from a YAML file using a default store.
    #[track_caller]
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        crate::ArtifactStore::new().read_config_as(path)
    }

    pub fn with_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Joins relative paths onto `root`. Absolute paths are returned as is.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg: StoreConfig = serde_yaml::from_str("root: artifacts\nobject_arrays: reject\n").unwrap();
        assert_eq!(cfg.root.as_deref(), Some(Path::new("artifacts")));
        assert_eq!(cfg.object_arrays, ObjectArrays::Reject);
        assert_eq!(cfg.missing_columns, MissingColumns::Error);
        assert!(cfg.create_parents);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_yaml::from_str::<StoreConfig>("rooot: x\n");
        assert!(err.is_err());
    }

    #[test]
    fn resolve_only_touches_relative_paths() {
        let cfg = StoreConfig::default().with_root("/data/run1");
        assert_eq!(cfg.resolve(Path::new("model.bin")), PathBuf::from("/data/run1/model.bin"));
        assert_eq!(cfg.resolve(Path::new("/tmp/x.yaml")), PathBuf::from("/tmp/x.yaml"));
        assert_eq!(StoreConfig::default().resolve(Path::new("a/b")), PathBuf::from("a/b"));
    }
}
