//! # Table Helpers
//!
//! Column removal for arrow [`RecordBatch`]es.

use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// What `drop_columns` does when asked to drop a column the table lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingColumns {
    /// Fail with `ErrorKind::ColumnNotFound`.
    #[default]
    Error,
    /// Skip names that do not exist.
    Ignore,
}

/// Returns a new batch without the named columns. Remaining columns keep their
/// order and the row count is preserved, even when no column is left.
pub(crate) fn drop_columns(
    table: &RecordBatch,
    columns: &[&str],
    policy: MissingColumns,
) -> Result<RecordBatch, ErrorKind> {
    let schema = table.schema();

    // Under the strict policy every requested name must exist before anything is dropped
    if policy == MissingColumns::Error {
        if let Some(missing) = columns
            .iter()
            .find(|name| schema.column_with_name(name).is_none())
        {
            return Err(ErrorKind::ColumnNotFound {
                name: missing.to_string(),
                available: schema.fields().iter().map(|f| f.name().clone()).collect(),
            });
        }
    }

    // Indices of the surviving columns, in schema order
    let keep: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| !columns.contains(&field.name().as_str()))
        .map(|(i, _)| i)
        .collect();

    // project() shares the column buffers; an empty projection keeps num_rows
    Ok(table.project(&keep)?)
}
