//! # Filesystem Helpers
//!
//! File handles opened here are wrapped in buffered readers/writers owned by
//! the caller's scope, so they are closed on every return path.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

/// Creates the parent directory of `path` (recursively) if it has one.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Removes `path` if it exists. Returns whether a file was removed.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Opens `path` for buffered reading and returns its length in bytes, which
/// decoders use as an upper bound on what they may read.
pub fn open_reader(path: &Path) -> io::Result<(BufReader<File>, u64)> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    Ok((BufReader::new(file), len))
}

/// Creates (or truncates) `path` for writing.
pub fn create_writer(path: &Path) -> io::Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Flushes a writer so buffered write errors are reported instead of being
/// lost on drop.
pub fn finish(mut writer: BufWriter<File>) -> io::Result<()> {
    writer.flush()
}
