use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::errors::{BenchlogError, BenchlogResult};

/// Creates `dir` and any missing parents. An existing directory is fine.
pub fn ensure_dir(dir: &Path) -> BenchlogResult<()> {
    fs::create_dir_all(dir).map_err(|source| BenchlogError::StorageUnavailable {
        path: dir.to_path_buf(),
        source,
    })
}

/// Appends `line` plus a newline to `path`, creating the file if needed.
///
/// The file is opened in append mode and the terminated line goes out in a
/// single buffer, so concurrent appenders land whole lines one after another.
pub fn append_line(path: &Path, line: &str) -> BenchlogResult<()> {
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| BenchlogError::AppendFailed {
            path: path.to_path_buf(),
            source,
        })?;

    file.write_all(&buf)
        .map_err(|source| BenchlogError::AppendFailed {
            path: path.to_path_buf(),
            source,
        })
}
