//! Atomic file replacement (temp file + rename).

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Directory holding `path`; "." for a bare file name
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Write data to a file atomically using temp file + rename.
/// Readers see either the old contents or the new, never a partial file.
///
/// Every call writes its own uniquely named temp file next to `path`, so
/// concurrent writers never share one.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir)?;

    let prefix = format!(
        ".{}.",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );
    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)?;

    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    // Temp file is removed on drop if persisting fails
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
