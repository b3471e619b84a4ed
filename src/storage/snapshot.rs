use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::NewsboyResult;
use crate::storage::ItemCache;

/// Write the cache's delivered items to `path`, replacing any previous snapshot.
///
/// The dump goes to a sibling temp file first and is renamed into place, so
/// a failed save leaves the old snapshot intact. Returns the number of items
/// written.
pub fn save<P: AsRef<Path>>(cache: &ItemCache, path: P) -> NewsboyResult<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let (encoded, count) = cache.dump_counted()?;

    let tmp_path = temp_path(path);
    let written = write_file(&tmp_path, encoded.as_bytes());
    if let Err(e) = written.and_then(|_| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    Ok(count)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(contents)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

/// Merge a snapshot written by [`save`] into the cache.
pub fn restore<P: AsRef<Path>>(cache: &ItemCache, path: P) -> NewsboyResult<usize> {
    let file = File::open(path)?;
    cache.load_from(file)
}
