//! Dataset archive extraction

use std::fs::File;
use std::path::Path;

use tracing::debug;

use crate::error::{AcquireError, Result};

/// Unpack the zip archive at `archive` into `dest`
///
/// Any stale directory at `dest` is removed first so the extracted tree is
/// exactly the archive contents. Entries escaping `dest` are rejected by the
/// zip reader.
pub async fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let (archive_owned, dest_owned) = (archive.to_path_buf(), dest.to_path_buf());
    tokio::task::spawn_blocking(move || extract_blocking(&archive_owned, &dest_owned))
        .await
        .map_err(|e| AcquireError::Archive {
            dest: dest.to_path_buf(),
            message: format!("extraction task failed: {e}"),
        })?
}

fn extract_blocking(archive: &Path, dest: &Path) -> Result<()> {
    if dest.exists() {
        debug!(dest = %dest.display(), "removing stale download directory");
        std::fs::remove_dir_all(dest)?;
    }
    std::fs::create_dir_all(dest)?;

    let to_archive_error = |e: zip::result::ZipError| AcquireError::Archive {
        dest: dest.to_path_buf(),
        message: e.to_string(),
    };

    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(to_archive_error)?;
    let entries = zip.len();
    zip.extract(dest).map_err(to_archive_error)?;

    debug!(dest = %dest.display(), entries, "archive extracted");
    Ok(())
}
