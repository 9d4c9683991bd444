//! Directory relocation
//!
//! A move is a rename when source and destination share a filesystem; when
//! the rename fails (e.g. across volumes) the tree is copied and the source
//! removed afterwards.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{AcquireError, Result};

/// Move directory `from` to `to`
///
/// `to` must not exist; its parent is created if needed.
pub async fn move_dir(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    match tokio::fs::rename(from, to).await {
        Ok(()) => {
            debug!(from = %from.display(), to = %to.display(), "directory renamed");
            Ok(())
        }
        Err(rename_err) => {
            warn!(
                from = %from.display(),
                to = %to.display(),
                error = %rename_err,
                "rename failed, falling back to copy + delete"
            );
            let (src, dst) = (from.to_path_buf(), to.to_path_buf());
            tokio::task::spawn_blocking(move || copy_then_remove(&src, &dst))
                .await
                .map_err(|e| AcquireError::Relocate {
                    from: from.to_path_buf(),
                    to: to.to_path_buf(),
                    source: std::io::Error::other(e),
                })?
        }
    }
}

fn copy_then_remove(from: &Path, to: &Path) -> Result<()> {
    let relocate_err = |source: std::io::Error| AcquireError::Relocate {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    copy_tree(from, to).map_err(relocate_err)?;
    std::fs::remove_dir_all(from).map_err(relocate_err)?;
    Ok(())
}

/// Recursively copy `from` into a new directory `to`
pub fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(std::io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(std::io::Error::other)?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
