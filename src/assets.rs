//! Static and media directories.
//!
//! Both are plain recursive copies from a source root into a sub-directory of
//! the build tree named after their URL prefix (`/static/` → `build/static`).
//! The destination is replaced wholesale so files deleted upstream do not
//! linger in the bake. A missing source root means there is nothing to copy,
//! and the destination is left as it was.

use crate::config::AssetMount;
use crate::fsutil::{self, FilesystemError};

/// What happened to one asset directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetOutcome {
    Copied { files: usize },
    MissingSource,
    Skipped,
}

/// Replace `mount.dest` with a copy of `mount.root`.
pub fn copy_assets(mount: &AssetMount) -> Result<AssetOutcome, FilesystemError> {
    if !mount.root.is_dir() {
        log::debug!("asset root {} does not exist", mount.root.display());
        return Ok(AssetOutcome::MissingSource);
    }
    let files = fsutil::replace_dir(&mount.root, &mount.dest)?;
    log::debug!(
        "copied {files} files from {} to {}",
        mount.root.display(),
        mount.dest.display()
    );
    Ok(AssetOutcome::Copied { files })
}
