use std::fs;

use camino::Utf8Path;

use crate::error::HerbariumError;

/// Filesystem primitives the placement engine relies on. A trait seam so
/// tests can observe or stub the side effects.
pub trait FileOps {
    fn exists(&self, path: &Utf8Path) -> bool;
    /// Creates the directory (and parents) when absent. Returns whether a
    /// creation happened, so callers can log it.
    fn ensure_dir(&self, path: &Utf8Path) -> Result<bool, HerbariumError>;
    fn copy_file(&self, source: &Utf8Path, dest: &Utf8Path) -> Result<(), HerbariumError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFileOps;

impl FileOps for SystemFileOps {
    fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().exists()
    }

    fn ensure_dir(&self, path: &Utf8Path) -> Result<bool, HerbariumError> {
        if path.as_std_path().exists() {
            return Ok(false);
        }
        fs::create_dir_all(path.as_std_path())
            .map_err(|err| HerbariumError::Filesystem(format!("create {path}: {err}")))?;
        Ok(true)
    }

    /// Stages the copy through a temp file in the destination directory and
    /// persists by rename, so an interrupted copy never leaves a half-written
    /// destination file.
    fn copy_file(&self, source: &Utf8Path, dest: &Utf8Path) -> Result<(), HerbariumError> {
        let parent = dest
            .parent()
            .ok_or_else(|| HerbariumError::Filesystem(format!("invalid destination {dest}")))?;
        let temp = tempfile::Builder::new()
            .prefix("herbarium-copy")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| HerbariumError::Filesystem(err.to_string()))?;
        fs::copy(source.as_std_path(), temp.path())
            .map_err(|err| HerbariumError::Filesystem(format!("copy {source}: {err}")))?;
        if dest.as_std_path().exists() {
            fs::remove_file(dest.as_std_path())
                .map_err(|err| HerbariumError::Filesystem(err.to_string()))?;
        }
        temp.persist(dest.as_std_path())
            .map_err(|err| HerbariumError::Filesystem(err.to_string()))?;
        Ok(())
    }
}
