use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// A build in progress writes artifacts into a sibling `<dir>.staging`
/// directory, then swaps it into place with directory renames on commit.
/// Readers of the published path either see the previous complete index or
/// the new complete index, never a half-written one.
#[derive(Debug)]
pub struct Staging {
    target: PathBuf,
    stage: PathBuf,
}

impl Staging {
    /// Start a fresh staging area next to `target`. A stale staging
    /// directory left by an interrupted build is cleared first.
    pub fn begin(target: &Path) -> Result<Self> {
        let stage = sibling(target, ".staging");
        if stage.exists() {
            log::debug!("clearing stale staging dir {}", stage.display());
            fs::remove_dir_all(&stage)?;
        }
        fs::create_dir_all(&stage)?;
        Ok(Self {
            target: target.to_path_buf(),
            stage,
        })
    }

    /// Where artifact writers should put their files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.stage
    }

    /// Swap the staged artifacts into place. The previous index is moved
    /// aside before the swap and restored if the swap itself fails.
    pub fn commit(self) -> Result<()> {
        let old = sibling(&self.target, ".old");
        if old.exists() {
            fs::remove_dir_all(&old)?;
        }
        let had_previous = self.target.exists();
        if had_previous {
            fs::rename(&self.target, &old)?;
        }
        if let Err(err) = fs::rename(&self.stage, &self.target) {
            if had_previous {
                let _ = fs::rename(&old, &self.target);
            }
            return Err(err.into());
        }
        if had_previous {
            if let Err(err) = fs::remove_dir_all(&old) {
                log::warn!("stale index left at {}: {}", old.display(), err);
            }
        }
        log::info!("published index at {}", self.target.display());
        Ok(())
    }

    /// Drop the staged artifacts, leaving any published index untouched.
    pub fn abort(self) {
        if let Err(err) = fs::remove_dir_all(&self.stage) {
            log::warn!(
                "failed to remove staging dir {}: {}",
                self.stage.display(),
                err
            );
        }
    }
}

fn sibling(target: &Path, suffix: &str) -> PathBuf {
    let name = target
        .file_name()
        .map_or_else(|| "index".to_string(), |n| n.to_string_lossy().into_owned());
    target.with_file_name(format!("{name}{suffix}"))
}
