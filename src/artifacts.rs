use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use md5::{Digest, Md5};

pub const SHOT_DIR: &str = "screenshots";

/// Deterministic debug-image name: 16-hex-char URL digest plus zero-padded
/// row (and optional column) indices. Filesystem-safe by construction.
pub fn image_name(url: &str, row: usize, col: Option<usize>) -> String {
    let digest = hex::encode(Md5::digest(url.as_bytes()));
    let prefix = &digest[..16];
    match col {
        Some(c) => format!("{}_{:03}_{:03}", prefix, row, c),
        None => format!("{}_{:03}", prefix, row),
    }
}

/// Write-once store for per-cell debug screenshots.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist raw image bytes as `<name>.png`, creating the directory on
    /// first use.
    pub fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.dir.join(format!("{}.png", name));
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

// ── Tests ──
