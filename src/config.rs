use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// All parameters of a preparation run.
///
/// Defaults match the dataset this tool was written for: three `words_part_*`
/// folders under the base directory, the manifest `gt.txt` inside the first
/// of them, the `Bangla`/`Chinese`/`Symbols` classes dropped, and a 70/30
/// training/testing split.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrepConfig {
    /// Root of the dataset tree; part directories and the output
    /// `training`/`testing` partitions live directly under it.
    pub base_dir: PathBuf,

    /// Source folders scanned for images, in probe order.
    pub part_dirs: Vec<String>,

    /// Manifest file name, resolved under the first part directory.
    pub manifest_name: String,

    /// Labels whose records and images are removed (exact case match).
    pub disallowed_labels: BTreeSet<String>,

    /// Fraction of each label's images that goes to training, in (0, 1).
    pub train_ratio: f64,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::new(),
            part_dirs: vec![
                "words_part_1".to_string(),
                "words_part_2".to_string(),
                "words_part_3".to_string(),
            ],
            manifest_name: "gt.txt".to_string(),
            disallowed_labels: ["Bangla", "Chinese", "Symbols"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            train_ratio: 0.7,
        }
    }
}

impl PrepConfig {
    /// Load defaults overridden by a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: PrepConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    /// Path of the manifest: `<base_dir>/<first part dir>/<manifest_name>`.
    pub fn manifest_path(&self) -> PathBuf {
        self.base_dir.join(&self.part_dirs[0]).join(&self.manifest_name)
    }

    /// Absolute paths of the part directories, in probe order.
    pub fn part_paths(&self) -> Vec<PathBuf> {
        self.part_dirs.iter().map(|d| self.base_dir.join(d)).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_dir.as_os_str().is_empty() {
            bail!("base_dir must be set");
        }
        if self.part_dirs.is_empty() {
            bail!("part_dirs must name at least one source folder");
        }
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            bail!(
                "train_ratio must be strictly between 0 and 1, got {}",
                self.train_ratio
            );
        }
        Ok(())
    }
}
