use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::PrepConfig;
use super::manifest::label_mapping;

// ---------------------------------------------------------------------------
// Split pass: stratified train/test partition per label
// ---------------------------------------------------------------------------

/// Per-label outcome of the split pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SplitReport {
    /// label -> (files moved to training, files moved to testing).
    pub per_label: BTreeMap<String, (usize, usize)>,
}

impl SplitReport {
    pub fn total_moved(&self) -> usize {
        self.per_label.values().map(|(tr, te)| tr + te).sum()
    }
}

/// Partition every manifest-referenced image into `training/<label>` and
/// `testing/<label>` under the base directory.
///
/// Each label is split independently: its gathered paths are shuffled with
/// `rng`, the first `floor(count * train_ratio)` go to training and the rest
/// to testing, each moved by `fs::rename` with its file name preserved.
/// Label directories are created in both partitions even when a label ends
/// up with no files. Part-directory files absent from the manifest mapping
/// (filtered out, or stray) are left in place.
///
/// The generic `rng` is the reproducibility seam: production passes a thread
/// RNG, tests a seeded `StdRng`.
pub fn split_dataset<R: Rng>(config: &PrepConfig, rng: &mut R) -> Result<SplitReport> {
    let mapping = label_mapping(&config.manifest_path())?;

    // One bucket per distinct (lowercased) label, even if no file matches.
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for label in mapping.values() {
        groups.entry(label.clone()).or_default();
    }

    for part_path in config.part_paths() {
        let entries = std::fs::read_dir(&part_path)
            .with_context(|| format!("listing {}", part_path.display()))?;

        // Sort by name so a seeded run gathers in a stable order.
        let mut names: Vec<String> = Vec::new();
        let mut unmapped = 0usize;
        for entry in entries {
            let entry = entry.with_context(|| format!("reading entry in {}", part_path.display()))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        for name in names {
            match mapping.get(&name) {
                Some(label) => groups
                    .entry(label.clone())
                    .or_default()
                    .push(part_path.join(&name)),
                None => unmapped += 1,
            }
        }
        debug!("{}: {unmapped} files not in the manifest, left in place", part_path.display());
    }

    let train_dir = config.base_dir.join("training");
    let test_dir = config.base_dir.join("testing");
    std::fs::create_dir_all(&train_dir)
        .with_context(|| format!("creating {}", train_dir.display()))?;
    std::fs::create_dir_all(&test_dir)
        .with_context(|| format!("creating {}", test_dir.display()))?;

    let mut report = SplitReport::default();
    for (label, mut files) in groups {
        info!("Processing label: {label}, number of files: {}", files.len());

        files.shuffle(rng);
        let split_point = (files.len() as f64 * config.train_ratio).floor() as usize;
        let test_files = files.split_off(split_point);
        let train_files = files;

        let train_label_dir = train_dir.join(&label);
        let test_label_dir = test_dir.join(&label);
        std::fs::create_dir_all(&train_label_dir)
            .with_context(|| format!("creating {}", train_label_dir.display()))?;
        std::fs::create_dir_all(&test_label_dir)
            .with_context(|| format!("creating {}", test_label_dir.display()))?;

        move_all(&train_files, &train_label_dir)?;
        move_all(&test_files, &test_label_dir)?;

        report
            .per_label
            .insert(label, (train_files.len(), test_files.len()));
    }

    Ok(report)
}

/// Relocate each file into `dest_dir`, keeping its file name.
fn move_all(files: &[PathBuf], dest_dir: &std::path::Path) -> Result<()> {
    for src in files {
        let name = src
            .file_name()
            .with_context(|| format!("{} has no file name", src.display()))?;
        let dest = dest_dir.join(name);
        std::fs::rename(src, &dest)
            .with_context(|| format!("moving {} to {}", src.display(), dest.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;
    use std::path::Path;

    fn setup(manifest: &str, files: &[(&str, &str)]) -> (tempfile::TempDir, PrepConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = PrepConfig {
            base_dir: dir.path().to_path_buf(),
            ..PrepConfig::default()
        };
        for part in config.part_paths() {
            std::fs::create_dir_all(part).unwrap();
        }
        std::fs::write(config.manifest_path(), manifest).unwrap();
        for (part, name) in files {
            std::fs::write(dir.path().join(part).join(name), b"px").unwrap();
        }
        (dir, config)
    }

    fn names_in(dir: &Path) -> BTreeSet<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn ten_english_images_split_seven_three() {
        let mut manifest = String::new();
        let mut files = Vec::new();
        let names: Vec<String> = (0..10).map(|i| format!("w{i:03}.png")).collect();
        for (i, name) in names.iter().enumerate() {
            manifest.push_str(&format!("{name},English,word{i}\n"));
            // spread across the three parts
            files.push((["words_part_1", "words_part_2", "words_part_3"][i % 3], name.as_str()));
        }
        let (dir, config) = setup(&manifest, &files);

        let mut rng = StdRng::seed_from_u64(7);
        let report = split_dataset(&config, &mut rng).unwrap();

        assert_eq!(report.per_label["english"], (7, 3));
        let train = names_in(&dir.path().join("training").join("english"));
        let test = names_in(&dir.path().join("testing").join("english"));
        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);
        // disjoint and exhaustive
        assert!(train.is_disjoint(&test));
        let union: BTreeSet<_> = train.union(&test).cloned().collect();
        assert_eq!(union, names.iter().cloned().collect());
        // gt.txt itself is not an image and stays put
        assert!(config.manifest_path().exists());
    }

    #[test]
    fn train_count_is_floor_of_ratio_for_every_label() {
        let mut manifest = String::new();
        let mut files = Vec::new();
        let sizes = [("greek", 5usize), ("latin", 9), ("english", 1)];
        let mut all_names = Vec::new();
        for (label, n) in sizes {
            for i in 0..n {
                let name = format!("{label}_{i}.png");
                manifest.push_str(&format!("{name},{label},t\n"));
                all_names.push(name);
            }
        }
        for name in &all_names {
            files.push(("words_part_1", name.as_str()));
        }
        let (_dir, config) = setup(&manifest, &files);

        let mut rng = StdRng::seed_from_u64(99);
        let report = split_dataset(&config, &mut rng).unwrap();

        for (label, n) in sizes {
            let (train, test) = report.per_label[label];
            assert_eq!(train, (n as f64 * 0.7).floor() as usize, "label {label}");
            assert_eq!(train + test, n, "label {label}");
        }
    }

    #[test]
    fn single_file_label_lands_in_testing() {
        let (dir, config) = setup(
            "only.png,Rare,one of a kind\n",
            &[("words_part_2", "only.png")],
        );

        let mut rng = StdRng::seed_from_u64(0);
        let report = split_dataset(&config, &mut rng).unwrap();

        assert_eq!(report.per_label["rare"], (0, 1));
        assert!(dir.path().join("testing").join("rare").join("only.png").exists());
        assert!(!dir.path().join("words_part_2").join("only.png").exists());
    }

    #[test]
    fn labels_with_no_files_still_get_both_directories() {
        // manifest references an image that no part dir holds
        let (dir, config) = setup("phantom.png,Cyrillic,missing\n", &[]);

        let mut rng = StdRng::seed_from_u64(1);
        let report = split_dataset(&config, &mut rng).unwrap();

        assert_eq!(report.per_label["cyrillic"], (0, 0));
        assert!(dir.path().join("training").join("cyrillic").is_dir());
        assert!(dir.path().join("testing").join("cyrillic").is_dir());
    }

    #[test]
    fn unmapped_files_are_left_in_place() {
        let (dir, config) = setup(
            "kept.png,English,hello\n",
            &[("words_part_1", "kept.png"), ("words_part_1", "stray.png")],
        );

        let mut rng = StdRng::seed_from_u64(2);
        split_dataset(&config, &mut rng).unwrap();

        assert!(dir.path().join("words_part_1").join("stray.png").exists());
        assert!(!dir.path().join("words_part_1").join("kept.png").exists());
    }

    #[test]
    fn missing_part_directory_is_fatal() {
        let (dir, config) = setup("a.png,English,hi\n", &[]);
        std::fs::remove_dir(dir.path().join("words_part_3")).unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        assert!(split_dataset(&config, &mut rng).is_err());
    }

    #[test]
    fn rerun_over_split_tree_finds_empty_groups() {
        // The pass only scans the original part dirs, so a second run sees
        // nothing to move and must not duplicate anything.
        let (dir, config) = setup(
            "a.png,English,1\nb.png,English,2\nc.png,English,3\n",
            &[
                ("words_part_1", "a.png"),
                ("words_part_1", "b.png"),
                ("words_part_1", "c.png"),
            ],
        );

        let mut rng = StdRng::seed_from_u64(4);
        let first = split_dataset(&config, &mut rng).unwrap();
        assert_eq!(first.per_label["english"], (2, 1));

        let second = split_dataset(&config, &mut rng).unwrap();
        assert_eq!(second.per_label["english"], (0, 0));

        let train = names_in(&dir.path().join("training").join("english"));
        let test = names_in(&dir.path().join("testing").join("english"));
        assert_eq!(train.len() + test.len(), 3);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let manifest = "a.png,English,1\nb.png,English,2\nc.png,English,3\nd.png,English,4\n";
        let files = [
            ("words_part_1", "a.png"),
            ("words_part_1", "b.png"),
            ("words_part_2", "c.png"),
            ("words_part_3", "d.png"),
        ];

        let mut outcomes = Vec::new();
        for _ in 0..2 {
            let (dir, config) = setup(manifest, &files);
            let mut rng = StdRng::seed_from_u64(42);
            split_dataset(&config, &mut rng).unwrap();
            outcomes.push(names_in(&dir.path().join("training").join("english")));
        }
        assert_eq!(outcomes[0], outcomes[1]);
    }
}
