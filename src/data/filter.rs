use std::collections::BTreeSet;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::config::PrepConfig;
use super::manifest::{parse_line, read_raw_lines, trim_terminator, write_raw_lines};

// ---------------------------------------------------------------------------
// Filter pass: drop disallowed label classes
// ---------------------------------------------------------------------------

/// What the filter pass did, for the caller's summary log.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// Records kept in the manifest.
    pub kept: usize,
    /// Records dropped because their label was disallowed.
    pub dropped: usize,
    /// Malformed lines skipped (kept out of both counts, left in the
    /// manifest untouched).
    pub skipped: usize,
    /// Image files actually deleted from the source folders.
    pub deleted_files: usize,
}

/// Remove every record whose label is in `config.disallowed_labels`, delete
/// the corresponding images from every source folder they are found in, and
/// rewrite the manifest with only the surviving lines.
///
/// Retained lines are written back byte-for-byte in their original order.
/// The rewrite happens last and goes through a temp-file rename, so the
/// manifest is either fully old or fully new. Labels match exactly
/// (case-sensitive); a scheduled image missing from a folder is expected —
/// each image lives in only one of them.
pub fn remove_unwanted_images(config: &PrepConfig) -> Result<FilterReport> {
    let manifest_path = config.manifest_path();
    let raw_lines = read_raw_lines(&manifest_path)?;

    let mut report = FilterReport::default();
    let mut images_to_remove: BTreeSet<String> = BTreeSet::new();
    let mut retained: Vec<String> = Vec::with_capacity(raw_lines.len());

    for (line_no, raw) in raw_lines.into_iter().enumerate() {
        let line = trim_terminator(&raw);
        if line.is_empty() {
            retained.push(raw);
            continue;
        }
        match parse_line(line, line_no) {
            Ok(rec) => {
                if config.disallowed_labels.contains(&rec.label) {
                    info!("Scheduled removal of {} labeled as {}", rec.image_name, rec.label);
                    images_to_remove.insert(rec.image_name);
                    report.dropped += 1;
                } else {
                    retained.push(raw);
                    report.kept += 1;
                }
            }
            Err(e) => {
                warn!("{}: keeping unparseable {e}", manifest_path.display());
                retained.push(raw);
                report.skipped += 1;
            }
        }
    }

    // Probe every folder for every scheduled image. Deletion failures other
    // than absence are real filesystem errors and abort the pass.
    for folder in config.part_paths() {
        for image_name in &images_to_remove {
            let image_path = folder.join(image_name);
            if image_path.exists() {
                std::fs::remove_file(&image_path)
                    .with_context(|| format!("deleting {}", image_path.display()))?;
                info!("Removed {}", image_path.display());
                report.deleted_files += 1;
            } else {
                info!("File {} not found in {}", image_name, folder.display());
            }
        }
    }

    write_raw_lines(&manifest_path, &retained)?;
    Ok(report)
}
