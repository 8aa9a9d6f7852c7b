use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ManifestRecord – one line of gt.txt
// ---------------------------------------------------------------------------

/// A single ground-truth record: `image_name,label,transcription`.
///
/// The transcription is free text and may contain commas, so a line is split
/// on the first two commas only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    /// Base file name of the image (no directory component).
    pub image_name: String,
    /// Label as written in the manifest (case preserved).
    pub label: String,
    /// Remainder of the line, verbatim.
    pub transcription: String,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("line {line_no}: expected 3 comma-separated fields, got {found}")]
    MalformedLine { line_no: usize, found: usize },
}

/// Parse one manifest line into a record.
///
/// Splits on the first two commas; anything after the second comma is the
/// transcription, commas included. The caller passes the line without its
/// terminator.
pub fn parse_line(line: &str, line_no: usize) -> Result<ManifestRecord, ManifestError> {
    let mut fields = line.splitn(3, ',');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(image_name), Some(label), Some(transcription)) => Ok(ManifestRecord {
            image_name: image_name.to_string(),
            label: label.to_string(),
            transcription: transcription.to_string(),
        }),
        (a, b, _) => Err(ManifestError::MalformedLine {
            line_no,
            found: [a, b].iter().filter(|f| f.is_some()).count(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Raw line access
// ---------------------------------------------------------------------------

/// Read the manifest as raw lines, terminators included.
///
/// The filter pass must echo retained lines back byte-for-byte, so lines are
/// kept with whatever terminator they carried (`\n`, `\r\n`, or none on the
/// final line).
pub fn read_raw_lines(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    Ok(text.split_inclusive('\n').map(str::to_string).collect())
}

/// Strip the line terminator for parsing; the stored line keeps it.
pub fn trim_terminator(raw: &str) -> &str {
    raw.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(raw)
}

// ---------------------------------------------------------------------------
// Label mapping (split pass input)
// ---------------------------------------------------------------------------

/// Build the `image_name -> lowercased label` mapping the split pass works
/// from. Malformed lines are skipped with a warning.
pub fn label_mapping(path: &Path) -> Result<std::collections::BTreeMap<String, String>> {
    let mut mapping = std::collections::BTreeMap::new();
    for (line_no, raw) in read_raw_lines(path)?.iter().enumerate() {
        let line = trim_terminator(raw);
        if line.is_empty() {
            continue;
        }
        match parse_line(line, line_no) {
            Ok(rec) => {
                mapping.insert(rec.image_name, rec.label.to_lowercase());
            }
            Err(e) => log::warn!("{}: skipping {e}", path.display()),
        }
    }
    Ok(mapping)
}

// ---------------------------------------------------------------------------
// Atomic rewrite
// ---------------------------------------------------------------------------

/// Overwrite the manifest with `lines`, atomically.
///
/// Writes to a sibling temp file and renames it over the original, so a
/// crash mid-write never leaves a truncated manifest behind.
pub fn write_raw_lines(path: &Path, lines: &[String]) -> Result<()> {
    let tmp = match path.file_name() {
        Some(name) => {
            let mut tmp_name = name.to_os_string();
            tmp_name.push(".tmp");
            path.with_file_name(tmp_name)
        }
        None => path.with_extension("tmp"),
    };
    std::fs::write(&tmp, lines.concat())
        .with_context(|| format!("writing temp manifest {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("replacing manifest {}", path.display()))?;
    Ok(())
}
