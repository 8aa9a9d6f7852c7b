/// Data layer: manifest parsing and the two dataset passes.
///
/// Pipeline:
/// ```text
///  <base>/words_part_1/gt.txt
///        │
///        ▼
///   ┌──────────┐
///   │ manifest  │  capped 3-field split → records / label mapping
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  drop disallowed labels, delete their images,
///   └──────────┘  rewrite gt.txt atomically
///        │
///        ▼
///   ┌──────────┐
///   │  split    │  group by lowercased label, shuffle, move into
///   └──────────┘  training/<label> and testing/<label>
/// ```
///
/// The filter pass persists its manifest rewrite before the split pass reads
/// it; the manifest is the authoritative record of what remains.

pub mod filter;
pub mod manifest;
pub mod split;
