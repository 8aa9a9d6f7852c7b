//! Generate a miniature word-image dataset tree for exercising the pipeline:
//! three `words_part_*` folders with stub image files and a `gt.txt` mixing
//! allowed and disallowed labels, transcriptions with commas included.

use std::fs;
use std::path::PathBuf;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

const PART_DIRS: [&str; 3] = ["words_part_1", "words_part_2", "words_part_3"];
const LABELS: [&str; 6] = ["English", "Latin", "Greek", "Bangla", "Chinese", "Symbols"];
const WORDS: [&str; 8] = [
    "sample", "word", "quick", "brown", "image, cropped", "line", "glyph", "mixed, case",
];

fn main() {
    let base: PathBuf = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dataset".to_string())
        .into();
    let mut rng = StdRng::seed_from_u64(42);

    for part in PART_DIRS {
        fs::create_dir_all(base.join(part)).expect("Failed to create part directory");
    }

    let mut manifest = String::new();
    let mut image_count = 0usize;

    for (i, label) in LABELS.iter().cycle().take(60).enumerate() {
        let name = format!("word_{i:04}.png");
        let part = PART_DIRS.choose(&mut rng).unwrap();
        let transcription = WORDS.choose(&mut rng).unwrap();

        // A handful of random bytes stands in for pixel data.
        let bytes: Vec<u8> = (0..16).map(|_| rng.gen::<u8>()).collect();
        fs::write(base.join(part).join(&name), bytes).expect("Failed to write image stub");

        manifest.push_str(&format!("{name},{label},{transcription}\n"));
        image_count += 1;
    }

    let manifest_path = base.join(PART_DIRS[0]).join("gt.txt");
    fs::write(&manifest_path, manifest).expect("Failed to write gt.txt");

    println!(
        "Wrote {image_count} stub images across {} folders, manifest at {}",
        PART_DIRS.len(),
        manifest_path.display()
    );
}
