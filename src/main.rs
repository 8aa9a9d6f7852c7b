mod config;
mod data;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use config::PrepConfig;
use data::filter::remove_unwanted_images;
use data::split::split_dataset;

/// Filter unwanted label classes out of an OCR word-image dataset, then
/// stratify what remains into training/testing trees.
#[derive(Debug, Parser)]
#[command(name = "word-wrangler", version)]
struct Args {
    /// Dataset root containing the words_part_* folders.
    #[arg(long)]
    base_dir: PathBuf,

    /// Optional JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Training fraction per label, strictly between 0 and 1.
    #[arg(long)]
    train_ratio: Option<f64>,

    /// Label to drop (repeatable); replaces the default disallowed set.
    #[arg(long = "drop-label")]
    drop_labels: Vec<String>,

    /// Seed for the per-label shuffle; omit for a non-reproducible run.
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<(PrepConfig, Option<u64>)> {
        let mut cfg = match &self.config {
            Some(path) => PrepConfig::from_json_file(path)?,
            None => PrepConfig::default(),
        };
        cfg.base_dir = self.base_dir;
        if let Some(ratio) = self.train_ratio {
            cfg.train_ratio = ratio;
        }
        if !self.drop_labels.is_empty() {
            cfg.disallowed_labels = self.drop_labels.into_iter().collect();
        }
        cfg.validate()?;
        Ok((cfg, self.seed))
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let (cfg, seed) = Args::parse().into_config()?;
    run(&cfg, seed)
}

/// Run both passes in order. The filter pass persists its manifest rewrite
/// before the split pass reads it.
fn run(cfg: &PrepConfig, seed: Option<u64>) -> Result<()> {
    let filter_report = remove_unwanted_images(cfg)?;
    info!(
        "Filter pass: kept {}, dropped {}, deleted {} files ({} unparseable lines left alone)",
        filter_report.kept,
        filter_report.dropped,
        filter_report.deleted_files,
        filter_report.skipped
    );

    let split_report = match seed {
        Some(s) => split_dataset(cfg, &mut StdRng::seed_from_u64(s))?,
        None => split_dataset(cfg, &mut rand::thread_rng())?,
    };
    for (label, (train, test)) in &split_report.per_label {
        info!("Split {label}: {train} training / {test} testing");
    }
    info!("Split pass: moved {} files", split_report.total_moved());
    Ok(())
}
