use anyhow::{Context, Result};
use clap::Parser;
use cutpaste::dataset::class_counts::{count_classes_in_folder, ClassCounts};
use cutpaste::dataset::data_loaders::yolo_dataset_loader::labels_dir;
use log::info;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Count labeled objects per class in the train and val splits")]
struct Args {
    #[arg(long, default_value = "dataset")]
    dataset_root: PathBuf,

    /// Splits to count, each read from labels/<split>
    #[arg(long, value_delimiter = ',', default_values = ["train", "val"])]
    splits: Vec<String>,

    /// Also write the counts as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

fn print_counts(split: &str, counts: &ClassCounts) {
    println!("Class counts in {} folder", split);
    for (id, name, count) in counts.rows() {
        println!("{:>3} {:<10} {:>8}", id, name, count);
    }
    if counts.unrecognized > 0 {
        println!("    {:<10} {:>8}", "unknown", counts.unrecognized);
    }
    println!("    {:<10} {:>8}\n", "total", counts.total());
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut all_counts = BTreeMap::new();
    for split in &args.splits {
        let dir = labels_dir(&args.dataset_root, split);
        let counts = count_classes_in_folder(&dir)
            .with_context(|| format!("failed to count labels in {}", dir.display()))?;
        print_counts(split, &counts);
        all_counts.insert(split.clone(), counts);
    }

    if let Some(json_path) = args.json {
        let file = File::create(&json_path)
            .with_context(|| format!("failed to create {}", json_path.display()))?;
        serde_json::to_writer_pretty(file, &all_counts)?;
        info!("Counts saved as {}", json_path.display());
    }
    Ok(())
}
