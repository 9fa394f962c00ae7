use anyhow::{Context, Result};
use clap::Parser;
use cutpaste::dataset::data_loaders::yolo_dataset_loader::{load_labeled_image, YoloSample};
use cutpaste::helpers::img_drawing::draw_boxes;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Draw the boxes of a YOLO label file onto its image")]
struct Args {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    labels: PathBuf,
    #[arg(long)]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let sample = YoloSample {
        image_path: args.image,
        label_path: args.labels,
    };
    let mut labeled = load_labeled_image(&sample)
        .with_context(|| format!("failed to load {}", sample.image_path.display()))?;
    draw_boxes(&mut labeled.image, &labeled.boxes);
    labeled
        .image
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        "Drew {} boxes into {}",
        labeled.boxes.len(),
        args.output.display()
    );
    Ok(())
}
