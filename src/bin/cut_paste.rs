use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use cutpaste::dataset::data_augmenters::batch::{run_batch, BatchJob};
use cutpaste::dataset::data_augmenters::cut_paste::augment;
use cutpaste::dataset::data_loaders::yolo_dataset_loader::{
    load_labeled_image, save_labeled_image, YoloSample,
};
use cutpaste::helpers::img_drawing::draw_boxes;
use cutpaste::AugmentConfig;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Cut labeled objects out of one image and blend them into another"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Augment a single source/destination pair
    Pair(PairArgs),
    /// Augment pairs drawn from a dataset split until enough outputs exist
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct AugmentArgs {
    /// JSON file with blend_weight, max_attempts and anchor_same_class
    #[arg(long)]
    config: Option<PathBuf>,

    /// Weight of the pasted patch in the blended pixels
    #[arg(long)]
    blend_weight: Option<f32>,

    /// Horizontal positions tried per patch before giving up
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Place patches at a random height even when a same-class object exists
    #[arg(long)]
    no_anchor: bool,

    /// Seed for reproducible placements
    #[arg(long)]
    seed: Option<u64>,
}

impl AugmentArgs {
    fn augment_config(&self) -> Result<AugmentConfig> {
        let mut config = match &self.config {
            Some(path) => AugmentConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => AugmentConfig::default(),
        };
        if let Some(blend_weight) = self.blend_weight {
            config.blend_weight = blend_weight;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.max_attempts = max_attempts;
        }
        if self.no_anchor {
            config.anchor_same_class = false;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
struct PairArgs {
    #[arg(long)]
    source_image: PathBuf,
    #[arg(long)]
    source_labels: PathBuf,
    #[arg(long)]
    dest_image: PathBuf,
    #[arg(long)]
    dest_labels: PathBuf,
    #[arg(long, default_value = "cut_paste_output_image.jpg")]
    output_image: PathBuf,
    #[arg(long, default_value = "cut_paste_output_image.txt")]
    output_labels: PathBuf,
    /// Also write a copy of the output with its boxes drawn
    #[arg(long)]
    preview: Option<PathBuf>,
    #[command(flatten)]
    augment: AugmentArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Dataset root holding images/<split> and labels/<split>
    #[arg(long, default_value = "dataset")]
    dataset_root: PathBuf,
    #[arg(long, default_value = "train")]
    split: String,
    #[arg(long)]
    output_dir: PathBuf,
    /// Number of augmented pairs to write
    #[arg(long, default_value = "1")]
    num_pairs: usize,
    /// Augment independent pairs on all cores
    #[arg(long)]
    parallel: bool,
    #[command(flatten)]
    augment: AugmentArgs,
}

fn run_pair(args: PairArgs) -> Result<()> {
    let config = args.augment.augment_config()?;
    let source = YoloSample {
        image_path: args.source_image,
        label_path: args.source_labels,
    };
    let destination = YoloSample {
        image_path: args.dest_image,
        label_path: args.dest_labels,
    };
    let source_image = load_labeled_image(&source)
        .with_context(|| format!("failed to load source {}", source.image_path.display()))?;
    let destination_image = load_labeled_image(&destination).with_context(|| {
        format!(
            "failed to load destination {}",
            destination.image_path.display()
        )
    })?;

    let seed = args.augment.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let result = augment(
        &source_image,
        &destination_image,
        &config.placement_params(),
        &mut rng,
    );
    info!(
        "{} of {} patches placed (seed {})",
        result.placed_count(),
        source_image.boxes.len(),
        seed
    );

    let augmented = result.into_labeled_image();
    save_labeled_image(&args.output_image, &args.output_labels, &augmented)
        .with_context(|| format!("failed to write {}", args.output_image.display()))?;
    info!("Augmented image saved to {}", args.output_image.display());

    if let Some(preview) = args.preview {
        let mut img = augmented.image.clone();
        draw_boxes(&mut img, &augmented.boxes);
        img.save(&preview)
            .with_context(|| format!("failed to write preview {}", preview.display()))?;
        info!("Preview saved to {}", preview.display());
    }
    Ok(())
}

fn run_batch_command(args: BatchArgs) -> Result<()> {
    let config = args.augment.augment_config()?;
    let job = BatchJob {
        dataset_root: args.dataset_root,
        split: args.split,
        output_dir: args.output_dir,
        num_pairs: args.num_pairs,
        seed: args.augment.seed,
        parallel: args.parallel,
        params: config.placement_params(),
    };
    let report = run_batch(&job).context("cut-paste batch failed")?;
    info!(
        "Wrote {} augmented pairs to {} ({} failed, {} without placement, seed {})",
        report.written.len(),
        job.output_dir.display(),
        report.failed,
        report.skipped_no_placement,
        report.seed
    );
    if report.written.is_empty() && job.num_pairs > 0 {
        bail!("no augmented pair could be produced");
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Pair(args) => run_pair(args),
        Command::Batch(args) => run_batch_command(args),
    }
}
