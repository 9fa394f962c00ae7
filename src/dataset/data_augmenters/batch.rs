use crate::dataset::data_augmenters::cut_paste::{augment, PlacementParams};
use crate::dataset::data_loaders::yolo_dataset_loader::{
    discover_samples, load_labeled_image, save_labeled_image, YoloSample,
};
use crate::error::Result;
use itertools::Itertools;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::path::PathBuf;

/// Cut-paste augmentation over one split of a YOLO dataset
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub dataset_root: PathBuf,
    pub split: String,
    /// Receives `images/` and `labels/` with the augmented pairs
    pub output_dir: PathBuf,
    /// Stop after this many augmented pairs have been written
    pub num_pairs: usize,
    /// Random seed of the run, drawn (and logged) when absent
    pub seed: Option<u64>,
    pub parallel: bool,
    pub params: PlacementParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrittenPair {
    pub source: YoloSample,
    pub destination: YoloSample,
    pub image_path: PathBuf,
    pub label_path: PathBuf,
    pub placed_patches: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub seed: u64,
    pub written: Vec<WrittenPair>,
    /// Pairs that could not be loaded or written
    pub failed: usize,
    /// Pairs where not a single patch found a free spot
    pub skipped_no_placement: usize,
}

/// Source/destination candidates: every sample paired with its successor, wrapping around
pub fn candidate_pairs(samples: &[YoloSample]) -> Vec<(YoloSample, YoloSample)> {
    if samples.len() < 2 {
        return vec![];
    }
    samples
        .iter()
        .cloned()
        .circular_tuple_windows::<(_, _)>()
        .collect()
}

fn output_paths(
    job: &BatchJob,
    source: &YoloSample,
    destination: &YoloSample,
) -> (PathBuf, PathBuf) {
    let name = format!("{}_cp_{}", destination.stem(), source.stem());
    (
        job.output_dir.join("images").join(format!("{}.jpg", name)),
        job.output_dir.join("labels").join(format!("{}.txt", name)),
    )
}

fn process_candidate(
    job: &BatchJob,
    run_seed: u64,
    index: usize,
    source: &YoloSample,
    destination: &YoloSample,
) -> Result<Option<WrittenPair>> {
    let mut rng = StdRng::seed_from_u64(run_seed.wrapping_add(index as u64));
    let source_image = load_labeled_image(source)?;
    let destination_image = load_labeled_image(destination)?;
    let result = augment(&source_image, &destination_image, &job.params, &mut rng);
    let placed_patches = result.placed_count();
    if placed_patches == 0 {
        return Ok(None);
    }
    let (image_path, label_path) = output_paths(job, source, destination);
    save_labeled_image(&image_path, &label_path, &result.into_labeled_image())?;
    info!(
        "Augmented image saved to {} ({} of {} patches placed)",
        image_path.display(),
        placed_patches,
        source_image.boxes.len()
    );
    Ok(Some(WrittenPair {
        source: source.clone(),
        destination: destination.clone(),
        image_path,
        label_path,
        placed_patches,
    }))
}

/// Augments candidate pairs until `num_pairs` outputs exist or the candidates run out.
/// A pair that fails to load is logged and skipped, the batch goes on.
pub fn run_batch(job: &BatchJob) -> Result<BatchReport> {
    let mut samples = discover_samples(&job.dataset_root, &job.split)?;
    let seed = job.seed.unwrap_or_else(rand::random);
    info!(
        "Cut-paste over {} samples of '{}' (seed {})",
        samples.len(),
        job.split,
        seed
    );
    samples.shuffle(&mut StdRng::seed_from_u64(seed));
    let mut candidates = candidate_pairs(&samples).into_iter().enumerate();

    let mut report = BatchReport {
        seed,
        ..BatchReport::default()
    };
    while report.written.len() < job.num_pairs {
        let needed = job.num_pairs - report.written.len();
        let chunk: Vec<_> = candidates.by_ref().take(needed).collect();
        if chunk.is_empty() {
            break;
        }
        let results: Vec<_> = if job.parallel {
            chunk
                .par_iter()
                .map(|(index, (source, destination))| {
                    process_candidate(job, seed, *index, source, destination)
                })
                .collect()
        } else {
            chunk
                .iter()
                .map(|(index, (source, destination))| {
                    process_candidate(job, seed, *index, source, destination)
                })
                .collect()
        };
        for ((_, (source, destination)), result) in chunk.iter().zip(results) {
            match result {
                Ok(Some(written)) => report.written.push(written),
                Ok(None) => {
                    warn!(
                        "No patch of {} could be placed into {}, pair skipped",
                        source.image_path.display(),
                        destination.image_path.display()
                    );
                    report.skipped_no_placement += 1;
                }
                Err(e) => {
                    warn!(
                        "Skipping pair {} -> {}: {}",
                        source.image_path.display(),
                        destination.image_path.display(),
                        e
                    );
                    report.failed += 1;
                }
            }
        }
    }
    if report.written.len() < job.num_pairs {
        warn!(
            "Candidates exhausted: {} of {} requested pairs written",
            report.written.len(),
            job.num_pairs
        );
    }
    Ok(report)
}
