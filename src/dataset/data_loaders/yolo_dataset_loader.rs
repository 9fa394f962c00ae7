use crate::dataset::common_structs::LabeledImage;
use crate::dataset::data_transformers::bbox_conversion::{
    annotations_to_boxes, boxes_to_annotations,
};
use crate::dataset::data_transformers::yolo_labels::{load_annotations, save_annotations};
use crate::error::{Error, Result};
use log::warn;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
pub const LABEL_EXTENSION: &str = "txt";

/// An image file of a dataset split and the label file that should go with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YoloSample {
    pub image_path: PathBuf,
    pub label_path: PathBuf,
}

impl YoloSample {
    /// Image file name without extension
    pub fn stem(&self) -> String {
        self.image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub fn images_dir(dataset_root: &Path, split: &str) -> PathBuf {
    dataset_root.join("images").join(split)
}

pub fn labels_dir(dataset_root: &Path, split: &str) -> PathBuf {
    dataset_root.join("labels").join(split)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Lists `images/<split>/*` with an image extension, sorted by file name, and pairs
/// each with `labels/<split>/<stem>.txt`. Label files are not required to exist.
/// Of several images sharing a stem only the first is kept, they would share a label file.
pub fn discover_samples(dataset_root: &Path, split: &str) -> Result<Vec<YoloSample>> {
    let images_dir = images_dir(dataset_root, split);
    if !images_dir.is_dir() {
        return Err(Error::MissingFile(images_dir));
    }
    let labels_dir = labels_dir(dataset_root, split);
    let mut image_paths = vec![];
    for entry in fs::read_dir(&images_dir)? {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            image_paths.push(path);
        }
    }
    image_paths.sort();
    let mut seen_stems = HashSet::new();
    image_paths.retain(|path| {
        let stem = path.file_stem().unwrap_or_default().to_owned();
        let first = seen_stems.insert(stem);
        if !first {
            warn!("Ignoring {}, another image has the same name", path.display());
        }
        first
    });
    Ok(image_paths
        .into_iter()
        .map(|image_path| {
            let mut label_name = image_path.file_stem().unwrap_or_default().to_owned();
            label_name.push(".");
            label_name.push(LABEL_EXTENSION);
            let label_path = labels_dir.join(label_name);
            YoloSample {
                image_path,
                label_path,
            }
        })
        .collect())
}

/// Loads the image as 8-bit RGB and its labels as pixel boxes
pub fn load_labeled_image(sample: &YoloSample) -> Result<LabeledImage> {
    if !sample.image_path.is_file() {
        return Err(Error::MissingFile(sample.image_path.clone()));
    }
    let annotations = load_annotations(&sample.label_path)?;
    let image = image::open(&sample.image_path)?.to_rgb8();
    let boxes = annotations_to_boxes(&annotations, image.width(), image.height());
    Ok(LabeledImage { image, boxes })
}

/// Writes the image (format picked from the extension) and its YOLO label file.
/// The image is removed again if the label file cannot be written.
pub fn save_labeled_image(
    image_path: &Path,
    label_path: &Path,
    labeled: &LabeledImage,
) -> Result<()> {
    if let Some(parent) = image_path.parent() {
        fs::create_dir_all(parent)?;
    }
    labeled.image.save(image_path)?;
    let annotations = boxes_to_annotations(
        &labeled.boxes,
        labeled.image.width(),
        labeled.image.height(),
    );
    if let Err(e) = save_annotations(label_path, &annotations) {
        if let Err(remove_err) = fs::remove_file(image_path) {
            warn!("Could not remove {}: {}", image_path.display(), remove_err);
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::common_structs::BoundingBox;
    use image::{Rgb, RgbImage};

    fn write_sample(root: &Path, split: &str, stem: &str, ext: &str, labels: Option<&str>) {
        let images = images_dir(root, split);
        fs::create_dir_all(&images).unwrap();
        RgbImage::from_pixel(100, 50, Rgb([10, 20, 30]))
            .save(images.join(format!("{}.{}", stem, ext)))
            .unwrap();
        if let Some(labels) = labels {
            let dir = labels_dir(root, split);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(format!("{}.txt", stem)), labels).unwrap();
        }
    }

    #[test]
    fn discovers_images_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_sample(dir.path(), "train", "night (2)", "png", Some(""));
        write_sample(dir.path(), "train", "night (1)", "png", None);
        fs::write(images_dir(dir.path(), "train").join("notes.md"), "x").unwrap();

        let samples = discover_samples(dir.path(), "train").unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].stem(), "night (1)");
        assert_eq!(
            samples[0].label_path,
            labels_dir(dir.path(), "train").join("night (1).txt")
        );
        assert_eq!(samples[1].stem(), "night (2)");
    }

    #[test]
    fn images_sharing_a_stem_are_kept_once() {
        let dir = tempfile::tempdir().unwrap();
        write_sample(dir.path(), "train", "a", "png", Some(""));
        write_sample(dir.path(), "train", "a", "jpg", None);
        write_sample(dir.path(), "train", "b", "png", Some(""));

        let samples = discover_samples(dir.path(), "train").unwrap();
        let names: Vec<_> = samples
            .iter()
            .map(|s| s.image_path.file_name().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
    }

    #[test]
    fn missing_split_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_samples(dir.path(), "val"),
            Err(Error::MissingFile(_))
        ));
    }

    #[test]
    fn loads_boxes_at_image_size() {
        let dir = tempfile::tempdir().unwrap();
        write_sample(dir.path(), "train", "a", "png", Some("3 0.5 0.5 0.2 0.4\n"));
        let sample = discover_samples(dir.path(), "train").unwrap().remove(0);
        let labeled = load_labeled_image(&sample).unwrap();
        assert_eq!(labeled.image.dimensions(), (100, 50));
        assert_eq!(labeled.boxes, vec![BoundingBox::new(3, 40, 15, 60, 35)]);
    }

    #[test]
    fn missing_label_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_sample(dir.path(), "train", "a", "png", None);
        let sample = discover_samples(dir.path(), "train").unwrap().remove(0);
        match load_labeled_image(&sample) {
            Err(Error::MissingFile(path)) => assert_eq!(path, sample.label_path),
            other => panic!("expected missing label, got {:?}", other.map(|l| l.boxes)),
        }
    }

    #[test]
    fn save_writes_image_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        let labeled = LabeledImage {
            image: RgbImage::from_pixel(100, 100, Rgb([1, 2, 3])),
            boxes: vec![BoundingBox::new(0, 40, 30, 60, 70)],
        };
        let image_path = dir.path().join("out/images/x.png");
        let label_path = dir.path().join("out/labels/x.txt");
        save_labeled_image(&image_path, &label_path, &labeled).unwrap();
        assert!(image_path.is_file());
        assert_eq!(
            fs::read_to_string(&label_path).unwrap(),
            "0 0.500000 0.500000 0.200000 0.400000\n"
        );
    }

    #[test]
    fn failed_label_write_removes_the_image() {
        let dir = tempfile::tempdir().unwrap();
        let labeled = LabeledImage {
            image: RgbImage::from_pixel(10, 10, Rgb([1, 2, 3])),
            boxes: vec![],
        };
        // a regular file where the labels directory should be
        fs::write(dir.path().join("labels"), "").unwrap();
        let image_path = dir.path().join("images/x.png");
        let label_path = dir.path().join("labels/x.txt");
        assert!(save_labeled_image(&image_path, &label_path, &labeled).is_err());
        assert!(!image_path.exists());
    }
}
