//! Cut-paste augmentation and label statistics for YOLO vehicle datasets.
//!
//! Datasets follow the usual layout: `images/<split>/<name>.jpg` next to
//! `labels/<split>/<name>.txt`, one `class x_center y_center width height`
//! line per object.

pub mod config;
pub mod dataset;
pub mod error;
pub mod helpers;

pub use config::AugmentConfig;
pub use dataset::common_structs::{Annotation, BoundingBox, LabeledImage};
pub use error::{Error, Result};
