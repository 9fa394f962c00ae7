//! Cut-paste augmentation: labeled patches of a source image are blended into a
//! destination image wherever they do not cover one of its boxes.
//!
//! The blend is a plain alpha-weighted average of patch and background, not a
//! gradient-domain (Poisson) blend.

use crate::dataset::common_structs::{BoundingBox, LabeledImage};
use image::{imageops, RgbImage};
use log::{debug, warn};
use rand::Rng;
use std::fmt;

pub const DEFAULT_BLEND_WEIGHT: f32 = 0.8;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementParams {
    /// Weight of the patch in the blended pixel, 1.0 pastes it opaquely
    pub blend_weight: f32,
    /// Horizontal positions tried before a patch is given up
    pub max_attempts: u32,
    /// Keep the patch at the height of the first same-class box of the destination
    pub anchor_same_class: bool,
}

impl Default for PlacementParams {
    fn default() -> Self {
        PlacementParams {
            blend_weight: DEFAULT_BLEND_WEIGHT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            anchor_same_class: true,
        }
    }
}

/// Why a patch was left out of the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementSkip {
    /// The source box has no pixels inside the source image
    EmptyPatch { source_box: BoundingBox },
    /// The patch is wider or taller than the destination
    TooLarge {
        source_box: BoundingBox,
        destination_width: u32,
        destination_height: u32,
    },
    /// Every tried position overlapped an existing box
    AttemptsExhausted {
        source_box: BoundingBox,
        attempts: u32,
    },
}

impl fmt::Display for PlacementSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementSkip::EmptyPatch { source_box } => {
                write!(f, "patch for bbox {:?} lies outside the source image", source_box)
            }
            PlacementSkip::TooLarge {
                source_box,
                destination_width,
                destination_height,
            } => write!(
                f,
                "patch for bbox {:?} does not fit a {}x{} destination",
                source_box, destination_width, destination_height
            ),
            PlacementSkip::AttemptsExhausted {
                source_box,
                attempts,
            } => write!(
                f,
                "failed to place patch for bbox {:?} without overlap after {} attempts",
                source_box, attempts
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    Placed(BoundingBox),
    Skipped(PlacementSkip),
}

impl PlacementOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, PlacementOutcome::Placed(_))
    }
}

/// Destination state after one `place_patch` call
#[derive(Debug, Clone)]
pub struct Placement {
    pub image: RgbImage,
    pub boxes: Vec<BoundingBox>,
    pub outcome: PlacementOutcome,
}

#[derive(Debug, Clone)]
pub struct AugmentResult {
    pub image: RgbImage,
    pub boxes: Vec<BoundingBox>,
    /// One entry per source box, in source order
    pub outcomes: Vec<PlacementOutcome>,
}

impl AugmentResult {
    pub fn placed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_placed()).count()
    }

    pub fn into_labeled_image(self) -> LabeledImage {
        LabeledImage {
            image: self.image,
            boxes: self.boxes,
        }
    }
}

/// Boxes sharing only an edge do not overlap
pub fn boxes_overlap(a: &BoundingBox, b: &BoundingBox) -> bool {
    !(a.x1 >= b.x2 || a.x2 <= b.x1 || a.y1 >= b.y2 || a.y2 <= b.y1)
}

/// Vertical midpoint of the first box of `class_id`, in insertion order
pub fn find_vertical_anchor(boxes: &[BoundingBox], class_id: u32) -> Option<i32> {
    boxes
        .iter()
        .find(|bb| bb.class_id == class_id)
        .map(BoundingBox::vertical_center)
}

/// Tries to blend the `source_box` patch of `source` into `destination` at a random
/// position clear of every box in `destination_boxes`.
///
/// On success the new box is appended to the returned boxes. On any skip the image
/// and boxes come back exactly as they were passed in.
pub fn place_patch<R: Rng + ?Sized>(
    source: &RgbImage,
    source_box: &BoundingBox,
    mut destination: RgbImage,
    mut destination_boxes: Vec<BoundingBox>,
    params: &PlacementParams,
    rng: &mut R,
) -> Placement {
    let skipped = |image: RgbImage, boxes: Vec<BoundingBox>, skip: PlacementSkip| {
        warn!("{}", skip);
        Placement {
            image,
            boxes,
            outcome: PlacementOutcome::Skipped(skip),
        }
    };

    let patch_box = match source_box.clipped_to(source.width(), source.height()) {
        Some(patch_box) => patch_box,
        None => {
            let skip = PlacementSkip::EmptyPatch {
                source_box: *source_box,
            };
            return skipped(destination, destination_boxes, skip);
        }
    };
    let patch_width = patch_box.width();
    let patch_height = patch_box.height();
    let (dest_width, dest_height) = (destination.width() as i32, destination.height() as i32);

    if patch_width > dest_width || patch_height > dest_height {
        let skip = PlacementSkip::TooLarge {
            source_box: *source_box,
            destination_width: destination.width(),
            destination_height: destination.height(),
        };
        return skipped(destination, destination_boxes, skip);
    }

    let anchor = if params.anchor_same_class {
        find_vertical_anchor(&destination_boxes, source_box.class_id)
    } else {
        None
    };
    let new_y1 = match anchor {
        Some(anchor) => {
            let y1 = (anchor - patch_height / 2).max(0);
            // shift up when the patch would hang below the image
            y1 - (y1 + patch_height - dest_height).max(0)
        }
        None => rng.gen_range(0..=dest_height - patch_height),
    };
    let new_y2 = new_y1 + patch_height;

    for attempt in 1..=params.max_attempts {
        let new_x1 = rng.gen_range(0..=dest_width - patch_width);
        let candidate = BoundingBox::new(
            source_box.class_id,
            new_x1,
            new_y1,
            new_x1 + patch_width,
            new_y2,
        );
        if destination_boxes
            .iter()
            .any(|existing| boxes_overlap(&candidate, existing))
        {
            continue;
        }

        let patch = imageops::crop_imm(
            source,
            patch_box.x1 as u32,
            patch_box.y1 as u32,
            patch_width as u32,
            patch_height as u32,
        )
        .to_image();
        blend_into(
            &mut destination,
            &patch,
            new_x1 as u32,
            new_y1 as u32,
            params.blend_weight,
        );
        debug!(
            "placed {:?} at {:?} after {} attempt(s)",
            source_box, candidate, attempt
        );
        destination_boxes.push(candidate);
        return Placement {
            image: destination,
            boxes: destination_boxes,
            outcome: PlacementOutcome::Placed(candidate),
        };
    }

    let skip = PlacementSkip::AttemptsExhausted {
        source_box: *source_box,
        attempts: params.max_attempts,
    };
    skipped(destination, destination_boxes, skip)
}

/// Pastes every box of `source` into a copy of `destination`, in order.
/// Each placed patch becomes an obstacle for the ones after it.
pub fn augment<R: Rng + ?Sized>(
    source: &LabeledImage,
    destination: &LabeledImage,
    params: &PlacementParams,
    rng: &mut R,
) -> AugmentResult {
    let mut image = destination.image.clone();
    let mut boxes = destination.boxes.clone();
    let mut outcomes = Vec::with_capacity(source.boxes.len());
    for source_box in &source.boxes {
        let placement = place_patch(&source.image, source_box, image, boxes, params, rng);
        image = placement.image;
        boxes = placement.boxes;
        outcomes.push(placement.outcome);
    }
    AugmentResult {
        image,
        boxes,
        outcomes,
    }
}

/// `dst = (1 - weight) * dst + weight * patch`, rounded and saturated per channel
fn blend_into(destination: &mut RgbImage, patch: &RgbImage, x: u32, y: u32, weight: f32) {
    for (px, py, patch_pixel) in patch.enumerate_pixels() {
        let dest_pixel = destination.get_pixel_mut(x + px, y + py);
        for (d, p) in dest_pixel.0.iter_mut().zip(patch_pixel.0.iter()) {
            let blended = (1. - weight) * *d as f32 + weight * *p as f32;
            *d = blended.round().clamp(0., 255.) as u8;
        }
    }
}
