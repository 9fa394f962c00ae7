use crate::dataset::common_structs::{Annotation, BoundingBox};

/// Scales a normalized center/size annotation to pixel corners.
/// Corners are truncated towards zero, so converting back is lossy.
pub fn convert_annotation_to_box(
    annotation: &Annotation,
    image_width: u32,
    image_height: u32,
) -> BoundingBox {
    let x_center = annotation.x_center * image_width as f64;
    let y_center = annotation.y_center * image_height as f64;
    let width = annotation.width * image_width as f64;
    let height = annotation.height * image_height as f64;
    BoundingBox {
        class_id: annotation.class_id,
        x1: (x_center - width / 2.).trunc() as i32,
        y1: (y_center - height / 2.).trunc() as i32,
        x2: (x_center + width / 2.).trunc() as i32,
        y2: (y_center + height / 2.).trunc() as i32,
    }
}

pub fn convert_box_to_annotation(
    bb: &BoundingBox,
    image_width: u32,
    image_height: u32,
) -> Annotation {
    let x_center = (bb.x1 as f64 + bb.x2 as f64) / 2.;
    let y_center = (bb.y1 as f64 + bb.y2 as f64) / 2.;
    Annotation {
        class_id: bb.class_id,
        x_center: x_center / image_width as f64,
        y_center: y_center / image_height as f64,
        width: (bb.x2 as f64 - bb.x1 as f64) / image_width as f64,
        height: (bb.y2 as f64 - bb.y1 as f64) / image_height as f64,
    }
}

pub fn annotations_to_boxes(
    annotations: &[Annotation],
    image_width: u32,
    image_height: u32,
) -> Vec<BoundingBox> {
    annotations
        .iter()
        .map(|a| convert_annotation_to_box(a, image_width, image_height))
        .collect()
}

pub fn boxes_to_annotations(
    boxes: &[BoundingBox],
    image_width: u32,
    image_height: u32,
) -> Vec<Annotation> {
    boxes
        .iter()
        .map(|bb| convert_box_to_annotation(bb, image_width, image_height))
        .collect()
}
