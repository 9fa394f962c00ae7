use image::RgbImage;
use std::fmt;
/// Frequently used structs in the provided data transformers/loaders/augmenters

/// Class names of the vehicle dataset, indexed by class id
pub const CLASS_NAMES: [&str; 15] = [
    "car",
    "bike",
    "auto",
    "rickshaw",
    "cycle",
    "bus",
    "minitruck",
    "truck",
    "van",
    "taxi",
    "motorvan",
    "toto",
    "train",
    "boat",
    "other",
];

pub fn class_name(class_id: u32) -> Option<&'static str> {
    CLASS_NAMES.get(class_id as usize).copied()
}

/// A single line of a YOLO label file. Coordinates are relative to the image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Annotation {
    pub class_id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.x_center, self.y_center, self.width, self.height
        )
    }
}

/// A Bounding Box in absolute pixel corners. Corners may lie outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub class_id: u32,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(class_id: u32, x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        BoundingBox {
            class_id,
            x1,
            y1,
            x2,
            y2,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> i32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Vertical midpoint, rounded towards negative infinity
    pub fn vertical_center(&self) -> i32 {
        (self.y1 as i64 + self.y2 as i64).div_euclid(2) as i32
    }

    /// Returns the part of the box inside a `width` x `height` image, or None if nothing is left
    pub fn clipped_to(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let clipped = BoundingBox {
            class_id: self.class_id,
            x1: self.x1.max(0),
            y1: self.y1.max(0),
            x2: self.x2.min(width as i32),
            y2: self.y2.min(height as i32),
        };
        if clipped.width() <= 0 || clipped.height() <= 0 {
            None
        } else {
            Some(clipped)
        }
    }
}

/// An image with its Bounding Boxes
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledImage {
    pub image: RgbImage,
    pub boxes: Vec<BoundingBox>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_line_has_six_decimals() {
        let annotation = Annotation {
            class_id: 7,
            x_center: 0.25,
            y_center: 0.5,
            width: 0.1,
            height: 1.0 / 3.0,
        };
        assert_eq!(
            annotation.to_string(),
            "7 0.250000 0.500000 0.100000 0.333333"
        );
    }

    #[test]
    fn class_table_lookup() {
        assert_eq!(class_name(0), Some("car"));
        assert_eq!(class_name(14), Some("other"));
        assert_eq!(class_name(15), None);
    }

    #[test]
    fn clipping_keeps_inner_part() {
        let bb = BoundingBox::new(1, -5, 10, 30, 120);
        assert_eq!(
            bb.clipped_to(20, 100),
            Some(BoundingBox::new(1, 0, 10, 20, 100))
        );
        assert_eq!(BoundingBox::new(1, 25, 0, 40, 10).clipped_to(20, 100), None);
    }

    #[test]
    fn vertical_center_floors() {
        assert_eq!(BoundingBox::new(0, 0, 50, 10, 71).vertical_center(), 60);
        assert_eq!(BoundingBox::new(0, 0, -3, 10, 0).vertical_center(), -2);
    }

    #[test]
    fn extreme_corners_do_not_overflow() {
        let bb = BoundingBox::new(0, i32::MIN, i32::MAX - 1, i32::MAX, i32::MAX);
        assert_eq!(bb.width(), i32::MAX);
        assert_eq!(bb.height(), 1);
        assert_eq!(bb.vertical_center(), i32::MAX - 1);
    }
}
