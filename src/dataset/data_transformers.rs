pub mod bbox_conversion;
pub mod yolo_labels;
