pub mod yolo_dataset_loader;
