pub mod class_counts;
pub mod common_structs;

pub mod data_augmenters;
pub mod data_loaders;
pub mod data_transformers;
