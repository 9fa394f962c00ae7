use crate::dataset::common_structs::{class_name, CLASS_NAMES};
use crate::dataset::data_loaders::yolo_dataset_loader::LABEL_EXTENSION;
use crate::error::{Error, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Number of labeled objects per class id of the class table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub counts: BTreeMap<u32, usize>,
    /// Lines with a class id outside the class table
    pub unrecognized: usize,
}

impl Default for ClassCounts {
    fn default() -> Self {
        ClassCounts {
            counts: (0..CLASS_NAMES.len() as u32).map(|id| (id, 0)).collect(),
            unrecognized: 0,
        }
    }
}

impl ClassCounts {
    fn add_label_content(&mut self, content: &str) {
        for line in content.lines() {
            // lines without an integer class id are not objects
            let class_id = match line.split_whitespace().next().map(str::parse::<u32>) {
                Some(Ok(id)) => id,
                _ => continue,
            };
            match self.counts.get_mut(&class_id) {
                Some(count) => *count += 1,
                None => self.unrecognized += 1,
            }
        }
    }

    fn merge(mut self, other: ClassCounts) -> ClassCounts {
        for (id, count) in other.counts {
            *self.counts.entry(id).or_insert(0) += count;
        }
        self.unrecognized += other.unrecognized;
        self
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// `(class id, class name, count)` in class id order
    pub fn rows(&self) -> impl Iterator<Item = (u32, &'static str, usize)> + '_ {
        self.counts
            .iter()
            .map(|(&id, &count)| (id, class_name(id).unwrap_or("?"), count))
    }
}

/// Counts the objects of every `.txt` label file directly inside `dir`
pub fn count_classes_in_folder(dir: &Path) -> Result<ClassCounts> {
    if !dir.is_dir() {
        return Err(Error::MissingFile(dir.to_path_buf()));
    }
    let mut label_files: Vec<PathBuf> = vec![];
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == LABEL_EXTENSION) {
            label_files.push(path);
        }
    }
    label_files
        .par_iter()
        .map(|path| -> Result<ClassCounts> {
            let mut counts = ClassCounts::default();
            counts.add_label_content(&fs::read_to_string(path)?);
            Ok(counts)
        })
        .try_reduce(ClassCounts::default, |a, b| Ok(a.merge(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_label_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.txt"),
            "0 0.5 0.5 0.1 0.1\n7 0.2 0.2 0.1 0.1\n0 0.7 0.7 0.1 0.1\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("b.txt"),
            "14 0.5 0.5 0.1 0.1\n\ncar 0.1 0.1 0.1 0.1\n42 0.5 0.5 0.1 0.1\n",
        )
        .unwrap();
        fs::write(dir.path().join("classes.json"), "0 1 2").unwrap();

        let counts = count_classes_in_folder(dir.path()).unwrap();
        assert_eq!(counts.counts[&0], 2);
        assert_eq!(counts.counts[&7], 1);
        assert_eq!(counts.counts[&14], 1);
        assert_eq!(counts.counts[&3], 0);
        assert_eq!(counts.unrecognized, 1);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.rows().count(), CLASS_NAMES.len());
        assert_eq!(counts.rows().nth(7), Some((7, "truck", 1)));
    }

    #[test]
    fn empty_folder_has_all_classes_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let counts = count_classes_in_folder(dir.path()).unwrap();
        assert_eq!(counts, ClassCounts::default());
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn missing_folder_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            count_classes_in_folder(&dir.path().join("labels")),
            Err(Error::MissingFile(_))
        ));
    }

    #[test]
    fn serializes_counts_by_class_id() {
        let mut counts = ClassCounts::default();
        counts.add_label_content("5 0.5 0.5 0.1 0.1\n");
        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json["counts"]["5"], 1);
        assert_eq!(json["unrecognized"], 0);
    }
}
