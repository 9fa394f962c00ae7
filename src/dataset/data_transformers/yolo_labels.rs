use crate::dataset::common_structs::Annotation;
use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Largest magnitude accepted for a normalized field. Boxes may reach past the image,
/// but not so far that their pixel corners leave the `i32` range.
pub const NORMALIZED_LIMIT: f64 = 10.0;

/// Parses `class_id x_center y_center width height`
pub fn parse_annotation_line(line: &str) -> std::result::Result<Annotation, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(format!("expected 5 fields, found {}", fields.len()));
    }
    let class_id = parse_class_id(fields[0])?;
    let mut values = [0f64; 4];
    for (value, field) in values.iter_mut().zip(&fields[1..]) {
        *value = field
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("'{}' is not a number", field))?;
        if value.abs() > NORMALIZED_LIMIT {
            return Err(format!(
                "'{}' is outside [-{limit}, {limit}]",
                field,
                limit = NORMALIZED_LIMIT
            ));
        }
    }
    let [x_center, y_center, width, height] = values;
    Ok(Annotation {
        class_id,
        x_center,
        y_center,
        width,
        height,
    })
}

// Some exporters write the class id as a float, e.g. "3.0"
fn parse_class_id(field: &str) -> std::result::Result<u32, String> {
    if let Ok(id) = field.parse::<u32>() {
        return Ok(id);
    }
    match field.parse::<f64>() {
        Ok(v) if v >= 0. && v.fract() == 0. && v <= u32::MAX as f64 => Ok(v as u32),
        _ => Err(format!("'{}' is not a valid class id", field)),
    }
}

/// Reads a YOLO label file, keeping the line order. Blank lines are ignored.
pub fn load_annotations(path: &Path) -> Result<Vec<Annotation>> {
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let mut annotations = vec![];
    for (line_idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let annotation = parse_annotation_line(line).map_err(|message| Error::Parse {
            path: path.to_path_buf(),
            line: line_idx + 1,
            message,
        })?;
        annotations.push(annotation);
    }
    Ok(annotations)
}

pub fn save_annotations(path: &Path, annotations: &[Annotation]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    for annotation in annotations {
        writeln!(writer, "{}", annotation)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_line() {
        let a = parse_annotation_line("3 0.5 0.25 0.1 0.2").unwrap();
        assert_eq!(a.class_id, 3);
        assert_eq!(a.x_center, 0.5);
        assert_eq!(a.y_center, 0.25);
        assert_eq!(a.width, 0.1);
        assert_eq!(a.height, 0.2);
        assert_eq!(parse_annotation_line("3.0 0.5 0.25 0.1 0.2").unwrap().class_id, 3);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_annotation_line("3 0.5 0.25 0.1").is_err());
        assert!(parse_annotation_line("3 0.5 0.25 0.1 0.2 0.9").is_err());
        assert!(parse_annotation_line("car 0.5 0.25 0.1 0.2").is_err());
        assert!(parse_annotation_line("-1 0.5 0.25 0.1 0.2").is_err());
        assert!(parse_annotation_line("1 0.5 abc 0.1 0.2").is_err());
        assert!(parse_annotation_line("1 0.5 NaN 0.1 0.2").is_err());
    }

    #[test]
    fn rejects_coordinates_far_outside_the_image() {
        assert!(parse_annotation_line("0 0.5 1e10 0.1 0.1").is_err());
        assert!(parse_annotation_line("0 -11 0.5 0.1 0.1").is_err());
        let a = parse_annotation_line("0 -0.2 1.3 1.5 0.1").unwrap();
        assert_eq!((a.x_center, a.y_center, a.width), (-0.2, 1.3, 1.5));
    }

    #[test]
    fn load_reports_line_of_bad_annotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        fs::write(&path, "0 0.5 0.5 0.2 0.4\n\n1 0.5 x 0.2 0.4\n").unwrap();
        match load_annotations(&path) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.txt");
        assert!(matches!(load_annotations(&path), Err(Error::MissingFile(_))));
    }

    #[test]
    fn save_then_load_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels").join("out.txt");
        let annotations = vec![
            parse_annotation_line("5 0.1 0.2 0.3 0.4").unwrap(),
            parse_annotation_line("0 0.5 0.5 0.2 0.4").unwrap(),
        ];
        save_annotations(&path, &annotations).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "5 0.100000 0.200000 0.300000 0.400000\n0 0.500000 0.500000 0.200000 0.400000\n"
        );
        assert_eq!(load_annotations(&path).unwrap(), annotations);
    }
}
