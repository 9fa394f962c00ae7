use crate::dataset::data_augmenters::cut_paste::{
    PlacementParams, DEFAULT_BLEND_WEIGHT, DEFAULT_MAX_ATTEMPTS,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Augmentation settings, loadable from a JSON file. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AugmentConfig {
    pub blend_weight: f32,
    pub max_attempts: u32,
    pub anchor_same_class: bool,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        AugmentConfig {
            blend_weight: DEFAULT_BLEND_WEIGHT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            anchor_same_class: true,
        }
    }
}

impl AugmentConfig {
    pub fn from_json_file(path: &Path) -> Result<AugmentConfig> {
        if !path.is_file() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        let config: AugmentConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.blend_weight) {
            return Err(Error::Config(format!(
                "blend_weight must be within [0, 1], got {}",
                self.blend_weight
            )));
        }
        if self.max_attempts == 0 {
            return Err(Error::Config("max_attempts must be positive".to_string()));
        }
        Ok(())
    }

    pub fn placement_params(&self) -> PlacementParams {
        PlacementParams {
            blend_weight: self.blend_weight,
            max_attempts: self.max_attempts,
            anchor_same_class: self.anchor_same_class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("augment.json");
        fs::write(&path, r#"{ "blend_weight": 0.5 }"#).unwrap();
        let config = AugmentConfig::from_json_file(&path).unwrap();
        assert_eq!(config.blend_weight, 0.5);
        assert_eq!(config.max_attempts, 1000);
        assert!(config.anchor_same_class);
    }

    #[test]
    fn out_of_range_weight_is_rejected() {
        let config = AugmentConfig {
            blend_weight: 1.5,
            ..AugmentConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        let config = AugmentConfig {
            max_attempts: 0,
            ..AugmentConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("augment.json");
        fs::write(&path, r#"{ "alpha": 0.5 }"#).unwrap();
        assert!(matches!(
            AugmentConfig::from_json_file(&path),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn defaults_match_placement_defaults() {
        assert_eq!(
            AugmentConfig::default().placement_params(),
            PlacementParams::default()
        );
    }
}
