pub mod subsystems;

use serde::{Serialize, Deserialize};
use std::path::Path;
use std::fs;
use crate::error::Result;
use crate::normalizer::EquivalenceTable;
use log::{info, warn, trace};

pub use subsystems::{AnchorConfig, DivisionConfig, FitConfig, GapConfig, NormalizerConfig};

pub trait FromIni {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlignmentConfig {
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub anchor: AnchorConfig,
    #[serde(default)]
    pub fit: FitConfig,
    #[serde(default)]
    pub alignment: GapConfig,
    #[serde(default)]
    pub divisions: DivisionConfig,
}

impl AlignmentConfig {
    pub fn validate(&self) -> Result<()> {
        self.normalizer.validate()?;
        self.anchor.validate()?;
        self.fit.validate()?;
        self.alignment.validate()?;
        self.divisions.validate()?;
        Ok(())
    }

    pub fn from_ini<P: AsRef<Path>>(path: P) -> Result<Self> {
        let absolute_path = std::fs::canonicalize(&path)
            .unwrap_or_else(|_| path.as_ref().to_path_buf());

        trace!("Loading configuration from: {:?}", absolute_path);

        let content = fs::read_to_string(&path)?;

        let mut config = Self::default();
        let mut current_section = String::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len()-1].trim().to_string();
                trace!("  Line {}: Found section: [{}]", line_num + 1, current_section);
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                // Delegate to appropriate subsystem config
                if let Some(result) = match current_section.as_str() {
                    "normalizer" => config.normalizer.from_ini_section(&current_section, key, value),
                    "anchor" => config.anchor.from_ini_section(&current_section, key, value),
                    "approximate_fit" => config.fit.from_ini_section(&current_section, key, value),
                    "alignment" => config.alignment.from_ini_section(&current_section, key, value),
                    "divisions" => config.divisions.from_ini_section(&current_section, key, value),
                    _ => None,
                } {
                    if let Err(e) = result {
                        warn!("Error processing config key {}={}: {}", key, value, e);
                    }
                } else {
                    warn!("Unrecognized config key: {}={} in section [{}]", key, value, current_section);
                }
            }
        }

        config.validate()?;
        info!("Loaded alignment configuration from {:?}", absolute_path);
        Ok(config)
    }

    /// The equivalence table named by `[normalizer] mapping_file`, or the built-in one.
    pub fn equivalence_table(&self) -> Result<EquivalenceTable> {
        match &self.normalizer.mapping_file {
            Some(path) => EquivalenceTable::from_json_file(path),
            None => Ok(EquivalenceTable::default_table().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::SimilarityMetric;
    use crate::normalizer::WhitespacePolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_ini_overrides_and_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# alignment settings").unwrap();
        writeln!(file, "[normalizer]").unwrap();
        writeln!(file, "whitespace = collapse_to_zero").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "[anchor]").unwrap();
        writeln!(file, "ngram_size = 6").unwrap();
        writeln!(file, "similarity_metric = \"dice\"").unwrap();
        writeln!(file, "[alignment]").unwrap();
        writeln!(file, "max_local_length = 500").unwrap();
        writeln!(file, "unknown_key = 1").unwrap();
        writeln!(file, "[anchor]").unwrap();
        writeln!(file, "similarity_threshold = 7").unwrap();
        file.flush().unwrap();

        let config = AlignmentConfig::from_ini(file.path()).unwrap();
        assert_eq!(config.normalizer.whitespace, WhitespacePolicy::CollapseToZero);
        assert_eq!(config.anchor.ngram_size, 6);
        assert_eq!(config.anchor.similarity_metric, SimilarityMetric::Dice);
        assert_eq!(config.alignment.max_local_length, 500);
        // invalid value leaves the default
        assert_eq!(config.anchor.similarity_threshold, 0.7);
        assert_eq!(config.fit.signature_ngram, 7);
        assert_eq!(config.divisions.similarity_threshold, 0.7);
    }

    #[test]
    fn test_missing_mapping_file_fails_validation() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[normalizer]\nmapping_file = /nonexistent/table.json").unwrap();
        file.flush().unwrap();
        assert!(AlignmentConfig::from_ini(file.path()).is_err());
    }

    #[test]
    fn test_equivalence_table_from_mapping_file() {
        let mut table = NamedTempFile::new().unwrap();
        write!(table, r#"[["β", "beta"], ["’", "'"]]"#).unwrap();
        table.flush().unwrap();

        let mut config = AlignmentConfig::default();
        assert_eq!(config.equivalence_table().unwrap().len(), EquivalenceTable::default_table().len());
        config.normalizer.mapping_file = Some(table.path().to_path_buf());
        assert_eq!(config.equivalence_table().unwrap().len(), 2);
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: AlignmentConfig = serde_json::from_str(r#"{"anchor": {"ngram_size": 5}}"#).unwrap();
        assert_eq!(config.anchor.ngram_size, 5);
        assert_eq!(config.anchor.window_size, 60);
        assert!(config.normalizer.enabled);
    }
}
