// src/config/subsystems/divisions.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::FromIni;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisionConfig {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_similarity_threshold() -> f64 { 0.7 }

impl Default for DivisionConfig {
    fn default() -> Self {
        Self { similarity_threshold: default_similarity_threshold() }
    }
}

impl FromIni for DivisionConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "divisions" {
            return None;
        }

        match key {
            "similarity_threshold" => {
                match value.parse::<f64>() {
                    Ok(threshold) if (0.0..=1.0).contains(&threshold) => {
                        self.similarity_threshold = threshold;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid similarity_threshold (must be between 0 and 1): {}", value)
                    ))),
                }
            },
            _ => None,
        }
    }
}

impl DivisionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::Config(
                "divisions similarity_threshold must be between 0 and 1".to_string()
            ));
        }
        Ok(())
    }

    /// Largest tolerated unmatched share of a division.
    pub fn slack_rate(&self) -> f64 {
        1.0 - self.similarity_threshold
    }
}
