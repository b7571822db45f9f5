// src/config/subsystems/anchor.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::FromIni;
use crate::matcher::SimilarityMetric;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorConfig {
    #[serde(default = "default_ngram_size")]
    pub ngram_size: usize,

    // Alphanumeric chars in each context window
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    // More occurrences than this and the n-gram is skipped
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    #[serde(default = "default_proximity")]
    pub proximity: usize,

    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    #[serde(default)]
    pub similarity_metric: SimilarityMetric,

    #[serde(default = "default_max_window_escalations")]
    pub max_window_escalations: usize,
}

fn default_ngram_size() -> usize { 8 }
fn default_window_size() -> usize { 60 }
fn default_max_candidates() -> usize { 5 }
fn default_proximity() -> usize { 5 }
fn default_similarity_threshold() -> f64 { 0.7 }
fn default_max_window_escalations() -> usize { 2 }

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            ngram_size: default_ngram_size(),
            window_size: default_window_size(),
            max_candidates: default_max_candidates(),
            proximity: default_proximity(),
            similarity_threshold: default_similarity_threshold(),
            similarity_metric: SimilarityMetric::default(),
            max_window_escalations: default_max_window_escalations(),
        }
    }
}

impl FromIni for AnchorConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "anchor" {
            return None;
        }

        match key {
            "ngram_size" => {
                match value.parse() {
                    Ok(size) if size > 0 => {
                        self.ngram_size = size;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid ngram_size (must be > 0): {}", value)
                    ))),
                }
            },
            "window_size" => {
                match value.parse() {
                    Ok(size) if size > 0 => {
                        self.window_size = size;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid window_size (must be > 0): {}", value)
                    ))),
                }
            },
            "max_candidates" => {
                match value.parse() {
                    Ok(cap) if cap > 0 => {
                        self.max_candidates = cap;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid max_candidates (must be > 0): {}", value)
                    ))),
                }
            },
            "proximity" => {
                match value.parse() {
                    Ok(distance) => {
                        self.proximity = distance;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid proximity: {}", value)
                    ))),
                }
            },
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
            "similarity_metric" => {
                match SimilarityMetric::from_str(value) {
                    Some(metric) => {
                        self.similarity_metric = metric;
                        Some(Ok(()))
                    },
                    None => Some(Err(Error::Config(
                        format!("Invalid similarity metric: {}", value)
                    ))),
                }
            },
            "max_window_escalations" => {
                match value.parse() {
                    Ok(count) => {
                        self.max_window_escalations = count;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid max_window_escalations: {}", value)
                    ))),
                }
            },
            _ => None,
        }
    }
}

impl AnchorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ngram_size == 0 {
            return Err(Error::Config(
                "ngram_size must be greater than 0".to_string()
            ));
        }
        if self.max_candidates == 0 {
            return Err(Error::Config(
                "max_candidates must be greater than 0".to_string()
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::Config(
                "anchor similarity_threshold must be between 0 and 1".to_string()
            ));
        }
        Ok(())
    }
}
