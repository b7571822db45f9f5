// src/config/subsystems/fit.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::FromIni;

/// Settings for bounding a short text inside a long one (`[approximate_fit]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitConfig {
    #[serde(default = "default_signature_ngram")]
    pub signature_ngram: usize,

    // Below this length the whole long text is the fit
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    #[serde(default = "default_buffer_rate")]
    pub buffer_rate: f64,

    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_signature_ngram() -> usize { 7 }
fn default_min_length() -> usize { 50 }
fn default_buffer_rate() -> f64 { 0.1 }
fn default_similarity_threshold() -> f64 { 0.7 }

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            signature_ngram: default_signature_ngram(),
            min_length: default_min_length(),
            buffer_rate: default_buffer_rate(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

impl FromIni for FitConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "approximate_fit" {
            return None;
        }

        match key {
            "signature_ngram" => {
                match value.parse() {
                    Ok(size) if size > 0 => {
                        self.signature_ngram = size;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid signature_ngram (must be > 0): {}", value)
                    ))),
                }
            },
            "min_length" => {
                match value.parse() {
                    Ok(length) => {
                        self.min_length = length;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid min_length: {}", value)
                    ))),
                }
            },
            "buffer_rate" => {
                match value.parse::<f64>() {
                    Ok(rate) if rate >= 0.0 => {
                        self.buffer_rate = rate;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid buffer_rate (must be >= 0): {}", value)
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
            _ => None,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.signature_ngram == 0 {
            return Err(Error::Config(
                "signature_ngram must be greater than 0".to_string()
            ));
        }
        if self.buffer_rate < 0.0 {
            return Err(Error::Config(
                "buffer_rate must not be negative".to_string()
            ));
        }
        Ok(())
    }
}
