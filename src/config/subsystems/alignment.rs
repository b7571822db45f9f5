// src/config/subsystems/alignment.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::FromIni;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapConfig {
    // Target window around a front/rear gap: gap + gap * rate + min
    #[serde(default = "default_buffer_rate")]
    pub buffer_rate: f64,

    #[serde(default = "default_buffer_min")]
    pub buffer_min: usize,

    // Gaps at least this long are not compared char by char
    #[serde(default = "default_max_local_length")]
    pub max_local_length: usize,

    #[serde(default = "default_local_similarity_cutoff")]
    pub local_similarity_cutoff: f64,

    #[serde(default = "default_case_insensitive_fast_path")]
    pub case_insensitive_fast_path: bool,
}

fn default_buffer_rate() -> f64 { 0.1 }
fn default_buffer_min() -> usize { 20 }
fn default_max_local_length() -> usize { 2000 }
fn default_local_similarity_cutoff() -> f64 { 0.6 }
fn default_case_insensitive_fast_path() -> bool { true }

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            buffer_rate: default_buffer_rate(),
            buffer_min: default_buffer_min(),
            max_local_length: default_max_local_length(),
            local_similarity_cutoff: default_local_similarity_cutoff(),
            case_insensitive_fast_path: default_case_insensitive_fast_path(),
        }
    }
}

impl FromIni for GapConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "alignment" {
            return None;
        }

        match key {
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
            "buffer_min" => {
                match value.parse() {
                    Ok(min) => {
                        self.buffer_min = min;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid buffer_min: {}", value)
                    ))),
                }
            },
            "max_local_length" => {
                match value.parse() {
                    Ok(length) if length > 0 => {
                        self.max_local_length = length;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid max_local_length (must be > 0): {}", value)
                    ))),
                }
            },
            "local_similarity_cutoff" => {
                match value.parse::<f64>() {
                    Ok(cutoff) if (0.0..=1.0).contains(&cutoff) => {
                        self.local_similarity_cutoff = cutoff;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid local_similarity_cutoff (must be between 0 and 1): {}", value)
                    ))),
                }
            },
            "case_insensitive_fast_path" => {
                match value.parse() {
                    Ok(flag) => {
                        self.case_insensitive_fast_path = flag;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid case_insensitive_fast_path value (must be true/false): {}", value)
                    ))),
                }
            },
            _ => None,
        }
    }
}

impl GapConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.local_similarity_cutoff) {
            return Err(Error::Config(
                "local_similarity_cutoff must be between 0 and 1".to_string()
            ));
        }
        if self.max_local_length == 0 {
            return Err(Error::Config(
                "max_local_length must be greater than 0".to_string()
            ));
        }
        Ok(())
    }
}
