// src/config/subsystems/normalizer.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use crate::error::{Error, Result};
use crate::config::FromIni;
use crate::normalizer::WhitespacePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub whitespace: WhitespacePolicy,

    // JSON array of [pattern_a, pattern_b] pairs replacing the built-in table
    #[serde(default)]
    pub mapping_file: Option<PathBuf>,
}

fn default_enabled() -> bool { true }

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            whitespace: WhitespacePolicy::default(),
            mapping_file: None,
        }
    }
}

impl FromIni for NormalizerConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "normalizer" {
            return None;
        }

        match key {
            "enabled" => {
                match value.parse() {
                    Ok(flag) => {
                        self.enabled = flag;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid enabled value (must be true/false): {}", value)
                    ))),
                }
            },
            "whitespace" => {
                match WhitespacePolicy::from_str(value) {
                    Some(policy) => {
                        self.whitespace = policy;
                        Some(Ok(()))
                    },
                    None => Some(Err(Error::Config(
                        format!("Invalid whitespace policy: {}", value)
                    ))),
                }
            },
            "mapping_file" => {
                let cleaned = value.trim_matches('"');
                self.mapping_file = if cleaned.is_empty() { None } else { Some(PathBuf::from(cleaned)) };
                Some(Ok(()))
            },
            _ => None,
        }
    }
}

impl NormalizerConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.mapping_file {
            if !path.exists() {
                return Err(Error::Config(
                    format!("Mapping file not found: {}", path.display())
                ));
            }
        }
        Ok(())
    }
}
