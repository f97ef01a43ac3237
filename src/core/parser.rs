//! SO-005: YAML parsing and validation.
//!
//! Parses soloist.yaml and validates structural constraints:
//! - Version must be "1.0"
//! - At least one host, each with an address
//! - deploy_to, when given, is absolute
//! - Cookbook entries are non-empty

use super::error::{Error, Result};
use super::types::*;
use std::path::Path;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a soloist.yaml file from disk.
pub fn parse_config_file(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_config(&content).map_err(|message| Error::Config {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse a soloist.yaml from a string.
pub fn parse_config(yaml: &str) -> std::result::Result<ProjectConfig, String> {
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &ProjectConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.version != "1.0" {
        errors.push(ValidationError {
            message: format!("version must be \"1.0\", got \"{}\"", config.version),
        });
    }

    if config.name.is_empty() {
        errors.push(ValidationError {
            message: "name must not be empty".to_string(),
        });
    }

    if config.hosts.is_empty() {
        errors.push(ValidationError {
            message: "no hosts defined".to_string(),
        });
    }

    for (id, host) in &config.hosts {
        if host.addr.trim().is_empty() {
            errors.push(ValidationError {
                message: format!("host '{}' has no addr", id),
            });
        }
        if host.user.trim().is_empty() {
            errors.push(ValidationError {
                message: format!("host '{}' has an empty user", id),
            });
        }
    }

    if let Some(ref deploy_to) = config.deploy.deploy_to {
        if !deploy_to.starts_with('/') {
            errors.push(ValidationError {
                message: format!("deploy_to must be absolute, got '{}'", deploy_to),
            });
        }
    }

    if let Some(ref cookbooks) = config.solo.cookbooks {
        if cookbooks.iter().any(|c| c.trim().is_empty()) {
            errors.push(ValidationError {
                message: "cookbooks must not contain empty paths".to_string(),
            });
        }
    }

    errors
}
