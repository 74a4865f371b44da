//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Detect duplicate module and empty controller names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} \"{value}\"")]
    InvalidAddress { field: &'static str, value: String },

    #[error("routes.path must not be empty")]
    EmptyRoutesPath,

    #[error("routes.max_import_depth must be at least 1")]
    ZeroImportDepth,

    #[error("module #{0} has an empty name")]
    EmptyModuleName(usize),

    #[error("module \"{0}\" is declared more than once")]
    DuplicateModule(String),

    #[error("controller names must not be empty or contain '.'; got \"{0}\"")]
    InvalidControllerName(String),

    #[error("unknown log level \"{0}\"")]
    UnknownLogLevel(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Check a deserialized configuration, collecting every problem.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }

    if config.routes.path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyRoutesPath);
    }
    if config.routes.max_import_depth == 0 {
        errors.push(ValidationError::ZeroImportDepth);
    }

    let mut seen = HashSet::new();
    for (i, module) in config.modules.iter().enumerate() {
        if module.name.is_empty() {
            errors.push(ValidationError::EmptyModuleName(i));
        } else if !seen.insert(module.name.as_str()) {
            errors.push(ValidationError::DuplicateModule(module.name.clone()));
        }
    }

    for (controller, methods) in &config.controllers {
        if controller.is_empty() || controller.contains('.') {
            errors.push(ValidationError::InvalidControllerName(controller.clone()));
        }
        for method in methods.keys() {
            if method.is_empty() || method.contains('.') {
                errors.push(ValidationError::InvalidControllerName(format!("{controller}.{method}")));
            }
        }
    }

    let level = config.observability.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.observability.log_level.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ModuleConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.server.bind_address = "nowhere".into();
        config.routes.max_import_depth = 0;
        config.observability.log_level = "loud".into();
        for name in ["admin", "admin", ""] {
            config.modules.push(ModuleConfig {
                name: name.into(),
                path: "m".into(),
                active: true,
            });
        }

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidAddress {
                    field: "server.bind_address",
                    value: "nowhere".into()
                },
                ValidationError::ZeroImportDepth,
                ValidationError::DuplicateModule("admin".into()),
                ValidationError::EmptyModuleName(2),
                ValidationError::UnknownLogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_address = "bad".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
