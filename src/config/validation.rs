//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (redirect status, timeouts > 0, addresses parse)
//! - Compile every dispatch pattern once so bad patterns fail at load time
//! - Detect duplicate document types
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::routing::matcher::RoutePattern;

/// Status codes accepted for soft redirects.
pub const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("soft_redirects.status_code {0} is not a redirect status")]
    StatusCode(u16),

    #[error("{field} is not a socket address: {value}")]
    Address { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("document type name must not be empty")]
    EmptyTypeName,

    #[error("document type {0} is declared more than once")]
    DuplicateType(String),

    #[error("document type {name}: {reason}")]
    Pattern { name: String, reason: String },
}

/// Check the configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !REDIRECT_STATUSES.contains(&config.soft_redirects.status_code) {
        errors.push(ValidationError::StatusCode(config.soft_redirects.status_code));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::Address {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let mut seen = HashSet::new();
    for doc_type in &config.types {
        if doc_type.name.trim().is_empty() {
            errors.push(ValidationError::EmptyTypeName);
            continue;
        }
        if !seen.insert(doc_type.name.as_str()) {
            errors.push(ValidationError::DuplicateType(doc_type.name.clone()));
        }
        for pattern in &doc_type.dispatch {
            if let Err(e) = RoutePattern::parse(pattern) {
                errors.push(ValidationError::Pattern {
                    name: doc_type.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
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
    use crate::config::schema::DocTypeConfig;
    use crate::docs::DocKind;

    fn doc_type(name: &str, dispatch: &[&str]) -> DocTypeConfig {
        DocTypeConfig {
            name: name.to_string(),
            kind: DocKind::Page,
            dispatch: dispatch.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_permanent_redirect_accepted() {
        let mut config = AppConfig::default();
        config.soft_redirects.status_code = 301;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.soft_redirects.status_code = 200;
        config.listener.bind_address = "nowhere".into();
        config.timeouts.request_secs = 0;
        config.types.push(doc_type("custom-page", &["/:"]));
        config.types.push(doc_type("custom-page", &["/"]));
        config.types.push(doc_type(" ", &[]));

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::StatusCode(200)));
        assert!(errors.contains(&ValidationError::ZeroTimeout));
        assert!(errors.contains(&ValidationError::EmptyTypeName));
        assert!(errors.contains(&ValidationError::DuplicateType("custom-page".into())));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Address { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Pattern { .. })));
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
