//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sample ratio, timeouts)
//! - Check that addresses and the upstream URL parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {:?}", config.listener.bind_address),
        ));
    }

    if let Some(url) = &config.upstream.url {
        match Url::parse(url) {
            Ok(parsed) if parsed.scheme() != "http" => errors.push(ValidationError::new(
                "upstream.url",
                format!("unsupported scheme {:?}, expected http", parsed.scheme()),
            )),
            Ok(parsed) if parsed.host_str().is_none() => {
                errors.push(ValidationError::new("upstream.url", "missing host"))
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::new("upstream.url", e.to_string())),
        }
    }

    let ratio = config.tracing.sample_ratio;
    if !(0.0..=1.0).contains(&ratio) {
        errors.push(ValidationError::new(
            "tracing.sample_ratio",
            format!("must be within [0, 1], got {ratio}"),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {:?}", config.observability.metrics_address),
        ));
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

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&RelayConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = RelayConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.upstream.url = Some("https://backend.local".into());
        config.tracing.sample_ratio = 1.5;
        config.timeouts.request_secs = 0;
        config.observability.metrics_address = "also nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            [
                "listener.bind_address",
                "upstream.url",
                "tracing.sample_ratio",
                "timeouts.request_secs",
                "observability.metrics_address",
            ]
        );
    }

    #[test]
    fn test_unparseable_upstream() {
        let mut config = RelayConfig::default();
        config.upstream.url = Some("not a url".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "upstream.url");
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = RelayConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_nan_ratio_rejected() {
        let mut config = RelayConfig::default();
        config.tracing.sample_ratio = f64::NAN;
        assert!(validate_config(&config).is_err());
    }
}
