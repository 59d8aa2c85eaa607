//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Every problem is reported,
//! not just the first one.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::MarketConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &MarketConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: String| {
        errors.push(ValidationError { field, message });
    };

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        fail(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        );
    }

    if config.timeouts.request_secs == 0 {
        fail("timeouts.request_secs", "must be greater than zero".to_string());
    }

    if let Err(e) = url::Url::parse(&config.improve.base_url) {
        fail("improve.base_url", format!("invalid URL: {}", e));
    }

    if let Err(e) = url::Url::parse(&config.llm.base_url) {
        fail("llm.base_url", format!("invalid URL: {}", e));
    }

    if config.llm.model.trim().is_empty() {
        fail("llm.model", "must not be empty".to_string());
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        fail(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        );
    }

    let chain = &config.blockchain;
    if let Some(endpoint) = chain.endpoint() {
        if let Err(e) = url::Url::parse(endpoint) {
            fail("blockchain.rpc_url", format!("invalid URL: {}", e));
        }
    }
    if chain.contract_id.trim().is_empty() {
        fail("blockchain.contract_id", "must not be empty".to_string());
    }
    if chain.network_passphrase.is_empty() {
        fail("blockchain.network_passphrase", "must not be empty".to_string());
    }
    if chain.poll_attempts == 0 {
        fail("blockchain.poll_attempts", "must be at least 1".to_string());
    }
    if chain.poll_interval_ms == 0 {
        fail("blockchain.poll_interval_ms", "must be at least 1".to_string());
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
        assert!(validate_config(&MarketConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_failure() {
        let mut config = MarketConfig::default();
        config.listener.bind_address = "nope".to_string();
        config.blockchain.poll_attempts = 0;
        config.blockchain.contract_id = String::new();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["listener.bind_address", "blockchain.contract_id", "blockchain.poll_attempts"]
        );
    }

    #[test]
    fn test_unconfigured_endpoint_is_allowed() {
        let mut config = MarketConfig::default();
        config.blockchain.rpc_url = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = MarketConfig::default();
        config.observability.metrics_address = "bad".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
