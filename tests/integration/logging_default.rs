//! Logging initialization with default configuration.

use strata::error::ConfigError;
use strata::logging::{init_logging, LoggingConfig};

#[test]
fn test_init_logging_defaults_then_rejects_reinit() {
    init_logging(None).unwrap();

    // The global subscriber is process-wide; a second install must fail
    // loudly instead of silently replacing it.
    let config = LoggingConfig::default();
    assert!(matches!(
        init_logging(Some(&config)),
        Err(ConfigError::Logging(_))
    ));
}
