//! Configuration types for the lease store.
//!
//! Configuration is owned by the embedding server and handed to the store at
//! construction. All config structs validate their values at construction time
//! via fallible builders. Post-deserialization validation is available via the
//! `validate()` method.

mod lease_store;

pub use lease_store::*;
use snafu::Snafu;

/// Configuration validation error.
///
/// Returned when a configuration value is outside its valid range.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// A configuration value is invalid.
    #[snafu(display("invalid config: {message}"))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    // =========================================================================
    // LeaseStoreConfig validation tests
    // =========================================================================

    #[test]
    fn test_lease_store_config_defaults_are_valid() {
        let config = LeaseStoreConfig::builder().build().expect("defaults should be valid");
        assert!(config.extended_info_tables);
        assert_eq!(config.threading_mode, ThreadingMode::SingleThreaded);
        assert_eq!(config.max_page_size, 65_536);
        assert_eq!(config, LeaseStoreConfig::default());
    }

    #[test]
    fn test_lease_store_config_builder_with_custom_values() {
        let config = LeaseStoreConfig::builder()
            .extended_info_tables(false)
            .threading_mode(ThreadingMode::MultiThreaded)
            .max_page_size(10)
            .build()
            .expect("valid custom config");
        assert!(!config.extended_info_tables);
        assert!(config.threading_mode.is_multi_threaded());
        assert_eq!(config.max_page_size, 10);
    }

    #[test]
    fn test_lease_store_config_zero_max_page_size() {
        let result = LeaseStoreConfig::builder().max_page_size(0).build();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("max_page_size"));
    }

    #[test]
    fn test_lease_store_config_deserialize_uses_defaults() {
        let config: LeaseStoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LeaseStoreConfig::default());

        let config: LeaseStoreConfig = serde_json::from_str(
            r#"{"extended_info_tables": false, "threading_mode": "multi-threaded"}"#,
        )
        .unwrap();
        assert!(!config.extended_info_tables);
        assert_eq!(config.threading_mode, ThreadingMode::MultiThreaded);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lease_store_config_validate_after_deserialize() {
        let config: LeaseStoreConfig = serde_json::from_str(r#"{"max_page_size": 0}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lease_store_config_serde_roundtrip() {
        let config = LeaseStoreConfig::builder()
            .threading_mode(ThreadingMode::MultiThreaded)
            .max_page_size(512)
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: LeaseStoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_lease_store_config_json_schema_lists_fields() {
        let schema = schemars::schema_for!(LeaseStoreConfig);
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("extended_info_tables"));
        assert!(json.contains("threading_mode"));
        assert!(json.contains("max_page_size"));
    }
}
