//! Fuzz target for lease deserialization.
//!
//! Arbitrary bytes fed to `serde_json` must either be rejected or produce a
//! lease whose DUID passed validation and which survives a serialize and
//! deserialize cycle unchanged.

#![no_main]

use lease6_types::{Lease6, LeaseStoreConfig, MAX_DUID_LENGTH};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(lease) = serde_json::from_slice::<Lease6>(data) {
        let duid = lease.duid.as_bytes();
        assert!(!duid.is_empty() && duid.len() <= MAX_DUID_LENGTH, "invalid DUID accepted");

        let encoded = serde_json::to_vec(&lease).expect("serialize lease");
        let decoded: Lease6 = serde_json::from_slice(&encoded).expect("reparse lease");
        assert_eq!(decoded, lease, "lease JSON roundtrip mismatch");
    }

    if let Ok(config) = serde_json::from_slice::<LeaseStoreConfig>(data) {
        // Deserialization does not validate; the manager must reject bad values.
        if config.validate().is_err() {
            assert!(lease6_state::LeaseManager::new(config).is_err());
        }
    }
});
