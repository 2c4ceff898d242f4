//! # Capability Cache
//!
//! Holds the last capability snapshot reported by the firmware. The snapshot
//! is immutable once fetched; a later query replaces it wholesale.
//!
//! The cache is a cheap-to-clone handle so callers can read the snapshot
//! concurrently with the owner task, which is the only writer.

use parking_lot::RwLock;
use std::sync::Arc;

/// Data-path cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherSuite {
    /// Shared key, 128-bit.
    SharedKey128,
    /// Shared key, 256-bit.
    SharedKey256,
    /// Public key, two-way handshake, 128-bit.
    PublicKey2Way128,
    /// Public key, two-way handshake, 256-bit.
    PublicKey2Way256,
}

impl CipherSuite {
    const fn bit(self) -> u32 {
        match self {
            Self::SharedKey128 => 1 << 0,
            Self::SharedKey256 => 1 << 1,
            Self::PublicKey2Way128 => 1 << 2,
            Self::PublicKey2Way256 => 1 << 3,
        }
    }
}

/// Set of supported cipher suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CipherSuites(u32);

impl CipherSuites {
    /// No suite supported.
    pub const NONE: CipherSuites = CipherSuites(0);

    /// Build a set from a list of suites.
    pub fn from_suites(suites: &[CipherSuite]) -> Self {
        Self(suites.iter().fold(0, |acc, s| acc | s.bit()))
    }

    /// True if `suite` is in the set.
    pub const fn contains(&self, suite: CipherSuite) -> bool {
        self.0 & suite.bit() != 0
    }

    /// Raw bitmask as reported by firmware.
    pub const fn bits(&self) -> u32 {
        self.0
    }
}

/// Firmware capability snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Maximum concurrent NAN clusters.
    pub max_concurrent_clusters: u32,
    /// Maximum concurrent publish sessions.
    pub max_publishes: u32,
    /// Maximum concurrent subscribe sessions.
    pub max_subscribes: u32,
    /// Maximum service name length in bytes.
    pub max_service_name_len: usize,
    /// Maximum match filter length in bytes.
    pub max_match_filter_len: usize,
    /// Maximum service-specific info (and follow-up message) length in bytes.
    pub max_service_specific_info_len: usize,
    /// Maximum number of NAN data interfaces.
    pub max_ndi_interfaces: u32,
    /// Maximum concurrent data paths.
    pub max_ndp_sessions: u32,
    /// Maximum data-path app info length in bytes.
    pub max_app_info_len: usize,
    /// Maximum queued follow-up messages.
    pub max_queued_transmit_messages: u32,
    /// Cipher suites usable on data paths.
    pub supported_cipher_suites: CipherSuites,
    /// Whether instant communication mode can be enabled.
    pub instant_communication_supported: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            max_concurrent_clusters: 1,
            max_publishes: 8,
            max_subscribes: 8,
            max_service_name_len: 255,
            max_match_filter_len: 255,
            max_service_specific_info_len: 255,
            max_ndi_interfaces: 1,
            max_ndp_sessions: 8,
            max_app_info_len: 255,
            max_queued_transmit_messages: 6,
            supported_cipher_suites: CipherSuites::from_suites(&[
                CipherSuite::SharedKey128,
                CipherSuite::SharedKey256,
            ]),
            instant_communication_supported: false,
        }
    }
}

/// Shared handle to the latest capability snapshot.
#[derive(Debug, Clone, Default)]
pub struct CapabilityCache {
    inner: Arc<RwLock<Option<Arc<Capabilities>>>>,
}

impl CapabilityCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot, returning the stored copy.
    pub fn store(&self, capabilities: Capabilities) -> Arc<Capabilities> {
        let snapshot = Arc::new(capabilities);
        *self.inner.write() = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Latest snapshot, if one was ever fetched.
    pub fn snapshot(&self) -> Option<Arc<Capabilities>> {
        self.inner.read().clone()
    }

    /// True once a snapshot is present.
    pub fn is_populated(&self) -> bool {
        self.inner.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cipher_suite_membership() {
        let suites = CipherSuites::from_suites(&[CipherSuite::SharedKey128]);
        assert!(suites.contains(CipherSuite::SharedKey128));
        assert!(!suites.contains(CipherSuite::PublicKey2Way256));
        assert_eq!(suites.bits(), 1);
    }

    #[test]
    fn test_cache_starts_empty() {
        let cache = CapabilityCache::new();
        assert!(!cache.is_populated());
        assert!(cache.snapshot().is_none());
    }

    #[test]
    fn test_cache_clones_share_snapshot() {
        let cache = CapabilityCache::new();
        let reader = cache.clone();

        cache.store(Capabilities {
            max_publishes: 2,
            ..Capabilities::default()
        });

        let snapshot = reader.snapshot().expect("snapshot stored");
        assert_eq!(snapshot.max_publishes, 2);
    }

    #[test]
    fn test_store_replaces_previous_snapshot() {
        let cache = CapabilityCache::new();
        let first = cache.store(Capabilities::default());
        cache.store(Capabilities {
            max_ndp_sessions: 1,
            ..Capabilities::default()
        });

        // Previously handed-out snapshots are unaffected
        assert_eq!(first.max_ndp_sessions, 8);
        assert_eq!(cache.snapshot().map(|c| c.max_ndp_sessions), Some(1));
    }
}
