//! Data-path security configuration.
//!
//! The engine never performs cryptography. It only checks that the
//! configuration is well formed and that the firmware advertises the suite
//! before forwarding it.

use std::fmt;

use super::capabilities::{Capabilities, CipherSuite};
use super::errors::AwareError;

/// PMK length in bytes.
pub const PMK_LEN: usize = 32;

/// PMKID length in bytes.
pub const PMKID_LEN: usize = 16;

/// Minimum passphrase length in characters.
pub const PASSPHRASE_MIN_LEN: usize = 8;

/// Maximum passphrase length in characters.
pub const PASSPHRASE_MAX_LEN: usize = 63;

/// Security settings for one data path.
///
/// At most one of `pmk` and `passphrase` may be set. Neither set means an open
/// (unencrypted) path.
#[derive(Clone, PartialEq, Eq)]
pub struct DataPathSecurityConfig {
    /// Cipher suite to negotiate (ignored for open paths).
    pub cipher_suite: CipherSuite,
    /// Pairwise master key.
    pub pmk: Option<Vec<u8>>,
    /// Passphrase from which the firmware derives the PMK.
    pub passphrase: Option<String>,
    /// PMK identifier for public-key suites.
    pub pmkid: Option<Vec<u8>>,
}

impl DataPathSecurityConfig {
    /// Open, unencrypted path.
    pub fn open() -> Self {
        Self {
            cipher_suite: CipherSuite::SharedKey128,
            pmk: None,
            passphrase: None,
            pmkid: None,
        }
    }

    /// Path secured with a raw PMK.
    pub fn with_pmk(cipher_suite: CipherSuite, pmk: Vec<u8>) -> Self {
        Self {
            cipher_suite,
            pmk: Some(pmk),
            passphrase: None,
            pmkid: None,
        }
    }

    /// Path secured with a passphrase.
    pub fn with_passphrase(cipher_suite: CipherSuite, passphrase: impl Into<String>) -> Self {
        Self {
            cipher_suite,
            pmk: None,
            passphrase: Some(passphrase.into()),
            pmkid: None,
        }
    }

    /// True when neither PMK nor passphrase is set.
    pub fn is_open(&self) -> bool {
        self.pmk.is_none() && self.passphrase.is_none()
    }

    /// Check the configuration is well formed.
    pub fn validate(&self) -> Result<(), AwareError> {
        if self.pmk.is_some() && self.passphrase.is_some() {
            return Err(AwareError::InvalidSecurityConfig(
                "both PMK and passphrase set".to_string(),
            ));
        }
        if let Some(pmk) = &self.pmk {
            if pmk.len() != PMK_LEN {
                return Err(AwareError::InvalidSecurityConfig(format!(
                    "PMK must be {PMK_LEN} bytes, got {}",
                    pmk.len()
                )));
            }
        }
        if let Some(passphrase) = &self.passphrase {
            let len = passphrase.chars().count();
            if !passphrase.is_ascii() || !(PASSPHRASE_MIN_LEN..=PASSPHRASE_MAX_LEN).contains(&len) {
                return Err(AwareError::InvalidSecurityConfig(format!(
                    "passphrase must be {PASSPHRASE_MIN_LEN}..={PASSPHRASE_MAX_LEN} ASCII characters"
                )));
            }
        }
        if let Some(pmkid) = &self.pmkid {
            if self.is_open() {
                return Err(AwareError::InvalidSecurityConfig(
                    "PMKID set on an open path".to_string(),
                ));
            }
            if pmkid.len() != PMKID_LEN {
                return Err(AwareError::InvalidSecurityConfig(format!(
                    "PMKID must be {PMKID_LEN} bytes, got {}",
                    pmkid.len()
                )));
            }
        }
        Ok(())
    }

    /// Check the firmware can honour this configuration.
    ///
    /// Open paths are always supported. Secured paths need a capability
    /// snapshot that lists the cipher suite.
    pub fn check_supported(&self, capabilities: Option<&Capabilities>) -> Result<(), AwareError> {
        if self.is_open() {
            return Ok(());
        }
        let Some(capabilities) = capabilities else {
            return Err(AwareError::UnsupportedSecurityConfig(
                "firmware capabilities not yet known".to_string(),
            ));
        };
        if !capabilities.supported_cipher_suites.contains(self.cipher_suite) {
            return Err(AwareError::UnsupportedSecurityConfig(format!(
                "cipher suite {:?} not supported",
                self.cipher_suite
            )));
        }
        Ok(())
    }
}

impl Default for DataPathSecurityConfig {
    fn default() -> Self {
        Self::open()
    }
}

// Key material stays out of logs.
impl fmt::Debug for DataPathSecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataPathSecurityConfig")
            .field("cipher_suite", &self.cipher_suite)
            .field("pmk", &self.pmk.as_ref().map(|_| "<redacted>"))
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .field("pmkid", &self.pmkid.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capabilities::CipherSuites;

    #[test]
    fn test_open_config_is_valid_and_supported_without_capabilities() {
        let config = DataPathSecurityConfig::open();
        assert!(config.is_open());
        assert!(config.validate().is_ok());
        assert!(config.check_supported(None).is_ok());
    }

    #[test]
    fn test_pmk_and_passphrase_together_rejected() {
        let mut config = DataPathSecurityConfig::with_pmk(CipherSuite::SharedKey128, vec![0; 32]);
        config.passphrase = Some("correct horse".to_string());
        assert!(matches!(
            config.validate(),
            Err(AwareError::InvalidSecurityConfig(_))
        ));
    }

    #[test]
    fn test_pmk_length_enforced() {
        let config = DataPathSecurityConfig::with_pmk(CipherSuite::SharedKey128, vec![0; 16]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_passphrase_length_enforced() {
        let short = DataPathSecurityConfig::with_passphrase(CipherSuite::SharedKey128, "short");
        assert!(short.validate().is_err());

        let ok = DataPathSecurityConfig::with_passphrase(CipherSuite::SharedKey128, "long enough");
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_pmkid_on_open_path_rejected() {
        let mut config = DataPathSecurityConfig::open();
        config.pmkid = Some(vec![0; PMKID_LEN]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secured_path_needs_capabilities() {
        let config = DataPathSecurityConfig::with_pmk(CipherSuite::SharedKey256, vec![1; 32]);
        assert!(matches!(
            config.check_supported(None),
            Err(AwareError::UnsupportedSecurityConfig(_))
        ));
    }

    #[test]
    fn test_cipher_suite_must_be_advertised() {
        let caps = Capabilities {
            supported_cipher_suites: CipherSuites::from_suites(&[CipherSuite::SharedKey128]),
            ..Capabilities::default()
        };
        let unsupported =
            DataPathSecurityConfig::with_pmk(CipherSuite::PublicKey2Way128, vec![1; 32]);
        assert!(unsupported.check_supported(Some(&caps)).is_err());

        let supported = DataPathSecurityConfig::with_pmk(CipherSuite::SharedKey128, vec![1; 32]);
        assert!(supported.check_supported(Some(&caps)).is_ok());
    }

    #[test]
    fn test_debug_redacts_key_material() {
        let config = DataPathSecurityConfig::with_passphrase(CipherSuite::SharedKey128, "hunter22hunter");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter"));
        assert!(rendered.contains("<redacted>"));
    }
}
