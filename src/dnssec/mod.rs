pub mod algorithm;
pub mod canonical;
pub mod chain;
pub mod crypto;
pub mod digest;
pub mod errors;
pub mod key_tag;
pub mod record;
pub mod registry;
pub mod trust_anchor;
pub mod validator;
pub mod zone;

pub use algorithm::DnsSecAlgorithm;
pub use chain::{TrustChain, ZoneId};
pub use crypto::{DigestPrimitive, RingCrypto, SignaturePrimitive};
pub use digest::DigestType;
pub use errors::{DnsSecError, SignatureFailure};
pub use key_tag::calculate_key_tag;
pub use record::{Dnskey, Ds, Name, RawData, RecordData, RecordSet, Rrsig, SignedRecordSet};
pub use registry::KeyRegistry;
pub use trust_anchor::{TrustAnchor, TrustAnchorStore};
pub use validator::{DnsSecValidator, DsMatch};
pub use zone::{Authentication, Delegation, ZoneTrustNode};

/// Trust verdict for a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The zone's keys are authenticated up to a trust anchor
    Secure,
    /// The zone, or an ancestor, is provably unsigned
    Insecure,
    /// Validation failed
    Bogus(DnsSecError),
    /// Validation could not complete with the data at hand
    Indeterminate(DnsSecError),
}

impl ValidationResult {
    /// Classify a validation failure
    pub fn from_error(err: DnsSecError) -> Self {
        if err.is_recoverable() {
            Self::Indeterminate(err)
        } else {
            Self::Bogus(err)
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Secure)
    }

    /// The underlying error for bogus and indeterminate verdicts
    pub fn error(&self) -> Option<&DnsSecError> {
        match self {
            Self::Bogus(err) | Self::Indeterminate(err) => Some(err),
            Self::Secure | Self::Insecure => None,
        }
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secure => write!(f, "secure"),
            Self::Insecure => write!(f, "insecure"),
            Self::Bogus(err) => write!(f, "bogus ({})", err),
            Self::Indeterminate(err) => write!(f, "indeterminate ({})", err),
        }
    }
}

/// DNSSEC constants
pub mod constants {
    /// Root KSK-2017 key tag
    pub const ROOT_KSK_2017_KEY_TAG: u16 = 20326;

    /// Root KSK-2024 key tag
    pub const ROOT_KSK_2024_KEY_TAG: u16 = 38696;

    /// SHA-256 DS digest of root KSK-2017
    pub const ROOT_KSK_2017_DIGEST: [u8; 32] = [
        0xe0, 0x6d, 0x44, 0xb8, 0x0b, 0x8f, 0x1d, 0x39, 0xa9, 0x5c, 0x0b, 0x0d, 0x7c, 0x65, 0xd0, 0x84,
        0x58, 0xe8, 0x80, 0x40, 0x9b, 0xbc, 0x68, 0x34, 0x57, 0x10, 0x42, 0x37, 0xc7, 0xf8, 0xec, 0x8d,
    ];

    /// SHA-256 DS digest of root KSK-2024
    pub const ROOT_KSK_2024_DIGEST: [u8; 32] = [
        0x68, 0x3d, 0x2d, 0x0a, 0xcb, 0x8c, 0x9b, 0x71, 0x2a, 0x19, 0x48, 0xb2, 0x7f, 0x74, 0x12, 0x19,
        0x29, 0x8d, 0x0a, 0x45, 0x0d, 0x61, 0x2c, 0x48, 0x3a, 0xf4, 0x44, 0xa4, 0xc0, 0xfb, 0x2b, 0x16,
    ];

    /// DNSKEY protocol field, always 3 (RFC 4034 section 2.1.2)
    pub const DNSKEY_PROTOCOL: u8 = 3;

    /// Default limit on zones between a trust anchor and a target
    pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 16;
}
