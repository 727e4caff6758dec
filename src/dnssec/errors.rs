use thiserror::Error;

use super::record::Name;

/// Reasons a signature primitive rejects an RRSIG.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureFailure {
    #[error("unsupported DNSSEC algorithm {0}")]
    UnsupportedAlgorithm(u8),
    #[error("DNSKEY algorithm {key} does not match RRSIG algorithm {signature}")]
    AlgorithmMismatch { key: u8, signature: u8 },
    #[error("bad signature")]
    BadSignature,
    #[error("invalid DNSKEY public key")]
    InvalidPublicKey,
    #[error("DNSKEY does not have the Zone Key flag set")]
    NotAZoneKey,
    #[error("RRSIG covers type {covered} but the RRset has type {rrset}")]
    TypeCoveredMismatch { covered: u16, rrset: u16 },
    #[error("RRSIG labels field exceeds the owner name's label count")]
    LabelCountMismatch,
    #[error("RDATA of {0} bytes does not fit in a resource record")]
    RdataTooLong(usize),
    #[error("DNSKEY protocol field is {0}, expected 3")]
    InvalidProtocol(u8),
    #[error("RRSIG signer {signer} is not the expected zone {zone}")]
    SignerMismatch { signer: Name, zone: Name },
}

/// DNSSEC validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnsSecError {
    /// The referenced key tag has no entry in the zone's key registry
    #[error("DNSKEY with key tag {0} is not available")]
    KeyNotAvailable(u16),

    #[error("RRSIG verification failed: {0}")]
    SignatureInvalid(#[from] SignatureFailure),

    #[error("RRSIG validity period {inception}..={expiration} does not cover {now}")]
    ValidityPeriodExpired {
        inception: u32,
        expiration: u32,
        now: u32,
    },

    #[error("DS record digest does not match DNSKEY")]
    DsMismatch,

    #[error("no DS record uses a supported digest algorithm")]
    UnsupportedDigestAlgorithm,

    /// A signed delegation was supplied without any DS record in it
    #[error("DS record set is empty")]
    NoDsRecords,

    #[error("no RRSIG record found for RRset")]
    NoRrsig,

    /// Neither a DS record nor a trust anchor authenticates a key that signs
    /// the zone's DNSKEY set
    #[error("no authenticated key signs the DNSKEY set")]
    NoSecureEntryPoint,

    #[error("no trust anchor configured for {0}")]
    NoTrustAnchor(Name),

    /// The zone has a trust anchor but was presented as unsigned
    #[error("{0} has a trust anchor but an unsigned delegation")]
    AnchoredZoneUnsigned(Name),

    #[error("parent zone {0} is not trusted")]
    UntrustedParent(Name),

    #[error("{child} is not below its parent zone {parent}")]
    NotASubzone { child: Name, parent: Name },

    #[error("no zone with id {0} in the chain")]
    UnknownZone(usize),

    #[error("chain exceeds the maximum depth of {0} zones")]
    ChainTooDeep(usize),
}

impl DnsSecError {
    /// Whether fetching more data could turn this failure into a success.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::KeyNotAvailable(_) | Self::NoDsRecords)
    }
}

pub type Result<T> = std::result::Result<T, DnsSecError>;
