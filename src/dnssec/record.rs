use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::{DnsSecAlgorithm, calculate_key_tag};

/// Record type numbers used by the validator
pub mod rtype {
    pub const DS: u16 = 43;
    pub const RRSIG: u16 = 46;
    pub const DNSKEY: u16 = 48;
}

/// The IN class
pub const CLASS_IN: u16 = 1;

/// Largest RDATA a resource record can carry (RDLENGTH is 16 bits)
pub const MAX_RDATA_LEN: usize = u16::MAX as usize;

/// Maximum wire length of a domain name (RFC 1035)
const MAX_NAME_LEN: usize = 255;

/// Maximum length of a single label (RFC 1035)
const MAX_LABEL_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("empty label in domain name")]
    EmptyLabel,
    #[error("label exceeds 63 octets: {0}")]
    LabelTooLong(String),
    #[error("domain name exceeds 255 octets")]
    NameTooLong,
}

/// An absolute domain name.
///
/// Labels are stored lowercased so that equality, hashing and the wire
/// encoding are all in DNSSEC canonical form (RFC 4034 section 6.2).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    labels: Vec<String>,
}

impl Name {
    /// The root name `.`
    pub fn root() -> Self {
        Self { labels: Vec::new() }
    }

    /// Build a name from its labels, leftmost first
    pub fn from_labels<I, S>(labels: I) -> Result<Self, NameError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        let mut wire_len = 1;
        for label in labels {
            let label = label.as_ref();
            if label.is_empty() {
                return Err(NameError::EmptyLabel);
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(NameError::LabelTooLong(label.to_string()));
            }
            wire_len += label.len() + 1;
            out.push(label.to_ascii_lowercase());
        }
        if wire_len > MAX_NAME_LEN {
            return Err(NameError::NameTooLong);
        }
        Ok(Self { labels: out })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of labels, not counting the root label
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// The name with its leftmost label removed, `None` for the root
    pub fn parent(&self) -> Option<Name> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            labels: self.labels[1..].to_vec(),
        })
    }

    /// Whether `self` equals `other` or lies below it
    pub fn is_subdomain_of(&self, other: &Name) -> bool {
        self.labels.len() >= other.labels.len()
            && self.labels[self.labels.len() - other.labels.len()..] == other.labels[..]
    }

    /// Whether `self` lies strictly below `other`
    pub fn is_strictly_below(&self, other: &Name) -> bool {
        self.labels.len() > other.labels.len() && self.is_subdomain_of(other)
    }

    /// The rightmost `count` labels of this name
    pub fn suffix(&self, count: usize) -> Name {
        let skip = self.labels.len().saturating_sub(count);
        Self {
            labels: self.labels[skip..].to_vec(),
        }
    }

    /// Append the uncompressed, lowercase wire form of the name
    pub fn compose_canonical(&self, buf: &mut Vec<u8>) {
        for label in &self.labels {
            buf.push(label.len() as u8);
            buf.extend_from_slice(label.as_bytes());
        }
        buf.push(0);
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_suffix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Self::from_labels(trimmed.split('.'))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in &self.labels {
            write!(f, "{}.", label)?;
        }
        Ok(())
    }
}

/// RDATA that can take part in an RRset covered by an RRSIG
pub trait RecordData {
    /// The record type number
    fn rtype(&self) -> u16;

    /// Append the canonical RDATA wire form
    fn compose_rdata(&self, buf: &mut Vec<u8>);

    fn rdata(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.compose_rdata(&mut buf);
        buf
    }
}

/// A DNSKEY record (RFC 4034 section 2)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dnskey {
    flags: u16,
    protocol: u8,
    algorithm: u8,
    public_key: Vec<u8>,
}

impl Dnskey {
    /// Zone Key flag, bit 7
    pub const ZONE_KEY: u16 = 0x0100;
    /// REVOKE flag, bit 8 (RFC 5011)
    pub const REVOKE: u16 = 0x0080;
    /// Secure Entry Point flag, bit 15
    pub const SEP: u16 = 0x0001;

    pub fn new(flags: u16, protocol: u8, algorithm: u8, public_key: Vec<u8>) -> Self {
        Self {
            flags,
            protocol,
            algorithm,
            public_key,
        }
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn protocol(&self) -> u8 {
        self.protocol
    }

    pub fn algorithm(&self) -> u8 {
        self.algorithm
    }

    pub fn sec_algorithm(&self) -> Option<DnsSecAlgorithm> {
        DnsSecAlgorithm::from_u8(self.algorithm)
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn is_zone_key(&self) -> bool {
        self.flags & Self::ZONE_KEY != 0
    }

    pub fn is_sep(&self) -> bool {
        self.flags & Self::SEP != 0
    }

    pub fn is_revoked(&self) -> bool {
        self.flags & Self::REVOKE != 0
    }

    pub fn key_tag(&self) -> u16 {
        calculate_key_tag(&self.rdata())
    }

    /// Length of the DNSKEY RDATA
    pub fn rdata_len(&self) -> usize {
        4 + self.public_key.len()
    }
}

impl RecordData for Dnskey {
    fn rtype(&self) -> u16 {
        rtype::DNSKEY
    }

    fn compose_rdata(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.flags.to_be_bytes());
        buf.push(self.protocol);
        buf.push(self.algorithm);
        buf.extend_from_slice(&self.public_key);
    }
}

/// A DS record (RFC 4034 section 5)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ds {
    key_tag: u16,
    algorithm: u8,
    digest_type: u8,
    digest: Vec<u8>,
}

impl Ds {
    pub fn new(key_tag: u16, algorithm: u8, digest_type: u8, digest: impl Into<Vec<u8>>) -> Self {
        Self {
            key_tag,
            algorithm,
            digest_type,
            digest: digest.into(),
        }
    }

    /// Parse a hex presentation digest, which may be split by whitespace
    /// and is case-insensitive
    pub fn from_hex(
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        digest: &str,
    ) -> Result<Self, hex::FromHexError> {
        let compact: String = digest.split_whitespace().collect();
        Ok(Self::new(key_tag, algorithm, digest_type, hex::decode(compact)?))
    }

    pub fn key_tag(&self) -> u16 {
        self.key_tag
    }

    pub fn algorithm(&self) -> u8 {
        self.algorithm
    }

    pub fn digest_type(&self) -> u8 {
        self.digest_type
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }
}

impl RecordData for Ds {
    fn rtype(&self) -> u16 {
        rtype::DS
    }

    fn compose_rdata(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.key_tag.to_be_bytes());
        buf.push(self.algorithm);
        buf.push(self.digest_type);
        buf.extend_from_slice(&self.digest);
    }
}

/// Opaque RDATA of any type, already in canonical form
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RawData {
    rtype: u16,
    data: Vec<u8>,
}

impl RawData {
    pub fn new(rtype: u16, data: Vec<u8>) -> Self {
        Self { rtype, data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl RecordData for RawData {
    fn rtype(&self) -> u16 {
        self.rtype
    }

    fn compose_rdata(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.data);
    }
}

/// An RRSIG record (RFC 4034 section 3)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rrsig {
    type_covered: u16,
    algorithm: u8,
    labels: u8,
    original_ttl: u32,
    expiration: u32,
    inception: u32,
    key_tag: u16,
    signer_name: Name,
    signature: Vec<u8>,
}

impl Rrsig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        type_covered: u16,
        algorithm: u8,
        labels: u8,
        original_ttl: u32,
        expiration: u32,
        inception: u32,
        key_tag: u16,
        signer_name: Name,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer_name,
            signature,
        }
    }

    /// Replace the signature bytes
    pub fn with_signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = signature;
        self
    }

    pub fn type_covered(&self) -> u16 {
        self.type_covered
    }

    pub fn algorithm(&self) -> u8 {
        self.algorithm
    }

    pub fn labels(&self) -> u8 {
        self.labels
    }

    pub fn original_ttl(&self) -> u32 {
        self.original_ttl
    }

    pub fn expiration(&self) -> u32 {
        self.expiration
    }

    pub fn inception(&self) -> u32 {
        self.inception
    }

    pub fn key_tag(&self) -> u16 {
        self.key_tag
    }

    pub fn signer_name(&self) -> &Name {
        &self.signer_name
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Whether `now` lies within the inclusive validity window.
    ///
    /// The timestamps are 32-bit serial numbers (RFC 4034 section 3.1.5),
    /// so the comparison wraps instead of comparing absolute values.
    pub fn is_valid_at(&self, now: u32) -> bool {
        let since_inception = now.wrapping_sub(self.inception) as i32;
        let until_expiration = self.expiration.wrapping_sub(now) as i32;
        since_inception >= 0 && until_expiration >= 0
    }

    /// Append the RRSIG RDATA without the signature field, signer name in
    /// canonical form
    pub fn compose_unsigned(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.type_covered.to_be_bytes());
        buf.push(self.algorithm);
        buf.push(self.labels);
        buf.extend_from_slice(&self.original_ttl.to_be_bytes());
        buf.extend_from_slice(&self.expiration.to_be_bytes());
        buf.extend_from_slice(&self.inception.to_be_bytes());
        buf.extend_from_slice(&self.key_tag.to_be_bytes());
        self.signer_name.compose_canonical(buf);
    }
}

/// Records of one type sharing owner and class
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordSet<D> {
    owner: Name,
    class: u16,
    ttl: u32,
    records: Vec<D>,
}

impl<D: RecordData> RecordSet<D> {
    pub fn new(owner: Name, class: u16, ttl: u32, records: Vec<D>) -> Self {
        Self {
            owner,
            class,
            ttl,
            records,
        }
    }

    pub fn owner(&self) -> &Name {
        &self.owner
    }

    pub fn class(&self) -> u16 {
        self.class
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn records(&self) -> &[D] {
        &self.records
    }

    /// Type of the set, taken from its first record
    pub fn rtype(&self) -> Option<u16> {
        self.records.first().map(RecordData::rtype)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// An RRset together with the RRSIGs asserted over it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedRecordSet<D> {
    rrset: RecordSet<D>,
    signatures: Vec<Rrsig>,
}

impl<D: RecordData> SignedRecordSet<D> {
    pub fn new(rrset: RecordSet<D>, signatures: Vec<Rrsig>) -> Self {
        Self { rrset, signatures }
    }

    pub fn rrset(&self) -> &RecordSet<D> {
        &self.rrset
    }

    pub fn records(&self) -> &[D] {
        self.rrset.records()
    }

    pub fn signatures(&self) -> &[Rrsig] {
        &self.signatures
    }

    pub fn owner(&self) -> &Name {
        self.rrset.owner()
    }
}
