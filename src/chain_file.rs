//! TOML description of an already-fetched chain of trust.
//!
//! ```toml
//! [[zone]]
//! name = "."
//! delegation = "anchor"
//! ttl = 172800
//! dnskey = [{ flags = 257, algorithm = 8, public_key = "AwEAAa..." }]
//!
//! [[zone.dnskey_rrsig]]
//! algorithm = 8
//! labels = 0
//! original_ttl = 172800
//! expiration = "20190611000000"
//! inception = "20190521000000"
//! key_tag = 20326
//! signer = "."
//! signature = "otBkINZA..."
//!
//! [[zone]]
//! name = "example."
//! delegation = "signed"
//! ds = [{ key_tag = 31589, algorithm = 8, digest_type = 2, digest = "CDE0..." }]
//! ```
//!
//! Zones are listed parent first. A zone's `parent` defaults to the closest
//! enclosing zone listed before it, except for anchored zones which start
//! a new chain unless a parent is named.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

use crate::config::{check_rdata_len, decode_base64, parse_ds};
use crate::dnssec::constants::DNSKEY_PROTOCOL;
use crate::dnssec::record::{CLASS_IN, rtype};
use crate::dnssec::{
    Delegation, Dnskey, Ds, Name, RecordSet, Rrsig, SignedRecordSet, TrustChain, ZoneId,
    ZoneTrustNode,
};
use crate::error::{ConfigError, Result, read_file};

const DEFAULT_TTL: u32 = 3600;

/// A whole chain file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainFile {
    #[serde(rename = "zone", default)]
    pub zones: Vec<ZoneEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelegationKind {
    /// Authenticated by a configured trust anchor
    Anchor,
    /// Authenticated by DS records in the parent
    Signed,
    /// The parent proves there is no DS
    Insecure,
}

/// One zone of the chain
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneEntry {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub delegation: DelegationKind,
    #[serde(default = "default_class")]
    pub class: u16,
    /// TTL of the DNSKEY RRset
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub dnskey: Vec<DnskeyEntry>,
    #[serde(default)]
    pub dnskey_rrsig: Vec<RrsigEntry>,
    /// TTL of the DS RRset in the parent
    #[serde(default = "default_ttl")]
    pub ds_ttl: u32,
    #[serde(default)]
    pub ds: Vec<DsEntry>,
    #[serde(default)]
    pub ds_rrsig: Vec<RrsigEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DnskeyEntry {
    pub flags: u16,
    #[serde(default = "default_protocol")]
    pub protocol: u8,
    pub algorithm: u8,
    /// Base64 public key
    pub public_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DsEntry {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: String,
}

/// An RRSIG in presentation form
#[derive(Debug, Clone, Deserialize)]
pub struct RrsigEntry {
    /// Defaults to the type of the RRset the signature is listed under
    #[serde(default)]
    pub type_covered: Option<u16>,
    pub algorithm: u8,
    /// Defaults to the owner's label count
    #[serde(default)]
    pub labels: Option<u8>,
    /// Defaults to the RRset TTL
    #[serde(default)]
    pub original_ttl: Option<u32>,
    pub expiration: Timestamp,
    pub inception: Timestamp,
    pub key_tag: u16,
    pub signer: String,
    /// Base64 signature
    pub signature: String,
}

/// RRSIG time as seconds since the epoch or `YYYYMMDDHHmmSS`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Seconds(u32),
    Text(String),
}

impl Timestamp {
    pub fn to_serial(&self) -> Result<u32> {
        match self {
            Self::Seconds(secs) => Ok(*secs),
            Self::Text(text) => parse_timestamp(text),
        }
    }
}

fn default_class() -> u16 {
    CLASS_IN
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

fn default_protocol() -> u8 {
    DNSKEY_PROTOCOL
}

/// Parse an RRSIG timestamp.
///
/// Accepts `YYYYMMDDHHmmSS` (UTC), plain seconds since the epoch, and
/// RFC 3339. Times past 2106 wrap as serial numbers.
pub fn parse_timestamp(input: &str) -> Result<u32> {
    let input = input.trim();
    let invalid = || ConfigError::InvalidTimestamp(input.to_string());

    let secs = if input.len() == 14 && input.bytes().all(|b| b.is_ascii_digit()) {
        NaiveDateTime::parse_from_str(input, "%Y%m%d%H%M%S")
            .map_err(|_| invalid())?
            .and_utc()
            .timestamp()
    } else if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
        input.parse::<i64>().map_err(|_| invalid())?
    } else {
        DateTime::parse_from_rfc3339(input)
            .map_err(|_| invalid())?
            .timestamp()
    };

    if secs < 0 {
        return Err(invalid());
    }
    Ok(secs as u32)
}

impl DnskeyEntry {
    fn to_dnskey(&self) -> Result<Dnskey> {
        let key = Dnskey::new(
            self.flags,
            self.protocol,
            self.algorithm,
            decode_base64(&self.public_key)?,
        );
        check_rdata_len(&key)?;
        Ok(key)
    }
}

impl DsEntry {
    fn to_ds(&self) -> Result<Ds> {
        parse_ds(self.key_tag, self.algorithm, self.digest_type, &self.digest)
    }
}

impl RrsigEntry {
    fn to_rrsig(&self, covered: u16, owner: &Name, ttl: u32) -> Result<Rrsig> {
        let labels = match self.labels {
            Some(labels) => labels,
            None => u8::try_from(owner.label_count()).map_err(|_| {
                ConfigError::Parse(format!("{} has too many labels for an RRSIG", owner))
            })?,
        };
        Ok(Rrsig::new(
            self.type_covered.unwrap_or(covered),
            self.algorithm,
            labels,
            self.original_ttl.unwrap_or(ttl),
            self.expiration.to_serial()?,
            self.inception.to_serial()?,
            self.key_tag,
            self.signer.parse()?,
            decode_base64(&self.signature)?,
        ))
    }
}

impl ZoneEntry {
    fn signed_dnskey_set(&self, owner: &Name) -> Result<SignedRecordSet<Dnskey>> {
        let keys = self
            .dnskey
            .iter()
            .map(DnskeyEntry::to_dnskey)
            .collect::<Result<Vec<_>>>()?;
        let signatures = self
            .dnskey_rrsig
            .iter()
            .map(|sig| sig.to_rrsig(rtype::DNSKEY, owner, self.ttl))
            .collect::<Result<Vec<_>>>()?;
        Ok(SignedRecordSet::new(
            RecordSet::new(owner.clone(), self.class, self.ttl, keys),
            signatures,
        ))
    }

    fn build_delegation(&self, owner: &Name) -> Result<Delegation> {
        Ok(match self.delegation {
            DelegationKind::Anchor => Delegation::TrustAnchor,
            DelegationKind::Insecure => Delegation::Unsigned,
            DelegationKind::Signed => {
                let records = self
                    .ds
                    .iter()
                    .map(DsEntry::to_ds)
                    .collect::<Result<Vec<_>>>()?;
                let signatures = self
                    .ds_rrsig
                    .iter()
                    .map(|sig| sig.to_rrsig(rtype::DS, owner, self.ds_ttl))
                    .collect::<Result<Vec<_>>>()?;
                Delegation::Signed(SignedRecordSet::new(
                    RecordSet::new(owner.clone(), self.class, self.ds_ttl, records),
                    signatures,
                ))
            }
        })
    }
}

impl ChainFile {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading chain from {}", path.display());
        Self::from_toml_str(&read_file(path)?)
    }

    /// Build a [`TrustChain`] holding every zone in file order
    pub fn build(&self, max_depth: usize) -> Result<TrustChain> {
        if self.zones.is_empty() {
            return Err(ConfigError::Parse("chain file lists no zones".to_string()));
        }

        let mut chain = TrustChain::with_max_depth(max_depth);
        for entry in &self.zones {
            let owner: Name = entry.name.parse()?;
            let parent = self.resolve_parent(&chain, entry, &owner)?;

            if entry.delegation == DelegationKind::Signed && parent.is_none() {
                return Err(ConfigError::Parse(format!(
                    "{} has a signed delegation but no parent zone",
                    owner
                )));
            }

            let node = ZoneTrustNode::new(entry.signed_dnskey_set(&owner)?, entry.build_delegation(&owner)?);
            chain.add_zone(node, parent)?;
        }
        Ok(chain)
    }

    fn resolve_parent(
        &self,
        chain: &TrustChain,
        entry: &ZoneEntry,
        owner: &Name,
    ) -> Result<Option<ZoneId>> {
        if let Some(parent) = &entry.parent {
            let parent: Name = parent.parse()?;
            return chain.find(&parent).map(Some).ok_or_else(|| {
                ConfigError::Parse(format!("parent {} of {} is not listed before it", parent, owner))
            });
        }

        if entry.delegation == DelegationKind::Anchor {
            return Ok(None);
        }

        Ok(chain
            .iter()
            .filter(|(_, node)| owner.is_strictly_below(node.zone()))
            .max_by_key(|(_, node)| node.zone().label_count())
            .map(|(id, _)| id))
    }
}
