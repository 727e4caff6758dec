use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use tracing::debug;

use crate::dnssec::constants::{DEFAULT_MAX_CHAIN_DEPTH, DNSKEY_PROTOCOL};
use crate::dnssec::record::MAX_RDATA_LEN;
use crate::dnssec::{DigestType, Dnskey, Ds, Name, TrustAnchor, TrustAnchorStore};
use crate::error::{ConfigError, Result, read_file};

/// Upper bound accepted for `max_chain_depth`. DNS names have at most 127
/// labels, real chains rarely exceed a handful of zones.
const MAX_CHAIN_DEPTH_LIMIT: usize = 64;

/// A trust anchor as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnchorConfig {
    /// DS form, as published in root-anchors.xml
    Ds {
        zone: String,
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        /// Hex digest, whitespace allowed
        digest: String,
    },
    /// Full DNSKEY form
    Dnskey {
        zone: String,
        flags: u16,
        #[serde(default = "default_protocol")]
        protocol: u8,
        algorithm: u8,
        /// Base64 public key, whitespace allowed
        public_key: String,
    },
}

fn default_protocol() -> u8 {
    DNSKEY_PROTOCOL
}

impl AnchorConfig {
    pub fn zone(&self) -> &str {
        match self {
            Self::Ds { zone, .. } | Self::Dnskey { zone, .. } => zone,
        }
    }

    /// Convert to a [`TrustAnchor`], checking the encoded fields
    pub fn to_trust_anchor(&self) -> Result<TrustAnchor> {
        let zone: Name = self.zone().parse()?;
        match self {
            Self::Ds {
                key_tag,
                algorithm,
                digest_type,
                digest,
                ..
            } => {
                let ds = decode_ds(*key_tag, *algorithm, *digest_type, digest)?;
                if let Some(problem) = digest_len_problem(&ds) {
                    return Err(ConfigError::InvalidAnchor(format!("{} {}", zone, problem)));
                }
                Ok(TrustAnchor::from_ds(zone, ds))
            }
            Self::Dnskey {
                flags,
                protocol,
                algorithm,
                public_key,
                ..
            } => {
                if *protocol != DNSKEY_PROTOCOL {
                    return Err(ConfigError::InvalidAnchor(format!(
                        "{} DNSKEY protocol must be {}, got {}",
                        zone, DNSKEY_PROTOCOL, protocol
                    )));
                }
                let key = Dnskey::new(*flags, *protocol, *algorithm, decode_base64(public_key)?);
                check_rdata_len(&key)?;
                if !key.is_zone_key() {
                    return Err(ConfigError::InvalidAnchor(format!(
                        "{} DNSKEY {} is not a zone key",
                        zone,
                        key.key_tag()
                    )));
                }
                Ok(TrustAnchor::from_dnskey(zone, key))
            }
        }
    }
}

/// Validator configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Seed the anchor store with the IANA root KSKs
    pub use_builtin_root_anchors: bool,

    /// Maximum number of zones in one chain
    pub max_chain_depth: usize,

    /// Optional TOML file with additional `[[trust_anchors]]`
    pub anchor_file: Option<PathBuf>,

    /// Inline trust anchors
    pub trust_anchors: Vec<AnchorConfig>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            use_builtin_root_anchors: true,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            anchor_file: None,
            trust_anchors: Vec::new(),
        }
    }
}

/// Layout of a standalone anchor file
#[derive(Debug, Default, Deserialize)]
struct AnchorFile {
    #[serde(default)]
    trust_anchors: Vec<AnchorConfig>,
}

impl ValidatorConfig {
    /// Create a ValidatorConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `DNSSEC_CHAIN_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(max_depth) = std::env::var("DNSSEC_CHAIN_MAX_DEPTH") {
            self.max_chain_depth =
                max_depth
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidValue {
                        var: "DNSSEC_CHAIN_MAX_DEPTH".to_string(),
                        value: max_depth.clone(),
                    })?;
        }

        if let Ok(builtin) = std::env::var("DNSSEC_CHAIN_BUILTIN_ROOT_ANCHORS") {
            self.use_builtin_root_anchors = parse_bool(&builtin, true);
        }

        if let Ok(anchor_file) = std::env::var("DNSSEC_CHAIN_ANCHOR_FILE") {
            self.anchor_file = (!anchor_file.trim().is_empty()).then(|| PathBuf::from(anchor_file));
        }

        Ok(())
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading validator configuration from {}", path.display());
        Self::from_toml_str(&read_file(path)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_chain_depth == 0 || self.max_chain_depth > MAX_CHAIN_DEPTH_LIMIT {
            return Err(ConfigError::InvalidValue {
                var: "max_chain_depth".to_string(),
                value: format!(
                    "{} (must be between 1 and {})",
                    self.max_chain_depth, MAX_CHAIN_DEPTH_LIMIT
                ),
            });
        }

        for anchor in &self.trust_anchors {
            anchor.to_trust_anchor()?;
        }

        Ok(())
    }

    /// Build the anchor store: built-in root anchors if enabled, then
    /// inline anchors, then the anchor file
    pub fn trust_anchor_store(&self) -> Result<TrustAnchorStore> {
        let mut store = if self.use_builtin_root_anchors {
            TrustAnchorStore::new()
        } else {
            TrustAnchorStore::empty()
        };

        for anchor in &self.trust_anchors {
            store.add_anchor(anchor.to_trust_anchor()?);
        }

        if let Some(path) = &self.anchor_file {
            let file: AnchorFile = toml::from_str(&read_file(path)?)?;
            debug!(
                "Loaded {} trust anchors from {}",
                file.trust_anchors.len(),
                path.display()
            );
            for anchor in &file.trust_anchors {
                store.add_anchor(anchor.to_trust_anchor()?);
            }
        }

        Ok(store)
    }
}

/// Decode base64 presentation data, ignoring embedded whitespace
pub(crate) fn decode_base64(input: &str) -> Result<Vec<u8>> {
    let compact: String = input.split_whitespace().collect();
    Ok(BASE64.decode(compact)?)
}

fn decode_ds(key_tag: u16, algorithm: u8, digest_type: u8, digest: &str) -> Result<Ds> {
    Ds::from_hex(key_tag, algorithm, digest_type, digest)
        .map_err(|err| ConfigError::InvalidHex(format!("{}: {}", digest, err)))
}

/// Describe a digest whose length does not fit its registered digest type
fn digest_len_problem(ds: &Ds) -> Option<String> {
    let digest_type = DigestType::from_u8(ds.digest_type())?;
    (ds.digest().len() != digest_type.digest_len()).then(|| {
        format!(
            "DS {} {} digest is {} bytes, expected {}",
            ds.key_tag(),
            digest_type,
            ds.digest().len(),
            digest_type.digest_len()
        )
    })
}

/// Parse a DS from presentation fields, rejecting a digest that is not
/// hex or has the wrong length for a registered digest type
pub(crate) fn parse_ds(key_tag: u16, algorithm: u8, digest_type: u8, digest: &str) -> Result<Ds> {
    let ds = decode_ds(key_tag, algorithm, digest_type, digest)?;
    match digest_len_problem(&ds) {
        Some(problem) => Err(ConfigError::InvalidHex(problem)),
        None => Ok(ds),
    }
}

/// DNSKEY RDATA must fit the 16-bit RDLENGTH field
pub(crate) fn check_rdata_len(key: &Dnskey) -> Result<()> {
    let len = key.rdata_len();
    if len > MAX_RDATA_LEN {
        return Err(ConfigError::Parse(format!(
            "DNSKEY RDATA is {} bytes, at most {} fit in a record",
            len, MAX_RDATA_LEN
        )));
    }
    Ok(())
}

/// Parse a boolean from a string, with a default value for invalid input
fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}
