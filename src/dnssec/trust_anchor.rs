use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::debug;

use super::constants::{
    ROOT_KSK_2017_DIGEST, ROOT_KSK_2017_KEY_TAG, ROOT_KSK_2024_DIGEST, ROOT_KSK_2024_KEY_TAG,
};
use super::crypto::{DigestPrimitive, SignaturePrimitive};
use super::record::{Dnskey, Ds, Name};
use super::registry::KeyRegistry;
use super::{DigestType, DnsSecAlgorithm, DnsSecValidator};

static GLOBAL_ANCHORS: OnceLock<TrustAnchorStore> = OnceLock::new();

/// The trusted value of an anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorData {
    /// A complete DNSKEY
    Key(Dnskey),
    /// A DS digest of the anchored DNSKEY
    Digest(Ds),
}

/// A DNSSEC trust anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    /// Zone this anchor is for
    pub zone: Name,
    pub data: AnchorData,
}

impl TrustAnchor {
    pub fn from_dnskey(zone: Name, key: Dnskey) -> Self {
        Self {
            zone,
            data: AnchorData::Key(key),
        }
    }

    pub fn from_ds(zone: Name, ds: Ds) -> Self {
        Self {
            zone,
            data: AnchorData::Digest(ds),
        }
    }

    pub fn key_tag(&self) -> u16 {
        match &self.data {
            AnchorData::Key(key) => key.key_tag(),
            AnchorData::Digest(ds) => ds.key_tag(),
        }
    }

    /// Whether this anchor vouches for `key`
    pub fn authenticates<C>(&self, key: &Dnskey, validator: &DnsSecValidator<C>) -> bool
    where
        C: SignaturePrimitive + DigestPrimitive,
    {
        match &self.data {
            AnchorData::Key(anchor) => anchor == key,
            AnchorData::Digest(ds) => {
                ds.key_tag() == key.key_tag()
                    && validator.ds_matches_key(&self.zone, ds, key) == Some(true)
            }
        }
    }
}

/// Trust anchors, keyed by zone.
///
/// Built once during start-up and shared read-only afterwards, either
/// behind an `Arc` or through [`TrustAnchorStore::install_global`].
#[derive(Debug, Clone, Default)]
pub struct TrustAnchorStore {
    anchors: HashMap<Name, Vec<TrustAnchor>>,
}

impl TrustAnchorStore {
    /// Create a store holding the IANA root anchors
    pub fn new() -> Self {
        let mut store = Self::empty();
        store.add_root_trust_anchors();
        store
    }

    /// Create a store without any anchors
    pub fn empty() -> Self {
        Self::default()
    }

    /// Root KSK-2017 and KSK-2024 as published in root-anchors.xml
    fn add_root_trust_anchors(&mut self) {
        let root_ksk_2017 = Ds::new(
            ROOT_KSK_2017_KEY_TAG,
            DnsSecAlgorithm::RsaSha256.to_u8(),
            DigestType::Sha256.to_u8(),
            ROOT_KSK_2017_DIGEST,
        );
        let root_ksk_2024 = Ds::new(
            ROOT_KSK_2024_KEY_TAG,
            DnsSecAlgorithm::RsaSha256.to_u8(),
            DigestType::Sha256.to_u8(),
            ROOT_KSK_2024_DIGEST,
        );
        self.add_anchor(TrustAnchor::from_ds(Name::root(), root_ksk_2017));
        self.add_anchor(TrustAnchor::from_ds(Name::root(), root_ksk_2024));
    }

    pub fn add_anchor(&mut self, anchor: TrustAnchor) {
        self.anchors
            .entry(anchor.zone.clone())
            .or_default()
            .push(anchor);
    }

    /// Anchors configured for exactly `zone`
    pub fn get_anchors(&self, zone: &Name) -> &[TrustAnchor] {
        self.anchors.get(zone).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_anchor(&self, zone: &Name) -> bool {
        !self.get_anchors(zone).is_empty()
    }

    pub fn find_by_key_tag(&self, zone: &Name, key_tag: u16) -> Option<&TrustAnchor> {
        self.get_anchors(zone)
            .iter()
            .find(|anchor| anchor.key_tag() == key_tag)
    }

    /// Key tags of the keys in `keys` that an anchor for `zone` vouches for
    pub fn authenticated_keys<C>(
        &self,
        zone: &Name,
        keys: &KeyRegistry,
        validator: &DnsSecValidator<C>,
    ) -> Vec<u16>
    where
        C: SignaturePrimitive + DigestPrimitive,
    {
        let mut tags = Vec::new();
        for anchor in self.get_anchors(zone) {
            let Some(key) = keys.get_key_by_tag(anchor.key_tag()) else {
                continue;
            };
            if anchor.authenticates(key, validator) && !tags.contains(&anchor.key_tag()) {
                debug!("DNSKEY {} of {} matches trust anchor", anchor.key_tag(), zone);
                tags.push(anchor.key_tag());
            }
        }
        tags
    }

    /// Get the number of zones with trust anchors
    pub fn domain_count(&self) -> usize {
        self.anchors.len()
    }

    /// Total number of anchors
    pub fn len(&self) -> usize {
        self.anchors.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Install this store as the process-wide anchor set. Only the first
    /// call succeeds; later calls hand the store back.
    pub fn install_global(self) -> Result<&'static TrustAnchorStore, TrustAnchorStore> {
        GLOBAL_ANCHORS.set(self)?;
        Ok(GLOBAL_ANCHORS.get_or_init(TrustAnchorStore::new))
    }

    /// The process-wide anchor set, if one was installed
    pub fn global() -> Option<&'static TrustAnchorStore> {
        GLOBAL_ANCHORS.get()
    }
}
