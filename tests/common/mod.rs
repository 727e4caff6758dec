//! Common test utilities for chain-of-trust tests
//!
//! Zones are signed on the fly with Ed25519 keys so that every test runs
//! against real signatures.

#![allow(dead_code)] // These functions are used by various test files

use dnssec_chain::dnssec::canonical;
use dnssec_chain::dnssec::record::CLASS_IN;
use dnssec_chain::dnssec::{
    Delegation, DigestPrimitive, DigestType, DnsSecValidator, Dnskey, Ds, Name, RecordData,
    RecordSet, RingCrypto, Rrsig, SignedRecordSet, TrustAnchor, TrustAnchorStore, TrustChain,
    ZoneId, ZoneTrustNode,
};
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};

/// Fixed validation time used by all tests
pub const NOW: u32 = 1_700_000_000;
pub const INCEPTION: u32 = NOW - 86_400;
pub const EXPIRATION: u32 = NOW + 30 * 86_400;

const ED25519: u8 = 15;

pub fn name(s: &str) -> Name {
    s.parse().unwrap()
}

/// Validator pinned to [`NOW`]
pub fn validator() -> DnsSecValidator {
    DnsSecValidator::new().at_time(NOW)
}

/// An Ed25519 signing key and its DNSKEY
pub struct TestKey {
    pair: Ed25519KeyPair,
    pub dnskey: Dnskey,
}

impl TestKey {
    pub fn generate(flags: u16) -> Self {
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&SystemRandom::new()).unwrap();
        let pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
        let dnskey = Dnskey::new(flags, 3, ED25519, pair.public_key().as_ref().to_vec());
        Self { pair, dnskey }
    }

    pub fn ksk() -> Self {
        Self::generate(257)
    }

    pub fn zsk() -> Self {
        Self::generate(256)
    }

    pub fn key_tag(&self) -> u16 {
        self.dnskey.key_tag()
    }

    /// Sign `rrset` as `signer`, valid around [`NOW`]
    pub fn sign<D: RecordData>(&self, rrset: &RecordSet<D>, signer: &Name) -> Rrsig {
        self.sign_with_window(rrset, signer, INCEPTION, EXPIRATION)
    }

    pub fn sign_with_window<D: RecordData>(
        &self,
        rrset: &RecordSet<D>,
        signer: &Name,
        inception: u32,
        expiration: u32,
    ) -> Rrsig {
        let unsigned = Rrsig::new(
            rrset.rtype().unwrap(),
            ED25519,
            rrset.owner().label_count() as u8,
            rrset.ttl(),
            expiration,
            inception,
            self.key_tag(),
            signer.clone(),
            Vec::new(),
        );
        let data = canonical::signed_data(&unsigned, rrset).unwrap();
        let signature = self.pair.sign(&data).as_ref().to_vec();
        unsigned.with_signature(signature)
    }
}

/// SHA-256 DS record for `key` owned by `owner`
pub fn ds_for(owner: &Name, key: &Dnskey) -> Ds {
    let digest = RingCrypto
        .digest(owner, key, DigestType::Sha256)
        .unwrap();
    Ds::new(key.key_tag(), key.algorithm(), 2, digest)
}

/// A signed zone with one KSK and one ZSK. The KSK signs the DNSKEY set,
/// the ZSK signs everything else, including DS sets for children.
pub struct TestZone {
    pub name: Name,
    pub ksk: TestKey,
    pub zsk: TestKey,
}

impl TestZone {
    pub fn new(zone: &str) -> Self {
        let ksk = TestKey::ksk();
        let mut zsk = TestKey::zsk();
        // The registry keeps one key per tag
        while zsk.key_tag() == ksk.key_tag() {
            zsk = TestKey::zsk();
        }
        Self {
            name: name(zone),
            ksk,
            zsk,
        }
    }

    pub fn dnskey_rrset(&self) -> RecordSet<Dnskey> {
        RecordSet::new(
            self.name.clone(),
            CLASS_IN,
            3600,
            vec![self.ksk.dnskey.clone(), self.zsk.dnskey.clone()],
        )
    }

    /// DNSKEY set signed by the KSK
    pub fn signed_dnskey_set(&self) -> SignedRecordSet<Dnskey> {
        let rrset = self.dnskey_rrset();
        let rrsig = self.ksk.sign(&rrset, &self.name);
        SignedRecordSet::new(rrset, vec![rrsig])
    }

    /// DS record the parent publishes for this zone
    pub fn ds(&self) -> Ds {
        ds_for(&self.name, &self.ksk.dnskey)
    }

    /// DS anchor for this zone's KSK
    pub fn anchor(&self) -> TrustAnchor {
        TrustAnchor::from_ds(self.name.clone(), self.ds())
    }

    /// Signed delegation from this zone to `child`
    pub fn delegate(&self, child: &TestZone) -> Delegation {
        self.delegate_ds(child, vec![child.ds()])
    }

    /// Signed delegation to `child` carrying `ds_records`
    pub fn delegate_ds(&self, child: &TestZone, ds_records: Vec<Ds>) -> Delegation {
        let rrset = RecordSet::new(child.name.clone(), CLASS_IN, 86_400, ds_records);
        let rrsig = self.zsk.sign(&rrset, &self.name);
        Delegation::Signed(SignedRecordSet::new(rrset, vec![rrsig]))
    }

    pub fn node(&self, delegation: Delegation) -> ZoneTrustNode {
        ZoneTrustNode::new(self.signed_dnskey_set(), delegation)
    }
}

/// A three-zone hierarchy: anchored root, `com.` and `example.com.`
pub struct SecureHierarchy {
    pub root: TestZone,
    pub com: TestZone,
    pub example: TestZone,
}

impl SecureHierarchy {
    pub fn new() -> Self {
        Self {
            root: TestZone::new("."),
            com: TestZone::new("com."),
            example: TestZone::new("example.com."),
        }
    }

    /// Anchor store trusting only this hierarchy's root
    pub fn anchors(&self) -> TrustAnchorStore {
        let mut anchors = TrustAnchorStore::empty();
        anchors.add_anchor(self.root.anchor());
        anchors
    }

    /// Chain with the default delegations
    pub fn chain(&self) -> (TrustChain, [ZoneId; 3]) {
        self.chain_with(
            self.com.node(self.root.delegate(&self.com)),
            self.example.node(self.com.delegate(&self.example)),
        )
    }

    /// Chain with custom `com.` and `example.com.` nodes
    pub fn chain_with(&self, com: ZoneTrustNode, example: ZoneTrustNode) -> (TrustChain, [ZoneId; 3]) {
        let mut chain = TrustChain::new();
        let root = chain
            .add_zone(self.root.node(Delegation::TrustAnchor), None)
            .unwrap();
        let com = chain.add_zone(com, Some(root)).unwrap();
        let example = chain.add_zone(example, Some(com)).unwrap();
        (chain, [root, com, example])
    }
}
