use tracing::debug;

use super::chain::ZoneId;
use super::crypto::{DigestPrimitive, SignaturePrimitive};
use super::errors::{Result, SignatureFailure};
use super::record::{Dnskey, Ds, Name, RecordData, RecordSet, Rrsig, SignedRecordSet};
use super::registry::KeyRegistry;
use super::trust_anchor::TrustAnchorStore;
use super::validator::{DnsSecValidator, DsMatch};
use super::{DigestType, DnsSecError};

/// How a zone's keys are vouched for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delegation {
    /// DS records published by the parent, with the parent's RRSIGs
    Signed(SignedRecordSet<Ds>),
    /// The parent provably publishes no DS for this zone. Proving that
    /// (NSEC/NSEC3) is the caller's job.
    Unsigned,
    /// Root of trust, authenticated by the trust anchor store
    TrustAnchor,
}

/// Outcome of authenticating a zone's DNSKEY set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authentication {
    /// A parent DS record vouches for a key that signs the DNSKEY set
    Delegated(DsMatch),
    /// A trust anchor vouches for a key that signs the DNSKEY set
    Anchored { key_tag: u16 },
    /// The zone is unsigned
    Unsigned,
}

/// One zone in a chain of trust
#[derive(Debug, Clone)]
pub struct ZoneTrustNode {
    zone: Name,
    dnskey: SignedRecordSet<Dnskey>,
    delegation: Delegation,
    keys: KeyRegistry,
    /// Index of the parent in the owning chain
    parent: Option<ZoneId>,
}

impl ZoneTrustNode {
    /// Create a node for the owner of `dnskey`, registering every key in
    /// the set
    pub fn new(dnskey: SignedRecordSet<Dnskey>, delegation: Delegation) -> Self {
        let keys = KeyRegistry::from_keys(dnskey.records());
        Self {
            zone: dnskey.owner().clone(),
            dnskey,
            delegation,
            keys,
            parent: None,
        }
    }

    pub fn zone(&self) -> &Name {
        &self.zone
    }

    pub fn dnskey_set(&self) -> &SignedRecordSet<Dnskey> {
        &self.dnskey
    }

    pub fn delegation(&self) -> &Delegation {
        &self.delegation
    }

    pub fn keys(&self) -> &KeyRegistry {
        &self.keys
    }

    pub fn parent(&self) -> Option<ZoneId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: ZoneId) {
        self.parent = Some(parent);
    }

    pub fn add_signing_key(&mut self, key: Dnskey) {
        self.keys.add_signing_key(key);
    }

    pub fn get_key_by_tag(&self, tag: u16) -> Option<&Dnskey> {
        self.keys.get_key_by_tag(tag)
    }

    /// Validate an RRSIG made with one of this zone's keys
    pub fn validate_rrsig<C, D>(
        &self,
        validator: &DnsSecValidator<C>,
        rrsig: &Rrsig,
        rrset: &RecordSet<D>,
    ) -> Result<()>
    where
        C: SignaturePrimitive + DigestPrimitive,
        D: RecordData,
    {
        validator.validate_rrsig(&self.keys, rrsig, rrset)
    }

    /// Validate that a DS record from the parent matches one of this
    /// zone's keys
    pub fn validate_ds<C>(&self, validator: &DnsSecValidator<C>, ds_set: &[Ds]) -> Result<DsMatch>
    where
        C: SignaturePrimitive + DigestPrimitive,
    {
        validator.validate_ds(&self.keys, &self.zone, ds_set)
    }

    /// Check that the DNSKEY set is signed by one of its own keys and
    /// return the tags of every key with a valid signature over it.
    pub fn validate_key_set<C>(&self, validator: &DnsSecValidator<C>) -> Result<Vec<u16>>
    where
        C: SignaturePrimitive + DigestPrimitive,
    {
        valid_signers(validator, &self.keys, &self.zone, &self.dnskey)
    }

    /// Authenticate this zone's DNSKEY set against its delegation.
    ///
    /// `parent` must be the node the delegation's DS set comes from. The
    /// parent's own trust is not checked here, so an unsigned delegation is
    /// only insecure once the parent is known to be secure.
    pub fn authenticate<C>(
        &self,
        validator: &DnsSecValidator<C>,
        parent: Option<&ZoneTrustNode>,
        anchors: &TrustAnchorStore,
    ) -> Result<Authentication>
    where
        C: SignaturePrimitive + DigestPrimitive,
    {
        let ds_set = match &self.delegation {
            Delegation::Unsigned => {
                // A configured anchor asserts the zone is signed, and only a
                // parent can prove a delegation is unsigned
                if anchors.has_anchor(&self.zone) {
                    return Err(DnsSecError::AnchoredZoneUnsigned(self.zone.clone()));
                }
                if parent.is_none() {
                    return Err(DnsSecError::NoTrustAnchor(self.zone.clone()));
                }
                debug!("{} has an unsigned delegation", self.zone);
                return Ok(Authentication::Unsigned);
            }
            Delegation::TrustAnchor => None,
            Delegation::Signed(ds_set) => Some(ds_set),
        };

        let signers = self.validate_key_set(validator)?;

        let Some(ds_set) = ds_set else {
            if !anchors.has_anchor(&self.zone) {
                return Err(DnsSecError::NoTrustAnchor(self.zone.clone()));
            }
            return anchors
                .authenticated_keys(&self.zone, &self.keys, validator)
                .into_iter()
                .find(|tag| signers.contains(tag))
                .map(|key_tag| Authentication::Anchored { key_tag })
                .ok_or(DnsSecError::NoSecureEntryPoint);
        };

        if ds_set.records().is_empty() {
            return Err(DnsSecError::NoDsRecords);
        }
        let parent = parent.ok_or_else(|| DnsSecError::NoTrustAnchor(self.zone.clone()))?;
        valid_signers(validator, parent.keys(), parent.zone(), ds_set)?;

        let matched = self.validate_ds(validator, ds_set.records())?;
        if signers.contains(&matched.key_tag) {
            return Ok(Authentication::Delegated(matched));
        }

        // The first matching DS may name a standby key; any DS naming a
        // key that signs the DNSKEY set is enough.
        ds_set
            .records()
            .iter()
            .filter(|ds| signers.contains(&ds.key_tag()))
            .find_map(|ds| {
                let key = self.keys.get_key_by_tag(ds.key_tag())?;
                let digest_type = DigestType::from_u8(ds.digest_type())?;
                (validator.ds_matches_key(&self.zone, ds, key) == Some(true)).then_some(DsMatch {
                    key_tag: ds.key_tag(),
                    digest_type,
                })
            })
            .map(Authentication::Delegated)
            .ok_or(DnsSecError::NoSecureEntryPoint)
    }
}

/// Key tags of the RRSIGs over `set` that `signer` made and that validate
/// against `keys`. With none valid, the most telling failure is returned.
fn valid_signers<C, D>(
    validator: &DnsSecValidator<C>,
    keys: &KeyRegistry,
    signer: &Name,
    set: &SignedRecordSet<D>,
) -> Result<Vec<u16>>
where
    C: SignaturePrimitive + DigestPrimitive,
    D: RecordData,
{
    let mut signers = Vec::new();
    let mut failure: Option<DnsSecError> = None;

    for rrsig in set.signatures() {
        let outcome = if rrsig.signer_name() == signer {
            validator.validate_rrsig(keys, rrsig, set.rrset())
        } else {
            Err(SignatureFailure::SignerMismatch {
                signer: rrsig.signer_name().clone(),
                zone: signer.clone(),
            }
            .into())
        };

        match outcome {
            Ok(()) => {
                if !signers.contains(&rrsig.key_tag()) {
                    signers.push(rrsig.key_tag());
                }
            }
            Err(err) => {
                if failure.as_ref().is_none_or(|f| severity(&err) > severity(f)) {
                    failure = Some(err);
                }
            }
        }
    }

    if signers.is_empty() {
        return Err(failure.unwrap_or(DnsSecError::NoRrsig));
    }
    Ok(signers)
}

/// A missing key may be fetched later; anything else is a verdict
fn severity(err: &DnsSecError) -> u8 {
    match err {
        DnsSecError::KeyNotAvailable(_) => 0,
        _ => 1,
    }
}
