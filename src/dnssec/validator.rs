use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, trace};

use super::canonical;
use super::crypto::{DigestPrimitive, RingCrypto, SignaturePrimitive};
use super::errors::{Result, SignatureFailure};
use super::record::{Dnskey, Ds, Name, RecordData, RecordSet, Rrsig};
use super::registry::KeyRegistry;
use super::{DigestType, DnsSecError};

/// The DS record that proved a delegation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DsMatch {
    pub key_tag: u16,
    pub digest_type: DigestType,
}

/// Signature and delegation validator.
///
/// Holds no per-zone state: keys come from the [`KeyRegistry`] passed to
/// each call, so one validator can serve any number of zones and threads.
#[derive(Debug, Clone, Default)]
pub struct DnsSecValidator<C = RingCrypto> {
    crypto: C,
    /// Fixed validation time, system clock when unset
    current_time: Option<u32>,
}

impl DnsSecValidator<RingCrypto> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: SignaturePrimitive + DigestPrimitive> DnsSecValidator<C> {
    /// Create a validator with custom primitives
    pub fn with_crypto(crypto: C) -> Self {
        Self {
            crypto,
            current_time: None,
        }
    }

    /// Pin the validation time
    pub fn set_current_time(&mut self, time: u32) {
        self.current_time = Some(time);
    }

    pub fn at_time(mut self, time: u32) -> Self {
        self.set_current_time(time);
        self
    }

    /// Current time as a 32-bit serial timestamp
    pub fn current_time(&self) -> u32 {
        self.current_time.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as u32)
                .unwrap_or(0)
        })
    }

    /// Validate `rrsig` over `rrset` with a key from `keys`.
    ///
    /// The key is resolved first, then the signature is checked, then the
    /// validity window. A cryptographically valid signature outside its
    /// window is still rejected.
    pub fn validate_rrsig<D: RecordData>(
        &self,
        keys: &KeyRegistry,
        rrsig: &Rrsig,
        rrset: &RecordSet<D>,
    ) -> Result<()> {
        let key = keys
            .get_key_by_tag(rrsig.key_tag())
            .ok_or(DnsSecError::KeyNotAvailable(rrsig.key_tag()))?;

        match rrset.rtype() {
            Some(rtype) if rtype == rrsig.type_covered() => {}
            other => {
                return Err(SignatureFailure::TypeCoveredMismatch {
                    covered: rrsig.type_covered(),
                    rrset: other.unwrap_or(0),
                }
                .into());
            }
        }

        let signed_data = canonical::signed_data(rrsig, rrset)?;
        self.crypto.verify(key, rrsig, &signed_data)?;

        let now = self.current_time();
        if !rrsig.is_valid_at(now) {
            return Err(DnsSecError::ValidityPeriodExpired {
                inception: rrsig.inception(),
                expiration: rrsig.expiration(),
                now,
            });
        }

        debug!(
            "RRSIG by key {} over {} type {} verified",
            rrsig.key_tag(),
            rrset.owner(),
            rrsig.type_covered()
        );
        Ok(())
    }

    /// Validate that one of the DS records in `ds_set` corroborates a key
    /// in `keys`, the DNSKEYs owned by `owner`.
    ///
    /// Records with an unassigned digest type, or one the digest primitive
    /// does not implement, are skipped. A DS naming a key tag that is not in
    /// the registry ends validation immediately.
    pub fn validate_ds(&self, keys: &KeyRegistry, owner: &Name, ds_set: &[Ds]) -> Result<DsMatch> {
        if ds_set.is_empty() {
            return Err(DnsSecError::NoDsRecords);
        }

        let mut compared = false;
        for ds in ds_set {
            let Some(digest_type) = DigestType::from_u8(ds.digest_type()) else {
                trace!("skipping DS {} with digest type {}", ds.key_tag(), ds.digest_type());
                continue;
            };

            let key = keys
                .get_key_by_tag(ds.key_tag())
                .ok_or(DnsSecError::KeyNotAvailable(ds.key_tag()))?;

            let Some(matched) = self.digest_matches(owner, ds, digest_type, key) else {
                continue;
            };
            compared = true;
            if matched {
                debug!("DNSKEY {} of {} matches DS ({})", ds.key_tag(), owner, digest_type);
                return Ok(DsMatch {
                    key_tag: ds.key_tag(),
                    digest_type,
                });
            }
            debug!("DS {} ({}) does not match DNSKEY of {}", ds.key_tag(), digest_type, owner);
        }

        if compared {
            Err(DnsSecError::DsMismatch)
        } else {
            Err(DnsSecError::UnsupportedDigestAlgorithm)
        }
    }

    /// Whether `ds` is a digest of `key`, `None` when its digest type is
    /// unassigned or not implemented
    pub fn ds_matches_key(&self, owner: &Name, ds: &Ds, key: &Dnskey) -> Option<bool> {
        let digest_type = DigestType::from_u8(ds.digest_type())?;
        self.digest_matches(owner, ds, digest_type, key)
    }

    fn digest_matches(
        &self,
        owner: &Name,
        ds: &Ds,
        digest_type: DigestType,
        key: &Dnskey,
    ) -> Option<bool> {
        let computed = self.crypto.digest(owner, key, digest_type)?;
        Some(ds.digest() == computed.as_slice())
    }
}
