use super::constants::DNSKEY_PROTOCOL;
use super::errors::SignatureFailure;
use super::record::{Dnskey, Name, RecordData, Rrsig};
use super::{DigestType, DnsSecAlgorithm};

/// Verifies an RRSIG's signature over reconstructed signed data.
pub trait SignaturePrimitive: Send + Sync {
    fn verify(&self, key: &Dnskey, rrsig: &Rrsig, signed_data: &[u8])
    -> Result<(), SignatureFailure>;
}

/// Computes the DS digest of a DNSKEY: `digest(owner | DNSKEY RDATA)`.
pub trait DigestPrimitive: Send + Sync {
    /// `None` when the digest type has no implementation
    fn digest(&self, owner: &Name, key: &Dnskey, digest_type: DigestType) -> Option<Vec<u8>>;
}

/// Signature and digest primitives backed by `ring`
#[derive(Debug, Clone, Copy, Default)]
pub struct RingCrypto;

impl SignaturePrimitive for RingCrypto {
    fn verify(
        &self,
        key: &Dnskey,
        rrsig: &Rrsig,
        signed_data: &[u8],
    ) -> Result<(), SignatureFailure> {
        // RFC 4035 section 5.3.1: only zone keys may sign zone data
        if !key.is_zone_key() {
            return Err(SignatureFailure::NotAZoneKey);
        }
        // RFC 4034 section 2.1.2
        if key.protocol() != DNSKEY_PROTOCOL {
            return Err(SignatureFailure::InvalidProtocol(key.protocol()));
        }
        if key.algorithm() != rrsig.algorithm() {
            return Err(SignatureFailure::AlgorithmMismatch {
                key: key.algorithm(),
                signature: rrsig.algorithm(),
            });
        }
        let algorithm = DnsSecAlgorithm::from_u8(rrsig.algorithm())
            .ok_or(SignatureFailure::UnsupportedAlgorithm(rrsig.algorithm()))?;
        algorithm.verify(key.public_key(), signed_data, rrsig.signature())
    }
}

impl DigestPrimitive for RingCrypto {
    fn digest(&self, owner: &Name, key: &Dnskey, digest_type: DigestType) -> Option<Vec<u8>> {
        let mut data = Vec::new();
        owner.compose_canonical(&mut data);
        key.compose_rdata(&mut data);
        Some(digest_type.digest(&data))
    }
}
