use std::fmt;

use ring::signature::{self, RsaPublicKeyComponents, UnparsedPublicKey};

use super::errors::SignatureFailure;

/// DNSSEC algorithm numbers (RFC 4034, 5702, 5933, 6605, 8080, 8624)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DnsSecAlgorithm {
    RsaMd5 = 1,
    Dsa = 3,
    RsaSha1 = 5,
    DsaNsec3Sha1 = 6,
    RsaSha1Nsec3Sha1 = 7,
    RsaSha256 = 8,
    RsaSha512 = 10,
    EccGost = 12,
    EcdsaP256Sha256 = 13,
    EcdsaP384Sha384 = 14,
    Ed25519 = 15,
    Ed448 = 16,
}

impl DnsSecAlgorithm {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::RsaMd5),
            3 => Some(Self::Dsa),
            5 => Some(Self::RsaSha1),
            6 => Some(Self::DsaNsec3Sha1),
            7 => Some(Self::RsaSha1Nsec3Sha1),
            8 => Some(Self::RsaSha256),
            10 => Some(Self::RsaSha512),
            12 => Some(Self::EccGost),
            13 => Some(Self::EcdsaP256Sha256),
            14 => Some(Self::EcdsaP384Sha384),
            15 => Some(Self::Ed25519),
            16 => Some(Self::Ed448),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Check if algorithm can be verified by this crate
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            Self::RsaSha1
                | Self::RsaSha1Nsec3Sha1
                | Self::RsaSha256
                | Self::RsaSha512
                | Self::EcdsaP256Sha256
                | Self::EcdsaP384Sha384
                | Self::Ed25519
        )
    }

    /// Check if algorithm is recommended for validation (RFC 8624)
    pub fn is_recommended(&self) -> bool {
        matches!(
            self,
            Self::RsaSha256 | Self::EcdsaP256Sha256 | Self::EcdsaP384Sha384 | Self::Ed25519
        )
    }

    /// Verify `sig` over `signed_data` with a DNSKEY public key field.
    ///
    /// DNSKEY public keys are not in a format ring parses directly: RSA keys
    /// are RFC 3110 exponent/modulus blobs and ECDSA keys lack the
    /// uncompressed point marker.
    pub fn verify(
        &self,
        public_key: &[u8],
        signed_data: &[u8],
        sig: &[u8],
    ) -> Result<(), SignatureFailure> {
        match self {
            Self::RsaSha1 | Self::RsaSha1Nsec3Sha1 | Self::RsaSha256 | Self::RsaSha512 => {
                let params = match self {
                    Self::RsaSha256 => &signature::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY,
                    Self::RsaSha512 => &signature::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY,
                    _ => &signature::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY,
                };
                let (e, n) = rsa_exponent_modulus(public_key)?;
                RsaPublicKeyComponents { n, e }
                    .verify(params, signed_data, sig)
                    .map_err(|_| SignatureFailure::BadSignature)
            }
            Self::EcdsaP256Sha256 | Self::EcdsaP384Sha384 => {
                let (algorithm, point_len) = match self {
                    Self::EcdsaP256Sha256 => (&signature::ECDSA_P256_SHA256_FIXED, 64),
                    _ => (&signature::ECDSA_P384_SHA384_FIXED, 96),
                };
                if public_key.len() != point_len {
                    return Err(SignatureFailure::InvalidPublicKey);
                }
                let mut key = Vec::with_capacity(point_len + 1);
                key.push(0x04);
                key.extend_from_slice(public_key);
                UnparsedPublicKey::new(algorithm, &key)
                    .verify(signed_data, sig)
                    .map_err(|_| SignatureFailure::BadSignature)
            }
            Self::Ed25519 => {
                if public_key.len() != 32 {
                    return Err(SignatureFailure::InvalidPublicKey);
                }
                UnparsedPublicKey::new(&signature::ED25519, public_key)
                    .verify(signed_data, sig)
                    .map_err(|_| SignatureFailure::BadSignature)
            }
            _ => Err(SignatureFailure::UnsupportedAlgorithm(self.to_u8())),
        }
    }
}

/// Split an RFC 3110 RSA public key into exponent and modulus
fn rsa_exponent_modulus(public_key: &[u8]) -> Result<(&[u8], &[u8]), SignatureFailure> {
    let (start, exp_len) = match public_key {
        [0, hi, lo, ..] => (3, usize::from(*hi) << 8 | usize::from(*lo)),
        [len, ..] => (1, usize::from(*len)),
        [] => return Err(SignatureFailure::InvalidPublicKey),
    };
    if exp_len == 0 || public_key.len() <= start + exp_len {
        return Err(SignatureFailure::InvalidPublicKey);
    }
    Ok(public_key[start..].split_at(exp_len))
}

impl fmt::Display for DnsSecAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = match self {
            Self::RsaMd5 => "RSAMD5",
            Self::Dsa => "DSA",
            Self::RsaSha1 => "RSASHA1",
            Self::DsaNsec3Sha1 => "DSA-NSEC3-SHA1",
            Self::RsaSha1Nsec3Sha1 => "RSASHA1-NSEC3-SHA1",
            Self::RsaSha256 => "RSASHA256",
            Self::RsaSha512 => "RSASHA512",
            Self::EccGost => "ECC-GOST",
            Self::EcdsaP256Sha256 => "ECDSAP256SHA256",
            Self::EcdsaP384Sha384 => "ECDSAP384SHA384",
            Self::Ed25519 => "ED25519",
            Self::Ed448 => "ED448",
        };
        f.write_str(mnemonic)
    }
}
