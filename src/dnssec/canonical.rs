//! Reconstruction of the data an RRSIG signs (RFC 4035 section 5.3.2).
//!
//! ```text
//! signed_data = RRSIG_RDATA | RR(1) | RR(2)...
//! RR(i) = owner | type | class | OrigTTL | RDATA length | RDATA
//! ```
//!
//! RRSIG_RDATA excludes the signature field. The RRs are sorted by their
//! canonical RDATA and duplicates are dropped (RFC 4034 section 6.3).

use super::errors::SignatureFailure;
use super::record::{RecordData, RecordSet, Rrsig};

/// Build the signed data for `rrsig` over `rrset`
pub fn signed_data<D: RecordData>(
    rrsig: &Rrsig,
    rrset: &RecordSet<D>,
) -> Result<Vec<u8>, SignatureFailure> {
    let owner_labels = rrset.owner().label_count();
    let rrsig_labels = usize::from(rrsig.labels());
    if rrsig_labels > owner_labels {
        return Err(SignatureFailure::LabelCountMismatch);
    }

    // Wildcard expansion: the signed owner is "*." plus the rightmost
    // `labels` labels of the owner.
    let mut owner = Vec::new();
    if rrsig_labels < owner_labels {
        owner.extend_from_slice(b"\x01*");
        rrset.owner().suffix(rrsig_labels).compose_canonical(&mut owner);
    } else {
        rrset.owner().compose_canonical(&mut owner);
    }

    let mut rdatas: Vec<Vec<u8>> = rrset.records().iter().map(RecordData::rdata).collect();
    rdatas.sort();
    rdatas.dedup();

    let mut data = Vec::new();
    rrsig.compose_unsigned(&mut data);
    for rdata in rdatas {
        data.extend_from_slice(&owner);
        data.extend_from_slice(&rrsig.type_covered().to_be_bytes());
        data.extend_from_slice(&rrset.class().to_be_bytes());
        data.extend_from_slice(&rrsig.original_ttl().to_be_bytes());
        let rdlength =
            u16::try_from(rdata.len()).map_err(|_| SignatureFailure::RdataTooLong(rdata.len()))?;
        data.extend_from_slice(&rdlength.to_be_bytes());
        data.extend_from_slice(&rdata);
    }

    Ok(data)
}
