//! The data availability certificate a committee posts in place of batch
//! data.

use alloy_primitives::B256;
use thiserror::Error;

use crate::header;

/// Length of the aggregate BLS signature (compressed G2).
pub const DAS_CERT_SIG_LEN: usize = 96;

/// Serialized certificate length: header byte, two hashes, timeout,
/// signers mask, signature.
pub const DAS_CERT_LEN: usize = 1 + 32 + 32 + 8 + 8 + DAS_CERT_SIG_LEN;

/// An error thrown while decoding a certificate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DasCertError {
    /// The input ends before the full certificate.
    #[error("data availability certificate too short")]
    TooShort,
    /// The leading byte does not carry the DAS flag.
    #[error("certificate header byte {0:#04x} is not a DAS header")]
    MissingDasHeader(u8),
}

/// A deserialized data availability certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DasCertificate {
    /// Scheme version, selected by the header's tree flag. Versions other
    /// than 0 and 1 make the node abstain from decoding the batch.
    pub version: u8,
    /// Content address of the signing committee's keyset.
    pub keyset_hash: B256,
    /// Content address of the batch payload.
    pub data_hash: B256,
    /// Expiry of the committee's storage obligation, unix seconds.
    pub timeout: u64,
    /// Bitmap of committee members whose keys are in the aggregate.
    pub signers_mask: u64,
    /// Aggregate BLS signature over [DasCertificate::serialize_signable_fields].
    pub sig: [u8; DAS_CERT_SIG_LEN],
}

fn be_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(buf)
}

impl DasCertificate {
    /// Decodes a certificate from the batch bytes following the fixed
    /// header.
    pub fn decode(data: &[u8]) -> Result<Self, DasCertError> {
        let Some(&header_byte) = data.first() else {
            return Err(DasCertError::TooShort);
        };
        if !header::is_das_message(header_byte) {
            return Err(DasCertError::MissingDasHeader(header_byte));
        }
        if data.len() < DAS_CERT_LEN {
            return Err(DasCertError::TooShort);
        }
        let version = if header::is_tree_das_message(header_byte) { 1 } else { 0 };
        let mut sig = [0u8; DAS_CERT_SIG_LEN];
        sig.copy_from_slice(&data[81..DAS_CERT_LEN]);
        Ok(Self {
            version,
            keyset_hash: B256::from_slice(&data[1..33]),
            data_hash: B256::from_slice(&data[33..65]),
            timeout: be_u64(&data[65..73]),
            signers_mask: be_u64(&data[73..81]),
            sig,
        })
    }

    /// Serializes the certificate, including its header byte.
    pub fn encode(&self) -> Vec<u8> {
        let header_byte = match self.version {
            0 => header::DAS_MESSAGE_HEADER_FLAG,
            _ => header::DAS_MESSAGE_HEADER_FLAG | header::TREE_DAS_MESSAGE_HEADER_FLAG,
        };
        let mut buf = Vec::with_capacity(DAS_CERT_LEN);
        buf.push(header_byte);
        buf.extend_from_slice(self.keyset_hash.as_slice());
        buf.extend_from_slice(self.data_hash.as_slice());
        buf.extend_from_slice(&self.timeout.to_be_bytes());
        buf.extend_from_slice(&self.signers_mask.to_be_bytes());
        buf.extend_from_slice(&self.sig);
        buf
    }

    /// The byte string committee members sign.
    pub fn serialize_signable_fields(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(32 + 32 + 8);
        buf.extend_from_slice(self.keyset_hash.as_slice());
        buf.extend_from_slice(self.data_hash.as_slice());
        buf.extend_from_slice(&self.timeout.to_be_bytes());
        buf
    }
}
