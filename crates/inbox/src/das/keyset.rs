//! Committee keysets and threshold signature verification.

use alloy_primitives::Bytes;
use blst::{
    min_pk::{AggregatePublicKey, PublicKey, Signature},
    BLST_ERROR,
};
use thiserror::Error;

/// How strictly DA keysets are validated during payload recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeysetValidationMode {
    /// Verify the keyset and certificate signature; soft-fail the batch on
    /// error.
    #[default]
    Validate,
    /// Treat an invalid keyset as an unrecoverable fault and abort the
    /// process.
    PanicIfInvalid,
    /// Skip signature verification. Only sound where the keyset was already
    /// checked elsewhere: fraud-proof replay and tests.
    DontValidate,
}

/// Hard cap on committee size; the signers bitmap is a u64.
pub const MAX_KEYSET_KEYS: u64 = 64;

/// Domain separation tag for certificate signatures.
const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

/// An error thrown while decoding or verifying a keyset.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeysetError {
    /// The input ends before the declared keys.
    #[error("keyset data too short")]
    TooShort,
    /// More keys than the signers bitmap can address.
    #[error("keyset declares {0} keys, more than the maximum of {max}", max = MAX_KEYSET_KEYS)]
    TooManyKeys(u64),
    /// A public key failed point validation.
    #[error("invalid public key at index {0}")]
    InvalidPubkey(usize),
    /// The signers mask addresses keys beyond the committee.
    #[error("signers mask addresses keys outside the keyset")]
    InvalidSignersMask,
    /// Too many committee members abstained for the honesty assumption.
    #[error("not enough signers: {non_signers} non-signers with {assumed_honest} assumed honest")]
    NotEnoughSigners {
        /// Members whose mask bit is unset.
        non_signers: u64,
        /// The committee's honesty assumption.
        assumed_honest: u64,
    },
    /// The signature bytes are not a valid G2 point, or aggregation failed.
    #[error("malformed aggregate signature")]
    MalformedSignature,
    /// The aggregate signature does not verify against the signer keys.
    #[error("bad signature")]
    BadSignature,
}

/// A DAS committee: its honesty assumption and member public keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyset {
    /// At least this many members are assumed honest. A certificate stays
    /// trustworthy while fewer than this many members abstain.
    pub assumed_honest: u64,
    /// Compressed G1 public keys of the committee members.
    pub pubkeys: Vec<Bytes>,
}

struct Cursor<'a>(&'a [u8]);

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], KeysetError> {
        if self.0.len() < n {
            return Err(KeysetError::TooShort);
        }
        let (head, tail) = self.0.split_at(n);
        self.0 = tail;
        Ok(head)
    }

    fn take_u64(&mut self) -> Result<u64, KeysetError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(buf))
    }
}

impl Keyset {
    /// Decodes `be64(assumed_honest) ++ be64(num_keys) ++ (len ++ key)*`.
    /// Point validation of each key is skipped when `assume_valid` is set.
    pub fn decode(data: &[u8], assume_valid: bool) -> Result<Self, KeysetError> {
        let mut cursor = Cursor(data);
        let assumed_honest = cursor.take_u64()?;
        let num_keys = cursor.take_u64()?;
        if num_keys > MAX_KEYSET_KEYS {
            return Err(KeysetError::TooManyKeys(num_keys));
        }
        let mut pubkeys = Vec::with_capacity(num_keys as usize);
        for i in 0..num_keys as usize {
            let len = cursor.take(1)?[0] as usize;
            let key = cursor.take(len)?;
            if !assume_valid {
                PublicKey::key_validate(key).map_err(|_| KeysetError::InvalidPubkey(i))?;
            }
            pubkeys.push(Bytes::copy_from_slice(key));
        }
        Ok(Self { assumed_honest, pubkeys })
    }

    /// Serializes the keyset in its content-addressed form.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(16 + self.pubkeys.len() * 49);
        buf.extend_from_slice(&self.assumed_honest.to_be_bytes());
        buf.extend_from_slice(&(self.pubkeys.len() as u64).to_be_bytes());
        for key in &self.pubkeys {
            buf.push(key.len() as u8);
            buf.extend_from_slice(key);
        }
        buf
    }

    /// Verifies the aggregate signature of the members selected by
    /// `signers_mask`, under the committee's honesty assumption.
    pub fn verify_signature(
        &self,
        signers_mask: u64,
        message: &[u8],
        sig: &[u8],
    ) -> Result<(), KeysetError> {
        if self.pubkeys.len() as u64 > MAX_KEYSET_KEYS {
            return Err(KeysetError::TooManyKeys(self.pubkeys.len() as u64));
        }
        let width = self.pubkeys.len() as u32;
        if width < u64::BITS && signers_mask >> width != 0 {
            return Err(KeysetError::InvalidSignersMask);
        }
        let mut signers = Vec::new();
        let mut non_signers = 0u64;
        for (i, key) in self.pubkeys.iter().enumerate() {
            if signers_mask & (1u64 << i) != 0 {
                signers.push(PublicKey::from_bytes(key).map_err(|_| KeysetError::InvalidPubkey(i))?);
            } else {
                non_signers += 1;
            }
        }
        if non_signers >= self.assumed_honest {
            return Err(KeysetError::NotEnoughSigners {
                non_signers,
                assumed_honest: self.assumed_honest,
            });
        }
        let signer_refs: Vec<&PublicKey> = signers.iter().collect();
        let aggregate = AggregatePublicKey::aggregate(&signer_refs, false)
            .map_err(|_| KeysetError::MalformedSignature)?;
        let signature =
            Signature::from_bytes(sig).map_err(|_| KeysetError::MalformedSignature)?;
        match signature.verify(true, message, DST, &[], &aggregate.to_public_key(), true) {
            BLST_ERROR::BLST_SUCCESS => Ok(()),
            _ => Err(KeysetError::BadSignature),
        }
    }
}
