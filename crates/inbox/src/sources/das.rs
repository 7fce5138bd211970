//! Payload recovery from a data availability committee.

use alloy_primitives::{keccak256, Bytes, B256};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::{
    das::{dastree, DasCertificate, Keyset, KeysetValidationMode},
    errors::InboxError,
    header,
    params::{BATCH_HEADER_LEN, MIN_LIFETIME_SECS_FOR_DA_CERT},
    traits::{DasReader, DataAvailabilityProvider},
};

/// Recovers batch payloads referenced by a DAS certificate through a
/// content-addressed reader.
#[derive(Debug, Clone)]
pub struct DasSource<R> {
    reader: R,
}

impl<R> DasSource<R>
where
    R: DasReader,
{
    /// Creates a new DAS source over the given reader.
    pub const fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R> DasSource<R>
where
    R: DasReader + Send + Sync,
{
    /// Fetches and integrity-checks the preimage of `hash`.
    ///
    /// Version-0 hashes are flat keccaks: the store keys them under their
    /// tree-remapped form, with a fallback to the raw hash for older stores.
    async fn get_verified_preimage(
        &self,
        ctx: &CancellationToken,
        hash: B256,
        version: u8,
    ) -> Result<Bytes, InboxError> {
        let lookup = if version == 0 { dastree::flat_hash_to_tree_hash(hash) } else { hash };
        if ctx.is_cancelled() {
            return Err(InboxError::Cancelled);
        }
        let preimage = match self.reader.get_by_hash(lookup).await {
            Ok(preimage) => preimage,
            Err(err) if lookup != hash => {
                debug!(target: "das", %err, new = %lookup, old = %hash, "error fetching tree-style hash, trying flat");
                if ctx.is_cancelled() {
                    return Err(InboxError::Cancelled);
                }
                self.reader.get_by_hash(hash).await.map_err(InboxError::Backend)?
            }
            Err(err) => return Err(InboxError::Backend(err)),
        };
        let verified = match version {
            0 => keccak256(&preimage) == hash,
            _ => dastree::hash(&preimage) == hash,
        };
        if !verified {
            error!(target: "das", %hash, version, "preimage mismatch for hash");
            return Err(InboxError::HashMismatch(hash));
        }
        Ok(preimage)
    }
}

#[async_trait]
impl<R> DataAvailabilityProvider for DasSource<R>
where
    R: DasReader + Send + Sync,
{
    fn is_valid_header_byte(&self, byte: u8) -> bool {
        header::is_das_message(byte)
    }

    async fn recover_payload(
        &self,
        ctx: &CancellationToken,
        batch_num: u64,
        _batch_block_hash: B256,
        sequencer_msg: &[u8],
        keyset_validation: KeysetValidationMode,
    ) -> Result<Option<Bytes>, InboxError> {
        let Some(cert_bytes) = sequencer_msg.get(BATCH_HEADER_LEN..) else {
            error!(target: "das", batch_num, "sequencer message too short for a certificate");
            return Ok(None);
        };
        let cert = match DasCertificate::decode(cert_bytes) {
            Ok(cert) => cert,
            Err(err) => {
                error!(target: "das", %err, batch_num, "failed to deserialize DAS certificate");
                return Ok(None);
            }
        };
        if cert.version >= 2 {
            error!(target: "das", version = cert.version, "unrecognized certificate version, node software is probably out of date");
            return Ok(None);
        }

        let keyset_bytes =
            self.get_verified_preimage(ctx, cert.keyset_hash, cert.version).await?;

        let assume_valid = keyset_validation == KeysetValidationMode::DontValidate;
        let keyset = match Keyset::decode(&keyset_bytes, assume_valid) {
            Ok(keyset) => keyset,
            Err(err) => {
                error!(
                    target: "das",
                    %err,
                    keyset_hash = %cert.keyset_hash,
                    batch_num,
                    "couldn't deserialize keyset"
                );
                if keyset_validation == KeysetValidationMode::PanicIfInvalid {
                    panic!("invalid data availability keyset for batch {batch_num}");
                }
                return Ok(None);
            }
        };
        if !assume_valid {
            if let Err(err) = keyset.verify_signature(
                cert.signers_mask,
                &cert.serialize_signable_fields(),
                &cert.sig,
            ) {
                error!(target: "das", %err, batch_num, "bad signature on DAS batch");
                return Ok(None);
            }
        }

        // the certificate must outlive this batch's whole time window
        let mut max_timestamp = [0u8; 8];
        max_timestamp.copy_from_slice(&sequencer_msg[8..16]);
        let max_timestamp = u64::from_be_bytes(max_timestamp);
        if cert.timeout < max_timestamp.saturating_add(MIN_LIFETIME_SECS_FOR_DA_CERT) {
            error!(target: "das", timeout = cert.timeout, batch_num, "data availability cert expires too soon");
            return Ok(None);
        }

        let payload = self.get_verified_preimage(ctx, cert.data_hash, cert.version).await?;
        Ok(Some(payload))
    }
}
