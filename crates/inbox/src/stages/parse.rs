//! The staged sequencer-message decoder.

use alloy_primitives::{Bytes, B256};
use alloy_rlp::Decodable;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::{
    compress,
    das::KeysetValidationMode,
    errors::InboxError,
    header,
    params::{
        BATCH_HEADER_LEN, MAX_DECOMPRESSED_LEN, MAX_SEGMENTS_PER_SEQUENCER_MESSAGE,
        MAX_ZEROHEAVY_DECOMPRESSED_LEN,
    },
    traits::DataAvailabilityProvider,
    types::SequencerMessage,
};

/// Decodes a raw sequencer batch into a [SequencerMessage].
///
/// Only two failures are hard errors: a batch shorter than its fixed header
/// and an authenticated header byte this node does not recognize. Every
/// malformed payload past those checks parses to a deterministic batch
/// (usually header-only) that downstream interpretation turns into invalid
/// messages, so all honest nodes agree on the outcome.
pub async fn parse_sequencer_message<D>(
    ctx: &CancellationToken,
    batch_num: u64,
    batch_block_hash: B256,
    data: &[u8],
    providers: &[D],
    keyset_validation: KeysetValidationMode,
) -> Result<SequencerMessage, InboxError>
where
    D: DataAvailabilityProvider + Sync,
{
    let mut parsed = SequencerMessage::decode_header(data)?;
    // peeked bytes may live in a shared transport buffer
    let mut payload = Bytes::copy_from_slice(&data[BATCH_HEADER_LEN..]);

    // Stage 0: an authenticated header byte this node does not understand
    // means the parent-chain inbox contract accepted a batch format this
    // software predates. Skipping it would diverge from consensus.
    if let Some(&first) = payload.first() {
        if header::is_l1_authenticated(first) && !header::is_known(first) {
            return Err(InboxError::NodeOutOfDate(first));
        }
    }

    // Stage 1: peel the data availability envelope, if any. Only the first
    // claiming provider runs; the inbox contract validates a single DA
    // header per batch.
    if let Some(&first) = payload.first() {
        let mut found_da = false;
        for provider in providers {
            if !provider.is_valid_header_byte(first) {
                continue;
            }
            match provider
                .recover_payload(ctx, batch_num, batch_block_hash, data, keyset_validation)
                .await?
            {
                Some(inner) => payload = inner,
                None => return Ok(parsed),
            }
            found_da = true;
            break;
        }
        if !found_da {
            if header::is_das_message(first) {
                error!(target: "inbox", batch_num, "no DAS reader configured, but sequencer message found with DAS header");
            } else if header::is_blob_hashes(first) {
                error!(target: "inbox", batch_num, "no blob reader configured, but sequencer message found with blob hashes header");
            }
        }
    }

    // From here on the payload has not been validated by the inbox
    // contract; nothing below may trust it.

    // Stage 2: undo the zero-heavy calldata encoding.
    if payload.first().is_some_and(|byte| header::is_zeroheavy_encoded(*byte)) {
        match magma_zeroheavy::decode(&payload[1..], MAX_ZEROHEAVY_DECOMPRESSED_LEN) {
            Ok(decoded) => payload = decoded.into(),
            Err(err) => {
                warn!(target: "inbox", %err, "error reading from zeroheavy decoder");
                return Ok(parsed);
            }
        }
    }

    // Stage 3: decompress the brotli payload and fill the segment list.
    if payload.first().is_some_and(|byte| header::is_brotli_message(*byte)) {
        match compress::decompress(&payload[1..], MAX_DECOMPRESSED_LEN) {
            Ok(decompressed) => {
                let mut stream = decompressed.as_slice();
                while !stream.is_empty() {
                    let segment = match Bytes::decode(&mut stream) {
                        Ok(segment) => segment,
                        Err(err) => {
                            warn!(target: "inbox", %err, "error parsing sequencer message segment");
                            break;
                        }
                    };
                    if parsed.segments.len() >= MAX_SEGMENTS_PER_SEQUENCER_MESSAGE {
                        warn!(target: "inbox", "too many segments in sequence batch");
                        break;
                    }
                    parsed.segments.push(segment);
                }
            }
            Err(err) => warn!(target: "inbox", %err, "sequencer msg decompression failed"),
        }
    } else if payload.is_empty() {
        warn!(target: "inbox", "empty sequencer message");
    } else {
        warn!(target: "inbox", first_byte = payload[0], length = payload.len(), "unknown sequencer message format");
    }

    Ok(parsed)
}
