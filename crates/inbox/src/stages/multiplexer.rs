//! The inbox multiplexer: drains parsed batches one sub-message at a time,
//! interleaving the delayed-inbox stream deterministically.

use alloy_primitives::{Bytes, U256};
use alloy_rlp::Decodable;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    compress,
    das::KeysetValidationMode,
    errors::InboxError,
    params::{BATCH_POSTER_ADDRESS, MAX_L2_MESSAGE_SIZE},
    stages::parse_sequencer_message,
    traits::{DataAvailabilityProvider, InboxBackend},
    types::{
        BatchSegmentKind, L1IncomingMessage, L1IncomingMessageHeader, MessageWithMetadata,
        SequencerMessage, L1_MESSAGE_TYPE_L2_MESSAGE,
    },
};

/// The segment synthesized past the end of a batch that still owes delayed
/// messages.
const VIRTUAL_DELAYED_SEGMENT: [u8; 1] = [BatchSegmentKind::DelayedMessages as u8];

/// Cursor state of the segment walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Walk {
    segment_num: u64,
    timestamp: u64,
    block_number: u64,
    submessage_num: u64,
}

/// A segment chosen for emission, with its clamped emission context.
#[derive(Debug)]
struct SegmentSelection {
    segment: Bytes,
    segment_num: u64,
    in_bounds: bool,
    timestamp: u64,
    block_number: u64,
    after_delayed_messages: u64,
}

fn clamp_between(value: u64, min: u64, max: u64) -> u64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Walks the segment list from `start`: empty segments are skipped, advance
/// directives accumulate into the running timestamp and block number, and
/// every other segment counts toward `target_submessage`. Stops on the
/// segment to emit or past the end of the list.
fn walk_segments(seq_msg: &SequencerMessage, start: Walk, target_submessage: u64) -> Walk {
    let Walk { mut segment_num, mut timestamp, mut block_number, mut submessage_num } = start;
    while (segment_num as usize) < seq_msg.segments.len() {
        let segment = &seq_msg.segments[segment_num as usize];
        let Some(&kind_byte) = segment.first() else {
            segment_num += 1;
            continue;
        };
        match BatchSegmentKind::from_byte(kind_byte) {
            Some(kind @ (BatchSegmentKind::AdvanceTimestamp | BatchSegmentKind::AdvanceL1BlockNumber)) => {
                match u64::decode(&mut &segment[1..]) {
                    Ok(delta) => {
                        if kind == BatchSegmentKind::AdvanceTimestamp {
                            timestamp = timestamp.wrapping_add(delta);
                        } else {
                            block_number = block_number.wrapping_add(delta);
                        }
                    }
                    Err(err) => {
                        warn!(target: "inbox", %err, segment_num, "error parsing sequencer advancing segment");
                    }
                }
                segment_num += 1;
            }
            _ => {
                if submessage_num < target_submessage {
                    segment_num += 1;
                    submessage_num += 1;
                } else {
                    break;
                }
            }
        }
    }
    Walk { segment_num, timestamp, block_number, submessage_num }
}

/// Pops sequencer batches from an [InboxBackend] one sub-message at a time.
///
/// Emission order is a pure function of the backend state, the configured
/// DA providers, and the keyset validation mode: replaying the same batch
/// stream through a fresh multiplexer yields byte-identical messages.
#[derive(Debug)]
pub struct InboxMultiplexer<B, D>
where
    B: InboxBackend,
    D: DataAvailabilityProvider,
{
    backend: B,
    delayed_messages_read: u64,
    providers: Vec<D>,
    keyset_validation: KeysetValidationMode,
    cached_sequencer_message: Option<SequencerMessage>,
    cached_sequencer_message_num: u64,
    cached_segment_num: u64,
    cached_segment_timestamp: u64,
    cached_segment_block_number: u64,
    cached_submessage_num: u64,
}

impl<B, D> InboxMultiplexer<B, D>
where
    B: InboxBackend + Send,
    D: DataAvailabilityProvider + Send + Sync,
{
    /// Creates a multiplexer resuming after `delayed_messages_read` delayed
    /// messages.
    pub fn new(
        backend: B,
        delayed_messages_read: u64,
        providers: Vec<D>,
        keyset_validation: KeysetValidationMode,
    ) -> Self {
        Self {
            backend,
            delayed_messages_read,
            providers,
            keyset_validation,
            cached_sequencer_message: None,
            cached_sequencer_message_num: 0,
            cached_segment_num: 0,
            cached_segment_timestamp: 0,
            cached_segment_block_number: 0,
            cached_submessage_num: 0,
        }
    }

    /// Count of delayed-inbox messages consumed so far.
    pub const fn delayed_messages_read(&self) -> u64 {
        self.delayed_messages_read
    }

    /// Returns the next message and removes it from the queue.
    ///
    /// Parse failures are not errors: the affected sub-message is returned
    /// as the canonical invalid message and the cursor still advances, so
    /// every node makes identical progress through identical batches. Only
    /// infrastructure failures, cancellation, and the fatal decode errors
    /// surface here, and they leave the multiplexer state untouched.
    pub async fn pop(
        &mut self,
        ctx: &CancellationToken,
    ) -> Result<MessageWithMetadata, InboxError> {
        if self.cached_sequencer_message.is_none() {
            if ctx.is_cancelled() {
                return Err(InboxError::Cancelled);
            }
            // the batch block hash is zero in replay contexts, which is fine
            let (bytes, batch_block_hash) =
                self.backend.peek_sequencer_inbox().await.map_err(InboxError::Backend)?;
            let batch_num = self.backend.get_sequencer_inbox_position();
            let parsed = parse_sequencer_message(
                ctx,
                batch_num,
                batch_block_hash,
                &bytes,
                &self.providers,
                self.keyset_validation,
            )
            .await?;
            self.cached_sequencer_message_num = batch_num;
            self.cached_sequencer_message = Some(parsed);
        }
        let msg = self.next_message(ctx).await?;
        // advance even when the sub-message degraded to an invalid marker
        if self.is_cached_segment_last() {
            self.advance_sequencer_message();
        } else {
            self.advance_submessage();
        }
        Ok(msg.unwrap_or_else(|| MessageWithMetadata {
            message: L1IncomingMessage::invalid(),
            delayed_messages_read: self.delayed_messages_read,
        }))
    }

    /// Interprets the sub-message the backend's position points at.
    ///
    /// `Ok(None)` is a soft failure the caller converts to an invalid
    /// message. Hard errors leave the cached cursors untouched so a failed
    /// `pop` can be retried.
    async fn next_message(
        &mut self,
        ctx: &CancellationToken,
    ) -> Result<Option<MessageWithMetadata>, InboxError> {
        let target_submessage = self.backend.get_position_within_message();
        let seq_msg =
            self.cached_sequencer_message.as_ref().expect("cached sequencer message is set");
        let walk = walk_segments(
            seq_msg,
            Walk {
                segment_num: self.cached_segment_num,
                timestamp: self.cached_segment_timestamp,
                block_number: self.cached_segment_block_number,
                submessage_num: self.cached_submessage_num,
            },
            target_submessage,
        );
        let in_bounds = (walk.segment_num as usize) < seq_msg.segments.len();
        let segment = if in_bounds {
            seq_msg.segments[walk.segment_num as usize].clone()
        } else {
            // past the end of the batch there may be virtual delayed segments
            warn!(
                target: "inbox",
                delayed_messages_read = self.delayed_messages_read,
                after_delayed_messages = seq_msg.after_delayed_messages,
                "reading virtual delayed message segment"
            );
            Bytes::from_static(&VIRTUAL_DELAYED_SEGMENT)
        };
        let selection = SegmentSelection {
            segment,
            segment_num: walk.segment_num,
            in_bounds,
            timestamp: clamp_between(walk.timestamp, seq_msg.min_timestamp, seq_msg.max_timestamp),
            block_number: clamp_between(
                walk.block_number,
                seq_msg.min_l1_block,
                seq_msg.max_l1_block,
            ),
            after_delayed_messages: seq_msg.after_delayed_messages,
        };
        let msg = self.emit_segment(ctx, selection).await?;
        // commit the walk only on non-error outcomes
        self.cached_segment_num = walk.segment_num;
        self.cached_segment_timestamp = walk.timestamp;
        self.cached_segment_block_number = walk.block_number;
        self.cached_submessage_num = walk.submessage_num;
        Ok(msg)
    }

    async fn emit_segment(
        &mut self,
        ctx: &CancellationToken,
        selection: SegmentSelection,
    ) -> Result<Option<MessageWithMetadata>, InboxError> {
        let SegmentSelection {
            segment,
            segment_num,
            in_bounds,
            timestamp,
            block_number,
            after_delayed_messages,
        } = selection;
        if segment.is_empty() {
            error!(
                target: "inbox",
                batch_num = self.cached_sequencer_message_num,
                segment_num,
                "empty sequencer message segment"
            );
            return Ok(None);
        }
        let kind_byte = segment[0];
        let mut body = segment.slice(1..);
        match BatchSegmentKind::from_byte(kind_byte) {
            Some(kind @ (BatchSegmentKind::L2Message | BatchSegmentKind::L2MessageBrotli)) => {
                if kind == BatchSegmentKind::L2MessageBrotli {
                    body = match compress::decompress(&body, MAX_L2_MESSAGE_SIZE) {
                        Ok(decompressed) => decompressed.into(),
                        Err(err) => {
                            info!(
                                target: "inbox",
                                %err,
                                delayed_messages_read = self.delayed_messages_read,
                                "dropping compressed message"
                            );
                            return Ok(None);
                        }
                    };
                }
                Ok(Some(MessageWithMetadata {
                    message: L1IncomingMessage {
                        header: L1IncomingMessageHeader {
                            kind: L1_MESSAGE_TYPE_L2_MESSAGE,
                            poster: BATCH_POSTER_ADDRESS,
                            block_number,
                            timestamp,
                            request_id: None,
                            base_fee_l1: U256::ZERO,
                        },
                        l2_msg: body,
                    },
                    delayed_messages_read: self.delayed_messages_read,
                }))
            }
            Some(BatchSegmentKind::DelayedMessages) => {
                if self.delayed_messages_read >= after_delayed_messages {
                    if in_bounds {
                        warn!(
                            target: "inbox",
                            delayed_messages_read = self.delayed_messages_read,
                            after_delayed_messages,
                            "attempt to read past batch delayed message count"
                        );
                    }
                    Ok(Some(MessageWithMetadata {
                        message: L1IncomingMessage::invalid(),
                        delayed_messages_read: after_delayed_messages,
                    }))
                } else {
                    if ctx.is_cancelled() {
                        return Err(InboxError::Cancelled);
                    }
                    let delayed = self
                        .backend
                        .read_delayed_inbox(self.delayed_messages_read)
                        .await
                        .map_err(InboxError::Backend)?;
                    self.delayed_messages_read += 1;
                    Ok(Some(MessageWithMetadata {
                        message: delayed,
                        delayed_messages_read: self.delayed_messages_read,
                    }))
                }
            }
            _ => {
                // advance directives are consumed by the walk; anything
                // selected here is an unknown kind
                error!(
                    target: "inbox",
                    batch_num = self.cached_sequencer_message_num,
                    segment_num,
                    kind = kind_byte,
                    "bad sequencer message segment kind"
                );
                Ok(None)
            }
        }
    }

    /// Whether the segment under the cursor is the last of the batch: no
    /// delayed messages still owed, and no payload or delayed segment after
    /// it. Empty segments and advance directives never extend a batch.
    fn is_cached_segment_last(&self) -> bool {
        let Some(seq_msg) = &self.cached_sequencer_message else {
            return true;
        };
        // delayed messages are issued until reaching after_delayed_messages
        if self.delayed_messages_read < seq_msg.after_delayed_messages {
            return false;
        }
        for segment in seq_msg.segments.iter().skip(self.cached_segment_num as usize + 1) {
            let Some(&kind_byte) = segment.first() else {
                continue;
            };
            if matches!(
                BatchSegmentKind::from_byte(kind_byte),
                Some(
                    BatchSegmentKind::L2Message
                        | BatchSegmentKind::L2MessageBrotli
                        | BatchSegmentKind::DelayedMessages
                )
            ) {
                return false;
            }
        }
        true
    }

    fn advance_sequencer_message(&mut self) {
        if let Some(seq_msg) = &self.cached_sequencer_message {
            self.delayed_messages_read = seq_msg.after_delayed_messages;
        }
        self.backend.set_position_within_message(0);
        self.backend.advance_sequencer_inbox();
        self.cached_sequencer_message = None;
        self.cached_segment_num = 0;
        self.cached_segment_timestamp = 0;
        self.cached_segment_block_number = 0;
        self.cached_submessage_num = 0;
    }

    fn advance_submessage(&mut self) {
        let prev = self.backend.get_position_within_message();
        self.backend.set_position_within_message(prev + 1);
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, B256};

    use super::*;
    use crate::{
        test_utils::{
            advance_segment, build_batch, delayed_segment, encode_batch_header, l2_brotli_segment,
            l2_segment, NoProviders, TestInboxBackend,
        },
        types::L1_MESSAGE_TYPE_INVALID,
    };

    type TestMux = InboxMultiplexer<TestInboxBackend, NoProviders>;

    fn mux(backend: TestInboxBackend) -> TestMux {
        InboxMultiplexer::new(backend, 0, Vec::new(), KeysetValidationMode::DontValidate)
    }

    fn delayed_message(tag: u8) -> L1IncomingMessage {
        L1IncomingMessage {
            header: L1IncomingMessageHeader {
                kind: 12,
                poster: Address::with_last_byte(tag),
                block_number: 0,
                timestamp: 0,
                request_id: Some(B256::with_last_byte(tag)),
                base_fee_l1: U256::ZERO,
            },
            l2_msg: Bytes::copy_from_slice(&[tag]),
        }
    }

    #[tokio::test]
    async fn header_only_batch_drains_in_one_pop() {
        let backend = TestInboxBackend::new(
            vec![encode_batch_header(100, 200, 1, 1, 0).into()],
            Vec::new(),
        );
        let mut mux = mux(backend.clone());
        let msg = mux.pop(&CancellationToken::new()).await.unwrap();
        assert_eq!(msg.message.header.kind, L1_MESSAGE_TYPE_INVALID);
        assert_eq!(msg.delayed_messages_read, 0);
        assert_eq!(mux.delayed_messages_read(), 0);
        assert_eq!(backend.position(), 1);
        assert_eq!(backend.position_within_message(), 0);
    }

    #[tokio::test]
    async fn brotli_batch_with_one_l2_segment() {
        let batch = build_batch(&encode_batch_header(50, 50, 3, 9, 0), &[l2_segment(b"hello")]);
        let backend = TestInboxBackend::new(vec![batch.into()], Vec::new());
        let mut mux = mux(backend.clone());
        let msg = mux.pop(&CancellationToken::new()).await.unwrap();
        assert_eq!(msg.message.header.kind, L1_MESSAGE_TYPE_L2_MESSAGE);
        assert_eq!(msg.message.header.poster, BATCH_POSTER_ADDRESS);
        assert_eq!(msg.message.header.timestamp, 50);
        assert_eq!(msg.message.header.block_number, 3);
        assert_eq!(msg.message.l2_msg.as_ref(), b"hello");
        // single real segment: the batch advances
        assert_eq!(backend.position(), 1);
    }

    #[tokio::test]
    async fn compressed_l2_segment_is_decompressed() {
        let batch =
            build_batch(&encode_batch_header(0, 0, 0, 0, 0), &[l2_brotli_segment(b"compressed")]);
        let backend = TestInboxBackend::new(vec![batch.into()], Vec::new());
        let mut mux = mux(backend);
        let msg = mux.pop(&CancellationToken::new()).await.unwrap();
        assert_eq!(msg.message.l2_msg.as_ref(), b"compressed");
    }

    #[tokio::test]
    async fn advance_directives_accumulate_and_clamp() {
        let segments = vec![
            advance_segment(BatchSegmentKind::AdvanceTimestamp, 5),
            advance_segment(BatchSegmentKind::AdvanceL1BlockNumber, 2),
            l2_segment(b"x"),
        ];
        let batch = build_batch(&encode_batch_header(0, 100, 10, 100, 0), &segments);
        let backend = TestInboxBackend::new(vec![batch.into()], Vec::new());
        let mut mux = mux(backend);
        let msg = mux.pop(&CancellationToken::new()).await.unwrap();
        assert_eq!(msg.message.header.timestamp, 5);
        // the running block number advanced to 2 and is clamped up to the
        // window floor at emission
        assert_eq!(msg.message.header.block_number, 10);
    }

    #[tokio::test]
    async fn running_values_stay_unclamped_between_emissions() {
        let segments = vec![
            advance_segment(BatchSegmentKind::AdvanceTimestamp, 500),
            l2_segment(b"a"),
            l2_segment(b"b"),
        ];
        let batch = build_batch(&encode_batch_header(0, 100, 0, 0, 0), &segments);
        let backend = TestInboxBackend::new(vec![batch.into()], Vec::new());
        let mut mux = mux(backend);
        let ctx = CancellationToken::new();
        let first = mux.pop(&ctx).await.unwrap();
        assert_eq!(first.message.header.timestamp, 100);
        // the stored running value is still 500, so the second emission
        // clamps again rather than compounding
        let second = mux.pop(&ctx).await.unwrap();
        assert_eq!(second.message.header.timestamp, 100);
        assert_eq!(second.message.l2_msg.as_ref(), b"b");
    }

    #[tokio::test]
    async fn malformed_advance_directive_is_skipped() {
        let mut bad_advance = vec![BatchSegmentKind::AdvanceTimestamp as u8];
        bad_advance.extend_from_slice(&[0xc1, 0x01]); // a list, not a u64
        let segments = vec![bad_advance, l2_segment(b"x")];
        let batch = build_batch(&encode_batch_header(0, 100, 0, 100, 0), &segments);
        let backend = TestInboxBackend::new(vec![batch.into()], Vec::new());
        let mut mux = mux(backend);
        let msg = mux.pop(&CancellationToken::new()).await.unwrap();
        assert_eq!(msg.message.header.timestamp, 0);
        assert_eq!(msg.message.l2_msg.as_ref(), b"x");
    }

    #[tokio::test]
    async fn explicit_delayed_segments_consume_the_inbox() {
        let segments = vec![delayed_segment(), delayed_segment()];
        let batch = build_batch(&encode_batch_header(0, 0, 0, 0, 2), &segments);
        let backend = TestInboxBackend::new(
            vec![batch.into()],
            vec![delayed_message(1), delayed_message(2)],
        );
        let mut mux = mux(backend.clone());
        let ctx = CancellationToken::new();
        let first = mux.pop(&ctx).await.unwrap();
        assert_eq!(first.message, delayed_message(1));
        assert_eq!(first.delayed_messages_read, 1);
        assert_eq!(backend.position(), 0);
        let second = mux.pop(&ctx).await.unwrap();
        assert_eq!(second.message, delayed_message(2));
        assert_eq!(second.delayed_messages_read, 2);
        assert_eq!(mux.delayed_messages_read(), 2);
        assert_eq!(backend.position(), 1);
    }

    #[tokio::test]
    async fn virtual_delayed_tail_consumes_promised_messages() {
        // no delayed segments, but the batch promises two delayed reads
        let backend = TestInboxBackend::new(
            vec![encode_batch_header(0, 0, 0, 0, 2).into()],
            vec![delayed_message(1), delayed_message(2)],
        );
        let mut mux = mux(backend.clone());
        let ctx = CancellationToken::new();
        let first = mux.pop(&ctx).await.unwrap();
        assert_eq!(first.message, delayed_message(1));
        assert_eq!(backend.position(), 0);
        assert_eq!(backend.position_within_message(), 1);
        let second = mux.pop(&ctx).await.unwrap();
        assert_eq!(second.message, delayed_message(2));
        assert_eq!(mux.delayed_messages_read(), 2);
        assert_eq!(backend.position(), 1);
        assert_eq!(backend.position_within_message(), 0);
    }

    #[tokio::test]
    async fn reading_past_delayed_count_is_invalid() {
        let segments = vec![delayed_segment(), delayed_segment()];
        let batch = build_batch(&encode_batch_header(0, 0, 0, 0, 1), &segments);
        let backend =
            TestInboxBackend::new(vec![batch.into()], vec![delayed_message(1)]);
        let mut mux = mux(backend.clone());
        let ctx = CancellationToken::new();
        let first = mux.pop(&ctx).await.unwrap();
        assert_eq!(first.message, delayed_message(1));
        let second = mux.pop(&ctx).await.unwrap();
        assert_eq!(second.message.header.kind, L1_MESSAGE_TYPE_INVALID);
        assert_eq!(second.delayed_messages_read, 1);
        assert_eq!(backend.position(), 1);
    }

    #[tokio::test]
    async fn unknown_authenticated_header_is_fatal_and_stateless() {
        let mut batch = encode_batch_header(0, 0, 0, 0, 0);
        batch.push(0x40);
        let backend = TestInboxBackend::new(vec![batch.into()], Vec::new());
        let mut mux = mux(backend.clone());
        let ctx = CancellationToken::new();
        for _ in 0..2 {
            let err = mux.pop(&ctx).await.unwrap_err();
            assert!(matches!(err, InboxError::NodeOutOfDate(0x40)));
            assert_eq!(backend.position(), 0);
            assert_eq!(backend.position_within_message(), 0);
            assert_eq!(mux.delayed_messages_read(), 0);
        }
    }

    #[tokio::test]
    async fn soft_failures_advance_exactly_one_submessage() {
        let mut bad_compressed = vec![BatchSegmentKind::L2MessageBrotli as u8];
        bad_compressed.extend_from_slice(&[0xff, 0xfe, 0xfd, 0xfc]);
        let unknown_kind = vec![9u8, 0xaa];
        let segments = vec![bad_compressed, unknown_kind, l2_segment(b"ok")];
        let batch = build_batch(&encode_batch_header(0, 0, 0, 0, 0), &segments);
        let backend = TestInboxBackend::new(vec![batch.into()], Vec::new());
        let mut mux = mux(backend.clone());
        let ctx = CancellationToken::new();
        let first = mux.pop(&ctx).await.unwrap();
        assert_eq!(first.message.header.kind, L1_MESSAGE_TYPE_INVALID);
        assert_eq!(backend.position_within_message(), 1);
        let second = mux.pop(&ctx).await.unwrap();
        assert_eq!(second.message.header.kind, L1_MESSAGE_TYPE_INVALID);
        assert_eq!(backend.position_within_message(), 2);
        let third = mux.pop(&ctx).await.unwrap();
        assert_eq!(third.message.l2_msg.as_ref(), b"ok");
        assert_eq!(backend.position(), 1);
    }

    #[tokio::test]
    async fn backend_errors_do_not_advance() {
        let segments = vec![delayed_segment(), l2_segment(b"after")];
        let batch = build_batch(&encode_batch_header(0, 0, 0, 0, 1), &segments);
        let backend = TestInboxBackend::new(vec![batch.into()], Vec::new());
        let mut mux = mux(backend.clone());
        let ctx = CancellationToken::new();
        backend.set_fail_delayed(true);
        let err = mux.pop(&ctx).await.unwrap_err();
        assert!(matches!(err, InboxError::Backend(_)));
        assert_eq!(backend.position_within_message(), 0);
        assert_eq!(mux.delayed_messages_read(), 0);
        // the failed pop is retryable once the backend recovers
        backend.set_fail_delayed(false);
        backend.push_delayed(delayed_message(7));
        let msg = mux.pop(&ctx).await.unwrap();
        assert_eq!(msg.message, delayed_message(7));
        assert_eq!(backend.position_within_message(), 1);
    }

    #[tokio::test]
    async fn peek_errors_propagate_verbatim() {
        let backend = TestInboxBackend::new(Vec::new(), Vec::new());
        backend.set_fail_peek(true);
        let mut mux = mux(backend.clone());
        let err = mux.pop(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, InboxError::Backend(_)));
        assert_eq!(backend.position(), 0);
    }

    #[tokio::test]
    async fn cancellation_is_checked_before_the_peek() {
        let backend = TestInboxBackend::new(
            vec![encode_batch_header(0, 0, 0, 0, 0).into()],
            Vec::new(),
        );
        let mut mux = mux(backend.clone());
        let ctx = CancellationToken::new();
        ctx.cancel();
        let err = mux.pop(&ctx).await.unwrap_err();
        assert!(matches!(err, InboxError::Cancelled));
        assert_eq!(backend.position(), 0);
    }

    #[tokio::test]
    async fn empty_segments_are_skipped() {
        let segments = vec![Vec::new(), l2_segment(b"only"), Vec::new()];
        let batch = build_batch(&encode_batch_header(0, 0, 0, 0, 0), &segments);
        let backend = TestInboxBackend::new(vec![batch.into()], Vec::new());
        let mut mux = mux(backend.clone());
        let msg = mux.pop(&CancellationToken::new()).await.unwrap();
        assert_eq!(msg.message.l2_msg.as_ref(), b"only");
        // trailing empty segments do not extend the batch
        assert_eq!(backend.position(), 1);
    }

    fn mixed_fixture() -> TestInboxBackend {
        let mut bad_compressed = vec![BatchSegmentKind::L2MessageBrotli as u8];
        bad_compressed.extend_from_slice(&[0xff, 0xfe, 0xfd, 0xfc]);
        let first = build_batch(
            &encode_batch_header(10, 20, 1, 5, 1),
            &[
                advance_segment(BatchSegmentKind::AdvanceTimestamp, 15),
                l2_segment(b"first"),
                Vec::new(),
                delayed_segment(),
                bad_compressed,
            ],
        );
        let second = build_batch(
            &encode_batch_header(30, 40, 5, 6, 2),
            &[l2_brotli_segment(b"second"), advance_segment(BatchSegmentKind::AdvanceL1BlockNumber, 9)],
        );
        TestInboxBackend::new(
            vec![first.into(), second.into()],
            vec![delayed_message(1), delayed_message(2)],
        )
    }

    async fn drain(backend: TestInboxBackend) -> Vec<MessageWithMetadata> {
        let mut mux = mux(backend);
        let ctx = CancellationToken::new();
        let mut messages = Vec::new();
        while let Ok(msg) = mux.pop(&ctx).await {
            messages.push(msg);
            if messages.len() > 64 {
                panic!("multiplexer failed to drain");
            }
        }
        messages
    }

    #[tokio::test]
    async fn replay_is_deterministic() {
        let first = drain(mixed_fixture()).await;
        let second = drain(mixed_fixture()).await;
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn drain_count_matches_real_submessages() {
        // batch 1: l2 + delayed + dropped compressed = 3 sub-messages,
        // batch 2: one l2 + one virtual delayed tail = 2 sub-messages
        let messages = drain(mixed_fixture()).await;
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].message.l2_msg.as_ref(), b"first");
        assert_eq!(messages[0].message.header.timestamp, 15);
        assert_eq!(messages[1].message, delayed_message(1));
        assert_eq!(messages[2].message.header.kind, L1_MESSAGE_TYPE_INVALID);
        assert_eq!(messages[3].message.l2_msg.as_ref(), b"second");
        assert_eq!(messages[3].message.header.timestamp, 30);
        assert_eq!(messages[3].message.header.block_number, 5);
        assert_eq!(messages[4].message, delayed_message(2));
    }

    #[tokio::test]
    async fn expired_certificate_batch_degrades_to_invalid() {
        use crate::{
            das::{dastree, DasCertificate, Keyset},
            params::MIN_LIFETIME_SECS_FOR_DA_CERT,
            sources::DasSource,
            test_utils::TestDasReader,
        };

        let keyset_bytes = Keyset { assumed_honest: 1, pubkeys: Vec::new() }.encode();
        let payload = b"never reached";
        let reader = TestDasReader::default();
        let keyset_hash = dastree::hash(&keyset_bytes);
        let data_hash = dastree::hash(payload);
        reader.insert(keyset_hash, Bytes::copy_from_slice(&keyset_bytes));
        reader.insert(data_hash, Bytes::copy_from_slice(payload));
        let max_timestamp = 1_000;
        let cert = DasCertificate {
            version: 1,
            keyset_hash,
            data_hash,
            // expires before the batch window plus the mandatory lifetime
            timeout: max_timestamp + MIN_LIFETIME_SECS_FOR_DA_CERT - 1,
            signers_mask: 0,
            sig: [0u8; 96],
        };
        let mut batch = encode_batch_header(0, max_timestamp, 0, 0, 0);
        batch.extend_from_slice(&cert.encode());
        let backend = TestInboxBackend::new(vec![batch.into()], Vec::new());
        let mut mux = InboxMultiplexer::new(
            backend.clone(),
            0,
            vec![DasSource::new(reader)],
            KeysetValidationMode::DontValidate,
        );
        let msg = mux.pop(&CancellationToken::new()).await.unwrap();
        assert_eq!(msg.message.header.kind, L1_MESSAGE_TYPE_INVALID);
        assert_eq!(backend.position(), 1);
    }

    #[tokio::test]
    async fn emitted_values_stay_inside_the_clamp_window() {
        let messages = drain(mixed_fixture()).await;
        for msg in messages.iter().filter(|m| m.message.header.kind == L1_MESSAGE_TYPE_L2_MESSAGE)
        {
            let header = &msg.message.header;
            assert!((10..=40).contains(&header.timestamp));
            assert!((1..=6).contains(&header.block_number));
        }
    }
}
