#![doc = include_str!("../README.md")]
#![warn(
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    rustdoc::all
)]
#![deny(unused_must_use, rust_2018_idioms)]

use thiserror::Error;

/// Terminates an encoded stream. Never produced by the body encoding: a zero
/// bit maps to `0x00` and a one-led group always has its high bit set.
const TERMINATOR: u8 = 0x01;

/// An error thrown while decoding a zero-heavy stream.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroheavyError {
    /// The stream ended without its terminator byte.
    #[error("zero-heavy stream ended before its terminator")]
    MissingTerminator,
    /// A byte that is neither `0x00`, a one-led group, nor the terminator.
    #[error("invalid zero-heavy stream byte {0:#04x}")]
    InvalidByte(u8),
    /// The decoded payload exceeds the caller's cap.
    #[error("decoded payload exceeds the {0} byte cap")]
    OutputTooLarge(usize),
}

/// Reads a payload MSB-first, one bit at a time.
#[derive(Debug)]
struct BitCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitCursor<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn next(&mut self) -> Option<u8> {
        if self.pos >= self.data.len() * 8 {
            return None;
        }
        let bit = (self.data[self.pos / 8] >> (7 - self.pos % 8)) & 1;
        self.pos += 1;
        Some(bit)
    }
}

/// Accumulates decoded bits into whole payload bytes, enforcing the cap.
/// A trailing sub-byte remainder is pad material and is discarded.
#[derive(Debug)]
struct ByteAssembler {
    out: Vec<u8>,
    acc: u8,
    nbits: u8,
    cap: usize,
}

impl ByteAssembler {
    const fn new(cap: usize) -> Self {
        Self { out: Vec::new(), acc: 0, nbits: 0, cap }
    }

    fn push_bit(&mut self, bit: u8) -> Result<(), ZeroheavyError> {
        self.acc = (self.acc << 1) | bit;
        self.nbits += 1;
        if self.nbits == 8 {
            if self.out.len() == self.cap {
                return Err(ZeroheavyError::OutputTooLarge(self.cap));
            }
            self.out.push(self.acc);
            self.acc = 0;
            self.nbits = 0;
        }
        Ok(())
    }
}

/// Encodes a payload into its zero-heavy form, terminator included.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let mut bits = BitCursor::new(payload);
    let mut out = Vec::with_capacity(payload.len() + 1);
    while let Some(bit) = bits.next() {
        if bit == 0 {
            out.push(0x00);
            continue;
        }
        let mut group = 0u8;
        for _ in 0..7 {
            group = (group << 1) | bits.next().unwrap_or(0);
        }
        out.push(0x80 | group);
    }
    out.push(TERMINATOR);
    out
}

/// Decodes a zero-heavy stream, capping the payload at `max_len` bytes.
///
/// Bytes after the terminator are ignored. Every encoded byte yields at most
/// eight payload bits, so the decoded payload is never larger than the input.
pub fn decode(stream: &[u8], max_len: usize) -> Result<Vec<u8>, ZeroheavyError> {
    let mut assembler = ByteAssembler::new(max_len);
    for &byte in stream {
        match byte {
            0x00 => assembler.push_bit(0)?,
            TERMINATOR => return Ok(assembler.out),
            group if group & 0x80 != 0 => {
                assembler.push_bit(1)?;
                for i in (0..7).rev() {
                    assembler.push_bit((group >> i) & 1)?;
                }
            }
            other => return Err(ZeroheavyError::InvalidByte(other)),
        }
    }
    Err(ZeroheavyError::MissingTerminator)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(&[] as &[u8])]
    #[case(&[0u8; 32])]
    #[case(&[0x01])]
    #[case(&[0xff; 5])]
    #[case(&[1, 2, 3, 4, 5])]
    #[case(b"hello world")]
    #[case(&[0x00, 0x80, 0x00, 0x7f, 0xfe])]
    fn roundtrip(#[case] payload: &[u8]) {
        let encoded = encode(payload);
        let decoded = decode(&encoded, payload.len().max(1)).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn roundtrip_pseudo_random() {
        let payload: Vec<u8> = (0..10240).map(|i| (i * 31 + 17) as u8).collect();
        let encoded = encode(&payload);
        assert_eq!(decode(&encoded, payload.len()).unwrap(), payload);
    }

    #[test]
    fn empty_payload_is_bare_terminator() {
        assert_eq!(encode(&[]), vec![TERMINATOR]);
        assert_eq!(decode(&[TERMINATOR], 16).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn encoded_form_is_zero_heavy() {
        // A payload dominated by zero bits should encode mostly to 0x00.
        let payload = vec![0u8; 1024];
        let encoded = encode(&payload);
        let zeros = encoded.iter().filter(|b| **b == 0).count();
        assert!(zeros * 10 >= encoded.len() * 9);
    }

    #[test]
    fn over_cap_is_an_error() {
        let payload = vec![0xaa; 100];
        let encoded = encode(&payload);
        assert_eq!(
            decode(&encoded, 99),
            Err(ZeroheavyError::OutputTooLarge(99))
        );
    }

    #[test]
    fn missing_terminator_is_an_error() {
        let mut encoded = encode(&[1, 2, 3]);
        encoded.pop();
        assert_eq!(
            decode(&encoded, 16),
            Err(ZeroheavyError::MissingTerminator)
        );
    }

    #[rstest]
    #[case(0x02)]
    #[case(0x3f)]
    #[case(0x7f)]
    fn reserved_bytes_are_rejected(#[case] byte: u8) {
        assert_eq!(decode(&[byte], 16), Err(ZeroheavyError::InvalidByte(byte)));
    }

    #[test]
    fn bytes_after_terminator_are_ignored() {
        let mut encoded = encode(b"tail");
        encoded.extend_from_slice(&[0x02, 0xde, 0xad]);
        assert_eq!(decode(&encoded, 16).unwrap(), b"tail");
    }

    #[test]
    fn encode_is_deterministic() {
        let payload = b"determinism is a safety property";
        assert_eq!(encode(payload), encode(payload));
    }
}
