//! Bounded brotli helpers for batch payloads and compressed L2 sub-messages.

use std::io::{Cursor, Read};

use anyhow::{anyhow, bail, Result};

/// Decompresses `data`, failing if the plaintext would exceed `max_len`.
pub fn decompress(data: &[u8], max_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut reader = brotli::Decompressor::new(Cursor::new(data), 4096).take(max_len as u64 + 1);
    reader
        .read_to_end(&mut out)
        .map_err(|err| anyhow!("brotli decompression failed: {err}"))?;
    if out.len() > max_len {
        bail!("decompressed payload exceeds {max_len} bytes");
    }
    Ok(out)
}

/// Compresses `data` at a fixed quality and window so the output is
/// reproducible across nodes.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let params = brotli::enc::BrotliEncoderParams {
        quality: 11,
        lgwin: 22,
        ..Default::default()
    };
    brotli::BrotliCompress(&mut Cursor::new(data), &mut out, &params)
        .map_err(|err| anyhow!("brotli compression failed: {err}"))?;
    Ok(out)
}
