//! LZSS decompression for the LZ10, LZ11, and overlay dialects.
//!
//! Normal streams carry a magic byte (0x10 = LZ10, 0x11 = LZ11) followed
//! by a 24-bit little-endian decompressed size, then flag-byte-driven
//! token data (flag bits are consumed MSB first). Overlay streams are
//! LZ10 compressed back-to-front for in-place decompression on the
//! console: an 8-byte footer at the end of the file gives the window and
//! the output size, and both the compressed window and its decoded form
//! are byte-reversed around the inner decode.
//!
//! Decoding stops the moment the declared output size is reached. Every
//! read and every back-reference is bounds-checked; malformed input
//! fails with a [`NitroError`] rather than producing partial output.

use nitrofs_core::{NitroError, Result, bytes};

/// Decompress an LZSS stream.
///
/// With `overlay = false` the dialect is selected by the stream's magic
/// byte. With `overlay = true` the input is treated as a
/// reverse-direction LZ10 overlay image.
pub fn decompress(input: &[u8], overlay: bool) -> Result<Vec<u8>> {
    if overlay {
        decompress_overlay(input)
    } else {
        decompress_normal(input)
    }
}

fn decompress_normal(input: &[u8]) -> Result<Vec<u8>> {
    if input.len() < 4 {
        return Err(NitroError::Truncated {
            offset: 0,
            needed: 4,
        });
    }

    let word = bytes::le_u32_at(input, 0)?;
    let magic = (word & 0xFF) as u8;
    let declared = (word >> 8) as usize;

    log::trace!("lzss: magic {magic:#04x}, {} -> {declared} bytes", input.len());

    match magic {
        0x10 => decode_lz10(input, 4, declared, false),
        0x11 => decode_lz11(input, 4, declared, false),
        _ => Err(NitroError::BadMagic),
    }
}

/// Read the next flag byte, or fail.
///
/// Running out of input exactly where a flag byte belongs means the
/// stream simply ended early; anywhere else a missing byte is a
/// truncated token.
fn flag_byte(input: &[u8], pos: usize, produced: usize, declared: usize) -> Result<u8> {
    input.get(pos).copied().ok_or(NitroError::ShortOutput {
        produced,
        declared,
    })
}

fn token_byte(input: &[u8], pos: usize) -> Result<u8> {
    input.get(pos).copied().ok_or(NitroError::Truncated {
        offset: pos,
        needed: 1,
    })
}

/// Copy `count` bytes from `disp` bytes behind the end of `out`,
/// stopping early if the declared size is reached.
fn copy_back_reference(
    out: &mut Vec<u8>,
    disp: usize,
    count: usize,
    declared: usize,
) -> Result<()> {
    if disp > out.len() {
        return Err(NitroError::BadReference {
            disp,
            produced: out.len(),
        });
    }
    for _ in 0..count {
        if out.len() == declared {
            break;
        }
        let b = out[out.len() - disp];
        out.push(b);
    }
    Ok(())
}

/// LZ10 inner decoder.
///
/// `overlay` selects the displacement bias: back-references are
/// `disp + 1` in normal streams and `disp + 3` in overlay streams.
fn decode_lz10(input: &[u8], offset: usize, declared: usize, overlay: bool) -> Result<Vec<u8>> {
    let disp_extra: usize = if overlay { 3 } else { 1 };
    let mut out = Vec::with_capacity(declared);
    let mut pos = offset;

    while out.len() < declared {
        let flags = flag_byte(input, pos, out.len(), declared)?;
        pos += 1;

        for bit in (0..8).rev() {
            if flags >> bit & 1 == 0 {
                out.push(token_byte(input, pos)?);
                pos += 1;
            } else {
                let hi = token_byte(input, pos)?;
                let lo = token_byte(input, pos + 1)?;
                pos += 2;
                let code = u16::from_be_bytes([hi, lo]);
                let count = (code >> 12) as usize + 3;
                let disp = (code & 0x0FFF) as usize + disp_extra;
                copy_back_reference(&mut out, disp, count, declared)?;
            }
            if out.len() >= declared {
                break;
            }
        }
    }

    Ok(out)
}

/// LZ11 inner decoder. Only valid for normal-direction streams.
fn decode_lz11(input: &[u8], offset: usize, declared: usize, overlay: bool) -> Result<Vec<u8>> {
    if overlay {
        return Err(NitroError::UnsupportedMode);
    }

    let mut out = Vec::with_capacity(declared);
    let mut pos = offset;

    while out.len() < declared {
        let flags = flag_byte(input, pos, out.len(), declared)?;
        pos += 1;

        for bit in (0..8).rev() {
            if flags >> bit & 1 == 0 {
                out.push(token_byte(input, pos)?);
                pos += 1;
            } else {
                let b = token_byte(input, pos)?;
                pos += 1;
                let indicator = b >> 4;

                // The last byte of the count encoding also carries the
                // top nibble of the displacement.
                let (count, disp_hi) = match indicator {
                    0 => {
                        // 8-bit count; indicator is 0 so b needs no mask
                        let b2 = token_byte(input, pos)?;
                        pos += 1;
                        (((b as usize) << 4) + (b2 >> 4) as usize + 0x11, b2)
                    }
                    1 => {
                        // 16-bit count
                        let b2 = token_byte(input, pos)?;
                        let b3 = token_byte(input, pos + 1)?;
                        pos += 2;
                        (
                            (((b & 0x0F) as usize) << 12)
                                + ((b2 as usize) << 4)
                                + (b3 >> 4) as usize
                                + 0x111,
                            b3,
                        )
                    }
                    _ => (indicator as usize + 1, b),
                };

                let b4 = token_byte(input, pos)?;
                pos += 1;
                let disp = (((disp_hi & 0x0F) as usize) << 8) + b4 as usize + 1;
                copy_back_reference(&mut out, disp, count, declared)?;
            }
            if out.len() >= declared {
                break;
            }
        }
    }

    Ok(out)
}

/// Overlay decompression.
///
/// The 8-byte footer at the end of the image holds two little-endian
/// words: `end_delta` (with a padding byte count in its high byte) and
/// `start_delta`. The compressed window is the `end_delta - padding`
/// bytes ending at the padding; it decodes back-to-front into
/// `start_delta + end_delta` bytes that replace the window in the
/// output, after the untouched prefix.
fn decompress_overlay(input: &[u8]) -> Result<Vec<u8>> {
    let filelen = input.len();
    if filelen < 8 {
        return Err(NitroError::Truncated {
            offset: 0,
            needed: 8,
        });
    }

    let end_delta_word = bytes::le_u32_at(input, filelen - 8)?;
    let start_delta = bytes::le_u32_at(input, filelen - 4)? as usize;

    let padding = (end_delta_word >> 24) as usize;
    let end_delta = (end_delta_word & 0x00FF_FFFF) as usize;
    let declared = start_delta
        .checked_add(end_delta)
        .ok_or(NitroError::OutOfBounds)?;

    if end_delta > filelen || padding > end_delta {
        return Err(NitroError::OutOfBounds);
    }

    let window_start = filelen - end_delta;
    log::trace!("lzss overlay: {filelen} -> {} bytes", window_start + declared);
    let mut flipped = input[window_start..filelen - padding].to_vec();
    flipped.reverse();

    let mut tail = decode_lz10(&flipped, 0, declared, true)?;
    tail.reverse();

    let mut out = Vec::with_capacity(window_start + tail.len());
    out.extend_from_slice(&input[..window_start]);
    out.extend_from_slice(&tail);
    Ok(out)
}

#[cfg(test)]
#[path = "tests/lzss_tests.rs"]
mod tests;
