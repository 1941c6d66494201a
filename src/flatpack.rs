// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Tokenized bit-packing for byte streams whose alphabet is small: build the
//! sorted set of distinct bytes present (at most 256 of them), replace each
//! byte with its index into that alphabet, and [`crate::bitpack`] the
//! indices at the minimum width the alphabet needs.
//!
//! The packed stream is self-terminating: a single `1` bit follows the last
//! index, and [`num_elts`] recovers the element count from nothing but the
//! alphabet size and the packed bytes by locating that marker bit as the
//! highest set bit of the final byte.

use snafu::ensure;

use crate::bitstream::{ForwardBitReader, ForwardBitWriter};
use crate::error::{BufferTooSmallSnafu, CorruptionSnafu, InvalidParameterSnafu, Result};

/// Largest alphabet this codec can address.
pub const MAX_ALPHABET: usize = 256;

/// Result of [`encode`]: how much of `alphabet_out` and `packed_out` it used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOutput {
    pub alphabet_len: usize,
    pub packed_len: usize,
}

/// Bits needed to index an alphabet of `alphabet_size` symbols. A single
/// symbol still costs one bit -- not zero -- so the stop-marker trick in
/// [`num_elts`] has something to anchor to.
#[inline]
pub fn nb_bits(alphabet_size: usize) -> u32 {
    if alphabet_size <= 1 {
        alphabet_size as u32
    } else {
        1 + (31 - ((alphabet_size - 1) as u32).leading_zeros())
    }
}

/// Exact packed length in bytes for `n` tokens at `nb_bits` bits each, plus
/// the trailing stop bit.
#[inline]
pub fn packed_size(nb_bits: u32, n: usize) -> usize {
    if n == 0 {
        0
    } else {
        1 + (nb_bits as usize * n) / 8
    }
}

/// Convenience wrapper combining [`nb_bits`] and [`packed_size`].
#[inline]
pub fn encode_bound(alphabet_size: usize, n: usize) -> usize {
    packed_size(nb_bits(alphabet_size), n)
}

/// Recovers the number of tokens encoded in `packed`, given only the
/// alphabet size, by finding the stop bit in the final byte.
pub fn num_elts(alphabet_size: usize, packed: &[u8]) -> Result<usize> {
    if alphabet_size == 0 || packed.is_empty() {
        return Ok(0);
    }
    let bits = nb_bits(alphabet_size);
    let last_byte = *packed.last().unwrap() | 1;
    let padding_bits = (((last_byte as u32) << 24).leading_zeros()) + 1;
    let total_bits = 8 * packed.len();
    ensure!(
        (padding_bits as usize) <= total_bits,
        CorruptionSnafu {
            msg: "flatpack stream shorter than its own stop marker",
        }
    );
    let packed_bits = total_bits - padding_bits as usize;
    Ok(packed_bits / bits as usize)
}

/// Builds the alphabet of `src` and packs each byte as its index into it.
/// `alphabet_out` must be at least [`MAX_ALPHABET`] bytes; only its first
/// `alphabet_len` (returned) are meaningful.
pub fn encode(packed_out: &mut [u8], alphabet_out: &mut [u8], src: &[u8]) -> Result<EncodeOutput> {
    ensure!(
        alphabet_out.len() >= MAX_ALPHABET,
        InvalidParameterSnafu {
            msg: format!(
                "alphabet_out must hold at least {MAX_ALPHABET} bytes, got {}",
                alphabet_out.len()
            ),
        }
    );

    let mut present = [false; MAX_ALPHABET];
    for &b in src {
        present[b as usize] = true;
    }
    let mut index_of = [0u8; MAX_ALPHABET];
    let mut alphabet_len = 0usize;
    for symbol in 0..MAX_ALPHABET {
        if present[symbol] {
            alphabet_out[alphabet_len] = symbol as u8;
            index_of[symbol] = alphabet_len as u8;
            alphabet_len += 1;
        }
    }

    let n = src.len();
    let bits = nb_bits(alphabet_len);
    let needed = packed_size(bits, n);
    tracing::trace!(n, alphabet_len, nb_bits = bits, "flatpack::encode");
    ensure!(
        packed_out.len() >= needed,
        BufferTooSmallSnafu {
            needed,
            available: packed_out.len(),
        }
    );
    if n == 0 {
        return Ok(EncodeOutput {
            alphabet_len,
            packed_len: 0,
        });
    }

    let mut writer = ForwardBitWriter::new(&mut packed_out[..needed]);
    for &b in src {
        writer.write(index_of[b as usize] as u64, bits)?;
    }
    writer.write(1, 1)?;
    let packed_len = writer.finish()?;
    debug_assert_eq!(packed_len, needed);
    Ok(EncodeOutput {
        alphabet_len,
        packed_len,
    })
}

/// Inverse of [`encode`]: the token count is recovered from `packed` itself
/// via [`num_elts`], not assumed from `dst.len()`. `dst` must have capacity
/// for at least that many tokens; only its first `n` slots are written, and
/// `n` is returned.
pub fn decode(dst: &mut [u8], alphabet: &[u8], packed: &[u8]) -> Result<usize> {
    ensure!(
        alphabet.len() <= MAX_ALPHABET,
        InvalidParameterSnafu {
            msg: format!("alphabet of {} symbols exceeds {MAX_ALPHABET}", alphabet.len()),
        }
    );

    let n = num_elts(alphabet.len(), packed)?;
    tracing::trace!(n, alphabet_len = alphabet.len(), "flatpack::decode");
    ensure!(
        dst.len() >= n,
        BufferTooSmallSnafu {
            needed: n,
            available: dst.len(),
        }
    );
    if n == 0 {
        return Ok(0);
    }

    let bits = nb_bits(alphabet.len());
    let needed = packed_size(bits, n);
    ensure!(
        packed.len() >= needed,
        BufferTooSmallSnafu {
            needed,
            available: packed.len(),
        }
    );

    let mut reader = ForwardBitReader::new(&packed[..needed]);
    for slot in dst[..n].iter_mut() {
        let idx = reader.read(bits)? as usize;
        ensure!(
            idx < alphabet.len(),
            CorruptionSnafu {
                msg: "flatpack token indexes outside its alphabet",
            }
        );
        *slot = alphabet[idx];
    }
    let marker = reader.read(1)?;
    ensure!(
        marker == 1,
        CorruptionSnafu {
            msg: "flatpack stream is missing its stop bit",
        }
    );
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn round_trip(src: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut packed = vec![0u8; encode_bound(MAX_ALPHABET, src.len()).max(1)];
        let mut alphabet = vec![0u8; MAX_ALPHABET];
        let out = encode(&mut packed, &mut alphabet, src).unwrap();
        packed.truncate(out.packed_len);
        alphabet.truncate(out.alphabet_len);

        assert_eq!(num_elts(out.alphabet_len, &packed).unwrap(), src.len());

        let mut decoded = vec![0u8; src.len()];
        let n = decode(&mut decoded, &alphabet, &packed).unwrap();
        assert_eq!(n, src.len());
        (decoded, alphabet)
    }

    #[test]
    fn round_trips_small_alphabet() {
        let src = b"abracadabra";
        let (decoded, alphabet) = round_trip(src);
        assert_eq!(decoded, src);
        assert_eq!(alphabet, vec![b'a', b'b', b'c', b'd', b'r']);
    }

    #[test]
    fn single_symbol_alphabet_recovers_length() {
        let src = vec![7u8; 50];
        let (decoded, alphabet) = round_trip(&src);
        assert_eq!(decoded, src);
        assert_eq!(alphabet, vec![7]);
    }

    #[test]
    fn empty_input_round_trips() {
        let (decoded, alphabet) = round_trip(&[]);
        assert!(decoded.is_empty());
        assert!(alphabet.is_empty());
    }

    #[test]
    fn full_256_symbol_alphabet_uses_eight_bits() {
        let src: Vec<u8> = (0..=255u8).collect();
        assert_eq!(nb_bits(256), 8);
        let (decoded, alphabet) = round_trip(&src);
        assert_eq!(decoded, src);
        assert_eq!(alphabet.len(), 256);
    }

    #[test]
    fn decode_rejects_out_of_range_token() {
        // A 3-symbol alphabet needs 2 bits/token, so only indices 0..=2 are
        // valid; forge a single token of 3 (0b11) followed by the stop bit
        // (byte = 0b0000_0111) to exercise the corrupted-index path.
        let alphabet = [b'a', b'b', b'c'];
        let packed = [0b0000_0111u8];
        let mut dst = [0u8; 1];
        assert!(decode(&mut dst, &alphabet, &packed).is_err());
    }

    #[test]
    fn decode_recovers_length_from_an_oversized_destination() {
        let src = b"abracadabra";
        let mut packed = vec![0u8; encode_bound(MAX_ALPHABET, src.len())];
        let mut alphabet = vec![0u8; MAX_ALPHABET];
        let out = encode(&mut packed, &mut alphabet, src.as_slice()).unwrap();
        packed.truncate(out.packed_len);
        alphabet.truncate(out.alphabet_len);

        let mut dst = vec![0xFFu8; src.len() + 16];
        let n = decode(&mut dst, &alphabet, &packed).unwrap();
        assert_eq!(n, src.len());
        assert_eq!(&dst[..n], src.as_slice());
        assert!(dst[n..].iter().all(|&b| b == 0xFF));
    }

    proptest! {
        #[test]
        fn round_trips_arbitrary_bytes(src in prop::collection::vec(any::<u8>(), 0..512)) {
            let (decoded, _alphabet) = round_trip(&src);
            prop_assert_eq!(decoded, src);
        }
    }
}
