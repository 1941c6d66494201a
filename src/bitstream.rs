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

//! Shared byte-oriented bit-stream primitives used by [`crate::bitpack`] and,
//! transitively, by [`crate::flatpack`].
//!
//! Two disciplines are provided. The forward-filled stream (`FF`) is the
//! natural little-endian layout: bit `j` of the stream is bit `j % k` of the
//! `j / k`-th field written, and a stream can be read back in the same order
//! it was written. The back-filled stream (`BF`) instead grows from the end
//! of the destination buffer towards the start, so fields are recovered in
//! the *reverse* of the order they were written -- the trick classic
//! bit-oriented entropy coders use to avoid buffering the whole output
//! before they know its length. Nothing in this crate's public codecs needs
//! `BF`, but it is exercised directly by the tests at the bottom of this
//! file since higher-level codecs built outside this crate rely on it.

use crate::error::{BufferTooSmallSnafu, CorruptionSnafu, Result};

const MAX_CONTAINER_BITS: u32 = 63;

#[inline]
fn mask_u64(k: u32) -> u64 {
    if k == 0 {
        0
    } else if k >= 64 {
        u64::MAX
    } else {
        (1u64 << k) - 1
    }
}

/// Forward-filled bit writer: a 64-bit accumulator plus a bit count and a
/// byte cursor into a caller-owned destination slice.
pub struct ForwardBitWriter<'a> {
    dst: &'a mut [u8],
    cursor: usize,
    acc: u64,
    nb: u32,
}

impl<'a> ForwardBitWriter<'a> {
    pub fn new(dst: &'a mut [u8]) -> Self {
        Self {
            dst,
            cursor: 0,
            acc: 0,
            nb: 0,
        }
    }

    /// Writes the low `k` bits of `value` (`k` up to 64). Wide fields are
    /// split into sub-`MAX_CONTAINER_BITS` chunks, flushing between chunks,
    /// since `nb` can already sit at up to 7 leftover bits from a previous
    /// write and `nb + k` alone is not bounded by the accumulator's width.
    /// Chunks are taken low bits first, so the stream position of each bit
    /// of `value` is unaffected by where the split happens to fall.
    #[inline]
    pub fn write(&mut self, value: u64, k: u32) -> Result<()> {
        let mut value = value;
        let mut remaining = k;
        while remaining > 0 {
            let space = MAX_CONTAINER_BITS - self.nb;
            let take = remaining.min(space);
            self.acc |= (value & mask_u64(take)) << self.nb;
            self.nb += take;
            value >>= take;
            remaining -= take;
            self.flush()?;
        }
        Ok(())
    }

    /// Emits whole bytes out of the accumulator, consuming `nb & !7` bits.
    #[inline]
    fn flush(&mut self) -> Result<()> {
        while self.nb >= 8 {
            if self.cursor >= self.dst.len() {
                return BufferTooSmallSnafu {
                    needed: self.cursor + 1,
                    available: self.dst.len(),
                }
                .fail();
            }
            self.dst[self.cursor] = (self.acc & 0xFF) as u8;
            self.cursor += 1;
            self.acc >>= 8;
            self.nb -= 8;
        }
        Ok(())
    }

    /// Flushes any remaining bits into a final partial byte and returns the
    /// total number of bytes written.
    pub fn finish(mut self) -> Result<usize> {
        if self.nb > 0 {
            if self.cursor >= self.dst.len() {
                return BufferTooSmallSnafu {
                    needed: self.cursor + 1,
                    available: self.dst.len(),
                }
                .fail();
            }
            self.dst[self.cursor] = (self.acc & 0xFF) as u8;
            self.cursor += 1;
            self.nb = 0;
        }
        Ok(self.cursor)
    }
}

/// Forward-filled bit reader, mirroring [`ForwardBitWriter`].
pub struct ForwardBitReader<'a> {
    src: &'a [u8],
    cursor: usize,
    acc: u64,
    nb: u32,
}

impl<'a> ForwardBitReader<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            cursor: 0,
            acc: 0,
            nb: 0,
        }
    }

    #[inline]
    fn refill(&mut self) {
        while self.nb <= 56 && self.cursor < self.src.len() {
            self.acc |= (self.src[self.cursor] as u64) << self.nb;
            self.cursor += 1;
            self.nb += 8;
        }
    }

    /// Reads `k` bits (0..=64), refilling from the source as needed.
    #[inline]
    pub fn read(&mut self, k: u32) -> Result<u64> {
        if self.nb < k {
            self.refill();
        }
        if self.nb < k {
            return CorruptionSnafu {
                msg: "bit stream exhausted before requested field was read",
            }
            .fail();
        }
        let value = self.acc & mask_u64(k);
        self.acc = if k >= 64 { 0 } else { self.acc >> k };
        self.nb -= k;
        Ok(value)
    }

    /// Number of whole source bytes not yet consumed into the accumulator.
    pub fn bytes_remaining(&self) -> usize {
        self.src.len() - self.cursor
    }
}

/// Back-filled bit writer: grows the destination from its end towards its
/// start. Fields are recoverable only in the reverse of the order they were
/// written, by a [`BackwardBitReader`] reading forwards from the final
/// cursor position returned by [`Self::finish`].
pub struct BackwardBitWriter<'a> {
    dst: &'a mut [u8],
    pos: usize,
    acc: u64,
    nb: u32,
}

impl<'a> BackwardBitWriter<'a> {
    pub fn new(dst: &'a mut [u8]) -> Self {
        let pos = dst.len();
        Self {
            dst,
            pos,
            acc: 0,
            nb: 0,
        }
    }

    /// Writes the low `k` bits of `value` (`k` up to 64), split into
    /// sub-`MAX_CONTAINER_BITS` chunks the same way [`ForwardBitWriter::write`]
    /// is, but high bits first: each chunk appends to the low end of `acc`,
    /// so the chunk containing `value`'s more-significant bits must be
    /// pushed in before the chunk containing its less-significant ones for
    /// the final growth order to match a single unsplit write.
    #[inline]
    pub fn write(&mut self, value: u64, k: u32) -> Result<()> {
        let mut remaining = k;
        while remaining > 0 {
            let space = MAX_CONTAINER_BITS - self.nb;
            let take = remaining.min(space);
            let chunk = (value >> (remaining - take)) & mask_u64(take);
            self.acc = (self.acc << take) | chunk;
            self.nb += take;
            remaining -= take;
            self.flush()?;
        }
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        let nbytes = (self.nb / 8) as usize;
        if nbytes == 0 {
            return Ok(());
        }
        if self.pos < nbytes {
            return BufferTooSmallSnafu {
                needed: nbytes - self.pos,
                available: 0usize,
            }
            .fail();
        }
        let shift = self.nb - (nbytes as u32) * 8;
        let to_write = self.acc >> shift;
        self.pos -= nbytes;
        for i in 0..nbytes {
            self.dst[self.pos + i] = ((to_write >> (8 * i)) & 0xFF) as u8;
        }
        self.nb -= (nbytes as u32) * 8;
        Ok(())
    }

    /// Flushes the remainder together with a `1 0...0` stop sentinel and
    /// returns the offset at which the written region starts.
    pub fn finish(mut self) -> Result<usize> {
        self.flush()?;
        debug_assert!(self.nb < 8);
        let extra = 8 - (self.nb % 8);
        self.write(1u64 << (extra - 1), extra)?;
        debug_assert_eq!(self.nb % 8, 0);
        self.flush()?;
        Ok(self.pos)
    }
}

/// Back-filled bit reader. See [`BackwardBitWriter`] for the layout.
pub struct BackwardBitReader<'a> {
    inner: ForwardBitReader<'a>,
}

impl<'a> BackwardBitReader<'a> {
    pub fn new(src: &'a [u8]) -> Result<Self> {
        let first_byte = *src.first().ok_or_else(|| {
            CorruptionSnafu {
                msg: "back-filled stream is empty",
            }
            .build()
        })?;
        if first_byte == 0 {
            return CorruptionSnafu {
                msg: "back-filled stream is missing its stop sentinel",
            }
            .fail();
        }
        let zero_bits = first_byte.trailing_zeros();
        let mut inner = ForwardBitReader::new(src);
        inner.read(zero_bits + 1)?;
        Ok(Self { inner })
    }

    #[inline]
    pub fn read(&mut self, k: u32) -> Result<u64> {
        self.inner.read(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn forward_stream_round_trips_k3_bytes() {
        // Matches the worked BitPack K=3 example from the specification.
        let values: [u64; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
        let mut buf = [0u8; 3];
        {
            let mut w = ForwardBitWriter::new(&mut buf);
            for &v in &values {
                w.write(v, 3).unwrap();
            }
            let n = w.finish().unwrap();
            assert_eq!(n, 3);
        }
        assert_eq!(buf, [0x88, 0xC6, 0xFA]);

        let mut r = ForwardBitReader::new(&buf);
        let out: Vec<u64> = (0..8).map(|_| r.read(3).unwrap()).collect();
        assert_eq!(out, values);
    }

    #[test]
    fn forward_stream_reports_buffer_too_small() {
        let mut buf = [0u8; 1];
        let mut w = ForwardBitWriter::new(&mut buf);
        w.write(0xFF, 8).unwrap();
        assert!(w.write(0x1, 8).is_err());
    }

    #[test]
    fn forward_stream_handles_wide_fields_back_to_back() {
        // Two 63-bit writes in a row: after the first write's flush leaves
        // 7 leftover bits, nb + k for the second write is 70 -- past the
        // accumulator's 64-bit width if write() didn't chunk internally.
        let values: [u64; 2] = [u64::MAX >> 1, 0x1555_5555_5555_5555];
        let mut buf = vec![0u8; 16];
        let n = {
            let mut w = ForwardBitWriter::new(&mut buf);
            w.write(values[0], 63).unwrap();
            w.write(values[1], 63).unwrap();
            w.finish().unwrap()
        };
        let mut r = ForwardBitReader::new(&buf[..n]);
        assert_eq!(r.read(63).unwrap(), values[0]);
        assert_eq!(r.read(63).unwrap(), values[1]);
    }

    #[test]
    fn backward_stream_recovers_values_in_reverse() {
        let mut buf = [0u8; 16];
        let values: [(u64, u32); 5] = [(3, 4), (9, 5), (1, 2), (31, 5), (0, 3)];
        let start = {
            let mut w = BackwardBitWriter::new(&mut buf);
            for &(v, k) in &values {
                w.write(v, k).unwrap();
            }
            w.finish().unwrap()
        };

        let mut r = BackwardBitReader::new(&buf[start..]).unwrap();
        for &(v, k) in values.iter().rev() {
            assert_eq!(r.read(k).unwrap(), v);
        }
    }

    proptest! {
        #[test]
        fn forward_stream_round_trips_arbitrary_fields(
            fields in prop::collection::vec((0u64..=u64::MAX, 1u32..=64), 1..64)
        ) {
            let masked: Vec<(u64, u32)> = fields
                .into_iter()
                .map(|(v, k)| (v & mask_u64(k), k))
                .collect();
            let total_bits: u32 = masked.iter().map(|(_, k)| k).sum();
            let cap = (total_bits as usize).div_ceil(8) + 1;
            let mut buf = vec![0u8; cap];
            let n = {
                let mut w = ForwardBitWriter::new(&mut buf);
                for &(v, k) in &masked {
                    w.write(v, k).unwrap();
                }
                w.finish().unwrap()
            };
            let mut r = ForwardBitReader::new(&buf[..n]);
            for &(v, k) in &masked {
                prop_assert_eq!(r.read(k).unwrap(), v);
            }
        }

        #[test]
        fn backward_stream_round_trips_arbitrary_fields(
            fields in prop::collection::vec((0u64..=u64::MAX, 1u32..=64), 1..64)
        ) {
            let masked: Vec<(u64, u32)> = fields
                .into_iter()
                .map(|(v, k)| (v & mask_u64(k), k))
                .collect();
            let total_bits: u32 = masked.iter().map(|(_, k)| k).sum();
            let cap = (total_bits as usize).div_ceil(8) + 1;
            let mut buf = vec![0u8; cap];
            let start = {
                let mut w = BackwardBitWriter::new(&mut buf);
                for &(v, k) in &masked {
                    w.write(v, k).unwrap();
                }
                w.finish().unwrap()
            };
            let mut r = BackwardBitReader::new(&buf[start..]).unwrap();
            for &(v, k) in masked.iter().rev() {
                prop_assert_eq!(r.read(k).unwrap(), v);
            }
        }
    }
}
