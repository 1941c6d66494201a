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

//! Bit-packing and unpacking of fixed-width unsigned integer arrays.
//!
//! `encode`/`decode` pack `n` elements of width `W` bytes into `ceil(n*K/8)`
//! bytes using `K` bits per element (`0 <= K <= 8*W`), least-significant-bit
//! first. Three code paths are dispatched on `K`, cheapest first:
//!
//! - `K == 0`: no bytes produced / destination zero-filled.
//! - `K == 8*W`: a raw little-endian identity copy.
//! - `K % 8 == 0` (and `0 < K < 8*W`): the byte-aligned fast path in
//!   [`crate::bytepack`].
//! - otherwise: the generic scalar accumulator kernel built on
//!   [`crate::bitstream::ForwardBitWriter`]/[`ForwardBitReader`], which is
//!   also the reference every fast path above must agree with bit-for-bit.
//!
//! A further fast path packs 1-bit fields for up to 64 elements through a
//! single `u64`, matching the generic kernel's output exactly.

use snafu::ensure;

use crate::bitstream::{ForwardBitReader, ForwardBitWriter};
use crate::bytepack::{pack_bytes, unpack_bytes};
use crate::error::{BufferTooSmallSnafu, Result};
use crate::width::{check_bit_width, UInt, Width};

/// Exact byte length of a bitpacked stream of `n` elements at `k` bits each.
#[inline]
pub fn encode_bound(n: usize, k: u32) -> usize {
    (((n as u128) * (k as u128) + 7) / 8) as usize
}

/// Returns `true` iff every element of `src` fits in `k` bits, i.e. has no
/// bit set at position `k` or above. Callers with untrusted data should call
/// this before [`encode`] -- `encode` itself silently truncates.
pub fn verify<T: UInt>(src: &[T], k: u32) -> Result<bool> {
    let width = Width::from_byte_size(T::BYTE_SIZE)?;
    check_bit_width(k, width)?;
    if k >= width.bit_size() {
        return Ok(true);
    }
    Ok(src.iter().all(|&v| (v.to_u64() >> k) == 0))
}

#[inline]
fn pack_1bit_u64<T: UInt>(src: &[T]) -> u64 {
    let mut acc = 0u64;
    for (i, &v) in src.iter().enumerate() {
        acc |= (v.to_u64() & 1) << i;
    }
    acc
}

#[inline]
fn unpack_1bit_u64<T: UInt>(dst: &mut [T], bits: u64) {
    for (i, v) in dst.iter_mut().enumerate() {
        *v = T::from_u64((bits >> i) & 1);
    }
}

/// Packs `src` into `dst` using `k` bits per element. Returns the number of
/// bytes written, which is always [`encode_bound`]`(src.len(), k)`.
pub fn encode<T: UInt>(dst: &mut [u8], src: &[T], k: u32) -> Result<usize> {
    let width = Width::from_byte_size(T::BYTE_SIZE)?;
    check_bit_width(k, width)?;

    let n = src.len();
    tracing::trace!(n, k, byte_size = T::BYTE_SIZE, "bitpack::encode");
    if n == 0 || k == 0 {
        return Ok(0);
    }

    let bound = encode_bound(n, k);
    ensure!(
        dst.len() >= bound,
        BufferTooSmallSnafu {
            needed: bound,
            available: dst.len(),
        }
    );
    let dst = &mut dst[..bound];

    if k == width.bit_size() {
        for (&v, chunk) in src.iter().zip(dst.chunks_exact_mut(T::BYTE_SIZE)) {
            chunk.copy_from_slice(v.to_le_bytes().as_ref());
        }
        return Ok(bound);
    }

    if k == 1 && n <= 64 {
        let bits = pack_1bit_u64(src);
        dst.copy_from_slice(&bits.to_le_bytes()[..bound]);
        return Ok(bound);
    }

    if k % 8 == 0 {
        pack_bytes(dst, src, (k / 8) as usize);
        return Ok(bound);
    }

    let mut writer = ForwardBitWriter::new(dst);
    for &v in src {
        writer.write(v.to_u64(), k)?;
    }
    let written = writer.finish()?;
    debug_assert_eq!(written, bound);
    Ok(written)
}

/// Unpacks `src` into `dst`, the inverse of [`encode`]. `dst.len()` is taken
/// as the element count `n`; `src` must hold at least [`encode_bound`].
pub fn decode<T: UInt>(dst: &mut [T], src: &[u8], k: u32) -> Result<()> {
    let width = Width::from_byte_size(T::BYTE_SIZE)?;
    check_bit_width(k, width)?;

    let n = dst.len();
    tracing::trace!(n, k, byte_size = T::BYTE_SIZE, "bitpack::decode");
    if n == 0 {
        return Ok(());
    }
    if k == 0 {
        dst.fill(T::zero());
        return Ok(());
    }

    let bound = encode_bound(n, k);
    ensure!(
        src.len() >= bound,
        BufferTooSmallSnafu {
            needed: bound,
            available: src.len(),
        }
    );
    let src = &src[..bound];

    if k == width.bit_size() {
        for (v, chunk) in dst.iter_mut().zip(src.chunks_exact(T::BYTE_SIZE)) {
            let mut bytes = T::Bytes::default();
            bytes.as_mut().copy_from_slice(chunk);
            *v = T::from_le_bytes(bytes);
        }
        return Ok(());
    }

    if k == 1 && n <= 64 {
        let mut bytes = [0u8; 8];
        bytes[..bound].copy_from_slice(src);
        unpack_1bit_u64(dst, u64::from_le_bytes(bytes));
        return Ok(());
    }

    if k % 8 == 0 {
        unpack_bytes(dst, src, (k / 8) as usize);
        return Ok(());
    }

    let mut reader = ForwardBitReader::new(src);
    for v in dst.iter_mut() {
        *v = T::from_u64(reader.read(k)?);
    }
    Ok(())
}
