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

//! Byte-aligned fast path of [`crate::bitpack`]: when the bit width is a
//! whole number of bytes, packing is just a truncated little-endian copy of
//! each element, with no bit shifting required.

use crate::width::UInt;

/// Writes the low `byte_width` bytes of each element, little-endian,
/// back-to-back into `dst`. Caller guarantees `dst.len() >= values.len() *
/// byte_width`.
pub fn pack_bytes<T: UInt>(dst: &mut [u8], values: &[T], byte_width: usize) {
    debug_assert!(byte_width >= 1 && byte_width <= T::BYTE_SIZE);
    for (value, chunk) in values.iter().zip(dst.chunks_exact_mut(byte_width)) {
        let bytes = value.to_le_bytes();
        chunk.copy_from_slice(&bytes.as_ref()[..byte_width]);
    }
}

/// Inverse of [`pack_bytes`]: reads `byte_width`-byte little-endian groups
/// and zero-extends them back to `T`.
pub fn unpack_bytes<T: UInt>(values: &mut [T], src: &[u8], byte_width: usize) {
    debug_assert!(byte_width >= 1 && byte_width <= T::BYTE_SIZE);
    for (value, chunk) in values.iter_mut().zip(src.chunks_exact(byte_width)) {
        let mut bytes = T::Bytes::default();
        bytes.as_mut()[..byte_width].copy_from_slice(chunk);
        *value = T::from_le_bytes(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round_trip<T: UInt>(values: &[T], byte_width: usize) -> Vec<T> {
        let mut packed = vec![0u8; values.len() * byte_width];
        pack_bytes(&mut packed, values, byte_width);
        let mut out = vec![T::zero(); values.len()];
        unpack_bytes(&mut out, &packed, byte_width);
        out
    }

    #[test]
    fn truncates_to_requested_byte_width() {
        let values: Vec<u32> = vec![0x1234_5678, 0xFFFF_FFFF, 0];
        let out = round_trip(&values, 2);
        assert_eq!(out, vec![0x0000_5678, 0x0000_FFFF, 0]);
    }

    proptest! {
        #[test]
        fn round_trips_u32_for_every_byte_width(values in prop::collection::vec(any::<u32>(), 0..64), bw in 1usize..=4) {
            let masked: Vec<u32> = values.iter().map(|&v| {
                if bw == 4 { v } else { v & ((1u32 << (bw * 8)) - 1) }
            }).collect();
            let out = round_trip(&masked, bw);
            prop_assert_eq!(out, masked);
        }
    }
}
