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

//! First-order delta transform: `out[0] = in[0]`, `out[i] = in[i] - in[i-1]`
//! for `i > 0`, with wraparound subtraction/addition at the element width so
//! the transform is a total, lossless bijection on every input -- including
//! ones that are not monotonic.

use crate::width::UInt;

/// Encodes `src` into `dst` in place of a copy: `dst[0] = src[0]`, and
/// `dst[i]` holds `src[i].wrapping_sub(src[i - 1])` thereafter. `dst.len()`
/// must equal `src.len()`; the two may be the same buffer transformed
/// in-place by calling with equal slices is not supported since both are
/// borrowed immutably/mutably, so callers transform via a scratch copy or
/// call [`encode_in_place`].
pub fn encode<T: UInt>(dst: &mut [T], src: &[T]) {
    debug_assert_eq!(dst.len(), src.len());
    if src.is_empty() {
        return;
    }
    dst[0] = src[0];
    for i in 1..src.len() {
        dst[i] = src[i].wrapping_sub(src[i - 1]);
    }
}

/// Inverse of [`encode`]: `dst[0] = src[0]`, `dst[i] = dst[i-1] + src[i]`.
pub fn decode<T: UInt>(dst: &mut [T], src: &[T]) {
    debug_assert_eq!(dst.len(), src.len());
    if src.is_empty() {
        return;
    }
    dst[0] = src[0];
    for i in 1..src.len() {
        dst[i] = dst[i - 1].wrapping_add(src[i]);
    }
}

/// Transforms `values` in place, running the accumulator forward and
/// overwriting each element with its delta against the previous (original)
/// element as it goes.
pub fn encode_in_place<T: UInt>(values: &mut [T]) {
    if values.is_empty() {
        return;
    }
    let mut prev = values[0];
    for v in &mut values[1..] {
        let cur = *v;
        *v = cur.wrapping_sub(prev);
        prev = cur;
    }
}

/// Inverse of [`encode_in_place`], running the accumulator forward and
/// overwriting each delta with the reconstructed original value.
pub fn decode_in_place<T: UInt>(values: &mut [T]) {
    if values.is_empty() {
        return;
    }
    let mut acc = values[0];
    for v in &mut values[1..] {
        acc = acc.wrapping_add(*v);
        *v = acc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_decode_round_trip_u32() {
        let src: [u32; 5] = [10, 7, 7, 1000, 0];
        let mut deltas = [0u32; 5];
        encode(&mut deltas, &src);
        assert_eq!(deltas[0], 10);
        // 7 - 10 wraps around.
        assert_eq!(deltas[1], 7u32.wrapping_sub(10));

        let mut back = [0u32; 5];
        decode(&mut back, &deltas);
        assert_eq!(back, src);
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let src: [u8; 0] = [];
        let mut dst: [u8; 0] = [];
        encode(&mut dst, &src);
        decode(&mut dst, &src);
        assert_eq!(dst, src);
    }

    #[test]
    fn single_element_is_identity() {
        let src = [42u16];
        let mut deltas = [0u16];
        encode(&mut deltas, &src);
        assert_eq!(deltas, [42]);
        let mut back = [0u16];
        decode(&mut back, &deltas);
        assert_eq!(back, src);
    }

    #[test]
    fn in_place_variants_match_copying_variants() {
        let src: [u32; 6] = [5, 3, 3, 9, 2, u32::MAX];

        let mut copying = [0u32; 6];
        encode(&mut copying, &src);

        let mut in_place = src;
        encode_in_place(&mut in_place);
        assert_eq!(copying, in_place);

        let mut copying_back = [0u32; 6];
        decode(&mut copying_back, &copying);
        assert_eq!(copying_back, src);

        let mut in_place_back = in_place;
        decode_in_place(&mut in_place_back);
        assert_eq!(in_place_back, src);
    }

    proptest! {
        #[test]
        fn round_trips_u64(values in prop::collection::vec(any::<u64>(), 0..256)) {
            let mut deltas = vec![0u64; values.len()];
            encode(&mut deltas, &values);
            let mut back = vec![0u64; values.len()];
            decode(&mut back, &deltas);
            prop_assert_eq!(back, values);
        }

        #[test]
        fn round_trips_u8_with_wraparound(values in prop::collection::vec(any::<u8>(), 0..256)) {
            let mut deltas = vec![0u8; values.len()];
            encode(&mut deltas, &values);
            let mut back = vec![0u8; values.len()];
            decode(&mut back, &deltas);
            prop_assert_eq!(back, values);
        }

        #[test]
        fn in_place_matches_copying_arbitrary(values in prop::collection::vec(any::<u32>(), 0..256)) {
            let mut copying = vec![0u32; values.len()];
            encode(&mut copying, &values);
            let mut in_place = values.clone();
            encode_in_place(&mut in_place);
            prop_assert_eq!(copying, in_place);
        }
    }
}
