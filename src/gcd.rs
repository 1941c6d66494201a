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

//! Greatest common divisor of an array, plus the fast modular-inverse
//! divisibility test the same family of codecs uses to cheaply confirm a
//! candidate divisor without a full division.
//!
//! [`gcd_vec`] itself always takes the unconditionally-correct path: a
//! left fold of [`binary_gcd`] over every nonzero element, short-circuiting
//! the moment the running GCD hits 1. An array with no nonzero element at
//! all -- including the empty array -- has nothing to seed the fold with
//! and scans as 1, matching an all-zeros array of any length.

use crate::width::UInt;

#[inline]
fn mask_bits(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Stein's binary GCD algorithm: repeatedly strips common factors of two,
/// then reduces the (now odd) remainder via subtraction, which is cheaper
/// on most hardware than the division the Euclidean algorithm needs.
pub fn binary_gcd(mut a: u64, mut b: u64) -> u64 {
    if a == 0 {
        return b;
    }
    if b == 0 {
        return a;
    }
    let shift = (a | b).trailing_zeros();
    a >>= a.trailing_zeros();
    loop {
        b >>= b.trailing_zeros();
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        b -= a;
        if b == 0 {
            return a << shift;
        }
    }
}

/// Multiplicative inverse of odd `d` modulo 2^64, found by Newton's
/// iteration (each pass doubles the number of correct low bits, so five
/// passes starting from 3 correct bits covers all 64).
pub fn multiplicative_inverse(d_odd: u64) -> u64 {
    debug_assert!(d_odd & 1 == 1, "multiplicative inverse requires an odd divisor");
    let mut x = d_odd;
    for _ in 0..5 {
        x = x.wrapping_mul(2u64.wrapping_sub(d_odd.wrapping_mul(x)));
    }
    x
}

/// Tests `value % divisor == 0` without a division, for values known to fit
/// in `bits` bits. Splits `divisor` into its power-of-two part (checked via
/// trailing zeros) and its odd part (checked via the multiplicative inverse
/// trick: multiplying by the inverse of an odd `d` mod `2^bits` maps exactly
/// the multiples of `d` onto `0..=floor(M/d)` and everything else above it).
pub fn is_divisible(value: u64, divisor: u64, bits: u32) -> bool {
    if divisor == 0 {
        return value == 0;
    }
    if value == 0 {
        return true;
    }
    let dz = divisor.trailing_zeros();
    if dz > 0 && value.trailing_zeros() < dz {
        return false;
    }
    let d_odd = divisor >> dz;
    if d_odd == 1 {
        return true;
    }
    let reduced_bits = bits.saturating_sub(dz);
    let reduced = (value >> dz) & mask_bits(reduced_bits);
    let inv = multiplicative_inverse(d_odd);
    let bound = mask_bits(reduced_bits) / d_odd;
    let q = reduced.wrapping_mul(inv) & mask_bits(reduced_bits);
    q <= bound
}

/// First index whose element is not divisible by `divisor`, or `None` if
/// every element is. A direct user of [`is_divisible`], grounded on the
/// same fast-rejection scan this family of codecs uses to confirm a
/// candidate GCD before committing to it.
pub fn first_index_not_divisible<T: UInt>(values: &[T], divisor: T) -> Option<usize> {
    let bits = T::BYTE_SIZE as u32 * 8;
    let d = divisor.to_u64();
    values
        .iter()
        .position(|&v| !is_divisible(v.to_u64(), d, bits))
}

/// Greatest common divisor of every element of `values`, treating zeros as
/// the GCD identity. A single nonzero element returns that element
/// unchanged; an array with no nonzero element at all (including the empty
/// array) returns 1.
pub fn gcd_vec<T: UInt>(values: &[T]) -> T {
    tracing::trace!(n = values.len(), "gcd::gcd_vec");
    let mut g: u64 = 0;
    for &v in values {
        let x = v.to_u64();
        if x == 0 {
            continue;
        }
        g = if g == 0 { x } else { binary_gcd(g, x) };
        if g == 1 {
            break;
        }
    }
    // An array with no nonzero element (including the empty array) has no
    // candidate to seed the reduction with; by convention this scans as 1.
    T::from_u64(if g == 0 { 1 } else { g })
}
