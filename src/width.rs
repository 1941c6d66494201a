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

//! The element types the codecs operate over, and the runtime width tag used
//! to dispatch onto the right one.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not, Shl, Shr};

use crate::error::{InvalidParameterSnafu, Result};
use snafu::ensure;

/// Generalises the codecs over the four supported unsigned element sizes,
/// instead of writing one copy of each kernel per width.
pub trait UInt:
    Copy
    + Default
    + PartialEq
    + Eq
    + PartialOrd
    + Ord
    + fmt::Debug
    + fmt::Binary
    + BitOr<Output = Self>
    + BitOrAssign
    + BitAnd<Output = Self>
    + Not<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Size of this element type in bytes: 1, 2, 4 or 8.
    const BYTE_SIZE: usize;

    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default + Copy;

    fn zero() -> Self;

    fn from_u8(b: u8) -> Self;

    fn from_u64(v: u64) -> Self;

    fn to_u64(self) -> u64;

    fn wrapping_add(self, rhs: Self) -> Self;

    fn wrapping_sub(self, rhs: Self) -> Self;

    fn to_le_bytes(self) -> Self::Bytes;

    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Bits used in the minimal two's-complement-free representation, i.e.
    /// `BYTE_SIZE * 8` minus the number of leading zero bits.
    #[inline]
    fn bits_used(self) -> u32 {
        64 - self.to_u64().leading_zeros()
    }
}

macro_rules! impl_uint {
    ($t:ty, $size:expr) => {
        impl UInt for $t {
            const BYTE_SIZE: usize = $size;

            type Bytes = [u8; $size];

            #[inline]
            fn zero() -> Self {
                0
            }

            #[inline]
            fn from_u8(b: u8) -> Self {
                b as Self
            }

            #[inline]
            fn from_u64(v: u64) -> Self {
                v as Self
            }

            #[inline]
            fn to_u64(self) -> u64 {
                self as u64
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$t>::wrapping_add(self, rhs)
            }

            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$t>::wrapping_sub(self, rhs)
            }

            #[inline]
            fn to_le_bytes(self) -> Self::Bytes {
                <$t>::to_le_bytes(self)
            }

            #[inline]
            fn from_le_bytes(bytes: Self::Bytes) -> Self {
                <$t>::from_le_bytes(bytes)
            }
        }
    };
}

impl_uint!(u8, 1);
impl_uint!(u16, 2);
impl_uint!(u32, 4);
impl_uint!(u64, 8);

/// Element width in bytes, one of the four sizes the codecs support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
}

impl Width {
    pub fn from_byte_size(n: usize) -> Result<Self> {
        match n {
            1 => Ok(Width::One),
            2 => Ok(Width::Two),
            4 => Ok(Width::Four),
            8 => Ok(Width::Eight),
            _ => InvalidParameterSnafu {
                msg: format!("element width must be 1, 2, 4 or 8 bytes, got {n}"),
            }
            .fail(),
        }
    }

    #[inline]
    pub fn byte_size(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn bit_size(self) -> u32 {
        self as u32 * 8
    }
}

/// Validates `0 <= k <= 8 * width`, the bound every bitpacking entry point
/// relies on before touching its buffers.
pub fn check_bit_width(k: u32, width: Width) -> Result<()> {
    ensure!(
        k <= width.bit_size(),
        InvalidParameterSnafu {
            msg: format!(
                "bit width {k} exceeds {} bits for a {}-byte element",
                width.bit_size(),
                width.byte_size()
            )
        }
    );
    Ok(())
}
