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

//! K-way merge of up to 64 non-decreasing `u32` runs into their sorted,
//! de-duplicated union, alongside a per-output-value bitset recording which
//! runs contributed that value.
//!
//! The bitset width scales with the run count (1, 2, 4 or 8 bytes) so that
//! up to 64 runs can each claim a bit without wasting space for the common
//! case of a handful of runs.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use snafu::ensure;

use crate::error::{BufferTooSmallSnafu, InvalidParameterSnafu, Result};

/// Maximum number of runs a single merge call can accept.
pub const MAX_RUNS: usize = 64;

/// Byte width of the per-value run-membership bitset, chosen by run count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitsetWidth {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
}

impl BitsetWidth {
    pub fn for_run_count(n: usize) -> Result<Self> {
        match n {
            0..=8 => Ok(BitsetWidth::One),
            9..=16 => Ok(BitsetWidth::Two),
            17..=32 => Ok(BitsetWidth::Four),
            33..=64 => Ok(BitsetWidth::Eight),
            _ => InvalidParameterSnafu {
                msg: format!("merge_sorted supports at most {MAX_RUNS} runs, got {n}"),
            }
            .fail(),
        }
    }

    #[inline]
    pub fn byte_size(self) -> usize {
        self as usize
    }
}

/// Worst-case number of unique output values: every input element distinct.
#[inline]
pub fn merge_bound(runs: &[&[u32]]) -> usize {
    runs.iter().map(|r| r.len()).sum()
}

#[inline]
fn set_bit(slot: &mut [u8], run_idx: usize) {
    slot[run_idx / 8] |= 1 << (run_idx % 8);
}

/// Reads whether `run_idx` is set in the bitset entry for output position
/// `out_idx`. A convenience for callers and tests; the codec itself never
/// needs to read its own output back.
pub fn bit_is_set(bitset: &[u8], stride: usize, out_idx: usize, run_idx: usize) -> bool {
    let slot = &bitset[out_idx * stride..(out_idx + 1) * stride];
    (slot[run_idx / 8] >> (run_idx % 8)) & 1 != 0
}

/// Merges `runs` (each already non-decreasing) into `out_values`, writing
/// the run-membership bitset to `out_bitset` with a stride of
/// `BitsetWidth::for_run_count(runs.len())` bytes per output value. Returns
/// the number of unique values written.
pub fn merge(runs: &[&[u32]], out_values: &mut [u32], out_bitset: &mut [u8]) -> Result<usize> {
    ensure!(
        runs.len() <= MAX_RUNS,
        InvalidParameterSnafu {
            msg: format!("merge_sorted supports at most {MAX_RUNS} runs, got {}", runs.len()),
        }
    );
    let stride = BitsetWidth::for_run_count(runs.len())?.byte_size();
    tracing::trace!(num_runs = runs.len(), stride, "merge_sorted::merge");

    let mut cursors = vec![0usize; runs.len()];
    let mut heap: BinaryHeap<Reverse<(u32, usize)>> = BinaryHeap::new();
    for (run_idx, run) in runs.iter().enumerate() {
        if !run.is_empty() {
            heap.push(Reverse((run[0], run_idx)));
        }
    }

    let mut count = 0usize;
    while let Some(&Reverse((value, _))) = heap.peek() {
        ensure!(
            count < out_values.len(),
            BufferTooSmallSnafu {
                needed: count + 1,
                available: out_values.len(),
            }
        );
        ensure!(
            (count + 1) * stride <= out_bitset.len(),
            BufferTooSmallSnafu {
                needed: (count + 1) * stride,
                available: out_bitset.len(),
            }
        );

        out_values[count] = value;
        let bitset_slot = &mut out_bitset[count * stride..(count + 1) * stride];
        bitset_slot.fill(0);

        while let Some(&Reverse((v, run_idx))) = heap.peek() {
            if v != value {
                break;
            }
            heap.pop();
            set_bit(bitset_slot, run_idx);
            cursors[run_idx] += 1;
            if let Some(&next) = runs[run_idx].get(cursors[run_idx]) {
                heap.push(Reverse((next, run_idx)));
            }
        }
        count += 1;
    }
    Ok(count)
}
