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

//! Bit-level codecs for columnar and numeric data: fixed-width bit-packing,
//! its byte-aligned fast path, first-order delta, small-alphabet token
//! packing, sorted-run merging and array GCD scanning.
//!
//! Every codec is a pure function over caller-owned buffers -- none retains
//! a reference, spawns a thread or touches the filesystem -- and every
//! failure mode (an undersized buffer, a malformed stream, an out-of-range
//! parameter) surfaces through [`error::Error`] rather than a panic.

pub mod bitpack;
pub mod bitstream;
pub mod bytepack;
pub mod delta;
pub mod error;
pub mod flatpack;
pub mod gcd;
pub mod merge_sorted;
pub mod width;

pub use error::{Error, Result};
pub use width::{UInt, Width};
