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

use snafu::{Location, Snafu};

/// Errors produced at the boundary of every codec in this crate.
///
/// No codec panics or unwinds on malformed input or undersized buffers;
/// every failure mode surfaces through this enum instead.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("invalid parameter: {msg}"))]
    InvalidParameter {
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("buffer too small: need {needed} bytes, have {available}"))]
    BufferTooSmall {
        needed: usize,
        available: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("corrupted stream: {msg}"))]
    Corruption {
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("allocation failed: {msg}"))]
    AllocationFailed {
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
