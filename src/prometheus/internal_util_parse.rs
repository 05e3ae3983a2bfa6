// Copyright 2018 The Prometheus Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Strict decoding of the numeric tokens found in procfs text files.

use thiserror::Error;

/// Why a token could not be decoded as an unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty token")]
    Empty,
    #[error("invalid digit")]
    InvalidDigit,
    #[error("fraction must have 1 to 3 digits")]
    InvalidFraction,
    #[error("number too large to fit in u64")]
    Overflow,
}

/// Parses a base-10 unsigned integer. Only ASCII digits are accepted, so
/// signs and embedded whitespace are rejected rather than tolerated.
pub fn parse_uint64(s: &str) -> Result<u64, ParseError> {
    if s.is_empty() {
        return Err(ParseError::Empty);
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidDigit);
    }
    // All digits, so the only remaining failure is overflow.
    s.parse::<u64>().map_err(|_| ParseError::Overflow)
}

/// Parses a fixed-point token with up to three decimals (`%u.%03u`) into
/// thousandths: `"1.250"` is 1250, `"3"` is 3000.
pub fn parse_fixed_point_milli(s: &str) -> Result<u64, ParseError> {
    let (whole, frac) = match s.split_once('.') {
        Some((whole, frac)) => {
            if frac.is_empty() || frac.len() > 3 {
                return Err(ParseError::InvalidFraction);
            }
            (whole, frac)
        }
        None => (s, ""),
    };

    let whole = parse_uint64(whole)?;
    let mut milli = 0u64;
    for b in frac.bytes() {
        if !b.is_ascii_digit() {
            return Err(ParseError::InvalidDigit);
        }
        milli = milli * 10 + u64::from(b - b'0');
    }
    for _ in frac.len()..3 {
        milli *= 10;
    }

    whole
        .checked_mul(1000)
        .and_then(|w| w.checked_add(milli))
        .ok_or(ParseError::Overflow)
}
