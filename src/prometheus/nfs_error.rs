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

use std::fmt;
use std::io;

use thiserror::Error;

use super::internal_util_parse::ParseError;

/// Token count a record type accepts after its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    OneOf(&'static [usize]),
    AtLeast(usize),
    /// Count announced by the record's own leading value.
    Declared(u64),
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::OneOf(ns) => {
                let ns: Vec<String> = ns.iter().map(ToString::to_string).collect();
                write!(f, "{}", ns.join(" or "))
            }
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Declared(n) => write!(f, "{} (declared)", n),
        }
    }
}

/// Failure of a single record decoder. Carries no record-type key; the
/// dispatcher attaches it.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected {expected} values, got {actual}")]
    ArityMismatch { expected: Arity, actual: usize },
    #[error("couldn't parse {field} (value {index}) {token:?}: {reason}")]
    InvalidNumber {
        field: &'static str,
        index: usize,
        token: String,
        reason: ParseError,
    },
}

/// Error returned by a parse of the nfsd stats file. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid NFSd metric line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },
    #[error("unknown NFSd metric line {line}: record type {key:?}")]
    UnknownRecordType { line: usize, key: String },
    #[error("error parsing NFSd {key} record on line {line}: {source}")]
    Record {
        line: usize,
        key: &'static str,
        #[source]
        source: DecodeError,
    },
    #[error("couldn't read NFSd stats: {0}")]
    StreamRead(#[from] io::Error),
}

impl Error {
    /// The record-type key the error was raised for, if any.
    pub fn record_key(&self) -> Option<&str> {
        match self {
            Error::UnknownRecordType { key, .. } => Some(key),
            Error::Record { key, .. } => Some(key),
            _ => None,
        }
    }

    pub fn is_arity_mismatch(&self) -> bool {
        matches!(
            self,
            Error::Record {
                source: DecodeError::ArityMismatch { .. },
                ..
            }
        )
    }

    pub fn is_invalid_number(&self) -> bool {
        matches!(
            self,
            Error::Record {
                source: DecodeError::InvalidNumber { .. },
                ..
            }
        )
    }
}
