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

//! Line-oriented parser for /proc/net/rpc/nfsd.
//!
//! Every line is `<key> <value>...`. The key selects a decoder from a fixed
//! catalog; the first malformed line aborts the whole parse.

use std::collections::HashMap;
use std::io::BufRead;

use lazy_static::lazy_static;

use super::internal_util_parse::{parse_fixed_point_milli, parse_uint64};
use super::nfs::{
    DeclaredRecord, FileHandles, FixedRecord, InputOutput, Network, ReadAheadCache, ReplyCache,
    ServerRPC, ServerRPCStats, StatRecord, Threads, V2Stats, V3Stats, V4Ops, V4Stats,
    FUTURE_COUNTER, THREAD_HISTOGRAM_BUCKETS,
};
use super::nfs_error::{Arity, DecodeError, Error};

/// Decodes the value tokens that follow a record-type key.
type Decoder = fn(&[&str]) -> Result<StatRecord, DecodeError>;

struct CatalogEntry {
    key: &'static str,
    decode: Decoder,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry { key: "rc", decode: decode_fixed::<ReplyCache> },
    CatalogEntry { key: "fh", decode: decode_fixed::<FileHandles> },
    CatalogEntry { key: "io", decode: decode_fixed::<InputOutput> },
    CatalogEntry { key: "th", decode: decode_threads },
    CatalogEntry { key: "ra", decode: decode_fixed::<ReadAheadCache> },
    CatalogEntry { key: "net", decode: decode_fixed::<Network> },
    CatalogEntry { key: "rpc", decode: decode_fixed::<ServerRPC> },
    CatalogEntry { key: "proc2", decode: decode_declared::<V2Stats> },
    CatalogEntry { key: "proc3", decode: decode_declared::<V3Stats> },
    CatalogEntry { key: "proc4", decode: decode_declared::<V4Stats> },
    CatalogEntry { key: "proc4ops", decode: decode_declared::<V4Ops> },
];

lazy_static! {
    static ref DECODERS: HashMap<&'static str, Decoder> =
        CATALOG.iter().map(|e| (e.key, e.decode)).collect();
}

/// Parses the contents of /proc/net/rpc/nfsd.
///
/// Blank lines are skipped. Any other line must be a known record; the
/// first bad line is returned as the error and no partial stats escape.
pub fn parse_server_rpc_stats<R: BufRead>(reader: R) -> Result<ServerRPCStats, Error> {
    let mut stats = ServerRPCStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        stats.store(dispatch(index + 1, &line, &parts)?);
    }

    Ok(stats)
}

fn dispatch(line_no: usize, line: &str, parts: &[&str]) -> Result<StatRecord, Error> {
    // require at least <key> <value>
    if parts.len() < 2 {
        return Err(Error::MalformedLine {
            line: line_no,
            content: line.to_string(),
        });
    }

    let (&key, decode) = DECODERS
        .get_key_value(parts[0])
        .ok_or_else(|| Error::UnknownRecordType {
            line: line_no,
            key: parts[0].to_string(),
        })?;

    decode(&parts[1..]).map_err(|source| Error::Record {
        line: line_no,
        key,
        source,
    })
}

fn decode_value(field: &'static str, index: usize, token: &str) -> Result<u64, DecodeError> {
    parse_uint64(token).map_err(|reason| DecodeError::InvalidNumber {
        field,
        index,
        token: token.to_string(),
        reason,
    })
}

fn decode_fixed<T>(tokens: &[&str]) -> Result<StatRecord, DecodeError>
where
    T: FixedRecord + Into<StatRecord>,
{
    if tokens.len() != T::FIELDS.len() {
        return Err(DecodeError::ArityMismatch {
            expected: Arity::Exact(T::FIELDS.len()),
            actual: tokens.len(),
        });
    }

    let values = tokens
        .iter()
        .zip(T::FIELDS.iter().copied())
        .enumerate()
        .map(|(index, (token, field))| decode_value(field, index, token))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(T::from_values(&values).into())
}

/// Decodes `<values> <counter>...`, requiring exactly `values` counters.
fn decode_declared<T>(tokens: &[&str]) -> Result<StatRecord, DecodeError>
where
    T: DeclaredRecord + Into<StatRecord>,
{
    let (first, rest) = tokens.split_first().ok_or(DecodeError::ArityMismatch {
        expected: Arity::AtLeast(1),
        actual: 0,
    })?;

    let values = decode_value("values", 0, first)?;
    if rest.len() as u64 != values {
        return Err(DecodeError::ArityMismatch {
            expected: Arity::Declared(values),
            actual: rest.len(),
        });
    }

    let counters = rest
        .iter()
        .enumerate()
        .map(|(i, token)| {
            let field = T::NAMES.get(i).copied().unwrap_or(FUTURE_COUNTER);
            decode_value(field, i + 1, token)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(T::from_counters(values, &counters).into())
}

const THREADS_ARITY: &[usize] = &[2, 2 + THREAD_HISTOGRAM_BUCKETS];

// The th line is either "th <threads> <fullcnt>" or carries the ten
// fixed-point usage buckets older kernels print after them.
fn decode_threads(tokens: &[&str]) -> Result<StatRecord, DecodeError> {
    if !THREADS_ARITY.contains(&tokens.len()) {
        return Err(DecodeError::ArityMismatch {
            expected: Arity::OneOf(THREADS_ARITY),
            actual: tokens.len(),
        });
    }

    let threads = decode_value(Threads::FIELDS[0], 0, tokens[0])?;
    let full_cnt = decode_value(Threads::FIELDS[1], 1, tokens[1])?;

    let mut usage_histogram = [0; THREAD_HISTOGRAM_BUCKETS];
    for (i, token) in tokens[2..].iter().enumerate() {
        usage_histogram[i] =
            parse_fixed_point_milli(token).map_err(|reason| DecodeError::InvalidNumber {
                field: "usage_histogram",
                index: i + 2,
                token: token.to_string(),
                reason,
            })?;
    }

    Ok(StatRecord::Threads(Threads {
        threads,
        full_cnt,
        usage_histogram,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prometheus::internal_util_parse::ParseError;

    fn parse(input: &str) -> Result<ServerRPCStats, Error> {
        parse_server_rpc_stats(input.as_bytes())
    }

    const GOOD_FILE: &str = "rc 0 6 18622
fh 0 0 0 0 0
io 157286400 0
th 8 0 0.000 0.000 0.000 0.000 0.000 0.000 0.000 0.000 0.000 0.000
ra 32 0 0 0 0 0 0 0 0 0 0 0
net 18628 0 18628 6
rpc 18628 0 0 0 0
proc2 18 2 69 0 0 4410 0 0 0 0 0 0 0 0 0 0 0 99 2
proc3 22 2 112 0 2719 111 0 0 0 0 0 0 0 0 0 0 0 27 216 0 2 1 0
proc4 2 2 10853
proc4ops 72 0 0 0 1098 2 0 0 0 0 8179 5896 0 0 0 0 5900 0 0 2 0 2 0 9609 0 2 150 1272 0 0 0 1236 0 0 0 0 3 3 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0
";

    #[test]
    fn test_server_rpc_stats() {
        let stats = parse(GOOD_FILE).expect("failed to parse good file");

        assert_eq!(
            stats.reply_cache,
            ReplyCache {
                hits: 0,
                misses: 6,
                no_cache: 18622,
            }
        );
        assert_eq!(stats.file_handles, FileHandles::default());
        assert_eq!(
            stats.input_output,
            InputOutput {
                read: 157286400,
                write: 0,
            }
        );
        assert_eq!(
            stats.threads,
            Threads {
                threads: 8,
                full_cnt: 0,
                usage_histogram: [0; THREAD_HISTOGRAM_BUCKETS],
            }
        );
        assert_eq!(
            stats.read_ahead_cache,
            ReadAheadCache {
                cache_size: 32,
                cache_histogram: [0; 10],
                not_found: 0,
            }
        );
        assert_eq!(
            stats.network,
            Network {
                net_count: 18628,
                udp_count: 0,
                tcp_count: 18628,
                tcp_connect: 6,
            }
        );
        assert_eq!(
            stats.server_rpc,
            ServerRPC {
                rpc_count: 18628,
                bad_cnt: 0,
                bad_fmt: 0,
                bad_auth: 0,
                badc_int: 0,
            }
        );

        assert_eq!(stats.v2_stats.values, 18);
        assert_eq!(stats.v2_stats.null, 2);
        assert_eq!(stats.v2_stats.get_attr, 69);
        assert_eq!(stats.v2_stats.lookup, 4410);
        assert_eq!(stats.v2_stats.read_dir, 99);
        assert_eq!(stats.v2_stats.fs_stat, 2);
        assert!(stats.v2_stats.extra.is_empty());

        assert_eq!(stats.v3_stats.values, 22);
        assert_eq!(stats.v3_stats.get_attr, 112);
        assert_eq!(stats.v3_stats.lookup, 2719);
        assert_eq!(stats.v3_stats.access, 111);
        assert_eq!(stats.v3_stats.read_dir, 27);
        assert_eq!(stats.v3_stats.read_dir_plus, 216);
        assert_eq!(stats.v3_stats.fs_info, 2);
        assert_eq!(stats.v3_stats.path_conf, 1);
        assert_eq!(stats.v3_stats.commit, 0);

        assert_eq!(stats.v4_stats.values, 2);
        assert_eq!(stats.v4_stats.null, 2);
        assert_eq!(stats.v4_stats.compound, 10853);

        assert_eq!(stats.v4_ops.values, 72);
        assert_eq!(stats.v4_ops.access, 1098);
        assert_eq!(stats.v4_ops.close, 2);
        assert_eq!(stats.v4_ops.get_attr, 8179);
        assert_eq!(stats.v4_ops.get_fh, 5896);
        assert_eq!(stats.v4_ops.lookup, 5900);
        assert_eq!(stats.v4_ops.open, 2);
        assert_eq!(stats.v4_ops.open_confirm, 2);
        assert_eq!(stats.v4_ops.put_fh, 9609);
        assert_eq!(stats.v4_ops.put_root_fh, 2);
        assert_eq!(stats.v4_ops.read, 150);
        assert_eq!(stats.v4_ops.read_dir, 1272);
        assert_eq!(stats.v4_ops.renew, 1236);
        assert_eq!(stats.v4_ops.set_client_id, 3);
        assert_eq!(stats.v4_ops.set_client_id_confirm, 3);
        assert_eq!(stats.v4_ops.clone, 0);
        assert!(stats.v4_ops.extra.is_empty());
        assert_eq!(stats.v4_ops.counters().len(), 72);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = parse(GOOD_FILE).expect("failed to parse good file");
        let second = parse(GOOD_FILE).expect("failed to parse good file");
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_lines() {
        let stats = parse("rc 8352 2 0\n").expect("failed to parse rc");
        assert_eq!(
            stats.reply_cache,
            ReplyCache {
                hits: 8352,
                misses: 2,
                no_cache: 0,
            }
        );

        let stats = parse("ra 256 10 20 30 0 0 0 0 0 0 5 40").expect("failed to parse ra");
        assert_eq!(
            stats.read_ahead_cache,
            ReadAheadCache {
                cache_size: 256,
                cache_histogram: [10, 20, 30, 0, 0, 0, 0, 0, 0, 5],
                not_found: 40,
            }
        );

        let stats = parse("proc4ops 2 1 2").expect("failed to parse proc4ops");
        assert_eq!(stats.v4_ops.values, 2);
        assert_eq!(stats.v4_ops.op0_unused, 1);
        assert_eq!(stats.v4_ops.op1_unused, 2);
        assert_eq!(stats.v4_ops.counters(), vec![("Op0Unused", 1), ("Op1Unused", 2)]);

        let stats = parse("th 16 3").expect("failed to parse short th");
        assert_eq!(stats.threads.threads, 16);
        assert_eq!(stats.threads.full_cnt, 3);
        assert_eq!(stats.threads.usage_histogram, [0; THREAD_HISTOGRAM_BUCKETS]);

        let stats = parse("th 8 1 1.250 0.5 2 0.000 0.000 0.000 0.000 0.000 0.000 9.999")
            .expect("failed to parse th histogram");
        assert_eq!(
            stats.threads.usage_histogram,
            [1250, 500, 2000, 0, 0, 0, 0, 0, 0, 9999]
        );
    }

    #[test]
    fn test_future_operations_kept_by_position() {
        let counters: Vec<String> = (0..80).map(|i| i.to_string()).collect();
        let line = format!("proc4ops 80 {}", counters.join(" "));
        let stats = parse(&line).expect("failed to parse proc4ops");

        assert_eq!(stats.v4_ops.values, 80);
        assert_eq!(stats.v4_ops.access, 3);
        assert_eq!(stats.v4_ops.remove_xattr, 75);
        assert_eq!(stats.v4_ops.extra, vec![76, 77, 78, 79]);

        let named = stats.v4_ops.counters();
        assert_eq!(named.len(), 80);
        assert_eq!(named[75], ("RemoveXattr", 75));
        assert_eq!(named[79], (FUTURE_COUNTER, 79));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let stats = parse("\nrc 1 2 3\n   \n\nio 4 5\n").expect("failed to parse");
        assert_eq!(stats.reply_cache.hits, 1);
        assert_eq!(stats.input_output.write, 5);
    }

    #[test]
    fn test_whitespace_runs_and_crlf() {
        let stats = parse("io\t10   20\r\nnet 1 2  3 4\r\n").expect("failed to parse");
        assert_eq!(stats.input_output, InputOutput { read: 10, write: 20 });
        assert_eq!(stats.network.tcp_connect, 4);
    }

    #[test]
    fn test_empty_input() {
        let stats = parse("").expect("failed to parse empty input");
        assert_eq!(stats, ServerRPCStats::default());
    }

    #[test]
    fn test_last_occurrence_wins() {
        let stats = parse("io 1 2\nio 3 4\n").expect("failed to parse");
        assert_eq!(stats.input_output, InputOutput { read: 3, write: 4 });
    }

    #[test]
    fn test_invalid_lines() {
        let cases = vec![
            ("single token", "rc\n"),
            ("invalid", "invalid"),
            ("unknown key", "rc 1 2 3\nwdeleg_getattr 16\n"),
            ("rc too short", "rc 1 2\n"),
            ("rc too long", "rc 1 2 3 4\n"),
            ("fh too short", "fh 0 0 0 0\n"),
            ("io too long", "io 1 2 3\n"),
            ("th wrong count", "th 8 0 0.000\n"),
            ("ra too short", "ra 32 0 0 0 0 0 0 0 0 0 0\n"),
            ("net too short", "net 1 2 3\n"),
            ("rpc too long", "rpc 1 2 3 4 5 6\n"),
            ("proc2 undercount", "proc2 18 1 2 3\n"),
            ("proc3 overcount", "proc3 1 1 2\n"),
            ("proc4 bad values", "proc4 two 1 2\n"),
            ("proc4ops undercount", "proc4ops 2 1\n"),
            ("proc4ops overcount", "proc4ops 2 1 2 3\n"),
            ("non-digit", "rc 12a 2 0\n"),
            ("negative", "io -1 2\n"),
            ("overflow", "io 18446744073709551616 0\n"),
            ("bad histogram", "th 8 0 0.000 0.000 0.000 0.000 0.000 0.000 0.000 0.000 0.000 x\n"),
        ];

        for (name, input) in cases {
            assert!(parse(input).is_err(), "{}: expected error", name);
        }
    }

    #[test]
    fn test_malformed_line() {
        let err = parse("rc 1 2 3\nrc\n").unwrap_err();
        match err {
            Error::MalformedLine { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "rc");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_record_type() {
        let err = parse("bogus 1 2\n").unwrap_err();
        match err {
            Error::UnknownRecordType { line, key } => {
                assert_eq!(line, 1);
                assert_eq!(key, "bogus");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_arity_mismatch() {
        let cases = vec![
            ("rc 1 2\n", "rc", Arity::Exact(3), 2),
            ("fh 1 2 3 4 5 6\n", "fh", Arity::Exact(5), 6),
            ("ra 1 2 3\n", "ra", Arity::Exact(12), 3),
            ("th 1 2 3\n", "th", Arity::OneOf(THREADS_ARITY), 3),
            ("proc4ops 2 1\n", "proc4ops", Arity::Declared(2), 1),
            ("proc4ops 2 1 2 3\n", "proc4ops", Arity::Declared(2), 3),
            ("proc2 0 5\n", "proc2", Arity::Declared(0), 1),
        ];

        for (input, want_key, want_expected, want_actual) in cases {
            let err = parse(input).unwrap_err();
            assert!(err.is_arity_mismatch(), "{:?}: {:?}", input, err);
            match err {
                Error::Record {
                    line,
                    key,
                    source: DecodeError::ArityMismatch { expected, actual },
                } => {
                    assert_eq!(line, 1);
                    assert_eq!(key, want_key);
                    assert_eq!(expected, want_expected);
                    assert_eq!(actual, want_actual);
                }
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn test_invalid_number() {
        let cases = vec![
            ("rc 12a 2 0\n", "rc", "hits", 0, "12a", ParseError::InvalidDigit),
            ("io 1 +2\n", "io", "write", 1, "+2", ParseError::InvalidDigit),
            (
                "net 1 2 3 99999999999999999999\n",
                "net",
                "tcpconnect",
                3,
                "99999999999999999999",
                ParseError::Overflow,
            ),
            ("proc4 x 1 2\n", "proc4", "values", 0, "x", ParseError::InvalidDigit),
            ("proc4 2 1 y\n", "proc4", "Compound", 2, "y", ParseError::InvalidDigit),
            ("th 8 z\n", "th", "fullcnt", 1, "z", ParseError::InvalidDigit),
        ];

        for (input, want_key, want_field, want_index, want_token, want_reason) in cases {
            let err = parse(input).unwrap_err();
            assert!(err.is_invalid_number(), "{:?}: {:?}", input, err);
            match err {
                Error::Record {
                    key,
                    source:
                        DecodeError::InvalidNumber {
                            field,
                            index,
                            token,
                            reason,
                        },
                    ..
                } => {
                    assert_eq!(key, want_key);
                    assert_eq!(field, want_field);
                    assert_eq!(index, want_index);
                    assert_eq!(token, want_token);
                    assert_eq!(reason, want_reason);
                }
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn test_first_error_wins() {
        let err = parse("rc 1 2\nbogus 1\n").unwrap_err();
        assert_eq!(err.record_key(), Some("rc"));
    }

    #[test]
    fn test_stream_read_error() {
        // Invalid UTF-8 surfaces from the reader, not from a decoder.
        let err = parse_server_rpc_stats(&b"rc 1 2 3\n\xff\xfe\n"[..]).unwrap_err();
        assert!(matches!(err, Error::StreamRead(_)), "{:?}", err);
    }

    #[test]
    fn test_catalog_is_complete() {
        let mut keys: Vec<&str> = DECODERS.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["fh", "io", "net", "proc2", "proc3", "proc4", "proc4ops", "ra", "rc", "rpc", "th"]
        );
    }
}
