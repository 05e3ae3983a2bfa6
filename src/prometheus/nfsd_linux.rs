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

use std::io;
use std::path::Path;

use slog::{debug, Logger};

use super::collector::{Collector, CollectorError, NAMESPACE};
use super::internal_fs::FS;
use super::metric::{build_fq_name, Metric};
use super::nfs::{DeclaredRecord, ServerRPCStats, FUTURE_COUNTER};
use super::nfs_error::Error;

const SUBSYSTEM: &str = "nfsd";

const REQUESTS_HELP: &str = "Total number NFSd Requests by method and protocol.";
const PACKETS_HELP: &str = "Total NFSd network packets (sent+received) by protocol type.";
const UNEXPORTED_METHODS: &[&str] = &["Null", "Op0Unused", "Op1Unused", "Op2Future"];

const RPC_ERRORS_HELP: &str = "Total number of NFSd RPC errors by error type.";

/// Exposes NFS kernel server statistics from /proc/net/rpc/nfsd.
pub struct NfsdCollector {
    fs: FS,
    logger: Logger,
}

impl NfsdCollector {
    pub fn new<P: AsRef<Path>>(proc_path: P, logger: Logger) -> Result<Self, CollectorError> {
        let fs = FS::new(proc_path)?;
        Ok(NfsdCollector { fs, logger })
    }
}

impl Collector for NfsdCollector {
    fn name(&self) -> &'static str {
        "nfsd"
    }

    fn update(&self, out: &mut Vec<Metric>) -> Result<(), CollectorError> {
        let stats = match self.fs.server_rpc_stats() {
            Ok(stats) => stats,
            Err(Error::StreamRead(err)) if err.kind() == io::ErrorKind::NotFound => {
                return Err(CollectorError::NoData(format!(
                    "failed to retrieve nfsd stats: {}",
                    err
                )));
            }
            Err(err) => return Err(err.into()),
        };

        debug!(self.logger, "parsed nfsd stats";
            "rpc_count" => stats.server_rpc.rpc_count,
            "v4_ops" => stats.v4_ops.values);

        update_reply_cache_stats(out, &stats);
        update_file_handles_stats(out, &stats);
        update_input_output_stats(out, &stats);
        update_threads_stats(out, &stats);
        update_read_ahead_cache_stats(out, &stats);
        update_network_stats(out, &stats);
        update_server_rpc_stats(out, &stats);
        update_requests(out, "2", stats.v2_stats.counters());
        update_requests(out, "3", stats.v3_stats.counters());
        update_requests(out, "4", stats.v4_ops.counters());
        Ok(())
    }
}

fn name(metric: &str) -> String {
    build_fq_name(NAMESPACE, SUBSYSTEM, metric)
}

fn update_reply_cache_stats(out: &mut Vec<Metric>, s: &ServerRPCStats) {
    out.push(Metric::counter(
        name("reply_cache_hits_total"),
        "Total number of NFSd Reply Cache hits (client lost server response).",
        s.reply_cache.hits,
    ));
    out.push(Metric::counter(
        name("reply_cache_misses_total"),
        "Total number of NFSd Reply Cache an operation that requires caching (idempotent).",
        s.reply_cache.misses,
    ));
    out.push(Metric::counter(
        name("reply_cache_nocache_total"),
        "Total number of NFSd Reply Cache non-idempotent operations (rename/delete/...).",
        s.reply_cache.no_cache,
    ));
}

// Other FileHandles entries are unused in the kernel.
fn update_file_handles_stats(out: &mut Vec<Metric>, s: &ServerRPCStats) {
    out.push(Metric::counter(
        name("file_handles_stale_total"),
        "Total number of NFSd stale file handles",
        s.file_handles.stale,
    ));
}

fn update_input_output_stats(out: &mut Vec<Metric>, s: &ServerRPCStats) {
    out.push(Metric::counter(
        name("disk_bytes_read_total"),
        "Total NFSd bytes read.",
        s.input_output.read,
    ));
    out.push(Metric::counter(
        name("disk_bytes_written_total"),
        "Total NFSd bytes written.",
        s.input_output.write,
    ));
}

fn update_threads_stats(out: &mut Vec<Metric>, s: &ServerRPCStats) {
    out.push(Metric::gauge(
        name("server_threads"),
        "Total number of NFSd kernel threads that are running.",
        s.threads.threads as f64,
    ));
}

fn update_read_ahead_cache_stats(out: &mut Vec<Metric>, s: &ServerRPCStats) {
    out.push(Metric::gauge(
        name("read_ahead_cache_size_blocks"),
        "How large the read ahead cache is in blocks.",
        s.read_ahead_cache.cache_size as f64,
    ));
    out.push(Metric::counter(
        name("read_ahead_cache_not_found_total"),
        "Total number of NFSd read ahead cache not found.",
        s.read_ahead_cache.not_found,
    ));
}

fn update_network_stats(out: &mut Vec<Metric>, s: &ServerRPCStats) {
    for (proto, value) in [("udp", s.network.udp_count), ("tcp", s.network.tcp_count)] {
        out.push(Metric::counter(name("packets_total"), PACKETS_HELP, value).with_label("proto", proto));
    }
    out.push(Metric::counter(
        name("connections_total"),
        "Total number of NFSd TCP connections.",
        s.network.tcp_connect,
    ));
}

fn update_server_rpc_stats(out: &mut Vec<Metric>, s: &ServerRPCStats) {
    let errors = [
        ("fmt", s.server_rpc.bad_fmt),
        ("auth", s.server_rpc.bad_auth),
        ("cInt", s.server_rpc.badc_int),
    ];
    for (kind, value) in errors {
        out.push(Metric::counter(name("rpc_errors_total"), RPC_ERRORS_HELP, value).with_label("error", kind));
    }
    out.push(Metric::counter(
        name("server_rpcs_total"),
        "Total number of NFSd RPCs.",
        s.server_rpc.rpc_count,
    ));
}

// Null calls, reserved operation slots and unnamed future operations are
// not exported.
fn update_requests(out: &mut Vec<Metric>, proto: &'static str, counters: Vec<(&'static str, u64)>) {
    for (method, value) in counters {
        if method == FUTURE_COUNTER || UNEXPORTED_METHODS.contains(&method) {
            continue;
        }
        out.push(
            Metric::counter(name("requests_total"), REQUESTS_HELP, value)
                .with_label("proto", proto)
                .with_label("method", method),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prometheus::promslog_slog::new_nop_logger;
    use std::fs;

    const PROCFS_FIXTURES: &str = "testdata/fixtures/proc";

    fn find<'a>(metrics: &'a [Metric], name: &str, labels: &[(&str, &str)]) -> Option<&'a Metric> {
        metrics.iter().find(|m| {
            m.name == name
                && labels
                    .iter()
                    .all(|(k, v)| m.labels.iter().any(|(lk, lv)| lk == k && lv == v))
        })
    }

    fn value(metrics: &[Metric], name: &str, labels: &[(&str, &str)]) -> f64 {
        find(metrics, name, labels)
            .unwrap_or_else(|| panic!("missing metric {} {:?}", name, labels))
            .value
    }

    #[test]
    fn test_nfsd_collector_fixture() {
        let collector = NfsdCollector::new(PROCFS_FIXTURES, new_nop_logger())
            .expect("failed to access procfs fixtures");
        let mut out = Vec::new();
        collector.update(&mut out).expect("failed to update nfsd collector");

        assert_eq!(value(&out, "node_nfsd_reply_cache_nocache_total", &[]), 18622.0);
        assert_eq!(value(&out, "node_nfsd_disk_bytes_read_total", &[]), 157286400.0);
        assert_eq!(value(&out, "node_nfsd_server_threads", &[]), 8.0);
        assert_eq!(value(&out, "node_nfsd_read_ahead_cache_size_blocks", &[]), 32.0);
        assert_eq!(value(&out, "node_nfsd_packets_total", &[("proto", "tcp")]), 18628.0);
        assert_eq!(value(&out, "node_nfsd_connections_total", &[]), 6.0);
        assert_eq!(value(&out, "node_nfsd_server_rpcs_total", &[]), 18628.0);
        assert_eq!(
            value(&out, "node_nfsd_requests_total", &[("proto", "2"), ("method", "Lookup")]),
            4410.0
        );
        assert_eq!(
            value(&out, "node_nfsd_requests_total", &[("proto", "3"), ("method", "ReadDirPlus")]),
            216.0
        );
        assert_eq!(
            value(&out, "node_nfsd_requests_total", &[("proto", "4"), ("method", "PutFH")]),
            9609.0
        );
        assert_eq!(
            value(&out, "node_nfsd_requests_total", &[("proto", "4"), ("method", "Open")]),
            2.0
        );
        assert!(find(&out, "node_nfsd_requests_total", &[("method", "Null")]).is_none());
        assert!(find(&out, "node_nfsd_requests_total", &[("method", "Op0Unused")]).is_none());
    }

    #[test]
    fn test_nfsd_collector_missing_file_is_no_data() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let collector =
            NfsdCollector::new(dir.path(), new_nop_logger()).expect("failed to access fs");
        let mut out = Vec::new();
        let err = collector.update(&mut out).unwrap_err();
        assert!(err.is_no_data(), "{:?}", err);
        assert!(out.is_empty());
    }

    #[test]
    fn test_nfsd_collector_malformed_file_fails() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let rpc = dir.path().join("net").join("rpc");
        fs::create_dir_all(&rpc).expect("failed to create dirs");
        fs::write(rpc.join("nfsd"), "rc 1 2 3\nio 1\n").expect("failed to write stats");

        let collector =
            NfsdCollector::new(dir.path(), new_nop_logger()).expect("failed to access fs");
        let mut out = Vec::new();
        let err = collector.update(&mut out).unwrap_err();
        assert!(matches!(err, CollectorError::Nfs(ref e) if e.is_arity_mismatch()), "{:?}", err);
        assert!(out.is_empty());
    }
}
