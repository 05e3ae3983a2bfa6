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

//! Package nfs implements parsing of /proc/net/rpc/nfsd.
//! Fields are documented in https://www.svennd.be/nfsd-stats-explained-procnetrpcnfsd/

use std::fs::File;
use std::io::BufReader;

use super::internal_fs::FS;
use super::nfs_error::Error;
use super::nfs_parse::parse_server_rpc_stats;

/// Number of buckets on the "ra" line.
pub const READ_AHEAD_BUCKETS: usize = 10;

/// Number of usage-histogram buckets that may trail the "th" line.
pub const THREAD_HISTOGRAM_BUCKETS: usize = 10;

/// Name given to declared counters beyond a record's name table.
pub const FUTURE_COUNTER: &str = "future";

/// A record whose value tokens map one-to-one onto named fields.
pub trait FixedRecord: Sized {
    const FIELDS: &'static [&'static str];

    /// Builds the record from exactly `FIELDS.len()` values.
    fn from_values(v: &[u64]) -> Self;
}

/// A record whose first value declares how many counters follow.
pub trait DeclaredRecord: Sized {
    /// Counter names by position.
    const NAMES: &'static [&'static str];

    fn from_counters(values: u64, counters: &[u64]) -> Self;

    /// The `values` counters present on the line, in order, named from
    /// `NAMES` and then `FUTURE_COUNTER`.
    fn counters(&self) -> Vec<(&'static str, u64)>;
}

// rc line: Reply Cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyCache {
    pub hits: u64,
    pub misses: u64,
    pub no_cache: u64,
}

impl FixedRecord for ReplyCache {
    const FIELDS: &'static [&'static str] = &["hits", "misses", "nocache"];

    fn from_values(v: &[u64]) -> Self {
        ReplyCache {
            hits: v[0],
            misses: v[1],
            no_cache: v[2],
        }
    }
}

// fh line: File Handles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHandles {
    pub stale: u64,
    pub total_lookups: u64,
    pub anon_lookups: u64,
    pub dir_no_cache: u64,
    pub no_dir_no_cache: u64,
}

impl FixedRecord for FileHandles {
    const FIELDS: &'static [&'static str] = &[
        "stale",
        "totallookups",
        "anonlookups",
        "dirnocache",
        "nodirnocache",
    ];

    fn from_values(v: &[u64]) -> Self {
        FileHandles {
            stale: v[0],
            total_lookups: v[1],
            anon_lookups: v[2],
            dir_no_cache: v[3],
            no_dir_no_cache: v[4],
        }
    }
}

// io line: Input Output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputOutput {
    pub read: u64,
    pub write: u64,
}

impl FixedRecord for InputOutput {
    const FIELDS: &'static [&'static str] = &["read", "write"];

    fn from_values(v: &[u64]) -> Self {
        InputOutput {
            read: v[0],
            write: v[1],
        }
    }
}

// th line: Threads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Threads {
    pub threads: u64,
    pub full_cnt: u64,
    /// Thread usage histogram as printed by the kernel, in thousandths.
    /// Bucket semantics are not documented; zero when the line omits it.
    pub usage_histogram: [u64; THREAD_HISTOGRAM_BUCKETS],
}

impl Threads {
    pub const FIELDS: &'static [&'static str] = &["threads", "fullcnt"];
}

// ra line: Read Ahead Cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadAheadCache {
    pub cache_size: u64,
    pub cache_histogram: [u64; READ_AHEAD_BUCKETS],
    pub not_found: u64,
}

impl FixedRecord for ReadAheadCache {
    const FIELDS: &'static [&'static str] = &[
        "cachesize",
        "histogram[0]",
        "histogram[1]",
        "histogram[2]",
        "histogram[3]",
        "histogram[4]",
        "histogram[5]",
        "histogram[6]",
        "histogram[7]",
        "histogram[8]",
        "histogram[9]",
        "notfound",
    ];

    fn from_values(v: &[u64]) -> Self {
        let mut cache_histogram = [0; READ_AHEAD_BUCKETS];
        cache_histogram.copy_from_slice(&v[1..=READ_AHEAD_BUCKETS]);
        ReadAheadCache {
            cache_size: v[0],
            cache_histogram,
            not_found: v[READ_AHEAD_BUCKETS + 1],
        }
    }
}

// net line: Network
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Network {
    pub net_count: u64,
    pub udp_count: u64,
    pub tcp_count: u64,
    pub tcp_connect: u64,
}

impl FixedRecord for Network {
    const FIELDS: &'static [&'static str] = &["netcount", "udpcount", "tcpcount", "tcpconnect"];

    fn from_values(v: &[u64]) -> Self {
        Network {
            net_count: v[0],
            udp_count: v[1],
            tcp_count: v[2],
            tcp_connect: v[3],
        }
    }
}

// rpc line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerRPC {
    pub rpc_count: u64,
    pub bad_cnt: u64,
    pub bad_fmt: u64,
    pub bad_auth: u64,
    pub badc_int: u64,
}

impl FixedRecord for ServerRPC {
    const FIELDS: &'static [&'static str] = &["rpccount", "badcnt", "badfmt", "badauth", "badcint"];

    fn from_values(v: &[u64]) -> Self {
        ServerRPC {
            rpc_count: v[0],
            bad_cnt: v[1],
            bad_fmt: v[2],
            bad_auth: v[3],
            badc_int: v[4],
        }
    }
}

/// Declares a record with a leading count, one field per name-table entry
/// and an `extra` tail for counters the table does not know yet.
macro_rules! declared_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident, names = $table:ident {
            $( $field:ident => $label:literal, )*
        }
    ) => {
        pub const $table: &[&str] = &[ $( $label, )* ];

        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            /// Number of counters the kernel declared on the line.
            pub values: u64,
            $( pub $field: u64, )*
            /// Counters past the end of the name table, in order.
            pub extra: Vec<u64>,
        }

        impl DeclaredRecord for $name {
            const NAMES: &'static [&'static str] = $table;

            fn from_counters(values: u64, counters: &[u64]) -> Self {
                let mut record = $name {
                    values,
                    ..Default::default()
                };
                let mut it = counters.iter().copied();
                $(
                    match it.next() {
                        Some(v) => record.$field = v,
                        None => return record,
                    }
                )*
                record.extra = it.collect();
                record
            }

            fn counters(&self) -> Vec<(&'static str, u64)> {
                let present = usize::try_from(self.values).unwrap_or(usize::MAX);
                let named = [ $( self.$field, )* ];
                Self::NAMES
                    .iter()
                    .copied()
                    .zip(named)
                    .chain(self.extra.iter().map(|&v| (FUTURE_COUNTER, v)))
                    .take(present)
                    .collect()
            }
        }
    };
}

declared_record! {
    // proc2 line: NFSv2 Stats
    pub struct V2Stats, names = V2_PROCEDURES {
        null => "Null",
        get_attr => "GetAttr",
        set_attr => "SetAttr",
        root => "Root",
        lookup => "Lookup",
        read_link => "ReadLink",
        read => "Read",
        wr_cache => "WrCache",
        write => "Write",
        create => "Create",
        remove => "Remove",
        rename => "Rename",
        link => "Link",
        sym_link => "SymLink",
        mk_dir => "MkDir",
        rm_dir => "RmDir",
        read_dir => "ReadDir",
        fs_stat => "FsStat",
    }
}

declared_record! {
    // proc3 line: NFSv3 Stats
    pub struct V3Stats, names = V3_PROCEDURES {
        null => "Null",
        get_attr => "GetAttr",
        set_attr => "SetAttr",
        lookup => "Lookup",
        access => "Access",
        read_link => "ReadLink",
        read => "Read",
        write => "Write",
        create => "Create",
        mk_dir => "MkDir",
        sym_link => "SymLink",
        mk_nod => "MkNod",
        remove => "Remove",
        rm_dir => "RmDir",
        rename => "Rename",
        link => "Link",
        read_dir => "ReadDir",
        read_dir_plus => "ReadDirPlus",
        fs_stat => "FsStat",
        fs_info => "FsInfo",
        path_conf => "PathConf",
        commit => "Commit",
    }
}

declared_record! {
    // proc4 line: NFSv4 Stats
    pub struct V4Stats, names = V4_PROCEDURES {
        null => "Null",
        compound => "Compound",
    }
}

declared_record! {
    // proc4ops line: NFSv4 operations, indexed by operation number.
    // v4.0 https://tools.ietf.org/html/rfc7530
    // v4.1 https://tools.ietf.org/html/rfc5661
    // v4.2 https://tools.ietf.org/html/rfc7862
    // xattr https://tools.ietf.org/html/rfc8276
    pub struct V4Ops, names = V4_OPERATIONS {
        op0_unused => "Op0Unused",
        op1_unused => "Op1Unused",
        op2_future => "Op2Future",
        access => "Access",
        close => "Close",
        commit => "Commit",
        create => "Create",
        deleg_purge => "DelegPurge",
        deleg_return => "DelegReturn",
        get_attr => "GetAttr",
        get_fh => "GetFH",
        link => "Link",
        lock => "Lock",
        lockt => "Lockt",
        locku => "Locku",
        lookup => "Lookup",
        lookup_root => "LookupRoot",
        nverify => "Nverify",
        open => "Open",
        open_attr => "OpenAttr",
        open_confirm => "OpenConfirm",
        open_dgrd => "OpenDgrd",
        put_fh => "PutFH",
        put_pub_fh => "PutPubFH",
        put_root_fh => "PutRootFH",
        read => "Read",
        read_dir => "ReadDir",
        read_link => "ReadLink",
        remove => "Remove",
        rename => "Rename",
        renew => "Renew",
        restore_fh => "RestoreFH",
        save_fh => "SaveFH",
        sec_info => "SecInfo",
        set_attr => "SetAttr",
        set_client_id => "SetClientID",
        set_client_id_confirm => "SetClientIDConfirm",
        verify => "Verify",
        write => "Write",
        rel_lock_owner => "RelLockOwner",
        backchannel_ctl => "BackchannelCtl",
        bind_conn_to_session => "BindConnToSession",
        exchange_id => "ExchangeID",
        create_session => "CreateSession",
        destroy_session => "DestroySession",
        free_state_id => "FreeStateID",
        get_dir_deleg => "GetDirDeleg",
        get_device_info => "GetDeviceInfo",
        get_device_list => "GetDeviceList",
        layout_commit => "LayoutCommit",
        layout_get => "LayoutGet",
        layout_return => "LayoutReturn",
        sec_info_no_name => "SecInfoNoName",
        sequence => "Sequence",
        set_ssv => "SetSSV",
        test_state_id => "TestStateID",
        want_deleg => "WantDeleg",
        destroy_client_id => "DestroyClientID",
        reclaim_complete => "ReclaimComplete",
        allocate => "Allocate",
        copy => "Copy",
        copy_notify => "CopyNotify",
        deallocate => "Deallocate",
        io_advise => "IOAdvise",
        layout_error => "LayoutError",
        layout_stats => "LayoutStats",
        offload_cancel => "OffloadCancel",
        offload_status => "OffloadStatus",
        read_plus => "ReadPlus",
        seek => "Seek",
        write_same => "WriteSame",
        clone => "Clone",
        get_xattr => "GetXattr",
        set_xattr => "SetXattr",
        list_xattrs => "ListXattrs",
        remove_xattr => "RemoveXattr",
    }
}

/// One decoded line of the stats file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatRecord {
    ReplyCache(ReplyCache),
    FileHandles(FileHandles),
    InputOutput(InputOutput),
    Threads(Threads),
    ReadAheadCache(ReadAheadCache),
    Network(Network),
    ServerRPC(ServerRPC),
    V2Stats(V2Stats),
    V3Stats(V3Stats),
    V4Stats(V4Stats),
    V4Ops(V4Ops),
}

macro_rules! impl_from_record {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for StatRecord {
                fn from(r: $variant) -> Self {
                    StatRecord::$variant(r)
                }
            }
        )*
    };
}

impl_from_record!(
    ReplyCache,
    FileHandles,
    InputOutput,
    Threads,
    ReadAheadCache,
    Network,
    ServerRPC,
    V2Stats,
    V3Stats,
    V4Stats,
    V4Ops,
);

/// All stats from /proc/net/rpc/nfsd.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerRPCStats {
    pub reply_cache: ReplyCache,
    pub file_handles: FileHandles,
    pub input_output: InputOutput,
    pub threads: Threads,
    pub read_ahead_cache: ReadAheadCache,
    pub network: Network,
    pub server_rpc: ServerRPC,
    pub v2_stats: V2Stats,
    pub v3_stats: V3Stats,
    pub v4_stats: V4Stats,
    pub v4_ops: V4Ops,
}

impl ServerRPCStats {
    /// Stores a decoded record, replacing any earlier record of its kind.
    pub fn store(&mut self, record: StatRecord) {
        match record {
            StatRecord::ReplyCache(r) => self.reply_cache = r,
            StatRecord::FileHandles(r) => self.file_handles = r,
            StatRecord::InputOutput(r) => self.input_output = r,
            StatRecord::Threads(r) => self.threads = r,
            StatRecord::ReadAheadCache(r) => self.read_ahead_cache = r,
            StatRecord::Network(r) => self.network = r,
            StatRecord::ServerRPC(r) => self.server_rpc = r,
            StatRecord::V2Stats(r) => self.v2_stats = r,
            StatRecord::V3Stats(r) => self.v3_stats = r,
            StatRecord::V4Stats(r) => self.v4_stats = r,
            StatRecord::V4Ops(r) => self.v4_ops = r,
        }
    }
}

impl FS {
    /// Reads and parses `net/rpc/nfsd` under the mount point.
    pub fn server_rpc_stats(&self) -> Result<ServerRPCStats, Error> {
        let file = File::open(self.path(&["net", "rpc", "nfsd"]))?;
        parse_server_rpc_stats(BufReader::new(file))
    }
}
