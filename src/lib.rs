// Copyright 2024 The Prometheus Authors
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

//! Parsing of the Linux NFS server statistics file, /proc/net/rpc/nfsd,
//! and a Prometheus collector built on it.
//!
//! ```no_run
//! let fs = nfsd_exporter::prometheus::FS::new_default_fs().expect("no procfs");
//! let stats = fs.server_rpc_stats().expect("couldn't parse nfsd stats");
//! println!("{} RPCs", stats.server_rpc.rpc_count);
//! ```

pub mod prometheus;
