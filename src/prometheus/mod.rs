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

pub mod collector;
pub mod internal_fs;
pub mod internal_util_parse;
pub mod metric;
pub mod nfs;
pub mod nfs_error;
pub mod nfs_parse;
pub mod nfsd_linux;
pub mod promslog_flag;
pub mod promslog_slog;
pub mod text_create;

pub use internal_fs::FS;
pub use nfs::ServerRPCStats;
pub use nfs_error::Error;
pub use nfs_parse::parse_server_rpc_stats;
