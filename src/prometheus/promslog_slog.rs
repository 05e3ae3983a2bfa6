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

//! Package promslog builds the slog loggers used across the exporter.
//! It should typically only ever be imported by main packages.

use slog::{o, Drain, Logger};

use super::promslog_flag::AllowedLevel;

/// Returns a logger writing compact records to stderr through an async
/// drain, discarding records below `level`.
pub fn new_logger(level: AllowedLevel) -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog::LevelFilter::new(drain, level.into()).fuse();
    Logger::root(drain, o!("app" => "nfsd_exporter"))
}

pub fn new_nop_logger() -> Logger {
    Logger::root(slog::Discard, o!())
}
