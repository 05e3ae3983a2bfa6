// Copyright 2015 The Prometheus Authors
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

use std::time::Instant;

use slog::{debug, error, Logger};
use thiserror::Error;

use super::internal_fs::FsError;
use super::metric::{build_fq_name, Metric};
use super::nfs_error;

pub const NAMESPACE: &str = "node";

#[derive(Debug, Error)]
pub enum CollectorError {
    /// The source the collector reads is absent on this host.
    #[error("no data: {0}")]
    NoData(String),
    #[error(transparent)]
    Nfs(#[from] nfs_error::Error),
    #[error(transparent)]
    Fs(#[from] FsError),
}

impl CollectorError {
    pub fn is_no_data(&self) -> bool {
        matches!(self, CollectorError::NoData(_))
    }
}

pub trait Collector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Appends this scrape's samples to `out`.
    fn update(&self, out: &mut Vec<Metric>) -> Result<(), CollectorError>;
}

/// Samples from one pass over a set of collectors.
#[derive(Debug, Default)]
pub struct Scrape {
    pub metrics: Vec<Metric>,
    pub failures: usize,
}

/// Runs every collector in turn.
pub fn gather(collectors: &[Box<dyn Collector>], logger: &Logger) -> Scrape {
    let mut scrape = Scrape::default();
    for collector in collectors {
        if !execute(collector.as_ref(), &mut scrape.metrics, logger) {
            scrape.failures += 1;
        }
    }
    scrape
}

/// Runs one collector and appends its samples followed by the scrape
/// duration and success samples. A failed collector contributes nothing
/// but those two. Returns whether the collector succeeded.
pub fn execute(collector: &dyn Collector, out: &mut Vec<Metric>, logger: &Logger) -> bool {
    let name = collector.name();
    let start = Instant::now();
    let mut samples = Vec::new();
    let result = collector.update(&mut samples);
    let duration = start.elapsed().as_secs_f64();

    let success = match result {
        Ok(()) => {
            debug!(logger, "collector succeeded"; "name" => name, "duration_seconds" => duration);
            out.append(&mut samples);
            true
        }
        Err(err) if err.is_no_data() => {
            debug!(logger, "collector returned no data"; "name" => name, "duration_seconds" => duration, "err" => %err);
            false
        }
        Err(err) => {
            error!(logger, "collector failed"; "name" => name, "duration_seconds" => duration, "err" => %err);
            false
        }
    };

    out.push(
        Metric::gauge(
            build_fq_name(NAMESPACE, "scrape", "collector_duration_seconds"),
            "nfsd_exporter: Duration of a collector scrape.",
            duration,
        )
        .with_label("collector", name),
    );
    out.push(
        Metric::gauge(
            build_fq_name(NAMESPACE, "scrape", "collector_success"),
            "nfsd_exporter: Whether a collector succeeded.",
            if success { 1.0 } else { 0.0 },
        )
        .with_label("collector", name),
    );
    success
}
