// Copyright 2014 The Prometheus Authors
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

//! Prometheus text exposition format (version 0.0.4).

use std::io::{self, Write};

use super::metric::Metric;

pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Writes `metrics` grouped into families. Families keep the order in
/// which their first sample appears; HELP and TYPE are taken from it.
pub fn write_text<W: Write>(out: &mut W, metrics: &[Metric]) -> io::Result<()> {
    let mut families: Vec<(&str, Vec<&Metric>)> = Vec::new();
    for metric in metrics {
        match families.iter_mut().find(|(name, _)| *name == metric.name) {
            Some((_, samples)) => samples.push(metric),
            None => families.push((metric.name.as_str(), vec![metric])),
        }
    }

    for (name, samples) in families {
        let first = samples[0];
        writeln!(out, "# HELP {} {}", name, escape_string(first.help, false))?;
        writeln!(out, "# TYPE {} {}", name, first.value_type)?;
        for sample in samples {
            write_sample(out, sample)?;
        }
    }
    Ok(())
}

fn write_sample<W: Write>(out: &mut W, metric: &Metric) -> io::Result<()> {
    write!(out, "{}", metric.name)?;
    if !metric.labels.is_empty() {
        let labels: Vec<String> = metric
            .labels
            .iter()
            .map(|(name, value)| format!("{}=\"{}\"", name, escape_string(value, true)))
            .collect();
        write!(out, "{{{}}}", labels.join(","))?;
    }
    writeln!(out, " {}", format_float(metric.value))
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "+Inf".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        f.to_string()
    }
}

// Label values also escape double quotes; HELP text does not.
fn escape_string(s: &str, include_double_quote: bool) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '"' if include_double_quote => escaped.push_str("\\\""),
            _ => escaped.push(c),
        }
    }
    escaped
}
