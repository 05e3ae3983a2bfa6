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

use std::fmt;

/// Kind of a constant sample, as written on the `# TYPE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Counter,
    Gauge,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Counter => write!(f, "counter"),
            ValueType::Gauge => write!(f, "gauge"),
        }
    }
}

/// A single sample produced by a collector during one scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: String,
    pub help: &'static str,
    pub value_type: ValueType,
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
}

impl Metric {
    pub fn new(name: String, help: &'static str, value_type: ValueType, value: f64) -> Self {
        Metric {
            name,
            help,
            value_type,
            labels: Vec::new(),
            value,
        }
    }

    pub fn counter(name: String, help: &'static str, value: u64) -> Self {
        Metric::new(name, help, ValueType::Counter, value as f64)
    }

    pub fn gauge(name: String, help: &'static str, value: f64) -> Self {
        Metric::new(name, help, ValueType::Gauge, value)
    }

    pub fn with_label(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.labels.push((name, value.into()));
        self
    }
}

pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let mut fq_name = String::new();
    if !namespace.is_empty() {
        fq_name.push_str(namespace);
        fq_name.push('_');
    }
    if !subsystem.is_empty() {
        fq_name.push_str(subsystem);
        fq_name.push('_');
    }
    fq_name.push_str(name);
    fq_name
}
