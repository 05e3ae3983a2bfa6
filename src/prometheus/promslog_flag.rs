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

//! Package promslog_flag defines the log flags shared by the exporter binary.

use std::fmt;

use clap::{Args, ValueEnum};

// LevelFlagHelp is the help description for the log.level flag.
const LEVEL_FLAG_HELP: &str = "Only log messages with the given severity or above.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AllowedLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<AllowedLevel> for slog::Level {
    fn from(level: AllowedLevel) -> Self {
        match level {
            AllowedLevel::Debug => slog::Level::Debug,
            AllowedLevel::Info => slog::Level::Info,
            AllowedLevel::Warn => slog::Level::Warning,
            AllowedLevel::Error => slog::Level::Error,
        }
    }
}

impl fmt::Display for AllowedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AllowedLevel::Debug => "debug",
            AllowedLevel::Info => "info",
            AllowedLevel::Warn => "warn",
            AllowedLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Args)]
pub struct LogFlags {
    #[arg(long = "log.level", value_enum, default_value_t = AllowedLevel::Info, help = LEVEL_FLAG_HELP)]
    pub level: AllowedLevel,
}
