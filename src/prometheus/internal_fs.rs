// Copyright 2019 The Prometheus Authors
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

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_PROC_MOUNT_POINT: &str = "/proc";

#[derive(Debug, Error)]
pub enum FsError {
    #[error("could not read mount point {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("mount point {0} is not a directory")]
    NotADirectory(PathBuf),
}

/// A procfs mount point. Paths handed out by `path` are relative to it.
#[derive(Debug, Clone)]
pub struct FS {
    mount_point: PathBuf,
}

impl FS {
    pub fn new_default_fs() -> Result<FS, FsError> {
        FS::new(DEFAULT_PROC_MOUNT_POINT)
    }

    /// Returns a handle rooted at `mount_point`, which must be an existing
    /// directory. An empty mount point falls back to `/proc`.
    pub fn new<P: AsRef<Path>>(mount_point: P) -> Result<FS, FsError> {
        let path = mount_point.as_ref();
        let path = if path.as_os_str().is_empty() {
            Path::new(DEFAULT_PROC_MOUNT_POINT)
        } else {
            path
        };

        let metadata = fs::metadata(path).map_err(|source| FsError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(FsError::NotADirectory(path.to_path_buf()));
        }

        Ok(FS {
            mount_point: path.to_path_buf(),
        })
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    pub fn path(&self, p: &[&str]) -> PathBuf {
        let mut full_path = self.mount_point.clone();
        for part in p {
            full_path.push(part);
        }
        full_path
    }
}
