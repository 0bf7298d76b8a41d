use crate::reproject::WEB_MERCATOR;
use std::path::{Path, PathBuf};

pub const DEFAULT_TARGET_SRID: i32 = WEB_MERCATOR;
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 4;

/// Settings for opening a [`GpkgProvider`](crate::GpkgProvider) on a file.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderConfig {
    pub path: PathBuf,
    /// SRS every materialized feature is expressed in.
    pub target_srid: i32,
    /// Upper bound on pooled read-only connections kept between calls.
    pub max_idle_connections: usize,
}

impl ProviderConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            target_srid: DEFAULT_TARGET_SRID,
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
        }
    }

    pub fn with_target_srid(mut self, target_srid: i32) -> Self {
        self.target_srid = target_srid;
        self
    }

    pub fn with_max_idle_connections(mut self, max_idle_connections: usize) -> Self {
        self.max_idle_connections = max_idle_connections;
        self
    }
}
