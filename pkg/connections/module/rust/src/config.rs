// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

fn default_max_concurrent_execs() -> usize {
    8
}

fn default_exec_timeout_secs() -> u64 {
    10
}

/// Settings for one discovery pass. There is no process-wide state:
/// callers build a config and hand it to the entry points.
#[derive(Deserialize, Debug, Clone)]
pub struct DiscoveryConfig {
    /// Root of the introspection mount, usually /proc or the host proc
    /// mount when running containerized.
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,

    /// Upper bound on in-flight container execs across workloads.
    #[serde(default = "default_max_concurrent_execs")]
    pub max_concurrent_execs: usize,

    /// Timeout applied to each individual exec call.
    #[serde(default = "default_exec_timeout_secs")]
    pub exec_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            proc_root: default_proc_root(),
            max_concurrent_execs: default_max_concurrent_execs(),
            exec_timeout_secs: default_exec_timeout_secs(),
        }
    }
}

impl DiscoveryConfig {
    /// Defaults with the proc root taken from HOST_PROC when set, for
    /// agents that mount the host's proc at a non-standard location.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(root) = std::env::var("HOST_PROC") {
            config.proc_root = root.into();
        }
        config
    }

    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_timeout_secs)
    }
}
