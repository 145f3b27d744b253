// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

pub mod fd;

use std::path::{Path, PathBuf};

use crate::netns::NamespaceKind;

/// Handle on the introspection mount. Passed explicitly so that tests
/// and containerized agents can point it at a fake or host-mounted
/// proc tree.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl ProcFs {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        ProcFs { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pid_path(&self, pid: i32) -> PathBuf {
        self.root.join(pid.to_string())
    }

    pub fn ns_path(&self, pid: i32, kind: NamespaceKind) -> PathBuf {
        self.pid_path(pid).join("ns").join(kind.as_str())
    }

    pub fn fd_path(&self, pid: i32) -> PathBuf {
        self.pid_path(pid).join("fd")
    }
}

impl From<&crate::config::DiscoveryConfig> for ProcFs {
    fn from(config: &crate::config::DiscoveryConfig) -> Self {
        ProcFs::new(&config.proc_root)
    }
}
