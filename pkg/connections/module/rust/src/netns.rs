// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use std::fmt;
use std::fs;

use crate::errors::Error;
use crate::procfs::ProcFs;

/// Kernel namespace identifier, stable for the namespace's lifetime.
/// Zero is a valid ID, never an error sentinel.
pub type Ino = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceKind {
    Pid,
    Net,
}

impl NamespaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamespaceKind::Pid => "pid",
            NamespaceKind::Net => "net",
        }
    }
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the namespace ID of a process by reading the symbolic
/// target of /proc/<pid>/ns/<kind>, which has the form
/// `<kind>:[<digits>]`. Fails if the process is gone or the link is
/// malformed; callers decide whether that is fatal.
pub fn resolve_namespace_id(procfs: &ProcFs, pid: i32, kind: NamespaceKind) -> Result<Ino, Error> {
    let path = procfs.ns_path(pid, kind);
    let target = fs::read_link(&path).map_err(|err| Error::NamespaceUnavailable {
        pid,
        kind,
        context: err.to_string(),
    })?;

    let Some(target) = target.to_str() else {
        return Err(Error::NamespaceUnavailable {
            pid,
            kind,
            context: "namespace link target is not valid UTF-8".to_string(),
        });
    };

    parse_namespace_link(target, kind).ok_or_else(|| Error::NamespaceUnavailable {
        pid,
        kind,
        context: format!("unexpected namespace link target: {target}"),
    })
}

fn parse_namespace_link(target: &str, kind: NamespaceKind) -> Option<Ino> {
    target
        .strip_prefix(kind.as_str())?
        .strip_prefix(":[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}
