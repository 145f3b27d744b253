// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Open socket enumeration from /proc/<pid>/fd. Each fd entry is a
//! symbolic link; sockets link to `socket:[<inode>]`. The inodes are
//! kept on the process record for fd-to-socket correlation.

use std::fs::{read_dir, read_link};
use std::path::Path;

use crate::netns::Ino;
use crate::procfs::ProcFs;

/// List the socket inodes held open by a process. Non-socket fds are
/// ignored; unreadable individual links are skipped since fds come and
/// go while we scan.
pub fn socket_inodes(procfs: &ProcFs, pid: i32) -> Result<Vec<Ino>, std::io::Error> {
    let mut inodes = Vec::new();

    for entry in read_dir(procfs.fd_path(pid))? {
        let Ok(entry) = entry else {
            continue;
        };
        let Ok(link) = read_link(entry.path()) else {
            continue;
        };
        if let Some(inode) = socket_inode(&link) {
            inodes.push(inode);
        }
    }

    Ok(inodes)
}

fn socket_inode(link: &Path) -> Option<Ino> {
    const SOCKET_PREFIX: &str = "socket:[";

    let link_str = link.to_str()?;
    let link_str = link_str.strip_prefix(SOCKET_PREFIX)?;

    link_str.strip_suffix(']')?.parse().ok()
}
