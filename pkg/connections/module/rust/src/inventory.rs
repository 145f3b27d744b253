// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use std::collections::HashMap;
use std::fs;

use log::trace;

use crate::errors::Error;
use crate::netns::{Ino, NamespaceKind, resolve_namespace_id};
use crate::procfs::{self, ProcFs};
use crate::socket_table::ConnectionDescriptor;

// Directory entries are consumed in fixed-size batches so the scan
// stays bounded regardless of how many processes the host runs.
const ENUM_BATCH_SIZE: usize = 64;

/// One process as seen in the introspection mount, with its namespace
/// identities resolved. Request-scoped; built once per enumeration
/// pass and never mutated afterwards.
#[derive(Debug)]
pub struct ProcessRecord {
    pub pid: i32,
    pub pid_namespace_id: Ino,
    pub net_namespace_id: Ino,
    /// Inodes of the sockets the process holds open, for fd-to-socket
    /// correlation. Best effort: empty when fd/ is unreadable.
    pub sockets: Vec<Ino>,
    pub connections: Vec<ConnectionDescriptor>,
}

/// Processes grouped by shared network namespace. Processes in the
/// same group see the same socket tables, so one member is enough to
/// introspect the whole group.
#[derive(Debug, Default)]
pub struct NamespaceGroups {
    groups: HashMap<Ino, Vec<ProcessRecord>>,
}

impl NamespaceGroups {
    fn insert(&mut self, record: ProcessRecord) {
        self.groups
            .entry(record.net_namespace_id)
            .or_default()
            .push(record);
    }

    pub fn get(&self, net_namespace_id: Ino) -> Option<&[ProcessRecord]> {
        self.groups.get(&net_namespace_id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ino, &[ProcessRecord])> {
        self.groups.iter().map(|(ino, records)| (*ino, records.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn process_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Scan the introspection root and group every live process by its
/// network namespace. Failure to open the root is fatal; anything that
/// goes wrong for a single entry (the process exited between listing
/// and resolution, typically) just drops that entry.
pub fn enumerate_processes(procfs: &ProcFs) -> Result<NamespaceGroups, Error> {
    let mut entries = fs::read_dir(procfs.root())?;
    let mut groups = NamespaceGroups::default();

    loop {
        let batch: Vec<_> = entries.by_ref().take(ENUM_BATCH_SIZE).collect();
        if batch.is_empty() {
            break;
        }

        for entry in batch {
            let Ok(entry) = entry else {
                continue;
            };
            let Some(pid) = pid_of_entry(&entry) else {
                continue;
            };

            match resolve_record(procfs, pid) {
                Ok(record) => groups.insert(record),
                Err(err) => {
                    // Races with process exit are expected here.
                    trace!("skipping pid {pid}: {err}");
                }
            }
        }
    }

    Ok(groups)
}

/// An entry qualifies as a process only if it is a directory whose
/// name is entirely decimal digits.
fn pid_of_entry(entry: &fs::DirEntry) -> Option<i32> {
    let is_dir = entry.file_type().ok()?.is_dir();
    if !is_dir {
        return None;
    }

    let name = entry.file_name();
    let name = name.to_str()?;
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    name.parse().ok()
}

fn resolve_record(procfs: &ProcFs, pid: i32) -> Result<ProcessRecord, Error> {
    let pid_namespace_id = resolve_namespace_id(procfs, pid, NamespaceKind::Pid)?;
    let net_namespace_id = resolve_namespace_id(procfs, pid, NamespaceKind::Net)?;
    let sockets = procfs::fd::socket_inodes(procfs, pid).unwrap_or_default();

    Ok(ProcessRecord {
        pid,
        pid_namespace_id,
        net_namespace_id,
        sockets,
        connections: Vec::new(),
    })
}
