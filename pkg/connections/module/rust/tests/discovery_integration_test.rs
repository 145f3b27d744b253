// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Process inventory tests against a fabricated introspection root.
//! The namespace entries are dangling symlinks whose targets carry the
//! `<kind>:[<digits>]` form, exactly like the kernel's.

#![cfg(unix)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use tempfile::TempDir;

use conn_discovery::{NamespaceKind, ProcFs, enumerate_processes, resolve_namespace_id};

struct FakeProcRoot {
    dir: TempDir,
}

impl FakeProcRoot {
    fn new() -> Self {
        FakeProcRoot {
            dir: TempDir::new().unwrap(),
        }
    }

    fn procfs(&self) -> ProcFs {
        ProcFs::new(self.dir.path())
    }

    fn add_process(&self, pid: u32, pid_ns: u64, net_ns: u64) {
        let ns_dir = self.dir.path().join(pid.to_string()).join("ns");
        fs::create_dir_all(&ns_dir).unwrap();
        symlink(format!("pid:[{pid_ns}]"), ns_dir.join("pid")).unwrap();
        symlink(format!("net:[{net_ns}]"), ns_dir.join("net")).unwrap();
    }

    fn add_socket_fd(&self, pid: u32, fd: u32, inode: u64) {
        let fd_dir = self.dir.path().join(pid.to_string()).join("fd");
        fs::create_dir_all(&fd_dir).unwrap();
        symlink(format!("socket:[{inode}]"), fd_dir.join(fd.to_string())).unwrap();
    }

    fn add_entry(&self, name: &str, is_dir: bool) {
        let path = self.dir.path().join(name);
        if is_dir {
            fs::create_dir_all(path).unwrap();
        } else {
            fs::write(path, b"").unwrap();
        }
    }
}

#[test]
fn test_processes_sharing_netns_land_in_one_group() {
    let root = FakeProcRoot::new();
    root.add_process(100, 5001, 9001);
    root.add_process(101, 5001, 9001);
    root.add_process(102, 5002, 9001);
    root.add_process(200, 5003, 9002);

    let groups = enumerate_processes(&root.procfs()).unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups.process_count(), 4);

    let shared = groups.get(9001).expect("expected group for netns 9001");
    let mut pids: Vec<i32> = shared.iter().map(|record| record.pid).collect();
    pids.sort_unstable();
    assert_eq!(pids, vec![100, 101, 102]);

    for record in shared {
        assert_eq!(record.net_namespace_id, 9001);
        assert!(record.connections.is_empty());
    }

    let lone = groups.get(9002).expect("expected group for netns 9002");
    assert_eq!(lone.len(), 1);
    assert_eq!(lone.first().unwrap().pid, 200);
    assert_eq!(lone.first().unwrap().pid_namespace_id, 5003);
}

#[test]
fn test_non_process_entries_are_ignored() {
    let root = FakeProcRoot::new();
    root.add_process(42, 1, 2);
    // Not all-digits, or not a directory.
    root.add_entry("sys", true);
    root.add_entry("12abc", true);
    root.add_entry("999", false);
    root.add_entry("cmdline", false);

    let groups = enumerate_processes(&root.procfs()).unwrap();

    assert_eq!(groups.process_count(), 1);
    assert_eq!(groups.get(2).unwrap().first().unwrap().pid, 42);
}

#[test]
fn test_process_without_namespace_entries_is_skipped() {
    let root = FakeProcRoot::new();
    root.add_process(10, 1, 2);
    // Directory that looks like a pid but has no ns entries, as after
    // a process exits mid-scan.
    root.add_entry("11", true);

    let groups = enumerate_processes(&root.procfs()).unwrap();

    assert_eq!(groups.process_count(), 1);
}

#[test]
fn test_socket_inodes_attached_to_records() {
    let root = FakeProcRoot::new();
    root.add_process(10, 1, 2);
    root.add_socket_fd(10, 3, 777);
    root.add_socket_fd(10, 4, 778);
    // A process with no fd directory still enumerates.
    root.add_process(11, 1, 2);

    let groups = enumerate_processes(&root.procfs()).unwrap();
    let records = groups.get(2).unwrap();

    let with_sockets = records.iter().find(|r| r.pid == 10).unwrap();
    let mut inodes = with_sockets.sockets.clone();
    inodes.sort_unstable();
    assert_eq!(inodes, vec![777, 778]);

    let without = records.iter().find(|r| r.pid == 11).unwrap();
    assert!(without.sockets.is_empty());
}

#[test]
fn test_resolve_namespace_id_from_fake_root() {
    let root = FakeProcRoot::new();
    root.add_process(77, 4026531836, 4026531992);
    let procfs = root.procfs();

    assert_eq!(
        resolve_namespace_id(&procfs, 77, NamespaceKind::Pid).unwrap(),
        4026531836
    );
    assert_eq!(
        resolve_namespace_id(&procfs, 77, NamespaceKind::Net).unwrap(),
        4026531992
    );
    assert!(resolve_namespace_id(&procfs, 78, NamespaceKind::Net).is_err());
}

#[test]
fn test_large_process_count_enumerates_fully() {
    // Well past the enumeration batch size.
    let root = FakeProcRoot::new();
    for pid in 1..=500u32 {
        root.add_process(pid, 1, u64::from(pid) % 7);
    }

    let groups = enumerate_processes(&root.procfs()).unwrap();

    assert_eq!(groups.process_count(), 500);
    assert_eq!(groups.len(), 7);
}

#[test]
fn test_zero_namespace_id_is_a_valid_group_key() {
    let root = FakeProcRoot::new();
    root.add_process(5, 1, 0);

    let groups = enumerate_processes(&root.procfs()).unwrap();

    let group = groups.get(0).expect("netns 0 must be a real bucket");
    assert_eq!(group.first().unwrap().pid, 5);
}
