// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

// Correctness
#![deny(clippy::indexing_slicing)]
#![deny(clippy::string_slice)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::undocumented_unsafe_blocks)]
// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unimplemented)]
#![deny(clippy::todo)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

mod aggregator;
mod config;
mod errors;
mod inventory;
mod netns;
mod procfs;
mod socket_table;

// Re-export the public API
pub use aggregator::{
    ContainerTarget, ExecOutput, RemoteExec, SOCKET_TABLE_VARIANTS, SocketTableVariant, Workload,
    WorkloadConnections, discover_all, discover_workload_connections,
};
pub use config::DiscoveryConfig;
pub use errors::Error;
pub use inventory::{NamespaceGroups, ProcessRecord, enumerate_processes};
pub use netns::{Ino, NamespaceKind, resolve_namespace_id};
pub use procfs::ProcFs;
pub use socket_table::{
    ConnectionDescriptor, ConnectionStatus, IpVersion, Protocol, parse_socket_table,
};
