// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Per-workload connection aggregation. For each workload the four
//! kernel socket-table variants are fetched through the remote-exec
//! collaborator and parsed; containers of a workload share a network
//! namespace, so the first container that yields anything ends the
//! visit.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::config::DiscoveryConfig;
use crate::errors::Error;
use crate::socket_table::{ConnectionDescriptor, IpVersion, Protocol, parse_socket_table};

/// One addressable execution context for the remote-exec collaborator.
#[derive(Debug, Clone)]
pub struct ContainerTarget {
    pub namespace: String,
    pub workload: String,
    pub container: String,
}

/// A workload as supplied by the listing collaborator: a logical
/// namespace, a name, and its member containers in order.
#[derive(Debug, Clone, Deserialize)]
pub struct Workload {
    pub namespace: String,
    pub name: String,
    pub containers: Vec<String>,
}

/// Aggregated connections for one workload, ready for the serving
/// layer. May be empty when no container yielded any data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadConnections {
    pub namespace: String,
    #[serde(rename = "workloadName")]
    pub workload_name: String,
    pub connections: Vec<ConnectionDescriptor>,
}

#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Boundary to the remote-execution transport. The core only ever asks
/// it to read a kernel socket-table file inside a container; each call
/// is an independently fallible, independently cancellable unit of
/// work, and the transport owns session release on cancellation.
#[async_trait]
pub trait RemoteExec: Send + Sync {
    async fn exec(&self, target: &ContainerTarget, command: &[&str]) -> Result<ExecOutput, Error>;
}

/// One socket-table file and the protocol tags its rows carry.
#[derive(Debug, Clone, Copy)]
pub struct SocketTableVariant {
    pub table: &'static str,
    pub protocol: Protocol,
    pub ip_version: IpVersion,
}

/// The four variants, in the order their results are concatenated.
pub const SOCKET_TABLE_VARIANTS: [SocketTableVariant; 4] = [
    SocketTableVariant {
        table: "tcp",
        protocol: Protocol::Tcp,
        ip_version: IpVersion::V4,
    },
    SocketTableVariant {
        table: "tcp6",
        protocol: Protocol::Tcp,
        ip_version: IpVersion::V6,
    },
    SocketTableVariant {
        table: "udp",
        protocol: Protocol::Udp,
        ip_version: IpVersion::V4,
    },
    SocketTableVariant {
        table: "udp6",
        protocol: Protocol::Udp,
        ip_version: IpVersion::V6,
    },
];

/// Visit items in order until one yields a non-empty result, and
/// return that result. Encodes the early-exit rule explicitly so it
/// can be tested apart from exec mechanics.
async fn visit_until_nonempty<'a, C, T, F, Fut>(items: &'a [C], mut fetch: F) -> Vec<T>
where
    F: FnMut(&'a C) -> Fut,
    Fut: std::future::Future<Output = Vec<T>>,
{
    for item in items {
        let result = fetch(item).await;
        if !result.is_empty() {
            return result;
        }
    }
    Vec::new()
}

/// Fetch and parse all four socket-table variants from one container.
/// Any exec failure aborts this container's collection; the caller
/// moves on to the next container.
async fn fetch_container_connections(
    exec: &dyn RemoteExec,
    target: &ContainerTarget,
    exec_timeout: Duration,
) -> Result<Vec<ConnectionDescriptor>, Error> {
    let mut connections = Vec::new();

    for variant in SOCKET_TABLE_VARIANTS {
        let path = format!("/proc/net/{}", variant.table);
        let output = match timeout(exec_timeout, exec.exec(target, &["cat", &path])).await {
            Ok(result) => result?,
            Err(_elapsed) => {
                return Err(Error::RemoteExec {
                    namespace: target.namespace.clone(),
                    workload: target.workload.clone(),
                    container: target.container.clone(),
                    context: format!("timed out after {}s reading {path}", exec_timeout.as_secs()),
                });
            }
        };

        connections.extend(parse_socket_table(
            &output.stdout,
            variant.protocol,
            variant.ip_version,
        ));
    }

    Ok(connections)
}

/// Discover the connections of one workload. Containers are visited
/// sequentially: they share a network namespace, so once one yields a
/// non-empty result the rest would only repeat it. A container whose
/// exec fails is logged and skipped; a workload where every container
/// fails gets an empty connection list, not an error.
pub async fn discover_workload_connections(
    exec: &dyn RemoteExec,
    workload: &Workload,
    exec_timeout: Duration,
) -> WorkloadConnections {
    let connections = visit_until_nonempty(&workload.containers, async |container: &String| {
        let target = ContainerTarget {
            namespace: workload.namespace.clone(),
            workload: workload.name.clone(),
            container: container.clone(),
        };

        match fetch_container_connections(exec, &target, exec_timeout).await {
            Ok(connections) => connections,
            Err(err) => {
                warn!("{err}");
                Vec::new()
            }
        }
    })
    .await;

    debug!(
        "workload {}/{}: {} connections",
        workload.namespace,
        workload.name,
        connections.len()
    );

    WorkloadConnections {
        namespace: workload.namespace.clone(),
        workload_name: workload.name.clone(),
        connections,
    }
}

/// Discover connections for a whole snapshot of workloads. Workloads
/// are independent, so they fan out on the runtime, bounded by the
/// configured exec cap; container visitation inside each workload
/// stays sequential to keep the early-exit optimization. Results come
/// back in input order.
pub async fn discover_all(
    exec: Arc<dyn RemoteExec>,
    workloads: Vec<Workload>,
    config: &DiscoveryConfig,
) -> Vec<WorkloadConnections> {
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_execs.max(1)));
    let exec_timeout = config.exec_timeout();
    let mut tasks = JoinSet::new();

    for (index, workload) in workloads.into_iter().enumerate() {
        let exec = Arc::clone(&exec);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            // A workload holds one permit for its whole (sequential)
            // container visit, which caps in-flight execs as well.
            let empty = WorkloadConnections {
                namespace: workload.namespace.clone(),
                workload_name: workload.name.clone(),
                connections: Vec::new(),
            };
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (index, empty);
            };

            let result = discover_workload_connections(exec.as_ref(), &workload, exec_timeout).await;
            (index, result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(pair) => results.push(pair),
            Err(err) => warn!("workload discovery task failed: {err}"),
        }
    }

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}
