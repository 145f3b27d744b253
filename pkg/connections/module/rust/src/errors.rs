// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use thiserror::Error;

use crate::netns::NamespaceKind;

/// Failure taxonomy for a discovery pass. Only `Enumeration` ever
/// propagates to the caller; the other variants are absorbed at the
/// component that produced them and turned into "no data for this
/// unit".
#[derive(Error, Debug)]
pub enum Error {
    #[error("could not resolve {kind} namespace for pid {pid}: {context}")]
    NamespaceUnavailable {
        pid: i32,
        kind: NamespaceKind,
        context: String,
    },

    #[error("could not list process inventory: {0}")]
    Enumeration(#[from] std::io::Error),

    #[error("remote exec failed for container {container} of {namespace}/{workload}: {context}")]
    RemoteExec {
        namespace: String,
        workload: String,
        container: String,
        context: String,
    },
}
