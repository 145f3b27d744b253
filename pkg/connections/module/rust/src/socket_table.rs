// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Parser for the kernel socket-table text format (/proc/net/tcp and
//! friends): one header line, then one row per socket with
//! hex-encoded, byte-order-reversed addresses.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Serialize, Serializer};

// A row needs at least the slot number, both address fields and the
// state code; anything shorter is a truncated line.
const MIN_FIELDS: usize = 5;

const STATE_ESTABLISHED: u64 = 0x01;
const STATE_LISTENING: u64 = 0x0A;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub fn number(&self) -> u8 {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }
}

impl Serialize for IpVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

/// Decoded connection state. The closed established/listening set is
/// what callers key on; everything else keeps its raw code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Established,
    Listening,
    Other(u64),
}

impl ConnectionStatus {
    fn from_code(code: u64) -> Self {
        match code {
            STATE_ESTABLISHED => ConnectionStatus::Established,
            STATE_LISTENING => ConnectionStatus::Listening,
            other => ConnectionStatus::Other(other),
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Established => f.write_str("established"),
            ConnectionStatus::Listening => f.write_str("listening"),
            ConnectionStatus::Other(code) => write!(f, "other (code:{code})"),
        }
    }
}

impl Serialize for ConnectionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One socket-table row. Immutable value type, serialized for the
/// serving layer in this field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionDescriptor {
    pub protocol: Protocol,
    #[serde(rename = "ipVersion")]
    pub ip_version: IpVersion,
    #[serde(rename = "srcPort")]
    pub src_port: u16,
    #[serde(rename = "dstPort")]
    pub dst_port: u16,
    #[serde(rename = "srcIP")]
    pub src_ip: String,
    #[serde(rename = "dstIP")]
    pub dst_ip: String,
    pub status: ConnectionStatus,
}

/// Parse the raw socket-table text into connection descriptors,
/// preserving row order. The header line is discarded, rows with fewer
/// than MIN_FIELDS whitespace-separated fields are skipped, and a
/// field that fails integer parsing decodes as zero so that the row
/// count stays stable for cross-referencing.
pub fn parse_socket_table(
    text: &str,
    protocol: Protocol,
    ip_version: IpVersion,
) -> Vec<ConnectionDescriptor> {
    text.lines()
        .skip(1)
        .filter_map(|line| parse_socket_line(line, protocol, ip_version))
        .collect()
}

fn parse_socket_line(
    line: &str,
    protocol: Protocol,
    ip_version: IpVersion,
) -> Option<ConnectionDescriptor> {
    let (src, dst, state) = get_fields(line)?;

    let (src_addr, src_port) = split_address(src);
    let (dst_addr, dst_port) = split_address(dst);
    let (src_addr, dst_addr) = truncate_wide_addresses(src_addr, dst_addr);

    let state_code = u64::from_str_radix(state, 16).unwrap_or(0);

    Some(ConnectionDescriptor {
        protocol,
        ip_version,
        src_port: u16::from_str_radix(src_port, 16).unwrap_or(0),
        dst_port: u16::from_str_radix(dst_port, 16).unwrap_or(0),
        src_ip: decode_address(src_addr),
        dst_ip: decode_address(dst_addr),
        status: ConnectionStatus::from_code(state_code),
    })
}

/// Extract the local address, remote address and state fields. Field
/// widths vary, so rows are split on whitespace runs rather than by
/// offset.
fn get_fields(line: &str) -> Option<(&str, &str, &str)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_FIELDS {
        return None;
    }

    let src = *fields.get(1)?;
    let dst = *fields.get(2)?;
    let state = *fields.get(3)?;
    Some((src, dst, state))
}

/// Split an `ADDR:PORT` field on its last colon. A field without a
/// colon keeps the whole string as the address and an empty port,
/// which decodes to port zero.
fn split_address(field: &str) -> (&str, &str) {
    match field.rfind(':') {
        Some(pos) => {
            let addr = field.get(..pos).unwrap_or(field);
            let port = field.get(pos + 1..).unwrap_or("");
            (addr, port)
        }
        None => (field, ""),
    }
}

/// IPv6-sized addresses are not fully decoded: when both the source
/// and destination address strings exceed 8 hex characters, only the
/// low-order 8 of each are kept and pushed through the 32-bit path.
/// This reproduces the original collector's truncation; full IPv6
/// decoding is a recorded follow-up, not something to change here
/// silently.
fn truncate_wide_addresses<'a>(src: &'a str, dst: &'a str) -> (&'a str, &'a str) {
    if src.len() > 8 && dst.len() > 8 {
        (low_order_word(src), low_order_word(dst))
    } else {
        (src, dst)
    }
}

fn low_order_word(addr: &str) -> &str {
    addr.get(addr.len().saturating_sub(8)..).unwrap_or(addr)
}

/// Decode a hex address as a 32-bit little-endian word into dotted
/// quad form. Unparseable input decodes as 0.0.0.0 per the
/// zero-on-failure policy.
fn decode_address(addr: &str) -> String {
    let word = u32::from_str_radix(addr, 16).unwrap_or(0);
    Ipv4Addr::from(word.swap_bytes()).to_string()
}
