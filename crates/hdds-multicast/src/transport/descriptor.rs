// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection descriptor exchanged through discovery.
//!
//! A passive peer publishes the multicast group it listens on; an active peer
//! decodes it to learn which group to join.
//!
//! # Wire Format
//!
//! ```text
//! ConnectionDescriptor {
//!     unsigned long transport_id;   // 0x4d435354 ("MCST")
//!     octet data[];                 // encoded network address
//! }
//!
//! network address (little-endian, RTPS Locator_t field order):
//!     long kind;                    // 4 bytes: LOCATOR_KIND_UDPv4 (1) or UDPv6 (2)
//!     unsigned long port;           // 4 bytes
//!     octet address[4 | 16];        // IPv4: 4 bytes, IPv6: 16 bytes
//!     unsigned long scope_id;       // IPv6 only
//! ```
//!
//! Unlike `Locator_t` the address is not padded to 16 bytes, so the length is
//! fully determined by `kind`: 12 bytes for IPv4, 28 bytes for IPv6.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use thiserror::Error;

/// Transport kind tag for multicast descriptors ("MCST").
pub const TRANSPORT_INTERFACE_ID: u32 = 0x4d43_5354;

/// Locator kind: UDP over IPv4 (standard RTPS).
pub const LOCATOR_KIND_UDPV4: i32 = 1;

/// Locator kind: UDP over IPv6 (standard RTPS).
pub const LOCATOR_KIND_UDPV6: i32 = 2;

/// kind + port.
const HEADER_SIZE: usize = 8;

/// Encoded size of an IPv4 group address.
pub const ENCODED_V4_SIZE: usize = HEADER_SIZE + 4;

/// Encoded size of an IPv6 group address.
pub const ENCODED_V6_SIZE: usize = HEADER_SIZE + 16 + 4;

/// Descriptor decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Shorter than the smallest valid encoding.
    #[error("descriptor truncated: {len} bytes (minimum {min})", min = ENCODED_V4_SIZE)]
    Truncated {
        /// Number of bytes received.
        len: usize,
    },
    /// Address kind is neither UDPv4 nor UDPv6.
    #[error("unknown address kind {0}")]
    UnknownKind(i32),
    /// Length does not match what `kind` declares.
    #[error("address kind {kind} requires {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Declared address kind.
        kind: i32,
        /// Length implied by `kind`.
        expected: usize,
        /// Length received.
        actual: usize,
    },
    /// Port does not fit in 16 bits.
    #[error("port {0} out of range")]
    InvalidPort(u32),
}

/// Encode a network address.
///
/// Total for every `SocketAddr`. IPv6 flow info is not carried.
pub fn encode_address(addr: &SocketAddr) -> Vec<u8> {
    match addr {
        SocketAddr::V4(v4) => {
            let mut buf = Vec::with_capacity(ENCODED_V4_SIZE);
            buf.extend_from_slice(&LOCATOR_KIND_UDPV4.to_le_bytes());
            buf.extend_from_slice(&u32::from(v4.port()).to_le_bytes());
            buf.extend_from_slice(&v4.ip().octets());
            buf
        }
        SocketAddr::V6(v6) => {
            let mut buf = Vec::with_capacity(ENCODED_V6_SIZE);
            buf.extend_from_slice(&LOCATOR_KIND_UDPV6.to_le_bytes());
            buf.extend_from_slice(&u32::from(v6.port()).to_le_bytes());
            buf.extend_from_slice(&v6.ip().octets());
            buf.extend_from_slice(&v6.scope_id().to_le_bytes());
            buf
        }
    }
}

/// Decode a network address produced by [`encode_address`].
pub fn decode_address(buf: &[u8]) -> Result<SocketAddr, DecodeError> {
    if buf.len() < ENCODED_V4_SIZE {
        return Err(DecodeError::Truncated { len: buf.len() });
    }

    let kind = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let expected = match kind {
        LOCATOR_KIND_UDPV4 => ENCODED_V4_SIZE,
        LOCATOR_KIND_UDPV6 => ENCODED_V6_SIZE,
        other => return Err(DecodeError::UnknownKind(other)),
    };
    if buf.len() != expected {
        return Err(DecodeError::LengthMismatch {
            kind,
            expected,
            actual: buf.len(),
        });
    }

    let raw_port = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let port = u16::try_from(raw_port).map_err(|_| DecodeError::InvalidPort(raw_port))?;

    let addr = if kind == LOCATOR_KIND_UDPV4 {
        let ip = Ipv4Addr::new(buf[8], buf[9], buf[10], buf[11]);
        SocketAddr::V4(SocketAddrV4::new(ip, port))
    } else {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&buf[8..24]);
        let scope_id = u32::from_le_bytes([buf[24], buf[25], buf[26], buf[27]]);
        SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::from(octets), port, 0, scope_id))
    };
    Ok(addr)
}

/// Opaque transport blob published through discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Transport kind tag.
    pub transport_id: u32,
    /// Transport-specific payload.
    pub data: Vec<u8>,
}

impl ConnectionDescriptor {
    /// Build a raw descriptor.
    pub fn new(transport_id: u32, data: Vec<u8>) -> Self {
        Self { transport_id, data }
    }

    /// Multicast descriptor advertising `group`.
    pub fn for_group(group: &SocketAddr) -> Self {
        Self {
            transport_id: TRANSPORT_INTERFACE_ID,
            data: encode_address(group),
        }
    }

    /// Whether the tag names the multicast transport.
    pub fn is_multicast(&self) -> bool {
        self.transport_id == TRANSPORT_INTERFACE_ID
    }

    /// Decode the payload as a group address. The tag is not checked.
    pub fn group_address(&self) -> Result<SocketAddr, DecodeError> {
        decode_address(&self.data)
    }
}
