// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Multicast transport layer.
//!
//! # Modules
//!
//! - `descriptor` - connection descriptor wire format
//! - `socket` - multicast group sockets and interface discovery
//! - `multicast` - the datalink registry

/// Connection descriptor encoding.
pub mod descriptor;
/// Multicast datalink registry.
pub mod multicast;
/// Group sockets (socket2) and interface discovery.
pub mod socket;

pub use descriptor::{ConnectionDescriptor, DecodeError, TRANSPORT_INTERFACE_ID};
pub use multicast::MulticastTransport;
pub use socket::{GroupSocket, SocketFactory, UdpGroupSocket, UdpSocketFactory};
