// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # HDDS Multicast - shared multicast datalinks
//!
//! Multicast transport for HDDS. Every association with a given remote
//! participant is served by one multicast datalink, created on first use and
//! shared by all publications and subscriptions of both participants.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hdds_multicast::{
//!     AssociationData, ConnectionDescriptor, Guid, GuidPrefix, MulticastConfig,
//!     MulticastTransport, Result, Transport,
//! };
//!
//! fn main() -> Result<()> {
//!     let transport = MulticastTransport::new();
//!     transport.configure(Arc::new(MulticastConfig::best_effort(
//!         "239.1.1.1:4000".parse().unwrap(),
//!     )))?;
//!
//!     // Publish our group through discovery
//!     let descriptor = transport.outbound_connection_descriptor()?;
//!
//!     // Associate with a remote writer
//!     let local = Guid::participant(GuidPrefix([1; 12]));
//!     let remote = AssociationData::new(Guid::participant(GuidPrefix([2; 12])), descriptor);
//!     let link = transport.find_or_create(local, &remote, true)?;
//!     assert!(link.acked());
//!
//!     transport.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |                 Association layer (Transport)                 |
//! +---------------------------------------------------------------+
//! |  MulticastTransport: GuidPrefix -> Arc<MulticastDataLink>     |
//! +---------------------------------------------------------------+
//! |  MulticastDataLink: Reliable | BestEffort                     |
//! |    send / receive strategies, SYN/SYNACK handshake            |
//! +---------------------------------------------------------------+
//! |  ReactorTask -> GroupSocket (socket2 UDP multicast)           |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MulticastTransport`] | Datalink registry, entry point |
//! | [`MulticastDataLink`] | Channel to one remote participant |
//! | [`MulticastConfig`] | Transport settings |
//! | [`ConnectionDescriptor`] | Group address exchanged through discovery |

// Clippy: No blanket suppressions. Fix issues properly or use inline #[allow] with justification.

/// Transport configuration.
pub mod config;
/// Multicast datalinks (reliable and best-effort).
pub mod datalink;
/// Error types.
pub mod error;
/// Transport contract shared with the association layer.
pub mod framework;
/// RTPS GUIDs.
pub mod guid;
/// Transport metrics.
pub mod metrics;
/// Datalink execution context.
pub mod reactor;
/// Descriptor codec, sockets and the datalink registry.
pub mod transport;

pub use config::{MulticastConfig, TransportConfiguration};
pub use datalink::{BestEffortMulticast, MulticastDataLink, ReliableMulticast};
pub use error::{Error, Result};
pub use framework::{AssociationData, Transport, TransportInterface};
pub use guid::{Guid, GuidPrefix, ENTITYID_PARTICIPANT};
pub use metrics::{TransportMetrics, TransportMetricsSnapshot};
pub use reactor::ReactorTask;
pub use transport::{ConnectionDescriptor, MulticastTransport};
