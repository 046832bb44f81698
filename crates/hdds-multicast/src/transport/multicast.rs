// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Multicast transport: the datalink registry.
//!
//! Datalinks are formed between participants, not endpoints. All publications
//! and subscriptions of one remote participant share a single datalink, keyed
//! by the remote GUID prefix.
//!
//! # Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                   MulticastTransport                         |
//! |  +-------------------------------------------------------+  |
//! |  |   links: RwLock<HashMap<GuidPrefix, Arc<DataLink>>>   |  |
//! |  +-------------------------------------------------------+  |
//! |  +------------------------+  +----------------------------+ |
//! |  | config: ArcSwapOption  |  | reactor: ReactorTask       | |
//! |  +------------------------+  +----------------------------+ |
//! +-------------------------------------------------------------+
//! ```
//!
//! # Group Address Negotiation
//!
//! - Passive side: joins the configured group and publishes it through
//!   [`Transport::outbound_connection_descriptor`].
//! - Active side: joins the group decoded from the remote descriptor.
//!
//! # Concurrency
//!
//! The group join blocks, so it runs outside the registry lock. Registration
//! re-checks the map under the write lock: if another thread registered the
//! same peer meanwhile, the freshly joined link is shut down and the
//! registered one is returned.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwapOption;
use parking_lot::RwLock;

use super::descriptor::ConnectionDescriptor;
use crate::config::{MulticastConfig, TransportConfiguration};
use crate::datalink::{MulticastDataLink, MulticastReceiveStrategy, MulticastSendStrategy};
use crate::error::{Error, Result};
use crate::framework::{AssociationData, Transport, TransportInterface};
use crate::guid::{Guid, GuidPrefix};
use crate::metrics::{TransportMetrics, TransportMetricsSnapshot};
use crate::reactor::ReactorTask;

/// Multicast transport.
///
/// # Thread Safety
///
/// `MulticastTransport` is thread-safe and can be shared via
/// `Arc<MulticastTransport>`. All methods take `&self`.
pub struct MulticastTransport {
    /// Execution context handed to every datalink
    reactor: ReactorTask,

    /// Live configuration (None until configured, and after shutdown)
    config: ArcSwapOption<MulticastConfig>,

    /// Registered datalinks by remote participant
    links: RwLock<HashMap<GuidPrefix, Arc<MulticastDataLink>>>,

    /// Metrics
    metrics: TransportMetrics,
}

impl Default for MulticastTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MulticastTransport {
    /// Unconfigured transport opening real UDP sockets.
    pub fn new() -> Self {
        Self::with_reactor(ReactorTask::new("mcast"))
    }

    /// Unconfigured transport using `reactor` for datalink I/O.
    pub fn with_reactor(reactor: ReactorTask) -> Self {
        Self {
            reactor,
            config: ArcSwapOption::empty(),
            links: RwLock::new(HashMap::new()),
            metrics: TransportMetrics::new(),
        }
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Live configuration.
    pub fn config(&self) -> Option<Arc<MulticastConfig>> {
        self.config.load_full()
    }

    /// Whether `configure` succeeded and `shutdown` has not run since.
    pub fn is_configured(&self) -> bool {
        self.config.load().is_some()
    }

    /// Execution context.
    pub fn reactor(&self) -> &ReactorTask {
        &self.reactor
    }

    /// Number of registered datalinks.
    pub fn link_count(&self) -> usize {
        self.links.read().len()
    }

    /// Registered datalink for `peer`.
    pub fn datalink_for(&self, peer: &GuidPrefix) -> Option<Arc<MulticastDataLink>> {
        self.links.read().get(peer).cloned()
    }

    /// Remote participants with a registered datalink.
    pub fn peers(&self) -> Vec<GuidPrefix> {
        self.links.read().keys().copied().collect()
    }

    /// Metrics counters.
    pub fn metrics(&self) -> &TransportMetrics {
        &self.metrics
    }

    /// Metrics snapshot.
    pub fn metrics_snapshot(&self) -> TransportMetricsSnapshot {
        self.metrics.snapshot()
    }

    // ========================================================================
    // Descriptors
    // ========================================================================

    /// Decode the group address a remote peer published.
    ///
    /// A descriptor tagged for another transport is reported but still
    /// decoded: the address encoding carries its own kind and length.
    pub fn inbound_connection_descriptor(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<SocketAddr> {
        if !descriptor.is_multicast() {
            self.metrics.record_tag_mismatch();
            log::warn!(
                "[MCAST] inbound_connection_descriptor: transport interface ID does not match: 0x{:x}",
                descriptor.transport_id
            );
        }
        Ok(descriptor.group_address()?)
    }

    // ========================================================================
    // Reliability
    // ========================================================================

    /// Report every reliable datalink whose handshake deadline passed.
    ///
    /// Each link is reported once; later polls skip it until it is released.
    /// Returns the number of links reported.
    pub fn check_reliability(&self, interface: &dyn TransportInterface) -> usize {
        self.check_reliability_at(interface, Instant::now())
    }

    /// [`check_reliability`](Self::check_reliability) against an explicit clock.
    pub fn check_reliability_at(&self, interface: &dyn TransportInterface, now: Instant) -> usize {
        let expired: Vec<Arc<MulticastDataLink>> = self
            .links
            .read()
            .values()
            .filter(|link| {
                link.as_reliable()
                    .is_some_and(|reliable| {
                        reliable.handshake_expired(now) && reliable.mark_loss_reported()
                    })
            })
            .cloned()
            .collect();

        for link in &expired {
            self.on_reliability_lost(link, interface);
        }
        expired.len()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn peer_of(&self, link: &Arc<MulticastDataLink>) -> Option<GuidPrefix> {
        self.links
            .read()
            .iter()
            .find(|(_, registered)| Arc::ptr_eq(registered, link))
            .map(|(peer, _)| *peer)
    }

    fn build_link(
        &self,
        config: &Arc<MulticastConfig>,
        local_peer: GuidPrefix,
        remote_peer: GuidPrefix,
        active: bool,
    ) -> Result<MulticastDataLink> {
        // Mode comes from the transport configuration
        let mut link = MulticastDataLink::new(config.reliable, local_peer, remote_peer, active);
        link.configure(Arc::clone(config), self.reactor.clone())?;

        let send_strategy = MulticastSendStrategy::new(&link)?;
        link.attach_send_strategy(send_strategy);
        let recv_strategy = MulticastReceiveStrategy::new(&link)?;
        link.attach_receive_strategy(recv_strategy);
        Ok(link)
    }
}

impl Transport for MulticastTransport {
    type Link = MulticastDataLink;

    fn configure(&self, config: Arc<dyn TransportConfiguration>) -> Result<()> {
        let kind = config.transport_type();
        let config = config
            .into_any()
            .downcast::<MulticastConfig>()
            .map_err(|_| {
                log::error!("[MCAST] configure: invalid configuration (kind={})", kind);
                Error::InvalidConfiguration(kind)
            })?;
        config.validate()?;

        log::debug!(
            "[MCAST] configured reliable={} group={}",
            config.reliable,
            config.group_address
        );
        self.config.store(Some(config));
        Ok(())
    }

    fn find_or_create(
        &self,
        local_id: Guid,
        remote: &AssociationData,
        active: bool,
    ) -> Result<Arc<MulticastDataLink>> {
        let remote_peer = remote.remote_id.participant_id();

        if let Some(link) = self.links.read().get(&remote_peer) {
            self.metrics.record_link_reused();
            return Ok(Arc::clone(link));
        }

        let config = self.config.load_full().ok_or(Error::NotConfigured)?;
        let local_peer = local_id.participant_id();

        // Active peers learn the group from the remote descriptor, passive
        // peers use the configured one.
        let group = if active {
            self.inbound_connection_descriptor(&remote.remote_data)?
        } else {
            config.group_address
        };

        let mut link = self.build_link(&config, local_peer, remote_peer, active)?;
        if let Err(source) = link.join(group) {
            self.metrics.record_join_failure();
            link.shutdown();
            log::error!(
                "[MCAST] find_or_create: failed to join multicast group {}: {}",
                group,
                source
            );
            return Err(Error::GroupJoinFailed { group, source });
        }
        let link = Arc::new(link);

        let mut links = self.links.write();
        if let Some(winner) = links.get(&remote_peer) {
            let winner = Arc::clone(winner);
            drop(links);
            self.metrics.record_race_loser();
            self.metrics.record_link_reused();
            link.shutdown();
            log::debug!(
                "[MCAST] datalink to {} registered concurrently, discarding duplicate",
                remote_peer
            );
            return Ok(winner);
        }
        links.insert(remote_peer, Arc::clone(&link));
        drop(links);

        self.metrics.record_link_created();
        log::debug!(
            "[MCAST] datalink {} -> {} joined {} (reliable={}, active={})",
            local_peer,
            remote_peer,
            group,
            link.is_reliable(),
            active
        );
        Ok(link)
    }

    fn outbound_connection_descriptor(&self) -> Result<ConnectionDescriptor> {
        let config = self.config.load_full().ok_or(Error::NotConfigured)?;
        Ok(ConnectionDescriptor::for_group(&config.group_address))
    }

    fn acked(&self, _local_id: Guid, remote_id: Guid) -> bool {
        self.links
            .read()
            .get(&remote_id.participant_id())
            .is_some_and(|link| link.acked())
    }

    fn remove_ack(&self, _local_id: Guid, _remote_id: Guid) {
        // Acknowledgment state lives in each datalink; nothing to remove here.
    }

    fn release(&self, link: &Arc<MulticastDataLink>) {
        let removed = {
            let mut links = self.links.write();
            let peer = links
                .iter()
                .find(|(_, registered)| Arc::ptr_eq(registered, link))
                .map(|(peer, _)| *peer);
            peer.and_then(|peer| links.remove(&peer))
        };

        if let Some(removed) = removed {
            self.metrics.record_links_released(1);
            removed.shutdown();
            log::debug!("[MCAST] released datalink to {}", removed.remote_peer());
        }
    }

    fn on_reliability_lost(&self, link: &Arc<MulticastDataLink>, interface: &dyn TransportInterface) {
        let Some(remote_peer) = self.peer_of(link) else {
            return;
        };

        // Participant GUIDs differ only in their prefix, so the remote one is
        // the local participant GUID with the remote prefix substituted.
        let remote_id = interface.participant_id().with_participant(remote_peer);

        self.metrics.record_reliability_lost();
        log::warn!(
            "[MCAST] reliability lost: disassociating remote participant {}",
            remote_id
        );
        interface.disassociate_participant(remote_id);
    }

    fn shutdown(&self) {
        let links: Vec<Arc<MulticastDataLink>> =
            self.links.write().drain().map(|(_, link)| link).collect();

        for link in &links {
            link.shutdown();
        }
        self.metrics.record_links_released(links.len());
        self.config.store(None);
        log::debug!("[MCAST] transport shut down ({} datalinks)", links.len());
    }
}
