// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Multicast datalinks.
//!
//! A datalink is the single multicast path between the local participant and
//! one remote participant. It comes in two modes, fixed at construction:
//!
//! | Mode | `acked()` | Extra behavior |
//! |------|-----------|----------------|
//! | [`ReliableMulticast`] | after SYN/SYNACK handshake | handshake deadline |
//! | [`BestEffortMulticast`] | always | none |
//!
//! # Lifecycle
//!
//! ```text
//! new -> configure(config, reactor) -> attach strategies -> join(group)
//!     -> [registered, shared via Arc] -> shutdown
//! ```
//!
//! Everything before `join` runs on an exclusively owned link; after
//! registration the link is only used through `&self`.

mod best_effort;
mod reliable;
/// Send and receive strategies.
pub mod strategy;

pub use best_effort::BestEffortMulticast;
pub use reliable::{ReliableMulticast, CONTROL_MESSAGE_SIZE, SYNACK_TAG, SYN_TAG};
pub use strategy::{MulticastReceiveStrategy, MulticastSendStrategy};

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::MulticastConfig;
use crate::guid::GuidPrefix;
use crate::reactor::ReactorTask;
use crate::transport::socket::GroupSocket;

/// State common to both link modes.
pub(crate) struct LinkCore {
    local_peer: GuidPrefix,
    remote_peer: GuidPrefix,
    active: bool,
    config: Option<Arc<MulticastConfig>>,
    reactor: Option<ReactorTask>,
    socket: Option<Arc<dyn GroupSocket>>,
    send_strategy: Option<Arc<MulticastSendStrategy>>,
    recv_strategy: Option<Arc<MulticastReceiveStrategy>>,
    group: Option<SocketAddr>,
    shut_down: AtomicBool,
}

impl LinkCore {
    fn new(local_peer: GuidPrefix, remote_peer: GuidPrefix, active: bool) -> Self {
        Self {
            local_peer,
            remote_peer,
            active,
            config: None,
            reactor: None,
            socket: None,
            send_strategy: None,
            recv_strategy: None,
            group: None,
            shut_down: AtomicBool::new(false),
        }
    }

    fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(strategy) = &self.send_strategy {
            strategy.stop();
        }
        if let Some(strategy) = &self.recv_strategy {
            strategy.stop();
        }
        if let Some(socket) = &self.socket {
            if let Err(e) = socket.leave() {
                log::debug!(
                    "[MCAST] leave failed for link to {} (ignored): {}",
                    self.remote_peer,
                    e
                );
            }
        }
    }
}

/// Multicast datalink to one remote participant.
pub enum MulticastDataLink {
    /// Reliable link (handshake-acknowledged).
    Reliable(ReliableMulticast),
    /// Best-effort link.
    BestEffort(BestEffortMulticast),
}

impl MulticastDataLink {
    /// Create an unconfigured link; `reliable` selects the mode.
    pub fn new(
        reliable: bool,
        local_peer: GuidPrefix,
        remote_peer: GuidPrefix,
        active: bool,
    ) -> Self {
        let core = LinkCore::new(local_peer, remote_peer, active);
        if reliable {
            MulticastDataLink::Reliable(ReliableMulticast::new(core))
        } else {
            MulticastDataLink::BestEffort(BestEffortMulticast::new(core))
        }
    }

    fn core(&self) -> &LinkCore {
        match self {
            MulticastDataLink::Reliable(link) => link.core(),
            MulticastDataLink::BestEffort(link) => link.core(),
        }
    }

    fn core_mut(&mut self) -> &mut LinkCore {
        match self {
            MulticastDataLink::Reliable(link) => link.core_mut(),
            MulticastDataLink::BestEffort(link) => link.core_mut(),
        }
    }

    /// Bind the link to the transport configuration and execution context.
    ///
    /// Opens the (unjoined) group socket.
    pub fn configure(
        &mut self,
        config: Arc<MulticastConfig>,
        reactor: ReactorTask,
    ) -> io::Result<()> {
        let socket = reactor.open_socket(&config)?;
        let core = self.core_mut();
        core.socket = Some(socket);
        core.config = Some(config);
        core.reactor = Some(reactor);
        Ok(())
    }

    /// Attach the send strategy.
    pub fn attach_send_strategy(&mut self, strategy: MulticastSendStrategy) {
        self.core_mut().send_strategy = Some(Arc::new(strategy));
    }

    /// Attach the receive strategy.
    pub fn attach_receive_strategy(&mut self, strategy: MulticastReceiveStrategy) {
        self.core_mut().recv_strategy = Some(Arc::new(strategy));
    }

    /// Join `group`. Blocking.
    pub fn join(&mut self, group: SocketAddr) -> io::Result<()> {
        let socket = self.core().socket.clone().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "datalink not configured")
        })?;
        socket.join(group)?;
        self.core_mut().group = Some(group);
        if let MulticastDataLink::Reliable(link) = self {
            link.start_handshake();
        }
        Ok(())
    }

    /// Whether the remote peer has acknowledged this link.
    pub fn acked(&self) -> bool {
        match self {
            MulticastDataLink::Reliable(link) => link.acked(),
            MulticastDataLink::BestEffort(link) => link.acked(),
        }
    }

    /// Stop strategies and leave the group. Idempotent.
    pub fn shutdown(&self) {
        self.core().shutdown();
        log::debug!(
            "[MCAST] datalink {} -> {} shut down",
            self.local_peer(),
            self.remote_peer()
        );
    }

    /// Whether `shutdown` has run.
    pub fn is_shut_down(&self) -> bool {
        self.core().shut_down.load(Ordering::Acquire)
    }

    /// Reliable mode?
    pub fn is_reliable(&self) -> bool {
        matches!(self, MulticastDataLink::Reliable(_))
    }

    /// Reliable view of this link, if it is one.
    pub fn as_reliable(&self) -> Option<&ReliableMulticast> {
        match self {
            MulticastDataLink::Reliable(link) => Some(link),
            MulticastDataLink::BestEffort(_) => None,
        }
    }

    /// Local participant.
    pub fn local_peer(&self) -> GuidPrefix {
        self.core().local_peer
    }

    /// Remote participant.
    pub fn remote_peer(&self) -> GuidPrefix {
        self.core().remote_peer
    }

    /// True if this side resolved the group from the remote descriptor.
    pub fn is_active(&self) -> bool {
        self.core().active
    }

    /// Joined group.
    pub fn group_address(&self) -> Option<SocketAddr> {
        self.core().group
    }

    /// Configuration the link was configured with.
    pub fn config(&self) -> Option<&Arc<MulticastConfig>> {
        self.core().config.as_ref()
    }

    /// Execution context the link was configured with.
    pub fn reactor(&self) -> Option<&ReactorTask> {
        self.core().reactor.as_ref()
    }

    /// Group socket (after `configure`).
    pub fn socket(&self) -> Option<Arc<dyn GroupSocket>> {
        self.core().socket.clone()
    }

    /// Attached send strategy.
    pub fn send_strategy(&self) -> Option<&Arc<MulticastSendStrategy>> {
        self.core().send_strategy.as_ref()
    }

    /// Attached receive strategy.
    pub fn receive_strategy(&self) -> Option<&Arc<MulticastReceiveStrategy>> {
        self.core().recv_strategy.as_ref()
    }
}

impl std::fmt::Debug for MulticastDataLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MulticastDataLink")
            .field("reliable", &self.is_reliable())
            .field("local_peer", &self.local_peer())
            .field("remote_peer", &self.remote_peer())
            .field("active", &self.is_active())
            .field("group", &self.group_address())
            .field("acked", &self.acked())
            .finish()
    }
}
