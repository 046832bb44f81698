// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reliable multicast datalink handshake.
//!
//! The active side announces itself with SYN until the passive side answers
//! with SYNACK. The link is acknowledged once the handshake completes; if it
//! does not complete within `syn_timeout` the transport treats reliability as
//! lost for the remote participant.
//!
//! # Control Message
//!
//! ```text
//! +--------+------------------+------------------+
//! | tag 4B | sender prefix 12 | target prefix 12 |
//! +--------+------------------+------------------+
//! ```

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::LinkCore;
use crate::guid::GuidPrefix;

/// SYN control tag.
pub const SYN_TAG: [u8; 4] = *b"MSYN";

/// SYNACK control tag.
pub const SYNACK_TAG: [u8; 4] = *b"MSAK";

/// Size of a control message.
pub const CONTROL_MESSAGE_SIZE: usize = 4 + 12 + 12;

#[derive(Debug, Default)]
struct Handshake {
    started: Option<Instant>,
    interval: Duration,
    syn_sent: u32,
}

/// Reliable multicast datalink.
pub struct ReliableMulticast {
    core: LinkCore,
    acked: AtomicBool,
    loss_reported: AtomicBool,
    handshake: Mutex<Handshake>,
}

impl ReliableMulticast {
    pub(super) fn new(core: LinkCore) -> Self {
        Self {
            core,
            acked: AtomicBool::new(false),
            loss_reported: AtomicBool::new(false),
            handshake: Mutex::new(Handshake::default()),
        }
    }

    pub(super) fn core(&self) -> &LinkCore {
        &self.core
    }

    pub(super) fn core_mut(&mut self) -> &mut LinkCore {
        &mut self.core
    }

    pub(super) fn start_handshake(&self) {
        let interval = self
            .core
            .config
            .as_ref()
            .map(|config| config.syn_interval)
            .unwrap_or_default();
        let mut handshake = self.handshake.lock();
        handshake.started = Some(Instant::now());
        handshake.interval = interval;
        handshake.syn_sent = 0;
    }

    /// True once the handshake completed.
    pub fn acked(&self) -> bool {
        self.acked.load(Ordering::Acquire)
    }

    /// Record the peer's handshake answer.
    pub fn on_synack(&self) {
        if !self.acked.swap(true, Ordering::AcqRel) {
            log::debug!(
                "[MCAST] reliable link {} -> {} acknowledged",
                self.core.local_peer,
                self.core.remote_peer
            );
        }
    }

    /// Number of SYNs sent so far.
    pub fn syn_sent(&self) -> u32 {
        self.handshake.lock().syn_sent
    }

    /// Delay before the next SYN, growing by `syn_backoff` up to `syn_timeout`.
    ///
    /// None once acknowledged.
    pub fn next_syn_interval(&self) -> Option<Duration> {
        if self.acked() {
            return None;
        }
        let (backoff, timeout) = match self.core.config.as_ref() {
            Some(config) => (config.syn_backoff, config.syn_timeout),
            None => return None,
        };
        let mut handshake = self.handshake.lock();
        let current = handshake.interval;
        let next = Duration::try_from_secs_f64(current.as_secs_f64() * backoff)
            .unwrap_or(timeout)
            .min(timeout);
        handshake.interval = next;
        Some(current)
    }

    /// Send one SYN (active side only).
    ///
    /// Returns the delay before the next attempt, or None when no SYN is due.
    pub fn send_syn(&self) -> io::Result<Option<Duration>> {
        if !self.core.active || self.acked() {
            return Ok(None);
        }
        let strategy = self.core.send_strategy.as_ref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "send strategy not attached")
        })?;
        let message = control_message(SYN_TAG, self.core.local_peer, self.core.remote_peer);
        strategy.send(&message)?;
        self.handshake.lock().syn_sent += 1;
        Ok(self.next_syn_interval())
    }

    /// Process a received datagram.
    ///
    /// Returns true if it was a handshake message for this link. A SYN from
    /// the remote peer acknowledges the passive side and is answered with
    /// SYNACK; a SYNACK acknowledges the active side.
    pub fn handle_control(&self, datagram: &[u8]) -> io::Result<bool> {
        let Some((tag, sender, target)) = parse_control(datagram) else {
            return Ok(false);
        };
        if sender != self.core.remote_peer || target != self.core.local_peer {
            return Ok(false);
        }
        match tag {
            SYN_TAG => {
                self.on_synack();
                if let Some(strategy) = &self.core.send_strategy {
                    let reply =
                        control_message(SYNACK_TAG, self.core.local_peer, self.core.remote_peer);
                    strategy.send(&reply)?;
                }
                Ok(true)
            }
            SYNACK_TAG => {
                self.on_synack();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// True when `syn_timeout` elapsed without acknowledgment.
    pub fn handshake_expired(&self, now: Instant) -> bool {
        if self.acked() {
            return false;
        }
        let Some(timeout) = self.core.config.as_ref().map(|config| config.syn_timeout) else {
            return false;
        };
        match self.handshake.lock().started {
            Some(started) => now.saturating_duration_since(started) >= timeout,
            None => false,
        }
    }

    /// Record that loss of this link has been reported.
    ///
    /// Returns true only for the first call.
    pub fn mark_loss_reported(&self) -> bool {
        !self.loss_reported.swap(true, Ordering::AcqRel)
    }

    /// Whether loss of this link has been reported.
    pub fn loss_reported(&self) -> bool {
        self.loss_reported.load(Ordering::Acquire)
    }
}

fn control_message(
    tag: [u8; 4],
    sender: GuidPrefix,
    target: GuidPrefix,
) -> [u8; CONTROL_MESSAGE_SIZE] {
    let mut buf = [0u8; CONTROL_MESSAGE_SIZE];
    buf[0..4].copy_from_slice(&tag);
    buf[4..16].copy_from_slice(sender.as_bytes());
    buf[16..28].copy_from_slice(target.as_bytes());
    buf
}

fn parse_control(buf: &[u8]) -> Option<([u8; 4], GuidPrefix, GuidPrefix)> {
    if buf.len() != CONTROL_MESSAGE_SIZE {
        return None;
    }
    let mut tag = [0u8; 4];
    let mut sender = [0u8; 12];
    let mut target = [0u8; 12];
    tag.copy_from_slice(&buf[0..4]);
    sender.copy_from_slice(&buf[4..16]);
    target.copy_from_slice(&buf[16..28]);
    Some((tag, GuidPrefix(sender), GuidPrefix(target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MulticastConfig;
    use crate::datalink::tests::configured_link;
    use std::net::SocketAddr;

    fn reliable_config() -> MulticastConfig {
        MulticastConfig::reliable("239.1.1.1:4000".parse().unwrap()).with_syn(
            Duration::from_millis(100),
            2.0,
            Duration::from_millis(500),
        )
    }

    fn group() -> SocketAddr {
        "239.1.1.1:4000".parse().unwrap()
    }

    #[test]
    fn test_active_sends_syn_until_synack() {
        let (mut link, socket) = configured_link(reliable_config(), true);
        link.join(group()).unwrap();
        let reliable = link.as_reliable().unwrap();

        assert!(!link.acked());
        assert_eq!(reliable.send_syn().unwrap(), Some(Duration::from_millis(100)));
        assert_eq!(reliable.send_syn().unwrap(), Some(Duration::from_millis(200)));
        assert_eq!(reliable.syn_sent(), 2);

        let sent = socket.sent.lock().clone();
        assert_eq!(&sent[0][0..4], &SYN_TAG);

        let synack = control_message(SYNACK_TAG, GuidPrefix([2; 12]), GuidPrefix([1; 12]));
        assert!(reliable.handle_control(&synack).unwrap());
        assert!(link.acked());
        assert_eq!(reliable.send_syn().unwrap(), None);
    }

    #[test]
    fn test_backoff_capped_at_timeout() {
        let (mut link, _socket) = configured_link(reliable_config(), true);
        link.join(group()).unwrap();
        let reliable = link.as_reliable().unwrap();

        let intervals: Vec<_> = (0..5).filter_map(|_| reliable.next_syn_interval()).collect();
        assert_eq!(
            intervals,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(500),
                Duration::from_millis(500),
            ]
        );
    }

    #[test]
    fn test_passive_answers_syn() {
        let (mut link, socket) = configured_link(reliable_config(), false);
        link.join(group()).unwrap();
        let reliable = link.as_reliable().unwrap();

        // passive side never initiates
        assert_eq!(reliable.send_syn().unwrap(), None);

        let syn = control_message(SYN_TAG, GuidPrefix([2; 12]), GuidPrefix([1; 12]));
        assert!(reliable.handle_control(&syn).unwrap());
        assert!(link.acked());

        let sent = socket.sent.lock().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(&sent[0][0..4], &SYNACK_TAG);
    }

    #[test]
    fn test_ignores_foreign_messages() {
        let (mut link, _socket) = configured_link(reliable_config(), false);
        link.join(group()).unwrap();
        let reliable = link.as_reliable().unwrap();

        let other = control_message(SYN_TAG, GuidPrefix([9; 12]), GuidPrefix([1; 12]));
        assert!(!reliable.handle_control(&other).unwrap());
        assert!(!reliable.handle_control(b"not a control message").unwrap());
        assert!(!link.acked());
    }

    #[test]
    fn test_handshake_expiry() {
        let (mut link, _socket) = configured_link(reliable_config(), true);
        let reliable_before_join = link.as_reliable().unwrap();
        assert!(!reliable_before_join.handshake_expired(Instant::now()));

        link.join(group()).unwrap();
        let reliable = link.as_reliable().unwrap();
        let now = Instant::now();
        assert!(!reliable.handshake_expired(now));
        assert!(reliable.handshake_expired(now + Duration::from_secs(1)));

        reliable.on_synack();
        assert!(!reliable.handshake_expired(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_loss_reported_once() {
        let (link, _socket) = configured_link(reliable_config(), true);
        let reliable = link.as_reliable().unwrap();

        assert!(!reliable.loss_reported());
        assert!(reliable.mark_loss_reported());
        assert!(!reliable.mark_loss_reported());
        assert!(reliable.loss_reported());
    }
}
