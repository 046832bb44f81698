// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Send and receive strategies: the data path of a datalink.
//!
//! Both strategies share the link's group socket. They count traffic and
//! refuse work once the owning link has been shut down.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::MulticastDataLink;
use crate::transport::socket::GroupSocket;

fn stopped_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "strategy stopped")
}

fn unconfigured_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "datalink not configured")
}

/// Sends datagrams to the link's multicast group.
pub struct MulticastSendStrategy {
    socket: Arc<dyn GroupSocket>,
    stopped: AtomicBool,
    messages_sent: AtomicU64,
    bytes_sent: AtomicU64,
}

impl MulticastSendStrategy {
    /// Strategy bound to `link`'s socket. The link must be configured.
    pub fn new(link: &MulticastDataLink) -> io::Result<Self> {
        let socket = link.socket().ok_or_else(unconfigured_error)?;
        Ok(Self {
            socket,
            stopped: AtomicBool::new(false),
            messages_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
        })
    }

    /// Send one datagram to the joined group.
    pub fn send(&self, payload: &[u8]) -> io::Result<usize> {
        if self.is_stopped() {
            return Err(stopped_error());
        }
        let sent = self.socket.send(payload)?;
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(sent as u64, Ordering::Relaxed);
        Ok(sent)
    }

    /// Stop sending. Idempotent.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether the strategy has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Datagrams sent.
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Bytes sent.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }
}

/// Receives datagrams from the link's multicast group.
pub struct MulticastReceiveStrategy {
    socket: Arc<dyn GroupSocket>,
    stopped: AtomicBool,
    messages_received: AtomicU64,
    bytes_received: AtomicU64,
}

impl MulticastReceiveStrategy {
    /// Strategy bound to `link`'s socket. The link must be configured.
    pub fn new(link: &MulticastDataLink) -> io::Result<Self> {
        let socket = link.socket().ok_or_else(unconfigured_error)?;
        Ok(Self {
            socket,
            stopped: AtomicBool::new(false),
            messages_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
        })
    }

    /// Receive one datagram into `buf`.
    pub fn receive(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        if self.is_stopped() {
            return Err(stopped_error());
        }
        let (len, from) = self.socket.recv(buf)?;
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(len as u64, Ordering::Relaxed);
        Ok((len, from))
    }

    /// Stop receiving. Idempotent.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether the strategy has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Datagrams received.
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Bytes received.
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }
}
