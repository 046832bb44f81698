// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Multicast group sockets.
//!
//! Each datalink owns one [`GroupSocket`], opened through the
//! [`SocketFactory`] of its execution context. [`UdpSocketFactory`] is the
//! production implementation; anything honoring the trait contract can
//! replace it (in-memory fabrics, instrumented sockets).

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

use parking_lot::Mutex;
use socket2::{Domain, Protocol, Socket, Type};

use crate::config::MulticastConfig;

/// One multicast group membership.
pub trait GroupSocket: Send + Sync {
    /// Join `group`. Blocking; fails if the group cannot be joined.
    fn join(&self, group: SocketAddr) -> io::Result<()>;

    /// Joined group, if any.
    fn group(&self) -> Option<SocketAddr>;

    /// Send one datagram to the joined group.
    fn send(&self, payload: &[u8]) -> io::Result<usize>;

    /// Receive one datagram from the group.
    fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// Leave the group and release the socket.
    fn leave(&self) -> io::Result<()>;
}

/// Opens group sockets for datalinks.
pub trait SocketFactory: Send + Sync {
    /// Open an unjoined socket honoring `config` (interface, TTL, buffers).
    fn open(&self, config: &MulticastConfig) -> io::Result<Arc<dyn GroupSocket>>;
}

/// UDP socket factory backed by `socket2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpSocketFactory;

impl SocketFactory for UdpSocketFactory {
    fn open(&self, config: &MulticastConfig) -> io::Result<Arc<dyn GroupSocket>> {
        Ok(Arc::new(UdpGroupSocket::new(config)))
    }
}

#[derive(Default)]
struct Joined {
    socket: Option<Arc<UdpSocket>>,
    group: Option<SocketAddr>,
    iface_v4: Option<Ipv4Addr>,
}

/// UDP multicast socket.
///
/// The socket is created on `join`, once the group's address family is known.
pub struct UdpGroupSocket {
    interface: Option<IpAddr>,
    ttl: u32,
    rcv_buffer_size: usize,
    state: Mutex<Joined>,
}

impl UdpGroupSocket {
    /// Create an unjoined socket using `config`'s interface, TTL and buffers.
    pub fn new(config: &MulticastConfig) -> Self {
        Self {
            interface: config.interface,
            ttl: config.ttl,
            rcv_buffer_size: config.rcv_buffer_size,
            state: Mutex::new(Joined::default()),
        }
    }

    fn bind(&self, group: &SocketAddr) -> io::Result<Socket> {
        let domain = if group.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        if self.rcv_buffer_size > 0 {
            socket.set_recv_buffer_size(self.rcv_buffer_size)?;
        }
        let any: IpAddr = if group.is_ipv4() {
            Ipv4Addr::UNSPECIFIED.into()
        } else {
            Ipv6Addr::UNSPECIFIED.into()
        };
        socket.bind(&SocketAddr::new(any, group.port()).into())?;
        Ok(socket)
    }
}

impl GroupSocket for UdpGroupSocket {
    fn join(&self, group: SocketAddr) -> io::Result<()> {
        if !group.ip().is_multicast() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a multicast address", group.ip()),
            ));
        }

        let mut state = self.state.lock();
        if state.socket.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "socket already joined a group",
            ));
        }

        let socket = self.bind(&group)?;
        match group {
            SocketAddr::V4(v4) => {
                let iface = multicast_interface_v4(self.interface);
                socket.join_multicast_v4(v4.ip(), &iface)?;
                if !iface.is_unspecified() {
                    socket.set_multicast_if_v4(&iface)?;
                }
                socket.set_multicast_ttl_v4(self.ttl)?;
                socket.set_multicast_loop_v4(true)?;
                log::debug!("[MCAST] join_multicast_v4({}) on interface {}", v4, iface);
                state.iface_v4 = Some(iface);
            }
            SocketAddr::V6(v6) => {
                socket.join_multicast_v6(v6.ip(), v6.scope_id())?;
                socket.set_multicast_hops_v6(self.ttl)?;
                socket.set_multicast_loop_v6(true)?;
                log::debug!("[MCAST] join_multicast_v6({}) scope={}", v6, v6.scope_id());
            }
        }

        state.socket = Some(Arc::new(socket.into()));
        state.group = Some(group);
        Ok(())
    }

    fn group(&self) -> Option<SocketAddr> {
        self.state.lock().group
    }

    fn send(&self, payload: &[u8]) -> io::Result<usize> {
        let (socket, group) = {
            let state = self.state.lock();
            match (&state.socket, state.group) {
                (Some(socket), Some(group)) => (Arc::clone(socket), group),
                _ => return Err(not_joined()),
            }
        };
        socket.send_to(payload, group)
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let socket = self.state.lock().socket.clone().ok_or_else(not_joined)?;
        socket.recv_from(buf)
    }

    fn leave(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        let joined = std::mem::take(&mut *state);
        let (Some(socket), Some(group)) = (joined.socket, joined.group) else {
            return Ok(());
        };
        let result = match group {
            SocketAddr::V4(v4) => {
                let iface = joined.iface_v4.unwrap_or(Ipv4Addr::UNSPECIFIED);
                socket.leave_multicast_v4(v4.ip(), &iface)
            }
            SocketAddr::V6(v6) => socket.leave_multicast_v6(v6.ip(), v6.scope_id()),
        };
        log::debug!("[MCAST] left multicast group {}", group);
        result
    }
}

fn not_joined() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "multicast group not joined")
}

/// Interface used to join IPv4 groups.
///
/// Explicit configuration wins; otherwise the first non-loopback interface,
/// falling back to UNSPECIFIED (kernel default route).
pub fn multicast_interface_v4(configured: Option<IpAddr>) -> Ipv4Addr {
    if let Some(IpAddr::V4(addr)) = configured {
        return addr;
    }
    get_multicast_interfaces()
        .first()
        .copied()
        .unwrap_or(Ipv4Addr::UNSPECIFIED)
}

/// All non-loopback IPv4 interfaces suitable for multicast.
pub fn get_multicast_interfaces() -> Vec<Ipv4Addr> {
    let interfaces = match local_ip_address::list_afinet_netifas() {
        Ok(ifs) => ifs,
        Err(e) => {
            log::debug!("[MCAST] Failed to list network interfaces: {}", e);
            return Vec::new();
        }
    };

    interfaces
        .into_iter()
        .filter_map(|(_name, ip)| match ip {
            IpAddr::V4(v4) if !v4.is_loopback() => Some(v4),
            _ => None,
        })
        .collect()
}
