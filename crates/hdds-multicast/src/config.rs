// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Multicast transport configuration.
//!
//! - [`MulticastConfig`] - settings shared by every datalink of one transport
//! - [`TransportConfiguration`] - type-erased configuration accepted by `configure`
//!
//! # Example
//!
//! ```
//! use hdds_multicast::MulticastConfig;
//!
//! let config = MulticastConfig::best_effort("239.1.1.1:4000".parse().unwrap())
//!     .with_ttl(16);
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Environment Variables
//!
//! `HDDS_MCAST_GROUP=<ip:port>` - passive group address
//! `HDDS_MCAST_RELIABLE=<0|1>` - reliable or best-effort datalinks
//! `HDDS_MULTICAST_IF=<ip>` - interface used to join groups
//! `HDDS_MULTICAST_TTL=<1-255>` - multicast hop limit

use std::any::Any;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default IPv4 group (link-local scope).
pub const DEFAULT_IPV4_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 128);

/// Default IPv6 group (interface-local scope).
pub const DEFAULT_IPV6_GROUP: Ipv6Addr = Ipv6Addr::new(0xff01, 0, 0, 0, 0, 0, 0, 0x80);

/// Base port for default groups; the domain ID is added to it.
pub const DEFAULT_PORT_OFFSET: u16 = 49152;

/// Default multicast TTL (link-local only).
pub const DEFAULT_MULTICAST_TTL: u32 = 1;

/// Transport kind name reported by [`MulticastConfig`].
pub const MULTICAST_TRANSPORT_TYPE: &str = "multicast";

/// Configuration handed to a transport's `configure`.
///
/// Each transport kind has its own concrete type; a transport accepts only its
/// own and rejects the rest.
pub trait TransportConfiguration: Any + Send + Sync + fmt::Debug {
    /// Transport kind name (for diagnostics).
    fn transport_type(&self) -> &'static str;

    /// Type-erased handle used to recover the concrete type.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Multicast transport configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MulticastConfig {
    /// Reliable datalinks when true, best-effort otherwise
    pub reliable: bool,

    /// Prefer IPv6 for the default group address
    pub default_to_ipv6: bool,

    /// Base port of the default group address
    pub port_offset: u16,

    /// Group joined by passive peers and advertised through discovery
    pub group_address: SocketAddr,

    /// Interface used to join groups (None = first non-loopback interface)
    pub interface: Option<IpAddr>,

    /// Multicast TTL / hop limit
    pub ttl: u32,

    /// SO_RCVBUF for group sockets (0 = OS default)
    pub rcv_buffer_size: usize,

    // === Reliable handshake ===
    /// Initial delay between SYN retries
    pub syn_interval: Duration,

    /// Multiplier applied to `syn_interval` after each retry
    pub syn_backoff: f64,

    /// Handshake deadline before reliability is declared lost
    pub syn_timeout: Duration,
}

impl Default for MulticastConfig {
    fn default() -> Self {
        Self {
            reliable: true,
            default_to_ipv6: false,
            port_offset: DEFAULT_PORT_OFFSET,
            group_address: Self::default_group_address(0, false, DEFAULT_PORT_OFFSET),
            interface: None,
            ttl: DEFAULT_MULTICAST_TTL,
            rcv_buffer_size: 0,
            syn_interval: Duration::from_millis(250),
            syn_backoff: 2.0,
            syn_timeout: Duration::from_secs(30),
        }
    }
}

impl MulticastConfig {
    /// Reliable configuration for `group`.
    pub fn reliable(group_address: SocketAddr) -> Self {
        Self {
            reliable: true,
            group_address,
            ..Default::default()
        }
    }

    /// Best-effort configuration for `group`.
    pub fn best_effort(group_address: SocketAddr) -> Self {
        Self {
            reliable: false,
            group_address,
            ..Default::default()
        }
    }

    /// Default configuration for a DDS domain.
    ///
    /// The group port is `port_offset + domain_id`.
    pub fn for_domain(domain_id: u16, default_to_ipv6: bool) -> Self {
        Self {
            default_to_ipv6,
            group_address: Self::default_group_address(
                domain_id,
                default_to_ipv6,
                DEFAULT_PORT_OFFSET,
            ),
            ..Default::default()
        }
    }

    /// Default group address for a domain.
    pub fn default_group_address(domain_id: u16, ipv6: bool, port_offset: u16) -> SocketAddr {
        let port = port_offset.saturating_add(domain_id);
        if ipv6 {
            SocketAddr::new(IpAddr::V6(DEFAULT_IPV6_GROUP), port)
        } else {
            SocketAddr::new(IpAddr::V4(DEFAULT_IPV4_GROUP), port)
        }
    }

    /// Builder: set reliability mode
    pub fn with_reliable(mut self, reliable: bool) -> Self {
        self.reliable = reliable;
        self
    }

    /// Builder: set group address
    pub fn with_group(mut self, group_address: SocketAddr) -> Self {
        self.group_address = group_address;
        self
    }

    /// Builder: set join interface
    pub fn with_interface(mut self, interface: IpAddr) -> Self {
        self.interface = Some(interface);
        self
    }

    /// Builder: set TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Builder: set receive buffer size
    pub fn with_rcv_buffer_size(mut self, size: usize) -> Self {
        self.rcv_buffer_size = size;
        self
    }

    /// Builder: set SYN handshake timing
    pub fn with_syn(mut self, interval: Duration, backoff: f64, timeout: Duration) -> Self {
        self.syn_interval = interval;
        self.syn_backoff = backoff;
        self.syn_timeout = timeout;
        self
    }

    /// Apply `HDDS_*` environment overrides.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; unparsable values are ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("HDDS_MCAST_GROUP") {
            match value.trim().parse::<SocketAddr>() {
                Ok(addr) => self.group_address = addr,
                Err(_) => log::warn!("[MCAST] ignoring invalid HDDS_MCAST_GROUP='{}'", value),
            }
        }
        if let Some(value) = lookup("HDDS_MCAST_RELIABLE") {
            match value.trim() {
                "1" | "true" => self.reliable = true,
                "0" | "false" => self.reliable = false,
                other => log::warn!("[MCAST] ignoring invalid HDDS_MCAST_RELIABLE='{}'", other),
            }
        }
        if let Some(value) = lookup("HDDS_MULTICAST_IF") {
            match value.trim().parse::<IpAddr>() {
                Ok(addr) => self.interface = Some(addr),
                Err(_) => log::warn!("[MCAST] ignoring invalid HDDS_MULTICAST_IF='{}'", value),
            }
        }
        if let Some(value) = lookup("HDDS_MULTICAST_TTL") {
            match value.trim().parse::<u32>() {
                Ok(ttl) if (1..=255).contains(&ttl) => self.ttl = ttl,
                _ => log::warn!("[MCAST] ignoring invalid HDDS_MULTICAST_TTL='{}'", value),
            }
        }
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.group_address.ip().is_multicast() {
            return Err(Error::InvalidConfig(format!(
                "group address {} is not multicast",
                self.group_address
            )));
        }
        if self.group_address.port() == 0 {
            return Err(Error::InvalidConfig("group port must be non-zero".into()));
        }
        if self.ttl == 0 || self.ttl > 255 {
            return Err(Error::InvalidConfig(format!(
                "ttl {} outside 1..=255",
                self.ttl
            )));
        }
        if !(self.syn_backoff.is_finite() && self.syn_backoff >= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "syn_backoff {} must be >= 1.0",
                self.syn_backoff
            )));
        }
        if self.syn_interval.is_zero() || self.syn_interval > self.syn_timeout {
            return Err(Error::InvalidConfig(
                "syn_interval must be non-zero and not exceed syn_timeout".into(),
            ));
        }
        Ok(())
    }
}

impl TransportConfiguration for MulticastConfig {
    fn transport_type(&self) -> &'static str {
        MULTICAST_TRANSPORT_TYPE
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = MulticastConfig::default();
        assert!(config.reliable);
        assert_eq!(config.group_address, "224.0.0.128:49152".parse().unwrap());
        assert_eq!(config.ttl, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_group_per_domain() {
        let v4 = MulticastConfig::for_domain(7, false);
        assert_eq!(v4.group_address, "224.0.0.128:49159".parse().unwrap());

        let v6 = MulticastConfig::for_domain(2, true);
        assert_eq!(v6.group_address, "[ff01::80]:49154".parse().unwrap());
        assert!(v6.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unicast_group() {
        let config = MulticastConfig::best_effort("10.0.0.1:4000".parse().unwrap());
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let group = "239.1.1.1:4000".parse().unwrap();
        assert!(MulticastConfig::reliable(group).with_ttl(0).validate().is_err());
        assert!(MulticastConfig::reliable("239.1.1.1:0".parse().unwrap())
            .validate()
            .is_err());
        assert!(MulticastConfig::reliable(group)
            .with_syn(Duration::from_secs(1), 0.5, Duration::from_secs(5))
            .validate()
            .is_err());
        assert!(MulticastConfig::reliable(group)
            .with_syn(Duration::from_secs(10), 2.0, Duration::from_secs(5))
            .validate()
            .is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("HDDS_MCAST_GROUP", "239.9.9.9:5000"),
            ("HDDS_MCAST_RELIABLE", "0"),
            ("HDDS_MULTICAST_IF", "192.168.1.10"),
            ("HDDS_MULTICAST_TTL", "300"),
        ]
        .into_iter()
        .collect();

        let config = MulticastConfig::default()
            .with_env_overrides(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.group_address, "239.9.9.9:5000".parse().unwrap());
        assert!(!config.reliable);
        assert_eq!(config.interface, Some("192.168.1.10".parse().unwrap()));
        // out of range, kept default
        assert_eq!(config.ttl, DEFAULT_MULTICAST_TTL);
    }

    #[test]
    fn test_into_any_downcasts() {
        let config: Arc<dyn TransportConfiguration> = Arc::new(MulticastConfig::default());
        assert_eq!(config.transport_type(), "multicast");
        assert!(config.into_any().downcast::<MulticastConfig>().is_ok());
    }
}
