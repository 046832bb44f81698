// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Multicast transport metrics.
//!
//! Counters for datalink lifecycle events:
//! - Links created, reused, released
//! - Group join failures and discarded concurrent losers
//! - Reliability-lost events and descriptor tag mismatches
//!
//! # Example
//!
//! ```
//! use hdds_multicast::TransportMetrics;
//!
//! let metrics = TransportMetrics::new();
//! metrics.record_link_created();
//! metrics.record_link_reused();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.links_created, 1);
//! assert_eq!(snapshot.active_links, 1);
//! ```

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for one multicast transport.
#[derive(Debug, Default)]
pub struct TransportMetrics {
    /// Links currently registered
    active_links: AtomicUsize,

    /// Links created and registered
    links_created: AtomicU64,

    /// Lookups satisfied by an already registered link
    links_reused: AtomicU64,

    /// Links removed through release or shutdown
    links_released: AtomicU64,

    /// Group joins that failed
    join_failures: AtomicU64,

    /// Joined links discarded because another thread registered first
    race_losers: AtomicU64,

    /// Reliability-lost notifications handled
    reliability_lost: AtomicU64,

    /// Inbound descriptors carrying another transport's tag
    tag_mismatches: AtomicU64,
}

impl TransportMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly registered link.
    pub fn record_link_created(&self) {
        self.links_created.fetch_add(1, Ordering::Relaxed);
        self.active_links.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup hit.
    pub fn record_link_reused(&self) {
        self.links_reused.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` links removed from the registry.
    pub fn record_links_released(&self, count: usize) {
        self.links_released.fetch_add(count as u64, Ordering::Relaxed);
        let _ = self
            .active_links
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(count))
            });
    }

    /// Record a failed group join.
    pub fn record_join_failure(&self) {
        self.join_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a link discarded after losing a registration race.
    pub fn record_race_loser(&self) {
        self.race_losers.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reliability-lost notification.
    pub fn record_reliability_lost(&self) {
        self.reliability_lost.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a descriptor tag mismatch.
    pub fn record_tag_mismatch(&self) {
        self.tag_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of all metrics.
    pub fn snapshot(&self) -> TransportMetricsSnapshot {
        TransportMetricsSnapshot {
            active_links: self.active_links.load(Ordering::Relaxed),
            links_created: self.links_created.load(Ordering::Relaxed),
            links_reused: self.links_reused.load(Ordering::Relaxed),
            links_released: self.links_released.load(Ordering::Relaxed),
            join_failures: self.join_failures.load(Ordering::Relaxed),
            race_losers: self.race_losers.load(Ordering::Relaxed),
            reliability_lost: self.reliability_lost.load(Ordering::Relaxed),
            tag_mismatches: self.tag_mismatches.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of multicast transport metrics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportMetricsSnapshot {
    /// Links currently registered
    pub active_links: usize,
    /// Links created and registered
    pub links_created: u64,
    /// Lookup hits
    pub links_reused: u64,
    /// Links removed
    pub links_released: u64,
    /// Failed group joins
    pub join_failures: u64,
    /// Discarded race losers
    pub race_losers: u64,
    /// Reliability-lost notifications
    pub reliability_lost: u64,
    /// Descriptor tag mismatches
    pub tag_mismatches: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_never_underflows() {
        let metrics = TransportMetrics::new();
        metrics.record_link_created();
        metrics.record_links_released(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.active_links, 0);
        assert_eq!(snapshot.links_released, 3);
    }
}
