// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::cast_possible_truncation)] // Test parameters

//! Concurrent datalink creation
//!
//! Threads racing on the same remote participant must all end up with the
//! single registered datalink; losers are shut down.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use hdds_multicast::transport::{GroupSocket, SocketFactory};
use hdds_multicast::{
    AssociationData, ConnectionDescriptor, Guid, GuidPrefix, MulticastConfig, MulticastTransport,
    ReactorTask, Transport,
};
use parking_lot::Mutex;

struct GatedSocket {
    gate: Option<Arc<Barrier>>,
    left: AtomicBool,
}

impl GroupSocket for GatedSocket {
    fn join(&self, _group: SocketAddr) -> io::Result<()> {
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        Ok(())
    }

    fn group(&self) -> Option<SocketAddr> {
        None
    }

    fn send(&self, payload: &[u8]) -> io::Result<usize> {
        Ok(payload.len())
    }

    fn recv(&self, _buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        Err(io::ErrorKind::WouldBlock.into())
    }

    fn leave(&self) -> io::Result<()> {
        self.left.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Joins block until `parties` joins are in flight.
struct GatedSockets {
    gate: Option<Arc<Barrier>>,
    opened: Mutex<Vec<Arc<GatedSocket>>>,
}

impl GatedSockets {
    fn new(parties: Option<usize>) -> Self {
        Self {
            gate: parties.map(|n| Arc::new(Barrier::new(n))),
            opened: Mutex::new(Vec::new()),
        }
    }
}

impl SocketFactory for GatedSockets {
    fn open(&self, _config: &MulticastConfig) -> io::Result<Arc<dyn GroupSocket>> {
        let socket = Arc::new(GatedSocket {
            gate: self.gate.clone(),
            left: AtomicBool::new(false),
        });
        self.opened.lock().push(Arc::clone(&socket));
        Ok(socket)
    }
}

fn transport(sockets: Arc<GatedSockets>) -> Arc<MulticastTransport> {
    let transport = MulticastTransport::with_reactor(ReactorTask::with_sockets("race", sockets));
    transport
        .configure(Arc::new(MulticastConfig::best_effort(
            "239.1.1.1:4000".parse().unwrap(),
        )))
        .unwrap();
    Arc::new(transport)
}

fn association(participant: u8, entity: u8) -> AssociationData {
    AssociationData::new(
        Guid::new(GuidPrefix([participant; 12]), [0, 0, entity, 0x02]),
        ConnectionDescriptor::new(0, Vec::new()),
    )
}

#[test]
fn test_race_loser_is_discarded() {
    let sockets = Arc::new(GatedSockets::new(Some(2)));
    let transport = transport(sockets.clone());

    // Both threads pass the lookup and join before either registers
    let handles: Vec<_> = (0..2u8)
        .map(|i| {
            let transport = Arc::clone(&transport);
            thread::spawn(move || {
                let local = Guid::new(GuidPrefix([1; 12]), [0, 0, i, 0x07]);
                transport
                    .find_or_create(local, &association(2, i), false)
                    .unwrap()
            })
        })
        .collect();
    let links: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(Arc::ptr_eq(&links[0], &links[1]));
    assert!(!links[0].is_shut_down());
    assert_eq!(transport.link_count(), 1);

    let opened = sockets.opened.lock();
    assert_eq!(opened.len(), 2);
    assert_eq!(
        opened
            .iter()
            .filter(|socket| socket.left.load(Ordering::SeqCst))
            .count(),
        1
    );
    assert_eq!(transport.metrics_snapshot().race_losers, 1);
}

#[test]
fn test_many_threads_many_participants() {
    const THREADS: usize = 8;
    const PARTICIPANTS: u8 = 4;

    let sockets = Arc::new(GatedSockets::new(None));
    let transport = transport(sockets);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let transport = Arc::clone(&transport);
            thread::spawn(move || {
                let mut links = Vec::new();
                for round in 0..50u8 {
                    let participant = 2 + fastrand::u8(0..PARTICIPANTS);
                    let local = Guid::new(GuidPrefix([1; 12]), [0, 0, t as u8, 0x07]);
                    let link = transport
                        .find_or_create(local, &association(participant, round), false)
                        .unwrap();
                    links.push((participant, link));
                }
                links
            })
        })
        .collect();

    let mut seen = Vec::new();
    for handle in handles {
        seen.extend(handle.join().unwrap());
    }

    // Every handle for a participant is the registered link
    for (participant, link) in &seen {
        let registered = transport
            .datalink_for(&GuidPrefix([*participant; 12]))
            .unwrap();
        assert!(Arc::ptr_eq(link, &registered));
        assert!(!link.is_shut_down());
    }
    assert!(transport.link_count() <= PARTICIPANTS as usize);
}
