// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Datalink Lookup Benchmark
//!
//! Measures the association hot path:
//! - find_or_create hitting an already registered datalink
//! - descriptor encode/decode for the published group
//! - create + release cycle with in-memory sockets

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hdds_multicast::transport::{GroupSocket, SocketFactory};
use hdds_multicast::{
    AssociationData, ConnectionDescriptor, Guid, GuidPrefix, MulticastConfig, MulticastTransport,
    ReactorTask, Transport,
};

/// Socket that accepts every join without touching the network.
struct NullSocket;

impl GroupSocket for NullSocket {
    fn join(&self, _group: SocketAddr) -> io::Result<()> {
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
        Ok(())
    }
}

struct NullSockets;

impl SocketFactory for NullSockets {
    fn open(&self, _config: &MulticastConfig) -> io::Result<Arc<dyn GroupSocket>> {
        Ok(Arc::new(NullSocket))
    }
}

fn group() -> SocketAddr {
    "239.1.1.1:4000".parse().expect("group address")
}

fn transport() -> MulticastTransport {
    let transport =
        MulticastTransport::with_reactor(ReactorTask::with_sockets("bench", Arc::new(NullSockets)));
    transport
        .configure(Arc::new(MulticastConfig::best_effort(group())))
        .expect("configure");
    transport
}

fn association(participant: u8) -> AssociationData {
    AssociationData::new(
        Guid::new(GuidPrefix([participant; 12]), [0, 0, 1, 0x02]),
        ConnectionDescriptor::new(0, Vec::new()),
    )
}

/// Benchmark: lookup of an existing datalink
fn bench_find_existing(c: &mut Criterion) {
    let transport = transport();
    let local = Guid::participant(GuidPrefix([1; 12]));
    let remotes: Vec<_> = (2..66u8).map(association).collect();
    for remote in &remotes {
        transport
            .find_or_create(local, remote, false)
            .expect("create");
    }

    let mut i = 0usize;
    c.bench_function("find_or_create_existing_64", |b| {
        b.iter(|| {
            let remote = &remotes[i % remotes.len()];
            i += 1;
            black_box(transport.find_or_create(local, remote, false).expect("lookup"))
        })
    });
}

/// Benchmark: register a new datalink then release it
fn bench_create_release(c: &mut Criterion) {
    let transport = transport();
    let local = Guid::participant(GuidPrefix([1; 12]));
    let remote = association(2);

    c.bench_function("find_or_create_new_then_release", |b| {
        b.iter(|| {
            let link = transport
                .find_or_create(local, &remote, false)
                .expect("create");
            transport.release(&link);
        })
    });
}

/// Benchmark: descriptor round trip used during association
fn bench_descriptor(c: &mut Criterion) {
    let transport = transport();
    let descriptor = transport
        .outbound_connection_descriptor()
        .expect("descriptor");

    c.bench_function("inbound_connection_descriptor_v4", |b| {
        b.iter(|| {
            black_box(
                transport
                    .inbound_connection_descriptor(black_box(&descriptor))
                    .expect("decode"),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_find_existing,
    bench_create_release,
    bench_descriptor
);
criterion_main!(benches);
