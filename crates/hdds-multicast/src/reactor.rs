// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Execution context handed to datalinks at configure time.

use std::fmt;
use std::io;
use std::sync::Arc;

use crate::config::MulticastConfig;
use crate::transport::socket::{GroupSocket, SocketFactory, UdpSocketFactory};

/// I/O context shared by every datalink of a transport.
///
/// Datalinks open their group socket through it; the transport never touches
/// sockets directly.
#[derive(Clone)]
pub struct ReactorTask {
    name: String,
    sockets: Arc<dyn SocketFactory>,
}

impl ReactorTask {
    /// Context opening real UDP sockets.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_sockets(name, Arc::new(UdpSocketFactory))
    }

    /// Context opening sockets through `sockets`.
    pub fn with_sockets(name: impl Into<String>, sockets: Arc<dyn SocketFactory>) -> Self {
        Self {
            name: name.into(),
            sockets,
        }
    }

    /// Context name (diagnostics).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open an unjoined group socket.
    pub fn open_socket(&self, config: &MulticastConfig) -> io::Result<Arc<dyn GroupSocket>> {
        self.sockets.open(config)
    }
}

impl fmt::Debug for ReactorTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactorTask")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
