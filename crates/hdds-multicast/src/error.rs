// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Errors returned by the multicast transport.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use crate::transport::descriptor::DecodeError;

/// Errors returned by multicast transport operations.
///
/// Every variant aborts only the operation that returned it. A failed
/// association setup never leaves anything behind in the datalink registry.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration of another transport kind was passed to `configure`.
    #[error("Invalid configuration: expected multicast, got {0}")]
    InvalidConfiguration(&'static str),

    /// Multicast configuration failed validation.
    #[error("Invalid multicast configuration: {0}")]
    InvalidConfig(String),

    /// Operation requires a configured transport.
    #[error("Transport not configured")]
    NotConfigured,

    /// Joining the resolved multicast group failed.
    #[error("Failed to join multicast group {group}: {source}")]
    GroupJoinFailed {
        /// Group the link tried to join.
        group: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// Connection descriptor could not be decoded.
    #[error("Malformed connection descriptor: {0}")]
    DescriptorDecodeFailed(#[from] DecodeError),

    /// Socket setup or I/O failure outside of the group join.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Convenient alias for multicast transport results.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_join_failed_names_group() {
        let err = Error::GroupJoinFailed {
            group: "239.1.1.1:4000".parse().unwrap(),
            source: io::Error::new(io::ErrorKind::AddrNotAvailable, "no route"),
        };
        let msg = err.to_string();
        assert!(msg.contains("239.1.1.1:4000"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_decode_error_converts() {
        let err: Error = DecodeError::Truncated { len: 3 }.into();
        assert!(matches!(err, Error::DescriptorDecodeFailed(_)));
    }
}
