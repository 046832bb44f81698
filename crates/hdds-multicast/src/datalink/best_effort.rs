// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::LinkCore;

/// Best-effort multicast datalink.
///
/// No handshake: the link counts as acknowledged as soon as it exists.
pub struct BestEffortMulticast {
    core: LinkCore,
}

impl BestEffortMulticast {
    pub(super) fn new(core: LinkCore) -> Self {
        Self { core }
    }

    pub(super) fn core(&self) -> &LinkCore {
        &self.core
    }

    pub(super) fn core_mut(&mut self) -> &mut LinkCore {
        &mut self.core
    }

    /// Always true.
    pub fn acked(&self) -> bool {
        true
    }
}
