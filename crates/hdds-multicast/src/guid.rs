// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPS GUID and participant identity.
//!
//! A [`Guid`] names one publication or subscription endpoint. Its 12-byte
//! prefix is the [`GuidPrefix`] of the owning participant, which is the key
//! the multicast transport uses to share one datalink between all endpoints
//! of the same remote participant.

use std::fmt;

/// Entity ID of a participant's own builtin entity (RTPS `ENTITYID_PARTICIPANT`).
pub const ENTITYID_PARTICIPANT: [u8; 4] = [0x00, 0x00, 0x01, 0xC1];

/// 12-byte GUID prefix identifying a participant.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
pub struct GuidPrefix(pub [u8; 12]);

impl GuidPrefix {
    /// Wrap raw prefix bytes.
    pub const fn new(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Raw prefix bytes.
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

impl fmt::Display for GuidPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for GuidPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GuidPrefix({})", self)
    }
}

impl From<[u8; 12]> for GuidPrefix {
    fn from(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }
}

/// RTPS GUID (Globally Unique Identifier)
///
/// 16-byte identifier following DDS-RTPS v2.3 spec.
///
/// # Structure
/// - Prefix: 12 bytes (participant)
/// - Entity ID: 4 bytes (entity within participant)
///
/// # Display Format
/// Hex with dots: "01.0f.ac.10.00.00.00.00.00.00.00.01.00.00.01.c1"
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Guid {
    pub prefix: GuidPrefix,
    pub entity_id: [u8; 4],
}

impl Guid {
    /// Create GUID from separate prefix and entity ID
    pub fn new(prefix: GuidPrefix, entity_id: [u8; 4]) -> Self {
        Self { prefix, entity_id }
    }

    /// Create GUID from raw bytes (16 bytes total)
    ///
    /// # Examples
    /// ```
    /// use hdds_multicast::Guid;
    ///
    /// let bytes = [1, 15, 172, 16, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 193];
    /// let guid = Guid::from_bytes(bytes);
    /// assert_eq!(guid.entity_id, [0, 0, 1, 193]);
    /// ```
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut prefix = [0u8; 12];
        let mut entity_id = [0u8; 4];
        prefix.copy_from_slice(&bytes[0..12]);
        entity_id.copy_from_slice(&bytes[12..16]);
        Self {
            prefix: GuidPrefix(prefix),
            entity_id,
        }
    }

    /// Convert GUID to 16-byte array
    pub fn as_bytes(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..12].copy_from_slice(&self.prefix.0);
        bytes[12..16].copy_from_slice(&self.entity_id);
        bytes
    }

    /// Participant that owns this entity.
    ///
    /// Pure projection onto the 12-byte prefix: every entity of one participant
    /// maps to the same value, and the mapping never changes.
    pub fn participant_id(&self) -> GuidPrefix {
        self.prefix
    }

    /// Same entity-local bits, owned by another participant.
    pub fn with_participant(&self, prefix: GuidPrefix) -> Self {
        Self {
            prefix,
            entity_id: self.entity_id,
        }
    }

    /// Participant GUID (`prefix` + `ENTITYID_PARTICIPANT`).
    pub fn participant(prefix: GuidPrefix) -> Self {
        Self::new(prefix, ENTITYID_PARTICIPANT)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix)?;
        for byte in &self.entity_id {
            write!(f, ".{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_display() {
        let guid = Guid::new(
            GuidPrefix([1, 15, 172, 16, 0, 0, 0, 0, 0, 0, 0, 1]),
            [0, 0, 1, 193],
        );
        assert_eq!(
            guid.to_string(),
            "01.0f.ac.10.00.00.00.00.00.00.00.01.00.00.01.c1"
        );
    }

    #[test]
    fn test_participant_id_ignores_entity_bits() {
        let prefix = GuidPrefix([7; 12]);
        let writer = Guid::new(prefix, [0, 0, 0x12, 0x02]);
        let reader = Guid::new(prefix, [0, 0, 0x13, 0x07]);

        assert_ne!(writer, reader);
        assert_eq!(writer.participant_id(), reader.participant_id());
        assert_eq!(writer.participant_id(), prefix);
    }

    #[test]
    fn test_participant_id_is_deterministic() {
        let bytes = [9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 1, 2, 0, 0, 1, 0xC1];
        let a = Guid::from_bytes(bytes);
        let b = Guid::from_bytes(bytes);
        assert_eq!(a.participant_id(), b.participant_id());
    }

    #[test]
    fn test_with_participant_keeps_entity_id() {
        let local = Guid::participant(GuidPrefix([1; 12]));
        let remote = local.with_participant(GuidPrefix([2; 12]));

        assert_eq!(remote.prefix, GuidPrefix([2; 12]));
        assert_eq!(remote.entity_id, ENTITYID_PARTICIPANT);
    }

    #[test]
    fn test_guid_as_bytes() {
        let orig = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        assert_eq!(Guid::from_bytes(orig).as_bytes(), orig);
    }
}
