// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Uniform transport contract.
//!
//! The association layer drives every transport through [`Transport`]; the
//! discovery layer supplies [`AssociationData`]; [`TransportInterface`] is the
//! association manager a transport calls back when a peer must be dropped.

use std::sync::Arc;

use crate::config::TransportConfiguration;
use crate::error::Result;
use crate::guid::Guid;
use crate::transport::descriptor::ConnectionDescriptor;

/// Remote side of an association, as learned through discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssociationData {
    /// Remote publication or subscription.
    pub remote_id: Guid,
    /// Connection descriptor published by the remote participant.
    pub remote_data: ConnectionDescriptor,
}

impl AssociationData {
    /// Bundle a remote endpoint with its descriptor.
    pub fn new(remote_id: Guid, remote_data: ConnectionDescriptor) -> Self {
        Self {
            remote_id,
            remote_data,
        }
    }
}

/// Association manager collaborator.
pub trait TransportInterface: Send + Sync {
    /// GUID of the local participant owning the associations.
    fn participant_id(&self) -> Guid;

    /// Tear down every association with the participant of `remote_id`.
    fn disassociate_participant(&self, remote_id: Guid);
}

/// Transport contract seen by the association layer.
pub trait Transport: Send + Sync {
    /// Datalink type handed out to associations.
    type Link;

    /// Install the configuration; only this transport's kind is accepted.
    fn configure(&self, config: Arc<dyn TransportConfiguration>) -> Result<()>;

    /// Datalink serving `local_id` <-> `remote`, created on first use.
    ///
    /// `active` is true when this side initiates address resolution.
    fn find_or_create(
        &self,
        local_id: Guid,
        remote: &AssociationData,
        active: bool,
    ) -> Result<Arc<Self::Link>>;

    /// Descriptor to publish through discovery.
    fn outbound_connection_descriptor(&self) -> Result<ConnectionDescriptor>;

    /// Whether the association `local_id` <-> `remote_id` is acknowledged.
    fn acked(&self, local_id: Guid, remote_id: Guid) -> bool;

    /// Forget acknowledgment state of an association.
    fn remove_ack(&self, local_id: Guid, remote_id: Guid);

    /// Drop the registry's reference to `link`.
    fn release(&self, link: &Arc<Self::Link>);

    /// `link` can no longer guarantee delivery to its peer.
    fn on_reliability_lost(&self, link: &Arc<Self::Link>, interface: &dyn TransportInterface);

    /// Shut down every datalink and release the configuration.
    fn shutdown(&self);
}
