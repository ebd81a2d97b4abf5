use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::cluster::topology::Host;

/// Receives host lifecycle notifications from a [`HostDirectory`](super::HostDirectory).
///
/// Notifications are delivered synchronously, in directory mutation order, from the task
/// mutating the directory. Implementations should return quickly; a slow listener delays
/// processing of subsequent server events.
#[cfg_attr(test, automock)]
pub trait HostListener: Send + Sync {
    /// A host became known.
    fn host_found(&self, host: &Arc<Host>);

    fn host_up(&self, host: &Arc<Host>);

    fn host_down(&self, host: &Arc<Host>);

    /// A host is no longer part of the cluster, or its previous identity is gone.
    fn host_lost(&self, host: &Arc<Host>);
}
