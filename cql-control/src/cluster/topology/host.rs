use arc_swap::ArcSwap;
use atomic::Atomic;
use std::fmt::{Debug, Formatter};
use std::net::IpAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::cluster::topology::HostStatus;
use crate::cluster::HostInfo;

/// A single cluster member. Hosts are shared between the directory and its listeners; their
/// metadata and status are updated in place by the control connection.
pub struct Host {
    address: IpAddr,
    info: ArcSwap<HostInfo>,
    status: Atomic<HostStatus>,
}

impl Host {
    pub(crate) fn new(address: IpAddr, info: HostInfo) -> Self {
        Host {
            address,
            info: ArcSwap::from_pointee(info),
            status: Atomic::new(HostStatus::Unknown),
        }
    }

    #[inline]
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Returns a snapshot of host metadata.
    #[inline]
    pub fn info(&self) -> Arc<HostInfo> {
        self.info.load_full()
    }

    #[inline]
    pub fn status(&self) -> HostStatus {
        self.status.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_up(&self) -> bool {
        self.status() == HostStatus::Up
    }

    #[inline]
    pub fn is_down(&self) -> bool {
        self.status() == HostStatus::Down
    }

    #[inline]
    pub(crate) fn mark_up(&self) {
        self.status.store(HostStatus::Up, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn mark_down(&self) {
        self.status.store(HostStatus::Down, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn set_info(&self, info: HostInfo) {
        self.info.store(Arc::new(info));
    }
}

impl Debug for Host {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("address", &self.address)
            .field("info", &self.info.load())
            .field("status", &self.status())
            .finish()
    }
}
