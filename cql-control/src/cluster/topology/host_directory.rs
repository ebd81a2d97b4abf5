use arc_swap::ArcSwap;
use fxhash::{FxHashMap, FxHashSet};
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cluster::topology::{Host, HostListener};

pub type HostMap = FxHashMap<IpAddr, Arc<Host>>;

/// Shared view of cluster membership, together with listeners interested in host lifecycle.
///
/// Readers work on immutable snapshots and never block. Membership is changed only by the
/// control connection, one writer at a time.
pub struct HostDirectory {
    hosts: ArcSwap<HostMap>,
    listeners: ArcSwap<Vec<Arc<dyn HostListener>>>,
    write_lock: Mutex<()>,
}

impl Default for HostDirectory {
    fn default() -> Self {
        HostDirectory {
            hosts: ArcSwap::from_pointee(HostMap::default()),
            listeners: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }
}

impl HostDirectory {
    #[inline]
    pub fn host(&self, address: IpAddr) -> Option<Arc<Host>> {
        self.hosts.load().get(&address).cloned()
    }

    /// Returns a snapshot of all known hosts.
    #[inline]
    pub fn hosts(&self) -> Arc<HostMap> {
        self.hosts.load_full()
    }

    #[inline]
    pub fn contains(&self, address: IpAddr) -> bool {
        self.hosts.load().contains_key(&address)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hosts.load().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hosts.load().is_empty()
    }

    /// Adds a listener. Listeners are notified in the order they were added.
    pub fn add_listener(&self, listener: Arc<dyn HostListener>) {
        self.listeners.rcu(|listeners| {
            let mut listeners = Vec::clone(listeners);
            listeners.push(listener.clone());
            listeners
        });
    }

    /// Removes a previously added listener. Returns `false` if the listener was not found.
    pub fn remove_listener(&self, listener: &Arc<dyn HostListener>) -> bool {
        let target = Arc::as_ptr(listener) as *const ();
        let previous = self.listeners.rcu(|listeners| {
            listeners
                .iter()
                .filter(|candidate| Arc::as_ptr(candidate) as *const () != target)
                .cloned()
                .collect::<Vec<_>>()
        });

        previous
            .iter()
            .any(|candidate| Arc::as_ptr(candidate) as *const () == target)
    }

    /// Acquires exclusive write access to membership.
    pub(crate) fn writer(&self) -> DirectoryWriter<'_> {
        DirectoryWriter {
            directory: self,
            _guard: self
                .write_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Exclusive handle for changing membership. Every change swaps in a new map, so readers always
/// see complete snapshots.
pub(crate) struct DirectoryWriter<'a> {
    directory: &'a HostDirectory,
    _guard: MutexGuard<'a, ()>,
}

impl DirectoryWriter<'_> {
    #[inline]
    pub fn host(&self, address: IpAddr) -> Option<Arc<Host>> {
        self.directory.host(address)
    }

    pub fn insert(&self, host: Arc<Host>) {
        let mut hosts = HostMap::clone(&self.directory.hosts.load());
        hosts.insert(host.address(), host);
        self.directory.hosts.store(Arc::new(hosts));
    }

    pub fn remove(&self, address: IpAddr) -> Option<Arc<Host>> {
        let current = self.directory.hosts.load_full();
        if !current.contains_key(&address) {
            return None;
        }

        let mut hosts = HostMap::clone(&current);
        let removed = hosts.remove(&address);
        self.directory.hosts.store(Arc::new(hosts));

        removed
    }

    /// Keeps only hosts with given addresses, returning the removed ones.
    pub fn retain(&self, addresses: &FxHashSet<IpAddr>) -> Vec<Arc<Host>> {
        let current = self.directory.hosts.load_full();
        let (kept, removed): (HostMap, HostMap) = current
            .iter()
            .map(|(address, host)| (*address, host.clone()))
            .partition(|(address, _)| addresses.contains(address));

        if !removed.is_empty() {
            self.directory.hosts.store(Arc::new(kept));
        }

        removed.into_values().collect()
    }

    /// Invokes `notification` on every listener, in insertion order.
    pub fn notify<F>(&self, notification: F)
    where
        F: Fn(&dyn HostListener),
    {
        for listener in self.directory.listeners.load().iter() {
            notification(listener.as_ref());
        }
    }
}
