use cql_protocol::frame::RequestBody;
use cql_protocol::types::{ByName, Row, Value};
use fxhash::FxHashSet;
use std::convert::TryFrom;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::*;

use crate::cluster::topology::host_directory::DirectoryWriter;
use crate::cluster::topology::{Host, HostDirectory};
use crate::cluster::{Connection, HostInfo, RequestRunner};
use crate::transport::ControlTransport;
use crate::Result;

pub(crate) const SELECT_LOCAL: &str =
    "SELECT rack, data_center, host_id, release_version FROM system.local";
pub(crate) const SELECT_PEERS: &str =
    "SELECT peer, rack, data_center, host_id, rpc_address, release_version FROM system.peers";
pub(crate) const SELECT_PEER: &str = "SELECT rack, data_center, host_id, rpc_address, \
    release_version FROM system.peers WHERE peer = ?";

/// Reads topology from system tables and merges it into the host directory.
pub(crate) struct TopologyRefresher<'a, T: ControlTransport, R: RequestRunner<T> + ?Sized> {
    pub connection: &'a Connection<T>,
    pub request_runner: &'a R,
    pub directory: &'a HostDirectory,
}

impl<T: ControlTransport, R: RequestRunner<T> + ?Sized> TopologyRefresher<'_, T, R> {
    /// Resynchronizes the whole directory with the cluster. Hosts not seen in either system
    /// table are dropped without notifications.
    pub async fn refresh_hosts(&self) -> Result<()> {
        let local_request = RequestBody::new_req_query(SELECT_LOCAL, vec![]);
        let peers_request = RequestBody::new_req_query(SELECT_PEERS, vec![]);

        let (local, peers) = futures::future::try_join(
            self.request_runner.execute(self.connection, &local_request),
            self.request_runner.execute(self.connection, &peers_request),
        )
        .await?;

        let local_address = self.connection.host();
        let mut observed = Vec::with_capacity(peers.len() + 1);
        if let Some(row) = local.first() {
            observed.push((local_address, HostInfo::try_from(row)?));
        }

        for row in peers.iter() {
            observed.push((peer_address(row)?, HostInfo::try_from(row)?));
        }

        let mut addresses: FxHashSet<IpAddr> =
            observed.iter().map(|(address, _)| *address).collect();
        addresses.insert(local_address);

        let writer = self.directory.writer();
        for (address, info) in observed {
            populate_host(&writer, address, info);
        }

        for host in writer.retain(&addresses) {
            debug!(address = %host.address(), "Pruned host missing from system tables.");
        }

        Ok(())
    }

    /// Refreshes a single host. Hosts missing from system tables are left as they are.
    pub async fn refresh_host(&self, address: IpAddr) -> Result<()> {
        let request = if address == self.connection.host() {
            RequestBody::new_req_query(SELECT_LOCAL, vec![])
        } else {
            RequestBody::new_req_query(SELECT_PEER, vec![Value::Inet(address)])
        };

        let result = self
            .request_runner
            .execute(self.connection, &request)
            .await?;

        if let Some(row) = result.first() {
            let info = HostInfo::try_from(row)?;
            populate_host(&self.directory.writer(), address, info);
        }

        Ok(())
    }
}

/// Address clients should use for a peer: its RPC address, unless the peer listens on all
/// interfaces.
fn peer_address(row: &Row) -> Result<IpAddr> {
    match row.by_name::<IpAddr>("rpc_address")? {
        Some(address) if !address.is_unspecified() => Ok(address),
        _ => match row.by_name::<IpAddr>("peer")? {
            Some(address) => Ok(address),
            None => Err("Peer row contains neither rpc_address nor peer".into()),
        },
    }
}

/// Merges host information into the directory, notifying listeners about visible changes.
pub(crate) fn populate_host(writer: &DirectoryWriter<'_>, address: IpAddr, info: HostInfo) {
    let host = match writer.host(address) {
        Some(host) => host,
        None => {
            let host = Arc::new(Host::new(address, info));
            writer.insert(host.clone());
            host.mark_up();

            debug!(%address, "Found new host.");
            writer.notify(|listener| {
                listener.host_found(&host);
                listener.host_up(&host);
            });
            return;
        }
    };

    if host.info().same_location(&info) {
        host.set_info(info);
        return;
    }

    debug!(%address, ?info, "Host changed location.");

    if host.is_down() {
        writer.notify(|listener| listener.host_lost(&host));
        host.set_info(info);
        writer.notify(|listener| listener.host_found(&host));
    } else {
        host.mark_down();
        writer.notify(|listener| {
            listener.host_down(&host);
            listener.host_lost(&host);
        });

        host.set_info(info);
        host.mark_up();
        writer.notify(|listener| {
            listener.host_found(&host);
            listener.host_up(&host);
        });
    }
}
