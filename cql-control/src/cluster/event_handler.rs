use cql_protocol::events::ServerEvent;
use cql_protocol::frame::events::{
    StatusChange, StatusChangeType, TopologyChange, TopologyChangeType,
};
use futures::FutureExt;
use std::net::IpAddr;
use std::sync::{Arc, Weak};
use tracing::*;

use crate::cluster::topology::HostDirectory;
use crate::cluster::topology_refresher::TopologyRefresher;
use crate::cluster::{Connection, EventHandler, RequestRunner};
use crate::future::BoxFuture;
use crate::transport::ControlTransport;
use crate::{Error, Result};

/// Keeps the host directory in sync with topology and status events. Schema events are left to
/// higher layers.
///
/// Follow-up queries are made over the connection the events arrive on, and complete before the
/// event is considered handled.
pub struct TopologyEventHandler<T: ControlTransport, R: RequestRunner<T>> {
    connection: Weak<Connection<T>>,
    request_runner: Arc<R>,
    directory: Arc<HostDirectory>,
}

impl<T: ControlTransport, R: RequestRunner<T>> TopologyEventHandler<T, R> {
    pub fn new(
        connection: &Arc<Connection<T>>,
        request_runner: Arc<R>,
        directory: Arc<HostDirectory>,
    ) -> Self {
        TopologyEventHandler {
            connection: Arc::downgrade(connection),
            request_runner,
            directory,
        }
    }

    async fn handle_event(&self, event: ServerEvent) -> Result<()> {
        match event {
            ServerEvent::StatusChange(StatusChange {
                change_type: StatusChangeType::Up,
                addr,
            }) => self.host_up(addr.ip()).await,
            ServerEvent::StatusChange(StatusChange {
                change_type: StatusChangeType::Down,
                addr,
            }) => self.host_down(addr.ip()).await,
            ServerEvent::TopologyChange(TopologyChange {
                change_type: TopologyChangeType::NewNode,
                addr,
            }) => self.new_node(addr.ip()).await,
            ServerEvent::TopologyChange(TopologyChange {
                change_type: TopologyChangeType::RemovedNode,
                addr,
            }) => {
                self.removed_node(addr.ip());
                Ok(())
            }
            ServerEvent::SchemaChange(_) => Ok(()),
        }
    }

    async fn host_up(&self, address: IpAddr) -> Result<()> {
        let host = match self.directory.host(address) {
            Some(host) if !host.is_up() => host,
            _ => return Ok(()),
        };

        self.refresh_host(address).await?;

        host.mark_up();
        debug!(%address, "Host is up.");
        self.directory
            .writer()
            .notify(|listener| listener.host_up(&host));

        Ok(())
    }

    async fn host_down(&self, address: IpAddr) -> Result<()> {
        let host = match self.directory.host(address) {
            Some(host) if !host.is_down() => host,
            _ => return Ok(()),
        };

        self.refresh_host(address).await?;

        host.mark_down();
        debug!(%address, "Host is down.");
        self.directory
            .writer()
            .notify(|listener| listener.host_down(&host));

        Ok(())
    }

    async fn new_node(&self, address: IpAddr) -> Result<()> {
        if self.directory.contains(address) {
            return Ok(());
        }

        self.refresh_host(address).await
    }

    fn removed_node(&self, address: IpAddr) {
        let writer = self.directory.writer();
        let host = match writer.remove(address) {
            Some(host) => host,
            None => return,
        };

        debug!(%address, "Host removed from cluster.");

        if host.is_down() {
            writer.notify(|listener| listener.host_lost(&host));
        } else {
            host.mark_down();
            writer.notify(|listener| {
                listener.host_down(&host);
                listener.host_lost(&host);
            });
        }
    }

    async fn refresh_host(&self, address: IpAddr) -> Result<()> {
        let connection = self.connection.upgrade().ok_or(Error::NotConnected)?;

        TopologyRefresher {
            connection: connection.as_ref(),
            request_runner: self.request_runner.as_ref(),
            directory: &self.directory,
        }
        .refresh_host(address)
        .await
    }
}

impl<T: ControlTransport, R: RequestRunner<T>> EventHandler for TopologyEventHandler<T, R> {
    fn handle(&self, event: ServerEvent) -> BoxFuture<'_, Result<()>> {
        self.handle_event(event).boxed()
    }
}
