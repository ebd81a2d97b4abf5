use cql_protocol::events::ServerEvent;
use cql_protocol::frame::Version;
use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{channel, Sender};
use tokio::time::timeout;
use tracing::*;

#[cfg(test)]
use mockall::*;

use crate::cluster::pipeline::{PendingConnection, PipelineStep};
use crate::cluster::Connection;
use crate::future::BoxFuture;
use crate::transport::ControlTransport;
use crate::{Error, Result};

/// Manages establishing transports to hosts.
pub trait ConnectionManager<T: ControlTransport>: Send + Sync {
    /// Tries to open a new transport speaking given protocol version, with an optional server
    /// event handler.
    fn connection(
        &self,
        event_handler: Option<Sender<ServerEvent>>,
        addr: SocketAddr,
        version: Version,
    ) -> BoxFuture<Result<T>>;
}

#[cfg(test)]
mock! {
    pub ConnectionManager<T: ControlTransport> {
    }

    impl<T: ControlTransport> ConnectionManager<T> for ConnectionManager<T> {
        fn connection<'a>(
            &'a self,
            event_handler: Option<Sender<ServerEvent>>,
            addr: SocketAddr,
            version: Version,
        ) -> BoxFuture<'a, Result<T>>;
    }
}

/// Drives hosts through the connection pipeline.
pub struct Connector<T: ControlTransport, CM: ConnectionManager<T>> {
    connection_manager: Arc<CM>,
    connect_timeout: Duration,
    event_channel_capacity: usize,
    _transport: PhantomData<T>,
}

impl<T: ControlTransport, CM: ConnectionManager<T>> Connector<T, CM> {
    pub fn new(
        connection_manager: Arc<CM>,
        connect_timeout: Duration,
        event_channel_capacity: usize,
    ) -> Self {
        Connector {
            connection_manager,
            connect_timeout,
            event_channel_capacity,
            _transport: PhantomData,
        }
    }

    /// Opens a transport to given address and runs all steps on it. The transport is closed if
    /// any step fails.
    pub async fn connect(
        &self,
        addr: SocketAddr,
        version: Version,
        steps: &[PipelineStep],
    ) -> Result<Connection<T>> {
        let (event_sender, event_receiver) = channel(self.event_channel_capacity);
        let events = Some(event_sender);

        let connecting = self.connection_manager.connection(events, addr, version);
        let transport = timeout(self.connect_timeout, connecting)
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "Connecting to {} took longer than {:?}",
                    addr, self.connect_timeout
                ))
            })??;

        let mut pending = PendingConnection::new(&transport, addr, version);
        for step in steps {
            if let Err(error) = step.run(&mut pending).await {
                debug!(%addr, ?step, %error, "Connection pipeline step failed.");

                if let Err(error) = transport.close().await {
                    warn!(%addr, %error, "Error closing transport.");
                }

                return Err(error);
            }
        }

        let properties = pending.properties;
        Ok(Connection::new(transport, addr, version, properties, event_receiver))
    }
}
