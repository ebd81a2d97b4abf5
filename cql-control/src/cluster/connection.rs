use cql_protocol::compression::Compression;
use cql_protocol::events::ServerEvent;
use cql_protocol::frame::Version;
use derivative::Derivative;
use fxhash::FxHashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tracing::*;
use uuid::Uuid;

use crate::future::BoxFuture;
use crate::transport::ControlTransport;
use crate::{Error, Result};

/// Handles server events pushed over a connection.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: ServerEvent) -> BoxFuture<'_, Result<()>>;
}

/// Properties discovered while establishing a connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionProperties {
    /// Startup options supported by the server.
    pub supported: FxHashMap<String, Vec<String>>,
    /// Negotiated body compression.
    pub compression: Compression,
    pub datacenter: Option<String>,
    pub host_id: Option<Uuid>,
}

/// An established connection, ready to carry requests and server events.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Connection<T: ControlTransport> {
    #[derivative(Debug = "ignore")]
    transport: T,
    address: SocketAddr,
    version: Version,
    properties: ConnectionProperties,
    #[derivative(Debug = "ignore")]
    events: Mutex<Option<Receiver<ServerEvent>>>,
    #[derivative(Debug = "ignore")]
    event_task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: ControlTransport> Connection<T> {
    pub(crate) fn new(
        transport: T,
        address: SocketAddr,
        version: Version,
        properties: ConnectionProperties,
        events: Receiver<ServerEvent>,
    ) -> Self {
        Connection {
            transport,
            address,
            version,
            properties,
            events: Mutex::new(Some(events)),
            event_task: Mutex::new(None),
        }
    }

    /// Address of the connected host, used as its identity in the host directory.
    #[inline]
    pub fn host(&self) -> IpAddr {
        self.address.ip()
    }

    #[inline]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Protocol version negotiated for this connection.
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    #[inline]
    pub fn properties(&self) -> &ConnectionProperties {
        &self.properties
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[inline]
    pub fn is_broken(&self) -> bool {
        self.transport.is_broken()
    }

    /// Installs the handler for server events pushed over this connection.
    ///
    /// Events are processed one at a time: the next event is not taken until the handler has
    /// finished with the current one, including any requests it issues. A slow handler delays
    /// all subsequent events. Handler failures are logged and do not stop processing. Only one
    /// handler can be installed per connection.
    pub fn on_event(&self, handler: Arc<dyn EventHandler>) -> Result<()> {
        let events = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| {
                Error::General(format!(
                    "Event handler already installed for connection to {}",
                    self.address
                ))
            })?;

        let task = tokio::spawn(process_events(self.address, events, handler));
        *self
            .event_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(task);

        Ok(())
    }

    /// Closes the underlying transport and stops event processing.
    pub async fn close(&self) -> Result<()> {
        self.stop_events();
        self.transport.close().await
    }

    fn stop_events(&self) {
        if let Some(task) = self
            .event_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

async fn process_events(
    address: SocketAddr,
    mut events: Receiver<ServerEvent>,
    handler: Arc<dyn EventHandler>,
) {
    while let Some(event) = events.recv().await {
        debug!(%address, ?event, "Received server event.");

        if let Err(error) = handler.handle(event).await {
            error!(%address, %error, "Error processing server event!");
        }
    }

    debug!(%address, "Server event stream closed.");
}

impl<T: ControlTransport> Drop for Connection<T> {
    fn drop(&mut self) {
        self.stop_events();
    }
}
