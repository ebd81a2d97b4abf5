use arc_swap::ArcSwapOption;
use atomic::Atomic;
use cql_protocol::events::SimpleServerEvent;
use cql_protocol::frame::{RequestBody, Version};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::*;

use crate::cluster::topology::HostDirectory;
use crate::cluster::topology_refresher::TopologyRefresher;
use crate::cluster::{
    Connection, ConnectionManager, Connector, ControlConnectionConfig, PipelineStep,
    RequestRunner, TopologyEventHandler,
};
use crate::transport::ControlTransport;
use crate::{Error, Result};

/// The administrative connection of a client. It discovers cluster topology, keeps the
/// [`HostDirectory`] up to date and follows changes pushed by the server.
///
/// At most one connection is held at a time. The protocol version is negotiated once per
/// control connection: after a host rejects a version, the lower one is used for all further
/// attempts and never raised again.
pub struct ControlConnection<
    T: ControlTransport + 'static,
    CM: ConnectionManager<T> + 'static,
    R: RequestRunner<T> + 'static,
> {
    config: ControlConnectionConfig,
    connector: Connector<T, CM>,
    request_runner: Arc<R>,
    directory: Arc<HostDirectory>,
    protocol_version: Atomic<Version>,
    connection: ArcSwapOption<Connection<T>>,
}

impl<
        T: ControlTransport + 'static,
        CM: ConnectionManager<T> + 'static,
        R: RequestRunner<T> + 'static,
    > ControlConnection<T, CM, R>
{
    pub fn new(
        config: ControlConnectionConfig,
        connection_manager: Arc<CM>,
        request_runner: Arc<R>,
        directory: Arc<HostDirectory>,
    ) -> Self {
        let connector = Connector::new(
            connection_manager,
            config.connect_timeout,
            config.event_channel_capacity,
        );

        ControlConnection {
            protocol_version: Atomic::new(config.protocol_version),
            config,
            connector,
            request_runner,
            directory,
            connection: ArcSwapOption::empty(),
        }
    }

    /// Protocol version used for the next connection attempt.
    #[inline]
    pub fn protocol_version(&self) -> Version {
        self.protocol_version.load(Ordering::Relaxed)
    }

    /// Returns current connection, if established.
    #[inline]
    pub fn connection(&self) -> Option<Arc<Connection<T>>> {
        self.connection.load_full()
    }

    #[inline]
    pub fn directory(&self) -> &Arc<HostDirectory> {
        &self.directory
    }

    /// Connects to the first host in the plan which accepts a connection. Hosts are tried one at
    /// a time, in plan order, and the plan is not advanced past the first success. When every
    /// host fails, the returned error lists each failure in attempt order.
    pub async fn connect<P>(&self, plan: P) -> Result<Arc<Connection<T>>>
    where
        P: IntoIterator<Item = IpAddr>,
    {
        let mut errors = vec![];

        for host in plan {
            match self.connect_to_host(host).await {
                Ok(connection) => {
                    debug!(
                        %host,
                        version = %connection.version(),
                        "Established new control connection."
                    );

                    let connection = Arc::new(connection);
                    if let Some(previous) = self.connection.swap(Some(connection.clone())) {
                        if let Err(error) = previous.close().await {
                            warn!(
                                address = %previous.address(),
                                %error,
                                "Error closing previous control connection."
                            );
                        }
                    }

                    return Ok(connection);
                }
                Err(error) => {
                    warn!(%host, %error, "Failed to establish control connection.");
                    errors.push((host, error));
                }
            }
        }

        Err(Error::NoHostsAvailable { errors })
    }

    /// Connects using hosts already present in the directory as the plan.
    pub async fn connect_known_hosts(&self) -> Result<Arc<Connection<T>>> {
        let plan: Vec<IpAddr> = self.directory.hosts().keys().copied().collect();
        self.connect(plan).await
    }

    /// Connects, reads full topology and subscribes to server events.
    pub async fn bootstrap<P>(&self, plan: P) -> Result<Arc<Connection<T>>>
    where
        P: IntoIterator<Item = IpAddr>,
    {
        let connection = self.connect(plan).await?;
        self.refresh_hosts().await?;
        self.register().await?;

        Ok(connection)
    }

    /// Subscribes to topology, status and schema events, and starts applying them to the host
    /// directory.
    pub async fn register(&self) -> Result<()> {
        let connection = self.current_connection()?;

        let request = RequestBody::new_req_register(vec![
            SimpleServerEvent::TopologyChange,
            SimpleServerEvent::StatusChange,
            SimpleServerEvent::SchemaChange,
        ]);
        self.request_runner.execute(&connection, &request).await?;

        connection.on_event(Arc::new(TopologyEventHandler::new(
            &connection,
            self.request_runner.clone(),
            self.directory.clone(),
        )))
    }

    /// Reads `system.local` and `system.peers` and makes the directory match them.
    pub async fn refresh_hosts(&self) -> Result<()> {
        let connection = self.current_connection()?;
        self.refresher(&connection).refresh_hosts().await
    }

    /// Reads system table information about a single host and merges it into the directory.
    pub async fn refresh_host(&self, address: IpAddr) -> Result<()> {
        let connection = self.current_connection()?;
        self.refresher(&connection).refresh_host(address).await
    }

    /// Closes current connection, if any.
    pub async fn close(&self) -> Result<()> {
        match self.connection.swap(None) {
            Some(connection) => {
                debug!(address = %connection.address(), "Closing control connection.");
                connection.close().await
            }
            None => Ok(()),
        }
    }

    fn current_connection(&self) -> Result<Arc<Connection<T>>> {
        self.connection.load_full().ok_or(Error::NotConnected)
    }

    fn refresher<'a>(&'a self, connection: &'a Connection<T>) -> TopologyRefresher<'a, T, R> {
        TopologyRefresher {
            connection,
            request_runner: self.request_runner.as_ref(),
            directory: &self.directory,
        }
    }

    async fn connect_to_host(&self, host: IpAddr) -> Result<Connection<T>> {
        let addr = SocketAddr::new(host, self.config.port);

        loop {
            let version = self.protocol_version();
            let steps = self.pipeline(version);

            let error = match self.connector.connect(addr, version, &steps).await {
                Ok(connection) => return Ok(connection),
                Err(error) => error,
            };

            let lower = match version.previous() {
                Some(lower) if self.can_downgrade(version, &error) => lower,
                _ => return Err(error),
            };

            warn!(
                %addr,
                %error,
                %version,
                %lower,
                "Could not connect using protocol version. Trying a lower one."
            );

            // a concurrent attempt may have already downgraded
            let _ = self.protocol_version.compare_exchange(
                version,
                lower,
                Ordering::Relaxed,
                Ordering::Relaxed,
            );
        }
    }

    fn can_downgrade(&self, version: Version, error: &Error) -> bool {
        version > self.config.min_protocol_version
            && error
                .server_error()
                .map(|body| body.is_protocol_error())
                .unwrap_or(false)
    }

    fn pipeline(&self, version: Version) -> Vec<PipelineStep> {
        let authentication = if version == Version::V1 {
            PipelineStep::CredentialsAuthentication {
                credentials: self.config.credentials.clone(),
            }
        } else {
            PipelineStep::SaslAuthentication {
                authenticator_provider: self.config.authenticator_provider.clone(),
            }
        };

        vec![
            PipelineStep::CacheOptions,
            PipelineStep::Initialize {
                compression: self.config.compression,
            },
            authentication,
            PipelineStep::CacheProperties,
        ]
    }
}
