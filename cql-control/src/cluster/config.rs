use cql_protocol::authenticators::{
    Credentials, NoneAuthenticatorProvider, SaslAuthenticatorProvider,
};
use cql_protocol::compression::Compression;
use cql_protocol::frame::Version;
use derivative::Derivative;
use std::sync::Arc;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_PORT: u16 = 9042;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 32;

/// Control connection configuration.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ControlConnectionConfig {
    pub port: u16,
    pub connect_timeout: Duration,
    /// Protocol version used for the first connection attempt.
    pub protocol_version: Version,
    /// Lowest protocol version the control connection is allowed to downgrade to.
    pub min_protocol_version: Version,
    pub compression: Compression,
    #[derivative(Debug = "ignore")]
    pub authenticator_provider: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
    /// Credentials for servers requiring authentication with protocol version 1.
    #[derivative(Debug = "ignore")]
    pub credentials: Option<Credentials>,
    pub event_channel_capacity: usize,
}

impl Default for ControlConnectionConfig {
    fn default() -> Self {
        ControlConnectionConfig {
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            protocol_version: Version::default(),
            min_protocol_version: Version::MIN,
            compression: Compression::None,
            authenticator_provider: Arc::new(NoneAuthenticatorProvider),
            credentials: None,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

/// Builder structure that helps to configure a control connection.
#[derive(Default)]
pub struct ControlConnectionConfigBuilder {
    config: ControlConnectionConfig,
}

impl ControlConnectionConfigBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the native protocol port used when connecting to plan addresses.
    pub fn with_port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the timeout for establishing a transport.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.config.connect_timeout = connect_timeout;
        self
    }

    /// Sets the initial protocol version.
    pub fn with_protocol_version(mut self, version: Version) -> Self {
        self.config.protocol_version = version;
        self
    }

    /// Sets the lowest protocol version accepted during negotiation.
    pub fn with_min_protocol_version(mut self, version: Version) -> Self {
        self.config.min_protocol_version = version;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }

    /// Sets new authenticator.
    pub fn with_authenticator_provider(
        mut self,
        authenticator_provider: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
    ) -> Self {
        self.config.authenticator_provider = authenticator_provider;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = Some(credentials);
        self
    }

    /// Sets how many server events can wait for processing before the transport is slowed down.
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.event_channel_capacity = capacity;
        self
    }

    /// Finalizes building process
    pub fn build(self) -> Result<ControlConnectionConfig> {
        let config = self.config;
        if config.min_protocol_version > config.protocol_version {
            return Err(Error::General(format!(
                "Minimum protocol version {} is above initial version {}",
                config.min_protocol_version, config.protocol_version
            )));
        }

        if config.event_channel_capacity == 0 {
            return Err("Event channel capacity must be positive".into());
        }

        Ok(config)
    }
}
