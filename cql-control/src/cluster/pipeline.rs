use cql_protocol::authenticators::{Credentials, SaslAuthenticatorProvider};
use cql_protocol::compression::Compression;
use cql_protocol::frame::message_request::COMPRESSION;
use cql_protocol::frame::{RequestBody, ResponseBody, Version};
use cql_protocol::types::ByName;
use derivative::Derivative;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::*;

use crate::cluster::connection::ConnectionProperties;
use crate::cluster::request_runner::check_response;
use crate::transport::ControlTransport;
use crate::{Error, Result};

const SELECT_PROPERTIES: &str = "SELECT data_center, host_id FROM system.local";

/// A single stage of turning a raw transport into a usable control connection. Steps are
/// executed in order, each one on the outcome of the previous.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub enum PipelineStep {
    /// Asks the server for supported startup options.
    CacheOptions,
    /// Starts the protocol session with given body compression.
    Initialize { compression: Compression },
    /// Answers an authentication request with plain credentials (protocol version 1).
    CredentialsAuthentication {
        #[derivative(Debug = "ignore")]
        credentials: Option<Credentials>,
    },
    /// Answers an authentication request with a SASL exchange (protocol version 2 and newer).
    SaslAuthentication {
        #[derivative(Debug = "ignore")]
        authenticator_provider: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
    },
    /// Reads datacenter and host id of the connected host.
    CacheProperties,
}

/// Connection in the middle of the pipeline.
pub(crate) struct PendingConnection<'a, T: ControlTransport> {
    pub transport: &'a T,
    pub address: SocketAddr,
    pub version: Version,
    pub properties: ConnectionProperties,
    /// Authenticator class requested by the server during initialization.
    pub authentication: Option<String>,
}

impl<'a, T: ControlTransport> PendingConnection<'a, T> {
    pub fn new(transport: &'a T, address: SocketAddr, version: Version) -> Self {
        PendingConnection {
            transport,
            address,
            version,
            properties: Default::default(),
            authentication: None,
        }
    }

    async fn send(&self, request: &RequestBody) -> Result<ResponseBody> {
        self.transport
            .write_request(request)
            .await
            .and_then(|response| check_response(response, self.address))
    }
}

impl PipelineStep {
    pub(crate) async fn run<T: ControlTransport>(
        &self,
        pending: &mut PendingConnection<'_, T>,
    ) -> Result<()> {
        match self {
            PipelineStep::CacheOptions => cache_options(pending).await,
            PipelineStep::Initialize { compression } => initialize(pending, *compression).await,
            PipelineStep::CredentialsAuthentication { credentials } => {
                authenticate_with_credentials(pending, credentials.as_ref()).await
            }
            PipelineStep::SaslAuthentication {
                authenticator_provider,
            } => authenticate_with_sasl(pending, authenticator_provider.as_ref()).await,
            PipelineStep::CacheProperties => cache_properties(pending).await,
        }
    }
}

async fn cache_options<T: ControlTransport>(pending: &mut PendingConnection<'_, T>) -> Result<()> {
    match pending.send(&RequestBody::Options).await? {
        ResponseBody::Supported(supported) => {
            pending.properties.supported = supported;
            Ok(())
        }
        response => Err(Error::UnexpectedResponse(response.opcode())),
    }
}

async fn initialize<T: ControlTransport>(
    pending: &mut PendingConnection<'_, T>,
    compression: Compression,
) -> Result<()> {
    let compression = match compression.as_str() {
        Some(name) if !is_supported(pending, name) => {
            warn!(
                address = %pending.address,
                %compression,
                "Compression is not supported by host. Continuing without compression."
            );
            Compression::None
        }
        _ => compression,
    };

    let startup = RequestBody::new_req_startup(compression.as_str());
    match pending.send(&startup).await? {
        ResponseBody::Ready => {}
        ResponseBody::Authenticate(authenticator) => {
            pending.authentication = Some(authenticator);
        }
        response => return Err(Error::UnexpectedStartupResponse(response.opcode())),
    }

    pending.properties.compression = compression;
    Ok(())
}

fn is_supported<T: ControlTransport>(
    pending: &PendingConnection<'_, T>,
    compression: &str,
) -> bool {
    pending
        .properties
        .supported
        .get(COMPRESSION)
        .map(|algorithms| algorithms.iter().any(|algorithm| algorithm == compression))
        .unwrap_or(false)
}

async fn authenticate_with_credentials<T: ControlTransport>(
    pending: &mut PendingConnection<'_, T>,
    credentials: Option<&Credentials>,
) -> Result<()> {
    let authenticator = match pending.authentication.take() {
        Some(authenticator) => authenticator,
        None => return Ok(()),
    };

    let credentials = credentials.ok_or_else(|| {
        Error::Authentication(format!(
            "Server requested authentication with {}, but no credentials were given",
            authenticator
        ))
    })?;

    let request = RequestBody::Credentials(credentials.as_map().clone());
    match pending.send(&request).await? {
        ResponseBody::Ready => Ok(()),
        response => Err(Error::UnexpectedAuthResponse(response.opcode())),
    }
}

async fn authenticate_with_sasl<T: ControlTransport>(
    pending: &mut PendingConnection<'_, T>,
    authenticator_provider: &(dyn SaslAuthenticatorProvider + Send + Sync),
) -> Result<()> {
    let authenticator_class = match pending.authentication.take() {
        Some(authenticator) => authenticator,
        None => return Ok(()),
    };

    match authenticator_provider.name() {
        Some(name) if name == authenticator_class => {}
        Some(name) => {
            return Err(Error::Authentication(format!(
                "Unsupported type of authenticator. {} requested, but {} is supported",
                authenticator_class, name
            )));
        }
        None => {
            return Err(Error::Authentication(format!(
                "Server requested authentication with {}, but no authenticator was provided",
                authenticator_class
            )));
        }
    }

    let authenticator = authenticator_provider.create_authenticator();
    let initial = RequestBody::new_req_auth_response(authenticator.initial_response());
    let mut response = pending.send(&initial).await?;

    loop {
        match response {
            ResponseBody::AuthChallenge(challenge) => {
                let token = authenticator.evaluate_challenge(challenge)?;
                let request = RequestBody::new_req_auth_response(token);
                response = pending.send(&request).await?;
            }
            ResponseBody::AuthSuccess(data) => return authenticator.handle_success(data),
            response => return Err(Error::UnexpectedAuthResponse(response.opcode())),
        }
    }
}

async fn cache_properties<T: ControlTransport>(
    pending: &mut PendingConnection<'_, T>,
) -> Result<()> {
    let request = RequestBody::new_req_query(SELECT_PROPERTIES, vec![]);
    let response = pending.send(&request).await?;

    let opcode = response.opcode();
    let rows = response
        .into_rows()
        .ok_or(Error::UnexpectedResponse(opcode))?;

    if let Some(row) = rows.first() {
        pending.properties.datacenter = row.by_name("data_center")?;
        pending.properties.host_id = row.by_name("host_id")?;
    }

    Ok(())
}
