use fxhash::FxHashMap;

use crate::error::Result;

/// Handles SASL authentication.
///
/// The lifecycle of an authenticator consists of:
/// - The `initial_response` function will be called. The initial return value will be sent to the
///   server to initiate the handshake.
/// - The server will respond to each client response by either issuing a challenge or indicating
///   that the authentication is complete (successfully or not). If a new challenge is issued,
///   the authenticator's `evaluate_challenge` function will be called to produce a response
///   that will be sent to the server. This challenge/response negotiation will continue until
///   the server responds that authentication is successful or an error is raised.
/// - On success, the `handle_success` will be called with data returned by the server.
pub trait SaslAuthenticator {
    fn initial_response(&self) -> Vec<u8>;

    fn evaluate_challenge(&self, challenge: Vec<u8>) -> Result<Vec<u8>>;

    fn handle_success(&self, data: Option<Vec<u8>>) -> Result<()>;
}

/// Provides authenticators per new connection.
pub trait SaslAuthenticatorProvider {
    fn name(&self) -> Option<&str>;

    fn create_authenticator(&self) -> Box<dyn SaslAuthenticator + Send>;
}

/// Credentials sent in a `CREDENTIALS` request, used by protocol version 1 only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials(FxHashMap<String, String>);

impl Credentials {
    /// Creates credentials understood by the password authenticator.
    pub fn new<S: ToString>(username: S, password: S) -> Self {
        let mut map = FxHashMap::default();
        map.insert("username".to_string(), username.to_string());
        map.insert("password".to_string(), password.to_string());
        Credentials(map)
    }

    #[inline]
    pub fn as_map(&self) -> &FxHashMap<String, String> {
        &self.0
    }
}

impl From<FxHashMap<String, String>> for Credentials {
    fn from(map: FxHashMap<String, String>) -> Self {
        Credentials(map)
    }
}

#[derive(Debug, Clone)]
pub struct StaticPasswordAuthenticator {
    username: String,
    password: String,
}

impl StaticPasswordAuthenticator {
    pub fn new<S: ToString>(username: S, password: S) -> StaticPasswordAuthenticator {
        StaticPasswordAuthenticator {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl SaslAuthenticator for StaticPasswordAuthenticator {
    fn initial_response(&self) -> Vec<u8> {
        let mut token = vec![0];
        token.extend_from_slice(self.username.as_bytes());
        token.push(0);
        token.extend_from_slice(self.password.as_bytes());

        token
    }

    fn evaluate_challenge(&self, _challenge: Vec<u8>) -> Result<Vec<u8>> {
        Err("Server challenge is not supported for StaticPasswordAuthenticator!".into())
    }

    fn handle_success(&self, _data: Option<Vec<u8>>) -> Result<()> {
        Ok(())
    }
}

/// Authentication provider with a username and password.
#[derive(Debug, Clone)]
pub struct StaticPasswordAuthenticatorProvider {
    username: String,
    password: String,
}

impl SaslAuthenticatorProvider for StaticPasswordAuthenticatorProvider {
    fn name(&self) -> Option<&str> {
        Some("org.apache.cassandra.auth.PasswordAuthenticator")
    }

    fn create_authenticator(&self) -> Box<dyn SaslAuthenticator + Send> {
        Box::new(StaticPasswordAuthenticator::new(
            self.username.clone(),
            self.password.clone(),
        ))
    }
}

impl StaticPasswordAuthenticatorProvider {
    pub fn new<S: ToString>(username: S, password: S) -> Self {
        StaticPasswordAuthenticatorProvider {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoneAuthenticator;

impl SaslAuthenticator for NoneAuthenticator {
    fn initial_response(&self) -> Vec<u8> {
        vec![0]
    }

    fn evaluate_challenge(&self, _challenge: Vec<u8>) -> Result<Vec<u8>> {
        Err("Server challenge is not supported for NoneAuthenticator!".into())
    }

    fn handle_success(&self, _data: Option<Vec<u8>>) -> Result<()> {
        Ok(())
    }
}

/// Provider for no authentication.
#[derive(Debug, Clone)]
pub struct NoneAuthenticatorProvider;

impl SaslAuthenticatorProvider for NoneAuthenticatorProvider {
    fn name(&self) -> Option<&str> {
        None
    }

    fn create_authenticator(&self) -> Box<dyn SaslAuthenticator + Send> {
        Box::new(NoneAuthenticator)
    }
}
