use derive_more::Constructor;
use fxhash::FxHashMap;

use crate::consistency::Consistency;
use crate::frame::events::SimpleServerEvent;
use crate::frame::Opcode;
use crate::types::value::Value;

pub const CQL_VERSION: &str = "CQL_VERSION";
pub const CQL_VERSION_VAL: &str = "3.0.0";
pub const COMPRESSION: &str = "COMPRESSION";

/// Requests issued by the control plane.
#[derive(Debug, PartialEq, Clone)]
pub enum RequestBody {
    Startup(BodyReqStartup),
    Options,
    Credentials(FxHashMap<String, String>),
    Query(QueryRequest),
    Register(BodyReqRegister),
    AuthResponse(Vec<u8>),
}

impl RequestBody {
    pub fn opcode(&self) -> Opcode {
        match self {
            RequestBody::Startup(_) => Opcode::Startup,
            RequestBody::Options => Opcode::Options,
            RequestBody::Credentials(_) => Opcode::Credentials,
            RequestBody::Query(_) => Opcode::Query,
            RequestBody::Register(_) => Opcode::Register,
            RequestBody::AuthResponse(_) => Opcode::AuthResponse,
        }
    }

    /// Creates new request of type `startup`.
    pub fn new_req_startup(compression: Option<&str>) -> Self {
        RequestBody::Startup(BodyReqStartup::new(compression))
    }

    /// Creates new request of type `register`.
    pub fn new_req_register(events: Vec<SimpleServerEvent>) -> Self {
        RequestBody::Register(BodyReqRegister::new(events))
    }

    /// Creates new request of type `query` with consistency `ONE`.
    pub fn new_req_query<S: Into<String>>(query: S, values: Vec<Value>) -> Self {
        RequestBody::Query(QueryRequest::new(query.into(), values, Consistency::One))
    }

    /// Creates new request of type `auth_response`.
    pub fn new_req_auth_response(token: Vec<u8>) -> Self {
        RequestBody::AuthResponse(token)
    }
}

/// Options sent with a `STARTUP` request.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BodyReqStartup {
    pub map: FxHashMap<String, String>,
}

impl BodyReqStartup {
    pub fn new(compression: Option<&str>) -> BodyReqStartup {
        let mut map = FxHashMap::default();
        map.insert(CQL_VERSION.into(), CQL_VERSION_VAL.into());
        if let Some(compression) = compression {
            map.insert(COMPRESSION.into(), compression.into());
        }

        BodyReqStartup { map }
    }

    #[inline]
    pub fn compression(&self) -> Option<&str> {
        self.map.get(COMPRESSION).map(String::as_str)
    }
}

/// The structure which represents a body of a request of type `register`.
#[derive(Debug, Constructor, Default, Ord, PartialOrd, Eq, PartialEq, Hash, Clone)]
pub struct BodyReqRegister {
    pub events: Vec<SimpleServerEvent>,
}

/// A CQL statement with positional values.
#[derive(Debug, Constructor, PartialEq, Clone)]
pub struct QueryRequest {
    pub query: String,
    pub values: Vec<Value>,
    pub consistency: Consistency,
}
