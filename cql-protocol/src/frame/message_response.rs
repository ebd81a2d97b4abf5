use fxhash::FxHashMap;

use crate::frame::events::{SchemaChange, ServerEvent};
use crate::frame::message_error::ErrorBody;
use crate::frame::Opcode;
use crate::types::rows::Row;

/// Responses the control plane can receive.
#[derive(Debug, PartialEq, Clone)]
#[non_exhaustive]
pub enum ResponseBody {
    Error(ErrorBody),
    Ready,
    /// Server requires authentication with given authenticator class.
    Authenticate(String),
    Supported(FxHashMap<String, Vec<String>>),
    Result(ResultBody),
    Event(ServerEvent),
    AuthChallenge(Vec<u8>),
    AuthSuccess(Option<Vec<u8>>),
}

impl ResponseBody {
    pub fn opcode(&self) -> Opcode {
        match self {
            ResponseBody::Error(_) => Opcode::Error,
            ResponseBody::Ready => Opcode::Ready,
            ResponseBody::Authenticate(_) => Opcode::Authenticate,
            ResponseBody::Supported(_) => Opcode::Supported,
            ResponseBody::Result(_) => Opcode::Result,
            ResponseBody::Event(_) => Opcode::Event,
            ResponseBody::AuthChallenge(_) => Opcode::AuthChallenge,
            ResponseBody::AuthSuccess(_) => Opcode::AuthSuccess,
        }
    }

    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            ResponseBody::Result(ResultBody::Rows(rows)) => Some(rows),
            _ => None,
        }
    }

    pub fn into_server_event(self) -> Option<ServerEvent> {
        match self {
            ResponseBody::Event(event) => Some(event),
            _ => None,
        }
    }
}

/// Body of a `RESULT` response.
#[derive(Debug, PartialEq, Clone)]
pub enum ResultBody {
    Void,
    Rows(Vec<Row>),
    SetKeyspace(String),
    SchemaChange(SchemaChange),
}
