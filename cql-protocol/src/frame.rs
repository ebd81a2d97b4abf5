//! `frame` module contains the message-level vocabulary of the native protocol. Byte-level
//! framing is left to the transport.
use bytemuck::NoUninit;
use derive_more::Display;
use std::convert::TryFrom;

use crate::error;

pub mod events;
pub mod message_error;
pub mod message_request;
pub mod message_response;

pub use crate::frame::message_request::{QueryRequest, RequestBody};
pub use crate::frame::message_response::{ResponseBody, ResultBody};

/// Native protocol version.
#[derive(Debug, PartialEq, Copy, Clone, Ord, PartialOrd, Eq, Hash, Display, NoUninit)]
#[repr(u8)]
pub enum Version {
    V1 = 1,
    V2 = 2,
    V3 = 3,
    V4 = 4,
    V5 = 5,
}

impl Version {
    /// Oldest version the client can speak.
    pub const MIN: Version = Version::V1;

    /// Newest version the client can speak.
    pub const MAX: Version = Version::V5;

    /// Returns the version directly below this one, if any.
    pub fn previous(self) -> Option<Version> {
        Version::try_from(u8::from(self) - 1).ok()
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::V4
    }
}

impl From<Version> for u8 {
    fn from(value: Version) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for Version {
    type Error = error::Error;

    fn try_from(version: u8) -> Result<Self, Self::Error> {
        match version & 0x7F {
            1 => Ok(Version::V1),
            2 => Ok(Version::V2),
            3 => Ok(Version::V3),
            4 => Ok(Version::V4),
            5 => Ok(Version::V5),
            v => Err(error::Error::UnsupportedProtocolVersion(v)),
        }
    }
}

#[derive(Debug, PartialEq, Copy, Clone, Ord, PartialOrd, Eq, Hash, Display)]
pub enum Opcode {
    Error,
    Startup,
    Ready,
    Authenticate,
    Credentials,
    Options,
    Supported,
    Query,
    Result,
    Prepare,
    Execute,
    Register,
    Event,
    Batch,
    AuthChallenge,
    AuthResponse,
    AuthSuccess,
}

impl From<Opcode> for u8 {
    fn from(value: Opcode) -> Self {
        match value {
            Opcode::Error => 0x00,
            Opcode::Startup => 0x01,
            Opcode::Ready => 0x02,
            Opcode::Authenticate => 0x03,
            Opcode::Credentials => 0x04,
            Opcode::Options => 0x05,
            Opcode::Supported => 0x06,
            Opcode::Query => 0x07,
            Opcode::Result => 0x08,
            Opcode::Prepare => 0x09,
            Opcode::Execute => 0x0A,
            Opcode::Register => 0x0B,
            Opcode::Event => 0x0C,
            Opcode::Batch => 0x0D,
            Opcode::AuthChallenge => 0x0E,
            Opcode::AuthResponse => 0x0F,
            Opcode::AuthSuccess => 0x10,
        }
    }
}
