//! Errors a server can respond with, identified by native protocol error codes.

use derive_more::Display;
use std::convert::TryFrom;

use crate::error;

/// Error returned by a server as a response. As in the native protocol, it contains an error code
/// and an error message.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ErrorBody {
    /// Code that points to a type of error.
    pub error_code: i32,
    /// Error message string.
    pub message: String,
    /// Decoded error type.
    pub ty: ErrorType,
}

impl ErrorBody {
    pub fn new<S: Into<String>>(ty: ErrorType, message: S) -> Self {
        ErrorBody {
            error_code: ty.code(),
            message: message.into(),
            ty,
        }
    }

    /// Creates a body from a raw error code, rejecting codes unknown to the protocol.
    pub fn from_code<S: Into<String>>(error_code: i32, message: S) -> error::Result<Self> {
        ErrorType::try_from(error_code).map(|ty| ErrorBody::new(ty, message))
    }

    /// Checks if the server refused the protocol version used by the client. Servers report it
    /// as a generic protocol error.
    #[inline]
    pub fn is_protocol_error(&self) -> bool {
        self.ty == ErrorType::Protocol
    }
}

/// Error categories defined by the native protocol.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display)]
pub enum ErrorType {
    Server,
    Protocol,
    Authentication,
    Unavailable,
    Overloaded,
    IsBootstrapping,
    Truncate,
    WriteTimeout,
    ReadTimeout,
    ReadFailure,
    FunctionFailure,
    WriteFailure,
    Syntax,
    Unauthorized,
    Invalid,
    Config,
    AlreadyExists,
    Unprepared,
}

impl ErrorType {
    pub fn code(&self) -> i32 {
        match self {
            ErrorType::Server => 0x0000,
            ErrorType::Protocol => 0x000A,
            ErrorType::Authentication => 0x0100,
            ErrorType::Unavailable => 0x1000,
            ErrorType::Overloaded => 0x1001,
            ErrorType::IsBootstrapping => 0x1002,
            ErrorType::Truncate => 0x1003,
            ErrorType::WriteTimeout => 0x1100,
            ErrorType::ReadTimeout => 0x1200,
            ErrorType::ReadFailure => 0x1300,
            ErrorType::FunctionFailure => 0x1400,
            ErrorType::WriteFailure => 0x1500,
            ErrorType::Syntax => 0x2000,
            ErrorType::Unauthorized => 0x2100,
            ErrorType::Invalid => 0x2200,
            ErrorType::Config => 0x2300,
            ErrorType::AlreadyExists => 0x2400,
            ErrorType::Unprepared => 0x2500,
        }
    }
}

impl TryFrom<i32> for ErrorType {
    type Error = error::Error;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0x0000 => Ok(ErrorType::Server),
            0x000A => Ok(ErrorType::Protocol),
            0x0100 => Ok(ErrorType::Authentication),
            0x1000 => Ok(ErrorType::Unavailable),
            0x1001 => Ok(ErrorType::Overloaded),
            0x1002 => Ok(ErrorType::IsBootstrapping),
            0x1003 => Ok(ErrorType::Truncate),
            0x1100 => Ok(ErrorType::WriteTimeout),
            0x1200 => Ok(ErrorType::ReadTimeout),
            0x1300 => Ok(ErrorType::ReadFailure),
            0x1400 => Ok(ErrorType::FunctionFailure),
            0x1500 => Ok(ErrorType::WriteFailure),
            0x2000 => Ok(ErrorType::Syntax),
            0x2100 => Ok(ErrorType::Unauthorized),
            0x2200 => Ok(ErrorType::Invalid),
            0x2300 => Ok(ErrorType::Config),
            0x2400 => Ok(ErrorType::AlreadyExists),
            0x2500 => Ok(ErrorType::Unprepared),
            _ => Err(error::Error::UnexpectedErrorCode(code)),
        }
    }
}
