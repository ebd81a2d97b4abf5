use derive_more::Display;
use std::net::IpAddr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::AsRustType;

/// Decoded column value. Only the types found in system tables and user-defined values are
/// represented.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum Value {
    #[display("NULL")]
    Null,
    Text(String),
    Inet(IpAddr),
    Uuid(Uuid),
    Int(i32),
    BigInt(i64),
    Boolean(bool),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<IpAddr> for Value {
    fn from(value: IpAddr) -> Self {
        Value::Inet(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::BigInt(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

macro_rules! as_rust_type {
    ($type:ty, $variant:ident, $name:expr) => {
        impl AsRustType<$type> for Value {
            fn as_rust_type(&self) -> Result<Option<$type>> {
                match self {
                    Value::Null => Ok(None),
                    Value::$variant(value) => Ok(Some(value.clone())),
                    _ => {
                        let message = format!("Cannot convert {} into {}", self, $name);
                        Err(Error::General(message))
                    }
                }
            }
        }
    };
}

as_rust_type!(String, Text, "text");
as_rust_type!(IpAddr, Inet, "inet");
as_rust_type!(Uuid, Uuid, "uuid");
as_rust_type!(i32, Int, "int");
as_rust_type!(i64, BigInt, "bigint");
as_rust_type!(bool, Boolean, "boolean");
