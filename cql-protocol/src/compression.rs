//! Compression is agreed upon in the `STARTUP` message, before which no body may be compressed.
//! Encoding and decoding bodies is the transport's concern; here it is only negotiated.

use derive_more::Display;
use std::convert::TryFrom;

use crate::error;

pub const LZ4: &str = "lz4";
pub const SNAPPY: &str = "snappy";

/// Enum which represents a type of compression. Only non-startup frame's body can be compressed.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Ord, PartialOrd, Hash, Display, Default)]
pub enum Compression {
    /// [lz4](https://code.google.com/p/lz4/) compression
    Lz4,
    /// [snappy](https://code.google.com/p/snappy/) compression
    Snappy,
    /// Non compression
    #[default]
    None,
}

impl Compression {
    /// Checks if current compression actually compresses data.
    #[inline]
    pub fn is_compressed(self) -> bool {
        self != Compression::None
    }

    /// Returns the algorithm name as sent in `STARTUP`, or `None` for no compression.
    pub fn as_str(&self) -> Option<&'static str> {
        match *self {
            Compression::Lz4 => Some(LZ4),
            Compression::Snappy => Some(SNAPPY),
            Compression::None => None,
        }
    }
}

impl TryFrom<&str> for Compression {
    type Error = error::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            LZ4 => Ok(Compression::Lz4),
            SNAPPY => Ok(Compression::Snappy),
            _ => Err(format!("Unknown compression: {}", value).into()),
        }
    }
}
