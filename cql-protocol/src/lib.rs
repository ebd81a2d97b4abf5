//! Protocol vocabulary for the CQL control plane.
//! Shared by the control connection and anything else that speaks to a cluster: protocol
//! versions, request and response bodies, server events and errors, typed rows and the builder
//! registry used to materialize user-defined values.

pub mod builders;
pub mod frame;
pub mod types;

pub mod authenticators;
pub mod compression;
pub mod consistency;
pub mod error;
pub mod events;

pub type Error = error::Error;
pub type Result<T> = error::Result<T>;
