//! This module contains a declaration of the `ControlTransport` trait, which should be
//! implemented by a transport in order to carry control connection traffic.
//!
//! A transport owns the socket and the frame codec. It exchanges decoded request and response
//! bodies, and forwards server-pushed events to the event sender it was created with (see
//! [`ConnectionManager`](crate::cluster::ConnectionManager)).
use cql_protocol::frame::{RequestBody, ResponseBody};
use std::net::SocketAddr;

#[cfg(test)]
use mockall::*;

use crate::future::BoxFuture;
use crate::Result;

/// General control transport trait.
pub trait ControlTransport: Send + Sync {
    /// Schedules a request for writing and waits for a response.
    fn write_request<'a>(&'a self, request: &'a RequestBody) -> BoxFuture<'a, Result<ResponseBody>>;

    /// Checks if the connection is broken (e.g. after read or write errors)
    fn is_broken(&self) -> bool;

    /// Returns associated node address
    fn address(&self) -> SocketAddr;

    /// Closes the underlying socket. Pending requests fail.
    fn close(&self) -> BoxFuture<'_, Result<()>>;
}

#[cfg(test)]
mock! {
    pub ControlTransport {
    }

    impl ControlTransport for ControlTransport {
        fn write_request(&self, request: &RequestBody) -> BoxFuture<'static, Result<ResponseBody>>;

        fn is_broken(&self) -> bool;

        fn address(&self) -> SocketAddr;

        fn close(&self) -> BoxFuture<'static, Result<()>>;
    }
}
