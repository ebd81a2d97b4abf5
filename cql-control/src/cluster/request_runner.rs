use cql_protocol::frame::{RequestBody, ResponseBody, ResultBody};
use cql_protocol::types::QueryResult;
use futures::FutureExt;
use std::net::SocketAddr;

use crate::cluster::Connection;
use crate::future::BoxFuture;
use crate::transport::ControlTransport;
use crate::{Error, Result};

/// Executes requests over established connections.
pub trait RequestRunner<T: ControlTransport>: Send + Sync {
    /// Sends a request and waits for its result. Requests which do not produce rows yield an
    /// empty result.
    fn execute<'a>(
        &'a self,
        connection: &'a Connection<T>,
        request: &'a RequestBody,
    ) -> BoxFuture<'a, Result<QueryResult>>;
}

/// Runner sending requests directly over the connection transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRequestRunner;

impl<T: ControlTransport> RequestRunner<T> for DefaultRequestRunner {
    fn execute<'a>(
        &'a self,
        connection: &'a Connection<T>,
        request: &'a RequestBody,
    ) -> BoxFuture<'a, Result<QueryResult>> {
        async move {
            let response = connection.transport().write_request(request).await?;
            match check_response(response, connection.address())? {
                ResponseBody::Result(ResultBody::Rows(rows)) => Ok(rows.into()),
                ResponseBody::Result(_) | ResponseBody::Ready => Ok(QueryResult::default()),
                response => Err(Error::UnexpectedResponse(response.opcode())),
            }
        }
        .boxed()
    }
}

/// Turns error responses into errors.
pub(crate) fn check_response(response: ResponseBody, addr: SocketAddr) -> Result<ResponseBody> {
    match response {
        ResponseBody::Error(body) => Err(Error::Server { body, addr }),
        response => Ok(response),
    }
}
