//! **cql-control** maintains the control plane of a CQL client: a single administrative
//! connection used to discover cluster topology and to follow topology, status and schema
//! changes pushed by the server.
//!
//! ## Getting started
//!
//! The control connection does not own sockets. It is given a
//! [`ConnectionManager`](crate::cluster::ConnectionManager) able to open raw
//! [transports](crate::transport::ControlTransport), and a
//! [`RequestRunner`](crate::cluster::RequestRunner) executing requests over established
//! connections.
//!
//! ```no_run
//! # use cql_control::cluster::*;
//! # use cql_control::cluster::topology::HostDirectory;
//! # use cql_control::transport::ControlTransport;
//! # use std::net::IpAddr;
//! # use std::sync::Arc;
//! # async fn run<T: ControlTransport + 'static, CM: ConnectionManager<T> + 'static>(
//! #     connection_manager: Arc<CM>,
//! # ) -> cql_control::Result<()> {
//! let config = ControlConnectionConfigBuilder::new().build()?;
//! let directory = Arc::new(HostDirectory::default());
//! let control_connection = ControlConnection::new(
//!     config,
//!     connection_manager,
//!     Arc::new(DefaultRequestRunner),
//!     directory.clone(),
//! );
//!
//! control_connection
//!     .bootstrap(vec![IpAddr::from([127, 0, 0, 1])])
//!     .await?;
//!
//! for (address, host) in directory.hosts().iter() {
//!     println!("{} is {}", address, host.status());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod future;
pub mod transport;

pub use cql_protocol::authenticators;
pub use cql_protocol::builders;
pub use cql_protocol::compression;
pub use cql_protocol::consistency;
pub use cql_protocol::error;
pub use cql_protocol::events;
pub use cql_protocol::frame;
pub use cql_protocol::types;

pub type Error = error::Error;
pub type Result<T> = error::Result<T>;
